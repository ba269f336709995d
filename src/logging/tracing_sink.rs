//! # `tracing`-backed sink and its reopenable file writer.
//!
//! [`TracingSink`] filters by its own [`LogLevel`] and forwards everything that
//! passes to `tracing` macros. [`init`] installs a global `fmt` subscriber that
//! writes either to stdout or to a [`ReopenableFile`], so USR2 can reopen the
//! log after external rotation.
//!
//! ## Level mapping
//! ```text
//! debug            → tracing::Level::DEBUG
//! info, notice     → tracing::Level::INFO
//! warning          → tracing::Level::WARN
//! err, alert, ...  → tracing::Level::ERROR
//! ```
//! The syslog name is kept in the `severity` field.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use super::{LogLevel, LogSink};

/// Log file handle that can be swapped for a freshly opened one.
///
/// Clones share the same underlying file.
#[derive(Clone, Debug)]
pub struct ReopenableFile {
    path: Arc<PathBuf>,
    file: Arc<Mutex<File>>,
}

impl ReopenableFile {
    /// Opens (or creates) `path` in append mode.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;
        Ok(Self {
            path: Arc::new(path),
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Opens the path again and replaces the current handle.
    ///
    /// If opening fails the old handle stays in place.
    pub fn reopen(&self) -> io::Result<()> {
        let fresh = open_append(&self.path)?;
        *self.file.lock() = fresh;
        Ok(())
    }

    /// Path this file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for ReopenableFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.lock().flush()
    }
}

impl<'a> MakeWriter<'a> for ReopenableFile {
    type Writer = ReopenableFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Production [`LogSink`] emitting through `tracing`.
#[derive(Debug)]
pub struct TracingSink {
    level: AtomicU8,
    file: Option<ReopenableFile>,
}

impl TracingSink {
    /// Sink without a reopenable destination (output goes wherever the
    /// installed subscriber writes).
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: AtomicU8::new(level.as_u8()),
            file: None,
        }
    }

    /// Sink whose `reopen` reopens `file`.
    pub fn with_file(level: LogLevel, file: ReopenableFile) -> Self {
        Self {
            level: AtomicU8::new(level.as_u8()),
            file: Some(file),
        }
    }
}

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, msg: &str) {
        if level < self.level() {
            return;
        }
        let severity = level.as_str();
        match level {
            LogLevel::Debug => tracing::debug!(severity, "{msg}"),
            LogLevel::Info | LogLevel::Notice => tracing::info!(severity, "{msg}"),
            LogLevel::Warning => tracing::warn!(severity, "{msg}"),
            _ => tracing::error!(severity, "{msg}"),
        }
    }

    fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Acquire))
    }

    fn set_level(&self, level: LogLevel) {
        self.level.store(level.as_u8(), Ordering::Release);
    }

    fn reopen(&self) -> io::Result<()> {
        match &self.file {
            Some(file) => file.reopen(),
            None => Ok(()),
        }
    }
}

/// Logging setup.
#[derive(Clone, Debug, Default)]
pub struct LogConfig {
    /// Initial threshold.
    pub level: LogLevel,
    /// Destination file; `None` writes to stdout.
    pub file: Option<PathBuf>,
}

/// Installs the global `fmt` subscriber and returns the matching sink.
///
/// Call once per process. Fails if the log file cannot be opened or a global
/// subscriber is already installed.
pub fn init(cfg: &LogConfig) -> io::Result<Arc<TracingSink>> {
    let (writer, sink) = match &cfg.file {
        Some(path) => {
            let file = ReopenableFile::open(path)?;
            (
                BoxMakeWriter::new(file.clone()),
                TracingSink::with_file(cfg.level, file),
            )
        }
        None => (BoxMakeWriter::new(io::stdout), TracingSink::new(cfg.level)),
    };

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(cfg.file.is_none())
        .with_target(false)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(Arc::new(sink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reopen_follows_rotated_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("procvisor.log");
        let mut file = ReopenableFile::open(&path).unwrap();
        file.write_all(b"before\n").unwrap();

        let rotated = dir.path().join("procvisor.log.1");
        std::fs::rename(&path, &rotated).unwrap();

        file.reopen().unwrap();
        file.write_all(b"after\n").unwrap();
        file.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&rotated).unwrap(), "before\n");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "after\n");
    }

    #[test]
    fn sink_level_round_trips() {
        let sink = TracingSink::new(LogLevel::Notice);
        assert_eq!(sink.level(), LogLevel::Notice);
        sink.set_level(LogLevel::Debug);
        assert_eq!(sink.level(), LogLevel::Debug);
        assert!(sink.reopen().is_ok());
    }
}
