//! In-memory sink, for tests and embedding.

use std::io;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::{LogLevel, LogSink};

/// Records every message that passes the level filter.
#[derive(Debug)]
pub struct MemorySink {
    level: AtomicU8,
    records: Mutex<Vec<(LogLevel, String)>>,
    reopened: AtomicUsize,
}

impl MemorySink {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: AtomicU8::new(level.as_u8()),
            records: Mutex::new(Vec::new()),
            reopened: AtomicUsize::new(0),
        }
    }

    /// Copy of the recorded messages in arrival order.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.lock().clone()
    }

    /// True if any recorded message at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    /// How many times `reopen` was called.
    pub fn reopen_count(&self) -> usize {
        self.reopened.load(Ordering::Acquire)
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(LogLevel::Debug)
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, msg: &str) {
        if level < self.level() {
            return;
        }
        self.records.lock().push((level, msg.to_string()));
    }

    fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Acquire))
    }

    fn set_level(&self, level: LogLevel) {
        self.level.store(level.as_u8(), Ordering::Release);
    }

    fn reopen(&self) -> io::Result<()> {
        self.reopened.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_below_threshold() {
        let sink = MemorySink::new(LogLevel::Notice);
        sink.debug("hidden");
        sink.info("hidden too");
        sink.notice("shown");
        sink.err("also shown");

        let recs = sink.records();
        assert_eq!(recs.len(), 2);
        assert!(sink.contains(LogLevel::Notice, "shown"));
        assert!(sink.contains(LogLevel::Err, "also"));
    }
}
