//! Recursive directory creation that reports through the log sink.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::FsError;
use crate::logging::LogSink;

/// Creates `dir` and any missing parents with `mode` (unix permission bits).
///
/// Returns `Ok(false)` if `dir` already exists or a component could not be
/// created (the failure is logged at `err`), `Ok(true)` once every missing
/// component was created. An intermediate component that exists but is not a
/// directory is an error.
pub fn mkdir_p(dir: &Path, mode: u32, log: &dyn LogSink) -> Result<bool, FsError> {
    if dir.exists() {
        return Ok(false);
    }

    let mut path = PathBuf::new();
    for component in dir.components() {
        path.push(component);
        if matches!(component, Component::RootDir | Component::Prefix(_)) {
            continue;
        }
        if path.is_dir() {
            continue;
        }
        if path.exists() {
            return Err(FsError::NotADirectory {
                dir: dir.display().to_string(),
                basedir: path.display().to_string(),
            });
        }
        if let Err(e) = create_one(&path, mode) {
            if e.kind() == io::ErrorKind::PermissionDenied {
                log.err(&e.to_string());
            } else {
                log.err(&format!("Could not create {}: {e}", path.display()));
            }
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(unix)]
fn create_one(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new().mode(mode).create(path)
}

#[cfg(not(unix))]
fn create_one(path: &Path, _mode: u32) -> io::Result<()> {
    std::fs::DirBuilder::new().create(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemorySink};

    #[test]
    fn creates_missing_components() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a/b/c");
        let log = MemorySink::default();

        assert!(mkdir_p(&target, 0o755, &log).unwrap());
        assert!(target.is_dir());
        assert!(!mkdir_p(&target, 0o755, &log).unwrap());
        assert!(log.records().is_empty());
    }

    #[test]
    fn file_in_the_way_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a"), b"not a dir").unwrap();
        let log = MemorySink::default();

        let err = mkdir_p(&tmp.path().join("a/b"), 0o755, &log).unwrap_err();
        assert!(err.to_string().contains("is a file"));
        assert!(!log.contains(LogLevel::Err, "Could not create"));
    }
}
