//! # Logging sink contract.
//!
//! The supervisor never formats or routes log output itself. It hands leveled
//! messages to a [`LogSink`], which owns filtering (the current level), output
//! and reopening after external rotation.

use std::io;

use super::LogLevel;

/// Leveled message sink.
///
/// Implementations must be cheap to call from any task and must not block for
/// long: the supervisor logs from signal handling and shutdown paths.
pub trait LogSink: Send + Sync + 'static {
    /// Records `msg` at `level` if `level >= self.level()`.
    fn log(&self, level: LogLevel, msg: &str);

    /// Current threshold.
    fn level(&self) -> LogLevel;

    /// Changes the threshold.
    fn set_level(&self, level: LogLevel);

    /// Reopens the output destination (no-op for sinks without one).
    fn reopen(&self) -> io::Result<()>;

    fn debug(&self, msg: &str) {
        self.log(LogLevel::Debug, msg);
    }

    fn info(&self, msg: &str) {
        self.log(LogLevel::Info, msg);
    }

    fn notice(&self, msg: &str) {
        self.log(LogLevel::Notice, msg);
    }

    fn warning(&self, msg: &str) {
        self.log(LogLevel::Warning, msg);
    }

    fn err(&self, msg: &str) {
        self.log(LogLevel::Err, msg);
    }
}
