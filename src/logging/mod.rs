//! Logging: levels, the sink contract and its implementations.
//!
//! ## Contents
//! - [`LogLevel`] syslog-style severities (`debug` … `crit`)
//! - [`LogSink`] the contract the supervisor logs through
//! - [`TracingSink`] production sink on top of `tracing`, see [`init`]
//! - [`MemorySink`] recording sink for tests

mod level;
mod memory;
mod sink;
mod tracing_sink;

pub use level::{LogLevel, ParseLevelError};
pub use memory::MemorySink;
pub use sink::LogSink;
pub use tracing_sink::{LogConfig, ReopenableFile, TracingSink, init};
