//! Runtime core: the process context and its lifecycle.
//!
//! The public entry point is [`ProcessState`], built by
//! [`ProcessState::builder`]. Its operations are split by concern:
//!
//! - [`process`]: the context object, service registry, timers, configuration access;
//! - [`supervisor`]: `start_all`, one worker per service, `join`;
//! - [`shutdown`]: bounded shutdown and the `ShutdownState` machine;
//! - [`control`]: trigger / reload / restart / reopen-logs actions;
//! - [`signals`]: `ControlSignal` channel and OS signal forwarding;
//! - [`relaunch`]: `Invocation` capture and the `Host` exit/exec seam;
//! - [`config`]: `SupervisorConfig` timing knobs.

mod builder;
mod config;
mod control;
mod process;
mod relaunch;
mod shutdown;
mod signals;
mod supervisor;

pub use builder::ProcessStateBuilder;
pub use config::SupervisorConfig;
pub use control::{ReloadOutcome, TriggerReport};
pub use process::{CORE_SECTION, ProcessState, ServiceId, ShutdownState, version};
pub use relaunch::{Host, Invocation, OsHost};
pub use signals::{ControlHandle, ControlSignal, forward_os_signals};
