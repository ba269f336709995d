//! # procvisor
//!
//! **procvisor** is a process-wide service supervisor for long-running daemons.
//!
//! It registers independently running services, launches each on its own
//! worker, dispatches periodic timer alarms through a single cooperative event
//! loop, reacts to control signals (terminate, reload, trigger-now, reopen
//! logs) and shuts everything down within bounded time.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Service    │   │   Service    │   │   Service    │
//!     │  (agent #1)  │   │  (agent #2)  │   │  (agent #3)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼ register         ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  ProcessState (process-wide context)                              │
//! │  - services / workers / timers (one lock each)                    │
//! │  - ConfigStore, Features, LogSink, Host                           │
//! │  - EventLoop (timer alarms)                                       │
//! │  - control channel (ControlSignal)                                │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │   worker     │   │   worker     │   │   worker     │   │
//!     │ svc.start()  │   │ svc.start()  │   │ svc.start()  │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ ServiceStarting  │ ServiceFailed    │ WorkerExited    │ AlarmDispatched
//!      │                  │ ServiceRemoved   │                 │ ClientRun ...
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: SupervisorConfig::bus_capacity)           │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                          (per-sub queues)
//!                        ┌─────────┼─────────┐
//!                        ▼         ▼         ▼
//!                   sub1.on   sub2.on   subN.on
//!                    _event()  _event()  _event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! register(A), register(B), register(C)
//!
//! start_all(block = true):
//!   ├─► spawn worker per service ─► start() fails? ─► removed, logged
//!   ├─► sleep(startup_grace)
//!   ├─► none left? ─► exit(1)
//!   ├─► monitor every timer
//!   └─► select {
//!         EventLoop::run()      alarms ─► observers
//!         control plane         Terminate ─► shutdown(true) ─► exit(0)
//!                               Reload    ─► Restartable::restart() | re-exec
//!                               Trigger   ─► Triggerable::run_now() (idle ones)
//!                               ReopenLogs ─► LogSink::reopen()
//!       }
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Services**      | Start/shutdown contract with optional capabilities.          | [`Service`], [`Triggerable`], [`Restartable`] |
//! | **Supervision**   | Registry, workers, bounded shutdown, control plane.          | [`ProcessState`], [`ControlSignal`]         |
//! | **Timers**        | Periodic alarms with tolerance-based coalescing.             | [`Timer`], [`TimerSpec`], [`EventLoop`]     |
//! | **Configuration** | Typed parameters and supervisor timing knobs.                | [`ConfigStore`], [`SupervisorConfig`]       |
//! | **Logging**       | Syslog-style levels on top of `tracing`, reopenable files.   | [`LogSink`], [`TracingSink`]                |
//! | **Subscriber API**| Hook into runtime events.                                    | [`Subscribe`]                               |
//! | **Errors**        | Typed errors for the runtime, services and configuration.    | [`RuntimeError`], [`ServiceError`]          |
//!
//! ## Example
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use procvisor::{ProcessState, ServiceError, ServiceFn, ServiceRef, SupervisorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = ProcessState::builder(SupervisorConfig::default()).build()?;
//!     state.forward_os_signals()?;
//!
//!     let agent: ServiceRef = ServiceFn::arc("agent", |ctx: CancellationToken| async move {
//!         ctx.cancelled().await;
//!         Ok::<_, ServiceError>(())
//!     });
//!     state.register(agent);
//!
//!     // Runs until SIGINT/SIGTERM, then exits 0.
//!     state.start_all(true).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
mod core;
mod error;
pub mod events;
mod features;
pub mod fs;
pub mod logging;
mod services;
pub mod subscribers;
mod timer;

// ---- Public re-exports ----

pub use config::{ConfigStore, Definition, Value};
pub use core::{
    CORE_SECTION, ControlHandle, ControlSignal, Host, Invocation, OsHost, ProcessState,
    ProcessStateBuilder, ReloadOutcome, ServiceId, ShutdownState, SupervisorConfig,
    TriggerReport, forward_os_signals, version,
};
pub use error::{ConfigError, FsError, RuntimeError, ServiceError};
pub use events::{Bus, Event, EventKind};
pub use features::Features;
pub use logging::{LogConfig, LogLevel, LogSink, MemorySink, TracingSink};
pub use services::{Monitorable, Restartable, Service, ServiceFn, ServiceRef, Triggerable};
pub use subscribers::{Subscribe, SubscriberSet};
pub use timer::{Alarm, EventLoop, ObserverFn, ObserverRef, Observe, Timer, TimerId, TimerSpec};
