//! # ProcessState: the process-wide context.
//!
//! One [`ProcessState`] exists per process. It is built once by
//! [`ProcessState::builder`] and shared as `Arc<ProcessState>` with every
//! service that needs it. It owns:
//!
//! ```text
//! ProcessState
//! ├── services   (lock) ordered registry of ServiceRef
//! ├── workers    (lock) one task per started service
//! ├── timers     (lock) every timer created through new_timer/timer
//! ├── EventLoop         alarm dispatcher (monitors the timers)
//! ├── ConfigStore       process parameters (+ the "debug" pseudo-parameter)
//! ├── Features          named capability probes
//! ├── LogSink           leveled log output
//! ├── Bus               runtime events → SubscriberSet
//! ├── Host              exit/exec boundary
//! └── control channel   ControlSignal queue consumed by start_all(true)
//! ```
//!
//! ## Rules
//! - Each collection has its own lock; no lock is held across an `.await`.
//! - Service code is always called on a snapshot, never under a lock.
//! - Starting, shutting down and the control plane live in sibling modules.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::relaunch::{Host, Invocation};
use super::signals::{ControlHandle, ControlSignal};
use super::SupervisorConfig;
use crate::config::{ConfigStore, Definition, Value};
use crate::error::{ConfigError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::features::Features;
use crate::logging::{LogLevel, LogSink};
use crate::services::ServiceRef;
use crate::subscribers::SubscriberSet;
use crate::timer::{EventLoop, ObserverRef, Timer, TimerSpec};

/// Section holding the parameters every process has.
pub const CORE_SECTION: &str = "main";

/// Registry identifier of a service (registration order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceId(pub u64);

/// Lifecycle of the shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    Stopping,
    Stopped,
}

impl ShutdownState {
    pub(super) fn as_u8(self) -> u8 {
        match self {
            ShutdownState::Running => 0,
            ShutdownState::Stopping => 1,
            ShutdownState::Stopped => 2,
        }
    }

    pub(super) fn from_u8(v: u8) -> Self {
        match v {
            0 => ShutdownState::Running,
            1 => ShutdownState::Stopping,
            _ => ShutdownState::Stopped,
        }
    }
}

#[derive(Clone)]
pub(super) struct ServiceEntry {
    pub(super) id: ServiceId,
    pub(super) name: Arc<str>,
    pub(super) service: ServiceRef,
}

pub(super) struct Worker {
    pub(super) id: ServiceId,
    pub(super) name: Arc<str>,
    pub(super) cancel: CancellationToken,
    pub(super) join: JoinHandle<()>,
}

/// Process-wide supervisor context.
pub struct ProcessState {
    pub(super) cfg: SupervisorConfig,
    pub(super) bus: Bus,
    pub(super) subs: Arc<SubscriberSet>,
    pub(super) log: Arc<dyn LogSink>,
    pub(super) host: Arc<dyn Host>,
    pub(super) invocation: RwLock<Invocation>,
    pub(super) config: ConfigStore,
    pub(super) features: Features,

    pub(super) services: Mutex<Vec<ServiceEntry>>,
    pub(super) workers: Mutex<Vec<Worker>>,
    pub(super) timers: Mutex<Vec<Timer>>,
    pub(super) run_timer: Mutex<Option<Timer>>,
    pub(super) event_loop: EventLoop,

    pub(super) runtime: CancellationToken,
    pub(super) stopped: CancellationToken,
    pub(super) armed: AtomicBool,
    pub(super) state: AtomicU8,
    pub(super) next_id: AtomicU64,

    pub(super) control_tx: mpsc::Sender<ControlSignal>,
    pub(super) control_rx: Mutex<Option<mpsc::Receiver<ControlSignal>>>,
}

impl ProcessState {
    /// Starts building a process context.
    pub fn builder(cfg: SupervisorConfig) -> super::ProcessStateBuilder {
        super::ProcessStateBuilder::new(cfg)
    }

    pub(super) fn core_definitions() -> Vec<Definition> {
        vec![
            Definition::new("trace", false, "Log backtraces of service failures."),
            Definition::new(
                "runinterval",
                1800_i64,
                "Seconds between scheduled client runs.",
            ),
            Definition::new(
                "configprint",
                "",
                "Print the named parameters (comma separated, or 'all') and exit.",
            ),
            Definition::new("genconfig", false, "Print a full configuration file and exit."),
        ]
    }

    // ---- accessors ----------------------------------------------------------

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn log(&self) -> &Arc<dyn LogSink> {
        &self.log
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    /// Snapshot of the invocation replayed on restart.
    pub fn invocation(&self) -> Invocation {
        self.invocation.read().clone()
    }

    /// Replaces the arguments replayed on restart.
    pub fn set_args<I, S>(&self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString>,
    {
        let mut inv = self.invocation.write();
        *inv = inv.clone().with_args(args);
    }

    /// Program basename without extension.
    pub fn name(&self) -> String {
        self.invocation.read().program_name()
    }

    /// Sending side of the control channel.
    pub fn control(&self) -> ControlHandle {
        ControlHandle::new(self.control_tx.clone())
    }

    /// Forwards OS signals onto the control channel.
    pub fn forward_os_signals(&self) -> Result<(), RuntimeError> {
        super::signals::forward_os_signals(&self.control()).map_err(RuntimeError::SignalSetup)
    }

    pub fn shutdown_state(&self) -> ShutdownState {
        ShutdownState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Completes once a leaving shutdown has finished.
    pub async fn stopped(&self) {
        self.stopped.cancelled().await
    }

    // ---- registry -----------------------------------------------------------

    /// Appends `service` to the registry. Registration order is start order.
    pub fn register(&self, service: ServiceRef) -> ServiceId {
        let id = ServiceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let name: Arc<str> = Arc::from(service.name());
        self.services.lock().push(ServiceEntry {
            id,
            name: Arc::clone(&name),
            service,
        });
        self.bus
            .publish(Event::new(EventKind::ServiceRegistered).with_service(name));
        id
    }

    /// Names of the registered services, in order.
    pub fn services(&self) -> Vec<String> {
        self.services
            .lock()
            .iter()
            .map(|e| e.name.to_string())
            .collect()
    }

    pub fn service_count(&self) -> usize {
        self.services.lock().len()
    }

    /// Number of workers not yet finished (or joined).
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    pub(super) fn services_snapshot(&self) -> Vec<ServiceEntry> {
        self.services.lock().clone()
    }

    pub(super) fn remove_service(&self, id: ServiceId) -> bool {
        let mut services = self.services.lock();
        let before = services.len();
        services.retain(|e| e.id != id);
        services.len() != before
    }

    // ---- timers -------------------------------------------------------------

    /// Creates a timer, optionally attaching `observer`, and records it.
    ///
    /// Timers created after `start_all` has armed the event loop are
    /// monitored right away; earlier ones are monitored by `start_all`.
    pub fn new_timer(
        &self,
        spec: TimerSpec,
        observer: Option<ObserverRef>,
    ) -> Result<Timer, RuntimeError> {
        let timer = Timer::new(spec)?;
        if let Some(obs) = observer {
            timer.observe(obs);
        }

        let mut timers = self.timers.lock();
        timers.push(timer.clone());
        if self.armed.load(Ordering::Acquire) {
            self.event_loop.monitor(&timer);
        }
        Ok(timer)
    }

    /// Shared timer firing every `runinterval` seconds (1s tolerance, starts
    /// immediately). Created and monitored on first use.
    pub fn timer(&self) -> Result<Timer, RuntimeError> {
        let mut slot = self.run_timer.lock();
        if let Some(t) = slot.as_ref() {
            return Ok(t.clone());
        }

        let value = self.config.get("runinterval")?;
        let secs = value.as_float().ok_or_else(|| ConfigError::TypeMismatch {
            name: "runinterval".to_string(),
            expected: "number",
            got: value.type_name(),
        })?;
        let timer = Timer::new(TimerSpec::from_secs_f64(secs, 1.0, true)?)?;

        self.timers.lock().push(timer.clone());
        self.event_loop.monitor(&timer);
        *slot = Some(timer.clone());
        Ok(timer)
    }

    /// Number of recorded timers.
    pub fn timer_count(&self) -> usize {
        self.timers.lock().len()
    }

    // ---- configuration ------------------------------------------------------

    /// Reads a parameter. `debug` reports whether the log level is `Debug`.
    pub fn get(&self, name: &str) -> Result<Value, ConfigError> {
        if name == "debug" {
            return Ok(Value::Bool(self.log.level() == LogLevel::Debug));
        }
        self.config.get(name)
    }

    /// Writes a parameter. `debug` switches the log level between `Debug` and `Notice`.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        if name == "debug" {
            let value = value.into();
            let on = value
                .clone()
                .coerce_like(&Value::Bool(false))
                .and_then(|v| v.as_bool())
                .ok_or_else(|| ConfigError::InvalidValue {
                    name: name.to_string(),
                    value: value.inspect(),
                })?;
            self.set_debug(on);
            return Ok(());
        }
        self.config.set(name, value)
    }

    pub fn set_debug(&self, on: bool) {
        let level = if on { LogLevel::Debug } else { LogLevel::Notice };
        self.log.set_level(level);
    }

    /// Handles `configprint` / `genconfig` by writing to stdout and exiting 0.
    ///
    /// Returns `Ok(false)` when neither was requested.
    pub fn gen_config(&self) -> Result<bool, RuntimeError> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.gen_config_to(&mut out)
    }

    /// Like [`gen_config`](Self::gen_config), writing to `out`.
    pub fn gen_config_to(&self, out: &mut dyn Write) -> Result<bool, RuntimeError> {
        let print = self.config.get("configprint")?;
        let query = print.as_str().unwrap_or_default();
        if !query.is_empty() {
            for line in self.config.print_with(query, |name| self.get(name))? {
                writeln!(out, "{line}").map_err(RuntimeError::Output)?;
            }
            out.flush().map_err(RuntimeError::Output)?;
            self.host.exit(0);
            return Ok(true);
        }

        if self.config.get("genconfig")?.as_bool().unwrap_or(false) {
            out.write_all(self.config.to_config().as_bytes())
                .map_err(RuntimeError::Output)?;
            out.flush().map_err(RuntimeError::Output)?;
            self.host.exit(0);
            return Ok(true);
        }
        Ok(false)
    }
}

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
