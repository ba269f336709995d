use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::process::{CORE_SECTION, ProcessState, ShutdownState};
use super::relaunch::{Host, Invocation, OsHost};
use super::SupervisorConfig;
use crate::config::ConfigStore;
use crate::error::RuntimeError;
use crate::events::Bus;
use crate::features::Features;
use crate::logging::{LogLevel, LogSink, TracingSink};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::timer::EventLoop;

/// Builder for a [`ProcessState`].
pub struct ProcessStateBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    log: Option<Arc<dyn LogSink>>,
    host: Option<Arc<dyn Host>>,
    invocation: Option<Invocation>,
}

impl ProcessStateBuilder {
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            log: None,
            host: None,
            invocation: None,
        }
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive runtime events (service lifecycle, alarms, control
    /// requests) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Log sink; defaults to a [`TracingSink`] at `Notice`.
    pub fn with_log(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = Some(log);
        self
    }

    /// Process boundary; defaults to [`OsHost`].
    pub fn with_host(mut self, host: Arc<dyn Host>) -> Self {
        self.host = Some(host);
        self
    }

    /// Invocation replayed on restart; defaults to [`Invocation::capture`].
    pub fn with_invocation(mut self, invocation: Invocation) -> Self {
        self.invocation = Some(invocation);
        self
    }

    /// Builds the context and starts the subscriber listener.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Result<Arc<ProcessState>, RuntimeError> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let (control_tx, control_rx) = mpsc::channel(self.cfg.control_capacity_clamped());

        let config = ConfigStore::new();
        config.set_defaults(CORE_SECTION, ProcessState::core_definitions())?;

        let state = Arc::new(ProcessState {
            event_loop: EventLoop::new(bus.clone()),
            log: self
                .log
                .unwrap_or_else(|| Arc::new(TracingSink::new(LogLevel::Notice))),
            host: self.host.unwrap_or_else(|| Arc::new(OsHost)),
            invocation: RwLock::new(self.invocation.unwrap_or_else(Invocation::capture)),
            config,
            features: Features::new(),
            services: Mutex::new(Vec::new()),
            workers: Mutex::new(Vec::new()),
            timers: Mutex::new(Vec::new()),
            run_timer: Mutex::new(None),
            runtime: CancellationToken::new(),
            stopped: CancellationToken::new(),
            armed: AtomicBool::new(false),
            state: AtomicU8::new(ShutdownState::Running.as_u8()),
            next_id: AtomicU64::new(1),
            control_tx,
            control_rx: Mutex::new(Some(control_rx)),
            cfg: self.cfg,
            bus,
            subs,
        });

        if !state.subs.is_empty() {
            subscriber_listener(&state);
        }
        Ok(state)
    }
}

/// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
fn subscriber_listener(state: &ProcessState) {
    let mut rx = state.bus.subscribe();
    let set = Arc::clone(&state.subs);
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
