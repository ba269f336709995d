//! # Runtime events emitted by the supervisor, event loop and control plane.
//!
//! [`EventKind`] classifies events into:
//! - **Service lifecycle**: registration, start, failure, removal, worker exit
//! - **Shutdown**: request, per-service timeout, completion
//! - **Control plane**: triggered runs, restart requests, log reopen
//! - **Timers**: alarm dispatch
//! - **Subscriber health**: panics and overflow
//!
//! [`Event`] carries the optional metadata (service name, reason, timer id, timeout).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use procvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ServiceShutdownTimeout)
//!     .with_service("agent")
//!     .with_timeout(Duration::from_secs(20));
//!
//! assert_eq!(ev.kind, EventKind::ServiceShutdownTimeout);
//! assert_eq!(ev.service.as_deref(), Some("agent"));
//! assert_eq!(ev.timeout_ms, Some(20_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `service` (subscriber name) and `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `service` (subscriber name) and `reason`.
    SubscriberOverflow,

    // === Service lifecycle ===
    /// Service appended to the registry.
    ///
    /// Sets `service`.
    ServiceRegistered,

    /// Worker spawned and about to call `start()`.
    ///
    /// Sets `service`.
    ServiceStarting,

    /// `start()` returned an error or panicked.
    ///
    /// Sets `service` and `reason`.
    ServiceFailed,

    /// Service dropped from the registry after a failed start.
    ///
    /// Sets `service`.
    ServiceRemoved,

    /// Worker finished and was removed from the worker list.
    ///
    /// Sets `service`.
    WorkerExited,

    /// Startup left no registered services.
    NoRemainingServices,

    // === Shutdown ===
    /// Shutdown sequence began.
    ///
    /// Sets `reason` when triggered by a signal.
    ShutdownRequested,

    /// A service's `shutdown()` exceeded its bound.
    ///
    /// Sets `service` and `timeout_ms`.
    ServiceShutdownTimeout,

    /// A worker did not finish within the join bound and was abandoned.
    ///
    /// Sets `service` and `timeout_ms`.
    WorkerAbandoned,

    /// Shutdown sequence finished (services stopped, workers joined or abandoned).
    ShutdownComplete,

    // === Timers ===
    /// An alarm was delivered to the observers of a timer.
    ///
    /// Sets `timer`.
    AlarmDispatched,

    // === Control plane ===
    /// A triggerable service was run on demand.
    ///
    /// Sets `service`; `reason` when the run failed.
    ClientRun,

    /// A triggerable service was skipped because it was already running.
    ///
    /// Sets `service`.
    ClientSkipped,

    /// A trigger request found no idle triggerable service.
    NoClientsRun,

    /// Reload requested; `service` is set when a restartable service handled
    /// it, unset when the whole process is relaunched.
    RestartRequested,

    /// Log sink reopened.
    ///
    /// Sets `reason` when reopening failed.
    LogsReopened,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Service (or subscriber) name, if applicable.
    pub service: Option<Arc<str>>,
    /// Human-readable reason (errors, signal names, etc.).
    pub reason: Option<Arc<str>>,
    /// Timer id for alarm events.
    pub timer: Option<u64>,
    /// Bound that was exceeded, in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            reason: None,
            timer: None,
            timeout_ms: None,
        }
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timer id.
    #[inline]
    pub fn with_timer(mut self, id: u64) -> Self {
        self.timer = Some(id);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_service(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_service(subscriber)
            .with_reason(info)
    }
}
