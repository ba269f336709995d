//! # Alarm observers.
//!
//! An observer is attached to a [`Timer`](crate::Timer) and called by the
//! [`EventLoop`](crate::EventLoop) each time that timer's alarm fires.
//! Observers run sequentially on the event loop's task, so a slow observer
//! delays later alarms; long work belongs on the service's own worker.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;

use super::TimerId;

/// One delivered alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alarm {
    /// Timer that fired.
    pub timer: TimerId,
    /// Per-loop dispatch counter (1-based).
    pub seq: u64,
    /// When the alarm was due.
    pub scheduled: Instant,
    /// When the loop picked it up (within tolerance before, or any time after, `scheduled`).
    pub fired: Instant,
}

/// Contract for alarm observers.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    async fn on_alarm(&self, alarm: &Alarm);

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to an observer.
pub type ObserverRef = Arc<dyn Observe>;

/// Closure-backed observer.
///
/// ```rust
/// use procvisor::{Alarm, ObserverFn, ObserverRef};
///
/// let obs: ObserverRef = ObserverFn::arc(|alarm: Alarm| async move {
///     let _ = alarm.timer;
/// });
/// ```
pub struct ObserverFn<F> {
    f: F,
}

impl<F> ObserverFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }

    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Observe for ObserverFn<F>
where
    F: Fn(Alarm) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_alarm(&self, alarm: &Alarm) {
        (self.f)(*alarm).await
    }

    fn name(&self) -> &str {
        "observer-fn"
    }
}
