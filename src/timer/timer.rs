//! # Periodic alarm sources.
//!
//! A [`Timer`] is a validated [`TimerSpec`] plus the observers to call on each
//! alarm. It does not schedule anything by itself: scheduling belongs to the
//! [`EventLoop`](crate::EventLoop) once the timer is monitored.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::ObserverRef;
use crate::error::RuntimeError;

static TIMER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique timer identifier (creation order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Timer parameters.
///
/// - `interval`: time between alarms (non-zero, and schedulable from now)
/// - `tolerance`: how early an alarm may fire to be coalesced with another
/// - `start_immediately`: first alarm fires as soon as the timer is monitored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSpec {
    pub interval: Duration,
    pub tolerance: Duration,
    pub start_immediately: bool,
}

impl TimerSpec {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            tolerance: Duration::ZERO,
            start_immediately: false,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn start_immediately(mut self, yes: bool) -> Self {
        self.start_immediately = yes;
        self
    }

    /// Builds a spec from seconds, rejecting non-positive or non-finite input.
    pub fn from_secs_f64(
        interval: f64,
        tolerance: f64,
        start_immediately: bool,
    ) -> Result<Self, RuntimeError> {
        if !interval.is_finite() || interval <= 0.0 {
            return Err(RuntimeError::InvalidTimer {
                reason: format!("interval must be a positive number of seconds, got {interval}"),
            });
        }
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(RuntimeError::InvalidTimer {
                reason: format!("tolerance must be zero or positive, got {tolerance}"),
            });
        }
        let secs = |what: &str, v: f64| {
            Duration::try_from_secs_f64(v).map_err(|e| RuntimeError::InvalidTimer {
                reason: format!("{what} of {v} seconds is out of range: {e}"),
            })
        };
        Ok(Self {
            interval: secs("interval", interval)?,
            tolerance: secs("tolerance", tolerance)?,
            start_immediately,
        })
    }

    fn validate(&self) -> Result<(), RuntimeError> {
        if self.interval.is_zero() {
            return Err(RuntimeError::InvalidTimer {
                reason: "interval must be greater than zero".to_string(),
            });
        }
        let now = Instant::now();
        for (what, d) in [("interval", self.interval), ("tolerance", self.tolerance)] {
            if now.checked_add(d).is_none() {
                return Err(RuntimeError::InvalidTimer {
                    reason: format!("{what} of {d:?} cannot be scheduled"),
                });
            }
        }
        Ok(())
    }
}

struct Inner {
    id: TimerId,
    spec: TimerSpec,
    observers: Mutex<Vec<ObserverRef>>,
}

/// Shared timer handle; clones refer to the same timer.
#[derive(Clone)]
pub struct Timer {
    inner: Arc<Inner>,
}

impl Timer {
    /// Validates `spec` and creates a timer with no observers.
    pub fn new(spec: TimerSpec) -> Result<Self, RuntimeError> {
        spec.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                id: TimerId(TIMER_SEQ.fetch_add(1, Ordering::Relaxed)),
                spec,
                observers: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn id(&self) -> TimerId {
        self.inner.id
    }

    pub fn spec(&self) -> TimerSpec {
        self.inner.spec
    }

    pub fn interval(&self) -> Duration {
        self.inner.spec.interval
    }

    pub fn tolerance(&self) -> Duration {
        self.inner.spec.tolerance
    }

    /// Attaches an observer; observers are called in attachment order.
    pub fn observe(&self, observer: ObserverRef) {
        self.inner.observers.lock().push(observer);
    }

    /// Snapshot of the attached observers.
    pub fn observers(&self) -> Vec<ObserverRef> {
        self.inner.observers.lock().clone()
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.inner.id)
            .field("spec", &self.inner.spec)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_rejected() {
        let err = Timer::new(TimerSpec::new(Duration::ZERO)).unwrap_err();
        assert_eq!(err.as_label(), "runtime_invalid_timer");
    }

    #[test]
    fn seconds_are_validated_not_clamped() {
        assert!(TimerSpec::from_secs_f64(-1.0, 0.0, false).is_err());
        assert!(TimerSpec::from_secs_f64(f64::NAN, 0.0, false).is_err());
        assert!(TimerSpec::from_secs_f64(5.0, -0.5, false).is_err());

        assert!(TimerSpec::from_secs_f64(1e20, 0.0, false).is_err());
        assert!(TimerSpec::from_secs_f64(5.0, 1e20, false).is_err());

        let spec = TimerSpec::from_secs_f64(1.5, 0.25, true).unwrap();
        assert_eq!(spec.interval, Duration::from_millis(1500));
        assert_eq!(spec.tolerance, Duration::from_millis(250));
        assert!(spec.start_immediately);
    }

    #[test]
    fn unschedulable_durations_are_rejected() {
        let huge = Duration::from_secs(u64::MAX / 2);

        let err = Timer::new(TimerSpec::new(huge)).unwrap_err();
        assert_eq!(err.as_label(), "runtime_invalid_timer");

        let spec = TimerSpec::new(Duration::from_secs(1)).with_tolerance(huge);
        assert!(Timer::new(spec).is_err());
        assert!(Timer::new(TimerSpec::new(Duration::MAX)).is_err());
    }

    #[test]
    fn ids_follow_creation_order() {
        let a = Timer::new(TimerSpec::new(Duration::from_secs(1))).unwrap();
        let b = Timer::new(TimerSpec::new(Duration::from_secs(1))).unwrap();
        assert!(a.id() < b.id());
        assert_eq!(a.clone().id(), a.id());
    }
}
