//! # EventLoop: cooperative alarm dispatcher.
//!
//! The loop keeps one watch entry per monitored [`Timer`] (its next due time)
//! and blocks until the earliest one is due. Each round collects every timer
//! due within its own tolerance of "now", reschedules them under the lock and
//! then dispatches the alarms, oldest due time first.
//!
//! ```text
//! monitor(t) ──► watches[t] = now (+ interval unless start_immediately) ──► wake
//! ignore(t)  ──► watches.remove(t) ──► wake
//!
//! run():
//! loop {
//!   ├─► poll(now): due = { t | t.next <= now + min(t.tolerance, t.interval / 2) }, t.next += interval
//!   ├─► due empty → sleep_until(min next) or wake
//!   └─► for alarm in due (by next, id):
//!          skip if t was ignored meanwhile
//!          observers.on_alarm(&alarm)   (panics caught)
//!          publish AlarmDispatched
//! }
//! ```
//!
//! ## Rules
//! - Every due alarm is taken exactly once: rescheduling happens in the same
//!   critical section that collects it.
//! - A timer that fell behind by more than one interval skips the missed periods.
//! - Due times saturate far in the future instead of overflowing.
//! - An alarm fires early by at most its tolerance, capped at half an interval,
//!   so a timer fires once per period whatever its tolerance.
//! - Each delivered alarm publishes exactly one `AlarmDispatched`; an observer
//!   panic is carried as its reason.
//! - `monitor`/`ignore` may be called from any task while `run()` is active.
//! - The loop never returns; it ends with the process.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::{self, Instant};

use super::{Alarm, Timer, TimerId};
use crate::error::ServiceError;
use crate::events::{Bus, Event, EventKind};

/// Fallback distance for due times that would overflow `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn later(at: Instant, by: Duration) -> Instant {
    at.checked_add(by)
        .or_else(|| at.checked_add(FAR_FUTURE))
        .unwrap_or(at)
}

struct Watch {
    timer: Timer,
    next: Instant,
}

/// Single process-wide alarm dispatcher.
pub struct EventLoop {
    watches: Mutex<BTreeMap<TimerId, Watch>>,
    wake: Notify,
    dispatched: AtomicU64,
    bus: Bus,
}

impl EventLoop {
    pub fn new(bus: Bus) -> Self {
        Self {
            watches: Mutex::new(BTreeMap::new()),
            wake: Notify::new(),
            dispatched: AtomicU64::new(0),
            bus,
        }
    }

    /// Starts watching `timer`. Monitoring an already watched timer keeps its schedule.
    pub fn monitor(&self, timer: &Timer) {
        let now = Instant::now();
        let next = if timer.spec().start_immediately {
            now
        } else {
            later(now, timer.interval())
        };
        self.watches.lock().entry(timer.id()).or_insert_with(|| Watch {
            timer: timer.clone(),
            next,
        });
        self.wake.notify_one();
    }

    /// Stops watching `timer`; returns whether it was watched.
    pub fn ignore(&self, timer: &Timer) -> bool {
        let removed = self.watches.lock().remove(&timer.id()).is_some();
        if removed {
            self.wake.notify_one();
        }
        removed
    }

    pub fn is_monitoring(&self, timer: &Timer) -> bool {
        self.watches.lock().contains_key(&timer.id())
    }

    /// Number of watched timers.
    pub fn len(&self) -> usize {
        self.watches.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.lock().is_empty()
    }

    /// Total alarms delivered so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Acquire)
    }

    /// Dispatches alarms forever.
    pub async fn run(&self) {
        loop {
            let now = Instant::now();
            let (due, next) = self.poll(now);

            if due.is_empty() {
                let notified = self.wake.notified();
                match next {
                    Some(at) => {
                        tokio::select! {
                            _ = time::sleep_until(at) => {}
                            _ = notified => {}
                        }
                    }
                    None => notified.await,
                }
                continue;
            }

            for (scheduled, timer) in due {
                self.dispatch(&timer, scheduled, now).await;
            }
        }
    }

    /// Collects due timers (sorted by due time, then id) and the next wake-up.
    fn poll(&self, now: Instant) -> (Vec<(Instant, Timer)>, Option<Instant>) {
        let mut watches = self.watches.lock();
        let mut due = Vec::new();

        for watch in watches.values_mut() {
            let interval = watch.timer.interval();
            let window = watch.timer.tolerance().min(interval / 2);
            if watch.next <= later(now, window) {
                due.push((watch.next, watch.timer.clone()));

                watch.next = later(watch.next, interval);
                if watch.next <= now {
                    watch.next = later(now, interval);
                }
            }
        }
        due.sort_by_key(|(at, t)| (*at, t.id()));

        let next = watches.values().map(|w| w.next).min();
        (due, next)
    }

    async fn dispatch(&self, timer: &Timer, scheduled: Instant, fired: Instant) {
        // ignored while earlier alarms of this round were being delivered
        if !self.is_monitoring(timer) {
            return;
        }

        let alarm = Alarm {
            timer: timer.id(),
            seq: self.dispatched.fetch_add(1, Ordering::AcqRel) + 1,
            scheduled,
            fired,
        };

        let mut ev = Event::new(EventKind::AlarmDispatched).with_timer(alarm.timer.0);
        for obs in timer.observers() {
            let fut = obs.on_alarm(&alarm);
            if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                let err = ServiceError::from_panic(payload);
                tracing::error!(timer = %alarm.timer, observer = obs.name(), "alarm observer {err}");
                // first failing observer wins
                if ev.reason.is_none() {
                    ev = ev.with_service(obs.name()).with_reason(err.to_string());
                }
            }
        }

        tracing::trace!(timer = %alarm.timer, seq = alarm.seq, "alarm dispatched");
        self.bus.publish(ev);
    }
}
