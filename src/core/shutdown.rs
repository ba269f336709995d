//! # Bounded shutdown.
//!
//! ```text
//! shutdown(leave):
//!   Running ──CAS──► Stopping        (Stopping: no-op; Stopped: only the exit step)
//!   stop monitoring every timer
//!   for service in registry order:
//!       timeout(shutdown_timeout, service.shutdown(deadline))
//!         ├─ error/panic → logged, continue
//!         └─ elapsed     → "<name> could not shut down within N seconds", continue
//!   cancel every worker token
//!   for worker: timeout(join_timeout, join) ─ elapsed → abandoned (WorkerAbandoned)
//!   ──► Stopped, ShutdownComplete
//!   leave? ─► host.exit(0), release start_all(true)
//! ```
//!
//! ## Rules
//! - One slow or failing service never blocks the others beyond its bound.
//! - Concurrent calls while `Stopping` return immediately.
//! - Abandoned workers are detached, not aborted.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;

use futures::FutureExt;
use tokio::time::{self, Instant};

use super::process::{ProcessState, ShutdownState, Worker};
use crate::error::ServiceError;
use crate::events::{Event, EventKind};

impl ProcessState {
    /// Stops every service within bounds. With `leave`, exits the process (code 0).
    pub async fn shutdown(&self, leave: bool) {
        let begun = self.state.compare_exchange(
            ShutdownState::Running.as_u8(),
            ShutdownState::Stopping.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        match begun.map_err(ShutdownState::from_u8) {
            Ok(_) => {}
            Err(ShutdownState::Stopped) => {
                if leave {
                    self.leave();
                }
                return;
            }
            Err(_) => {
                self.log.debug("Shutdown already in progress");
                return;
            }
        }

        self.log.notice("Shutting down");
        self.bus.emit(EventKind::ShutdownRequested);

        for timer in self.timers.lock().iter() {
            self.event_loop.ignore(timer);
        }

        self.stop_services().await;
        self.join_workers().await;

        self.state
            .store(ShutdownState::Stopped.as_u8(), Ordering::Release);
        self.bus.emit(EventKind::ShutdownComplete);

        if leave {
            self.leave();
        }
    }

    fn leave(&self) {
        self.host.exit(0);
        self.stopped.cancel();
    }

    async fn stop_services(&self) {
        let bound = self.cfg.shutdown_timeout;
        for entry in self.services_snapshot() {
            let deadline = Instant::now() + bound;
            let call = AssertUnwindSafe(entry.service.shutdown(deadline)).catch_unwind();

            match time::timeout(bound, call).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(err))) => {
                    self.log
                        .err(&format!("{} failed to shut down: {err}", entry.name));
                }
                Ok(Err(payload)) => {
                    let err = ServiceError::from_panic(payload);
                    self.log
                        .err(&format!("{} failed to shut down: {err}", entry.name));
                }
                Err(_elapsed) => {
                    self.log.err(&format!(
                        "{} could not shut down within {} seconds",
                        entry.name,
                        bound.as_secs()
                    ));
                    self.bus.publish(
                        Event::new(EventKind::ServiceShutdownTimeout)
                            .with_service(entry.name)
                            .with_timeout(bound),
                    );
                }
            }
        }
    }

    async fn join_workers(&self) {
        let workers: Vec<Worker> = std::mem::take(&mut *self.workers.lock());
        for w in &workers {
            w.cancel.cancel();
        }

        let bound = self.cfg.join_timeout;
        for w in workers {
            if time::timeout(bound, w.join).await.is_err() {
                self.log
                    .debug(&format!("Abandoning worker for {}", w.name));
                self.bus.publish(
                    Event::new(EventKind::WorkerAbandoned)
                        .with_service(w.name)
                        .with_timeout(bound),
                );
            }
        }
    }
}
