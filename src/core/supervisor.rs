//! # Startup: workers, startup grace and the main loop.
//!
//! ```text
//! start_all(block):
//!   services snapshot ──► one worker per service (workers lock held while spawning)
//!       worker: ServiceStarting ─► service.start(child token)
//!                ├─ Ok / Canceled → stopped normally
//!                └─ Err / panic   → remove from registry, log, ServiceFailed + ServiceRemoved
//!                worker removes itself from the worker list ─► WorkerExited
//!   sleep(startup_grace)
//!   registry empty? ─► "No remaining services; exiting", host.exit(1), Err(NoRemainingServices)
//!   monitor every recorded timer, arm the loop
//!   block? ─► select { event_loop.run(), control_plane(), stopped }
//! ```
//!
//! ## Rules
//! - Services start in registration order; each on its own task.
//! - A failed start never affects other services.
//! - Once armed, timers created later are monitored on creation.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::process::{ProcessState, ServiceEntry, ServiceId, Worker};
use crate::error::{RuntimeError, ServiceError};
use crate::events::{Event, EventKind};

impl ProcessState {
    /// Starts every registered service, then runs the event loop if `block`.
    ///
    /// Returns `Err(NoRemainingServices)` (after `host.exit(1)`) when every
    /// service failed within the startup grace. With `block`, returns once a
    /// leaving shutdown has completed.
    pub async fn start_all(self: &Arc<Self>, block: bool) -> Result<(), RuntimeError> {
        self.spawn_workers();
        time::sleep(self.cfg.startup_grace).await;

        if self.service_count() == 0 {
            self.log.notice("No remaining services; exiting");
            self.bus.emit(EventKind::NoRemainingServices);
            let err = RuntimeError::NoRemainingServices;
            self.host.exit(err.exit_code());
            return Err(err);
        }

        {
            let timers = self.timers.lock();
            self.armed.store(true, Ordering::Release);
            for timer in timers.iter() {
                self.event_loop.monitor(timer);
            }
        }

        if block {
            self.run_loop().await;
        }
        Ok(())
    }

    /// Waits for every current worker to finish, without a bound.
    pub async fn join(&self) {
        let workers: Vec<Worker> = std::mem::take(&mut *self.workers.lock());
        for w in workers {
            let _ = w.join.await;
        }
    }

    async fn run_loop(self: &Arc<Self>) {
        let control = self.control_rx.lock().take();
        tokio::select! {
            _ = self.event_loop.run() => {}
            _ = self.control_plane(control) => {}
            _ = self.stopped.cancelled() => {}
        }
    }

    fn spawn_workers(self: &Arc<Self>) {
        let services = self.services_snapshot();
        let mut workers = self.workers.lock();
        for entry in services {
            let cancel = self.runtime.child_token();
            let id = entry.id;
            let name = Arc::clone(&entry.name);
            let join = tokio::spawn(Arc::clone(self).run_worker(entry, cancel.clone()));
            workers.push(Worker {
                id,
                name,
                cancel,
                join,
            });
        }
    }

    async fn run_worker(self: Arc<Self>, entry: ServiceEntry, ctx: CancellationToken) {
        self.bus.publish(
            Event::new(EventKind::ServiceStarting).with_service(Arc::clone(&entry.name)),
        );

        let res = AssertUnwindSafe(entry.service.start(ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(ServiceError::from_panic(payload)));

        match res {
            Ok(()) | Err(ServiceError::Canceled) => {
                self.log.debug(&format!("Service {} stopped", entry.name));
            }
            Err(err) => self.service_failed(&entry, err),
        }

        self.reap_worker(entry.id);
        self.bus
            .publish(Event::new(EventKind::WorkerExited).with_service(entry.name));
    }

    fn service_failed(&self, entry: &ServiceEntry, err: ServiceError) {
        let removed = self.remove_service(entry.id);

        if self.trace_enabled() {
            self.log.err(&format!("{err:?}"));
            self.log
                .err(&std::backtrace::Backtrace::force_capture().to_string());
        }
        self.log
            .err(&format!("Could not start {}: {err}", entry.name));

        self.bus.publish(
            Event::new(EventKind::ServiceFailed)
                .with_service(Arc::clone(&entry.name))
                .with_reason(err.to_string()),
        );
        if removed {
            self.bus.publish(
                Event::new(EventKind::ServiceRemoved).with_service(Arc::clone(&entry.name)),
            );
        }
    }

    fn reap_worker(&self, id: ServiceId) {
        self.workers.lock().retain(|w| w.id != id);
    }

    fn trace_enabled(&self) -> bool {
        self.config
            .get("trace")
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}
