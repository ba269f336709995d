//! # Control plane.
//!
//! Consumes [`ControlSignal`]s on an ordinary task and maps them to actions:
//!
//! | Signal       | Source           | Action                                   |
//! |--------------|------------------|------------------------------------------|
//! | `Terminate`  | SIGINT/TERM/QUIT | `shutdown(true)`                         |
//! | `Reload`     | SIGHUP           | restart the master service, or relaunch  |
//! | `Trigger`    | SIGUSR1          | run every idle triggerable service       |
//! | `ReopenLogs` | SIGUSR2          | reopen the log sink                      |
//!
//! Every action is also callable directly on [`ProcessState`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;

use super::process::ProcessState;
use super::signals::ControlSignal;
use crate::error::{RuntimeError, ServiceError};
use crate::events::{Event, EventKind};

/// Outcome of a [`ProcessState::trigger`] request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerReport {
    /// Services whose `run_now` was invoked (including failed runs).
    pub ran: Vec<String>,
    /// Services skipped because they were already running.
    pub skipped: Vec<String>,
    /// Subset of `ran` whose run returned an error.
    pub failed: Vec<String>,
}

impl TriggerReport {
    pub fn is_empty(&self) -> bool {
        self.ran.is_empty()
    }
}

/// What a reload request did.
#[derive(Debug)]
pub enum ReloadOutcome {
    /// The running master service restarted itself.
    Restarted { service: String },
    /// The master service's restart failed.
    RestartFailed { service: String, error: ServiceError },
    /// The process relaunch failed; everything is already shut down.
    RelaunchFailed(RuntimeError),
}

impl ProcessState {
    pub(super) async fn control_plane(
        self: &Arc<Self>,
        rx: Option<mpsc::Receiver<ControlSignal>>,
    ) {
        let Some(mut rx) = rx else {
            return std::future::pending().await;
        };
        while let Some(signal) = rx.recv().await {
            self.handle_signal(signal).await;
        }
        std::future::pending::<()>().await
    }

    /// Performs the action bound to `signal`.
    pub async fn handle_signal(&self, signal: ControlSignal) {
        tracing::debug!(signal = signal.as_label(), "control signal");
        match signal {
            ControlSignal::Terminate { signal } => {
                self.log.notice(&format!("Caught {signal}; shutting down"));
                self.shutdown(true).await;
            }
            ControlSignal::Reload => {
                self.log.notice("Caught HUP; restarting");
                self.reload().await;
            }
            ControlSignal::Trigger => {
                self.log.notice("Caught USR1; triggering client run");
                self.trigger().await;
            }
            ControlSignal::ReopenLogs => {
                self.log.notice("Caught USR2; reopening logs");
                self.reopen_logs();
            }
        }
    }

    /// Runs every idle triggerable service, in registry order, one after another.
    pub async fn trigger(&self) -> TriggerReport {
        let mut report = TriggerReport::default();

        for entry in self.services_snapshot() {
            let Some(client) = entry.service.as_triggerable() else {
                continue;
            };
            let name = entry.name.to_string();

            if client.is_running() {
                self.log.info(&format!("Ignoring running {name}"));
                self.bus.publish(
                    Event::new(EventKind::ClientSkipped).with_service(Arc::clone(&entry.name)),
                );
                report.skipped.push(name);
                continue;
            }

            let res = AssertUnwindSafe(client.run_now())
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(ServiceError::from_panic(payload)));

            let mut ev = Event::new(EventKind::ClientRun).with_service(Arc::clone(&entry.name));
            if let Err(err) = res {
                self.log.err(&format!("Could not run client {name}: {err}"));
                ev = ev.with_reason(err.to_string());
                report.failed.push(name.clone());
            }
            self.bus.publish(ev);
            report.ran.push(name);
        }

        if report.is_empty() {
            self.log.notice("No clients were run");
            self.bus.emit(EventKind::NoClientsRun);
        }
        report
    }

    /// Restarts the master service if it is running, otherwise relaunches the process.
    ///
    /// The master service is the first registered service that is
    /// [`Restartable`](crate::Restartable).
    pub async fn reload(&self) -> ReloadOutcome {
        let master = self
            .services_snapshot()
            .into_iter()
            .find(|e| e.service.as_restartable().is_some());

        if let Some(entry) = master {
            if let Some(svc) = entry.service.as_restartable() {
                if svc.is_running() {
                    let service = entry.name.to_string();
                    self.log.notice(&format!("Restarting {service}"));
                    self.bus.publish(
                        Event::new(EventKind::RestartRequested)
                            .with_service(Arc::clone(&entry.name)),
                    );
                    let res = AssertUnwindSafe(svc.restart())
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|payload| Err(ServiceError::from_panic(payload)));
                    return match res {
                        Ok(()) => ReloadOutcome::Restarted { service },
                        Err(error) => {
                            self.log
                                .err(&format!("Could not restart {service}: {error}"));
                            ReloadOutcome::RestartFailed { service, error }
                        }
                    };
                }
            }
        }

        ReloadOutcome::RelaunchFailed(self.restart().await)
    }

    /// Shuts down (without leaving) and re-executes the captured invocation.
    ///
    /// Only returns when the exec failed.
    pub async fn restart(&self) -> RuntimeError {
        let inv = self.invocation();
        let command = inv.command_line();
        self.bus.emit(EventKind::RestartRequested);
        self.log.notice(&format!("Restarting with '{command}'"));

        self.shutdown(false).await;

        let source = self.host.exec(&inv);
        let err = RuntimeError::Relaunch { command, source };
        self.log.err(&err.to_string());
        err
    }

    /// Reopens the log sink's destination.
    pub fn reopen_logs(&self) {
        let mut ev = Event::new(EventKind::LogsReopened);
        match self.log.reopen() {
            Ok(()) => self.log.info("Reopened logs"),
            Err(err) => {
                self.log.err(&format!("Could not reopen logs: {err}"));
                ev = ev.with_reason(err.to_string());
            }
        }
        self.bus.publish(ev);
    }
}
