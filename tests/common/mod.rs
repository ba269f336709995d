#![allow(dead_code)]

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use procvisor::{
    Host, Invocation, MemorySink, Monitorable, ProcessState, Restartable, Service, ServiceError,
    SupervisorConfig, Triggerable,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Host double: records exit codes and exec command lines instead of acting.
#[derive(Default)]
pub struct RecordingHost {
    exits: Mutex<Vec<i32>>,
    execs: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn exits(&self) -> Vec<i32> {
        self.exits.lock().clone()
    }

    pub fn execs(&self) -> Vec<String> {
        self.execs.lock().clone()
    }
}

impl Host for RecordingHost {
    fn exit(&self, code: i32) {
        self.exits.lock().push(code);
    }

    fn exec(&self, inv: &Invocation) -> io::Error {
        self.execs.lock().push(inv.command_line());
        io::Error::other("exec disabled in tests")
    }
}

pub struct Harness {
    pub state: Arc<ProcessState>,
    pub host: Arc<RecordingHost>,
    pub log: Arc<MemorySink>,
}

pub fn harness() -> Harness {
    let host = Arc::new(RecordingHost::default());
    let log = Arc::new(MemorySink::default());
    let state = ProcessState::builder(SupervisorConfig::default())
        .with_host(host.clone())
        .with_log(log.clone())
        .with_invocation(Invocation::new("/usr/sbin/agentd", ["--no-daemonize"]))
        .build()
        .expect("build process state");
    Harness { state, host, log }
}

#[derive(Clone, Copy, Default)]
enum StopMode {
    #[default]
    Clean,
    Hang,
    Fail,
}

/// Configurable service used across the integration tests.
pub struct TestService {
    name: String,
    fail_start: bool,
    ignore_cancel: bool,
    stop_mode: StopMode,
    triggerable: bool,
    restartable: bool,
    fail_run: bool,
    stop: CancellationToken,
    pub busy: AtomicBool,
    pub started: AtomicBool,
    pub runs: AtomicUsize,
    pub restarts: AtomicUsize,
    pub shutdowns: AtomicUsize,
}

impl TestService {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fail_start: false,
            ignore_cancel: false,
            stop_mode: StopMode::Clean,
            triggerable: false,
            restartable: false,
            fail_run: false,
            stop: CancellationToken::new(),
            busy: AtomicBool::new(false),
            started: AtomicBool::new(false),
            runs: AtomicUsize::new(0),
            restarts: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
        }
    }

    /// `start` returns an error right away.
    pub fn failing(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// `shutdown` never returns.
    pub fn hanging(mut self) -> Self {
        self.stop_mode = StopMode::Hang;
        self
    }

    /// `shutdown` returns an error.
    pub fn failing_shutdown(mut self) -> Self {
        self.stop_mode = StopMode::Fail;
        self
    }

    /// `start` ignores both cancellation and `shutdown`.
    pub fn stubborn(mut self) -> Self {
        self.ignore_cancel = true;
        self
    }

    pub fn triggerable(mut self) -> Self {
        self.triggerable = true;
        self
    }

    pub fn restartable(mut self) -> Self {
        self.restartable = true;
        self
    }

    /// `run_now` returns an error.
    pub fn failing_run(mut self) -> Self {
        self.fail_run = true;
        self
    }

    pub fn busy(self) -> Self {
        self.busy.store(true, Ordering::Release);
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::Acquire)
    }

    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::Acquire)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Service for TestService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
        self.started.store(true, Ordering::Release);
        if self.fail_start {
            return Err(ServiceError::fail("boom"));
        }
        if self.ignore_cancel {
            std::future::pending::<()>().await;
        }
        tokio::select! {
            _ = ctx.cancelled() => {}
            _ = self.stop.cancelled() => {}
        }
        Ok(())
    }

    async fn shutdown(&self, _deadline: Instant) -> Result<(), ServiceError> {
        self.shutdowns.fetch_add(1, Ordering::AcqRel);
        match self.stop_mode {
            StopMode::Clean => {
                self.stop.cancel();
                Ok(())
            }
            StopMode::Hang => std::future::pending().await,
            StopMode::Fail => Err(ServiceError::fail("stuck socket")),
        }
    }

    fn as_triggerable(&self) -> Option<&dyn Triggerable> {
        self.triggerable.then_some(self as &dyn Triggerable)
    }

    fn as_restartable(&self) -> Option<&dyn Restartable> {
        self.restartable.then_some(self as &dyn Restartable)
    }
}

impl Monitorable for TestService {
    fn is_running(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Triggerable for TestService {
    async fn run_now(&self) -> Result<(), ServiceError> {
        self.runs.fetch_add(1, Ordering::AcqRel);
        if self.fail_run {
            return Err(ServiceError::fail("run failed"));
        }
        Ok(())
    }
}

#[async_trait]
impl Restartable for TestService {
    async fn restart(&self) -> Result<(), ServiceError> {
        self.restarts.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

/// Polls `cond` every 10ms until it holds or `limit` elapses.
pub async fn wait_until(limit: Duration, cond: impl Fn() -> bool) -> bool {
    tokio::time::timeout(limit, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}
