//! # Daemon Example
//!
//! A small daemon with two services:
//! - `agent`: runs one unit of work on every alarm of the shared run timer,
//!   and on demand via SIGUSR1;
//! - `heartbeat`: logs every few seconds until cancelled.
//!
//! ## Run
//! ```bash
//! cargo run --example daemon
//! kill -USR1 <pid>   # run the agent now
//! kill -USR2 <pid>   # reopen logs
//! kill -HUP  <pid>   # re-exec
//! kill -TERM <pid>   # shut down
//! ```
//!
//! `PROCVISOR_LEVEL` sets the log level, `PROCVISOR_LOG` a log file.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use procvisor::{
    Alarm, LogConfig, LogLevel, LogSink, Monitorable, ObserverFn, ProcessState, Service,
    ServiceError, ServiceFn, SupervisorConfig, Triggerable,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct Agent {
    log: Arc<dyn LogSink>,
    busy: AtomicBool,
    runs: AtomicU64,
    stop: CancellationToken,
}

impl Agent {
    async fn run_once(&self) -> Result<(), ServiceError> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let n = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
        self.log.notice(&format!("agent run #{n}"));
        tokio::time::sleep(Duration::from_millis(200)).await;
        self.busy.store(false, Ordering::Release);
        Ok(())
    }
}

#[async_trait]
impl Service for Agent {
    fn name(&self) -> &str {
        "agent"
    }

    async fn start(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
        tokio::select! {
            _ = ctx.cancelled() => {}
            _ = self.stop.cancelled() => {}
        }
        Ok(())
    }

    async fn shutdown(&self, _deadline: Instant) -> Result<(), ServiceError> {
        self.stop.cancel();
        Ok(())
    }

    fn as_triggerable(&self) -> Option<&dyn Triggerable> {
        Some(self)
    }
}

impl Monitorable for Agent {
    fn is_running(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Triggerable for Agent {
    async fn run_now(&self) -> Result<(), ServiceError> {
        self.run_once().await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level: LogLevel = std::env::var("PROCVISOR_LEVEL")
        .ok()
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or_default();
    let log = procvisor::logging::init(&LogConfig {
        level,
        file: std::env::var_os("PROCVISOR_LOG").map(Into::into),
    })?;

    let state = ProcessState::builder(SupervisorConfig::default())
        .with_log(log.clone())
        .build()?;
    if state.gen_config()? {
        return Ok(());
    }
    state.forward_os_signals()?;
    state.config().set("runinterval", 30_i64)?;

    let agent = Arc::new(Agent {
        log: log.clone(),
        busy: AtomicBool::new(false),
        runs: AtomicU64::new(0),
        stop: CancellationToken::new(),
    });
    let on_alarm = Arc::clone(&agent);
    state.timer()?.observe(ObserverFn::arc(move |_alarm: Alarm| {
        let agent = Arc::clone(&on_alarm);
        async move {
            let _ = agent.run_once().await;
        }
    }));
    state.register(agent);

    let beat_log = log.clone();
    state.register(ServiceFn::arc("heartbeat", move |ctx: CancellationToken| {
        let log = beat_log.clone();
        async move {
            let mut tick = tokio::time::interval(Duration::from_secs(5));
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => return Ok::<_, ServiceError>(()),
                    _ = tick.tick() => log.info("heartbeat"),
                }
            }
        }
    }));

    log.notice(&format!("{} {} starting", state.name(), procvisor::version()));
    state.start_all(true).await?;
    Ok(())
}
