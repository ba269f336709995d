mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{TestService, harness, wait_until};
use procvisor::{ControlSignal, EventKind, LogLevel, ReloadOutcome, ShutdownState};

#[tokio::test(start_paused = true)]
async fn trigger_runs_idle_clients_and_skips_running_ones() {
    let h = harness();
    let idle = TestService::new("A").triggerable().arc();
    let running = TestService::new("B").triggerable().busy().arc();
    let plain = TestService::new("C").arc();
    h.state.register(idle.clone());
    h.state.register(running.clone());
    h.state.register(plain.clone());
    h.state.start_all(false).await.unwrap();

    let report = h.state.trigger().await;

    assert_eq!(report.ran, vec!["A"]);
    assert_eq!(report.skipped, vec!["B"]);
    assert!(report.failed.is_empty());
    assert_eq!(idle.runs(), 1);
    assert_eq!(running.runs(), 0);
    assert!(h.log.contains(LogLevel::Info, "Ignoring running B"));
    assert!(!h.log.contains(LogLevel::Notice, "No clients were run"));
}

#[tokio::test(start_paused = true)]
async fn trigger_with_no_idle_clients_reports_it() {
    let h = harness();
    let mut rx = h.state.bus().subscribe();
    h.state.register(TestService::new("A").triggerable().busy().arc());
    h.state.register(TestService::new("B").arc());
    h.state.start_all(false).await.unwrap();

    let report = h.state.trigger().await;

    assert!(report.is_empty());
    assert!(h.log.contains(LogLevel::Notice, "No clients were run"));

    let mut saw = false;
    while let Ok(ev) = rx.try_recv() {
        saw |= ev.kind == EventKind::NoClientsRun;
    }
    assert!(saw);
}

#[tokio::test(start_paused = true)]
async fn failing_client_run_does_not_affect_others() {
    let h = harness();
    let bad = TestService::new("A").triggerable().failing_run().arc();
    let good = TestService::new("B").triggerable().arc();
    h.state.register(bad.clone());
    h.state.register(good.clone());
    h.state.start_all(false).await.unwrap();

    let report = h.state.trigger().await;

    assert_eq!(report.ran, vec!["A", "B"]);
    assert_eq!(report.failed, vec!["A"]);
    assert_eq!(good.runs(), 1);
    assert!(h.log.contains(LogLevel::Err, "Could not run client A: run failed"));
}

#[tokio::test(start_paused = true)]
async fn reload_restarts_running_master_without_exec() {
    let h = harness();
    let master = TestService::new("master").restartable().busy().arc();
    h.state.register(TestService::new("agent").triggerable().arc());
    h.state.register(master.clone());
    h.state.start_all(false).await.unwrap();

    let outcome = h.state.reload().await;

    assert!(matches!(outcome, ReloadOutcome::Restarted { ref service } if service == "master"));
    assert_eq!(master.restarts(), 1);
    assert!(h.host.execs().is_empty());
    assert_eq!(h.state.shutdown_state(), ShutdownState::Running);
}

#[tokio::test(start_paused = true)]
async fn reload_without_running_master_relaunches() {
    let h = harness();
    let master = TestService::new("master").restartable().arc();
    let agent = TestService::new("agent").arc();
    h.state.register(master.clone());
    h.state.register(agent.clone());
    h.state.start_all(false).await.unwrap();

    let outcome = h.state.reload().await;

    assert!(matches!(outcome, ReloadOutcome::RelaunchFailed(_)));
    assert_eq!(master.restarts(), 0);
    assert_eq!(agent.shutdowns(), 1);
    assert_eq!(h.host.execs(), vec!["/usr/sbin/agentd --no-daemonize"]);
    assert!(h.host.exits().is_empty());
    assert_eq!(h.state.shutdown_state(), ShutdownState::Stopped);
    assert!(h.log.contains(LogLevel::Notice, "Restarting with '/usr/sbin/agentd --no-daemonize'"));
    assert!(h.log.contains(LogLevel::Err, "could not relaunch"));
}

#[tokio::test]
async fn reopen_logs_reopens_the_sink() {
    let h = harness();
    h.state.handle_signal(ControlSignal::ReopenLogs).await;
    h.state.handle_signal(ControlSignal::ReopenLogs).await;
    assert_eq!(h.log.reopen_count(), 2);
    assert!(h.log.contains(LogLevel::Notice, "Caught USR2; reopening logs"));
}

#[tokio::test(start_paused = true)]
async fn signals_reach_a_blocking_supervisor() {
    let h = harness();
    let agent = TestService::new("agent").triggerable().arc();
    h.state.register(agent.clone());

    let state = Arc::clone(&h.state);
    let main = tokio::spawn(async move { state.start_all(true).await });

    let control = h.state.control();
    control.send(ControlSignal::Trigger).await.unwrap();
    assert!(wait_until(Duration::from_secs(5), || agent.runs() == 1).await);
    assert!(h.log.contains(LogLevel::Notice, "Caught USR1; triggering client run"));

    control.send(ControlSignal::ReopenLogs).await.unwrap();
    assert!(wait_until(Duration::from_secs(5), || h.log.reopen_count() == 1).await);

    control
        .send(ControlSignal::Terminate { signal: "INT" })
        .await
        .unwrap();
    main.await.unwrap().unwrap();

    assert_eq!(h.host.exits(), vec![0]);
    assert_eq!(agent.shutdowns(), 1);
    assert!(h.log.contains(LogLevel::Notice, "Caught INT; shutting down"));
}
