mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{TestService, harness};
use procvisor::{EventKind, LogLevel, ShutdownState, TimerSpec};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn hung_service_is_bounded_and_others_still_stop() {
    let h = harness();
    let stuck = TestService::new("A").hanging().arc();
    let fine = TestService::new("B").arc();
    h.state.register(stuck.clone());
    h.state.register(fine.clone());
    h.state.start_all(false).await.unwrap();

    let t0 = Instant::now();
    h.state.shutdown(false).await;
    let took = t0.elapsed();

    assert!(took >= Duration::from_secs(20), "took {took:?}");
    assert!(took < Duration::from_secs(21), "took {took:?}");
    assert_eq!(stuck.shutdowns(), 1);
    assert_eq!(fine.shutdowns(), 1);
    assert!(h.log.contains(LogLevel::Err, "A could not shut down within 20 seconds"));
    assert_eq!(h.state.shutdown_state(), ShutdownState::Stopped);
    assert_eq!(h.state.worker_count(), 0);
    assert!(h.host.exits().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_errors_are_logged_and_sequence_continues() {
    let h = harness();
    let bad = TestService::new("A").failing_shutdown().arc();
    let good = TestService::new("B").arc();
    h.state.register(bad.clone());
    h.state.register(good.clone());
    h.state.start_all(false).await.unwrap();

    h.state.shutdown(true).await;

    assert_eq!(good.shutdowns(), 1);
    assert!(h.log.contains(LogLevel::Err, "A failed to shut down: stuck socket"));
    assert_eq!(h.host.exits(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn worker_ignoring_cancellation_is_abandoned() {
    let h = harness();
    h.state.register(TestService::new("stubborn").stubborn().arc());
    h.state.start_all(false).await.unwrap();
    let mut rx = h.state.bus().subscribe();

    let t0 = Instant::now();
    h.state.shutdown(false).await;
    let took = t0.elapsed();

    assert!(took >= Duration::from_secs(20), "took {took:?}");
    assert!(took < Duration::from_secs(21), "took {took:?}");

    let mut abandoned = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        if ev.kind == EventKind::WorkerAbandoned {
            abandoned.push(ev.service.as_deref().map(str::to_string));
        }
    }
    assert_eq!(abandoned, vec![Some("stubborn".to_string())]);
    assert_eq!(h.state.worker_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_shutdown_while_stopping_is_a_no_op() {
    let h = harness();
    h.state.register(TestService::new("A").hanging().arc());
    h.state.start_all(false).await.unwrap();

    let state = Arc::clone(&h.state);
    let first = tokio::spawn(async move { state.shutdown(false).await });
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.state.shutdown_state(), ShutdownState::Stopping);

    let t0 = Instant::now();
    h.state.shutdown(true).await;
    assert_eq!(t0.elapsed(), Duration::ZERO);
    assert!(h.host.exits().is_empty());

    first.await.unwrap();
    assert_eq!(h.state.shutdown_state(), ShutdownState::Stopped);

    // a later leaving shutdown still exits
    h.state.shutdown(true).await;
    assert_eq!(h.host.exits(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_monitoring_timers() {
    let h = harness();
    h.state.register(TestService::new("A").arc());
    let t = h
        .state
        .new_timer(TimerSpec::new(Duration::from_secs(3)), None)
        .unwrap();
    h.state.start_all(false).await.unwrap();
    assert!(h.state.event_loop().is_monitoring(&t));

    h.state.shutdown(false).await;

    assert!(!h.state.event_loop().is_monitoring(&t));
    assert!(h.state.event_loop().is_empty());
}
