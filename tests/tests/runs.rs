mod utils;
#[allow(unused)]
use utils::*;

use loadsim::prelude::*;
use loadsim::RunState;
use loadsim_tests::{FakeError, FakeLoad, RecordingReporter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

fn assert_ordered(stats: &Stats) {
    assert!(stats.min <= stats.p50, "{stats}");
    assert!(stats.p50 <= stats.p90, "{stats}");
    assert!(stats.p90 <= stats.p95, "{stats}");
    assert!(stats.p95 <= stats.p99, "{stats}");
    assert!(stats.p99 <= stats.max, "{stats}");
}

#[tokio::test(start_paused = true)]
async fn executes_rate_times_duration() {
    init();

    let config = LoadConfig::new("exact", 5, 2, 2);
    let load = Arc::new(FakeLoad::new(&config));
    let reporter = Arc::new(RecordingReporter::default());
    let runner = Runner::new(load.clone(), config).with_reporter(reporter.clone());
    let counters = runner.counters();
    let state = runner.state();

    let (tx, rx) = oneshot::channel();
    runner.run(CancellationToken::new(), tx).await.unwrap();
    let stats = rx.await.unwrap();

    assert_eq!((stats.total, stats.success, stats.fail), (10, 10, 0));
    assert_ordered(&stats);
    assert_eq!(load.seen(), (1..=10).collect::<Vec<_>>());
    assert_eq!(load.finalized(), 1);
    assert_eq!(*state.borrow(), RunState::Finalized);

    let counters = counters.snapshot();
    assert_eq!(counters.scheduled, 10);
    assert_eq!(counters.started, counters.completed);
    assert_eq!(counters.completed, stats.success + stats.fail);
    assert_eq!(
        reporter.lines().last().unwrap(),
        "summary scheduled=10 started=10 completed=10 failures=0"
    );
}

#[tokio::test(start_paused = true)]
async fn failures_surface_after_drain() {
    init();

    let config = LoadConfig::new("rejecting", 5, 2, 2);
    let load = Arc::new(FakeLoad::new(&config).rejecting([3, 7]));
    let reporter = Arc::new(RecordingReporter::default());
    let runner = Runner::new(load.clone(), config).with_reporter(reporter.clone());
    let counters = runner.counters();

    let (tx, rx) = oneshot::channel();
    let err = runner.run(CancellationToken::new(), tx).await.unwrap_err();

    let (request_id, source) = match err {
        RunError::Execution { request_id, source } => (request_id, source),
        other => panic!("expected an execution error, got {other}"),
    };
    assert!(request_id == 3 || request_id == 7);
    assert_eq!(
        source.downcast_ref::<FakeError>(),
        Some(&FakeError::Rejected(request_id))
    );

    // The run kept going and every request was still executed.
    let stats = rx.await.unwrap();
    assert_eq!((stats.total, stats.success, stats.fail), (10, 8, 2));
    assert_eq!(load.seen().len(), 10);
    assert_eq!(counters.snapshot().failed, 2);
    assert_eq!(reporter.count("failed"), 2);
}

#[tokio::test(start_paused = true)]
async fn in_flight_never_exceeds_concurrency() {
    init();

    let config = LoadConfig::new("bounded", 20, 1, 3);
    let load = Arc::new(FakeLoad::new(&config).with_delay(Duration::from_millis(200)));

    let (tx, rx) = oneshot::channel();
    Runner::new(load.clone(), config)
        .run(CancellationToken::new(), tx)
        .await
        .unwrap();

    let stats = rx.await.unwrap();
    assert_eq!(stats.total, 20);
    assert!(load.max_in_flight() <= 3);
    assert!(load.max_in_flight() >= 2);
    assert!(stats.min >= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn slow_backend_delays_but_never_drops() {
    init();

    // A single worker taking 300ms per request can only keep up with ~3 rps.
    let config = LoadConfig::new("backpressure", 10, 1, 1);
    let load = Arc::new(FakeLoad::new(&config).with_delay(Duration::from_millis(300)));
    let reporter = Arc::new(RecordingReporter::default());

    let start = Instant::now();
    let (tx, rx) = oneshot::channel();
    Runner::new(load.clone(), config)
        .with_reporter(reporter.clone())
        .run(CancellationToken::new(), tx)
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_secs(3));
    assert_eq!(rx.await.unwrap().total, 10);
    assert_eq!(load.seen(), (1..=10).collect::<Vec<_>>());
    assert!(reporter
        .lines()
        .contains(&"scheduler scheduled=10 cancelled=false".to_string()));
}

#[test]
#[ntest::timeout(10_000)]
fn simulated_backend_on_multi_thread_runtime() {
    init();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();

    let config = LoadConfig::new("simulated", 50, 1, 4);
    let load = loadsim_demos::SimulatedLoad::new(
        &config,
        Duration::from_millis(5),
        Duration::from_millis(1),
        0.,
    )
    .unwrap();

    let stats = rt.block_on(async move {
        let (tx, rx) = oneshot::channel();
        Runner::new(Arc::new(load), config)
            .run(CancellationToken::new(), tx)
            .await
            .unwrap();
        rx.await.unwrap()
    });

    assert_eq!((stats.total, stats.success, stats.fail), (50, 50, 0));
    assert!(stats.p50 >= Duration::from_millis(4));
    assert_ordered(&stats);
}
