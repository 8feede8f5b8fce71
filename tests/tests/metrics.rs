use loadsim::prelude::*;
use loadsim_tests::FakeLoad;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use std::sync::Arc;
use tokio::sync::oneshot;

#[tokio::test(start_paused = true)]
async fn outcomes_are_exported_per_scenario() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().unwrap();

    let config = LoadConfig::new("exported", 5, 1, 1);
    let load = Arc::new(FakeLoad::new(&config).rejecting([5]));

    let (tx, _rx) = oneshot::channel();
    let _ = Runner::new(load, config).run(CancellationToken::new(), tx).await;

    let mut success = None;
    let mut errors = None;
    let mut latencies = None;
    for (key, _, _, value) in snapshotter.snapshot().into_vec() {
        let key = key.key();
        assert!(key
            .labels()
            .any(|l| l.key() == "scenario" && l.value() == "exported"));

        match (key.name(), value) {
            ("loadsim_success", DebugValue::Counter(n)) => success = Some(n),
            ("loadsim_error", DebugValue::Counter(n)) => errors = Some(n),
            ("loadsim_latency", DebugValue::Histogram(samples)) => latencies = Some(samples.len()),
            _ => {}
        }
    }

    assert_eq!(success, Some(4));
    assert_eq!(errors, Some(1));
    assert_eq!(latencies, Some(5));
}
