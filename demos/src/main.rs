use clap::Parser;
use loadsim::prelude::*;
use loadsim::UniformJitter;
use loadsim_demos::SimulatedLoad;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_FILTER: &str = "loadsim=info,loadsim_demo=info,loadsim_demos=info";

/// Drive a simulated backend at a fixed rate.
#[derive(Parser, Debug)]
#[command(version = "0.1")]
struct Cli {
    /// Scenario name used in logs and metric labels.
    #[arg(long, env = "LOADSIM_NAME", default_value = "simulated")]
    name: String,

    /// Requests per second.
    #[arg(short, long, env = "LOADSIM_RATE", default_value_t = 10)]
    rate: u32,

    /// Run duration in seconds.
    #[arg(short, long, env = "LOADSIM_DURATION", default_value_t = 10)]
    duration: u32,

    /// Number of workers; at most 100.
    #[arg(short, long, env = "LOADSIM_CONCURRENCY", default_value_t = 4)]
    concurrency: u32,

    /// Maximum random delay added to each fire time, e.g. `5ms`.
    #[arg(long, env = "LOADSIM_JITTER", value_parser = humantime::parse_duration)]
    jitter: Option<Duration>,

    /// Typical latency of the simulated backend.
    #[arg(long, default_value = "20ms", value_parser = humantime::parse_duration)]
    latency: Duration,

    /// Spread of the simulated latency; `0s` makes it constant.
    #[arg(long, default_value = "5ms", value_parser = humantime::parse_duration)]
    latency_std: Duration,

    /// Fraction of requests answered with an error status.
    #[arg(long, default_value_t = 0.)]
    error_rate: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    FmtSubscriber::builder().with_env_filter(filter).init();

    let args = Cli::parse();

    let mut config = LoadConfig::new(&args.name, args.rate, args.duration, args.concurrency);
    if let Some(jitter) = args.jitter {
        config = config.with_jitter(jitter);
    }

    let load = SimulatedLoad::new(&config, args.latency, args.latency_std, args.error_rate)?;
    let mut runner = Runner::new(Arc::new(load), config);
    if let Some(jitter) = args.jitter {
        runner = runner.with_jitter(UniformJitter::new(jitter));
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling the run.");
                cancel.cancel();
            }
        }
    });

    let (stats_tx, stats_rx) = oneshot::channel();
    let res = runner.run(cancel, stats_tx).await;

    if let Ok(stats) = stats_rx.await {
        info!("Stats: {stats}");
    }

    res?;
    Ok(())
}
