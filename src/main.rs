//! Headless sampler: polls the tracking backend and logs trail statistics
//!
//! Run with: cargo run --features cli --bin trail-cli

use clap::Parser;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use trailscope::control::{set_target, ControlAck};
use trailscope::core::{TrackingSession, TrailBuffer, JITTER_THRESHOLD};
use trailscope::time::now_seconds;
use trailscope::{DashboardConfig, StatusPoller};

#[derive(Parser, Debug)]
#[command(name = "trail-cli", about = "Headless position-trail sampler")]
struct Args {
    /// Tracking backend base URL (default: $TRACKER_API_URL or http://127.0.0.1:8000)
    #[arg(long)]
    api_url: Option<String>,

    /// Status poll interval in milliseconds (default: $TRACKER_POLL_MS or 50)
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Target prompt sent before sampling starts, e.g. "blue blob"
    #[arg(long)]
    target: Option<String>,

    /// Stop after this many seconds (runs until Ctrl-C otherwise)
    #[arg(long, value_parser = parse_duration_secs)]
    duration: Option<Duration>,
}

/// Positive, finite number of seconds
fn parse_duration_secs(arg: &str) -> Result<Duration, String> {
    let secs: f64 = arg
        .trim()
        .parse()
        .map_err(|_| format!("{arg:?} is not a number of seconds"))?;
    if secs <= 0.0 {
        return Err(format!("duration must be positive, got {secs}"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid duration {arg:?}: {e}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,trailscope=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();
    let config = DashboardConfig::from_env()?
        .with_overrides(args.api_url.as_deref(), args.poll_ms)?;

    if let Some(prompt) = &args.target {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        match set_target(&client, &config.target_url(), prompt).await {
            Ok(ControlAck::TargetSwitched { color, .. }) => info!(color = %color, "Target set"),
            Ok(other) => warn!(?other, "Unexpected control reply"),
            Err(e) => error!(error = %e, prompt = %prompt, "Failed to set target"),
        }
    }

    let mut session =
        TrackingSession::new(TrailBuffer::with_limits(config.trail_length, JITTER_THRESHOLD));
    let epoch = session.start(now_seconds());
    let poller = StatusPoller::spawn(&config, epoch);

    let deadline = async {
        match args.duration {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut drain_interval = tokio::time::interval(config.poll_interval);
    let mut stats_interval = tokio::time::interval(Duration::from_secs(5));
    stats_interval.tick().await;

    info!(url = %config.status_url(), epoch, "Sampling, Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = &mut deadline => {
                info!("Duration elapsed");
                break;
            }
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    error!(error = %e, "Failed to listen for Ctrl-C");
                }
                break;
            }
            _ = drain_interval.tick() => {
                while let Ok(msg) = poller.rx.try_recv() {
                    session.apply(msg, now_seconds());
                }
            }
            _ = stats_interval.tick() => {
                let stats = session.stats();
                let snapshot = session.snapshot();
                info!(
                    rate_hz = session.observed_rate(),
                    trail_len = session.trail().len(),
                    target = %snapshot.target,
                    detection = ?snapshot.detection,
                    polls_ok = stats.polls_ok,
                    polls_failed = stats.polls_failed,
                    stale = stats.stale_discarded,
                    malformed = stats.malformed,
                    state = poller.state().label(),
                    "stats"
                );
            }
        }
    }

    poller.stop();
    session.stop();
    info!(samples = session.stats().samples_accepted, "Stopped");
    Ok(())
}
