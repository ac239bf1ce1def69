//! Trailscope desktop dashboard
//!
//! Run with: cargo run --features gui --bin trailscope

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use trailscope::app::TrailApp;
use trailscope::DashboardConfig;

#[derive(Parser, Debug)]
#[command(name = "trailscope", about = "Live position-trail dashboard")]
struct Args {
    /// Tracking backend base URL (default: $TRACKER_API_URL or http://127.0.0.1:8000)
    #[arg(long)]
    api_url: Option<String>,

    /// Status poll interval in milliseconds (default: $TRACKER_POLL_MS or 50)
    #[arg(long)]
    poll_ms: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,trailscope=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();
    let config = DashboardConfig::from_env()?
        .with_overrides(args.api_url.as_deref(), args.poll_ms)?;
    info!(
        url = %config.api_base_url,
        poll_ms = config.poll_interval.as_millis() as u64,
        "Starting dashboard"
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Trailscope")
            .with_inner_size([1100.0, 700.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Trailscope",
        options,
        Box::new(|cc| Ok(Box::new(TrailApp::new(cc, config)))),
    )
    .map_err(|e| {
        error!(error = %e, "Dashboard exited with error");
        e.to_string().into()
    })
}
