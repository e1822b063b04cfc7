//! CLI entry point for the cross-border flow ingester.
//!
//! Fetches monthly physical flows between the home control area and each
//! configured neighbor from the ENTSO-E transparency platform, and merges
//! them into the monthly and daily JSON datasets.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Utc;
use clap::Parser;
use cross_border_flows::driver::{RunOptions, run};
use cross_border_flows::fetch::{BackoffPolicy, BasicClient};
use cross_border_flows::infra::entsoe::{DEFAULT_BASE_URL, TransparencyClient};
use cross_border_flows::neighbors::NeighborConfig;
use cross_border_flows::period::Month;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "cross_border_flows")]
#[command(about = "Ingest ENTSO-E cross-border physical flows into JSON datasets", long_about = None)]
struct Cli {
    /// Transparency platform security token
    #[arg(long, env = "ENTSOE_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Directory holding the monthly and daily datasets
    #[arg(short, long, default_value = "data/entsoe")]
    output_dir: PathBuf,

    /// Newest month to fetch (YYYY-MM); defaults to the last complete month
    #[arg(short, long, value_name = "YYYY-MM")]
    month: Option<Month>,

    /// Number of months to cover, ending at --month (capped at 24)
    #[arg(short, long, default_value_t = 1)]
    backfill: u32,

    /// Refetch months that are already stored
    #[arg(short, long, default_value_t = false)]
    force: bool,

    /// JSON file replacing the built-in neighbor table
    #[arg(long, env = "ENTSOE_NEIGHBORS_FILE")]
    neighbors: Option<PathBuf>,

    /// Transparency platform API endpoint
    #[arg(long, env = "ENTSOE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/cross_border_flows.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("cross_border_flows.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    if let Err(e) = ingest(cli).await {
        error!(error = ?e, "Run failed");
        return Err(e);
    }

    Ok(())
}

async fn ingest(cli: Cli) -> Result<()> {
    let Some(token) = cli.token.filter(|t| !t.trim().is_empty()) else {
        bail!("ENTSOE_API_TOKEN is not set");
    };

    let config = match &cli.neighbors {
        Some(path) => NeighborConfig::load(path)?,
        None => NeighborConfig::default(),
    };

    let target = cli.month.unwrap_or_else(|| Month::last_complete(Utc::now()));

    info!(
        home = config.home_domain(),
        neighbors = config.neighbors().len(),
        target = %target,
        backfill = cli.backfill,
        force = cli.force,
        output_dir = %cli.output_dir.display(),
        "Starting cross-border flow ingestion"
    );

    let source = TransparencyClient::new(
        BasicClient::new()?,
        token,
        &cli.base_url,
        BackoffPolicy::default(),
    )?;

    let options = RunOptions {
        output_dir: cli.output_dir,
        target,
        backfill: cli.backfill,
        force: cli.force,
    };

    let summary = run(&source, &config, &options).await?;

    if summary.fetched.is_empty() {
        info!("Nothing new to fetch");
    } else {
        let fetched: Vec<String> = summary.fetched.iter().map(Month::to_string).collect();
        info!(months = ?fetched, daily_written = summary.daily_written, "Datasets updated");
    }

    Ok(())
}
