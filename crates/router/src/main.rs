//! evrouter - Cluster event fan-out
//!
//! Watches a stream of cluster events and delivers each one to a single
//! configured destination, coalescing bursts into batched writes for the
//! network-facing sinks.
//!
//! The watch collaborator is pluggable; this binary reads newline-
//! delimited JSON notifications from stdin or a file, which is also the
//! shape a control-plane adapter produces:
//!
//! ```text
//! {"verb":"ADDED","event":{...}}
//! {"verb":"UPDATED","event":{...},"old_event":{...}}
//! ```
//!
//! # Usage
//!
//! ```bash
//! evrouter --config configs/evrouter.toml
//! kubectl-events-adapter | evrouter --config configs/evrouter.toml
//! evrouter --config configs/evrouter.toml --input events.ndjson
//! ```

mod feed;
mod router;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use evr_config::Config;
use evr_metrics::EventMetrics;
use evr_sinks::build_sink;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::feed::run_feed;
use crate::router::EventRouter;

/// Cluster event fan-out
#[derive(Parser, Debug)]
#[command(name = "evrouter")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/evrouter.toml")]
    config: PathBuf,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Read event notifications from this file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or_else(|| config.log.level.as_str());
    init_logging(level)?;

    tracing::info!(sink = %config.sink, "starting event router");

    let metrics = Arc::new(EventMetrics::new(config.metrics.enabled));
    let running = build_sink(&config).await.context("failed to build sink")?;
    let router = EventRouter::new(running.sink(), config.filter.clone(), Arc::clone(&metrics));

    // Cooperative shutdown: the feed stops at the next line boundary, the
    // sink finishes its in-flight delivery before exiting.
    let stop = CancellationToken::new();
    tokio::spawn({
        let stop = stop.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("signal received, shutting down");
                stop.cancel();
            }
        }
    });

    let stats = match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open input file {}", path.display()))?;
            run_feed(BufReader::new(file), &router, stop.clone()).await
        }
        None => run_feed(BufReader::new(tokio::io::stdin()), &router, stop.clone()).await,
    };

    tracing::info!(
        processed = stats.processed,
        malformed = stats.malformed,
        "event feed finished"
    );

    running.shutdown().await;

    let snapshot = metrics.snapshot();
    tracing::info!(
        normal = snapshot.normal_total,
        warning = snapshot.warning_total,
        info = snapshot.info_total,
        unknown = snapshot.unknown_total,
        "event counters at shutdown"
    );

    Ok(())
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    Ok(())
}
