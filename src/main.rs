//! draw-ranker batch entrypoint.
//! Loads configuration, runs one acquisition + ranking pass over both games and
//! writes the Prometheus exposition next to the artifacts.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use draw_ranker::ingest::fetch::HttpFetcher;
use draw_ranker::store::write_atomic;
use draw_ranker::{run_once, Classifiers, LogDelivery, PipelineConfig};

/// Compact logs by default, JSON lines when `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("draw_ranker=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn run() -> Result<()> {
    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("installing prometheus recorder")?;

    let cfg = PipelineConfig::load_default()?;
    tracing::info!(
        data_dir = %cfg.data_dir.display(),
        mode = ?cfg.mode,
        limit = cfg.limit,
        window = cfg.window,
        "config loaded"
    );

    let fetcher = HttpFetcher::new(
        &cfg.user_agent,
        Duration::from_secs(cfg.retry.request_timeout_secs),
    )?;
    let classifiers = Classifiers::from_config(&cfg);

    let outcome = run_once(&cfg, Arc::new(fetcher), &classifiers, &LogDelivery).await;

    // Exposition is written even when the run failed.
    let metrics_path = cfg.metrics_path();
    if let Err(e) = write_atomic(&metrics_path, prometheus.render().as_bytes()) {
        tracing::warn!(error = %e, "metrics exposition not written");
    }

    let report = outcome?;
    tracing::info!(
        primary = ?report.artifact.ranking_primary,
        secondary = ?report.artifact.ranking_secondary,
        delivery = ?report.delivery,
        "run complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run failed");
            ExitCode::FAILURE
        }
    }
}
