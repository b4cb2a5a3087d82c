//! gridwatch - Grid Engine Prometheus exporter.
//!
//! Samples a Grid Engine cluster through its `qstat` reporting interface on
//! every scrape and exposes queue, host resource, and job gauges on a
//! `/metrics` endpoint.

use anyhow::Result;
use clap::Parser;
use gridwatch::{app::App, cli::Cli, config::Config, pid};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment,
    // and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        // Exit if configuration fails, as it's a critical step.
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!("gridwatch starting up...");
    info!("Listen Address: {}", config.listen_address);
    info!(
        "Snapshot Source: {}",
        if config.source.test_mode {
            "synthetic"
        } else {
            "qstat"
        }
    );
    if let Some(fixture) = &config.source.fixture {
        info!("Fixture: {}", fixture);
    }
    info!("SGE Cell: {}", config.sge.cell);
    info!("SGE Root: {}", config.sge.root.display());
    info!("Error Flags: {}", config.classifier.error_flags);

    // Die early if the SGE block cannot possibly drive qstat.
    config.validate()?;
    config.apply_sge_environment();

    if let Some(pidfile) = &config.pidfile {
        // The original service treats a pidfile failure as survivable;
        // supervision just loses the stale-instance guard.
        if let Err(err) = pid::acquire(pidfile) {
            warn!(
                "Unable to setup PID. Continuing without a PID File. Failure caused by: {}",
                err
            );
        }
    }

    let app = App::builder(config).build().await.map_err(|err| {
        error!("Failed to start: {err:#}");
        err
    })?;
    app.run().await
}
