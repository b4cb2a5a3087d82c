//! The main application logic, decoupled from the entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::Config;
use crate::metrics::{GridCollector, MetricCatalog, MetricsServer};
use crate::sge::{JobClassifier, QstatSource, SnapshotSource, SyntheticSource};

/// A handle to the running application.
pub struct App {
    metrics_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    server_task: JoinHandle<()>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The address the exposition endpoint actually bound to. Useful when
    /// the configured port was 0.
    pub fn metrics_addr(&self) -> SocketAddr {
        self.metrics_addr
    }

    /// Serves until interrupted, then shuts down gracefully.
    pub async fn run(self) -> Result<()> {
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for shutdown signal")?;
        info!("Shutdown signal received. Shutting down gracefully...");
        self.shutdown().await;
        Ok(())
    }

    /// Stops the metrics server and waits for it to finish.
    pub async fn shutdown(self) {
        // Receivers going away is fine; the task is already gone.
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.server_task.await {
            error!("Metrics server task panicked: {:?}", e);
        }
    }
}

/// Builder for the main application.
///
/// Separates constructing the application's components from running them,
/// and provides an override seam so tests can substitute the snapshot
/// source.
pub struct AppBuilder {
    config: Config,
    source_override: Option<Arc<dyn SnapshotSource>>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            source_override: None,
        }
    }

    /// Overrides the snapshot source for testing.
    pub fn source_override(mut self, source: Arc<dyn SnapshotSource>) -> Self {
        self.source_override = Some(source);
        self
    }

    /// Wires the collector and starts the metrics server.
    ///
    /// Failing to bind the exposition listener is fatal here, at startup;
    /// nothing that happens later on the scrape path is.
    pub async fn build(self) -> Result<App> {
        let catalog = MetricCatalog::new().context("failed to build the metric catalog")?;
        let classifier = JobClassifier::new(&self.config.classifier.error_flags);

        let source: Arc<dyn SnapshotSource> = match self.source_override {
            Some(source) => source,
            None if self.config.source.test_mode => Arc::new(SyntheticSource::new(
                self.config.source.fixture.clone(),
                self.config.source.seed,
            )),
            None => Arc::new(QstatSource::new(self.config.source.qstat_binary.clone())),
        };
        info!(source = source.name(), "snapshot source selected");

        let collector = Arc::new(GridCollector::new(catalog, source, classifier));

        let listener = TcpListener::bind(self.config.listen_address)
            .await
            .with_context(|| {
                format!(
                    "failed to bind metrics server to {}",
                    self.config.listen_address
                )
            })?;
        let metrics_addr = listener
            .local_addr()
            .context("failed to get local address for metrics server")?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = MetricsServer::new(listener, collector, shutdown_rx);
        let server_task = tokio::spawn(server.run());
        info!("Getting ready to serve metrics on {}", metrics_addr);

        Ok(App {
            metrics_addr,
            shutdown_tx,
            server_task,
        })
    }
}
