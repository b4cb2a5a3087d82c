//! The HTTP endpoint Prometheus scrapes.
//!
//! A single-route axum server: every GET of `/metrics` triggers one full
//! collection cycle and returns the samples in the Prometheus text format.
//! The server is designed for graceful shutdown, listening to a signal from
//! the main application to stop serving requests and terminate cleanly.

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, TextEncoder};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, trace};

use crate::metrics::collector::Collector;

/// A server that exposes one collector to a Prometheus scraper.
pub struct MetricsServer {
    listener: TcpListener,
    collector: Arc<dyn Collector>,
    shutdown_rx: watch::Receiver<bool>,
}

/// The sample set could not be rendered into the text format.
#[derive(Debug)]
struct EncodeError;

impl IntoResponse for EncodeError {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
    }
}

impl MetricsServer {
    /// Creates a new `MetricsServer` but does not spawn it.
    ///
    /// The listener must already be bound; binding is the caller's
    /// startup-fatal concern, not the server's.
    pub fn new(
        listener: TcpListener,
        collector: Arc<dyn Collector>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        // Capability advertisement: the descriptor set is static and
        // available before the first scrape ever runs.
        debug!(
            descriptors = collector.describe().len(),
            "metrics server ready"
        );
        Self {
            listener,
            collector,
            shutdown_rx,
        }
    }

    /// Returns a future that runs the server until a shutdown signal is
    /// received.
    pub fn run(mut self) -> impl Future<Output = ()> {
        let app = Router::new()
            .route("/metrics", get(scrape))
            .with_state(self.collector);

        async move {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => {
                    trace!("Metrics server received shutdown signal via select.");
                }
                result = axum::serve(self.listener, app.into_make_service()) => {
                    if let Err(e) = result {
                        error!("Metrics server error: {}", e);
                    }
                }
            }
            trace!("Metrics server task finished.");
        }
    }
}

/// One scrape: collect, then render. A failed collection upstream already
/// degraded to an empty sample set, which renders as an empty (but valid)
/// exposition body.
async fn scrape(State(collector): State<Arc<dyn Collector>>) -> Result<String, EncodeError> {
    let families = collector.collect().await;
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&families, &mut buffer)
        .map_err(|e| {
            error!("failed to encode metric families: {}", e);
            EncodeError
        })?;
    String::from_utf8(buffer).map_err(|e| {
        error!("metrics exposition was not valid UTF-8: {}", e);
        EncodeError
    })
}
