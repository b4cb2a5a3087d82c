//! Metric exposition: the fixed catalog, the scrape collector, and the
//! HTTP endpoint Prometheus pulls from.

pub mod catalog;
pub mod collector;
pub mod server;

pub use catalog::MetricCatalog;
pub use collector::{Collector, GridCollector};
pub use server::MetricsServer;
