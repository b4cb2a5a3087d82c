//! The scrape pipeline: source → parser → normalizer → labeled samples.

use std::sync::Arc;

use async_trait::async_trait;
use prometheus::core::{Collector as PromCollector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::GaugeVec;
use tracing::{debug, error};

use crate::metrics::catalog::MetricCatalog;
use crate::sge::resources::{self, ResourceKind};
use crate::sge::types::{JobState, QueueState};
use crate::sge::{parse_report, JobClassifier, SnapshotSource};

/// Queue label applied to jobs that are not yet assigned anywhere.
const PENDING_QUEUE: &str = "pending";

/// The two-phase exposition contract: advertise the full descriptor set,
/// then produce one freshly computed sample set per scrape.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Every descriptor this collector can emit. Callable before any
    /// `collect`, and independent of scheduler availability.
    fn describe(&self) -> Vec<&Desc>;

    /// Runs one full scrape. A failed scrape yields an empty sample set,
    /// never an error: unavailability is an operational condition, not a
    /// protocol one.
    async fn collect(&self) -> Vec<MetricFamily>;
}

/// Collector over a Grid Engine snapshot source.
///
/// Holds only read-only state (catalog, source handle, classifier), so
/// concurrent scrapes are independent: each builds its own snapshot and its
/// own sample vectors.
pub struct GridCollector {
    catalog: MetricCatalog,
    source: Arc<dyn SnapshotSource>,
    classifier: JobClassifier,
}

impl GridCollector {
    pub fn new(
        catalog: MetricCatalog,
        source: Arc<dyn SnapshotSource>,
        classifier: JobClassifier,
    ) -> Self {
        Self {
            catalog,
            source,
            classifier,
        }
    }

    fn record_queue(&self, values: &ScrapeValues, queue: &QueueState) {
        let (queue_name, hostname) = match queue.split_name() {
            Ok(parts) => parts,
            Err(err) => {
                // One bad queue never takes the scrape down; it just
                // contributes no series.
                error!(error = %err, "dropping queue with unparseable composite name");
                return;
            }
        };
        let labels = [hostname, queue_name];

        values
            .total_slots
            .with_label_values(&labels)
            .set(f64::from(queue.slots_total));
        values
            .used_slots
            .with_label_values(&labels)
            .set(f64::from(queue.slots_used));
        values
            .reserved_slots
            .with_label_values(&labels)
            .set(f64::from(queue.slots_reserved));

        let gauges = [
            (&values.load_average, ResourceKind::LoadAverage),
            (&values.free_memory, ResourceKind::MemFree),
            (&values.used_memory, ResourceKind::MemUsed),
            (&values.total_memory, ResourceKind::MemTotal),
            (&values.cpu_utilization, ResourceKind::CpuUtilization),
        ];
        for (gauge, kind) in gauges {
            gauge
                .with_label_values(&labels)
                .set(self.resource_or_zero(queue, hostname, kind));
        }

        for job in &queue.jobs {
            self.record_job(values, hostname, queue_name, job);
        }
    }

    /// The per-resource degradation rule: a missing or unparseable value is
    /// logged and emitted as zero, so every declared series carries a sample
    /// on every scrape.
    fn resource_or_zero(&self, queue: &QueueState, hostname: &str, kind: ResourceKind) -> f64 {
        resources::resolve(&queue.resources, kind).unwrap_or_else(|err| {
            error!(hostname, queue = %queue.name, error = %err, "resource extraction failed, substituting 0");
            0.0
        })
    }

    fn record_job(&self, values: &ScrapeValues, hostname: &str, queue: &str, job: &JobState) {
        let number = job.number.to_string();
        let task_id = job.task_label();
        let labels = [
            hostname,
            queue,
            job.name.as_str(),
            job.owner.as_str(),
            number.as_str(),
            task_id.as_str(),
            job.state.as_str(),
        ];

        values
            .job_state
            .with_label_values(&labels)
            .set(flag(self.classifier.is_running(&job.state)));
        values
            .job_priority
            .with_label_values(&labels)
            .set(job.priority);
        values
            .job_slots
            .with_label_values(&labels)
            .set(f64::from(job.slots));
        values
            .job_errors
            .with_label_values(&labels)
            .set(flag(self.classifier.is_errored(&job.state)));
    }
}

#[async_trait]
impl Collector for GridCollector {
    fn describe(&self) -> Vec<&Desc> {
        self.catalog.descs()
    }

    async fn collect(&self) -> Vec<MetricFamily> {
        let raw = match self.source.fetch().await {
            Ok(raw) => raw,
            Err(err) => {
                error!(source = self.source.name(), error = %err, "scheduler report unavailable, emitting nothing this scrape");
                return Vec::new();
            }
        };

        let snapshot = match parse_report(&raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(source = self.source.name(), error = %err, "discarding undecodable report, emitting nothing this scrape");
                return Vec::new();
            }
        };

        let values = ScrapeValues::new(&self.catalog);
        for queue in &snapshot.queues {
            self.record_queue(&values, queue);
        }

        if !snapshot.pending_jobs.is_empty() {
            // Pending jobs have no execution host yet; they are attributed
            // to the exporter's own host under a fixed queue label.
            let hostname = local_hostname();
            for job in &snapshot.pending_jobs {
                self.record_job(&values, &hostname, PENDING_QUEUE, job);
            }
        }

        debug!(
            queues = snapshot.queues.len(),
            pending = snapshot.pending_jobs.len(),
            "scrape complete"
        );
        values.into_families()
    }
}

/// Fresh per-scrape sample vectors, one per catalog descriptor.
struct ScrapeValues {
    total_slots: GaugeVec,
    used_slots: GaugeVec,
    reserved_slots: GaugeVec,
    load_average: GaugeVec,
    free_memory: GaugeVec,
    used_memory: GaugeVec,
    total_memory: GaugeVec,
    cpu_utilization: GaugeVec,
    job_state: GaugeVec,
    job_priority: GaugeVec,
    job_slots: GaugeVec,
    job_errors: GaugeVec,
}

impl ScrapeValues {
    fn new(catalog: &MetricCatalog) -> Self {
        Self {
            total_slots: catalog.total_slots.gauges(),
            used_slots: catalog.used_slots.gauges(),
            reserved_slots: catalog.reserved_slots.gauges(),
            load_average: catalog.load_average.gauges(),
            free_memory: catalog.free_memory.gauges(),
            used_memory: catalog.used_memory.gauges(),
            total_memory: catalog.total_memory.gauges(),
            cpu_utilization: catalog.cpu_utilization.gauges(),
            job_state: catalog.job_state.gauges(),
            job_priority: catalog.job_priority.gauges(),
            job_slots: catalog.job_slots.gauges(),
            job_errors: catalog.job_errors.gauges(),
        }
    }

    fn into_families(self) -> Vec<MetricFamily> {
        [
            self.total_slots,
            self.used_slots,
            self.reserved_slots,
            self.load_average,
            self.free_memory,
            self.used_memory,
            self.total_memory,
            self.cpu_utilization,
            self.job_state,
            self.job_priority,
            self.job_slots,
            self.job_errors,
        ]
        .into_iter()
        .flat_map(|gauges| gauges.collect())
        .filter(|family| !family.get_metric().is_empty())
        .collect()
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string())
}
