//! The fixed set of metric descriptors this exporter promises to emit.
//!
//! Metric names, help strings, and label schemas are part of the wire
//! contract with downstream dashboards and alerting; they never change
//! between scrapes and are validated once at startup.

use prometheus::core::Desc;
use prometheus::{GaugeVec, Opts};

/// Labels carried by every per-host gauge.
pub const HOST_LABELS: &[&str] = &["hostname", "queue"];

/// Labels carried by every per-job gauge.
pub const JOB_LABELS: &[&str] = &[
    "hostname",
    "queue",
    "name",
    "owner",
    "job_number",
    "task_id",
    "state",
];

/// One process-lifetime metric descriptor.
#[derive(Debug, Clone)]
pub struct MetricSpec {
    name: &'static str,
    help: &'static str,
    labels: &'static [&'static str],
    desc: Desc,
}

impl MetricSpec {
    fn new(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Result<Self, prometheus::Error> {
        let desc = Desc::new(
            name.to_string(),
            help.to_string(),
            labels.iter().map(|l| l.to_string()).collect(),
            std::collections::HashMap::new(),
        )?;
        Ok(Self {
            name,
            help,
            labels,
            desc,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    /// A fresh, empty value vector for this descriptor. Each scrape builds
    /// its own, so concurrent scrapes never share samples.
    pub fn gauges(&self) -> GaugeVec {
        GaugeVec::new(Opts::new(self.name, self.help), self.labels)
            .expect("name and labels were validated at catalog construction")
    }
}

/// Every descriptor the collector can emit.
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    pub total_slots: MetricSpec,
    pub used_slots: MetricSpec,
    pub reserved_slots: MetricSpec,
    pub load_average: MetricSpec,
    pub free_memory: MetricSpec,
    pub used_memory: MetricSpec,
    pub total_memory: MetricSpec,
    pub cpu_utilization: MetricSpec,
    pub job_state: MetricSpec,
    pub job_priority: MetricSpec,
    pub job_slots: MetricSpec,
    pub job_errors: MetricSpec,
}

impl MetricCatalog {
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            total_slots: MetricSpec::new(
                "total_slots_count",
                "Total Number of slots available to the host",
                HOST_LABELS,
            )?,
            used_slots: MetricSpec::new(
                "used_slots_count",
                "Number of used slots on host",
                HOST_LABELS,
            )?,
            reserved_slots: MetricSpec::new(
                "reserved_slots_count",
                "Number of reserved slots on host",
                HOST_LABELS,
            )?,
            load_average: MetricSpec::new(
                "sge_load_average",
                "Load average of this specific SGE host",
                HOST_LABELS,
            )?,
            free_memory: MetricSpec::new(
                "free_memory_bytes",
                "Number of bytes in free memory",
                HOST_LABELS,
            )?,
            used_memory: MetricSpec::new(
                "sge_used_memory_bytes",
                "Number of bytes in used memory",
                HOST_LABELS,
            )?,
            total_memory: MetricSpec::new(
                "sge_total_memory_bytes",
                "Number of bytes in total memory",
                HOST_LABELS,
            )?,
            cpu_utilization: MetricSpec::new(
                "sge_cpu_utilization_percent",
                "Decimal representing total CPU utilization on host",
                HOST_LABELS,
            )?,
            job_state: MetricSpec::new(
                "job_state_value",
                "Indicates whether job is running (1) or not (0)",
                JOB_LABELS,
            )?,
            job_priority: MetricSpec::new(
                "job_priority_value",
                "Qstat priority for given job",
                JOB_LABELS,
            )?,
            job_slots: MetricSpec::new(
                "job_slots_count",
                "Number of slots on the selected job",
                JOB_LABELS,
            )?,
            job_errors: MetricSpec::new(
                "job_errors",
                "Jobs that are reported in an errored or anomalous state",
                JOB_LABELS,
            )?,
        })
    }

    /// Every descriptor, in exposition order.
    pub fn specs(&self) -> [&MetricSpec; 12] {
        [
            &self.total_slots,
            &self.used_slots,
            &self.reserved_slots,
            &self.load_average,
            &self.free_memory,
            &self.used_memory,
            &self.total_memory,
            &self.cpu_utilization,
            &self.job_state,
            &self.job_priority,
            &self.job_slots,
            &self.job_errors,
        ]
    }

    pub fn descs(&self) -> Vec<&Desc> {
        self.specs().into_iter().map(MetricSpec::desc).collect()
    }
}
