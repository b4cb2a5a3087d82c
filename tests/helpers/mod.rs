//! Shared scaffolding for integration tests: stub snapshot sources and a
//! flattener for collected metric families.
#![allow(dead_code)]

use async_trait::async_trait;
use gridwatch::sge::{SnapshotSource, SourceError};
use prometheus::proto::MetricFamily;
use std::collections::BTreeMap;

/// A source that returns the same canned report on every fetch.
pub struct StaticSource {
    report: String,
}

impl StaticSource {
    pub fn new(report: impl Into<String>) -> Self {
        Self {
            report: report.into(),
        }
    }
}

#[async_trait]
impl SnapshotSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self) -> Result<String, SourceError> {
        Ok(self.report.clone())
    }
}

/// A source whose scheduler is permanently unreachable.
pub struct FailingSource;

#[async_trait]
impl SnapshotSource for FailingSource {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn fetch(&self) -> Result<String, SourceError> {
        Err(SourceError::EmptyOutput {
            command: "qstat".to_string(),
        })
    }
}

/// One flattened metric sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub metric: String,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

/// Flattens metric families into comparable samples.
pub fn samples(families: &[MetricFamily]) -> Vec<Sample> {
    families
        .iter()
        .flat_map(|family| {
            family.get_metric().iter().map(|metric| Sample {
                metric: family.get_name().to_string(),
                labels: metric
                    .get_label()
                    .iter()
                    .map(|pair| (pair.get_name().to_string(), pair.get_value().to_string()))
                    .collect(),
                value: metric.get_gauge().get_value(),
            })
        })
        .collect()
}

/// Finds the single sample for `metric` whose labels include `labels`.
pub fn find_sample<'a>(
    samples: &'a [Sample],
    metric: &str,
    labels: &[(&str, &str)],
) -> Option<&'a Sample> {
    samples.iter().find(|sample| {
        sample.metric == metric
            && labels
                .iter()
                .all(|(k, v)| sample.labels.get(*k).map(String::as_str) == Some(*v))
    })
}

/// The report behind most end-to-end assertions: one queue on hostA with a
/// running job, plus one unscheduled job.
pub fn sample_report() -> String {
    r#"<?xml version='1.0'?>
<job_info>
  <queue_info>
    <Queue-List>
      <name>all.q@hostA</name>
      <qtype>BIP</qtype>
      <slots_used>3</slots_used>
      <slots_resv>1</slots_resv>
      <slots_total>10</slots_total>
      <resource name="mem_free" type="hl">512M</resource>
      <resource name="mem_used" type="hl">1.5G</resource>
      <resource name="mem_total" type="hl">2G</resource>
      <resource name="load_average" type="hl">0.25</resource>
      <resource name="cpu" type="hl">12.5</resource>
      <job_list state="running">
        <JB_job_number>42</JB_job_number>
        <JAT_prio>0.5</JAT_prio>
        <JB_name>J1</JB_name>
        <JB_owner>bob</JB_owner>
        <state>running</state>
        <slots>3</slots>
      </job_list>
    </Queue-List>
  </queue_info>
  <job_info>
    <job_list state="pending">
      <JB_job_number>77</JB_job_number>
      <JAT_prio>0.1</JAT_prio>
      <JB_name>W1</JB_name>
      <JB_owner>alice</JB_owner>
      <state>Eqw</state>
      <slots>1</slots>
    </job_list>
  </job_info>
</job_info>"#
        .to_string()
}
