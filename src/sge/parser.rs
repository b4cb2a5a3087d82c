//! Decoding of raw `qstat -F -xml` reports.
//!
//! Parsing is a single structural pass: the XML is deserialized into the
//! [`Snapshot`] shape without any semantic validation of resource values
//! (that is the normalizer's job, at collection time). A document that does
//! not decode at all is a scrape-fatal error; a structurally valid document
//! with individual fields missing parses fine with field defaults.

use serde::Deserialize;
use thiserror::Error;

use super::types::{JobState, QueueState, Snapshot};

/// The report could not be decoded. No partial snapshot can be trusted, so
/// this aborts the whole scrape.
#[derive(Error, Debug)]
#[error("malformed qstat report: {0}")]
pub struct ParseError(#[from] quick_xml::DeError);

/// Parses one raw report into a [`Snapshot`].
pub fn parse_report(raw: &str) -> Result<Snapshot, ParseError> {
    let doc: ReportXml = quick_xml::de::from_str(raw)?;
    Ok(doc.into_snapshot())
}

// Wire shape of the document. The root <job_info> holds a <queue_info> with
// one <Queue-List> per queue instance and a second, confusingly also named,
// <job_info> element holding the pending <job_list> entries.

#[derive(Debug, Deserialize)]
struct ReportXml {
    #[serde(default)]
    queue_info: QueueInfoXml,
    #[serde(default, rename = "job_info")]
    pending: PendingXml,
}

#[derive(Debug, Default, Deserialize)]
struct QueueInfoXml {
    #[serde(default, rename = "Queue-List")]
    queues: Vec<QueueXml>,
}

#[derive(Debug, Default, Deserialize)]
struct PendingXml {
    #[serde(default, rename = "job_list")]
    jobs: Vec<JobXml>,
}

#[derive(Debug, Deserialize)]
struct QueueXml {
    name: String,
    #[serde(default)]
    qtype: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    slots_total: u32,
    #[serde(default)]
    slots_used: u32,
    #[serde(default, rename = "slots_resv")]
    slots_reserved: u32,
    #[serde(default, rename = "resource")]
    resources: Vec<ResourceXml>,
    #[serde(default, rename = "job_list")]
    jobs: Vec<JobXml>,
}

#[derive(Debug, Deserialize)]
struct ResourceXml {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "$text")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct JobXml {
    #[serde(default, rename = "@state")]
    list_state: String,
    #[serde(default, rename = "JB_job_number")]
    number: u64,
    #[serde(default, rename = "JAT_prio")]
    priority: f64,
    #[serde(default, rename = "JB_name")]
    name: String,
    #[serde(default, rename = "JB_owner")]
    owner: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    slots: u32,
    #[serde(default)]
    tasks: Option<String>,
}

impl ReportXml {
    fn into_snapshot(self) -> Snapshot {
        Snapshot {
            queues: self
                .queue_info
                .queues
                .into_iter()
                .map(QueueXml::into_queue_state)
                .collect(),
            pending_jobs: self
                .pending
                .jobs
                .into_iter()
                .map(JobXml::into_job_state)
                .collect(),
        }
    }
}

impl QueueXml {
    fn into_queue_state(self) -> QueueState {
        QueueState {
            name: self.name,
            qtype: self.qtype,
            state: self.state,
            slots_total: self.slots_total,
            slots_used: self.slots_used,
            slots_reserved: self.slots_reserved,
            resources: self
                .resources
                .into_iter()
                .map(|r| (r.name, r.value))
                .collect(),
            jobs: self.jobs.into_iter().map(JobXml::into_job_state).collect(),
        }
    }
}

impl JobXml {
    fn into_job_state(self) -> JobState {
        // The detailed state code lives in the inner <state> element; older
        // report revisions only carry the coarse state attribute on
        // <job_list>.
        let state = if self.state.is_empty() {
            self.list_state
        } else {
            self.state
        };
        JobState {
            name: self.name,
            owner: self.owner,
            number: self.number,
            // <tasks> may hold an array range like "1-10:1"; only a plain
            // task id is kept.
            task_id: self.tasks.and_then(|t| t.trim().parse().ok()),
            state,
            priority: self.priority,
            slots: self.slots,
        }
    }
}
