//! The in-memory model of one scheduler status report.
//!
//! A [`Snapshot`] is immutable once parsed: the collector only reads it, and
//! nothing survives past the scrape that produced it.

use std::collections::HashMap;

use thiserror::Error;

/// One fully parsed `qstat` report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Queue instances in report order.
    pub queues: Vec<QueueState>,
    /// Jobs not yet assigned to any queue.
    pub pending_jobs: Vec<JobState>,
}

/// One (queue, host) scheduling instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueState {
    /// Composite name of the form `"<queue>@<host>"`.
    pub name: String,
    /// Queue type string (e.g. "BIP").
    pub qtype: String,
    /// Lifecycle state string; empty when the queue is healthy.
    pub state: String,
    pub slots_total: u32,
    pub slots_used: u32,
    pub slots_reserved: u32,
    /// Raw resource values keyed by resource name, unvalidated.
    pub resources: HashMap<String, String>,
    /// Jobs currently scheduled on this queue instance.
    pub jobs: Vec<JobState>,
}

/// The composite queue name did not contain the `@` host separator.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("queue name `{0}` is not of the form <queue>@<host>")]
pub struct UnsplittableName(pub String);

impl QueueState {
    /// Splits the composite name into `(queue, host)`.
    ///
    /// The `"<queue>@<host>"` form is a convention of the report, not a
    /// schema guarantee, so the split is validated: a name without the
    /// separator is an explicit error the caller must handle (by dropping
    /// the queue), never an index panic.
    pub fn split_name(&self) -> Result<(&str, &str), UnsplittableName> {
        self.name
            .split_once('@')
            .ok_or_else(|| UnsplittableName(self.name.clone()))
    }
}

/// One job, or one task of an array job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobState {
    pub name: String,
    pub owner: String,
    pub number: u64,
    /// Task id for array jobs; absent for single jobs and task ranges.
    pub task_id: Option<u32>,
    /// Raw scheduler state code, e.g. "running", "qw", "Eqw".
    pub state: String,
    pub priority: f64,
    pub slots: u32,
}

impl JobState {
    /// The task id as a metric label value. Single jobs report "0", the
    /// scheduler's own encoding for "no task".
    pub fn task_label(&self) -> String {
        self.task_id.unwrap_or(0).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_queue_and_host() {
        let queue = QueueState {
            name: "all.q@ip-172-16-2-102.us-west-2.compute.internal".to_string(),
            ..Default::default()
        };
        assert_eq!(
            queue.split_name(),
            Ok(("all.q", "ip-172-16-2-102.us-west-2.compute.internal"))
        );
    }

    #[test]
    fn name_without_separator_is_an_error() {
        let queue = QueueState {
            name: "all.q".to_string(),
            ..Default::default()
        };
        assert_eq!(
            queue.split_name(),
            Err(UnsplittableName("all.q".to_string()))
        );
    }

    #[test]
    fn task_label_defaults_to_zero() {
        let job = JobState::default();
        assert_eq!(job.task_label(), "0");
        let task = JobState {
            task_id: Some(7),
            ..Default::default()
        };
        assert_eq!(task.task_label(), "7");
    }
}
