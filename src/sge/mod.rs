//! Grid Engine integration: report acquisition, parsing, and normalization.
//!
//! Everything the exporter knows about the scheduler lives here. The
//! submodules mirror the scrape pipeline: a [`source::SnapshotSource`]
//! produces one raw `qstat` XML report, [`parser`] decodes it into the
//! [`types::Snapshot`] model, [`resources`] turns raw resource strings into
//! canonical numeric values, and [`classify`] derives job state signals.

pub mod classify;
pub mod generator;
pub mod parser;
pub mod resources;
pub mod source;
pub mod types;

pub use classify::JobClassifier;
pub use parser::{parse_report, ParseError};
pub use source::{QstatSource, SnapshotSource, SourceError, SyntheticSource};
pub use types::{JobState, QueueState, Snapshot};
