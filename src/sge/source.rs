//! Report acquisition: the seam between the collector and the scheduler.
//!
//! A [`SnapshotSource`] produces one raw report per call. The real
//! implementation shells out to `qstat`; the synthetic one generates or
//! fetches a canned document so the rest of the pipeline can run without a
//! live scheduler. Which one the process uses is decided once at startup.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use super::generator::generate_report;

/// Wall-clock budget for one `qstat` invocation. A scheduler that cannot
/// answer within this window is treated as unavailable for the scrape.
pub const QSTAT_TIMEOUT: Duration = Duration::from_secs(3);

/// The source could not produce a report. Always scrape-fatal, never
/// process-fatal.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` did not complete within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("`{command}` produced no output")]
    EmptyOutput { command: String },
    #[error("failed to fetch fixture from {url}: {source}")]
    FixtureFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read fixture file {path}: {source}")]
    FixtureRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Produces one raw scheduler report per call.
///
/// Implementations must be independently safe for concurrent invocation:
/// every scrape gets its own subprocess or fixture fetch.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// A short name for logs.
    fn name(&self) -> &'static str;

    /// Produces a report for the current instant.
    async fn fetch(&self) -> Result<String, SourceError>;
}

/// Real mode: invoke the scheduler's reporting command.
pub struct QstatSource {
    binary: String,
    timeout: Duration,
}

impl QstatSource {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout: QSTAT_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn with_timeout(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl SnapshotSource for QstatSource {
    fn name(&self) -> &'static str {
        "qstat"
    }

    async fn fetch(&self) -> Result<String, SourceError> {
        let child = Command::new(&self.binary)
            .args(["-F", "-xml"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // If the wait below times out, the dropped child future must not
            // leave an orphan behind: tokio kills and reaps it.
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SourceError::Spawn {
                command: self.binary.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| SourceError::Spawn {
                command: self.binary.clone(),
                source,
            })?,
            Err(_) => {
                return Err(SourceError::Timeout {
                    command: self.binary.clone(),
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            return Err(SourceError::CommandFailed {
                command: self.binary.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let report = String::from_utf8_lossy(&output.stdout).into_owned();
        if report.trim().is_empty() {
            return Err(SourceError::EmptyOutput {
                command: self.binary.clone(),
            });
        }
        debug!(bytes = report.len(), "qstat report captured");
        Ok(report)
    }
}

/// Where synthetic mode gets its document from.
enum Fixture {
    /// Generate a randomized schema-valid report.
    Generated,
    /// Fetch a canned report over HTTP.
    Url(String),
    /// Read a canned report from disk.
    File(PathBuf),
}

/// Test/synthetic mode: canned or generated reports, no scheduler needed.
pub struct SyntheticSource {
    fixture: Fixture,
    // The generator owns its RNG; a fixed seed makes scrapes reproducible.
    rng: Mutex<StdRng>,
    http: reqwest::Client,
}

impl SyntheticSource {
    /// `fixture` selects a canned document (`http(s)://` URL or local file
    /// path); `None` generates randomized reports. `seed` pins the
    /// generator for deterministic output.
    pub fn new(fixture: Option<String>, seed: Option<u64>) -> Self {
        let fixture = match fixture {
            Some(location) if location.starts_with("http://") || location.starts_with("https://") => {
                Fixture::Url(location)
            }
            Some(location) => Fixture::File(PathBuf::from(location)),
            None => Fixture::Generated,
        };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            fixture,
            rng: Mutex::new(rng),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SnapshotSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn fetch(&self) -> Result<String, SourceError> {
        match &self.fixture {
            Fixture::Generated => {
                let mut rng = self.rng.lock().unwrap();
                Ok(generate_report(&mut *rng))
            }
            Fixture::Url(url) => {
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|source| SourceError::FixtureFetch {
                        url: url.clone(),
                        source,
                    })?;
                response.text().await.map_err(|source| SourceError::FixtureFetch {
                    url: url.clone(),
                    source,
                })
            }
            Fixture::File(path) => tokio::fs::read_to_string(path).await.map_err(|source| {
                SourceError::FixtureRead {
                    path: path.clone(),
                    source,
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sge::parser::parse_report;

    #[tokio::test]
    async fn generated_mode_produces_parseable_reports() {
        let source = SyntheticSource::new(None, Some(11));
        let report = source.fetch().await.unwrap();
        assert!(parse_report(&report).is_ok());
    }

    #[tokio::test]
    async fn seeded_sources_agree() {
        let a = SyntheticSource::new(None, Some(3)).fetch().await.unwrap();
        let b = SyntheticSource::new(None, Some(3)).fetch().await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable_not_fatal() {
        let source = QstatSource::new("/nonexistent/gridwatch-qstat");
        match source.fetch().await {
            Err(SourceError::Spawn { .. }) => {}
            other => panic!("expected spawn failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn hung_command_times_out() {
        let script = fake_qstat("#!/bin/sh\nsleep 10\n");
        let source =
            QstatSource::with_timeout(script.to_string_lossy(), Duration::from_millis(50));
        match source.fetch().await {
            Err(SourceError::Timeout { .. }) => {}
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failing_command_reports_status() {
        let script = fake_qstat("#!/bin/sh\necho boom >&2\nexit 2\n");
        let source = QstatSource::new(script.to_string_lossy());
        match source.fetch().await {
            Err(SourceError::CommandFailed { status, stderr, .. }) => {
                assert_eq!(status.code(), Some(2));
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected command failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn silent_command_is_empty_output() {
        let script = fake_qstat("#!/bin/sh\nexit 0\n");
        let source = QstatSource::new(script.to_string_lossy());
        match source.fetch().await {
            Err(SourceError::EmptyOutput { .. }) => {}
            other => panic!("expected empty-output failure, got {other:?}"),
        }
    }

    /// Writes an executable stand-in for the qstat binary.
    fn fake_qstat(body: &str) -> tempfile::TempPath {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        let path = file.into_temp_path();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
