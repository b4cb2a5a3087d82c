//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using
//! the `clap` crate. These arguments are parsed at startup and then merged
//! with the configuration from the `gridwatch.toml` file and environment
//! variables.

use clap::Parser;
use figment::value::{Dict, Map, Tag, Value};
use figment::{Error, Metadata, Profile, Provider};
use std::path::PathBuf;

/// A Prometheus exporter for Grid Engine batch clusters.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Port on which the exporter should listen.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Location in which to store a pidfile.
    #[arg(long, value_name = "FILE")]
    pub pidfile: Option<PathBuf>,

    /// Run against the synthetic snapshot source instead of qstat.
    #[arg(long)]
    pub test: bool,

    /// Canned report for synthetic mode (URL or file path).
    #[arg(long, value_name = "LOCATION")]
    pub fixture: Option<String>,

    /// Shorthand for debug-level logging.
    #[arg(long)]
    pub debug: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(port) = self.port {
            // The flag only carries a port; binding to all interfaces is
            // what the flag has always meant.
            dict.insert(
                "listen_address".into(),
                Value::from(format!("0.0.0.0:{port}")),
            );
        }

        if let Some(pidfile) = &self.pidfile {
            dict.insert(
                "pidfile".into(),
                Value::from(pidfile.display().to_string()),
            );
        }

        // `--test` and `--debug` are plain switches: absent must not mask a
        // file- or env-configured `true`, so only their presence is merged.
        let mut source = Dict::new();
        if self.test {
            source.insert("test_mode".into(), Value::from(true));
        }
        if let Some(fixture) = &self.fixture {
            source.insert("fixture".into(), Value::from(fixture.clone()));
        }
        if !source.is_empty() {
            dict.insert("source".into(), Value::Dict(Tag::Default, source));
        }

        if self.debug {
            dict.insert("log_level".into(), Value::from("debug"));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
