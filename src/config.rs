//! Configuration management for gridwatch.
//!
//! Settings are layered with `figment`: compiled-in defaults, then a
//! `gridwatch.toml` file, then `GRIDWATCH_`-prefixed environment variables,
//! then command-line flags. Everything is resolved once at startup; nothing
//! re-reads configuration per scrape.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Address the exposition endpoint binds to.
    pub listen_address: SocketAddr,
    /// Optional pidfile location for SystemV-style supervision.
    pub pidfile: Option<PathBuf>,
    /// Configuration for report acquisition.
    pub source: SourceConfig,
    /// The Grid Engine installation this exporter binds to.
    pub sge: SgeConfig,
    /// Configuration for job state classification.
    pub classifier: ClassifierConfig,
}

/// Configuration for the snapshot source.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceConfig {
    /// Use the synthetic source instead of invoking qstat. Resolved once
    /// per process start.
    pub test_mode: bool,
    /// Canned report for synthetic mode: an `http(s)://` URL or a file
    /// path. Unset means randomized generation.
    pub fixture: Option<String>,
    /// Seed for the synthetic generator; unset draws from OS entropy.
    pub seed: Option<u64>,
    /// Name or path of the scheduler's reporting binary.
    pub qstat_binary: String,
}

/// The SGE environment exported for the reporting command.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SgeConfig {
    /// Architecture of the Grid Engine installation (e.g. "lx-amd64").
    pub arch: String,
    /// The SGE cell to use.
    pub cell: String,
    /// Port of the execution daemon.
    pub execd_port: u16,
    /// Port of the master scheduling daemon.
    pub qmaster_port: u16,
    /// Root location of the SGE binaries.
    pub root: PathBuf,
    /// Name of the SGE cluster to bind to.
    pub cluster_name: String,
}

/// Configuration for job state classification.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClassifierConfig {
    /// Characters whose presence in a state code marks a job as errored.
    /// Scheduler families differ here; consult the state-code alphabet of
    /// yours.
    pub error_flags: String,
}

impl Config {
    /// Loads the configuration by layering sources: defaults, file,
    /// environment, and CLI arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_file = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from("gridwatch.toml"));
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            // Allow overriding with environment variables, e.g.
            // GRIDWATCH_LOG_LEVEL=debug or GRIDWATCH_SOURCE__TEST_MODE=true.
            .merge(Env::prefixed("GRIDWATCH_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }

    /// Startup validation of the SGE block. The reporting command cannot
    /// work against a half-configured installation, so this is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.sge.arch.is_empty() {
            bail!("the SGE architecture has not been provided");
        }
        if self.sge.cell.is_empty() {
            bail!("no valid SGE cell has been configured");
        }
        if self.sge.execd_port == 0 {
            bail!("no ExecD port has been specified for SGE binding");
        }
        if self.sge.qmaster_port == 0 {
            bail!("no Qmaster port has been specified for SGE binding");
        }
        if self.sge.cluster_name.is_empty() {
            bail!("no SGE cluster name has been provided");
        }
        Ok(())
    }

    /// Exports the `SGE_*` environment expected by the scheduler tooling
    /// and extends `PATH` so the reporting binary can be discovered under
    /// the configured root.
    pub fn apply_sge_environment(&self) {
        std::env::set_var("SGE_ARCH", &self.sge.arch);
        std::env::set_var("SGE_CELL", &self.sge.cell);
        std::env::set_var("SGE_EXECD_PORT", self.sge.execd_port.to_string());
        std::env::set_var("SGE_QMASTER_PORT", self.sge.qmaster_port.to_string());
        std::env::set_var("SGE_ROOT", &self.sge.root);
        std::env::set_var("SGE_CLUSTER_NAME", &self.sge.cluster_name);

        let bin = self.sge.root.join("bin");
        let arch_bin = bin.join(&self.sge.arch);
        let path = std::env::var("PATH").unwrap_or_default();
        std::env::set_var(
            "PATH",
            format!("{}:{}:{}", path, bin.display(), arch_bin.display()),
        );
    }
}

// Defaults match the original exporter deployment: port 9081, a stock
// /opt/sge installation.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            listen_address: "0.0.0.0:9081".parse().expect("static default address"),
            pidfile: None,
            source: SourceConfig {
                test_mode: false,
                fixture: None,
                seed: None,
                qstat_binary: "qstat".to_string(),
            },
            sge: SgeConfig {
                arch: "lx-amd64".to_string(),
                cell: "default".to_string(),
                execd_port: 6445,
                qmaster_port: 6445,
                root: PathBuf::from("/opt/sge"),
                cluster_name: "p6444".to_string(),
            },
            classifier: ClassifierConfig {
                error_flags: "E".to_string(),
            },
        }
    }
}
