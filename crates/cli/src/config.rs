//! Configuration management for the CLI
//!
//! Values are layered: built-in defaults, then the TOML config file, then
//! `FCOST_` environment variables, then command-line flags.

use anyhow::{Context, Result};
use cost_lib::RateTable;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::output::OutputMode;

/// CLI configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Cluster id used in report names; defaults to the snapshot's id
    #[serde(default)]
    pub cluster_id: Option<String>,

    /// Time span in seconds the costs are computed over
    #[serde(default = "default_time_span_seconds")]
    pub time_span_seconds: u64,

    /// Factor applied to every price to fill the discount column
    #[serde(default)]
    pub discount: Option<f64>,

    /// Where reports go
    #[serde(default)]
    pub output_mode: OutputMode,

    /// Directory for csv reports
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Blocking workers for the recommender pass
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Rate card and platform fee overrides
    #[serde(default)]
    pub rates: RateTable,
}

fn default_time_span_seconds() -> u64 {
    3600
}

fn default_data_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_workers() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cluster_id: None,
            time_span_seconds: default_time_span_seconds(),
            discount: None,
            output_mode: OutputMode::default(),
            data_path: default_data_path(),
            workers: default_workers(),
            rates: RateTable::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, or the default location if present
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match explicit {
            Some(path) => {
                builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                if let Some(path) = Self::config_path() {
                    builder = builder.add_source(config::File::from(path).required(false));
                }
            }
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("FCOST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Default configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("fcost").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// Serializes tests that read or write `FCOST_*` variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.time_span_seconds, 3600);
        assert_eq!(config.workers, 1);
        assert_eq!(config.output_mode, OutputMode::Stdout);
    }

    #[test]
    fn test_load_from_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
cluster_id = "cls-file"
time_span_seconds = 86400
output_mode = "both"
workers = 4

[rates]
serverless_platform_hour = 0.5

[rates.intel]
cpu_core_hour = 0.2
mem_gib_hour = 0.1
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.cluster_id.as_deref(), Some("cls-file"));
        assert_eq!(config.time_span_seconds, 86400);
        assert_eq!(config.output_mode, OutputMode::Both);
        assert_eq!(config.workers, 4);
        assert_eq!(config.rates.serverless_platform_hour, 0.5);
        assert_eq!(config.rates.intel.cpu_core_hour, 0.2);
        // untouched cards keep their defaults
        assert_eq!(config.rates.amd.cpu_core_hour, 0.055);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
time_span_seconds = 86400

[rates.intel]
cpu_core_hour = 0.2
mem_gib_hour = 0.1
"#
        )
        .unwrap();

        std::env::set_var("FCOST_TIME_SPAN_SECONDS", "7200");
        std::env::set_var("FCOST_RATES__INTEL__CPU_CORE_HOUR", "0.9");
        let loaded = Config::load(Some(file.path()));
        std::env::remove_var("FCOST_TIME_SPAN_SECONDS");
        std::env::remove_var("FCOST_RATES__INTEL__CPU_CORE_HOUR");

        let config = loaded.unwrap();
        assert_eq!(config.time_span_seconds, 7200);
        assert_eq!(config.rates.intel.cpu_core_hour, 0.9);
        // siblings of an overridden key keep the file value
        assert_eq!(config.rates.intel.mem_gib_hour, 0.1);
    }
}
