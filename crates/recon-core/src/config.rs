//! Engine configuration
//!
//! Centralized configuration management using the `config` crate.
//! Values can be loaded from environment variables (RECON__ prefix) and
//! optional config files; every knob has a production default matching the
//! documented engine contract.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Main engine configuration
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default)]
    pub scratch: ScratchConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
}

/// Scratch resource configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScratchConfig {
    /// Directory for job-scoped scratch artifacts (None = system temp dir)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl ScratchConfig {
    /// Resolve the base directory all job scratch spaces live under
    pub fn base_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(env::temp_dir)
    }
}

/// Defensive input limits (the boundary enforces these first)
#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Maximum input file size per side, in bytes
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Maximum row count per side
    #[serde(default = "default_max_rows")]
    pub max_rows: u64,
}

fn default_max_file_bytes() -> u64 {
    500 * 1024 * 1024
}

fn default_max_rows() -> u64 {
    2_000_000
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            max_rows: default_max_rows(),
        }
    }
}

/// Matching parameters
#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    /// Seize-time tolerance for candidate pairs, in seconds
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: i64,

    /// Rows per staging insert transaction
    #[serde(default = "default_insert_batch")]
    pub insert_batch: usize,
}

fn default_tolerance_secs() -> i64 {
    60
}

fn default_insert_batch() -> usize {
    10_000
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            tolerance_secs: default_tolerance_secs(),
            insert_batch: default_insert_batch(),
        }
    }
}

/// Discrepancy sampling parameters
#[derive(Debug, Deserialize, Clone)]
pub struct SamplingConfig {
    /// Retained discrepancies per type (top-K by |cost_difference|)
    #[serde(default = "default_per_type_cap")]
    pub per_type_cap: usize,

    /// Maximum hung-call exemplar rows emitted per side
    #[serde(default = "default_hung_exemplar_cap")]
    pub hung_exemplar_cap: i64,

    /// Minimum duration for a hung-call cluster, in seconds
    #[serde(default = "default_hung_min_duration")]
    pub hung_min_duration_secs: i64,

    /// Minimum cluster size for a hung-call group
    #[serde(default = "default_hung_min_cluster")]
    pub hung_min_cluster: i64,
}

fn default_per_type_cap() -> usize {
    1000
}

fn default_hung_exemplar_cap() -> i64 {
    200
}

fn default_hung_min_duration() -> i64 {
    30
}

fn default_hung_min_cluster() -> i64 {
    3
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            per_type_cap: default_per_type_cap(),
            hung_exemplar_cap: default_hung_exemplar_cap(),
            hung_min_duration_secs: default_hung_min_duration(),
            hung_min_cluster: default_hung_min_cluster(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scratch: ScratchConfig::default(),
            limits: LimitsConfig::default(),
            matching: MatchingConfig::default(),
            sampling: SamplingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(
                Environment::with_prefix("RECON")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("RECON").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
