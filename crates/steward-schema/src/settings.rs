use crate::cluster::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CURATOR_IMAGE: &str = "quay.io/openshift/origin-logging-curator5:latest";

/// Process-level knobs for the reconciler, independent of any one cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReconcilerSettings {
    #[serde(default = "default_image")]
    pub curator_image: String,
    /// Directory holding the static curator configuration files.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    /// Directory holding the generated certificate material.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
    #[serde(default)]
    pub retry: RetrySettings,
    /// Delete scheduled jobs left behind by a previous topology selection.
    #[serde(default)]
    pub prune_stale_topology: bool,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            curator_image: default_image(),
            config_dir: default_config_dir(),
            working_dir: default_working_dir(),
            retry: RetrySettings::default(),
            prune_stale_topology: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RetrySettings {
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_factor")]
    pub factor: f64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            initial_delay_ms: default_initial_delay_ms(),
            factor: default_factor(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_image() -> String {
    DEFAULT_CURATOR_IMAGE.to_owned()
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("files")
}

fn default_working_dir() -> PathBuf {
    PathBuf::from("/tmp/_working_dir")
}

fn default_steps() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    10
}

fn default_factor() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    1_000
}

pub fn parse_settings_str(input: &str) -> Result<ReconcilerSettings, ConfigError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_settings_file(path: impl AsRef<Path>) -> Result<ReconcilerSettings, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_settings_str(&content)
}
