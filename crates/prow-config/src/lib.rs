//! Compiled CI bot configuration.
//!
//! Two documents are produced: `config.yaml` ([`Config`], jobs plus global
//! policy) and `plugins.yaml` ([`PluginsConfiguration`]). All maps are ordered
//! so that serialization is deterministic.

pub mod branch_protection;
pub mod job;
pub mod keeper;
pub mod plugins;

pub use branch_protection::BranchProtection;
pub use job::{JobConfig, Periodic, Postsubmit, Presubmit};
pub use keeper::{Keeper, KeeperQuery, MergeMethod};
pub use plugins::PluginsConfiguration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

pub(crate) fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Job runner settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plank {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub report_template: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub job_url_prefix: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub job_url_template: String,
}

impl Plank {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Global policy: branch protection, merge queue, job runner, namespaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProwConfig {
    #[serde(
        default,
        rename = "branch-protection",
        skip_serializing_if = "BranchProtection::is_empty"
    )]
    pub branch_protection: BranchProtection,

    #[serde(default, skip_serializing_if = "Keeper::is_empty")]
    pub keeper: Keeper,

    #[serde(default, skip_serializing_if = "Plank::is_empty")]
    pub plank: Plank,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pod_namespace: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prowjob_namespace: String,
}

/// The whole `config.yaml` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub job_config: JobConfig,

    #[serde(flatten)]
    pub prow_config: ProwConfig,
}

/// Failure to read or write a configuration document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Parse error in {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("Serialize error: {0}")]
    Serialize(String),
}

fn from_yaml<T: DeserializeOwned + Default>(text: &str, origin: &str) -> Result<T, ConfigFileError> {
    // An empty document is a valid, empty configuration.
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(text).map_err(|e| ConfigFileError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })
}

fn read(path: &Path) -> Result<String, ConfigFileError> {
    fs::read_to_string(path).map_err(|e| ConfigFileError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn to_yaml<T: Serialize>(value: &T) -> Result<String, ConfigFileError> {
    serde_yaml::to_string(value).map_err(|e| ConfigFileError::Serialize(e.to_string()))
}

impl Config {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigFileError> {
        from_yaml(text, "config.yaml")
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigFileError> {
        from_yaml(&read(path)?, &path.display().to_string())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigFileError> {
        to_yaml(self)
    }
}

impl PluginsConfiguration {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigFileError> {
        from_yaml(text, "plugins.yaml")
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigFileError> {
        from_yaml(&read(path)?, &path.display().to_string())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigFileError> {
        to_yaml(self)
    }
}
