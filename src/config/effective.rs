//! Effective compiler configuration with provenance
//!
//! The merged layers are checked and turned into a typed [`CompilerConfig`];
//! each contributing file is recorded with its SHA-256 digest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;

/// Host config location, relative to the home directory.
pub const HOST_CONFIG_PATH: &str = ".config/pipeline-scheduler/config.toml";

/// Repo config location, relative to the working directory.
pub const REPO_CONFIG_PATH: &str = ".pipeline-scheduler/config.toml";

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Host,
    Repo,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Where compiled documents are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub config_file: String,
    pub plugins_file: String,
}

/// Environment-repository settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitOpsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub auto_apply_config_updater: bool,

    /// `org/repo` of the dev environment repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_env_repo: Option<String>,
}

/// Settings that drive a compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    pub namespace: String,

    /// Empty disables the team scheduler.
    #[serde(default)]
    pub team_scheduler: String,

    pub output: OutputConfig,

    #[serde(default)]
    pub gitops: GitOpsConfig,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        let defaults = BuiltinDefaults::default();
        Self {
            namespace: defaults.namespace,
            team_scheduler: defaults.team_scheduler,
            output: OutputConfig {
                config_file: defaults.config_file,
                plugins_file: defaults.plugins_file,
            },
            gitops: GitOpsConfig {
                enabled: defaults.gitops_enabled,
                auto_apply_config_updater: defaults.auto_apply_config_updater,
                dev_env_repo: None,
            },
        }
    }
}

impl CompilerConfig {
    pub fn team_scheduler(&self) -> Option<&str> {
        Some(self.team_scheduler.as_str()).filter(|name| !name.is_empty())
    }

    /// The dev environment repo, when config-updater should be injected into it.
    pub fn config_updater_repo(&self) -> Option<&str> {
        let gitops = &self.gitops;
        if gitops.enabled && gitops.auto_apply_config_updater {
            gitops.dev_env_repo.as_deref()
        } else {
            None
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "namespace must not be empty".to_string(),
            ));
        }

        let output = &self.output;
        for (key, file) in [
            ("output.config_file", &output.config_file),
            ("output.plugins_file", &output.plugins_file),
        ] {
            if !(file.ends_with(".yaml") || file.ends_with(".yml")) {
                return Err(ConfigError::ValidationError(format!(
                    "{key} must end in .yaml or .yml, got {file:?}"
                )));
            }
        }
        if output.config_file == output.plugins_file {
            return Err(ConfigError::ValidationError(
                "output.config_file and output.plugins_file must differ".to_string(),
            ));
        }

        if let Some(repo) = &self.gitops.dev_env_repo {
            let valid = matches!(
                repo.split_once('/'),
                Some((org, name)) if !org.is_empty() && !name.is_empty() && !name.contains('/')
            );
            if !valid {
                return Err(ConfigError::ValidationError(format!(
                    "gitops.dev_env_repo must be org/repo, got {repo:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Merged compiler configuration with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// When this config was computed
    pub created_at: DateTime<Utc>,

    pub config: CompilerConfig,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Build effective config from layers. Missing files are skipped.
    pub fn build(
        host_config_path: Option<&Path>,
        repo_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        for (origin, path) in [
            (ConfigOrigin::Host, host_config_path),
            (ConfigOrigin::Repo, repo_config_path),
        ] {
            let Some(path) = path.filter(|p| p.exists()) else {
                continue;
            };
            let (value, digest) = load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        let config: CompilerConfig = serde_json::from_value(merged)
            .map_err(|e| ConfigError::ParseError(format!("invalid configuration: {}", e)))?;
        config.validate()?;

        Ok(Self {
            created_at: Utc::now(),
            config,
            sources,
        })
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `$HOME/.config/pipeline-scheduler/config.toml`, if a home directory is known.
pub fn host_config_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(HOST_CONFIG_PATH))
}

/// Load and parse a TOML file, returning the value and digest
fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes)
        .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;
    let toml_value: toml::Value = toml::from_str(&contents)
        .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

    Ok((toml_to_json(toml_value), digest))
}

fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_build_with_defaults_only() {
        let effective = EffectiveConfig::build(None, None, None).unwrap();
        assert_eq!(effective.config, CompilerConfig::default());
        assert_eq!(effective.config.team_scheduler(), Some("default-scheduler"));
        assert_eq!(effective.sources.len(), 1);
        assert_eq!(effective.sources[0].origin, ConfigOrigin::Builtin);
    }

    #[test]
    fn test_cli_override_wins() {
        let cli = serde_json::json!({"namespace": "ci", "team_scheduler": ""});
        let effective = EffectiveConfig::build(None, None, Some(cli)).unwrap();
        assert_eq!(effective.config.namespace, "ci");
        assert_eq!(effective.config.team_scheduler(), None);
        assert_eq!(effective.sources.last().unwrap().origin, ConfigOrigin::Cli);
    }

    #[test]
    fn test_toml_layers_with_digest() {
        let mut host = NamedTempFile::new().unwrap();
        writeln!(host, "namespace = \"host\"").unwrap();
        writeln!(host, "[output]").unwrap();
        writeln!(host, "config_file = \"prow.yaml\"").unwrap();

        let mut repo = NamedTempFile::new().unwrap();
        writeln!(repo, "namespace = \"repo\"").unwrap();
        writeln!(repo, "[gitops]").unwrap();
        writeln!(repo, "enabled = true").unwrap();
        writeln!(repo, "auto_apply_config_updater = true").unwrap();
        writeln!(repo, "dev_env_repo = \"acme/environment-dev\"").unwrap();

        let effective = EffectiveConfig::build(Some(host.path()), Some(repo.path()), None).unwrap();
        let config = &effective.config;
        assert_eq!(config.namespace, "repo");
        assert_eq!(config.output.config_file, "prow.yaml");
        assert_eq!(config.output.plugins_file, "plugins.yaml");
        assert_eq!(config.config_updater_repo(), Some("acme/environment-dev"));

        assert_eq!(effective.sources.len(), 3);
        let digest = effective.sources[1].digest.as_deref().unwrap();
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn test_missing_files_skipped() {
        let effective = EffectiveConfig::build(
            Some(Path::new("/nonexistent/host.toml")),
            Some(Path::new("/nonexistent/repo.toml")),
            None,
        )
        .unwrap();
        assert_eq!(effective.sources.len(), 1);
    }

    #[test]
    fn test_config_updater_needs_gitops() {
        let cli = serde_json::json!({
            "gitops": {"auto_apply_config_updater": true, "dev_env_repo": "acme/env"}
        });
        let effective = EffectiveConfig::build(None, None, Some(cli)).unwrap();
        assert_eq!(effective.config.config_updater_repo(), None);
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            (serde_json::json!({"namespace": " "}), "namespace"),
            (
                serde_json::json!({"output": {"plugins_file": "plugins.json"}}),
                "output.plugins_file",
            ),
            (
                serde_json::json!({"output": {"plugins_file": "config.yaml"}}),
                "must differ",
            ),
            (
                serde_json::json!({"gitops": {"dev_env_repo": "environment-dev"}}),
                "dev_env_repo",
            ),
        ];
        for (cli, needle) in cases {
            let err = EffectiveConfig::build(None, None, Some(cli)).unwrap_err();
            assert!(err.to_string().contains(needle), "{err}");
        }
    }

    #[test]
    fn test_invalid_toml() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "namespace = ").unwrap();
        let err = EffectiveConfig::build(None, Some(temp.path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
