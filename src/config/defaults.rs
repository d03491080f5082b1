//! Built-in compiler defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Namespace written as the pod and job namespace (default: "jx")
    pub namespace: String,

    /// Scheduler applied as the root of every chain (default: "default-scheduler")
    pub team_scheduler: String,

    /// Compiled job and policy document (default: "config.yaml")
    pub config_file: String,

    /// Compiled plugin document (default: "plugins.yaml")
    pub plugins_file: String,

    /// Whether the environment is managed through a git repository (default: false)
    pub gitops_enabled: bool,

    /// Enable config-updater on the dev environment repo (default: false)
    pub auto_apply_config_updater: bool,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            namespace: "jx".to_string(),
            team_scheduler: "default-scheduler".to_string(),
            config_file: "config.yaml".to_string(),
            plugins_file: "plugins.yaml".to_string(),
            gitops_enabled: false,
            auto_apply_config_updater: false,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "namespace": self.namespace,
            "team_scheduler": self.team_scheduler,
            "output": {
                "config_file": self.config_file,
                "plugins_file": self.plugins_file
            },
            "gitops": {
                "enabled": self.gitops_enabled,
                "auto_apply_config_updater": self.auto_apply_config_updater
            }
        })
    }
}
