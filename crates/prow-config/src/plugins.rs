//! Plugin configuration (`plugins.yaml`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::is_false;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Approve {
    #[serde(default)]
    pub repos: Vec<String>,

    #[serde(default)]
    pub issue_required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_self_approval: Option<bool>,

    #[serde(default)]
    pub lgtm_acts_as_approve: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_review_state: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lgtm {
    #[serde(default)]
    pub repos: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub review_acts_as_lgtm: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub store_tree_hash: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trusted_team_for_sticky_lgtm: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default)]
    pub repos: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trusted_org: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub join_org_url: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub only_org_members: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub ignore_ok_to_test: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Welcome {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repos: Vec<String>,

    pub message_template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalPlugin {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigMapSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_namespaces: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigUpdater {
    /// `None` until some repository declares the updater; an empty map
    /// still counts as declared.
    #[serde(default, skip_serializing_if = "no_maps")]
    pub maps: Option<BTreeMap<String, ConfigMapSpec>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config_file: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub plugin_file: String,
}

fn no_maps(maps: &Option<BTreeMap<String, ConfigMapSpec>>) -> bool {
    maps.as_ref().map_or(true, BTreeMap::is_empty)
}

impl ConfigUpdater {
    pub fn is_empty(&self) -> bool {
        no_maps(&self.maps) && self.config_file.is_empty() && self.plugin_file.is_empty()
    }
}

/// The whole `plugins.yaml` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginsConfiguration {
    /// Enabled plugin names per `org/repo`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<String, Vec<String>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub external_plugins: BTreeMap<String, Vec<ExternalPlugin>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approve: Vec<Approve>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lgtm: Vec<Lgtm>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub welcome: Vec<Welcome>,

    #[serde(default, skip_serializing_if = "ConfigUpdater::is_empty")]
    pub config_updater: ConfigUpdater,
}

impl PluginsConfiguration {
    /// The approve entry covering `org/repo`, or the whole org.
    pub fn approve_for(&self, org: &str, repo_key: &str) -> Option<&Approve> {
        self.approve
            .iter()
            .find(|a| a.repos.iter().any(|r| r == repo_key || r == org))
    }

    pub fn lgtm_for(&self, repo_key: &str) -> Option<&Lgtm> {
        self.lgtm
            .iter()
            .find(|l| l.repos.iter().any(|r| r == repo_key))
    }

    pub fn trigger_for(&self, repo_key: &str) -> Option<&Trigger> {
        self.triggers
            .iter()
            .find(|t| t.repos.iter().any(|r| r == repo_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_matches_org_scope() {
        let plugins = PluginsConfiguration {
            approve: vec![Approve {
                repos: vec!["acme".to_string()],
                issue_required: true,
                ..Approve::default()
            }],
            ..PluginsConfiguration::default()
        };
        assert!(plugins.approve_for("acme", "acme/widgets").is_some());
        assert!(plugins.approve_for("other", "other/widgets").is_none());
    }

    #[test]
    fn test_empty_configuration_serializes_to_empty_map() {
        let yaml = serde_yaml::to_string(&PluginsConfiguration::default()).unwrap();
        assert_eq!(yaml.trim(), "{}");
    }
}
