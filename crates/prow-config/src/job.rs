//! Job configuration as read by the bot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{is_false, is_zero};

/// Fields shared by every job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobBase {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_concurrency: u32,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub agent: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Brancher {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_branches: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegexpChangeMatcher {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub run_if_changed: String,
}

/// A job triggered by pull requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presubmit {
    #[serde(flatten)]
    pub base: JobBase,

    #[serde(default)]
    pub always_run: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trigger: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rerun_command: String,

    #[serde(flatten)]
    pub brancher: Brancher,

    #[serde(flatten)]
    pub matcher: RegexpChangeMatcher,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub skip_report: bool,
}

/// A job triggered by pushes to a branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Postsubmit {
    #[serde(flatten)]
    pub base: JobBase,

    #[serde(flatten)]
    pub brancher: Brancher,

    #[serde(flatten)]
    pub matcher: RegexpChangeMatcher,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub skip_report: bool,
}

/// A job triggered on a schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Periodic {
    #[serde(flatten)]
    pub base: JobBase,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cron: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interval: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// All jobs, keyed by `org/repo` for presubmits and postsubmits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub presubmits: BTreeMap<String, Vec<Presubmit>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub postsubmits: BTreeMap<String, Vec<Postsubmit>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub periodics: Vec<Periodic>,
}

impl JobConfig {
    /// Every `org/repo` key that has presubmits or postsubmits, sorted.
    pub fn repo_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .presubmits
            .keys()
            .chain(self.postsubmits.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_keys_union() {
        let mut config = JobConfig::default();
        config
            .presubmits
            .insert("acme/b".to_string(), vec![Presubmit::default()]);
        config
            .postsubmits
            .insert("acme/a".to_string(), vec![Postsubmit::default()]);
        config
            .postsubmits
            .insert("acme/b".to_string(), vec![Postsubmit::default()]);
        assert_eq!(config.repo_keys(), vec!["acme/a", "acme/b"]);
    }

    #[test]
    fn test_presubmit_always_run_is_written() {
        let presubmit = Presubmit {
            base: JobBase {
                name: "unit".to_string(),
                ..JobBase::default()
            },
            ..Presubmit::default()
        };
        let yaml = serde_yaml::to_string(&presubmit).unwrap();
        assert!(yaml.contains("always_run: false"));
        assert!(!yaml.contains("skip_report"));
    }
}
