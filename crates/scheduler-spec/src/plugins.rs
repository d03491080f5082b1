//! Repository-scoped bot behaviours.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::replaceable::ReplaceableSliceOfStrings;

/// Which agent runs the pipelines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerAgent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}

/// Settings for the `trigger` plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    /// Org whose members may trigger jobs. Defaults to the repository's org.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_org: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_org_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_org_members: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_ok_to_test: Option<bool>,
}

/// Settings for the `approve` plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approve {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_self_approval: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lgtm_acts_as_approve: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_review_state: Option<bool>,
}

/// Settings for the `lgtm` plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lgtm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_acts_as_lgtm: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_tree_hash: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_team_for_sticky_lgtm: Option<String>,
}

/// An out-of-process plugin receiving webhook events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalPlugin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<ReplaceableSliceOfStrings>,
}

/// Welcome message posted on a contributor's first pull request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Welcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_template: Option<String>,
}

/// Settings for the `config-updater` plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdater {
    /// Repository path to the ConfigMap it is written to.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub map: BTreeMap<String, ConfigMapSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_file: Option<String>,
}

/// Target ConfigMap for one updated file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigMapSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_namespaces: Vec<String>,
}

impl ConfigMapSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Named URLs attached to the job runner (report template, job URL prefix).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,

    #[serde(default)]
    pub urls: Vec<String>,
}

/// Attachment name for the job report template.
pub const ATTACHMENT_REPORT_TEMPLATE: &str = "reportTemplate";

/// Attachment name for the job URL prefix.
pub const ATTACHMENT_JOB_URL_PREFIX: &str = "jobURLPrefix";

/// Attachment name for the job URL template.
pub const ATTACHMENT_JOB_URL_TEMPLATE: &str = "jobURLTemplate";
