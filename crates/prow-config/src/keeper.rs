//! Merge-queue (keeper) configuration.

use scheduler_spec::GoDuration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{is_false, is_zero};

/// How pull requests are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    Merge,
    Rebase,
    Squash,
}

impl MergeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Rebase => "rebase",
            Self::Squash => "squash",
        }
    }
}

impl fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merge method not one of merge, rebase or squash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown merge method {0:?} (expected merge, rebase or squash)")]
pub struct UnknownMergeMethod(pub String);

impl FromStr for MergeMethod {
    type Err = UnknownMergeMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge" => Ok(Self::Merge),
            "rebase" => Ok(Self::Rebase),
            "squash" => Ok(Self::Squash),
            other => Err(UnknownMergeMethod(other.to_string())),
        }
    }
}

/// A pull request search the merge queue runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeeperQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repos: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    #[serde(default, rename = "missingLabels", skip_serializing_if = "Vec::is_empty")]
    pub missing_labels: Vec<String>,

    #[serde(default, rename = "excludedBranches", skip_serializing_if = "Vec::is_empty")]
    pub excluded_branches: Vec<String>,

    #[serde(default, rename = "includedBranches", skip_serializing_if = "Vec::is_empty")]
    pub included_branches: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub milestone: String,

    #[serde(default, rename = "reviewApprovedRequired", skip_serializing_if = "is_false")]
    pub review_approved_required: bool,
}

impl KeeperQuery {
    /// Equal in every field except the repo list.
    pub fn same_criteria(&self, other: &Self) -> bool {
        self.labels == other.labels
            && self.missing_labels == other.missing_labels
            && self.excluded_branches == other.excluded_branches
            && self.included_branches == other.included_branches
            && self.milestone == other.milestone
            && self.review_approved_required == other.review_approved_required
    }
}

/// Which status contexts gate a merge at one level of the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KeeperContextPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_unknown_contexts: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_contexts: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_if_present_contexts: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_contexts: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_branch_protection: Option<bool>,
}

/// Context policy tree: global, then org, repo and branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeeperContextPolicyOptions {
    #[serde(flatten)]
    pub policy: KeeperContextPolicy,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub orgs: BTreeMap<String, KeeperOrgContextPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeeperOrgContextPolicy {
    #[serde(flatten)]
    pub policy: KeeperContextPolicy,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub repos: BTreeMap<String, KeeperRepoContextPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeeperRepoContextPolicy {
    #[serde(flatten)]
    pub policy: KeeperContextPolicy,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub branches: BTreeMap<String, KeeperContextPolicy>,
}

impl KeeperContextPolicyOptions {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Merge-queue settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Keeper {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_period: Option<GoDuration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_update_period: Option<GoDuration>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<KeeperQuery>,

    /// Merge method per `org/repo`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub merge_method: BTreeMap<String, MergeMethod>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pr_status_base_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub blocker_label: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub squash_label: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_goroutines: u32,

    #[serde(default, skip_serializing_if = "KeeperContextPolicyOptions::is_empty")]
    pub context_options: KeeperContextPolicyOptions,
}

impl Keeper {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
