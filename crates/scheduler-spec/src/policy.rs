//! Branch protection and merge-queue policy structures.

use serde::{Deserialize, Serialize};

use crate::duration::GoDuration;
use crate::replaceable::{
    is_false, ReplaceableMapOfStringContextPolicy, ReplaceableSliceOfStrings,
};
use std::collections::BTreeMap;

/// Branch protection applied to every repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalProtectionPolicy {
    #[serde(flatten)]
    pub policy: ProtectionPolicy,

    /// Also protect repositories that only have jobs configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protect_tested: Option<bool>,
}

/// Branch protection settings for one scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protect: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_status_checks: Option<BranchProtectionContextPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_admins: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Restrictions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_pull_request_reviews: Option<ReviewPolicy>,
}

impl ProtectionPolicy {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Repository-level protection plus per-branch overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtectionPolicies {
    #[serde(flatten)]
    pub policy: ProtectionPolicy,

    #[serde(default, skip_serializing_if = "is_false")]
    pub replace: bool,

    /// Branch name to policy.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub entries: BTreeMap<String, ProtectionPolicy>,
}

/// Users and teams allowed to push or dismiss reviews.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Restrictions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<ReplaceableSliceOfStrings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<ReplaceableSliceOfStrings>,
}

/// Pull request review requirements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissal_restrictions: Option<Restrictions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismiss_stale_reviews: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_code_owner_reviews: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_approving_review_count: Option<u32>,
}

/// Status checks required by branch protection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchProtectionContextPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contexts: Option<ReplaceableSliceOfStrings>,

    /// Require branches to be up to date before merging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

/// Merge-queue settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merger {
    /// How often the merge queue syncs with the git provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_period: Option<GoDuration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_update_period: Option<GoDuration>,

    /// URL for status contexts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,

    /// Base URL of the PR status page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_status_base_url: Option<String>,

    /// Label marking merge-blocking issues.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocker_label: Option<String>,

    /// Label marking pull requests that are always squash merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub squash_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_goroutines: Option<u32>,

    /// Default merge method: merge, rebase or squash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_method: Option<String>,

    /// Global context policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<ContextPolicy>,
}

/// Which status contexts gate a merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_unknown_contexts: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_contexts: Option<ReplaceableSliceOfStrings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_if_present_contexts: Option<ReplaceableSliceOfStrings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_contexts: Option<ReplaceableSliceOfStrings>,

    /// Infer required contexts from branch protection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_branch_protection: Option<bool>,
}

impl ContextPolicy {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Repository context policy plus per-branch overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoContextPolicy {
    #[serde(flatten)]
    pub policy: ContextPolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<ReplaceableMapOfStringContextPolicy>,
}

/// A merge-queue pull request search query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_branches: Option<ReplaceableSliceOfStrings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_branches: Option<ReplaceableSliceOfStrings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<ReplaceableSliceOfStrings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_labels: Option<ReplaceableSliceOfStrings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_approved_required: Option<bool>,
}
