//! Branch protection tree: global, then org, repo and branch overrides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::is_false;

/// Protection settings at one level of the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protect: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_status_checks: Option<ContextPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_admins: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Restrictions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_pull_request_reviews: Option<ReviewPolicy>,
}

impl Policy {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextPolicy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Restrictions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teams: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
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

/// Root of the tree. The flattened policy is the global default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchProtection {
    #[serde(flatten)]
    pub policy: Policy,

    #[serde(
        default,
        rename = "protect-tested-repos",
        skip_serializing_if = "is_false"
    )]
    pub protect_tested: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub orgs: BTreeMap<String, Org>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Org {
    #[serde(flatten)]
    pub policy: Policy,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub repos: BTreeMap<String, Repo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repo {
    #[serde(flatten)]
    pub policy: Policy,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub branches: BTreeMap<String, Branch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    #[serde(flatten)]
    pub policy: Policy,
}

impl BranchProtection {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn org(&self, org: &str) -> Option<&Org> {
        self.orgs.get(org)
    }

    pub fn repo(&self, org: &str, repo: &str) -> Option<&Repo> {
        self.orgs.get(org)?.repos.get(repo)
    }

    /// The repo node, creating the org and repo on demand.
    pub fn repo_mut(&mut self, org: &str, repo: &str) -> &mut Repo {
        self.orgs
            .entry(org.to_string())
            .or_default()
            .repos
            .entry(repo.to_string())
            .or_default()
    }
}
