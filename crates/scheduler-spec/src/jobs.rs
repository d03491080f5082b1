//! Job definitions: presubmits, postsubmits and periodics.

use serde::{Deserialize, Serialize};

use crate::policy::{ProtectionPolicies, Query, RepoContextPolicy};
use crate::replaceable::{ReplaceableMapOfStringString, ReplaceableSliceOfStrings};

/// Fields shared by every kind of job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobBase {
    /// Job name; the key used when merging job lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<ReplaceableMapOfStringString>,

    /// Maximum number of concurrent runs (0 means unlimited).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<u32>,

    /// Execution agent, e.g. `tekton`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Raw pod spec. Carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<serde_json::Value>,
}

impl JobBase {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Restricts which branches a job runs against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brancher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_branches: Option<ReplaceableSliceOfStrings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<ReplaceableSliceOfStrings>,
}

impl Brancher {
    pub fn is_empty(&self) -> bool {
        self.skip_branches.is_none() && self.branches.is_none()
    }
}

/// Runs a job only when changed files match a regular expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexpChangeMatcher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_if_changed: Option<String>,
}

impl RegexpChangeMatcher {
    pub fn is_empty(&self) -> bool {
        self.run_if_changed.is_none()
    }
}

/// A job run against pull requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presubmit {
    #[serde(flatten)]
    pub base: JobBase,

    #[serde(flatten)]
    pub brancher: Brancher,

    #[serde(flatten)]
    pub matcher: RegexpChangeMatcher,

    /// Run for every pull request rather than on demand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_run: Option<bool>,

    /// Status context reported to the git provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Whether the context is excluded from merge requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,

    /// Report the job status to the git provider. Defaults to true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<bool>,

    /// Comment regex that triggers the job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,

    /// Command shown to users to rerun the job. Must match `trigger`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerun_command: Option<String>,

    /// Merge method override for the repository: merge, rebase or squash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_method: Option<String>,

    /// Merge-queue search queries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<Query>,

    /// Branch protection for the repository and its branches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<ProtectionPolicies>,

    /// Merge-queue context policy for the repository and its branches.
    #[serde(
        default,
        rename = "context_options",
        skip_serializing_if = "Option::is_none"
    )]
    pub context_options: Option<RepoContextPolicy>,
}

/// A job run after changes land on a branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Postsubmit {
    #[serde(flatten)]
    pub base: JobBase,

    #[serde(flatten)]
    pub brancher: Brancher,

    #[serde(flatten)]
    pub matcher: RegexpChangeMatcher,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<bool>,
}

/// A time-triggered job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Periodic {
    #[serde(flatten)]
    pub base: JobBase,

    /// Go-style interval between runs, e.g. `1h`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    /// Cron expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<ReplaceableSliceOfStrings>,
}

/// Access to the shared job fields, used for name matching.
pub trait Job {
    fn base(&self) -> &JobBase;

    fn name(&self) -> Option<&str> {
        self.base().name.as_deref()
    }
}

impl Job for Presubmit {
    fn base(&self) -> &JobBase {
        &self.base
    }
}

impl Job for Postsubmit {
    fn base(&self) -> &JobBase {
        &self.base
    }
}

impl Job for Periodic {
    fn base(&self) -> &JobBase {
        &self.base
    }
}
