//! Scheduler documents and their resource wrapper.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::plugins::{
    Approve, Attachment, ConfigUpdater, Lgtm, SchedulerAgent, Trigger, Welcome,
};
use crate::policy::{GlobalProtectionPolicy, Merger};
use crate::replaceable::{
    Periodics, Postsubmits, Presubmits, ReplaceableSliceOfExternalPlugins,
    ReplaceableSliceOfStrings,
};

/// Resource kind of a Scheduler.
pub const SCHEDULER_KIND: &str = "Scheduler";

/// API version written on Scheduler resources.
pub const SCHEDULER_API_VERSION: &str = "jenkins.io/v1";

/// Label carrying the organisation a Scheduler applies to.
pub const LABEL_ORG: &str = "jenkins.io/org";

/// Label carrying the repository a Scheduler applies to.
pub const LABEL_REPO: &str = "jenkins.io/repo";

/// Annotation naming the parent Scheduler.
pub const ANNOTATION_PARENT: &str = "jenkins.io/parent-scheduler";

/// One configuration fragment. Every field is optional; `None` inherits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler_agent: Option<SchedulerAgent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<GlobalProtectionPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presubmits: Option<Presubmits>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postsubmits: Option<Postsubmits>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approve: Option<Approve>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lgtm: Option<Lgtm>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_plugins: Option<ReplaceableSliceOfExternalPlugins>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merger: Option<Merger>,

    /// Names of plugins enabled for the repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins: Option<ReplaceableSliceOfStrings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_updater: Option<ConfigUpdater>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub welcome: Option<Vec<Welcome>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodics: Option<Periodics>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

/// A named Scheduler document as consumed by chain resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulerDoc {
    pub name: String,
    pub org: Option<String>,
    pub repo: Option<String>,
    /// Name of the parent Scheduler, if any.
    pub parent: Option<String>,
    pub spec: SchedulerSpec,
}

impl SchedulerDoc {
    /// A template document with no org/repo scope.
    pub fn template(name: impl Into<String>, spec: SchedulerSpec) -> Self {
        Self {
            name: name.into(),
            spec,
            ..Self::default()
        }
    }

    /// A document scoped to `org/repo`.
    pub fn scoped(
        name: impl Into<String>,
        org: impl Into<String>,
        repo: impl Into<String>,
        spec: SchedulerSpec,
    ) -> Self {
        Self {
            name: name.into(),
            org: Some(org.into()),
            repo: Some(repo.into()),
            spec,
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Both org and repo, when this document is repository scoped.
    pub fn scope(&self) -> Option<(&str, &str)> {
        match (self.org.as_deref(), self.repo.as_deref()) {
            (Some(org), Some(repo)) if !org.is_empty() && !repo.is_empty() => Some((org, repo)),
            _ => None,
        }
    }
}

/// Resource metadata. Only the fields scheduling cares about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// The `Scheduler` custom resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerResource {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: SchedulerSpec,
}

/// A resource that is not a Scheduler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("resource {name:?} has kind {kind:?}, expected {SCHEDULER_KIND}")]
pub struct WrongKind {
    pub name: String,
    pub kind: String,
}

impl SchedulerResource {
    /// Unwrap into a document, reading scope labels and the parent annotation.
    pub fn into_doc(self) -> Result<SchedulerDoc, WrongKind> {
        if self.kind != SCHEDULER_KIND {
            return Err(WrongKind {
                name: self.metadata.name,
                kind: self.kind,
            });
        }
        let mut metadata = self.metadata;
        Ok(SchedulerDoc {
            org: metadata.labels.remove(LABEL_ORG),
            repo: metadata.labels.remove(LABEL_REPO),
            parent: metadata.annotations.remove(ANNOTATION_PARENT),
            name: metadata.name,
            spec: self.spec,
        })
    }
}

impl From<SchedulerDoc> for SchedulerResource {
    fn from(doc: SchedulerDoc) -> Self {
        let mut metadata = ObjectMeta {
            name: doc.name,
            ..ObjectMeta::default()
        };
        if let Some(org) = doc.org {
            metadata.labels.insert(LABEL_ORG.to_string(), org);
        }
        if let Some(repo) = doc.repo {
            metadata.labels.insert(LABEL_REPO.to_string(), repo);
        }
        if let Some(parent) = doc.parent {
            metadata
                .annotations
                .insert(ANNOTATION_PARENT.to_string(), parent);
        }
        Self {
            api_version: SCHEDULER_API_VERSION.to_string(),
            kind: SCHEDULER_KIND.to_string(),
            metadata,
            spec: doc.spec,
        }
    }
}
