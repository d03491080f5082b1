//! Scheduler document model.
//!
//! A Scheduler is a partial configuration fragment for one repository, one
//! organisation, or a whole team. Every leaf is optional so that fragments
//! can be layered: an unset field inherits from the parent document.

pub mod document;
pub mod duration;
pub mod jobs;
pub mod plugins;
pub mod policy;
pub mod replaceable;

pub use document::{
    ObjectMeta, SchedulerDoc, SchedulerResource, SchedulerSpec, WrongKind, ANNOTATION_PARENT,
    LABEL_ORG, LABEL_REPO, SCHEDULER_API_VERSION, SCHEDULER_KIND,
};
pub use duration::{DurationParseError, GoDuration};
pub use jobs::{Brancher, Job, JobBase, Periodic, Postsubmit, Presubmit, RegexpChangeMatcher};
pub use plugins::{
    Approve, Attachment, ConfigMapSpec, ConfigUpdater, ExternalPlugin, Lgtm, SchedulerAgent,
    Trigger, Welcome, ATTACHMENT_JOB_URL_PREFIX, ATTACHMENT_JOB_URL_TEMPLATE,
    ATTACHMENT_REPORT_TEMPLATE,
};
pub use policy::{
    BranchProtectionContextPolicy, ContextPolicy, GlobalProtectionPolicy, Merger,
    ProtectionPolicies, ProtectionPolicy, Query, RepoContextPolicy, Restrictions, ReviewPolicy,
};
pub use replaceable::{
    strings, Periodics, Postsubmits, Presubmits, ReplaceableMap,
    ReplaceableMapOfStringContextPolicy, ReplaceableMapOfStringString, ReplaceableSlice,
    ReplaceableSliceOfExternalPlugins, ReplaceableSliceOfStrings,
};

/// Agent used when a document does not name one.
pub const DEFAULT_AGENT: &str = "tekton";

/// Merge method used when a document does not name one.
pub const DEFAULT_MERGE_METHOD: &str = "merge";
