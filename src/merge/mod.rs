//! Merge engine.
//!
//! [`build`] folds an ordered chain of Scheduler specs, least specific first,
//! into one effective spec. Each document acts as the child of everything
//! before it:
//!
//! - Scalars: the child wins when set.
//! - Nested structs: an unset child inherits the parent's whole struct.
//! - Replaceable lists and maps: `replace` on the child drops the parent's
//!   entries, otherwise the two are combined.
//! - Job lists: merged by job name.
//!
//! Inputs are never mutated; the result is an independent value.

pub mod fields;
mod jobs;
mod plugins;
mod policy;

pub use jobs::JobKind;

use scheduler_spec::SchedulerSpec;

use fields::{nested, opt_slice, try_nested};

/// Merge failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("cannot build an empty scheduler chain")]
    EmptyChain,

    #[error("{kind} name {name:?} is ambiguous: more than one job with that name")]
    AmbiguousName { kind: JobKind, name: String },
}

/// Fold a chain of specs into the effective spec for its last element.
pub fn build(chain: &[&SchedulerSpec]) -> Result<SchedulerSpec, MergeError> {
    let (last, ancestors) = chain.split_last().ok_or(MergeError::EmptyChain)?;
    let mut effective = (*last).clone();
    for parent in ancestors.iter().rev() {
        apply_parent(&mut effective, parent)?;
    }
    Ok(effective)
}

/// Merge one parent into `child` in place.
pub fn apply_parent(child: &mut SchedulerSpec, parent: &SchedulerSpec) -> Result<(), MergeError> {
    nested(
        &mut child.scheduler_agent,
        &parent.scheduler_agent,
        plugins::merge_scheduler_agent,
    );
    nested(
        &mut child.policy,
        &parent.policy,
        policy::merge_global_protection_policy,
    );
    try_nested(&mut child.presubmits, &parent.presubmits, |c, p| {
        jobs::merge_named(JobKind::Presubmit, c, p, jobs::merge_presubmit)
    })?;
    try_nested(&mut child.postsubmits, &parent.postsubmits, |c, p| {
        jobs::merge_named(JobKind::Postsubmit, c, p, jobs::merge_postsubmit)
    })?;
    try_nested(&mut child.periodics, &parent.periodics, |c, p| {
        jobs::merge_named(JobKind::Periodic, c, p, jobs::merge_periodic)
    })?;
    nested(&mut child.trigger, &parent.trigger, plugins::merge_trigger);
    nested(&mut child.approve, &parent.approve, plugins::merge_approve);
    nested(&mut child.lgtm, &parent.lgtm, plugins::merge_lgtm);
    opt_slice(&mut child.external_plugins, &parent.external_plugins);
    nested(&mut child.merger, &parent.merger, policy::merge_merger);
    opt_slice(&mut child.plugins, &parent.plugins);
    nested(
        &mut child.config_updater,
        &parent.config_updater,
        plugins::merge_config_updater,
    );
    plugins::merge_welcome(&mut child.welcome, &parent.welcome);
    nested(
        &mut child.attachments,
        &parent.attachments,
        |c, p| plugins::merge_attachments(c, p),
    );
    Ok(())
}
