//! Named job lists.
//!
//! Parent jobs are matched to the child's jobs by name. A unique match merges
//! field by field; no match carries the parent job through unchanged. Jobs
//! without a name never match.

use scheduler_spec::{
    Brancher, Job, JobBase, Periodic, Postsubmit, Presubmit, RegexpChangeMatcher,
    ReplaceableSlice,
};

use super::fields::{inherit, nested, opt_map, opt_slice};
use super::policy::{merge_protection_policies, merge_queries, merge_repo_context_policy};
use super::MergeError;

/// Which kind of job list is being merged, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Presubmit,
    Postsubmit,
    Periodic,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Presubmit => "presubmit",
            Self::Postsubmit => "postsubmit",
            Self::Periodic => "periodic",
        })
    }
}

/// Merge a parent job list into the child's.
///
/// A name is ambiguous when it is shared by more than one child job, or by
/// more than one parent job, and appears on both sides.
pub fn merge_named<T: Job + Clone>(
    kind: JobKind,
    child: &mut ReplaceableSlice<T>,
    parent: &ReplaceableSlice<T>,
    merge_item: fn(&mut T, &T),
) -> Result<(), MergeError> {
    if child.replace {
        return Ok(());
    }

    let own = child.entries.len();
    let mut carried = Vec::new();
    for (index, inherited) in parent.entries.iter().enumerate() {
        let Some(name) = inherited.name() else {
            carried.push(inherited.clone());
            continue;
        };
        let matches: Vec<usize> = (0..own)
            .filter(|&i| child.entries[i].name() == Some(name))
            .collect();
        match matches.as_slice() {
            [] => carried.push(inherited.clone()),
            [target] => {
                let duplicated = parent
                    .entries
                    .iter()
                    .enumerate()
                    .any(|(other, job)| other != index && job.name() == Some(name));
                if duplicated {
                    return Err(MergeError::AmbiguousName {
                        kind,
                        name: name.to_string(),
                    });
                }
                merge_item(&mut child.entries[*target], inherited);
            }
            _ => {
                return Err(MergeError::AmbiguousName {
                    kind,
                    name: name.to_string(),
                })
            }
        }
    }

    child.entries.extend(carried);
    child.replace = parent.replace;
    Ok(())
}

pub fn merge_job_base(child: &mut JobBase, parent: &JobBase) {
    inherit(&mut child.name, &parent.name);
    opt_map(&mut child.labels, &parent.labels);
    inherit(&mut child.max_concurrency, &parent.max_concurrency);
    inherit(&mut child.agent, &parent.agent);
    inherit(&mut child.cluster, &parent.cluster);
    inherit(&mut child.namespace, &parent.namespace);
    inherit(&mut child.spec, &parent.spec);
}

fn merge_brancher(child: &mut Brancher, parent: &Brancher) {
    opt_slice(&mut child.skip_branches, &parent.skip_branches);
    opt_slice(&mut child.branches, &parent.branches);
}

fn merge_matcher(child: &mut RegexpChangeMatcher, parent: &RegexpChangeMatcher) {
    inherit(&mut child.run_if_changed, &parent.run_if_changed);
}

pub fn merge_presubmit(child: &mut Presubmit, parent: &Presubmit) {
    merge_job_base(&mut child.base, &parent.base);
    merge_brancher(&mut child.brancher, &parent.brancher);
    merge_matcher(&mut child.matcher, &parent.matcher);
    inherit(&mut child.always_run, &parent.always_run);
    inherit(&mut child.context, &parent.context);
    inherit(&mut child.optional, &parent.optional);
    inherit(&mut child.report, &parent.report);
    inherit(&mut child.trigger, &parent.trigger);
    inherit(&mut child.rerun_command, &parent.rerun_command);
    inherit(&mut child.merge_method, &parent.merge_method);
    merge_queries(&mut child.queries, &parent.queries);
    nested(&mut child.policy, &parent.policy, merge_protection_policies);
    nested(
        &mut child.context_options,
        &parent.context_options,
        merge_repo_context_policy,
    );
}

pub fn merge_postsubmit(child: &mut Postsubmit, parent: &Postsubmit) {
    merge_job_base(&mut child.base, &parent.base);
    merge_brancher(&mut child.brancher, &parent.brancher);
    merge_matcher(&mut child.matcher, &parent.matcher);
    inherit(&mut child.context, &parent.context);
    inherit(&mut child.report, &parent.report);
}

pub fn merge_periodic(child: &mut Periodic, parent: &Periodic) {
    merge_job_base(&mut child.base, &parent.base);
    inherit(&mut child.interval, &parent.interval);
    inherit(&mut child.cron, &parent.cron);
    opt_slice(&mut child.tags, &parent.tags);
}
