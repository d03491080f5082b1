//! Presubmits, postsubmits and periodics.

use prow_config::job as out;
use prow_config::JobConfig;
use regex_lite::Regex;
use scheduler_spec::{Brancher, JobBase, Periodic, Postsubmit, Presubmit, RegexpChangeMatcher};

use super::{items, ProjectionFault};
use crate::chain::SchedulerLeaf;

fn valid_job_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
}

fn job_base(base: &JobBase) -> Result<out::JobBase, ProjectionFault> {
    let name = base.name.clone().ok_or(ProjectionFault::MissingJobName)?;
    if !valid_job_name(&name) {
        return Err(ProjectionFault::InvalidJobName(name));
    }
    Ok(out::JobBase {
        name,
        labels: base
            .labels
            .as_ref()
            .map(|l| l.entries.clone())
            .unwrap_or_default(),
        max_concurrency: base.max_concurrency.unwrap_or(0),
        agent: base.agent.clone().unwrap_or_default(),
        cluster: base.cluster.clone().unwrap_or_default(),
        namespace: base.namespace.clone(),
        spec: base.spec.clone(),
    })
}

fn brancher(brancher: &Brancher) -> out::Brancher {
    out::Brancher {
        skip_branches: items(&brancher.skip_branches),
        branches: items(&brancher.branches),
    }
}

fn matcher(matcher: &RegexpChangeMatcher) -> out::RegexpChangeMatcher {
    out::RegexpChangeMatcher {
        run_if_changed: matcher.run_if_changed.clone().unwrap_or_default(),
    }
}

/// The trigger must compile, and a rerun command must be something it matches.
fn check_trigger(job: &str, trigger: &str, rerun_command: &str) -> Result<(), ProjectionFault> {
    if trigger.is_empty() {
        return Ok(());
    }
    let re = Regex::new(trigger).map_err(|e| ProjectionFault::InvalidTrigger {
        job: job.to_string(),
        message: e.to_string(),
    })?;
    if !rerun_command.is_empty() && !re.is_match(rerun_command) {
        return Err(ProjectionFault::RerunCommandMismatch {
            job: job.to_string(),
            command: rerun_command.to_string(),
        });
    }
    Ok(())
}

fn presubmit(presubmit: &Presubmit) -> Result<out::Presubmit, ProjectionFault> {
    let base = job_base(&presubmit.base)?;
    let trigger = presubmit.trigger.clone().unwrap_or_default();
    let rerun_command = presubmit.rerun_command.clone().unwrap_or_default();
    check_trigger(&base.name, &trigger, &rerun_command)?;
    Ok(out::Presubmit {
        base,
        always_run: presubmit.always_run.unwrap_or(false),
        optional: presubmit.optional.unwrap_or(false),
        trigger,
        rerun_command,
        brancher: brancher(&presubmit.brancher),
        matcher: matcher(&presubmit.matcher),
        context: presubmit.context.clone().unwrap_or_default(),
        skip_report: !presubmit.report.unwrap_or(true),
    })
}

fn postsubmit(postsubmit: &Postsubmit) -> Result<out::Postsubmit, ProjectionFault> {
    Ok(out::Postsubmit {
        base: job_base(&postsubmit.base)?,
        brancher: brancher(&postsubmit.brancher),
        matcher: matcher(&postsubmit.matcher),
        context: postsubmit.context.clone().unwrap_or_default(),
        skip_report: !postsubmit.report.unwrap_or(true),
    })
}

fn periodic(periodic: &Periodic) -> Result<out::Periodic, ProjectionFault> {
    let base = job_base(&periodic.base)?;
    let cron = periodic.cron.clone().unwrap_or_default();
    let interval = periodic.interval.clone().unwrap_or_default();
    if cron.is_empty() && interval.is_empty() {
        return Err(ProjectionFault::PeriodicWithoutSchedule(base.name));
    }
    Ok(out::Periodic {
        base,
        cron,
        interval,
        tags: items(&periodic.tags),
    })
}

pub(super) fn project_presubmits(
    config: &mut JobConfig,
    leaf: &SchedulerLeaf,
) -> Result<(), ProjectionFault> {
    let Some(list) = &leaf.spec.presubmits else {
        return Ok(());
    };
    for job in &list.entries {
        let projected = presubmit(job)?;
        config
            .presubmits
            .entry(leaf.repo_key())
            .or_default()
            .push(projected);
    }
    Ok(())
}

pub(super) fn project_postsubmits(
    config: &mut JobConfig,
    leaf: &SchedulerLeaf,
) -> Result<(), ProjectionFault> {
    let Some(list) = &leaf.spec.postsubmits else {
        return Ok(());
    };
    for job in &list.entries {
        let projected = postsubmit(job)?;
        config
            .postsubmits
            .entry(leaf.repo_key())
            .or_default()
            .push(projected);
    }
    Ok(())
}

/// Periodics are global. The first definition of a name wins.
pub(super) fn project_periodics(
    periodics: &mut Vec<out::Periodic>,
    leaf: &SchedulerLeaf,
) -> Result<(), ProjectionFault> {
    let Some(list) = &leaf.spec.periodics else {
        return Ok(());
    };
    for job in &list.entries {
        let projected = periodic(job)?;
        if periodics.iter().any(|p| p.base.name == projected.base.name) {
            continue;
        }
        periodics.push(projected);
    }
    Ok(())
}
