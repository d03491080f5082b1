//! Config projection.
//!
//! Folds repository-scoped leaves into the single compiled configuration:
//! job config, global policy (keeper, branch protection, plank) and plugin
//! config. Each aspect is projected independently per leaf. Any failure aborts
//! the whole projection; there is no partial output.

mod branch_protection;
mod jobs;
mod keeper;
mod plugins;

use prow_config::{Config, JobConfig, PluginsConfiguration, ProwConfig};
use scheduler_spec::ReplaceableSliceOfStrings;
use std::fmt;
use tracing::debug;

use crate::chain::SchedulerLeaf;

/// The three projected documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub job_config: JobConfig,
    pub prow_config: ProwConfig,
    pub plugins: PluginsConfiguration,
}

impl Projection {
    /// Split into the `config.yaml` and `plugins.yaml` documents.
    pub fn into_documents(self) -> (Config, PluginsConfiguration) {
        let config = Config {
            job_config: self.job_config,
            prow_config: self.prow_config,
        };
        (config, self.plugins)
    }
}

/// Which part of the configuration was being projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aspect {
    Jobs,
    Periodics,
    Keeper,
    BranchProtection,
    Plugins,
    Attachments,
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jobs => "jobs",
            Self::Periodics => "periodics",
            Self::Keeper => "keeper",
            Self::BranchProtection => "branch protection",
            Self::Plugins => "plugins",
            Self::Attachments => "attachments",
        })
    }
}

/// What went wrong inside one aspect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionFault {
    #[error("job has no name")]
    MissingJobName,

    #[error("invalid job name {0:?}: only letters, digits, '-', '.' and '_' are allowed")]
    InvalidJobName(String),

    #[error("job {job:?} has an invalid trigger: {message}")]
    InvalidTrigger { job: String, message: String },

    #[error("job {job:?}: rerun command {command:?} does not match its trigger")]
    RerunCommandMismatch { job: String, command: String },

    #[error(transparent)]
    InvalidMergeMethod(#[from] prow_config::keeper::UnknownMergeMethod),

    #[error("periodic {0:?} needs a cron or an interval")]
    PeriodicWithoutSchedule(String),

    #[error("attachment {0:?} has no URLs")]
    AttachmentWithoutUrls(String),

    #[error("external plugin has no name")]
    MissingPluginName,

    #[error("welcome entry has no message template")]
    MissingWelcomeTemplate,
}

/// A fault in one aspect of one leaf.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("projecting {aspect} for {org}/{repo}: {kind}")]
pub struct ProjectionError {
    pub org: String,
    pub repo: String,
    pub aspect: Aspect,
    #[source]
    pub kind: ProjectionFault,
}

fn at(leaf: &SchedulerLeaf, aspect: Aspect) -> impl FnOnce(ProjectionFault) -> ProjectionError {
    let (org, repo) = (leaf.org.clone(), leaf.repo.clone());
    move |kind| ProjectionError {
        org,
        repo,
        aspect,
        kind,
    }
}

pub(crate) fn items(list: &Option<ReplaceableSliceOfStrings>) -> Vec<String> {
    list.as_ref().map(|l| l.entries.clone()).unwrap_or_default()
}

/// Project every leaf into the compiled configuration.
pub fn project(leaves: &[SchedulerLeaf]) -> Result<Projection, ProjectionError> {
    let mut out = Projection::default();
    for leaf in leaves {
        debug!(repo = %leaf.repo_key(), "projecting scheduler leaf");
        project_leaf(&mut out, leaf)?;
    }
    Ok(out)
}

fn project_leaf(out: &mut Projection, leaf: &SchedulerLeaf) -> Result<(), ProjectionError> {
    jobs::project_postsubmits(&mut out.job_config, leaf).map_err(at(leaf, Aspect::Jobs))?;
    jobs::project_presubmits(&mut out.job_config, leaf).map_err(at(leaf, Aspect::Jobs))?;
    jobs::project_periodics(&mut out.job_config.periodics, leaf)
        .map_err(at(leaf, Aspect::Periodics))?;
    keeper::project_keeper(&mut out.prow_config.keeper, leaf).map_err(at(leaf, Aspect::Keeper))?;
    branch_protection::project_branch_protection(&mut out.prow_config.branch_protection, leaf);
    plugins::project_plugins(&mut out.plugins, leaf).map_err(at(leaf, Aspect::Plugins))?;
    plugins::project_attachments(&mut out.prow_config.plank, leaf)
        .map_err(at(leaf, Aspect::Attachments))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_spec::{
        JobBase, Merger, Presubmit, Presubmits, ReplaceableSlice, SchedulerSpec,
    };

    fn leaf(repo: &str, job: &str) -> SchedulerLeaf {
        let spec = SchedulerSpec {
            presubmits: Some(Presubmits::of(vec![Presubmit {
                base: JobBase::named(job),
                ..Presubmit::default()
            }])),
            ..SchedulerSpec::default()
        };
        SchedulerLeaf::new("acme", repo, spec)
    }

    #[test]
    fn test_leaves_group_by_repo() {
        let leaves = vec![leaf("r1", "unit"), leaf("r2", "lint")];
        let projection = project(&leaves).unwrap();
        let keys: Vec<&String> = projection.job_config.presubmits.keys().collect();
        assert_eq!(keys, vec!["acme/r1", "acme/r2"]);
        assert_eq!(projection.job_config.presubmits["acme/r1"][0].base.name, "unit");
    }

    #[test]
    fn test_repo_without_jobs_has_no_key() {
        let leaves = vec![SchedulerLeaf::new(
            "acme",
            "quiet",
            SchedulerSpec {
                presubmits: Some(ReplaceableSlice::default()),
                ..SchedulerSpec::default()
            },
        )];
        let projection = project(&leaves).unwrap();
        assert!(projection.job_config.presubmits.is_empty());
        assert!(projection.job_config.postsubmits.is_empty());
    }

    #[test]
    fn test_error_names_leaf_and_aspect() {
        let mut bad = leaf("r1", "unit");
        bad.spec.merger = Some(Merger {
            merge_method: Some("fast-forward".to_string()),
            ..Merger::default()
        });
        let err = project(&[leaf("r0", "ok"), bad]).unwrap_err();
        assert_eq!(err.repo, "r1");
        assert_eq!(err.aspect, Aspect::Keeper);
        assert!(matches!(err.kind, ProjectionFault::InvalidMergeMethod(_)));
        assert!(err.to_string().contains("keeper for acme/r1"));
    }

    #[test]
    fn test_into_documents() {
        let (config, plugins) = project(&[leaf("r1", "unit")]).unwrap().into_documents();
        assert_eq!(config.job_config.presubmits.len(), 1);
        assert_eq!(plugins, PluginsConfiguration::default());
    }
}
