//! Reverse projection.
//!
//! Rebuilds Scheduler documents from an existing compiled configuration: one
//! document per `org/repo` that has jobs, plus a `default-scheduler` template
//! holding settings that belong to no single repository. This is lossy.
//! Recompiling the documents does not always reproduce the input
//! byte-for-byte.

use prow_config::branch_protection as bp;
use prow_config::job as pj;
use prow_config::keeper::{KeeperContextPolicy, KeeperRepoContextPolicy};
use prow_config::{JobConfig, Keeper, PluginsConfiguration, ProwConfig};
use scheduler_spec::{
    strings, Approve, Attachment, Brancher, BranchProtectionContextPolicy, ConfigMapSpec,
    ConfigUpdater, ContextPolicy, ExternalPlugin, GlobalProtectionPolicy, JobBase, Lgtm, Merger,
    Periodic, Periodics, Postsubmit, Postsubmits, Presubmit, Presubmits, ProtectionPolicies,
    ProtectionPolicy, Query, RegexpChangeMatcher, ReplaceableMap, ReplaceableSlice,
    ReplaceableSliceOfStrings, RepoContextPolicy, Restrictions, ReviewPolicy, SchedulerAgent,
    SchedulerDoc, SchedulerSpec, Trigger, Welcome, ATTACHMENT_JOB_URL_PREFIX,
    ATTACHMENT_JOB_URL_TEMPLATE, ATTACHMENT_REPORT_TEMPLATE, DEFAULT_AGENT, DEFAULT_MERGE_METHOD,
};
use tracing::{debug, info};

/// Name of the template document every rebuilt repository document inherits from.
pub const DEFAULT_SCHEDULER: &str = "default-scheduler";

const CONFIG_UPDATER_PLUGIN: &str = "config-updater";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReverseError {
    #[error("job config key {0:?} is not of the form org/repo")]
    InvalidRepoKey(String),
}

fn split_repo_key(key: &str) -> Result<(&str, &str), ReverseError> {
    match key.split_once('/') {
        Some((org, repo)) if !org.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((org, repo))
        }
        _ => Err(ReverseError::InvalidRepoKey(key.to_string())),
    }
}

fn text(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn listed(values: &[String]) -> Option<ReplaceableSliceOfStrings> {
    (!values.is_empty()).then(|| strings(values.iter().cloned()))
}

fn set(value: bool) -> Option<bool> {
    value.then_some(true)
}

/// Rebuild Scheduler documents from a compiled configuration.
pub fn reconstruct(
    jobs: &JobConfig,
    prow: &ProwConfig,
    plugins: &PluginsConfiguration,
) -> Result<Vec<SchedulerDoc>, ReverseError> {
    let keys = jobs.repo_keys();
    info!(repos = keys.len(), "rebuilding scheduler documents");

    let mut docs = Vec::with_capacity(keys.len() + 1);
    for key in keys {
        let (org, repo) = split_repo_key(key)?;
        debug!(repo = key, "rebuilding repository scheduler");
        let spec = repo_spec(key, org, repo, jobs, prow, plugins);
        let name = format!("{}-scheduler", key.replace('/', "-"));
        docs.push(SchedulerDoc::scoped(name, org, repo, spec).with_parent(DEFAULT_SCHEDULER));
    }
    docs.push(SchedulerDoc::template(
        DEFAULT_SCHEDULER,
        default_spec(jobs, prow),
    ));
    Ok(docs)
}

fn repo_spec(
    key: &str,
    org: &str,
    repo: &str,
    jobs: &JobConfig,
    prow: &ProwConfig,
    plugins: &PluginsConfiguration,
) -> SchedulerSpec {
    let keeper = &prow.keeper;
    SchedulerSpec {
        scheduler_agent: Some(SchedulerAgent {
            agent: Some(DEFAULT_AGENT.to_string()),
        }),
        policy: global_policy(&prow.branch_protection),
        presubmits: presubmits(key, org, repo, jobs, prow),
        postsubmits: postsubmits(key, jobs),
        trigger: plugins.trigger_for(key).map(trigger),
        approve: plugins.approve_for(org, key).map(approve),
        lgtm: plugins.lgtm_for(key).map(lgtm),
        external_plugins: external_plugins(key, plugins),
        merger: Some(merger(key, org, repo, keeper)),
        plugins: plugins.plugins.get(key).and_then(|p| listed(p)),
        config_updater: config_updater(key, plugins),
        welcome: welcome(plugins),
        periodics: None,
        attachments: None,
    }
}

/// Periodics and job runner attachments are global; they go on the template.
fn default_spec(jobs: &JobConfig, prow: &ProwConfig) -> SchedulerSpec {
    let periodics: Vec<Periodic> = jobs.periodics.iter().map(periodic).collect();
    let attachments: Vec<Attachment> = [
        (ATTACHMENT_REPORT_TEMPLATE, &prow.plank.report_template),
        (ATTACHMENT_JOB_URL_PREFIX, &prow.plank.job_url_prefix),
        (ATTACHMENT_JOB_URL_TEMPLATE, &prow.plank.job_url_template),
    ]
    .into_iter()
    .filter(|(_, url)| !url.is_empty())
    .map(|(name, url)| Attachment {
        name: name.to_string(),
        urls: vec![url.clone()],
    })
    .collect();

    SchedulerSpec {
        periodics: (!periodics.is_empty()).then(|| Periodics::of(periodics)),
        attachments: (!attachments.is_empty()).then_some(attachments),
        ..SchedulerSpec::default()
    }
}

fn job_base(base: &pj::JobBase) -> JobBase {
    JobBase {
        name: Some(base.name.clone()),
        labels: (!base.labels.is_empty()).then(|| ReplaceableMap::of(base.labels.clone())),
        max_concurrency: (base.max_concurrency > 0).then_some(base.max_concurrency),
        agent: text(&base.agent),
        cluster: text(&base.cluster),
        namespace: base.namespace.clone(),
        spec: base.spec.clone(),
    }
}

fn brancher(brancher: &pj::Brancher) -> Brancher {
    Brancher {
        skip_branches: listed(&brancher.skip_branches),
        branches: listed(&brancher.branches),
    }
}

fn matcher(matcher: &pj::RegexpChangeMatcher) -> RegexpChangeMatcher {
    RegexpChangeMatcher {
        run_if_changed: text(&matcher.run_if_changed),
    }
}

fn report(skip_report: bool) -> Option<bool> {
    skip_report.then_some(false)
}

/// Repository-wide keeper and branch protection settings ride on the first
/// presubmit only.
fn presubmits(
    key: &str,
    org: &str,
    repo: &str,
    jobs: &JobConfig,
    prow: &ProwConfig,
) -> Option<Presubmits> {
    let list = jobs.presubmits.get(key)?;
    let keeper = &prow.keeper;
    let merge_method = keeper.merge_method.get(key).map(|m| m.to_string());
    let items = list
        .iter()
        .enumerate()
        .map(|(i, job)| {
            let mut presubmit = Presubmit {
                base: job_base(&job.base),
                brancher: brancher(&job.brancher),
                matcher: matcher(&job.matcher),
                always_run: Some(job.always_run),
                context: text(&job.context),
                optional: set(job.optional),
                report: report(job.skip_report),
                trigger: text(&job.trigger),
                rerun_command: text(&job.rerun_command),
                merge_method: merge_method.clone(),
                ..Presubmit::default()
            };
            if i == 0 {
                presubmit.queries = queries(key, &keeper.queries);
                presubmit.policy = protection_policies(prow.branch_protection.repo(org, repo));
                presubmit.context_options = keeper
                    .context_options
                    .orgs
                    .get(org)
                    .and_then(|o| o.repos.get(repo))
                    .map(repo_context_policy);
            }
            presubmit
        })
        .collect();
    Some(Presubmits::of(items))
}

fn postsubmits(key: &str, jobs: &JobConfig) -> Option<Postsubmits> {
    let list = jobs.postsubmits.get(key)?;
    let items = list
        .iter()
        .map(|job| Postsubmit {
            base: job_base(&job.base),
            brancher: brancher(&job.brancher),
            matcher: matcher(&job.matcher),
            context: text(&job.context),
            report: report(job.skip_report),
        })
        .collect();
    Some(Postsubmits::of(items))
}

fn periodic(job: &pj::Periodic) -> Periodic {
    Periodic {
        base: job_base(&job.base),
        interval: text(&job.interval),
        cron: text(&job.cron),
        tags: listed(&job.tags),
    }
}

fn restrictions(restrictions: &bp::Restrictions) -> Restrictions {
    Restrictions {
        users: listed(&restrictions.users),
        teams: listed(&restrictions.teams),
    }
}

fn protection_policy(policy: &bp::Policy) -> ProtectionPolicy {
    ProtectionPolicy {
        protect: policy.protect,
        required_status_checks: policy.required_status_checks.as_ref().map(|checks| {
            BranchProtectionContextPolicy {
                contexts: listed(&checks.contexts),
                strict: checks.strict,
            }
        }),
        enforce_admins: policy.enforce_admins,
        restrictions: policy.restrictions.as_ref().map(restrictions),
        required_pull_request_reviews: policy.required_pull_request_reviews.as_ref().map(
            |reviews| ReviewPolicy {
                dismissal_restrictions: reviews.dismissal_restrictions.as_ref().map(restrictions),
                dismiss_stale_reviews: reviews.dismiss_stale_reviews,
                require_code_owner_reviews: reviews.require_code_owner_reviews,
                required_approving_review_count: reviews.required_approving_review_count,
            },
        ),
    }
}

fn global_policy(tree: &bp::BranchProtection) -> Option<GlobalProtectionPolicy> {
    if tree.policy.is_empty() && !tree.protect_tested {
        return None;
    }
    Some(GlobalProtectionPolicy {
        policy: protection_policy(&tree.policy),
        protect_tested: set(tree.protect_tested),
    })
}

fn protection_policies(repo: Option<&bp::Repo>) -> Option<ProtectionPolicies> {
    let repo = repo?;
    if repo.policy.is_empty() && repo.branches.is_empty() {
        return None;
    }
    Some(ProtectionPolicies {
        policy: protection_policy(&repo.policy),
        entries: repo
            .branches
            .iter()
            .map(|(branch, b)| (branch.clone(), protection_policy(&b.policy)))
            .collect(),
        ..ProtectionPolicies::default()
    })
}

fn context_policy(policy: &KeeperContextPolicy) -> ContextPolicy {
    ContextPolicy {
        skip_unknown_contexts: policy.skip_unknown_contexts,
        required_contexts: listed(&policy.required_contexts),
        required_if_present_contexts: listed(&policy.required_if_present_contexts),
        optional_contexts: listed(&policy.optional_contexts),
        from_branch_protection: policy.from_branch_protection,
    }
}

fn repo_context_policy(policy: &KeeperRepoContextPolicy) -> RepoContextPolicy {
    RepoContextPolicy {
        policy: context_policy(&policy.policy),
        branches: (!policy.branches.is_empty()).then(|| {
            ReplaceableMap::of(
                policy
                    .branches
                    .iter()
                    .map(|(branch, p)| (branch.clone(), context_policy(p)))
                    .collect(),
            )
        }),
    }
}

fn queries(key: &str, queries: &[prow_config::KeeperQuery]) -> Vec<Query> {
    queries
        .iter()
        .filter(|q| q.repos.iter().any(|r| r == key))
        .map(|q| Query {
            excluded_branches: listed(&q.excluded_branches),
            included_branches: listed(&q.included_branches),
            labels: listed(&q.labels),
            missing_labels: listed(&q.missing_labels),
            milestone: text(&q.milestone),
            review_approved_required: set(q.review_approved_required),
        })
        .collect()
}

/// The most specific context policy wins: repository, then org, then global.
fn merger(key: &str, org: &str, repo: &str, keeper: &Keeper) -> Merger {
    let options = &keeper.context_options;
    let org_policy = options.orgs.get(org);
    let repo_policy = org_policy.and_then(|o| o.repos.get(repo)).map(|r| &r.policy);
    let unset = KeeperContextPolicy::default();
    // The most specific level that sets anything wins.
    let policy = [repo_policy, org_policy.map(|o| &o.policy)]
        .into_iter()
        .flatten()
        .find(|p| **p != unset)
        .unwrap_or(&options.policy);
    let policy = context_policy(policy);
    Merger {
        sync_period: keeper.sync_period,
        status_update_period: keeper.status_update_period,
        target_url: text(&keeper.target_url),
        pr_status_base_url: text(&keeper.pr_status_base_url),
        blocker_label: text(&keeper.blocker_label),
        squash_label: text(&keeper.squash_label),
        max_goroutines: (keeper.max_goroutines > 0).then_some(keeper.max_goroutines),
        merge_method: Some(
            keeper
                .merge_method
                .get(key)
                .map(|m| m.to_string())
                .unwrap_or_else(|| DEFAULT_MERGE_METHOD.to_string()),
        ),
        policy: (!policy.is_empty()).then_some(policy),
    }
}

fn trigger(trigger: &prow_config::plugins::Trigger) -> Trigger {
    Trigger {
        trusted_org: text(&trigger.trusted_org),
        join_org_url: text(&trigger.join_org_url),
        only_org_members: set(trigger.only_org_members),
        ignore_ok_to_test: set(trigger.ignore_ok_to_test),
    }
}

fn approve(approve: &prow_config::plugins::Approve) -> Approve {
    Approve {
        issue_required: Some(approve.issue_required),
        require_self_approval: approve.require_self_approval,
        lgtm_acts_as_approve: Some(approve.lgtm_acts_as_approve),
        ignore_review_state: approve.ignore_review_state,
    }
}

fn lgtm(lgtm: &prow_config::plugins::Lgtm) -> Lgtm {
    Lgtm {
        review_acts_as_lgtm: set(lgtm.review_acts_as_lgtm),
        store_tree_hash: set(lgtm.store_tree_hash),
        trusted_team_for_sticky_lgtm: text(&lgtm.trusted_team_for_sticky_lgtm),
    }
}

fn external_plugins(
    key: &str,
    plugins: &PluginsConfiguration,
) -> Option<ReplaceableSlice<ExternalPlugin>> {
    let list = plugins.external_plugins.get(key)?;
    let items = list
        .iter()
        .map(|p| ExternalPlugin {
            name: Some(p.name.clone()),
            endpoint: text(&p.endpoint),
            events: listed(&p.events),
        })
        .collect();
    Some(ReplaceableSlice::of(items))
}

/// Only repositories that enable the config-updater plugin carry its settings.
fn config_updater(key: &str, plugins: &PluginsConfiguration) -> Option<ConfigUpdater> {
    let enabled = plugins
        .plugins
        .get(key)
        .is_some_and(|names| names.iter().any(|n| n == CONFIG_UPDATER_PLUGIN));
    if !enabled || plugins.config_updater.is_empty() {
        return None;
    }
    let updater = &plugins.config_updater;
    Some(ConfigUpdater {
        map: updater
            .maps
            .iter()
            .flatten()
            .map(|(path, spec)| {
                let spec = ConfigMapSpec {
                    name: spec.name.clone(),
                    key: text(&spec.key),
                    namespace: text(&spec.namespace),
                    additional_namespaces: spec.additional_namespaces.clone(),
                };
                (path.clone(), spec)
            })
            .collect(),
        config_file: text(&updater.config_file),
        plugin_file: text(&updater.plugin_file),
    })
}

fn welcome(plugins: &PluginsConfiguration) -> Option<Vec<Welcome>> {
    if plugins.welcome.is_empty() {
        return None;
    }
    Some(
        plugins
            .welcome
            .iter()
            .map(|w| Welcome {
                message_template: Some(w.message_template.clone()),
            })
            .collect(),
    )
}
