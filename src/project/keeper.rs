//! Merge-queue settings: periods, merge methods, context policy tree and
//! search queries.

use prow_config::keeper::{KeeperContextPolicy, KeeperRepoContextPolicy};
use prow_config::{Keeper, KeeperQuery, MergeMethod};
use scheduler_spec::{ContextPolicy, Merger, Presubmit, Query, RepoContextPolicy};

use super::{items, ProjectionFault};
use crate::chain::SchedulerLeaf;

fn context_policy(policy: &ContextPolicy) -> KeeperContextPolicy {
    KeeperContextPolicy {
        skip_unknown_contexts: policy.skip_unknown_contexts,
        required_contexts: items(&policy.required_contexts),
        required_if_present_contexts: items(&policy.required_if_present_contexts),
        optional_contexts: items(&policy.optional_contexts),
        from_branch_protection: policy.from_branch_protection,
    }
}

fn repo_context_policy(policy: &RepoContextPolicy) -> KeeperRepoContextPolicy {
    KeeperRepoContextPolicy {
        policy: context_policy(&policy.policy),
        branches: policy
            .branches
            .iter()
            .flat_map(|b| b.entries.iter())
            .map(|(branch, policy)| (branch.clone(), context_policy(policy)))
            .collect(),
    }
}

fn merge_method(method: &str) -> Result<Option<MergeMethod>, ProjectionFault> {
    if method.is_empty() {
        return Ok(None);
    }
    Ok(Some(method.parse()?))
}

/// Global settings. Later leaves overwrite what they set.
fn apply_merger(keeper: &mut Keeper, merger: &Merger) {
    if merger.sync_period.is_some() {
        keeper.sync_period = merger.sync_period;
    }
    if merger.status_update_period.is_some() {
        keeper.status_update_period = merger.status_update_period;
    }
    if let Some(url) = &merger.target_url {
        keeper.target_url = url.clone();
    }
    if let Some(url) = &merger.pr_status_base_url {
        keeper.pr_status_base_url = url.clone();
    }
    if let Some(label) = &merger.blocker_label {
        keeper.blocker_label = label.clone();
    }
    if let Some(label) = &merger.squash_label {
        keeper.squash_label = label.clone();
    }
    if let Some(max) = merger.max_goroutines {
        keeper.max_goroutines = max;
    }
    if let Some(policy) = &merger.policy {
        keeper.context_options.policy = context_policy(policy);
    }
}

fn query(query: &Query, repo_key: &str) -> KeeperQuery {
    KeeperQuery {
        repos: vec![repo_key.to_string()],
        labels: items(&query.labels),
        missing_labels: items(&query.missing_labels),
        excluded_branches: items(&query.excluded_branches),
        included_branches: items(&query.included_branches),
        milestone: query.milestone.clone().unwrap_or_default(),
        review_approved_required: query.review_approved_required.unwrap_or(false),
    }
}

/// Identical queries for different repositories share one entry.
fn add_query(queries: &mut Vec<KeeperQuery>, new: KeeperQuery) {
    match queries.iter_mut().find(|q| q.same_criteria(&new)) {
        Some(existing) => {
            for repo in new.repos {
                if !existing.repos.contains(&repo) {
                    existing.repos.push(repo);
                }
            }
        }
        None => queries.push(new),
    }
}

fn apply_presubmit(
    keeper: &mut Keeper,
    leaf: &SchedulerLeaf,
    repo_key: &str,
    presubmit: &Presubmit,
) -> Result<(), ProjectionFault> {
    for q in &presubmit.queries {
        add_query(&mut keeper.queries, query(q, repo_key));
    }
    if let Some(method) = merge_method(presubmit.merge_method.as_deref().unwrap_or_default())? {
        keeper.merge_method.insert(repo_key.to_string(), method);
    }
    if let Some(policy) = &presubmit.context_options {
        keeper
            .context_options
            .orgs
            .entry(leaf.org.clone())
            .or_default()
            .repos
            .insert(leaf.repo.clone(), repo_context_policy(policy));
    }
    Ok(())
}

pub(super) fn project_keeper(keeper: &mut Keeper, leaf: &SchedulerLeaf) -> Result<(), ProjectionFault> {
    let repo_key = leaf.repo_key();
    if let Some(merger) = &leaf.spec.merger {
        apply_merger(keeper, merger);
        if let Some(method) = merge_method(merger.merge_method.as_deref().unwrap_or_default())? {
            keeper.merge_method.insert(repo_key.clone(), method);
        }
    }
    if let Some(presubmits) = &leaf.spec.presubmits {
        for presubmit in &presubmits.entries {
            apply_presubmit(keeper, leaf, &repo_key, presubmit)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_spec::{
        strings, GoDuration, JobBase, Presubmits, ReplaceableMap, SchedulerSpec,
    };
    use std::collections::BTreeMap;

    fn leaf(repo: &str, spec: SchedulerSpec) -> SchedulerLeaf {
        SchedulerLeaf::new("acme", repo, spec)
    }

    fn with_presubmit(presubmit: Presubmit) -> SchedulerSpec {
        SchedulerSpec {
            presubmits: Some(Presubmits::of(vec![Presubmit {
                base: JobBase::named("unit"),
                ..presubmit
            }])),
            ..SchedulerSpec::default()
        }
    }

    fn lgtm_query() -> Query {
        Query {
            labels: Some(strings(["approved", "lgtm"])),
            missing_labels: Some(strings(["do-not-merge"])),
            ..Query::default()
        }
    }

    #[test]
    fn test_merger_globals() {
        let spec = SchedulerSpec {
            merger: Some(Merger {
                sync_period: Some(GoDuration::from_secs(60)),
                target_url: Some("https://keeper.example.com".to_string()),
                policy: Some(ContextPolicy {
                    from_branch_protection: Some(true),
                    ..ContextPolicy::default()
                }),
                ..Merger::default()
            }),
            ..SchedulerSpec::default()
        };
        let mut keeper = Keeper::default();
        project_keeper(&mut keeper, &leaf("widgets", spec)).unwrap();
        assert_eq!(keeper.sync_period.map(|d| d.to_string()).as_deref(), Some("1m0s"));
        assert_eq!(keeper.target_url, "https://keeper.example.com");
        assert_eq!(keeper.context_options.policy.from_branch_protection, Some(true));
    }

    #[test]
    fn test_presubmit_merge_method_overrides_merger() {
        let mut spec = with_presubmit(Presubmit {
            merge_method: Some("squash".to_string()),
            ..Presubmit::default()
        });
        spec.merger = Some(Merger {
            merge_method: Some("rebase".to_string()),
            ..Merger::default()
        });
        let mut keeper = Keeper::default();
        project_keeper(&mut keeper, &leaf("widgets", spec)).unwrap();
        assert_eq!(keeper.merge_method["acme/widgets"], MergeMethod::Squash);
    }

    #[test]
    fn test_identical_queries_coalesce() {
        let mut keeper = Keeper::default();
        for repo in ["one", "two"] {
            let spec = with_presubmit(Presubmit {
                queries: vec![lgtm_query()],
                ..Presubmit::default()
            });
            project_keeper(&mut keeper, &leaf(repo, spec)).unwrap();
        }
        assert_eq!(keeper.queries.len(), 1);
        assert_eq!(keeper.queries[0].repos, vec!["acme/one", "acme/two"]);
    }

    #[test]
    fn test_distinct_queries_kept_apart() {
        let spec = with_presubmit(Presubmit {
            queries: vec![
                lgtm_query(),
                Query {
                    milestone: Some("v1".to_string()),
                    ..lgtm_query()
                },
            ],
            ..Presubmit::default()
        });
        let mut keeper = Keeper::default();
        project_keeper(&mut keeper, &leaf("widgets", spec)).unwrap();
        assert_eq!(keeper.queries.len(), 2);
        assert_eq!(keeper.queries[0].milestone, "");
        assert_eq!(keeper.queries[1].milestone, "v1");
    }

    #[test]
    fn test_repo_context_policy_tree() {
        let spec = with_presubmit(Presubmit {
            context_options: Some(RepoContextPolicy {
                policy: ContextPolicy {
                    required_contexts: Some(strings(["unit"])),
                    ..ContextPolicy::default()
                },
                branches: Some(ReplaceableMap::of(BTreeMap::from([(
                    "release".to_string(),
                    ContextPolicy {
                        optional_contexts: Some(strings(["docs"])),
                        ..ContextPolicy::default()
                    },
                )]))),
            }),
            ..Presubmit::default()
        });
        let mut keeper = Keeper::default();
        project_keeper(&mut keeper, &leaf("widgets", spec)).unwrap();
        let repo = &keeper.context_options.orgs["acme"].repos["widgets"];
        assert_eq!(repo.policy.required_contexts, vec!["unit"]);
        assert_eq!(repo.branches["release"].optional_contexts, vec!["docs"]);
    }

    #[test]
    fn test_invalid_merge_method() {
        let spec = with_presubmit(Presubmit {
            merge_method: Some("fast-forward".to_string()),
            ..Presubmit::default()
        });
        let err = project_keeper(&mut Keeper::default(), &leaf("widgets", spec)).unwrap_err();
        assert!(matches!(err, ProjectionFault::InvalidMergeMethod(_)));
    }
}
