//! Merge rules for branch protection and merge-queue structures.

use scheduler_spec::{
    BranchProtectionContextPolicy, ContextPolicy, GlobalProtectionPolicy, Merger,
    ProtectionPolicies, ProtectionPolicy, Query, RepoContextPolicy, Restrictions, ReviewPolicy,
};

use super::fields::{inherit, nested, opt_map, opt_slice};

pub fn merge_global_protection_policy(
    child: &mut GlobalProtectionPolicy,
    parent: &GlobalProtectionPolicy,
) {
    merge_protection_policy(&mut child.policy, &parent.policy);
    inherit(&mut child.protect_tested, &parent.protect_tested);
}

pub fn merge_protection_policy(child: &mut ProtectionPolicy, parent: &ProtectionPolicy) {
    inherit(&mut child.protect, &parent.protect);
    inherit(&mut child.enforce_admins, &parent.enforce_admins);
    nested(
        &mut child.required_status_checks,
        &parent.required_status_checks,
        merge_status_checks,
    );
    nested(
        &mut child.restrictions,
        &parent.restrictions,
        merge_restrictions,
    );
    nested(
        &mut child.required_pull_request_reviews,
        &parent.required_pull_request_reviews,
        merge_review_policy,
    );
}

/// Repository policy merges field by field; per-branch entries follow the
/// replaceable map rule.
pub fn merge_protection_policies(child: &mut ProtectionPolicies, parent: &ProtectionPolicies) {
    merge_protection_policy(&mut child.policy, &parent.policy);
    if child.replace {
        return;
    }
    for (branch, policy) in &parent.entries {
        child
            .entries
            .entry(branch.clone())
            .or_insert_with(|| policy.clone());
    }
    child.replace = parent.replace;
}

fn merge_status_checks(
    child: &mut BranchProtectionContextPolicy,
    parent: &BranchProtectionContextPolicy,
) {
    opt_slice(&mut child.contexts, &parent.contexts);
    inherit(&mut child.strict, &parent.strict);
}

fn merge_restrictions(child: &mut Restrictions, parent: &Restrictions) {
    opt_slice(&mut child.users, &parent.users);
    opt_slice(&mut child.teams, &parent.teams);
}

fn merge_review_policy(child: &mut ReviewPolicy, parent: &ReviewPolicy) {
    nested(
        &mut child.dismissal_restrictions,
        &parent.dismissal_restrictions,
        merge_restrictions,
    );
    inherit(&mut child.dismiss_stale_reviews, &parent.dismiss_stale_reviews);
    inherit(
        &mut child.require_code_owner_reviews,
        &parent.require_code_owner_reviews,
    );
    inherit(
        &mut child.required_approving_review_count,
        &parent.required_approving_review_count,
    );
}

pub fn merge_merger(child: &mut Merger, parent: &Merger) {
    inherit(&mut child.sync_period, &parent.sync_period);
    inherit(&mut child.status_update_period, &parent.status_update_period);
    inherit(&mut child.target_url, &parent.target_url);
    inherit(&mut child.pr_status_base_url, &parent.pr_status_base_url);
    inherit(&mut child.blocker_label, &parent.blocker_label);
    inherit(&mut child.squash_label, &parent.squash_label);
    inherit(&mut child.max_goroutines, &parent.max_goroutines);
    inherit(&mut child.merge_method, &parent.merge_method);
    nested(&mut child.policy, &parent.policy, merge_context_policy);
}

pub fn merge_context_policy(child: &mut ContextPolicy, parent: &ContextPolicy) {
    inherit(&mut child.skip_unknown_contexts, &parent.skip_unknown_contexts);
    opt_slice(&mut child.required_contexts, &parent.required_contexts);
    opt_slice(
        &mut child.required_if_present_contexts,
        &parent.required_if_present_contexts,
    );
    opt_slice(&mut child.optional_contexts, &parent.optional_contexts);
    inherit(
        &mut child.from_branch_protection,
        &parent.from_branch_protection,
    );
}

pub fn merge_repo_context_policy(child: &mut RepoContextPolicy, parent: &RepoContextPolicy) {
    merge_context_policy(&mut child.policy, &parent.policy);
    opt_map(&mut child.branches, &parent.branches);
}

pub fn merge_query(child: &mut Query, parent: &Query) {
    opt_slice(&mut child.excluded_branches, &parent.excluded_branches);
    opt_slice(&mut child.included_branches, &parent.included_branches);
    opt_slice(&mut child.labels, &parent.labels);
    opt_slice(&mut child.missing_labels, &parent.missing_labels);
    inherit(&mut child.milestone, &parent.milestone);
    inherit(
        &mut child.review_approved_required,
        &parent.review_approved_required,
    );
}

/// Queries pair up by position. The child's list keeps its length; an empty
/// child list takes the parent's.
pub fn merge_queries(child: &mut Vec<Query>, parent: &[Query]) {
    if child.is_empty() {
        child.extend_from_slice(parent);
        return;
    }
    for (query, inherited) in child.iter_mut().zip(parent) {
        merge_query(query, inherited);
    }
}
