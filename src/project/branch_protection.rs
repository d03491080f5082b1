//! Branch protection tree.
//!
//! The global policy comes from the leaf's protection policy; repository and
//! branch levels come from each presubmit's policy.

use prow_config::branch_protection::{self as out, BranchProtection};
use scheduler_spec::{
    BranchProtectionContextPolicy, ProtectionPolicy, Restrictions, ReviewPolicy,
};

use super::items;
use crate::chain::SchedulerLeaf;

fn restrictions(restrictions: &Restrictions) -> out::Restrictions {
    out::Restrictions {
        users: items(&restrictions.users),
        teams: items(&restrictions.teams),
    }
}

fn status_checks(checks: &BranchProtectionContextPolicy) -> out::ContextPolicy {
    out::ContextPolicy {
        contexts: items(&checks.contexts),
        strict: checks.strict,
    }
}

fn reviews(reviews: &ReviewPolicy) -> out::ReviewPolicy {
    out::ReviewPolicy {
        dismissal_restrictions: reviews.dismissal_restrictions.as_ref().map(restrictions),
        dismiss_stale_reviews: reviews.dismiss_stale_reviews,
        require_code_owner_reviews: reviews.require_code_owner_reviews,
        required_approving_review_count: reviews.required_approving_review_count,
    }
}

fn policy(policy: &ProtectionPolicy) -> out::Policy {
    out::Policy {
        protect: policy.protect,
        required_status_checks: policy.required_status_checks.as_ref().map(status_checks),
        enforce_admins: policy.enforce_admins,
        restrictions: policy.restrictions.as_ref().map(restrictions),
        required_pull_request_reviews: policy
            .required_pull_request_reviews
            .as_ref()
            .map(reviews),
    }
}

pub(super) fn project_branch_protection(tree: &mut BranchProtection, leaf: &SchedulerLeaf) {
    if let Some(global) = &leaf.spec.policy {
        if let Some(protect_tested) = global.protect_tested {
            tree.protect_tested = protect_tested;
        }
        tree.policy = policy(&global.policy);
    }

    let Some(presubmits) = &leaf.spec.presubmits else {
        return;
    };
    for presubmit in &presubmits.entries {
        let Some(policies) = &presubmit.policy else {
            continue;
        };
        if !policies.policy.is_empty() {
            tree.repo_mut(&leaf.org, &leaf.repo).policy = policy(&policies.policy);
        }
        for (branch, branch_policy) in &policies.entries {
            tree.repo_mut(&leaf.org, &leaf.repo)
                .branches
                .insert(branch.clone(), out::Branch {
                    policy: policy(branch_policy),
                });
        }
    }
}
