//! Merge rules for plugin structures.

use scheduler_spec::{Approve, Attachment, ConfigUpdater, Lgtm, SchedulerAgent, Trigger, Welcome};

use super::fields::inherit;

pub fn merge_scheduler_agent(child: &mut SchedulerAgent, parent: &SchedulerAgent) {
    inherit(&mut child.agent, &parent.agent);
}

pub fn merge_trigger(child: &mut Trigger, parent: &Trigger) {
    inherit(&mut child.trusted_org, &parent.trusted_org);
    inherit(&mut child.join_org_url, &parent.join_org_url);
    inherit(&mut child.only_org_members, &parent.only_org_members);
    inherit(&mut child.ignore_ok_to_test, &parent.ignore_ok_to_test);
}

pub fn merge_approve(child: &mut Approve, parent: &Approve) {
    inherit(&mut child.issue_required, &parent.issue_required);
    inherit(&mut child.require_self_approval, &parent.require_self_approval);
    inherit(&mut child.lgtm_acts_as_approve, &parent.lgtm_acts_as_approve);
    inherit(&mut child.ignore_review_state, &parent.ignore_review_state);
}

pub fn merge_lgtm(child: &mut Lgtm, parent: &Lgtm) {
    inherit(&mut child.review_acts_as_lgtm, &parent.review_acts_as_lgtm);
    inherit(&mut child.store_tree_hash, &parent.store_tree_hash);
    inherit(
        &mut child.trusted_team_for_sticky_lgtm,
        &parent.trusted_team_for_sticky_lgtm,
    );
}

/// Maps merge by repository path with the child winning; file names follow
/// the scalar rule.
pub fn merge_config_updater(child: &mut ConfigUpdater, parent: &ConfigUpdater) {
    for (path, spec) in &parent.map {
        child
            .map
            .entry(path.clone())
            .or_insert_with(|| spec.clone());
    }
    inherit(&mut child.config_file, &parent.config_file);
    inherit(&mut child.plugin_file, &parent.plugin_file);
}

/// The most specific non-empty list of welcome messages wins.
pub fn merge_welcome(child: &mut Option<Vec<Welcome>>, parent: &Option<Vec<Welcome>>) {
    let child_empty = child.as_ref().map_or(true, Vec::is_empty);
    if child_empty && parent.is_some() {
        child.clone_from(parent);
    }
}

/// Attachments union by name; the child's attachment wins.
pub fn merge_attachments(child: &mut Vec<Attachment>, parent: &[Attachment]) {
    for attachment in parent {
        if !child.iter().any(|a| a.name == attachment.name) {
            child.push(attachment.clone());
        }
    }
}
