//! Plugin configuration and job runner attachments.

use prow_config::plugins as out;
use prow_config::{Plank, PluginsConfiguration};
use scheduler_spec::{
    Approve, ConfigUpdater, ExternalPlugin, Lgtm, Trigger, Welcome, ATTACHMENT_JOB_URL_PREFIX,
    ATTACHMENT_JOB_URL_TEMPLATE, ATTACHMENT_REPORT_TEMPLATE,
};
use tracing::debug;

use super::{items, ProjectionFault};
use crate::chain::SchedulerLeaf;

fn external_plugin(plugin: &ExternalPlugin) -> Result<out::ExternalPlugin, ProjectionFault> {
    Ok(out::ExternalPlugin {
        name: plugin.name.clone().ok_or(ProjectionFault::MissingPluginName)?,
        endpoint: plugin.endpoint.clone().unwrap_or_default(),
        events: items(&plugin.events),
    })
}

fn approve(approve: &Approve, repo_key: &str) -> out::Approve {
    out::Approve {
        repos: vec![repo_key.to_string()],
        issue_required: approve.issue_required.unwrap_or(false),
        require_self_approval: approve.require_self_approval,
        lgtm_acts_as_approve: approve.lgtm_acts_as_approve.unwrap_or(false),
        ignore_review_state: approve.ignore_review_state,
    }
}

fn lgtm(lgtm: &Lgtm, repo_key: &str) -> out::Lgtm {
    out::Lgtm {
        repos: vec![repo_key.to_string()],
        review_acts_as_lgtm: lgtm.review_acts_as_lgtm.unwrap_or(false),
        store_tree_hash: lgtm.store_tree_hash.unwrap_or(false),
        trusted_team_for_sticky_lgtm: lgtm.trusted_team_for_sticky_lgtm.clone().unwrap_or_default(),
    }
}

/// The trusted org defaults to the repository's own org.
fn trigger(trigger: &Trigger, org: &str, repo_key: &str) -> out::Trigger {
    out::Trigger {
        repos: vec![repo_key.to_string()],
        trusted_org: trigger
            .trusted_org
            .clone()
            .unwrap_or_else(|| org.to_string()),
        join_org_url: trigger.join_org_url.clone().unwrap_or_default(),
        only_org_members: trigger.only_org_members.unwrap_or(false),
        ignore_ok_to_test: trigger.ignore_ok_to_test.unwrap_or(false),
    }
}

/// Messages are de-duplicated against every message already present, not per
/// repository.
fn add_welcome(existing: &mut Vec<out::Welcome>, welcome: &[Welcome]) -> Result<(), ProjectionFault> {
    for entry in welcome {
        let template = entry
            .message_template
            .as_deref()
            .ok_or(ProjectionFault::MissingWelcomeTemplate)?;
        if existing.iter().any(|w| w.message_template == template) {
            continue;
        }
        existing.push(out::Welcome {
            repos: Vec::new(),
            message_template: template.to_string(),
        });
    }
    Ok(())
}

/// Maps are taken from the first leaf that carries an updater, even when
/// its map is empty; file names from the first leaf that sets them.
fn apply_config_updater(existing: &mut out::ConfigUpdater, updater: &ConfigUpdater) {
    if existing.maps.is_none() {
        let maps = updater
            .map
            .iter()
            .map(|(path, spec)| {
                let spec = out::ConfigMapSpec {
                    name: spec.name.clone(),
                    key: spec.key.clone().unwrap_or_default(),
                    namespace: spec.namespace.clone().unwrap_or_default(),
                    additional_namespaces: spec.additional_namespaces.clone(),
                };
                (path.clone(), spec)
            })
            .collect();
        existing.maps = Some(maps);
    }
    if existing.config_file.is_empty() {
        existing.config_file = updater.config_file.clone().unwrap_or_default();
    }
    if existing.plugin_file.is_empty() {
        existing.plugin_file = updater.plugin_file.clone().unwrap_or_default();
    }
}

pub(super) fn project_plugins(
    config: &mut PluginsConfiguration,
    leaf: &SchedulerLeaf,
) -> Result<(), ProjectionFault> {
    let spec = &leaf.spec;
    let repo_key = leaf.repo_key();

    if let Some(plugins) = &spec.plugins {
        config.plugins.insert(repo_key.clone(), plugins.entries.clone());
    }
    if let Some(external) = &spec.external_plugins {
        let projected = external
            .entries
            .iter()
            .map(external_plugin)
            .collect::<Result<Vec<_>, _>>()?;
        config.external_plugins.insert(repo_key.clone(), projected);
    }
    if let Some(a) = &spec.approve {
        config.approve.push(approve(a, &repo_key));
    }
    if let Some(welcome) = &spec.welcome {
        add_welcome(&mut config.welcome, welcome)?;
    }
    if let Some(updater) = &spec.config_updater {
        apply_config_updater(&mut config.config_updater, updater);
    }
    if let Some(l) = &spec.lgtm {
        config.lgtm.push(lgtm(l, &repo_key));
    }
    if let Some(t) = &spec.trigger {
        config.triggers.push(trigger(t, &leaf.org, &repo_key));
    }
    Ok(())
}

/// Named attachments set the job runner's report and URL templates from
/// their first URL.
pub(super) fn project_attachments(plank: &mut Plank, leaf: &SchedulerLeaf) -> Result<(), ProjectionFault> {
    let Some(attachments) = &leaf.spec.attachments else {
        return Ok(());
    };
    for attachment in attachments {
        let target = match attachment.name.as_str() {
            ATTACHMENT_REPORT_TEMPLATE => &mut plank.report_template,
            ATTACHMENT_JOB_URL_PREFIX => &mut plank.job_url_prefix,
            ATTACHMENT_JOB_URL_TEMPLATE => &mut plank.job_url_template,
            other => {
                debug!(attachment = other, "ignoring unknown attachment");
                continue;
            }
        };
        let url = attachment
            .urls
            .first()
            .ok_or_else(|| ProjectionFault::AttachmentWithoutUrls(attachment.name.clone()))?;
        *target = url.clone();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_spec::{strings, Attachment, ConfigMapSpec, SchedulerSpec};
    use std::collections::BTreeMap;

    fn leaf(repo: &str, spec: SchedulerSpec) -> SchedulerLeaf {
        SchedulerLeaf::new("acme", repo, spec)
    }

    #[test]
    fn test_per_repo_plugin_instances() {
        let spec = SchedulerSpec {
            plugins: Some(strings(["approve", "lgtm", "trigger"])),
            approve: Some(Approve {
                lgtm_acts_as_approve: Some(true),
                ..Approve::default()
            }),
            lgtm: Some(Lgtm::default()),
            trigger: Some(Trigger::default()),
            ..SchedulerSpec::default()
        };
        let mut config = PluginsConfiguration::default();
        project_plugins(&mut config, &leaf("one", spec.clone())).unwrap();
        project_plugins(&mut config, &leaf("two", spec)).unwrap();

        assert_eq!(config.plugins["acme/one"], vec!["approve", "lgtm", "trigger"]);
        assert_eq!(config.approve.len(), 2);
        assert_eq!(config.approve[1].repos, vec!["acme/two"]);
        assert!(config.approve[0].lgtm_acts_as_approve);
        assert_eq!(config.lgtm.len(), 2);
        assert_eq!(config.triggers[0].trusted_org, "acme");
    }

    #[test]
    fn test_welcome_dedup_is_global() {
        let spec = SchedulerSpec {
            welcome: Some(vec![Welcome {
                message_template: Some("Welcome!".to_string()),
            }]),
            ..SchedulerSpec::default()
        };
        let mut config = PluginsConfiguration::default();
        project_plugins(&mut config, &leaf("one", spec.clone())).unwrap();
        project_plugins(&mut config, &leaf("two", spec)).unwrap();
        assert_eq!(config.welcome.len(), 1);
    }

    #[test]
    fn test_config_updater_first_write_wins() {
        let updater = |name: &str, file: Option<&str>| SchedulerSpec {
            config_updater: Some(ConfigUpdater {
                map: BTreeMap::from([(format!("{name}.yaml"), ConfigMapSpec::named(name))]),
                config_file: file.map(str::to_string),
                ..ConfigUpdater::default()
            }),
            ..SchedulerSpec::default()
        };
        let mut config = PluginsConfiguration::default();
        project_plugins(&mut config, &leaf("one", updater("first", None))).unwrap();
        project_plugins(&mut config, &leaf("two", updater("second", Some("config.yaml"))))
            .unwrap();

        let maps = config.config_updater.maps.as_ref().unwrap();
        assert_eq!(maps.len(), 1);
        assert!(maps.contains_key("first.yaml"));
        assert_eq!(config.config_updater.config_file, "config.yaml");
    }

    #[test]
    fn test_config_updater_empty_declared_maps_win() {
        let empty = SchedulerSpec {
            config_updater: Some(ConfigUpdater::default()),
            ..SchedulerSpec::default()
        };
        let mapped = SchedulerSpec {
            config_updater: Some(ConfigUpdater {
                map: BTreeMap::from([("late.yaml".to_string(), ConfigMapSpec::named("late"))]),
                ..ConfigUpdater::default()
            }),
            ..SchedulerSpec::default()
        };
        let mut config = PluginsConfiguration::default();
        project_plugins(&mut config, &leaf("one", empty)).unwrap();
        project_plugins(&mut config, &leaf("two", mapped)).unwrap();

        assert_eq!(config.config_updater.maps, Some(BTreeMap::new()));
        assert!(config.config_updater.is_empty());
    }

    #[test]
    fn test_config_updater_absent_leaves_maps_undeclared() {
        let mut config = PluginsConfiguration::default();
        project_plugins(&mut config, &leaf("one", SchedulerSpec::default())).unwrap();
        assert_eq!(config.config_updater.maps, None);
    }

    #[test]
    fn test_external_plugin_needs_name() {
        let spec = SchedulerSpec {
            external_plugins: Some(scheduler_spec::ReplaceableSlice::of(vec![
                ExternalPlugin::default(),
            ])),
            ..SchedulerSpec::default()
        };
        let err = project_plugins(&mut PluginsConfiguration::default(), &leaf("one", spec))
            .unwrap_err();
        assert_eq!(err, ProjectionFault::MissingPluginName);
    }

    #[test]
    fn test_attachments_fill_plank() {
        let spec = SchedulerSpec {
            attachments: Some(vec![
                Attachment {
                    name: ATTACHMENT_REPORT_TEMPLATE.to_string(),
                    urls: vec!["report".to_string()],
                },
                Attachment {
                    name: ATTACHMENT_JOB_URL_PREFIX.to_string(),
                    urls: vec!["https://jobs/".to_string(), "ignored".to_string()],
                },
                Attachment {
                    name: "unrelated".to_string(),
                    urls: Vec::new(),
                },
            ]),
            ..SchedulerSpec::default()
        };
        let mut plank = Plank::default();
        project_attachments(&mut plank, &leaf("one", spec)).unwrap();
        assert_eq!(plank.report_template, "report");
        assert_eq!(plank.job_url_prefix, "https://jobs/");
        assert!(plank.job_url_template.is_empty());
    }

    #[test]
    fn test_attachment_without_urls() {
        let spec = SchedulerSpec {
            attachments: Some(vec![Attachment {
                name: ATTACHMENT_JOB_URL_TEMPLATE.to_string(),
                urls: Vec::new(),
            }]),
            ..SchedulerSpec::default()
        };
        let err = project_attachments(&mut Plank::default(), &leaf("one", spec)).unwrap_err();
        assert_eq!(
            err,
            ProjectionFault::AttachmentWithoutUrls(ATTACHMENT_JOB_URL_TEMPLATE.to_string())
        );
    }
}
