//! End-to-end compilation of the fixture scenarios.

mod fixtures;

use fixtures::{compile_scenario, schedulers_path, without_team};
use pipeline_scheduler::render;
use pipeline_scheduler::{source, CompilerConfig};
use prow_config::{Config, MergeMethod, PluginsConfiguration};
use scheduler_spec::GoDuration;
use tempfile::TempDir;

fn names<'a>(jobs: impl IntoIterator<Item = &'a String>) -> Vec<&'a str> {
    jobs.into_iter().map(String::as_str).collect()
}

#[test]
fn test_standalone_jobs() {
    let compiled = compile_scenario("standalone", &without_team());
    assert!(compiled.warnings.is_empty());
    assert_eq!(compiled.leaves.len(), 1);

    let jobs = &compiled.config.job_config;
    let unit = &jobs.presubmits["acme/widgets"][0];
    assert_eq!(unit.base.name, "unit");
    assert_eq!(unit.base.agent, "tekton");
    assert!(unit.always_run);
    assert!(!unit.optional);
    assert!(!unit.skip_report);
    assert_eq!(unit.context, "unit");
    assert_eq!(unit.rerun_command, "/test unit");

    let release = &jobs.postsubmits["acme/widgets"][0];
    assert_eq!(release.base.name, "release");
    assert_eq!(release.brancher.branches, vec!["main"]);
    assert!(jobs.periodics.is_empty());
}

#[test]
fn test_standalone_keeper_and_plugins() {
    let compiled = compile_scenario("standalone", &without_team());

    let keeper = &compiled.config.prow_config.keeper;
    assert_eq!(keeper.merge_method["acme/widgets"], MergeMethod::Squash);
    assert_eq!(keeper.queries.len(), 1);
    assert_eq!(keeper.queries[0].repos, vec!["acme/widgets"]);
    assert_eq!(keeper.queries[0].labels, vec!["approved"]);
    assert_eq!(keeper.queries[0].missing_labels, vec!["do-not-merge/hold"]);

    let plugins = &compiled.plugins;
    assert_eq!(plugins.plugins["acme/widgets"], vec!["approve", "lgtm", "trigger"]);
    assert_eq!(plugins.triggers.len(), 1);
    assert_eq!(plugins.triggers[0].trusted_org, "acme");
    assert_eq!(plugins.triggers[0].repos, vec!["acme/widgets"]);
    assert!(plugins.approve.is_empty());

    assert_eq!(compiled.config.prow_config.pod_namespace, "jx");
    assert_eq!(compiled.config.prow_config.prowjob_namespace, "jx");
}

#[test]
fn test_inherited_jobs_merge_by_name() {
    let compiled = compile_scenario("inherited", &without_team());
    assert!(compiled.warnings.is_empty());

    let widgets = &compiled.config.job_config.presubmits["acme/widgets"];
    assert_eq!(names(widgets.iter().map(|j| &j.base.name)), vec!["unit", "lint"]);
    let unit = &widgets[0];
    assert!(unit.optional);
    assert!(unit.always_run);
    assert_eq!(unit.base.agent, "tekton");
    assert_eq!(unit.rerun_command, "/test unit");
    assert!(!widgets[1].always_run);
}

#[test]
fn test_inherited_replace_drops_parent_entries() {
    let compiled = compile_scenario("inherited", &without_team());

    let gadgets = &compiled.config.job_config.presubmits["acme/gadgets"];
    assert_eq!(names(gadgets.iter().map(|j| &j.base.name)), vec!["integration"]);

    let plugins = &compiled.plugins.plugins;
    assert_eq!(plugins["acme/gadgets"], vec!["approve"]);
    assert_eq!(plugins["acme/widgets"], vec!["lgtm", "trigger"]);

    // The trigger settings themselves are inherited even where the plugin
    // list was replaced.
    assert!(compiled.plugins.trigger_for("acme/gadgets").is_some());
    assert!(compiled.plugins.trigger_for("acme/widgets").is_some());
}

#[test]
fn test_inherited_merger_settings() {
    let compiled = compile_scenario("inherited", &without_team());
    let keeper = &compiled.config.prow_config.keeper;
    assert_eq!(keeper.sync_period, Some(GoDuration::from_secs(60)));
    assert_eq!(keeper.target_url, "https://ci.example.com/");
    assert_eq!(keeper.context_options.policy.required_contexts, vec!["unit"]);
    assert!(keeper.merge_method.is_empty());
}

#[test]
fn test_team_scheduler_roots_every_chain() {
    let compiled = compile_scenario("team", &CompilerConfig::default());
    assert!(compiled.warnings.is_empty());

    let plugins = &compiled.plugins.plugins;
    assert_eq!(plugins["acme/widgets"], vec!["welcome"]);
    assert_eq!(plugins["acme/gadgets"], vec!["lgtm", "welcome"]);

    // Welcome messages and periodics are shared, not repeated per repository.
    assert_eq!(compiled.plugins.welcome.len(), 1);
    assert_eq!(compiled.plugins.welcome[0].message_template, "Welcome {{.AuthorLogin}}!");
    let periodics = &compiled.config.job_config.periodics;
    assert_eq!(periodics.len(), 1);
    assert_eq!(periodics[0].base.name, "nightly-gc");
    assert_eq!(periodics[0].cron, "0 2 * * *");
}

#[test]
fn test_team_branch_protection_and_attachments() {
    let compiled = compile_scenario("team", &CompilerConfig::default());
    let prow = &compiled.config.prow_config;

    let tree = &prow.branch_protection;
    assert!(tree.protect_tested);
    assert_eq!(tree.policy.protect, Some(true));
    let global_checks = tree.policy.required_status_checks.as_ref().unwrap();
    assert_eq!(global_checks.contexts, vec!["unit"]);

    let widgets = &tree.orgs["acme"].repos["widgets"];
    let repo_checks = widgets.policy.required_status_checks.as_ref().unwrap();
    assert_eq!(repo_checks.contexts, vec!["unit"]);
    assert_eq!(widgets.branches["release"].policy.enforce_admins, Some(true));
    assert!(!tree.orgs["acme"].repos.contains_key("gadgets"));

    assert_eq!(prow.plank.report_template, "https://ci.example.com/report");
    assert_eq!(prow.plank.job_url_prefix, "https://ci.example.com/jobs/");
    assert!(prow.plank.job_url_template.is_empty());
}

#[test]
fn test_team_scheduler_missing_is_a_warning() {
    let compiled = compile_scenario("inherited", &CompilerConfig::default());
    assert_eq!(compiled.warnings.len(), 2);
    assert!(compiled.warnings.iter().all(|w| w.missing == "default-scheduler"));
    assert_eq!(compiled.leaves.len(), 2);
}

#[test]
fn test_rendered_files_parse_back() {
    let compiled = compile_scenario("team", &CompilerConfig::default());
    let output = CompilerConfig::default().output;
    let rendered = render::render(&compiled.config, &compiled.plugins, &output).unwrap();

    let dir = TempDir::new().unwrap();
    let written = rendered.write_to_dir(dir.path()).unwrap();
    assert_eq!(written.len(), 2);

    let config = Config::from_file(&dir.path().join("config.yaml")).unwrap();
    let plugins = PluginsConfiguration::from_file(&dir.path().join("plugins.yaml")).unwrap();
    assert_eq!(config, compiled.config);
    assert_eq!(plugins, compiled.plugins);

    // Rendering is deterministic.
    let again = render::render(&compiled.config, &compiled.plugins, &output).unwrap();
    assert_eq!(again.config.sha256, rendered.config.sha256);
    assert_eq!(again.plugins.sha256, rendered.plugins.sha256);
}

#[test]
fn test_compile_is_independent_of_document_order() {
    let mut docs = source::load_documents(&[schedulers_path("inherited")]).unwrap();
    let forward = pipeline_scheduler::compile(&docs, &without_team()).unwrap();
    docs.reverse();
    let backward = pipeline_scheduler::compile(&docs, &without_team()).unwrap();
    assert_eq!(forward.config, backward.config);
    assert_eq!(forward.plugins, backward.plugins);
}
