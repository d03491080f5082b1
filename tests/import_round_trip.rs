//! Importing an existing configuration back into Scheduler documents.

mod fixtures;

use fixtures::{compile_scenario, without_team};
use pipeline_scheduler::reverse::DEFAULT_SCHEDULER;
use pipeline_scheduler::{render, reverse, source, CompilerConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_import_then_recompile_keeps_jobs_and_plugins() {
    let original = compile_scenario("inherited", &without_team());

    let work = TempDir::new().unwrap();
    let compiled_dir = work.path().join("compiled");
    let output = CompilerConfig::default().output;
    render::render(&original.config, &original.plugins, &output)
        .unwrap()
        .write_to_dir(&compiled_dir)
        .unwrap();

    let (config, plugins) = source::load_compiled(
        &compiled_dir.join("config.yaml"),
        &compiled_dir.join("plugins.yaml"),
    )
    .unwrap();
    let docs = reverse::reconstruct(&config.job_config, &config.prow_config, &plugins).unwrap();
    let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["acme-gadgets-scheduler", "acme-widgets-scheduler", DEFAULT_SCHEDULER]
    );

    let schedulers_dir = work.path().join("schedulers");
    let files = render::render_schedulers(&docs).unwrap();
    render::write_schedulers(&files, &schedulers_dir).unwrap();
    assert!(schedulers_dir.join("default-scheduler.yaml").exists());

    let reloaded = source::load_documents(&[schedulers_dir]).unwrap();
    assert_eq!(reloaded.len(), docs.len());
    let recompiled = pipeline_scheduler::compile(&reloaded, &CompilerConfig::default()).unwrap();

    assert!(recompiled.warnings.is_empty());
    assert_eq!(recompiled.config.job_config, original.config.job_config);
    assert_eq!(recompiled.plugins.plugins, original.plugins.plugins);
    assert_eq!(
        recompiled.config.prow_config.keeper.target_url,
        original.config.prow_config.keeper.target_url
    );
}

#[test]
fn test_import_rejects_malformed_repo_key() {
    let work = TempDir::new().unwrap();
    let config_file = work.path().join("config.yaml");
    let plugins_file = work.path().join("plugins.yaml");
    fs::write(
        &config_file,
        "presubmits:\n  not-a-repo-key:\n    - name: unit\n",
    )
    .unwrap();
    fs::write(&plugins_file, "").unwrap();

    let (config, plugins) = source::load_compiled(&config_file, &plugins_file).unwrap();
    let err = reverse::reconstruct(&config.job_config, &config.prow_config, &plugins).unwrap_err();
    assert_eq!(
        err,
        reverse::ReverseError::InvalidRepoKey("not-a-repo-key".to_string())
    );
}

#[test]
fn test_missing_compiled_file_is_an_error() {
    let work = TempDir::new().unwrap();
    let result = source::load_compiled(
        &work.path().join("config.yaml"),
        &work.path().join("plugins.yaml"),
    );
    assert!(result.is_err());
}
