//! Scheduler fixtures shared by the integration tests.
//!
//! - `standalone`: one repository document with no parent
//! - `inherited`: an org template and two repositories that extend or replace it
//! - `team`: a `default-scheduler` template that roots every chain
//!
//! Golden scenarios keep their documents under `schedulers/` next to the
//! expected `config.yaml` and `plugins.yaml`:
//!
//! - `no_parent`: a repository document on its own
//! - `merge_only_parent`: the parent sets only merger settings
//! - `branch_protection_parent`: the parent sets only the branch protection policy
//! - `plugins_only`: plugins with no jobs anywhere in the chain

#![allow(dead_code)]

use pipeline_scheduler::{source, CompilerConfig, Compiled};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding one scheduler scenario.
pub fn schedulers_path(scenario: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/schedulers")
        .join(scenario)
}

/// Compiler settings with no team scheduler, so chains are exactly the
/// parent references in the documents.
pub fn without_team() -> CompilerConfig {
    CompilerConfig {
        team_scheduler: String::new(),
        ..CompilerConfig::default()
    }
}

/// Load and compile one scenario.
pub fn compile_scenario(scenario: &str, config: &CompilerConfig) -> Compiled {
    let docs = source::load_documents(&[schedulers_path(scenario)])
        .unwrap_or_else(|e| panic!("failed to load {}: {}", scenario, e));
    pipeline_scheduler::compile(&docs, config)
        .unwrap_or_else(|e| panic!("failed to compile {}: {}", scenario, e))
}

/// Compile a golden scenario's `schedulers/` directory.
pub fn compile_golden(scenario: &str, config: &CompilerConfig) -> Compiled {
    let dir = schedulers_path(scenario).join("schedulers");
    let docs = source::load_documents(&[dir])
        .unwrap_or_else(|e| panic!("failed to load {}: {}", scenario, e));
    pipeline_scheduler::compile(&docs, config)
        .unwrap_or_else(|e| panic!("failed to compile {}: {}", scenario, e))
}

/// Expected contents of one rendered file in a golden scenario.
pub fn golden(scenario: &str, file: &str) -> String {
    let path = schedulers_path(scenario).join(file);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}
