//! Compiler configuration
//!
//! Four layers, merged in order:
//! 1. Built-in defaults
//! 2. Host config (~/.config/pipeline-scheduler/config.toml)
//! 3. Repo config (.pipeline-scheduler/config.toml)
//! 4. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    host_config_path, CompilerConfig, ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig,
    GitOpsConfig, OutputConfig, HOST_CONFIG_PATH, REPO_CONFIG_PATH,
};
pub use merge::{deep_merge, merge_layers};
