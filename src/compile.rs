//! Compile orchestration: resolve chains, merge, project, set namespaces.

use prow_config::{Config, PluginsConfiguration};
use scheduler_spec::{strings, ConfigMapSpec, ConfigUpdater, SchedulerDoc, SchedulerSpec};
use std::collections::BTreeMap;
use tracing::info;

use crate::chain::{self, ChainError, DocIndex, LookupWarning, SchedulerLeaf};
use crate::config::{CompilerConfig, ConfigError};
use crate::project::{self, ProjectionError};
use crate::render::RenderError;
use crate::reverse::ReverseError;
use crate::source::SourceError;

/// Environment repository paths kept in sync with the bot's ConfigMaps.
const ENV_CONFIG_PATH: &str = "env/prow/config.yaml";
const ENV_PLUGINS_PATH: &str = "env/prow/plugins.yaml";

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Import error: {0}")]
    Reverse(#[from] ReverseError),
}

/// Output of a successful compilation.
///
/// Leaves with cyclic parents are left out of `config` and `plugins`; their
/// errors are in `cycles`.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub leaves: Vec<SchedulerLeaf>,
    pub warnings: Vec<LookupWarning>,
    pub cycles: Vec<ChainError>,
    pub config: Config,
    pub plugins: PluginsConfiguration,
}

/// Enables config-updater on the dev environment repository so that merged
/// changes to its `env/prow` files are applied to the cluster.
pub fn config_updater_spec() -> SchedulerSpec {
    SchedulerSpec {
        config_updater: Some(ConfigUpdater {
            map: BTreeMap::from([
                (ENV_CONFIG_PATH.to_string(), ConfigMapSpec::named("config")),
                (ENV_PLUGINS_PATH.to_string(), ConfigMapSpec::named("plugins")),
            ]),
            ..ConfigUpdater::default()
        }),
        plugins: Some(strings(["config-updater"])),
        ..SchedulerSpec::default()
    }
}

/// Compile Scheduler documents into the bot's configuration.
///
/// Nothing is returned unless every chain merges and every leaf projects.
pub fn compile(docs: &[SchedulerDoc], config: &CompilerConfig) -> Result<Compiled, CompileError> {
    let set = chain::resolve_chains(docs, config.team_scheduler())?;
    let index = DocIndex::new(docs)?;
    let updater = config_updater_spec();
    let dev_env = config.config_updater_repo();

    let mut leaves = Vec::with_capacity(set.chains.len());
    for chain in &set.chains {
        let key = chain::repo_key(&chain.org, &chain.repo);
        let mut extra = Vec::new();
        if dev_env == Some(key.as_str()) {
            info!(repo = %key, "enabling config-updater on dev environment repository");
            extra.push(&updater);
        }
        leaves.push(chain::merge_chain(chain, &index, &extra)?);
    }

    let (mut compiled, plugins) = project::project(&leaves)?.into_documents();
    compiled.prow_config.pod_namespace = config.namespace.clone();
    compiled.prow_config.prowjob_namespace = config.namespace.clone();

    info!(
        leaves = leaves.len(),
        warnings = set.warnings.len(),
        cycles = set.cycles.len(),
        namespace = %config.namespace,
        "compiled scheduler configuration"
    );
    Ok(Compiled {
        leaves,
        warnings: set.warnings,
        cycles: set.cycles,
        config: compiled,
        plugins,
    })
}
