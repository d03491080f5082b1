//! Loading Scheduler documents and compiled configuration from disk.
//!
//! Paths may be files or directories. Directories are walked in file-name
//! order and every `.yaml`/`.yml` file is read; each file may hold several
//! YAML documents.

use prow_config::{Config, ConfigFileError, PluginsConfiguration};
use scheduler_spec::{SchedulerDoc, SchedulerResource, WrongKind};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{path}: {source}")]
    WrongKind {
        path: PathBuf,
        #[source]
        source: WrongKind,
    },

    #[error("scheduler {name:?} is defined in both {first} and {second}")]
    DuplicateName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error(transparent)]
    Compiled(#[from] ConfigFileError),
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

/// Every YAML file named by `paths`, expanding directories.
pub fn yaml_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, SourceError> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path)
            .follow_links(false)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = entry?;
            if entry.file_type().is_file() && is_yaml(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// Parse the Scheduler resources in one YAML text. Empty documents are skipped.
pub fn parse_documents(text: &str, origin: &Path) -> Result<Vec<SchedulerDoc>, SourceError> {
    let yaml_error = |source| SourceError::Yaml {
        path: origin.to_path_buf(),
        source,
    };
    let mut docs = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = serde_yaml::Value::deserialize(document).map_err(yaml_error)?;
        if value.is_null() {
            continue;
        }
        let resource: SchedulerResource = serde_yaml::from_value(value).map_err(yaml_error)?;
        let doc = resource.into_doc().map_err(|source| SourceError::WrongKind {
            path: origin.to_path_buf(),
            source,
        })?;
        docs.push(doc);
    }
    Ok(docs)
}

/// Load every Scheduler document under `paths`. Names must be unique.
pub fn load_documents(paths: &[PathBuf]) -> Result<Vec<SchedulerDoc>, SourceError> {
    let mut seen: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut docs = Vec::new();
    for file in yaml_files(paths)? {
        let text = fs::read_to_string(&file).map_err(|source| SourceError::Io {
            path: file.clone(),
            source,
        })?;
        let parsed = parse_documents(&text, &file)?;
        debug!(path = %file.display(), documents = parsed.len(), "loaded scheduler file");
        for doc in parsed {
            if let Some(first) = seen.get(&doc.name) {
                return Err(SourceError::DuplicateName {
                    name: doc.name,
                    first: first.clone(),
                    second: file,
                });
            }
            seen.insert(doc.name.clone(), file.clone());
            docs.push(doc);
        }
    }
    Ok(docs)
}

/// Load a compiled `config.yaml` and `plugins.yaml` pair.
pub fn load_compiled(
    config_file: &Path,
    plugins_file: &Path,
) -> Result<(Config, PluginsConfiguration), SourceError> {
    let config = Config::from_file(config_file)?;
    let plugins = PluginsConfiguration::from_file(plugins_file)?;
    Ok((config, plugins))
}
