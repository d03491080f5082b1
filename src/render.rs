//! Rendering compiled configuration and Scheduler documents to YAML files.

use chrono::{DateTime, Utc};
use prow_config::{Config, ConfigFileError, PluginsConfiguration};
use scheduler_spec::{SchedulerDoc, SchedulerResource};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::OutputConfig;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Compiled(#[from] ConfigFileError),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One rendered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFile {
    pub name: String,
    #[serde(skip)]
    pub contents: String,
    /// Hex SHA-256 of `contents`.
    pub sha256: String,
}

impl RenderedFile {
    pub fn new(name: impl Into<String>, contents: String) -> Self {
        let sha256 = hex::encode(Sha256::digest(contents.as_bytes()));
        Self {
            name: name.into(),
            contents,
            sha256,
        }
    }
}

/// The compiled `config.yaml` and `plugins.yaml` pair, ready to publish.
#[derive(Debug, Clone, Serialize)]
pub struct Rendered {
    pub created_at: DateTime<Utc>,
    pub config: RenderedFile,
    pub plugins: RenderedFile,
}

/// Marshal both compiled documents.
pub fn render(
    config: &Config,
    plugins: &PluginsConfiguration,
    output: &OutputConfig,
) -> Result<Rendered, RenderError> {
    Ok(Rendered {
        created_at: Utc::now(),
        config: RenderedFile::new(&output.config_file, config.to_yaml()?),
        plugins: RenderedFile::new(&output.plugins_file, plugins.to_yaml()?),
    })
}

fn write_file(dir: &Path, file: &RenderedFile) -> Result<PathBuf, RenderError> {
    let path = dir.join(&file.name);
    fs::write(&path, &file.contents).map_err(|source| RenderError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), sha256 = %file.sha256, "wrote file");
    Ok(path)
}

fn create_dir(dir: &Path) -> Result<(), RenderError> {
    fs::create_dir_all(dir).map_err(|source| RenderError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

impl Rendered {
    /// Write both files into `dir`, creating it if needed.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
        create_dir(dir)?;
        Ok(vec![
            write_file(dir, &self.config)?,
            write_file(dir, &self.plugins)?,
        ])
    }

    /// Serialize the file names and digests to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One `<name>.yaml` Scheduler resource per document.
pub fn render_schedulers(docs: &[SchedulerDoc]) -> Result<Vec<RenderedFile>, RenderError> {
    docs.iter()
        .map(|doc| {
            let resource = SchedulerResource::from(doc.clone());
            let yaml = serde_yaml::to_string(&resource)?;
            Ok(RenderedFile::new(format!("{}.yaml", doc.name), yaml))
        })
        .collect()
}

/// Write rendered Scheduler resources into `dir`.
pub fn write_schedulers(files: &[RenderedFile], dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
    create_dir(dir)?;
    files.iter().map(|file| write_file(dir, file)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::source::parse_documents;
    use scheduler_spec::{strings, SchedulerSpec};
    use tempfile::TempDir;

    #[test]
    fn test_digest_is_sha256_of_contents() {
        let file = RenderedFile::new("config.yaml", "{}\n".to_string());
        assert_eq!(
            file.sha256,
            hex::encode(Sha256::digest(b"{}\n"))
        );
        assert_eq!(file.sha256.len(), 64);
    }

    #[test]
    fn test_render_and_write() {
        let output = CompilerConfig::default().output;
        let mut plugins = PluginsConfiguration::default();
        plugins
            .plugins
            .insert("acme/widgets".to_string(), vec!["lgtm".to_string()]);
        let rendered = render(&Config::default(), &plugins, &output).unwrap();
        assert_eq!(rendered.config.contents.trim(), "{}");

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let written = rendered.write_to_dir(&out).unwrap();
        assert_eq!(written, vec![out.join("config.yaml"), out.join("plugins.yaml")]);
        let text = fs::read_to_string(out.join("plugins.yaml")).unwrap();
        assert_eq!(PluginsConfiguration::from_yaml_str(&text).unwrap(), plugins);

        let json = rendered.to_json().unwrap();
        assert!(json.contains(&rendered.plugins.sha256));
        assert!(!json.contains("contents"));
    }

    #[test]
    fn test_schedulers_render_as_resources() {
        let doc = SchedulerDoc::scoped(
            "acme-widgets-scheduler",
            "acme",
            "widgets",
            SchedulerSpec {
                plugins: Some(strings(["lgtm"])),
                ..SchedulerSpec::default()
            },
        )
        .with_parent("default-scheduler");
        let files = render_schedulers(&[doc.clone()]).unwrap();
        assert_eq!(files[0].name, "acme-widgets-scheduler.yaml");
        assert!(files[0].contents.contains("kind: Scheduler"));

        let parsed = parse_documents(&files[0].contents, Path::new(&files[0].name)).unwrap();
        assert_eq!(parsed, vec![doc]);

        let dir = TempDir::new().unwrap();
        let written = write_schedulers(&files, dir.path()).unwrap();
        assert!(written[0].exists());
    }
}
