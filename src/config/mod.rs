// ABOUTME: Configuration types and parsing for stagehand.yml.
// ABOUTME: Handles YAML discovery, named deployers, and the artifact list.

mod deployer;
mod deserialize;
mod env_value;
mod init;

pub use deployer::{DeployerConfig, RunOverrides};
pub use env_value::EnvValue;
pub use init::init_config;

use crate::error::{Error, Result};
use crate::types::{Coordinates, Deployable};
use deserialize::{deserialize_artifacts, deserialize_coordinates};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "stagehand.yml";
pub const CONFIG_FILENAME_ALT: &str = "stagehand.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".stagehand/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub deployers: BTreeMap<String, DeployerConfig>,

    #[serde(deserialize_with = "deserialize_artifacts")]
    pub artifacts: NonEmpty<ArtifactConfig>,
}

/// One file to publish.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    #[serde(deserialize_with = "deserialize_coordinates")]
    pub coordinates: Coordinates,
    /// Relative paths resolve against the project directory.
    pub path: PathBuf,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("loading configuration from {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn deployer(&self, name: &str) -> Result<&DeployerConfig> {
        self.deployers
            .get(name)
            .ok_or_else(|| Error::UnknownDeployer(name.to_string()))
    }

    /// Group of the first artifact; the default coordinate group for discovery.
    pub fn default_group_id(&self) -> &str {
        self.artifacts.first().coordinates.group_id()
    }

    /// Artifacts bound to their files, in configuration order.
    pub fn deployables(&self, dir: &Path) -> Result<Vec<Deployable>> {
        self.artifacts
            .iter()
            .map(|artifact| {
                let path = if artifact.path.is_absolute() {
                    artifact.path.clone()
                } else {
                    dir.join(&artifact.path)
                };
                Deployable::new(artifact.coordinates.clone(), path)
                    .map_err(|e| Error::InvalidConfig(e.to_string()))
            })
            .collect()
    }
}
