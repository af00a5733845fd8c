// ABOUTME: Application-wide error types for stagehand.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::DeployError;
use crate::staging::StagingError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown deployer: {0}")]
    UnknownDeployer(String),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The staging client error behind this error, if any.
    pub fn staging_error(&self) -> Option<&StagingError> {
        match self {
            Error::Staging(e) => Some(e),
            Error::Deploy(e) => e.staging_error(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
