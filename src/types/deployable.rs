// ABOUTME: A single artifact file bound to its coordinates.
// ABOUTME: Computes the remote deploy path and filename used for uploads.

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::Coordinates;

#[derive(Debug, Error)]
pub enum DeployableError {
    #[error("artifact path has no file name: {0}")]
    NoFileName(PathBuf),

    #[error("artifact file name is not valid UTF-8: {0}")]
    NonUtf8FileName(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployable {
    coordinates: Coordinates,
    path: PathBuf,
    filename: String,
}

impl Deployable {
    pub fn new(coordinates: Coordinates, path: impl Into<PathBuf>) -> Result<Self, DeployableError> {
        let path = path.into();
        let filename = path
            .file_name()
            .ok_or_else(|| DeployableError::NoFileName(path.clone()))?
            .to_str()
            .ok_or_else(|| DeployableError::NonUtf8FileName(path.clone()))?
            .to_string();

        Ok(Self {
            coordinates,
            path,
            filename,
        })
    }

    pub fn coordinates(&self) -> &Coordinates {
        &self.coordinates
    }

    /// Local file to upload.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn deploy_path(&self) -> String {
        self.coordinates.deploy_path()
    }

    pub fn is_snapshot(&self) -> bool {
        self.coordinates.is_snapshot()
    }
}

impl std::fmt::Display for Deployable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.coordinates, self.filename)
    }
}
