// ABOUTME: Deployment stages and the operation a start/end stage range resolves to.
// ABOUTME: Invalid (backward) ranges are rejected before any remote call is made.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{DeployError, InvalidStageRangeSnafu};

/// A point in the staging pipeline a run can start or end at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Upload,
    Close,
    Release,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Upload => "upload",
            Stage::Close => "close",
            Stage::Release => "release",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upload" => Ok(Stage::Upload),
            "close" => Ok(Stage::Close),
            "release" => Ok(Stage::Release),
            other => Err(format!("unknown stage '{other}'")),
        }
    }
}

/// The work a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageOperation {
    FullDeployment,
    Upload,
    Close,
    Release,
    Drop,
    UploadAndClose,
    CloseAndRelease,
}

impl StageOperation {
    /// Resolve a stage range. `None` on either side means "unbounded".
    ///
    /// `Drop` is never produced here; it is only requested explicitly.
    pub fn resolve(start: Option<Stage>, end: Option<Stage>) -> Result<Self, DeployError> {
        use Stage as S;
        use StageOperation as Op;

        match (start, end) {
            (None | Some(S::Upload), None | Some(S::Release)) => Ok(Op::FullDeployment),
            (None | Some(S::Upload), Some(S::Upload)) => Ok(Op::Upload),
            (None | Some(S::Upload), Some(S::Close)) => Ok(Op::UploadAndClose),
            (Some(S::Close), None | Some(S::Release)) => Ok(Op::CloseAndRelease),
            (Some(S::Close), Some(S::Close)) => Ok(Op::Close),
            (Some(S::Release), None | Some(S::Release)) => Ok(Op::Release),
            (Some(start @ (S::Close | S::Release)), Some(end @ (S::Upload | S::Close))) => {
                InvalidStageRangeSnafu { start, end }.fail()
            }
        }
    }

    pub fn includes_upload(&self) -> bool {
        matches!(
            self,
            StageOperation::FullDeployment | StageOperation::Upload | StageOperation::UploadAndClose
        )
    }

    pub fn includes_close(&self) -> bool {
        matches!(
            self,
            StageOperation::FullDeployment
                | StageOperation::Close
                | StageOperation::UploadAndClose
                | StageOperation::CloseAndRelease
        )
    }

    pub fn includes_release(&self) -> bool {
        matches!(
            self,
            StageOperation::FullDeployment
                | StageOperation::Release
                | StageOperation::CloseAndRelease
        )
    }

    pub fn is_drop(&self) -> bool {
        matches!(self, StageOperation::Drop)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageOperation::FullDeployment => "full-deployment",
            StageOperation::Upload => "upload",
            StageOperation::Close => "close",
            StageOperation::Release => "release",
            StageOperation::Drop => "drop",
            StageOperation::UploadAndClose => "upload-and-close",
            StageOperation::CloseAndRelease => "close-and-release",
        }
    }
}

impl fmt::Display for StageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
