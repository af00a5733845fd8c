// ABOUTME: Upload phase: probe and transfer every deployable, failing at the end.
// ABOUTME: Records per-artifact failures instead of stopping at the first one.

use serde::Serialize;
use std::fmt;

use crate::diagnostics::{Diagnostics, Warning};
use crate::staging::StagingOps;
use crate::types::{Deployable, RepositoryId};

/// Why an individual artifact counts as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadFailureKind {
    /// Already published before this run.
    AlreadyExists,
    /// The transfer itself failed.
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadFailure {
    pub artifact: String,
    pub kind: UploadFailureKind,
    pub message: String,
}

impl fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.artifact, self.message)
    }
}

/// Outcome of uploading a batch of deployables.
#[derive(Debug, Default)]
pub struct UploadSummary {
    pub uploaded: Vec<String>,
    pub failures: Vec<UploadFailure>,
}

/// Upload `deployables` in order.
///
/// Each artifact is first probed at `verify_url`. An artifact that already
/// exists is still uploaded but counts as a failure outside dry-run. Probe
/// errors only produce a warning.
pub async fn upload_all<S>(
    staging: &S,
    repository_id: Option<&RepositoryId>,
    deployables: &[Deployable],
    verify_url: Option<&str>,
    dry_run: bool,
    diag: &mut Diagnostics,
) -> UploadSummary
where
    S: StagingOps + ?Sized,
{
    let mut summary = UploadSummary::default();

    for deployable in deployables {
        match staging.artifact_exists(deployable, verify_url).await {
            Ok(true) => {
                diag.warn(Warning::artifact_exists(format!(
                    "{deployable} is already published"
                )));
                if !dry_run {
                    summary.failures.push(UploadFailure {
                        artifact: deployable.to_string(),
                        kind: UploadFailureKind::AlreadyExists,
                        message: "artifact is already published".to_string(),
                    });
                }
            }
            Ok(false) => {}
            Err(e) => {
                diag.warn(Warning::probe_failed(format!(
                    "could not check whether {deployable} is published: {e}"
                )));
            }
        }

        match staging.deploy(repository_id, deployable).await {
            Ok(()) => summary.uploaded.push(deployable.to_string()),
            Err(e) => {
                tracing::error!("failed to upload {deployable}: {e}");
                summary.failures.push(UploadFailure {
                    artifact: deployable.to_string(),
                    kind: UploadFailureKind::Transfer,
                    message: e.to_string(),
                });
            }
        }
    }

    summary
}
