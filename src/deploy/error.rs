// ABOUTME: Error types for staged deployment runs with SNAFU pattern.
// ABOUTME: Carries repository state, activity failure messages and per-artifact upload failures.

use snafu::Snafu;

use super::stage::Stage;
use super::upload::UploadFailure;
use crate::staging::{RepositoryState, StagingError, Transition};
use crate::types::RepositoryId;

/// Errors that end a deployment run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DeployError {
    #[snafu(display("{operation} failed: {source}"))]
    Staging {
        operation: String,
        source: StagingError,
    },

    #[snafu(display("invalid stage range: cannot run from {start} to {end}"))]
    InvalidStageRange { start: Stage, end: Stage },

    #[snafu(display("deployables mix snapshot and release versions"))]
    MixedSnapshot,

    #[snafu(display("snapshot deployment for '{deployer}' requires a snapshot_url"))]
    MissingSnapshotUrl { deployer: String },

    #[snafu(display("no staging profile found for group '{group_id}'"))]
    ProfileNotFound { group_id: String },

    #[snafu(display("no staging repository found for group '{group_id}'"))]
    RepositoryNotFound { group_id: String },

    #[snafu(display(
        "{transition} of staging repository {repository_id} did not finish after {attempts} attempts (last state: {last_state})"
    ))]
    TransitionTimeout {
        repository_id: RepositoryId,
        transition: Transition,
        attempts: u32,
        last_state: RepositoryState,
    },

    #[snafu(display(
        "{transition} of staging repository {repository_id} ended in state {state}, expected {}{}",
        join_states(expected),
        format_failures(failures)
    ))]
    WrongOutcome {
        repository_id: RepositoryId,
        transition: Transition,
        state: RepositoryState,
        expected: Vec<RepositoryState>,
        failures: Vec<String>,
    },

    #[snafu(display("{} of the artifacts failed to upload{}", failures.len(), format_upload_failures(failures)))]
    UploadFailed { failures: Vec<UploadFailure> },

    #[snafu(display("cancelled while waiting for {transition} of staging repository {repository_id}"))]
    Cancelled {
        repository_id: RepositoryId,
        transition: Transition,
        last_state: Option<RepositoryState>,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// A staging API call failed.
    Staging,
    /// Start stage comes after end stage.
    InvalidStageRange,
    /// Snapshot settings do not allow this run.
    Snapshot,
    /// Discovery found nothing to work on.
    NotFound,
    /// The provider never settled within the polling budget.
    Timeout,
    /// The provider settled in a state other than the requested one.
    WrongOutcome,
    UploadFailed,
    Cancelled,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Staging { .. } => DeployErrorKind::Staging,
            DeployError::InvalidStageRange { .. } => DeployErrorKind::InvalidStageRange,
            DeployError::MixedSnapshot | DeployError::MissingSnapshotUrl { .. } => {
                DeployErrorKind::Snapshot
            }
            DeployError::ProfileNotFound { .. } | DeployError::RepositoryNotFound { .. } => {
                DeployErrorKind::NotFound
            }
            DeployError::TransitionTimeout { .. } => DeployErrorKind::Timeout,
            DeployError::WrongOutcome { .. } => DeployErrorKind::WrongOutcome,
            DeployError::UploadFailed { .. } => DeployErrorKind::UploadFailed,
            DeployError::Cancelled { .. } => DeployErrorKind::Cancelled,
        }
    }

    /// Activity failure messages attached to a wrong-outcome error.
    pub fn failure_messages(&self) -> &[String] {
        match self {
            DeployError::WrongOutcome { failures, .. } => failures,
            _ => &[],
        }
    }

    /// The underlying client error, if a staging call failed.
    pub fn staging_error(&self) -> Option<&StagingError> {
        match self {
            DeployError::Staging { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn join_states(states: &[RepositoryState]) -> String {
    states
        .iter()
        .map(RepositoryState::as_str)
        .collect::<Vec<_>>()
        .join(" or ")
}

fn format_failures(failures: &[String]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let mut out = String::from("\n  failures:");
    for failure in failures {
        out.push_str("\n    - ");
        out.push_str(failure);
    }
    out
}

fn format_upload_failures(failures: &[UploadFailure]) -> String {
    let mut out = String::new();
    for failure in failures {
        out.push_str("\n  - ");
        out.push_str(&failure.to_string());
    }
    out
}
