// ABOUTME: Staged deployment orchestration on top of the staging client.
// ABOUTME: Exports the deployer, stage resolution, transition waiter and resume state.

mod activity;
mod deployer;
mod error;
mod stage;
mod state;
mod upload;
mod waiter;

pub use activity::{failure_messages, resolve_failure_messages};
pub use deployer::{
    DEFAULT_TRANSITION_DELAY, DEFAULT_TRANSITION_MAX_RETRIES, DeployReport, DeployRequest,
    Deployer,
};
pub use error::{DeployError, DeployErrorKind};
pub use stage::{Stage, StageOperation};
pub use state::{ResumeRecord, ResumeState, STATE_FILE};
pub use upload::{UploadFailure, UploadFailureKind, UploadSummary, upload_all};
pub use waiter::Waiter;
