// ABOUTME: Orchestrates a staged deployment run from discovery through release or drop.
// ABOUTME: Caches resolved profile/repository ids so a failed run can be resumed.

use serde::Serialize;
use snafu::ResultExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::error::{
    DeployError, MissingSnapshotUrlSnafu, MixedSnapshotSnafu, ProfileNotFoundSnafu,
    RepositoryNotFoundSnafu, StagingSnafu, UploadFailedSnafu,
};
use super::stage::{Stage, StageOperation};
use super::upload::upload_all;
use super::waiter::Waiter;
use crate::diagnostics::{Diagnostics, Warning};
use crate::retry::Retrier;
use crate::staging::{RepositoryState, StagingOps, Transition};
use crate::types::{Deployable, ProfileId, RepositoryId};

pub const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_TRANSITION_MAX_RETRIES: u32 = 60;

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    /// Deployer name, used for reporting and resume state.
    pub name: String,
    /// Coordinate group used to find the staging profile and repository.
    pub group_id: String,
    pub deployables: Vec<Deployable>,
    pub start_stage: Option<Stage>,
    pub end_stage: Option<Stage>,
    /// Drop the repository instead of running a stage range.
    pub drop: bool,
    /// Known profile id; skips profile discovery.
    pub profile_id: Option<ProfileId>,
    /// Known repository id; skips repository discovery and creation.
    pub repository_id: Option<RepositoryId>,
    pub close_repository: bool,
    pub release_repository: bool,
    pub snapshot_supported: bool,
    pub snapshot_url: Option<String>,
    /// Template used to probe whether an artifact is already published.
    pub verify_url: Option<String>,
    pub dry_run: bool,
    pub transition_delay: Duration,
    pub transition_max_retries: u32,
}

impl DeployRequest {
    pub fn new(
        name: impl Into<String>,
        group_id: impl Into<String>,
        deployables: Vec<Deployable>,
    ) -> Self {
        Self {
            name: name.into(),
            group_id: group_id.into(),
            deployables,
            start_stage: None,
            end_stage: None,
            drop: false,
            profile_id: None,
            repository_id: None,
            close_repository: true,
            release_repository: true,
            snapshot_supported: false,
            snapshot_url: None,
            verify_url: None,
            dry_run: false,
            transition_delay: DEFAULT_TRANSITION_DELAY,
            transition_max_retries: DEFAULT_TRANSITION_MAX_RETRIES,
        }
    }

    /// The operation this request performs.
    pub fn operation(&self) -> Result<StageOperation, DeployError> {
        if self.drop {
            return Ok(StageOperation::Drop);
        }
        StageOperation::resolve(self.start_stage, self.end_stage)
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub deployer: String,
    pub operation: StageOperation,
    pub snapshot: bool,
    /// Nothing was done because snapshot deployment is disabled.
    pub skipped: bool,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<ProfileId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<RepositoryId>,
    pub uploaded: Vec<String>,
    pub warnings: Vec<Warning>,
}

/// Runs one deployment request against a staging service.
///
/// The resolved ids stay on the deployer after [`Deployer::deploy`] returns,
/// whether it succeeded or not, so callers can persist them for a resumed run.
pub struct Deployer<'a, S: ?Sized> {
    staging: &'a S,
    request: DeployRequest,
    cancel: CancellationToken,
    profile_id: Option<ProfileId>,
    repository_id: Option<RepositoryId>,
    diag: Diagnostics,
    uploaded: Vec<String>,
    /// The repository was released or dropped; nothing is left to resume.
    finished: bool,
}

impl<'a, S> Deployer<'a, S>
where
    S: StagingOps + ?Sized,
{
    pub fn new(staging: &'a S, request: DeployRequest) -> Self {
        Self {
            staging,
            profile_id: request.profile_id.clone(),
            repository_id: request.repository_id.clone(),
            request,
            cancel: CancellationToken::new(),
            diag: Diagnostics::default(),
            uploaded: Vec::new(),
            finished: false,
        }
    }

    /// Abort transition polling when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn request(&self) -> &DeployRequest {
        &self.request
    }

    /// Profile and repository ids known so far.
    pub fn resolved(&self) -> (Option<&ProfileId>, Option<&RepositoryId>) {
        (self.profile_id.as_ref(), self.repository_id.as_ref())
    }

    /// Ids worth keeping for a resumed run. A released or dropped
    /// repository is left out.
    pub fn resume_ids(&self) -> (Option<&ProfileId>, Option<&RepositoryId>) {
        let repository_id = if self.finished {
            None
        } else {
            self.repository_id.as_ref()
        };
        (self.profile_id.as_ref(), repository_id)
    }

    pub fn warnings(&self) -> &[Warning] {
        self.diag.warnings()
    }

    pub async fn deploy(&mut self) -> Result<DeployReport, DeployError> {
        let operation = self.request.operation()?;
        let snapshot = self.is_snapshot_run()?;

        tracing::info!(
            deployer = %self.request.name,
            %operation,
            snapshot,
            dry_run = self.request.dry_run,
            "starting staging run"
        );

        if snapshot {
            return self.deploy_snapshot(operation).await;
        }

        self.discover(operation).await?;

        if operation.includes_upload() {
            let repository_id = self.repository_id.clone();
            self.upload_phase(repository_id.as_ref()).await?;
        }

        if operation.includes_close() {
            if self.request.close_repository {
                self.close_phase().await?;
            } else {
                tracing::info!("closing is disabled, leaving staging repository open");
            }
        }

        if operation.includes_release() {
            if self.request.release_repository {
                self.release_phase(operation).await?;
            } else {
                tracing::info!("releasing is disabled, leaving staging repository unreleased");
            }
        }

        if operation.is_drop() {
            self.drop_phase().await?;
        }

        Ok(self.report(operation, false, false))
    }

    fn is_snapshot_run(&self) -> Result<bool, DeployError> {
        let deployables = &self.request.deployables;
        let snapshots = deployables.iter().filter(|d| d.is_snapshot()).count();

        if snapshots == 0 {
            Ok(false)
        } else if snapshots == deployables.len() {
            Ok(true)
        } else {
            MixedSnapshotSnafu.fail()
        }
    }

    async fn deploy_snapshot(
        &mut self,
        operation: StageOperation,
    ) -> Result<DeployReport, DeployError> {
        if !self.request.snapshot_supported {
            self.diag.warn(Warning::snapshot_skipped(format!(
                "snapshot deployment is not supported by '{}', skipping",
                self.request.name
            )));
            return Ok(self.report(operation, true, true));
        }

        if self.request.snapshot_url.is_none() {
            return MissingSnapshotUrlSnafu {
                deployer: self.request.name.clone(),
            }
            .fail();
        }

        if operation.includes_upload() {
            self.upload_phase(None).await?;
        }

        if operation.includes_close() || operation.includes_release() || operation.is_drop() {
            tracing::info!("snapshot artifacts are not staged, skipping {operation}");
        }

        Ok(self.report(operation, true, false))
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    async fn discover(&mut self, operation: StageOperation) -> Result<(), DeployError> {
        let group_id = self.request.group_id.clone();

        if self.profile_id.is_none() {
            match self.repository_id.clone() {
                Some(repository_id) => {
                    self.profile_from_repository(&repository_id, operation)
                        .await?
                }
                None => self.discover_profile(&group_id).await?,
            }
        }

        if self.repository_id.is_some() {
            return Ok(());
        }

        let Some(profile_id) = self.profile_id.clone() else {
            return Ok(());
        };

        if operation.includes_upload() {
            self.repository_id = self
                .staging
                .create_repository(&profile_id, &group_id)
                .await
                .context(StagingSnafu {
                    operation: format!("creating staging repository for {group_id}"),
                })?;
            return Ok(());
        }

        let repositories = self
            .staging
            .find_staging_repositories(&profile_id, &group_id)
            .await
            .context(StagingSnafu {
                operation: format!("listing staging repositories of profile {profile_id}"),
            })?;

        match repositories.into_iter().next() {
            Some(repository) => {
                tracing::info!(
                    "using staging repository {} ({})",
                    repository.repository_id,
                    repository.state
                );
                self.repository_id = Some(repository.repository_id);
                Ok(())
            }
            None => self.absent(RepositoryNotFoundSnafu { group_id }.build()),
        }
    }

    async fn discover_profile(&mut self, group_id: &str) -> Result<(), DeployError> {
        let profiles = self
            .staging
            .find_staging_profiles(group_id)
            .await
            .context(StagingSnafu {
                operation: format!("finding staging profile for {group_id}"),
            })?;

        match profiles.into_iter().next() {
            Some(profile) => {
                tracing::info!("using staging profile {} ({})", profile.id, profile.name);
                self.profile_id = Some(profile.id);
                Ok(())
            }
            None => self.absent(ProfileNotFoundSnafu { group_id }.build()),
        }
    }

    async fn profile_from_repository(
        &mut self,
        repository_id: &RepositoryId,
        operation: StageOperation,
    ) -> Result<(), DeployError> {
        let repository = self
            .staging
            .get_repository(repository_id)
            .await
            .context(StagingSnafu {
                operation: format!("reading staging repository {repository_id}"),
            })?;

        let group_id = self.request.group_id.clone();
        match (repository.profile_id, repository.state) {
            (Some(profile_id), _) => {
                tracing::debug!("staging repository {repository_id} belongs to profile {profile_id}");
                self.profile_id = Some(profile_id);
                Ok(())
            }
            (None, RepositoryState::NotFound) if operation.is_drop() => Ok(()),
            (None, RepositoryState::NotFound) => {
                self.absent(RepositoryNotFoundSnafu { group_id }.build())
            }
            (None, _) => self.absent(ProfileNotFoundSnafu { group_id }.build()),
        }
    }

    /// Absence of a profile or repository is fatal, except in dry-run.
    fn absent(&mut self, error: DeployError) -> Result<(), DeployError> {
        if self.request.dry_run {
            self.diag
                .warn(Warning::dry_run_absence(format!("[dryrun] {error}")));
            Ok(())
        } else {
            Err(error)
        }
    }

    /// Ids needed to submit `transition`. `None` means dry-run found nothing to act on.
    fn target(
        &self,
        transition: Transition,
    ) -> Result<Option<(ProfileId, RepositoryId)>, DeployError> {
        let group_id = self.request.group_id.clone();
        match (&self.profile_id, &self.repository_id) {
            (Some(profile_id), Some(repository_id)) => {
                Ok(Some((profile_id.clone(), repository_id.clone())))
            }
            _ if self.request.dry_run => {
                tracing::info!("[dryrun] no staging repository to {transition}, skipping");
                Ok(None)
            }
            (None, _) => ProfileNotFoundSnafu { group_id }.fail(),
            (_, None) => RepositoryNotFoundSnafu { group_id }.fail(),
        }
    }

    fn waiter(&self) -> Waiter<'a, S> {
        let retrier = Retrier::new(
            self.request.transition_delay,
            self.request.transition_max_retries,
        )
        .with_cancellation(self.cancel.clone());
        Waiter::new(self.staging, retrier)
    }

    // =========================================================================
    // Phases
    // =========================================================================

    async fn upload_phase(
        &mut self,
        repository_id: Option<&RepositoryId>,
    ) -> Result<(), DeployError> {
        tracing::info!(
            "uploading {} artifacts",
            self.request.deployables.len()
        );

        let summary = upload_all(
            self.staging,
            repository_id,
            &self.request.deployables,
            self.request.verify_url.as_deref(),
            self.request.dry_run,
            &mut self.diag,
        )
        .await;

        self.uploaded.extend(summary.uploaded);

        if summary.failures.is_empty() {
            Ok(())
        } else {
            UploadFailedSnafu {
                failures: summary.failures,
            }
            .fail()
        }
    }

    async fn close_phase(&mut self) -> Result<(), DeployError> {
        let Some((profile_id, repository_id)) = self.target(Transition::Close)? else {
            return Ok(());
        };

        self.staging
            .close_repository(&profile_id, &repository_id, &self.request.group_id)
            .await
            .context(StagingSnafu {
                operation: format!("closing staging repository {repository_id}"),
            })?;

        if self.request.dry_run {
            return Ok(());
        }

        self.waiter()
            .wait_for_state(&repository_id, Transition::Close, &[RepositoryState::Closed])
            .await?;
        Ok(())
    }

    async fn release_phase(&mut self, operation: StageOperation) -> Result<(), DeployError> {
        if !operation.includes_close() && self.request.close_repository {
            match self.close_phase().await {
                Ok(()) => {}
                Err(e @ DeployError::Cancelled { .. }) => return Err(e),
                Err(e) => self.diag.warn(Warning::best_effort_close(format!(
                    "closing before release did not succeed: {e}"
                ))),
            }
        }

        let Some((profile_id, repository_id)) = self.target(Transition::Release)? else {
            return Ok(());
        };

        self.staging
            .release_repository(&profile_id, &repository_id, &self.request.group_id)
            .await
            .context(StagingSnafu {
                operation: format!("releasing staging repository {repository_id}"),
            })?;

        if self.request.dry_run {
            return Ok(());
        }

        self.waiter()
            .wait_for_state(
                &repository_id,
                Transition::Release,
                &[RepositoryState::Released, RepositoryState::NotFound],
            )
            .await?;
        self.finished = true;
        Ok(())
    }

    async fn drop_phase(&mut self) -> Result<(), DeployError> {
        let Some(repository_id) = self.repository_id.clone() else {
            if self.request.dry_run {
                tracing::info!("[dryrun] no staging repository to drop, skipping");
                return Ok(());
            }
            return RepositoryNotFoundSnafu {
                group_id: self.request.group_id.clone(),
            }
            .fail();
        };

        let current = self
            .staging
            .get_repository(&repository_id)
            .await
            .context(StagingSnafu {
                operation: format!("reading staging repository {repository_id}"),
            })?;

        if current.state == RepositoryState::NotFound {
            tracing::info!("staging repository {repository_id} is already gone");
            self.finished = !self.request.dry_run;
            return Ok(());
        }

        let Some((profile_id, repository_id)) = self.target(Transition::Drop)? else {
            return Ok(());
        };

        match self
            .staging
            .drop_repository(&profile_id, &repository_id, &self.request.group_id)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::info!("staging repository {repository_id} was already dropped");
                self.finished = !self.request.dry_run;
                return Ok(());
            }
            Err(e) => {
                return Err(e).context(StagingSnafu {
                    operation: format!("dropping staging repository {repository_id}"),
                });
            }
        }

        if self.request.dry_run {
            return Ok(());
        }

        self.waiter()
            .wait_for_state(&repository_id, Transition::Drop, &[RepositoryState::NotFound])
            .await?;
        self.finished = true;
        Ok(())
    }

    fn report(&mut self, operation: StageOperation, snapshot: bool, skipped: bool) -> DeployReport {
        DeployReport {
            deployer: self.request.name.clone(),
            operation,
            snapshot,
            skipped,
            dry_run: self.request.dry_run,
            profile_id: self.profile_id.clone(),
            repository_id: self.repository_id.clone(),
            uploaded: std::mem::take(&mut self.uploaded),
            warnings: self.diag.warnings().to_vec(),
        }
    }
}
