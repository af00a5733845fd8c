// ABOUTME: Capability trait for talking to a staging repository service.
// ABOUTME: Implemented by the HTTP client and by in-memory fakes in tests.

use async_trait::async_trait;

use super::error::StagingError;
use super::model::{StagingActivity, StagingProfile, StagingRepository};
use crate::types::{Deployable, ProfileId, RepositoryId};

/// Operations against a remote staging service.
///
/// Transition calls (`close`, `release`, `drop`) only submit the request;
/// callers must poll [`StagingOps::get_repository`] to learn the outcome.
/// Mutating calls are no-ops when the implementation runs in dry-run mode.
#[async_trait]
pub trait StagingOps: Send + Sync {
    /// Staging profiles matching `group_id`, ordered by name descending.
    async fn find_staging_profiles(
        &self,
        group_id: &str,
    ) -> Result<Vec<StagingProfile>, StagingError>;

    /// Repositories of `profile_id` whose profile name equals `group_id`,
    /// most recently updated first.
    async fn find_staging_repositories(
        &self,
        profile_id: &ProfileId,
        group_id: &str,
    ) -> Result<Vec<StagingRepository>, StagingError>;

    /// Open a new staging repository. Returns `None` in dry-run.
    async fn create_repository(
        &self,
        profile_id: &ProfileId,
        group_id: &str,
    ) -> Result<Option<RepositoryId>, StagingError>;

    async fn close_repository(
        &self,
        profile_id: &ProfileId,
        repository_id: &RepositoryId,
        group_id: &str,
    ) -> Result<(), StagingError>;

    async fn release_repository(
        &self,
        profile_id: &ProfileId,
        repository_id: &RepositoryId,
        group_id: &str,
    ) -> Result<(), StagingError>;

    async fn drop_repository(
        &self,
        profile_id: &ProfileId,
        repository_id: &RepositoryId,
        group_id: &str,
    ) -> Result<(), StagingError>;

    /// Current view of a repository. A missing repository is reported as
    /// [`RepositoryState::NotFound`](super::RepositoryState::NotFound), not as an error.
    async fn get_repository(
        &self,
        repository_id: &RepositoryId,
    ) -> Result<StagingRepository, StagingError>;

    /// Upload one artifact. Without a repository id the artifact goes to the
    /// non-staging (snapshot) location.
    async fn deploy(
        &self,
        repository_id: Option<&RepositoryId>,
        deployable: &Deployable,
    ) -> Result<(), StagingError>;

    /// Probe whether `deployable` is already published at `verify_url`.
    async fn artifact_exists(
        &self,
        deployable: &Deployable,
        verify_url: Option<&str>,
    ) -> Result<bool, StagingError>;

    async fn list_activity(
        &self,
        repository_id: &RepositoryId,
    ) -> Result<Vec<StagingActivity>, StagingError>;
}
