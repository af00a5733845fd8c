// ABOUTME: In-memory StagingOps implementation with scripted repository states.
// ABOUTME: Records every call so tests can assert which remote operations ran.

use async_trait::async_trait;
use parking_lot::Mutex;
use stagehand::staging::{
    ActivityEvent, ActivityProperty, RepositoryState, StagingActivity, StagingError, StagingOps,
    StagingProfile, StagingRepository,
};
use stagehand::types::{Coordinates, Deployable, ProfileId, RepositoryId};
use std::collections::{HashMap, HashSet, VecDeque};

pub const PROFILE: &str = "12a34";
pub const GROUP: &str = "com.example";

#[derive(Default)]
struct State {
    profiles: Vec<StagingProfile>,
    repositories: Vec<StagingRepository>,
    created: Option<String>,
    scripts: HashMap<String, VecDeque<(RepositoryState, bool)>>,
    activities: Vec<StagingActivity>,
    published: HashSet<String>,
    broken_uploads: HashSet<String>,
    failing: HashMap<&'static str, u16>,
    dry_run: bool,
    calls: Vec<String>,
}

/// Scripted staging service.
///
/// Each `get_repository` consumes the next scripted state for that id; the
/// last state repeats. Unscripted ids read as `NotFound`.
#[derive(Default)]
pub struct FakeStaging {
    state: Mutex<State>,
}

impl FakeStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, id: &str, name: &str) -> Self {
        self.state.lock().profiles.push(StagingProfile {
            id: ProfileId::new(id),
            name: name.to_string(),
        });
        self
    }

    /// Repository returned by `find_staging_repositories`.
    pub fn with_repository(self, id: &str, state: RepositoryState) -> Self {
        self.state
            .lock()
            .repositories
            .push(repository(id, state, false));
        self
    }

    /// Id handed out by `create_repository`.
    pub fn creates(self, id: &str) -> Self {
        self.state.lock().created = Some(id.to_string());
        self
    }

    pub fn script(self, id: &str, states: &[(RepositoryState, bool)]) -> Self {
        self.state
            .lock()
            .scripts
            .insert(id.to_string(), states.iter().copied().collect());
        self
    }

    pub fn with_activity(self, activity: StagingActivity) -> Self {
        self.state.lock().activities.push(activity);
        self
    }

    /// Make the existence probe report `filename` as published.
    pub fn published(self, filename: &str) -> Self {
        self.state.lock().published.insert(filename.to_string());
        self
    }

    pub fn broken_upload(self, filename: &str) -> Self {
        self.state.lock().broken_uploads.insert(filename.to_string());
        self
    }

    /// Fail every call named `operation` with an API error of `status`.
    pub fn failing(self, operation: &'static str, status: u16) -> Self {
        self.state.lock().failing.insert(operation, status);
        self
    }

    /// Behave like a dry-run client: mutating calls change nothing.
    pub fn dry_run(self) -> Self {
        self.state.lock().dry_run = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Number of recorded calls named `operation`.
    pub fn count(&self, operation: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.split(':').next() == Some(operation))
            .count()
    }

    fn record(&self, operation: &'static str, detail: &str) -> Result<(), StagingError> {
        let mut state = self.state.lock();
        state.calls.push(format!("{operation}:{detail}"));
        match state.failing.get(operation) {
            Some(&status) => Err(api_error(status)),
            None => Ok(()),
        }
    }

    fn is_dry_run(&self) -> bool {
        self.state.lock().dry_run
    }
}

#[async_trait]
impl StagingOps for FakeStaging {
    async fn find_staging_profiles(
        &self,
        group_id: &str,
    ) -> Result<Vec<StagingProfile>, StagingError> {
        self.record("find_profiles", group_id)?;
        Ok(self.state.lock().profiles.clone())
    }

    async fn find_staging_repositories(
        &self,
        profile_id: &ProfileId,
        _group_id: &str,
    ) -> Result<Vec<StagingRepository>, StagingError> {
        self.record("find_repositories", profile_id.as_str())?;
        Ok(self.state.lock().repositories.clone())
    }

    async fn create_repository(
        &self,
        profile_id: &ProfileId,
        _group_id: &str,
    ) -> Result<Option<RepositoryId>, StagingError> {
        self.record("create", profile_id.as_str())?;
        if self.is_dry_run() {
            return Ok(None);
        }
        Ok(self.state.lock().created.clone().map(RepositoryId::new))
    }

    async fn close_repository(
        &self,
        _profile_id: &ProfileId,
        repository_id: &RepositoryId,
        _group_id: &str,
    ) -> Result<(), StagingError> {
        self.record("close", repository_id.as_str())
    }

    async fn release_repository(
        &self,
        _profile_id: &ProfileId,
        repository_id: &RepositoryId,
        _group_id: &str,
    ) -> Result<(), StagingError> {
        self.record("release", repository_id.as_str())
    }

    async fn drop_repository(
        &self,
        _profile_id: &ProfileId,
        repository_id: &RepositoryId,
        _group_id: &str,
    ) -> Result<(), StagingError> {
        self.record("drop", repository_id.as_str())
    }

    async fn get_repository(
        &self,
        repository_id: &RepositoryId,
    ) -> Result<StagingRepository, StagingError> {
        self.record("get", repository_id.as_str())?;

        let mut state = self.state.lock();
        let Some(script) = state.scripts.get_mut(repository_id.as_str()) else {
            return Ok(StagingRepository::not_found(repository_id.clone()));
        };

        let (repository_state, transitioning) = if script.len() > 1 {
            script.pop_front().unwrap_or((RepositoryState::NotFound, false))
        } else {
            script
                .front()
                .copied()
                .unwrap_or((RepositoryState::NotFound, false))
        };

        if repository_state == RepositoryState::NotFound {
            return Ok(StagingRepository::not_found(repository_id.clone()));
        }
        Ok(repository(repository_id.as_str(), repository_state, transitioning))
    }

    async fn deploy(
        &self,
        repository_id: Option<&RepositoryId>,
        deployable: &Deployable,
    ) -> Result<(), StagingError> {
        let target = repository_id.map(RepositoryId::as_str).unwrap_or("snapshot");
        self.record("deploy", &format!("{target}/{}", deployable.filename()))?;

        if self
            .state
            .lock()
            .broken_uploads
            .contains(deployable.filename())
        {
            return Err(StagingError::Server {
                url: format!("http://fake/{}", deployable.filename()),
                status: 502,
                reason: "Bad Gateway".to_string(),
            });
        }
        Ok(())
    }

    async fn artifact_exists(
        &self,
        deployable: &Deployable,
        verify_url: Option<&str>,
    ) -> Result<bool, StagingError> {
        self.record("exists", deployable.filename())?;
        if verify_url.is_none() {
            return Ok(false);
        }
        Ok(self.state.lock().published.contains(deployable.filename()))
    }

    async fn list_activity(
        &self,
        repository_id: &RepositoryId,
    ) -> Result<Vec<StagingActivity>, StagingError> {
        self.record("activity", repository_id.as_str())?;
        Ok(self.state.lock().activities.clone())
    }
}

pub fn repository(id: &str, state: RepositoryState, transitioning: bool) -> StagingRepository {
    StagingRepository {
        profile_id: Some(ProfileId::new(PROFILE)),
        profile_name: Some(GROUP.to_string()),
        repository_id: RepositoryId::new(id),
        state,
        transitioning,
        updated_at: None,
    }
}

pub fn api_error(status: u16) -> StagingError {
    StagingError::Api {
        url: "http://fake/staging".to_string(),
        status,
        reason: "scripted failure".to_string(),
    }
}

pub fn deployable(coordinates: &str, filename: &str) -> Deployable {
    let coordinates = Coordinates::parse(coordinates).unwrap();
    Deployable::new(coordinates, format!("build/{filename}")).unwrap()
}

/// A `close` activity whose rule evaluation failed with `messages`.
pub fn failed_close(messages: &[&str]) -> StagingActivity {
    StagingActivity {
        name: "close".to_string(),
        events: messages
            .iter()
            .map(|m| ActivityEvent {
                name: "ruleFailed".to_string(),
                properties: vec![ActivityProperty {
                    name: "failureMessage".to_string(),
                    value: m.to_string(),
                }],
            })
            .collect(),
    }
}
