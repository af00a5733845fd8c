// ABOUTME: Domain values returned by the staging service.
// ABOUTME: Profiles, repositories with their lifecycle state, and activity logs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::types::{ProfileId, RepositoryId};

/// Provider-side binding of a coordinate group to a staging workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingProfile {
    pub id: ProfileId,
    pub name: String,
}

/// Lifecycle state of a staging repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryState {
    Open,
    Closed,
    Released,
    /// The repository does not exist (never created, dropped, or removed on release).
    NotFound,
}

impl RepositoryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryState::Open => "open",
            RepositoryState::Closed => "closed",
            RepositoryState::Released => "released",
            RepositoryState::NotFound => "not found",
        }
    }
}

impl fmt::Display for RepositoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepositoryState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(RepositoryState::Open),
            "closed" => Ok(RepositoryState::Closed),
            "released" => Ok(RepositoryState::Released),
            "not_found" | "not found" => Ok(RepositoryState::NotFound),
            other => Err(format!("unknown repository state '{other}'")),
        }
    }
}

/// A staging repository as last observed.
///
/// `transitioning` overlays `state`: while it is set the provider is still
/// applying a close, release or drop and `state` is not authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingRepository {
    pub profile_id: Option<ProfileId>,
    pub profile_name: Option<String>,
    pub repository_id: RepositoryId,
    pub state: RepositoryState,
    pub transitioning: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StagingRepository {
    /// Synthetic value for a repository read that came back 404.
    pub fn not_found(repository_id: RepositoryId) -> Self {
        Self {
            profile_id: None,
            profile_name: None,
            repository_id,
            state: RepositoryState::NotFound,
            transitioning: false,
            updated_at: None,
        }
    }

    pub fn is_settled(&self) -> bool {
        !self.transitioning
    }
}

/// A one-way lifecycle request submitted against a staging repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Close,
    Release,
    Drop,
}

impl Transition {
    /// Name of the activity log entry the provider records for this transition.
    pub fn activity(&self) -> &'static str {
        match self {
            Transition::Close => "close",
            Transition::Release => "release",
            Transition::Drop => "drop",
        }
    }

    /// Path segment of the profile endpoint that submits this transition.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Transition::Close => "finish",
            Transition::Release => "promote",
            Transition::Drop => "drop",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.activity())
    }
}

/// One entry of a repository's activity log (e.g. "close", "release").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StagingActivity {
    pub name: String,
    pub events: Vec<ActivityEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivityEvent {
    pub name: String,
    pub properties: Vec<ActivityProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityProperty {
    pub name: String,
    pub value: String,
}
