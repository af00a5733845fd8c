// ABOUTME: Per-deployer settings: service endpoints, credentials, timeouts and stage defaults.
// ABOUTME: Converts to client settings and deployment requests, applying command-line overrides.

use serde::Deserialize;
use std::time::Duration;

use super::EnvValue;
use crate::deploy::{DeployRequest, Stage};
use crate::error::{Error, Result};
use crate::staging::StagingSettings;
use crate::types::{Deployable, ProfileId, RepositoryId};

#[derive(Debug, Clone, Deserialize)]
pub struct DeployerConfig {
    /// Base url of the staging service.
    pub url: String,

    #[serde(default)]
    pub snapshot_url: Option<String>,

    pub username: EnvValue,

    pub password: EnvValue,

    /// Defaults to the group of the first artifact.
    #[serde(default)]
    pub group_id: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    #[serde(default = "default_read_timeout", with = "humantime_serde")]
    pub read_timeout: Duration,

    #[serde(default = "default_transition_delay", with = "humantime_serde")]
    pub transition_delay: Duration,

    #[serde(default = "default_transition_max_retries")]
    pub transition_max_retries: u32,

    #[serde(default = "default_transport_retries")]
    pub transport_retries: u32,

    #[serde(default = "default_transport_retry_delay", with = "humantime_serde")]
    pub transport_retry_delay: Duration,

    /// Url template probed before each upload, e.g. `https://repo/{{path}}/{{filename}}`.
    #[serde(default)]
    pub verify_url: Option<String>,

    #[serde(default)]
    pub start_stage: Option<Stage>,

    #[serde(default)]
    pub end_stage: Option<Stage>,

    #[serde(default)]
    pub staging_profile_id: Option<ProfileId>,

    #[serde(default)]
    pub staging_repository_id: Option<RepositoryId>,

    #[serde(default = "default_true")]
    pub close_repository: bool,

    #[serde(default = "default_true")]
    pub release_repository: bool,

    #[serde(default)]
    pub snapshot_supported: bool,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_transition_delay() -> Duration {
    crate::deploy::DEFAULT_TRANSITION_DELAY
}

fn default_transition_max_retries() -> u32 {
    crate::deploy::DEFAULT_TRANSITION_MAX_RETRIES
}

fn default_transport_retries() -> u32 {
    3
}

fn default_transport_retry_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_true() -> bool {
    true
}

/// Values given on the command line for a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub dry_run: bool,
    pub drop: bool,
    pub start_stage: Option<Stage>,
    pub end_stage: Option<Stage>,
    pub profile_id: Option<ProfileId>,
    pub repository_id: Option<RepositoryId>,
}

impl DeployerConfig {
    /// Check settings that serde cannot express.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidConfig(format!("deployer '{name}': url is empty")));
        }

        if self.snapshot_supported && self.snapshot_url.is_none() {
            return Err(Error::InvalidConfig(format!(
                "deployer '{name}': snapshot_supported requires snapshot_url"
            )));
        }

        if self.transition_delay.is_zero() {
            return Err(Error::InvalidConfig(format!(
                "deployer '{name}': transition_delay must be greater than zero"
            )));
        }

        Ok(())
    }

    /// Client settings with credentials resolved from the environment.
    pub fn staging_settings(&self, dry_run: bool) -> Result<StagingSettings> {
        Ok(StagingSettings {
            url: self.url.clone(),
            snapshot_url: self.snapshot_url.clone(),
            username: self.username.resolve()?,
            password: self.password.resolve()?,
            description: self.description.clone(),
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            transport_retries: self.transport_retries,
            transport_retry_delay: self.transport_retry_delay,
            dry_run,
        })
    }

    /// Build the request for one run. Overrides win over configured values.
    pub fn request(
        &self,
        name: &str,
        default_group_id: &str,
        deployables: Vec<Deployable>,
        overrides: &RunOverrides,
    ) -> Result<DeployRequest> {
        self.validate(name)?;

        let group_id = self
            .group_id
            .clone()
            .unwrap_or_else(|| default_group_id.to_string());

        let mut request = DeployRequest::new(name, group_id, deployables);
        request.start_stage = overrides.start_stage.or(self.start_stage);
        request.end_stage = overrides.end_stage.or(self.end_stage);
        request.drop = overrides.drop;
        request.profile_id = overrides
            .profile_id
            .clone()
            .or_else(|| self.staging_profile_id.clone());
        request.repository_id = overrides
            .repository_id
            .clone()
            .or_else(|| self.staging_repository_id.clone());
        request.close_repository = self.close_repository;
        request.release_repository = self.release_repository;
        request.snapshot_supported = self.snapshot_supported;
        request.snapshot_url = self.snapshot_url.clone();
        request.verify_url = self.verify_url.clone();
        request.dry_run = overrides.dry_run;
        request.transition_delay = self.transition_delay;
        request.transition_max_retries = self.transition_max_retries;

        request
            .operation()
            .map_err(|e| Error::InvalidConfig(format!("deployer '{name}': {e}")))?;

        Ok(request)
    }
}
