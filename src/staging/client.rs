// ABOUTME: reqwest-based client for the remote staging repository API.
// ABOUTME: Maps REST endpoints to StagingOps, normalizing 404s and XML/JSON responses.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use std::convert::Infallible;
use std::fmt;
use std::time::Duration;
use urlencoding::encode;

use super::error::StagingError;
use super::model::{StagingActivity, StagingProfile, StagingRepository, Transition};
use super::traits::StagingOps;
use super::wire::{
    self, ActivityDto, DataEnvelope, ProfileDto, RepositoryDto, StartRequest, StartedRepository,
    TransitionRequest, XmlActivities, XmlProfiles, XmlRepositories,
};
use crate::retry::{RetryOutcome, Retrier};
use crate::types::{Deployable, ProfileId, RepositoryId};

const ACCEPT_API: &str = "application/json, application/xml;q=0.9";
const MAX_REASON_LEN: usize = 200;

/// Connection settings for one staging service.
#[derive(Clone)]
pub struct StagingSettings {
    /// Base service url, e.g. `https://host/service/local`.
    pub url: String,
    /// Base url for snapshot uploads, which bypass staging.
    pub snapshot_url: Option<String>,
    pub username: String,
    pub password: String,
    /// Description attached to created and transitioned repositories.
    pub description: Option<String>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Extra attempts for requests that fail with a retryable error.
    pub transport_retries: u32,
    pub transport_retry_delay: Duration,
    pub dry_run: bool,
}

impl fmt::Debug for StagingSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagingSettings")
            .field("url", &self.url)
            .field("snapshot_url", &self.snapshot_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("transport_retries", &self.transport_retries)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// HTTP implementation of [`StagingOps`].
pub struct StagingClient {
    http: reqwest::Client,
    settings: StagingSettings,
    transport: Retrier,
}

impl StagingClient {
    pub fn new(mut settings: StagingSettings) -> Result<Self, StagingError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .user_agent(concat!("stagehand/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StagingError::Client)?;

        settings.url = settings.url.trim_end_matches('/').to_string();
        settings.snapshot_url = settings
            .snapshot_url
            .map(|u| u.trim_end_matches('/').to_string());

        let transport = Retrier::new(settings.transport_retry_delay, settings.transport_retries);

        Ok(Self {
            http,
            settings,
            transport,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.settings.dry_run
    }

    pub fn settings(&self) -> &StagingSettings {
        &self.settings
    }

    /// Upload target for `deployable`.
    pub fn deploy_url(&self, repository_id: Option<&RepositoryId>, deployable: &Deployable) -> String {
        let filename = encode(deployable.filename());
        match repository_id {
            Some(id) => format!(
                "{}/staging/deployByRepositoryId/{}/{}/{}",
                self.settings.url,
                encode(id.as_str()),
                deployable.deploy_path(),
                filename
            ),
            None => {
                let base = self
                    .settings
                    .snapshot_url
                    .as_deref()
                    .unwrap_or(&self.settings.url);
                format!("{}/{}/{}", base, deployable.deploy_path(), filename)
            }
        }
    }

    /// Upload target shown by dry-run when no repository was created yet.
    fn pending_deploy_url(&self, deployable: &Deployable) -> String {
        format!(
            "{}/staging/deployByRepositoryId/<new>/{}/{}",
            self.settings.url,
            deployable.deploy_path(),
            encode(deployable.filename())
        )
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/staging/{}", self.settings.url, path)
    }

    fn description(&self, group_id: &str) -> String {
        self.settings
            .description
            .clone()
            .unwrap_or_else(|| format!("Staging repository for {group_id}"))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.settings.username, Some(&self.settings.password))
            .header(ACCEPT, ACCEPT_API)
    }

    /// Send an idempotent request, re-sending it while it fails with a
    /// retryable error.
    async fn send<F>(&self, build: F) -> Result<Response, StagingError>
    where
        F: Fn() -> RequestBuilder,
    {
        self.send_with(StagingError::is_retryable, build).await
    }

    /// Send a request whose effect must not be repeated. Only failures where
    /// the request never left are re-sent; a timeout may hide a success.
    async fn send_once<F>(&self, build: F) -> Result<Response, StagingError>
    where
        F: Fn() -> RequestBuilder,
    {
        self.send_with(StagingError::is_unsent, build).await
    }

    async fn send_with<F>(
        &self,
        resend: fn(&StagingError) -> bool,
        build: F,
    ) -> Result<Response, StagingError>
    where
        F: Fn() -> RequestBuilder,
    {
        let outcome = self
            .transport
            .retry(
                "http request",
                |result: &Result<Response, StagingError>| !matches!(result, Err(e) if resend(e)),
                || {
                    let request = build();
                    async move { Ok::<_, Infallible>(self.execute(request).await) }
                },
            )
            .await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        };

        if let RetryOutcome::Exhausted { attempts, .. } = &outcome {
            tracing::warn!(attempts, "giving up after repeated retryable failures");
        }

        outcome
            .into_last()
            .unwrap_or(Err(StagingError::Interrupted))
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, StagingError> {
        let request = builder
            .build()
            .map_err(|e| StagingError::InvalidUrl(e.to_string()))?;
        let url = request.url().to_string();
        tracing::debug!(method = %request.method(), %url, "sending request");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|source| StagingError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let reason = failure_reason(status, response).await;
        tracing::debug!(%url, status = status.as_u16(), %reason, "request failed");

        if status.is_server_error() {
            Err(StagingError::Server {
                url,
                status: status.as_u16(),
                reason,
            })
        } else {
            Err(StagingError::Api {
                url,
                status: status.as_u16(),
                reason,
            })
        }
    }

    async fn read<J, X>(&self, response: Response) -> Result<J, StagingError>
    where
        J: serde::de::DeserializeOwned,
        X: serde::de::DeserializeOwned + Into<J>,
    {
        let url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response
            .bytes()
            .await
            .map_err(|source| StagingError::Transport {
                url: url.clone(),
                source,
            })?;

        wire::decode::<J, X>(&url, content_type.as_deref(), &body)
    }

    async fn transition(
        &self,
        transition: Transition,
        profile_id: &ProfileId,
        repository_id: &RepositoryId,
        group_id: &str,
    ) -> Result<(), StagingError> {
        if self.settings.dry_run {
            tracing::info!("[dryrun] would {transition} staging repository {repository_id}");
            return Ok(());
        }

        let url = self.api_url(&format!(
            "profiles/{}/{}",
            encode(profile_id.as_str()),
            transition.endpoint()
        ));
        let description = self.description(group_id);
        let body = DataEnvelope {
            data: TransitionRequest {
                staged_repository_id: repository_id.as_str(),
                description: &description,
            },
        };

        self.send(|| self.request(Method::POST, &url).json(&body))
            .await?;
        tracing::info!("requested {transition} of staging repository {repository_id}");
        Ok(())
    }
}

#[async_trait]
impl StagingOps for StagingClient {
    async fn find_staging_profiles(
        &self,
        group_id: &str,
    ) -> Result<Vec<StagingProfile>, StagingError> {
        let url = self.api_url("profile_evaluate");
        let response = self
            .send(|| {
                self.request(Method::GET, &url)
                    .query(&[("t", "maven2"), ("g", group_id)])
            })
            .await?;

        let envelope: DataEnvelope<Vec<ProfileDto>> = self.read::<_, XmlProfiles>(response).await?;
        let mut profiles: Vec<StagingProfile> =
            envelope.data.into_iter().map(StagingProfile::from).collect();
        profiles.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(profiles)
    }

    async fn find_staging_repositories(
        &self,
        profile_id: &ProfileId,
        group_id: &str,
    ) -> Result<Vec<StagingRepository>, StagingError> {
        let url = self.api_url(&format!(
            "profile_repositories/{}",
            encode(profile_id.as_str())
        ));
        let response = self.send(|| self.request(Method::GET, &url)).await?;

        let envelope: DataEnvelope<Vec<RepositoryDto>> =
            self.read::<_, XmlRepositories>(response).await?;
        let mut repositories = envelope
            .data
            .into_iter()
            .map(|dto| {
                dto.into_repository().map_err(|message| StagingError::Decode {
                    url: url.clone(),
                    message,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        repositories.retain(|r| r.profile_name.as_deref() == Some(group_id));
        repositories.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(repositories)
    }

    async fn create_repository(
        &self,
        profile_id: &ProfileId,
        group_id: &str,
    ) -> Result<Option<RepositoryId>, StagingError> {
        if self.settings.dry_run {
            tracing::info!(
                "[dryrun] would create staging repository for {group_id} in profile {profile_id}"
            );
            return Ok(None);
        }

        let url = self.api_url(&format!("profiles/{}/start", encode(profile_id.as_str())));
        let description = self.description(group_id);
        let body = DataEnvelope {
            data: StartRequest {
                description: &description,
            },
        };

        let response = self
            .send_once(|| self.request(Method::POST, &url).json(&body))
            .await?;
        let started: DataEnvelope<StartedRepository> = self
            .read::<_, DataEnvelope<StartedRepository>>(response)
            .await?;

        let repository_id = RepositoryId::new(started.data.staged_repository_id);
        tracing::info!("created staging repository {repository_id}");
        Ok(Some(repository_id))
    }

    async fn close_repository(
        &self,
        profile_id: &ProfileId,
        repository_id: &RepositoryId,
        group_id: &str,
    ) -> Result<(), StagingError> {
        self.transition(Transition::Close, profile_id, repository_id, group_id)
            .await
    }

    async fn release_repository(
        &self,
        profile_id: &ProfileId,
        repository_id: &RepositoryId,
        group_id: &str,
    ) -> Result<(), StagingError> {
        self.transition(Transition::Release, profile_id, repository_id, group_id)
            .await
    }

    async fn drop_repository(
        &self,
        profile_id: &ProfileId,
        repository_id: &RepositoryId,
        group_id: &str,
    ) -> Result<(), StagingError> {
        self.transition(Transition::Drop, profile_id, repository_id, group_id)
            .await
    }

    async fn get_repository(
        &self,
        repository_id: &RepositoryId,
    ) -> Result<StagingRepository, StagingError> {
        let url = self.api_url(&format!("repository/{}", encode(repository_id.as_str())));

        let response = match self.send(|| self.request(Method::GET, &url)).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                tracing::debug!("staging repository {repository_id} not found");
                return Ok(StagingRepository::not_found(repository_id.clone()));
            }
            Err(e) => return Err(e),
        };

        let dto: RepositoryDto = self.read::<_, RepositoryDto>(response).await?;
        dto.into_repository()
            .map_err(|message| StagingError::Decode { url, message })
    }

    async fn deploy(
        &self,
        repository_id: Option<&RepositoryId>,
        deployable: &Deployable,
    ) -> Result<(), StagingError> {
        if self.settings.dry_run {
            let target = match repository_id {
                None if !deployable.is_snapshot() => self.pending_deploy_url(deployable),
                _ => self.deploy_url(repository_id, deployable),
            };
            tracing::info!("[dryrun] would upload {deployable} to {target}");
            return Ok(());
        }

        let target = self.deploy_url(repository_id, deployable);

        let content = tokio::fs::read(deployable.path())
            .await
            .map_err(|source| StagingError::Io {
                path: deployable.path().to_path_buf(),
                source,
            })?;
        let content = Bytes::from(content);

        tracing::info!("uploading {deployable} to {target}");
        self.send(|| {
            self.request(Method::PUT, &target)
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(content.clone())
        })
        .await?;
        Ok(())
    }

    async fn artifact_exists(
        &self,
        deployable: &Deployable,
        verify_url: Option<&str>,
    ) -> Result<bool, StagingError> {
        let Some(template) = verify_url else {
            return Ok(false);
        };
        let url = render_verify_url(template, deployable);

        match self.send(|| self.http.head(&url)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_activity(
        &self,
        repository_id: &RepositoryId,
    ) -> Result<Vec<StagingActivity>, StagingError> {
        let url = self.api_url(&format!(
            "repository/{}/activity",
            encode(repository_id.as_str())
        ));
        let response = self.send(|| self.request(Method::GET, &url)).await?;

        let activities: Vec<ActivityDto> = self.read::<_, XmlActivities>(response).await?;
        Ok(activities.into_iter().map(StagingActivity::from).collect())
    }
}

/// Expand `{{groupId}}`, `{{artifactId}}`, `{{version}}`, `{{path}}` and `{{filename}}`.
pub(crate) fn render_verify_url(template: &str, deployable: &Deployable) -> String {
    let coordinates = deployable.coordinates();
    template
        .replace("{{groupId}}", coordinates.group_id())
        .replace("{{artifactId}}", coordinates.artifact_id())
        .replace("{{version}}", coordinates.version())
        .replace("{{path}}", &deployable.deploy_path())
        .replace("{{filename}}", deployable.filename())
}

async fn failure_reason(status: StatusCode, response: Response) -> String {
    let canonical = status.canonical_reason().unwrap_or("unexpected status");
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
        return canonical.to_string();
    }

    let snippet: String = body.chars().take(MAX_REASON_LEN).collect();
    format!("{canonical}: {snippet}")
}
