// ABOUTME: Status command implementation.
// ABOUTME: Reports the state of the recorded, given, or most recent staging repository.

use std::path::Path;

use stagehand::config::{Config, DeployerConfig};
use stagehand::deploy::{DeployError, ResumeState, resolve_failure_messages};
use stagehand::error::Result;
use stagehand::output::Output;
use stagehand::staging::{RepositoryState, StagingClient, StagingOps, Transition};
use stagehand::types::RepositoryId;

pub async fn status(
    dir: &Path,
    name: &str,
    repository_id: Option<String>,
    output: Output,
) -> Result<()> {
    let config = Config::discover(dir)?;
    let deployer_config = config.deployer(name)?;
    let client = StagingClient::new(deployer_config.staging_settings(false)?)?;

    let group_id = deployer_config
        .group_id
        .clone()
        .unwrap_or_else(|| config.default_group_id().to_string());

    let recorded = ResumeState::load_or_default(dir)
        .get(name)
        .and_then(|record| record.repository_id.clone());

    let repository_id = match repository_id.map(RepositoryId::new).or(recorded) {
        Some(id) => id,
        None => most_recent(&client, deployer_config, &group_id).await?,
    };

    let repository = client.get_repository(&repository_id).await?;

    let mut line = format!("{}: {}", repository.repository_id, repository.state);
    if repository.transitioning {
        line.push_str(" (transitioning)");
    }
    output.success(&line);

    if repository.state == RepositoryState::Open {
        let failures =
            resolve_failure_messages(&client, &repository_id, Transition::Close.activity()).await;
        for failure in failures {
            output.progress(&format!("  close failure: {failure}"));
        }
    }

    Ok(())
}

async fn most_recent(
    client: &StagingClient,
    deployer_config: &DeployerConfig,
    group_id: &str,
) -> Result<RepositoryId> {
    let profile_id = match &deployer_config.staging_profile_id {
        Some(id) => id.clone(),
        None => client
            .find_staging_profiles(group_id)
            .await?
            .into_iter()
            .next()
            .map(|profile| profile.id)
            .ok_or_else(|| DeployError::ProfileNotFound {
                group_id: group_id.to_string(),
            })?,
    };

    let repository = client
        .find_staging_repositories(&profile_id, group_id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DeployError::RepositoryNotFound {
            group_id: group_id.to_string(),
        })?;

    Ok(repository.repository_id)
}
