// ABOUTME: Deploy and drop command implementations.
// ABOUTME: Builds the run request, drives the deployer, and records ids for resumption.

use std::path::Path;
use tokio_util::sync::CancellationToken;

use stagehand::config::{Config, RunOverrides};
use stagehand::deploy::{Deployer, ResumeRecord, ResumeState};
use stagehand::error::Result;
use stagehand::output::Output;
use stagehand::staging::StagingClient;

/// What to run and how.
pub struct RunOptions {
    pub name: String,
    pub overrides: RunOverrides,
    /// Fill missing ids from the previous run's record.
    pub resume: bool,
}

/// Run a deploy (stage range) or drop for the named deployer.
pub async fn deploy(
    dir: &Path,
    options: RunOptions,
    cancel: CancellationToken,
    mut output: Output,
) -> Result<()> {
    output.start_timer();

    let RunOptions {
        name,
        mut overrides,
        resume,
    } = options;

    let config = Config::discover(dir)?;
    let deployer_config = config.deployer(&name)?;
    let mut state = if resume {
        let state = ResumeState::load(dir)?;
        apply_resume(&state, &name, &mut overrides, &output);
        state
    } else {
        ResumeState::load_or_default(dir)
    };

    let deployables = config.deployables(dir)?;
    let request =
        deployer_config.request(&name, config.default_group_id(), deployables, &overrides)?;
    let client = StagingClient::new(deployer_config.staging_settings(overrides.dry_run)?)?;

    output.progress(&format!(
        "Running {} for '{}' ({} artifacts)",
        request.operation()?,
        name,
        request.deployables.len()
    ));

    let mut deployer = Deployer::new(&client, request).with_cancellation(cancel);
    let result = deployer.deploy().await;

    for warning in deployer.warnings() {
        output.warning(warning);
    }

    let (profile_id, repository_id) = deployer.resume_ids();
    let record = ResumeRecord::new(profile_id.cloned(), repository_id.cloned());
    if !overrides.dry_run && !record.is_empty() {
        state.record(name.as_str(), record);
        if let Err(e) = state.save(dir) {
            tracing::warn!("could not save resume state: {e}");
        }
    }

    let report = result?;
    output.report(&report);
    Ok(())
}

/// Take ids from the last recorded run unless given explicitly.
fn apply_resume(state: &ResumeState, name: &str, overrides: &mut RunOverrides, output: &Output) {
    let Some(record) = state.get(name) else {
        output.progress(&format!("No previous run recorded for '{name}', starting fresh"));
        return;
    };

    if overrides.profile_id.is_none() {
        overrides.profile_id = record.profile_id.clone();
    }
    if overrides.repository_id.is_none() {
        overrides.repository_id = record.repository_id.clone();
    }

    output.progress(&format!(
        "Resuming '{name}' from run on {} at {}",
        record.host,
        record.recorded_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
}
