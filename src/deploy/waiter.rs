// ABOUTME: Polls a staging repository until a submitted transition settles.
// ABOUTME: Distinguishes timeouts, wrong outcomes (with activity diagnostics) and cancellation.

use snafu::ResultExt;

use super::activity::resolve_failure_messages;
use super::error::{DeployError, StagingSnafu};
use crate::retry::{RetryOutcome, Retrier};
use crate::staging::{RepositoryState, StagingOps, StagingRepository, Transition};
use crate::types::RepositoryId;

/// Waits for repository transitions using a bounded poll.
pub struct Waiter<'a, S: ?Sized> {
    staging: &'a S,
    retrier: Retrier,
}

impl<'a, S> Waiter<'a, S>
where
    S: StagingOps + ?Sized,
{
    pub fn new(staging: &'a S, retrier: Retrier) -> Self {
        Self { staging, retrier }
    }

    /// Poll until the repository stops transitioning, then check that it
    /// ended in one of `acceptable`.
    ///
    /// # Errors
    ///
    /// - `TransitionTimeout` if it is still transitioning after the budget.
    /// - `WrongOutcome` if it settled elsewhere; carries activity failure messages.
    /// - `Cancelled` if the retrier's token fired between polls.
    pub async fn wait_for_state(
        &self,
        repository_id: &RepositoryId,
        transition: Transition,
        acceptable: &[RepositoryState],
    ) -> Result<StagingRepository, DeployError> {
        tracing::info!("waiting for {transition} of staging repository {repository_id}");

        let outcome = self
            .retrier
            .retry(
                transition.activity(),
                StagingRepository::is_settled,
                || async {
                    let repository = self
                        .staging
                        .get_repository(repository_id)
                        .await
                        .context(StagingSnafu {
                            operation: format!("reading staging repository {repository_id}"),
                        })?;
                    tracing::debug!(
                        state = %repository.state,
                        transitioning = repository.transitioning,
                        "polled staging repository {repository_id}"
                    );
                    Ok::<_, DeployError>(repository)
                },
            )
            .await?;

        let repository = match outcome {
            RetryOutcome::Settled { value, .. } => value,
            RetryOutcome::Exhausted { attempts, last } => {
                return Err(DeployError::TransitionTimeout {
                    repository_id: repository_id.clone(),
                    transition,
                    attempts,
                    last_state: last.state,
                });
            }
            RetryOutcome::Cancelled { last, .. } => {
                return Err(DeployError::Cancelled {
                    repository_id: repository_id.clone(),
                    transition,
                    last_state: last.map(|r| r.state),
                });
            }
        };

        if acceptable.contains(&repository.state) {
            tracing::info!(
                "{transition} of staging repository {repository_id} finished ({})",
                repository.state
            );
            return Ok(repository);
        }

        let failures =
            resolve_failure_messages(self.staging, repository_id, transition.activity()).await;

        Err(DeployError::WrongOutcome {
            repository_id: repository_id.clone(),
            transition,
            state: repository.state,
            expected: acceptable.to_vec(),
            failures,
        })
    }
}
