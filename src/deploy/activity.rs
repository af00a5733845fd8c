// ABOUTME: Extracts human-readable failure messages from repository activity logs.
// ABOUTME: Used to explain why a close/release/drop did not reach the expected state.

use crate::staging::{StagingActivity, StagingOps};
use crate::types::RepositoryId;

const FAILURE_PROPERTIES: [&str; 2] = ["failureMessage", "cause"];

/// Fetch the activity log of `repository_id` and pull out failure messages
/// recorded under `activity`.
///
/// The log is supplementary: if it cannot be fetched the failure is logged
/// and an empty list is returned.
pub async fn resolve_failure_messages<S>(
    staging: &S,
    repository_id: &RepositoryId,
    activity: &str,
) -> Vec<String>
where
    S: StagingOps + ?Sized,
{
    match staging.list_activity(repository_id).await {
        Ok(activities) => failure_messages(&activities, activity),
        Err(e) => {
            tracing::warn!("could not fetch activity of staging repository {repository_id}: {e}");
            Vec::new()
        }
    }
}

/// Failure messages from events ending in `Failed` under activities named
/// `activity`, in log order with duplicates removed.
pub fn failure_messages(activities: &[StagingActivity], activity: &str) -> Vec<String> {
    let mut messages: Vec<String> = Vec::new();

    let events = activities
        .iter()
        .filter(|a| a.name.eq_ignore_ascii_case(activity))
        .flat_map(|a| &a.events)
        .filter(|e| e.name.ends_with("Failed"));

    for event in events {
        for property in &event.properties {
            if !FAILURE_PROPERTIES.contains(&property.name.as_str()) {
                continue;
            }
            let value = property.value.trim();
            if !value.is_empty() && !messages.iter().any(|m| m == value) {
                messages.push(value.to_string());
            }
        }
    }

    messages
}
