// ABOUTME: Wire representations of staging API payloads in both JSON and XML.
// ABOUTME: Decodes XML first when the response looks like XML, falling back to JSON.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::StagingError;
use super::model::{
    ActivityEvent, ActivityProperty, StagingActivity, StagingProfile, StagingRepository,
};
use crate::types::{ProfileId, RepositoryId};

/// Decode a response body into `J`.
///
/// The provider answers some endpoints with XML regardless of `Accept`, so
/// XML is attempted first whenever the content type or the body suggests it.
/// `X` is the XML shape and converts into the JSON shape `J`.
pub(crate) fn decode<J, X>(
    url: &str,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<J, StagingError>
where
    J: DeserializeOwned,
    X: DeserializeOwned + Into<J>,
{
    let text = String::from_utf8_lossy(body);
    let text = text.trim();

    let looks_like_xml =
        content_type.is_some_and(|ct| ct.contains("xml")) || text.starts_with('<');

    if looks_like_xml && !text.is_empty() {
        match quick_xml::de::from_str::<X>(text) {
            Ok(value) => return Ok(value.into()),
            Err(e) => tracing::debug!(url, error = %e, "XML decode failed, trying JSON"),
        }
    }

    serde_json::from_str::<J>(text).map_err(|e| StagingError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

// =============================================================================
// Envelopes and requests
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartRequest<'a> {
    pub description: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransitionRequest<'a> {
    pub staged_repository_id: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartedRepository {
    pub staged_repository_id: String,
}

// =============================================================================
// Profiles
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileDto {
    pub id: String,
    pub name: String,
}

impl From<ProfileDto> for StagingProfile {
    fn from(dto: ProfileDto) -> Self {
        StagingProfile {
            id: ProfileId::new(dto.id),
            name: dto.name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlProfiles {
    #[serde(default)]
    data: XmlProfileItems,
}

#[derive(Debug, Default, Deserialize)]
struct XmlProfileItems {
    #[serde(rename = "stagingProfile", default)]
    items: Vec<ProfileDto>,
}

impl From<XmlProfiles> for DataEnvelope<Vec<ProfileDto>> {
    fn from(xml: XmlProfiles) -> Self {
        DataEnvelope {
            data: xml.data.items,
        }
    }
}

// =============================================================================
// Repositories
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RepositoryDto {
    #[serde(default)]
    profile_id: Option<String>,
    #[serde(default)]
    profile_name: Option<String>,
    repository_id: String,
    #[serde(rename = "type")]
    state: String,
    #[serde(default)]
    transitioning: bool,
    #[serde(default)]
    updated_timestamp: Option<i64>,
}

impl RepositoryDto {
    pub fn into_repository(self) -> Result<StagingRepository, String> {
        let state = self.state.parse()?;
        Ok(StagingRepository {
            profile_id: self.profile_id.map(ProfileId::new),
            profile_name: self.profile_name,
            repository_id: RepositoryId::new(self.repository_id),
            state,
            transitioning: self.transitioning,
            updated_at: self
                .updated_timestamp
                .and_then(DateTime::<Utc>::from_timestamp_millis),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlRepositories {
    #[serde(default)]
    data: XmlRepositoryItems,
}

#[derive(Debug, Default, Deserialize)]
struct XmlRepositoryItems {
    #[serde(rename = "stagingProfileRepository", default)]
    items: Vec<RepositoryDto>,
}

impl From<XmlRepositories> for DataEnvelope<Vec<RepositoryDto>> {
    fn from(xml: XmlRepositories) -> Self {
        DataEnvelope {
            data: xml.data.items,
        }
    }
}

// =============================================================================
// Activity
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ActivityDto {
    name: String,
    #[serde(default)]
    events: Vec<EventDto>,
}

#[derive(Debug, Deserialize)]
struct EventDto {
    name: String,
    #[serde(default)]
    properties: Vec<PropertyDto>,
}

#[derive(Debug, Deserialize)]
struct PropertyDto {
    #[serde(alias = "key")]
    name: String,
    #[serde(default)]
    value: String,
}

impl From<ActivityDto> for StagingActivity {
    fn from(dto: ActivityDto) -> Self {
        StagingActivity {
            name: dto.name,
            events: dto
                .events
                .into_iter()
                .map(|e| ActivityEvent {
                    name: e.name,
                    properties: e
                        .properties
                        .into_iter()
                        .map(|p| ActivityProperty {
                            name: p.name,
                            value: p.value,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlActivities {
    #[serde(rename = "stagingActivity", default)]
    items: Vec<XmlActivity>,
}

#[derive(Debug, Deserialize)]
struct XmlActivity {
    name: String,
    #[serde(default)]
    events: XmlEvents,
}

#[derive(Debug, Default, Deserialize)]
struct XmlEvents {
    #[serde(rename = "stagingActivityEvent", default)]
    items: Vec<XmlEvent>,
}

#[derive(Debug, Deserialize)]
struct XmlEvent {
    name: String,
    #[serde(default)]
    properties: XmlProperties,
}

#[derive(Debug, Default, Deserialize)]
struct XmlProperties {
    #[serde(rename = "stagingProperty", default)]
    items: Vec<PropertyDto>,
}

impl From<XmlActivities> for Vec<ActivityDto> {
    fn from(xml: XmlActivities) -> Self {
        xml.items
            .into_iter()
            .map(|a| ActivityDto {
                name: a.name,
                events: a
                    .events
                    .items
                    .into_iter()
                    .map(|e| EventDto {
                        name: e.name,
                        properties: e.properties.items,
                    })
                    .collect(),
            })
            .collect()
    }
}
