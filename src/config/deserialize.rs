// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles coordinate strings and the non-empty artifact list.

use nonempty::NonEmpty;
use serde::Deserialize;

use super::ArtifactConfig;
use crate::types::Coordinates;

pub fn deserialize_coordinates<'de, D>(deserializer: D) -> Result<Coordinates, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Coordinates::parse(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_artifacts<'de, D>(deserializer: D) -> Result<NonEmpty<ArtifactConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<ArtifactConfig> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("at least one artifact is required"))
}
