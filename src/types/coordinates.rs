// ABOUTME: Maven-style artifact coordinates with validation.
// ABOUTME: Parses group:artifact:version[:classifier][@extension] and derives deploy paths.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";
const DEFAULT_EXTENSION: &str = "jar";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinatesError {
    #[error("coordinates cannot be empty")]
    Empty,

    #[error("expected group:artifact:version[:classifier][@extension], got '{0}'")]
    Malformed(String),

    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("invalid character '{ch}' in {field}")]
    InvalidChar { field: &'static str, ch: char },

    #[error("group id '{0}' has an empty segment")]
    EmptyGroupSegment(String),
}

/// Coordinates of one published artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinates {
    group_id: String,
    artifact_id: String,
    version: String,
    classifier: Option<String>,
    extension: String,
}

impl Coordinates {
    pub fn new(
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Result<Self, CoordinatesError> {
        validate("group id", group_id)?;
        if group_id.split('.').any(str::is_empty) {
            return Err(CoordinatesError::EmptyGroupSegment(group_id.to_string()));
        }
        validate("artifact id", artifact_id)?;
        validate("version", version)?;

        Ok(Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            classifier: None,
            extension: DEFAULT_EXTENSION.to_string(),
        })
    }

    pub fn with_classifier(mut self, classifier: &str) -> Result<Self, CoordinatesError> {
        validate("classifier", classifier)?;
        self.classifier = Some(classifier.to_string());
        Ok(self)
    }

    pub fn with_extension(mut self, extension: &str) -> Result<Self, CoordinatesError> {
        validate("extension", extension)?;
        self.extension = extension.to_string();
        Ok(self)
    }

    /// Parse `group:artifact:version[:classifier][@extension]`.
    pub fn parse(value: &str) -> Result<Self, CoordinatesError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(CoordinatesError::Empty);
        }

        let (gav, extension) = match value.split_once('@') {
            Some((gav, ext)) => (gav, Some(ext)),
            None => (value, None),
        };

        let parts: Vec<&str> = gav.split(':').collect();
        let mut coordinates = match parts.as_slice() {
            [group, artifact, version] => Self::new(group, artifact, version)?,
            [group, artifact, version, classifier] => {
                Self::new(group, artifact, version)?.with_classifier(classifier)?
            }
            _ => return Err(CoordinatesError::Malformed(value.to_string())),
        };

        if let Some(ext) = extension {
            coordinates = coordinates.with_extension(ext)?;
        }

        Ok(coordinates)
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Snapshot versions are published outside of staging repositories.
    pub fn is_snapshot(&self) -> bool {
        self.version.ends_with(SNAPSHOT_SUFFIX)
    }

    /// Remote directory for this artifact, e.g. `com/example/lib/1.0.0`.
    pub fn deploy_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version
        )
    }
}

impl FromStr for Coordinates {
    type Err = CoordinatesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        if self.extension != DEFAULT_EXTENSION {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}

fn validate(field: &'static str, value: &str) -> Result<(), CoordinatesError> {
    if value.is_empty() {
        return Err(CoordinatesError::EmptyField { field });
    }
    match value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
    {
        Some(ch) => Err(CoordinatesError::InvalidChar { field, ch }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_path_expands_group() {
        let c = Coordinates::new("org.acme.tools", "widget", "2.1.0").unwrap();
        assert_eq!(c.deploy_path(), "org/acme/tools/widget/2.1.0");
    }

    #[test]
    fn snapshot_detection_uses_suffix() {
        assert!(Coordinates::parse("a.b:c:1.0-SNAPSHOT").unwrap().is_snapshot());
        assert!(!Coordinates::parse("a.b:c:1.0").unwrap().is_snapshot());
        assert!(!Coordinates::parse("a.b:c:1.0-snapshot").unwrap().is_snapshot());
    }

    #[test]
    fn display_omits_default_extension() {
        let c = Coordinates::parse("a.b:c:1.0:sources").unwrap();
        assert_eq!(c.to_string(), "a.b:c:1.0:sources");

        let pom = Coordinates::parse("a.b:c:1.0@pom").unwrap();
        assert_eq!(pom.to_string(), "a.b:c:1.0@pom");
    }
}
