// ABOUTME: Resume state recording the staging ids each deployer last worked on.
// ABOUTME: Persisted as JSON in .stagehand/state.json so a later run can pick up where one stopped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{ProfileId, RepositoryId};

/// State file location relative to the project directory.
pub const STATE_FILE: &str = ".stagehand/state.json";

/// Ids resolved by one run of a deployer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<ProfileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<RepositoryId>,
    /// When the run finished.
    pub recorded_at: DateTime<Utc>,
    /// Hostname of the machine that ran it.
    pub host: String,
}

impl ResumeRecord {
    pub fn new(profile_id: Option<ProfileId>, repository_id: Option<RepositoryId>) -> Self {
        Self {
            profile_id,
            repository_id,
            recorded_at: Utc::now(),
            host: gethostname::gethostname().to_string_lossy().into_owned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.profile_id.is_none() && self.repository_id.is_none()
    }
}

/// All resume records, keyed by deployer name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeState {
    #[serde(flatten)]
    records: BTreeMap<String, ResumeRecord>,
}

impl ResumeState {
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(STATE_FILE)
    }

    /// Load the state file under `dir`. A missing file is an empty state.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path(dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Like [`ResumeState::load`], but an unreadable or corrupt file is
    /// logged and treated as empty. It is overwritten on the next save.
    pub fn load_or_default(dir: &Path) -> Self {
        Self::load(dir).unwrap_or_else(|e| {
            tracing::warn!(
                "ignoring unreadable resume state {}: {e}",
                Self::path(dir).display()
            );
            Self::default()
        })
    }

    /// Write the state file under `dir`, replacing it atomically.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = Self::path(dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;

        tracing::debug!("wrote resume state to {}", path.display());
        Ok(())
    }

    pub fn get(&self, deployer: &str) -> Option<&ResumeRecord> {
        self.records.get(deployer)
    }

    /// Replace the record for `deployer`.
    pub fn record(&mut self, deployer: impl Into<String>, record: ResumeRecord) {
        self.records.insert(deployer.into(), record);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
