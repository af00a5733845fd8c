// ABOUTME: Diagnostics accumulator for non-fatal warnings during a staging run.
// ABOUTME: Warnings are logged when recorded and reported back with the run result.

use serde::Serialize;

/// Collects non-fatal warnings during a deployment run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A non-fatal warning collected during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn artifact_exists(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ArtifactExists, message)
    }

    pub fn probe_failed(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ProbeFailed, message)
    }

    pub fn dry_run_absence(message: impl Into<String>) -> Self {
        Self::new(WarningKind::DryRunAbsence, message)
    }

    pub fn best_effort_close(message: impl Into<String>) -> Self {
        Self::new(WarningKind::BestEffortClose, message)
    }

    pub fn snapshot_skipped(message: impl Into<String>) -> Self {
        Self::new(WarningKind::SnapshotSkipped, message)
    }

    fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Artifact is already published at the verify url.
    ArtifactExists,
    /// Existence probe could not be answered.
    ProbeFailed,
    /// Dry-run found no profile or repository to work on.
    DryRunAbsence,
    /// Close before release failed and was ignored.
    BestEffortClose,
    /// Snapshot deployment is disabled for this deployer.
    SnapshotSkipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings_in_order() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::artifact_exists("lib-1.0.jar already published"));
        diag.warn(Warning::best_effort_close("close rejected"));

        let kinds: Vec<_> = diag.warnings().iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![WarningKind::ArtifactExists, WarningKind::BestEffortClose]
        );
    }

    #[test]
    fn warnings_serialize_with_snake_case_kind() {
        let json = serde_json::to_string(&Warning::dry_run_absence("no profile")).unwrap();
        assert_eq!(json, r#"{"kind":"dry_run_absence","message":"no profile"}"#);
    }
}
