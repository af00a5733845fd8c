// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

use crate::deploy::DeployReport;
use crate::diagnostics::Warning;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a non-fatal warning (suppressed in quiet mode).
    pub fn warning(&self, warning: &Warning) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {}", warning.message),
            OutputMode::Quiet => {}
            OutputMode::Json => emit_stderr(&WarningEvent {
                event: "warning",
                warning,
            }),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => emit_stdout(&JsonEvent {
                event: "success",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print the result of a deployment run.
    pub fn report(&self, report: &DeployReport) {
        match self.mode {
            OutputMode::Normal => {
                for artifact in &report.uploaded {
                    println!("  uploaded {artifact}");
                }
                if let Some(id) = &report.repository_id {
                    println!("  staging repository: {id}");
                }
                let prefix = if report.dry_run { "[dryrun] " } else { "" };
                let summary = if report.skipped {
                    format!("{prefix}{}: skipped ({})", report.deployer, report.operation)
                } else {
                    format!("{prefix}{}: {} complete", report.deployer, report.operation)
                };
                self.success(&summary);
            }
            OutputMode::Quiet => {
                if let Some(id) = &report.repository_id {
                    println!("{id}");
                }
            }
            OutputMode::Json => emit_stdout(&ReportEvent {
                event: "report",
                report,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => emit_stderr(&JsonEvent {
                event: "error",
                message,
                duration_secs: self.duration(),
            }),
        }
    }
}

fn emit_stdout<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

fn emit_stderr<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        eprintln!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct WarningEvent<'a> {
    event: &'a str,
    #[serde(flatten)]
    warning: &'a Warning,
}

#[derive(Serialize)]
struct ReportEvent<'a> {
    event: &'a str,
    #[serde(flatten)]
    report: &'a DeployReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
