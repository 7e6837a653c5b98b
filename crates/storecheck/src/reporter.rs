//! Reporter - Scenario Results and Suite Reports
//!
//! The runner produces one [`ScenarioResult`] per scenario and folds them
//! into a [`SuiteReport`], which renders a list summary for the terminal and
//! serializes to `report.json` in the output directory.
//!
//! ```text
//! ┌──────────────┐  attempts   ┌────────────────┐   render_list()
//! │ SuiteRunner  │ ──────────► │ ScenarioResult │ ─┐
//! └──────────────┘             └────────────────┘  │  write_json()
//!                                                  ▼
//!                                          ┌──────────────┐
//!                                          │ SuiteReport  │
//!                                          └──────────────┘
//! ```

use crate::result::CheckResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// File name of the JSON report inside the output directory
pub const REPORT_FILE: &str = "report.json";

/// Final status of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioStatus {
    /// Passed on the first attempt
    Passed,
    /// Every attempt failed
    Failed,
    /// The last attempt exceeded the scenario timeout
    TimedOut,
    /// Failed at least once, then passed on a retry
    Flaky,
}

impl ScenarioStatus {
    /// Passed or flaky
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Passed | Self::Flaky)
    }

    /// Marker shown by the list renderer
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Passed => "✓",
            Self::Failed => "✘",
            Self::TimedOut => "⏱",
            Self::Flaky => "~",
        }
    }
}

impl std::fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::TimedOut => "timed out",
            Self::Flaky => "flaky",
        };
        f.write_str(name)
    }
}

/// Outcome of one scenario across all its attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// Scenario tags
    pub tags: Vec<String>,
    /// Final status
    pub status: ScenarioStatus,
    /// Attempts made (1 when no retry was needed)
    pub attempts: u32,
    /// Wall time across every attempt, in milliseconds
    pub duration_ms: u64,
    /// Error of the last failing attempt
    pub error: Option<String>,
    /// Screenshots and traces written for this scenario
    pub artifacts: Vec<PathBuf>,
}

impl ScenarioResult {
    /// Create a result with no error or artifacts
    #[must_use]
    pub fn new(name: impl Into<String>, status: ScenarioStatus, attempts: u32, duration: Duration) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            status,
            attempts,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            error: None,
            artifacts: Vec::new(),
        }
    }

    /// Attach the failure text
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attach tags
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Attach artifact paths
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: Vec<PathBuf>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Wall time as a [`Duration`]
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Aggregated results of one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// Suite name
    pub suite: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Wall time of the whole run, in milliseconds
    pub duration_ms: u64,
    /// Per-scenario results in suite order
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    /// Create a report for results gathered since `started_at`
    #[must_use]
    pub fn new(suite: impl Into<String>, started_at: DateTime<Utc>, duration: Duration, results: Vec<ScenarioResult>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            suite: suite.into(),
            started_at,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            results,
        }
    }

    fn count(&self, status: ScenarioStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Scenarios that passed first time
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(ScenarioStatus::Passed)
    }

    /// Scenarios that failed every attempt
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(ScenarioStatus::Failed)
    }

    /// Scenarios that ran out of time
    #[must_use]
    pub fn timed_out_count(&self) -> usize {
        self.count(ScenarioStatus::TimedOut)
    }

    /// Scenarios that passed on a retry
    #[must_use]
    pub fn flaky_count(&self) -> usize {
        self.count(ScenarioStatus::Flaky)
    }

    /// Total scenarios
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// No failed or timed-out scenario
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.status.is_ok())
    }

    /// Results that did not pass
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results.iter().filter(|r| !r.status.is_ok()).collect()
    }

    /// Result for scenario `name`
    #[must_use]
    pub fn result(&self, name: &str) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {} passed, {} failed, {} timed out, {} flaky ({} total, {:.1}s)",
            self.suite,
            self.passed_count(),
            self.failed_count(),
            self.timed_out_count(),
            self.flaky_count(),
            self.total_count(),
            Duration::from_millis(self.duration_ms).as_secs_f64()
        )
    }

    /// Plain-text list of every scenario, failures with their errors
    #[must_use]
    pub fn render_list(&self) -> String {
        let mut out = String::new();
        for result in &self.results {
            let retry = if result.attempts > 1 {
                format!(" [attempt {}]", result.attempts)
            } else {
                String::new()
            };
            let _ = writeln!(
                out,
                "  {}  {} ({}ms){retry}",
                result.status.symbol(),
                result.name,
                result.duration_ms
            );
        }
        for (index, failure) in self.failures().iter().enumerate() {
            let _ = writeln!(out, "\n  {}) {} ({})", index + 1, failure.name, failure.status);
            if let Some(error) = &failure.error {
                for line in error.lines() {
                    let _ = writeln!(out, "     {line}");
                }
            }
            for artifact in &failure.artifacts {
                let _ = writeln!(out, "     artifact: {}", artifact.display());
            }
        }
        let _ = writeln!(out, "\n  {}", self.summary());
        out
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Json`](crate::CheckError::Json) if serialization fails.
    pub fn to_json(&self) -> CheckResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write [`REPORT_FILE`] into `dir`, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Io`](crate::CheckError::Io) when the directory
    /// or file cannot be written.
    pub fn write_json(&self, dir: &Path) -> CheckResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE);
        std::fs::write(&path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "report written");
        Ok(path)
    }

    /// Read a report written by [`write_json`](Self::write_json)
    ///
    /// # Errors
    ///
    /// Returns an I/O or JSON error.
    pub fn read_json(path: &Path) -> CheckResult<Self> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }
}
