//! Suite Runner
//!
//! Executes a [`Suite`] of named scenarios on a bounded number of concurrent
//! workers. Each attempt gets a fresh engine and [`ScenarioContext`]; nothing
//! is shared between attempts.
//!
//! Per attempt the runner:
//!
//! 1. creates an engine through the [`EngineFactory`]
//! 2. runs the body under the scenario timeout
//! 3. flushes the ledger (soft failures fail the attempt)
//! 4. writes screenshot and trace artifacts per policy
//! 5. closes the engine
//!
//! Scenarios marked [`without_browser`](Scenario::without_browser) skip the
//! factory and get a blank in-process page, so API checks never launch a
//! browser.
//!
//! A failing scenario is retried up to `retries` times; a later pass is
//! reported as [`ScenarioStatus::Flaky`].

use crate::config::{RunnerConfig, SuiteConfig};
use crate::engine::BrowserEngine;
use crate::fixture::{EngineFactory, ScenarioContext};
use crate::mock::MockEngine;
use crate::reporter::{ScenarioResult, ScenarioStatus, SuiteReport};
use crate::result::{CheckError, CheckResult};
use chrono::Utc;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Subdirectory of the output directory holding screenshots and traces
pub const ARTIFACT_DIR: &str = "artifacts";

type ScenarioBody = Arc<dyn Fn(ScenarioContext) -> BoxFuture<'static, CheckResult<()>> + Send + Sync>;

/// A named, tagged scenario body
#[derive(Clone)]
pub struct Scenario {
    name: String,
    tags: Vec<String>,
    browser: bool,
    body: ScenarioBody,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("browser", &self.browser)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// Create a scenario from an async body
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(ScenarioContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CheckResult<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            tags: Vec::new(),
            browser: true,
            body: Arc::new(move |ctx| Box::pin(body(ctx))),
        }
    }

    /// Run without launching a browser
    #[must_use]
    pub const fn without_browser(mut self) -> Self {
        self.browser = false;
        self
    }

    /// Whether attempts need an engine from the factory
    #[must_use]
    pub const fn needs_browser(&self) -> bool {
        self.browser
    }

    /// Add a tag such as `ui` or `api`
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Scenario name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scenario tags
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Whether the scenario carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Ordered collection of scenarios
#[derive(Debug, Clone, Default)]
pub struct Suite {
    name: String,
    scenarios: Vec<Scenario>,
}

impl Suite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
        }
    }

    /// Append a scenario
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Append a scenario in place
    pub fn add(&mut self, scenario: Scenario) {
        self.scenarios.push(scenario);
    }

    /// Suite name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scenarios in registration order
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Scenario names in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.scenarios.iter().map(Scenario::name).collect()
    }

    /// Number of scenarios
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the suite has no scenarios
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Keep scenarios whose name contains `pattern` (case-insensitive) and
    /// that carry `tag`
    #[must_use]
    pub fn filter(&self, pattern: Option<&str>, tag: Option<&str>) -> Self {
        let pattern = pattern.map(str::to_lowercase);
        let scenarios = self
            .scenarios
            .iter()
            .filter(|s| {
                pattern
                    .as_deref()
                    .map_or(true, |p| s.name.to_lowercase().contains(p))
            })
            .filter(|s| tag.map_or(true, |t| s.has_tag(t)))
            .cloned()
            .collect();
        Self {
            name: self.name.clone(),
            scenarios,
        }
    }
}

/// Trace artifact written per attempt
#[derive(Debug, Serialize)]
struct AttemptTrace<'a> {
    scenario: &'a str,
    attempt: u32,
    passed: bool,
    timed_out: bool,
    error: Option<String>,
    assertions: crate::assertion::AssertionSummary,
    duration_ms: u64,
}

struct Attempt {
    outcome: CheckResult<()>,
    timed_out: bool,
    artifacts: Vec<PathBuf>,
}

impl Attempt {
    fn aborted(error: CheckError) -> Self {
        Self {
            outcome: Err(error),
            timed_out: false,
            artifacts: Vec::new(),
        }
    }
}

/// Runs suites with retries, timeouts and artifacts
pub struct SuiteRunner {
    config: RunnerConfig,
    suite_config: Arc<SuiteConfig>,
    factory: Arc<dyn EngineFactory>,
}

impl std::fmt::Debug for SuiteRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteRunner")
            .field("config", &self.config)
            .field("suite_config", &self.suite_config.redacted())
            .finish_non_exhaustive()
    }
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

impl SuiteRunner {
    /// Create a runner
    #[must_use]
    pub fn new(config: RunnerConfig, suite_config: SuiteConfig, factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            config,
            suite_config: Arc::new(suite_config),
            factory,
        }
    }

    /// Runner settings
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every scenario of `suite`
    ///
    /// Scenario failures are reported in the result, never returned as
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Config`] for an invalid runner configuration.
    pub async fn run(&self, suite: &Suite) -> CheckResult<SuiteReport> {
        self.config.validate()?;
        if self.config.video.keeps(true) {
            tracing::warn!(policy = %self.config.video, "video capture is not supported; ignoring policy");
        }
        tracing::info!(
            suite = suite.name(),
            scenarios = suite.len(),
            workers = self.config.workers,
            retries = self.config.retries,
            "suite started"
        );

        let started_at = Utc::now();
        let clock = Instant::now();
        let mut indexed: Vec<(usize, ScenarioResult)> = stream::iter(suite.scenarios().iter().enumerate())
            .map(|(index, scenario)| async move { (index, self.run_scenario(scenario).await) })
            .buffer_unordered(self.config.workers)
            .collect()
            .await;
        indexed.sort_by_key(|(index, _)| *index);
        let results = indexed.into_iter().map(|(_, result)| result).collect();

        let report = SuiteReport::new(suite.name(), started_at, clock.elapsed(), results);
        tracing::info!(summary = %report.summary(), "suite finished");
        Ok(report)
    }

    /// Run one scenario with retries
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let clock = Instant::now();
        let max_attempts = self.config.retries.saturating_add(1);
        let mut artifacts = Vec::new();
        let mut attempt_no = 0;

        let last = loop {
            attempt_no += 1;
            tracing::info!(scenario = scenario.name(), attempt = attempt_no, "scenario started");
            let attempt = self.run_attempt(scenario, attempt_no).await;
            artifacts.extend(attempt.artifacts.iter().cloned());
            match &attempt.outcome {
                Ok(()) => break attempt,
                Err(e) if attempt_no < max_attempts => {
                    tracing::warn!(scenario = scenario.name(), attempt = attempt_no, error = %e, "scenario failed, retrying");
                }
                Err(_) => break attempt,
            }
        };

        let status = match &last.outcome {
            Ok(()) if attempt_no > 1 => ScenarioStatus::Flaky,
            Ok(()) => ScenarioStatus::Passed,
            Err(_) if last.timed_out => ScenarioStatus::TimedOut,
            Err(_) => ScenarioStatus::Failed,
        };
        tracing::info!(scenario = scenario.name(), %status, attempts = attempt_no, "scenario finished");

        let mut result = ScenarioResult::new(scenario.name(), status, attempt_no, clock.elapsed())
            .with_tags(scenario.tags().to_vec())
            .with_artifacts(artifacts);
        if let Err(e) = last.outcome {
            result = result.with_error(e.to_string());
        }
        result
    }

    async fn run_attempt(&self, scenario: &Scenario, attempt: u32) -> Attempt {
        let engine: Arc<dyn BrowserEngine> = if scenario.needs_browser() {
            match self.factory.create().await {
                Ok(engine) => engine,
                Err(e) => return Attempt::aborted(e),
            }
        } else {
            Arc::new(MockEngine::new())
        };
        let ctx = match ScenarioContext::new(scenario.name(), engine.clone(), self.suite_config.clone()) {
            Ok(ctx) => ctx,
            Err(e) => {
                close_engine(&engine, scenario.name()).await;
                return Attempt::aborted(e);
            }
        };

        let clock = Instant::now();
        let timeout = Duration::from_millis(self.config.scenario_timeout_ms);
        let body = (scenario.body)(ctx.clone());
        let result = tokio::time::timeout(timeout, body).await;
        let timed_out = result.is_err();
        let outcome = match result {
            Ok(Ok(())) => ctx.finish(),
            Ok(Err(e)) => Err(merge_pending(e, &ctx)),
            Err(_) => {
                let error = CheckError::ScenarioTimeout {
                    scenario: scenario.name().to_string(),
                    ms: self.config.scenario_timeout_ms,
                };
                Err(merge_pending(error, &ctx))
            }
        };
        let elapsed = clock.elapsed();

        let failed = outcome.is_err();
        let stem = format!("{}-attempt{attempt}", slug(scenario.name()));
        let mut artifacts = Vec::new();
        if scenario.needs_browser() && self.config.screenshot.keeps(failed) {
            if let Some(path) = self.save_screenshot(&engine, &stem).await {
                artifacts.push(path);
            }
        }
        if self.config.trace.keeps(failed) {
            let trace = AttemptTrace {
                scenario: scenario.name(),
                attempt,
                passed: !failed,
                timed_out,
                error: outcome.as_ref().err().map(ToString::to_string),
                assertions: ctx.ledger().summary(),
                duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            };
            if let Some(path) = self.save_trace(&trace, &stem).await {
                artifacts.push(path);
            }
        }
        close_engine(&engine, scenario.name()).await;

        Attempt {
            outcome,
            timed_out,
            artifacts,
        }
    }

    fn artifact_dir(&self) -> PathBuf {
        self.config.output_dir.join(ARTIFACT_DIR)
    }

    async fn save_screenshot(&self, engine: &Arc<dyn BrowserEngine>, stem: &str) -> Option<PathBuf> {
        let path = self.artifact_dir().join(format!("{stem}.png"));
        let written: CheckResult<()> = async {
            let png = engine.screenshot().await?;
            tokio::fs::create_dir_all(self.artifact_dir()).await?;
            tokio::fs::write(&path, png).await?;
            Ok(())
        }
        .await;
        match written {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "screenshot not saved");
                None
            }
        }
    }

    async fn save_trace(&self, trace: &AttemptTrace<'_>, stem: &str) -> Option<PathBuf> {
        let path = self.artifact_dir().join(format!("{stem}.trace.json"));
        let written: CheckResult<()> = async {
            let json = serde_json::to_vec_pretty(trace)?;
            tokio::fs::create_dir_all(self.artifact_dir()).await?;
            tokio::fs::write(&path, json).await?;
            Ok(())
        }
        .await;
        match written {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "trace not saved");
                None
            }
        }
    }
}

/// Attach soft failures still buffered when the body stopped to `error`
fn merge_pending(error: CheckError, ctx: &ScenarioContext) -> CheckError {
    match ctx.finish() {
        Err(CheckError::SoftAssertions { failures }) => CheckError::WithSoftFailures {
            source: Box::new(error),
            failures,
        },
        _ => error,
    }
}

async fn close_engine(engine: &Arc<dyn BrowserEngine>, scenario: &str) {
    if let Err(e) = engine.close().await {
        tracing::warn!(scenario, error = %e, "engine did not close cleanly");
    }
}
