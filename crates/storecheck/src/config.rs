//! Suite and runner configuration.
//!
//! [`SuiteConfig`] describes the target deployment and its credentials and is
//! read from the process environment (a `.env` file in the working directory
//! is honored). [`RunnerConfig`] describes how scenarios execute and can be
//! loaded from YAML.

use crate::api::{ApiAuth, AuthKind};
use crate::engine::EngineConfig;
use crate::result::{CheckError, CheckResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Storefront used when `BASE_URL` is unset
pub const DEFAULT_BASE_URL: &str = "https://www.saucedemo.com/v1/index.html";

/// Default scenario timeout (30 seconds)
pub const DEFAULT_SCENARIO_TIMEOUT_MS: u64 = 30_000;

/// Default output directory for reports and artifacts
pub const DEFAULT_OUTPUT_DIR: &str = "storecheck-results";

const REDACTED: &str = "***";

// =============================================================================
// SUITE CONFIG
// =============================================================================

/// Target deployment and credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Storefront URL; relative navigation resolves against it
    pub base_url: String,
    /// API base URL override (`API_BASE_URL`); unset follows `base_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    /// Standard user name (`STANDARDUSER`)
    pub username: String,
    /// Shared password (`PASSWORD`)
    pub password: String,
    /// Locked-out user name (`LOCKEDOUTUSER`)
    pub locked_user: String,
    /// Credentials for API requests
    pub api_auth: ApiAuth,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_base_url: None,
            username: String::new(),
            password: String::new(),
            locked_user: String::new(),
            api_auth: ApiAuth::None,
        }
    }
}

impl SuiteConfig {
    /// Read the configuration from the environment and `.env`
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::UnsupportedConfig`] for an unknown `API_AUTH`
    /// kind, or [`CheckError::Config`] when its credentials are missing.
    pub fn from_env() -> CheckResult<Self> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CheckResult<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let base_url = var("BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_base_url = var("API_BASE_URL");
        let kind = var("API_AUTH").as_deref().unwrap_or("none").parse::<AuthKind>()?;
        let secret = match kind {
            AuthKind::Bearer => var("API_TOKEN"),
            AuthKind::None | AuthKind::Basic => var("API_PASSWORD"),
        };
        let api_auth = ApiAuth::from_kind(kind, var("API_USERNAME"), secret)?;

        Ok(Self {
            base_url,
            api_base_url,
            username: var("STANDARDUSER").unwrap_or_default(),
            password: var("PASSWORD").unwrap_or_default(),
            locked_user: var("LOCKEDOUTUSER").unwrap_or_default(),
            api_auth,
        })
    }

    /// Base URL for API scenarios
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(&self.base_url)
    }

    /// Override the storefront URL
    ///
    /// API scenarios follow it unless an API base URL was set explicitly.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the API base URL
    #[must_use]
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = Some(api_base_url.into());
        self
    }

    /// Set the user credentials
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        locked_user: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self.locked_user = locked_user.into();
        self
    }

    /// Copy with every secret masked, for printing
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.password.is_empty() {
            copy.password = REDACTED.to_string();
        }
        copy.api_auth = match copy.api_auth {
            ApiAuth::None => ApiAuth::None,
            ApiAuth::Basic { username, .. } => ApiAuth::Basic {
                username,
                password: REDACTED.to_string(),
            },
            ApiAuth::Bearer { .. } => ApiAuth::Bearer {
                token: REDACTED.to_string(),
            },
        };
        copy
    }
}

// =============================================================================
// ARTIFACT POLICY
// =============================================================================

/// When an artifact is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactPolicy {
    /// Keep for every attempt
    On,
    /// Never capture
    #[default]
    Off,
    /// Capture every attempt, keep only failing ones
    RetainOnFailure,
    /// Capture only when an attempt fails
    OnlyOnFailure,
}

impl ArtifactPolicy {
    /// Whether an attempt with this outcome keeps the artifact
    #[must_use]
    pub const fn keeps(self, failed: bool) -> bool {
        match self {
            Self::On => true,
            Self::Off => false,
            Self::RetainOnFailure | Self::OnlyOnFailure => failed,
        }
    }

    /// Name used in config files and flags
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::RetainOnFailure => "retain-on-failure",
            Self::OnlyOnFailure => "only-on-failure",
        }
    }
}

impl FromStr for ArtifactPolicy {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "retain-on-failure" => Ok(Self::RetainOnFailure),
            "only-on-failure" => Ok(Self::OnlyOnFailure),
            other => Err(CheckError::UnsupportedConfig {
                setting: "artifact policy",
                value: other.to_string(),
                expected: "on, off, retain-on-failure, only-on-failure",
            }),
        }
    }
}

impl std::fmt::Display for ArtifactPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// RUNNER CONFIG
// =============================================================================

/// How the suite executes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Scenarios running at once
    pub workers: usize,
    /// Extra attempts for a failing scenario
    pub retries: u32,
    /// Time budget of one attempt in milliseconds
    pub scenario_timeout_ms: u64,
    /// Browser launch settings
    pub browser: EngineConfig,
    /// Per-scenario trace file
    pub trace: ArtifactPolicy,
    /// Screenshot at the end of an attempt
    pub screenshot: ArtifactPolicy,
    /// Screen recording
    pub video: ArtifactPolicy,
    /// Where reports and artifacts go
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            retries: 1,
            scenario_timeout_ms: DEFAULT_SCENARIO_TIMEOUT_MS,
            browser: EngineConfig::default(),
            trace: ArtifactPolicy::On,
            screenshot: ArtifactPolicy::OnlyOnFailure,
            video: ArtifactPolicy::Off,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl RunnerConfig {
    /// Parse a YAML document; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Yaml`] for malformed YAML or unknown policy
    /// names, and [`CheckError::Config`] when the values are invalid.
    pub fn from_yaml_str(yaml: &str) -> CheckResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Io`] when the file cannot be read, otherwise as
    /// [`from_yaml_str`](Self::from_yaml_str).
    pub fn from_yaml_file(path: impl AsRef<Path>) -> CheckResult<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loaded runner config");
        Self::from_yaml_str(&yaml)
    }

    /// Render as YAML
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Yaml`] if serialization fails.
    pub fn to_yaml(&self) -> CheckResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check the values are usable
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Config`] for zero workers or a zero timeout.
    pub fn validate(&self) -> CheckResult<()> {
        if self.workers == 0 {
            return Err(CheckError::config("workers must be at least 1"));
        }
        if self.scenario_timeout_ms == 0 {
            return Err(CheckError::config("scenario_timeout_ms must be positive"));
        }
        Ok(())
    }

    /// Set worker count
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set retry count
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the per-attempt timeout
    #[must_use]
    pub const fn with_scenario_timeout(mut self, timeout_ms: u64) -> Self {
        self.scenario_timeout_ms = timeout_ms;
        self
    }

    /// Set the screenshot policy
    #[must_use]
    pub const fn with_screenshot(mut self, policy: ArtifactPolicy) -> Self {
        self.screenshot = policy;
        self
    }

    /// Set the trace policy
    #[must_use]
    pub const fn with_trace(mut self, policy: ArtifactPolicy) -> Self {
        self.trace = policy;
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}
