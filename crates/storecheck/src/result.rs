//! Result and error types for storecheck.

use thiserror::Error;

/// Result type for storecheck operations
pub type CheckResult<T> = Result<T, CheckError>;

/// Errors that can occur while driving or checking the storefront
#[derive(Debug, Error)]
pub enum CheckError {
    /// Hard assertion failed
    #[error("{message}")]
    AssertionFailed {
        /// Failure message with expected and actual values
        message: String,
    },

    /// One or more soft assertions failed and were flushed together
    #[error("Soft Assertion Failures:\n{}", failures.join("\n"))]
    SoftAssertions {
        /// Buffered failure messages in recording order
        failures: Vec<String>,
    },

    /// A scenario stopped on `source` while soft failures were still buffered
    #[error("{source}\nSoft Assertion Failures:\n{}", failures.join("\n"))]
    WithSoftFailures {
        /// Error that stopped the scenario
        source: Box<CheckError>,
        /// Soft failures recorded before it, in recording order
        failures: Vec<String>,
    },

    /// A wait or interaction did not observe its condition in time
    #[error("Timed out after {ms}ms waiting for {condition}")]
    Timeout {
        /// Selector and condition that was awaited
        condition: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A whole scenario exceeded its time budget
    #[error("Scenario '{scenario}' exceeded timeout of {ms}ms")]
    ScenarioTimeout {
        /// Scenario name
        scenario: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Resource used before it was initialized
    #[error("{resource} used before initialization: call {init} first")]
    Uninitialized {
        /// Resource name
        resource: &'static str,
        /// Initializer the caller skipped
        init: &'static str,
    },

    /// Enum-like argument with an unknown value
    #[error("Unsupported {setting}: '{value}' (expected one of: {expected})")]
    UnsupportedConfig {
        /// Setting name
        setting: &'static str,
        /// Rejected value
        value: String,
        /// Accepted values
        expected: &'static str,
    },

    /// Observed value had the wrong kind for the requested check
    #[error("Type mismatch in {check}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Check that rejected the value
        check: &'static str,
        /// Accepted kinds
        expected: &'static str,
        /// Observed value
        actual: String,
    },

    /// Browser engine error
    #[error("Engine error: {message}")]
    Engine {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Dialog subscription was dropped before a dialog arrived
    #[error("Dialog error: {message}")]
    Dialog {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl CheckError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create an engine error
    #[must_use]
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// The error that stopped the scenario, looking through buffered soft
    /// failures
    #[must_use]
    pub fn primary(&self) -> &Self {
        match self {
            Self::WithSoftFailures { source, .. } => source.primary(),
            other => other,
        }
    }

    /// True for element/condition wait timeouts
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.primary(), Self::Timeout { .. })
    }

    /// True for hard or aggregated soft assertion failures
    #[must_use]
    pub fn is_assertion(&self) -> bool {
        matches!(
            self.primary(),
            Self::AssertionFailed { .. } | Self::SoftAssertions { .. }
        )
    }
}
