//! Assertions for scenario validation.
//!
//! Every check produces an [`AssertionOutcome`] and hands it to the
//! scenario's [`AssertionLedger`], which either fails immediately (hard) or
//! buffers the message until [`AssertionLedger::verify_soft_assertions`].

pub mod api;
pub mod ledger;
pub mod order;
pub mod schema;
pub mod ui;

pub use api::ApiAssertions;
pub use ledger::{AssertionLedger, AssertionSummary};
pub use order::{is_sorted, SortOrder};
pub use schema::{validate_schema, SchemaViolation};
pub use ui::UiAssertions;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a single check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionOutcome {
    /// Whether the check passed
    pub passed: bool,
    /// Message reported on failure
    pub message: String,
}

impl AssertionOutcome {
    /// Build an outcome from a predicate and its failure message
    #[must_use]
    pub fn new(passed: bool, message: impl Into<String>) -> Self {
        Self {
            passed,
            message: message.into(),
        }
    }

    /// Create a passing outcome
    #[must_use]
    pub fn pass() -> Self {
        Self::new(true, String::new())
    }

    /// Create a failing outcome
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(false, message)
    }
}

/// How a failing check is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssertionMode {
    /// Fail the scenario immediately (default)
    #[default]
    Hard,
    /// Record the failure and keep going
    Soft,
}

impl AssertionMode {
    /// Map the `is_soft` flag used by scenario code
    #[must_use]
    pub const fn from_soft(is_soft: bool) -> Self {
        if is_soft {
            Self::Soft
        } else {
            Self::Hard
        }
    }

    /// Check if soft
    #[must_use]
    pub const fn is_soft(self) -> bool {
        matches!(self, Self::Soft)
    }
}

/// Truthiness of an observed value, following the storefront's script semantics
pub trait Truthy {
    /// Whether the value counts as true
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for i64 {
    fn is_truthy(&self) -> bool {
        *self != 0
    }
}

impl Truthy for usize {
    fn is_truthy(&self) -> bool {
        *self != 0
    }
}

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::is_truthy)
    }
}

impl<T: Truthy + ?Sized> Truthy for &T {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

impl Truthy for Value {
    fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => n.as_f64().is_some_and(|f| f.is_truthy()),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) => true,
        }
    }
}

/// Render an observed value the way failure messages show it
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
