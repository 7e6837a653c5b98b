//! API Assertions
//!
//! Checks over [`ApiResponse`] values, routed to the scenario's ledger the
//! same way as [`UiAssertions`](super::UiAssertions).

use super::schema::validate_schema;
use super::{AssertionLedger, AssertionMode, AssertionOutcome, Truthy};
use crate::api::ApiResponse;
use crate::result::CheckResult;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// Assertion facade for API scenarios
#[derive(Debug, Clone)]
pub struct ApiAssertions {
    ledger: Arc<AssertionLedger>,
}

impl ApiAssertions {
    /// Create a facade recording into `ledger`
    #[must_use]
    pub const fn new(ledger: Arc<AssertionLedger>) -> Self {
        Self { ledger }
    }

    /// The ledger outcomes are routed to
    #[must_use]
    pub fn ledger(&self) -> &Arc<AssertionLedger> {
        &self.ledger
    }

    fn record(&self, mode: AssertionMode, passed: bool, message: String) -> CheckResult<()> {
        self.ledger.check(mode, AssertionOutcome::new(passed, message))
    }

    /// Assert the response status equals `expected`
    ///
    /// # Errors
    ///
    /// Hard-mode failure.
    pub fn assert_status(&self, response: &ApiResponse, expected: u16, mode: AssertionMode) -> CheckResult<()> {
        self.record(
            mode,
            response.status == expected,
            format!("Expected status code: {expected}, but got: {}.", response.status),
        )
    }

    /// Assert the top-level JSON object has `key`
    ///
    /// # Errors
    ///
    /// Hard-mode failure, or [`CheckError::Json`](crate::CheckError::Json)
    /// when the body is not JSON.
    pub fn assert_json_key_exists(&self, response: &ApiResponse, key: &str, mode: AssertionMode) -> CheckResult<()> {
        let body = response.json()?;
        let present = body.as_object().is_some_and(|object| object.contains_key(key));
        self.record(
            mode,
            present,
            format!("Expected key '{key}' to exist in the response JSON."),
        )
    }

    /// Assert the serialized body contains the serialized `value`
    ///
    /// This is a plain substring test over compact JSON, so `{"a":1}` also
    /// matches inside a larger object that happens to serialize it verbatim.
    ///
    /// # Errors
    ///
    /// Hard-mode failure, or a JSON error when the body is not JSON.
    pub fn assert_json_contains(&self, response: &ApiResponse, value: &Value, mode: AssertionMode) -> CheckResult<()> {
        let body = response.json()?.to_string();
        let needle = value.to_string();
        self.record(
            mode,
            body.contains(&needle),
            format!("Expected response body to contain value: {needle}."),
        )
    }

    /// Assert the body conforms to `schema`
    ///
    /// Each violation is logged at `error` level with its JSON pointer.
    ///
    /// # Errors
    ///
    /// Hard-mode failure, a JSON error when the body is not JSON, or
    /// [`CheckError::UnsupportedConfig`](crate::CheckError::UnsupportedConfig)
    /// for a malformed schema.
    pub fn assert_json_schema(&self, response: &ApiResponse, schema: &Value, mode: AssertionMode) -> CheckResult<()> {
        let body = response.json()?;
        let violations = validate_schema(&body, schema)?;
        for violation in &violations {
            tracing::error!(path = %violation.path, message = %violation.message, "JSON schema violation");
        }
        self.record(
            mode,
            violations.is_empty(),
            "Response body does not match the expected JSON schema.".to_string(),
        )
    }

    /// Assert the body parses as JSON
    ///
    /// # Errors
    ///
    /// Hard-mode failure.
    pub fn assert_valid_json(&self, response: &ApiResponse, mode: AssertionMode) -> CheckResult<()> {
        self.record(
            mode,
            response.json().is_ok(),
            "Response body is not a valid JSON.".to_string(),
        )
    }

    /// Assert a value is truthy
    ///
    /// # Errors
    ///
    /// Hard-mode failure.
    pub fn assert_truthy<T: Truthy + Debug>(&self, value: &T, mode: AssertionMode) -> CheckResult<()> {
        self.record(
            mode,
            value.is_truthy(),
            format!("Expected value to be truthy, but got: {value:?}."),
        )
    }

    /// Assert a value is falsy
    ///
    /// # Errors
    ///
    /// Hard-mode failure.
    pub fn assert_falsy<T: Truthy + Debug>(&self, value: &T, mode: AssertionMode) -> CheckResult<()> {
        self.record(
            mode,
            !value.is_truthy(),
            format!("Expected value to be falsey, but got: {value:?}."),
        )
    }
}
