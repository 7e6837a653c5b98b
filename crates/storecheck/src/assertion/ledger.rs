//! Assertion Ledger
//!
//! Buffers soft-assertion failures for one scenario so a run reports every
//! violated expectation at once, while hard assertions still stop the
//! scenario at the first failure.
//!
//! A ledger belongs to exactly one scenario attempt. It is never flushed
//! implicitly: the scenario context calls
//! [`AssertionLedger::verify_soft_assertions`] at teardown.

use super::{AssertionMode, AssertionOutcome};
use crate::result::{CheckError, CheckResult};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct LedgerState {
    failures: Vec<String>,
    assertion_count: usize,
    failed_count: usize,
}

/// Per-scenario collector of soft-assertion failures
#[derive(Debug, Default)]
pub struct AssertionLedger {
    scenario: String,
    state: Mutex<LedgerState>,
}

/// Summary of assertion results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionSummary {
    /// Total assertions checked
    pub total: usize,
    /// Assertions that passed
    pub passed: usize,
    /// Assertions that failed (hard and soft)
    pub failed: usize,
}

impl AssertionLedger {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty ledger labelled with its scenario name
    #[must_use]
    pub fn for_scenario(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            state: Mutex::default(),
        }
    }

    /// Scenario this ledger belongs to
    #[must_use]
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        // A panic while holding the lock leaves plain data behind; keep using it.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Fail immediately when `condition` is false
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::AssertionFailed`] carrying `message`.
    pub fn hard_assert(&self, condition: bool, message: &str) -> CheckResult<()> {
        let mut state = self.lock();
        state.assertion_count += 1;
        if condition {
            return Ok(());
        }
        state.failed_count += 1;
        drop(state);
        tracing::debug!(scenario = %self.scenario, %message, "hard assertion failed");
        Err(CheckError::assertion(message))
    }

    /// Record `message` when `condition` is false and keep going
    pub fn soft_assert(&self, condition: bool, message: &str) {
        let mut state = self.lock();
        state.assertion_count += 1;
        if !condition {
            state.failed_count += 1;
            state.failures.push(message.to_string());
            tracing::debug!(scenario = %self.scenario, %message, "soft assertion recorded");
        }
    }

    /// Route an outcome by mode
    ///
    /// # Errors
    ///
    /// Returns an error only for a failing outcome in [`AssertionMode::Hard`].
    pub fn check(&self, mode: AssertionMode, outcome: AssertionOutcome) -> CheckResult<()> {
        match mode {
            AssertionMode::Hard => self.hard_assert(outcome.passed, &outcome.message),
            AssertionMode::Soft => {
                self.soft_assert(outcome.passed, &outcome.message);
                Ok(())
            }
        }
    }

    /// Raise every buffered soft failure as one error and empty the buffer
    ///
    /// The buffer is drained under the same lock that reads it, so no caller
    /// can observe messages that were already reported.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::SoftAssertions`] with the messages in recording
    /// order when any soft assertion failed since the last flush.
    pub fn verify_soft_assertions(&self) -> CheckResult<()> {
        let failures = std::mem::take(&mut self.lock().failures);
        if failures.is_empty() {
            return Ok(());
        }
        tracing::info!(
            scenario = %self.scenario,
            count = failures.len(),
            "flushing soft assertion failures"
        );
        Err(CheckError::SoftAssertions { failures })
    }

    /// Messages buffered since the last flush
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        self.lock().failures.clone()
    }

    /// Number of buffered soft failures
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().failures.len()
    }

    /// Total number of assertions checked
    #[must_use]
    pub fn assertion_count(&self) -> usize {
        self.lock().assertion_count
    }

    /// Get a summary of every assertion routed through this ledger
    #[must_use]
    pub fn summary(&self) -> AssertionSummary {
        let state = self.lock();
        AssertionSummary {
            total: state.assertion_count,
            passed: state.assertion_count - state.failed_count,
            failed: state.failed_count,
        }
    }
}

impl Drop for AssertionLedger {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if !state.failures.is_empty() {
            tracing::warn!(
                scenario = %self.scenario,
                lost = ?state.failures,
                "ledger dropped with unverified soft assertion failures"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod hard {
        use super::*;

        #[test]
        fn test_hard_assert_pass_is_silent() {
            let ledger = AssertionLedger::new();
            assert!(ledger.hard_assert(true, "never shown").is_ok());
            assert_eq!(ledger.pending(), 0);
            assert_eq!(ledger.assertion_count(), 1);
        }

        #[test]
        fn test_hard_assert_fail_carries_message() {
            let ledger = AssertionLedger::new();
            let err = ledger
                .hard_assert(false, "Expected title: Products, but got: Login.")
                .unwrap_err();
            assert_eq!(err.to_string(), "Expected title: Products, but got: Login.");
        }

        #[test]
        fn test_hard_failure_does_not_buffer() {
            let ledger = AssertionLedger::new();
            let _ = ledger.hard_assert(false, "boom");
            assert_eq!(ledger.pending(), 0);
            assert!(ledger.verify_soft_assertions().is_ok());
        }
    }

    mod soft {
        use super::*;

        #[test]
        fn test_soft_assert_never_fails_immediately() {
            let ledger = AssertionLedger::new();
            ledger.soft_assert(false, "first");
            ledger.soft_assert(true, "passes");
            ledger.soft_assert(false, "second");
            assert_eq!(ledger.failures(), vec!["first", "second"]);
        }

        #[test]
        fn test_verify_aggregates_in_order_and_clears() {
            let ledger = AssertionLedger::for_scenario("UA_TC01");
            ledger.soft_assert(false, "a");
            ledger.soft_assert(false, "b");
            ledger.soft_assert(false, "c");

            match ledger.verify_soft_assertions().unwrap_err() {
                CheckError::SoftAssertions { failures } => {
                    assert_eq!(failures, vec!["a", "b", "c"]);
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(ledger.pending(), 0);
            assert!(ledger.verify_soft_assertions().is_ok());
        }

        #[test]
        fn test_verify_empty_is_noop() {
            let ledger = AssertionLedger::new();
            assert!(ledger.verify_soft_assertions().is_ok());
        }
    }

    mod routing {
        use super::*;

        #[test]
        fn test_check_hard_mode() {
            let ledger = AssertionLedger::new();
            assert!(ledger
                .check(AssertionMode::Hard, AssertionOutcome::fail("x"))
                .is_err());
        }

        #[test]
        fn test_check_soft_mode() {
            let ledger = AssertionLedger::new();
            assert!(ledger
                .check(AssertionMode::Soft, AssertionOutcome::fail("x"))
                .is_ok());
            assert_eq!(ledger.pending(), 1);
        }
    }

    #[test]
    fn test_summary_counts_hard_and_soft() {
        let ledger = AssertionLedger::new();
        ledger.soft_assert(true, "ok");
        ledger.soft_assert(false, "soft fail");
        let _ = ledger.hard_assert(false, "hard fail");
        let _ = ledger.hard_assert(true, "ok");

        let summary = ledger.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 2);
        let _ = ledger.verify_soft_assertions();
    }

    #[test]
    fn test_shared_between_threads() {
        let ledger = std::sync::Arc::new(AssertionLedger::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ledger = ledger.clone();
                std::thread::spawn(move || ledger.soft_assert(false, &format!("worker {i}")))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(ledger.pending(), 4);
        let _ = ledger.verify_soft_assertions();
    }
}
