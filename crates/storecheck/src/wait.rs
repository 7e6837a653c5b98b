//! Wait Mechanisms
//!
//! Polling-based synchronization for element conditions. Every wait has a
//! finite timeout and fails with [`CheckError::Timeout`] naming the selector,
//! the awaited condition and the timeout.

use crate::result::{CheckError, CheckResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Timeout used by visibility probes (1 second)
pub const VISIBILITY_PROBE_TIMEOUT_MS: u64 = 1_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// ELEMENT STATE
// =============================================================================

/// Element states that can be awaited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    /// Present in the DOM
    Attached,
    /// Present and rendered
    Visible,
    /// Absent or not rendered
    Hidden,
    /// Absent from the DOM
    Detached,
}

impl ElementState {
    /// Condition phrase used in timeout messages
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Attached => "to be attached",
            Self::Visible => "to be visible",
            Self::Hidden => "to be hidden",
            Self::Detached => "to be detached",
        }
    }
}

impl std::fmt::Display for ElementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Attached => "attached",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Detached => "detached",
        };
        f.write_str(name)
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `probe` until it yields `true` or the timeout elapses
///
/// The probe always runs at least once, so a condition that already holds
/// succeeds even with a zero timeout. Probe errors propagate immediately.
///
/// # Errors
///
/// Returns [`CheckError::Timeout`] with `condition` when the deadline passes,
/// or the first error the probe returns.
pub async fn poll_until<F, Fut>(
    condition: impl Into<String>,
    options: WaitOptions,
    mut probe: F,
) -> CheckResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CheckResult<bool>>,
{
    let deadline = Instant::now() + options.timeout();
    loop {
        if probe().await? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            let condition = condition.into();
            tracing::debug!(%condition, ms = options.timeout_ms, "wait timed out");
            return Err(CheckError::Timeout {
                condition,
                ms: options.timeout_ms,
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mod options {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = WaitOptions::default();
            assert_eq!(options.timeout_ms, 5_000);
            assert_eq!(options.poll_interval(), Duration::from_millis(50));
        }

        #[test]
        fn test_builder() {
            let options = WaitOptions::new().with_timeout(1_000).with_poll_interval(10);
            assert_eq!(options.timeout(), Duration::from_secs(1));
            assert_eq!(options.poll_interval_ms, 10);
        }
    }

    mod polling {
        use super::*;

        #[tokio::test]
        async fn test_immediate_success() {
            let result = poll_until("ready", WaitOptions::new().with_timeout(0), || async {
                Ok(true)
            })
            .await;
            assert!(result.is_ok());
        }

        #[tokio::test]
        async fn test_eventual_success() {
            let counter = AtomicUsize::new(0);
            let calls = &counter;
            let options = WaitOptions::new().with_timeout(1_000).with_poll_interval(5);
            poll_until("third probe", options, move || async move {
                Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2)
            })
            .await
            .unwrap();
            assert_eq!(counter.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn test_timeout_names_condition() {
            let options = WaitOptions::new().with_timeout(30).with_poll_interval(5);
            let err = poll_until("'#spinner' to be hidden", options, || async { Ok(false) })
                .await
                .unwrap_err();
            assert!(err.is_timeout());
            assert!(err.to_string().contains("'#spinner' to be hidden"));
            assert!(err.to_string().contains("30ms"));
        }

        #[tokio::test]
        async fn test_probe_error_propagates() {
            let err = poll_until("anything", WaitOptions::new(), || async {
                Err::<bool, _>(CheckError::engine("page crashed"))
            })
            .await
            .unwrap_err();
            assert!(matches!(err, CheckError::Engine { .. }));
        }
    }

    #[test]
    fn test_state_descriptions() {
        assert_eq!(ElementState::Visible.describe(), "to be visible");
        assert_eq!(ElementState::Detached.to_string(), "detached");
    }
}
