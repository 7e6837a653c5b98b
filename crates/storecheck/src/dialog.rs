//! Dialog Handling
//!
//! Browser dialogs (alert, confirm, prompt, beforeunload) are routed through a
//! [`DialogHub`]. Scenario code registers a single-use [`DialogSubscription`]
//! for the *next* dialog; the engine dispatches each opened dialog to the
//! oldest live subscription, which consumes it. Dialogs that arrive with no
//! live subscription are dismissed so the page never blocks.

use crate::result::{CheckError, CheckResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

/// Type of browser dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogType {
    /// Alert dialog (OK button only)
    Alert,
    /// Confirm dialog (OK/Cancel buttons)
    Confirm,
    /// Prompt dialog (text input + OK/Cancel)
    Prompt,
    /// Before unload dialog (Leave/Stay buttons)
    BeforeUnload,
}

impl std::fmt::Display for DialogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alert => write!(f, "alert"),
            Self::Confirm => write!(f, "confirm"),
            Self::Prompt => write!(f, "prompt"),
            Self::BeforeUnload => write!(f, "beforeunload"),
        }
    }
}

/// Action taken on a dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogAction {
    /// Dialog was accepted (OK/Yes/Leave)
    Accept,
    /// Dialog was accepted with input text (for prompts)
    AcceptWith(String),
    /// Dialog was dismissed (Cancel/No/Stay)
    Dismiss,
    /// Dialog is pending (not yet handled)
    Pending,
}

impl DialogAction {
    /// Whether the engine should answer with OK
    #[must_use]
    pub const fn accepts(&self) -> bool {
        matches!(self, Self::Accept | Self::AcceptWith(_))
    }

    /// Prompt text to send back, if any
    #[must_use]
    pub fn prompt_text(&self) -> Option<&str> {
        match self {
            Self::AcceptWith(text) => Some(text),
            _ => None,
        }
    }
}

/// Represents a browser dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    dialog_type: DialogType,
    message: String,
    default_value: Option<String>,
    action: DialogAction,
}

impl Dialog {
    /// Create a new dialog
    #[must_use]
    pub fn new(dialog_type: DialogType, message: impl Into<String>) -> Self {
        Self {
            dialog_type,
            message: message.into(),
            default_value: None,
            action: DialogAction::Pending,
        }
    }

    /// Create an alert dialog
    #[must_use]
    pub fn alert(message: impl Into<String>) -> Self {
        Self::new(DialogType::Alert, message)
    }

    /// Create a confirm dialog
    #[must_use]
    pub fn confirm(message: impl Into<String>) -> Self {
        Self::new(DialogType::Confirm, message)
    }

    /// Create a prompt dialog
    #[must_use]
    pub fn prompt(message: impl Into<String>, default: Option<String>) -> Self {
        let mut dialog = Self::new(DialogType::Prompt, message);
        dialog.default_value = default;
        dialog
    }

    /// Get dialog type
    #[must_use]
    pub const fn dialog_type(&self) -> DialogType {
        self.dialog_type
    }

    /// Get dialog message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get default value (for prompts)
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// Get action taken
    #[must_use]
    pub const fn action(&self) -> &DialogAction {
        &self.action
    }

    /// Check if dialog was handled
    #[must_use]
    pub const fn is_handled(&self) -> bool {
        !matches!(self.action, DialogAction::Pending)
    }

    fn apply(&mut self, policy: &DialogPolicy) {
        self.action = match policy {
            DialogPolicy::Accept => DialogAction::Accept,
            DialogPolicy::AcceptWith(text) => DialogAction::AcceptWith(text.clone()),
            DialogPolicy::Dismiss => DialogAction::Dismiss,
        };
    }
}

/// How a subscription answers the dialog it receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogPolicy {
    /// Press OK
    Accept,
    /// Press OK with prompt text
    AcceptWith(String),
    /// Press Cancel
    Dismiss,
}

struct Waiter {
    policy: DialogPolicy,
    tx: oneshot::Sender<Dialog>,
}

/// Per-page dispatcher of opened dialogs to single-use subscriptions
#[derive(Default)]
pub struct DialogHub {
    waiters: Mutex<VecDeque<Waiter>>,
    history: Mutex<Vec<Dialog>>,
}

impl std::fmt::Debug for DialogHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogHub")
            .field("waiting", &self.waiting())
            .field("handled", &lock(&self.history).len())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DialogHub {
    /// Create an empty hub
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription for the next dialog
    #[must_use = "dropping the subscription cancels it"]
    pub fn subscribe(&self, policy: DialogPolicy) -> DialogSubscription {
        let (tx, rx) = oneshot::channel();
        lock(&self.waiters).push_back(Waiter { policy, tx });
        DialogSubscription { rx }
    }

    /// Number of live subscriptions
    #[must_use]
    pub fn waiting(&self) -> usize {
        lock(&self.waiters)
            .iter()
            .filter(|w| !w.tx.is_closed())
            .count()
    }

    /// Route an opened dialog and return it with the action to perform
    ///
    /// Cancelled subscriptions are discarded on the way. With no live
    /// subscription the dialog is dismissed.
    pub fn dispatch(&self, mut dialog: Dialog) -> Dialog {
        let mut waiters = lock(&self.waiters);
        let mut delivered = false;
        while let Some(waiter) = waiters.pop_front() {
            if waiter.tx.is_closed() {
                continue;
            }
            dialog.apply(&waiter.policy);
            if waiter.tx.send(dialog.clone()).is_ok() {
                delivered = true;
                break;
            }
        }
        drop(waiters);

        if !delivered {
            dialog.apply(&DialogPolicy::Dismiss);
            tracing::debug!(
                kind = %dialog.dialog_type(),
                message = dialog.message(),
                "no dialog subscription, dismissing"
            );
        }
        lock(&self.history).push(dialog.clone());
        dialog
    }

    /// Every dialog dispatched so far, with the action taken
    #[must_use]
    pub fn history(&self) -> Vec<Dialog> {
        lock(&self.history).clone()
    }
}

/// Single-use handle for the next dialog
///
/// Dropping the handle (or calling [`cancel`](Self::cancel)) withdraws it; a
/// withdrawn subscription never receives a dialog.
#[derive(Debug)]
#[must_use = "dropping the subscription cancels it"]
pub struct DialogSubscription {
    rx: oneshot::Receiver<Dialog>,
}

impl DialogSubscription {
    /// Wait for the dialog this subscription consumed
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] when no dialog opens within
    /// `timeout_ms`, or [`CheckError::Dialog`] when the page went away first.
    pub async fn handled(self, timeout_ms: u64) -> CheckResult<Dialog> {
        match tokio::time::timeout(Duration::from_millis(timeout_ms), self.rx).await {
            Ok(Ok(dialog)) => Ok(dialog),
            Ok(Err(_)) => Err(CheckError::Dialog {
                message: "page closed before a dialog opened".to_string(),
            }),
            Err(_) => Err(CheckError::Timeout {
                condition: "a dialog to open".to_string(),
                ms: timeout_ms,
            }),
        }
    }

    /// Wait for the dialog and return its message
    ///
    /// # Errors
    ///
    /// See [`handled`](Self::handled).
    pub async fn message(self, timeout_ms: u64) -> CheckResult<String> {
        Ok(self.handled(timeout_ms).await?.message)
    }

    /// Withdraw the subscription
    pub fn cancel(mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod dialog {
        use super::*;

        #[test]
        fn test_new_is_pending() {
            let dialog = Dialog::new(DialogType::Alert, "Hello");
            assert_eq!(dialog.dialog_type(), DialogType::Alert);
            assert_eq!(dialog.message(), "Hello");
            assert!(!dialog.is_handled());
        }

        #[test]
        fn test_prompt_default() {
            let dialog = Dialog::prompt("Enter name:", Some("default".to_string()));
            assert_eq!(dialog.dialog_type(), DialogType::Prompt);
            assert_eq!(dialog.default_value(), Some("default"));
        }

        #[test]
        fn test_action_helpers() {
            assert!(DialogAction::Accept.accepts());
            assert!(!DialogAction::Dismiss.accepts());
            assert_eq!(
                DialogAction::AcceptWith("John".to_string()).prompt_text(),
                Some("John")
            );
        }
    }

    mod hub {
        use super::*;

        #[tokio::test]
        async fn test_subscription_receives_next_dialog() {
            let hub = DialogHub::new();
            let sub = hub.subscribe(DialogPolicy::Accept);
            let answered = hub.dispatch(Dialog::alert("Saved"));
            assert_eq!(answered.action(), &DialogAction::Accept);

            let dialog = sub.handled(100).await.unwrap();
            assert_eq!(dialog.message(), "Saved");
        }

        #[tokio::test]
        async fn test_subscription_fires_once() {
            let hub = DialogHub::new();
            let sub = hub.subscribe(DialogPolicy::Accept);
            hub.dispatch(Dialog::confirm("first"));
            let second = hub.dispatch(Dialog::confirm("second"));

            assert_eq!(second.action(), &DialogAction::Dismiss);
            assert_eq!(sub.message(100).await.unwrap(), "first");
        }

        #[tokio::test]
        async fn test_cancelled_subscription_is_skipped() {
            let hub = DialogHub::new();
            hub.subscribe(DialogPolicy::Accept).cancel();
            let live = hub.subscribe(DialogPolicy::AcceptWith("Ada".to_string()));
            assert_eq!(hub.waiting(), 1);

            let answered = hub.dispatch(Dialog::prompt("Name?", None));
            assert_eq!(answered.action().prompt_text(), Some("Ada"));
            assert!(live.handled(100).await.is_ok());
        }

        #[test]
        fn test_unsubscribed_dialog_is_dismissed() {
            let hub = DialogHub::new();
            let answered = hub.dispatch(Dialog::alert("nobody listens"));
            assert_eq!(answered.action(), &DialogAction::Dismiss);
            assert_eq!(hub.history().len(), 1);
        }

        #[tokio::test]
        async fn test_wait_times_out() {
            let hub = DialogHub::new();
            let err = hub
                .subscribe(DialogPolicy::Dismiss)
                .handled(20)
                .await
                .unwrap_err();
            assert!(err.is_timeout());
        }

        #[tokio::test]
        async fn test_hub_dropped_reports_dialog_error() {
            let hub = DialogHub::new();
            let sub = hub.subscribe(DialogPolicy::Accept);
            drop(hub);
            let err = sub.handled(100).await.unwrap_err();
            assert!(matches!(err, CheckError::Dialog { .. }));
        }
    }
}
