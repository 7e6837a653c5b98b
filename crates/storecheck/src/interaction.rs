//! Interaction Helper
//!
//! [`Interactions`] normalizes element interaction and wait primitives over a
//! [`BrowserEngine`], so page objects speak in locators and timeouts instead
//! of engine calls.
//!
//! Actions wait for their target first: clicks and typing need the element
//! visible, the rest need it attached. Waits default to
//! [`DEFAULT_WAIT_TIMEOUT_MS`] and fail with [`CheckError::Timeout`].

use crate::dialog::{DialogPolicy, DialogSubscription};
use crate::engine::{BrowserEngine, ClickOptions, SelectBy};
use crate::locator::Locator;
use crate::result::{CheckError, CheckResult};
use crate::wait::{ElementState, WaitOptions, DEFAULT_WAIT_TIMEOUT_MS, VISIBILITY_PROBE_TIMEOUT_MS};
use reqwest::Url;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Default pause between keystrokes for [`Interactions::type_with_delay`]
pub const DEFAULT_TYPE_DELAY_MS: u64 = 100;

/// Interaction and wait primitives bound to one page
#[derive(Clone)]
pub struct Interactions {
    engine: Arc<dyn BrowserEngine>,
    base_url: Option<String>,
    default_timeout_ms: u64,
}

impl std::fmt::Debug for Interactions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interactions")
            .field("base_url", &self.base_url)
            .field("default_timeout_ms", &self.default_timeout_ms)
            .finish_non_exhaustive()
    }
}

impl Interactions {
    /// Create a helper over `engine`
    #[must_use]
    pub fn new(engine: Arc<dyn BrowserEngine>) -> Self {
        Self {
            engine,
            base_url: None,
            default_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }

    /// Resolve relative navigation against `base_url`
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the default wait timeout
    #[must_use]
    pub const fn with_default_timeout(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    /// The underlying engine
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn BrowserEngine> {
        &self.engine
    }

    /// Default wait timeout in milliseconds
    #[must_use]
    pub const fn default_timeout_ms(&self) -> u64 {
        self.default_timeout_ms
    }

    fn options(&self, timeout_ms: Option<u64>) -> WaitOptions {
        WaitOptions::new().with_timeout(timeout_ms.unwrap_or(self.default_timeout_ms))
    }

    async fn wait_state(&self, locator: &Locator, state: ElementState, timeout_ms: Option<u64>) -> CheckResult<()> {
        self.engine
            .wait_for(locator.selector(), state, self.options(timeout_ms))
            .await
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Resolve `path` against the base URL
    ///
    /// Absolute URLs pass through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Config`] when `path` is relative and there is no
    /// usable base URL.
    pub fn resolve_url(&self, path: &str) -> CheckResult<String> {
        if let Ok(absolute) = Url::parse(path) {
            return Ok(absolute.to_string());
        }
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| CheckError::config(format!("relative URL '{path}' without a base URL")))?;
        let base = Url::parse(base).map_err(|e| CheckError::config(format!("invalid base URL '{base}': {e}")))?;
        base.join(path)
            .map(|url| url.to_string())
            .map_err(|e| CheckError::config(format!("cannot resolve '{path}': {e}")))
    }

    /// Navigate to an absolute URL or a path relative to the base URL
    ///
    /// # Errors
    ///
    /// Propagates URL resolution and engine navigation errors.
    pub async fn navigate(&self, path: &str) -> CheckResult<()> {
        let url = self.resolve_url(path)?;
        tracing::debug!(%url, "navigate");
        self.engine.navigate(&url).await
    }

    /// Current page URL
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub async fn current_url(&self) -> CheckResult<String> {
        self.engine.current_url().await
    }

    /// Current page title
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub async fn title(&self) -> CheckResult<String> {
        self.engine.title().await
    }

    // =========================================================================
    // POINTER
    // =========================================================================

    /// Click an element once it is visible
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] if the element never becomes visible.
    pub async fn click(&self, locator: &Locator) -> CheckResult<()> {
        self.click_with(locator, ClickOptions::default()).await
    }

    async fn click_with(&self, locator: &Locator, options: ClickOptions) -> CheckResult<()> {
        self.wait_state(locator, ElementState::Visible, None).await?;
        tracing::debug!(selector = %locator, button = ?options.button, count = options.click_count, "click");
        self.engine.click(locator.selector(), options).await
    }

    /// Click and wait for the navigation it triggers
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] if the element is not clickable or no
    /// navigation completes within the default timeout.
    pub async fn click_and_wait_for_navigation(&self, locator: &Locator) -> CheckResult<()> {
        self.click(locator).await?;
        self.engine.wait_for_navigation(self.default_timeout_ms).await
    }

    /// Double-click an element
    ///
    /// # Errors
    ///
    /// See [`click`](Self::click).
    pub async fn double_click(&self, locator: &Locator) -> CheckResult<()> {
        self.click_with(locator, ClickOptions::double()).await
    }

    /// Right-click an element
    ///
    /// # Errors
    ///
    /// See [`click`](Self::click).
    pub async fn right_click(&self, locator: &Locator) -> CheckResult<()> {
        self.click_with(locator, ClickOptions::right()).await
    }

    /// Hover over an element
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] if the element never becomes visible.
    pub async fn hover(&self, locator: &Locator) -> CheckResult<()> {
        self.wait_state(locator, ElementState::Visible, None).await?;
        self.engine.hover(locator.selector()).await
    }

    /// Scroll the window vertically by `distance` pixels
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub async fn scroll_by(&self, distance: i64) -> CheckResult<()> {
        self.engine.scroll_by(0, distance).await
    }

    /// Scroll an element into view
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] if the element never attaches.
    pub async fn scroll_into_view(&self, locator: &Locator) -> CheckResult<()> {
        self.wait_state(locator, ElementState::Attached, None).await?;
        self.engine.scroll_into_view(locator.selector()).await
    }

    // =========================================================================
    // TEXT INPUT
    // =========================================================================

    /// Replace an input's value
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] if the input never becomes visible.
    pub async fn fill(&self, locator: &Locator, text: &str) -> CheckResult<()> {
        self.wait_state(locator, ElementState::Visible, None).await?;
        tracing::debug!(selector = %locator, "fill");
        self.engine.fill(locator.selector(), text).await
    }

    /// Clear an input, then fill it
    ///
    /// # Errors
    ///
    /// See [`fill`](Self::fill).
    pub async fn clear_and_fill(&self, locator: &Locator, text: &str) -> CheckResult<()> {
        self.fill(locator, "").await?;
        self.engine.fill(locator.selector(), text).await
    }

    /// Clear an input, then type `text` key by key
    ///
    /// `delay_ms` defaults to [`DEFAULT_TYPE_DELAY_MS`].
    ///
    /// # Errors
    ///
    /// See [`fill`](Self::fill).
    pub async fn type_with_delay(&self, locator: &Locator, text: &str, delay_ms: Option<u64>) -> CheckResult<()> {
        self.fill(locator, "").await?;
        let delay = Duration::from_millis(delay_ms.unwrap_or(DEFAULT_TYPE_DELAY_MS));
        self.engine.type_text(locator.selector(), text, delay).await
    }

    /// Press a key on the focused element
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub async fn press_key(&self, key: &str) -> CheckResult<()> {
        self.engine.press_key(key).await
    }

    /// Press several keys together, e.g. `["Control", "A"]`
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub async fn press_key_combination(&self, keys: &[&str]) -> CheckResult<()> {
        self.engine.press_key(&keys.join("+")).await
    }

    // =========================================================================
    // FORMS
    // =========================================================================

    /// Choose an option of a `<select>`
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] if the select never becomes visible,
    /// or an engine error if no option matches.
    pub async fn select_option(&self, locator: &Locator, choice: SelectBy) -> CheckResult<()> {
        self.wait_state(locator, ElementState::Visible, None).await?;
        tracing::debug!(selector = %locator, %choice, "select option");
        self.engine.select_option(locator.selector(), &choice).await
    }

    /// Choose an option by its `value`
    ///
    /// # Errors
    ///
    /// See [`select_option`](Self::select_option).
    pub async fn select_by_value(&self, locator: &Locator, value: &str) -> CheckResult<()> {
        self.select_option(locator, SelectBy::Value(value.to_string())).await
    }

    /// Choose an option by position
    ///
    /// # Errors
    ///
    /// See [`select_option`](Self::select_option).
    pub async fn select_by_index(&self, locator: &Locator, index: usize) -> CheckResult<()> {
        self.select_option(locator, SelectBy::Index(index)).await
    }

    /// Choose an option by its visible label
    ///
    /// # Errors
    ///
    /// See [`select_option`](Self::select_option).
    pub async fn select_by_label(&self, locator: &Locator, label: &str) -> CheckResult<()> {
        self.select_option(locator, SelectBy::Label(label.to_string())).await
    }

    /// Attach a file to an `<input type=file>`
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] if the input never attaches.
    pub async fn upload_file(&self, locator: &Locator, path: impl AsRef<Path>) -> CheckResult<()> {
        self.wait_state(locator, ElementState::Attached, None).await?;
        self.engine
            .set_input_files(locator.selector(), &[path.as_ref().to_path_buf()])
            .await
    }

    // =========================================================================
    // WAITS
    // =========================================================================

    /// Wait until the element is attached
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] naming the selector and timeout.
    pub async fn wait_for_element(&self, locator: &Locator, timeout_ms: Option<u64>) -> CheckResult<()> {
        self.wait_state(locator, ElementState::Attached, timeout_ms).await
    }

    /// Wait until the element is visible
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] naming the selector and timeout.
    pub async fn wait_for_visibility(&self, locator: &Locator, timeout_ms: Option<u64>) -> CheckResult<()> {
        self.wait_state(locator, ElementState::Visible, timeout_ms).await
    }

    /// Wait until the element is hidden or gone
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] naming the selector and timeout.
    pub async fn wait_for_invisibility(&self, locator: &Locator, timeout_ms: Option<u64>) -> CheckResult<()> {
        self.wait_state(locator, ElementState::Hidden, timeout_ms).await
    }

    /// Wait until the element is attached and check its text contains `expected`
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] if the element never attaches, and
    /// [`CheckError::AssertionFailed`] stating both texts when it does not
    /// contain `expected`.
    pub async fn wait_for_text(&self, locator: &Locator, expected: &str, timeout_ms: Option<u64>) -> CheckResult<()> {
        self.wait_state(locator, ElementState::Attached, timeout_ms).await?;
        let actual = self.engine.text_content(locator.selector()).await?.unwrap_or_default();
        if actual.contains(expected) {
            Ok(())
        } else {
            Err(CheckError::assertion(format!(
                "Expected text of {locator} to contain: '{expected}', but got: '{actual}'."
            )))
        }
    }

    /// Probe visibility with a short timeout
    ///
    /// A timeout means "not visible" and yields `Ok(false)`; every other
    /// failure propagates.
    ///
    /// # Errors
    ///
    /// Propagates non-timeout engine errors.
    pub async fn is_element_visible(&self, locator: &Locator) -> CheckResult<bool> {
        match self
            .wait_state(locator, ElementState::Visible, Some(VISIBILITY_PROBE_TIMEOUT_MS))
            .await
        {
            Ok(()) => Ok(true),
            Err(e) if e.is_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Text content of the element, `None` when absent
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub async fn get_text(&self, locator: &Locator) -> CheckResult<Option<String>> {
        self.engine.text_content(locator.selector()).await
    }

    /// Attribute of the element, `None` when the element or attribute is absent
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub async fn get_attribute(&self, locator: &Locator, name: &str) -> CheckResult<Option<String>> {
        if self.count(locator).await? == 0 {
            return Ok(None);
        }
        self.engine.get_attribute(locator.selector(), name).await
    }

    /// Number of matching elements
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub async fn count(&self, locator: &Locator) -> CheckResult<usize> {
        self.engine.count(locator.selector()).await
    }

    /// Immediate visibility check without waiting
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub async fn is_visible(&self, locator: &Locator) -> CheckResult<bool> {
        self.engine.is_visible(locator.selector()).await
    }

    /// Whether the element is checked
    ///
    /// # Errors
    ///
    /// Returns an engine error when nothing matches.
    pub async fn is_checked(&self, locator: &Locator) -> CheckResult<bool> {
        self.engine.is_checked(locator.selector()).await
    }

    /// Whether the element is enabled
    ///
    /// # Errors
    ///
    /// Returns an engine error when nothing matches.
    pub async fn is_enabled(&self, locator: &Locator) -> CheckResult<bool> {
        self.engine.is_enabled(locator.selector()).await
    }

    /// Current value of an input
    ///
    /// # Errors
    ///
    /// Returns an engine error when nothing matches.
    pub async fn input_value(&self, locator: &Locator) -> CheckResult<String> {
        self.engine.input_value(locator.selector()).await
    }

    // =========================================================================
    // DIALOGS
    // =========================================================================

    /// Accept the next dialog
    pub fn accept_dialog(&self) -> DialogSubscription {
        self.engine.dialogs().subscribe(DialogPolicy::Accept)
    }

    /// Accept the next prompt with `text`
    pub fn accept_dialog_with(&self, text: impl Into<String>) -> DialogSubscription {
        self.engine.dialogs().subscribe(DialogPolicy::AcceptWith(text.into()))
    }

    /// Dismiss the next dialog
    pub fn dismiss_dialog(&self) -> DialogSubscription {
        self.engine.dialogs().subscribe(DialogPolicy::Dismiss)
    }

    /// Capture the message of the next dialog and accept it
    ///
    /// Await [`DialogSubscription::message`] on the returned handle after
    /// triggering the dialog.
    pub fn get_alert_message(&self) -> DialogSubscription {
        self.accept_dialog()
    }
}
