//! `BrowserEngine` - Abstract Browser Automation Trait
//!
//! Everything above this layer (interaction helper, page objects, facades)
//! talks to the browser only through [`BrowserEngine`], so a scenario runs
//! unchanged against Chromium or the in-memory [`MockEngine`](crate::MockEngine).
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  BrowserEngine (async trait)                                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐      ┌───────────────────────────┐ │
//! │  │  ChromiumEngine      │      │  MockEngine               │ │
//! │  │  CDP via             │      │  In-memory DOM for unit   │ │
//! │  │  chromiumoxide       │      │  and scenario tests       │ │
//! │  │  (feature "browser") │      │                           │ │
//! │  └──────────────────────┘      └───────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#[cfg(feature = "browser")]
pub mod chromium;

#[cfg(feature = "browser")]
pub use chromium::ChromiumEngine;

use crate::dialog::DialogHub;
use crate::locator::Selector;
use crate::result::{CheckError, CheckResult};
use crate::wait::{poll_until, ElementState, WaitOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Mouse button for clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    /// Primary button
    #[default]
    Left,
    /// Context-menu button
    Right,
    /// Wheel button
    Middle,
}

impl MouseButton {
    /// DOM `MouseEvent.button` code
    #[must_use]
    pub const fn dom_code(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Middle => 1,
            Self::Right => 2,
        }
    }
}

/// Options for click operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickOptions {
    /// Button to press
    pub button: MouseButton,
    /// 1 for a click, 2 for a double-click
    pub click_count: u32,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            button: MouseButton::Left,
            click_count: 1,
        }
    }
}

impl ClickOptions {
    /// Double-click with the primary button
    #[must_use]
    pub const fn double() -> Self {
        Self {
            button: MouseButton::Left,
            click_count: 2,
        }
    }

    /// Single right-click
    #[must_use]
    pub const fn right() -> Self {
        Self {
            button: MouseButton::Right,
            click_count: 1,
        }
    }
}

/// How to pick an `<option>` in a `<select>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectBy {
    /// By `value` attribute
    Value(String),
    /// By zero-based position
    Index(usize),
    /// By visible label
    Label(String),
}

impl std::fmt::Display for SelectBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => write!(f, "value={v}"),
            Self::Index(i) => write!(f, "index={i}"),
            Self::Label(l) => write!(f, "label={l}"),
        }
    }
}

/// Browser launch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Navigation timeout in milliseconds
    pub navigation_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
            navigation_timeout_ms: 30_000,
        }
    }
}

impl EngineConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Error for an operation whose selector matched nothing
#[must_use]
pub fn no_match(selector: &Selector) -> CheckError {
    CheckError::engine(format!("no element matches '{selector}'"))
}

/// Abstract browser automation surface
///
/// Methods take `&self` so one engine can be shared behind an `Arc` by the
/// interaction helper and the runner; implementations synchronize internally.
/// Element operations act on the first match of the selector.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Navigate to an absolute URL and wait for the load event
    async fn navigate(&self, url: &str) -> CheckResult<()>;

    /// Current page URL
    async fn current_url(&self) -> CheckResult<String>;

    /// Current document title
    async fn title(&self) -> CheckResult<String>;

    /// Click an element
    async fn click(&self, selector: &Selector, options: ClickOptions) -> CheckResult<()>;

    /// Replace an input's value
    async fn fill(&self, selector: &Selector, text: &str) -> CheckResult<()>;

    /// Type text one key at a time, pausing `delay` between keys
    async fn type_text(&self, selector: &Selector, text: &str, delay: Duration)
        -> CheckResult<()>;

    /// Move the pointer over an element
    async fn hover(&self, selector: &Selector) -> CheckResult<()>;

    /// Press a key or `+`-joined key combination on the focused element
    async fn press_key(&self, key: &str) -> CheckResult<()>;

    /// Choose an option of a `<select>`
    async fn select_option(&self, selector: &Selector, choice: &SelectBy) -> CheckResult<()>;

    /// Attach files to an `<input type=file>`
    async fn set_input_files(&self, selector: &Selector, files: &[PathBuf]) -> CheckResult<()>;

    /// Scroll the window by a pixel offset
    async fn scroll_by(&self, dx: i64, dy: i64) -> CheckResult<()>;

    /// Scroll an element into the viewport
    async fn scroll_into_view(&self, selector: &Selector) -> CheckResult<()>;

    /// Number of matching elements
    async fn count(&self, selector: &Selector) -> CheckResult<usize>;

    /// Whether the first match exists and is rendered
    async fn is_visible(&self, selector: &Selector) -> CheckResult<bool>;

    /// Whether the first match is checked
    async fn is_checked(&self, selector: &Selector) -> CheckResult<bool>;

    /// Whether the first match is enabled
    async fn is_enabled(&self, selector: &Selector) -> CheckResult<bool>;

    /// Text content of the first match, `None` when nothing matches
    async fn text_content(&self, selector: &Selector) -> CheckResult<Option<String>>;

    /// Attribute of the first match, `None` when absent
    async fn get_attribute(&self, selector: &Selector, name: &str)
        -> CheckResult<Option<String>>;

    /// Current value of an input
    async fn input_value(&self, selector: &Selector) -> CheckResult<String>;

    /// Wait until the next navigation commits
    async fn wait_for_navigation(&self, timeout_ms: u64) -> CheckResult<()>;

    /// Dialog dispatcher for this page
    fn dialogs(&self) -> &DialogHub;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> CheckResult<Vec<u8>>;

    /// Close the page and release the browser
    async fn close(&self) -> CheckResult<()>;

    /// Wait for an element to reach `state`
    ///
    /// The default implementation polls [`count`](Self::count) and
    /// [`is_visible`](Self::is_visible).
    async fn wait_for(
        &self,
        selector: &Selector,
        state: ElementState,
        options: WaitOptions,
    ) -> CheckResult<()> {
        let condition = format!("'{selector}' {}", state.describe());
        poll_until(condition, options, move || async move {
            Ok(match state {
                ElementState::Attached => self.count(selector).await? > 0,
                ElementState::Detached => self.count(selector).await? == 0,
                ElementState::Visible => self.is_visible(selector).await?,
                ElementState::Hidden => !self.is_visible(selector).await?,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_options() {
        assert_eq!(ClickOptions::default().click_count, 1);
        assert_eq!(ClickOptions::double().click_count, 2);
        assert_eq!(ClickOptions::right().button, MouseButton::Right);
        assert_eq!(MouseButton::Right.dom_code(), 2);
    }

    #[test]
    fn test_select_by_display() {
        assert_eq!(SelectBy::Value("lohi".into()).to_string(), "value=lohi");
        assert_eq!(SelectBy::Index(2).to_string(), "index=2");
    }

    #[test]
    fn test_engine_config_builder() {
        let config = EngineConfig::default()
            .with_headless(false)
            .with_viewport(800, 600)
            .with_no_sandbox();
        assert!(!config.headless);
        assert_eq!(config.viewport_width, 800);
        assert!(!config.sandbox);
    }

    #[test]
    fn test_no_match_names_selector() {
        let err = no_match(&Selector::css("#missing"));
        assert!(err.to_string().contains("'#missing'"));
    }
}
