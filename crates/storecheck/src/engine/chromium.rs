//! Chromium engine over the Chrome `DevTools` Protocol.
//!
//! Element operations evaluate the JavaScript query rendered by
//! [`Selector::to_query`], so every selector kind works without a CDP node
//! lookup. Pointer and keyboard input go through the CDP `Input` domain so
//! page scripts see trusted events.

use crate::dialog::{Dialog, DialogHub, DialogType};
use crate::engine::{no_match, BrowserEngine, ClickOptions, EngineConfig, MouseButton, SelectBy};
use crate::locator::Selector;
use crate::result::{CheckError, CheckResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton as CdpMouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, DialogType as CdpDialogType,
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const UPLOAD_MARKER: &str = "data-storecheck-upload";

fn engine_err(e: impl std::fmt::Display) -> CheckError {
    CheckError::engine(e.to_string())
}

#[derive(Debug, Deserialize)]
struct Wrapped {
    v: Value,
}

#[derive(Debug, Deserialize)]
struct Probe {
    found: bool,
    #[serde(default)]
    v: Value,
}

#[derive(Debug, Deserialize)]
struct Point {
    x: f64,
    y: f64,
}

/// Browser engine driving a real Chromium page
#[derive(Debug)]
pub struct ChromiumEngine {
    config: EngineConfig,
    browser: Mutex<CdpBrowser>,
    page: CdpPage,
    dialogs: Arc<DialogHub>,
    handler: tokio::task::JoinHandle<()>,
    dialog_task: tokio::task::JoinHandle<()>,
}

impl ChromiumEngine {
    /// Launch a browser and open a blank page
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Engine`] if chromium cannot be launched or the
    /// page cannot be created.
    pub async fn launch(config: EngineConfig) -> CheckResult<Self> {
        let mut builder = CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(engine_err)?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(engine_err)?;
        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(engine_err)?;
        let dialogs = Arc::new(DialogHub::new());
        let dialog_task = Self::spawn_dialog_listener(&page, Arc::clone(&dialogs)).await?;
        tracing::info!(headless = config.headless, "chromium launched");

        Ok(Self {
            config,
            browser: Mutex::new(browser),
            page,
            dialogs,
            handler,
            dialog_task,
        })
    }

    /// Get the launch configuration
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn spawn_dialog_listener(
        page: &CdpPage,
        hub: Arc<DialogHub>,
    ) -> CheckResult<tokio::task::JoinHandle<()>> {
        let mut events = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(engine_err)?;
        let page = page.clone();
        Ok(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let dialog = match event.r#type {
                    CdpDialogType::Alert => Dialog::alert(event.message.clone()),
                    CdpDialogType::Confirm => Dialog::confirm(event.message.clone()),
                    CdpDialogType::Prompt => {
                        Dialog::prompt(event.message.clone(), event.default_prompt.clone())
                    }
                    CdpDialogType::Beforeunload => {
                        Dialog::new(DialogType::BeforeUnload, event.message.clone())
                    }
                };
                let answered = hub.dispatch(dialog);
                let mut params = HandleJavaScriptDialogParams::new(answered.action().accepts());
                params.prompt_text = answered.action().prompt_text().map(str::to_string);
                if let Err(e) = page.execute(params).await {
                    tracing::warn!(error = %e, "failed to answer dialog");
                }
            }
        }))
    }

    async fn eval<T: DeserializeOwned>(&self, expression: &str) -> CheckResult<T> {
        // Stringify in the page so `null` and `undefined` survive the round trip.
        let script = format!("JSON.stringify({{ v: ({expression}) ?? null }})");
        let raw: String = self
            .page
            .evaluate(script)
            .await
            .map_err(engine_err)?
            .into_value()
            .map_err(engine_err)?;
        let wrapped: Wrapped = serde_json::from_str(&raw)?;
        Ok(serde_json::from_value(wrapped.v)?)
    }

    /// Evaluate `body` with `el` bound to the first match
    async fn on_element<T: DeserializeOwned>(&self, selector: &Selector, body: &str) -> CheckResult<T> {
        let expression = format!(
            "(() => {{ const el = {}; if (!el) return {{ found: false }}; return {{ found: true, v: ({body}) ?? null }}; }})()",
            selector.to_query()
        );
        let probe: Probe = self.eval(&expression).await?;
        if !probe.found {
            return Err(no_match(selector));
        }
        Ok(serde_json::from_value(probe.v)?)
    }

    async fn mouse(
        &self,
        kind: DispatchMouseEventType,
        at: &Point,
        button: CdpMouseButton,
        click_count: u32,
    ) -> CheckResult<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(at.x)
            .y(at.y)
            .button(button)
            .click_count(i64::from(click_count))
            .build()
            .map_err(engine_err)?;
        self.page.execute(params).await.map_err(engine_err)?;
        Ok(())
    }

    async fn center_of(&self, selector: &Selector) -> CheckResult<Point> {
        self.on_element(
            selector,
            "(() => { el.scrollIntoView({ block: 'center' }); const r = el.getBoundingClientRect(); return { x: r.left + r.width / 2, y: r.top + r.height / 2 }; })()",
        )
        .await
    }
}

const fn cdp_button(button: MouseButton) -> CdpMouseButton {
    match button {
        MouseButton::Left => CdpMouseButton::Left,
        MouseButton::Right => CdpMouseButton::Right,
        MouseButton::Middle => CdpMouseButton::Middle,
    }
}

/// Split `Control+Shift+A` into the CDP modifier mask and the final key
fn split_combination(key: &str) -> (i64, &str) {
    let mut parts: Vec<&str> = key.split('+').collect();
    let main = parts.pop().unwrap_or(key);
    let modifiers = parts.iter().fold(0, |mask, part| {
        mask | match *part {
            "Alt" => 1,
            "Control" | "Ctrl" => 2,
            "Meta" | "Command" => 4,
            "Shift" => 8,
            _ => 0,
        }
    });
    (modifiers, main)
}

#[async_trait]
impl BrowserEngine for ChromiumEngine {
    async fn navigate(&self, url: &str) -> CheckResult<()> {
        let limit = Duration::from_millis(self.config.navigation_timeout_ms);
        match tokio::time::timeout(limit, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(CheckError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(CheckError::Timeout {
                condition: format!("navigation to {url}"),
                ms: self.config.navigation_timeout_ms,
            }),
        }
    }

    async fn current_url(&self) -> CheckResult<String> {
        Ok(self.page.url().await.map_err(engine_err)?.unwrap_or_default())
    }

    async fn title(&self) -> CheckResult<String> {
        Ok(self.page.get_title().await.map_err(engine_err)?.unwrap_or_default())
    }

    async fn click(&self, selector: &Selector, options: ClickOptions) -> CheckResult<()> {
        let at = self.center_of(selector).await?;
        let button = cdp_button(options.button);
        self.mouse(DispatchMouseEventType::MouseMoved, &at, CdpMouseButton::None, 0)
            .await?;
        for count in 1..=options.click_count {
            self.mouse(DispatchMouseEventType::MousePressed, &at, button.clone(), count)
                .await?;
            self.mouse(DispatchMouseEventType::MouseReleased, &at, button.clone(), count)
                .await?;
        }
        Ok(())
    }

    async fn fill(&self, selector: &Selector, text: &str) -> CheckResult<()> {
        let value = Value::String(text.to_string());
        // The prototype setter keeps framework-managed inputs in sync.
        let body = format!(
            "(() => {{ el.focus(); const proto = Object.getPrototypeOf(el); const set = Object.getOwnPropertyDescriptor(proto, 'value')?.set; if (set) set.call(el, {value}); else el.value = {value}; el.dispatchEvent(new Event('input', {{ bubbles: true }})); el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()"
        );
        self.on_element::<Value>(selector, &body).await.map(drop)
    }

    async fn type_text(&self, selector: &Selector, text: &str, delay: Duration) -> CheckResult<()> {
        self.on_element::<Value>(selector, "el.focus()").await?;
        for ch in text.chars() {
            self.page
                .execute(InsertTextParams::new(ch.to_string()))
                .await
                .map_err(engine_err)?;
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn hover(&self, selector: &Selector) -> CheckResult<()> {
        let at = self.center_of(selector).await?;
        self.mouse(DispatchMouseEventType::MouseMoved, &at, CdpMouseButton::None, 0)
            .await
    }

    async fn press_key(&self, key: &str) -> CheckResult<()> {
        let (modifiers, main) = split_combination(key);
        for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let mut builder = DispatchKeyEventParams::builder()
                .r#type(kind.clone())
                .key(main)
                .modifiers(modifiers);
            if main.chars().count() == 1 && kind == DispatchKeyEventType::KeyDown {
                builder = builder.text(main);
            }
            let params = builder.build().map_err(engine_err)?;
            self.page.execute(params).await.map_err(engine_err)?;
        }
        Ok(())
    }

    async fn select_option(&self, selector: &Selector, choice: &SelectBy) -> CheckResult<()> {
        let pick = match choice {
            SelectBy::Value(v) => format!("opts.findIndex(o => o.value === {})", Value::String(v.clone())),
            SelectBy::Index(i) => format!("({i} < opts.length ? {i} : -1)"),
            SelectBy::Label(l) => {
                format!("opts.findIndex(o => o.label === {0} || o.text === {0})", Value::String(l.clone()))
            }
        };
        let body = format!(
            "(() => {{ const opts = Array.from(el.options || []); const i = {pick}; if (i < 0) return false; el.selectedIndex = i; el.dispatchEvent(new Event('input', {{ bubbles: true }})); el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()"
        );
        if self.on_element::<bool>(selector, &body).await? {
            Ok(())
        } else {
            Err(CheckError::engine(format!("no option {choice} in '{selector}'")))
        }
    }

    async fn set_input_files(&self, selector: &Selector, files: &[PathBuf]) -> CheckResult<()> {
        self.on_element::<Value>(selector, &format!("el.setAttribute('{UPLOAD_MARKER}', '')"))
            .await?;
        let element = self
            .page
            .find_element(format!("[{UPLOAD_MARKER}]"))
            .await
            .map_err(engine_err)?;
        let params = SetFileInputFilesParams::builder()
            .files(files.iter().map(|f| f.display().to_string()).collect::<Vec<_>>())
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(engine_err)?;
        let result = self.page.execute(params).await.map_err(engine_err);
        self.on_element::<Value>(selector, &format!("el.removeAttribute('{UPLOAD_MARKER}')"))
            .await?;
        result.map(drop)
    }

    async fn scroll_by(&self, dx: i64, dy: i64) -> CheckResult<()> {
        self.eval::<Value>(&format!("window.scrollBy({dx}, {dy})")).await.map(drop)
    }

    async fn scroll_into_view(&self, selector: &Selector) -> CheckResult<()> {
        self.on_element::<Value>(selector, "el.scrollIntoView({ block: 'center' })")
            .await
            .map(drop)
    }

    async fn count(&self, selector: &Selector) -> CheckResult<usize> {
        self.eval(&selector.to_count_query()).await
    }

    async fn is_visible(&self, selector: &Selector) -> CheckResult<bool> {
        let expression = format!(
            "(() => {{ const el = {}; if (!el) return false; const s = getComputedStyle(el); return s.visibility !== 'hidden' && s.display !== 'none' && el.getClientRects().length > 0; }})()",
            selector.to_query()
        );
        self.eval(&expression).await
    }

    async fn is_checked(&self, selector: &Selector) -> CheckResult<bool> {
        self.on_element(selector, "!!el.checked").await
    }

    async fn is_enabled(&self, selector: &Selector) -> CheckResult<bool> {
        self.on_element(selector, "!el.disabled").await
    }

    async fn text_content(&self, selector: &Selector) -> CheckResult<Option<String>> {
        self.eval(&format!("({})?.textContent", selector.to_query())).await
    }

    async fn get_attribute(&self, selector: &Selector, name: &str) -> CheckResult<Option<String>> {
        let body = format!("el.getAttribute({})", Value::String(name.to_string()));
        self.on_element(selector, &body).await
    }

    async fn input_value(&self, selector: &Selector) -> CheckResult<String> {
        self.on_element(selector, "el.value ?? ''").await
    }

    async fn wait_for_navigation(&self, timeout_ms: u64) -> CheckResult<()> {
        let limit = Duration::from_millis(timeout_ms);
        match tokio::time::timeout(limit, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(engine_err(e)),
            Err(_) => Err(CheckError::Timeout {
                condition: "navigation".to_string(),
                ms: timeout_ms,
            }),
        }
    }

    fn dialogs(&self) -> &DialogHub {
        &self.dialogs
    }

    async fn screenshot(&self) -> CheckResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let screenshot = self.page.execute(params).await.map_err(engine_err)?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(engine_err)
    }

    async fn close(&self) -> CheckResult<()> {
        self.dialog_task.abort();
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(engine_err)?;
        let _ = browser.wait().await;
        self.handler.abort();
        tracing::info!("chromium closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_combination() {
        assert_eq!(split_combination("Enter"), (0, "Enter"));
        assert_eq!(split_combination("Control+A"), (2, "A"));
        assert_eq!(split_combination("Control+Shift+Tab"), (10, "Tab"));
    }
}
