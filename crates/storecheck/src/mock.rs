//! In-memory browser engine.
//!
//! [`MockEngine`] keeps a tiny DOM of [`MockElement`]s keyed by selector and
//! implements [`BrowserEngine`] over it, so page objects and whole scenarios
//! run without a browser. Behaviour is scripted with handlers that mutate the
//! [`MockDom`] when the page navigates, an element is clicked or a select
//! changes.

use crate::dialog::{Dialog, DialogHub};
use crate::engine::{no_match, BrowserEngine, ClickOptions, MouseButton, SelectBy};
use crate::locator::Selector;
use crate::result::{CheckError, CheckResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// PNG signature returned as the mock screenshot
pub const MOCK_SCREENSHOT: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Index of an element in the mock DOM
pub type NodeId = usize;

/// One `<option>` of a mock `<select>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockOption {
    /// `value` attribute
    pub value: String,
    /// Visible label
    pub label: String,
}

/// A mock DOM element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Text content
    pub text: String,
    /// Attributes
    pub attributes: BTreeMap<String, String>,
    /// Rendered
    pub visible: bool,
    /// Checkbox state
    pub checked: bool,
    /// Accepts input
    pub enabled: bool,
    /// Input value
    pub value: String,
    /// Options when the element is a select
    pub options: Vec<MockOption>,
    /// Files attached to a file input
    pub files: Vec<PathBuf>,
    children: BTreeMap<String, Vec<NodeId>>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            text: String::new(),
            attributes: BTreeMap::new(),
            visible: true,
            checked: false,
            enabled: true,
            value: String::new(),
            options: Vec::new(),
            files: Vec::new(),
            children: BTreeMap::new(),
        }
    }
}

impl MockElement {
    /// Visible, enabled element with no text
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the input value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Add `(value, label)` options
    #[must_use]
    pub fn with_options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(value, label)| MockOption {
                value: (*value).to_string(),
                label: (*label).to_string(),
            })
            .collect();
        self
    }

    /// Mark as not rendered
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark as disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Mark as checked
    #[must_use]
    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }
}

/// The mock document: an arena of elements plus page state
#[derive(Debug, Default)]
pub struct MockDom {
    nodes: Vec<MockElement>,
    roots: BTreeMap<String, Vec<NodeId>>,
    url: String,
    title: String,
    raised: Vec<Dialog>,
}

impl MockDom {
    /// Append an element matched by `css` at document level
    pub fn insert(&mut self, css: impl Into<String>, element: MockElement) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(element);
        self.roots.entry(css.into()).or_default().push(id);
        id
    }

    /// Append an element matched by `css` inside `parent`
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        css: impl Into<String>,
        element: MockElement,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(element);
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.entry(css.into()).or_default().push(id);
        }
        id
    }

    /// Detach every document-level element matched by `css`
    pub fn remove(&mut self, css: &str) {
        self.roots.remove(css);
    }

    /// Drop the whole document
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    /// Document-level elements matched by `css`, in insertion order
    #[must_use]
    pub fn all(&self, css: &str) -> Vec<NodeId> {
        self.roots.get(css).cloned().unwrap_or_default()
    }

    /// Element by id
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&MockElement> {
        self.nodes.get(id)
    }

    /// Mutable element by id
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut MockElement> {
        self.nodes.get_mut(id)
    }

    /// First document-level element matched by `css`
    #[must_use]
    pub fn element(&self, css: &str) -> Option<&MockElement> {
        let id = *self.roots.get(css)?.first()?;
        self.nodes.get(id)
    }

    /// Mutable first document-level element matched by `css`
    pub fn element_mut(&mut self, css: &str) -> Option<&mut MockElement> {
        let id = *self.roots.get(css)?.first()?;
        self.nodes.get_mut(id)
    }

    /// Input value of the first match of `css`, empty when absent
    #[must_use]
    pub fn value(&self, css: &str) -> String {
        self.element(css).map(|e| e.value.clone()).unwrap_or_default()
    }

    /// First child of `parent` matched by `css`
    #[must_use]
    pub fn child(&self, parent: NodeId, css: &str) -> Option<&MockElement> {
        let id = *self.nodes.get(parent)?.children.get(css)?.first()?;
        self.nodes.get(id)
    }

    /// Current URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Set current URL
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Current title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set document title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Open a dialog once the current action returns
    pub fn raise_dialog(&mut self, dialog: Dialog) {
        self.raised.push(dialog);
    }

    fn descendants(&self, scope: Option<&[NodeId]>) -> Vec<NodeId> {
        let mut stack: Vec<NodeId> = match scope {
            None => self.roots.values().flatten().copied().collect(),
            Some(ids) => ids
                .iter()
                .filter_map(|id| self.nodes.get(*id))
                .flat_map(|n| n.children.values().flatten().copied())
                .collect(),
        };
        let mut out = Vec::new();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.values().flatten().copied());
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    fn resolve_in(&self, selector: &Selector, scope: Option<&[NodeId]>) -> Vec<NodeId> {
        match selector {
            Selector::Css(_) | Selector::TestId(_) => {
                let key = selector.to_string();
                match scope {
                    None => self.all(&key),
                    Some(ids) => ids
                        .iter()
                        .filter_map(|id| self.nodes.get(*id))
                        .filter_map(|n| n.children.get(&key))
                        .flatten()
                        .copied()
                        .collect(),
                }
            }
            Selector::Text(text) => self
                .descendants(scope)
                .into_iter()
                .filter(|id| self.nodes[*id].text.contains(text.as_str()))
                .collect(),
            Selector::Nth { base, index } => self
                .resolve_in(base, scope)
                .get(*index)
                .copied()
                .into_iter()
                .collect(),
            Selector::Within { parent, child } => {
                let parents = self.resolve_in(parent, scope);
                self.resolve_in(child, Some(&parents))
            }
        }
    }

    /// Every element the selector matches
    #[must_use]
    pub fn resolve(&self, selector: &Selector) -> Vec<NodeId> {
        self.resolve_in(selector, None)
    }

    fn first(&self, selector: &Selector) -> CheckResult<NodeId> {
        self.resolve(selector)
            .first()
            .copied()
            .ok_or_else(|| no_match(selector))
    }
}

type DomHandler = Arc<dyn Fn(&mut MockDom) + Send + Sync>;
type NavigateHandler = Arc<dyn Fn(&mut MockDom, &str) + Send + Sync>;

#[derive(Default)]
struct Handlers {
    click: HashMap<String, DomHandler>,
    change: HashMap<String, DomHandler>,
    navigate: Option<NavigateHandler>,
}

/// Browser engine over a scripted in-memory DOM
#[derive(Default)]
pub struct MockEngine {
    dom: Mutex<MockDom>,
    handlers: Mutex<Handlers>,
    history: Mutex<Vec<String>>,
    dialogs: DialogHub,
    closed: AtomicBool,
}

impl std::fmt::Debug for MockEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEngine")
            .field("dom", &*lock(&self.dom))
            .field("history", &*lock(&self.history))
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockEngine {
    /// Create an engine with an empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutate the document directly
    pub fn with_dom<R>(&self, f: impl FnOnce(&mut MockDom) -> R) -> R {
        let result = f(&mut lock(&self.dom));
        self.flush_dialogs();
        result
    }

    /// Run `handler` whenever `css` is clicked
    pub fn on_click(&self, css: impl Into<String>, handler: impl Fn(&mut MockDom) + Send + Sync + 'static) {
        lock(&self.handlers).click.insert(css.into(), Arc::new(handler));
    }

    /// Run `handler` whenever an option of `css` is selected
    pub fn on_change(&self, css: impl Into<String>, handler: impl Fn(&mut MockDom) + Send + Sync + 'static) {
        lock(&self.handlers).change.insert(css.into(), Arc::new(handler));
    }

    /// Run `handler` with the target URL on every navigation
    pub fn on_navigate(&self, handler: impl Fn(&mut MockDom, &str) + Send + Sync + 'static) {
        lock(&self.handlers).navigate = Some(Arc::new(handler));
    }

    /// Open a dialog on the page now
    pub fn open_dialog(&self, dialog: Dialog) -> Dialog {
        self.record(format!("dialog:{}", dialog.message()));
        self.dialogs.dispatch(dialog)
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        lock(&self.history).clone()
    }

    /// Check if a call starting with `prefix` was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        lock(&self.history).iter().any(|c| c.starts_with(prefix))
    }

    /// Whether [`BrowserEngine::close`] ran
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        lock(&self.history).push(call);
    }

    fn flush_dialogs(&self) {
        let raised = std::mem::take(&mut lock(&self.dom).raised);
        for dialog in raised {
            self.open_dialog(dialog);
        }
    }

    fn run_handler(&self, handler: Option<DomHandler>) {
        if let Some(handler) = handler {
            handler(&mut lock(&self.dom));
            self.flush_dialogs();
        }
    }

    fn read<R>(&self, selector: &Selector, f: impl FnOnce(&MockElement) -> R) -> CheckResult<R> {
        let dom = lock(&self.dom);
        let id = dom.first(selector)?;
        Ok(f(&dom.nodes[id]))
    }

    fn editable(&self, selector: &Selector) -> CheckResult<NodeId> {
        let dom = lock(&self.dom);
        let id = dom.first(selector)?;
        if dom.nodes[id].enabled {
            Ok(id)
        } else {
            Err(CheckError::engine(format!("element '{selector}' is disabled")))
        }
    }
}

#[async_trait]
impl BrowserEngine for MockEngine {
    async fn navigate(&self, url: &str) -> CheckResult<()> {
        self.record(format!("navigate:{url}"));
        let handler = lock(&self.handlers).navigate.clone();
        {
            let mut dom = lock(&self.dom);
            dom.set_url(url);
            if let Some(handler) = handler {
                handler(&mut dom, url);
            }
        }
        self.flush_dialogs();
        Ok(())
    }

    async fn current_url(&self) -> CheckResult<String> {
        Ok(lock(&self.dom).url.clone())
    }

    async fn title(&self) -> CheckResult<String> {
        Ok(lock(&self.dom).title.clone())
    }

    async fn click(&self, selector: &Selector, options: ClickOptions) -> CheckResult<()> {
        let visible = self.read(selector, |e| e.visible)?;
        if !visible {
            return Err(CheckError::engine(format!("element '{selector}' is not visible")));
        }
        let verb = match (options.button, options.click_count) {
            (MouseButton::Right, _) => "rightclick",
            (_, 2) => "dblclick",
            _ => "click",
        };
        self.record(format!("{verb}:{selector}"));
        let handler = lock(&self.handlers).click.get(&selector.to_string()).cloned();
        self.run_handler(handler);
        Ok(())
    }

    async fn fill(&self, selector: &Selector, text: &str) -> CheckResult<()> {
        let id = self.editable(selector)?;
        self.record(format!("fill:{selector}:{text}"));
        lock(&self.dom).nodes[id].value = text.to_string();
        Ok(())
    }

    async fn type_text(&self, selector: &Selector, text: &str, delay: Duration) -> CheckResult<()> {
        let id = self.editable(selector)?;
        self.record(format!("type:{selector}:{text}"));
        for ch in text.chars() {
            lock(&self.dom).nodes[id].value.push(ch);
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn hover(&self, selector: &Selector) -> CheckResult<()> {
        self.read(selector, |_| ())?;
        self.record(format!("hover:{selector}"));
        Ok(())
    }

    async fn press_key(&self, key: &str) -> CheckResult<()> {
        self.record(format!("press:{key}"));
        Ok(())
    }

    async fn select_option(&self, selector: &Selector, choice: &SelectBy) -> CheckResult<()> {
        let id = self.editable(selector)?;
        {
            let mut dom = lock(&self.dom);
            let element = &mut dom.nodes[id];
            let picked = match choice {
                SelectBy::Value(v) => element.options.iter().find(|o| &o.value == v),
                SelectBy::Index(i) => element.options.get(*i),
                SelectBy::Label(l) => element.options.iter().find(|o| &o.label == l),
            }
            .map(|o| o.value.clone())
            .ok_or_else(|| CheckError::engine(format!("no option {choice} in '{selector}'")))?;
            element.value = picked;
        }
        self.record(format!("select:{selector}:{choice}"));
        let handler = lock(&self.handlers).change.get(&selector.to_string()).cloned();
        self.run_handler(handler);
        Ok(())
    }

    async fn set_input_files(&self, selector: &Selector, files: &[PathBuf]) -> CheckResult<()> {
        let id = self.editable(selector)?;
        self.record(format!("upload:{selector}:{}", files.len()));
        lock(&self.dom).nodes[id].files = files.to_vec();
        Ok(())
    }

    async fn scroll_by(&self, dx: i64, dy: i64) -> CheckResult<()> {
        self.record(format!("scroll_by:{dx},{dy}"));
        Ok(())
    }

    async fn scroll_into_view(&self, selector: &Selector) -> CheckResult<()> {
        self.read(selector, |_| ())?;
        self.record(format!("scroll_into_view:{selector}"));
        Ok(())
    }

    async fn count(&self, selector: &Selector) -> CheckResult<usize> {
        Ok(lock(&self.dom).resolve(selector).len())
    }

    async fn is_visible(&self, selector: &Selector) -> CheckResult<bool> {
        let dom = lock(&self.dom);
        Ok(dom
            .resolve(selector)
            .first()
            .is_some_and(|id| dom.nodes[*id].visible))
    }

    async fn is_checked(&self, selector: &Selector) -> CheckResult<bool> {
        self.read(selector, |e| e.checked)
    }

    async fn is_enabled(&self, selector: &Selector) -> CheckResult<bool> {
        self.read(selector, |e| e.enabled)
    }

    async fn text_content(&self, selector: &Selector) -> CheckResult<Option<String>> {
        let dom = lock(&self.dom);
        Ok(dom
            .resolve(selector)
            .first()
            .map(|id| dom.nodes[*id].text.clone()))
    }

    async fn get_attribute(&self, selector: &Selector, name: &str) -> CheckResult<Option<String>> {
        self.read(selector, |e| e.attributes.get(name).cloned())
    }

    async fn input_value(&self, selector: &Selector) -> CheckResult<String> {
        self.read(selector, |e| e.value.clone())
    }

    async fn wait_for_navigation(&self, timeout_ms: u64) -> CheckResult<()> {
        self.record(format!("wait_for_navigation:{timeout_ms}"));
        Ok(())
    }

    fn dialogs(&self) -> &DialogHub {
        &self.dialogs
    }

    async fn screenshot(&self) -> CheckResult<Vec<u8>> {
        self.record("screenshot".to_string());
        Ok(MOCK_SCREENSHOT.to_vec())
    }

    async fn close(&self) -> CheckResult<()> {
        self.record("close".to_string());
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::dialog::{DialogAction, DialogPolicy};
    use crate::wait::{ElementState, WaitOptions};

    fn engine_with_cards() -> MockEngine {
        let engine = MockEngine::new();
        engine.with_dom(|dom| {
            for (name, price) in [("Backpack", "$29.99"), ("Onesie", "$7.99")] {
                let card = dom.insert(".inventory_item", MockElement::new());
                dom.insert_child(card, ".inventory_item_name", MockElement::new().with_text(name));
                dom.insert_child(card, ".inventory_item_price", MockElement::new().with_text(price));
            }
        });
        engine
    }

    mod resolution {
        use super::*;

        #[tokio::test]
        async fn test_scoped_and_nth() {
            let engine = engine_with_cards();
            let names = Selector::css(".inventory_item").within(Selector::css(".inventory_item_name"));
            assert_eq!(engine.count(&names).await.unwrap(), 2);

            let second = Selector::css(".inventory_item")
                .nth(1)
                .within(Selector::css(".inventory_item_price"));
            assert_eq!(
                engine.text_content(&second).await.unwrap().as_deref(),
                Some("$7.99")
            );
        }

        #[tokio::test]
        async fn test_text_selector_searches_descendants() {
            let engine = engine_with_cards();
            assert_eq!(engine.count(&Selector::text("Onesie")).await.unwrap(), 1);
        }

        #[tokio::test]
        async fn test_missing_element() {
            let engine = MockEngine::new();
            let sel = Selector::css("#nope");
            assert!(!engine.is_visible(&sel).await.unwrap());
            assert!(engine.text_content(&sel).await.unwrap().is_none());
            assert!(engine.input_value(&sel).await.is_err());
        }
    }

    mod interaction {
        use super::*;

        #[tokio::test]
        async fn test_click_runs_handler_and_records() {
            let engine = MockEngine::new();
            engine.with_dom(|dom| {
                dom.insert("#go", MockElement::new());
            });
            engine.on_click("#go", |dom| {
                dom.insert("#done", MockElement::new());
            });

            engine.click(&Selector::css("#go"), ClickOptions::double()).await.unwrap();
            assert!(engine.was_called("dblclick:#go"));
            assert_eq!(engine.count(&Selector::css("#done")).await.unwrap(), 1);
        }

        #[tokio::test]
        async fn test_hidden_element_refuses_click() {
            let engine = MockEngine::new();
            engine.with_dom(|dom| {
                dom.insert("#ghost", MockElement::new().hidden());
            });
            assert!(engine
                .click(&Selector::css("#ghost"), ClickOptions::default())
                .await
                .is_err());
        }

        #[tokio::test]
        async fn test_fill_and_type() {
            let engine = MockEngine::new();
            engine.with_dom(|dom| {
                dom.insert("#user-name", MockElement::new());
            });
            let sel = Selector::css("#user-name");
            engine.fill(&sel, "standard").await.unwrap();
            engine.type_text(&sel, "_user", Duration::ZERO).await.unwrap();
            assert_eq!(engine.input_value(&sel).await.unwrap(), "standard_user");
        }

        #[tokio::test]
        async fn test_disabled_input_rejects_fill() {
            let engine = MockEngine::new();
            engine.with_dom(|dom| {
                dom.insert("#locked", MockElement::new().disabled());
            });
            assert!(engine.fill(&Selector::css("#locked"), "x").await.is_err());
        }

        #[tokio::test]
        async fn test_select_option_by_label_fires_change() {
            let engine = MockEngine::new();
            engine.with_dom(|dom| {
                dom.insert(
                    "select",
                    MockElement::new().with_options(&[("az", "Name (A to Z)"), ("za", "Name (Z to A)")]),
                );
            });
            engine.on_change("select", |dom| {
                let picked = dom.value("select");
                dom.set_title(picked);
            });

            let sel = Selector::css("select");
            engine
                .select_option(&sel, &SelectBy::Label("Name (Z to A)".into()))
                .await
                .unwrap();
            assert_eq!(engine.title().await.unwrap(), "za");
            assert!(engine
                .select_option(&sel, &SelectBy::Index(9))
                .await
                .is_err());
        }
    }

    mod waiting {
        use super::*;

        #[tokio::test]
        async fn test_wait_for_element_added_later() {
            let engine = Arc::new(MockEngine::new());
            let writer = engine.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                writer.with_dom(|dom| {
                    dom.insert("#late", MockElement::new());
                });
            });

            let options = WaitOptions::new().with_timeout(1_000).with_poll_interval(5);
            engine
                .wait_for(&Selector::css("#late"), ElementState::Visible, options)
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_hidden_state_counts_absent() {
            let engine = MockEngine::new();
            let options = WaitOptions::new().with_timeout(0);
            engine
                .wait_for(&Selector::css("#gone"), ElementState::Hidden, options)
                .await
                .unwrap();
            let err = engine
                .wait_for(&Selector::css("#gone"), ElementState::Attached, options)
                .await
                .unwrap_err();
            assert!(err.to_string().contains("'#gone' to be attached"));
        }
    }

    mod dialogs {
        use super::*;

        #[tokio::test]
        async fn test_click_raising_dialog_reaches_subscription() {
            let engine = MockEngine::new();
            engine.with_dom(|dom| {
                dom.insert("#delete", MockElement::new());
            });
            engine.on_click("#delete", |dom| dom.raise_dialog(Dialog::confirm("Delete item?")));

            let sub = engine.dialogs().subscribe(DialogPolicy::Accept);
            engine
                .click(&Selector::css("#delete"), ClickOptions::default())
                .await
                .unwrap();
            let dialog = sub.handled(100).await.unwrap();
            assert_eq!(dialog.message(), "Delete item?");
            assert_eq!(dialog.action(), &DialogAction::Accept);
        }
    }

    #[tokio::test]
    async fn test_navigate_handler_and_close() {
        let engine = MockEngine::new();
        engine.on_navigate(|dom, url| dom.set_title(format!("at {url}")));
        engine.navigate("https://shop.test/").await.unwrap();
        assert_eq!(engine.title().await.unwrap(), "at https://shop.test/");
        assert_eq!(engine.screenshot().await.unwrap(), MOCK_SCREENSHOT);

        engine.close().await.unwrap();
        assert!(engine.is_closed());
    }
}
