//! Locator abstraction for element selection.
//!
//! A [`Locator`] is an opaque handle a page object declares for one of its
//! elements. Engines resolve it through its [`Selector`], either natively or
//! by evaluating the JavaScript query the selector renders to.

use serde_json::Value;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "button#login-button")
    Css(String),
    /// Leaf element whose text contains the given string
    Text(String),
    /// Test ID selector (data-test attribute)
    TestId(String),
    /// The `index`-th match of `base` (zero-based)
    Nth {
        /// Selector producing the candidates
        base: Box<Selector>,
        /// Zero-based position
        index: usize,
    },
    /// Matches of `child` searched inside each match of `parent`
    Within {
        /// Scope selector
        parent: Box<Selector>,
        /// Selector evaluated inside the scope
        child: Box<Selector>,
    },
}

/// Render a Rust string as a JavaScript string literal
fn js_str(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Select the `index`-th match of this selector
    #[must_use]
    pub fn nth(self, index: usize) -> Self {
        Self::Nth {
            base: Box::new(self),
            index,
        }
    }

    /// Select `child` inside every match of this selector
    #[must_use]
    pub fn within(self, child: Self) -> Self {
        Self::Within {
            parent: Box::new(self),
            child: Box::new(child),
        }
    }

    /// JavaScript expression evaluating to the array of matches below `root`
    #[must_use]
    pub fn to_all_query_from(&self, root: &str) -> String {
        match self {
            Self::Css(s) => format!("Array.from({root}.querySelectorAll({}))", js_str(s)),
            Self::Text(t) => format!(
                "Array.from({root}.querySelectorAll('*')).filter(el => el.children.length === 0 && el.textContent.includes({}))",
                js_str(t)
            ),
            Self::TestId(id) => format!(
                "Array.from({root}.querySelectorAll({}))",
                js_str(&format!("[data-test=\"{id}\"]"))
            ),
            Self::Nth { base, index } => {
                format!("[({})[{index}]].filter(Boolean)", base.to_all_query_from(root))
            }
            Self::Within { parent, child } => format!(
                "({}).flatMap(__scope => {})",
                parent.to_all_query_from(root),
                child.to_all_query_from("__scope")
            ),
        }
    }

    /// JavaScript expression evaluating to the array of matches in the document
    #[must_use]
    pub fn to_all_query(&self) -> String {
        self.to_all_query_from("document")
    }

    /// JavaScript expression evaluating to the first match or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("(({})[0] ?? null)", self.to_all_query())
    }

    /// JavaScript expression counting matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("({}).length", self.to_all_query())
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => f.write_str(s),
            Self::Text(t) => write!(f, "text={}", js_str(t)),
            Self::TestId(id) => write!(f, "[data-test=\"{id}\"]"),
            Self::Nth { base, index } => write!(f, "{base} >> nth={index}"),
            Self::Within { parent, child } => write!(f, "{parent} >> {child}"),
        }
    }
}

/// A handle to one element (or element family) declared by a page object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    selector: Selector,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(css: impl Into<String>) -> Self {
        Self {
            selector: Selector::Css(css.into()),
        }
    }

    /// Create a locator from a selector
    #[must_use]
    pub const fn from_selector(selector: Selector) -> Self {
        Self { selector }
    }

    /// Narrow to the `index`-th match
    #[must_use]
    pub fn nth(&self, index: usize) -> Self {
        Self::from_selector(self.selector.clone().nth(index))
    }

    /// Locate `child` (CSS) inside this locator's matches
    #[must_use]
    pub fn locate(&self, child: impl Into<String>) -> Self {
        Self::from_selector(self.selector.clone().within(Selector::css(child)))
    }

    /// The underlying selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.selector)
    }
}

impl From<&str> for Locator {
    fn from(css: &str) -> Self {
        Self::new(css)
    }
}
