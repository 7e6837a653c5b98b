//! Page Object Model Support
//!
//! Each screen of the storefront is one page object holding its locators and
//! an [`Interactions`] handle. Scenarios call business actions on page
//! objects; selectors never leak into scenario code.

use crate::interaction::Interactions;
use crate::locator::Locator;
use crate::result::CheckResult;
use async_trait::async_trait;
use reqwest::Url;
use std::collections::HashMap;

/// Default time a page gets to show its ready marker
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 30_000;

/// A screen of the application under test
///
/// # Example
///
/// ```ignore
/// struct CartPage {
///     page: Interactions,
///     checkout: Locator,
/// }
///
/// impl PageObject for CartPage {
///     fn url_pattern(&self) -> &str {
///         "cart.html"
///     }
///
///     fn page(&self) -> &Interactions {
///         &self.page
///     }
///
///     fn ready_marker(&self) -> &Locator {
///         &self.checkout
///     }
/// }
/// ```
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Trailing URL path pattern of this page, e.g. `inventory.html`
    fn url_pattern(&self) -> &str;

    /// Interaction handle the page drives
    fn page(&self) -> &Interactions;

    /// Element whose visibility means the page is ready
    fn ready_marker(&self) -> &Locator;

    /// Maximum wait for [`wait_until_loaded`](Self::wait_until_loaded)
    fn load_timeout_ms(&self) -> u64 {
        DEFAULT_LOAD_TIMEOUT_MS
    }

    /// Page name for logging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Wait until the ready marker is visible
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`](crate::CheckError::Timeout) when the
    /// marker does not appear within [`load_timeout_ms`](Self::load_timeout_ms).
    async fn wait_until_loaded(&self) -> CheckResult<()> {
        tracing::debug!(page = self.page_name(), "waiting for page load");
        self.page()
            .wait_for_visibility(self.ready_marker(), Some(self.load_timeout_ms()))
            .await
    }

    /// Whether the browser is currently on this page
    ///
    /// # Errors
    ///
    /// Propagates engine errors while reading the URL.
    async fn is_current(&self) -> CheckResult<bool> {
        let url = self.page().current_url().await?;
        Ok(UrlMatcher::new(self.url_pattern()).matches(&url))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UrlSegment {
    Literal(String),
    Wildcard,
    Parameter(String),
}

/// Matches the trailing segments of a URL path against a pattern
///
/// Patterns support literal segments (`inventory.html`), wildcards
/// (`item/*`) and named parameters (`item/:id`). The pattern is anchored at
/// the end of the path, so `inventory.html` matches both
/// `/inventory.html` and `/v1/inventory.html`. The empty pattern `/`
/// matches only the site root.
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    pattern: String,
    segments: Vec<UrlSegment>,
}

fn path_segments(url: &str) -> Vec<String> {
    let path = Url::parse(url).map_or_else(|_| url.to_string(), |u| u.path().to_string());
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl UrlMatcher {
    /// Compile `pattern`
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    UrlSegment::Wildcard
                } else if let Some(name) = s.strip_prefix(':') {
                    UrlSegment::Parameter(name.to_string())
                } else {
                    UrlSegment::Literal(s.to_string())
                }
            })
            .collect();
        Self {
            pattern: pattern.to_string(),
            segments,
        }
    }

    /// Source pattern
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn tail<'a>(&self, segments: &'a [String]) -> Option<&'a [String]> {
        if self.segments.is_empty() {
            return segments.is_empty().then_some(segments);
        }
        segments
            .len()
            .checked_sub(self.segments.len())
            .map(|start| &segments[start..])
    }

    /// Whether `url` (absolute or a bare path) matches
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        let segments = path_segments(url);
        self.tail(&segments).is_some_and(|tail| {
            self.segments.iter().zip(tail).all(|(pattern, actual)| match pattern {
                UrlSegment::Literal(literal) => literal == actual,
                UrlSegment::Wildcard | UrlSegment::Parameter(_) => true,
            })
        })
    }

    /// Named parameters captured from a matching `url`
    #[must_use]
    pub fn extract_params(&self, url: &str) -> HashMap<String, String> {
        let segments = path_segments(url);
        let Some(tail) = self.tail(&segments) else {
            return HashMap::new();
        };
        self.segments
            .iter()
            .zip(tail)
            .filter_map(|(pattern, actual)| match pattern {
                UrlSegment::Parameter(name) => Some((name.clone(), actual.clone())),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockEngine};
    use std::sync::Arc;

    mod url_matcher {
        use super::*;

        #[test]
        fn test_trailing_literal() {
            let matcher = UrlMatcher::new("inventory.html");
            assert!(matcher.matches("https://shop.test/inventory.html"));
            assert!(matcher.matches("https://shop.test/v1/inventory.html"));
            assert!(!matcher.matches("https://shop.test/cart.html"));
        }

        #[test]
        fn test_root_pattern() {
            let matcher = UrlMatcher::new("/");
            assert!(matcher.matches("https://shop.test/"));
            assert!(!matcher.matches("https://shop.test/inventory.html"));
        }

        #[test]
        fn test_parameters() {
            let matcher = UrlMatcher::new("item/:id");
            assert!(matcher.matches("/v1/item/4"));
            assert_eq!(matcher.extract_params("/v1/item/4").get("id").map(String::as_str), Some("4"));
            assert!(matcher.extract_params("/").is_empty());
        }
    }

    struct Banner {
        page: Interactions,
        marker: Locator,
    }

    impl PageObject for Banner {
        fn url_pattern(&self) -> &str {
            "banner.html"
        }

        fn page(&self) -> &Interactions {
            &self.page
        }

        fn ready_marker(&self) -> &Locator {
            &self.marker
        }

        fn load_timeout_ms(&self) -> u64 {
            20
        }
    }

    #[tokio::test]
    async fn test_wait_until_loaded_and_is_current() {
        let engine = Arc::new(MockEngine::new());
        let banner = Banner {
            page: Interactions::new(engine.clone()),
            marker: Locator::new(".banner"),
        };
        assert!(banner.wait_until_loaded().await.unwrap_err().is_timeout());

        engine.with_dom(|dom| {
            dom.set_url("https://shop.test/banner.html");
            dom.insert(".banner", MockElement::new());
        });
        banner.wait_until_loaded().await.unwrap();
        assert!(banner.is_current().await.unwrap());
        assert!(banner.page_name().ends_with("Banner"));
    }
}
