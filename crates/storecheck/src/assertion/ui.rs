//! UI Assertions
//!
//! Typed checks over page state and plain values. Each check reads what it
//! needs through [`Interactions`], builds an [`AssertionOutcome`] whose
//! message carries the expected and actual values, and routes it to the
//! scenario's [`AssertionLedger`] by [`AssertionMode`].

use super::order::{is_sorted, SortOrder};
use super::{display_value, AssertionLedger, AssertionMode, AssertionOutcome, Truthy};
use crate::interaction::Interactions;
use crate::locator::Locator;
use crate::result::{CheckError, CheckResult};
use serde::Serialize;
use serde_json::Value;
use std::fmt::{Debug, Display};
use std::sync::Arc;

/// Assertion facade for UI scenarios
#[derive(Debug, Clone)]
pub struct UiAssertions {
    ledger: Arc<AssertionLedger>,
    page: Interactions,
}

impl UiAssertions {
    /// Create a facade that reads through `page` and records into `ledger`
    #[must_use]
    pub const fn new(ledger: Arc<AssertionLedger>, page: Interactions) -> Self {
        Self { ledger, page }
    }

    /// The ledger outcomes are routed to
    #[must_use]
    pub fn ledger(&self) -> &Arc<AssertionLedger> {
        &self.ledger
    }

    fn record(&self, mode: AssertionMode, passed: bool, message: String) -> CheckResult<()> {
        self.ledger.check(mode, AssertionOutcome::new(passed, message))
    }

    /// Assert an arbitrary condition with a caller-supplied message
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::AssertionFailed`] in hard mode when `condition`
    /// is false.
    pub fn assert_that(&self, condition: bool, message: impl Into<String>, mode: AssertionMode) -> CheckResult<()> {
        self.record(mode, condition, message.into())
    }

    // =========================================================================
    // ELEMENT STATE
    // =========================================================================

    /// Assert the element is visible
    ///
    /// # Errors
    ///
    /// Hard-mode failure, or an engine error while reading the page.
    pub async fn assert_visible(&self, locator: &Locator, mode: AssertionMode) -> CheckResult<()> {
        let visible = self.page.is_visible(locator).await?;
        self.record(mode, visible, format!("Expected element {locator} to be visible."))
    }

    /// Assert the element is not visible
    ///
    /// # Errors
    ///
    /// Hard-mode failure, or an engine error while reading the page.
    pub async fn assert_not_visible(&self, locator: &Locator, mode: AssertionMode) -> CheckResult<()> {
        let visible = self.page.is_visible(locator).await?;
        self.record(mode, !visible, format!("Expected element {locator} to not be visible."))
    }

    /// Assert the element's text equals `expected`
    ///
    /// # Errors
    ///
    /// Hard-mode failure, or an engine error while reading the page.
    pub async fn assert_text(&self, locator: &Locator, expected: &str, mode: AssertionMode) -> CheckResult<()> {
        let actual = self.page.get_text(locator).await?;
        let shown = actual.as_deref().unwrap_or("null");
        self.record(
            mode,
            actual.as_deref() == Some(expected),
            format!("Expected text: '{expected}', but got: '{shown}'."),
        )
    }

    /// Assert a page title equals `expected`
    ///
    /// # Errors
    ///
    /// Hard-mode failure.
    pub fn assert_page_title(&self, actual: &str, expected: &str, mode: AssertionMode) -> CheckResult<()> {
        self.record(
            mode,
            actual == expected,
            format!("Expected title: {expected}, but got: {actual}."),
        )
    }

    /// Assert the element is checked
    ///
    /// # Errors
    ///
    /// Hard-mode failure, or an engine error when nothing matches.
    pub async fn assert_checked(&self, locator: &Locator, mode: AssertionMode) -> CheckResult<()> {
        let checked = self.page.is_checked(locator).await?;
        self.record(mode, checked, format!("Expected element {locator} to be checked."))
    }

    /// Assert the element is unchecked
    ///
    /// # Errors
    ///
    /// Hard-mode failure, or an engine error when nothing matches.
    pub async fn assert_unchecked(&self, locator: &Locator, mode: AssertionMode) -> CheckResult<()> {
        let checked = self.page.is_checked(locator).await?;
        self.record(mode, !checked, format!("Expected element {locator} to be unchecked."))
    }

    /// Assert an attribute of the element equals `expected`
    ///
    /// # Errors
    ///
    /// Hard-mode failure, or an engine error while reading the page.
    pub async fn assert_attribute(
        &self,
        locator: &Locator,
        attribute: &str,
        expected: &str,
        mode: AssertionMode,
    ) -> CheckResult<()> {
        let actual = self.page.get_attribute(locator, attribute).await?;
        let shown = actual.as_deref().unwrap_or("null");
        self.record(
            mode,
            actual.as_deref() == Some(expected),
            format!("Expected attribute '{attribute}' to be '{expected}', but got: '{shown}'."),
        )
    }

    /// Assert the element is enabled
    ///
    /// # Errors
    ///
    /// Hard-mode failure, or an engine error when nothing matches.
    pub async fn assert_enabled(&self, locator: &Locator, mode: AssertionMode) -> CheckResult<()> {
        let enabled = self.page.is_enabled(locator).await?;
        self.record(mode, enabled, format!("Expected element {locator} to be enabled."))
    }

    // =========================================================================
    // VALUES
    // =========================================================================

    /// Assert two values are equal
    ///
    /// # Errors
    ///
    /// Hard-mode failure.
    pub fn assert_equal<T>(&self, actual: &T, expected: &T, mode: AssertionMode) -> CheckResult<()>
    where
        T: PartialEq + Display + ?Sized,
    {
        self.record(
            mode,
            actual == expected,
            format!("Expected value: {expected}, but got: {actual}."),
        )
    }

    /// Assert two sequences serialize to the same JSON
    ///
    /// # Errors
    ///
    /// Hard-mode failure, or [`CheckError::Json`] if an item cannot be
    /// serialized.
    pub fn assert_lists_equal<T: Serialize>(&self, actual: &[T], expected: &[T], mode: AssertionMode) -> CheckResult<()> {
        let actual = serde_json::to_string(actual)?;
        let expected = serde_json::to_string(expected)?;
        self.record(
            mode,
            actual == expected,
            format!("Expected list: {expected}, but got: {actual}."),
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

    /// Assert a JSON value is `null`
    ///
    /// # Errors
    ///
    /// Hard-mode failure.
    pub fn assert_null(&self, value: &Value, mode: AssertionMode) -> CheckResult<()> {
        self.record(
            mode,
            value.is_null(),
            format!("Expected value to be null, but got: {}.", display_value(value)),
        )
    }

    /// Assert a value is absent
    ///
    /// # Errors
    ///
    /// Hard-mode failure.
    pub fn assert_undefined(&self, value: Option<&Value>, mode: AssertionMode) -> CheckResult<()> {
        let shown = value.map_or_else(|| "undefined".to_string(), display_value);
        self.record(
            mode,
            value.is_none(),
            format!("Expected value to be undefined, but got: {shown}."),
        )
    }

    /// Assert `actual > reference`
    ///
    /// # Errors
    ///
    /// Hard-mode failure.
    pub fn assert_greater_than<T>(&self, actual: T, reference: T, mode: AssertionMode) -> CheckResult<()>
    where
        T: PartialOrd + Display,
    {
        self.record(
            mode,
            actual > reference,
            format!("Expected value: {actual} to be greater than: {reference}."),
        )
    }

    /// Assert `actual` contains `expected`
    ///
    /// A string contains a substring; an array contains an equal element.
    ///
    /// # Errors
    ///
    /// Hard-mode failure, or [`CheckError::TypeMismatch`] when `actual` is
    /// neither a string nor an array, or a string is searched for a
    /// non-string.
    pub fn assert_contains(&self, actual: &Value, expected: &Value, mode: AssertionMode) -> CheckResult<()> {
        let found = match (actual, expected) {
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
            (Value::String(_), other) => {
                return Err(CheckError::TypeMismatch {
                    check: "contains",
                    expected: "string needle for a string value",
                    actual: other.to_string(),
                })
            }
            (Value::Array(items), needle) => items.contains(needle),
            (other, _) => {
                return Err(CheckError::TypeMismatch {
                    check: "contains",
                    expected: "string or array",
                    actual: other.to_string(),
                })
            }
        };
        self.record(
            mode,
            found,
            format!(
                "Expected value: '{}' to contain: '{}'.",
                display_value(actual),
                display_value(expected)
            ),
        )
    }

    /// Assert `field` of every item is ordered by `order`
    ///
    /// # Errors
    ///
    /// Hard-mode failure, or [`CheckError::TypeMismatch`] for items that
    /// cannot be compared on `field`.
    pub fn assert_sorted(&self, items: &[Value], field: &str, order: SortOrder, mode: AssertionMode) -> CheckResult<()> {
        let sorted = is_sorted(items, field, order)?;
        let observed = Value::from(items.iter().filter_map(|item| item.get(field).cloned()).collect::<Vec<_>>());
        self.record(
            mode,
            sorted,
            format!("Expected items to be sorted by '{field}' in {order} order, but got: {observed}."),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockEngine};
    use serde_json::json;

    fn facade() -> (UiAssertions, Arc<MockEngine>) {
        let engine = Arc::new(MockEngine::new());
        engine.with_dom(|dom| {
            dom.insert(".title", MockElement::new().with_text("Products"));
            dom.insert("#spinner", MockElement::new().hidden());
            dom.insert("#remember", MockElement::new().checked());
            dom.insert("a.logout", MockElement::new().with_attr("href", "#"));
            dom.insert("#submit", MockElement::new().disabled());
        });
        let page = Interactions::new(engine.clone()).with_default_timeout(50);
        let ui = UiAssertions::new(Arc::new(AssertionLedger::for_scenario("ui")), page);
        (ui, engine)
    }

    mod page_state {
        use super::*;

        #[tokio::test]
        async fn test_visibility_checks() {
            let (ui, _engine) = facade();
            ui.assert_visible(&Locator::new(".title"), AssertionMode::Hard).await.unwrap();
            ui.assert_not_visible(&Locator::new("#spinner"), AssertionMode::Hard).await.unwrap();

            let err = ui
                .assert_visible(&Locator::new("#spinner"), AssertionMode::Hard)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Expected element #spinner to be visible.");
        }

        #[tokio::test]
        async fn test_text_message_quotes_both_sides() {
            let (ui, _engine) = facade();
            let err = ui
                .assert_text(&Locator::new(".title"), "Cart", AssertionMode::Hard)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Expected text: 'Cart', but got: 'Products'.");
        }

        #[tokio::test]
        async fn test_checked_attribute_enabled() {
            let (ui, _engine) = facade();
            let remember = Locator::new("#remember");
            ui.assert_checked(&remember, AssertionMode::Hard).await.unwrap();
            assert!(ui.assert_unchecked(&remember, AssertionMode::Hard).await.is_err());

            ui.assert_attribute(&Locator::new("a.logout"), "href", "#", AssertionMode::Hard)
                .await
                .unwrap();

            let err = ui
                .assert_enabled(&Locator::new("#submit"), AssertionMode::Hard)
                .await
                .unwrap_err();
            assert!(err.to_string().contains("to be enabled"));
        }

        #[tokio::test]
        async fn test_soft_failures_are_buffered() {
            let (ui, _engine) = facade();
            ui.assert_visible(&Locator::new("#missing"), AssertionMode::Soft).await.unwrap();
            ui.assert_text(&Locator::new(".title"), "Cart", AssertionMode::Soft).await.unwrap();
            assert_eq!(ui.ledger().pending(), 2);

            let err = ui.ledger().verify_soft_assertions().unwrap_err();
            assert_eq!(
                err.to_string(),
                "Soft Assertion Failures:\nExpected element #missing to be visible.\nExpected text: 'Cart', but got: 'Products'."
            );
        }
    }

    mod values {
        use super::*;

        #[test]
        fn test_equal_and_title() {
            let (ui, _engine) = facade();
            ui.assert_equal(&3, &3, AssertionMode::Hard).unwrap();
            let err = ui.assert_page_title("Swag Labs", "Products", AssertionMode::Hard).unwrap_err();
            assert_eq!(err.to_string(), "Expected title: Products, but got: Swag Labs.");
        }

        #[test]
        fn test_lists_compare_serialized() {
            let (ui, _engine) = facade();
            ui.assert_lists_equal(&["a", "b"], &["a", "b"], AssertionMode::Hard).unwrap();
            let err = ui.assert_lists_equal(&["b", "a"], &["a", "b"], AssertionMode::Hard).unwrap_err();
            assert_eq!(err.to_string(), r#"Expected list: ["a","b"], but got: ["b","a"]."#);
        }

        #[test]
        fn test_truthiness_family() {
            let (ui, _engine) = facade();
            ui.assert_truthy(&true, AssertionMode::Hard).unwrap();
            ui.assert_falsy(&"", AssertionMode::Hard).unwrap();
            ui.assert_null(&Value::Null, AssertionMode::Hard).unwrap();
            ui.assert_undefined(None, AssertionMode::Hard).unwrap();

            let err = ui.assert_truthy(&false, AssertionMode::Hard).unwrap_err();
            assert_eq!(err.to_string(), "Expected value to be truthy, but got: false.");
            let err = ui.assert_undefined(Some(&json!(1)), AssertionMode::Hard).unwrap_err();
            assert_eq!(err.to_string(), "Expected value to be undefined, but got: 1.");
        }

        #[test]
        fn test_greater_than() {
            let (ui, _engine) = facade();
            ui.assert_greater_than(6, 0, AssertionMode::Hard).unwrap();
            let err = ui.assert_greater_than(0, 0, AssertionMode::Hard).unwrap_err();
            assert_eq!(err.to_string(), "Expected value: 0 to be greater than: 0.");
        }
    }

    mod contains {
        use super::*;

        #[test]
        fn test_substring_and_membership() {
            let (ui, _engine) = facade();
            ui.assert_contains(&json!("Sauce Labs Backpack"), &json!("Backpack"), AssertionMode::Hard)
                .unwrap();
            ui.assert_contains(&json!([1, 2, 3]), &json!(2), AssertionMode::Hard).unwrap();

            let err = ui
                .assert_contains(&json!("Onesie"), &json!("Backpack"), AssertionMode::Hard)
                .unwrap_err();
            assert_eq!(err.to_string(), "Expected value: 'Onesie' to contain: 'Backpack'.");
        }

        #[test]
        fn test_number_is_type_mismatch() {
            let (ui, _engine) = facade();
            let err = ui
                .assert_contains(&json!(42), &json!(4), AssertionMode::Soft)
                .unwrap_err();
            assert!(matches!(err, CheckError::TypeMismatch { check: "contains", .. }));
            assert_eq!(ui.ledger().pending(), 0);
        }
    }

    mod sorting {
        use super::*;

        #[test]
        fn test_sorted_prices() {
            let (ui, _engine) = facade();
            let items = vec![json!({"price": 7.99}), json!({"price": 9.99}), json!({"price": 49.99})];
            ui.assert_sorted(&items, "price", SortOrder::Asc, AssertionMode::Hard).unwrap();

            let err = ui
                .assert_sorted(&items, "price", SortOrder::Desc, AssertionMode::Hard)
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Expected items to be sorted by 'price' in desc order, but got: [7.99,9.99,49.99]."
            );
        }
    }
}
