//! Products (inventory) screen.

use crate::assertion::{AssertionMode, UiAssertions};
use crate::interaction::Interactions;
use crate::locator::Locator;
use crate::page_object::PageObject;
use crate::result::{CheckError, CheckResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Entries of the product sort dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOption {
    /// Name (A to Z)
    #[serde(rename = "az")]
    NameAsc,
    /// Name (Z to A)
    #[serde(rename = "za")]
    NameDesc,
    /// Price (low to high)
    #[serde(rename = "lohi")]
    PriceAsc,
    /// Price (high to low)
    #[serde(rename = "hilo")]
    PriceDesc,
}

impl SortOption {
    /// `value` attribute of the `<option>`
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::NameAsc => "az",
            Self::NameDesc => "za",
            Self::PriceAsc => "lohi",
            Self::PriceDesc => "hilo",
        }
    }

    /// Visible label of the `<option>`
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NameAsc => "Name (A to Z)",
            Self::NameDesc => "Name (Z to A)",
            Self::PriceAsc => "Price (low to high)",
            Self::PriceDesc => "Price (high to low)",
        }
    }
}

impl FromStr for SortOption {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "az" => Ok(Self::NameAsc),
            "za" => Ok(Self::NameDesc),
            "lohi" => Ok(Self::PriceAsc),
            "hilo" => Ok(Self::PriceDesc),
            other => Err(CheckError::UnsupportedConfig {
                setting: "product sort",
                value: other.to_string(),
                expected: "az, za, lohi, hilo",
            }),
        }
    }
}

/// What one product card shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCard {
    /// Product name
    pub name: String,
    /// Description text
    pub description: String,
    /// Price in dollars
    pub price: f64,
}

/// Parse a displayed price such as `$29.99`
///
/// # Errors
///
/// Returns [`CheckError::TypeMismatch`] when the text is not a price.
pub fn parse_price(text: &str) -> CheckResult<f64> {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('$')
        .unwrap_or(trimmed)
        .parse::<f64>()
        .map_err(|_| CheckError::TypeMismatch {
            check: "product price",
            expected: "price such as $9.99",
            actual: text.to_string(),
        })
}

/// Product listing shown after a successful login
#[derive(Debug, Clone)]
pub struct HomePage {
    page: Interactions,
    ui: UiAssertions,
    title: Locator,
    menu_button: Locator,
    logout_link: Locator,
    product_card: Locator,
    sort_select: Locator,
}

const PRODUCT_IMAGE: &str = ".inventory_item_img img";
const PRODUCT_NAME: &str = ".inventory_item_name";
const PRODUCT_DESC: &str = ".inventory_item_desc";
const PRODUCT_PRICE: &str = ".inventory_item_price";
const PRODUCT_ADD_TO_CART: &str = ".pricebar button";

impl HomePage {
    /// Create the page over `page`, checking through `ui`
    #[must_use]
    pub fn new(page: Interactions, ui: UiAssertions) -> Self {
        Self {
            page,
            ui,
            title: Locator::new(".title"),
            menu_button: Locator::new("button#react-burger-menu-btn"),
            logout_link: Locator::new("a#logout_sidebar_link"),
            product_card: Locator::new(".inventory_item"),
            sort_select: Locator::new(".product_sort_container"),
        }
    }

    /// Wait for the page heading
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] when the heading never appears.
    pub async fn verify_welcome_message(&self) -> CheckResult<()> {
        self.page.wait_for_element(&self.title, None).await
    }

    /// Heading text, empty when absent
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub async fn title(&self) -> CheckResult<String> {
        Ok(self.page.get_text(&self.title).await?.unwrap_or_default())
    }

    /// Open the burger menu
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] when the menu button is not clickable.
    pub async fn open_menu(&self) -> CheckResult<()> {
        self.page.click(&self.menu_button).await
    }

    /// Click "Logout" in the open menu
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] when the link is not clickable.
    pub async fn click_logout(&self) -> CheckResult<()> {
        self.page.click(&self.logout_link).await
    }

    /// Open the menu and log out
    ///
    /// # Errors
    ///
    /// See [`open_menu`](Self::open_menu) and [`click_logout`](Self::click_logout).
    pub async fn logout(&self) -> CheckResult<()> {
        tracing::info!("logging out");
        self.open_menu().await?;
        self.click_logout().await
    }

    /// Check every product card shows its image, name, description, price
    /// and add-to-cart button
    ///
    /// An empty listing fails at once. Missing parts of a card are recorded
    /// as soft failures so one pass reports every broken card.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::AssertionFailed`] when there are no products, or
    /// a non-timeout engine error from a visibility probe.
    pub async fn verify_all_products_links(&self) -> CheckResult<()> {
        let count = self.page.count(&self.product_card).await?;
        self.ui
            .assert_that(count > 0, "expected >0 products", AssertionMode::Hard)?;

        for index in 0..count {
            let card = self.product_card.nth(index);
            for part in [PRODUCT_IMAGE, PRODUCT_NAME, PRODUCT_DESC, PRODUCT_PRICE, PRODUCT_ADD_TO_CART] {
                let visible = self.page.is_element_visible(&card.locate(part)).await?;
                self.ui.assert_that(
                    visible,
                    format!("Expected {part} of product {index} to be visible, but it is not."),
                    AssertionMode::Soft,
                )?;
            }
        }
        tracing::debug!(count, "product cards checked");
        Ok(())
    }

    /// Pick a sort order from the dropdown
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`] when the dropdown is not visible.
    pub async fn sort_products(&self, option: SortOption) -> CheckResult<()> {
        self.page.select_by_value(&self.sort_select, option.value()).await
    }

    /// Number of product cards
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub async fn product_count(&self) -> CheckResult<usize> {
        self.page.count(&self.product_card).await
    }

    async fn card_texts(&self, part: &str) -> CheckResult<Vec<String>> {
        let count = self.product_count().await?;
        let mut texts = Vec::with_capacity(count);
        for index in 0..count {
            let locator = self.product_card.nth(index).locate(part);
            texts.push(self.page.get_text(&locator).await?.unwrap_or_default());
        }
        Ok(texts)
    }

    /// Product names in display order
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub async fn product_names(&self) -> CheckResult<Vec<String>> {
        self.card_texts(PRODUCT_NAME).await
    }

    /// Product prices in display order
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::TypeMismatch`] for a price that does not parse.
    pub async fn product_prices(&self) -> CheckResult<Vec<f64>> {
        self.card_texts(PRODUCT_PRICE)
            .await?
            .iter()
            .map(|text| parse_price(text))
            .collect()
    }

    /// Every product card in display order
    ///
    /// # Errors
    ///
    /// See [`product_prices`](Self::product_prices).
    pub async fn product_cards(&self) -> CheckResult<Vec<ProductCard>> {
        let names = self.product_names().await?;
        let descriptions = self.card_texts(PRODUCT_DESC).await?;
        let prices = self.product_prices().await?;
        Ok(names
            .into_iter()
            .zip(descriptions)
            .zip(prices)
            .map(|((name, description), price)| ProductCard {
                name,
                description,
                price,
            })
            .collect())
    }
}

impl PageObject for HomePage {
    fn url_pattern(&self) -> &str {
        "inventory.html"
    }

    fn page(&self) -> &Interactions {
        &self.page
    }

    fn ready_marker(&self) -> &Locator {
        &self.title
    }

    fn page_name(&self) -> &str {
        "products"
    }
}
