//! In-process stand-in for the demo storefront
//!
//! Scripts a [`MockEngine`] with the login form, the products page, the
//! sort dropdown and the burger-menu logout so built-in scenarios run end to
//! end without a browser.

#![allow(dead_code)]

use std::sync::Arc;
use storecheck::{BrowserEngine, CheckResult, EngineFactory, MockDom, MockElement, MockEngine, SuiteConfig};

pub const USERNAME: &str = "standard_user";
pub const PASSWORD: &str = "secret_sauce";
pub const LOCKED_USER: &str = "locked_out_user";
pub const BASE_URL: &str = "https://shop.test/v1/index.html";

const ERROR_BANNER: &str = r#"h3[data-test="error"]"#;
const SORT_SELECT: &str = ".product_sort_container";

pub const PRODUCTS: &[(&str, &str, f64)] = &[
    ("Sauce Labs Backpack", "carry.allTheThings()", 29.99),
    ("Sauce Labs Bike Light", "A red light isn't the desired state", 9.99),
    ("Sauce Labs Bolt T-Shirt", "Get your testing superhero on", 15.99),
    ("Sauce Labs Fleece Jacket", "It's not every day that you come across", 49.99),
    ("Sauce Labs Onesie", "Rib snap infant onesie", 7.99),
    ("Test.allTheThings() T-Shirt (Red)", "This classic Sauce Labs t-shirt", 15.99),
];

/// Storefront behaviour switches
#[derive(Debug, Clone, Copy, Default)]
pub struct Quirks {
    /// Render the first product's image hidden
    pub hidden_first_image: bool,
    /// Ignore the sort dropdown
    pub broken_sort: bool,
}

fn render_login(dom: &mut MockDom) {
    dom.clear();
    dom.set_title("Swag Labs");
    dom.insert("#user-name", MockElement::new());
    dom.insert("#password", MockElement::new());
    dom.insert("#login-button", MockElement::new().with_value("LOGIN"));
    dom.insert("input#login-button", MockElement::new().with_value("LOGIN"));
}

fn render_inventory(dom: &mut MockDom, order: &str, quirks: Quirks) {
    dom.clear();
    dom.set_title("Swag Labs");
    dom.insert(".title", MockElement::new().with_text("Products"));
    dom.insert("button#react-burger-menu-btn", MockElement::new().with_text("Open Menu"));
    dom.insert("a#logout_sidebar_link", MockElement::new().with_text("Logout"));
    dom.insert(
        SORT_SELECT,
        MockElement::new()
            .with_options(&[
                ("az", "Name (A to Z)"),
                ("za", "Name (Z to A)"),
                ("lohi", "Price (low to high)"),
                ("hilo", "Price (high to low)"),
            ])
            .with_value(order),
    );

    let mut products = PRODUCTS.to_vec();
    if !quirks.broken_sort {
        match order {
            "za" => products.sort_by(|a, b| b.0.cmp(a.0)),
            "lohi" => products.sort_by(|a, b| a.2.total_cmp(&b.2)),
            "hilo" => products.sort_by(|a, b| b.2.total_cmp(&a.2)),
            _ => products.sort_by(|a, b| a.0.cmp(b.0)),
        }
    }

    for (index, (name, description, price)) in products.into_iter().enumerate() {
        let card = dom.insert(".inventory_item", MockElement::new());
        let image = MockElement::new().with_attr("alt", name);
        let image = if quirks.hidden_first_image && index == 0 { image.hidden() } else { image };
        dom.insert_child(card, ".inventory_item_img img", image);
        dom.insert_child(card, ".inventory_item_name", MockElement::new().with_text(name));
        dom.insert_child(card, ".inventory_item_desc", MockElement::new().with_text(description));
        dom.insert_child(
            card,
            ".inventory_item_price",
            MockElement::new().with_text(format!("${price:.2}")),
        );
        dom.insert_child(card, ".pricebar button", MockElement::new().with_text("ADD TO CART"));
    }
}

fn show_error(dom: &mut MockDom, message: &str) {
    dom.remove(ERROR_BANNER);
    dom.insert(ERROR_BANNER, MockElement::new().with_text(format!("Epic sadface: {message}")));
}

/// A storefront engine with the given quirks
pub fn storefront_with(quirks: Quirks) -> MockEngine {
    let engine = MockEngine::new();
    engine.on_navigate(|dom, _url| render_login(dom));
    engine.on_click("#login-button", move |dom| {
        let username = dom.value("#user-name");
        let password = dom.value("#password");
        if username == LOCKED_USER && password == PASSWORD {
            show_error(dom, "Sorry, this user has been locked out.");
        } else if username == USERNAME && password == PASSWORD {
            render_inventory(dom, "az", quirks);
        } else {
            show_error(dom, "Username and password do not match any user in this service");
        }
    });
    engine.on_change(SORT_SELECT, move |dom| {
        let order = dom.value(SORT_SELECT);
        render_inventory(dom, &order, quirks);
    });
    engine.on_click("a#logout_sidebar_link", render_login);
    engine
}

/// A well-behaved storefront engine
pub fn storefront() -> MockEngine {
    storefront_with(Quirks::default())
}

/// Engine factory building a fresh storefront per attempt
pub fn factory(quirks: Quirks) -> Arc<dyn EngineFactory> {
    Arc::new(move || -> CheckResult<Arc<dyn BrowserEngine>> { Ok(Arc::new(storefront_with(quirks))) })
}

/// Suite configuration with the storefront's credentials
pub fn suite_config() -> SuiteConfig {
    SuiteConfig::default()
        .with_base_url(BASE_URL)
        .with_credentials(USERNAME, PASSWORD, LOCKED_USER)
}
