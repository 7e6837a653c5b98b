//! Built-in Storefront Scenarios
//!
//! The regression suite shipped with the crate. UI scenarios drive the login
//! and products pages; API scenarios exercise the `/users` endpoint of the
//! configured API base URL.
//!
//! | Name | Tag |
//! |------|-----|
//! | `UA_TC01` .. `UA_TC05` authentication | `ui` |
//! | `PB_TC01` .. `PB_TC03` product browsing | `ui` |
//! | `GET /users`, `POST /users` | `api` |

use crate::assertion::{AssertionMode, SortOrder};
use crate::fixture::ScenarioContext;
use crate::pages::SortOption;
use crate::result::CheckResult;
use crate::runner::{Scenario, Suite};
use serde_json::{json, Value};

/// Name of the built-in suite
pub const SUITE_NAME: &str = "storefront";

/// Error text for unknown credentials
pub const BAD_CREDENTIALS_ERROR: &str = "Username and password do not match any user in this service";

/// Error text for the locked-out account
pub const LOCKED_OUT_ERROR: &str = "Sorry, this user has been locked out.";

/// Heading of the products page
pub const PRODUCTS_TITLE: &str = "Products";

const UNKNOWN_USER: &str = "invalid_user";
const WRONG_PASSWORD: &str = "Invalid Password";

/// Every built-in scenario, UI first
#[must_use]
pub fn builtin_suite() -> Suite {
    let mut suite = Suite::new(SUITE_NAME);
    for scenario in ui_scenarios().into_iter().chain(api_scenarios()) {
        suite.add(scenario);
    }
    suite
}

/// Authentication and product browsing scenarios
#[must_use]
pub fn ui_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("UA_TC01 Login with valid credentials", |ctx| async move {
            log_in(&ctx).await?;
            expect_products_page(&ctx).await
        }),
        Scenario::new("UA_TC02 Login with invalid username", |ctx| async move {
            let password = ctx.config().password.clone();
            ctx.login_page().login(UNKNOWN_USER, &password).await?;
            expect_login_error(&ctx, BAD_CREDENTIALS_ERROR).await
        }),
        Scenario::new("UA_TC03 Login with invalid password", |ctx| async move {
            let username = ctx.config().username.clone();
            ctx.login_page().login(&username, WRONG_PASSWORD).await?;
            expect_login_error(&ctx, BAD_CREDENTIALS_ERROR).await
        }),
        Scenario::new("UA_TC04 Login with locked out user", |ctx| async move {
            let config = ctx.config();
            ctx.login_page()
                .login(&config.locked_user, &config.password)
                .await?;
            expect_login_error(&ctx, LOCKED_OUT_ERROR).await
        }),
        Scenario::new("UA_TC05 Logout", |ctx| async move {
            log_in(&ctx).await?;
            expect_products_page(&ctx).await?;
            ctx.home_page().logout().await?;
            let visible = ctx.login_page().is_login_screen_visible().await?;
            ctx.ui()
                .assert_that(visible, "Login Screen Displayed", AssertionMode::Hard)
        }),
        Scenario::new("PB_TC01 View product list", |ctx| async move {
            log_in(&ctx).await?;
            ctx.home_page().verify_all_products_links().await
        }),
        Scenario::new("PB_TC02 Sort products by price low to high", |ctx| async move {
            log_in(&ctx).await?;
            expect_sorted(&ctx, SortOption::PriceAsc, "price", SortOrder::Asc).await
        }),
        Scenario::new("PB_TC03 Sort products by name Z to A", |ctx| async move {
            log_in(&ctx).await?;
            expect_sorted(&ctx, SortOption::NameDesc, "name", SortOrder::Desc).await
        }),
    ]
    .into_iter()
    .map(|scenario| scenario.with_tag("ui"))
    .collect()
}

/// `/users` endpoint scenarios
#[must_use]
pub fn api_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("GET /users", |ctx| async move {
            let response = ctx.api().get("/users").await?;
            ctx.api_assertions()
                .assert_truthy(&response.ok(), AssertionMode::Hard)
        }),
        Scenario::new("POST /users", |ctx| async move {
            let payload = json!({ "name": "John Doe", "age": 30 });
            let response = ctx.api().post("/users", &payload).await?;
            ctx.api_assertions()
                .assert_truthy(&response.ok(), AssertionMode::Hard)?;
            tracing::info!(status = response.status, body = response.text(), "user created");
            Ok(())
        }),
    ]
    .into_iter()
    .map(|scenario| scenario.with_tag("api").without_browser())
    .collect()
}

async fn log_in(ctx: &ScenarioContext) -> CheckResult<()> {
    let config = ctx.config();
    ctx.login_page().login(&config.username, &config.password).await
}

async fn expect_products_page(ctx: &ScenarioContext) -> CheckResult<()> {
    ctx.home_page().verify_welcome_message().await?;
    let title = ctx.home_page().title().await?;
    ctx.ui()
        .assert_equal(title.as_str(), PRODUCTS_TITLE, AssertionMode::Hard)
}

async fn expect_login_error(ctx: &ScenarioContext, expected: &str) -> CheckResult<()> {
    let message = ctx.login_page().error_message().await?;
    ctx.ui().assert_contains(
        &Value::String(message),
        &Value::String(expected.to_string()),
        AssertionMode::Hard,
    )
}

async fn expect_sorted(ctx: &ScenarioContext, option: SortOption, field: &str, order: SortOrder) -> CheckResult<()> {
    let home = ctx.home_page();
    home.verify_welcome_message().await?;
    home.sort_products(option).await?;
    let cards: Vec<Value> = home
        .product_cards()
        .await?
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()?;
    ctx.ui()
        .assert_that(!cards.is_empty(), "expected >0 products", AssertionMode::Hard)?;
    ctx.ui().assert_sorted(&cards, field, order, AssertionMode::Hard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_suite_layout() {
        let suite = builtin_suite();
        assert_eq!(suite.name(), SUITE_NAME);
        assert_eq!(suite.len(), 10);
        assert_eq!(suite.filter(None, Some("ui")).len(), 8);
        assert_eq!(suite.filter(None, Some("api")).names(), vec!["GET /users", "POST /users"]);
    }

    #[test]
    fn test_only_ui_scenarios_launch_a_browser() {
        assert!(ui_scenarios().iter().all(Scenario::needs_browser));
        assert!(!api_scenarios().iter().any(Scenario::needs_browser));
    }

    #[test]
    fn test_names_are_unique() {
        let suite = builtin_suite();
        let mut names = suite.names();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), suite.len());
    }

    #[test]
    fn test_filter_by_case_id() {
        let suite = builtin_suite().filter(Some("ua_tc04"), None);
        assert_eq!(suite.names(), vec!["UA_TC04 Login with locked out user"]);
    }
}
