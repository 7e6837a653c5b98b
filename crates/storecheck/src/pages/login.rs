//! Login screen.

use crate::interaction::Interactions;
use crate::locator::Locator;
use crate::page_object::PageObject;
use crate::result::CheckResult;

/// Login form of the storefront
#[derive(Debug, Clone)]
pub struct LoginPage {
    page: Interactions,
    username_field: Locator,
    password_field: Locator,
    login_button: Locator,
    error_banner: Locator,
    login_screen_check: Locator,
}

impl LoginPage {
    /// Create the page over `page`
    #[must_use]
    pub fn new(page: Interactions) -> Self {
        Self {
            page,
            username_field: Locator::new("#user-name"),
            password_field: Locator::new("#password"),
            login_button: Locator::new("#login-button"),
            error_banner: Locator::new(r#"h3[data-test="error"]"#),
            login_screen_check: Locator::new("input#login-button"),
        }
    }

    /// Open the login screen and submit `username` and `password`
    ///
    /// # Errors
    ///
    /// Propagates navigation failures and wait timeouts on the form fields.
    pub async fn login(&self, username: &str, password: &str) -> CheckResult<()> {
        tracing::info!(%username, "logging in");
        self.page.navigate("/").await?;
        self.page.clear_and_fill(&self.username_field, username).await?;
        self.page.clear_and_fill(&self.password_field, password).await?;
        self.page.click(&self.login_button).await
    }

    /// Text of the error banner once it is visible
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Timeout`](crate::CheckError::Timeout) when no
    /// error banner becomes visible.
    pub async fn error_message(&self) -> CheckResult<String> {
        self.page.wait_for_visibility(&self.error_banner, None).await?;
        Ok(self.page.get_text(&self.error_banner).await?.unwrap_or_default())
    }

    /// Whether the login form is showing
    ///
    /// # Errors
    ///
    /// Propagates engine errors other than the probe timing out.
    pub async fn is_login_screen_visible(&self) -> CheckResult<bool> {
        self.page.is_element_visible(&self.login_screen_check).await
    }

    /// Username input
    #[must_use]
    pub const fn username_field(&self) -> &Locator {
        &self.username_field
    }

    /// Password input
    #[must_use]
    pub const fn password_field(&self) -> &Locator {
        &self.password_field
    }

    /// Submit button
    #[must_use]
    pub const fn login_button(&self) -> &Locator {
        &self.login_button
    }

    /// Error banner
    #[must_use]
    pub const fn error_banner(&self) -> &Locator {
        &self.error_banner
    }
}

impl PageObject for LoginPage {
    fn url_pattern(&self) -> &str {
        "/"
    }

    fn page(&self) -> &Interactions {
        &self.page
    }

    fn ready_marker(&self) -> &Locator {
        &self.login_screen_check
    }

    fn page_name(&self) -> &str {
        "login"
    }
}
