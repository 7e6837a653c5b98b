//! Scenario Fixtures
//!
//! A [`ScenarioContext`] bundles everything one scenario attempt needs: its
//! own assertion ledger, an interaction helper over a fresh engine, both
//! assertion facades, the page objects and an initialized API session.
//! Nothing in a context is shared with another attempt.
//!
//! Teardown is explicit: [`ScenarioContext::finish`] flushes the ledger and
//! raises every buffered soft failure.

use crate::api::ApiSession;
use crate::assertion::{ApiAssertions, AssertionLedger, UiAssertions};
use crate::config::SuiteConfig;
use crate::engine::BrowserEngine;
use crate::interaction::Interactions;
use crate::pages::{HomePage, LoginPage};
use crate::result::CheckResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Creates one isolated engine per scenario attempt
#[async_trait]
pub trait EngineFactory: Send + Sync {
    /// Launch or build a new engine
    async fn create(&self) -> CheckResult<Arc<dyn BrowserEngine>>;
}

#[async_trait]
impl<F> EngineFactory for F
where
    F: Fn() -> CheckResult<Arc<dyn BrowserEngine>> + Send + Sync,
{
    async fn create(&self) -> CheckResult<Arc<dyn BrowserEngine>> {
        self()
    }
}

/// Launches a Chromium instance per attempt
#[cfg(feature = "browser")]
#[derive(Debug, Clone)]
pub struct ChromiumFactory {
    config: crate::engine::EngineConfig,
}

#[cfg(feature = "browser")]
impl ChromiumFactory {
    /// Factory launching browsers with `config`
    #[must_use]
    pub const fn new(config: crate::engine::EngineConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl EngineFactory for ChromiumFactory {
    async fn create(&self) -> CheckResult<Arc<dyn BrowserEngine>> {
        let engine = crate::engine::ChromiumEngine::launch(self.config.clone()).await?;
        Ok(Arc::new(engine))
    }
}

/// Per-attempt resource bundle handed to a scenario body
#[derive(Debug, Clone)]
pub struct ScenarioContext {
    name: Arc<str>,
    ledger: Arc<AssertionLedger>,
    page: Interactions,
    ui: UiAssertions,
    api_assertions: ApiAssertions,
    login: LoginPage,
    home: HomePage,
    api: ApiSession,
    config: Arc<SuiteConfig>,
}

impl ScenarioContext {
    /// Wire a context for scenario `name` around `engine`
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Http`](crate::CheckError::Http) if the API
    /// session's client cannot be built.
    pub fn new(name: &str, engine: Arc<dyn BrowserEngine>, config: Arc<SuiteConfig>) -> CheckResult<Self> {
        let ledger = Arc::new(AssertionLedger::for_scenario(name));
        let page = Interactions::new(engine).with_base_url(config.base_url.clone());
        let ui = UiAssertions::new(ledger.clone(), page.clone());
        let mut api = ApiSession::new();
        api.init_with_auth(config.api_base_url(), config.api_auth.clone())?;

        Ok(Self {
            name: Arc::from(name),
            api_assertions: ApiAssertions::new(ledger.clone()),
            login: LoginPage::new(page.clone()),
            home: HomePage::new(page.clone(), ui.clone()),
            ledger,
            page,
            ui,
            api,
            config,
        })
    }

    /// Scenario name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This attempt's ledger
    #[must_use]
    pub fn ledger(&self) -> &Arc<AssertionLedger> {
        &self.ledger
    }

    /// Interaction helper
    #[must_use]
    pub const fn page(&self) -> &Interactions {
        &self.page
    }

    /// Engine behind the helper
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn BrowserEngine> {
        self.page.engine()
    }

    /// UI assertion facade
    #[must_use]
    pub const fn ui(&self) -> &UiAssertions {
        &self.ui
    }

    /// API assertion facade
    #[must_use]
    pub const fn api_assertions(&self) -> &ApiAssertions {
        &self.api_assertions
    }

    /// Login page object
    #[must_use]
    pub const fn login_page(&self) -> &LoginPage {
        &self.login
    }

    /// Products page object
    #[must_use]
    pub const fn home_page(&self) -> &HomePage {
        &self.home
    }

    /// API session bound to the configured API base URL
    #[must_use]
    pub const fn api(&self) -> &ApiSession {
        &self.api
    }

    /// Target configuration
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Flush the ledger
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::SoftAssertions`](crate::CheckError::SoftAssertions)
    /// when soft failures were recorded since the last flush.
    pub fn finish(&self) -> CheckResult<()> {
        let summary = self.ledger.summary();
        tracing::debug!(
            scenario = %self.name,
            total = summary.total,
            failed = summary.failed,
            "scenario teardown"
        );
        self.ledger.verify_soft_assertions()
    }
}
