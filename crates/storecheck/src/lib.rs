//! storecheck: End-to-End Regression Suite for the Sauce Labs Demo Storefront
//!
//! Page objects, soft/hard assertions, a small HTTP session and a parallel
//! runner with retries and failure artifacts, all driven through the
//! [`BrowserEngine`] trait. A Chromium implementation lives behind the
//! `browser` feature; [`MockEngine`] drives every scenario in-process.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────────┐   ┌──────────────┐
//! │ SuiteRunner │──►│ ScenarioContext │──►│ Page Objects │
//! │ (workers,   │   │ (ledger, api,   │   │ (login,      │
//! │  retries)   │   │  assertions)    │   │  products)   │
//! └──────┬──────┘   └────────┬────────┘   └──────┬───────┘
//!        │                   │                   ▼
//!        ▼                   ▼            ┌──────────────┐
//! ┌─────────────┐   ┌─────────────────┐   │ Interactions │
//! │ SuiteReport │   │ AssertionLedger │   └──────┬───────┘
//! └─────────────┘   └─────────────────┘          ▼
//!                                        ┌───────────────┐
//!                                        │ BrowserEngine │
//!                                        └───────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use storecheck::{scenarios, BrowserEngine, CheckResult, MockEngine, RunnerConfig, SuiteConfig, SuiteRunner};
//!
//! # async fn run() -> CheckResult<()> {
//! let factory = || -> CheckResult<Arc<dyn BrowserEngine>> { Ok(Arc::new(MockEngine::new())) };
//! let runner = SuiteRunner::new(RunnerConfig::default(), SuiteConfig::from_env()?, Arc::new(factory));
//! let report = runner.run(&scenarios::builtin_suite()).await?;
//! println!("{}", report.render_list());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// HTTP session for API checks
pub mod api;

/// Soft/hard assertions, ledger and value checks
pub mod assertion;

/// Environment and runner configuration
pub mod config;

/// Browser dialog routing
pub mod dialog;

/// Browser engine abstraction
#[allow(clippy::missing_errors_doc)]
pub mod engine;

/// Per-attempt scenario fixtures
pub mod fixture;

/// Interaction helper with auto-waiting actions
pub mod interaction;

/// Element selectors
pub mod locator;

/// In-process engine and DOM for tests
pub mod mock;

/// Page Object Model support
pub mod page_object;

/// Storefront page objects
pub mod pages;

/// Scenario results and suite reports
pub mod reporter;

mod result;

/// Suites, scenarios and the parallel runner
pub mod runner;

/// Built-in storefront scenarios
pub mod scenarios;

/// Polling waits
pub mod wait;

pub use api::{ApiAuth, ApiResponse, ApiSession, AuthKind};
pub use assertion::{
    ApiAssertions, AssertionLedger, AssertionMode, AssertionOutcome, AssertionSummary, SortOrder,
    Truthy, UiAssertions,
};
pub use config::{ArtifactPolicy, RunnerConfig, SuiteConfig};
pub use dialog::{Dialog, DialogPolicy, DialogSubscription, DialogType};
#[cfg(feature = "browser")]
pub use engine::ChromiumEngine;
pub use engine::{BrowserEngine, ClickOptions, EngineConfig, MouseButton, SelectBy};
#[cfg(feature = "browser")]
pub use fixture::ChromiumFactory;
pub use fixture::{EngineFactory, ScenarioContext};
pub use interaction::Interactions;
pub use locator::{Locator, Selector};
pub use mock::{MockDom, MockElement, MockEngine};
pub use page_object::{PageObject, UrlMatcher};
pub use pages::{HomePage, LoginPage, ProductCard, SortOption};
pub use reporter::{ScenarioResult, ScenarioStatus, SuiteReport};
pub use result::{CheckError, CheckResult};
pub use runner::{Scenario, Suite, SuiteRunner};
pub use wait::{ElementState, WaitOptions};
