//! Built-in UI scenarios against the in-process storefront

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{factory, suite_config, Quirks};
use std::sync::Arc;
use storecheck::scenarios::{builtin_suite, LOCKED_OUT_ERROR};
use storecheck::{
    ArtifactPolicy, AssertionMode, Interactions, RunnerConfig, ScenarioContext, ScenarioStatus, SortOption, Suite,
    SuiteRunner,
};

fn quiet() -> RunnerConfig {
    RunnerConfig::default()
        .with_trace(ArtifactPolicy::Off)
        .with_screenshot(ArtifactPolicy::Off)
}

fn ui_suite() -> Suite {
    builtin_suite().filter(None, Some("ui"))
}

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn test_ui_suite_passes() {
        let runner = SuiteRunner::new(quiet().with_workers(4), suite_config(), factory(Quirks::default()));
        let report = runner.run(&ui_suite()).await.unwrap();
        assert!(report.all_passed(), "{}", report.render_list());
        assert_eq!(report.passed_count(), 8);
        assert_eq!(report.flaky_count(), 0);
    }

    #[tokio::test]
    async fn test_locked_out_user_sees_error() {
        let ctx = ScenarioContext::new(
            "locked",
            Arc::new(common::storefront()),
            Arc::new(suite_config()),
        )
        .unwrap();
        let config = ctx.config().clone();
        ctx.login_page().login(&config.locked_user, &config.password).await.unwrap();
        let message = ctx.login_page().error_message().await.unwrap();
        assert!(message.contains(LOCKED_OUT_ERROR));
        ctx.finish().unwrap();
    }

    #[tokio::test]
    async fn test_hidden_image_is_reported_after_retries() {
        let runner = SuiteRunner::new(quiet().with_retries(1), suite_config(), factory(Quirks {
            hidden_first_image: true,
            ..Quirks::default()
        }));
        let suite = ui_suite().filter(Some("PB_TC01"), None);
        let report = runner.run(&suite).await.unwrap();

        let result = &report.results[0];
        assert_eq!(result.status, ScenarioStatus::Failed);
        assert_eq!(result.attempts, 2);
        let error = result.error.as_deref().unwrap();
        assert!(error.starts_with("Soft Assertion Failures:"));
        assert_eq!(error.lines().count(), 2);
        assert!(error.contains("Expected .inventory_item_img img of product 0 to be visible"));
    }

    #[tokio::test]
    async fn test_broken_sort_fails_hard() {
        let runner = SuiteRunner::new(
            quiet().with_retries(0),
            suite_config(),
            factory(Quirks {
                broken_sort: true,
                ..Quirks::default()
            }),
        );
        let report = runner.run(&ui_suite().filter(Some("Sort"), None)).await.unwrap();
        assert_eq!(report.total_count(), 2);
        let low_to_high = report.result("PB_TC02 Sort products by price low to high").unwrap();
        assert_eq!(low_to_high.status, ScenarioStatus::Failed);
        let error = low_to_high.error.as_deref().unwrap();
        assert!(error.starts_with("Expected items to be sorted by 'price' in asc order, but got: ["));
    }

    #[tokio::test]
    async fn test_wrong_password_times_out_on_products_page() {
        let config = suite_config().with_credentials(common::USERNAME, "nope", common::LOCKED_USER);
        let runner = SuiteRunner::new(
            quiet().with_retries(0).with_scenario_timeout(500),
            config,
            factory(Quirks::default()),
        );
        let report = runner.run(&ui_suite().filter(Some("UA_TC01"), None)).await.unwrap();
        assert_eq!(report.results[0].status, ScenarioStatus::TimedOut);
    }
}

mod artifacts {
    use super::*;

    #[tokio::test]
    async fn test_report_and_failure_artifacts_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunnerConfig::default()
            .with_retries(0)
            .with_output_dir(dir.path())
            .with_screenshot(ArtifactPolicy::OnlyOnFailure)
            .with_trace(ArtifactPolicy::On);
        let runner = SuiteRunner::new(config, suite_config(), factory(Quirks {
            broken_sort: true,
            ..Quirks::default()
        }));
        let report = runner
            .run(&ui_suite().filter(Some("UA_TC01"), None).with_scenario(
                ui_suite().filter(Some("PB_TC03"), None).scenarios()[0].clone(),
            ))
            .await
            .unwrap();

        let passed = &report.results[0];
        assert_eq!(passed.status, ScenarioStatus::Passed);
        assert_eq!(passed.artifacts.len(), 1, "trace only");

        let failed = &report.results[1];
        assert_eq!(failed.status, ScenarioStatus::Failed);
        assert_eq!(failed.artifacts.len(), 2);
        assert!(failed.artifacts.iter().all(|path| path.exists()));

        let written = report.write_json(dir.path()).unwrap();
        let back = storecheck::SuiteReport::read_json(&written).unwrap();
        assert_eq!(back.failed_count(), 1);
    }
}

mod pages {
    use super::*;

    fn context() -> ScenarioContext {
        ScenarioContext::new("pages", Arc::new(common::storefront()), Arc::new(suite_config())).unwrap()
    }

    #[tokio::test]
    async fn test_login_navigates_to_storefront_root() {
        let ctx = context();
        ctx.login_page().login(common::USERNAME, common::PASSWORD).await.unwrap();
        assert_eq!(ctx.page().current_url().await.unwrap(), "https://shop.test/");
        assert_eq!(ctx.home_page().title().await.unwrap(), "Products");
    }

    #[tokio::test]
    async fn test_sort_price_high_to_low() {
        let ctx = context();
        ctx.login_page().login(common::USERNAME, common::PASSWORD).await.unwrap();
        ctx.home_page().sort_products(SortOption::PriceDesc).await.unwrap();
        let prices = ctx.home_page().product_prices().await.unwrap();
        assert_eq!(prices.first().copied(), Some(49.99));
        assert_eq!(prices.last().copied(), Some(7.99));
        assert_eq!(prices.len(), common::PRODUCTS.len());
    }

    #[tokio::test]
    async fn test_logout_returns_to_login_form() {
        let ctx = context();
        ctx.login_page().login(common::USERNAME, common::PASSWORD).await.unwrap();
        ctx.home_page().logout().await.unwrap();
        assert!(ctx.login_page().is_login_screen_visible().await.unwrap());
        ctx.ui()
            .assert_not_visible(&storecheck::Locator::new(".title"), AssertionMode::Soft)
            .await
            .unwrap();
        ctx.finish().unwrap();
    }

    #[tokio::test]
    async fn test_shared_helper_without_base_url_rejects_relative_paths() {
        let page = Interactions::new(Arc::new(common::storefront()));
        assert!(page.navigate("/").await.is_err());
    }
}
