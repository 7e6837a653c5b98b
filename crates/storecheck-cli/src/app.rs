//! Command handlers
//!
//! Configuration precedence, lowest first: built-in defaults, the YAML file
//! (`--config`, or `storecheck.yaml` in the working directory when present),
//! then command-line flags.

use crate::commands::{Cli, ConfigArgs, EngineArg, RunArgs, SelectArgs};
use crate::error::{CliError, CliResult};
use crate::output::Printer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storecheck::scenarios::builtin_suite;
use storecheck::{
    BrowserEngine, CheckResult, EngineConfig, EngineFactory, MockEngine, RunnerConfig, Suite, SuiteConfig, SuiteRunner,
};

/// Configuration file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "storecheck.yaml";

/// Load the runner configuration named by `--config`, or the default file
///
/// # Errors
///
/// Returns [`CliError::Config`] when an explicit file does not exist, or the
/// library error when the file does not parse.
pub fn load_runner_config(explicit: Option<&Path>) -> CliResult<RunnerConfig> {
    match explicit {
        Some(path) if !path.exists() => Err(CliError::config(format!(
            "config file not found: {}",
            path.display()
        ))),
        Some(path) => Ok(RunnerConfig::from_yaml_file(path)?),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Ok(RunnerConfig::from_yaml_file(DEFAULT_CONFIG_FILE)?),
        None => Ok(RunnerConfig::default()),
    }
}

/// Apply `run` flags on top of `config`
#[must_use]
pub fn apply_run_flags(mut config: RunnerConfig, args: &RunArgs) -> RunnerConfig {
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(retries) = args.retries {
        config.retries = retries;
    }
    if let Some(timeout) = args.timeout {
        config.scenario_timeout_ms = timeout;
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(policy) = args.screenshot {
        config.screenshot = policy.into();
    }
    if let Some(policy) = args.trace {
        config.trace = policy.into();
    }
    if args.headed {
        config.browser.headless = false;
    }
    config
}

/// Apply `run` flags on top of the environment's target
///
/// `--base-url` also moves API scenarios unless `API_BASE_URL` is set.
#[must_use]
pub fn apply_target_flags(target: SuiteConfig, args: &RunArgs) -> SuiteConfig {
    match &args.base_url {
        Some(base_url) => target.with_base_url(base_url.clone()),
        None => target,
    }
}

/// Scenarios matching the selection
///
/// # Errors
///
/// Returns [`CliError::InvalidArgument`] when nothing matches.
pub fn select(args: &SelectArgs) -> CliResult<Suite> {
    let suite = builtin_suite().filter(args.filter.as_deref(), args.tag.as_deref());
    if suite.is_empty() {
        return Err(CliError::invalid_argument("no scenario matches the given filter and tag"));
    }
    Ok(suite)
}

fn engine_factory(engine: EngineArg, browser: &EngineConfig) -> CliResult<Arc<dyn EngineFactory>> {
    match engine {
        EngineArg::Mock => {
            let factory = || -> CheckResult<Arc<dyn BrowserEngine>> { Ok(Arc::new(MockEngine::new())) };
            Ok(Arc::new(factory))
        }
        #[cfg(feature = "browser")]
        EngineArg::Chromium => Ok(Arc::new(storecheck::ChromiumFactory::new(browser.clone()))),
        #[cfg(not(feature = "browser"))]
        EngineArg::Chromium => {
            let _ = browser;
            Err(CliError::invalid_argument(
                "chromium support not enabled; rebuild with --features browser or pass --engine mock",
            ))
        }
    }
}

/// Execute `run`; returns whether every scenario passed
///
/// # Errors
///
/// Configuration, engine selection or report writing errors. Scenario
/// failures are not errors.
pub fn run(cli: &Cli, args: &RunArgs, printer: &Printer) -> CliResult<bool> {
    let config = apply_run_flags(load_runner_config(cli.config.as_deref())?, args);
    config.validate()?;

    let target = apply_target_flags(SuiteConfig::from_env()?, args);

    let suite = select(&args.select)?;
    let factory = engine_factory(args.engine, &config.browser)?;
    let output_dir: PathBuf = config.output_dir.clone();
    let workers = config.workers;
    let runner = SuiteRunner::new(config, target, factory);

    printer.header(&suite, workers);
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let report = runtime.block_on(runner.run(&suite))?;
    printer.report(&report);

    if !args.no_report {
        let path = report.write_json(&output_dir)?;
        if !printer.quiet {
            println!("  report: {}", path.display());
        }
    }
    Ok(report.all_passed())
}

/// Execute `list`
///
/// # Errors
///
/// See [`select`].
pub fn list(args: &SelectArgs, printer: &Printer) -> CliResult<()> {
    printer.list(&select(args)?);
    Ok(())
}

/// Execute `config`
///
/// # Errors
///
/// Configuration loading errors.
pub fn show_config(cli: &Cli, args: &ConfigArgs, printer: &Printer) -> CliResult<()> {
    let runner = load_runner_config(cli.config.as_deref())?;
    printer.section("runner", &runner.to_yaml()?);
    if args.env {
        let target = SuiteConfig::from_env()?.redacted();
        let yaml = serde_yaml_ng::to_string(&target).map_err(storecheck::CheckError::from)?;
        printer.section("target", &yaml);
    }
    Ok(())
}
