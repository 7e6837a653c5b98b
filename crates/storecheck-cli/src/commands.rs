//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use storecheck::ArtifactPolicy;

/// storecheck: end-to-end regression suite for the demo storefront
#[derive(Parser, Debug)]
#[command(name = "storecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true, env = "STORECHECK_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Runner configuration file (YAML)
    #[arg(short, long, global = true, env = "STORECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios
    Run(RunArgs),

    /// List scenarios without running them
    List(SelectArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Scenario selection shared by `run` and `list`
#[derive(Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Only scenarios whose name contains this text (case-insensitive)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only scenarios carrying this tag (ui, api)
    #[arg(short, long)]
    pub tag: Option<String>,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario selection
    #[command(flatten)]
    pub select: SelectArgs,

    /// Number of concurrent workers
    #[arg(short = 'j', long, env = "STORECHECK_WORKERS")]
    pub workers: Option<usize>,

    /// Retries for a failing scenario
    #[arg(long, env = "STORECHECK_RETRIES")]
    pub retries: Option<u32>,

    /// Per-attempt timeout in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output directory for the report and artifacts
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// When to keep screenshots
    #[arg(long)]
    pub screenshot: Option<PolicyArg>,

    /// When to keep traces
    #[arg(long)]
    pub trace: Option<PolicyArg>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Storefront URL (overrides BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Browser engine to drive
    #[arg(long, default_value = "chromium")]
    pub engine: EngineArg,

    /// Do not write report.json
    #[arg(long)]
    pub no_report: bool,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Also print target settings read from the environment (secrets masked)
    #[arg(long)]
    pub env: bool,
}

/// Color choice argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorArg {
    /// Whether stdout output should be styled
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stdout().features().colors_supported(),
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Artifact retention argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyArg {
    /// Keep for every attempt
    On,
    /// Never keep
    Off,
    /// Keep for failed attempts
    RetainOnFailure,
    /// Capture for failed attempts only
    OnlyOnFailure,
}

impl From<PolicyArg> for ArtifactPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::On => Self::On,
            PolicyArg::Off => Self::Off,
            PolicyArg::RetainOnFailure => Self::RetainOnFailure,
            PolicyArg::OnlyOnFailure => Self::OnlyOnFailure,
        }
    }
}

/// Engine selection
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EngineArg {
    /// Headless Chromium over CDP
    #[default]
    Chromium,
    /// Blank in-process page; enough for API scenarios
    Mock,
}
