//! storecheck CLI library
//!
//! Argument parsing, configuration layering and terminal output for the
//! `storecheck` binary.

#![warn(missing_docs)]

pub mod app;
mod commands;
mod error;
pub mod logging;
mod output;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, EngineArg, LogFormat, PolicyArg, RunArgs, SelectArgs};
pub use error::{CliError, CliResult};
pub use output::Printer;
