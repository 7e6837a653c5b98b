//! storecheck CLI: run the storefront regression suite
//!
//! ## Usage
//!
//! ```bash
//! storecheck run                          # Every scenario in Chromium
//! storecheck run --tag api --engine mock  # API scenarios only
//! storecheck run --filter UA_TC04 -v      # One scenario, with logs
//! storecheck list --tag ui                # Show scenarios
//! storecheck config --env                 # Effective settings
//! ```

use clap::Parser;
use std::process::ExitCode;
use storecheck_cli::{app, logging, Cli, CliResult, Commands, Printer};

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    logging::init(cli.log_format, cli.quiet, cli.verbose);
    let printer = Printer::new(cli.color.should_color(), cli.quiet);

    match &cli.command {
        Commands::Run(args) => app::run(&cli, args, &printer),
        Commands::List(args) => app::list(args, &printer).map(|()| true),
        Commands::Config(args) => app::show_config(&cli, args, &printer).map(|()| true),
    }
}
