//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the level follows `-q` / `-v` flags.

use crate::commands::LogFormat;
use tracing_subscriber::EnvFilter;

/// Default filter directive for a verbosity count
#[must_use]
pub fn default_directive(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "storecheck=info,warn",
        2 => "storecheck=debug,info",
        _ => "trace",
    }
}

/// Install the global subscriber, writing to stderr
///
/// A subscriber that is already installed is left in place.
pub fn init(format: LogFormat, quiet: bool, verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(quiet, verbose)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives() {
        assert_eq!(default_directive(true, 3), "error");
        assert_eq!(default_directive(false, 0), "warn");
        assert_eq!(default_directive(false, 1), "storecheck=info,warn");
        assert_eq!(default_directive(false, 9), "trace");
    }
}
