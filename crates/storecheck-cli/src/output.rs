//! Terminal output

use console::{style, Term};
use storecheck::{ScenarioStatus, Suite, SuiteReport};

/// Writes suite listings and run reports to stdout
#[derive(Debug)]
pub struct Printer {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Printer {
    /// Create a printer over stdout
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }

    fn symbol(&self, status: ScenarioStatus) -> String {
        if !self.use_color {
            return status.symbol().to_string();
        }
        let symbol = style(status.symbol());
        match status {
            ScenarioStatus::Passed => symbol.green(),
            ScenarioStatus::Failed => symbol.red(),
            ScenarioStatus::TimedOut => symbol.magenta(),
            ScenarioStatus::Flaky => symbol.yellow(),
        }
        .bold()
        .to_string()
    }

    /// Announce a run
    pub fn header(&self, suite: &Suite, workers: usize) {
        if self.quiet {
            return;
        }
        let text = format!("Running {} scenarios using {workers} workers", suite.len());
        if self.use_color {
            self.line(&style(text).bold().to_string());
        } else {
            self.line(&text);
        }
    }

    /// Print every result, the failures in detail and the summary
    ///
    /// Failures are printed even in quiet mode.
    pub fn report(&self, report: &SuiteReport) {
        if !self.quiet {
            self.line("");
            for result in &report.results {
                let retry = if result.attempts > 1 {
                    format!(" [attempt {}]", result.attempts)
                } else {
                    String::new()
                };
                let timing = format!("({}ms)", result.duration_ms);
                let timing = if self.use_color {
                    style(timing).dim().to_string()
                } else {
                    timing
                };
                self.line(&format!("  {}  {} {timing}{retry}", self.symbol(result.status), result.name));
            }
        }

        for (index, failure) in report.failures().iter().enumerate() {
            self.line("");
            let heading = format!("  {}) {} ({})", index + 1, failure.name, failure.status);
            if self.use_color {
                self.line(&style(heading).red().to_string());
            } else {
                self.line(&heading);
            }
            for line in failure.error.as_deref().unwrap_or_default().lines() {
                self.line(&format!("     {line}"));
            }
            for artifact in &failure.artifacts {
                self.line(&format!("     artifact: {}", artifact.display()));
            }
        }

        let summary = report.summary();
        self.line("");
        if !self.use_color {
            self.line(&format!("  {summary}"));
        } else if report.all_passed() {
            self.line(&format!("  {}", style(summary).green()));
        } else {
            self.line(&format!("  {}", style(summary).red()));
        }
    }

    /// Print scenario names with their tags
    pub fn list(&self, suite: &Suite) {
        for scenario in suite.scenarios() {
            let tags = format!("[{}]", scenario.tags().join(", "));
            let tags = if self.use_color {
                style(tags).cyan().to_string()
            } else {
                tags
            };
            self.line(&format!("  {tags} {}", scenario.name()));
        }
        if !self.quiet {
            self.line(&format!("Total: {} scenarios", suite.len()));
        }
    }

    /// Print a titled block of text
    pub fn section(&self, title: &str, body: &str) {
        if self.use_color {
            self.line(&style(format!("# {title}")).bold().to_string());
        } else {
            self.line(&format!("# {title}"));
        }
        let _ = self.term.write_str(body);
        if !body.ends_with('\n') {
            self.line("");
        }
    }
}
