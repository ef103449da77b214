//! Human-readable run summaries

use console::{style, Term};
use conform::{FeatureSet, Outcome, RunReport};

/// Styled reporter writing to stderr
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
    /// List every export outcome
    pub verbose: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool, verbose: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
            verbose,
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "OK".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Summarize a completed run
    pub fn report(&self, test: &str, report: &RunReport) {
        if self.verbose && !self.quiet {
            for (name, outcome) in report.record.iter() {
                let _ = self.term.write_line(&self.outcome_line(name, outcome));
            }
        }
        self.success(&format_summary(test, report));
    }

    fn outcome_line(&self, name: &str, outcome: &Outcome) -> String {
        let first_line = outcome.text().lines().next().unwrap_or_default();
        let marker = match (outcome.is_failure(), self.use_color) {
            (false, true) => style("ok").green().to_string(),
            (true, true) => style("err").red().to_string(),
            (false, false) => "ok".to_string(),
            (true, false) => "err".to_string(),
        };
        format!("  {marker:>3} {name} = {first_line}")
    }
}

/// One-line summary of a completed run
#[must_use]
pub fn format_summary(test: &str, report: &RunReport) -> String {
    format!(
        "{test}: {} exports invoked, {} failed, result written to {}",
        report.record.len(),
        report.record.failure_count(),
        report.result_path.display()
    )
}

/// Feature set as `name: on|off` lines
#[must_use]
pub fn format_features(features: &FeatureSet) -> String {
    features
        .flags()
        .iter()
        .map(|(name, enabled)| format!("{name}: {}", if *enabled { "on" } else { "off" }))
        .collect::<Vec<_>>()
        .join("\n")
}
