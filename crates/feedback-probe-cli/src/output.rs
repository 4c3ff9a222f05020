//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

/// Progress and status lines on stderr
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet || !self.term.is_term() {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} {pos:>3}/{len} [{bar:32.green/white}] {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Callback advancing the bar by one finished scenario, callable from workers
    #[must_use]
    pub fn ticker(&self) -> impl Fn(&str) + Sync + Send {
        let bar = self.progress_bar.clone();
        move |scenario: &str| {
            if let Some(ref pb) = bar {
                pb.set_message(scenario.to_string());
                pb.inc(1);
            }
        }
    }

    /// Clear the progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn line(&self, symbol: &str, plain: &str, paint: fn(&str) -> String, message: &str) {
        let prefix = if self.use_color {
            paint(symbol)
        } else {
            plain.to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a success line
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line("✓", "PASS", |s| style(s).green().bold().to_string(), message);
    }

    /// Print a failure line, even in quiet mode
    pub fn failure(&self, message: &str) {
        self.line("✗", "FAIL", |s| style(s).red().bold().to_string(), message);
    }

    /// Print a warning line
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line("⚠", "WARN", |s| style(s).yellow().bold().to_string(), message);
    }

    /// Print an info line
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line("ℹ", "INFO", |s| style(s).blue().bold().to_string(), message);
    }

    /// Print an indented detail line under the previous status line
    pub fn detail(&self, message: &str) {
        let _ = self.term.write_line(&format!("    {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print the run summary
    pub fn summary(&self, passed: usize, failed: usize, flaky: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }

        let verdict = if failed > 0 { "FAILED" } else { "PASSED" };
        let paint = |value: String, look: &Style| {
            if self.use_color {
                look.apply_to(value).to_string()
            } else {
                value
            }
        };
        let verdict_style = if failed > 0 {
            Style::new().red().bold()
        } else {
            Style::new().green().bold()
        };
        let failed_style = if failed > 0 {
            Style::new().red().bold()
        } else {
            Style::new()
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "{} {} scenarios in {:.2}s ({} passed, {} failed, {} flaky)",
            paint(verdict.to_string(), &verdict_style),
            passed + failed,
            duration.as_secs_f64(),
            paint(passed.to_string(), &Style::new().green()),
            paint(failed.to_string(), &failed_style),
            paint(flaky.to_string(), &Style::new().yellow()),
        ));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod output_format_tests {
        use super::*;

        #[test]
        fn test_default_format() {
            assert_eq!(OutputFormat::default(), OutputFormat::Text);
        }
    }

    mod progress_reporter_tests {
        use super::*;

        #[test]
        fn test_default_reporter() {
            let reporter = ProgressReporter::default();
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
        }

        #[test]
        fn test_quiet_reporter_skips_progress() {
            let mut reporter = ProgressReporter::new(false, true);
            reporter.start_progress(3, "running");
            assert!(reporter.progress_bar.is_none());
            reporter.ticker()("homepage-loads");
            reporter.finish();
        }

        #[test]
        fn test_status_lines() {
            let reporter = ProgressReporter::new(false, false);
            reporter.success("widget-display");
            reporter.failure("widget-close");
            reporter.detail("step 2: expected state = Closed");
            reporter.warning("retried");
            reporter.info("env qa");
            reporter.header("Scenarios");
            reporter.summary(3, 1, 1, Duration::from_millis(1500));
        }
    }
}
