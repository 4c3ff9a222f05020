//! Suite execution for the `run` command

use crate::commands::{FaultArg, ProfileArgs, RunArgs, SelectArgs, TargetArg};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, ProgressReporter};
use feedback_probe::{
    attach_env_info, catalog, text, EnvProfile, ModelTarget, Page, PageFault, PageTarget,
    ProbeResult, ReportSink, Reporter, RunConfig, Scenario, ScenarioFilter, ScenarioOutcome,
    ScenarioRunner, ScenarioTarget, SimulatedPage, SuiteOutcome,
};
use std::path::PathBuf;

/// Resolve the environment profile and the run configuration.
///
/// `--config` wins over the profile's `RUN_CONFIG`; with neither, defaults apply.
pub fn load_settings(args: &ProfileArgs) -> CliResult<(EnvProfile, RunConfig)> {
    let profile = EnvProfile::load(&args.env_dir, args.env.as_deref())?;
    let config_path = args.config.clone().or_else(|| {
        profile
            .run_config
            .as_ref()
            .map(|p| if p.is_relative() { args.env_dir.join(p) } else { p.clone() })
    });
    let config = match config_path {
        Some(path) => RunConfig::load(&path)?,
        None => RunConfig::default(),
    };
    Ok((profile, config))
}

/// Build a scenario filter from the selection flags
#[must_use]
pub fn selection(args: &SelectArgs) -> ScenarioFilter {
    ScenarioFilter {
        name: args.filter.clone(),
        tags: args.tags.clone(),
    }
}

/// Catalog scenarios selected by `args`
#[must_use]
pub fn selected_scenarios(args: &SelectArgs) -> Vec<Scenario> {
    selection(args).apply(catalog::all())
}

/// Map a fault flag to the simulated page fault
#[must_use]
pub fn page_fault(fault: FaultArg) -> PageFault {
    match fault {
        FaultArg::SubmitAlwaysEnabled => PageFault::SubmitAlwaysEnabled,
        FaultArg::SlowNetwork => PageFault::SlowNetwork,
        FaultArg::WrongTitle => PageFault::WrongTitle,
        FaultArg::HiddenOpenButton => PageFault::HideElement(text::OPEN_BUTTON.to_string()),
    }
}

/// Apply command-line overrides on top of the file configuration
pub fn apply_overrides(config: &mut RunConfig, args: &RunArgs) -> CliResult<()> {
    if let Some(retries) = args.retries {
        config.retries = retries;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(timeout) = args.timeout {
        config.scenario_timeout_ms = timeout;
    }
    if args.no_screenshot {
        config.screenshot_on_failure = false;
    }
    config
        .validate()
        .map_err(|e| CliError::invalid_argument(e.to_string()))
}

/// What a `run` produced
#[derive(Debug)]
pub struct RunSummary {
    /// Scenario outcomes in catalog order
    pub suite: SuiteOutcome,
    /// Collected report
    pub report: Reporter,
    /// Written `results.json`, if any scenario ran
    pub results_path: Option<PathBuf>,
    /// Written `index.html`, if any scenario ran
    pub html_path: Option<PathBuf>,
}

/// Runs the selected catalog against the chosen target
#[derive(Debug)]
pub struct SuiteRunner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl SuiteRunner {
    /// Create a new suite runner
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let quiet = config.verbosity.is_quiet() || config.format == OutputFormat::Json;
        let reporter = ProgressReporter::new(config.color.should_color(), quiet);
        Self { config, reporter }
    }

    /// Execute `run`: resolve settings, run the suite, write the report
    ///
    /// # Errors
    ///
    /// Missing or invalid configuration, report I/O failures
    pub fn run(&mut self, args: &RunArgs) -> CliResult<RunSummary> {
        if args.fault.is_some() && args.target != TargetArg::Simulated {
            return Err(CliError::invalid_argument("--fault requires --target simulated"));
        }
        let (mut profile, mut config) = load_settings(&args.profile)?;
        apply_overrides(&mut config, args)?;
        if let Some(dir) = &args.results_dir {
            profile.results_dir.clone_from(dir);
        }
        if let Some(dir) = &args.report_dir {
            profile.report_dir.clone_from(dir);
        }

        let scenarios = selected_scenarios(&args.select);
        let mut report = Reporter::new().with_name(format!("feedback-probe ({})", profile.env));
        attach_env_info(&mut report, &profile);

        if scenarios.is_empty() {
            self.reporter.warning("No scenarios selected");
            return Ok(RunSummary {
                suite: SuiteOutcome::default(),
                report,
                results_path: None,
                html_path: None,
            });
        }

        self.reporter.info(&format!(
            "env {} ({}) against {}",
            profile.env, profile.browser, profile.url
        ));
        self.reporter.header("Scenarios");

        let runner = ScenarioRunner::new(config.runner_options());
        let suite = match args.target {
            TargetArg::Model => self.execute(&runner, &scenarios, || Ok(ModelTarget::new())),
            TargetArg::Simulated => {
                let fault = args.fault.map(page_fault);
                let wait = config.wait_options();
                let navigation_timeout = config.navigation_timeout_ms;
                let url = profile.url.clone();
                let title = config.expected_title.clone();
                self.execute(&runner, &scenarios, move || {
                    let mut driver = SimulatedPage::new();
                    if let Some(fault) = &fault {
                        driver = driver.with_fault(fault.clone());
                    }
                    let page = Page::new(driver)
                        .with_wait_options(wait)
                        .with_navigation_timeout(navigation_timeout);
                    Ok(PageTarget::new(page, url.clone()).with_expected_title(title.clone()))
                })
            }
        };

        report.record_parameter("Target", &format!("{:?}", args.target).to_lowercase());
        for (scenario, outcome) in scenarios.iter().zip(&suite.outcomes) {
            report.record_outcome(scenario, outcome);
            self.print_outcome(outcome);
        }

        let results_path = report.write_results(&profile.results_dir)?;
        let html_path = report.write_html(&profile.report_dir)?;
        tracing::info!(
            results = %results_path.display(),
            report = %html_path.display(),
            "report written"
        );

        self.reporter
            .summary(suite.passed(), suite.failed(), suite.flaky(), suite.duration);
        if self.config.verbosity.is_verbose() {
            self.reporter.info(&report.summary());
        }

        Ok(RunSummary {
            suite,
            report,
            results_path: Some(results_path),
            html_path: Some(html_path),
        })
    }

    fn execute<T, F>(
        &mut self,
        runner: &ScenarioRunner,
        scenarios: &[Scenario],
        factory: F,
    ) -> SuiteOutcome
    where
        T: ScenarioTarget,
        F: Fn() -> ProbeResult<T> + Sync,
    {
        self.reporter.start_progress(scenarios.len() as u64, "starting");
        let tick = self.reporter.ticker();
        let suite = runner.run_suite_with(scenarios, factory, |outcome| tick(&outcome.name));
        self.reporter.finish();
        suite
    }

    fn print_outcome(&self, outcome: &ScenarioOutcome) {
        if outcome.passed() {
            if outcome.is_flaky() {
                self.reporter.warning(&format!(
                    "{} passed after {} attempts",
                    outcome.name, outcome.attempts
                ));
            } else {
                self.reporter.success(&outcome.name);
            }
            return;
        }

        self.reporter.failure(&format!(
            "{} [{}]: {}",
            outcome.name,
            outcome.status,
            outcome.error.as_deref().unwrap_or("unknown error")
        ));
        if self.config.format == OutputFormat::Json {
            return;
        }
        if let Some(diagnostic) = &outcome.diagnostic {
            if let (Some(step), Some(operation)) = (diagnostic.step, &diagnostic.operation) {
                self.reporter.detail(&format!("step {step}: {operation}"));
            }
            if let Some(expected) = &diagnostic.expected {
                self.reporter.detail(&format!("expected: {expected}"));
            }
            if let Some(actual) = &diagnostic.actual {
                self.reporter.detail(&format!("actual:   {actual}"));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use crate::config::{ColorChoice, Verbosity};
    use clap::Parser;
    use feedback_probe::Status;
    use std::path::Path;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["feedback-probe", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Run(args) => args,
            other => panic!("expected Run command, got {other:?}"),
        }
    }

    fn write_profile(dir: &Path, extra: &str) {
        let body = format!(
            "BROWSER=chromium\nURL=https://example.test/\nALLURE_RESULTS_DIR={}\nALLURE_REPORT_DIR={}\n{extra}",
            dir.join("results").display(),
            dir.join("report").display()
        );
        std::fs::write(dir.join(".env.qa"), body).unwrap();
    }

    fn quiet_runner() -> SuiteRunner {
        SuiteRunner::new(
            CliConfig::new()
                .with_verbosity(Verbosity::Quiet)
                .with_color(ColorChoice::Never),
        )
    }

    mod settings_tests {
        use super::*;

        #[test]
        fn test_missing_profile_is_config_missing() {
            let dir = tempfile::tempdir().unwrap();
            let args = run_args(&["--env", "qa", "--env-dir", dir.path().to_str().unwrap()]);
            let err = load_settings(&args.profile).unwrap_err();
            assert!(err.to_string().contains("not found"));
        }

        #[test]
        fn test_run_config_from_profile_is_relative_to_env_dir() {
            let dir = tempfile::tempdir().unwrap();
            write_profile(dir.path(), "RUN_CONFIG=run.yaml\n");
            std::fs::write(dir.path().join("run.yaml"), "retries: 3\nworkers: 1\n").unwrap();
            let args = run_args(&["--env", "qa", "--env-dir", dir.path().to_str().unwrap()]);
            let (profile, config) = load_settings(&args.profile).unwrap();
            assert_eq!(profile.url, "https://example.test/");
            assert_eq!(config.retries, 3);
            assert_eq!(config.workers, 1);
        }

        #[test]
        fn test_overrides() {
            let args = run_args(&[
                "--retries",
                "0",
                "-j",
                "3",
                "--timeout",
                "500",
                "--no-screenshot",
            ]);
            let mut config = RunConfig::default();
            apply_overrides(&mut config, &args).unwrap();
            assert_eq!(config.retries, 0);
            assert_eq!(config.workers, 3);
            assert_eq!(config.scenario_timeout_ms, 500);
            assert!(!config.screenshot_on_failure);
        }

        #[test]
        fn test_zero_workers_rejected() {
            let args = run_args(&["-j", "0"]);
            let mut config = RunConfig::default();
            let err = apply_overrides(&mut config, &args).unwrap_err();
            assert!(matches!(err, CliError::InvalidArgument { .. }));
        }

        #[test]
        fn test_selection() {
            let select = SelectArgs {
                filter: Some("e2e/".into()),
                tags: Vec::new(),
            };
            let names: Vec<_> = selected_scenarios(&select)
                .into_iter()
                .map(|s| s.name)
                .collect();
            assert_eq!(names, vec!["e2e/rating-1-submit", "e2e/rating-6-invalid-input"]);
        }

        #[test]
        fn test_hidden_open_button_fault() {
            assert_eq!(
                page_fault(FaultArg::HiddenOpenButton),
                PageFault::HideElement(text::OPEN_BUTTON.to_string())
            );
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_model_run_writes_report() {
            let dir = tempfile::tempdir().unwrap();
            write_profile(dir.path(), "");
            let args = run_args(&[
                "--env",
                "qa",
                "--env-dir",
                dir.path().to_str().unwrap(),
                "--filter",
                "e2e/",
            ]);
            let summary = quiet_runner().run(&args).unwrap();
            assert!(summary.suite.all_passed());
            assert_eq!(summary.suite.total(), 2);
            assert!(summary.results_path.unwrap().is_file());
            assert!(summary.html_path.unwrap().is_file());
            assert_eq!(
                summary.report.parameters().get("Base URL").map(String::as_str),
                Some("https://example.test/")
            );
        }

        #[test]
        fn test_simulated_fault_fails_optional_only_scenarios() {
            let dir = tempfile::tempdir().unwrap();
            write_profile(dir.path(), "");
            let args = run_args(&[
                "--env",
                "qa",
                "--env-dir",
                dir.path().to_str().unwrap(),
                "--target",
                "simulated",
                "--fault",
                "submit-always-enabled",
                "--filter",
                "negative/rating-1/optional-only",
                "--retries",
                "0",
            ]);
            let summary = quiet_runner().run(&args).unwrap();
            assert_eq!(summary.suite.total(), 1);
            assert_eq!(summary.suite.outcomes[0].status, Status::Failed);
            assert_eq!(summary.report.failed_count(), 1);
        }

        #[test]
        fn test_fault_requires_simulated_target() {
            let args = run_args(&["--fault", "wrong-title"]);
            let err = quiet_runner().run(&args).unwrap_err();
            assert!(err.to_string().contains("--target simulated"));
        }

        #[test]
        fn test_empty_selection_writes_nothing() {
            let dir = tempfile::tempdir().unwrap();
            write_profile(dir.path(), "");
            let args = run_args(&[
                "--env",
                "qa",
                "--env-dir",
                dir.path().to_str().unwrap(),
                "--filter",
                "no-such-scenario",
            ]);
            let summary = quiet_runner().run(&args).unwrap();
            assert_eq!(summary.suite.total(), 0);
            assert!(summary.results_path.is_none());
        }
    }
}
