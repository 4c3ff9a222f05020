//! Scenario runner.
//!
//! A [`Scenario`] is an ordered list of `(Operation, Expected)` steps. The
//! runner executes them against a fresh [`ScenarioTarget`], stops at the first
//! divergence, and captures a [`Diagnostic`]. Failed scenarios are retried as
//! a whole; a suite is spread across a fixed pool of worker threads, each
//! owning the targets it creates.

use crate::result::{ErrorKind, ProbeError, ProbeResult};
use crate::target::{Observation, Operation, ScenarioTarget};
use crate::wait::{Deadline, DEFAULT_NAVIGATION_TIMEOUT_MS};
use crate::widget::{Polarity, WidgetState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default whole-scenario retries
pub const DEFAULT_RETRIES: u32 = 1;

/// Default worker pool size
pub const DEFAULT_WORKERS: usize = 2;

/// Observable expected after a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expected {
    /// The operation succeeds; nothing else is checked
    Succeeds,
    /// Widget state
    State(WidgetState),
    /// Selected rating (`None` outside the form)
    Rating(Option<u8>),
    /// Polarity of the open form
    Polarity(Polarity),
    /// SUBMIT enabled or disabled
    SubmitEnabled(bool),
    /// Comment length rule
    CommentValid(bool),
    /// Email rule
    EmailValid(bool),
    /// Character-count alert reports more than this many characters
    CharacterCountAbove(usize),
    /// Exactly the contributing areas of this polarity are offered
    AreasOffered(Polarity),
    /// Comment field holds this text
    CommentValue(String),
    /// Email field holds this text
    EmailValue(String),
    /// Thank-you acknowledgment is shown
    Acknowledged,
    /// Rating prompt heading, the six rating buttons and both end labels are
    /// shown (`true`), or the prompt is gone (`false`)
    RatingPromptShown(bool),
    /// Every question and answer control of this polarity's form is shown
    FormQuestionsShown(Polarity),
    /// The operation fails with this error kind
    Error(ErrorKind),
    /// Every listed expectation holds
    All(Vec<Expected>),
}

impl Expected {
    /// Error kind the operation must fail with, if any
    #[must_use]
    pub fn expected_error(&self) -> Option<ErrorKind> {
        match self {
            Self::Error(kind) => Some(*kind),
            Self::All(items) => items.iter().find_map(Self::expected_error),
            _ => None,
        }
    }

    /// Whether checking this needs an observation
    #[must_use]
    pub fn needs_observation(&self) -> bool {
        match self {
            Self::Succeeds | Self::Error(_) => false,
            Self::All(items) => items.iter().any(Self::needs_observation),
            _ => true,
        }
    }

    /// Compare against an observation; returns the actual value on mismatch
    ///
    /// # Errors
    ///
    /// A human-readable description of the observed value
    pub fn verify(&self, obs: &Observation) -> Result<(), String> {
        let check = |ok: bool, actual: String| if ok { Ok(()) } else { Err(actual) };
        match self {
            Self::Succeeds | Self::Error(_) => Ok(()),
            Self::State(state) => check(obs.state == Some(*state), format!("state {:?}", obs.state)),
            Self::Rating(rating) => check(obs.rating == *rating, format!("rating {:?}", obs.rating)),
            Self::Polarity(p) => check(
                obs.polarity == Some(*p),
                format!("polarity {:?}", obs.polarity),
            ),
            Self::SubmitEnabled(v) => check(
                obs.submit_enabled == Some(*v),
                format!("submit enabled {:?}", obs.submit_enabled),
            ),
            Self::CommentValid(v) => check(
                obs.comment_valid == Some(*v),
                format!("comment valid {:?}", obs.comment_valid),
            ),
            Self::EmailValid(v) => check(
                obs.email_valid == Some(*v),
                format!("email valid {:?}", obs.email_valid),
            ),
            Self::CharacterCountAbove(n) => check(
                obs.character_count_alert.is_some_and(|c| c > *n),
                format!("character count alert {:?}", obs.character_count_alert),
            ),
            Self::AreasOffered(p) => check(
                obs.areas_offered.iter().map(String::as_str).eq(p.areas().iter().copied()),
                format!("areas offered {:?}", obs.areas_offered),
            ),
            Self::CommentValue(v) => check(
                obs.comment.as_deref() == Some(v.as_str()),
                format!("comment {:?}", obs.comment),
            ),
            Self::EmailValue(v) => check(
                obs.email.as_deref() == Some(v.as_str()),
                format!("email {:?}", obs.email),
            ),
            Self::Acknowledged => check(obs.acknowledged, "no acknowledgment".to_string()),
            Self::RatingPromptShown(v) => check(
                obs.rating_prompt_shown == *v,
                format!("rating prompt shown {}", obs.rating_prompt_shown),
            ),
            Self::FormQuestionsShown(p) => check(
                obs.form_questions == Some(*p),
                format!("form questions {:?}", obs.form_questions),
            ),
            Self::All(items) => items.iter().try_for_each(|item| item.verify(obs)),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeds => write!(f, "succeeds"),
            Self::State(s) => write!(f, "state {s}"),
            Self::Rating(r) => write!(f, "rating {r:?}"),
            Self::Polarity(p) => write!(f, "polarity {p}"),
            Self::SubmitEnabled(v) => write!(f, "submit enabled = {v}"),
            Self::CommentValid(v) => write!(f, "comment valid = {v}"),
            Self::EmailValid(v) => write!(f, "email valid = {v}"),
            Self::CharacterCountAbove(n) => write!(f, "character count > {n}"),
            Self::AreasOffered(p) => write!(f, "{p} areas offered"),
            Self::CommentValue(v) => write!(f, "comment = {v:?}"),
            Self::EmailValue(v) => write!(f, "email = {v:?}"),
            Self::Acknowledged => write!(f, "acknowledged"),
            Self::RatingPromptShown(v) => write!(f, "rating prompt shown = {v}"),
            Self::FormQuestionsShown(p) => write!(f, "{p} form questions shown"),
            Self::Error(kind) => write!(f, "error {kind}"),
            Self::All(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(" and "))
            }
        }
    }
}

/// One operation and what must hold after it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Operation to apply
    pub operation: Operation,
    /// Expected observable
    pub expected: Expected,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.operation, &self.expected) {
            (op, Expected::Succeeds) => write!(f, "{op}"),
            (Operation::Observe, expected) => write!(f, "expect {expected}"),
            (op, expected) => write!(f, "{op}, expect {expected}"),
        }
    }
}

/// Report severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks release
    Blocker,
    /// Critical path
    Critical,
    /// Default
    #[default]
    Normal,
    /// Minor
    Minor,
    /// Cosmetic
    Trivial,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Blocker => "blocker",
            Self::Critical => "critical",
            Self::Normal => "normal",
            Self::Minor => "minor",
            Self::Trivial => "trivial",
        };
        f.write_str(name)
    }
}

/// A named, independently runnable sequence of steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Longer description
    pub description: String,
    /// Report epic
    pub epic: String,
    /// Report feature
    pub feature: String,
    /// Report story
    pub story: String,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Report severity
    pub severity: Severity,
    /// Ordered steps
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Create an empty scenario
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            epic: String::new(),
            feature: String::new(),
            story: String::new(),
            tags: Vec::new(),
            severity: Severity::default(),
            steps: Vec::new(),
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the epic
    #[must_use]
    pub fn with_epic(mut self, epic: impl Into<String>) -> Self {
        self.epic = epic.into();
        self
    }

    /// Set the feature
    #[must_use]
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = feature.into();
        self
    }

    /// Set the story
    #[must_use]
    pub fn with_story(mut self, story: impl Into<String>) -> Self {
        self.story = story.into();
        self
    }

    /// Add tags
    #[must_use]
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags.extend(tags.iter().map(|t| (*t).to_string()));
        self
    }

    /// Set the severity
    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Append a step
    #[must_use]
    pub fn step(mut self, operation: Operation, expected: Expected) -> Self {
        self.steps.push(Step {
            operation,
            expected,
        });
        self
    }

    /// Append an operation that must succeed
    #[must_use]
    pub fn act(self, operation: Operation) -> Self {
        self.step(operation, Expected::Succeeds)
    }

    /// Append a pure check
    #[must_use]
    pub fn expect(self, expected: Expected) -> Self {
        self.step(Operation::Observe, expected)
    }

    /// Whether this scenario carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Selects scenarios by name substring and tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioFilter {
    /// Case-insensitive name substring
    pub name: Option<String>,
    /// Scenario must carry at least one of these tags
    pub tags: Vec<String>,
}

impl ScenarioFilter {
    /// Whether `scenario` is selected
    #[must_use]
    pub fn matches(&self, scenario: &Scenario) -> bool {
        let name_ok = self
            .name
            .as_deref()
            .is_none_or(|n| scenario.name.to_lowercase().contains(&n.to_lowercase()));
        let tag_ok = self.tags.is_empty() || self.tags.iter().any(|t| scenario.has_tag(t));
        name_ok && tag_ok
    }

    /// Keep only the selected scenarios, in order
    #[must_use]
    pub fn apply(&self, scenarios: Vec<Scenario>) -> Vec<Scenario> {
        scenarios.into_iter().filter(|s| self.matches(s)).collect()
    }
}

/// Status of a step or scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Every expectation held
    Passed,
    /// An expectation diverged
    Failed,
    /// Setup failed before any step ran
    Broken,
    /// Not executed
    Skipped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Broken => "broken",
            Self::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Execution record of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Zero-based index
    pub index: usize,
    /// Human-readable step name
    pub name: String,
    /// Step status
    pub status: Status,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Failure message
    pub message: Option<String>,
}

/// State captured at the point of failure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Attempt number (1-based)
    pub attempt: u32,
    /// Failing step index, if a step failed
    pub step: Option<usize>,
    /// Last operation issued
    pub operation: Option<String>,
    /// Expected observable
    pub expected: Option<String>,
    /// Actual observable or error
    pub actual: Option<String>,
    /// Target state snapshot
    pub snapshot: serde_json::Value,
    /// Screenshot bytes and MIME type
    #[serde(skip)]
    pub screenshot: Option<(Vec<u8>, String)>,
    /// Document content
    #[serde(skip)]
    pub content: Option<String>,
}

/// Final result of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Scenario name
    pub name: String,
    /// Final status
    pub status: Status,
    /// Attempts made (1 + retries used)
    pub attempts: u32,
    /// Start of the first attempt
    pub started_at: DateTime<Utc>,
    /// Total duration across attempts
    pub duration: Duration,
    /// Step records of the last attempt
    pub steps: Vec<StepRecord>,
    /// Failure message of the last attempt
    pub error: Option<String>,
    /// Diagnostic of the last failed attempt
    pub diagnostic: Option<Diagnostic>,
}

impl ScenarioOutcome {
    /// Whether the scenario passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == Status::Passed
    }

    /// Passed, but only after a retry
    #[must_use]
    pub fn is_flaky(&self) -> bool {
        self.passed() && self.attempts > 1
    }

    fn broken(name: &str, error: &ProbeError) -> Self {
        Self {
            name: name.to_string(),
            status: Status::Broken,
            attempts: 1,
            started_at: Utc::now(),
            duration: Duration::ZERO,
            steps: Vec::new(),
            error: Some(error.to_string()),
            diagnostic: None,
        }
    }
}

/// Outcomes of a suite, in catalog order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteOutcome {
    /// Individual outcomes
    pub outcomes: Vec<ScenarioOutcome>,
    /// Wall-clock duration
    pub duration: Duration,
}

impl SuiteOutcome {
    /// Number of passed scenarios
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// Number of failed or broken scenarios
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed()).count()
    }

    /// Number of scenarios that passed on retry
    #[must_use]
    pub fn flaky(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_flaky()).count()
    }

    /// Total scenarios
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether every scenario passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(ScenarioOutcome::passed)
    }

    /// Failed or broken outcomes
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioOutcome> {
        self.outcomes.iter().filter(|o| !o.passed()).collect()
    }
}

/// Runner settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Whole-scenario retries after a failure
    pub retries: u32,
    /// Worker threads for suites
    pub workers: usize,
    /// Per-attempt time budget in milliseconds
    pub scenario_timeout_ms: u64,
    /// Capture a screenshot into the diagnostic
    pub screenshot_on_failure: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            workers: DEFAULT_WORKERS,
            scenario_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            screenshot_on_failure: true,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

struct AttemptFailure {
    status: Status,
    message: String,
    diagnostic: Diagnostic,
}

/// Executes scenarios against targets
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    options: RunnerOptions,
}

impl ScenarioRunner {
    /// Create a runner
    #[must_use]
    pub const fn new(options: RunnerOptions) -> Self {
        Self { options }
    }

    /// Runner settings
    #[must_use]
    pub const fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Run one scenario, resetting `target` before every attempt
    pub fn run_scenario(
        &self,
        scenario: &Scenario,
        target: &mut dyn ScenarioTarget,
    ) -> ScenarioOutcome {
        self.run_with_retries(scenario, |attempt| {
            self.attempt(scenario, &mut *target, attempt)
        })
    }

    /// Run one scenario with a fresh target from `factory` for every attempt
    pub fn run_scenario_fresh<T, F>(&self, scenario: &Scenario, factory: &F) -> ScenarioOutcome
    where
        T: ScenarioTarget,
        F: Fn() -> ProbeResult<T>,
    {
        self.run_with_retries(scenario, |attempt| match factory() {
            Ok(mut target) => self.attempt(scenario, &mut target, attempt),
            Err(e) => Err((
                Vec::new(),
                AttemptFailure {
                    status: Status::Broken,
                    message: format!("could not create target: {e}"),
                    diagnostic: Diagnostic {
                        attempt,
                        actual: Some(e.to_string()),
                        ..Diagnostic::default()
                    },
                },
            )),
        })
    }

    /// Run a suite across the worker pool. Outcomes keep the input order.
    pub fn run_suite<T, F>(&self, scenarios: &[Scenario], factory: F) -> SuiteOutcome
    where
        T: ScenarioTarget,
        F: Fn() -> ProbeResult<T> + Sync,
    {
        self.run_suite_with(scenarios, factory, |_| {})
    }

    /// Like [`Self::run_suite`], calling `on_complete` as each scenario finishes
    pub fn run_suite_with<T, F, C>(
        &self,
        scenarios: &[Scenario],
        factory: F,
        on_complete: C,
    ) -> SuiteOutcome
    where
        T: ScenarioTarget,
        F: Fn() -> ProbeResult<T> + Sync,
        C: Fn(&ScenarioOutcome) + Sync,
    {
        let start = Instant::now();
        let workers = self.options.workers.clamp(1, scenarios.len().max(1));
        let next = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<ScenarioOutcome>>> = Mutex::new(vec![None; scenarios.len()]);

        tracing::info!(scenarios = scenarios.len(), workers, "running suite");

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let (next, slots, factory, on_complete) =
                        (&next, &slots, &factory, &on_complete);
                    scope.spawn(move || loop {
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(scenario) = scenarios.get(index) else {
                            break;
                        };
                        tracing::debug!(worker, scenario = %scenario.name, "picked scenario");
                        let outcome = catch_unwind(AssertUnwindSafe(|| {
                            self.run_scenario_fresh(scenario, factory)
                        }))
                        .unwrap_or_else(|payload| {
                            let message = panic_message(payload.as_ref());
                            tracing::error!(scenario = %scenario.name, %message, "target panicked");
                            ScenarioOutcome::broken(
                                &scenario.name,
                                &ProbeError::driver(format!("target panicked: {message}")),
                            )
                        });
                        on_complete(&outcome);
                        if let Ok(mut slots) = slots.lock() {
                            slots[index] = Some(outcome);
                        }
                    })
                })
                .collect();
            for (worker, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    tracing::error!(worker, "worker terminated early");
                }
            }
        });

        let outcomes = slots
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .into_iter()
            .zip(scenarios)
            .map(|(slot, scenario)| {
                slot.unwrap_or_else(|| {
                    ScenarioOutcome::broken(
                        &scenario.name,
                        &ProbeError::driver("worker terminated before reporting"),
                    )
                })
            })
            .collect();

        SuiteOutcome {
            outcomes,
            duration: start.elapsed(),
        }
    }

    fn run_with_retries<A>(&self, scenario: &Scenario, mut attempt: A) -> ScenarioOutcome
    where
        A: FnMut(u32) -> Result<Vec<StepRecord>, (Vec<StepRecord>, AttemptFailure)>,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let max_attempts = self.options.retries.saturating_add(1);
        let mut number = 0;

        loop {
            number += 1;
            tracing::info!(scenario = %scenario.name, attempt = number, "scenario started");
            match attempt(number) {
                Ok(steps) => {
                    tracing::info!(scenario = %scenario.name, attempt = number, "scenario passed");
                    return ScenarioOutcome {
                        name: scenario.name.clone(),
                        status: Status::Passed,
                        attempts: number,
                        started_at,
                        duration: start.elapsed(),
                        steps,
                        error: None,
                        diagnostic: None,
                    };
                }
                Err((steps, failure)) if number >= max_attempts => {
                    tracing::error!(
                        scenario = %scenario.name,
                        attempts = number,
                        error = %failure.message,
                        "scenario failed"
                    );
                    return ScenarioOutcome {
                        name: scenario.name.clone(),
                        status: failure.status,
                        attempts: number,
                        started_at,
                        duration: start.elapsed(),
                        steps,
                        error: Some(failure.message),
                        diagnostic: Some(failure.diagnostic),
                    };
                }
                Err((_, failure)) => {
                    tracing::warn!(
                        scenario = %scenario.name,
                        attempt = number,
                        error = %failure.message,
                        "scenario attempt failed, retrying"
                    );
                }
            }
        }
    }

    /// Execute the steps once, fail-fast
    fn attempt(
        &self,
        scenario: &Scenario,
        target: &mut dyn ScenarioTarget,
        attempt: u32,
    ) -> Result<Vec<StepRecord>, (Vec<StepRecord>, AttemptFailure)> {
        let deadline = Deadline::after(Duration::from_millis(self.options.scenario_timeout_ms));
        let mut records = Vec::with_capacity(scenario.steps.len());

        if let Err(e) = target.reset() {
            let message = e.to_string();
            let failure = self.failure(target, Status::Broken, attempt, None, None, None, &message);
            return Err((records, failure));
        }

        for (index, step) in scenario.steps.iter().enumerate() {
            let step_start = Instant::now();
            let verdict = deadline
                .check()
                .map_err(|e| e.to_string())
                .and_then(|()| Self::execute(step, &mut *target))
                .and_then(|()| deadline.check().map_err(|e| e.to_string()));
            let duration_ms = step_start.elapsed().as_millis() as u64;

            match verdict {
                Ok(()) => {
                    tracing::debug!(scenario = %scenario.name, step = index, "{step}");
                    records.push(StepRecord {
                        index,
                        name: step.to_string(),
                        status: Status::Passed,
                        duration_ms,
                        message: None,
                    });
                }
                Err(actual) => {
                    let message =
                        format!("step {index} ({step}): expected {}, got {actual}", step.expected);
                    records.push(StepRecord {
                        index,
                        name: step.to_string(),
                        status: Status::Failed,
                        duration_ms,
                        message: Some(message.clone()),
                    });
                    records.extend(scenario.steps.iter().enumerate().skip(index + 1).map(
                        |(i, s)| StepRecord {
                            index: i,
                            name: s.to_string(),
                            status: Status::Skipped,
                            duration_ms: 0,
                            message: None,
                        },
                    ));
                    let failure = self.failure(
                        target,
                        Status::Failed,
                        attempt,
                        Some((index, step)),
                        Some(step.expected.to_string()),
                        Some(actual),
                        &message,
                    );
                    return Err((records, failure));
                }
            }
        }
        Ok(records)
    }

    /// Apply one step and compare; `Err` carries the actual observable
    fn execute(step: &Step, target: &mut dyn ScenarioTarget) -> Result<(), String> {
        let result = target.apply(&step.operation);
        match (step.expected.expected_error(), result) {
            (None, Ok(())) => {}
            (Some(kind), Err(e)) if e.kind() == kind => {}
            (Some(_), Ok(())) => return Err("operation succeeded".to_string()),
            (_, Err(e)) => return Err(format!("error {}: {e}", e.kind())),
        }
        if step.expected.needs_observation() {
            let observation = target.observe().map_err(|e| format!("observation failed: {e}"))?;
            step.expected.verify(&observation)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn failure(
        &self,
        target: &mut dyn ScenarioTarget,
        status: Status,
        attempt: u32,
        step: Option<(usize, &Step)>,
        expected: Option<String>,
        actual: Option<String>,
        message: &str,
    ) -> AttemptFailure {
        let captured = target.diagnostic(self.options.screenshot_on_failure);
        AttemptFailure {
            status,
            message: message.to_string(),
            diagnostic: Diagnostic {
                attempt,
                step: step.map(|(i, _)| i),
                operation: step.map(|(_, s)| s.operation.to_string()),
                expected,
                actual: actual.or_else(|| Some(message.to_string())),
                snapshot: captured.snapshot,
                screenshot: captured.screenshot,
                content: captured.content,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::locator::Page;
    use crate::mock::{PageFault, SimulatedPage};
    use crate::target::{ModelTarget, PageTarget, TargetDiagnostic};
    use crate::wait::WaitOptions;
    use std::sync::atomic::AtomicU32;

    fn fast_page(driver: SimulatedPage) -> PageTarget<SimulatedPage> {
        let page = Page::new(driver)
            .with_wait_options(WaitOptions::new().with_timeout(60).with_poll_interval(5))
            .with_navigation_timeout(200);
        PageTarget::new(page, "https://docs.example.test/")
    }

    fn submit_flow() -> Scenario {
        Scenario::new("submit rating 1")
            .with_tags(&["negative", "e2e"])
            .act(Operation::Open)
            .act(Operation::SelectRating(1))
            .act(Operation::ToggleArea("Technical errors".into()))
            .expect(Expected::SubmitEnabled(true))
            .step(
                Operation::Submit,
                Expected::All(vec![Expected::State(WidgetState::Closed), Expected::Acknowledged]),
            )
    }

    /// Fails the first `failures` attempts on `reset`
    struct Flaky {
        inner: ModelTarget,
        resets: AtomicU32,
        failures: u32,
    }

    impl ScenarioTarget for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn reset(&mut self) -> ProbeResult<()> {
            let n = self.resets.fetch_add(1, Ordering::SeqCst);
            self.inner.reset()?;
            if n < self.failures {
                // Leave the widget open so the first step diverges
                self.inner.apply(&Operation::Open)?;
            }
            Ok(())
        }

        fn apply(&mut self, op: &Operation) -> ProbeResult<()> {
            self.inner.apply(op)
        }

        fn observe(&mut self) -> ProbeResult<Observation> {
            self.inner.observe()
        }

        fn diagnostic(&mut self, capture: bool) -> TargetDiagnostic {
            self.inner.diagnostic(capture)
        }
    }

    mod expected_tests {
        use super::*;

        #[test]
        fn test_error_extraction() {
            let e = Expected::All(vec![
                Expected::State(WidgetState::Open),
                Expected::Error(ErrorKind::OutOfRange),
            ]);
            assert_eq!(e.expected_error(), Some(ErrorKind::OutOfRange));
            assert!(e.needs_observation());
            assert!(!Expected::Error(ErrorKind::OutOfRange).needs_observation());
        }

        #[test]
        fn test_verify_mismatch_reports_actual() {
            let obs = Observation {
                state: Some(WidgetState::Open),
                ..Observation::default()
            };
            let err = Expected::State(WidgetState::Closed).verify(&obs).unwrap_err();
            assert!(err.contains("Open"));
        }

        #[test]
        fn test_verify_display_checks() {
            let obs = Observation {
                state: Some(WidgetState::FeedbackOpen),
                form_questions: Some(Polarity::Negative),
                ..Observation::default()
            };
            Expected::RatingPromptShown(false).verify(&obs).unwrap();
            Expected::FormQuestionsShown(Polarity::Negative).verify(&obs).unwrap();
            let err = Expected::FormQuestionsShown(Polarity::Positive)
                .verify(&obs)
                .unwrap_err();
            assert!(err.contains("Negative"));
            assert!(Expected::RatingPromptShown(true).verify(&obs).is_err());
        }

        #[test]
        fn test_display() {
            assert_eq!(
                Expected::All(vec![Expected::SubmitEnabled(false), Expected::EmailValid(false)])
                    .to_string(),
                "submit enabled = false and email valid = false"
            );
        }
    }

    mod filter_tests {
        use super::*;

        #[test]
        fn test_name_and_tag() {
            let s = submit_flow();
            assert!(ScenarioFilter::default().matches(&s));
            assert!(ScenarioFilter {
                name: Some("RATING 1".into()),
                tags: vec![]
            }
            .matches(&s));
            assert!(ScenarioFilter {
                name: None,
                tags: vec!["positive".into(), "E2E".into()]
            }
            .matches(&s));
            assert!(!ScenarioFilter {
                name: None,
                tags: vec!["positive".into()]
            }
            .matches(&s));
        }
    }

    mod runner_tests {
        use super::*;

        #[test]
        fn test_pass_on_model() {
            let runner = ScenarioRunner::default();
            let outcome = runner.run_scenario(&submit_flow(), &mut ModelTarget::new());
            assert!(outcome.passed(), "{:?}", outcome.error);
            assert_eq!(outcome.attempts, 1);
            assert_eq!(outcome.steps.len(), 5);
        }

        #[test]
        fn test_pass_on_page() {
            let runner = ScenarioRunner::default();
            let outcome = runner.run_scenario(&submit_flow(), &mut fast_page(SimulatedPage::new()));
            assert!(outcome.passed(), "{:?}", outcome.error);
        }

        #[test]
        fn test_expected_error_is_observable() {
            let scenario = Scenario::new("out of range")
                .act(Operation::Open)
                .step(
                    Operation::SelectRating(0),
                    Expected::All(vec![
                        Expected::Error(ErrorKind::OutOfRange),
                        Expected::State(WidgetState::Open),
                    ]),
                )
                .step(Operation::Open, Expected::Error(ErrorKind::InvalidTransition));
            let outcome = ScenarioRunner::default().run_scenario(&scenario, &mut ModelTarget::new());
            assert!(outcome.passed(), "{:?}", outcome.error);
        }

        #[test]
        fn test_fail_fast_with_diagnostic() {
            let scenario = Scenario::new("wrong expectation")
                .act(Operation::Open)
                .act(Operation::SelectRating(2))
                .expect(Expected::SubmitEnabled(true))
                .act(Operation::Close);
            let runner = ScenarioRunner::new(RunnerOptions {
                retries: 0,
                ..RunnerOptions::default()
            });
            let outcome = runner.run_scenario(&scenario, &mut ModelTarget::new());
            assert_eq!(outcome.status, Status::Failed);
            assert_eq!(outcome.steps[2].status, Status::Failed);
            assert_eq!(outcome.steps[3].status, Status::Skipped);
            let diag = outcome.diagnostic.unwrap();
            assert_eq!(diag.step, Some(2));
            assert_eq!(diag.expected.as_deref(), Some("submit enabled = true"));
            assert!(diag.actual.unwrap().contains("Some(false)"));
            assert_eq!(diag.snapshot["state"], "FeedbackOpen");
        }

        #[test]
        fn test_unexpected_error_fails() {
            let scenario = Scenario::new("close when closed").act(Operation::Close);
            let outcome = ScenarioRunner::default().run_scenario(&scenario, &mut ModelTarget::new());
            assert_eq!(outcome.status, Status::Failed);
            assert!(outcome.error.unwrap().contains("InvalidTransition"));
            assert_eq!(outcome.attempts, 2);
        }

        #[test]
        fn test_retry_recovers() {
            let mut target = Flaky {
                inner: ModelTarget::new(),
                resets: AtomicU32::new(0),
                failures: 1,
            };
            let outcome = ScenarioRunner::default().run_scenario(&submit_flow(), &mut target);
            assert!(outcome.passed());
            assert!(outcome.is_flaky());
            assert_eq!(outcome.attempts, 2);
        }

        #[test]
        fn test_retries_are_bounded() {
            let mut target = Flaky {
                inner: ModelTarget::new(),
                resets: AtomicU32::new(0),
                failures: 10,
            };
            let runner = ScenarioRunner::new(RunnerOptions {
                retries: 2,
                ..RunnerOptions::default()
            });
            let outcome = runner.run_scenario(&submit_flow(), &mut target);
            assert_eq!(outcome.status, Status::Failed);
            assert_eq!(outcome.attempts, 3);
            assert_eq!(target.resets.load(Ordering::SeqCst), 3);
        }

        #[test]
        fn test_page_fault_detected_with_screenshot() {
            let scenario = Scenario::new("submit gated")
                .act(Operation::Open)
                .act(Operation::SelectRating(3))
                .expect(Expected::SubmitEnabled(false));
            let runner = ScenarioRunner::new(RunnerOptions {
                retries: 0,
                ..RunnerOptions::default()
            });
            let mut target = fast_page(SimulatedPage::new().with_fault(PageFault::SubmitAlwaysEnabled));
            let outcome = runner.run_scenario(&scenario, &mut target);
            assert_eq!(outcome.status, Status::Failed);
            let diag = outcome.diagnostic.unwrap();
            assert!(diag.screenshot.is_some());
            assert!(diag.content.unwrap().contains("SUBMIT"));
        }

        #[test]
        fn test_setup_failure_is_broken() {
            let runner = ScenarioRunner::new(RunnerOptions {
                retries: 0,
                ..RunnerOptions::default()
            });
            let mut target = fast_page(SimulatedPage::new().with_fault(PageFault::WrongTitle));
            let outcome = runner.run_scenario(&submit_flow(), &mut target);
            assert_eq!(outcome.status, Status::Broken);
            assert!(outcome.steps.is_empty());
        }

        #[test]
        fn test_scenario_timeout() {
            let runner = ScenarioRunner::new(RunnerOptions {
                retries: 0,
                scenario_timeout_ms: 0,
                ..RunnerOptions::default()
            });
            let outcome = runner.run_scenario(&submit_flow(), &mut ModelTarget::new());
            assert_eq!(outcome.status, Status::Failed);
            assert!(outcome.error.unwrap().contains("timed out"));
        }

        #[test]
        fn test_fresh_target_per_attempt() {
            let created = AtomicU32::new(0);
            let factory = || {
                let n = created.fetch_add(1, Ordering::SeqCst);
                Ok(Flaky {
                    inner: ModelTarget::new(),
                    resets: AtomicU32::new(0),
                    failures: u32::from(n == 0),
                })
            };
            let outcome = ScenarioRunner::default().run_scenario_fresh(&submit_flow(), &factory);
            assert!(outcome.passed());
            assert_eq!(created.load(Ordering::SeqCst), 2);
        }

        #[test]
        fn test_factory_failure_is_broken() {
            let runner = ScenarioRunner::new(RunnerOptions {
                retries: 0,
                ..RunnerOptions::default()
            });
            let outcome = runner.run_scenario_fresh(&submit_flow(), &|| {
                Err::<ModelTarget, _>(ProbeError::config("no browser"))
            });
            assert_eq!(outcome.status, Status::Broken);
        }
    }

    mod suite_tests {
        use super::*;

        #[test]
        fn test_suite_preserves_order() {
            let scenarios: Vec<Scenario> = (1..=6)
                .map(|n| {
                    Scenario::new(format!("rating {n}"))
                        .act(Operation::Open)
                        .step(Operation::SelectRating(n), Expected::Rating(Some(n as u8)))
                })
                .collect();
            let runner = ScenarioRunner::new(RunnerOptions {
                workers: 3,
                ..RunnerOptions::default()
            });
            let completed = AtomicU32::new(0);
            let suite = runner.run_suite_with(
                &scenarios,
                || Ok(ModelTarget::new()),
                |_| {
                    completed.fetch_add(1, Ordering::SeqCst);
                },
            );
            assert!(suite.all_passed());
            assert_eq!(completed.load(Ordering::SeqCst), 6);
            let names: Vec<&str> = suite.outcomes.iter().map(|o| o.name.as_str()).collect();
            assert_eq!(names, ["rating 1", "rating 2", "rating 3", "rating 4", "rating 5", "rating 6"]);
        }

        #[test]
        fn test_suite_on_pages() {
            let scenarios = vec![submit_flow(), submit_flow().with_tags(&["copy"])];
            let suite = ScenarioRunner::default()
                .run_suite(&scenarios, || Ok(fast_page(SimulatedPage::new())));
            assert_eq!(suite.passed(), 2);
            assert_eq!(suite.failed(), 0);
        }

        struct Exploding(ModelTarget);

        impl ScenarioTarget for Exploding {
            fn name(&self) -> &str {
                "exploding"
            }

            fn reset(&mut self) -> ProbeResult<()> {
                self.0.reset()
            }

            fn apply(&mut self, op: &Operation) -> ProbeResult<()> {
                assert!(*op != Operation::Submit, "submit exploded");
                self.0.apply(op)
            }

            fn observe(&mut self) -> ProbeResult<Observation> {
                self.0.observe()
            }

            fn diagnostic(&mut self, capture: bool) -> TargetDiagnostic {
                self.0.diagnostic(capture)
            }
        }

        #[test]
        fn test_target_panic_is_broken_and_suite_continues() {
            let scenarios = vec![
                submit_flow(),
                Scenario::new("open only").step(Operation::Open, Expected::State(WidgetState::Open)),
            ];
            let runner = ScenarioRunner::new(RunnerOptions {
                retries: 0,
                workers: 1,
                ..RunnerOptions::default()
            });
            let suite = runner.run_suite(&scenarios, || Ok(Exploding(ModelTarget::new())));
            assert_eq!(suite.total(), 2);
            assert_eq!(suite.outcomes[0].status, Status::Broken);
            assert!(suite.outcomes[0]
                .error
                .as_deref()
                .is_some_and(|e| e.contains("submit exploded")));
            assert!(suite.outcomes[1].passed());
        }

        #[test]
        fn test_empty_suite() {
            let suite = ScenarioRunner::default().run_suite(&[], || Ok(ModelTarget::new()));
            assert_eq!(suite.total(), 0);
            assert!(suite.all_passed());
        }
    }
}
