//! feedback-probe: end-to-end checks for a sentiment-rating widget
//!
//! The crate models the "Help us improve" widget as a pure state machine,
//! drives either that model or a real page through the same semantic
//! operations, and reports outcomes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────┐    ┌──────────────────────┐
//! │  Scenario    │    │  ScenarioTarget  │    │  ModelTarget         │
//! │  Runner      │───►│  (Operation,     │───►│  (RatingWidget)      │
//! │  fail-fast,  │    │   Observation)   │    ├──────────────────────┤
//! │  retries,    │    │                  │───►│  PageTarget          │
//! │  workers     │    └──────────────────┘    │  page objects ─►     │
//! └──────┬───────┘                            │  Page ─► PageDriver  │
//!        │                                    └──────────────────────┘
//!        ▼
//! ┌──────────────┐
//! │  ReportSink  │  JSON results + HTML summary
//! └──────────────┘
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod driver;
mod locator;
mod page_object;
mod result;
mod scenario;
mod target;
mod validation;
mod wait;
mod widget;

/// Built-in scenario catalog
pub mod catalog;

/// Environment profiles and run configuration
pub mod config;

/// In-memory page driver rendering the widget model
pub mod mock;

/// Report sinks and report rendering
pub mod reporter;

pub use config::{EnvProfile, RunConfig};
pub use driver::{ElementHandle, PageDriver, Screenshot};
pub use locator::{
    text_matches, AriaRole, AttributeMatch, ElementRef, Locator, LocatorOptions, Page, Selector,
};
pub use mock::{PageFault, SimulatedPage};
pub use page_object::{BasePage, PageObject, RatingWidgetPage, TellUsMorePage};
pub use reporter::{attach_env_info, ReportSink, Reporter};
pub use result::{ErrorKind, ProbeError, ProbeResult};
pub use scenario::{
    Diagnostic, Expected, RunnerOptions, Scenario, ScenarioFilter, ScenarioOutcome,
    ScenarioRunner, Severity, Status, Step, StepRecord, SuiteOutcome, DEFAULT_RETRIES,
    DEFAULT_WORKERS,
};
pub use target::{ModelTarget, Observation, Operation, PageTarget, ScenarioTarget, TargetDiagnostic};
pub use validation::{
    character_count_label, comment_char_count, is_comment_valid, is_email_field_valid,
    is_valid_email, parse_character_count, FormValidation, CHARACTER_COUNT_LABEL_PREFIX,
    COMMENT_MAX_CHARS, EMAIL_ALERT_LABEL, EMAIL_ALERT_TEXT,
};
pub use wait::{
    poll_until, wait_until, Deadline, WaitOptions, WaitResult, DEFAULT_ACTION_TIMEOUT_MS,
    DEFAULT_NAVIGATION_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
};
pub use widget::{
    analyze_machine, text, FeedbackForm, FeedbackSubmission, Interest, MachineReport, Polarity,
    Rating, RatingWidget, WidgetEvent, WidgetSnapshot, WidgetState, MAX_RATING, MIN_RATING,
    NEGATIVE_AREAS, POSITIVE_AREAS, TRANSITIONS,
};
