//! Scenario targets.
//!
//! A target turns semantic widget operations into concrete effects and
//! reports what can be observed afterwards. [`ModelTarget`] drives the pure
//! [`RatingWidget`]; [`PageTarget`] drives a [`Page`] through page objects and
//! reads observations back from the document.

use crate::driver::PageDriver;
use crate::locator::{AriaRole, Page, Selector};
use crate::page_object::{BasePage, RatingWidgetPage, TellUsMorePage};
use crate::result::{ErrorKind, ProbeError, ProbeResult};
use crate::validation::COMMENT_MAX_CHARS;
use crate::widget::{
    text, FeedbackForm, Interest, Polarity, Rating, RatingWidget, WidgetState,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A semantic intent against the widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Open the rating prompt
    Open,
    /// Choose a rating (raw, so out-of-range values can be exercised)
    SelectRating(i64),
    /// Close the widget
    Close,
    /// Toggle a contributing area
    ToggleArea(String),
    /// Toggle an optional interest
    ToggleInterest(String),
    /// Tick every optional interest that is not ticked yet
    SelectAllInterests,
    /// Replace the comment
    SetComment(String),
    /// Type the comment key by key, appending
    TypeComment(String),
    /// Replace the email
    SetEmail(String),
    /// Type the email key by key, appending
    TypeEmail(String),
    /// Empty comment and email
    ClearFields,
    /// Submit the form
    Submit,
    /// No action; only observe
    Observe,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview = |s: &str| {
            let count = s.chars().count();
            if count > 24 {
                format!("{}... ({count} chars)", s.chars().take(24).collect::<String>())
            } else {
                s.to_string()
            }
        };
        match self {
            Self::Open => write!(f, "open"),
            Self::SelectRating(n) => write!(f, "select rating {n}"),
            Self::Close => write!(f, "close"),
            Self::ToggleArea(tag) => write!(f, "toggle area '{tag}'"),
            Self::ToggleInterest(tag) => write!(f, "toggle interest '{tag}'"),
            Self::SelectAllInterests => write!(f, "select all interests"),
            Self::SetComment(s) => write!(f, "set comment '{}'", preview(s)),
            Self::TypeComment(s) => write!(f, "type comment '{}'", preview(s)),
            Self::SetEmail(s) => write!(f, "set email '{s}'"),
            Self::TypeEmail(s) => write!(f, "type email '{s}'"),
            Self::ClearFields => write!(f, "clear fields"),
            Self::Submit => write!(f, "submit"),
            Self::Observe => write!(f, "observe"),
        }
    }
}

/// What a target reports after an operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Widget state
    pub state: Option<WidgetState>,
    /// Selected rating while the form is open
    pub rating: Option<u8>,
    /// Polarity of the open form
    pub polarity: Option<Polarity>,
    /// SUBMIT enabled, when the form is open
    pub submit_enabled: Option<bool>,
    /// Comment length rule, when the form is open
    pub comment_valid: Option<bool>,
    /// Email rule, when the form is open
    pub email_valid: Option<bool>,
    /// Count shown by the character-count alert
    pub character_count_alert: Option<usize>,
    /// Contributing areas offered by the form
    pub areas_offered: Vec<String>,
    /// Comment field value
    pub comment: Option<String>,
    /// Email field value
    pub email: Option<String>,
    /// Thank-you acknowledgment is shown
    pub acknowledged: bool,
    /// Rating prompt is fully rendered
    pub rating_prompt_shown: bool,
    /// Polarity whose full question set is rendered
    pub form_questions: Option<Polarity>,
}

/// State captured when a scenario fails
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetDiagnostic {
    /// Serialized state of the target
    pub snapshot: serde_json::Value,
    /// Screenshot bytes and their MIME type
    pub screenshot: Option<(Vec<u8>, String)>,
    /// Document content
    pub content: Option<String>,
}

/// Something a scenario can be run against
pub trait ScenarioTarget {
    /// Short name for logs and reports
    fn name(&self) -> &str;

    /// Return to a fresh, closed widget
    ///
    /// # Errors
    ///
    /// Navigation or readiness failures
    fn reset(&mut self) -> ProbeResult<()>;

    /// Perform one operation
    ///
    /// # Errors
    ///
    /// Contract violations (`InvalidTransition`, `OutOfRange`,
    /// `SubmitBlocked`) or locator failures
    fn apply(&mut self, op: &Operation) -> ProbeResult<()>;

    /// Read the current observables
    ///
    /// # Errors
    ///
    /// Driver failures
    fn observe(&mut self) -> ProbeResult<Observation>;

    /// Capture failure context; never fails
    fn diagnostic(&mut self, capture_screenshot: bool) -> TargetDiagnostic;
}

fn model_observation(widget: &RatingWidget) -> Observation {
    let form = widget.form();
    let validation = form.map(|f| f.validation());
    Observation {
        state: Some(widget.state()),
        rating: widget.selected_rating().map(Rating::value),
        polarity: widget.polarity(),
        submit_enabled: validation.map(|v| v.submit_enabled()),
        comment_valid: validation.map(|v| v.comment_valid),
        email_valid: validation.map(|v| v.email_valid),
        character_count_alert: validation
            .filter(|v| !v.comment_valid)
            .map(|v| v.comment_chars),
        areas_offered: widget
            .polarity()
            .map(|p| p.areas().iter().map(|a| (*a).to_string()).collect())
            .unwrap_or_default(),
        comment: form.map(|f| f.comment().to_string()),
        email: form.map(|f| f.email().to_string()),
        acknowledged: widget.acknowledgment().is_some(),
        rating_prompt_shown: widget.state() == WidgetState::Open,
        form_questions: form.map(FeedbackForm::polarity),
    }
}

/// `Ok(false)` for a failed page assertion, other errors pass through
fn holds(check: ProbeResult<()>) -> ProbeResult<bool> {
    match check {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::Assertion => Ok(false),
        Err(e) => Err(e),
    }
}

/// Drives the widget model directly
#[derive(Debug, Clone, Default)]
pub struct ModelTarget {
    widget: RatingWidget,
}

impl ModelTarget {
    /// Create a target with a closed widget
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The widget under test
    #[must_use]
    pub const fn widget(&self) -> &RatingWidget {
        &self.widget
    }
}

impl ScenarioTarget for ModelTarget {
    fn name(&self) -> &str {
        "model"
    }

    fn reset(&mut self) -> ProbeResult<()> {
        self.widget = RatingWidget::new();
        Ok(())
    }

    fn apply(&mut self, op: &Operation) -> ProbeResult<()> {
        let w = &mut self.widget;
        match op {
            Operation::Open => w.open(),
            Operation::SelectRating(n) => w.select_rating(*n).map(|_| ()),
            Operation::Close => w.close(),
            Operation::ToggleArea(tag) => w.toggle_area(tag).map(|_| ()),
            Operation::ToggleInterest(tag) => w.toggle_interest(tag).map(|_| ()),
            Operation::SelectAllInterests => {
                let selected = w.form().map(FeedbackForm::interests).unwrap_or_default();
                for interest in Interest::ALL {
                    if !selected.contains(&interest) {
                        let _ = w.toggle_interest(interest.label())?;
                    }
                }
                Ok(())
            }
            Operation::SetComment(s) => w.set_comment(s.as_str()),
            Operation::TypeComment(s) => {
                let current = w.form().map(|f| f.comment().to_string()).unwrap_or_default();
                w.set_comment(current + s)
            }
            Operation::SetEmail(s) => w.set_email(s.as_str()),
            Operation::TypeEmail(s) => {
                let current = w.form().map(|f| f.email().to_string()).unwrap_or_default();
                w.set_email(current + s)
            }
            Operation::ClearFields => w.clear_fields(),
            Operation::Submit => w.submit().map(|_| ()),
            Operation::Observe => Ok(()),
        }
    }

    fn observe(&mut self) -> ProbeResult<Observation> {
        Ok(model_observation(&self.widget))
    }

    fn diagnostic(&mut self, _capture_screenshot: bool) -> TargetDiagnostic {
        TargetDiagnostic {
            snapshot: serde_json::to_value(self.widget.snapshot()).unwrap_or_default(),
            screenshot: None,
            content: None,
        }
    }
}

/// Drives a page through the page objects
#[derive(Debug)]
pub struct PageTarget<D> {
    page: Page<D>,
    base_url: String,
    expected_title: String,
    typing_delay: Duration,
    rating: Option<Rating>,
}

impl<D: PageDriver> PageTarget<D> {
    /// Wrap a page that will be reset to `base_url`
    #[must_use]
    pub fn new(page: Page<D>, base_url: impl Into<String>) -> Self {
        Self {
            page,
            base_url: base_url.into(),
            expected_title: text::PAGE_TITLE.to_string(),
            typing_delay: Duration::ZERO,
            rating: None,
        }
    }

    /// Title to expect after navigation
    #[must_use]
    pub fn with_expected_title(mut self, title: impl Into<String>) -> Self {
        self.expected_title = title.into();
        self
    }

    /// Keystroke delay for typed operations
    #[must_use]
    pub const fn with_typing_delay(mut self, delay: Duration) -> Self {
        self.typing_delay = delay;
        self
    }

    /// The driven page
    #[must_use]
    pub const fn page(&self) -> &Page<D> {
        &self.page
    }

    /// Infer the widget state from what is rendered
    fn current_state(&mut self) -> ProbeResult<WidgetState> {
        let form_heading = Selector::role(AriaRole::Heading, text::TELL_US_MORE).exact(true);
        if self.page.locator(form_heading).is_visible()? {
            Ok(WidgetState::FeedbackOpen)
        } else if self.page.get_by_text_exact(text::RATING_HEADING).is_visible()? {
            Ok(WidgetState::Open)
        } else {
            Ok(WidgetState::Closed)
        }
    }

    fn current_polarity(&mut self) -> ProbeResult<Option<Polarity>> {
        if self.page.get_by_text(text::LIKED_MOST).is_visible()? {
            Ok(Some(Polarity::Positive))
        } else if self.page.get_by_text(text::LIKED_LEAST).is_visible()? {
            Ok(Some(Polarity::Negative))
        } else {
            Ok(None)
        }
    }

    fn rating_prompt_shown(&mut self) -> ProbeResult<bool> {
        let mut prompt = RatingWidgetPage::new(&mut self.page);
        Ok(holds(prompt.verify_rating_heading())?
            && holds(prompt.verify_all_rating_buttons())?
            && holds(prompt.verify_satisfaction_labels())?)
    }

    fn form_questions_shown(&mut self, polarity: Polarity) -> ProbeResult<bool> {
        let mut form = self.form();
        Ok(holds(form.verify_feedback_form_questions(polarity))?
            && holds(form.verify_form_elements(polarity))?)
    }

    fn require(&mut self, op: &Operation, allowed: &[WidgetState]) -> ProbeResult<WidgetState> {
        let state = self.current_state()?;
        if allowed.contains(&state) {
            Ok(state)
        } else {
            Err(ProbeError::invalid_transition(op.to_string(), state))
        }
    }

    fn form(&mut self) -> TellUsMorePage<'_, D> {
        TellUsMorePage::new(&mut self.page).with_typing_delay(self.typing_delay)
    }

    fn require_area(&mut self, op: &Operation, tag: &str) -> ProbeResult<()> {
        let _ = self.require(op, &[WidgetState::FeedbackOpen])?;
        let polarity = self
            .current_polarity()?
            .ok_or_else(|| ProbeError::driver("feedback form shows no comment question"))?;
        if polarity.areas().contains(&tag) {
            Ok(())
        } else {
            Err(ProbeError::out_of_range(format!(
                "'{tag}' is not a contributing area for {polarity} ratings"
            )))
        }
    }

    fn submit_blocked_reasons(&mut self) -> ProbeResult<Vec<String>> {
        let observation = self.observe()?;
        let mut any_area_checked = false;
        for area in &observation.areas_offered {
            let checked = self
                .page
                .get_by_text_exact(area)
                .get_attribute("checked")?;
            any_area_checked |= checked.as_deref() == Some("true");
        }
        let mut reasons = Vec::new();
        if !any_area_checked {
            reasons.push("no contributing area selected".to_string());
        }
        if let Some(count) = observation.character_count_alert {
            reasons.push(format!(
                "comment has {count} characters (max {COMMENT_MAX_CHARS})"
            ));
        }
        if observation.email_valid == Some(false) {
            reasons.push("email is not valid".to_string());
        }
        Ok(reasons)
    }
}

impl<D: PageDriver> ScenarioTarget for PageTarget<D> {
    fn name(&self) -> &str {
        "page"
    }

    fn reset(&mut self) -> ProbeResult<()> {
        self.rating = None;
        let url = self.base_url.clone();
        BasePage::new(&mut self.page)
            .with_expected_title(self.expected_title.clone())
            .navigate(&url)
    }

    fn apply(&mut self, op: &Operation) -> ProbeResult<()> {
        match op {
            Operation::Open => {
                let _ = self.require(op, &[WidgetState::Closed])?;
                BasePage::new(&mut self.page).open_widget()
            }
            Operation::SelectRating(n) => {
                let rating = Rating::new(*n)?;
                let _ = self.require(op, &[WidgetState::Open])?;
                let mut prompt = RatingWidgetPage::new(&mut self.page);
                prompt.click_rating_button(rating.value())?;
                prompt.verify_tell_us_more_heading()?;
                self.rating = Some(rating);
                Ok(())
            }
            Operation::Close => {
                match self.require(op, &[WidgetState::Open, WidgetState::FeedbackOpen])? {
                    WidgetState::Open => RatingWidgetPage::new(&mut self.page).close()?,
                    _ => self.form().close()?,
                }
                self.rating = None;
                Ok(())
            }
            Operation::ToggleArea(tag) => {
                self.require_area(op, tag)?;
                self.form().toggle_area(tag)
            }
            Operation::ToggleInterest(tag) => {
                let _ = self.require(op, &[WidgetState::FeedbackOpen])?;
                let interest = Interest::from_label(tag)?;
                self.form().toggle_interest(interest.label())
            }
            Operation::SelectAllInterests => {
                let _ = self.require(op, &[WidgetState::FeedbackOpen])?;
                self.form().select_optional_interests()
            }
            Operation::SetComment(s) => {
                let _ = self.require(op, &[WidgetState::FeedbackOpen])?;
                self.form().fill_comment(s)
            }
            Operation::TypeComment(s) => {
                let _ = self.require(op, &[WidgetState::FeedbackOpen])?;
                self.form().type_comment(s)
            }
            Operation::SetEmail(s) => {
                let _ = self.require(op, &[WidgetState::FeedbackOpen])?;
                self.form().fill_email(s)
            }
            Operation::TypeEmail(s) => {
                let _ = self.require(op, &[WidgetState::FeedbackOpen])?;
                self.form().type_email(s)
            }
            Operation::ClearFields => {
                let _ = self.require(op, &[WidgetState::FeedbackOpen])?;
                self.form().clear_all_fields()
            }
            Operation::Submit => {
                let _ = self.require(op, &[WidgetState::FeedbackOpen])?;
                if !self.form().submit_enabled()? {
                    return Err(ProbeError::SubmitBlocked {
                        reasons: self.submit_blocked_reasons()?,
                    });
                }
                let mut form = self.form();
                form.submit()?;
                form.verify_thank_you()?;
                self.rating = None;
                Ok(())
            }
            Operation::Observe => Ok(()),
        }
    }

    fn observe(&mut self) -> ProbeResult<Observation> {
        let state = self.current_state()?;
        let acknowledged = self.page.get_by_text(text::THANK_YOU).is_visible()?;
        if state != WidgetState::FeedbackOpen {
            return Ok(Observation {
                state: Some(state),
                acknowledged,
                rating_prompt_shown: state == WidgetState::Open && self.rating_prompt_shown()?,
                ..Observation::default()
            });
        }

        let polarity = self.current_polarity()?;
        let rating_prompt_shown =
            !holds(RatingWidgetPage::new(&mut self.page).verify_rating_heading_hidden())?;
        let form_questions = match polarity {
            Some(p) if self.form_questions_shown(p)? => Some(p),
            _ => None,
        };
        let mut areas_offered = Vec::new();
        for area in polarity.map(Polarity::areas).into_iter().flatten() {
            if self.page.get_by_text_exact(area).is_visible()? {
                areas_offered.push((*area).to_string());
            }
        }

        let mut form = self.form();
        let character_count_alert = form.character_count()?;
        let email_alert = form.email_alert_visible()?;
        if email_alert {
            form.verify_email_validation()?;
        }
        let submit_enabled = form.submit_enabled()?;
        let comment = form.comment_value()?;
        let email = form.email_value()?;

        Ok(Observation {
            state: Some(state),
            rating: self.rating.map(Rating::value),
            polarity,
            submit_enabled: Some(submit_enabled),
            comment_valid: Some(character_count_alert.is_none()),
            email_valid: Some(!email_alert),
            character_count_alert,
            areas_offered,
            comment: Some(comment),
            email: Some(email),
            acknowledged,
            rating_prompt_shown,
            form_questions,
        })
    }

    fn diagnostic(&mut self, capture_screenshot: bool) -> TargetDiagnostic {
        let observation = self.observe().ok();
        let screenshot = if capture_screenshot {
            self.page
                .screenshot()
                .ok()
                .map(|shot| (shot.data, shot.mime_type))
        } else {
            None
        };
        TargetDiagnostic {
            snapshot: serde_json::json!({
                "url": self.page.url(),
                "observation": observation,
            }),
            screenshot,
            content: self.page.content().ok(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{PageFault, SimulatedPage};
    use crate::wait::WaitOptions;

    fn page_target() -> PageTarget<SimulatedPage> {
        let page = Page::new(SimulatedPage::new())
            .with_wait_options(WaitOptions::new().with_timeout(80).with_poll_interval(5))
            .with_navigation_timeout(200);
        let mut target = PageTarget::new(page, "https://docs.example.test/");
        target.reset().unwrap();
        target
    }

    fn run(target: &mut dyn ScenarioTarget, ops: &[Operation]) {
        for op in ops {
            target.apply(op).unwrap();
        }
    }

    fn to_form(rating: i64) -> Vec<Operation> {
        vec![Operation::Open, Operation::SelectRating(rating)]
    }

    mod model_target_tests {
        use super::*;

        #[test]
        fn test_observe_closed() {
            let mut target = ModelTarget::new();
            let obs = target.observe().unwrap();
            assert_eq!(obs.state, Some(WidgetState::Closed));
            assert_eq!(obs.submit_enabled, None);
        }

        #[test]
        fn test_type_appends() {
            let mut target = ModelTarget::new();
            run(&mut target, &to_form(2));
            run(
                &mut target,
                &[
                    Operation::TypeEmail("user@".into()),
                    Operation::TypeEmail("example.com".into()),
                ],
            );
            let obs = target.observe().unwrap();
            assert_eq!(obs.email.as_deref(), Some("user@example.com"));
            assert_eq!(obs.email_valid, Some(true));
        }

        #[test]
        fn test_reset() {
            let mut target = ModelTarget::new();
            run(&mut target, &to_form(5));
            target.reset().unwrap();
            assert_eq!(target.widget().state(), WidgetState::Closed);
        }

        #[test]
        fn test_diagnostic_has_snapshot() {
            let mut target = ModelTarget::new();
            run(&mut target, &to_form(1));
            let diag = target.diagnostic(true);
            assert_eq!(diag.snapshot["state"], "FeedbackOpen");
            assert!(diag.screenshot.is_none());
        }
    }

    mod page_target_tests {
        use super::*;

        #[test]
        fn test_state_inference() {
            let mut target = page_target();
            assert_eq!(target.observe().unwrap().state, Some(WidgetState::Closed));
            target.apply(&Operation::Open).unwrap();
            assert_eq!(target.observe().unwrap().state, Some(WidgetState::Open));
            target.apply(&Operation::SelectRating(5)).unwrap();
            let obs = target.observe().unwrap();
            assert_eq!(obs.state, Some(WidgetState::FeedbackOpen));
            assert_eq!(obs.rating, Some(5));
            assert_eq!(obs.polarity, Some(Polarity::Positive));
            assert_eq!(obs.areas_offered.len(), 6);
            assert!(obs.areas_offered.iter().any(|a| a == "Website is great"));
        }

        #[test]
        fn test_contract_errors_match_model() {
            let mut target = page_target();
            assert_eq!(
                target.apply(&Operation::Close).unwrap_err().kind(),
                ErrorKind::InvalidTransition
            );
            target.apply(&Operation::Open).unwrap();
            assert_eq!(
                target.apply(&Operation::SelectRating(7)).unwrap_err().kind(),
                ErrorKind::OutOfRange
            );
            target.apply(&Operation::SelectRating(3)).unwrap();
            assert_eq!(
                target
                    .apply(&Operation::ToggleArea("Website is great".into()))
                    .unwrap_err()
                    .kind(),
                ErrorKind::OutOfRange
            );
            assert_eq!(
                target.apply(&Operation::Submit).unwrap_err().kind(),
                ErrorKind::SubmitBlocked
            );
        }

        #[test]
        fn test_model_and_page_agree() {
            let ops = vec![
                Operation::Open,
                Operation::SelectRating(1),
                Operation::ToggleArea("Technical errors".into()),
                Operation::ToggleInterest("Mobile Applications".into()),
                Operation::TypeComment("x".repeat(260)),
                Operation::SetEmail("invalidEmail".into()),
            ];
            let mut model = ModelTarget::new();
            let mut page = page_target();
            run(&mut model, &ops);
            run(&mut page, &ops);
            assert_eq!(model.observe().unwrap(), page.observe().unwrap());

            model.apply(&Operation::ClearFields).unwrap();
            page.apply(&Operation::ClearFields).unwrap();
            model.apply(&Operation::Submit).unwrap();
            page.apply(&Operation::Submit).unwrap();
            assert_eq!(model.observe().unwrap(), page.observe().unwrap());
        }

        #[test]
        fn test_display_checks_observed() {
            let mut target = page_target();
            target.apply(&Operation::Open).unwrap();
            let obs = target.observe().unwrap();
            assert!(obs.rating_prompt_shown);
            assert_eq!(obs.form_questions, None);

            target.apply(&Operation::SelectRating(2)).unwrap();
            let obs = target.observe().unwrap();
            assert!(!obs.rating_prompt_shown);
            assert_eq!(obs.form_questions, Some(Polarity::Negative));
        }

        #[test]
        fn test_missing_end_label_hides_prompt() {
            let page = Page::new(
                SimulatedPage::new().with_fault(PageFault::HideElement(text::VERY_SATISFIED.into())),
            )
            .with_wait_options(WaitOptions::new().with_timeout(40).with_poll_interval(5))
            .with_navigation_timeout(200);
            let mut target = PageTarget::new(page, "https://docs.example.test/");
            target.reset().unwrap();
            target.apply(&Operation::Open).unwrap();
            let obs = target.observe().unwrap();
            assert_eq!(obs.state, Some(WidgetState::Open));
            assert!(!obs.rating_prompt_shown);
        }

        #[test]
        fn test_select_all_interests_matches_model() {
            let mut ops = to_form(6);
            ops.push(Operation::ToggleInterest("Mobile Applications".into()));
            ops.push(Operation::SelectAllInterests);
            let mut model = ModelTarget::new();
            let mut page = page_target();
            run(&mut model, &ops);
            run(&mut page, &ops);
            assert_eq!(model.widget().form().unwrap().interests().len(), Interest::ALL.len());
            assert_eq!(model.observe().unwrap(), page.observe().unwrap());
            assert_eq!(
                ModelTarget::new().apply(&Operation::SelectAllInterests).unwrap_err().kind(),
                ErrorKind::InvalidTransition
            );
        }

        #[test]
        fn test_diagnostic_captures_page() {
            let mut target = page_target();
            target.apply(&Operation::Open).unwrap();
            let diag = target.diagnostic(true);
            assert!(diag.screenshot.is_some());
            assert!(diag.content.unwrap().contains("data-value"));
            assert_eq!(diag.snapshot["observation"]["state"], "Open");
        }
    }
}
