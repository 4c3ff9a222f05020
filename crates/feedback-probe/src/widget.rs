//! Rating widget model.
//!
//! Pure state and validation logic for the "Help us improve" widget,
//! independent of any rendering technology.
//!
//! ```text
//! Closed --open()--> Open
//! Open --select_rating(n), 1<=n<=6--> FeedbackOpen
//! Open --close()--> Closed
//! FeedbackOpen --close()--> Closed
//! FeedbackOpen --submit() [submit_enabled]--> Closed (via transient Submitted)
//! ```
//!
//! The feedback form lives inside the `FeedbackOpen` phase, so a selected
//! rating exists exactly when the widget is in that state.

use crate::result::{ProbeError, ProbeResult};
use crate::validation::FormValidation;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

/// Fixed UI strings rendered by the widget
pub mod text {
    /// Ribbon button that opens the widget
    pub const OPEN_BUTTON: &str = "Help us improve popup";
    /// Close button of the rating prompt
    pub const CLOSE_RATING_BUTTON: &str = "Close rating popup";
    /// Close button of the feedback form
    pub const CLOSE_FORM_BUTTON: &str = "Close";
    /// Rating prompt heading
    pub const RATING_HEADING: &str = "Rate your experience with this website";
    /// Low end of the scale
    pub const NOT_SATISFIED: &str = "NOT SATISFIED";
    /// High end of the scale
    pub const VERY_SATISFIED: &str = "VERY SATISFIED";
    /// Feedback form heading
    pub const TELL_US_MORE: &str = "Tell us more";
    /// Required question
    pub const AREAS_QUESTION: &str = "Which areas contributed to your rating today?";
    /// Hint under the required question
    pub const SELECT_ALL: &str = "Select all that apply";
    /// Optional interests question
    pub const INTERESTS_QUESTION: &str = "Which are you interested in?";
    /// Comment question for negative ratings
    pub const LIKED_LEAST: &str = "What did you like least?";
    /// Comment question for positive ratings
    pub const LIKED_MOST: &str = "What did you like most?";
    /// Email question
    pub const EMAIL_QUESTION: &str = "Your email";
    /// Comment textarea placeholder
    pub const COMMENT_PLACEHOLDER: &str = "Type your reply here";
    /// Email input placeholder
    pub const EMAIL_PLACEHOLDER: &str = "Type your email here";
    /// Submit button label
    pub const SUBMIT: &str = "SUBMIT";
    /// Acknowledgment after a successful submission
    pub const THANK_YOU: &str = "Thank you for your feedback!";
    /// Page title of the documentation site
    pub const PAGE_TITLE: &str = "WOGAA Documentation";

    /// Accessible name of the rating button for `n`
    #[must_use]
    pub fn rate_button(n: u8) -> String {
        format!("Rate {n} of 6")
    }
}

/// Contributing areas offered for ratings 1-4
pub const NEGATIVE_AREAS: [&str; 6] = [
    "Technical errors",
    "Couldn't find content",
    "Difficult to navigate",
    "Website loaded slowly",
    "Content not clear",
    "Others",
];

/// Contributing areas offered for ratings 5-6
pub const POSITIVE_AREAS: [&str; 6] = [
    "Website is great",
    "Website loaded fast",
    "Easy to navigate",
    "Easy to find content",
    "Content was clear",
    "Others",
];

/// Lowest rating
pub const MIN_RATING: u8 = 1;

/// Highest rating
pub const MAX_RATING: u8 = 6;

/// Top-level widget state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidgetState {
    /// Widget collapsed to the ribbon button
    Closed,
    /// Rating prompt visible
    Open,
    /// Feedback form visible for a selected rating
    FeedbackOpen,
}

impl WidgetState {
    /// All states
    pub const ALL: [Self; 3] = [Self::Closed, Self::Open, Self::FeedbackOpen];
}

impl fmt::Display for WidgetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "Closed",
            Self::Open => "Open",
            Self::FeedbackOpen => "FeedbackOpen",
        };
        f.write_str(name)
    }
}

/// A rating in `[1, 6]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Validate a raw rating
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `n` is outside `[1, 6]`
    pub fn new(n: i64) -> ProbeResult<Self> {
        if (i64::from(MIN_RATING)..=i64::from(MAX_RATING)).contains(&n) {
            Ok(Self(n as u8))
        } else {
            Err(ProbeError::out_of_range(format!(
                "rating {n} is outside [{MIN_RATING},{MAX_RATING}]"
            )))
        }
    }

    /// Raw value
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Polarity derived from this rating
    #[must_use]
    pub const fn polarity(self) -> Polarity {
        if self.0 <= 4 {
            Polarity::Negative
        } else {
            Polarity::Positive
        }
    }

    /// All valid ratings, ascending
    pub fn all() -> impl Iterator<Item = Self> {
        (MIN_RATING..=MAX_RATING).map(Self)
    }
}

impl TryFrom<u8> for Rating {
    type Error = ProbeError;

    fn try_from(value: u8) -> ProbeResult<Self> {
        Self::new(i64::from(value))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sentiment bucket of a rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    /// Ratings 1-4
    Negative,
    /// Ratings 5-6
    Positive,
}

impl Polarity {
    /// Contributing-area vocabulary for this polarity
    #[must_use]
    pub const fn areas(self) -> &'static [&'static str; 6] {
        match self {
            Self::Negative => &NEGATIVE_AREAS,
            Self::Positive => &POSITIVE_AREAS,
        }
    }

    /// Comment question shown for this polarity
    #[must_use]
    pub const fn comment_question(self) -> &'static str {
        match self {
            Self::Negative => text::LIKED_LEAST,
            Self::Positive => text::LIKED_MOST,
        }
    }

    /// Ratings that map to this polarity
    #[must_use]
    pub fn ratings(self) -> Vec<Rating> {
        Rating::all().filter(|r| r.polarity() == self).collect()
    }

    fn resolve_area(self, tag: &str) -> Option<&'static str> {
        self.areas().iter().copied().find(|area| *area == tag)
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => f.write_str("Negative"),
            Self::Positive => f.write_str("Positive"),
        }
    }
}

/// Optional "Which are you interested in?" selections
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Interest {
    /// Informational Services
    InformationalServices,
    /// Transactional Services
    TransactionalServices,
    /// Mobile Applications
    MobileApplications,
}

impl Interest {
    /// All interests in display order
    pub const ALL: [Self; 3] = [
        Self::InformationalServices,
        Self::TransactionalServices,
        Self::MobileApplications,
    ];

    /// Checkbox label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InformationalServices => "Informational Services",
            Self::TransactionalServices => "Transactional Services",
            Self::MobileApplications => "Mobile Applications",
        }
    }

    /// Look up an interest by its label
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for labels outside the interest vocabulary
    pub fn from_label(label: &str) -> ProbeResult<Self> {
        Self::ALL
            .into_iter()
            .find(|i| i.label() == label)
            .ok_or_else(|| ProbeError::out_of_range(format!("unknown interest '{label}'")))
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Feedback form attached to a selected rating
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackForm {
    rating: Rating,
    areas: BTreeSet<&'static str>,
    interests: BTreeSet<Interest>,
    comment: String,
    email: String,
}

impl FeedbackForm {
    fn new(rating: Rating) -> Self {
        Self {
            rating,
            areas: BTreeSet::new(),
            interests: BTreeSet::new(),
            comment: String::new(),
            email: String::new(),
        }
    }

    /// Rating the form was opened for
    #[must_use]
    pub const fn rating(&self) -> Rating {
        self.rating
    }

    /// Polarity derived from the rating
    #[must_use]
    pub const fn polarity(&self) -> Polarity {
        self.rating.polarity()
    }

    /// Selected contributing areas, in vocabulary order
    #[must_use]
    pub fn contributing_areas(&self) -> Vec<&'static str> {
        self.polarity()
            .areas()
            .iter()
            .copied()
            .filter(|a| self.areas.contains(a))
            .collect()
    }

    /// Selected interests
    #[must_use]
    pub fn interests(&self) -> Vec<Interest> {
        self.interests.iter().copied().collect()
    }

    /// Comment text, verbatim
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Email text, verbatim
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Evaluate every validation rule
    #[must_use]
    pub fn validation(&self) -> FormValidation {
        FormValidation::evaluate(!self.areas.is_empty(), &self.comment, &self.email)
    }

    /// Whether SUBMIT is enabled
    #[must_use]
    pub fn submit_enabled(&self) -> bool {
        self.validation().submit_enabled()
    }

    fn toggle_area(&mut self, tag: &str) -> ProbeResult<bool> {
        let polarity = self.polarity();
        let area = polarity.resolve_area(tag).ok_or_else(|| {
            ProbeError::out_of_range(format!(
                "'{tag}' is not a contributing area for {polarity} ratings"
            ))
        })?;
        if self.areas.remove(area) {
            Ok(false)
        } else {
            self.areas.insert(area);
            Ok(true)
        }
    }

    fn toggle_interest(&mut self, interest: Interest) -> bool {
        if self.interests.remove(&interest) {
            false
        } else {
            self.interests.insert(interest);
            true
        }
    }

    fn submission(&self) -> FeedbackSubmission {
        FeedbackSubmission {
            rating: self.rating,
            polarity: self.polarity(),
            contributing_areas: self
                .contributing_areas()
                .into_iter()
                .map(str::to_string)
                .collect(),
            interests: self.interests(),
            comment: self.comment.clone(),
            email: self.email.clone(),
        }
    }
}

/// Payload captured on a successful submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    /// Selected rating
    pub rating: Rating,
    /// Derived polarity
    pub polarity: Polarity,
    /// Selected contributing areas
    pub contributing_areas: Vec<String>,
    /// Selected interests
    pub interests: Vec<Interest>,
    /// Comment text
    pub comment: String,
    /// Email text
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Closed,
    Open,
    FeedbackOpen(FeedbackForm),
}

/// The rating widget state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingWidget {
    phase: Phase,
    acknowledgment: Option<&'static str>,
    last_submission: Option<FeedbackSubmission>,
}

impl Default for RatingWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl RatingWidget {
    /// Create a closed widget
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: Phase::Closed,
            acknowledgment: None,
            last_submission: None,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> WidgetState {
        match self.phase {
            Phase::Closed => WidgetState::Closed,
            Phase::Open => WidgetState::Open,
            Phase::FeedbackOpen(_) => WidgetState::FeedbackOpen,
        }
    }

    /// Selected rating, defined only while the feedback form is open
    #[must_use]
    pub const fn selected_rating(&self) -> Option<Rating> {
        match &self.phase {
            Phase::FeedbackOpen(form) => Some(form.rating),
            Phase::Closed | Phase::Open => None,
        }
    }

    /// The open feedback form, if any
    #[must_use]
    pub const fn form(&self) -> Option<&FeedbackForm> {
        match &self.phase {
            Phase::FeedbackOpen(form) => Some(form),
            Phase::Closed | Phase::Open => None,
        }
    }

    /// Polarity of the open form
    #[must_use]
    pub fn polarity(&self) -> Option<Polarity> {
        self.form().map(FeedbackForm::polarity)
    }

    /// Whether SUBMIT is enabled (false when no form is open)
    #[must_use]
    pub fn submit_enabled(&self) -> bool {
        self.form().is_some_and(FeedbackForm::submit_enabled)
    }

    /// Thank-you text from the last successful submission
    #[must_use]
    pub const fn acknowledgment(&self) -> Option<&'static str> {
        self.acknowledgment
    }

    /// Payload of the last successful submission
    #[must_use]
    pub const fn last_submission(&self) -> Option<&FeedbackSubmission> {
        self.last_submission.as_ref()
    }

    /// Open the rating prompt
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the widget is closed
    pub fn open(&mut self) -> ProbeResult<()> {
        match self.phase {
            Phase::Closed => {
                self.phase = Phase::Open;
                self.acknowledgment = None;
                Ok(())
            }
            _ => Err(ProbeError::invalid_transition("open", self.state())),
        }
    }

    /// Choose a rating and show the feedback form
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `n` is outside `[1, 6]`, `InvalidTransition` unless open
    pub fn select_rating(&mut self, n: i64) -> ProbeResult<Rating> {
        let rating = Rating::new(n)?;
        match self.phase {
            Phase::Open => {
                self.phase = Phase::FeedbackOpen(FeedbackForm::new(rating));
                Ok(rating)
            }
            _ => Err(ProbeError::invalid_transition(
                format!("select rating {rating}"),
                self.state(),
            )),
        }
    }

    /// Close the widget, discarding any form
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if already closed
    pub fn close(&mut self) -> ProbeResult<()> {
        match self.phase {
            Phase::Open | Phase::FeedbackOpen(_) => {
                self.phase = Phase::Closed;
                Ok(())
            }
            Phase::Closed => Err(ProbeError::invalid_transition("close", self.state())),
        }
    }

    /// Toggle a contributing area; returns whether it is now selected
    ///
    /// # Errors
    ///
    /// `InvalidTransition` without an open form, `OutOfRange` for a tag outside
    /// the polarity's vocabulary
    pub fn toggle_area(&mut self, tag: &str) -> ProbeResult<bool> {
        self.form_mut("toggle area")?.toggle_area(tag)
    }

    /// Toggle an interest by label; returns whether it is now selected
    ///
    /// # Errors
    ///
    /// `InvalidTransition` without an open form, `OutOfRange` for an unknown label
    pub fn toggle_interest(&mut self, label: &str) -> ProbeResult<bool> {
        let form = self.form_mut("toggle interest")?;
        let interest = Interest::from_label(label)?;
        Ok(form.toggle_interest(interest))
    }

    /// Store the comment verbatim
    ///
    /// # Errors
    ///
    /// `InvalidTransition` without an open form
    pub fn set_comment(&mut self, text: impl Into<String>) -> ProbeResult<()> {
        self.form_mut("set comment")?.comment = text.into();
        Ok(())
    }

    /// Store the email verbatim
    ///
    /// # Errors
    ///
    /// `InvalidTransition` without an open form
    pub fn set_email(&mut self, text: impl Into<String>) -> ProbeResult<()> {
        self.form_mut("set email")?.email = text.into();
        Ok(())
    }

    /// Empty the comment and email fields
    ///
    /// # Errors
    ///
    /// `InvalidTransition` without an open form
    pub fn clear_fields(&mut self) -> ProbeResult<()> {
        let form = self.form_mut("clear fields")?;
        form.comment.clear();
        form.email.clear();
        Ok(())
    }

    /// Submit the form; the widget passes through Submitted and ends Closed
    ///
    /// # Errors
    ///
    /// `InvalidTransition` without an open form, `SubmitBlocked` when any
    /// validation rule fails
    pub fn submit(&mut self) -> ProbeResult<FeedbackSubmission> {
        let form = match &self.phase {
            Phase::FeedbackOpen(form) => form,
            _ => return Err(ProbeError::invalid_transition("submit", self.state())),
        };
        let validation = form.validation();
        if !validation.submit_enabled() {
            return Err(ProbeError::SubmitBlocked {
                reasons: validation.failures(),
            });
        }
        let submission = form.submission();
        self.acknowledgment = Some(text::THANK_YOU);
        self.last_submission = Some(submission.clone());
        self.phase = Phase::Closed;
        Ok(submission)
    }

    /// Serializable view of the model for diagnostics
    #[must_use]
    pub fn snapshot(&self) -> WidgetSnapshot {
        let form = self.form();
        WidgetSnapshot {
            state: self.state(),
            rating: self.selected_rating(),
            polarity: self.polarity(),
            contributing_areas: form
                .map(|f| {
                    f.contributing_areas()
                        .into_iter()
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            interests: form.map(FeedbackForm::interests).unwrap_or_default(),
            comment_chars: form.map_or(0, |f| f.validation().comment_chars),
            email: form.map(|f| f.email().to_string()).unwrap_or_default(),
            validation: form.map(FeedbackForm::validation),
            acknowledgment: self.acknowledgment.map(str::to_string),
        }
    }

    fn form_mut(&mut self, op: &str) -> ProbeResult<&mut FeedbackForm> {
        let state = self.state();
        match &mut self.phase {
            Phase::FeedbackOpen(form) => Ok(form),
            _ => Err(ProbeError::invalid_transition(op, state)),
        }
    }
}

/// Serializable view of a [`RatingWidget`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetSnapshot {
    /// Widget state
    pub state: WidgetState,
    /// Selected rating
    pub rating: Option<Rating>,
    /// Polarity of the open form
    pub polarity: Option<Polarity>,
    /// Selected areas
    pub contributing_areas: Vec<String>,
    /// Selected interests
    pub interests: Vec<Interest>,
    /// Comment length in characters
    pub comment_chars: usize,
    /// Email text
    pub email: String,
    /// Validation rules, when a form is open
    pub validation: Option<FormValidation>,
    /// Acknowledgment text after a submission
    pub acknowledgment: Option<String>,
}

// =============================================================================
// TRANSITION TABLE
// =============================================================================

/// Events that move the widget between states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetEvent {
    /// External open trigger
    Open,
    /// Rating chosen
    SelectRating,
    /// External close trigger
    Close,
    /// Successful submit
    Submit,
}

/// Consolidated transition table
pub const TRANSITIONS: [(WidgetState, WidgetEvent, WidgetState); 5] = [
    (WidgetState::Closed, WidgetEvent::Open, WidgetState::Open),
    (
        WidgetState::Open,
        WidgetEvent::SelectRating,
        WidgetState::FeedbackOpen,
    ),
    (WidgetState::Open, WidgetEvent::Close, WidgetState::Closed),
    (
        WidgetState::FeedbackOpen,
        WidgetEvent::Close,
        WidgetState::Closed,
    ),
    (
        WidgetState::FeedbackOpen,
        WidgetEvent::Submit,
        WidgetState::Closed,
    ),
];

/// Reachability facts about [`TRANSITIONS`]
#[derive(Debug, Clone, Default)]
pub struct MachineReport {
    /// States reachable from `Closed`
    pub reachable: HashSet<WidgetState>,
    /// States with no outgoing transition
    pub dead_ends: Vec<WidgetState>,
    /// States from which `Closed` cannot be reached
    pub cannot_return: Vec<WidgetState>,
    /// `(state, event)` pairs with more than one target
    pub non_deterministic: Vec<(WidgetState, WidgetEvent)>,
}

impl MachineReport {
    /// Whether the machine has no defects
    #[must_use]
    pub fn is_sound(&self) -> bool {
        self.dead_ends.is_empty()
            && self.cannot_return.is_empty()
            && self.non_deterministic.is_empty()
            && self.reachable.len() == WidgetState::ALL.len()
    }
}

fn reachable_from(start: WidgetState) -> HashSet<WidgetState> {
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        for (from, _, to) in TRANSITIONS {
            if from == current && seen.insert(to) {
                queue.push_back(to);
            }
        }
    }
    seen
}

/// Analyse the transition table
#[must_use]
pub fn analyze_machine() -> MachineReport {
    let mut targets: HashMap<(WidgetState, WidgetEvent), usize> = HashMap::new();
    for (from, event, _) in TRANSITIONS {
        *targets.entry((from, event)).or_default() += 1;
    }

    MachineReport {
        reachable: reachable_from(WidgetState::Closed),
        dead_ends: WidgetState::ALL
            .into_iter()
            .filter(|s| !TRANSITIONS.iter().any(|(from, _, _)| from == s))
            .collect(),
        cannot_return: WidgetState::ALL
            .into_iter()
            .filter(|s| !reachable_from(*s).contains(&WidgetState::Closed))
            .collect(),
        non_deterministic: targets
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(key, _)| key)
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::result::ErrorKind;
    use proptest::prelude::*;

    fn feedback_open(rating: i64) -> RatingWidget {
        let mut widget = RatingWidget::new();
        widget.open().unwrap();
        widget.select_rating(rating).unwrap();
        widget
    }

    fn invariant_holds(widget: &RatingWidget) -> bool {
        widget.selected_rating().is_some() == (widget.state() == WidgetState::FeedbackOpen)
    }

    mod transition_tests {
        use super::*;

        #[test]
        fn test_new_widget_is_closed() {
            let widget = RatingWidget::new();
            assert_eq!(widget.state(), WidgetState::Closed);
            assert!(widget.selected_rating().is_none());
            assert!(widget.form().is_none());
        }

        #[test]
        fn test_open_twice_is_invalid() {
            let mut widget = RatingWidget::new();
            widget.open().unwrap();
            let err = widget.open().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition);
            assert_eq!(widget.state(), WidgetState::Open);
        }

        #[test]
        fn test_close_when_closed_is_invalid() {
            let mut widget = RatingWidget::new();
            assert_eq!(
                widget.close().unwrap_err().kind(),
                ErrorKind::InvalidTransition
            );
        }

        #[test]
        fn test_select_rating_requires_open() {
            let mut widget = RatingWidget::new();
            let err = widget.select_rating(3).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition);
            assert_eq!(widget.state(), WidgetState::Closed);
        }

        #[test]
        fn test_select_rating_twice_is_invalid() {
            let mut widget = feedback_open(2);
            assert_eq!(
                widget.select_rating(5).unwrap_err().kind(),
                ErrorKind::InvalidTransition
            );
            assert_eq!(widget.selected_rating().unwrap().value(), 2);
        }

        #[test]
        fn test_close_discards_form() {
            let mut widget = feedback_open(1);
            widget.toggle_area("Technical errors").unwrap();
            widget.close().unwrap();
            assert_eq!(widget.state(), WidgetState::Closed);
            assert!(widget.form().is_none());

            widget.open().unwrap();
            widget.select_rating(1).unwrap();
            assert!(widget.form().unwrap().contributing_areas().is_empty());
        }

        #[test]
        fn test_form_ops_require_feedback_open() {
            let mut widget = RatingWidget::new();
            widget.open().unwrap();
            assert!(widget.toggle_area("Others").is_err());
            assert!(widget.toggle_interest("Mobile Applications").is_err());
            assert!(widget.set_comment("x").is_err());
            assert!(widget.set_email("x").is_err());
            assert!(widget.clear_fields().is_err());
            assert_eq!(
                widget.submit().unwrap_err().kind(),
                ErrorKind::InvalidTransition
            );
        }
    }

    mod rating_tests {
        use super::*;

        #[test]
        fn test_every_valid_rating_opens_form() {
            for n in 1..=6 {
                let widget = feedback_open(n);
                assert_eq!(widget.state(), WidgetState::FeedbackOpen);
                assert_eq!(i64::from(widget.selected_rating().unwrap().value()), n);
            }
        }

        #[test]
        fn test_polarity_split() {
            for n in 1..=4 {
                assert_eq!(feedback_open(n).polarity(), Some(Polarity::Negative));
            }
            for n in 5..=6 {
                assert_eq!(feedback_open(n).polarity(), Some(Polarity::Positive));
            }
        }

        #[test]
        fn test_polarity_ratings() {
            assert_eq!(Polarity::Negative.ratings().len(), 4);
            assert_eq!(Polarity::Positive.ratings().len(), 2);
        }

        #[test]
        fn test_rating_serde_rejects_out_of_range() {
            assert!(serde_json::from_str::<Rating>("7").is_err());
            assert_eq!(serde_json::from_str::<Rating>("3").unwrap().value(), 3);
        }
    }

    mod form_tests {
        use super::*;

        #[test]
        fn test_area_vocabulary_follows_polarity() {
            let mut negative = feedback_open(3);
            assert!(negative.toggle_area("Technical errors").unwrap());
            assert_eq!(
                negative.toggle_area("Website is great").unwrap_err().kind(),
                ErrorKind::OutOfRange
            );

            let mut positive = feedback_open(5);
            assert!(positive.toggle_area("Website is great").unwrap());
            assert_eq!(
                positive.toggle_area("Technical errors").unwrap_err().kind(),
                ErrorKind::OutOfRange
            );
        }

        #[test]
        fn test_others_is_shared() {
            assert!(feedback_open(1).toggle_area("Others").unwrap());
            assert!(feedback_open(6).toggle_area("Others").unwrap());
        }

        #[test]
        fn test_toggle_area_twice_deselects() {
            let mut widget = feedback_open(1);
            assert!(widget.toggle_area("Others").unwrap());
            assert!(widget.submit_enabled());
            assert!(!widget.toggle_area("Others").unwrap());
            assert!(!widget.submit_enabled());
        }

        #[test]
        fn test_unknown_interest() {
            let mut widget = feedback_open(1);
            assert_eq!(
                widget.toggle_interest("Gaming").unwrap_err().kind(),
                ErrorKind::OutOfRange
            );
        }

        #[test]
        fn test_only_interests_never_enable_submit() {
            let mut widget = feedback_open(4);
            for interest in Interest::ALL {
                widget.toggle_interest(interest.label()).unwrap();
                assert!(!widget.submit_enabled());
            }
            assert_eq!(
                widget.submit().unwrap_err().kind(),
                ErrorKind::SubmitBlocked
            );
        }

        #[test]
        fn test_comment_boundary() {
            let mut widget = feedback_open(1);
            widget.toggle_area("Others").unwrap();
            widget.set_comment("a".repeat(255)).unwrap();
            assert!(widget.submit_enabled());
            widget.set_comment("a".repeat(256)).unwrap();
            assert!(!widget.submit_enabled());
            assert_eq!(widget.form().unwrap().comment().len(), 256);
        }

        #[test]
        fn test_email_validation() {
            let mut widget = feedback_open(6);
            widget.toggle_area("Website is great").unwrap();
            widget.set_email("invalidEmail").unwrap();
            assert!(!widget.form().unwrap().validation().email_valid);
            widget.set_email("test@example.com").unwrap();
            assert!(widget.form().unwrap().validation().email_valid);
            assert!(widget.submit_enabled());
        }

        #[test]
        fn test_clear_fields() {
            let mut widget = feedback_open(2);
            widget.set_comment("text").unwrap();
            widget.set_email("invalidEmail").unwrap();
            widget.clear_fields().unwrap();
            let form = widget.form().unwrap();
            assert!(form.comment().is_empty());
            assert!(form.email().is_empty());
        }
    }

    mod submit_tests {
        use super::*;

        #[test]
        fn test_submit_closes_and_acknowledges() {
            let mut widget = feedback_open(1);
            widget.toggle_area("Technical errors").unwrap();
            widget.toggle_area("Difficult to navigate").unwrap();
            widget
                .set_comment("The website needs improvement in navigation and loading speed.")
                .unwrap();
            widget.set_email("test@example.com").unwrap();
            assert!(widget.submit_enabled());

            let submission = widget.submit().unwrap();
            assert_eq!(widget.state(), WidgetState::Closed);
            assert!(widget.selected_rating().is_none());
            assert_eq!(widget.acknowledgment(), Some(text::THANK_YOU));
            assert_eq!(
                submission.contributing_areas,
                vec!["Technical errors", "Difficult to navigate"]
            );
            assert_eq!(widget.last_submission(), Some(&submission));
        }

        #[test]
        fn test_blocked_submit_keeps_form() {
            let mut widget = feedback_open(6);
            widget.toggle_area("Website is great").unwrap();
            for interest in Interest::ALL {
                widget.toggle_interest(interest.label()).unwrap();
            }
            widget.set_comment("a".repeat(256)).unwrap();
            widget.set_email("invalidEmail").unwrap();

            let err = widget.submit().unwrap_err();
            match err {
                ProbeError::SubmitBlocked { reasons } => assert_eq!(reasons.len(), 2),
                other => panic!("unexpected error {other}"),
            }
            assert_eq!(widget.state(), WidgetState::FeedbackOpen);
            assert!(widget.acknowledgment().is_none());
        }

        #[test]
        fn test_reopen_clears_acknowledgment() {
            let mut widget = feedback_open(5);
            widget.toggle_area("Others").unwrap();
            widget.submit().unwrap();
            widget.open().unwrap();
            assert!(widget.acknowledgment().is_none());
            assert!(widget.last_submission().is_some());
        }
    }

    mod machine_tests {
        use super::*;

        #[test]
        fn test_machine_is_sound() {
            let report = analyze_machine();
            assert!(report.is_sound(), "{report:?}");
        }

        #[test]
        fn test_snapshot_reflects_form() {
            let mut widget = feedback_open(1);
            widget.toggle_area("Others").unwrap();
            widget.set_comment("é".repeat(10)).unwrap();
            let snap = widget.snapshot();
            assert_eq!(snap.state, WidgetState::FeedbackOpen);
            assert_eq!(snap.comment_chars, 10);
            assert_eq!(snap.contributing_areas, vec!["Others"]);
            assert!(snap.validation.unwrap().submit_enabled());
        }
    }

    proptest! {
        #[test]
        fn prop_out_of_range_rating_leaves_state(n in prop_oneof![i64::MIN..1i64, 7i64..i64::MAX]) {
            let mut widget = RatingWidget::new();
            widget.open().unwrap();
            let err = widget.select_rating(n).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::OutOfRange);
            prop_assert_eq!(widget.state(), WidgetState::Open);
            prop_assert!(widget.selected_rating().is_none());
        }

        #[test]
        fn prop_open_close_round_trip(cycles in 1usize..20) {
            let mut widget = RatingWidget::new();
            for _ in 0..cycles {
                widget.open().unwrap();
                prop_assert!(invariant_holds(&widget));
                widget.close().unwrap();
                prop_assert!(invariant_holds(&widget));
                prop_assert_eq!(widget.state(), WidgetState::Closed);
                prop_assert!(widget.form().is_none());
            }
        }

        #[test]
        fn prop_interests_alone_never_enable_submit(mask in 0u8..8, rating in 1i64..=6) {
            let mut widget = feedback_open(rating);
            for (i, interest) in Interest::ALL.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    widget.toggle_interest(interest.label()).unwrap();
                }
            }
            prop_assert!(!widget.submit_enabled());
        }

        #[test]
        fn prop_invariant_under_random_ops(ops in proptest::collection::vec(0u8..6, 0..40)) {
            let mut widget = RatingWidget::new();
            for op in ops {
                let _ = match op {
                    0 => widget.open(),
                    1 => widget.select_rating(1).map(|_| ()),
                    2 => widget.select_rating(6).map(|_| ()),
                    3 => widget.close(),
                    4 => widget.toggle_area("Others").map(|_| ()),
                    _ => widget.submit().map(|_| ()),
                };
                prop_assert!(invariant_holds(&widget));
            }
        }
    }
}
