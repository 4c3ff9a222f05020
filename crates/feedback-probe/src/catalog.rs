//! Built-in scenario catalog.
//!
//! Three suites mirror the feature areas of the widget: the general
//! collection flow, negative ratings (1-4) and positive ratings (5-6). Every
//! rating gets its own scenarios; nothing is shared between them.

use crate::result::ErrorKind;
use crate::scenario::{Expected, Scenario, Severity};
use crate::target::Operation;
use crate::widget::{Interest, Polarity, WidgetState};

/// Report epic for every catalog scenario
pub const EPIC: &str = "WOGAA Sentiments Widget";

/// Feature label of the general collection flow
pub const FEATURE_COLLECTION: &str = "Feedback UI Collection Flow";

/// Feature label of the negative suite
pub const FEATURE_NEGATIVE: &str = "Negative Ratings Feedback Collection";

/// Feature label of the positive suite
pub const FEATURE_POSITIVE: &str = "Positive Ratings Feedback Collection";

/// Sample input used by the scenarios
pub mod samples {
    /// Negative-flow comment
    pub const NEGATIVE_COMMENT: &str =
        "The website needs improvement in navigation and loading speed.";
    /// Negative-flow email
    pub const NEGATIVE_EMAIL: &str = "test@example.com";
    /// Positive-flow comment
    pub const POSITIVE_COMMENT: &str = "Great user experience and fast loading times.";
    /// Positive-flow email
    pub const POSITIVE_EMAIL: &str = "positive.feedback@test.com";
    /// A comment that exceeds the length limit when typed
    pub const LONG_FEEDBACK_TEXT: &str = "Lorem ipsum dolor sit amet, consectetuer adipiscing elit. Aenean commodo ligula eget dolor. Aenean massa. Cum sociis natoque penatibus et magnis dis parturient montes, nascetur ridiculus mus. Donec quam felis, ultricies nec, pellentesque eu, pretium quis, sem.";
    /// Email without an `@`
    pub const INVALID_EMAIL: &str = "invalidEmail";
    /// A comment under the limit
    pub const VALID_COMMENT: &str = "This is a valid feedback message that is under 255 characters.";
    /// A valid email
    pub const VALID_EMAIL: &str = "valid.email@example.com";
    /// Areas picked by the negative interaction
    pub const NEGATIVE_AREAS: [&str; 2] = ["Technical errors", "Difficult to navigate"];
    /// Areas picked by the positive interaction
    pub const POSITIVE_AREAS: [&str; 3] =
        ["Website is great", "Website loaded fast", "Content was clear"];
}

/// Every catalog scenario, in run order
#[must_use]
pub fn all() -> Vec<Scenario> {
    let mut scenarios = collection_flow();
    scenarios.extend(polarity_suite(Polarity::Negative));
    scenarios.extend(polarity_suite(Polarity::Positive));
    scenarios.extend(end_to_end());
    scenarios
}

/// Look up a scenario by exact name
#[must_use]
pub fn find(name: &str) -> Option<Scenario> {
    all().into_iter().find(|s| s.name == name)
}

fn base(name: &str, feature: &str, story: &str) -> Scenario {
    Scenario::new(name)
        .with_epic(EPIC)
        .with_feature(feature)
        .with_story(story)
}

fn tagged<'a>(fixed: &[&'a str], extra: &[&'a str]) -> Vec<&'a str> {
    [fixed, extra].concat()
}

fn open_and_rate(scenario: Scenario, rating: u8) -> Scenario {
    scenario
        .step(Operation::Open, Expected::State(WidgetState::Open))
        .step(
            Operation::SelectRating(i64::from(rating)),
            Expected::All(vec![
                Expected::State(WidgetState::FeedbackOpen),
                Expected::Rating(Some(rating)),
            ]),
        )
}

fn interact(scenario: Scenario, polarity: Polarity) -> Scenario {
    match polarity {
        Polarity::Negative => samples::NEGATIVE_AREAS
            .iter()
            .fold(scenario, |s, area| s.act(Operation::ToggleArea((*area).to_string())))
            .act(Operation::ToggleInterest(Interest::InformationalServices.label().to_string()))
            .act(Operation::SetComment(samples::NEGATIVE_COMMENT.to_string()))
            .act(Operation::SetEmail(samples::NEGATIVE_EMAIL.to_string()))
            .expect(Expected::All(vec![
                Expected::CommentValue(samples::NEGATIVE_COMMENT.to_string()),
                Expected::EmailValue(samples::NEGATIVE_EMAIL.to_string()),
            ])),
        Polarity::Positive => {
            let scenario = samples::POSITIVE_AREAS
                .iter()
                .fold(scenario, |s, area| s.act(Operation::ToggleArea((*area).to_string())));
            select_all_interests(scenario)
                .act(Operation::TypeComment(samples::POSITIVE_COMMENT.to_string()))
                .act(Operation::TypeEmail(samples::POSITIVE_EMAIL.to_string()))
                .expect(Expected::All(vec![
                    Expected::CommentValue(samples::POSITIVE_COMMENT.to_string()),
                    Expected::EmailValue(samples::POSITIVE_EMAIL.to_string()),
                ]))
        }
    }
}

fn select_all_interests(scenario: Scenario) -> Scenario {
    scenario.act(Operation::SelectAllInterests)
}

/// General widget behavior
#[must_use]
pub fn collection_flow() -> Vec<Scenario> {
    let homepage = base("homepage-loads", FEATURE_COLLECTION, "Page Loading Verification")
        .with_description("should load WOGAA homepage successfully")
        .with_tags(&["homepage", "loading", "smoke", "regression"])
        .with_severity(Severity::Critical)
        .expect(Expected::State(WidgetState::Closed));

    let display = base("widget-display", FEATURE_COLLECTION, "Rating Widget Display")
        .with_description("should display rating widget when Help us improve is clicked")
        .with_tags(&["widget", "ui", "display", "regression"])
        .with_severity(Severity::Critical)
        .step(
            Operation::Open,
            Expected::All(vec![
                Expected::State(WidgetState::Open),
                Expected::Rating(None),
                Expected::RatingPromptShown(true),
            ]),
        );

    let close = base("widget-close", FEATURE_COLLECTION, "Rating Widget Close Functionality")
        .with_description("should close rating popup when close button is clicked")
        .with_tags(&["widget", "close", "ui", "regression"])
        .step(Operation::Open, Expected::State(WidgetState::Open))
        .step(Operation::Close, Expected::State(WidgetState::Closed));

    let rating_one = open_and_rate(
        base("rating-1-shows-form", FEATURE_COLLECTION, "Negative Rating Feedback Flow")
            .with_description("should show feedback form when rating 1 is selected")
            .with_tags(&["rating", "feedback", "negative", "regression"]),
        1,
    )
    .expect(Expected::Polarity(Polarity::Negative));

    let rating_six = open_and_rate(
        base("rating-6-shows-form", FEATURE_COLLECTION, "Positive Rating Feedback Flow")
            .with_description("should show feedback form when rating 6 is selected")
            .with_tags(&["rating", "feedback", "positive", "regression"]),
        6,
    )
    .expect(Expected::Polarity(Polarity::Positive));

    let full_flow = base("full-sentiment-flow", FEATURE_COLLECTION, "Complete Sentiment Feedback Flow")
        .with_description("should complete full sentiment feedback flow")
        .with_tags(&["sentiment", "feedback", "ui", "e2e", "regression"])
        .with_severity(Severity::Critical)
        .step(Operation::Open, Expected::State(WidgetState::Open))
        .step(Operation::Close, Expected::State(WidgetState::Closed))
        .step(Operation::Open, Expected::State(WidgetState::Open))
        .step(Operation::SelectRating(1), Expected::State(WidgetState::FeedbackOpen))
        .step(Operation::Close, Expected::State(WidgetState::Closed));

    let contract = base("widget-contract-errors", FEATURE_COLLECTION, "Widget Contract")
        .with_description("illegal operations are rejected without changing state")
        .with_tags(&["widget", "contract", "regression"])
        .with_severity(Severity::Minor)
        .step(Operation::Close, Expected::Error(ErrorKind::InvalidTransition))
        .step(Operation::SelectRating(3), Expected::Error(ErrorKind::InvalidTransition))
        .step(Operation::Open, Expected::State(WidgetState::Open))
        .step(Operation::Open, Expected::Error(ErrorKind::InvalidTransition))
        .step(
            Operation::SelectRating(0),
            Expected::All(vec![
                Expected::Error(ErrorKind::OutOfRange),
                Expected::State(WidgetState::Open),
            ]),
        )
        .step(
            Operation::SelectRating(7),
            Expected::All(vec![
                Expected::Error(ErrorKind::OutOfRange),
                Expected::State(WidgetState::Open),
            ]),
        )
        .step(Operation::SelectRating(2), Expected::State(WidgetState::FeedbackOpen))
        .step(
            Operation::ToggleArea("Website is great".to_string()),
            Expected::Error(ErrorKind::OutOfRange),
        )
        .step(Operation::Submit, Expected::Error(ErrorKind::SubmitBlocked));

    vec![homepage, display, close, rating_one, rating_six, full_flow, contract]
}

/// Per-rating scenarios plus the across-ratings submission for one polarity
#[must_use]
pub fn polarity_suite(polarity: Polarity) -> Vec<Scenario> {
    let (feature, prefix) = match polarity {
        Polarity::Negative => (FEATURE_NEGATIVE, "negative"),
        Polarity::Positive => (FEATURE_POSITIVE, "positive"),
    };
    let polarity_tag = format!("{prefix}-rating");
    let mut scenarios = Vec::new();

    for rating in polarity.ratings() {
        let n = rating.value();
        let rating_tag = format!("rating-{n}");
        let fixed = [polarity_tag.as_str(), rating_tag.as_str()];

        scenarios.push(
            open_and_rate(
                base(
                    &format!("{prefix}/rating-{n}/form-display"),
                    feature,
                    &format!("Rating {n} Feedback Form UI Validation"),
                )
                .with_description(format!("should display correct feedback form for rating {n}"))
                .with_tags(&tagged(&fixed, &["feedback-form", "validation", "regression"])),
                n,
            )
            .expect(Expected::All(vec![
                Expected::RatingPromptShown(false),
                Expected::Polarity(polarity),
                Expected::FormQuestionsShown(polarity),
                Expected::AreasOffered(polarity),
                Expected::SubmitEnabled(false),
            ])),
        );

        scenarios.push(
            interact(
                open_and_rate(
                    base(
                        &format!("{prefix}/rating-{n}/form-interaction"),
                        feature,
                        &format!("Rating {n} Form Interaction"),
                    )
                    .with_description(format!(
                        "should allow user to interact with feedback form for rating {n}"
                    ))
                    .with_tags(&tagged(&fixed, &["form-interaction", "user-flow", "regression"])),
                    n,
                ),
                polarity,
            )
            .expect(Expected::SubmitEnabled(true))
            .step(Operation::Close, Expected::State(WidgetState::Closed)),
        );

        scenarios.push(
            open_and_rate(
                base(
                    &format!("{prefix}/rating-{n}/validation-errors"),
                    feature,
                    &format!("Rating {n} Error Validation Test"),
                )
                .with_description(format!(
                    "should display validation errors and disable submit button when text \
                     exceeds 255 characters and email is invalid for rating {n}"
                ))
                .with_tags(&tagged(&fixed, &["validation", "form-validation", "error-handling"])),
                n,
            )
            .act(Operation::TypeComment(samples::LONG_FEEDBACK_TEXT.to_string()))
            .act(Operation::TypeEmail(samples::INVALID_EMAIL.to_string()))
            .expect(Expected::All(vec![
                Expected::CommentValid(false),
                Expected::CharacterCountAbove(crate::validation::COMMENT_MAX_CHARS),
                Expected::EmailValid(false),
                Expected::SubmitEnabled(false),
            ])),
        );

        scenarios.push(
            select_all_interests(open_and_rate(
                base(
                    &format!("{prefix}/rating-{n}/optional-only-disabled"),
                    feature,
                    &format!(
                        "Rating {n} Submit Button should be Disabled with Checkbox selection Only"
                    ),
                )
                .with_description(format!(
                    "should keep submit button disabled when only optional checkboxes \
                     selected for rating {n}"
                ))
                .with_tags(&tagged(&fixed, &["submit-disabled", "optional-checkboxes"])),
                n,
            ))
            .expect(Expected::SubmitEnabled(false))
            .step(Operation::Submit, Expected::Error(ErrorKind::SubmitBlocked)),
        );
    }

    let across = polarity.ratings().into_iter().fold(
        base(
            &format!("{prefix}/submit-across-ratings"),
            feature,
            &format!(
                "{} Ratings Form Consistency and Submission",
                match polarity {
                    Polarity::Negative => "Negative",
                    Polarity::Positive => "Positive",
                }
            ),
        )
        .with_description(format!(
            "should submit the feedback form across all {prefix} ratings"
        ))
        .with_tags(&[polarity_tag.as_str(), "consistency", "form-structure", "regression"]),
        |scenario, rating| {
            let scenario = open_and_rate(scenario, rating.value())
                .expect(Expected::AreasOffered(polarity));
            let scenario = match polarity {
                Polarity::Negative => select_all_interests(
                    samples::NEGATIVE_AREAS
                        .iter()
                        .fold(scenario, |s, a| s.act(Operation::ToggleArea((*a).to_string()))),
                )
                .act(Operation::SetComment(samples::NEGATIVE_COMMENT.to_string()))
                .act(Operation::SetEmail(samples::NEGATIVE_EMAIL.to_string())),
                Polarity::Positive => interact(scenario, polarity),
            };
            scenario.expect(Expected::SubmitEnabled(true)).step(
                Operation::Submit,
                Expected::All(vec![Expected::State(WidgetState::Closed), Expected::Acknowledged]),
            )
        },
    );
    scenarios.push(across);
    scenarios
}

/// The two end-to-end acceptance flows
#[must_use]
pub fn end_to_end() -> Vec<Scenario> {
    let submit = base("e2e/rating-1-submit", FEATURE_NEGATIVE, "Negative Rating Submission")
        .with_description("rate 1, fill the form with valid input and submit")
        .with_tags(&["e2e", "negative-rating", "rating-1", "regression"])
        .with_severity(Severity::Blocker)
        .step(Operation::Open, Expected::State(WidgetState::Open))
        .step(
            Operation::SelectRating(1),
            Expected::All(vec![
                Expected::State(WidgetState::FeedbackOpen),
                Expected::Polarity(Polarity::Negative),
            ]),
        )
        .act(Operation::ToggleArea("Technical errors".to_string()))
        .act(Operation::ToggleArea("Difficult to navigate".to_string()))
        .act(Operation::SetComment(samples::NEGATIVE_COMMENT.to_string()))
        .act(Operation::SetEmail(samples::NEGATIVE_EMAIL.to_string()))
        .expect(Expected::SubmitEnabled(true))
        .step(Operation::Submit, Expected::State(WidgetState::Closed));

    let invalid = select_all_interests(
        base("e2e/rating-6-invalid-input", FEATURE_POSITIVE, "Positive Rating Validation")
            .with_description("rate 6 with an over-long comment and an invalid email")
            .with_tags(&["e2e", "positive-rating", "rating-6", "validation"])
            .with_severity(Severity::Blocker)
            .step(Operation::Open, Expected::State(WidgetState::Open))
            .step(Operation::SelectRating(6), Expected::State(WidgetState::FeedbackOpen))
            .act(Operation::ToggleArea("Website is great".to_string())),
    )
    .act(Operation::SetComment("a".repeat(256)))
    .act(Operation::SetEmail(samples::INVALID_EMAIL.to_string()))
    .expect(Expected::All(vec![
        Expected::CommentValid(false),
        Expected::EmailValid(false),
        Expected::SubmitEnabled(false),
    ]));

    vec![submit, invalid]
}
