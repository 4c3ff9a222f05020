//! Validation rules for the feedback form.
//!
//! Three rules gate the SUBMIT button: at least one contributing area, a
//! comment of at most [`COMMENT_MAX_CHARS`] characters, and an email that is
//! either empty or matches a conservative `local@domain.tld` pattern.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Maximum comment length, in characters
pub const COMMENT_MAX_CHARS: usize = 255;

/// Prefix of the aria-label shown when the comment is too long
pub const CHARACTER_COUNT_LABEL_PREFIX: &str = "Character count exceeded";

/// Aria-label of the invalid email alert
pub const EMAIL_ALERT_LABEL: &str = "Alert, Please enter a valid email.";

/// Visible text of the invalid email alert
pub const EMAIL_ALERT_TEXT: &str = "Please enter a valid email.";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("valid email regex")
    })
}

fn count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+) out of 255").expect("valid count regex"))
}

/// Comment length in characters (not bytes)
#[must_use]
pub fn comment_char_count(text: &str) -> usize {
    text.chars().count()
}

/// Whether a comment satisfies the length rule (255 exactly is valid)
#[must_use]
pub fn is_comment_valid(text: &str) -> bool {
    comment_char_count(text) <= COMMENT_MAX_CHARS
}

/// Whether `text` is a syntactically valid email address.
///
/// Requires a non-empty local part, exactly one `@`, and a domain with at
/// least one `.` separating non-empty labels. Whitespace anywhere rejects.
#[must_use]
pub fn is_valid_email(text: &str) -> bool {
    email_pattern().is_match(text)
}

/// Whether an optional email field passes validation
#[must_use]
pub fn is_email_field_valid(text: &str) -> bool {
    text.is_empty() || is_valid_email(text)
}

/// Aria-label rendered for an over-long comment
#[must_use]
pub fn character_count_label(count: usize) -> String {
    format!("{CHARACTER_COUNT_LABEL_PREFIX} {count} out of {COMMENT_MAX_CHARS}")
}

/// Extract the character count from an aria-label such as
/// `"Character count exceeded 256 out of 255"`.
#[must_use]
pub fn parse_character_count(aria_label: &str) -> Option<usize> {
    count_pattern()
        .captures(aria_label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Snapshot of every validation rule for the current form contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValidation {
    /// At least one contributing area is selected
    pub areas_selected: bool,
    /// Comment length in characters
    pub comment_chars: usize,
    /// Comment length rule passes
    pub comment_valid: bool,
    /// Email rule passes (empty or well-formed)
    pub email_valid: bool,
}

impl FormValidation {
    /// Evaluate all rules
    #[must_use]
    pub fn evaluate(areas_selected: bool, comment: &str, email: &str) -> Self {
        let comment_chars = comment_char_count(comment);
        Self {
            areas_selected,
            comment_chars,
            comment_valid: comment_chars <= COMMENT_MAX_CHARS,
            email_valid: is_email_field_valid(email),
        }
    }

    /// Whether SUBMIT is enabled
    #[must_use]
    pub const fn submit_enabled(&self) -> bool {
        self.areas_selected && self.comment_valid && self.email_valid
    }

    /// Human-readable list of failing rules
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        if !self.areas_selected {
            reasons.push("no contributing area selected".to_string());
        }
        if !self.comment_valid {
            reasons.push(format!(
                "comment has {} characters (max {COMMENT_MAX_CHARS})",
                self.comment_chars
            ));
        }
        if !self.email_valid {
            reasons.push("email is not valid".to_string());
        }
        reasons
    }
}
