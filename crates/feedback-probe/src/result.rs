//! Result and error types for feedback-probe.

use std::fmt;
use thiserror::Error;

/// Result type for feedback-probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while modelling or driving the rating widget
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Operation is illegal in the widget's current state
    #[error("Invalid transition: cannot {op} while widget is {state}")]
    InvalidTransition {
        /// Operation that was attempted
        op: String,
        /// State the widget was in
        state: String,
    },

    /// Rating outside [1,6] or unknown vocabulary tag
    #[error("Out of range: {what}")]
    OutOfRange {
        /// What was out of range
        what: String,
    },

    /// Submit attempted while validation fails
    #[error("Submit blocked: {}", reasons.join(", "))]
    SubmitBlocked {
        /// Validation rules that failed
        reasons: Vec<String>,
    },

    /// Element never appeared within the wait budget
    #[error("Element not found: {selector} (waited {timeout_ms}ms)")]
    NotFound {
        /// Selector description
        selector: String,
        /// Wait budget in milliseconds
        timeout_ms: u64,
    },

    /// Element appeared but never became actionable
    #[error("Element not actionable: {selector} is {reason} (waited {timeout_ms}ms)")]
    NotActionable {
        /// Selector description
        selector: String,
        /// Why the element could not be acted on
        reason: String,
        /// Wait budget in milliseconds
        timeout_ms: u64,
    },

    /// Environment profile file is absent
    #[error("Environment file {path} not found. Please create it.")]
    ConfigMissing {
        /// Path that was looked up
        path: String,
    },

    /// Configuration could not be parsed or is incomplete
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Driver-level failure not covered by the other variants
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create an invalid transition error
    #[must_use]
    pub fn invalid_transition(op: impl Into<String>, state: impl fmt::Display) -> Self {
        Self::InvalidTransition {
            op: op.into(),
            state: state.to_string(),
        }
    }

    /// Create an out-of-range error
    #[must_use]
    pub fn out_of_range(what: impl Into<String>) -> Self {
        Self::OutOfRange { what: what.into() }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::SubmitBlocked { .. } => ErrorKind::SubmitBlocked,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotActionable { .. } => ErrorKind::NotActionable,
            Self::ConfigMissing { .. } | Self::Config { .. } => ErrorKind::ConfigMissing,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::AssertionFailed { .. } => ErrorKind::Assertion,
            Self::Driver { .. } | Self::Io(_) | Self::Json(_) | Self::Yaml(_) => ErrorKind::Other,
        }
    }

    /// Whether this error is a widget contract violation
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidTransition | ErrorKind::OutOfRange | ErrorKind::SubmitBlocked
        )
    }
}

/// Fieldless classification of [`ProbeError`], used in expected observables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Operation illegal in current state
    InvalidTransition,
    /// Value outside its domain
    OutOfRange,
    /// Submit with failing validation
    SubmitBlocked,
    /// Element not found
    NotFound,
    /// Element not actionable
    NotActionable,
    /// Environment profile missing or invalid
    ConfigMissing,
    /// Timeout
    Timeout,
    /// Assertion failure
    Assertion,
    /// Anything else
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidTransition => "InvalidTransition",
            Self::OutOfRange => "OutOfRange",
            Self::SubmitBlocked => "SubmitBlocked",
            Self::NotFound => "NotFound",
            Self::NotActionable => "NotActionable",
            Self::ConfigMissing => "ConfigMissing",
            Self::Timeout => "Timeout",
            Self::Assertion => "Assertion",
            Self::Other => "Other",
        };
        f.write_str(name)
    }
}
