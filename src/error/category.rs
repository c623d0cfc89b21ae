//! Error category classification for unified error handling.
//!
//! Categories drive how a front end reacts to a failure: whether it
//! prompts for sign-in, highlights a form field, or shows a transient toast.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The action requires a signed-in user.
    Unauthenticated,

    /// Required input is missing or malformed. Caught before any remote call.
    Validation,

    /// Network or service error on a single remote read or write.
    RemoteFailure,

    /// One step of a multi-step write succeeded and a later one did not.
    PartialFailure,

    /// The targeted record does not exist or is not visible to this user.
    NotFound,

    /// Missing or invalid settings.
    Configuration,

    /// Local OS or filesystem errors.
    System,
}

impl ErrorCategory {
    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Unauthenticated => "unauthenticated",
            ErrorCategory::Validation => "validation",
            ErrorCategory::RemoteFailure => "remote-failure",
            ErrorCategory::PartialFailure => "partial-failure",
            ErrorCategory::NotFound => "not-found",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::System => "system",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Unauthenticated => "Sign in and try again",
            ErrorCategory::Validation => "Fill in the required fields",
            ErrorCategory::RemoteFailure => "Check your connection and try again",
            ErrorCategory::PartialFailure => {
                "Some changes were saved and others were not. Refresh to see the current state"
            }
            ErrorCategory::NotFound => "Refresh the gallery; the prompt may have been removed",
            ErrorCategory::Configuration => "Check the PROMPT_GALLERY_* environment variables",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    /// Whether the failure was detected before anything was sent to the backend.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ErrorCategory::Unauthenticated | ErrorCategory::Validation | ErrorCategory::Configuration
        )
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
