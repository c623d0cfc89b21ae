//! Unified error type for gallery operations.

use std::fmt;

use super::category::ErrorCategory;
use super::remote::RemoteError;
use crate::models::PromptId;
use crate::traits::SessionStoreError;

/// Every failure a gallery action can surface to the caller.
#[derive(Debug, Clone)]
pub enum GalleryError {
    /// The action requires a signed-in user and there is none.
    Unauthenticated {
        /// What the user tried to do, e.g. "like prompts".
        action: &'static str,
    },

    /// Input rejected before any remote call.
    Validation { message: String },

    /// A single remote call failed. Nothing was changed.
    Remote {
        operation: &'static str,
        source: RemoteError,
    },

    /// A multi-step write stopped half way.
    PartialFailure {
        operation: &'static str,
        /// Step that succeeded and could not be undone, or was undone.
        completed: &'static str,
        source: RemoteError,
        /// Whether the completed step was rolled back.
        compensated: bool,
    },

    /// The prompt does not exist or is not visible.
    PromptNotFound { id: PromptId },

    /// The prompt belongs to another user.
    NotOwner { id: PromptId },

    /// Sign-in rejected the email/password pair.
    InvalidCredentials,

    /// The local session store failed.
    Session(SessionStoreError),

    /// Missing or invalid configuration.
    Config { message: String },
}

impl GalleryError {
    pub fn remote(operation: &'static str, source: RemoteError) -> Self {
        GalleryError::Remote { operation, source }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        GalleryError::Validation {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        GalleryError::Config {
            message: message.into(),
        }
    }

    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            GalleryError::Unauthenticated { .. } => ErrorCategory::Unauthenticated,
            GalleryError::Validation { .. } => ErrorCategory::Validation,
            GalleryError::Remote { .. } | GalleryError::InvalidCredentials => {
                ErrorCategory::RemoteFailure
            }
            GalleryError::PartialFailure { .. } => ErrorCategory::PartialFailure,
            GalleryError::PromptNotFound { .. } | GalleryError::NotOwner { .. } => {
                ErrorCategory::NotFound
            }
            GalleryError::Session(_) => ErrorCategory::System,
            GalleryError::Config { .. } => ErrorCategory::Configuration,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            GalleryError::Unauthenticated { .. } => "E_UNAUTHENTICATED",
            GalleryError::Validation { .. } => "E_VALIDATION",
            GalleryError::Remote { source, .. } => source.error_code(),
            GalleryError::PartialFailure { .. } => "E_PARTIAL_FAILURE",
            GalleryError::PromptNotFound { .. } => "E_PROMPT_NOT_FOUND",
            GalleryError::NotOwner { .. } => "E_NOT_OWNER",
            GalleryError::InvalidCredentials => "E_INVALID_CREDENTIALS",
            GalleryError::Session(_) => "E_SESSION_STORE",
            GalleryError::Config { .. } => "E_CONFIG",
        }
    }

    /// Get a user-friendly error message, suitable for a toast.
    pub fn user_message(&self) -> String {
        match self {
            GalleryError::Unauthenticated { action } => {
                format!("Please log in to {}!", action)
            }
            GalleryError::Validation { message } => message.clone(),
            GalleryError::Remote { operation, source } => {
                format!("Error {}: {}", operation, source)
            }
            GalleryError::PartialFailure {
                operation,
                completed,
                compensated: true,
                ..
            } => format!("Error {}: {} was rolled back", operation, completed),
            GalleryError::PartialFailure {
                operation,
                completed,
                compensated: false,
                ..
            } => format!(
                "Error {}: {} but the rest failed. Counts may be off until the next sync",
                operation, completed
            ),
            GalleryError::PromptNotFound { .. } => "That prompt no longer exists".to_string(),
            GalleryError::NotOwner { .. } => "You can only delete your own prompts".to_string(),
            GalleryError::InvalidCredentials => "Invalid credentials".to_string(),
            GalleryError::Session(err) => format!("Could not access the saved session: {}", err),
            GalleryError::Config { message } => format!("Configuration error: {}", message),
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }

    /// The underlying remote error, if any.
    pub fn remote_error(&self) -> Option<&RemoteError> {
        match self {
            GalleryError::Remote { source, .. } | GalleryError::PartialFailure { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

impl fmt::Display for GalleryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GalleryError::Unauthenticated { action } => {
                write!(f, "authentication required to {}", action)
            }
            GalleryError::Validation { message } => write!(f, "validation failed: {}", message),
            GalleryError::Remote { operation, source } => {
                write!(f, "{} failed: {}", operation, source)
            }
            GalleryError::PartialFailure {
                operation,
                completed,
                source,
                compensated,
            } => write!(
                f,
                "{} partially failed after {} ({}): {}",
                operation,
                completed,
                if *compensated {
                    "rolled back"
                } else {
                    "not rolled back"
                },
                source
            ),
            GalleryError::PromptNotFound { id } => write!(f, "prompt {} not found", id),
            GalleryError::NotOwner { id } => write!(f, "prompt {} is owned by another user", id),
            GalleryError::InvalidCredentials => write!(f, "invalid login credentials"),
            GalleryError::Session(err) => write!(f, "{}", err),
            GalleryError::Config { message } => write!(f, "configuration error: {}", message),
        }
    }
}

impl std::error::Error for GalleryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GalleryError::Remote { source, .. } | GalleryError::PartialFailure { source, .. } => {
                Some(source)
            }
            GalleryError::Session(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SessionStoreError> for GalleryError {
    fn from(err: SessionStoreError) -> Self {
        GalleryError::Session(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_follow_taxonomy() {
        assert_eq!(
            GalleryError::Unauthenticated { action: "like prompts" }.category(),
            ErrorCategory::Unauthenticated
        );
        assert_eq!(
            GalleryError::validation("Title is required").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            GalleryError::remote("liking prompt", RemoteError::Decode("x".into())).category(),
            ErrorCategory::RemoteFailure
        );
        assert_eq!(
            GalleryError::PartialFailure {
                operation: "liking prompt",
                completed: "like recorded",
                source: RemoteError::Decode("x".into()),
                compensated: false,
            }
            .category(),
            ErrorCategory::PartialFailure
        );
    }

    #[test]
    fn test_unauthenticated_user_message() {
        let err = GalleryError::Unauthenticated {
            action: "like prompts",
        };
        assert_eq!(err.user_message(), "Please log in to like prompts!");
        assert_eq!(err.error_code(), "E_UNAUTHENTICATED");
    }

    #[test]
    fn test_remote_error_code_is_forwarded() {
        let err = GalleryError::remote(
            "reporting prompt",
            RemoteError::Status {
                status: 500,
                message: "boom".to_string(),
            },
        );
        assert_eq!(err.error_code(), "E_REMOTE_STATUS");
        assert_eq!(err.user_message(), "Error reporting prompt: HTTP 500: boom");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_session_store_error_converts() {
        let err: GalleryError = SessionStoreError::Io("denied".to_string()).into();
        assert_eq!(err.category(), ErrorCategory::System);
    }
}
