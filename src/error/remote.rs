//! Errors returned by the hosted backend bindings.

use thiserror::Error;

use crate::traits::{HttpError, Response};

/// A failed call against the remote auth, table, or storage API.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] HttpError),

    /// The service answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Email/password pair rejected by the auth service.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// Unique-key violation (e.g. the like already exists).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A write matched no rows, either because the row is gone or because
    /// row-level security hid it from this caller.
    #[error("no rows affected on {0}")]
    NoRowsAffected(String),

    /// The body could not be decoded into the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Build a status error from a response, pulling the most specific
    /// message the service provided.
    pub fn from_response(response: &Response) -> Self {
        let message = extract_message(response);
        match response.status {
            409 => RemoteError::Conflict(message),
            status => RemoteError::Status { status, message },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            RemoteError::Conflict(_) => Some(409),
            _ => None,
        }
    }

    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            RemoteError::Transport(_) => "E_REMOTE_TRANSPORT",
            RemoteError::Status { .. } => "E_REMOTE_STATUS",
            RemoteError::InvalidCredentials => "E_REMOTE_CREDENTIALS",
            RemoteError::Conflict(_) => "E_REMOTE_CONFLICT",
            RemoteError::NoRowsAffected(_) => "E_REMOTE_NO_ROWS",
            RemoteError::Decode(_) => "E_REMOTE_DECODE",
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Decode(err.to_string())
    }
}

/// PostgREST, GoTrue and the storage API each name their message field
/// differently.
fn extract_message(response: &Response) -> String {
    let text = response.text().unwrap_or_default();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    if text.is_empty() {
        format!("status {}", response.status)
    } else {
        text.chars().take(200).collect()
    }
}
