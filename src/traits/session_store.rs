//! Persisted session storage.
//!
//! The session provider restores the last session from a store at startup
//! and writes every transition back, so a signed-in user stays signed in
//! across runs of the CLI.

use async_trait::async_trait;

use crate::models::Session;

/// Session store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    /// Failed to load the stored session
    LoadFailed(String),
    /// Failed to save the session
    SaveFailed(String),
    /// Failed to remove the stored session
    ClearFailed(String),
    /// IO error
    Io(String),
    /// Serialization/deserialization error
    Serialization(String),
}

impl std::fmt::Display for SessionStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStoreError::LoadFailed(msg) => write!(f, "Failed to load session: {}", msg),
            SessionStoreError::SaveFailed(msg) => write!(f, "Failed to save session: {}", msg),
            SessionStoreError::ClearFailed(msg) => write!(f, "Failed to clear session: {}", msg),
            SessionStoreError::Io(msg) => write!(f, "IO error: {}", msg),
            SessionStoreError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for SessionStoreError {}

/// Storage for at most one session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the stored session.
    ///
    /// # Returns
    /// - `Ok(Some(session))` if a session was stored
    /// - `Ok(None)` if nothing is stored
    /// - `Err(error)` if reading failed
    async fn load(&self) -> Result<Option<Session>, SessionStoreError>;

    /// Replace the stored session.
    async fn save(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Remove the stored session. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), SessionStoreError>;
}
