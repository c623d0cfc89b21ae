//! Identity records owned by the external auth service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds of slack applied when deciding whether an access token is stale.
const EXPIRY_LEEWAY_SECS: i64 = 30;

/// An authenticated user. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_owner: bool,
}

impl User {
    /// Name shown next to submitted prompts: the configured display name,
    /// falling back to the email address.
    pub fn display_username(&self) -> &str {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.email,
        }
    }
}

/// A live session bound to exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) after which the access token is rejected.
    pub expires_at: i64,
    pub user: User,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() + EXPIRY_LEEWAY_SECS >= self.expires_at
    }
}

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The account exists but the email address must be confirmed first.
    PendingConfirmation { user_id: Option<Uuid> },
    /// Confirmation is disabled; the user is signed in immediately.
    Active(Session),
    /// An account already exists for this email.
    AlreadyRegistered,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: Option<&str>) -> User {
        User {
            id: Uuid::nil(),
            email: "ana@example.com".to_string(),
            display_name: name.map(str::to_string),
            is_owner: false,
        }
    }

    #[test]
    fn test_display_username_prefers_name() {
        assert_eq!(user(Some("Ana")).display_username(), "Ana");
    }

    #[test]
    fn test_display_username_falls_back_to_email() {
        assert_eq!(user(None).display_username(), "ana@example.com");
        assert_eq!(user(Some("   ")).display_username(), "ana@example.com");
    }

    #[test]
    fn test_session_expiry() {
        let mut session = Session {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: 0,
            user: user(None),
        };
        assert!(session.is_expired());

        session.expires_at = chrono::Utc::now().timestamp() + 3600;
        assert!(!session.is_expired());
    }
}
