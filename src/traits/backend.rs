//! Hosted backend capabilities.
//!
//! The backend is split the way the hosted platform splits it: an identity
//! service, a table store with row-level security, and an object store for
//! prompt images. [`crate::backend::RestBackend`] implements all three over
//! HTTP; [`crate::adapters::mock::InMemoryBackend`] implements them in memory.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::RemoteError;
use crate::models::{
    CounterUpdate, FeedQuery, Like, NewPrompt, Prompt, PromptId, PromptPage, Session,
    SignUpOutcome, User,
};

/// Identity service.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SignUpOutcome, RemoteError>;

    /// Password sign-in. Rejected credentials map to
    /// [`RemoteError::InvalidCredentials`].
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, RemoteError>;

    /// Exchange a refresh token for a new session.
    async fn refresh(&self, refresh_token: &str) -> Result<Session, RemoteError>;

    /// Resolve the user an access token belongs to.
    async fn current_user(&self, access_token: &str) -> Result<User, RemoteError>;

    /// Revoke the session server-side.
    async fn sign_out(&self, access_token: &str) -> Result<(), RemoteError>;

    /// Called on every session transition so later table and storage calls
    /// run as the signed-in user. Backends without per-user auth ignore it.
    fn bind_session(&self, _session: Option<&Session>) {}
}

/// Table store holding prompts, likes and user profiles.
#[async_trait]
pub trait Database: Send + Sync {
    /// One page of prompts plus the total number of matches.
    async fn fetch_prompts(&self, query: &FeedQuery) -> Result<PromptPage, RemoteError>;

    async fn fetch_prompt(&self, id: PromptId) -> Result<Option<Prompt>, RemoteError>;

    /// Every prompt owned by `user_id`, newest first.
    async fn fetch_prompts_by_owner(&self, user_id: Uuid) -> Result<Vec<Prompt>, RemoteError>;

    async fn insert_prompt(&self, prompt: &NewPrompt) -> Result<Prompt, RemoteError>;

    async fn update_counter(&self, id: PromptId, update: CounterUpdate)
        -> Result<(), RemoteError>;

    /// Delete a prompt through the caller's own permissions. A delete that
    /// matches nothing fails with [`RemoteError::NoRowsAffected`].
    async fn delete_prompt(&self, id: PromptId) -> Result<(), RemoteError>;

    /// Delete a prompt through the privileged moderation procedure.
    async fn delete_reported_prompt(&self, id: PromptId) -> Result<(), RemoteError>;

    async fn fetch_liked_prompt_ids(&self, user_id: Uuid) -> Result<Vec<PromptId>, RemoteError>;

    /// Insert a like. An existing pair fails with [`RemoteError::Conflict`].
    async fn insert_like(&self, like: &Like) -> Result<(), RemoteError>;

    async fn delete_like(&self, like: &Like) -> Result<(), RemoteError>;

    /// Number of like rows for a prompt.
    async fn count_likes(&self, id: PromptId) -> Result<u64, RemoteError>;

    /// Create the `users` profile row for a new account.
    async fn insert_profile(&self, user_id: Uuid, name: &str) -> Result<(), RemoteError>;
}

/// Object store for prompt images.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload a new object. Existing objects are never overwritten.
    async fn upload(&self, path: &str, data: Bytes, content_type: &str)
        -> Result<(), RemoteError>;

    /// Publicly readable URL of an object.
    fn public_url(&self, path: &str) -> String;

    /// Inverse of [`ObjectStorage::public_url`]. `None` when the URL does
    /// not point into this store.
    fn path_from_public_url(&self, url: &str) -> Option<String>;

    async fn remove(&self, path: &str) -> Result<(), RemoteError>;
}

/// Everything the gallery needs from the hosted platform.
pub trait Backend: AuthService + Database + ObjectStorage {}

impl<T: AuthService + Database + ObjectStorage> Backend for T {}
