//! REST bindings for the hosted backend.
//!
//! One [`RestBackend`] speaks to all three services of the platform:
//!
//! - `/auth/v1` - identity (GoTrue), see [`auth`]
//! - `/rest/v1` - tables and procedures (PostgREST), see [`tables`]
//! - `/storage/v1` - object storage, see [`storage`]
//!
//! Every request carries the project's anon key as `apikey`. The bearer
//! token is the signed-in user's access token when a session is bound and
//! the anon key otherwise, which is what row-level security keys off.

pub mod auth;
pub mod query;
pub mod storage;
pub mod tables;

use std::sync::RwLock;

use crate::adapters::ReqwestHttpClient;
use crate::config::GalleryConfig;
use crate::error::{GalleryError, GalleryResult, RemoteError};
use crate::models::Session;
use crate::traits::{Headers, HttpClient, Response};

pub use auth::jwt_expiry;

/// Client for a PostgREST + GoTrue + storage deployment.
#[derive(Debug)]
pub struct RestBackend<C = ReqwestHttpClient> {
    http: C,
    base_url: String,
    anon_key: String,
    bucket: String,
    access_token: RwLock<Option<String>>,
}

impl RestBackend<ReqwestHttpClient> {
    /// Build a backend with a reqwest client configured from `config`.
    pub fn from_config(config: &GalleryConfig) -> GalleryResult<Self> {
        let http = ReqwestHttpClient::with_timeout(config.timeout)
            .map_err(|e| GalleryError::config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self::new(http, &config.url, &config.anon_key).with_bucket(&config.bucket))
    }
}

impl<C: HttpClient> RestBackend<C> {
    pub fn new(http: C, base_url: &str, anon_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            bucket: crate::config::DEFAULT_BUCKET.to_string(),
            access_token: RwLock::new(None),
        }
    }

    pub fn with_bucket(mut self, bucket: &str) -> Self {
        self.bucket = bucket.to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn http(&self) -> &C {
        &self.http
    }

    /// Bearer token in effect for table and storage calls.
    pub fn bearer(&self) -> String {
        let token = self
            .access_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        token.unwrap_or_else(|| self.anon_key.clone())
    }

    fn set_access_token(&self, session: Option<&Session>) {
        let mut guard = self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = session.map(|s| s.access_token.clone());
    }

    /// `apikey` plus `Authorization` with the given bearer token.
    fn headers_with_token(&self, token: &str) -> Headers {
        let mut headers = Headers::new();
        headers.insert("apikey".to_string(), self.anon_key.clone());
        headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        headers
    }

    /// Headers for table and storage calls made as the bound user.
    fn headers(&self) -> Headers {
        self.headers_with_token(&self.bearer())
    }

    fn json_headers(&self) -> Headers {
        let mut headers = self.headers();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Pass 2xx responses through; turn anything else into a [`RemoteError`].
fn ensure_success(response: Response) -> Result<Response, RemoteError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(RemoteError::from_response(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockHttpClient;
    use crate::models::User;
    use uuid::Uuid;

    fn session(token: &str) -> Session {
        Session {
            access_token: token.to_string(),
            refresh_token: "r".to_string(),
            expires_at: 0,
            user: User {
                id: Uuid::nil(),
                email: "a@example.com".to_string(),
                display_name: None,
                is_owner: false,
            },
        }
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let backend = RestBackend::new(MockHttpClient::new(), "https://x.example.co/", "anon");
        assert_eq!(backend.base_url(), "https://x.example.co");
        assert_eq!(backend.bearer(), "anon");

        backend.set_access_token(Some(&session("user-token")));
        assert_eq!(backend.bearer(), "user-token");
        let headers = backend.headers();
        assert_eq!(headers.get("apikey").map(String::as_str), Some("anon"));
        assert_eq!(
            headers.get("Authorization").map(String::as_str),
            Some("Bearer user-token")
        );

        backend.set_access_token(None);
        assert_eq!(backend.bearer(), "anon");
    }

    #[test]
    fn test_default_bucket() {
        let backend = RestBackend::new(MockHttpClient::new(), "https://x", "anon");
        assert_eq!(backend.bucket(), "prompt-images");
        assert_eq!(backend.with_bucket("other").bucket(), "other");
    }
}
