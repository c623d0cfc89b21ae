//! Identity service bindings (`/auth/v1`).

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::{ensure_success, RestBackend};
use crate::error::RemoteError;
use crate::models::{Session, SignUpOutcome, User};
use crate::traits::{AuthService, HttpClient, Response};

#[derive(Debug, Deserialize)]
struct JwtClaims {
    exp: i64,
}

/// Expiry (unix seconds) encoded in a JWT access token, if it can be read.
pub fn jwt_expiry(access_token: &str) -> Option<i64> {
    let payload = access_token.split('.').nth(1)?;
    let payload = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: JwtClaims = serde_json::from_slice(&payload).ok()?;
    Some(claims.exp)
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AppMetadata {
    #[serde(default)]
    is_owner: Option<bool>,
}

/// User object as returned by the identity service.
#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
    #[serde(default)]
    app_metadata: AppMetadata,
    /// Empty when sign-up hit an existing, confirmed address.
    #[serde(default)]
    identities: Option<Vec<serde_json::Value>>,
}

impl From<AuthUser> for User {
    fn from(user: AuthUser) -> Self {
        User {
            id: user.id,
            email: user.email.unwrap_or_default(),
            display_name: user.user_metadata.name,
            is_owner: user.app_metadata.is_owner.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        let expires_at = token
            .expires_at
            .or_else(|| jwt_expiry(&token.access_token))
            .unwrap_or_else(|| {
                chrono::Utc::now().timestamp() + token.expires_in.unwrap_or(3600)
            });
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: token.user.into(),
        }
    }
}

/// Sign-up answers with a session when confirmation is off and with a bare
/// user when it is on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(AuthUser),
}

fn is_invalid_grant(response: &Response) -> bool {
    if response.status != 400 {
        return false;
    }
    let body: serde_json::Value = response.json().unwrap_or_default();
    let error = body.get("error").and_then(|v| v.as_str());
    let code = body.get("error_code").and_then(|v| v.as_str());
    error == Some("invalid_grant") || code == Some("invalid_credentials")
}

fn is_already_registered(response: &Response) -> bool {
    if !matches!(response.status, 400 | 422) {
        return false;
    }
    let body: serde_json::Value = response.json().unwrap_or_default();
    let code = body.get("error_code").and_then(|v| v.as_str());
    let message = body
        .get("msg")
        .or_else(|| body.get("message"))
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    code == Some("user_already_exists") || message.contains("already registered")
}

impl<C: HttpClient> RestBackend<C> {
    fn auth_headers(&self, token: &str) -> crate::traits::Headers {
        let mut headers = self.headers_with_token(token);
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, RemoteError> {
        let url = self.url(&format!("/auth/v1/token?grant_type={}", grant_type));
        let response = self
            .http
            .post(&url, &body.to_string(), &self.auth_headers(&self.anon_key))
            .await?;
        if is_invalid_grant(&response) && grant_type == "password" {
            return Err(RemoteError::InvalidCredentials);
        }
        let token: TokenResponse = ensure_success(response)?.json()?;
        Ok(token.into())
    }
}

#[async_trait]
impl<C: HttpClient> AuthService for RestBackend<C> {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SignUpOutcome, RemoteError> {
        debug!("POST /auth/v1/signup for {}", email);
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "data": { "name": display_name },
        });
        let response = self
            .http
            .post(
                &self.url("/auth/v1/signup"),
                &body.to_string(),
                &self.auth_headers(&self.anon_key),
            )
            .await?;
        if is_already_registered(&response) {
            return Ok(SignUpOutcome::AlreadyRegistered);
        }

        match ensure_success(response)?.json::<SignUpResponse>()? {
            SignUpResponse::Session(token) => Ok(SignUpOutcome::Active(token.into())),
            SignUpResponse::User(user) => match user.identities.as_deref() {
                Some([]) => Ok(SignUpOutcome::AlreadyRegistered),
                _ => Ok(SignUpOutcome::PendingConfirmation {
                    user_id: Some(user.id),
                }),
            },
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, RemoteError> {
        debug!("POST /auth/v1/token (password) for {}", email);
        self.token_grant(
            "password",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, RemoteError> {
        debug!("POST /auth/v1/token (refresh_token)");
        self.token_grant(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    async fn current_user(&self, access_token: &str) -> Result<User, RemoteError> {
        let response = self
            .http
            .get(
                &self.url("/auth/v1/user"),
                &self.headers_with_token(access_token),
            )
            .await?;
        let user: AuthUser = ensure_success(response)?.json()?;
        Ok(user.into())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), RemoteError> {
        debug!("POST /auth/v1/logout");
        let response = self
            .http
            .post(
                &self.url("/auth/v1/logout"),
                "",
                &self.headers_with_token(access_token),
            )
            .await?;
        ensure_success(response).map(|_| ())
    }

    fn bind_session(&self, session: Option<&Session>) {
        self.set_access_token(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use bytes::Bytes;

    const BASE: &str = "https://x.example.co";

    fn token_for(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp));
        format!("{}.{}.sig", header, payload)
    }

    fn backend_with(method: &str, path: &str, status: u16, body: &str) -> RestBackend<MockHttpClient> {
        let http = MockHttpClient::new();
        http.set_response(
            method,
            &format!("{}{}", BASE, path),
            MockResponse::Success(Response::new(status, Bytes::from(body.to_string()))),
        );
        RestBackend::new(http, BASE, "anon")
    }

    #[test]
    fn test_jwt_expiry() {
        assert_eq!(jwt_expiry(&token_for(1_900_000_000)), Some(1_900_000_000));
        assert_eq!(jwt_expiry("not-a-jwt"), None);
        assert_eq!(jwt_expiry("a.!!!.c"), None);
    }

    #[tokio::test]
    async fn test_sign_in_maps_session() {
        let token = token_for(1_900_000_000);
        let body = format!(
            r#"{{"access_token":"{}","refresh_token":"r1","expires_in":3600,
                "user":{{"id":"6f1c1d5e-0c1b-4f7a-9a53-0d6c7c1e9a10","email":"ana@example.com",
                "user_metadata":{{"name":"Ana"}},"app_metadata":{{"is_owner":true}}}}}}"#,
            token
        );
        let backend = backend_with("POST", "/auth/v1/token", 200, &body);

        let session = backend.sign_in("ana@example.com", "pw").await.unwrap();
        assert_eq!(session.refresh_token, "r1");
        assert_eq!(session.expires_at, 1_900_000_000);
        assert_eq!(session.user.display_name.as_deref(), Some("Ana"));
        assert!(session.user.is_owner);

        let requests = backend.http().get_requests();
        assert!(requests[0].url.ends_with("/auth/v1/token?grant_type=password"));
        assert_eq!(
            requests[0].headers.get("Authorization").map(String::as_str),
            Some("Bearer anon")
        );
    }

    #[tokio::test]
    async fn test_sign_in_invalid_credentials() {
        let backend = backend_with(
            "POST",
            "/auth/v1/token",
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert!(matches!(
            backend.sign_in("a@example.com", "bad").await,
            Err(RemoteError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_sign_up_pending_and_existing() {
        let pending = backend_with(
            "POST",
            "/auth/v1/signup",
            200,
            r#"{"id":"6f1c1d5e-0c1b-4f7a-9a53-0d6c7c1e9a10","email":"a@example.com","identities":[{"id":"x"}]}"#,
        );
        assert!(matches!(
            pending.sign_up("a@example.com", "pw", "Ana").await.unwrap(),
            SignUpOutcome::PendingConfirmation { user_id: Some(_) }
        ));

        let existing = backend_with(
            "POST",
            "/auth/v1/signup",
            200,
            r#"{"id":"6f1c1d5e-0c1b-4f7a-9a53-0d6c7c1e9a10","email":"a@example.com","identities":[]}"#,
        );
        assert_eq!(
            existing.sign_up("a@example.com", "pw", "Ana").await.unwrap(),
            SignUpOutcome::AlreadyRegistered
        );

        let rejected = backend_with(
            "POST",
            "/auth/v1/signup",
            422,
            r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#,
        );
        assert_eq!(
            rejected.sign_up("a@example.com", "pw", "Ana").await.unwrap(),
            SignUpOutcome::AlreadyRegistered
        );
    }

    #[tokio::test]
    async fn test_current_user_uses_given_token() {
        let backend = backend_with(
            "GET",
            "/auth/v1/user",
            200,
            r#"{"id":"6f1c1d5e-0c1b-4f7a-9a53-0d6c7c1e9a10","email":"a@example.com"}"#,
        );
        let user = backend.current_user("tok").await.unwrap();
        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.display_name, None);
        assert_eq!(
            backend.http().get_requests()[0]
                .headers
                .get("Authorization")
                .map(String::as_str),
            Some("Bearer tok")
        );
    }

    #[tokio::test]
    async fn test_bind_session_switches_bearer() {
        let backend = backend_with("POST", "/auth/v1/logout", 204, "");
        let session: Session = TokenResponse {
            access_token: "user-tok".to_string(),
            refresh_token: "r".to_string(),
            expires_in: Some(60),
            expires_at: None,
            user: AuthUser {
                id: Uuid::nil(),
                email: None,
                user_metadata: UserMetadata::default(),
                app_metadata: AppMetadata::default(),
                identities: None,
            },
        }
        .into();

        backend.bind_session(Some(&session));
        assert_eq!(backend.bearer(), "user-tok");
        backend.sign_out("user-tok").await.unwrap();
        backend.bind_session(None);
        assert_eq!(backend.bearer(), "anon");
    }
}
