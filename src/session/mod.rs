//! Session provider.
//!
//! Holds the current session, persists every transition to a
//! [`SessionStore`], binds the access token into the backend, and pushes
//! each change to subscribers over a `tokio::sync::watch` channel.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{GalleryError, GalleryResult, RemoteError, RemoteResultExt};
use crate::models::{Session, SignUpOutcome, User};
use crate::traits::{AuthService, Database, SessionStore};

/// Why the session last changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Restored (or not) from the store at startup.
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Session state as seen by subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub event: SessionEvent,
    pub session: Option<Session>,
}

impl SessionSnapshot {
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }
}

/// A live subscription to session changes. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SessionSubscription {
    rx: watch::Receiver<SessionSnapshot>,
}

impl SessionSubscription {
    /// Wait for the next change. Returns `false` once the provider is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Whether a change arrived since the last [`SessionSubscription::current`].
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Latest snapshot, marking it as seen.
    pub fn current(&mut self) -> SessionSnapshot {
        self.rx.borrow_and_update().clone()
    }

    /// User of the latest snapshot, without marking it as seen.
    pub fn user(&self) -> Option<User> {
        self.rx.borrow().user().cloned()
    }

    /// Release the subscription explicitly.
    pub fn unsubscribe(self) {}
}

/// Owner of the authenticated identity.
pub struct SessionProvider<B> {
    backend: Arc<B>,
    store: Box<dyn SessionStore>,
    state: watch::Sender<SessionSnapshot>,
}

impl<B: AuthService + Database> SessionProvider<B> {
    pub fn new(backend: Arc<B>, store: Box<dyn SessionStore>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot {
            event: SessionEvent::InitialSession,
            session: None,
        });
        Self {
            backend,
            store,
            state,
        }
    }

    /// Load the persisted session. An expired one is refreshed; if that
    /// fails the stored session is discarded and the user starts signed out.
    pub async fn restore(&self) -> Option<User> {
        let stored = match self.store.load().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Could not read stored session: {}", e);
                None
            }
        };

        let session = match stored {
            Some(session) if session.is_expired() => {
                debug!("Stored session expired, refreshing");
                match self.backend.refresh(&session.refresh_token).await {
                    Ok(fresh) => {
                        self.persist(&fresh).await;
                        Some(fresh)
                    }
                    Err(e) => {
                        warn!("Session refresh failed, signing out: {}", e);
                        self.forget().await;
                        None
                    }
                }
            }
            other => other,
        };

        if let Some(session) = &session {
            info!("Restored session for {}", session.user.email);
        }
        self.publish(SessionEvent::InitialSession, session);
        self.current_user()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    /// The current user, or [`GalleryError::Unauthenticated`] naming `action`.
    pub fn require_user(&self, action: &'static str) -> GalleryResult<User> {
        self.current_user()
            .ok_or(GalleryError::Unauthenticated { action })
    }

    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.state.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.state.receiver_count()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> GalleryResult<User> {
        let email = require_field(email, "Email")?;
        if password.is_empty() {
            return Err(GalleryError::validation("Password is required"));
        }

        let session = self
            .backend
            .sign_in(email, password)
            .await
            .map_err(|e| match e {
                RemoteError::InvalidCredentials => GalleryError::InvalidCredentials,
                other => GalleryError::remote("signing in", other),
            })?;

        info!("Signed in as {}", session.user.email);
        let user = session.user.clone();
        self.persist(&session).await;
        self.publish(SessionEvent::SignedIn, Some(session));
        Ok(user)
    }

    /// Register a new account. A profile row is written best-effort once the
    /// account id is known.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> GalleryResult<SignUpOutcome> {
        let email = require_field(email, "Email")?;
        let display_name = require_field(display_name, "Name")?;
        if password.is_empty() {
            return Err(GalleryError::validation("Password is required"));
        }

        let outcome = self
            .backend
            .sign_up(email, password, display_name)
            .await
            .during("signing up")?;

        let new_user_id = match &outcome {
            SignUpOutcome::Active(session) => Some(session.user.id),
            SignUpOutcome::PendingConfirmation { user_id } => *user_id,
            SignUpOutcome::AlreadyRegistered => None,
        };
        if let SignUpOutcome::Active(session) = &outcome {
            // Row security on `users` needs the new session's token.
            self.backend.bind_session(Some(session));
        }
        if let Some(user_id) = new_user_id {
            if let Err(e) = self.backend.insert_profile(user_id, display_name).await {
                warn!("Could not create profile row for {}: {}", user_id, e);
            }
        }

        match &outcome {
            SignUpOutcome::Active(session) => {
                info!("Signed up and signed in as {}", session.user.email);
                self.persist(session).await;
                self.publish(SessionEvent::SignedIn, Some(session.clone()));
            }
            SignUpOutcome::PendingConfirmation { .. } => {
                info!("Sign-up for {} awaits email confirmation", email)
            }
            SignUpOutcome::AlreadyRegistered => info!("{} is already registered", email),
        }
        Ok(outcome)
    }

    /// Sign out. The remote revoke is best-effort; local state is always
    /// cleared.
    pub async fn sign_out(&self) -> GalleryResult<()> {
        if let Some(session) = self.session() {
            if let Err(e) = self.backend.sign_out(&session.access_token).await {
                warn!("Remote sign-out failed: {}", e);
            }
            info!("Signed out {}", session.user.email);
        }
        let cleared = self.store.clear().await;
        self.publish(SessionEvent::SignedOut, None);
        cleared.map_err(GalleryError::from)
    }

    /// Exchange the refresh token for a new session. On failure the user is
    /// signed out.
    pub async fn refresh(&self) -> GalleryResult<Option<User>> {
        let Some(session) = self.session() else {
            return Ok(None);
        };

        match self.backend.refresh(&session.refresh_token).await {
            Ok(fresh) => {
                debug!("Session refreshed for {}", fresh.user.email);
                let user = fresh.user.clone();
                self.persist(&fresh).await;
                self.publish(SessionEvent::TokenRefreshed, Some(fresh));
                Ok(Some(user))
            }
            Err(e) => {
                warn!("Session refresh failed, signing out: {}", e);
                self.forget().await;
                self.publish(SessionEvent::SignedOut, None);
                Err(GalleryError::remote("refreshing session", e))
            }
        }
    }

    /// Refresh the session if its access token is about to expire.
    pub async fn ensure_fresh(&self) -> GalleryResult<Option<User>> {
        match self.session() {
            Some(session) if session.is_expired() => self.refresh().await,
            Some(session) => Ok(Some(session.user)),
            None => Ok(None),
        }
    }

    async fn persist(&self, session: &Session) {
        if let Err(e) = self.store.save(session).await {
            warn!("Could not persist session: {}", e);
        }
    }

    async fn forget(&self) {
        if let Err(e) = self.store.clear().await {
            warn!("Could not clear stored session: {}", e);
        }
    }

    fn publish(&self, event: SessionEvent, session: Option<Session>) {
        self.backend.bind_session(session.as_ref());
        self.state.send_replace(SessionSnapshot { event, session });
    }
}

fn require_field<'a>(value: &'a str, name: &str) -> GalleryResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GalleryError::validation(format!("{} is required", name)));
    }
    Ok(trimmed)
}
