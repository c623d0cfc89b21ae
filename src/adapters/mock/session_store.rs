//! In-memory session store for testing.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::models::Session;
use crate::traits::{SessionStore, SessionStoreError};

/// In-memory session store for testing.
///
/// Clones share state, so a test can keep a handle and inspect what the
/// session provider persisted.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    /// Stored session
    session: Arc<Mutex<Option<Session>>>,
    /// Whether save should fail
    save_should_fail: Arc<Mutex<bool>>,
    /// Whether load should fail
    load_should_fail: Arc<Mutex<bool>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `session`.
    pub fn with_session(session: Session) -> Self {
        let store = Self::default();
        *store.session.lock().unwrap() = Some(session);
        store
    }

    /// Configure whether save should fail.
    pub fn set_save_should_fail(&self, should_fail: bool) {
        *self.save_should_fail.lock().unwrap() = should_fail;
    }

    /// Configure whether load should fail.
    pub fn set_load_should_fail(&self, should_fail: bool) {
        *self.load_should_fail.lock().unwrap() = should_fail;
    }

    /// Current stored session, bypassing the trait.
    pub fn stored(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        if *self.load_should_fail.lock().unwrap() {
            return Err(SessionStoreError::LoadFailed(
                "Simulated load failure".to_string(),
            ));
        }
        Ok(self.session.lock().unwrap().clone())
    }

    async fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        if *self.save_should_fail.lock().unwrap() {
            return Err(SessionStoreError::SaveFailed(
                "Simulated save failure".to_string(),
            ));
        }
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        *self.session.lock().unwrap() = None;
        Ok(())
    }
}
