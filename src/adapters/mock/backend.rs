//! In-memory backend for testing.
//!
//! Implements the identity service, table store and object store over plain
//! collections. Ownership checks on direct deletes mimic row-level security,
//! and any operation can be made to fail to exercise rollback paths.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::RemoteError;
use crate::models::{
    CounterUpdate, FeedQuery, Like, NewPrompt, Prompt, PromptId, PromptPage, Session,
    SignUpOutcome, User,
};
use crate::traits::{AuthService, Database, ObjectStorage};

const PUBLIC_URL_PREFIX: &str = "https://mock.local/storage/v1/object/public/prompt-images/";
const SEED_EPOCH: i64 = 1_704_067_200;
const TOKEN_TTL_SECS: i64 = 3600;

/// Operations of the in-memory backend, for call recording and failure
/// injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    SignUp,
    SignIn,
    Refresh,
    CurrentUser,
    SignOut,
    FetchPrompts,
    FetchPrompt,
    FetchPromptsByOwner,
    InsertPrompt,
    UpdateCounter,
    DeletePrompt,
    DeleteReportedPrompt,
    FetchLikedPromptIds,
    InsertLike,
    DeleteLike,
    CountLikes,
    InsertProfile,
    Upload,
    Remove,
}

impl BackendOp {
    /// Whether the operation talks to the table store or object store, as
    /// opposed to the identity service.
    pub fn is_data_call(&self) -> bool {
        !matches!(
            self,
            BackendOp::SignUp
                | BackendOp::SignIn
                | BackendOp::Refresh
                | BackendOp::CurrentUser
                | BackendOp::SignOut
        )
    }
}

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct State {
    accounts: Vec<Account>,
    access_tokens: HashMap<String, Uuid>,
    refresh_tokens: HashMap<String, Uuid>,
    token_seq: u64,
    prompts: BTreeMap<PromptId, Prompt>,
    next_id: PromptId,
    likes: HashSet<Like>,
    profiles: HashMap<Uuid, String>,
    objects: HashMap<String, (Bytes, String)>,
    failures: HashMap<BackendOp, RemoteError>,
    one_shot_failures: HashMap<BackendOp, RemoteError>,
    calls: Vec<BackendOp>,
    require_confirmation: bool,
    bound_user: Option<Uuid>,
}

/// In-memory implementation of every backend trait.
///
/// Clones share state.
///
/// # Example
///
/// ```ignore
/// let backend = InMemoryBackend::new();
/// let prompt = backend.seed_prompt("Cat poem", "Write about a cat", None);
/// backend.fail(BackendOp::UpdateCounter, RemoteError::Decode("boom".into()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().next_id = 1;
        backend
    }

    /// Require email confirmation before sign-in.
    pub fn set_require_confirmation(&self, required: bool) {
        self.state.lock().unwrap().require_confirmation = required;
    }

    /// Register a confirmed account and return its user.
    pub fn add_account(&self, email: &str, password: &str, name: Option<&str>) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: name.map(str::to_string),
            is_owner: false,
        };
        self.state.lock().unwrap().accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
            confirmed: true,
        });
        user
    }

    /// Mark an account as the gallery owner.
    pub fn set_owner(&self, user_id: Uuid) {
        let mut state = self.state.lock().unwrap();
        if let Some(account) = state.accounts.iter_mut().find(|a| a.user.id == user_id) {
            account.user.is_owner = true;
        }
    }

    /// Issue a live session for an existing account without a sign-in call.
    pub fn issue_session(&self, user_id: Uuid) -> Option<Session> {
        let mut state = self.state.lock().unwrap();
        let user = state
            .accounts
            .iter()
            .find(|a| a.user.id == user_id)?
            .user
            .clone();
        Some(Self::new_session(&mut state, user))
    }

    /// Invalidate every issued access token while keeping refresh tokens.
    pub fn revoke_access_tokens(&self) {
        self.state.lock().unwrap().access_tokens.clear();
    }

    /// Insert a prompt with deterministic id and timestamp. Later seeds are newer.
    pub fn seed_prompt(&self, title: &str, text: &str, owner: Option<Uuid>) -> Prompt {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        let prompt = Prompt {
            id,
            title: title.to_string(),
            text: text.to_string(),
            image_url: None,
            user_id: owner,
            username: None,
            is_owner: false,
            likes: 0,
            copy_count: 0,
            report_count: 0,
            created_at: DateTime::<Utc>::from_timestamp(SEED_EPOCH + id * 60, 0)
                .unwrap_or_default(),
        };
        state.prompts.insert(id, prompt.clone());
        prompt
    }

    /// Mutate a stored prompt in place.
    pub fn update_prompt<F: FnOnce(&mut Prompt)>(&self, id: PromptId, f: F) -> Option<Prompt> {
        let mut state = self.state.lock().unwrap();
        let prompt = state.prompts.get_mut(&id)?;
        f(prompt);
        Some(prompt.clone())
    }

    pub fn prompt(&self, id: PromptId) -> Option<Prompt> {
        self.state.lock().unwrap().prompts.get(&id).cloned()
    }

    pub fn prompt_count(&self) -> usize {
        self.state.lock().unwrap().prompts.len()
    }

    /// Insert a like row directly.
    pub fn seed_like(&self, like: Like) {
        self.state.lock().unwrap().likes.insert(like);
    }

    pub fn has_like(&self, like: &Like) -> bool {
        self.state.lock().unwrap().likes.contains(like)
    }

    pub fn like_count(&self, id: PromptId) -> u64 {
        let state = self.state.lock().unwrap();
        state.likes.iter().filter(|l| l.prompt_id == id).count() as u64
    }

    pub fn profile_name(&self, user_id: Uuid) -> Option<String> {
        self.state.lock().unwrap().profiles.get(&user_id).cloned()
    }

    /// Store an object directly.
    pub fn put_object(&self, path: &str, data: Bytes) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(path.to_string(), (data, "application/octet-stream".to_string()));
    }

    pub fn has_object(&self, path: &str) -> bool {
        self.state.lock().unwrap().objects.contains_key(path)
    }

    /// Content type of a stored object.
    pub fn object_content_type(&self, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.objects.get(path).map(|(_, ct)| ct.clone())
    }

    pub fn object_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.state.lock().unwrap().objects.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Make every call to `op` fail with `err` until cleared.
    pub fn fail(&self, op: BackendOp, err: RemoteError) {
        self.state.lock().unwrap().failures.insert(op, err);
    }

    /// Make only the next call to `op` fail.
    pub fn fail_once(&self, op: BackendOp, err: RemoteError) {
        self.state.lock().unwrap().one_shot_failures.insert(op, err);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.failures.clear();
        state.one_shot_failures.clear();
    }

    /// Every operation invoked so far, in order.
    pub fn calls(&self) -> Vec<BackendOp> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, op: BackendOp) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == op)
            .count()
    }

    /// Number of table or storage calls, ignoring identity calls.
    pub fn data_call_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.is_data_call())
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// User currently bound through [`AuthService::bind_session`].
    pub fn bound_user(&self) -> Option<Uuid> {
        self.state.lock().unwrap().bound_user
    }

    /// Record the call and return any injected failure.
    fn enter(state: &mut State, op: BackendOp) -> Result<(), RemoteError> {
        state.calls.push(op);
        if let Some(err) = state.one_shot_failures.remove(&op) {
            return Err(err);
        }
        match state.failures.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn new_session(state: &mut State, user: User) -> Session {
        state.token_seq += 1;
        let access_token = format!("access-{}-{}", user.id, state.token_seq);
        let refresh_token = format!("refresh-{}-{}", user.id, state.token_seq);
        state.access_tokens.insert(access_token.clone(), user.id);
        state.refresh_tokens.insert(refresh_token.clone(), user.id);
        Session {
            access_token,
            refresh_token,
            expires_at: Utc::now().timestamp() + TOKEN_TTL_SECS,
            user,
        }
    }

    fn user_by_id(state: &State, id: Uuid) -> Option<User> {
        state
            .accounts
            .iter()
            .find(|a| a.user.id == id)
            .map(|a| a.user.clone())
    }

    fn unauthorized(message: &str) -> RemoteError {
        RemoteError::Status {
            status: 401,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl AuthService for InMemoryBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SignUpOutcome, RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::SignUp)?;

        if state
            .accounts
            .iter()
            .any(|a| a.user.email.eq_ignore_ascii_case(email))
        {
            return Ok(SignUpOutcome::AlreadyRegistered);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: Some(display_name.to_string()).filter(|n| !n.is_empty()),
            is_owner: false,
        };
        let confirmed = !state.require_confirmation;
        state.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
            confirmed,
        });

        if confirmed {
            Ok(SignUpOutcome::Active(Self::new_session(&mut state, user)))
        } else {
            Ok(SignUpOutcome::PendingConfirmation {
                user_id: Some(user.id),
            })
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::SignIn)?;

        let account = state
            .accounts
            .iter()
            .find(|a| a.user.email.eq_ignore_ascii_case(email) && a.password == password)
            .cloned()
            .ok_or(RemoteError::InvalidCredentials)?;
        if !account.confirmed {
            return Err(RemoteError::Status {
                status: 400,
                message: "Email not confirmed".to_string(),
            });
        }
        Ok(Self::new_session(&mut state, account.user))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::Refresh)?;

        let user_id = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| Self::unauthorized("Invalid Refresh Token"))?;
        let user = Self::user_by_id(&state, user_id)
            .ok_or_else(|| Self::unauthorized("User not found"))?;
        Ok(Self::new_session(&mut state, user))
    }

    async fn current_user(&self, access_token: &str) -> Result<User, RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::CurrentUser)?;

        let user_id = *state
            .access_tokens
            .get(access_token)
            .ok_or_else(|| Self::unauthorized("invalid JWT"))?;
        Self::user_by_id(&state, user_id).ok_or_else(|| Self::unauthorized("User not found"))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::SignOut)?;
        state.access_tokens.remove(access_token);
        Ok(())
    }

    fn bind_session(&self, session: Option<&Session>) {
        self.state.lock().unwrap().bound_user = session.map(|s| s.user.id);
    }
}

#[async_trait]
impl Database for InMemoryBackend {
    async fn fetch_prompts(&self, query: &FeedQuery) -> Result<PromptPage, RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::FetchPrompts)?;

        let mut matching: Vec<Prompt> = state
            .prompts
            .values()
            .filter(|p| query.search_term().map_or(true, |term| p.matches(term)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| query.sort.compare(a, b));

        let total = matching.len() as u64;
        let prompts = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .collect();
        Ok(PromptPage { prompts, total })
    }

    async fn fetch_prompt(&self, id: PromptId) -> Result<Option<Prompt>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::FetchPrompt)?;
        Ok(state.prompts.get(&id).cloned())
    }

    async fn fetch_prompts_by_owner(&self, user_id: Uuid) -> Result<Vec<Prompt>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::FetchPromptsByOwner)?;

        let mut owned: Vec<Prompt> = state
            .prompts
            .values()
            .filter(|p| p.is_owned_by(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }

    async fn insert_prompt(&self, new_prompt: &NewPrompt) -> Result<Prompt, RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::InsertPrompt)?;

        let id = state.next_id;
        state.next_id += 1;
        let prompt = Prompt {
            id,
            title: new_prompt.title.clone(),
            text: new_prompt.text.clone(),
            image_url: new_prompt.image_url.clone(),
            user_id: Some(new_prompt.user_id),
            username: Some(new_prompt.username.clone()),
            is_owner: new_prompt.is_owner,
            likes: 0,
            copy_count: 0,
            report_count: 0,
            created_at: Utc::now(),
        };
        state.prompts.insert(id, prompt.clone());
        Ok(prompt)
    }

    async fn update_counter(
        &self,
        id: PromptId,
        update: CounterUpdate,
    ) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::UpdateCounter)?;

        let prompt = state
            .prompts
            .get_mut(&id)
            .ok_or_else(|| RemoteError::NoRowsAffected("prompts".to_string()))?;
        update.apply(prompt);
        Ok(())
    }

    async fn delete_prompt(&self, id: PromptId) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::DeletePrompt)?;

        let visible = match (state.prompts.get(&id), state.bound_user) {
            (Some(prompt), Some(user)) => prompt.is_owned_by(user),
            _ => false,
        };
        if !visible {
            return Err(RemoteError::NoRowsAffected("prompts".to_string()));
        }
        state.prompts.remove(&id);
        state.likes.retain(|l| l.prompt_id != id);
        Ok(())
    }

    async fn delete_reported_prompt(&self, id: PromptId) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::DeleteReportedPrompt)?;

        if state.prompts.remove(&id).is_none() {
            return Err(RemoteError::NoRowsAffected("prompts".to_string()));
        }
        state.likes.retain(|l| l.prompt_id != id);
        Ok(())
    }

    async fn fetch_liked_prompt_ids(&self, user_id: Uuid) -> Result<Vec<PromptId>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::FetchLikedPromptIds)?;

        let mut ids: Vec<PromptId> = state
            .likes
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.prompt_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn insert_like(&self, like: &Like) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::InsertLike)?;

        if !state.likes.insert(*like) {
            return Err(RemoteError::Conflict(
                "duplicate key value violates unique constraint \"likes_user_id_prompt_id_key\""
                    .to_string(),
            ));
        }
        Ok(())
    }

    async fn delete_like(&self, like: &Like) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::DeleteLike)?;
        state.likes.remove(like);
        Ok(())
    }

    async fn count_likes(&self, id: PromptId) -> Result<u64, RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::CountLikes)?;
        Ok(state.likes.iter().filter(|l| l.prompt_id == id).count() as u64)
    }

    async fn insert_profile(&self, user_id: Uuid, name: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::InsertProfile)?;
        state.profiles.insert(user_id, name.to_string());
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for InMemoryBackend {
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::Upload)?;

        if state.objects.contains_key(path) {
            return Err(RemoteError::Conflict("The resource already exists".to_string()));
        }
        state
            .objects
            .insert(path.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}{}", PUBLIC_URL_PREFIX, path)
    }

    fn path_from_public_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(PUBLIC_URL_PREFIX)
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    }

    async fn remove(&self, path: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        Self::enter(&mut state, BackendOp::Remove)?;
        state.objects.remove(path);
        Ok(())
    }
}
