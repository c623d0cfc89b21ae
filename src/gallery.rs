//! Gallery facade.
//!
//! Owns one session subscription and every coordinator. Actions read the
//! current user from the [`SessionProvider`], and a session change reloads
//! the like coordinator before the next action runs.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::GalleryConfig;
use crate::error::{GalleryError, GalleryResult};
use crate::feed::{CopyOutcome, PromptFeed};
use crate::likes::{LikeCoordinator, LikeToggle};
use crate::models::{Prompt, PromptId, SignUpOutcome, SortKey, User};
use crate::moderation::{ModerationGate, ReportOutcome};
use crate::profile::{Deleted, ProfileView};
use crate::session::{SessionProvider, SessionSubscription};
use crate::submission::{SubmissionFlow, SubmissionForm, Submitted};
use crate::traits::{Backend, SessionStore};

pub struct Gallery<B> {
    session: SessionProvider<B>,
    subscription: SessionSubscription,
    feed: PromptFeed<B>,
    likes: LikeCoordinator<B>,
    moderation: ModerationGate<B>,
    submission: SubmissionFlow<B>,
    profile: ProfileView<B>,
}

impl<B: Backend> Gallery<B> {
    pub fn new(backend: Arc<B>, store: Box<dyn SessionStore>, config: &GalleryConfig) -> Self {
        let session = SessionProvider::new(Arc::clone(&backend), store);
        let subscription = session.subscribe();
        Self {
            feed: PromptFeed::new(Arc::clone(&backend), config.page_size),
            likes: LikeCoordinator::new(Arc::clone(&backend)),
            moderation: ModerationGate::new(Arc::clone(&backend), config.delete_path),
            submission: SubmissionFlow::new(Arc::clone(&backend)),
            profile: ProfileView::new(backend),
            session,
            subscription,
        }
    }

    /// Restore the persisted session, load the user's likes and the first
    /// page. A failed feed fetch is not an error here.
    pub async fn start(&mut self) -> Option<User> {
        let user = self.session.restore().await;
        self.sync_session().await;
        self.feed.refresh().await;
        user
    }

    /// Apply a pending session change to the like coordinator.
    pub async fn sync_session(&mut self) {
        if !self.subscription.has_changed() {
            return;
        }
        let snapshot = self.subscription.current();
        debug!("Session changed: {:?}", snapshot.event);
        if let Err(e) = self.likes.reload(snapshot.user()).await {
            warn!("Could not load likes: {}", e);
        }
    }

    /// Current user after refreshing a stale token.
    async fn active_user(&mut self) -> Option<User> {
        let user = match self.session.ensure_fresh().await {
            Ok(user) => user,
            Err(e) => {
                warn!("{}", e);
                None
            }
        };
        self.sync_session().await;
        user
    }

    pub fn session(&self) -> &SessionProvider<B> {
        &self.session
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.current_user()
    }

    pub fn feed(&self) -> &PromptFeed<B> {
        &self.feed
    }

    pub fn likes(&self) -> &LikeCoordinator<B> {
        &self.likes
    }

    pub fn profile(&self) -> &ProfileView<B> {
        &self.profile
    }

    pub fn is_liked(&self, id: PromptId) -> bool {
        self.likes.is_liked(id)
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> GalleryResult<User> {
        let user = self.session.sign_in(email, password).await?;
        self.sync_session().await;
        Ok(user)
    }

    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> GalleryResult<SignUpOutcome> {
        let outcome = self.session.sign_up(email, password, display_name).await?;
        self.sync_session().await;
        Ok(outcome)
    }

    pub async fn sign_out(&mut self) -> GalleryResult<()> {
        let result = self.session.sign_out().await;
        self.sync_session().await;
        result
    }

    /// Show the page matching `search`, `sort` and `page`. Returns whether
    /// the fetch succeeded.
    pub async fn browse(&mut self, search: &str, sort: SortKey, page: u32) -> bool {
        let mut ok = self.feed.set_search(search).await;
        ok &= self.feed.set_sort(sort).await;
        ok &= self.feed.set_page(page).await;
        ok
    }

    pub async fn toggle_like(&mut self, id: PromptId) -> GalleryResult<LikeToggle> {
        let user = self.active_user().await;
        if user.is_some() {
            self.feed.ensure_listed(id).await?;
        }
        self.likes
            .toggle_like(user.as_ref(), self.feed.listing_mut(), id)
            .await
    }

    pub async fn report(&mut self, id: PromptId) -> GalleryResult<ReportOutcome> {
        self.feed.ensure_listed(id).await?;
        self.moderation.report(self.feed.listing_mut(), id).await
    }

    pub async fn copy(&mut self, id: PromptId) -> GalleryResult<CopyOutcome> {
        self.feed.record_copy(id).await
    }

    /// Submit `form`; the feed is re-fetched so the new prompt shows up.
    pub async fn submit(&mut self, form: &mut SubmissionForm) -> GalleryResult<Submitted> {
        let user = self.active_user().await;
        let submitted = self.submission.submit(user.as_ref(), form).await?;
        self.feed.refresh().await;
        Ok(submitted)
    }

    pub async fn my_prompts(&mut self) -> GalleryResult<&[Prompt]> {
        let user = self.active_user().await;
        self.profile.load(user.as_ref()).await
    }

    /// Delete one of the current user's prompts and drop it from the feed.
    pub async fn delete_own(&mut self, id: PromptId) -> GalleryResult<Deleted> {
        let user = self.active_user().await;
        let deleted = self.profile.delete_prompt(user.as_ref(), id).await?;
        self.feed.listing_mut().remove(id);
        Ok(deleted)
    }

    /// Retry queued like-count reconciliations. Returns how many are still
    /// pending.
    pub async fn reconcile(&mut self) -> usize {
        self.likes.reconcile(self.feed.listing_mut()).await;
        self.likes.pending_reconciliation().len()
    }

    /// Error of the last failed feed fetch.
    pub fn feed_error(&self) -> Option<&GalleryError> {
        self.feed.last_error()
    }
}
