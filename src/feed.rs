//! Prompt feed: the page of prompts currently shown.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{GalleryError, GalleryResult, RemoteResultExt};
use crate::models::{total_pages, CounterUpdate, FeedQuery, Prompt, PromptId, PromptPage};
use crate::notice::Notice;
use crate::traits::Database;

/// In-memory copy of the prompts on screen plus the total match count.
///
/// Coordinators mutate it directly so the display reflects a write before
/// (or without) a re-fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    prompts: Vec<Prompt>,
    total: u64,
}

impl Listing {
    pub fn new(prompts: Vec<Prompt>, total: u64) -> Self {
        Self { prompts, total }
    }

    pub fn get(&self, id: PromptId) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PromptId) -> Option<&mut Prompt> {
        self.prompts.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PromptId) -> bool {
        self.get(id).is_some()
    }

    /// Apply a counter write to the listed copy. Returns whether the prompt
    /// was listed.
    pub fn apply(&mut self, id: PromptId, update: CounterUpdate) -> bool {
        match self.get_mut(id) {
            Some(prompt) => {
                update.apply(prompt);
                true
            }
            None => false,
        }
    }

    pub fn set_likes(&mut self, id: PromptId, likes: u64) -> bool {
        self.apply(id, CounterUpdate::Likes(likes))
    }

    /// Drop a prompt that no longer exists remotely.
    pub fn remove(&mut self, id: PromptId) -> Option<Prompt> {
        let index = self.prompts.iter().position(|p| p.id == id)?;
        self.total = self.total.saturating_sub(1);
        Some(self.prompts.remove(index))
    }

    /// Add a prompt fetched outside the current page. It does not count
    /// towards the total.
    pub fn insert_extra(&mut self, prompt: Prompt) {
        if !self.contains(prompt.id) {
            self.prompts.push(prompt);
        }
    }

    pub fn replace(&mut self, page: PromptPage) {
        self.prompts = page.prompts;
        self.total = page.total;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prompt> {
        self.prompts.iter()
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Number of prompts matching the current search across all pages.
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Text handed to the clipboard by a copy action.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyOutcome {
    pub text: String,
    /// Whether the remote copy counter was incremented.
    pub counted: bool,
    pub notice: Notice,
}

/// Search, sort and page state plus the listing it produced.
pub struct PromptFeed<B> {
    db: Arc<B>,
    query: FeedQuery,
    listing: Listing,
    loaded: bool,
    last_error: Option<GalleryError>,
}

impl<B: Database> PromptFeed<B> {
    pub fn new(db: Arc<B>, page_size: u32) -> Self {
        Self {
            db,
            query: FeedQuery::new(page_size),
            listing: Listing::default(),
            loaded: false,
            last_error: None,
        }
    }

    pub fn query(&self) -> &FeedQuery {
        &self.query
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn listing_mut(&mut self) -> &mut Listing {
        &mut self.listing
    }

    pub fn page(&self) -> u32 {
        self.query.page
    }

    pub fn total_pages(&self) -> u64 {
        total_pages(self.listing.total(), self.query.limit())
    }

    /// Whether at least one fetch has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether the listing reflects the current query.
    fn is_current(&self) -> bool {
        self.loaded && self.last_error.is_none()
    }

    /// Error of the most recent failed fetch, cleared by the next success.
    pub fn last_error(&self) -> Option<&GalleryError> {
        self.last_error.as_ref()
    }

    /// Re-fetch the current page. A failed fetch keeps the previous listing
    /// and total, records the error and returns `false`.
    pub async fn refresh(&mut self) -> bool {
        debug!(
            "Fetching feed page {} (sort={}, search={:?})",
            self.query.page, self.query.sort, self.query.search
        );
        match self.db.fetch_prompts(&self.query).await.during("loading prompts") {
            Ok(page) => {
                self.listing.replace(page);
                self.loaded = true;
                self.last_error = None;
                true
            }
            Err(e) => {
                warn!("Feed fetch failed, keeping previous results: {}", e);
                self.last_error = Some(e);
                false
            }
        }
    }

    /// Change the search term and go back to page 1. No fetch when the
    /// term is unchanged and the listing is current.
    pub async fn set_search(&mut self, term: &str) -> bool {
        if self.query.search == term && self.is_current() {
            return true;
        }
        self.query.search = term.to_string();
        self.query.page = 1;
        self.refresh().await
    }

    /// Change the ordering and go back to page 1.
    pub async fn set_sort(&mut self, sort: crate::models::SortKey) -> bool {
        if self.query.sort == sort && self.is_current() {
            return true;
        }
        self.query.sort = sort;
        self.query.page = 1;
        self.refresh().await
    }

    /// Move to `page`, clamped to the known page range.
    pub async fn set_page(&mut self, page: u32) -> bool {
        let mut page = page.max(1);
        if self.loaded {
            let last = self.total_pages().max(1);
            page = page.min(u32::try_from(last).unwrap_or(u32::MAX));
        }
        if self.query.page == page && self.is_current() {
            return true;
        }
        self.query.page = page;
        self.refresh().await
    }

    /// Make sure `id` is present in the listing, fetching it on its own when
    /// it is not on the current page.
    pub async fn ensure_listed(&mut self, id: PromptId) -> GalleryResult<&Prompt> {
        if !self.listing.contains(id) {
            let prompt = self
                .db
                .fetch_prompt(id)
                .await
                .during("loading prompt")?
                .ok_or(GalleryError::PromptNotFound { id })?;
            self.listing.insert_extra(prompt);
        }
        self.listing
            .get(id)
            .ok_or(GalleryError::PromptNotFound { id })
    }

    /// Hand out the prompt text and bump its copy counter. The copy itself
    /// never fails; the local count only moves when the write lands.
    pub async fn record_copy(&mut self, id: PromptId) -> GalleryResult<CopyOutcome> {
        let prompt = self.ensure_listed(id).await?;
        let text = prompt.text.clone();
        let update = CounterUpdate::Copies(prompt.copy_count + 1);

        let counted = match self.db.update_counter(id, update).await {
            Ok(()) => {
                self.listing.apply(id, update);
                true
            }
            Err(e) => {
                warn!("Copy count update for prompt {} failed: {}", id, e);
                false
            }
        };

        Ok(CopyOutcome {
            text,
            counted,
            notice: Notice::success("Copied to clipboard!"),
        })
    }
}
