//! Like coordinator.
//!
//! A like is two remote writes: the `likes` relation row and the
//! denormalised `likes` counter on the prompt. The local liked-set and the
//! displayed count change first and are rolled back when the first write
//! fails. When the counter write fails the relation write is undone; if
//! that also fails the prompt is queued for [`LikeCoordinator::reconcile`].

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{GalleryError, GalleryResult, RemoteError, RemoteResultExt};
use crate::feed::Listing;
use crate::models::{CounterUpdate, Like, PromptId, User};
use crate::notice::Notice;
use crate::traits::Database;

/// Result of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    Liked { likes: u64 },
    Unliked { likes: u64 },
    /// The relation already existed remotely; only local state was fixed.
    AlreadyLiked { likes: u64 },
}

impl LikeToggle {
    pub fn likes(&self) -> u64 {
        match self {
            LikeToggle::Liked { likes }
            | LikeToggle::Unliked { likes }
            | LikeToggle::AlreadyLiked { likes } => *likes,
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            LikeToggle::Liked { .. } => Notice::success("❤️"),
            LikeToggle::Unliked { .. } => Notice::success("Like removed"),
            LikeToggle::AlreadyLiked { .. } => Notice::error("You already liked this prompt!"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Like,
    Unlike,
}

impl Direction {
    fn reverse(self) -> Self {
        match self {
            Direction::Like => Direction::Unlike,
            Direction::Unlike => Direction::Like,
        }
    }

    fn operation(self) -> &'static str {
        match self {
            Direction::Like => "liking prompt",
            Direction::Unlike => "unliking prompt",
        }
    }

    fn completed(self) -> &'static str {
        match self {
            Direction::Like => "like recorded",
            Direction::Unlike => "like removed",
        }
    }
}

/// The current user's liked-set and the toggle protocol.
pub struct LikeCoordinator<B> {
    db: Arc<B>,
    user_id: Option<Uuid>,
    liked: HashSet<PromptId>,
    pending: BTreeSet<PromptId>,
}

impl<B: Database> LikeCoordinator<B> {
    pub fn new(db: Arc<B>) -> Self {
        Self {
            db,
            user_id: None,
            liked: HashSet::new(),
            pending: BTreeSet::new(),
        }
    }

    /// User whose likes are loaded.
    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    /// Replace the liked-set with `user`'s likes; empty when signed out.
    /// On failure the set stays empty.
    pub async fn reload(&mut self, user: Option<&User>) -> GalleryResult<()> {
        self.liked.clear();
        self.user_id = user.map(|u| u.id);

        let Some(user) = user else {
            debug!("No user, liked-set cleared");
            return Ok(());
        };
        let ids = self
            .db
            .fetch_liked_prompt_ids(user.id)
            .await
            .during("loading likes")?;
        info!("Loaded {} likes for {}", ids.len(), user.email);
        self.liked.extend(ids);
        Ok(())
    }

    pub fn is_liked(&self, id: PromptId) -> bool {
        self.liked.contains(&id)
    }

    /// Liked prompt ids in ascending order.
    pub fn liked_ids(&self) -> Vec<PromptId> {
        let mut ids: Vec<PromptId> = self.liked.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Prompts whose counter may disagree with the relation.
    pub fn pending_reconciliation(&self) -> Vec<PromptId> {
        self.pending.iter().copied().collect()
    }

    /// Like `id` if it is not liked, unlike it otherwise.
    ///
    /// `listing` must contain the prompt; its displayed count is updated in
    /// place.
    pub async fn toggle_like(
        &mut self,
        user: Option<&User>,
        listing: &mut Listing,
        id: PromptId,
    ) -> GalleryResult<LikeToggle> {
        let user = user.ok_or(GalleryError::Unauthenticated {
            action: "like prompts",
        })?;
        if self.user_id != Some(user.id) {
            self.reload(Some(user)).await?;
        }

        let previous = listing
            .get(id)
            .map(|p| p.likes)
            .ok_or(GalleryError::PromptNotFound { id })?;
        let like = Like {
            user_id: user.id,
            prompt_id: id,
        };
        let direction = if self.liked.contains(&id) {
            Direction::Unlike
        } else {
            Direction::Like
        };
        let target = match direction {
            Direction::Like => previous + 1,
            Direction::Unlike => previous.saturating_sub(1),
        };

        // Optimistic local update.
        self.set_local(direction, id);
        listing.set_likes(id, target);

        let relation = match direction {
            Direction::Like => self.db.insert_like(&like).await,
            Direction::Unlike => self.db.delete_like(&like).await,
        };
        match relation {
            Ok(()) => {}
            Err(RemoteError::Conflict(_)) if direction == Direction::Like => {
                debug!("Like {} already exists remotely", id);
                listing.set_likes(id, previous);
                return Ok(LikeToggle::AlreadyLiked { likes: previous });
            }
            Err(e) => {
                self.set_local(direction.reverse(), id);
                listing.set_likes(id, previous);
                return Err(GalleryError::remote(direction.operation(), e));
            }
        }

        if let Err(counter_err) = self.db.update_counter(id, CounterUpdate::Likes(target)).await {
            warn!(
                "Like counter write for prompt {} failed, undoing relation: {}",
                id, counter_err
            );
            listing.set_likes(id, previous);

            let undo = match direction {
                Direction::Like => self.db.delete_like(&like).await,
                Direction::Unlike => self.db.insert_like(&like).await,
            };
            return match undo {
                Ok(()) | Err(RemoteError::Conflict(_)) => {
                    self.set_local(direction.reverse(), id);
                    Err(GalleryError::remote(direction.operation(), counter_err))
                }
                Err(undo_err) => {
                    warn!(
                        "Could not undo like relation for prompt {}, queued for reconciliation: {}",
                        id, undo_err
                    );
                    self.pending.insert(id);
                    Err(GalleryError::PartialFailure {
                        operation: direction.operation(),
                        completed: direction.completed(),
                        source: counter_err,
                        compensated: false,
                    })
                }
            };
        }

        Ok(match direction {
            Direction::Like => LikeToggle::Liked { likes: target },
            Direction::Unlike => LikeToggle::Unliked { likes: target },
        })
    }

    /// Recompute queued counters from the relation and write them back.
    /// Prompts that fail stay queued. Returns how many were fixed.
    pub async fn reconcile(&mut self, listing: &mut Listing) -> usize {
        let mut fixed = 0;
        for id in self.pending_reconciliation() {
            let count = match self.db.count_likes(id).await {
                Ok(count) => count,
                Err(e) => {
                    warn!("Could not count likes for prompt {}: {}", id, e);
                    continue;
                }
            };
            match self.db.update_counter(id, CounterUpdate::Likes(count)).await {
                Ok(()) => {
                    info!("Reconciled like count of prompt {} to {}", id, count);
                    listing.set_likes(id, count);
                    self.pending.remove(&id);
                    fixed += 1;
                }
                Err(RemoteError::NoRowsAffected(_)) => {
                    debug!("Prompt {} is gone, dropping from reconciliation", id);
                    self.pending.remove(&id);
                }
                Err(e) => warn!("Could not write like count of prompt {}: {}", id, e),
            }
        }
        fixed
    }

    fn set_local(&mut self, direction: Direction, id: PromptId) {
        match direction {
            Direction::Like => self.liked.insert(id),
            Direction::Unlike => self.liked.remove(&id),
        };
    }
}
