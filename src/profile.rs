//! The signed-in user's own prompts.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::{GalleryError, GalleryResult, RemoteResultExt};
use crate::models::{Prompt, PromptId, User};
use crate::moderation::{remove_image, ImageCleanup};
use crate::notice::Notice;
use crate::traits::{Database, ObjectStorage};

/// Result of deleting one of the user's prompts.
#[derive(Debug, Clone, PartialEq)]
pub struct Deleted {
    pub prompt: Prompt,
    pub image: ImageCleanup,
    pub notice: Notice,
}

pub struct ProfileView<B> {
    backend: Arc<B>,
    owner: Option<Uuid>,
    prompts: Vec<Prompt>,
}

impl<B: Database + ObjectStorage> ProfileView<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            owner: None,
            prompts: Vec::new(),
        }
    }

    /// Prompts loaded by the last [`ProfileView::load`], newest first.
    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    /// Load `user`'s prompts.
    pub async fn load(&mut self, user: Option<&User>) -> GalleryResult<&[Prompt]> {
        let user = user.ok_or(GalleryError::Unauthenticated {
            action: "view your profile",
        })?;
        let mut prompts = self
            .backend
            .fetch_prompts_by_owner(user.id)
            .await
            .during("loading your prompts")?;
        prompts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        self.owner = Some(user.id);
        self.prompts = prompts;
        Ok(&self.prompts)
    }

    /// Delete one of `user`'s prompts, then its image.
    pub async fn delete_prompt(&mut self, user: Option<&User>, id: PromptId) -> GalleryResult<Deleted> {
        let user = user.ok_or(GalleryError::Unauthenticated {
            action: "delete prompts",
        })?;

        let prompt = match self.prompts.iter().find(|p| p.id == id) {
            Some(prompt) if self.owner == Some(user.id) => prompt.clone(),
            _ => self
                .backend
                .fetch_prompt(id)
                .await
                .during("loading prompt")?
                .ok_or(GalleryError::PromptNotFound { id })?,
        };
        if !prompt.is_owned_by(user.id) {
            return Err(GalleryError::NotOwner { id });
        }

        self.backend
            .delete_prompt(id)
            .await
            .during("deleting prompt")?;
        info!("Prompt {} deleted by its owner", id);

        let image = remove_image(self.backend.as_ref(), prompt.image_url.as_deref()).await;
        self.prompts.retain(|p| p.id != id);
        Ok(Deleted {
            prompt,
            image,
            notice: Notice::success("Prompt deleted successfully!"),
        })
    }
}
