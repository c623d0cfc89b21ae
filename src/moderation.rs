//! Community moderation: report counting and threshold deletion.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{GalleryError, GalleryResult, RemoteResultExt};
use crate::feed::Listing;
use crate::models::{CounterUpdate, PromptId};
use crate::notice::Notice;
use crate::traits::{Database, ObjectStorage};

/// Report count at which a prompt is removed.
pub const REPORT_DELETE_THRESHOLD: u64 = 10;

/// How a reported prompt is deleted.
///
/// Row-level security normally only lets owners delete their rows, so
/// deployments that enforce it expose a privileged remote procedure instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePath {
    /// Plain table delete.
    #[default]
    Direct,
    /// `rpc/delete_reported_prompt`.
    Privileged,
}

/// What happened to a deleted prompt's stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageCleanup {
    NoImage,
    /// The URL does not point into the configured bucket.
    NotStored,
    Removed,
    /// Removal failed; the object is left behind.
    Orphaned { path: String },
}

/// Result of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Reported { report_count: u64 },
    Deleted { image: ImageCleanup },
}

impl ReportOutcome {
    pub fn notice(&self) -> Notice {
        match self {
            ReportOutcome::Reported { .. } => Notice::success("Prompt reported"),
            ReportOutcome::Deleted { .. } => Notice::success("Prompt deleted due to reports"),
        }
    }
}

/// Best-effort removal of the object behind a prompt's public image URL.
pub(crate) async fn remove_image<S>(storage: &S, image_url: Option<&str>) -> ImageCleanup
where
    S: ObjectStorage + ?Sized,
{
    let Some(url) = image_url.filter(|u| !u.is_empty()) else {
        return ImageCleanup::NoImage;
    };
    let Some(path) = storage.path_from_public_url(url) else {
        warn!("Image URL is not in the storage bucket, leaving it: {}", url);
        return ImageCleanup::NotStored;
    };
    match storage.remove(&path).await {
        Ok(()) => {
            debug!("Removed image {}", path);
            ImageCleanup::Removed
        }
        Err(e) => {
            warn!("Failed to remove image {}, object orphaned: {}", path, e);
            ImageCleanup::Orphaned { path }
        }
    }
}

/// Reports prompts and deletes them once enough reports accumulate.
///
/// Reporting does not require a signed-in user.
pub struct ModerationGate<B> {
    backend: Arc<B>,
    delete_path: DeletePath,
}

impl<B: Database + ObjectStorage> ModerationGate<B> {
    pub fn new(backend: Arc<B>, delete_path: DeletePath) -> Self {
        Self {
            backend,
            delete_path,
        }
    }

    pub fn delete_path(&self) -> DeletePath {
        self.delete_path
    }

    /// Add one report to a listed prompt.
    ///
    /// Below the threshold the new count is written and mirrored into
    /// `listing`. At the threshold the prompt is deleted, its image removed
    /// best-effort and the prompt dropped from `listing`. On failure the
    /// listing is left untouched.
    pub async fn report(&self, listing: &mut Listing, id: PromptId) -> GalleryResult<ReportOutcome> {
        let prompt = listing.get(id).ok_or(GalleryError::PromptNotFound { id })?;
        let report_count = prompt.report_count + 1;
        let image_url = prompt.image_url.clone();

        if report_count < REPORT_DELETE_THRESHOLD {
            let update = CounterUpdate::Reports(report_count);
            self.backend
                .update_counter(id, update)
                .await
                .during("reporting prompt")?;
            listing.apply(id, update);
            info!("Prompt {} reported ({} reports)", id, report_count);
            return Ok(ReportOutcome::Reported { report_count });
        }

        let deleted = match self.delete_path {
            DeletePath::Direct => self.backend.delete_prompt(id).await,
            DeletePath::Privileged => self.backend.delete_reported_prompt(id).await,
        };
        deleted.during("deleting reported prompt")?;
        info!("Prompt {} deleted after {} reports", id, report_count);

        let image = remove_image(self.backend.as_ref(), image_url.as_deref()).await;
        listing.remove(id);
        Ok(ReportOutcome::Deleted { image })
    }
}
