//! New prompt submission: validate, upload the optional image, insert.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{GalleryError, GalleryResult, RemoteResultExt};
use crate::models::{NewPrompt, Prompt, User};
use crate::notice::{Notice, Route};
use crate::traits::{Database, ObjectStorage};

const REQUIRED_FIELDS_MESSAGE: &str = "Title and prompt text are required!";

/// Content type for a lowercase or mixed-case file extension.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Object path for an upload: `{user}/{millis}.{ext}`, or `{user}/{millis}`
/// when the file has no extension.
pub fn storage_path(user_id: Uuid, millis: i64, extension: Option<&str>) -> String {
    match extension.filter(|e| !e.is_empty()) {
        Some(ext) => format!("{}/{}.{}", user_id, millis, ext),
        None => format!("{}/{}", user_id, millis),
    }
}

/// An image selected for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl ImageUpload {
    /// Build an upload, inferring the content type from the file name when
    /// none is given.
    pub fn new(file_name: impl Into<String>, content_type: Option<&str>, data: Bytes) -> Self {
        let file_name = file_name.into();
        let content_type = match content_type.filter(|c| !c.is_empty()) {
            Some(ct) => ct.to_string(),
            None => {
                let ext = Path::new(&file_name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default();
                content_type_for(ext).to_string()
            }
        };
        Self {
            file_name,
            content_type,
            data,
        }
    }

    /// Read an image from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> GalleryResult<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|e| {
            GalleryError::validation(format!("Could not read image {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(Self::new(file_name, None, Bytes::from(data)))
    }

    /// Extension of the original file name, if any.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
    }
}

/// The submission form as the user filled it in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionForm {
    pub title: String,
    pub text: String,
    pub image: Option<ImageUpload>,
}

impl SubmissionForm {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    /// Both title and text must be non-blank after trimming.
    pub fn validate(&self) -> GalleryResult<()> {
        if self.title.trim().is_empty() || self.text.trim().is_empty() {
            return Err(GalleryError::validation(REQUIRED_FIELDS_MESSAGE));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.text.is_empty() && self.image.is_none()
    }
}

/// A successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    pub prompt: Prompt,
    pub redirect: Route,
    pub notice: Notice,
}

pub struct SubmissionFlow<B> {
    backend: Arc<B>,
}

impl<B: Database + ObjectStorage> SubmissionFlow<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Submit `form` as `user`.
    ///
    /// The form is cleared only on success. When the insert fails after the
    /// image was uploaded, the object is removed again and the error is a
    /// [`GalleryError::PartialFailure`].
    pub async fn submit(
        &self,
        user: Option<&User>,
        form: &mut SubmissionForm,
    ) -> GalleryResult<Submitted> {
        let user = user.ok_or(GalleryError::Unauthenticated {
            action: "submit prompts",
        })?;
        form.validate()?;

        let mut uploaded = None;
        if let Some(image) = &form.image {
            let path = storage_path(
                user.id,
                chrono::Utc::now().timestamp_millis(),
                image.extension(),
            );
            debug!("Uploading {} ({} bytes) to {}", image.file_name, image.data.len(), path);
            self.backend
                .upload(&path, image.data.clone(), &image.content_type)
                .await
                .during("uploading image")?;
            uploaded = Some(path);
        }

        let new_prompt = NewPrompt {
            title: form.title.trim().to_string(),
            text: form.text.trim().to_string(),
            image_url: uploaded.as_deref().map(|p| self.backend.public_url(p)),
            user_id: user.id,
            username: user.display_username().to_string(),
            is_owner: user.is_owner,
        };

        let prompt = match self.backend.insert_prompt(&new_prompt).await {
            Ok(prompt) => prompt,
            Err(source) => {
                let Some(path) = uploaded else {
                    return Err(GalleryError::remote("submitting prompt", source));
                };
                let compensated = match self.backend.remove(&path).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Failed to remove uploaded image {}: {}", path, e);
                        false
                    }
                };
                return Err(GalleryError::PartialFailure {
                    operation: "submitting prompt",
                    completed: "image upload",
                    source,
                    compensated,
                });
            }
        };

        info!("Prompt {} submitted by {}", prompt.id, user.email);
        form.clear();
        Ok(Submitted {
            prompt,
            redirect: Route::Gallery,
            notice: Notice::success("Prompt submitted successfully!"),
        })
    }
}
