//! Result type alias for gallery operations.

use super::gallery_error::GalleryError;
use super::remote::RemoteError;

/// Type alias for Results using GalleryError.
pub type GalleryResult<T> = Result<T, GalleryError>;

/// Extension trait naming the operation a remote call belonged to.
pub trait RemoteResultExt<T> {
    /// Wrap a [`RemoteError`] into [`GalleryError::Remote`].
    ///
    /// ```ignore
    /// let prompt = db.fetch_prompt(id).await.during("loading prompt")?;
    /// ```
    fn during(self, operation: &'static str) -> GalleryResult<T>;
}

impl<T> RemoteResultExt<T> for Result<T, RemoteError> {
    fn during(self, operation: &'static str) -> GalleryResult<T> {
        self.map_err(|source| GalleryError::remote(operation, source))
    }
}
