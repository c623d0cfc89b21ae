//! Client configuration.
//!
//! Use the builder methods in code and [`GalleryConfig::from_env`] in the
//! binary.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `PROMPT_GALLERY_URL` | required |
//! | `PROMPT_GALLERY_ANON_KEY` | required |
//! | `PROMPT_GALLERY_BUCKET` | `prompt-images` |
//! | `PROMPT_GALLERY_PAGE_SIZE` | `9` |
//! | `PROMPT_GALLERY_TIMEOUT_SECS` | `15` |
//! | `PROMPT_GALLERY_PRIVILEGED_DELETE` | off |
//! | `PROMPT_GALLERY_SESSION_FILE` | `~/.prompt-gallery/session.json` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{GalleryError, GalleryResult};
use crate::models::DEFAULT_PAGE_SIZE;
use crate::moderation::DeletePath;

pub const ENV_URL: &str = "PROMPT_GALLERY_URL";
pub const ENV_ANON_KEY: &str = "PROMPT_GALLERY_ANON_KEY";
pub const ENV_BUCKET: &str = "PROMPT_GALLERY_BUCKET";
pub const ENV_PAGE_SIZE: &str = "PROMPT_GALLERY_PAGE_SIZE";
pub const ENV_TIMEOUT_SECS: &str = "PROMPT_GALLERY_TIMEOUT_SECS";
pub const ENV_PRIVILEGED_DELETE: &str = "PROMPT_GALLERY_PRIVILEGED_DELETE";
pub const ENV_SESSION_FILE: &str = "PROMPT_GALLERY_SESSION_FILE";

/// Storage bucket holding prompt images.
pub const DEFAULT_BUCKET: &str = "prompt-images";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Settings for connecting to the hosted backend.
///
/// # Example
///
/// ```ignore
/// let config = GalleryConfig::new("https://project.example.co", "anon-key")
///     .with_page_size(12)
///     .with_delete_path(DeletePath::Privileged);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
    /// Project base URL, without a trailing slash
    pub url: String,
    /// Public anon key sent as `apikey`
    pub anon_key: String,
    pub bucket: String,
    pub page_size: u32,
    /// Per-request timeout applied by the HTTP adapter
    pub timeout: Duration,
    /// How reported prompts are deleted
    pub delete_path: DeletePath,
    /// Session file override
    pub session_file: Option<PathBuf>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            bucket: DEFAULT_BUCKET.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: DEFAULT_TIMEOUT,
            delete_path: DeletePath::Direct,
            session_file: None,
        }
    }
}

impl GalleryConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self::default()
            .with_url(url)
            .with_anon_key(anon_key)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_anon_key(mut self, anon_key: impl Into<String>) -> Self {
        self.anon_key = anon_key.into();
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_delete_path(mut self, delete_path: DeletePath) -> Self {
        self.delete_path = delete_path;
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// Read the `PROMPT_GALLERY_*` variables and validate the result.
    pub fn from_env() -> GalleryResult<Self> {
        let mut config = Self::default()
            .with_url(env_string(ENV_URL).unwrap_or_default())
            .with_anon_key(env_string(ENV_ANON_KEY).unwrap_or_default());

        if let Some(bucket) = env_string(ENV_BUCKET) {
            config = config.with_bucket(bucket);
        }
        if let Some(page_size) = env_parse::<u32>(ENV_PAGE_SIZE)? {
            config = config.with_page_size(page_size);
        }
        if let Some(secs) = env_parse::<u64>(ENV_TIMEOUT_SECS)? {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(flag) = env_string(ENV_PRIVILEGED_DELETE) {
            config = config.with_delete_path(if parse_flag(&flag) {
                DeletePath::Privileged
            } else {
                DeletePath::Direct
            });
        }
        if let Some(path) = env_string(ENV_SESSION_FILE) {
            config = config.with_session_file(path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the backend can be addressed at all.
    pub fn validate(&self) -> GalleryResult<()> {
        if self.url.is_empty() {
            return Err(GalleryError::config(format!("{} is not set", ENV_URL)));
        }
        if !(self.url.starts_with("https://") || self.url.starts_with("http://")) {
            return Err(GalleryError::config(format!(
                "{} must start with http:// or https://, got '{}'",
                ENV_URL, self.url
            )));
        }
        if self.anon_key.is_empty() {
            return Err(GalleryError::config(format!("{} is not set", ENV_ANON_KEY)));
        }
        if self.bucket.is_empty() {
            return Err(GalleryError::config("bucket name is empty"));
        }
        if self.page_size == 0 {
            return Err(GalleryError::config("page size must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(GalleryError::config("timeout must be at least 1 second"));
        }
        Ok(())
    }
}

/// Non-empty, trimmed variable value.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> GalleryResult<Option<T>> {
    match env_string(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| GalleryError::config(format!("{}='{}' is not a valid number", key, raw))),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
