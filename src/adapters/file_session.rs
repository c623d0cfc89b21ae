//! File-based session store.
//!
//! Sessions are stored as pretty-printed JSON in
//! `~/.prompt-gallery/session.json` unless another path is configured.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::models::Session;
use crate::traits::{SessionStore, SessionStoreError};

const SESSION_DIR: &str = ".prompt-gallery";
const SESSION_FILE: &str = "session.json";

/// Session store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store under the user's home directory.
    pub fn new() -> Result<Self, SessionStoreError> {
        dirs::home_dir()
            .map(|home| Self::with_path(home.join(SESSION_DIR).join(SESSION_FILE)))
            .ok_or_else(|| {
                SessionStoreError::Io("Failed to determine home directory".to_string())
            })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<Session>, SessionStoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionStoreError::LoadFailed(e.to_string())),
        };
        serde_json::from_reader(BufReader::new(file))
            .map(Some)
            .map_err(|e| SessionStoreError::Serialization(e.to_string()))
    }

    fn write(&self, session: &Session) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SessionStoreError::Io(e.to_string()))?;
        }

        let file = File::create(&self.path)
            .map_err(|e| SessionStoreError::SaveFailed(e.to_string()))?;
        restrict_permissions(&file);

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, session)
            .map_err(|e| SessionStoreError::Serialization(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| SessionStoreError::SaveFailed(e.to_string()))
    }

    fn remove(&self) -> Result<(), SessionStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionStoreError::ClearFailed(e.to_string())),
        }
    }
}

/// Tokens are bearer credentials; keep the file owner-readable only.
#[cfg(unix)]
fn restrict_permissions(file: &File) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Could not restrict session file permissions: {}", e);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &File) {}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        self.read()
    }

    async fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        self.write(session)
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        self.remove()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn create_test_store(temp_dir: &TempDir) -> FileSessionStore {
        FileSessionStore::with_path(temp_dir.path().join(SESSION_DIR).join(SESSION_FILE))
    }

    fn sample_session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 1_900_000_000,
            user: User {
                id: Uuid::new_v4(),
                email: "ana@example.com".to_string(),
                display_name: Some("Ana".to_string()),
                is_owner: false,
            },
        }
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_creates_parent_dir_and_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);
        let session = sample_session();

        store.save(&session).await.unwrap();
        assert!(store.path().exists());
        assert_eq!(store.load().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_clear_removes_file_and_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);

        store.save(&sample_session()).await.unwrap();
        store.clear().await.unwrap();
        assert!(!store.path().exists());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not valid json").unwrap();

        assert!(matches!(
            store.load().await,
            Err(SessionStoreError::Serialization(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);
        store.save(&sample_session()).await.unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
