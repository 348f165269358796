//! Where the token pair lives between runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use domain::TokenPair;

use crate::error::ClientResult;

/// Persistent slot for the current token pair.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> ClientResult<Option<TokenPair>>;

    async fn save(&self, tokens: &TokenPair) -> ClientResult<()>;

    async fn clear(&self) -> ClientResult<()>;
}

/// Tokens kept for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> ClientResult<Option<TokenPair>> {
        Ok(self.tokens.lock().await.clone())
    }

    async fn save(&self, tokens: &TokenPair) -> ClientResult<()> {
        *self.tokens.lock().await = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        self.tokens.lock().await.take();
        Ok(())
    }
}

/// Tokens stored as JSON in a file readable only by the current user.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/diary/session.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("diary").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> ClientResult<Option<TokenPair>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(tokens) => Ok(Some(tokens)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Ignoring unreadable session file: {}", e);
                Ok(None)
            }
        }
    }

    async fn save(&self, tokens: &TokenPair) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(tokens)?;

        // Written beside the target and renamed over it, so readers see
        // either the old pair or the new one.
        let staging = self.staging_path();
        remove_if_present(&staging).await?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&staging).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        remove_if_present(&self.path).await
    }
}

async fn remove_if_present(path: &Path) -> ClientResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TokenPair {
        TokenPair::bearer("access".into(), "refresh".into(), 900, 604_800)
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryTokenStore::new();
        assert!(store.load().await.unwrap().is_none());

        store.save(&pair()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(pair()));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.load().await.unwrap().is_none());
        store.save(&pair()).await.unwrap();
        assert!(store.path().exists());
        assert_eq!(store.load().await.unwrap(), Some(pair()));

        store.clear().await.unwrap();
        assert!(!store.path().exists());
        // clearing twice is fine
        store.clear().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));
        store.save(&pair()).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_replaces_world_readable_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        // leftover from an interrupted save
        std::fs::write(dir.path().join("session.json.tmp"), b"partial").unwrap();

        let store = FileTokenStore::new(&path);
        store.save(&pair()).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().await.unwrap(), Some(pair()));
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("session.json")]);
    }

    #[tokio::test]
    async fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = FileTokenStore::new(path);
        assert!(store.load().await.unwrap().is_none());
    }
}
