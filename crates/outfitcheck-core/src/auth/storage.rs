//! Persistent storage for the bearer token.
//!
//! The token is a single string under a fixed key. `TokenVault` is what the
//! rest of the crate talks to: it owns one backend and funnels every access
//! through an async mutex, so a login racing a logout resolves in call order
//! instead of last-write-wins.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use keyring::Entry;
use tokio::sync::Mutex;
use tracing::debug;

/// Key the token is stored under, in every backend
pub const TOKEN_KEY: &str = "jwt_token";

/// Keychain service name
const SERVICE_NAME: &str = "outfitcheck";

/// A string-in, string-out store for the raw token.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn store(&self, token: &str) -> Result<()>;
    /// Remove the token. Succeeds when nothing is stored.
    fn clear(&self) -> Result<()>;
}

/// Token kept in the OS keychain
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, TOKEN_KEY).context("Failed to create keyring entry")
    }
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStorage for KeyringStorage {
    fn load(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn store(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

/// Token kept in a plain file, for platforms without a keychain
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_KEY)
    }
}

impl TokenStorage for FileStorage {
    fn load(&self) -> Result<Option<String>> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read token file")?;
        let token = contents.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    fn store(&self, token: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create token directory")?;
        std::fs::write(self.token_path(), token).context("Failed to write token file")
    }

    fn clear(&self) -> Result<()> {
        let path = self.token_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove token file")?;
        }
        Ok(())
    }
}

/// In-process storage; nothing survives a restart
#[derive(Default)]
pub struct MemoryStorage {
    token: std::sync::Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // The guarded value is a plain Option, so a poisoned lock is still usable
        self.token.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot().clone())
    }

    fn store(&self, token: &str) -> Result<()> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

struct VaultInner {
    storage: Box<dyn TokenStorage>,
    lock: Mutex<()>,
}

/// Shared, serialized handle to the persisted token.
/// Clone is cheap; all clones guard the same backend.
#[derive(Clone)]
pub struct TokenVault {
    inner: Arc<VaultInner>,
}

impl TokenVault {
    pub fn new(storage: impl TokenStorage + 'static) -> Self {
        Self::from_boxed(Box::new(storage))
    }

    pub fn from_boxed(storage: Box<dyn TokenStorage>) -> Self {
        Self {
            inner: Arc::new(VaultInner {
                storage,
                lock: Mutex::new(()),
            }),
        }
    }

    /// Vault over `MemoryStorage`
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    pub async fn read(&self) -> Result<Option<String>> {
        let _guard = self.inner.lock.lock().await;
        self.inner.storage.load()
    }

    pub async fn write(&self, token: &str) -> Result<()> {
        let _guard = self.inner.lock.lock().await;
        self.inner.storage.store(token)?;
        debug!("Token persisted");
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        let _guard = self.inner.lock.lock().await;
        self.inner.storage.clear()?;
        debug!("Token cleared");
        Ok(())
    }

    /// Run `f` while holding the vault lock, so a decision based on what is
    /// stored cannot be interleaved with another writer.
    pub async fn with_storage<T>(&self, f: impl FnOnce(&dyn TokenStorage) -> T) -> T {
        let _guard = self.inner.lock.lock().await;
        f(self.inner.storage.as_ref())
    }
}
