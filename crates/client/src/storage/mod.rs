//! Durable credential storage.
//!
//! A credential is two entries kept side by side: the opaque bearer token and
//! a JSON snapshot of the identity it belongs to. Stores always write and
//! clear the two together so that a token is never left without its profile.
//!
//! # Implementations
//!
//! - [`MemoryStore`] - process-local, for tests and ephemeral sessions
//! - [`FileStore`] - a single JSON file replaced atomically on every write

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur when reading or writing stored credentials.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem access failed.
    #[error("credential storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be encoded or decoded.
    #[error("credential storage is corrupted: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The temporary file could not replace the credential file.
    #[error("failed to persist credentials: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Raw contents of a credential store.
///
/// Either entry may be missing; the identity snapshot is not parsed here so
/// that callers decide how to treat a corrupted snapshot.
#[derive(Default)]
pub struct StoredEntries {
    pub token: Option<SecretString>,
    pub user: Option<String>,
}

impl StoredEntries {
    /// Whether both entries are absent.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}

impl std::fmt::Debug for StoredEntries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredEntries")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &self.user)
            .finish()
    }
}

/// Storage backend for the persisted credential.
pub trait CredentialStore: Send + Sync {
    /// Read both entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read or decoded.
    fn load(&self) -> Result<StoredEntries, StorageError>;

    /// Write the token and identity snapshot as one unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the previous contents are then
    /// left untouched.
    fn save(&self, token: &SecretString, user_json: &str) -> Result<(), StorageError>;

    /// Remove both entries. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be modified.
    fn clear(&self) -> Result<(), StorageError>;

    /// Read only the bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read or decoded.
    fn token(&self) -> Result<Option<SecretString>, StorageError> {
        Ok(self.load()?.token)
    }
}
