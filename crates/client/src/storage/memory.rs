//! In-memory credential store.

use std::sync::{Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};

use super::{CredentialStore, StorageError, StoredEntries};

#[derive(Default)]
struct Entries {
    token: Option<String>,
    user: Option<String>,
}

/// Credential store that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<Entries>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with raw entries.
    ///
    /// Entries are written as given, so this can model states a well-behaved
    /// writer never produces (a token without a snapshot, a corrupted
    /// snapshot) left behind by older clients.
    #[must_use]
    pub fn with_entries(token: Option<&str>, user: Option<&str>) -> Self {
        Self {
            entries: Mutex::new(Entries {
                token: token.map(str::to_owned),
                user: user.map(str::to_owned),
            }),
        }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<StoredEntries, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(StoredEntries {
            token: entries.token.clone().map(SecretString::from),
            user: entries.user.clone(),
        })
    }

    fn save(&self, token: &SecretString, user_json: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        *entries = Entries {
            token: Some(token.expose_secret().to_owned()),
            user: Some(user_json.to_owned()),
        };
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        *entries = Entries::default();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_empty());

        store
            .save(&SecretString::from("tok-1"), r#"{"id":"u-1"}"#)
            .unwrap();

        let entries = store.load().unwrap();
        assert_eq!(entries.token.unwrap().expose_secret(), "tok-1");
        assert_eq!(entries.user.as_deref(), Some(r#"{"id":"u-1"}"#));
    }

    #[test]
    fn test_clear_removes_both_entries() {
        let store = MemoryStore::with_entries(Some("tok"), Some("{}"));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
        assert!(store.token().unwrap().is_none());

        // Clearing again is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_debug_hides_token() {
        let store = MemoryStore::with_entries(Some("very-secret"), None);
        let entries = store.load().unwrap();
        assert!(!format!("{entries:?}").contains("very-secret"));
        assert!(!format!("{store:?}").contains("very-secret"));
    }
}
