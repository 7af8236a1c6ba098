//! File-backed credential store.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{CredentialStore, StorageError, StoredEntries};

/// On-disk document holding both credential entries.
#[derive(Serialize, Deserialize, Default)]
struct CredentialDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

/// Credential store backed by a single JSON file.
///
/// Every write goes to a temporary file in the same directory which then
/// replaces the credential file by rename, so readers see either the old
/// pair or the new pair. Temporary files are created owner-readable only.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<CredentialDocument, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(CredentialDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(&self, document: &CredentialDocument) -> Result<(), StorageError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut file, document)?;
        file.flush()?;
        file.as_file().sync_all()?;
        file.persist(&self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Result<StoredEntries, StorageError> {
        let document = self.read_document()?;
        Ok(StoredEntries {
            token: document.token.map(SecretString::from),
            user: document.user,
        })
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn save(&self, token: &SecretString, user_json: &str) -> Result<(), StorageError> {
        self.write_document(&CredentialDocument {
            token: Some(token.expose_secret().to_owned()),
            user: Some(user_json.to_owned()),
        })?;
        debug!("Credentials written");
        Ok(())
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Credentials removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
