//! Backend-issued identifiers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when an identifier is empty.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("user id cannot be empty")]
pub struct UserIdError;

/// Unique identifier of a user account.
///
/// The backend issues opaque string IDs; the client never interprets them
/// beyond requiring that they are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a user ID from a backend-issued string.
    ///
    /// # Errors
    ///
    /// Returns `UserIdError` if the string is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, UserIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(UserIdError);
        }
        Ok(Self(id))
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = UserIdError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}
