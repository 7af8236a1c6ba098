//! Error types for session operations.

use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Errors returned by [`super::Session`] operations.
///
/// `Display` is meant to be shown to the user: backend messages are passed
/// through verbatim.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend call failed or returned an unusable answer.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The credential could not be persisted.
    #[error("could not save credentials: {0}")]
    Storage(#[from] StorageError),

    /// The backend did not accept the one-time code.
    #[error("{0}")]
    OtpRejected(String),

    /// The one-time code challenge expired before it was verified.
    #[error("verification code expired, request a new one")]
    OtpExpired,

    /// The stored credential is no longer valid; the session was ended.
    #[error("{0}")]
    SessionExpired(String),

    /// Another login or logout replaced the session while this request was
    /// in flight, so its result was discarded.
    #[error("session changed while the request was in flight")]
    Superseded,
}

impl SessionError {
    /// Message suitable for display.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether this error ended the session.
    #[must_use]
    pub const fn ended_session(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }
}
