//! Error types for the API gateway client.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when calling the BarberTime backend.
///
/// `Display` yields a message that can be shown to the user as is.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connection refused, timeout, TLS...).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    RequestFailed {
        /// HTTP status returned by the backend.
        status: StatusCode,
        /// Backend-provided message, or a generic one carrying the status.
        message: String,
    },

    /// The backend answered successfully but the body did not match the
    /// expected shape.
    #[error("invalid response from server: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// HTTP status associated with the failure, if the backend answered.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(e) => e.status(),
            Self::RequestFailed { status, .. } => Some(*status),
            Self::InvalidResponse(_) => None,
        }
    }

    /// Whether the backend rejected the bearer credential.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// JSON error body returned by the backend.
///
/// Validation failures carry a list of messages, everything else a single
/// string.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

/// Message used when the backend gave no usable error body.
#[must_use]
pub fn generic_message(status: StatusCode) -> String {
    format!("HTTP error! status: {}", status.as_u16())
}

/// Extract a display message from a non-success response body.
#[must_use]
pub fn error_message(status: StatusCode, body: &[u8]) -> String {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .map(|message| match message {
            ErrorMessage::One(message) => message,
            ErrorMessage::Many(messages) => messages.join("; "),
        })
        .filter(|message| !message.trim().is_empty());

    message.unwrap_or_else(|| generic_message(status))
}
