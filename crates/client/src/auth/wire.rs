//! Request and response bodies of the `/auth` endpoints.
//!
//! Responses are decoded strictly (unknown roles, malformed emails and
//! missing fields fail) and then checked for cross-field consistency before
//! anything is handed to the session.

use barbertime_core::{Email, Identity, OtpCode, SignupRole};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::Credential;
use crate::api::ApiError;

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a Email,
    pub password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
    pub first_name: &'a str,
    pub last_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    pub role: SignupRole,
}

#[derive(Serialize)]
pub(crate) struct OtpRequest<'a> {
    pub email: &'a Email,
}

#[derive(Serialize)]
pub(crate) struct OtpVerifyRequest<'a> {
    pub email: &'a Email,
    pub code: &'a OtpCode,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompleteOtpRegistrationRequest<'a> {
    pub email: &'a Email,
    pub code: &'a OtpCode,
    pub first_name: &'a str,
    pub last_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    pub role: SignupRole,
}

/// Body returned by every endpoint that establishes a session.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthResponse {
    pub access_token: String,
    pub user: Identity,
}

impl AuthResponse {
    pub fn into_credential(self) -> Result<Credential, ApiError> {
        credential(self.access_token, self.user)
    }
}

/// Body returned when a one-time code is sent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequestResponse {
    #[serde(default)]
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// Body returned when a one-time code is checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OtpVerifyResponse {
    pub verified: bool,
    pub needs_registration: bool,
    pub email: Email,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<Identity>,
}

/// Interpretation of a successful `POST /auth/otp/verify` response.
#[derive(Debug)]
pub enum OtpVerification {
    /// The email belongs to an existing account; a session was issued.
    LoggedIn(Credential),
    /// The code was valid but no account exists for the email yet.
    NeedsRegistration {
        /// Verified email, as echoed by the backend.
        email: Email,
    },
    /// The backend answered successfully but did not accept the code.
    Rejected {
        /// Backend message explaining the rejection.
        message: String,
    },
}

const DEFAULT_REJECTION: &str = "Invalid or expired verification code";

impl OtpVerifyResponse {
    /// Classify the response for a code sent to `requested`.
    pub fn classify(self, requested: &Email) -> Result<OtpVerification, ApiError> {
        if &self.email != requested {
            return Err(ApiError::InvalidResponse(format!(
                "verification answered for {} instead of {requested}",
                self.email
            )));
        }

        if !self.verified {
            let message = if self.message.trim().is_empty() {
                DEFAULT_REJECTION.to_string()
            } else {
                self.message
            };
            return Ok(OtpVerification::Rejected { message });
        }

        if self.needs_registration {
            return Ok(OtpVerification::NeedsRegistration { email: self.email });
        }

        match (self.access_token, self.user) {
            (Some(token), Some(user)) => Ok(OtpVerification::LoggedIn(credential(token, user)?)),
            _ => Err(ApiError::InvalidResponse(
                "verified login is missing its access token or user".to_string(),
            )),
        }
    }
}

fn credential(token: String, identity: Identity) -> Result<Credential, ApiError> {
    if token.trim().is_empty() {
        return Err(ApiError::InvalidResponse("empty access token".to_string()));
    }
    Ok(Credential {
        token: SecretString::from(token),
        identity,
    })
}
