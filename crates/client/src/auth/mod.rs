//! Typed access to the backend's `/auth` endpoints.
//!
//! [`AuthApi`] performs the calls and validates the answers; it never
//! touches stored credentials or session state. That is the job of
//! [`crate::session::Session`].

mod client;
pub mod wire;

pub use client::AuthApi;
pub use wire::{OtpRequestResponse, OtpVerification};

use barbertime_core::Identity;
use secrecy::SecretString;

/// A bearer token together with the identity it authenticates.
#[derive(Clone)]
pub struct Credential {
    pub token: SecretString,
    pub identity: Identity,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("identity", &self.identity)
            .finish()
    }
}
