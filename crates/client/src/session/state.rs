//! Observable session state and one-time code outcomes.

use barbertime_core::{Email, Identity, OtpCode};

/// Who is logged in, as far as the client knows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Startup restoration has not finished; neither grant nor deny access.
    #[default]
    Unknown,
    /// No valid credential.
    Anonymous,
    /// A validated credential for this identity.
    Authenticated(Identity),
}

impl SessionState {
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Unknown | Self::Anonymous => None,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Whether authentication state is settled (not [`SessionState::Unknown`]).
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// An email whose one-time code the backend accepted but which has no
/// account yet.
///
/// Not `Clone`: it is consumed by
/// [`super::Session::complete_otp_registration`], so a verified code is
/// forwarded exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct VerifiedOtp {
    pub(crate) email: Email,
    pub(crate) code: OtpCode,
}

impl VerifiedOtp {
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }
}

/// Result of verifying a one-time code.
#[derive(Debug)]
pub enum OtpOutcome {
    /// Existing account; the session is now authenticated.
    LoggedIn(Identity),
    /// New email; finish with [`super::Session::complete_otp_registration`].
    NeedsRegistration(VerifiedOtp),
}
