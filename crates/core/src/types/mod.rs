//! Core types for BarberTime.
//!
//! This module provides type-safe wrappers for the domain concepts the
//! session layer exchanges with the backend.

pub mod email;
pub mod id;
pub mod identity;
pub mod otp;
pub mod role;

pub use email::{Email, EmailError};
pub use id::{UserId, UserIdError};
pub use identity::{Identity, ProfileFields};
pub use otp::{OtpChallenge, OtpCode, OtpCodeError};
pub use role::{Role, RoleParseError, SignupRole};
