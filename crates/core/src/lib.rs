//! BarberTime Core - Shared domain types.
//!
//! This crate provides the types shared by every BarberTime client component:
//! - `client` - API gateway, credential storage and session store
//! - `cli` - Command-line front end for the session store
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Validated wrappers for emails, user IDs, roles, identities
//!   and one-time codes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
