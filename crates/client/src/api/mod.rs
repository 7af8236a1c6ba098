//! BarberTime REST API gateway.
//!
//! Every network call to the backend goes through [`ApiClient`], which owns
//! three concerns:
//!
//! - attaching the stored bearer token as an `Authorization` header
//! - building JSON requests against the configured base URL
//! - normalizing failures into [`ApiError`] with a display-ready message
//!
//! Response bodies are decoded into the caller's type; a body that does not
//! match is reported through the same error channel as a failed request.

pub mod client;
pub mod error;

pub use client::{ApiClient, REQUEST_ID_HEADER};
pub use error::ApiError;
