//! BarberTime client library.
//!
//! Talks to the BarberTime REST backend and keeps track of who is logged in.
//!
//! # Layers
//!
//! - [`config`] - base URL, timeouts and credential location from the environment
//! - [`storage`] - durable token + identity snapshot
//! - [`api`] - the HTTP gateway every request goes through
//! - [`auth`] - typed `/auth` endpoint calls
//! - [`session`] - the session store consumers share
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use barbertime_client::{ApiClient, ClientConfig, FileStore, Session};
//!
//! let config = ClientConfig::from_env()?;
//! let store = Arc::new(FileStore::new(&config.credentials_path));
//! let session = Session::new(ApiClient::new(&config, store)?);
//!
//! session.restore().await;
//! if let Some(identity) = session.identity() {
//!     println!("Hello, {}", identity.first_name);
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod config;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthApi, Credential, OtpVerification};
pub use config::{ClientConfig, ConfigError};
pub use session::{OtpOutcome, Session, SessionError, SessionState, VerifiedOtp};
pub use storage::{CredentialStore, FileStore, MemoryStore, StorageError, StoredEntries};
