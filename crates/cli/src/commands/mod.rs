//! Command implementations.

pub mod account;
pub mod otp;

use std::sync::Arc;

use barbertime_client::{
    ApiClient, ApiError, ClientConfig, ConfigError, FileStore, Session, SessionError,
};
use barbertime_core::{Email, EmailError, OtpCodeError, ProfileFields, RoleParseError, SignupRole};
use clap::Args;
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not create HTTP client: {0}")]
    Client(#[from] ApiError),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid code: {0}")]
    InvalidCode(#[from] OtpCodeError),

    #[error("{0}. Valid roles: customer, barber")]
    InvalidRole(#[from] RoleParseError),

    #[error("--first-name and --last-name are required")]
    MissingName,
}

/// Profile details collected at registration.
#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// First name
    #[arg(long)]
    pub first_name: Option<String>,

    /// Last name
    #[arg(long)]
    pub last_name: Option<String>,

    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Account role (`customer` or `barber`)
    #[arg(long)]
    pub role: Option<String>,
}

impl ProfileArgs {
    /// Whether any name was given, i.e. the user intends to register.
    pub const fn has_name(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some()
    }

    /// Validated profile fields; both names are required.
    pub fn to_profile(&self) -> Result<ProfileFields, CliError> {
        let (Some(first_name), Some(last_name)) = (&self.first_name, &self.last_name) else {
            return Err(CliError::MissingName);
        };

        let mut profile = ProfileFields::new(first_name, last_name);
        if let Some(phone) = &self.phone {
            profile = profile.with_phone(phone);
        }
        if let Some(role) = &self.role {
            profile = profile.with_role(role.parse::<SignupRole>()?);
        }
        Ok(profile)
    }
}

/// Build a session backed by the credential file from the environment.
pub fn connect() -> Result<Session, CliError> {
    let config = ClientConfig::from_env()?;
    tracing::debug!(
        api_url = %config.api_url,
        credentials = %config.credentials_path.display(),
        "Using backend"
    );

    let store = Arc::new(FileStore::new(&config.credentials_path));
    let api = ApiClient::new(&config, store)?;
    Ok(Session::new(api))
}

pub fn parse_email(email: &str) -> Result<Email, CliError> {
    Ok(Email::parse(email)?)
}
