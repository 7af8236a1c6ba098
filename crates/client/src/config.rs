//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `BARBERTIME_API_URL` - Backend base URL (default: `http://localhost:3000/api/v1`)
//! - `BARBERTIME_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `BARBERTIME_CREDENTIALS_PATH` - Credential file for the durable store
//!   (default: `<config dir>/barbertime/credentials.json`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Backend used when `BARBERTIME_API_URL` is unset (local development server).
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/v1";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CREDENTIALS_FILE: &str = "credentials.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// BarberTime client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub api_url: Url,
    /// Timeout applied to every backend request.
    pub timeout: Duration,
    /// Location of the durable credential file.
    pub credentials_path: PathBuf,
}

impl ClientConfig {
    /// Configuration for the given backend with default timeout and
    /// credential location.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an absolute
    /// http(s) URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url("BARBERTIME_API_URL", api_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credentials_path: default_credentials_path(),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("BARBERTIME_API_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = parse_api_url("BARBERTIME_API_URL", &api_url)?;

        let timeout = match lookup("BARBERTIME_HTTP_TIMEOUT_SECS") {
            Some(value) => {
                let secs = value.trim().parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "BARBERTIME_HTTP_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidEnvVar(
                        "BARBERTIME_HTTP_TIMEOUT_SECS".to_string(),
                        "must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let credentials_path = lookup("BARBERTIME_CREDENTIALS_PATH")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(default_credentials_path, PathBuf::from);

        Ok(Self {
            api_url,
            timeout,
            credentials_path,
        })
    }

    /// Base URL as a string without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api_url.as_str().trim_end_matches('/')
    }
}

fn parse_api_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme: {}", url.scheme()),
        ));
    }

    Ok(url)
}

fn default_credentials_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("barbertime")
        .join(CREDENTIALS_FILE)
}
