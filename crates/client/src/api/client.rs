//! HTTP client for the BarberTime REST API.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Span, debug, instrument, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::storage::CredentialStore;

use super::error::{ApiError, error_message};

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Gateway for every request to the BarberTime backend.
///
/// Attaches the stored bearer token, encodes JSON bodies and turns non-success
/// responses into [`ApiError::RequestFailed`] with a display-ready message.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// The credential store is read on every request, so a token saved by
    /// the session is used immediately.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url().to_owned(),
                store,
            }),
        })
    }

    /// Backend base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Credential store consulted for the bearer token.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    /// `GET` an endpoint.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    /// `POST` a JSON body to an endpoint.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    /// `PUT` a JSON body to an endpoint.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// `PATCH` an endpoint with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Some(body)).await
    }

    /// `DELETE` an endpoint.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, None::<&()>).await
    }

    /// Send a request and decode the JSON response.
    ///
    /// `path` is relative to the base URL (for example `/auth/profile`).
    /// The body is ignored for `GET` and `DELETE`. An empty success body
    /// decodes as JSON `null`, which lets `T = ()` describe endpoints that
    /// return nothing.
    ///
    /// # Errors
    ///
    /// - `ApiError::Transport` if the request could not be completed
    /// - `ApiError::RequestFailed` if the backend returned a non-success status
    /// - `ApiError::InvalidResponse` if the body does not decode as `T`
    #[instrument(
        skip(self, body),
        fields(method = %method, path = %path, request_id = tracing::field::Empty)
    )]
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());

        let carries_body = !matches!(method, Method::GET | Method::DELETE);
        let mut builder = self
            .inner
            .client
            .request(method, self.url(path))
            .header(REQUEST_ID_HEADER, request_id);

        if let Some(authorization) = self.authorization() {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        if carries_body && let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.inspect_err(|e| {
            warn!(error = %e, "Request did not complete");
        })?;

        let status = response.status();

        if !status.is_success() {
            // An unreadable error body still reports the status.
            let bytes = response.bytes().await.unwrap_or_default();
            let message = error_message(status, &bytes);
            warn!(status = status.as_u16(), message = %message, "Backend rejected request");
            return Err(ApiError::RequestFailed { status, message });
        }

        let bytes = response.bytes().await?;
        debug!(status = status.as_u16(), "Request succeeded");

        decode_body(&bytes)
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.inner.base_url)
        } else {
            format!("{}/{path}", self.inner.base_url)
        }
    }

    /// Authorization header for the stored token, if there is a usable one.
    ///
    /// An unreadable store or a malformed token is logged and the request
    /// goes out unauthenticated; the backend then rejects it like any other
    /// stale credential.
    fn authorization(&self) -> Option<HeaderValue> {
        let token = match self.inner.store.token() {
            Ok(token) => token?,
            Err(e) => {
                warn!(error = %e, "Could not read stored token, sending request without it");
                return None;
            }
        };

        let header = bearer_header(&token);
        if header.is_none() {
            warn!("Stored token is not a valid header value, ignoring it");
        }
        header
    }
}

fn bearer_header(token: &SecretString) -> Option<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())).ok()?;
    value.set_sensitive(true);
    Some(value)
}

fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null".as_slice()
    } else {
        bytes
    };

    serde_json::from_slice(bytes).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}
