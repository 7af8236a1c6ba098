//! `/auth` endpoint client.

use barbertime_core::{Email, Identity, OtpCode, ProfileFields};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::Credential;
use super::wire::{
    AuthResponse, CompleteOtpRegistrationRequest, LoginRequest, OtpRequest, OtpRequestResponse,
    OtpVerification, OtpVerifyRequest, OtpVerifyResponse, RegisterRequest,
};
use crate::api::{ApiClient, ApiError};

const LOGIN: &str = "/auth/login";
const REGISTER: &str = "/auth/register";
const OTP_REQUEST: &str = "/auth/otp/request";
const OTP_VERIFY: &str = "/auth/otp/verify";
const OTP_COMPLETE_REGISTRATION: &str = "/auth/otp/complete-registration";
const PROFILE: &str = "/auth/profile";

/// Client for the authentication endpoints.
#[derive(Debug, Clone)]
pub struct AuthApi {
    api: ApiClient,
}

impl AuthApi {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Underlying gateway client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Exchange email and password for a credential.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RequestFailed` with the backend's message when the
    /// credentials are rejected.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Credential, ApiError> {
        let response: AuthResponse = self
            .api
            .post(
                LOGIN,
                &LoginRequest {
                    email,
                    password: password.expose_secret(),
                },
            )
            .await?;

        response.into_credential()
    }

    /// Create an account. Accounts created without a password sign in with
    /// one-time codes.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RequestFailed` if the backend refuses the account
    /// (for example because the email is taken).
    #[instrument(skip(self, password, profile), fields(email = %email))]
    pub async fn register(
        &self,
        email: &Email,
        password: Option<&SecretString>,
        profile: &ProfileFields,
    ) -> Result<Credential, ApiError> {
        let response: AuthResponse = self
            .api
            .post(
                REGISTER,
                &RegisterRequest {
                    email,
                    password: password.map(|p| p.expose_secret()),
                    first_name: &profile.first_name,
                    last_name: &profile.last_name,
                    phone: profile.phone.as_deref(),
                    role: profile.effective_role(),
                },
            )
            .await?;

        response.into_credential()
    }

    /// Ask the backend to email a one-time code.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses to send a code.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn request_otp(&self, email: &Email) -> Result<OtpRequestResponse, ApiError> {
        self.api.post(OTP_REQUEST, &OtpRequest { email }).await
    }

    /// Check a one-time code.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RequestFailed` if the backend rejects the code with
    /// an error status, or `ApiError::InvalidResponse` if the answer is
    /// inconsistent.
    #[instrument(skip(self, code), fields(email = %email))]
    pub async fn verify_otp(
        &self,
        email: &Email,
        code: &OtpCode,
    ) -> Result<OtpVerification, ApiError> {
        let response: OtpVerifyResponse = self
            .api
            .post(OTP_VERIFY, &OtpVerifyRequest { email, code })
            .await?;

        response.classify(email)
    }

    /// Create the account for an email that passed code verification.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RequestFailed` if the code is no longer valid or the
    /// account cannot be created.
    #[instrument(skip(self, code, profile), fields(email = %email))]
    pub async fn complete_otp_registration(
        &self,
        email: &Email,
        code: &OtpCode,
        profile: &ProfileFields,
    ) -> Result<Credential, ApiError> {
        let response: AuthResponse = self
            .api
            .post(
                OTP_COMPLETE_REGISTRATION,
                &CompleteOtpRegistrationRequest {
                    email,
                    code,
                    first_name: &profile.first_name,
                    last_name: &profile.last_name,
                    phone: profile.phone.as_deref(),
                    role: profile.effective_role(),
                },
            )
            .await?;

        response.into_credential()
    }

    /// Fetch the profile of the account owning the stored token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RequestFailed` (usually 401) if the token is
    /// missing, expired or revoked.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<Identity, ApiError> {
        self.api.get(PROFILE).await
    }
}
