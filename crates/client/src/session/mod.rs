//! Session store: the single source of truth for who is logged in.
//!
//! A [`Session`] is constructed explicitly and handed to whatever needs it;
//! clones share the same state. It owns:
//!
//! - the in-memory [`SessionState`], observable through a `watch` channel
//! - the persisted credential (token + identity snapshot) in the
//!   [`CredentialStore`] shared with the [`ApiClient`]
//!
//! # Startup
//!
//! The state starts as [`SessionState::Unknown`]. [`Session::restore`] checks
//! the stored credential against `GET /auth/profile` and settles the state to
//! `Authenticated` or `Anonymous`; a stale, revoked or unreadable credential
//! is cleared.
//!
//! # Ordering
//!
//! Credential writes and state updates happen together under one lock, and
//! every login or logout bumps a generation counter. Profile fetches remember
//! the generation they started in and drop their result if it changed, so a
//! refresh that was in flight across a logout cannot bring the old session
//! back. Concurrent logins are last-write-wins.

mod error;
mod state;

pub use error::SessionError;
pub use state::{OtpOutcome, SessionState, VerifiedOtp};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use barbertime_core::{Email, Identity, OtpChallenge, OtpCode, ProfileFields};
use secrecy::SecretString;
use tokio::sync::{OnceCell, watch};
use tracing::{debug, info, instrument, warn};

use crate::api::ApiClient;
use crate::auth::{AuthApi, Credential, OtpVerification};
use crate::storage::{CredentialStore, StorageError};

/// Shared handle to the authentication session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    auth: AuthApi,
    state: watch::Sender<SessionState>,
    /// Bumped on every login/logout; guards credential writes.
    generation: Mutex<u64>,
    /// Set once startup validation has run to completion.
    restored: OnceCell<()>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session over the given API client.
    ///
    /// The session persists credentials in the client's credential store, so
    /// every request made through `api` carries the session's token.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            inner: Arc::new(SessionInner {
                auth: AuthApi::new(api),
                state,
                generation: Mutex::new(0),
                restored: OnceCell::new(),
            }),
        }
    }

    /// The `/auth` endpoint client used by this session.
    #[must_use]
    pub fn auth(&self) -> &AuthApi {
        &self.inner.auth
    }

    /// The API client, for calls that should carry the session's token.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        self.inner.auth.api()
    }

    fn store(&self) -> &Arc<dyn CredentialStore> {
        self.api().store()
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Identity of the logged-in user, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.borrow().identity().cloned()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Whether startup restoration has settled the state.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.state.borrow().is_ready()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Wait until the state is no longer [`SessionState::Unknown`].
    pub async fn wait_ready(&self) -> SessionState {
        let mut receiver = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        match receiver.wait_for(SessionState::is_ready).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Identity snapshot persisted with the token, without validating it.
    ///
    /// A missing or unreadable snapshot yields `None`.
    #[must_use]
    pub fn stored_identity(&self) -> Option<Identity> {
        let user = self.store().load().ok()?.user?;
        serde_json::from_str(&user).ok()
    }

    /// Persisted bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.store().token().ok().flatten()
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Validate the persisted credential and settle the session state.
    ///
    /// Runs once; concurrent calls wait for the running validation and later
    /// calls return the settled state. If the running call is cancelled, the
    /// next caller starts the validation over.
    ///
    /// Never fails: any problem with the stored credential (missing or
    /// corrupted snapshot, rejected token, unreachable backend) clears it and
    /// leaves the session anonymous.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> SessionState {
        self.inner
            .restored
            .get_or_init(|| self.validate_stored_credential())
            .await;
        self.state()
    }

    async fn validate_stored_credential(&self) {
        let generation = self.generation();

        let entries = match self.store().load() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Stored credential unreadable, discarding it");
                self.discard_if_current(generation);
                return;
            }
        };

        if entries.token.is_none() {
            if !entries.is_empty() {
                warn!("Identity snapshot without token, discarding it");
            }
            self.discard_if_current(generation);
            return;
        }

        let snapshot = entries
            .user
            .as_deref()
            .and_then(|user| serde_json::from_str::<Identity>(user).ok());
        if snapshot.is_none() {
            warn!("Stored identity snapshot missing or corrupted, discarding credential");
            self.discard_if_current(generation);
            return;
        }

        match self.inner.auth.profile().await {
            Ok(identity) => match self.apply_profile(generation, identity) {
                Ok(identity) => info!(user_id = %identity.id, role = %identity.role, "Session restored"),
                Err(e) => {
                    warn!(error = %e, "Could not apply restored profile");
                    self.discard_if_current(generation);
                }
            },
            Err(e) => {
                warn!(error = %e, "Stored credential rejected, logging out");
                self.discard_if_current(generation);
            }
        }
    }

    // =========================================================================
    // Session-establishing operations
    // =========================================================================

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` carrying the backend's message if the
    /// credentials are rejected, or `SessionError::Storage` if the credential
    /// cannot be persisted.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Identity, SessionError> {
        let credential = self.inner.auth.login(email, password).await?;
        self.establish(credential)
    }

    /// Create an account and log into it.
    ///
    /// The role defaults to customer when `profile.role` is unset.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the backend refuses the registration.
    #[instrument(skip(self, password, profile), fields(email = %email))]
    pub async fn register(
        &self,
        email: &Email,
        password: Option<&SecretString>,
        profile: &ProfileFields,
    ) -> Result<Identity, SessionError> {
        let credential = self.inner.auth.register(email, password, profile).await?;
        self.establish(credential)
    }

    /// Ask for a one-time code to be emailed. Does not change the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the backend refuses to send a code.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn request_otp(&self, email: &Email) -> Result<OtpChallenge, SessionError> {
        let response = self.inner.auth.request_otp(email).await?;
        debug!(expires_at = %response.expires_at, "One-time code sent");
        Ok(OtpChallenge::new(email.clone(), response.expires_at))
    }

    /// Verify a one-time code.
    ///
    /// Existing accounts are logged in. For a new email the verified code is
    /// returned in [`OtpOutcome::NeedsRegistration`] and no credential is
    /// stored until [`Session::complete_otp_registration`] succeeds.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` or `SessionError::OtpRejected` with the
    /// backend's message when the code is wrong or expired.
    #[instrument(skip(self, code), fields(email = %email))]
    pub async fn verify_otp(
        &self,
        email: &Email,
        code: OtpCode,
    ) -> Result<OtpOutcome, SessionError> {
        match self.inner.auth.verify_otp(email, &code).await? {
            OtpVerification::LoggedIn(credential) => {
                Ok(OtpOutcome::LoggedIn(self.establish(credential)?))
            }
            OtpVerification::NeedsRegistration { email } => {
                info!("Code verified for new account, registration required");
                Ok(OtpOutcome::NeedsRegistration(VerifiedOtp { email, code }))
            }
            OtpVerification::Rejected { message } => Err(SessionError::OtpRejected(message)),
        }
    }

    /// Verify a code against a pending challenge, consuming it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OtpExpired` without contacting the backend if
    /// the challenge has expired; otherwise as [`Session::verify_otp`].
    pub async fn verify_challenge(
        &self,
        challenge: OtpChallenge,
        code: OtpCode,
    ) -> Result<OtpOutcome, SessionError> {
        if challenge.is_expired() {
            return Err(SessionError::OtpExpired);
        }
        self.verify_otp(&challenge.email, code).await
    }

    /// Create the account for a verified email and log into it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the backend no longer accepts the code
    /// or refuses the account.
    #[instrument(skip(self, verified, profile), fields(email = %verified.email))]
    pub async fn complete_otp_registration(
        &self,
        verified: VerifiedOtp,
        profile: &ProfileFields,
    ) -> Result<Identity, SessionError> {
        let credential = self
            .inner
            .auth
            .complete_otp_registration(&verified.email, &verified.code, profile)
            .await?;
        self.establish(credential)
    }

    // =========================================================================
    // Session-ending and refresh
    // =========================================================================

    /// End the session locally. Idempotent; needs no network.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        let mut generation = self.lock_generation();
        self.logout_locked(&mut generation);
    }

    /// Logout body; the caller holds the generation lock.
    fn logout_locked(&self, generation: &mut u64) {
        *generation += 1;

        if let Err(e) = self.store().clear() {
            warn!(error = %e, "Failed to clear stored credentials");
        }

        let previous = self.inner.state.send_replace(SessionState::Anonymous);
        if let SessionState::Authenticated(identity) = previous {
            info!(user_id = %identity.id, "Logged out");
        }
    }

    /// Re-fetch the identity for the stored token.
    ///
    /// # Errors
    ///
    /// If the backend rejects the token (or cannot be reached) the session is
    /// logged out and `SessionError::SessionExpired` carries the reason.
    /// Returns `SessionError::Superseded` if a login or logout happened while
    /// the profile was being fetched; the newer session is left untouched.
    #[instrument(skip(self))]
    pub async fn refresh_user(&self) -> Result<Identity, SessionError> {
        let generation = self.generation();

        let result = self.inner.auth.profile().await;

        match result {
            Ok(identity) => self.apply_profile(generation, identity),
            Err(e) => {
                if !self.discard_if_current(generation) {
                    return Err(SessionError::Superseded);
                }
                warn!(error = %e, "Profile refresh failed, session ended");
                Err(SessionError::SessionExpired(e.to_string()))
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        self.inner
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn generation(&self) -> u64 {
        *self.lock_generation()
    }

    /// Persist a fresh credential and publish its identity.
    fn establish(&self, credential: Credential) -> Result<Identity, SessionError> {
        let Credential { token, identity } = credential;
        let snapshot = serde_json::to_string(&identity).map_err(StorageError::from)?;

        let mut generation = self.lock_generation();
        self.store().save(&token, &snapshot)?;
        *generation += 1;
        self.inner
            .state
            .send_replace(SessionState::Authenticated(identity.clone()));
        drop(generation);

        info!(user_id = %identity.id, role = %identity.role, "Session established");
        Ok(identity)
    }

    /// Replace the stored snapshot and published identity with a freshly
    /// fetched profile, unless the session changed since `started`.
    fn apply_profile(&self, started: u64, identity: Identity) -> Result<Identity, SessionError> {
        let snapshot = serde_json::to_string(&identity).map_err(StorageError::from)?;

        let mut generation = self.lock_generation();
        if *generation != started {
            debug!("Discarding profile fetched for a replaced session");
            return Err(SessionError::Superseded);
        }

        let Some(token) = self.store().token()? else {
            self.logout_locked(&mut generation);
            return Err(SessionError::SessionExpired(
                "credential was removed while the profile was loading".to_string(),
            ));
        };

        self.store().save(&token, &snapshot)?;
        self.inner
            .state
            .send_replace(SessionState::Authenticated(identity.clone()));
        Ok(identity)
    }

    /// Clear the credential and go anonymous, unless the session changed
    /// since `started`. Returns whether anything was discarded.
    fn discard_if_current(&self, started: u64) -> bool {
        let mut generation = self.lock_generation();
        if *generation != started {
            return false;
        }
        self.logout_locked(&mut generation);
        true
    }
}
