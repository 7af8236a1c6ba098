//! Password login, registration, whoami and logout.

use barbertime_client::{Session, SessionState};
use barbertime_core::Identity;
use secrecy::SecretString;

use super::{CliError, ProfileArgs, parse_email};

pub async fn login(session: &Session, email: &str, password: String) -> Result<(), CliError> {
    let email = parse_email(email)?;
    let password = SecretString::from(password);

    let identity = session.login(&email, &password).await?;
    report_logged_in(&identity);
    Ok(())
}

pub async fn register(
    session: &Session,
    email: &str,
    password: Option<String>,
    profile: &ProfileArgs,
) -> Result<(), CliError> {
    let email = parse_email(email)?;
    let profile = profile.to_profile()?;
    let password = password.map(SecretString::from);

    let identity = session
        .register(&email, password.as_ref(), &profile)
        .await?;
    report_logged_in(&identity);
    Ok(())
}

/// Validate the stored credential and report the account it belongs to.
pub async fn whoami(session: &Session) {
    match session.restore().await {
        SessionState::Authenticated(identity) => tracing::info!(
            user_id = %identity.id,
            role = %identity.role,
            "Logged in as {} <{}>",
            identity.full_name(),
            identity.email
        ),
        SessionState::Anonymous | SessionState::Unknown => tracing::info!("Not logged in"),
    }
}

pub fn logout(session: &Session) {
    session.logout();
    tracing::info!("Logged out");
}

pub fn report_logged_in(identity: &Identity) {
    tracing::info!(
        user_id = %identity.id,
        role = %identity.role,
        "Logged in as {} <{}>",
        identity.full_name(),
        identity.email
    );
}
