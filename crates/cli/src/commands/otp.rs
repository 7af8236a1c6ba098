//! Passwordless sign-in with emailed one-time codes.

use barbertime_client::{OtpOutcome, Session};
use barbertime_core::{Email, OtpCode};

use super::account::report_logged_in;
use super::{CliError, ProfileArgs, parse_email};

pub async fn request(session: &Session, email: &str) -> Result<(), CliError> {
    let email = parse_email(email)?;

    let challenge = session.request_otp(&email).await?;
    tracing::info!(
        expires_at = %challenge.expires_at,
        "Code sent to {}",
        challenge.email
    );
    Ok(())
}

/// Verify a code. A new account is registered in the same step when a name
/// was supplied.
pub async fn verify(
    session: &Session,
    email: &str,
    code: &str,
    profile: &ProfileArgs,
) -> Result<(), CliError> {
    let email = parse_email(email)?;
    let code = OtpCode::parse(code)?;

    match session.verify_otp(&email, code).await? {
        OtpOutcome::LoggedIn(identity) => report_logged_in(&identity),
        OtpOutcome::NeedsRegistration(verified) => {
            if !profile.has_name() {
                tracing::info!("{}", registration_hint(verified.email()));
                return Ok(());
            }

            let profile = profile.to_profile()?;
            let identity = session
                .complete_otp_registration(verified, &profile)
                .await?;
            report_logged_in(&identity);
        }
    }
    Ok(())
}

/// The verified code was spent on this call, so registering needs a new one.
fn registration_hint(email: &Email) -> String {
    format!(
        "No account exists for {email}. Run `otp request -e {email}` for a new code, \
         then `otp verify` with it and --first-name and --last-name to create one"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use barbertime_client::CredentialStore;
    use barbertime_integration_tests::{StubBackend, auth_body, user_json};
    use reqwest::Method;
    use serde_json::json;

    use super::*;

    const EMAIL: &str = "new@example.com";

    fn names(first: Option<&str>, last: Option<&str>) -> ProfileArgs {
        ProfileArgs {
            first_name: first.map(str::to_owned),
            last_name: last.map(str::to_owned),
            phone: None,
            role: None,
        }
    }

    fn stub_new_account(backend: &StubBackend) {
        backend.respond(
            Method::POST,
            "/auth/otp/verify",
            200,
            json!({"verified": true, "needsRegistration": true, "email": EMAIL}),
        );
        backend.respond(
            Method::POST,
            "/auth/otp/complete-registration",
            201,
            auth_body("tok-new", user_json("u-10", EMAIL, "customer")),
        );
    }

    #[test]
    fn test_registration_hint_asks_for_a_new_code() {
        let hint = registration_hint(&Email::parse(EMAIL).unwrap());
        assert!(hint.contains(&format!("otp request -e {EMAIL}")));
        assert!(hint.contains("--first-name and --last-name"));
    }

    #[tokio::test]
    async fn test_new_account_without_names_stops_before_registering() {
        let backend = StubBackend::start().await.unwrap();
        stub_new_account(&backend);
        let (session, store) = backend.memory_session();

        verify(&session, EMAIL, "123456", &names(None, None))
            .await
            .unwrap();

        assert!(!session.is_authenticated());
        assert!(store.load().unwrap().is_empty());
        assert!(backend.requests_to("/auth/otp/complete-registration").is_empty());
    }

    #[tokio::test]
    async fn test_new_account_with_names_registers_with_the_same_code() {
        let backend = StubBackend::start().await.unwrap();
        stub_new_account(&backend);
        let (session, store) = backend.memory_session();

        verify(&session, EMAIL, "123456", &names(Some("Nia"), Some("Cole")))
            .await
            .unwrap();

        assert!(session.is_authenticated());
        assert!(store.token().unwrap().is_some());
        let body = backend.requests_to("/auth/otp/complete-registration")[0].json();
        assert_eq!(body["code"], "123456");
        assert_eq!(body["firstName"], "Nia");
        assert_eq!(backend.requests_to("/auth/otp/verify").len(), 1);
    }
}
