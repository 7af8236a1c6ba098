//! Password login, registration and logout through the session store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use barbertime_client::{CredentialStore, FileStore, SessionError, SessionState};
use barbertime_core::{Email, ProfileFields, Role, SignupRole};
use barbertime_integration_tests::{StubBackend, auth_body, error_body, user_json};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

fn email() -> Email {
    Email::parse("ana@example.com").unwrap()
}

fn password() -> SecretString {
    SecretString::from("hunter22")
}

#[tokio::test]
async fn test_login_stores_token_and_identity() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(
        Method::POST,
        "/auth/login",
        200,
        auth_body("tok-1", user_json("u-1", "ana@example.com", "customer")),
    );
    let (session, store) = backend.memory_session();

    let identity = session.login(&email(), &password()).await.unwrap();

    assert_eq!(identity.id.as_str(), "u-1");
    assert_eq!(identity.role, Role::Customer);
    assert_eq!(session.state(), SessionState::Authenticated(identity.clone()));

    let stored = store.load().unwrap();
    assert_eq!(stored.token.unwrap().expose_secret(), "tok-1");
    assert_eq!(session.stored_identity(), Some(identity));

    let request = &backend.requests_to("/auth/login")[0];
    assert_eq!(
        request.json(),
        json!({"email": "ana@example.com", "password": "hunter22"})
    );
    assert_eq!(request.authorization, None);
}

#[tokio::test]
async fn test_later_requests_carry_the_new_token() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(
        Method::POST,
        "/auth/login",
        200,
        auth_body("tok-1", user_json("u-1", "ana@example.com", "customer")),
    );
    backend.respond(Method::GET, "/appointments", 200, json!([]));
    let (session, _) = backend.memory_session();

    session.login(&email(), &password()).await.unwrap();
    let _: serde_json::Value = session.api().get("/appointments").await.unwrap();

    let request = &backend.requests_to("/appointments")[0];
    assert_eq!(request.authorization.as_deref(), Some("Bearer tok-1"));
}

#[tokio::test]
async fn test_rejected_login_keeps_backend_message_and_state() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(
        Method::POST,
        "/auth/login",
        401,
        error_body("Invalid credentials"),
    );
    let (session, store) = backend.memory_session();
    session.logout();

    let err = session.login(&email(), &password()).await.unwrap_err();

    assert_eq!(err.message(), "Invalid credentials");
    match err {
        SessionError::Api(api) => assert_eq!(api.status(), Some(StatusCode::UNAUTHORIZED)),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(store.load().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_with_empty_token_is_not_established() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(
        Method::POST,
        "/auth/login",
        200,
        auth_body("", user_json("u-1", "ana@example.com", "customer")),
    );
    let (session, store) = backend.memory_session();

    let result = session.login(&email(), &password()).await;

    assert!(result.is_err());
    assert!(!session.is_authenticated());
    assert!(store.load().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_defaults_role_to_customer() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(
        Method::POST,
        "/auth/register",
        201,
        auth_body("tok-2", user_json("u-2", "ana@example.com", "customer")),
    );
    let (session, _) = backend.memory_session();

    let identity = session
        .register(&email(), Some(&password()), &ProfileFields::new("Ana", "Bell"))
        .await
        .unwrap();

    assert_eq!(identity.role, Role::Customer);
    let body = backend.requests_to("/auth/register")[0].json();
    assert_eq!(body["role"], "customer");
    assert_eq!(body["firstName"], "Ana");
    assert_eq!(body["lastName"], "Bell");
    assert_eq!(body["password"], "hunter22");
    assert!(body.get("phone").is_none());
}

#[tokio::test]
async fn test_register_barber_without_password() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(
        Method::POST,
        "/auth/register",
        201,
        auth_body("tok-3", user_json("u-3", "ana@example.com", "barber")),
    );
    let (session, _) = backend.memory_session();
    let profile = ProfileFields::new("Ana", "Bell")
        .with_phone("+15550100")
        .with_role(SignupRole::Barber);

    let identity = session.register(&email(), None, &profile).await.unwrap();

    assert!(identity.is_barber());
    let body = backend.requests_to("/auth/register")[0].json();
    assert_eq!(body["role"], "barber");
    assert_eq!(body["phone"], "+15550100");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_logout_clears_everything_and_is_idempotent() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(
        Method::POST,
        "/auth/login",
        200,
        auth_body("tok-1", user_json("u-1", "ana@example.com", "customer")),
    );
    let (session, store) = backend.memory_session();
    session.login(&email(), &password()).await.unwrap();

    session.logout();
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(store.load().unwrap().is_empty());
    assert!(session.token().is_none());

    session.logout();
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(store.load().unwrap().is_empty());

    // Logout is local only
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn test_login_persists_across_sessions_in_file_store() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(
        Method::POST,
        "/auth/login",
        200,
        auth_body("tok-1", user_json("u-1", "ana@example.com", "barber")),
    );
    backend.respond(
        Method::GET,
        "/auth/profile",
        200,
        user_json("u-1", "ana@example.com", "barber"),
    );
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");

    let first = backend.session(Arc::new(FileStore::new(&path)));
    let identity = first.login(&email(), &password()).await.unwrap();
    drop(first);

    let second = backend.session(Arc::new(FileStore::new(&path)));
    assert_eq!(second.state(), SessionState::Unknown);
    let state = second.restore().await;

    assert_eq!(state, SessionState::Authenticated(identity));
    let profile_request = &backend.requests_to("/auth/profile")[0];
    assert_eq!(profile_request.authorization.as_deref(), Some("Bearer tok-1"));
}

#[tokio::test]
async fn test_subscribers_observe_login_and_logout() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(
        Method::POST,
        "/auth/login",
        200,
        auth_body("tok-1", user_json("u-1", "ana@example.com", "customer")),
    );
    let (session, _) = backend.memory_session();
    let mut receiver = session.subscribe();

    session.login(&email(), &password()).await.unwrap();
    receiver.changed().await.unwrap();
    assert!(receiver.borrow_and_update().is_authenticated());

    session.logout();
    receiver.changed().await.unwrap();
    assert_eq!(*receiver.borrow_and_update(), SessionState::Anonymous);
}
