//! Gateway behavior over real HTTP: headers, bodies and error messages.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use barbertime_client::{ApiClient, ApiError, ClientConfig, MemoryStore};
use barbertime_integration_tests::{StubBackend, error_body};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

#[tokio::test]
async fn test_bearer_token_is_attached_when_stored() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(Method::GET, "/shops", 200, json!([]));
    let client = backend.client(Arc::new(MemoryStore::with_entries(Some("tok-123"), None)));

    let _: Value = client.get("/shops").await.unwrap();

    let requests = backend.requests_to("/shops");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer tok-123"));
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(Method::GET, "/shops", 200, json!([]));
    let client = backend.client(Arc::new(MemoryStore::new()));

    let _: Value = client.get("/shops").await.unwrap();

    assert_eq!(backend.requests()[0].authorization, None);
}

#[tokio::test]
async fn test_every_request_carries_a_request_id() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(Method::GET, "/shops", 200, json!([]));
    let client = backend.client(Arc::new(MemoryStore::new()));

    let _: Value = client.get("/shops").await.unwrap();
    let _: Value = client.get("/shops").await.unwrap();

    let ids: Vec<_> = backend
        .requests()
        .into_iter()
        .map(|request| request.request_id.unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn test_get_never_carries_a_body() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(Method::GET, "/shops", 200, json!([]));
    let client = backend.client(Arc::new(MemoryStore::new()));

    let _: Value = client
        .request(Method::GET, "/shops", Some(&json!({"ignored": true})))
        .await
        .unwrap();

    let request = &backend.requests()[0];
    assert!(request.body.is_empty());
    assert_eq!(request.content_type, None);
}

#[tokio::test]
async fn test_post_sends_json() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(Method::POST, "/appointments", 201, json!({"id": "apt-1"}));
    let client = backend.client(Arc::new(MemoryStore::new()));

    let created: Value = client
        .post("/appointments", &json!({"serviceId": "svc-1"}))
        .await
        .unwrap();

    assert_eq!(created["id"], "apt-1");
    let request = &backend.requests()[0];
    assert_eq!(request.content_type.as_deref(), Some("application/json"));
    assert_eq!(request.json(), json!({"serviceId": "svc-1"}));
}

#[tokio::test]
async fn test_backend_message_is_surfaced_verbatim() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(
        Method::GET,
        "/auth/profile",
        401,
        error_body("Token has been revoked"),
    );
    let client = backend.client(Arc::new(MemoryStore::new()));

    let err = client.get::<Value>("/auth/profile").await.unwrap_err();

    assert_eq!(err.to_string(), "Token has been revoked");
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_validation_messages_are_joined() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(
        Method::POST,
        "/auth/register",
        400,
        json!({"message": ["email must be an email", "firstName should not be empty"]}),
    );
    let client = backend.client(Arc::new(MemoryStore::new()));

    let err = client
        .post::<Value, _>("/auth/register", &json!({}))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "email must be an email; firstName should not be empty"
    );
}

#[tokio::test]
async fn test_missing_endpoint_reports_status_code() {
    let backend = StubBackend::start().await.unwrap();
    let client = backend.client(Arc::new(MemoryStore::new()));

    let err = client.get::<Value>("/nowhere").await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.to_string(), "HTTP error! status: 404");
}

#[tokio::test]
async fn test_non_json_error_body_reports_status_code() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond_raw(Method::GET, "/shops", 502, "<html>Bad Gateway</html>");
    let client = backend.client(Arc::new(MemoryStore::new()));

    let err = client.get::<Value>("/shops").await.unwrap_err();

    assert_eq!(err.to_string(), "HTTP error! status: 502");
}

#[tokio::test]
async fn test_empty_success_body_decodes_as_unit() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond_raw(Method::DELETE, "/appointments/apt-1", 204, "");
    let client = backend.client(Arc::new(MemoryStore::new()));

    client.delete::<()>("/appointments/apt-1").await.unwrap();
}

#[tokio::test]
async fn test_mismatched_success_body_is_an_invalid_response() {
    let backend = StubBackend::start().await.unwrap();
    backend.respond(Method::GET, "/auth/profile", 200, json!({"unexpected": true}));
    let client = backend.client(Arc::new(MemoryStore::new()));

    let err = client
        .get::<barbertime_core::Identity>("/auth/profile")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() {
    let config = ClientConfig::new("http://127.0.0.1:9/api/v1").unwrap();
    let client = ApiClient::new(&config, Arc::new(MemoryStore::new())).unwrap();

    let err = client.get::<Value>("/shops").await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.to_string().starts_with("network error"));
}

#[tokio::test]
async fn test_truncated_error_body_still_reports_status_code() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Announces a 100-byte body, sends a few bytes, then hangs up.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0_u8; 4096];
        let _ = socket.read(&mut request).await.unwrap();
        socket
            .write_all(
                b"HTTP/1.1 503 Service Unavailable\r\n\
                  Content-Type: application/json\r\n\
                  Content-Length: 100\r\n\r\n{\"mess",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let config = ClientConfig::new(&format!("http://{addr}/api/v1")).unwrap();
    let client = ApiClient::new(&config, Arc::new(MemoryStore::new())).unwrap();

    let err = client.get::<Value>("/shops").await.unwrap_err();
    server.await.unwrap();

    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert!(matches!(err, ApiError::RequestFailed { .. }));
    assert_eq!(err.to_string(), "HTTP error! status: 503");
}
