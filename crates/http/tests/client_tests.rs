//! Integration tests for the EduSync HTTP client

use std::sync::Arc;

use edusync_core::{AuthError, CredentialStore, MemoryCredentialStore, Role};
use edusync_http::types::RegisterRequest;
use edusync_http::{ApiClient, AuthApi, ClientError, PublicClient, SessionManager, SessionState};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager_for(server: &MockServer) -> (Arc<SessionManager>, Arc<MemoryCredentialStore>) {
    let http = PublicClient::new(server.uri()).expect("client should build");
    let store = Arc::new(MemoryCredentialStore::new());
    let manager = SessionManager::new(store.clone(), Arc::new(AuthApi::new(http)));
    (manager, store)
}

#[tokio::test]
async fn test_client_builder() {
    let client = PublicClient::builder()
        .base_url("http://localhost:5109/api/")
        .build();

    assert!(client.is_ok());
    let client = client.unwrap();
    assert_eq!(client.base_url(), "http://localhost:5109/api");
}

#[tokio::test]
async fn test_client_builder_requires_base_url() {
    let result = PublicClient::builder().build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_login_builds_session_from_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(json!({"email": "a@b.com", "password": "x"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "t1.p.s",
            "refreshToken": "r1",
            "userId": "1",
            "role": "Instructor"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (manager, store) = manager_for(&server);
    let session = manager.login("a@b.com", "x").await.unwrap();

    assert_eq!(session.role, Role::Instructor);
    assert_eq!(session.name, "a");
    assert_eq!(session.user_id, "1");
    assert_eq!(manager.state(), SessionState::Authenticated);
    assert_eq!(store.load(), Some(session));
}

#[tokio::test]
async fn test_login_failure_carries_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let (manager, store) = manager_for(&server);
    let err = manager.login("a@b.com", "wrong").await.unwrap_err();

    assert_eq!(err, AuthError::authentication_failed("Invalid credentials"));
    assert_eq!(manager.state(), SessionState::Unauthenticated);
    assert_eq!(store.load(), None);
}

#[tokio::test]
async fn test_register_always_sends_student_role() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_partial_json(json!({"role": "student"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let (manager, _) = manager_for(&server);
    let profile = RegisterRequest {
        name: "Mallory".to_string(),
        email: "m@b.com".to_string(),
        password: "pw".to_string(),
        role: "instructor".to_string(),
    };

    manager.register(profile).await.unwrap();
    // No session is established by registration.
    assert_eq!(manager.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_register_failure_surfaces_validation_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Email is already taken"})),
        )
        .mount(&server)
        .await;

    let (manager, _) = manager_for(&server);
    let profile = RegisterRequest {
        name: "Mallory".to_string(),
        email: "m@b.com".to_string(),
        password: "pw".to_string(),
        role: String::new(),
    };

    let err = manager.register(profile).await.unwrap_err();
    assert_eq!(err, AuthError::registration_failed("Email is already taken"));
}

#[tokio::test]
async fn test_non_auth_errors_propagate_with_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/courses"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&server)
        .await;

    let (manager, _) = manager_for(&server);
    let client = ApiClient::new(
        PublicClient::new(server.uri()).unwrap(),
        manager,
    );

    let err = client.get::<serde_json::Value>("/courses").await.unwrap_err();
    match err {
        ClientError::ServerError { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected ServerError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthenticated_request_is_rejected_without_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/courses"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (manager, _) = manager_for(&server);
    let client = ApiClient::new(PublicClient::new(server.uri()).unwrap(), manager);

    // No session: the request goes out unauthenticated and the 401 comes
    // straight back to the caller.
    let err = client.get::<serde_json::Value>("/courses").await.unwrap_err();
    assert!(err.is_unauthorized());
}
