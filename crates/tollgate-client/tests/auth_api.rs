//! Integration tests for the auth and console APIs.

use serde_json::json;
use tollgate_client::{
    ConsoleRequest, CredentialField, CredentialStore, Error, Method, Session, SessionEvent,
    TollgateClient,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn auth_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "user_id": "user-1",
        "device_id": "device-1",
        "access_token": access,
        "refresh_token": refresh,
    })
}

fn client_for(server: &MockServer, session: Session) -> TollgateClient {
    TollgateClient::builder()
        .base_url(format!("{}/api/v1", server.uri()))
        .session(session)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_login_stores_all_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({"email": "a@b.com", "password": "x"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("acc", "ref")))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::in_memory();
    let mut events = session.subscribe();
    let client = client_for(&server, session.clone());

    let auth = client.auth().login("a@b.com", "x").await.unwrap();
    assert_eq!(auth.access_token, "acc");

    let store = session.store();
    assert_eq!(store.access_token().as_deref(), Some("acc"));
    assert_eq!(store.refresh_token().as_deref(), Some("ref"));
    assert_eq!(store.device_id().as_deref(), Some("device-1"));
    assert_eq!(store.user_id().as_deref(), Some("user-1"));
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::Established {
            user_id: "user-1".to_string()
        }
    );
}

#[tokio::test]
async fn test_register_and_oauth_establish_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .and(body_json(json!({"email": "new@b.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(auth_body("reg", "reg-r")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/oauth"))
        .and(body_json(json!({"provider": "google", "id_token": "idt"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("oa", "oa-r")))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::in_memory();
    let client = client_for(&server, session.clone());

    client.auth().register("new@b.com", "pw").await.unwrap();
    assert_eq!(session.store().access_token().as_deref(), Some("reg"));

    client.auth().oauth("google", "idt").await.unwrap();
    assert_eq!(session.store().access_token().as_deref(), Some("oa"));
    assert_eq!(session.store().refresh_token().as_deref(), Some("oa-r"));
}

#[tokio::test]
async fn test_failed_login_leaves_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "bad credentials"})),
        )
        .mount(&server)
        .await;

    let session = Session::in_memory();
    let client = client_for(&server, session.clone());

    let err = client.auth().login("a@b.com", "wrong").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Api { status: 401, ref message, .. } if message == "bad credentials"
    ));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_password_reset_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/password-reset/request"))
        .and(body_json(json!({"email": "a@b.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "sent"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/password-reset/confirm"))
        .and(body_json(json!({"token": "tok", "new_password": "n3w"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "updated"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Session::in_memory());
    let sent = client.auth().request_password_reset("a@b.com").await.unwrap();
    assert_eq!(sent.message, "sent");

    let done = client
        .auth()
        .confirm_password_reset("tok", "n3w")
        .await
        .unwrap();
    assert_eq!(done.message, "updated");
}

#[tokio::test]
async fn test_logout_is_local() {
    let server = MockServer::start().await;
    let session = Session::in_memory();
    session
        .store()
        .save_auth(&serde_json::from_value(auth_body("a", "r")).unwrap())
        .unwrap();
    let mut events = session.subscribe();
    let client = client_for(&server, session.clone());

    client.auth().logout().unwrap();

    for field in CredentialField::ALL {
        assert!(session.store().get(field).is_none());
    }
    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_then_expired_token_scenario() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({"email": "a@b.com", "password": "x"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("expired-1", "valid")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/profile"))
        .and(header("authorization", "Bearer expired-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(body_json(json!({"refresh_token": "valid"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/profile"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": "a@b.com"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/profile"))
        .and(header("authorization", "Bearer expired-2"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(body_json(json!({"refresh_token": "revoked"})))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "revoked"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::in_memory();
    let mut events = session.subscribe();
    let client = client_for(&server, session.clone());

    let auth = client.auth().login("a@b.com", "x").await.unwrap();
    assert_eq!(auth.refresh_token, "valid");

    let profile = client
        .console()
        .execute(ConsoleRequest::new(Method::GET, "profile"))
        .await
        .unwrap();
    assert_eq!(profile.status, 200);
    assert_eq!(profile.json().unwrap()["email"], "a@b.com");

    session.store().set_access_token("expired-2").unwrap();
    session.store().set_refresh_token("revoked").unwrap();

    let err = client
        .console()
        .execute(ConsoleRequest::new(Method::GET, "profile"))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!session.is_authenticated());
    assert!(session.store().refresh_token().is_none());

    let mut invalidated_at = None;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Invalidated { login_path, .. } = event {
            invalidated_at = Some(login_path);
        }
    }
    assert_eq!(invalidated_at.as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_console_reports_error_status_as_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/items/7"))
        .and(query_param("force", "true"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "in use"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Session::in_memory());
    let response = client
        .console()
        .execute(ConsoleRequest::new(Method::DELETE, "items/7").with_query("force", "true"))
        .await
        .unwrap();

    assert_eq!(response.status, 409);
    assert_eq!(response.status_text, "Conflict");
    assert!(response.pretty_body().contains("\"message\": \"in use\""));
}

#[tokio::test]
async fn test_console_manual_bearer_used_without_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/notes"))
        .and(header("authorization", "Bearer manual"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Session::in_memory());
    let response = client
        .console()
        .execute(ConsoleRequest::new(Method::POST, "/notes").with_bearer("manual"))
        .await
        .unwrap();
    assert!(response.is_success());
}

#[tokio::test]
async fn test_console_path_with_colon_stays_under_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/documents:batchGet"))
        .and(body_json(json!({"ids": [1, 2]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documents": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Session::in_memory());
    let response = client
        .console()
        .execute(
            ConsoleRequest::new(Method::POST, "/documents:batchGet")
                .with_body(r#"{"ids": [1, 2]}"#),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.json(), Some(json!({"documents": []})));
}
