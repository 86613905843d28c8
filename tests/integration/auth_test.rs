//! Integration tests for the login flow, persistence and the server gate.

mod helpers;

use std::sync::Arc;

use turqa_auth::{
    Authenticator, GateDecision, GuardState, RemoteAuthenticator, SessionState, SessionStore,
};
use turqa_core::ErrorKind;
use turqa_core::config::RemoteAuthConfig;
use turqa_core::traits::KeyValueStore;
use turqa_entity::session::Session;
use turqa_entity::user::UserRole;
use turqa_storage::{FileStore, MemoryStore};

use helpers::{ADMIN_EMAIL, ADMIN_PASSWORD, AGENT_EMAIL, AGENT_PASSWORD, TestApp};

#[tokio::test]
async fn test_admin_login_persists_and_authorizes() {
    let app = TestApp::started().await;
    let (mut guard, navigator) = app.guard_at("/admin");
    assert!(matches!(guard.state(), GuardState::Redirecting { .. }));

    let session = app.store.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    assert_eq!(session.role, UserRole::Admin);
    assert_eq!(session.user_id, "1");
    assert_eq!(session.email, ADMIN_EMAIL);

    let raw = app.persisted_session().await.expect("session persisted");
    assert_eq!(Session::from_persisted(&raw).unwrap(), session);
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["role"], "admin");
    assert_eq!(json["id"], "1");

    assert_eq!(guard.reevaluate(), &GuardState::Authorized);
    assert_eq!(navigator.replacements().len(), 1);
}

#[tokio::test]
async fn test_wrong_credentials_change_nothing() {
    let app = TestApp::started().await;
    let (mut guard, navigator) = app.guard_at("/admin/login");
    assert_eq!(guard.state(), &GuardState::Checking);

    let err = app.store.login("wrong@x.com", "bad").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    assert_eq!(app.store.current_session().unwrap(), None);
    assert_eq!(app.persisted_session().await, None);

    assert_eq!(guard.reevaluate(), &GuardState::Checking);
    assert!(navigator.replacements().is_empty());
}

#[tokio::test]
async fn test_wrong_password_keeps_existing_session() {
    let app = TestApp::started().await;
    let agent = app.store.login(AGENT_EMAIL, AGENT_PASSWORD).await.unwrap();

    let err = app.store.login(ADMIN_EMAIL, "not-the-password").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    assert_eq!(app.store.current_session().unwrap(), Some(agent.clone()));

    let raw = app.persisted_session().await.unwrap();
    assert_eq!(Session::from_persisted(&raw).unwrap(), agent);
}

#[tokio::test]
async fn test_unreachable_backend_surfaces_service_unavailable() {
    let remote = RemoteAuthenticator::new(&RemoteAuthConfig {
        url: "http://127.0.0.1:9".into(),
        api_key: "anon".into(),
        timeout_seconds: 2,
    })
    .unwrap();
    let authenticator: Arc<dyn Authenticator> = Arc::new(remote);

    let config = helpers::test_config();
    let store = SessionStore::new(
        authenticator,
        Arc::new(MemoryStore::new()),
        helpers::signer(&config),
        &config.session,
    );
    store.initialize().await;

    let err = store.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    assert!(err.is_retryable());
    assert_eq!(store.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_session_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();

    let first = TestApp::with_storage(Arc::new(FileStore::new(dir.path()).await.unwrap()));
    first.store.initialize().await;
    let session = first.store.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    drop(first);

    let second = TestApp::with_storage(Arc::new(FileStore::new(dir.path()).await.unwrap()));
    second.store.initialize().await;
    assert_eq!(second.store.current_session().unwrap(), Some(session));

    second.store.logout().await;
    let third = TestApp::with_storage(Arc::new(FileStore::new(dir.path()).await.unwrap()));
    third.store.initialize().await;
    assert_eq!(third.store.current_session().unwrap(), None);
}

#[tokio::test]
async fn test_corrupted_records_on_disk_are_cleared() {
    let payloads = [
        "",
        "null",
        "[]",
        "{\"id\":\"1\",\"email\":\"a@b.c\"}",
        "{\"id\":\"1\",\"email\":\"a@b.c\",\"name\":\"A\",\"role\":\"owner\"}",
        "{\"id\":\"\",\"email\":\"a@b.c\",\"name\":\"A\",\"role\":\"user\"}",
        "\u{feff}garbage",
    ];

    for payload in payloads {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileStore::new(dir.path()).await.unwrap());
        storage.set("turqaUser", payload).await.unwrap();
        storage.set("auth-token", "stale").await.unwrap();

        let app = TestApp::with_storage(storage.clone());
        app.store.initialize().await;

        assert_eq!(app.store.current_session().unwrap(), None, "payload {payload:?}");
        assert_eq!(storage.get("turqaUser").await.unwrap(), None, "payload {payload:?}");
        assert_eq!(storage.get("auth-token").await.unwrap(), None, "payload {payload:?}");
    }
}

#[tokio::test]
async fn test_gate_follows_login_and_logout() {
    let app = TestApp::started().await;
    let gate = app.gate();

    let token = app.store.auth_cookie().await;
    assert_eq!(
        gate.check_token(token.as_deref(), "/admin/listings"),
        GateDecision::RedirectToLogin("/admin/login".into())
    );

    app.store.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    let token = app.store.auth_cookie().await.expect("cookie stored");
    let header = format!("auth-token={token}");
    match gate.check(Some(&header), "/admin/listings") {
        GateDecision::Allow(claims) => {
            assert_eq!(claims.sub, "1");
            assert_eq!(claims.role, UserRole::Admin);
        }
        other => panic!("expected Allow, got {other:?}"),
    }

    app.store.logout().await;
    let token = app.store.auth_cookie().await;
    assert!(!gate.check_token(token.as_deref(), "/admin").is_allowed());
}

#[tokio::test]
async fn test_gate_rejects_cookie_from_another_secret() {
    let app = TestApp::started().await;
    app.store.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    let token = app.store.auth_cookie().await.unwrap();

    let mut other = helpers::test_config();
    other.auth.cookie_secret = "someone-else".into();
    let foreign_gate = turqa_auth::ServerGate::new(other.routes.clone(), helpers::signer(&other));
    assert!(!foreign_gate.check_token(Some(&token), "/admin").is_allowed());
}
