//! Integration tests for the route guard driven by a live session store.

mod helpers;

use tokio::time::timeout;

use turqa_auth::{GuardState, GuardView, SessionState};

use helpers::{ADMIN_EMAIL, ADMIN_PASSWORD, AGENT_EMAIL, AGENT_PASSWORD, TestApp, WAIT};

/// Protected content renders exactly when a session exists.
fn assert_render_consistent(app: &TestApp, guard: &turqa_auth::RouteGuard) {
    let mut rendered = false;
    let view = guard.render(|| rendered = true);
    let has_session = matches!(app.store.state(), SessionState::Authenticated(_));
    match guard.state() {
        GuardState::Checking => assert_eq!(view, GuardView::Placeholder),
        GuardState::Authorized => assert!(has_session),
        GuardState::Redirecting { .. } => assert!(!has_session),
    }
    assert_eq!(rendered, guard.state() == &GuardState::Authorized);
}

#[tokio::test]
async fn test_no_decision_before_initialize() {
    let app = TestApp::new();
    let (mut guard, navigator) = app.guard_at("/admin/listings");
    assert_eq!(guard.state(), &GuardState::Checking);
    assert_eq!(guard.render(|| "listings"), GuardView::Placeholder);
    assert!(navigator.replacements().is_empty());

    app.store.initialize().await;
    let state = timeout(WAIT, guard.changed()).await.unwrap();
    assert!(matches!(state, Some(GuardState::Redirecting { .. })));
    assert_eq!(navigator.replacements(), vec!["/admin/login".to_string()]);
}

#[tokio::test]
async fn test_starting_on_login_page_never_redirects() {
    let app = TestApp::new();
    let (mut guard, navigator) = app.guard_at("/admin/login");

    app.store.initialize().await;
    timeout(WAIT, guard.changed()).await.unwrap();
    guard.reevaluate();

    assert_eq!(guard.state(), &GuardState::Checking);
    assert!(navigator.replacements().is_empty());
}

#[tokio::test]
async fn test_redirect_lands_on_login_without_loop() {
    let app = TestApp::started().await;
    let (mut guard, navigator) = app.guard_at("/admin/inquiries");
    assert_eq!(navigator.current(), "/admin/login");

    let state = timeout(WAIT, guard.changed()).await.unwrap();
    assert_eq!(state, Some(GuardState::Checking));
    for _ in 0..3 {
        guard.reevaluate();
    }
    assert_eq!(navigator.replacements().len(), 1);
}

#[tokio::test]
async fn test_login_while_watching_authorizes() {
    let app = TestApp::started().await;
    let (mut guard, _navigator) = app.guard_at("/admin");
    timeout(WAIT, guard.changed()).await.unwrap();

    app.store.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    let state = timeout(WAIT, guard.changed()).await.unwrap();
    assert_eq!(state, Some(GuardState::Authorized));
    assert_eq!(guard.render(|| "dashboard"), GuardView::Content("dashboard"));
}

#[tokio::test]
async fn test_render_consistent_across_transitions() {
    let app = TestApp::new();
    let (mut guard, navigator) = app.guard_at("/admin");
    assert_render_consistent(&app, &guard);

    app.store.initialize().await;
    guard.reevaluate();
    assert_render_consistent(&app, &guard);

    let steps: [(&str, Option<(&str, &str)>); 6] = [
        ("/admin/login", Some((AGENT_EMAIL, AGENT_PASSWORD))),
        ("/admin/listings", None),
        ("/admin/login", Some(("wrong@x.com", "bad"))),
        ("/admin", Some((ADMIN_EMAIL, ADMIN_PASSWORD))),
        ("/admin/blog", None),
        ("/admin/login", None),
    ];

    for (path, login) in steps {
        navigator.navigate(path);
        guard.reevaluate();
        assert_render_consistent(&app, &guard);

        match login {
            Some((email, password)) => {
                let _ = app.store.login(email, password).await;
            }
            None => app.store.logout().await,
        }
        guard.reevaluate();
        assert_render_consistent(&app, &guard);
        guard.reevaluate();
        assert_render_consistent(&app, &guard);
    }
}
