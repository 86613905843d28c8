//! Client-side route guard for the protected admin area.
//!
//! The guard derives its state from two inputs, the session state and the
//! current path, and re-derives it whenever either changes:
//!
//! | session          | path        | state         |
//! |------------------|-------------|---------------|
//! | uninitialized    | any         | `Checking`    |
//! | authenticated    | any         | `Authorized`  |
//! | anonymous        | login page  | `Checking`    |
//! | anonymous        | other       | `Redirecting` |
//!
//! Staying in `Checking` on the login page is what keeps the guard from
//! redirecting the login page to itself.

pub mod navigator;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use turqa_core::config::RoutesConfig;

use crate::session::SessionState;

pub use navigator::{MemoryNavigator, Navigator};

/// Guard state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// Session not known yet, or nothing to decide.
    Checking,
    /// A session is present; protected content may render.
    Authorized,
    /// No session; the location is being replaced with `to`.
    Redirecting {
        /// Redirect target.
        to: String,
    },
}

/// What the guarded area should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView<T> {
    /// Neutral loading placeholder.
    Placeholder,
    /// The protected content.
    Content(T),
    /// Nothing; navigation to the given path is in flight.
    Redirect(String),
}

/// Pure state derivation.
pub fn evaluate(session: &SessionState, path: &str, routes: &RoutesConfig) -> GuardState {
    match session {
        SessionState::Uninitialized => GuardState::Checking,
        SessionState::Authenticated(_) => GuardState::Authorized,
        SessionState::Anonymous if routes.is_login_path(path) => GuardState::Checking,
        SessionState::Anonymous => GuardState::Redirecting {
            to: routes.login_path.clone(),
        },
    }
}

/// Reactive guard wrapping the protected area.
#[derive(Debug)]
pub struct RouteGuard {
    session: watch::Receiver<SessionState>,
    location: watch::Receiver<String>,
    navigator: Arc<dyn Navigator>,
    routes: RoutesConfig,
    state: GuardState,
}

impl RouteGuard {
    /// Build a guard and evaluate it once.
    pub fn new(
        session: watch::Receiver<SessionState>,
        navigator: Arc<dyn Navigator>,
        routes: RoutesConfig,
    ) -> Self {
        let location = navigator.location();
        let mut guard = Self {
            session,
            location,
            navigator,
            routes,
            state: GuardState::Checking,
        };
        guard.reevaluate();
        guard
    }

    /// Current state.
    pub fn state(&self) -> &GuardState {
        &self.state
    }

    /// Re-derive the state from the latest inputs.
    ///
    /// Entering `Redirecting` asks the navigator to replace the location,
    /// once per entry. The replacement is picked up by the next
    /// [`RouteGuard::changed`] like any other navigation.
    pub fn reevaluate(&mut self) -> &GuardState {
        let next = {
            let session = self.session.borrow_and_update();
            let path = self.location.borrow_and_update();
            evaluate(&session, &path, &self.routes)
        };
        if next == self.state {
            return &self.state;
        }

        debug!(from = ?self.state, to = ?next, "Guard state changed");
        if let GuardState::Redirecting { to } = &next {
            info!(to = %to, "No session, redirecting to login");
            self.navigator.replace(to);
        }
        self.state = next;
        &self.state
    }

    /// Wait for the session or the location to change, then re-evaluate.
    ///
    /// Returns `None` once the session source is gone.
    pub async fn changed(&mut self) -> Option<GuardState> {
        let open = tokio::select! {
            r = self.session.changed() => r.is_ok(),
            r = self.location.changed() => r.is_ok(),
        };
        if !open {
            return None;
        }
        Some(self.reevaluate().clone())
    }

    /// Render the guarded area. `content` only runs while authorized.
    pub fn render<T>(&self, content: impl FnOnce() -> T) -> GuardView<T> {
        match &self.state {
            GuardState::Checking => GuardView::Placeholder,
            GuardState::Authorized => GuardView::Content(content()),
            GuardState::Redirecting { to } => GuardView::Redirect(to.clone()),
        }
    }
}
