//! The session store: single owner of "who is logged in".

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, OnceCell, watch};
use tracing::{info, warn};

use turqa_core::config::SessionConfig;
use turqa_core::error::AppError;
use turqa_core::result::AppResult;
use turqa_core::traits::KeyValueStore;
use turqa_entity::session::{Credentials, Session};

use crate::authenticator::Authenticator;
use crate::cookie::CookieSigner;

use super::state::SessionState;

/// Holds the current session, persists it, and publishes every transition.
///
/// Only `initialize`, `login` and `logout` mutate the state. Everything
/// else reads it through [`SessionStore::subscribe`] or
/// [`SessionStore::state`] and re-reads on change rather than caching.
pub struct SessionStore {
    /// Credential check facade. Absent for stores that only read or clear.
    authenticator: Option<Arc<dyn Authenticator>>,
    /// Persistent storage scope (session record + auth cookie).
    storage: Arc<dyn KeyValueStore>,
    /// Auth cookie issuer.
    cookies: CookieSigner,
    /// Key of the persisted session record.
    storage_key: String,
    /// Current state, observable.
    state: watch::Sender<SessionState>,
    /// Completes exactly once.
    init: OnceCell<()>,
    /// Serializes state commits. Never held across a backend call.
    transition: Mutex<()>,
    /// Bumped by every logout; a login that saw an older value is discarded.
    generation: AtomicU64,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("storage_key", &self.storage_key)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl SessionStore {
    /// Creates an uninitialized store.
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        storage: Arc<dyn KeyValueStore>,
        cookies: CookieSigner,
        config: &SessionConfig,
    ) -> Self {
        Self::build(Some(authenticator), storage, cookies, config)
    }

    /// Creates a store that can restore, observe and clear the session
    /// but not sign in. `login` fails with a configuration error.
    pub fn without_authenticator(
        storage: Arc<dyn KeyValueStore>,
        cookies: CookieSigner,
        config: &SessionConfig,
    ) -> Self {
        Self::build(None, storage, cookies, config)
    }

    fn build(
        authenticator: Option<Arc<dyn Authenticator>>,
        storage: Arc<dyn KeyValueStore>,
        cookies: CookieSigner,
        config: &SessionConfig,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            authenticator,
            storage,
            cookies,
            storage_key: config.storage_key.clone(),
            state,
            init: OnceCell::new(),
            transition: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Reads the persisted session, if any.
    ///
    /// Never fails: unreadable or corrupted records are cleared and the
    /// store comes up anonymous. Runs its body exactly once; later and
    /// concurrent calls wait for the first one and return.
    pub async fn initialize(&self) {
        self.init
            .get_or_init(|| async {
                let _transition = self.transition.lock().await;
                let state = self.load_persisted().await;
                self.state.send_replace(state);
            })
            .await;
    }

    /// Whether `initialize` has completed.
    pub fn is_initialized(&self) -> bool {
        self.init.initialized()
    }

    /// Verifies credentials and, on success, stores the new session.
    ///
    /// On failure nothing changes: memory, storage and cookie keep their
    /// previous values and the facade's error is returned as is. A logout
    /// that happens while the backend call is in flight wins; the login
    /// then fails with `Unauthorized` and commits nothing.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Session> {
        self.initialize().await;
        let authenticator = self
            .authenticator
            .as_ref()
            .ok_or_else(|| AppError::configuration("No credential backend configured"))?;
        let credentials = Credentials::new(email, password);
        let generation = self.generation.load(Ordering::Acquire);

        let payload = authenticator
            .authenticate(&credentials)
            .await
            .inspect_err(|e| warn!(kind = %e.kind, "Login failed"))?;
        let session = payload.into_session()?;
        let cookie = self.cookies.issue(&session)?;

        let _transition = self.transition.lock().await;
        if self.generation.load(Ordering::Acquire) != generation {
            info!(user_id = %session.user_id, "Discarding login that raced a logout");
            return Err(AppError::unauthorized("Login superseded by logout"));
        }

        match session.to_persisted() {
            Ok(raw) => {
                if let Err(e) = self.storage.set(&self.storage_key, &raw).await {
                    warn!(error = %e, "Failed to persist session");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode session"),
        }
        if let Err(e) = self.storage.set(&cookie.name, &cookie.value).await {
            warn!(error = %e, "Failed to store auth cookie");
        }

        self.state
            .send_replace(SessionState::Authenticated(session.clone()));

        info!(
            user_id = %session.user_id,
            role = %session.role,
            "Login successful"
        );
        Ok(session)
    }

    /// Clears the session from memory and storage. Always succeeds.
    pub async fn logout(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.initialize().await;
        let _transition = self.transition.lock().await;

        let previous = self.state.send_replace(SessionState::Anonymous);
        self.clear_persisted().await;

        if let Some(session) = previous.session() {
            info!(user_id = %session.user_id, "Logout completed");
        }
    }

    /// Registers an observer. The receiver sees every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The current session.
    ///
    /// Calling this before `initialize` completed is a programming error
    /// and yields an `Internal` error.
    pub fn current_session(&self) -> AppResult<Option<Session>> {
        match &*self.state.borrow() {
            SessionState::Uninitialized => Err(AppError::internal(
                "Session store consulted before initialization",
            )),
            SessionState::Anonymous => Ok(None),
            SessionState::Authenticated(session) => Ok(Some(session.clone())),
        }
    }

    /// Raw value of the stored auth cookie, if any.
    pub async fn auth_cookie(&self) -> Option<String> {
        match self.storage.get(self.cookies.name()).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to read auth cookie");
                None
            }
        }
    }

    async fn load_persisted(&self) -> SessionState {
        let raw = match self.storage.get(&self.storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                // A cookie without a session record is stale.
                self.remove_quietly(self.cookies.name()).await;
                return SessionState::Anonymous;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session, starting anonymous");
                self.clear_persisted().await;
                return SessionState::Anonymous;
            }
        };

        match Session::from_persisted(&raw) {
            Ok(session) => {
                info!(user_id = %session.user_id, "Restored persisted session");
                SessionState::Authenticated(session)
            }
            Err(e) => {
                warn!(error = %e, "Discarding corrupted persisted session");
                self.clear_persisted().await;
                SessionState::Anonymous
            }
        }
    }

    async fn clear_persisted(&self) {
        self.remove_quietly(&self.storage_key).await;
        self.remove_quietly(self.cookies.name()).await;
    }

    async fn remove_quietly(&self, key: &str) {
        if let Err(e) = self.storage.remove(key).await {
            warn!(key, error = %e, "Failed to clear stored value");
        }
    }
}
