//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use turqa_auth::{
    CookieSigner, DirectoryAuthenticator, MemoryNavigator, RouteGuard, ServerGate, SessionStore,
};
use turqa_core::config::AppConfig;
use turqa_core::traits::KeyValueStore;
use turqa_entity::user::UserRole;
use turqa_storage::MemoryStore;

pub const ADMIN_EMAIL: &str = "admin@turqaestate.com";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const AGENT_EMAIL: &str = "agent@turqaestate.com";
pub const AGENT_PASSWORD: &str = "agent123";

/// Test application context
pub struct TestApp {
    /// Session store under test
    pub store: Arc<SessionStore>,
    /// Storage scope behind the store
    pub storage: Arc<dyn KeyValueStore>,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create an uninitialized app over fresh in-memory storage
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStore::new()))
    }

    /// Create an uninitialized app over the given storage
    pub fn with_storage(storage: Arc<dyn KeyValueStore>) -> Self {
        let config = test_config();
        let store = SessionStore::new(
            Arc::new(directory()),
            Arc::clone(&storage),
            signer(&config),
            &config.session,
        );
        Self {
            store: Arc::new(store),
            storage,
            config,
        }
    }

    /// Create and initialize
    pub async fn started() -> Self {
        let app = Self::new();
        app.store.initialize().await;
        app
    }

    /// A guard over this app's session, positioned at `path`
    pub fn guard_at(&self, path: &str) -> (RouteGuard, Arc<MemoryNavigator>) {
        let navigator = Arc::new(MemoryNavigator::new(path));
        let guard = RouteGuard::new(
            self.store.subscribe(),
            navigator.clone(),
            self.config.routes.clone(),
        );
        (guard, navigator)
    }

    /// The server-side gate for this app's cookie secret
    pub fn gate(&self) -> ServerGate {
        ServerGate::new(self.config.routes.clone(), signer(&self.config))
    }

    /// Raw persisted session record
    pub async fn persisted_session(&self) -> Option<String> {
        self.storage
            .get(&self.config.session.storage_key)
            .await
            .expect("storage read")
    }
}

/// Config used by every integration test
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.cookie_secret = "integration-test-secret".to_string();
    config
}

/// Cookie signer for a config
pub fn signer(config: &AppConfig) -> CookieSigner {
    CookieSigner::new(&config.auth, &config.session)
}

/// Directory with one admin and one regular account
pub fn directory() -> DirectoryAuthenticator {
    let mut dir = DirectoryAuthenticator::new().expect("directory");
    dir.add_account("1", ADMIN_EMAIL, "Turqa Admin", UserRole::Admin, ADMIN_PASSWORD)
        .expect("admin account");
    dir.add_account("2", AGENT_EMAIL, "Field Agent", UserRole::User, AGENT_PASSWORD)
        .expect("agent account");
    dir
}

/// Upper bound for waiting on async delivery in tests
pub const WAIT: Duration = Duration::from_secs(2);

/// Lower bound used to assert that nothing else arrives
pub const QUIET: Duration = Duration::from_millis(150);
