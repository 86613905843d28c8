//! The credential-check facade.
//!
//! An [`Authenticator`] verifies an email/password pair and mints the
//! identity payload for a new session. It persists nothing; the session
//! store owns persistence.

pub mod directory;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;

use turqa_core::config::{AuthBackend, AuthConfig};
use turqa_core::result::AppResult;
use turqa_entity::session::{Credentials, SessionPayload};

pub use directory::DirectoryAuthenticator;
pub use remote::RemoteAuthenticator;

/// Verifies credentials against some backend.
#[async_trait]
pub trait Authenticator: Send + Sync + std::fmt::Debug + 'static {
    /// Verify `credentials` and return the backend-reported identity.
    ///
    /// Fails with `InvalidCredentials` when the pair does not match a known
    /// account (never distinguishing unknown email from wrong password),
    /// and with `ServiceUnavailable` when the backend cannot be reached.
    async fn authenticate(&self, credentials: &Credentials) -> AppResult<SessionPayload>;
}

/// Build the authenticator selected by `config.backend`.
pub fn from_config(config: &AuthConfig) -> AppResult<Arc<dyn Authenticator>> {
    match config.backend {
        AuthBackend::Directory => Ok(Arc::new(DirectoryAuthenticator::from_seeds(
            &config.accounts,
        )?)),
        AuthBackend::Remote => Ok(Arc::new(RemoteAuthenticator::new(&config.remote)?)),
    }
}
