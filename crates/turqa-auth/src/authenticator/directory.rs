//! In-process account directory backed by Argon2id hashes.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use turqa_core::config::AccountSeed;
use turqa_core::error::AppError;
use turqa_core::result::AppResult;
use turqa_entity::session::{Credentials, SessionPayload};
use turqa_entity::user::UserRole;

use crate::password::PasswordHasher;

use super::Authenticator;

/// A directory entry.
#[derive(Debug, Clone)]
struct Account {
    id: String,
    email: String,
    name: String,
    role: UserRole,
    password_hash: String,
}

/// Verifies credentials against a fixed set of accounts.
#[derive(Debug, Clone)]
pub struct DirectoryAuthenticator {
    /// Normalized email → account.
    accounts: HashMap<String, Account>,
    /// Hash verified for unknown emails so both failure paths do the same work.
    dummy_hash: String,
    /// Password hasher.
    hasher: PasswordHasher,
}

impl DirectoryAuthenticator {
    /// Creates an empty directory.
    pub fn new() -> AppResult<Self> {
        let hasher = PasswordHasher::new();
        let dummy_hash = hasher.hash_password("turqa-directory-dummy")?;
        Ok(Self {
            accounts: HashMap::new(),
            dummy_hash,
            hasher,
        })
    }

    /// Creates a directory from configuration seeds.
    ///
    /// Seeds carrying a plaintext `password` are hashed here.
    pub fn from_seeds(seeds: &[AccountSeed]) -> AppResult<Self> {
        let mut directory = Self::new()?;
        for seed in seeds {
            let role: UserRole = seed.role.parse()?;
            let password_hash = match (&seed.password_hash, &seed.password) {
                (Some(hash), _) => {
                    PasswordHasher::validate_hash(hash).map_err(|e| {
                        AppError::configuration(format!(
                            "Account '{}' has an unusable password_hash: {}",
                            seed.email, e.message
                        ))
                    })?;
                    hash.clone()
                }
                (None, Some(password)) => {
                    warn!(email = %seed.email, "Account seeded with a plaintext password");
                    directory.hasher.hash_password(password)?
                }
                (None, None) => {
                    return Err(AppError::configuration(format!(
                        "Account '{}' has neither password_hash nor password",
                        seed.email
                    )));
                }
            };
            directory.insert_hashed(&seed.id, &seed.email, &seed.name, role, password_hash)?;
        }
        info!(accounts = directory.len(), "Account directory loaded");
        Ok(directory)
    }

    /// Adds an account with a plaintext password.
    pub fn add_account(
        &mut self,
        id: &str,
        email: &str,
        name: &str,
        role: UserRole,
        password: &str,
    ) -> AppResult<()> {
        let hash = self.hasher.hash_password(password)?;
        self.insert_hashed(id, email, name, role, hash)
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the directory has no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn insert_hashed(
        &mut self,
        id: &str,
        email: &str,
        name: &str,
        role: UserRole,
        password_hash: String,
    ) -> AppResult<()> {
        let key = Credentials::new(email, String::new()).email().to_string();
        if key.is_empty() || id.trim().is_empty() || name.trim().is_empty() {
            return Err(AppError::validation(format!(
                "Account '{email}' needs a non-empty id, email and name"
            )));
        }
        if self.accounts.contains_key(&key) {
            return Err(AppError::validation(format!("Duplicate account '{key}'")));
        }
        self.accounts.insert(
            key.clone(),
            Account {
                id: id.to_string(),
                email: key,
                name: name.to_string(),
                role,
                password_hash,
            },
        );
        Ok(())
    }

    /// Runs the Argon2 check off the async executor.
    async fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
    }
}

#[async_trait]
impl Authenticator for DirectoryAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> AppResult<SessionPayload> {
        let Some(account) = self.accounts.get(credentials.email()) else {
            // Burn the same work as a real check before failing.
            let _ = self.verify(credentials.password(), &self.dummy_hash).await;
            debug!("Login rejected");
            return Err(AppError::invalid_credentials());
        };

        match self.verify(credentials.password(), &account.password_hash).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Login rejected");
                return Err(AppError::invalid_credentials());
            }
            Err(e) => {
                warn!(error = %e, "Password check failed, rejecting login");
                return Err(AppError::invalid_credentials());
            }
        }

        Ok(SessionPayload {
            user_id: account.id.clone(),
            email: account.email.clone(),
            display_name: account.name.clone(),
            role: account.role,
        })
    }
}
