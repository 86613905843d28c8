//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Which credential backend verifies passwords.
    #[serde(default)]
    pub backend: AuthBackend,
    /// Hosted auth endpoint settings (used when `backend = "remote"`).
    #[serde(default)]
    pub remote: RemoteAuthConfig,
    /// Accounts known to the in-process directory backend.
    #[serde(default)]
    pub accounts: Vec<AccountSeed>,
    /// Secret key for signing the auth cookie (HMAC-SHA256).
    #[serde(default = "default_cookie_secret")]
    pub cookie_secret: String,
    /// Auth cookie lifetime in hours.
    #[serde(default = "default_cookie_ttl")]
    pub cookie_ttl_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            backend: AuthBackend::default(),
            remote: RemoteAuthConfig::default(),
            accounts: Vec::new(),
            cookie_secret: default_cookie_secret(),
            cookie_ttl_hours: default_cookie_ttl(),
        }
    }
}

/// Credential verification backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthBackend {
    /// Accounts listed under `[[auth.accounts]]`.
    #[default]
    Directory,
    /// Password grant against the hosted backend.
    Remote,
}

/// Hosted auth endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAuthConfig {
    /// Base URL of the hosted backend, e.g. `https://xyz.example.co`.
    #[serde(default)]
    pub url: String,
    /// Public (anon) API key sent as the `apikey` header.
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RemoteAuthConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// An account seeded into the directory backend.
///
/// Either `password_hash` (Argon2id PHC string) or `password` must be set.
/// A plaintext `password` is hashed once at startup and is meant for
/// development configs only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSeed {
    /// Stable user identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// `"admin"` or `"user"`.
    #[serde(default = "default_role")]
    pub role: String,
    /// Argon2id password hash.
    #[serde(default)]
    pub password_hash: Option<String>,
    /// Plaintext password (development only).
    #[serde(default)]
    pub password: Option<String>,
}

fn default_cookie_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_cookie_ttl() -> u64 {
    24
}

fn default_timeout() -> u64 {
    10
}

fn default_role() -> String {
    "user".to_string()
}
