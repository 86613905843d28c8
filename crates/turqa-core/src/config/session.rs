//! Session persistence and route configuration.

use serde::{Deserialize, Serialize};

/// Session persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Storage key holding the persisted session record.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Name of the auth cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Directory used by the file-backed store.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            cookie_name: default_cookie_name(),
            storage_dir: default_storage_dir(),
        }
    }
}

/// Protected route configuration shared by the route guard and the
/// server-side gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Path of the login page.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Path prefixes that require a session.
    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: Vec<String>,
}

impl RoutesConfig {
    /// Whether `path` is the login page (query string and trailing slash ignored).
    pub fn is_login_path(&self, path: &str) -> bool {
        normalize_path(path) == normalize_path(&self.login_path)
    }

    /// Whether `path` falls under a protected prefix and is not the login page.
    pub fn is_protected(&self, path: &str) -> bool {
        if self.is_login_path(path) {
            return false;
        }
        let path = normalize_path(path);
        self.protected_prefixes.iter().any(|prefix| {
            let prefix = normalize_path(prefix);
            path == prefix || path.starts_with(&format!("{prefix}/"))
        })
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            protected_prefixes: default_protected_prefixes(),
        }
    }
}

/// Strips the query string, fragment and trailing slash (except for `/`).
fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

fn default_storage_key() -> String {
    "turqaUser".to_string()
}

fn default_cookie_name() -> String {
    "auth-token".to_string()
}

fn default_storage_dir() -> String {
    "data/session".to_string()
}

fn default_login_path() -> String {
    "/admin/login".to_string()
}

fn default_protected_prefixes() -> Vec<String> {
    vec!["/admin".to_string()]
}
