//! Server-side gate for protected paths.
//!
//! Runs before a protected page is served. The decision depends only on the
//! request path and the `auth-token` cookie, which must carry a valid,
//! unexpired signature.

use tracing::debug;

use turqa_core::config::RoutesConfig;

use crate::cookie::{CookieClaims, CookieSigner, find_cookie};

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The path is not protected.
    Public,
    /// Protected path, valid cookie.
    Allow(CookieClaims),
    /// Protected path without a valid cookie; send the client to this path.
    RedirectToLogin(String),
}

impl GateDecision {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::RedirectToLogin(_))
    }
}

/// Checks requests against the protected route prefixes.
#[derive(Debug, Clone)]
pub struct ServerGate {
    routes: RoutesConfig,
    cookies: CookieSigner,
}

impl ServerGate {
    /// Creates a gate.
    pub fn new(routes: RoutesConfig, cookies: CookieSigner) -> Self {
        Self { routes, cookies }
    }

    /// Decide for a request to `path` carrying the given `Cookie` header.
    pub fn check(&self, cookie_header: Option<&str>, path: &str) -> GateDecision {
        let token = cookie_header.and_then(|h| find_cookie(h, self.cookies.name()));
        self.check_token(token, path)
    }

    /// Same as [`ServerGate::check`] for an already extracted cookie value.
    pub fn check_token(&self, token: Option<&str>, path: &str) -> GateDecision {
        if !self.routes.is_protected(path) {
            return GateDecision::Public;
        }

        match token.map(|t| self.cookies.verify(t)) {
            Some(Ok(claims)) => GateDecision::Allow(claims),
            Some(Err(_)) => {
                debug!(path, "Rejected request with invalid auth cookie");
                GateDecision::RedirectToLogin(self.routes.login_path.clone())
            }
            None => {
                debug!(path, "Rejected request without auth cookie");
                GateDecision::RedirectToLogin(self.routes.login_path.clone())
            }
        }
    }
}
