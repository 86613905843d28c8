//! The `auth-token` cookie.
//!
//! The cookie value is an HS256 JWT. Server-side gating verifies the
//! signature and expiry instead of trusting mere presence of the cookie.

pub mod claims;

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use turqa_core::config::{AuthConfig, SessionConfig};
use turqa_core::error::AppError;
use turqa_entity::session::Session;

pub use claims::CookieClaims;

/// Clock skew tolerated when checking expiry.
const LEEWAY_SECONDS: u64 = 5;

/// A cookie ready to be stored or sent as `Set-Cookie`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCookie {
    /// Cookie name.
    pub name: String,
    /// Signed token.
    pub value: String,
    /// Cookie path.
    pub path: String,
    /// Lifetime.
    pub max_age: Duration,
}

impl AuthCookie {
    /// Render as a `Set-Cookie` header value.
    pub fn to_set_cookie(&self) -> String {
        format!(
            "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite=Lax",
            self.name,
            self.value,
            self.path,
            self.max_age.as_secs()
        )
    }

    /// `Set-Cookie` value that clears the cookie named `name`.
    pub fn removal(name: &str) -> String {
        format!("{name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
    }
}

/// Extracts the value of cookie `name` from a `Cookie` request header.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Issues and verifies auth cookies.
#[derive(Clone)]
pub struct CookieSigner {
    /// HMAC key for signing.
    encoding_key: EncodingKey,
    /// HMAC key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
    /// Cookie name.
    name: String,
    /// Cookie lifetime.
    ttl: Duration,
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSigner")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl CookieSigner {
    /// Creates a signer from configuration.
    pub fn new(auth: &AuthConfig, session: &SessionConfig) -> Self {
        Self::with_secret(
            auth.cookie_secret.as_bytes(),
            &session.cookie_name,
            Duration::from_secs(auth.cookie_ttl_hours * 3600),
        )
    }

    /// Creates a signer from a raw secret.
    pub fn with_secret(secret: &[u8], name: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = LEEWAY_SECONDS;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            name: name.to_string(),
            ttl,
        }
    }

    /// Cookie name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Issues a cookie for `session`.
    pub fn issue(&self, session: &Session) -> Result<AuthCookie, AppError> {
        let now = Utc::now();
        let claims = CookieClaims {
            sub: session.user_id.clone(),
            email: session.email.clone(),
            role: session.role,
            iat: now.timestamp(),
            exp: now.timestamp() + self.ttl.as_secs() as i64,
        };

        let value = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign auth cookie: {e}")))?;

        Ok(AuthCookie {
            name: self.name.clone(),
            value,
            path: "/".to_string(),
            max_age: self.ttl,
        })
    }

    /// Verifies a cookie value, returning its claims.
    pub fn verify(&self, token: &str) -> Result<CookieClaims, AppError> {
        decode::<CookieClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Auth cookie rejected");
                AppError::unauthorized(format!("Invalid auth cookie: {e}"))
            })
    }
}
