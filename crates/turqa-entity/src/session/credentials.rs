//! Login credentials.

use std::fmt;

/// A transient email/password pair.
///
/// Lives only for the duration of a login call. Not serializable, and the
/// password never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Build credentials, normalizing the email (trimmed, lowercase).
    pub fn new(email: impl AsRef<str>, password: impl Into<String>) -> Self {
        Self {
            email: email.as_ref().trim().to_lowercase(),
            password: password.into(),
        }
    }

    /// Normalized email.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Plaintext password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
