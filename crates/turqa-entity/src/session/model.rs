//! Session entity model.

use serde::{Deserialize, Serialize};

use turqa_core::{AppError, AppResult};

use crate::user::UserRole;

/// The currently authenticated identity.
///
/// Persisted as `{id, email, name, role}`. A session is either fully
/// populated or absent: [`Session::from_persisted`] and
/// [`SessionPayload::into_session`] reject records with empty fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Backend user identifier.
    #[serde(rename = "id")]
    pub user_id: String,
    /// Login email.
    pub email: String,
    /// Name shown in the back office header.
    #[serde(rename = "name")]
    pub display_name: String,
    /// Back office role.
    pub role: UserRole,
}

impl Session {
    /// Decode a persisted session record.
    ///
    /// Any parse failure or missing/empty field is reported as
    /// `CorruptedSessionState`.
    pub fn from_persisted(raw: &str) -> AppResult<Self> {
        let session: Session = serde_json::from_str(raw).map_err(|e| {
            AppError::with_source(
                turqa_core::ErrorKind::CorruptedSessionState,
                format!("Persisted session is not valid JSON: {e}"),
                e,
            )
        })?;
        session.validate()?;
        Ok(session)
    }

    /// Encode for persistence.
    pub fn to_persisted(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Whether this session belongs to an administrator.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    fn validate(&self) -> AppResult<()> {
        let missing = [
            ("id", &self.user_id),
            ("email", &self.email),
            ("name", &self.display_name),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        match missing {
            Some((field, _)) => Err(AppError::corrupted_session(format!(
                "Session field '{field}' is empty"
            ))),
            None => Ok(()),
        }
    }
}

/// Identity reported by an auth backend after a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    /// Backend user identifier.
    pub user_id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Back office role.
    pub role: UserRole,
}

impl SessionPayload {
    /// Turn the payload into a session, rejecting partial identities.
    pub fn into_session(self) -> AppResult<Session> {
        let session = Session {
            user_id: self.user_id,
            email: self.email,
            display_name: self.display_name,
            role: self.role,
        };
        session.validate().map_err(|e| {
            AppError::service_unavailable(format!(
                "Auth backend returned a partial identity: {}",
                e.message
            ))
        })?;
        Ok(session)
    }
}
