//! Observable session state.

use turqa_entity::session::Session;

/// What the session store currently knows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Persisted state has not been read yet.
    #[default]
    Uninitialized,
    /// Initialized, nobody is signed in.
    Anonymous,
    /// Initialized, a session is present.
    Authenticated(Session),
}

impl SessionState {
    /// Whether initialization has completed.
    pub fn is_initialized(&self) -> bool {
        !matches!(self, Self::Uninitialized)
    }

    /// The session, if one is present.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}
