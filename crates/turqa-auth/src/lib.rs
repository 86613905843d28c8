//! # turqa-auth
//!
//! Authentication and session gating for the Turqa Estate back office.
//!
//! ## Modules
//!
//! - `password`: Argon2id password hashing
//! - `authenticator`: the credential-check facade and its backends
//! - `cookie`: signed `auth-token` cookie issue and verification
//! - `session`: the session store (initialize, login, logout, observe)
//! - `guard`: client-side route guard state machine
//! - `gate`: server-side request gate backed by the auth cookie

pub mod authenticator;
pub mod cookie;
pub mod gate;
pub mod guard;
pub mod password;
pub mod session;

pub use authenticator::{Authenticator, DirectoryAuthenticator, RemoteAuthenticator};
pub use cookie::{AuthCookie, CookieClaims, CookieSigner};
pub use gate::{GateDecision, ServerGate};
pub use guard::{GuardState, GuardView, MemoryNavigator, Navigator, RouteGuard};
pub use password::PasswordHasher;
pub use session::{SessionState, SessionStore};
