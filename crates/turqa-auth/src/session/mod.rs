//! Client-side session lifecycle: initialize, login, logout, observe.

pub mod state;
pub mod store;

pub use state::SessionState;
pub use store::SessionStore;
