//! Session domain entities.

pub mod credentials;
pub mod model;

pub use credentials::Credentials;
pub use model::{Session, SessionPayload};
