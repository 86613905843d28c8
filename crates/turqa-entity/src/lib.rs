//! # turqa-entity
//!
//! Domain models shared by the session store, the auth backends and the
//! gates. Persisted models derive `Serialize`/`Deserialize`; credentials
//! deliberately do not.

pub mod session;
pub mod user;
