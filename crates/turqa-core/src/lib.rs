//! # turqa-core
//!
//! Core crate for the Turqa Estate back office session gate. Contains the
//! configuration schemas, the key/value storage trait and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other Turqa crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
