//! Core traits defined in `turqa-core` and implemented by other crates.

pub mod storage;

pub use storage::KeyValueStore;
