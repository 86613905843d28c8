//! # turqa-storage
//!
//! [`KeyValueStore`](turqa_core::traits::KeyValueStore) implementations
//! backing the persisted session record and the auth cookie:
//!
//! - **memory**: in-process store using [moka](https://crates.io/crates/moka),
//!   scoped to the process (tests, embedded use)
//! - **file**: one file per key under a directory, surviving restarts
//!   (the CLI's equivalent of browser-local storage)

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;
