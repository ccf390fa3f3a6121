//! Database backend implementations
//!
//! This module contains the native-library implementations of the
//! [`Backend`](crate::core::Backend) contract.

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryBackend;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
