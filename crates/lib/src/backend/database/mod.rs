//! Document store implementations
//!
//! `InMemory` keeps collections in process memory, optionally snapshotted to a
//! JSON file. `Sqlite` (feature `sqlite`) stores one JSON document per row.

mod in_memory;
#[cfg(feature = "sqlite")]
pub mod sql;

pub use in_memory::InMemory;
#[cfg(feature = "sqlite")]
pub use sql::Sqlite;
