//! Storage layer for grove
//!
//! Providers persist group subtrees; the state and project providers share
//! the nested record format in [`record`].

pub mod dynamic;
pub mod kv;
pub mod migration;
pub mod project;
pub mod provider;
pub mod record;
pub mod sqlite;
pub mod state;

pub use dynamic::DynamicProvider;
pub use kv::{KeyValueStore, MemoryStore};
pub use migration::{MigrationOutcome, migrate};
pub use project::ProjectFileProvider;
pub use provider::StorageProvider;
pub use record::{GroupMap, GroupRecord};
pub use sqlite::SqliteStore;
pub use state::StateProvider;
