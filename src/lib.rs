//! grove - nestable groups of file and folder references, persisted across
//! interchangeable storage providers.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod manager;
pub mod storage;
pub mod test_utils;

pub use error::{GroveError, Result};
pub use manager::GroupManager;
