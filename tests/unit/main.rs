//! Integration-level unit suites for grove.

mod config_tests;
mod manager_tests;
mod persistence_tests;
