//! Property tests for grove.

mod determinism_tests;
mod forest_tests;
mod record_tests;
