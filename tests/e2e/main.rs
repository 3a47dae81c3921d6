//! E2E test suite entry point.

mod fixture;
mod legacy_workflow;
mod project_workflow;
