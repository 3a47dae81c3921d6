use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::{Config, StateBackend};
use crate::core::Resource;
use crate::storage::{MemoryStore, ProjectFileProvider, StateProvider};

/// Test fixture providing an isolated project directory.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitTestFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {data_path:?}");

        Self {
            temp_dir,
            data_path,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.data_path
    }

    /// Create a test file with content.
    #[must_use]
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Create a file and return it as a resource.
    #[must_use]
    pub fn resource(&self, relative_path: &str) -> Resource {
        let path = self.create_file(relative_path, "");
        Resource::from_path(&path).expect("fixture paths are absolute")
    }

    /// State provider over a fresh in-memory store.
    #[must_use]
    pub fn state_provider(&self) -> StateProvider<MemoryStore> {
        StateProvider::new(MemoryStore::new())
    }

    /// Project provider writing below the fixture directory.
    #[must_use]
    pub fn project_provider(&self) -> ProjectFileProvider {
        ProjectFileProvider::new(self.data_path.join(".grove/groups.json"))
    }

    /// Default config with an in-memory state backend.
    #[must_use]
    pub fn memory_config(&self) -> Config {
        let mut config = Config::default();
        config.storage.state_backend = StateBackend::Memory;
        config
    }
}

impl Drop for UnitTestFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.data_path);
    }
}
