use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A throwaway project directory with its own `.grove` root.
pub struct E2EFixture {
    pub dir: TempDir,
}

impl E2EFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        println!("[E2E] project at {:?}", dir.path());
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn grove_root(&self) -> PathBuf {
        self.root().join(".grove")
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write file");
        path
    }

    pub fn run(&self, args: &[&str]) -> Output {
        let output = Command::cargo_bin("grove")
            .expect("grove binary")
            .current_dir(self.root())
            .env("GROVE_ROOT", self.grove_root())
            .env_remove("GROVE_STORAGE_PROVIDERS")
            .env_remove("GROVE_STATE_BACKEND")
            .env_remove("GROVE_PROJECT_FILE")
            .arg("--config")
            .arg(self.root().join("grove.toml"))
            .arg("--robot")
            .args(args)
            .output()
            .expect("run grove");
        println!("[E2E] grove {args:?} -> {}", output.status);
        output
    }

    /// Run in robot mode and return the `data` payload, failing on error.
    pub fn data(&self, args: &[&str]) -> Value {
        let output = self.run(args);
        let json: Value = serde_json::from_slice(&output.stdout).expect("robot json");
        assert!(output.status.success(), "grove {args:?}: {json}");
        assert_eq!(json["status"], "ok");
        json["data"].clone()
    }
}

pub fn names(data: &Value) -> Vec<String> {
    data["groups"]
        .as_array()
        .expect("groups array")
        .iter()
        .map(|g| g["name"].as_str().or_else(|| g.as_str()).unwrap_or_default().to_string())
        .collect()
}
