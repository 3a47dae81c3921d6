//! Project-scoped provider persisting the group map in a JSON file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::PROJECT_PROVIDER;
use crate::core::{GroupId, GroupTree};
use crate::error::{GroveError, Result};
use crate::storage::migration::CURRENT_STORE_VERSION;
use crate::storage::provider::StorageProvider;
use crate::storage::record::{GroupMap, build_forest, remove_record, store_tree};

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    groups: GroupMap,
}

pub struct ProjectFileProvider {
    path: PathBuf,
}

impl ProjectFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<ProjectFile> {
        if !self.path.exists() {
            return Ok(ProjectFile::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(ProjectFile::default());
        }
        let file: ProjectFile = serde_json::from_str(&raw).map_err(|err| {
            GroveError::Serialization(format!("{}: {err}", self.path.display()))
        })?;
        if file.version > CURRENT_STORE_VERSION {
            warn!(
                path = %self.path.display(),
                version = file.version,
                "project group file was written by a newer grove"
            );
        }
        Ok(file)
    }

    fn write(&self, groups: GroupMap) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;
        let file = ProjectFile {
            version: CURRENT_STORE_VERSION,
            groups,
        };
        let payload = serde_json::to_string_pretty(&file)
            .map_err(|err| GroveError::Serialization(format!("project groups: {err}")))?;

        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(payload.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl StorageProvider for ProjectFileProvider {
    fn id(&self) -> &str {
        PROJECT_PROVIDER
    }

    fn load_root_nodes(&mut self) -> Result<Vec<GroupTree>> {
        let file = self.read()?;
        let roots = build_forest(&file.groups);
        debug!(path = %self.path.display(), roots = roots.len(), "loaded project groups");
        Ok(roots)
    }

    fn save_group(&mut self, group: &GroupTree) -> Result<()> {
        let mut groups = self.read()?.groups;
        store_tree(&mut groups, group);
        self.write(groups)
    }

    fn delete_group_id(&mut self, id: &GroupId) -> Result<()> {
        let mut groups = self.read()?.groups;
        if remove_record(&mut groups, id.as_str()) > 0 {
            self.write(groups)?;
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Resource;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let mut provider = ProjectFileProvider::new(dir.path().join(".grove/groups.json"));
        assert!(provider.load_root_nodes().unwrap().is_empty());
    }

    #[test]
    fn save_writes_versioned_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".grove/groups.json");
        let mut provider = ProjectFileProvider::new(&path);
        let tree = GroupTree::new("Docs")
            .with_resource(Resource::parse("file:///d/readme.md").unwrap());
        provider.save_group(&tree).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["groups"][tree.id.as_str()]["name"], "Docs");

        let mut reopened = ProjectFileProvider::new(&path);
        assert_eq!(reopened.load_root_nodes().unwrap(), vec![tree]);
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.json");
        fs::write(&path, "{ not json").unwrap();
        let mut provider = ProjectFileProvider::new(&path);
        let err = provider.load_root_nodes().unwrap_err();
        assert!(matches!(err, GroveError::Serialization(_)));
    }

    #[test]
    fn reset_removes_file_and_tolerates_absence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.json");
        let mut provider = ProjectFileProvider::new(&path);
        provider.save_group(&GroupTree::new("A")).unwrap();
        provider.reset().unwrap();
        assert!(!path.exists());
        provider.reset().unwrap();
    }
}
