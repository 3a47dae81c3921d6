//! Synthetic provider computing readonly groups from glob rules.

use std::path::{Path, PathBuf};

use glob::{Pattern, glob};
use tracing::{debug, warn};

use crate::config::{DYNAMIC_PROVIDER, DynamicGroupRule};
use crate::core::{GroupId, GroupTree, Resource, make_dynamic_group_id};
use crate::error::{GroveError, Result};
use crate::storage::provider::StorageProvider;

/// One readonly root group per rule; membership is recomputed on every load
/// and nothing is ever written.
pub struct DynamicProvider {
    root: PathBuf,
    rules: Vec<DynamicGroupRule>,
}

impl DynamicProvider {
    /// Patterns are checked up front so a bad rule fails at startup.
    pub fn new(root: impl Into<PathBuf>, rules: Vec<DynamicGroupRule>) -> Result<Self> {
        for rule in &rules {
            Pattern::new(&rule.pattern).map_err(|err| {
                GroveError::Config(format!("dynamic group {}: invalid pattern: {err}", rule.name))
            })?;
        }
        Ok(Self {
            root: root.into(),
            rules,
        })
    }

    fn evaluate(&self, rule: &DynamicGroupRule) -> Result<GroupTree> {
        // The root is literal text; only the rule carries pattern syntax.
        let pattern_str = if Path::new(&rule.pattern).is_absolute() {
            rule.pattern.clone()
        } else {
            let root = Pattern::escape(&self.root.to_string_lossy());
            Path::new(&root).join(&rule.pattern).to_string_lossy().into_owned()
        };
        let mut tree = GroupTree::with_id(make_dynamic_group_id(&rule.name), rule.name.clone())
            .readonly(true);
        let matches = glob(&pattern_str)
            .map_err(|err| GroveError::Config(format!("Invalid glob pattern: {err}")))?;
        for entry in matches {
            match entry {
                Ok(path) => match Resource::from_path(&path) {
                    Ok(resource) => tree = tree.with_resource(resource),
                    Err(err) => warn!(group = %rule.name, error = %err, "skipping match"),
                },
                Err(err) => warn!(group = %rule.name, error = %err, "unreadable glob match"),
            }
        }
        Ok(tree)
    }
}

impl StorageProvider for DynamicProvider {
    fn id(&self) -> &str {
        DYNAMIC_PROVIDER
    }

    fn load_root_nodes(&mut self) -> Result<Vec<GroupTree>> {
        let roots = self
            .rules
            .iter()
            .map(|rule| self.evaluate(rule))
            .collect::<Result<Vec<_>>>()?;
        debug!(groups = roots.len(), "computed dynamic groups");
        Ok(roots)
    }

    fn save_group(&mut self, _group: &GroupTree) -> Result<()> {
        Ok(())
    }

    fn delete_group_id(&mut self, _id: &GroupId) -> Result<()> {
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        Ok(())
    }
}
