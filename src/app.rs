//! Application context: wires configuration, providers and the manager, and
//! guards every user-facing mutation before it reaches the manager.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{
    Config, DYNAMIC_PROVIDER, PROJECT_PROVIDER, STATE_PROVIDER, StateBackend,
};
use crate::core::{ExistenceCheck, FsExistenceCheck, GroupId, GroupTree, Resource, make_group_id};
use crate::error::{GroveError, Result};
use crate::manager::GroupManager;
use crate::storage::kv::{get_as, set_as};
use crate::storage::{
    DynamicProvider, KeyValueStore, MemoryStore, ProjectFileProvider, SqliteStore, StateProvider,
};

/// State-store key holding the pinned group id.
pub const PINNED_GROUP_KEY: &str = "pinnedgroup";

const STATE_DB_FILE: &str = "grove.db";

pub struct AppContext {
    pub grove_root: PathBuf,
    pub project_root: PathBuf,
    pub config: Config,
    pub manager: GroupManager,
    pub robot_mode: bool,
    pub verbosity: u8,
    /// Relative resource paths resolve against this directory.
    base_dir: PathBuf,
    pin_store: Box<dyn KeyValueStore>,
    existence: Box<dyn ExistenceCheck>,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let grove_root = Self::find_grove_root()?;
        let config = Config::load(cli.config.as_deref(), &grove_root)?;
        let mut ctx = Self::open(grove_root, config)?;
        ctx.robot_mode = cli.robot;
        ctx.verbosity = cli.verbose;
        Ok(ctx)
    }

    /// Build providers from `config`, load every group and restore the pin.
    pub fn open(grove_root: PathBuf, config: Config) -> Result<Self> {
        let project_root = project_root_for(&grove_root)?;
        let mut manager = GroupManager::with_sort_order(config.view.sort_order);

        let pin_store: Box<dyn KeyValueStore> = match config.storage.state_backend {
            StateBackend::Sqlite => Box::new(SqliteStore::open(grove_root.join(STATE_DB_FILE))?),
            StateBackend::Memory => Box::new(MemoryStore::new()),
        };

        for provider in &config.storage.providers {
            match provider.as_str() {
                STATE_PROVIDER => match config.storage.state_backend {
                    StateBackend::Sqlite => {
                        let store = SqliteStore::open(grove_root.join(STATE_DB_FILE))?;
                        manager.register_provider(Box::new(StateProvider::new(store)));
                    }
                    StateBackend::Memory => {
                        manager.register_provider(Box::new(StateProvider::new(MemoryStore::new())));
                    }
                },
                PROJECT_PROVIDER => {
                    let path = project_root.join(&config.storage.project_file);
                    manager.register_provider(Box::new(ProjectFileProvider::new(path)));
                }
                DYNAMIC_PROVIDER => {
                    let provider =
                        DynamicProvider::new(&project_root, config.dynamic.groups.clone())?;
                    manager.register_provider(Box::new(provider));
                }
                other => return Err(GroveError::Config(format!("unknown provider: {other}"))),
            }
        }

        let base_dir = std::env::current_dir().unwrap_or_else(|_| project_root.clone());
        let mut ctx = Self {
            grove_root,
            project_root,
            config,
            manager,
            robot_mode: false,
            verbosity: 0,
            base_dir,
            pin_store,
            existence: Box::new(FsExistenceCheck),
        };
        ctx.manager.load_all()?;
        ctx.restore_pin()?;
        Ok(ctx)
    }

    /// Assemble a context from prepared parts; nothing is loaded.
    pub fn with_parts(
        config: Config,
        manager: GroupManager,
        pin_store: Box<dyn KeyValueStore>,
        existence: Box<dyn ExistenceCheck>,
        base_dir: PathBuf,
    ) -> Self {
        Self {
            grove_root: base_dir.clone(),
            project_root: base_dir.clone(),
            config,
            manager,
            robot_mode: false,
            verbosity: 0,
            base_dir,
            pin_store,
            existence,
        }
    }

    fn find_grove_root() -> Result<PathBuf> {
        if let Ok(root) = std::env::var("GROVE_ROOT") {
            return Ok(PathBuf::from(root));
        }
        let cwd = std::env::current_dir()?;
        if let Some(found) = find_upwards(&cwd, ".grove") {
            return Ok(found);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| GroveError::MissingConfig("data directory not found".to_string()))?;
        Ok(data_dir.join("grove"))
    }

    // ---------------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------------

    /// Resolve a group by id, then by name.
    pub fn resolve(&self, group: &str) -> Result<GroupId> {
        self.manager
            .find_group(group)
            .or_else(|| self.manager.find_group_by_name(group))
            .map(|g| g.id().clone())
            .ok_or_else(|| GroveError::GroupNotFound(group.to_string()))
    }

    fn resolve_writable(&self, group: &str) -> Result<GroupId> {
        let id = self.resolve(group)?;
        self.ensure_writable(&id)?;
        Ok(id)
    }

    fn ensure_writable(&self, id: &GroupId) -> Result<()> {
        match self.manager.find_group(id.as_str()) {
            Some(g) if g.is_readonly() => Err(GroveError::ReadonlyGroup(g.name().to_string())),
            Some(_) => Ok(()),
            None => Err(GroveError::GroupNotFound(id.to_string())),
        }
    }

    fn ensure_name_free(&self, name: &str) -> Result<()> {
        if self.manager.find_group(make_group_id(name).as_str()).is_some() {
            return Err(GroveError::DuplicateGroup(name.to_string()));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Groups
    // ---------------------------------------------------------------------

    /// Create a group, nested under `parent` when given. New roots go to
    /// `provider`, or the configured default.
    pub fn create_group(
        &mut self,
        name: &str,
        parent: Option<&str>,
        provider: Option<&str>,
    ) -> Result<GroupId> {
        let name = validate_name(name)?;
        self.ensure_name_free(name)?;
        let parent = parent.map(|p| self.resolve_writable(p)).transpose()?;

        let provider_id = match (provider, &parent) {
            (Some(explicit), _) => explicit.to_string(),
            (None, Some(parent)) => self
                .manager
                .provider_of(parent.as_str())
                .map(str::to_string)
                .ok_or_else(|| GroveError::ProviderNotFound(parent.to_string()))?,
            (None, None) => self
                .config
                .storage
                .default_target()
                .map(str::to_string)
                .ok_or_else(|| {
                    GroveError::MissingConfig("no writable storage provider enabled".to_string())
                })?,
        };
        if provider_id == DYNAMIC_PROVIDER {
            return Err(GroveError::ReadonlyGroup(format!(
                "provider {DYNAMIC_PROVIDER} is computed"
            )));
        }
        if !self.manager.has_provider(&provider_id) {
            return Err(GroveError::ProviderNotFound(provider_id));
        }

        let tree = GroupTree::new(name);
        let id = tree.id.clone();
        if !self.manager.add_group(tree, &provider_id, parent.as_ref())? {
            return Err(GroveError::ValidationFailed(format!("could not add group {name}")));
        }
        info!(group = %id, name, provider = %provider_id, "created group");
        Ok(id)
    }

    pub fn rename_group(&mut self, group: &str, new_name: &str) -> Result<GroupId> {
        let id = self.resolve_writable(group)?;
        let new_name = validate_name(new_name)?;
        let target = make_group_id(new_name);
        if target != id {
            self.ensure_name_free(new_name)?;
        }
        let was_pinned = self.manager.pinned_group_id() == Some(&id);
        let new_id = self
            .manager
            .rename_group(id.as_str(), new_name)?
            .ok_or_else(|| GroveError::DuplicateGroup(new_name.to_string()))?;
        if was_pinned {
            self.save_pin()?;
        }
        Ok(new_id)
    }

    /// Move `group` under `parent`, or to the top level when `None`.
    pub fn move_group(&mut self, group: &str, parent: Option<&str>) -> Result<()> {
        let id = self.resolve_writable(group)?;
        let target = parent.map(|p| self.resolve_writable(p)).transpose()?;
        if let Some(target) = &target {
            if target == &id || self.manager.forest().is_descendant(id.as_str(), target.as_str()) {
                return Err(GroveError::InvalidMove(format!(
                    "cannot move {group} into its own subtree"
                )));
            }
        }
        if !self.manager.move_group(id.as_str(), target.as_ref())? {
            return Err(GroveError::InvalidMove(group.to_string()));
        }
        Ok(())
    }

    pub fn remove_group(&mut self, group: &str) -> Result<()> {
        let id = self.resolve_writable(group)?;
        let pinned_before = self.manager.pinned_group_id().cloned();
        self.manager.remove_group(id.as_str())?;
        if self.manager.pinned_group_id() != pinned_before.as_ref() {
            self.save_pin()?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Resources
    // ---------------------------------------------------------------------

    /// Turn user input into a resource: URIs are parsed, anything else is a
    /// path relative to the working directory.
    pub fn parse_resource(&self, input: &str) -> Result<Resource> {
        if input.contains("://") {
            Resource::parse(input)
        } else {
            Resource::from_path_in(&self.base_dir, Path::new(input))
        }
    }

    fn existing_resource(&self, input: &str) -> Result<Resource> {
        let resource = self.parse_resource(input)?;
        if !self.existence.exists(&resource) {
            return Err(GroveError::InvalidResource(format!(
                "{} does not exist",
                resource.display()
            )));
        }
        Ok(resource)
    }

    /// Add resources to a group. Returns those that were not already present.
    pub fn add_resources(&mut self, group: &str, inputs: &[String]) -> Result<Vec<Resource>> {
        let id = self.resolve_writable(group)?;
        let resources = inputs
            .iter()
            .map(|input| self.existing_resource(input))
            .collect::<Result<Vec<_>>>()?;
        let mut added = Vec::new();
        for resource in resources {
            if self.manager.add_resource(id.as_str(), resource.clone())? {
                added.push(resource);
            }
        }
        debug!(group = %id, added = added.len(), "added resources");
        Ok(added)
    }

    /// Remove resources from a group. Returns how many were removed.
    pub fn remove_resources(&mut self, group: &str, inputs: &[String]) -> Result<usize> {
        let id = self.resolve_writable(group)?;
        let mut removed = 0;
        for input in inputs {
            let resource = self.parse_resource(input)?;
            if self.manager.remove_resource(id.as_str(), &resource)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn replace_resource(&mut self, group: &str, from: &str, to: &str) -> Result<bool> {
        let id = self.resolve_writable(group)?;
        let from = self.parse_resource(from)?;
        let to = self.existing_resource(to)?;
        self.manager.replace_resource(id.as_str(), &from, to)
    }

    pub fn clear_resources(&mut self, group: &str) -> Result<bool> {
        let id = self.resolve_writable(group)?;
        self.manager.clear_resources(id.as_str())
    }

    /// Add an observed resource to the pinned group, if any.
    pub fn observe(&mut self, input: &str) -> Result<bool> {
        let resource = self.existing_resource(input)?;
        self.manager.add_to_pinned(resource)
    }

    // ---------------------------------------------------------------------
    // Pin
    // ---------------------------------------------------------------------

    pub fn pin(&mut self, group: &str) -> Result<GroupId> {
        let id = self.resolve_writable(group)?;
        self.manager.pin_group(id.as_str());
        self.save_pin()?;
        Ok(id)
    }

    pub fn unpin(&mut self) -> Result<Option<GroupId>> {
        let previous = self.manager.unpin();
        self.save_pin()?;
        Ok(previous)
    }

    fn save_pin(&mut self) -> Result<()> {
        match self.manager.pinned_group_id() {
            Some(id) => set_as(self.pin_store.as_mut(), PINNED_GROUP_KEY, id),
            None => self.pin_store.delete(PINNED_GROUP_KEY),
        }
    }

    fn restore_pin(&mut self) -> Result<()> {
        let Some(id) = get_as::<GroupId>(self.pin_store.as_ref(), PINNED_GROUP_KEY)? else {
            return Ok(());
        };
        if !self.manager.pin_group(id.as_str()) {
            debug!(group = %id, "dropping stored pin of a missing group");
            self.pin_store.delete(PINNED_GROUP_KEY)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Storage
    // ---------------------------------------------------------------------

    /// Reload every provider, or only `provider` when given.
    pub fn reload(&mut self, provider: Option<&str>) -> Result<()> {
        match provider {
            Some(provider) => {
                if !self.manager.reload_provider(provider)? {
                    return Err(GroveError::ProviderNotFound(provider.to_string()));
                }
            }
            None => self.manager.load_all()?,
        }
        self.restore_pin()
    }

    pub fn reset(&mut self) -> Result<()> {
        self.manager.reset_storage()?;
        self.pin_store.delete(PINNED_GROUP_KEY)
    }
}

fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GroveError::ValidationFailed(
            "group name must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// The project directory owning `grove_root`: the parent of a `.grove`
/// directory, otherwise the working directory.
fn project_root_for(grove_root: &Path) -> Result<PathBuf> {
    if grove_root.ends_with(".grove") {
        if let Some(parent) = grove_root.parent() {
            return Ok(parent.to_path_buf());
        }
    }
    Ok(std::env::current_dir()?)
}

fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(name);
        if candidate.is_dir() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}
