//! Group registry and persistence orchestration.
//!
//! [`GroupManager`] owns the forest of every loaded group, the ordered root
//! set, and a routing table from group id to the provider that persists it.
//! Every mutation finishes its in-memory change before the first provider
//! call, so memory is never older than storage. There is no rollback: when a
//! provider fails the change stays in memory and the error is returned.
//!
//! A nested group always routes to the provider of its root.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::config::SortOrder;
use crate::core::{Forest, Group, GroupId, GroupTree, Resource, make_group_id};
use crate::error::{GroveError, Result};
use crate::storage::StorageProvider;

#[derive(Default)]
pub struct GroupManager {
    forest: Forest,
    roots: Vec<GroupId>,
    storage_map: HashMap<GroupId, String>,
    pinned_group_id: Option<GroupId>,
    providers: Vec<Box<dyn StorageProvider>>,
    sort_order: SortOrder,
}

impl std::fmt::Debug for GroupManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupManager")
            .field("groups", &self.forest.len())
            .field("roots", &self.roots)
            .field("providers", &self.providers())
            .field("pinned_group_id", &self.pinned_group_id)
            .field("sort_order", &self.sort_order)
            .finish()
    }
}

impl GroupManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sort_order(sort_order: SortOrder) -> Self {
        Self {
            sort_order,
            ..Self::default()
        }
    }

    // ---------------------------------------------------------------------
    // Providers
    // ---------------------------------------------------------------------

    /// Register a provider. One with the same id is replaced in place,
    /// otherwise the provider is appended and loads after the existing ones.
    pub fn register_provider(&mut self, provider: Box<dyn StorageProvider>) {
        let id = provider.id().to_string();
        if let Some(slot) = self.providers.iter_mut().find(|p| p.id() == id) {
            debug!(provider = %id, "replacing storage provider");
            *slot = provider;
        } else {
            debug!(provider = %id, "registering storage provider");
            self.providers.push(provider);
        }
    }

    /// Provider ids in registration order.
    #[must_use]
    pub fn providers(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    #[must_use]
    pub fn has_provider(&self, provider_id: &str) -> bool {
        self.providers.iter().any(|p| p.id() == provider_id)
    }

    #[must_use]
    pub fn provider_of(&self, id: &str) -> Option<&str> {
        self.storage_map.get(id).map(String::as_str)
    }

    // ---------------------------------------------------------------------
    // Read accessors
    // ---------------------------------------------------------------------

    #[must_use]
    pub const fn forest(&self) -> &Forest {
        &self.forest
    }

    #[must_use]
    pub fn roots(&self) -> &[GroupId] {
        &self.roots
    }

    #[must_use]
    pub fn find_group(&self, id: &str) -> Option<&Group> {
        self.forest.get(id)
    }

    /// Look a group up by name: the derived id first, then a scan for groups
    /// whose id is not name-derived (synthetic ones).
    #[must_use]
    pub fn find_group_by_name(&self, name: &str) -> Option<&Group> {
        self.forest
            .get(make_group_id(name).as_str())
            .or_else(|| self.forest.iter().find(|g| g.name() == name))
    }

    #[must_use]
    pub fn root_groups(&self) -> Vec<&Group> {
        self.roots
            .iter()
            .filter_map(|id| self.forest.get(id.as_str()))
            .collect()
    }

    /// Every registered group's name, sorted.
    #[must_use]
    pub fn group_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.forest.iter().map(Group::name).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn root_group_names(&self) -> Vec<&str> {
        self.root_groups().into_iter().map(Group::name).collect()
    }

    #[must_use]
    pub fn writable_group_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .forest
            .iter()
            .filter(|g| !g.is_readonly())
            .map(Group::name)
            .collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub const fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub const fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.sort_order = sort_order;
    }

    /// A group's own resources ordered by the configured sort order.
    #[must_use]
    pub fn sorted_resources(&self, id: &str) -> Vec<&Resource> {
        let Some(group) = self.forest.get(id) else {
            return Vec::new();
        };
        let mut resources: Vec<&Resource> = group.resources().iter().collect();
        resources.sort_by(|a, b| self.sort_order.compare(a, b));
        resources
    }

    // ---------------------------------------------------------------------
    // Pinning
    // ---------------------------------------------------------------------

    #[must_use]
    pub const fn pinned_group_id(&self) -> Option<&GroupId> {
        self.pinned_group_id.as_ref()
    }

    #[must_use]
    pub fn pinned_group(&self) -> Option<&Group> {
        self.pinned_group_id
            .as_ref()
            .and_then(|id| self.forest.get(id.as_str()))
    }

    pub fn pin_group(&mut self, id: &str) -> bool {
        match self.forest.get(id) {
            Some(group) => {
                self.pinned_group_id = Some(group.id().clone());
                true
            }
            None => false,
        }
    }

    pub fn unpin(&mut self) -> Option<GroupId> {
        self.pinned_group_id.take()
    }

    /// Add a newly observed resource to the pinned group, if one is pinned
    /// and writable.
    pub fn add_to_pinned(&mut self, resource: Resource) -> Result<bool> {
        let Some(pinned) = self.pinned_group() else {
            return Ok(false);
        };
        if pinned.is_readonly() {
            return Ok(false);
        }
        let id = pinned.id().clone();
        self.add_resource(id.as_str(), resource)
    }

    // ---------------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------------

    /// Rebuild the registry from every provider, in registration order.
    ///
    /// A provider that fails to load contributes nothing; the others still
    /// load and the first failure is returned afterwards.
    pub fn load_all(&mut self) -> Result<()> {
        self.forest.clear();
        self.roots.clear();
        self.storage_map.clear();

        let mut first_error = None;
        for index in 0..self.providers.len() {
            if let Err(err) = self.load_provider_at(index) {
                warn!(error = %err, "provider failed to load");
                first_error.get_or_insert(err);
            }
        }
        self.drop_stale_pin();
        info!(
            groups = self.forest.len(),
            roots = self.roots.len(),
            providers = self.providers.len(),
            "loaded groups"
        );
        first_error.map_or(Ok(()), Err)
    }

    /// Drop everything routed to `provider_id` and load it again. Groups of
    /// other providers are untouched. `Ok(false)` for an unknown provider.
    pub fn reload_provider(&mut self, provider_id: &str) -> Result<bool> {
        let Some(index) = self.providers.iter().position(|p| p.id() == provider_id) else {
            return Ok(false);
        };

        let stale: HashSet<GroupId> = self
            .storage_map
            .iter()
            .filter(|(_, provider)| provider.as_str() == provider_id)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            self.forest.remove(id.as_str());
        }
        self.roots.retain(|id| !stale.contains(id));
        self.storage_map.retain(|id, _| !stale.contains(id));
        // Children of other providers that hung below a dropped group become roots.
        let promoted: Vec<GroupId> = self
            .forest
            .iter()
            .filter(|g| g.is_root_group() && !self.roots.contains(g.id()))
            .map(|g| g.id().clone())
            .collect();
        self.roots.extend(promoted);

        debug!(provider = provider_id, dropped = stale.len(), "reloading provider");
        let result = self.load_provider_at(index);
        self.drop_stale_pin();
        result.map(|()| true)
    }

    fn load_provider_at(&mut self, index: usize) -> Result<()> {
        let provider = &mut self.providers[index];
        let provider_id = provider.id().to_string();
        let trees = provider
            .load_root_nodes()
            .map_err(|err| wrap_provider_error(&provider_id, err))?;

        let mut loaded = 0;
        for tree in trees {
            if self.forest.contains(tree.id.as_str()) {
                warn!(
                    group = %tree.id,
                    name = %tree.name,
                    provider = %provider_id,
                    "group id already loaded by another provider, skipping"
                );
                continue;
            }
            let inserted = self.forest.graft(tree, None);
            let Some(root) = inserted.first() else {
                continue;
            };
            self.roots.push(root.clone());
            loaded += inserted.len();
            for id in inserted {
                self.storage_map.insert(id, provider_id.clone());
            }
        }
        debug!(provider = %provider_id, groups = loaded, "merged provider groups");
        Ok(())
    }

    fn drop_stale_pin(&mut self) {
        if let Some(id) = &self.pinned_group_id {
            if !self.forest.contains(id.as_str()) {
                debug!(group = %id, "pinned group no longer present");
                self.pinned_group_id = None;
            }
        }
    }

    /// Reset every provider, then clear all in-memory state including the
    /// routing table and the pin.
    pub fn reset_storage(&mut self) -> Result<()> {
        let mut first_error = None;
        for provider in &mut self.providers {
            let provider_id = provider.id().to_string();
            if let Err(err) = provider.reset() {
                warn!(provider = %provider_id, error = %err, "provider reset failed");
                first_error.get_or_insert(wrap_provider_error(&provider_id, err));
            }
        }
        self.forest.clear();
        self.roots.clear();
        self.storage_map.clear();
        self.pinned_group_id = None;
        info!("reset group storage");
        first_error.map_or(Ok(()), Err)
    }

    // ---------------------------------------------------------------------
    // Structure
    // ---------------------------------------------------------------------

    /// Register `group` (with any subtree it carries) and persist it.
    ///
    /// When `parent_id` is given the group is attached there and routed to
    /// the parent's provider. Returns `Ok(false)` and registers nothing when
    /// the provider or parent is unknown, or any id in `group` is taken.
    pub fn add_group(
        &mut self,
        group: GroupTree,
        provider_id: &str,
        parent_id: Option<&GroupId>,
    ) -> Result<bool> {
        if !self.has_provider(provider_id) {
            warn!(provider = provider_id, "add_group: unknown provider");
            return Ok(false);
        }
        let route = match parent_id {
            Some(parent) => match self.storage_map.get(parent.as_str()) {
                Some(route) if self.forest.contains(parent.as_str()) => route.clone(),
                _ => {
                    debug!(parent = %parent, "add_group: unknown parent");
                    return Ok(false);
                }
            },
            None => provider_id.to_string(),
        };
        if let Some(taken) = group.walk().find(|node| self.forest.contains(node.id.as_str())) {
            debug!(group = %taken.id, "add_group: id already registered");
            return Ok(false);
        }

        let inserted = self.forest.graft(group, parent_id);
        let Some(id) = inserted.first().cloned() else {
            return Ok(false);
        };
        if parent_id.is_none() {
            self.roots.push(id.clone());
        }
        for node in inserted {
            self.storage_map.insert(node, route.clone());
        }
        debug!(group = %id, provider = %route, "added group");

        match parent_id {
            Some(parent) => self.persist(parent)?,
            None => self.persist(&id)?,
        }
        Ok(true)
    }

    /// Remove a group and all its descendants from memory and storage.
    ///
    /// Descendants are deleted first, then the group itself, one provider
    /// call each. The former parent is saved again so its persisted child
    /// list drops the group.
    pub fn remove_group(&mut self, id: &str) -> Result<bool> {
        let Some(group) = self.forest.get(id) else {
            return Ok(false);
        };
        let id = group.id().clone();
        let former_parent = group.parent_id().cloned();

        let removed = self.forest.remove_subtree(id.as_str());
        self.roots.retain(|root| root != &id);

        // Deletion order: descendants in pre-order, then the group itself.
        let mut deletions: Vec<(GroupId, Option<String>)> = removed
            .into_iter()
            .map(|gone| {
                let route = self.storage_map.remove(gone.as_str());
                (gone, route)
            })
            .collect();
        if !deletions.is_empty() {
            deletions.rotate_left(1);
        }

        if self
            .pinned_group_id
            .as_ref()
            .is_some_and(|pinned| deletions.iter().any(|(gone, _)| gone == pinned))
        {
            self.pinned_group_id = None;
        }

        let mut first_error = None;
        for (gone, route) in &deletions {
            let Some(route) = route else { continue };
            if let Err(err) = self.delete_from(route, gone) {
                warn!(group = %gone, error = %err, "failed to delete group from storage");
                first_error.get_or_insert(err);
            }
        }
        debug!(group = %id, removed = deletions.len(), "removed group");

        if let Some(parent) = former_parent {
            if let Err(err) = self.persist(&parent) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(true), Err)
    }

    /// Rename by replacement: a new group with the name-derived id takes the
    /// original's place, resources and children; the original is retired.
    ///
    /// Returns the new id, or `Ok(None)` when `id` is unknown or another
    /// group already owns the derived id. Renaming to the same name is a
    /// no-op returning the current id.
    pub fn rename_group(&mut self, id: &str, new_name: &str) -> Result<Option<GroupId>> {
        let Some(original) = self.forest.get(id) else {
            return Ok(None);
        };
        let old_id = original.id().clone();
        let new_id = make_group_id(new_name);
        if new_id == old_id {
            return Ok(Some(old_id));
        }
        if self.forest.contains(new_id.as_str()) {
            debug!(name = new_name, "rename target id already registered");
            return Ok(None);
        }

        let readonly = original.is_readonly();
        let resources = original.resources().to_vec();
        let children = original.child_ids().to_vec();
        let parent = original.parent_id().cloned();

        let mut replacement = Group::with_id(new_id.clone(), new_name).readonly(readonly);
        replacement.set_resources(resources);
        self.forest.insert(replacement);

        match &parent {
            Some(parent) => {
                let index = self
                    .forest
                    .get(parent.as_str())
                    .and_then(|p| p.child_ids().iter().position(|c| c == &old_id))
                    .unwrap_or_default();
                self.forest
                    .insert_child_group(parent.as_str(), new_id.as_str(), index);
            }
            None => {
                if let Some(slot) = self.roots.iter_mut().find(|root| **root == old_id) {
                    *slot = new_id.clone();
                } else {
                    self.roots.push(new_id.clone());
                }
            }
        }
        for child in &children {
            self.forest.add_child_group(new_id.as_str(), child.as_str());
        }
        self.forest.remove(old_id.as_str());

        let route = self.storage_map.remove(old_id.as_str());
        if let Some(route) = &route {
            self.storage_map.insert(new_id.clone(), route.clone());
        }
        if self.pinned_group_id.as_ref() == Some(&old_id) {
            self.pinned_group_id = Some(new_id.clone());
        }
        debug!(from = %old_id, to = %new_id, name = new_name, "renamed group");

        if let Some(route) = &route {
            self.delete_from(route, &old_id)?;
        }
        match &parent {
            Some(parent) => self.persist(parent)?,
            None => self.persist(&new_id)?,
        }
        Ok(Some(new_id))
    }

    /// Move a group under `new_parent`, or to the root set when `None`.
    ///
    /// Returns `Ok(false)` when either id is unknown or the target is the
    /// group itself or one of its descendants. Moving into a group of
    /// another provider re-routes the whole subtree there.
    pub fn move_group(&mut self, id: &str, new_parent: Option<&GroupId>) -> Result<bool> {
        let Some(group) = self.forest.get(id) else {
            return Ok(false);
        };
        let id = group.id().clone();
        let current_parent = group.parent_id().cloned();

        if let Some(target) = new_parent {
            if !self.forest.contains(target.as_str()) {
                return Ok(false);
            }
            if target == &id || self.forest.is_descendant(id.as_str(), target.as_str()) {
                warn!(group = %id, target = %target, "refusing move into own subtree");
                return Ok(false);
            }
        }
        if current_parent.as_ref() == new_parent {
            return Ok(true);
        }

        match &current_parent {
            Some(_) => {
                self.forest.detach(id.as_str());
            }
            None => self.roots.retain(|root| root != &id),
        }
        match new_parent {
            Some(target) => {
                self.forest.add_child_group(target.as_str(), id.as_str());
            }
            None => self.roots.push(id.clone()),
        }

        let old_route = self.storage_map.get(id.as_str()).cloned();
        let new_route = match new_parent {
            Some(target) => self.storage_map.get(target.as_str()).cloned(),
            None => old_route.clone(),
        };
        if old_route != new_route {
            if let Some(new_route) = &new_route {
                let mut subtree = vec![id.clone()];
                subtree.extend(self.forest.all_child_ids(id.as_str()));
                for node in subtree {
                    self.storage_map.insert(node, new_route.clone());
                }
            }
            if let Some(old_route) = &old_route {
                debug!(group = %id, from = %old_route, "moving group across providers");
                self.delete_from(old_route, &id)?;
            }
        }
        debug!(group = %id, parent = ?new_parent, "moved group");

        self.persist(&id)?;
        if let Some(target) = new_parent {
            self.persist(target)?;
        }
        if let Some(former) = &current_parent {
            self.persist(former)?;
        }
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Resources
    // ---------------------------------------------------------------------

    pub fn add_resource(&mut self, id: &str, resource: Resource) -> Result<bool> {
        self.edit_resources(id, |group| group.add_resource(resource))
    }

    pub fn remove_resource(&mut self, id: &str, resource: &Resource) -> Result<bool> {
        self.edit_resources(id, |group| group.remove_resource(resource))
    }

    pub fn replace_resource(&mut self, id: &str, from: &Resource, to: Resource) -> Result<bool> {
        self.edit_resources(id, |group| group.replace_resource(from, to))
    }

    pub fn clear_resources(&mut self, id: &str) -> Result<bool> {
        self.edit_resources(id, |group| group.clear_resources() > 0)
    }

    fn edit_resources(&mut self, id: &str, edit: impl FnOnce(&mut Group) -> bool) -> Result<bool> {
        let Some(group) = self.forest.get_mut(id) else {
            return Ok(false);
        };
        if !edit(group) {
            return Ok(false);
        }
        let id = group.id().clone();
        self.persist(&id)?;
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Persist the subtree rooted at `id` through its routed provider.
    /// `Ok(false)` when the group is unknown or has no provider.
    pub fn save_group(&mut self, id: &str) -> Result<bool> {
        let Some(route) = self.storage_map.get(id).cloned() else {
            return Ok(false);
        };
        let Some(tree) = self.forest.snapshot(id) else {
            return Ok(false);
        };
        let provider = self
            .providers
            .iter_mut()
            .find(|p| p.id() == route)
            .ok_or_else(|| GroveError::ProviderNotFound(route.clone()))?;
        provider
            .save_group(&tree)
            .map_err(|err| wrap_provider_error(&route, err))?;
        Ok(true)
    }

    fn persist(&mut self, id: &GroupId) -> Result<()> {
        if !self.save_group(id.as_str())? {
            debug!(group = %id, "group has no provider, not persisted");
        }
        Ok(())
    }

    fn delete_from(&mut self, provider_id: &str, id: &GroupId) -> Result<()> {
        let provider = self
            .providers
            .iter_mut()
            .find(|p| p.id() == provider_id)
            .ok_or_else(|| GroveError::ProviderNotFound(provider_id.to_string()))?;
        provider
            .delete_group_id(id)
            .map_err(|err| wrap_provider_error(provider_id, err))
    }
}

fn wrap_provider_error(provider_id: &str, err: GroveError) -> GroveError {
    match err {
        GroveError::Persistence { .. } => err,
        other => GroveError::persistence(provider_id, other),
    }
}
