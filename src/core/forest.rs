//! Arena holding every group, root and nested, keyed by id.
//!
//! All structural edits go through here so the parent/child links stay
//! mutually consistent:
//! - `g.parent == Some(p)` iff `g.id` is listed in `p.children`
//! - a group is listed under at most one parent
//! - no group is its own ancestor

use std::collections::HashMap;

use tracing::warn;

use super::group::Group;
use super::id::GroupId;
use super::resource::Resource;
use super::tree::GroupTree;

#[derive(Debug, Default, Clone)]
pub struct Forest {
    groups: HashMap<GroupId, Group>,
}

impl Forest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.groups.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Group> {
        self.groups.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Insert a detached group. Existing ids are never overwritten.
    pub fn insert(&mut self, mut group: Group) -> bool {
        if self.groups.contains_key(group.id().as_str()) {
            return false;
        }
        group.parent = None;
        group.children.clear();
        self.groups.insert(group.id().clone(), group);
        true
    }

    /// Remove a single group, unlinking it from its parent and orphaning its
    /// children (they stay in the arena with no parent).
    pub fn remove(&mut self, id: &str) -> Option<Group> {
        let group = self.groups.remove(id)?;
        if let Some(parent) = group.parent.as_ref().and_then(|p| self.groups.get_mut(p.as_str())) {
            parent.children.retain(|c| c.as_str() != id);
        }
        for child in &group.children {
            if let Some(child) = self.groups.get_mut(child.as_str()) {
                child.parent = None;
            }
        }
        Some(group)
    }

    /// Remove a group and all of its descendants. Returns the removed ids,
    /// the group itself first, then descendants in pre-order.
    pub fn remove_subtree(&mut self, id: &str) -> Vec<GroupId> {
        let Some(group) = self.groups.get(id) else {
            return Vec::new();
        };
        let mut removed = vec![group.id().clone()];
        removed.extend(self.all_child_ids(id));
        self.detach(id);
        for gone in &removed {
            self.groups.remove(gone.as_str());
        }
        removed
    }

    /// Attach `child` under `parent`, moving it away from any previous parent.
    ///
    /// Returns `false` when nothing changed: unknown ids, `child` already a
    /// direct child, or an attach that would make a group its own ancestor.
    pub fn add_child_group(&mut self, parent: &str, child: &str) -> bool {
        self.attach(parent, child, None)
    }

    /// Like [`Self::add_child_group`] but places `child` at `index`.
    pub fn insert_child_group(&mut self, parent: &str, child: &str, index: usize) -> bool {
        self.attach(parent, child, Some(index))
    }

    fn attach(&mut self, parent: &str, child: &str, index: Option<usize>) -> bool {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return false;
        }
        if self.groups[parent].children.iter().any(|c| c.as_str() == child) {
            return false;
        }
        if self.is_descendant(child, parent) {
            warn!(parent, child, "refusing attach that would create a cycle");
            return false;
        }
        self.detach(child);

        let child_id = self.groups[child].id().clone();
        let parent_id = self.groups[parent].id().clone();
        if let Some(parent_group) = self.groups.get_mut(parent) {
            let at = index.map_or(parent_group.children.len(), |i| {
                i.min(parent_group.children.len())
            });
            parent_group.children.insert(at, child_id);
        }
        if let Some(child_group) = self.groups.get_mut(child) {
            child_group.parent = Some(parent_id);
        }
        true
    }

    /// Detach `child` from `parent` if it is a direct child.
    pub fn remove_child_group(&mut self, parent: &str, child: &str) -> bool {
        let is_child = self
            .groups
            .get(child)
            .and_then(Group::parent_id)
            .is_some_and(|p| p.as_str() == parent);
        if !is_child {
            return false;
        }
        self.detach(child).is_some()
    }

    /// Detach a group from whatever parent holds it. Returns the former parent.
    pub fn detach(&mut self, id: &str) -> Option<GroupId> {
        let parent = self.groups.get_mut(id)?.parent.take()?;
        if let Some(parent_group) = self.groups.get_mut(parent.as_str()) {
            parent_group.children.retain(|c| c.as_str() != id);
        }
        Some(parent)
    }

    /// Detach every direct child of `parent`. Returns the detached ids.
    pub fn clear_child_groups(&mut self, parent: &str) -> Vec<GroupId> {
        let Some(group) = self.groups.get_mut(parent) else {
            return Vec::new();
        };
        let children = std::mem::take(&mut group.children);
        for child in &children {
            if let Some(child) = self.groups.get_mut(child.as_str()) {
                child.parent = None;
            }
        }
        children
    }

    /// Depth-first search below `parent`: direct children are checked first,
    /// then each child's subtree in order.
    #[must_use]
    pub fn find_child_group(&self, parent: &str, id: &str) -> Option<&Group> {
        let group = self.groups.get(parent)?;
        if group.children.iter().any(|c| c.as_str() == id) {
            return self.groups.get(id);
        }
        group
            .children
            .iter()
            .find_map(|child| self.find_child_group(child.as_str(), id))
    }

    /// Every descendant of `id` in pre-order, not including `id` itself.
    #[must_use]
    pub fn all_child_groups(&self, id: &str) -> Vec<&Group> {
        self.all_child_ids(id)
            .iter()
            .filter_map(|child| self.groups.get(child.as_str()))
            .collect()
    }

    #[must_use]
    pub fn all_child_ids(&self, id: &str) -> Vec<GroupId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: &str, out: &mut Vec<GroupId>) {
        if let Some(group) = self.groups.get(id) {
            for child in &group.children {
                out.push(child.clone());
                self.collect_descendants(child.as_str(), out);
            }
        }
    }

    /// Own resources followed by every descendant's, pre-order.
    #[must_use]
    pub fn all_resources(&self, id: &str) -> Vec<&Resource> {
        let Some(group) = self.groups.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<&Resource> = group.resources().iter().collect();
        for child in self.all_child_groups(id) {
            out.extend(child.resources());
        }
        out
    }

    /// True if `candidate` sits strictly below `ancestor`.
    #[must_use]
    pub fn is_descendant(&self, ancestor: &str, candidate: &str) -> bool {
        let mut current = self.groups.get(candidate).and_then(Group::parent_id);
        let mut steps = 0;
        while let Some(id) = current {
            if id.as_str() == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.groups.len() {
                break;
            }
            current = self.groups.get(id.as_str()).and_then(Group::parent_id);
        }
        false
    }

    /// Owned copy of the subtree rooted at `id`.
    #[must_use]
    pub fn snapshot(&self, id: &str) -> Option<GroupTree> {
        let group = self.groups.get(id)?;
        Some(GroupTree {
            id: group.id().clone(),
            name: group.name().to_string(),
            readonly: group.is_readonly(),
            resources: group.resources().to_vec(),
            parent_id: group.parent.clone(),
            children: group
                .children
                .iter()
                .filter_map(|child| self.snapshot(child.as_str()))
                .collect(),
        })
    }

    /// Insert an owned tree, optionally below `parent`. Nodes whose id is
    /// already present are skipped together with their subtree. Returns the
    /// inserted ids in pre-order.
    pub fn graft(&mut self, tree: GroupTree, parent: Option<&GroupId>) -> Vec<GroupId> {
        let parent = parent.filter(|p| self.contains(p.as_str())).cloned();
        let mut inserted = Vec::new();
        self.graft_node(tree, parent, &mut inserted);
        inserted
    }

    fn graft_node(
        &mut self,
        tree: GroupTree,
        parent: Option<GroupId>,
        inserted: &mut Vec<GroupId>,
    ) {
        if self.groups.contains_key(tree.id.as_str()) {
            warn!(group = %tree.id, name = %tree.name, "skipping duplicate group id");
            return;
        }
        let GroupTree {
            id,
            name,
            readonly,
            resources,
            children,
            ..
        } = tree;

        let mut group = Group::with_id(id.clone(), name).readonly(readonly);
        group.set_resources(resources);
        group.parent.clone_from(&parent);
        self.groups.insert(id.clone(), group);
        if let Some(parent_group) = parent.as_ref().and_then(|p| self.groups.get_mut(p.as_str())) {
            parent_group.children.push(id.clone());
        }
        inserted.push(id.clone());

        for child in children {
            self.graft_node(child, Some(id.clone()), inserted);
        }
    }
}
