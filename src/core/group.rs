//! Group nodes.
//!
//! A `Group` owns its resource list. Structure (parent and children) is held
//! as ids into the owning [`Forest`](super::forest::Forest), so a group can
//! never be owned twice and ownership can never form a cycle.

use super::id::{GroupId, make_group_id};
use super::resource::Resource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    id: GroupId,
    name: String,
    readonly: bool,
    resources: Vec<Resource>,
    pub(crate) children: Vec<GroupId>,
    pub(crate) parent: Option<GroupId>,
}

impl Group {
    /// Create a user group whose id is derived from `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_id(make_group_id(&name), name)
    }

    pub fn with_id(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            readonly: false,
            resources: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    #[must_use]
    pub const fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    #[must_use]
    pub const fn id(&self) -> &GroupId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_readonly(&self) -> bool {
        self.readonly
    }

    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    #[must_use]
    pub fn child_ids(&self) -> &[GroupId] {
        &self.children
    }

    #[must_use]
    pub const fn parent_id(&self) -> Option<&GroupId> {
        self.parent.as_ref()
    }

    #[must_use]
    pub fn has_child_groups(&self) -> bool {
        !self.children.is_empty()
    }

    #[must_use]
    pub const fn is_root_group(&self) -> bool {
        self.parent.is_none()
    }

    #[must_use]
    pub fn contains_resource(&self, resource: &Resource) -> bool {
        self.resources.contains(resource)
    }

    /// Append `resource` unless an entry with the same normalized path exists.
    pub fn add_resource(&mut self, resource: Resource) -> bool {
        if self.contains_resource(&resource) {
            return false;
        }
        self.resources.push(resource);
        true
    }

    /// Remove the first entry equal to `resource`.
    pub fn remove_resource(&mut self, resource: &Resource) -> bool {
        match self.resources.iter().position(|r| r == resource) {
            Some(index) => {
                self.resources.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replace the entry equal to `from` with `to`, keeping its position.
    ///
    /// Returns `false` without changing anything when `from` is not present.
    /// If `to` already exists elsewhere in the list, the `from` slot is
    /// dropped instead so the list stays deduplicated.
    pub fn replace_resource(&mut self, from: &Resource, to: Resource) -> bool {
        let Some(index) = self.resources.iter().position(|r| r == from) else {
            return false;
        };
        if from != &to && self.contains_resource(&to) {
            self.resources.remove(index);
        } else {
            self.resources[index] = to;
        }
        true
    }

    pub fn clear_resources(&mut self) -> usize {
        let count = self.resources.len();
        self.resources.clear();
        count
    }

    pub(crate) fn set_resources(&mut self, resources: Vec<Resource>) {
        self.resources.clear();
        for resource in resources {
            self.add_resource(resource);
        }
    }
}
