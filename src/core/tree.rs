//! Owned group subtrees exchanged with storage providers.

use super::id::{GroupId, make_group_id};
use super::resource::Resource;

/// A detached, owned copy of a group and everything below it.
///
/// Providers return these from a load and receive them on save; the manager
/// grafts them into (or snapshots them out of) its arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTree {
    pub id: GroupId,
    pub name: String,
    pub readonly: bool,
    pub resources: Vec<Resource>,
    pub parent_id: Option<GroupId>,
    pub children: Vec<GroupTree>,
}

impl GroupTree {
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
            parent_id: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub const fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    #[must_use]
    pub fn with_resource(mut self, resource: Resource) -> Self {
        if !self.resources.contains(&resource) {
            self.resources.push(resource);
        }
        self
    }

    #[must_use]
    pub fn with_child(mut self, mut child: Self) -> Self {
        child.parent_id = Some(self.id.clone());
        self.children.push(child);
        self
    }

    /// Pre-order walk over this node and its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Number of nodes in the subtree, self included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.walk().count()
    }
}
