//! Nested group record format shared by the record-based providers.
//!
//! The persisted shape is a map from group id to a record. Every group has
//! its own flat entry; a record additionally embeds copies of its children
//! (`childGroups`) and names its parent (`parentId`). Loading trusts the flat
//! entries for content and uses the embedded lists only for child order.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{GroupId, GroupTree, Resource, ResourceRecord};

pub type GroupMap = BTreeMap<String, GroupRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_groups: Option<Vec<GroupRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl GroupRecord {
    /// Mirror a tree into a nested record.
    #[must_use]
    pub fn from_tree(tree: &GroupTree) -> Self {
        let child_groups = if tree.children.is_empty() {
            None
        } else {
            Some(tree.children.iter().map(Self::from_tree).collect())
        };
        Self {
            id: tree.id.as_str().to_string(),
            name: tree.name.clone(),
            resources: tree.resources.iter().map(Resource::to_record).collect(),
            child_groups,
            parent_id: tree.parent_id.as_ref().map(|p| p.as_str().to_string()),
        }
    }

    fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.child_groups
            .iter()
            .flatten()
            .map(|child| child.id.as_str())
    }
}

/// Write `tree` and every descendant as flat entries, replacing any
/// previous version of those records.
pub fn store_tree(map: &mut GroupMap, tree: &GroupTree) {
    let record = GroupRecord::from_tree(tree);
    map.insert(record.id.clone(), record);
    for child in &tree.children {
        store_tree(map, child);
    }
}

/// Remove the record for `id` and, recursively, the children it lists.
/// Returns the number of entries removed.
pub fn remove_record(map: &mut GroupMap, id: &str) -> usize {
    let mut visited = HashSet::new();
    remove_record_inner(map, id, &mut visited)
}

fn remove_record_inner(map: &mut GroupMap, id: &str, visited: &mut HashSet<String>) -> usize {
    if !visited.insert(id.to_string()) {
        return 0;
    }
    let children: Vec<String> = map
        .get(id)
        .map(|record| record.child_ids().map(str::to_string).collect())
        .unwrap_or_default();
    let mut removed = 0;
    for child in &children {
        removed += remove_record_inner(map, child, visited);
    }
    if map.remove(id).is_some() {
        removed += 1;
    }
    removed
}

/// Rebuild the root trees described by `map`.
///
/// Pass one turns every flat record into a bare node. Pass two links each
/// record's listed children to it, provided the child's own entry names it as
/// parent. Roots are the records without a parent; records whose parent is
/// gone are promoted to roots. Roots come back ordered by name.
#[must_use]
pub fn build_forest(map: &GroupMap) -> Vec<GroupTree> {
    let mut nodes: HashMap<&str, GroupTree> = map
        .values()
        .map(|record| (record.id.as_str(), bare_tree(record)))
        .collect();

    let mut children_of: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut linked: HashSet<&str> = HashSet::new();
    for record in map.values() {
        for child in record.child_ids() {
            let owned_here = map
                .get(child)
                .is_some_and(|entry| entry.parent_id.as_deref() == Some(record.id.as_str()));
            if owned_here && linked.insert(child) {
                children_of.entry(record.id.as_str()).or_default().push(child);
            }
        }
    }

    let mut root_ids: Vec<&str> = map
        .values()
        .filter(|record| record.parent_id.is_none())
        .map(|record| record.id.as_str())
        .collect();
    for record in map.values() {
        if record.parent_id.is_some() && !linked.contains(record.id.as_str()) {
            warn!(
                group = %record.id,
                name = %record.name,
                "promoting orphaned group record to root"
            );
            root_ids.push(record.id.as_str());
        }
    }

    let mut roots: Vec<GroupTree> = root_ids
        .into_iter()
        .filter_map(|id| assemble(id, None, &mut nodes, &children_of))
        .collect();

    // Anything still unclaimed sits on a persisted cycle; surface it as roots.
    let mut leftover: Vec<&str> = nodes.keys().copied().collect();
    leftover.sort_unstable();
    for id in leftover {
        if let Some(tree) = assemble(id, None, &mut nodes, &children_of) {
            warn!(group = %tree.id, "breaking persisted group cycle");
            roots.push(tree);
        }
    }

    roots.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
    roots
}

fn bare_tree(record: &GroupRecord) -> GroupTree {
    let mut tree = GroupTree::with_id(GroupId::new(record.id.clone()), record.name.clone());
    for descriptor in &record.resources {
        match Resource::from_record(descriptor) {
            Ok(resource) => {
                if !tree.resources.contains(&resource) {
                    tree.resources.push(resource);
                }
            }
            Err(err) => warn!(group = %record.id, error = %err, "dropping unreadable resource"),
        }
    }
    tree
}

fn assemble<'a>(
    id: &'a str,
    parent: Option<&GroupId>,
    nodes: &mut HashMap<&'a str, GroupTree>,
    children_of: &HashMap<&'a str, Vec<&'a str>>,
) -> Option<GroupTree> {
    let mut tree = nodes.remove(id)?;
    tree.parent_id = parent.cloned();
    if let Some(children) = children_of.get(id) {
        for child in children {
            if let Some(child_tree) = assemble(child, Some(&tree.id), nodes, children_of) {
                tree.children.push(child_tree);
            }
        }
    }
    Some(tree)
}
