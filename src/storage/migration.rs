//! One-time conversion of the legacy flat state layout into the group map.
//!
//! The legacy layout kept a `groupstore` object (id to label) plus one
//! `A-<id>` key per group holding bare filesystem paths. Groups were flat.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::core::{GroupTree, Resource};
use crate::error::Result;
use crate::storage::kv::{KeyValueStore, get_as, set_as};
use crate::storage::record::{GroupMap, store_tree};

pub const GROUP_MAP_KEY: &str = "groupmap";
pub const STORE_VERSION_KEY: &str = "storeversion";
pub const LEGACY_GROUP_STORE_KEY: &str = "groupstore";
pub const LEGACY_RESOURCE_PREFIX: &str = "A-";
pub const CURRENT_STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The store was already stamped with a version.
    Skipped,
    /// Legacy data (possibly none) was converted and the store stamped.
    Migrated { groups: usize },
}

/// Bring `store` up to the current layout.
pub fn migrate(store: &mut dyn KeyValueStore) -> Result<MigrationOutcome> {
    if let Some(version) = get_as::<u32>(store, STORE_VERSION_KEY)? {
        debug!(version, "group store already migrated");
        return Ok(MigrationOutcome::Skipped);
    }

    let labels: BTreeMap<String, String> =
        get_as(store, LEGACY_GROUP_STORE_KEY)?.unwrap_or_default();
    let mut map: GroupMap = get_as(store, GROUP_MAP_KEY)?.unwrap_or_default();

    let mut converted = 0;
    for (legacy_id, label) in &labels {
        let paths: Vec<String> =
            get_as(store, &legacy_key(legacy_id))?.unwrap_or_default();
        let tree = legacy_tree(label, &paths);
        if map.contains_key(tree.id.as_str()) {
            warn!(
                label = %label,
                "legacy group already present in group map, keeping current record"
            );
            continue;
        }
        store_tree(&mut map, &tree);
        converted += 1;
    }

    set_as(store, GROUP_MAP_KEY, &map)?;

    // Resource lists can outlive their label entry; sweep every prefixed key.
    let legacy_keys: Vec<String> = store
        .keys()?
        .into_iter()
        .filter(|key| key.starts_with(LEGACY_RESOURCE_PREFIX))
        .collect();
    for key in &legacy_keys {
        store.delete(key)?;
    }
    store.delete(LEGACY_GROUP_STORE_KEY)?;
    set_as(store, STORE_VERSION_KEY, &CURRENT_STORE_VERSION)?;

    info!(
        groups = converted,
        version = CURRENT_STORE_VERSION,
        "migrated group store"
    );
    Ok(MigrationOutcome::Migrated { groups: converted })
}

fn legacy_key(id: &str) -> String {
    format!("{LEGACY_RESOURCE_PREFIX}{id}")
}

fn legacy_tree(label: &str, paths: &[String]) -> GroupTree {
    let mut tree = GroupTree::new(label);
    for raw in paths {
        let parsed = if raw.contains("://") {
            Resource::parse(raw)
        } else {
            Resource::from_path(Path::new(raw))
        };
        match parsed {
            Ok(resource) => {
                if !tree.resources.contains(&resource) {
                    tree.resources.push(resource);
                }
            }
            Err(err) => {
                warn!(label = %label, path = %raw, error = %err, "skipping legacy resource");
            }
        }
    }
    tree
}
