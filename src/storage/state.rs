//! Session-scoped provider over a keyed store.

use tracing::debug;

use crate::config::STATE_PROVIDER;
use crate::core::{GroupId, GroupTree};
use crate::error::Result;
use crate::storage::kv::{KeyValueStore, get_as, set_as};
use crate::storage::migration::{GROUP_MAP_KEY, migrate};
use crate::storage::provider::StorageProvider;
use crate::storage::record::{GroupMap, build_forest, remove_record, store_tree};

/// Keeps the whole group map under a single key of a [`KeyValueStore`].
pub struct StateProvider<S: KeyValueStore> {
    store: S,
    migrated: bool,
}

impl<S: KeyValueStore> StateProvider<S> {
    pub const fn new(store: S) -> Self {
        Self {
            store,
            migrated: false,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    fn read_map(&self) -> Result<GroupMap> {
        Ok(get_as(&self.store, GROUP_MAP_KEY)?.unwrap_or_default())
    }

    fn write_map(&mut self, map: &GroupMap) -> Result<()> {
        set_as(&mut self.store, GROUP_MAP_KEY, map)
    }

    fn ensure_migrated(&mut self) -> Result<()> {
        if !self.migrated {
            migrate(&mut self.store)?;
            self.migrated = true;
        }
        Ok(())
    }
}

impl<S: KeyValueStore> StorageProvider for StateProvider<S> {
    fn id(&self) -> &str {
        STATE_PROVIDER
    }

    fn load_root_nodes(&mut self) -> Result<Vec<GroupTree>> {
        self.ensure_migrated()?;
        let map = self.read_map()?;
        let roots = build_forest(&map);
        debug!(records = map.len(), roots = roots.len(), "loaded state groups");
        Ok(roots)
    }

    fn save_group(&mut self, group: &GroupTree) -> Result<()> {
        self.ensure_migrated()?;
        let mut map = self.read_map()?;
        store_tree(&mut map, group);
        self.write_map(&map)
    }

    fn delete_group_id(&mut self, id: &GroupId) -> Result<()> {
        self.ensure_migrated()?;
        let mut map = self.read_map()?;
        if remove_record(&mut map, id.as_str()) > 0 {
            self.write_map(&map)?;
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.store.delete(GROUP_MAP_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Resource, make_group_id};
    use crate::storage::kv::MemoryStore;
    use crate::storage::migration::STORE_VERSION_KEY;
    use crate::storage::sqlite::SqliteStore;
    use serde_json::json;

    fn tree() -> GroupTree {
        GroupTree::new("Work")
            .with_resource(Resource::parse("file:///w/a.rs").unwrap())
            .with_child(GroupTree::new("Nested"))
    }

    #[test]
    fn save_then_load() {
        let mut provider = StateProvider::new(MemoryStore::new());
        provider.save_group(&tree()).unwrap();
        assert_eq!(provider.load_root_nodes().unwrap(), vec![tree()]);
    }

    #[test]
    fn delete_removes_nested_records() {
        let mut provider = StateProvider::new(MemoryStore::new());
        provider.save_group(&tree()).unwrap();
        provider.delete_group_id(&make_group_id("Work")).unwrap();
        assert!(provider.load_root_nodes().unwrap().is_empty());
        let map: GroupMap = get_as(provider.store(), GROUP_MAP_KEY).unwrap().unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn first_load_migrates_legacy_state() {
        let mut store = MemoryStore::new();
        store.set("groupstore", json!({"x": "Old"})).unwrap();
        store.set("A-x", json!(["/old/file.txt"])).unwrap();
        let mut provider = StateProvider::new(store);

        let roots = provider.load_root_nodes().unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "Old");
        assert_eq!(provider.store().get(STORE_VERSION_KEY).unwrap(), Some(json!(1)));
    }

    #[test]
    fn reset_keeps_version_stamp() {
        let mut provider = StateProvider::new(SqliteStore::open_in_memory().unwrap());
        provider.save_group(&tree()).unwrap();
        provider.reset().unwrap();
        assert!(provider.load_root_nodes().unwrap().is_empty());
        assert!(provider.store().get(STORE_VERSION_KEY).unwrap().is_some());
    }
}
