//! Manager operations against the real record-based providers.

use grove::GroupManager;
use grove::core::{GroupTree, make_group_id};
use grove::storage::{SqliteStore, StateProvider, StorageProvider};
use grove::test_utils::fixtures::UnitTestFixture;

fn project_manager(fixture: &UnitTestFixture) -> GroupManager {
    let mut manager = GroupManager::new();
    manager.register_provider(Box::new(fixture.project_provider()));
    manager.load_all().unwrap();
    manager
}

fn shape(manager: &GroupManager) -> Vec<(String, Option<String>, Vec<String>)> {
    let mut out: Vec<_> = manager
        .forest()
        .iter()
        .map(|g| {
            let parent = g
                .parent_id()
                .and_then(|p| manager.find_group(p.as_str()))
                .map(|p| p.name().to_string());
            let children = g
                .child_ids()
                .iter()
                .filter_map(|c| manager.find_group(c.as_str()))
                .map(|c| c.name().to_string())
                .collect();
            (g.name().to_string(), parent, children)
        })
        .collect();
    out.sort();
    out
}

#[test]
fn structure_survives_reload_after_edits() {
    let fixture = UnitTestFixture::new();
    let readme = fixture.resource("readme.md");
    let main = fixture.resource("src/main.rs");

    let mut manager = project_manager(&fixture);
    manager.add_group(GroupTree::new("Work"), "project", None).unwrap();
    manager
        .add_group(GroupTree::new("Code"), "project", Some(&make_group_id("Work")))
        .unwrap();
    manager
        .add_group(GroupTree::new("Scratch"), "project", Some(&make_group_id("Work")))
        .unwrap();
    manager
        .add_resource(make_group_id("Work").as_str(), readme)
        .unwrap();
    manager
        .add_resource(make_group_id("Code").as_str(), main.clone())
        .unwrap();
    manager
        .rename_group(make_group_id("Code").as_str(), "Source")
        .unwrap();
    manager
        .move_group(make_group_id("Scratch").as_str(), None)
        .unwrap();

    let reloaded = project_manager(&fixture);
    assert_eq!(shape(&reloaded), shape(&manager));
    assert!(reloaded.find_group(make_group_id("Code").as_str()).is_none());
    let source = reloaded.find_group(make_group_id("Source").as_str()).unwrap();
    assert_eq!(source.resources(), [main]);
    assert_eq!(reloaded.root_group_names(), ["Scratch", "Work"]);
}

#[test]
fn removed_nested_group_does_not_come_back() {
    let fixture = UnitTestFixture::new();
    let mut manager = project_manager(&fixture);
    let top = make_group_id("Top");
    manager.add_group(GroupTree::new("Top"), "project", None).unwrap();
    manager
        .add_group(GroupTree::new("Gone"), "project", Some(&top))
        .unwrap();
    manager
        .add_group(GroupTree::new("Deeper"), "project", Some(&make_group_id("Gone")))
        .unwrap();
    manager.remove_group(make_group_id("Gone").as_str()).unwrap();

    let reloaded = project_manager(&fixture);
    assert_eq!(reloaded.group_names(), ["Top"]);
}

#[test]
fn moving_between_state_and_project_rehomes_records() {
    let fixture = UnitTestFixture::new();
    let db = fixture.path().join("grove.db");
    let build = |fixture: &UnitTestFixture| {
        let mut manager = GroupManager::new();
        manager.register_provider(Box::new(StateProvider::new(SqliteStore::open(&db).unwrap())));
        manager.register_provider(Box::new(fixture.project_provider()));
        manager.load_all().unwrap();
        manager
    };

    let mut manager = build(&fixture);
    manager.add_group(GroupTree::new("Personal"), "state", None).unwrap();
    manager
        .add_group(
            GroupTree::new("Notes").with_child(GroupTree::new("Daily")),
            "state",
            None,
        )
        .unwrap();
    manager.add_group(GroupTree::new("Shared"), "project", None).unwrap();
    manager
        .move_group(make_group_id("Notes").as_str(), Some(&make_group_id("Shared")))
        .unwrap();

    let reloaded = build(&fixture);
    assert_eq!(reloaded.provider_of(make_group_id("Notes").as_str()), Some("project"));
    assert_eq!(reloaded.provider_of(make_group_id("Daily").as_str()), Some("project"));
    assert_eq!(reloaded.provider_of(make_group_id("Personal").as_str()), Some("state"));
    assert_eq!(reloaded.root_group_names(), ["Personal", "Shared"]);
    assert_eq!(shape(&reloaded), shape(&manager));

    let mut state_only = StateProvider::new(SqliteStore::open(&db).unwrap());
    let roots = state_only.load_root_nodes().unwrap();
    assert_eq!(roots.len(), 1);
}

#[test]
fn reset_empties_every_provider() {
    let fixture = UnitTestFixture::new();
    let mut manager = project_manager(&fixture);
    manager.add_group(GroupTree::new("A"), "project", None).unwrap();
    manager.reset_storage().unwrap();
    assert!(!fixture.path().join(".grove/groups.json").exists());
    assert!(project_manager(&fixture).forest().is_empty());
}
