use grove::GroupManager;
use grove::core::{GroupId, GroupTree, Resource, make_group_id};
use grove::test_utils::logging::capture_logs;
use grove::test_utils::mock::RecordingProvider;
use tracing::Level;

fn res(path: &str) -> Resource {
    Resource::parse(&format!("file://{path}")).unwrap()
}

fn id(name: &str) -> GroupId {
    make_group_id(name)
}

fn loaded(providers: Vec<RecordingProvider>) -> GroupManager {
    let mut manager = GroupManager::new();
    for provider in providers {
        manager.register_provider(Box::new(provider));
    }
    manager.load_all().unwrap();
    manager
}

#[test]
fn all_resources_is_pre_order() {
    let tree = GroupTree::new("Root")
        .with_resource(res("/r0"))
        .with_child(GroupTree::new("C1").with_resource(res("/r1")))
        .with_child(
            GroupTree::new("C2")
                .with_resource(res("/r2"))
                .with_resource(res("/r3")),
        );
    let manager = loaded(vec![RecordingProvider::new("p").with_roots(vec![tree])]);
    let all: Vec<String> = manager
        .forest()
        .all_resources(id("Root").as_str())
        .into_iter()
        .map(Resource::base_name)
        .collect();
    assert_eq!(all, ["r0", "r1", "r2", "r3"]);
}

#[test]
fn two_providers_then_reload_one() {
    let a = RecordingProvider::new("a").with_roots(vec![GroupTree::new("Alpha")]);
    let b = RecordingProvider::new("b").with_roots(vec![GroupTree::new("Beta")]);
    let b_log = b.calls();
    let mut manager = loaded(vec![a, b]);

    assert_eq!(manager.root_groups().len(), 2);
    assert_eq!(manager.forest().len(), 2);
    assert!(manager.root_groups().iter().all(|g| !g.has_child_groups()));

    manager
        .add_resource(id("Alpha").as_str(), res("/alpha/notes.md"))
        .unwrap();
    b_log.set_roots(vec![GroupTree::new("Beta").with_resource(res("/beta/new.md"))]);
    manager.reload_provider("b").unwrap();

    let alpha = manager.find_group(id("Alpha").as_str()).unwrap();
    assert_eq!(alpha.resources(), [res("/alpha/notes.md")]);
    let beta = manager.find_group(id("Beta").as_str()).unwrap();
    assert_eq!(beta.resources(), [res("/beta/new.md")]);
}

#[test]
fn remove_group_with_two_descendants() {
    let tree = GroupTree::new("Doomed")
        .with_child(GroupTree::new("One"))
        .with_child(GroupTree::new("Two"));
    let provider = RecordingProvider::new("p").with_roots(vec![tree, GroupTree::new("Other")]);
    let log = provider.calls();
    let mut manager = loaded(vec![provider]);
    let before = manager.forest().len();

    manager.remove_group(id("Doomed").as_str()).unwrap();
    assert_eq!(before - manager.forest().len(), 3);
    assert_eq!(log.deleted().len(), 3);
    assert_eq!(manager.root_group_names(), ["Other"]);
}

#[test]
fn duplicate_load_logs_warning() {
    let a = RecordingProvider::new("a").with_roots(vec![GroupTree::new("Same")]);
    let b = RecordingProvider::new("b").with_roots(vec![GroupTree::new("Same")]);
    let (manager, logs) = capture_logs("grove=debug", || loaded(vec![a, b]));
    assert_eq!(manager.roots().len(), 1);
    assert!(logs.contains(Level::WARN, "already loaded"));
    assert!(logs.contains_message("loaded groups"));
}

#[test]
fn reregistering_provider_replaces_it() {
    let mut manager = GroupManager::new();
    manager.register_provider(Box::new(RecordingProvider::new("a")));
    manager.register_provider(Box::new(RecordingProvider::new("b")));
    manager.register_provider(Box::new(
        RecordingProvider::new("a").with_roots(vec![GroupTree::new("Fresh")]),
    ));
    assert_eq!(manager.providers(), ["a", "b"]);
    manager.load_all().unwrap();
    assert_eq!(manager.root_group_names(), ["Fresh"]);
}

#[test]
fn rename_then_move_keeps_links() {
    let tree = GroupTree::new("Top")
        .with_child(GroupTree::new("Mid").with_child(GroupTree::new("Leaf")));
    let mut manager = loaded(vec![RecordingProvider::new("p").with_roots(vec![tree])]);

    let renamed = manager
        .rename_group(id("Mid").as_str(), "Middle")
        .unwrap()
        .unwrap();
    manager.move_group(id("Leaf").as_str(), None).unwrap();
    manager
        .move_group(renamed.as_str(), Some(&id("Leaf")))
        .unwrap();

    let leaf = manager.find_group(id("Leaf").as_str()).unwrap();
    assert!(leaf.is_root_group());
    assert_eq!(leaf.child_ids(), [renamed.clone()]);
    let top = manager.find_group(id("Top").as_str()).unwrap();
    assert!(!top.has_child_groups());
    assert_eq!(manager.root_group_names(), ["Top", "Leaf"]);
}
