use proptest::prelude::*;

use grove::GroupManager;
use grove::core::{GroupId, GroupTree, make_group_id};
use grove::test_utils::mock::RecordingProvider;

#[derive(Debug, Clone)]
enum Op {
    Add { name: usize, parent: Option<usize> },
    Move { group: usize, target: Option<usize> },
    Rename { group: usize, name: usize },
    Remove { group: usize },
}

fn op() -> impl Strategy<Value = Op> {
    let slot = 0usize..8;
    prop_oneof![
        3 => (slot.clone(), proptest::option::of(slot.clone()))
            .prop_map(|(name, parent)| Op::Add { name, parent }),
        3 => (slot.clone(), proptest::option::of(slot.clone()))
            .prop_map(|(group, target)| Op::Move { group, target }),
        1 => (slot.clone(), slot.clone()).prop_map(|(group, name)| Op::Rename { group, name }),
        1 => slot.prop_map(|group| Op::Remove { group }),
    ]
}

fn name(slot: usize) -> String {
    format!("n{slot}")
}

fn id(slot: usize) -> GroupId {
    make_group_id(&name(slot))
}

fn apply(manager: &mut GroupManager, op: &Op) {
    let outcome = match op {
        Op::Add { name: slot, parent } => manager
            .add_group(GroupTree::new(name(*slot)), "p", parent.map(id).as_ref())
            .map(|_| ()),
        Op::Move { group, target } => manager
            .move_group(id(*group).as_str(), target.map(id).as_ref())
            .map(|_| ()),
        Op::Rename { group, name: slot } => manager
            .rename_group(id(*group).as_str(), &name(*slot))
            .map(|_| ()),
        Op::Remove { group } => manager.remove_group(id(*group).as_str()).map(|_| ()),
    };
    assert!(outcome.is_ok(), "{op:?} failed: {outcome:?}");
}

fn check_links(manager: &GroupManager) -> Result<(), TestCaseError> {
    let forest = manager.forest();
    let mut root_count = 0;
    for group in forest.iter() {
        for child in group.child_ids() {
            let child = forest.get(child.as_str());
            prop_assert!(child.is_some(), "dangling child of {}", group.name());
            prop_assert_eq!(child.and_then(|c| c.parent_id()), Some(group.id()));
        }
        match group.parent_id() {
            Some(parent) => {
                let parent = forest.get(parent.as_str());
                prop_assert!(parent.is_some_and(|p| p.child_ids().contains(group.id())));
                prop_assert!(!manager.roots().contains(group.id()));
            }
            None => {
                root_count += 1;
                prop_assert!(manager.roots().contains(group.id()));
            }
        }
        prop_assert!(manager.provider_of(group.id().as_str()).is_some());
        prop_assert!(!forest.is_descendant(group.id().as_str(), group.id().as_str()));
    }
    prop_assert_eq!(root_count, manager.roots().len());
    Ok(())
}

proptest! {
    #[test]
    fn links_stay_consistent(ops in proptest::collection::vec(op(), 1..40)) {
        let mut manager = GroupManager::new();
        manager.register_provider(Box::new(RecordingProvider::new("p")));
        manager.load_all().unwrap();
        for op in &ops {
            apply(&mut manager, op);
            check_links(&manager)?;
        }
    }

    #[test]
    fn attach_is_idempotent(children in proptest::collection::vec(1usize..6, 1..10)) {
        let mut manager = GroupManager::new();
        manager.register_provider(Box::new(RecordingProvider::new("p")));
        manager.add_group(GroupTree::new(name(0)), "p", None).unwrap();
        for child in &children {
            manager.add_group(GroupTree::new(name(*child)), "p", None).unwrap();
            manager.move_group(id(*child).as_str(), Some(&id(0))).unwrap();
            manager.move_group(id(*child).as_str(), Some(&id(0))).unwrap();
        }
        let parent = manager.find_group(id(0).as_str()).unwrap();
        let mut unique = children.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(parent.child_ids().len(), unique.len());
        check_links(&manager)?;
    }
}
