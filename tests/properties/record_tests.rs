use proptest::prelude::*;

use grove::core::{GroupTree, Resource};
use grove::storage::GroupMap;
use grove::storage::record::{build_forest, remove_record, store_tree};

/// `parents[i]` is the index of node `i`'s parent, always lower than `i`.
fn parent_layout() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1usize..12).prop_flat_map(|len| {
        (0..len)
            .map(|i| {
                if i == 0 {
                    Just(None).boxed()
                } else {
                    prop_oneof![Just(None), (0..i).prop_map(Some)].boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

fn build(index: usize, parents: &[Option<usize>]) -> GroupTree {
    let mut tree = GroupTree::new(format!("group-{index}")).with_resource(
        Resource::parse(&format!("file:///work/item-{index}.txt")).expect("valid uri"),
    );
    for (child, parent) in parents.iter().enumerate() {
        if *parent == Some(index) {
            tree = tree.with_child(build(child, parents));
        }
    }
    tree
}

fn roots_of(parents: &[Option<usize>]) -> Vec<GroupTree> {
    let mut roots: Vec<GroupTree> = parents
        .iter()
        .enumerate()
        .filter(|(_, parent)| parent.is_none())
        .map(|(index, _)| build(index, parents))
        .collect();
    roots.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
    roots
}

proptest! {
    #[test]
    fn stored_trees_load_back_unchanged(parents in parent_layout()) {
        let roots = roots_of(&parents);
        let mut map = GroupMap::new();
        for root in &roots {
            store_tree(&mut map, root);
        }
        prop_assert_eq!(map.len(), parents.len());
        prop_assert_eq!(build_forest(&map), roots);
    }

    #[test]
    fn removing_a_root_drops_exactly_its_subtree(parents in parent_layout()) {
        let roots = roots_of(&parents);
        let mut map = GroupMap::new();
        for root in &roots {
            store_tree(&mut map, root);
        }
        let victim = &roots[0];
        let removed = remove_record(&mut map, victim.id.as_str());
        prop_assert_eq!(removed, victim.node_count());
        prop_assert_eq!(build_forest(&map), roots[1..].to_vec());
    }
}
