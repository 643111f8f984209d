//! Property tests for tree mutations and the CSV codec

use logictree::csv_io::{tree_from_csv, tree_to_csv, CsvOptions};
use logictree::{Direction, DropPosition, LogicTree, NodeId, NodeOrigin};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Move { node: usize, target: usize, position: DropPosition },
    Reorder { node: usize, direction: Direction },
    Delete { node: usize },
}

fn position_strategy() -> impl Strategy<Value = DropPosition> {
    prop_oneof![
        Just(DropPosition::Into),
        Just(DropPosition::Before),
        Just(DropPosition::After),
    ]
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Up), Just(Direction::Down)]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<usize>(), any::<usize>(), position_strategy())
            .prop_map(|(node, target, position)| Op::Move { node, target, position }),
        2 => (any::<usize>(), direction_strategy()).prop_map(|(node, direction)| Op::Reorder { node, direction }),
        1 => any::<usize>().prop_map(|node| Op::Delete { node }),
    ]
}

/// Each entry adds one node under an earlier node picked by the seed
fn tree_strategy() -> impl Strategy<Value = LogicTree> {
    prop::collection::vec((any::<usize>(), "[A-Za-z][A-Za-z0-9 ,\"]{0,10}", any::<bool>()), 0..24).prop_map(
        |specs| {
            let mut tree = LogicTree::new("Root topic").unwrap();
            let mut ids = vec![NodeId::root()];
            for (seed, text, ai) in specs {
                let parent = ids[seed % ids.len()].clone();
                let origin = if ai { NodeOrigin::Ai } else { NodeOrigin::Manual };
                let id = tree.add_child(&parent, &text, origin).unwrap();
                ids.push(id);
            }
            tree
        },
    )
}

fn ids_of(tree: &LogicTree) -> Vec<NodeId> {
    tree.iter().map(|(_, n)| n.id.clone()).collect()
}

fn sorted_ids(tree: &LogicTree) -> Vec<NodeId> {
    let mut ids = ids_of(tree);
    ids.sort();
    ids
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn mutations_keep_tree_valid(tree in tree_strategy(), ops in prop::collection::vec(op_strategy(), 0..16)) {
        let mut tree = tree;
        for op in ops {
            let ids = ids_of(&tree);
            let before = tree.clone();
            match op {
                Op::Move { node, target, position } => {
                    let node = &ids[node % ids.len()];
                    let target = &ids[target % ids.len()];
                    match tree.move_node(node, target, position) {
                        Ok(()) => {
                            prop_assert_eq!(sorted_ids(&tree), sorted_ids(&before));
                            prop_assert!(!tree.is_root(node));
                            if position == DropPosition::Into {
                                let parent = tree.parent_of(node).map(|p| p.id.clone());
                                prop_assert_eq!(parent.as_ref(), Some(target));
                            } else {
                                let moved_parent = tree.parent_of(node).map(|p| p.id.clone());
                                let target_parent = tree.parent_of(target).map(|p| p.id.clone());
                                prop_assert_eq!(moved_parent, target_parent);
                            }
                            // The moved subtree travels intact
                            prop_assert_eq!(tree.find(node), before.find(node));
                        }
                        Err(_) => prop_assert_eq!(&tree, &before),
                    }
                }
                Op::Reorder { node, direction } => {
                    let node = &ids[node % ids.len()];
                    match tree.reorder(node, direction) {
                        Ok(()) => {
                            prop_assert_eq!(sorted_ids(&tree), sorted_ids(&before));
                            prop_assert_eq!(
                                tree.parent_of(node).map(|p| p.id.clone()),
                                before.parent_of(node).map(|p| p.id.clone())
                            );
                            // Reordering back restores the original
                            let back = match direction {
                                Direction::Up => Direction::Down,
                                Direction::Down => Direction::Up,
                            };
                            let mut undone = tree.clone();
                            undone.reorder(node, back).unwrap();
                            prop_assert_eq!(&undone, &before);
                        }
                        Err(_) => prop_assert_eq!(&tree, &before),
                    }
                }
                Op::Delete { node } => {
                    let node = &ids[node % ids.len()];
                    match tree.delete(node) {
                        Ok(removed) => {
                            prop_assert_eq!(tree.node_count() + removed.subtree_size(), before.node_count());
                            prop_assert!(!tree.contains(node));
                        }
                        Err(_) => {
                            prop_assert!(before.is_root(node));
                            prop_assert_eq!(&tree, &before);
                        }
                    }
                }
            }
            prop_assert!(tree.validate().is_ok());
        }
    }

    #[test]
    fn csv_round_trip_preserves_tree(tree in tree_strategy(), bom in any::<bool>()) {
        let csv = tree_to_csv(&tree, &CsvOptions { bom }).unwrap();
        prop_assert_eq!(csv.lines().count(), tree.node_count() + 1);
        let parsed = tree_from_csv(&csv).unwrap();
        prop_assert_eq!(parsed, tree);
    }

    #[test]
    fn replace_ai_children_keeps_manual_children(tree in tree_strategy(), ideas in prop::collection::vec("[a-z]{1,8}", 1..5)) {
        let mut tree = tree;
        let root = tree.root().id.clone();
        let manual_before: Vec<NodeId> = tree
            .root()
            .children
            .iter()
            .filter(|c| !c.is_ai())
            .map(|c| c.id.clone())
            .collect();

        let added = tree.replace_ai_children(&root, &ideas).unwrap();
        prop_assert_eq!(added.len(), ideas.len());

        let children = &tree.root().children;
        let manual_after: Vec<NodeId> = children.iter().filter(|c| !c.is_ai()).map(|c| c.id.clone()).collect();
        prop_assert_eq!(manual_after, manual_before);
        let ai_after: Vec<NodeId> = children.iter().filter(|c| c.is_ai()).map(|c| c.id.clone()).collect();
        prop_assert_eq!(ai_after, added);
    }
}
