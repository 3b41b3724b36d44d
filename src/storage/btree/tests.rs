use super::{BTree, TreeShape};
use crate::storage::options::BTreeOptions;
use crate::types::{PageId, Result};
use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Keys of every page, grouped by level from the root down.
fn levels(tree: &BTree<u32, u32>) -> Vec<Vec<Vec<u32>>> {
    let state = tree.state.lock();
    let mut out = Vec::new();
    let mut frontier: Vec<PageId> = vec![state.root];
    while !frontier.is_empty() {
        let mut next = Vec::new();
        let mut row = Vec::new();
        for id in frontier {
            let page = state.pages.get(id);
            row.push(page.entries.iter().map(|e| *e.key()).collect());
            next.extend(page.children.iter().copied());
        }
        out.push(row);
        frontier = next;
    }
    out
}

fn tree_of(order: usize, keys: impl IntoIterator<Item = u32>) -> Result<BTree<u32, u32>> {
    let tree = BTree::new(order)?;
    for key in keys {
        assert!(tree.insert(key, key * 10));
    }
    tree.verify()?;
    Ok(tree)
}

fn assert_tree_matches_reference(
    tree: &BTree<u64, u64>,
    reference: &BTreeMap<u64, u64>,
) -> Result<()> {
    let shape = tree.verify()?;
    assert_eq!(shape.entries, reference.len());
    let actual: Vec<(u64, u64)> = tree.iter().map(|e| e.into_pair()).collect();
    let expected: Vec<(u64, u64)> = reference.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(actual, expected);
    Ok(())
}

#[test]
fn empty_tree_is_single_leaf() -> Result<()> {
    let tree: BTree<u32, u32> = BTree::new(3)?;
    assert_eq!(
        tree.verify()?,
        TreeShape {
            pages: 1,
            leaves: 1,
            entries: 0,
            height: 1
        }
    );
    assert_eq!(levels(&tree), vec![vec![Vec::<u32>::new()]]);
    Ok(())
}

#[test]
fn root_split_creates_new_internal() -> Result<()> {
    let tree = tree_of(3, 0..5)?;
    assert_eq!(tree.height(), 1);
    assert!(tree.insert(5, 50));
    assert_eq!(tree.height(), 2);
    assert_eq!(
        levels(&tree),
        vec![vec![vec![3]], vec![vec![0, 1, 2], vec![4, 5]]]
    );
    let stats = tree.stats_snapshot();
    assert_eq!(stats.root_splits, 1);
    assert_eq!(stats.page_splits, 0);
    Ok(())
}

#[test]
fn child_split_promotes_into_parent() -> Result<()> {
    let tree = tree_of(3, 0..10)?;
    assert_eq!(
        levels(&tree),
        vec![vec![vec![3, 7]], vec![vec![0, 1, 2], vec![4, 5, 6], vec![8, 9]]]
    );
    assert_eq!(tree.stats_snapshot().page_splits, 1);
    Ok(())
}

#[test]
fn delete_nonexistent_key_returns_false() -> Result<()> {
    let tree = tree_of(3, 0..10)?;
    assert!(!tree.remove(&42, &420));
    assert!(!tree.remove(&4, &41));
    assert_eq!(tree.len(), 10);
    assert_eq!(tree.stats_snapshot().remove_misses, 2);
    Ok(())
}

#[test]
fn delete_rebalances_via_left_sibling_borrow() -> Result<()> {
    let tree = tree_of(3, 0..10)?;
    assert!(tree.remove(&8, &80));
    tree.verify()?;
    assert_eq!(
        levels(&tree),
        vec![vec![vec![3, 6]], vec![vec![0, 1, 2], vec![4, 5], vec![7, 9]]]
    );
    assert_eq!(tree.stats_snapshot().borrows, 1);
    Ok(())
}

#[test]
fn delete_rebalances_via_right_sibling_borrow() -> Result<()> {
    let tree = tree_of(3, 0..10)?;
    assert!(tree.remove(&0, &0));
    assert!(tree.remove(&1, &10));
    tree.verify()?;
    assert_eq!(
        levels(&tree),
        vec![vec![vec![4, 7]], vec![vec![2, 3], vec![5, 6], vec![8, 9]]]
    );
    assert_eq!(tree.stats_snapshot().borrows, 1);
    Ok(())
}

#[test]
fn delete_merges_leftmost_leaf_with_right_sibling() -> Result<()> {
    let tree = tree_of(3, 0..10)?;
    for key in [0, 1, 2] {
        assert!(tree.remove(&key, &(key * 10)));
        tree.verify()?;
    }
    assert_eq!(
        levels(&tree),
        vec![vec![vec![7]], vec![vec![3, 4, 5, 6], vec![8, 9]]]
    );
    assert_eq!(tree.stats_snapshot().merges, 1);
    assert_eq!(tree.height(), 2);
    Ok(())
}

#[test]
fn delete_collapse_root_to_leaf() -> Result<()> {
    let tree = tree_of(3, 0..6)?;
    assert_eq!(tree.height(), 2);
    assert!(tree.remove(&0, &0));
    assert!(tree.remove(&4, &40));
    assert_eq!(tree.height(), 1);
    assert_eq!(levels(&tree), vec![vec![vec![1, 2, 3, 5]]]);
    let stats = tree.stats_snapshot();
    assert_eq!(stats.merges, 1);
    assert_eq!(stats.root_collapses, 1);
    assert_eq!(tree.verify()?.pages, 1);
    Ok(())
}

#[test]
fn internal_delete_pulls_predecessor() -> Result<()> {
    let tree = tree_of(3, 0..10)?;
    assert!(tree.remove(&3, &30));
    tree.verify()?;
    assert_eq!(
        levels(&tree),
        vec![vec![vec![2, 7]], vec![vec![0, 1], vec![4, 5, 6], vec![8, 9]]]
    );
    assert_eq!(tree.search(&3), None);
    assert_eq!(tree.search(&2), Some(20));
    Ok(())
}

#[test]
fn cascading_splits_build_multi_level_tree() -> Result<()> {
    let tree = tree_of(3, 0..500)?;
    let shape = tree.verify()?;
    assert!(shape.height >= 4, "height {}", shape.height);
    for key in 0..500 {
        assert_eq!(tree.search(&key), Some(key * 10));
    }
    let stats = tree.stats_snapshot();
    assert_eq!(stats.root_splits as usize, shape.height - 1);
    Ok(())
}

#[test]
fn ascending_inserts_descending_removes_return_to_empty() -> Result<()> {
    for order in [3, 4, 7] {
        let tree = tree_of(order, 0..50)?;
        for key in (0..50).rev() {
            assert!(tree.remove(&key, &(key * 10)));
            tree.verify()?;
        }
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.verify()?.pages, 1);
    }
    Ok(())
}

#[test]
fn duplicate_keys_survive_splits_and_merges() -> Result<()> {
    let tree = BTree::with_options(BTreeOptions::new(3).unique_keys(false))?;
    for id in 0..40u32 {
        assert!(tree.insert(id % 4, id));
        tree.verify()?;
    }
    assert_eq!(tree.search(&2), Some(2));
    let twos: Vec<u32> = tree
        .iter()
        .filter(|e| *e.key() == 2)
        .map(|e| *e.id())
        .collect();
    assert_eq!(twos, (0..10).map(|i| i * 4 + 2).collect::<Vec<_>>());

    let mut rng = ChaCha8Rng::seed_from_u64(0xB7EE);
    let mut ids: Vec<u32> = (0..40).collect();
    ids.shuffle(&mut rng);
    for id in ids {
        assert!(!tree.remove(&(id % 4), &(id + 100)));
        assert!(tree.remove(&(id % 4), &id));
        tree.verify()?;
    }
    assert!(tree.is_empty());
    Ok(())
}

#[test]
fn randomized_ops_match_reference() -> Result<()> {
    for (seed, order) in [(1u64, 3usize), (2, 4), (3, 5), (4, 16)] {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let tree = BTree::<u64, u64>::new(order)?;
        let mut reference = BTreeMap::new();
        for step in 0..2_000 {
            let key = rng.gen_range(0..300u64);
            if rng.gen_bool(0.6) {
                let id = rng.gen::<u64>();
                let expected = !reference.contains_key(&key);
                if expected {
                    reference.insert(key, id);
                }
                assert_eq!(tree.insert(key, id), expected);
            } else {
                let expected = reference.remove(&key);
                let id = expected.unwrap_or(0);
                assert_eq!(tree.remove(&key, &id), expected.is_some());
            }
            if step % 50 == 0 {
                assert_tree_matches_reference(&tree, &reference)?;
            }
        }
        assert_tree_matches_reference(&tree, &reference)?;
    }
    Ok(())
}

#[derive(Clone, Debug)]
enum PropOp {
    Insert(u64, u64),
    Remove(u64),
    RemoveWrongId(u64),
}

fn op_strategy() -> impl Strategy<Value = PropOp> {
    let key_range = 0u64..64;
    let id_range = 0u64..512;
    prop_oneof![
        3 => (key_range.clone(), id_range).prop_map(|(k, v)| PropOp::Insert(k, v)),
        2 => key_range.clone().prop_map(PropOp::Remove),
        1 => key_range.prop_map(PropOp::RemoveWrongId),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]
    #[test]
    fn btree_matches_btreemap_random_ops(
        order in 3usize..7,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let tree = BTree::<u64, u64>::new(order).expect("valid order");
        let mut reference = BTreeMap::new();

        for op in ops {
            match op {
                PropOp::Insert(key, id) => {
                    let fresh = !reference.contains_key(&key);
                    if fresh {
                        reference.insert(key, id);
                    }
                    prop_assert_eq!(tree.insert(key, id), fresh);
                }
                PropOp::Remove(key) => {
                    let expected = reference.remove(&key);
                    let removed = tree.remove(&key, &expected.unwrap_or_default());
                    prop_assert_eq!(removed, expected.is_some());
                }
                PropOp::RemoveWrongId(key) => {
                    let wrong = reference.get(&key).map_or(0, |id| id + 1);
                    prop_assert!(!tree.remove(&key, &wrong));
                }
            }
            let shape = tree.verify().expect("invariants hold");
            prop_assert_eq!(shape.entries, reference.len());
        }

        let actual: BTreeMap<u64, u64> = tree.iter().map(|e| e.into_pair()).collect();
        prop_assert_eq!(actual, reference);
    }
}
