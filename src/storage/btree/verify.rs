use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::types::{PageId, PageTreeError, Result};

use super::tree::{BTree, TreeState};

/// Structural summary produced by a successful [`BTree::verify`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TreeShape {
    /// Pages reachable from the root.
    pub pages: usize,
    /// Pages without children.
    pub leaves: usize,
    /// Entries across all pages.
    pub entries: usize,
    /// Page levels from root to leaf.
    pub height: usize,
}

struct Checker<'a, K, V> {
    state: &'a TreeState<K, V>,
    visited: HashSet<PageId>,
    leaf_depth: Option<usize>,
    shape: TreeShape,
}

impl<K: Ord, V> Checker<'_, K, V> {
    fn page(
        &mut self,
        page_id: PageId,
        depth: usize,
        lower: Option<&K>,
        upper: Option<&K>,
    ) -> Result<()> {
        if !self.visited.insert(page_id) {
            return Err(PageTreeError::Corruption("page reachable from two parents"));
        }
        let state = self.state;
        let page = state
            .pages
            .try_get(page_id)
            .ok_or(PageTreeError::Corruption("child handle points at no page"))?;
        let is_root = page_id == state.root;
        self.shape.pages += 1;
        self.shape.entries += page.len();

        if !page.is_sorted(state.unique) {
            return Err(PageTreeError::Corruption("entries out of order within page"));
        }
        for entry in &page.entries {
            if !self.within(entry.key(), lower, upper) {
                return Err(PageTreeError::Corruption("key outside separator bounds"));
            }
        }
        if page.is_overflowing(&state.bounds) {
            return Err(PageTreeError::Corruption("page exceeds capacity"));
        }
        if !is_root && page.is_underflowing(&state.bounds) {
            return Err(PageTreeError::Corruption("page below minimum fill"));
        }

        if page.is_leaf() {
            self.shape.leaves += 1;
            match self.leaf_depth {
                None => self.leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(PageTreeError::Corruption("leaves at different depths"));
                }
                Some(_) => {}
            }
            return Ok(());
        }

        if page.children.len() != page.len() + 1 {
            return Err(PageTreeError::Corruption("child count does not match entries"));
        }
        if page.len() == 0 {
            return Err(PageTreeError::Corruption("internal page without entries"));
        }
        for (slot, &child) in page.children.iter().enumerate() {
            let low = if slot == 0 {
                lower
            } else {
                Some(page.entries[slot - 1].key())
            };
            let high = page.entries.get(slot).map(|e| e.key()).or(upper);
            self.page(child, depth + 1, low, high)?;
        }
        Ok(())
    }

    fn within(&self, key: &K, lower: Option<&K>, upper: Option<&K>) -> bool {
        let unique = self.state.unique;
        let above = lower.map_or(true, |low| match key.cmp(low) {
            Ordering::Greater => true,
            Ordering::Equal => !unique,
            Ordering::Less => false,
        });
        let below = upper.map_or(true, |high| match key.cmp(high) {
            Ordering::Less => true,
            Ordering::Equal => !unique,
            Ordering::Greater => false,
        });
        above && below
    }
}

impl<K: Ord, V> BTree<K, V> {
    /// Walks every page and checks the structural invariants: key order
    /// inside pages and against separators, child counts, capacity bounds
    /// (the root may run below the minimum), uniform leaf depth matching
    /// [`BTree::height`], the entry count matching [`BTree::len`] and the
    /// absence of orphaned pages.
    ///
    /// Returns [`PageTreeError::Corruption`] naming the first violation.
    pub fn verify(&self) -> Result<TreeShape> {
        let state = self.state.lock();
        let mut checker = Checker {
            state: &state,
            visited: HashSet::new(),
            leaf_depth: None,
            shape: TreeShape::default(),
        };
        checker.page(state.root, 1, None, None)?;
        let mut shape = checker.shape;
        shape.height = checker.leaf_depth.unwrap_or(0);
        if shape.height != state.height {
            return Err(PageTreeError::Corruption("leaf depth differs from height"));
        }
        if shape.entries != state.len {
            return Err(PageTreeError::Corruption("entry count differs from len"));
        }
        if shape.pages != state.pages.live_pages() {
            return Err(PageTreeError::Corruption("arena holds unreachable pages"));
        }
        tracing::trace!(
            target: "pagetree::btree::verify",
            tree = %self.id,
            pages = shape.pages,
            leaves = shape.leaves,
            entries = shape.entries,
            height = shape.height,
            "verified btree"
        );
        Ok(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::btree::page::Entry;

    #[test]
    fn empty_tree_is_a_single_leaf() -> Result<()> {
        let tree: BTree<u32, u32> = BTree::new(3)?;
        let shape = tree.verify()?;
        assert_eq!(
            shape,
            TreeShape {
                pages: 1,
                leaves: 1,
                entries: 0,
                height: 1,
            }
        );
        Ok(())
    }

    #[test]
    fn detects_out_of_order_leaf() -> Result<()> {
        let tree = BTree::new(3)?;
        tree.insert_many([(1u32, 1u32), (2, 2), (3, 3)]);
        {
            let mut state = tree.state.lock();
            let root = state.root;
            state.pages.get_mut(root).entries.swap(0, 2);
        }
        assert!(matches!(
            tree.verify(),
            Err(PageTreeError::Corruption("entries out of order within page"))
        ));
        Ok(())
    }

    #[test]
    fn detects_separator_violation() -> Result<()> {
        let tree = BTree::new(3)?;
        tree.insert_many((0..10u32).map(|k| (k, k)));
        assert_eq!(tree.height(), 2);
        {
            let mut state = tree.state.lock();
            let root = state.root;
            let right = *state.pages.get(root).children.last().expect("internal root");
            state.pages.get_mut(right).entries[0] = Entry::new(0, 0);
        }
        assert!(matches!(
            tree.verify(),
            Err(PageTreeError::Corruption(_))
        ));
        Ok(())
    }

    #[test]
    fn dangling_child_is_reported_not_panicked() -> Result<()> {
        let tree = BTree::new(3)?;
        tree.insert_many((0..10u32).map(|k| (k, k)));
        {
            let mut state = tree.state.lock();
            let root = state.root;
            let last = state.pages.get(root).children.len() - 1;
            state.pages.get_mut(root).children[last] = PageId(999);
        }
        assert!(matches!(
            tree.verify(),
            Err(PageTreeError::Corruption("child handle points at no page"))
        ));
        Ok(())
    }

    #[test]
    fn detects_count_mismatch() -> Result<()> {
        let tree = BTree::new(3)?;
        tree.insert_many([(1u32, 1u32), (2, 2)]);
        tree.state.lock().len = 5;
        assert!(matches!(
            tree.verify(),
            Err(PageTreeError::Corruption("entry count differs from len"))
        ));
        Ok(())
    }
}
