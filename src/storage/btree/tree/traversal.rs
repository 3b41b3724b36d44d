use std::ops::ControlFlow;

use crate::storage::btree::page::Entry;
use crate::types::PageId;

use super::types::{BTree, TreeState};

/// Position at which a page's entries are visited relative to its children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Entries of a page before any of its children.
    PreOrder,
    /// Ascending key order.
    #[default]
    InOrder,
    /// Children of a page before its entries.
    PostOrder,
}

impl<K, V> TreeState<K, V> {
    /// Walks the whole tree, stopping as soon as `visit` breaks. The root is
    /// level 0.
    pub(crate) fn walk<F>(&mut self, order: TraversalOrder, visit: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&mut Entry<K, V>, usize) -> ControlFlow<()>,
    {
        let root = self.root;
        self.walk_page(root, order, 0, visit)
    }

    fn walk_page<F>(
        &mut self,
        page_id: PageId,
        order: TraversalOrder,
        level: usize,
        visit: &mut F,
    ) -> ControlFlow<()>
    where
        F: FnMut(&mut Entry<K, V>, usize) -> ControlFlow<()>,
    {
        let len = self.pages.get(page_id).len();
        let fanout = self.pages.get(page_id).children.len();
        match order {
            TraversalOrder::PreOrder => {
                self.visit_entries(page_id, level, visit)?;
                for slot in 0..fanout {
                    let child = self.pages.get(page_id).children[slot];
                    self.walk_page(child, order, level + 1, visit)?;
                }
            }
            TraversalOrder::InOrder => {
                for slot in 0..len {
                    if slot < fanout {
                        let child = self.pages.get(page_id).children[slot];
                        self.walk_page(child, order, level + 1, visit)?;
                    }
                    visit(&mut self.pages.get_mut(page_id).entries[slot], level)?;
                }
                if fanout > len {
                    let child = self.pages.get(page_id).children[len];
                    self.walk_page(child, order, level + 1, visit)?;
                }
            }
            TraversalOrder::PostOrder => {
                for slot in 0..fanout {
                    let child = self.pages.get(page_id).children[slot];
                    self.walk_page(child, order, level + 1, visit)?;
                }
                self.visit_entries(page_id, level, visit)?;
            }
        }
        ControlFlow::Continue(())
    }

    fn visit_entries<F>(&mut self, page_id: PageId, level: usize, visit: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&mut Entry<K, V>, usize) -> ControlFlow<()>,
    {
        for entry in self.pages.get_mut(page_id).entries.iter_mut() {
            visit(entry, level)?;
        }
        ControlFlow::Continue(())
    }
}

impl<K, V> BTree<K, V> {
    /// Visits every entry in the given order with its page level.
    ///
    /// The visitor may edit an entry's id through [`Entry::id_mut`] but
    /// cannot touch its key. Each visit bumps the entry's use counter. The
    /// tree lock is held for the whole walk, so the visitor must not call
    /// back into this tree.
    pub fn traverse<F>(&self, order: TraversalOrder, mut visit: F)
    where
        F: FnMut(&mut Entry<K, V>, usize),
    {
        let mut state = self.state.lock();
        let _ = state.walk(order, &mut |entry: &mut Entry<K, V>, level: usize| {
            entry.touch();
            visit(entry, level);
            ControlFlow::Continue(())
        });
        // Cached copies would carry stale ids and counters.
        state.snapshot = None;
    }

    /// In-order traversal.
    pub fn for_each<F>(&self, visit: F)
    where
        F: FnMut(&mut Entry<K, V>, usize),
    {
        self.traverse(TraversalOrder::InOrder, visit);
    }

    /// Same as [`BTree::for_each`].
    pub fn in_order<F>(&self, visit: F)
    where
        F: FnMut(&mut Entry<K, V>, usize),
    {
        self.traverse(TraversalOrder::InOrder, visit);
    }

    /// Visits each page's entries before descending into its children.
    pub fn pre_order<F>(&self, visit: F)
    where
        F: FnMut(&mut Entry<K, V>, usize),
    {
        self.traverse(TraversalOrder::PreOrder, visit);
    }

    /// Visits each page's children before its own entries.
    pub fn post_order<F>(&self, visit: F)
    where
        F: FnMut(&mut Entry<K, V>, usize),
    {
        self.traverse(TraversalOrder::PostOrder, visit);
    }

    /// First entry, in key order, for which `predicate` holds.
    pub fn first_that<P>(&self, predicate: P) -> Option<Entry<K, V>>
    where
        K: Clone,
        V: Clone,
        P: FnMut(&Entry<K, V>, usize) -> bool,
    {
        self.first_that_in(TraversalOrder::InOrder, predicate)
    }

    /// First entry for which `predicate` holds, scanning in `order`.
    ///
    /// Entries up to and including the match count as visited.
    pub fn first_that_in<P>(&self, order: TraversalOrder, mut predicate: P) -> Option<Entry<K, V>>
    where
        K: Clone,
        V: Clone,
        P: FnMut(&Entry<K, V>, usize) -> bool,
    {
        let mut state = self.state.lock();
        let mut found = None;
        let _ = state.walk(order, &mut |entry: &mut Entry<K, V>, level: usize| {
            entry.touch();
            if predicate(&*entry, level) {
                found = Some(entry.clone());
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        state.snapshot = None;
        found
    }
}
