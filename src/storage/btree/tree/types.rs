use std::sync::Arc;

use parking_lot::Mutex;

use crate::primitives::concurrency::TreeId;
use crate::storage::btree::arena::PageArena;
use crate::storage::btree::page::{Page, PageBounds};
use crate::storage::btree::snapshot::Snapshot;
use crate::storage::btree::stats::BTreeStats;
use crate::storage::options::BTreeOptions;
use crate::types::PageId;

/// Thread-safe, order-parameterized multiway search tree mapping keys to
/// object identifiers.
///
/// Every public operation takes the tree lock exactly once; the recursive
/// helpers below the API boundary work on [`TreeState`] directly and never
/// lock again.
pub struct BTree<K, V> {
    pub(crate) id: TreeId,
    pub(crate) options: BTreeOptions,
    pub(crate) bounds: PageBounds,
    pub(crate) stats: Arc<BTreeStats>,
    pub(crate) state: Mutex<TreeState<K, V>>,
}

/// Everything guarded by the tree lock.
pub(crate) struct TreeState<K, V> {
    pub(crate) pages: PageArena<K, V>,
    pub(crate) root: PageId,
    pub(crate) len: usize,
    /// Number of page levels; a lone root page has height 1.
    pub(crate) height: usize,
    pub(crate) bounds: PageBounds,
    pub(crate) unique: bool,
    /// Cached in-order copy, dropped by every successful mutation.
    pub(crate) snapshot: Option<Snapshot<K, V>>,
    pub(crate) stats: Arc<BTreeStats>,
    pub(crate) tree: TreeId,
}

impl<K, V> TreeState<K, V> {
    pub(crate) fn empty(
        bounds: PageBounds,
        unique: bool,
        stats: Arc<BTreeStats>,
        tree: TreeId,
    ) -> Self {
        let mut pages = PageArena::default();
        let root = pages.alloc(Page::leaf());
        Self {
            pages,
            root,
            len: 0,
            height: 1,
            bounds,
            unique,
            snapshot: None,
            stats,
            tree,
        }
    }

    /// Drops every page and restores the empty-tree invariants.
    pub(crate) fn reset(&mut self) {
        self.pages.clear();
        self.root = self.pages.alloc(Page::leaf());
        self.len = 0;
        self.height = 1;
        self.snapshot = None;
    }
}
