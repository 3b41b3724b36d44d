use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::primitives::concurrency::TreeId;
use crate::storage::btree::cursor::{Cursor, RevCursor, SnapshotIter};
use crate::storage::btree::page::PageBounds;
use crate::storage::btree::snapshot::Snapshot;
use crate::storage::btree::stats::{BTreeStats, BTreeStatsSnapshot};
use crate::storage::options::BTreeOptions;
use crate::types::Result;

use super::types::{BTree, TreeState};

impl<K, V> BTree<K, V> {
    /// Creates an empty tree of the given order with unique keys.
    pub fn new(order: usize) -> Result<Self> {
        Self::with_options(BTreeOptions::new(order))
    }

    /// Creates an empty tree; fails with
    /// [`PageTreeError::InvalidOrder`](crate::types::PageTreeError::InvalidOrder)
    /// when `options.order` is below the minimum.
    pub fn with_options(options: BTreeOptions) -> Result<Self> {
        options.validate()?;
        let bounds = PageBounds::for_order(options.order)?;
        Ok(Self::from_parts(options, bounds))
    }

    fn from_parts(options: BTreeOptions, bounds: PageBounds) -> Self {
        let id = TreeId::next();
        let stats = Arc::new(BTreeStats::default());
        let state = TreeState::empty(bounds, options.unique_keys, Arc::clone(&stats), id);
        tracing::debug!(
            target: "pagetree::btree",
            tree = %id,
            order = options.order,
            unique_keys = options.unique_keys,
            "created btree"
        );
        Self {
            id,
            options,
            bounds,
            stats,
            state: Mutex::new(state),
        }
    }

    /// Process-unique identity, stable across moves.
    pub fn id(&self) -> TreeId {
        self.id
    }

    /// Options the tree was built with.
    pub fn options(&self) -> BTreeOptions {
        self.options
    }

    /// The order fixed at construction.
    pub fn order(&self) -> usize {
        self.options.order
    }

    /// Whether duplicate keys are rejected.
    pub fn unique_keys(&self) -> bool {
        self.options.unique_keys
    }

    /// Capacity limits every page shares.
    pub fn bounds(&self) -> PageBounds {
        self.bounds
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.state.lock().len
    }

    /// Whether the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of page levels, 1 for a tree that is a single root page.
    pub fn height(&self) -> usize {
        self.state.lock().height
    }

    /// Access the live statistics counters for this tree.
    pub fn stats(&self) -> Arc<BTreeStats> {
        Arc::clone(&self.stats)
    }

    /// Snapshot the current statistics counters.
    pub fn stats_snapshot(&self) -> BTreeStatsSnapshot {
        self.stats.snapshot()
    }

    /// Emit the current statistics to the tracing sink.
    pub fn emit_stats(&self) {
        self.stats.emit_tracing();
    }

    /// Drops every entry, leaving a single empty root page.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.reset();
        tracing::debug!(target: "pagetree::btree", tree = %self.id, "cleared btree");
    }

    /// Moves the whole page graph into a new tree and leaves this one empty.
    ///
    /// The returned tree has its own identity and fresh statistics.
    pub fn take(&self) -> Self {
        let fresh = Self::from_parts(self.options, self.bounds);
        let empty = TreeState::empty(
            self.bounds,
            self.options.unique_keys,
            Arc::clone(&self.stats),
            self.id,
        );
        let mut source = self.state.lock();
        let mut moved = std::mem::replace(&mut *source, empty);
        drop(source);
        moved.stats = Arc::clone(&fresh.stats);
        moved.tree = fresh.id;
        moved.snapshot = None;
        tracing::debug!(
            target: "pagetree::btree",
            from = %self.id,
            to = %fresh.id,
            len = moved.len,
            "moved page graph"
        );
        *fresh.state.lock() = moved;
        fresh
    }

    /// Returns the in-order snapshot, rebuilding it only after a mutation.
    pub fn snapshot(&self) -> Snapshot<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.state.lock().snapshot()
    }

    /// Iterates a snapshot of the current entries in key order.
    pub fn iter(&self) -> SnapshotIter<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.snapshot().into_iter()
    }

    /// Cursor at the first entry.
    pub fn begin(&self) -> Cursor<K, V>
    where
        K: Clone,
        V: Clone,
    {
        Cursor::new(self.snapshot(), 0)
    }

    /// Cursor one past the last entry.
    pub fn end(&self) -> Cursor<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let snapshot = self.snapshot();
        let len = snapshot.len();
        Cursor::new(snapshot, len)
    }

    /// Reverse cursor at the last entry.
    pub fn rbegin(&self) -> RevCursor<K, V>
    where
        K: Clone,
        V: Clone,
    {
        RevCursor::new(self.end())
    }

    /// Reverse cursor one before the first entry.
    pub fn rend(&self) -> RevCursor<K, V>
    where
        K: Clone,
        V: Clone,
    {
        RevCursor::new(self.begin())
    }
}

impl<K: Ord, V> BTree<K, V> {
    /// Builds a tree by inserting `pairs` one at a time, in the order given.
    pub fn from_pairs<I>(options: BTreeOptions, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let tree = Self::with_options(options)?;
        tree.insert_many(pairs);
        Ok(tree)
    }

    /// Inserts `(key, id)`. Returns `false` when unique keys are enforced
    /// and `key` is already present.
    pub fn insert(&self, key: K, id: V) -> bool {
        self.state.lock().insert(key, id)
    }

    /// Inserts a batch under a single lock acquisition and returns how many
    /// pairs were accepted. Rejected duplicates do not roll back the rest.
    pub fn insert_many<I>(&self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut state = self.state.lock();
        let mut accepted = 0;
        for (key, id) in pairs {
            if state.insert(key, id) {
                accepted += 1;
            }
        }
        tracing::trace!(
            target: "pagetree::btree",
            tree = %self.id,
            accepted,
            len = state.len,
            "inserted batch"
        );
        accepted
    }

    /// Removes the entry holding both `key` and `id`.
    pub fn remove(&self, key: &K, id: &V) -> bool
    where
        V: PartialEq,
    {
        self.state.lock().remove(key, id)
    }

    /// Id stored under the leftmost occurrence of `key`.
    pub fn search(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.stats.inc_searches();
        self.state.lock().search(key).map(|entry| entry.id().clone())
    }

    /// Like [`BTree::search`] but yields `V::default()` on a miss.
    pub fn search_or_default(&self, key: &K) -> V
    where
        V: Clone + Default,
    {
        self.search(key).unwrap_or_default()
    }

    /// Whether any entry carries `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.stats.inc_searches();
        self.state.lock().search(key).is_some()
    }
}

impl<K, V> Default for BTree<K, V> {
    fn default() -> Self {
        Self::from_parts(BTreeOptions::default(), PageBounds::default())
    }
}

impl<K: Ord, V> Extend<(K, V)> for BTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.insert_many(iter);
    }
}

impl<'a, K: Clone, V: Clone> IntoIterator for &'a BTree<K, V> {
    type Item = crate::storage::btree::page::Entry<K, V>;
    type IntoIter = SnapshotIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> fmt::Debug for BTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BTree")
            .field("id", &self.id)
            .field("order", &self.options.order)
            .field("unique_keys", &self.options.unique_keys)
            .field("len", &state.len)
            .field("height", &state.height)
            .finish()
    }
}
