use std::sync::Arc;

use super::cursor::SnapshotIter;
use super::page::Entry;

/// Immutable, point-in-time ordered copy of every entry in a tree.
///
/// Cloning only bumps a reference count. A tree hands out the same snapshot
/// until its next successful insert or remove (or a caller traversal), after
/// which a fresh one is built on demand. Snapshots already handed out keep
/// the old contents.
pub struct Snapshot<K, V> {
    entries: Arc<Vec<Entry<K, V>>>,
}

impl<K, V> Clone for Snapshot<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> Snapshot<K, V> {
    pub(crate) fn new(entries: Vec<Entry<K, V>>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Number of entries captured.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `pos` in key order.
    pub fn get(&self, pos: usize) -> Option<&Entry<K, V>> {
        self.entries.get(pos)
    }

    /// All entries in key order.
    pub fn entries(&self) -> &[Entry<K, V>] {
        &self.entries
    }

    /// Owning double-ended iterator that clones entries out of the snapshot.
    pub fn iter(&self) -> SnapshotIter<K, V>
    where
        K: Clone,
        V: Clone,
    {
        SnapshotIter::new(self.clone())
    }

    /// Whether both handles share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl<K: Clone, V: Clone> IntoIterator for Snapshot<K, V> {
    type Item = Entry<K, V>;
    type IntoIter = SnapshotIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        SnapshotIter::new(self)
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for Snapshot<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}
