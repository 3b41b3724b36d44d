use std::iter::FusedIterator;

use super::page::Entry;
use super::snapshot::Snapshot;

/// A bidirectional position in a tree snapshot.
///
/// A cursor keeps its snapshot alive, so it stays valid (and keeps showing
/// the same entries) after the tree it came from is modified.
pub struct Cursor<K, V> {
    snapshot: Snapshot<K, V>,
    pos: usize,
}

impl<K, V> Clone for Cursor<K, V> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            pos: self.pos,
        }
    }
}

impl<K, V> Cursor<K, V> {
    pub(crate) fn new(snapshot: Snapshot<K, V>, pos: usize) -> Self {
        debug_assert!(pos <= snapshot.len());
        Self { snapshot, pos }
    }

    /// Offset from the first entry; equals the snapshot length at the end.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The entry under the cursor, or `None` at the end position.
    pub fn get(&self) -> Option<&Entry<K, V>> {
        self.snapshot.get(self.pos)
    }

    /// Whether the cursor is one past the last entry.
    pub fn is_end(&self) -> bool {
        self.pos >= self.snapshot.len()
    }

    /// Steps forward; stays put at the end position.
    pub fn move_next(&mut self) -> &mut Self {
        if self.pos < self.snapshot.len() {
            self.pos += 1;
        }
        self
    }

    /// Steps backward; stays put at the first entry.
    pub fn move_prev(&mut self) -> &mut Self {
        self.pos = self.pos.saturating_sub(1);
        self
    }

    /// The snapshot this cursor walks.
    pub fn snapshot(&self) -> &Snapshot<K, V> {
        &self.snapshot
    }
}

impl<K, V> PartialEq for Cursor<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot.ptr_eq(&other.snapshot) && self.pos == other.pos
    }
}

impl<K, V> Eq for Cursor<K, V> {}

impl<K, V> std::fmt::Debug for Cursor<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("pos", &self.pos)
            .field("len", &self.snapshot.len())
            .finish()
    }
}

/// A cursor walking a snapshot from the last entry to the first.
///
/// Like a reverse iterator adaptor it wraps a forward cursor and refers to
/// the entry just before it, so `rbegin` wraps `end` and `rend` wraps
/// `begin`.
pub struct RevCursor<K, V> {
    base: Cursor<K, V>,
}

impl<K, V> Clone for RevCursor<K, V> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
        }
    }
}

impl<K, V> RevCursor<K, V> {
    pub(crate) fn new(base: Cursor<K, V>) -> Self {
        Self { base }
    }

    /// The entry under the cursor, or `None` once past the first entry.
    pub fn get(&self) -> Option<&Entry<K, V>> {
        self.base
            .pos
            .checked_sub(1)
            .and_then(|pos| self.base.snapshot.get(pos))
    }

    /// Whether the cursor has moved past the first entry.
    pub fn is_end(&self) -> bool {
        self.base.pos == 0
    }

    /// Steps toward the first entry.
    pub fn move_next(&mut self) -> &mut Self {
        self.base.move_prev();
        self
    }

    /// Steps toward the last entry.
    pub fn move_prev(&mut self) -> &mut Self {
        self.base.move_next();
        self
    }

    /// The underlying forward cursor.
    pub fn base(&self) -> &Cursor<K, V> {
        &self.base
    }
}

impl<K, V> PartialEq for RevCursor<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
    }
}

impl<K, V> Eq for RevCursor<K, V> {}

/// Owning iterator over a snapshot, yielding entries in key order from the
/// front and in reverse from the back.
pub struct SnapshotIter<K, V> {
    snapshot: Snapshot<K, V>,
    front: usize,
    back: usize,
}

impl<K, V> Clone for SnapshotIter<K, V> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            front: self.front,
            back: self.back,
        }
    }
}

impl<K, V> SnapshotIter<K, V> {
    pub(crate) fn new(snapshot: Snapshot<K, V>) -> Self {
        let back = snapshot.len();
        Self {
            snapshot,
            front: 0,
            back,
        }
    }
}

impl<K: Clone, V: Clone> Iterator for SnapshotIter<K, V> {
    type Item = Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let entry = self.snapshot.get(self.front).cloned();
        self.front += 1;
        entry
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<K: Clone, V: Clone> DoubleEndedIterator for SnapshotIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.snapshot.get(self.back).cloned()
    }
}

impl<K: Clone, V: Clone> ExactSizeIterator for SnapshotIter<K, V> {}

impl<K: Clone, V: Clone> FusedIterator for SnapshotIter<K, V> {}
