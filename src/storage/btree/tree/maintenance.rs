use std::mem;

use crate::storage::btree::page::{Entry, InsertOutcome, Page, RemoveOutcome};
use crate::storage::btree::snapshot::Snapshot;
use crate::types::PageId;

use super::types::TreeState;

impl<K: Ord, V> TreeState<K, V> {
    /// Inserts one entry, splitting the root if the overflow reaches it.
    pub(crate) fn insert(&mut self, key: K, id: V) -> bool {
        let root = self.root;
        match self.insert_into(root, Entry::new(key, id)) {
            InsertOutcome::Duplicate => {
                self.stats.inc_duplicate_rejections();
                return false;
            }
            InsertOutcome::Overflow => self.split_root(),
            InsertOutcome::Inserted => {}
        }
        self.len += 1;
        self.snapshot = None;
        self.stats.inc_inserts();
        true
    }

    fn insert_into(&mut self, page_id: PageId, entry: Entry<K, V>) -> InsertOutcome {
        let page = self.pages.get(page_id);
        let Some(slot) = page.insert_slot(entry.key(), self.unique) else {
            return InsertOutcome::Duplicate;
        };
        if page.is_leaf() {
            self.pages.get_mut(page_id).entries.insert(slot, entry);
        } else {
            let child = page.children[slot];
            match self.insert_into(child, entry) {
                InsertOutcome::Overflow => self.split_child(page_id, slot),
                outcome => return outcome,
            }
        }
        if self.pages.get(page_id).is_overflowing(&self.bounds) {
            InsertOutcome::Overflow
        } else {
            InsertOutcome::Inserted
        }
    }

    /// Splits `children[slot]` of `parent_id` and promotes its median.
    fn split_child(&mut self, parent_id: PageId, slot: usize) {
        let bounds = self.bounds;
        let child = self.pages.get(parent_id).children[slot];
        let (median, right) = self.pages.get_mut(child).split_off(&bounds);
        let right_id = self.pages.alloc(right);
        let parent = self.pages.get_mut(parent_id);
        parent.entries.insert(slot, median);
        parent.children.insert(slot + 1, right_id);
        self.stats.inc_page_splits();
        tracing::trace!(
            target: "pagetree::btree::split",
            tree = %self.tree,
            parent = parent_id.0,
            left = child.0,
            right = right_id.0,
            "split child page"
        );
    }

    fn split_root(&mut self) {
        let bounds = self.bounds;
        let old_root = self.root;
        let (median, right) = self.pages.get_mut(old_root).split_off(&bounds);
        let right_id = self.pages.alloc(right);
        self.root = self.pages.alloc(Page::internal(median, old_root, right_id));
        self.height += 1;
        self.stats.inc_root_splits();
        tracing::debug!(
            target: "pagetree::btree::split",
            tree = %self.tree,
            root = self.root.0,
            height = self.height,
            len = self.len + 1,
            "split root page"
        );
    }

    /// Removes the entry matching both `key` and `id`.
    pub(crate) fn remove(&mut self, key: &K, id: &V) -> bool
    where
        V: PartialEq,
    {
        if self.remove_from_root(key, id) == RemoveOutcome::NotFound {
            self.stats.inc_remove_misses();
            return false;
        }
        self.len -= 1;
        self.snapshot = None;
        self.stats.inc_removes();
        true
    }

    fn remove_from_root(&mut self, key: &K, id: &V) -> RemoveOutcome
    where
        V: PartialEq,
    {
        let root = self.root;
        if self.remove_from(root, key, id) == RemoveOutcome::NotFound {
            return RemoveOutcome::NotFound;
        }
        let page = self.pages.get(root);
        if page.len() > 0 || page.is_leaf() {
            // The root is exempt from the minimum fill.
            return RemoveOutcome::Removed;
        }
        let child = page.children[0];
        self.pages.release(root);
        self.root = child;
        self.height -= 1;
        self.stats.inc_root_collapses();
        tracing::debug!(
            target: "pagetree::btree::merge",
            tree = %self.tree,
            root = child.0,
            height = self.height,
            "collapsed root into its only child"
        );
        RemoveOutcome::RootCollapsed
    }

    fn remove_from(&mut self, page_id: PageId, key: &K, id: &V) -> RemoveOutcome
    where
        V: PartialEq,
    {
        let page = self.pages.get(page_id);
        let lo = page.lower_bound(key);
        let hi = if !self.unique {
            page.upper_bound(key)
        } else if lo < page.len() && page.entries[lo].key() == key {
            lo + 1
        } else {
            lo
        };
        let leaf = page.is_leaf();
        // Equal keys can sit in entries[lo..hi] and in children[lo..=hi].
        for slot in lo..=hi {
            if !leaf && (!self.unique || lo == hi) {
                let child = self.pages.get(page_id).children[slot];
                match self.remove_from(child, key, id) {
                    RemoveOutcome::NotFound => {}
                    RemoveOutcome::Underflow => {
                        self.repair_child(page_id, slot);
                        return self.status_of(page_id);
                    }
                    _ => return RemoveOutcome::Removed,
                }
            }
            if slot < hi && self.pages.get(page_id).entries[slot].id() == id {
                self.remove_entry_at(page_id, slot);
                return self.status_of(page_id);
            }
        }
        RemoveOutcome::NotFound
    }

    /// Deletes `entries[slot]`, pulling the in-order predecessor up when the
    /// page is internal.
    fn remove_entry_at(&mut self, page_id: PageId, slot: usize) {
        let page = self.pages.get_mut(page_id);
        if page.is_leaf() {
            page.entries.remove(slot);
            return;
        }
        let child = page.children[slot];
        let (predecessor, outcome) = self.pop_max(child);
        self.pages.get_mut(page_id).entries[slot] = predecessor;
        if outcome == RemoveOutcome::Underflow {
            self.repair_child(page_id, slot);
        }
    }

    /// Detaches the largest entry of the subtree rooted at `page_id`.
    fn pop_max(&mut self, page_id: PageId) -> (Entry<K, V>, RemoveOutcome) {
        let page = self.pages.get_mut(page_id);
        if page.is_leaf() {
            let entry = page
                .entries
                .pop()
                .unwrap_or_else(|| unreachable!("non-root page {page_id} is empty"));
            return (entry, self.status_of(page_id));
        }
        let last = page.children.len() - 1;
        let child = page.children[last];
        let (entry, outcome) = self.pop_max(child);
        if outcome == RemoveOutcome::Underflow {
            self.repair_child(page_id, last);
        }
        (entry, self.status_of(page_id))
    }

    fn status_of(&self, page_id: PageId) -> RemoveOutcome {
        if self.pages.get(page_id).is_underflowing(&self.bounds) {
            RemoveOutcome::Underflow
        } else {
            RemoveOutcome::Removed
        }
    }

    /// Restores the minimum fill of `children[slot]`: borrow left, borrow
    /// right, merge left, merge right.
    fn repair_child(&mut self, parent_id: PageId, slot: usize) {
        let bounds = self.bounds;
        let parent = self.pages.get(parent_id);
        let left = slot.checked_sub(1).map(|s| parent.children[s]);
        let right = parent.children.get(slot + 1).copied();
        if let Some(left) = left {
            if self.pages.get(left).can_lend(&bounds) {
                self.borrow_from_left(parent_id, slot);
                return;
            }
        }
        if let Some(right) = right {
            if self.pages.get(right).can_lend(&bounds) {
                self.borrow_from_right(parent_id, slot);
                return;
            }
        }
        if left.is_some() {
            self.merge_children(parent_id, slot - 1);
        } else if right.is_some() {
            self.merge_children(parent_id, slot);
        }
    }

    fn borrow_from_left(&mut self, parent_id: PageId, slot: usize) {
        let parent = self.pages.get(parent_id);
        let (left_id, child_id) = (parent.children[slot - 1], parent.children[slot]);
        let left = self.pages.get_mut(left_id);
        let Some(lent) = left.entries.pop() else {
            return;
        };
        let lent_child = left.children.pop();
        let separator = mem::replace(
            &mut self.pages.get_mut(parent_id).entries[slot - 1],
            lent,
        );
        let child = self.pages.get_mut(child_id);
        child.entries.insert(0, separator);
        if let Some(grandchild) = lent_child {
            child.children.insert(0, grandchild);
        }
        self.stats.inc_borrows();
        tracing::trace!(
            target: "pagetree::btree::merge",
            tree = %self.tree,
            from = left_id.0,
            to = child_id.0,
            direction = "left",
            "borrowed entry from sibling"
        );
    }

    fn borrow_from_right(&mut self, parent_id: PageId, slot: usize) {
        let parent = self.pages.get(parent_id);
        let (child_id, right_id) = (parent.children[slot], parent.children[slot + 1]);
        let right = self.pages.get_mut(right_id);
        if right.entries.is_empty() {
            return;
        }
        let lent = right.entries.remove(0);
        let lent_child = if right.is_leaf() {
            None
        } else {
            Some(right.children.remove(0))
        };
        let separator = mem::replace(&mut self.pages.get_mut(parent_id).entries[slot], lent);
        let child = self.pages.get_mut(child_id);
        child.entries.push(separator);
        child.children.extend(lent_child);
        self.stats.inc_borrows();
        tracing::trace!(
            target: "pagetree::btree::merge",
            tree = %self.tree,
            from = right_id.0,
            to = child_id.0,
            direction = "right",
            "borrowed entry from sibling"
        );
    }

    /// Folds `children[left_slot + 1]` and the separator between them into
    /// `children[left_slot]`.
    fn merge_children(&mut self, parent_id: PageId, left_slot: usize) {
        let parent = self.pages.get_mut(parent_id);
        let left_id = parent.children[left_slot];
        let right_id = parent.children.remove(left_slot + 1);
        let separator = parent.entries.remove(left_slot);
        let right = self.pages.release(right_id);
        self.pages.get_mut(left_id).absorb(separator, right);
        self.stats.inc_merges();
        tracing::trace!(
            target: "pagetree::btree::merge",
            tree = %self.tree,
            survivor = left_id.0,
            removed = right_id.0,
            "merged sibling pages"
        );
    }

    /// Leftmost entry carrying `key`.
    pub(crate) fn search(&self, key: &K) -> Option<&Entry<K, V>> {
        let mut page_id = self.root;
        let mut found = None;
        loop {
            let page = self.pages.get(page_id);
            let slot = page.lower_bound(key);
            if slot < page.len() && page.entries[slot].key() == key {
                found = Some(&page.entries[slot]);
                if self.unique {
                    return found;
                }
            }
            if page.is_leaf() {
                return found;
            }
            page_id = page.children[slot];
        }
    }
}

impl<K: Clone, V: Clone> TreeState<K, V> {
    /// Returns the cached snapshot, building it first if a mutation dropped it.
    pub(crate) fn snapshot(&mut self) -> Snapshot<K, V> {
        if let Some(snapshot) = &self.snapshot {
            self.stats.inc_snapshot_reuses();
            return snapshot.clone();
        }
        let mut entries = Vec::with_capacity(self.len);
        self.collect_in_order(self.root, &mut entries);
        let snapshot = Snapshot::new(entries);
        self.stats.inc_snapshot_builds();
        tracing::trace!(
            target: "pagetree::btree::snapshot",
            tree = %self.tree,
            len = self.len,
            "rebuilt iteration snapshot"
        );
        self.snapshot = Some(snapshot.clone());
        snapshot
    }

    fn collect_in_order(&self, page_id: PageId, out: &mut Vec<Entry<K, V>>) {
        let page = self.pages.get(page_id);
        for (slot, entry) in page.entries.iter().enumerate() {
            if let Some(&child) = page.children.get(slot) {
                self.collect_in_order(child, out);
            }
            out.push(entry.clone());
        }
        if let Some(&last) = page.children.last() {
            self.collect_in_order(last, out);
        }
    }
}
