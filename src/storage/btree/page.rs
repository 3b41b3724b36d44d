//! Page layout and the operations local to a single page.

use std::cmp::Ordering;

use crate::storage::options::{DEFAULT_ORDER, MIN_ORDER};
use crate::types::{PageId, PageTreeError, Result};

/// A stored `(key, id)` pair plus its visit counter.
#[derive(Clone, Debug)]
pub struct Entry<K, V> {
    key: K,
    id: V,
    use_counter: u64,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, id: V) -> Self {
        Self {
            key,
            id,
            use_counter: 0,
        }
    }

    /// The ordering key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The object identifier stored with the key.
    pub fn id(&self) -> &V {
        &self.id
    }

    /// Mutable access to the identifier. The key stays read-only so that a
    /// visitor can never break page ordering.
    pub fn id_mut(&mut self) -> &mut V {
        &mut self.id
    }

    /// Number of times a caller-visible traversal has visited this entry.
    pub fn use_counter(&self) -> u64 {
        self.use_counter
    }

    /// Consumes the entry, returning the key and id.
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.id)
    }

    pub(crate) fn touch(&mut self) {
        self.use_counter = self.use_counter.saturating_add(1);
    }
}

/// Occupancy limits shared by every page of a tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageBounds {
    order: usize,
    min_entries: usize,
    max_entries: usize,
}

impl PageBounds {
    /// Derives the bounds for a tree of the given order.
    pub fn for_order(order: usize) -> Result<Self> {
        if order < MIN_ORDER {
            return Err(PageTreeError::InvalidOrder { order });
        }
        let max_entries = order
            .checked_mul(2)
            .map(|doubled| doubled - 1)
            .ok_or(PageTreeError::InvalidOrder { order })?;
        Ok(Self {
            order,
            min_entries: order - 1,
            max_entries,
        })
    }

    /// The tree order these bounds were derived from.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Fewest entries a non-root page may hold.
    pub fn min_entries(&self) -> usize {
        self.min_entries
    }

    /// Most entries any page may hold once a mutation has completed.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

impl Default for PageBounds {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            min_entries: DEFAULT_ORDER - 1,
            max_entries: 2 * DEFAULT_ORDER - 1,
        }
    }
}

/// Signal returned by a page after an insert below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InsertOutcome {
    Inserted,
    Duplicate,
    /// The page now holds one entry more than allowed and must be split by
    /// its parent (or by the tree, for the root).
    Overflow,
}

/// Signal returned by a page after a removal below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RemoveOutcome {
    Removed,
    NotFound,
    /// The page fell below the minimum and must be repaired by its parent.
    Underflow,
    /// The root lost its last entry and was replaced by its only child.
    RootCollapsed,
}

/// One node of the tree.
///
/// `children` is empty for a leaf and has `entries.len() + 1` elements for
/// an internal page. Child pages are owned through the arena; no page is
/// referenced by more than one parent.
#[derive(Clone, Debug)]
pub(crate) struct Page<K, V> {
    pub(crate) entries: Vec<Entry<K, V>>,
    pub(crate) children: Vec<PageId>,
}

impl<K, V> Page<K, V> {
    /// An empty leaf. Storage grows with use, so huge orders cost nothing
    /// up front.
    pub(crate) fn leaf() -> Self {
        Self {
            entries: Vec::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn internal(entry: Entry<K, V>, left: PageId, right: PageId) -> Self {
        Self {
            entries: vec![entry],
            children: vec![left, right],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn is_overflowing(&self, bounds: &PageBounds) -> bool {
        self.entries.len() > bounds.max_entries()
    }

    pub(crate) fn is_underflowing(&self, bounds: &PageBounds) -> bool {
        self.entries.len() < bounds.min_entries()
    }

    /// Whether a sibling can give one entry away and stay within bounds.
    pub(crate) fn can_lend(&self, bounds: &PageBounds) -> bool {
        self.entries.len() > bounds.min_entries()
    }

    /// Splits an overflowing page. The first `order` entries stay, the next
    /// one is returned for promotion and the rest move to the new right page.
    pub(crate) fn split_off(&mut self, bounds: &PageBounds) -> (Entry<K, V>, Page<K, V>) {
        debug_assert!(self.is_overflowing(bounds));
        let mid = bounds.order();
        let right_entries = self.entries.split_off(mid + 1);
        let right_children = if self.is_leaf() {
            Vec::new()
        } else {
            self.children.split_off(mid + 1)
        };
        let median = self
            .entries
            .pop()
            .unwrap_or_else(|| unreachable!("split of a page below capacity"));
        let right = Page {
            entries: right_entries,
            children: right_children,
        };
        (median, right)
    }

    /// Appends `separator` and then everything from `right`.
    pub(crate) fn absorb(&mut self, separator: Entry<K, V>, right: Page<K, V>) {
        self.entries.push(separator);
        self.entries.extend(right.entries);
        self.children.extend(right.children);
    }
}

impl<K: Ord, V> Page<K, V> {
    /// Index of the first entry whose key is not less than `key`.
    pub(crate) fn lower_bound(&self, key: &K) -> usize {
        self.entries.partition_point(|e| e.key < *key)
    }

    /// Index of the first entry whose key is greater than `key`.
    pub(crate) fn upper_bound(&self, key: &K) -> usize {
        self.entries.partition_point(|e| e.key <= *key)
    }

    /// Position at which `key` would be inserted.
    ///
    /// With unique keys an existing key yields `None`; otherwise equal keys
    /// are passed over so the newest duplicate lands last.
    pub(crate) fn insert_slot(&self, key: &K, unique: bool) -> Option<usize> {
        if unique {
            match self.entries.binary_search_by(|e| e.key.cmp(key)) {
                Ok(_) => None,
                Err(slot) => Some(slot),
            }
        } else {
            Some(self.upper_bound(key))
        }
    }

    /// Checks that keys are ordered within the page.
    pub(crate) fn is_sorted(&self, unique: bool) -> bool {
        self.entries.windows(2).all(|pair| {
            match pair[0].key.cmp(&pair[1].key) {
                Ordering::Less => true,
                Ordering::Equal => !unique,
                Ordering::Greater => false,
            }
        })
    }
}
