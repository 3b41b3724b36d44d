use crate::types::PageId;

use super::page::Page;

/// Owns every page of a tree, addressed by [`PageId`] handles.
///
/// Freed slots are recycled so that split/merge churn does not grow the
/// backing vector without bound.
#[derive(Debug)]
pub(crate) struct PageArena<K, V> {
    slots: Vec<Option<Page<K, V>>>,
    free: Vec<PageId>,
}

impl<K, V> Default for PageArena<K, V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<K, V> PageArena<K, V> {
    pub(crate) fn alloc(&mut self, page: Page<K, V>) -> PageId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(page);
                id
            }
            None => {
                self.slots.push(Some(page));
                PageId((self.slots.len() - 1) as u64)
            }
        }
    }

    /// Removes a page from the arena and hands ownership to the caller.
    pub(crate) fn release(&mut self, id: PageId) -> Page<K, V> {
        let page = self
            .slots
            .get_mut(id.index())
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("release of dangling page {id}"));
        self.free.push(id);
        page
    }

    pub(crate) fn get(&self, id: PageId) -> &Page<K, V> {
        self.try_get(id).unwrap_or_else(|| panic!("dangling page {id}"))
    }

    /// Like [`PageArena::get`] but reports a released or unknown handle as
    /// `None`.
    pub(crate) fn try_get(&self, id: PageId) -> Option<&Page<K, V>> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: PageId) -> &mut Page<K, V> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("dangling page {id}"))
    }

    /// Number of pages currently allocated.
    pub(crate) fn live_pages(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
