use std::cmp::Ordering;

use crate::primitives::concurrency::lock_pair;

use super::types::BTree;

impl<K, V> BTree<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    /// Lexicographic comparison of the two in-order `(key, id)` sequences.
    ///
    /// Both trees are locked, lower [`TreeId`](crate::TreeId) first, so two
    /// threads comparing the same pair in opposite directions cannot
    /// deadlock. Comparing a tree with itself takes no lock.
    pub fn compare(&self, other: &Self) -> Option<Ordering>
    where
        V: PartialOrd,
    {
        if std::ptr::eq(self, other) {
            return Some(Ordering::Equal);
        }
        let (mut left, mut right) = lock_pair((&self.state, self.id), (&other.state, other.id));
        let ours = left.snapshot();
        let theirs = right.snapshot();
        drop((left, right));
        ours.entries()
            .iter()
            .map(|e| (e.key(), e.id()))
            .partial_cmp(theirs.entries().iter().map(|e| (e.key(), e.id())))
    }
}

impl<K, V> PartialEq for BTree<K, V>
where
    K: Ord + Clone,
    V: PartialOrd + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl<K, V> Eq for BTree<K, V>
where
    K: Ord + Clone,
    V: Ord + Clone,
{
}

impl<K, V> PartialOrd for BTree<K, V>
where
    K: Ord + Clone,
    V: PartialOrd + Clone,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}
