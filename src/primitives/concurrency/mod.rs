use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, MutexGuard};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a tree.
///
/// Addresses change when a tree is moved, so lock ordering between two trees
/// is decided by this id instead.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct TreeId(u64);

impl TreeId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        Self(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Locks two distinct mutexes, always acquiring the one with the lower id
/// first. Guards are returned in argument order.
///
/// Both ids must differ; locking the same mutex twice would deadlock.
pub fn lock_pair<'a, A, B>(
    first: (&'a Mutex<A>, TreeId),
    second: (&'a Mutex<B>, TreeId),
) -> (MutexGuard<'a, A>, MutexGuard<'a, B>) {
    debug_assert_ne!(first.1, second.1, "lock_pair on a single tree");
    if first.1 < second.1 {
        let a = first.0.lock();
        let b = second.0.lock();
        (a, b)
    } else {
        let b = second.0.lock();
        let a = first.0.lock();
        (a, b)
    }
}
