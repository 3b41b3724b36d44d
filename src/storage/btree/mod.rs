#![forbid(unsafe_code)]

//! In-memory B-tree built from an arena of fixed-capacity pages.
//!
//! Pages are addressed by [`PageId`](crate::types::PageId) handles instead of
//! pointers; a parent owns its children through the arena and no page keeps a
//! back-reference. Structural changes travel upward as outcome codes which
//! the parent resolves by splitting, borrowing or merging.

mod arena;
mod cursor;
mod dump;
mod page;
mod snapshot;
mod stats;
mod tree;
mod verify;

pub use cursor::{Cursor, RevCursor, SnapshotIter};
pub use page::{Entry, PageBounds};
pub use snapshot::Snapshot;
pub use stats::{BTreeStats, BTreeStatsSnapshot};
pub use tree::{BTree, TraversalOrder};
pub use verify::TreeShape;

#[cfg(test)]
mod tests;
