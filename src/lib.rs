//! Thread-safe, order-parameterized B-tree with snapshot iteration and
//! closure-based traversal.
//!
//! ```
//! use pagetree::{BTree, BTreeOptions};
//!
//! # fn main() -> pagetree::Result<()> {
//! let tree = BTree::with_options(BTreeOptions::new(3))?;
//! assert!(tree.insert('b', 2));
//! assert!(tree.insert('a', 1));
//! assert!(!tree.insert('a', 7));
//! assert_eq!(tree.search(&'a'), Some(1));
//! let keys: Vec<char> = tree.iter().map(|e| *e.key()).collect();
//! assert_eq!(keys, vec!['a', 'b']);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod primitives;
pub mod storage;
pub mod types;

pub use primitives::concurrency::TreeId;
pub use storage::btree::{
    BTree, BTreeStats, BTreeStatsSnapshot, Cursor, Entry, PageBounds, RevCursor, Snapshot,
    SnapshotIter, TraversalOrder, TreeShape,
};
pub use storage::options::BTreeOptions;
pub use types::{PageTreeError, Result};
