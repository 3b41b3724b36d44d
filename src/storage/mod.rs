//! Tree storage and its configuration.

/// Page-based B-tree engine.
pub mod btree;

/// Construction options.
pub mod options;

pub use btree::BTree;
pub use options::BTreeOptions;
