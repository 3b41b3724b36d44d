//! Shared identifiers and the crate-wide error type.

use std::fmt;

/// Stable handle of a page inside a tree's page arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct PageId(pub u64);

impl PageId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors surfaced by the tree engine.
///
/// Duplicate inserts and removals of missing entries are not errors; they
/// are reported as `false` by the corresponding operations.
#[derive(thiserror::Error, Debug)]
pub enum PageTreeError {
    /// Writing a diagnostic dump failed.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// A structural invariant does not hold.
    #[error("corruption: {0}")]
    Corruption(&'static str),
    /// The tree order is below the supported minimum.
    #[error("invalid argument: btree order must be >= {min}, got {order}", min = crate::storage::options::MIN_ORDER)]
    InvalidOrder {
        /// The rejected order.
        order: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PageTreeError>;
