use serde::{Deserialize, Serialize};

use crate::types::{PageTreeError, Result};

/// Smallest order a tree accepts.
pub const MIN_ORDER: usize = 3;

/// Order used when none is configured.
pub const DEFAULT_ORDER: usize = 3;

/// Configuration options supplied when constructing a [`crate::BTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BTreeOptions {
    /// Minimum degree of every page. A page holds at most `2 * order - 1`
    /// entries and, unless it is the root, at least `order - 1`.
    pub order: usize,
    /// Whether inserting an already present key is rejected.
    pub unique_keys: bool,
}

impl Default for BTreeOptions {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            unique_keys: true,
        }
    }
}

impl BTreeOptions {
    /// Creates options with the given order and unique keys.
    pub fn new(order: usize) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    /// Sets the tree order.
    pub fn order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Sets whether duplicate keys are rejected.
    pub fn unique_keys(mut self, unique: bool) -> Self {
        self.unique_keys = unique;
        self
    }

    /// Checks that the options describe a constructible tree.
    pub fn validate(&self) -> Result<()> {
        if self.order < MIN_ORDER {
            return Err(PageTreeError::InvalidOrder { order: self.order });
        }
        Ok(())
    }
}
