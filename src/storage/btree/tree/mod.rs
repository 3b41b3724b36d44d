//! The tree engine: the lock boundary, page maintenance and traversal.

mod api;
mod compare;
mod maintenance;
mod traversal;
mod types;

pub use traversal::TraversalOrder;
pub use types::BTree;
pub(crate) use types::TreeState;
