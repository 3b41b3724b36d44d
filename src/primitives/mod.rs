//! Low-level helpers shared by the storage layer.

/// Tree identity and two-lock ordering.
pub mod concurrency;
