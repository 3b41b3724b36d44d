use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use serde::Serialize;

/// Snapshot of B-tree statistics at a point in time.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BTreeStatsSnapshot {
    /// Number of key lookups performed
    pub searches: u64,
    /// Number of entries accepted by insert
    pub inserts: u64,
    /// Number of inserts rejected because the key already existed
    pub duplicate_rejections: u64,
    /// Number of entries removed
    pub removes: u64,
    /// Number of removals that found no matching entry
    pub remove_misses: u64,
    /// Number of non-root page splits
    pub page_splits: u64,
    /// Number of root splits (each one adds a level)
    pub root_splits: u64,
    /// Number of sibling merges
    pub merges: u64,
    /// Number of entries borrowed from a sibling to repair an underflow
    pub borrows: u64,
    /// Number of times the root was replaced by its only child
    pub root_collapses: u64,
    /// Number of iteration snapshots materialized
    pub snapshot_builds: u64,
    /// Number of snapshot requests served from the cached snapshot
    pub snapshot_reuses: u64,
}

/// Thread-safe statistics tracking for B-tree operations.
#[derive(Default)]
pub struct BTreeStats {
    searches: AtomicU64,
    inserts: AtomicU64,
    duplicate_rejections: AtomicU64,
    removes: AtomicU64,
    remove_misses: AtomicU64,
    page_splits: AtomicU64,
    root_splits: AtomicU64,
    merges: AtomicU64,
    borrows: AtomicU64,
    root_collapses: AtomicU64,
    snapshot_builds: AtomicU64,
    snapshot_reuses: AtomicU64,
}

impl BTreeStats {
    /// Returns the current count of key lookups.
    pub fn searches(&self) -> u64 {
        self.searches.load(AtomicOrdering::Relaxed)
    }

    /// Returns the current count of accepted inserts.
    pub fn inserts(&self) -> u64 {
        self.inserts.load(AtomicOrdering::Relaxed)
    }

    /// Returns the current count of rejected duplicate inserts.
    pub fn duplicate_rejections(&self) -> u64 {
        self.duplicate_rejections.load(AtomicOrdering::Relaxed)
    }

    /// Returns the current count of removed entries.
    pub fn removes(&self) -> u64 {
        self.removes.load(AtomicOrdering::Relaxed)
    }

    /// Returns the current count of removals that missed.
    pub fn remove_misses(&self) -> u64 {
        self.remove_misses.load(AtomicOrdering::Relaxed)
    }

    /// Returns the current count of non-root page splits.
    pub fn page_splits(&self) -> u64 {
        self.page_splits.load(AtomicOrdering::Relaxed)
    }

    /// Returns the current count of root splits.
    pub fn root_splits(&self) -> u64 {
        self.root_splits.load(AtomicOrdering::Relaxed)
    }

    /// Returns the current count of sibling merges.
    pub fn merges(&self) -> u64 {
        self.merges.load(AtomicOrdering::Relaxed)
    }

    /// Returns the current count of sibling borrows.
    pub fn borrows(&self) -> u64 {
        self.borrows.load(AtomicOrdering::Relaxed)
    }

    /// Returns the current count of root collapses.
    pub fn root_collapses(&self) -> u64 {
        self.root_collapses.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of snapshots built.
    pub fn snapshot_builds(&self) -> u64 {
        self.snapshot_builds.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of snapshot requests served from cache.
    pub fn snapshot_reuses(&self) -> u64 {
        self.snapshot_reuses.load(AtomicOrdering::Relaxed)
    }

    pub(crate) fn inc_searches(&self) {
        self.searches.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_inserts(&self) {
        self.inserts.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_duplicate_rejections(&self) {
        self.duplicate_rejections
            .fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_removes(&self) {
        self.removes.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_remove_misses(&self) {
        self.remove_misses.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_page_splits(&self) {
        self.page_splits.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_root_splits(&self) {
        self.root_splits.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_merges(&self) {
        self.merges.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_borrows(&self) {
        self.borrows.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_root_collapses(&self) {
        self.root_collapses.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_snapshot_builds(&self) {
        self.snapshot_builds.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_snapshot_reuses(&self) {
        self.snapshot_reuses.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Creates a snapshot of all current statistics.
    pub fn snapshot(&self) -> BTreeStatsSnapshot {
        BTreeStatsSnapshot {
            searches: self.searches(),
            inserts: self.inserts(),
            duplicate_rejections: self.duplicate_rejections(),
            removes: self.removes(),
            remove_misses: self.remove_misses(),
            page_splits: self.page_splits(),
            root_splits: self.root_splits(),
            merges: self.merges(),
            borrows: self.borrows(),
            root_collapses: self.root_collapses(),
            snapshot_builds: self.snapshot_builds(),
            snapshot_reuses: self.snapshot_reuses(),
        }
    }

    /// Emits current statistics to the tracing infrastructure.
    pub fn emit_tracing(&self) {
        let snapshot = self.snapshot();
        tracing::info!(
            target: "pagetree::btree::stats",
            searches = snapshot.searches,
            inserts = snapshot.inserts,
            duplicate_rejections = snapshot.duplicate_rejections,
            removes = snapshot.removes,
            remove_misses = snapshot.remove_misses,
            page_splits = snapshot.page_splits,
            root_splits = snapshot.root_splits,
            merges = snapshot.merges,
            borrows = snapshot.borrows,
            root_collapses = snapshot.root_collapses,
            snapshot_builds = snapshot.snapshot_builds,
            snapshot_reuses = snapshot.snapshot_reuses,
            "btree stats snapshot"
        );
    }
}
