//! Cross-thread usage statistics.
//!
//! Each arena's owner publishes its footprint into a [`FootprintBoard`]
//! after every operation. [`StatsAggregator`] reduces a board (or any
//! sequence of footprints) to whole-megabyte extrema and totals.
//!
//! Reads are relaxed and therefore eventually consistent: a value may be
//! stale by the one operation its owner is executing. That is fine for
//! diagnostics and profiling and must not be relied on for anything else.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Bytes per reported megabyte.
pub const BYTES_PER_MB: usize = 1024 * 1024;

/// Whole-megabyte usage summary across all arenas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Smallest single-arena footprint, truncated to MiB.
    pub min_mb: usize,
    /// Largest single-arena footprint, truncated to MiB.
    pub max_mb: usize,
    /// Sum of all footprints, truncated to MiB.
    pub total_mb: usize,
}

/// Reduces per-arena footprints to a [`PoolStats`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StatsAggregator;

impl StatsAggregator {
    /// Reduce footprints in bytes. Empty input yields all zeros.
    pub fn reduce<I>(footprints: I) -> PoolStats
    where
        I: IntoIterator<Item = usize>,
    {
        let mut min = usize::MAX;
        let mut max = 0usize;
        let mut total = 0usize;
        let mut any = false;
        for bytes in footprints {
            any = true;
            min = min.min(bytes);
            max = max.max(bytes);
            total = total.saturating_add(bytes);
        }
        if !any {
            return PoolStats::default();
        }
        PoolStats {
            min_mb: min / BYTES_PER_MB,
            max_mb: max / BYTES_PER_MB,
            total_mb: total / BYTES_PER_MB,
        }
    }
}

/// One counter per cache line pair so owners never false-share.
#[repr(align(128))]
#[derive(Default)]
struct PaddedCounter(AtomicUsize);

/// Published footprints, one slot per arena.
///
/// Written only by each arena's owning thread; read by anyone.
pub struct FootprintBoard {
    counters: Box<[PaddedCounter]>,
}

// Compile-time assertion: FootprintBoard must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<FootprintBoard>();
};

impl FootprintBoard {
    /// A board of `len` zeroed counters.
    pub fn new(len: usize) -> Self {
        Self {
            counters: (0..len).map(|_| PaddedCounter::default()).collect(),
        }
    }

    /// Number of counters.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether the board has no counters.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Publish the footprint of arena `ordinal`.
    pub fn publish(&self, ordinal: usize, bytes: usize) {
        self.counters[ordinal].0.store(bytes, Ordering::Relaxed);
    }

    /// Last published footprint of arena `ordinal`.
    pub fn get(&self, ordinal: usize) -> usize {
        self.counters[ordinal].0.load(Ordering::Relaxed)
    }

    /// Snapshot of every counter.
    pub fn snapshot(&self) -> Vec<usize> {
        self.counters
            .iter()
            .map(|c| c.0.load(Ordering::Relaxed))
            .collect()
    }

    /// Sum of every counter, in bytes.
    pub fn total(&self) -> usize {
        self.counters
            .iter()
            .map(|c| c.0.load(Ordering::Relaxed))
            .fold(0, usize::saturating_add)
    }

    /// Reset every counter to zero.
    pub fn clear(&self) {
        for c in self.counters.iter() {
            c.0.store(0, Ordering::Relaxed);
        }
    }

    /// Reduce the current counters.
    pub fn stats(&self) -> PoolStats {
        StatsAggregator::reduce(self.counters.iter().map(|c| c.0.load(Ordering::Relaxed)))
    }
}
