//! Collaborator doubles.
//!
//! - [`RecordingDispatch`]: a [`ParallelFor`] that counts calls and indices
//!   and claims whichever capability the test wants.
//! - [`PinnedIndex`]: a [`ThreadIndex`] whose ordinal the test sets.

use std::sync::atomic::{AtomicUsize, Ordering};

use scratchpool_core::{LaneDispatcher, ParallelFor, ThreadIndex};

/// Counts `parallel_for` calls and the indices they covered.
///
/// Work runs on a [`LaneDispatcher`] with the configured lane count.
pub struct RecordingDispatch {
    accelerator: bool,
    inner: LaneDispatcher,
    calls: AtomicUsize,
    indices: AtomicUsize,
}

impl RecordingDispatch {
    /// A dispatcher reporting accelerator capability.
    pub fn accelerator(lanes: usize) -> Self {
        Self::with_capability(true, lanes)
    }

    /// A dispatcher reporting host-only capability.
    pub fn host() -> Self {
        Self::with_capability(false, 1)
    }

    pub fn with_capability(accelerator: bool, lanes: usize) -> Self {
        Self {
            accelerator,
            inner: LaneDispatcher::new(lanes),
            calls: AtomicUsize::new(0),
            indices: AtomicUsize::new(0),
        }
    }

    /// Number of `parallel_for` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of per-index operations executed so far.
    pub fn indices(&self) -> usize {
        self.indices.load(Ordering::SeqCst)
    }
}

impl ParallelFor for RecordingDispatch {
    fn is_accelerator(&self) -> bool {
        self.accelerator
    }

    fn lanes(&self) -> usize {
        self.inner.lanes()
    }

    fn parallel_for(&self, n: usize, body: &(dyn Fn(usize) + Sync)) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.parallel_for(n, &|i| {
            self.indices.fetch_add(1, Ordering::SeqCst);
            body(i);
        });
    }
}

/// A thread index every thread shares, pinned to a settable ordinal.
pub struct PinnedIndex {
    ordinal: AtomicUsize,
    max_workers: usize,
}

impl PinnedIndex {
    pub fn new(ordinal: usize, max_workers: usize) -> Self {
        Self {
            ordinal: AtomicUsize::new(ordinal),
            max_workers,
        }
    }

    /// Move every caller to `ordinal`.
    pub fn set(&self, ordinal: usize) {
        self.ordinal.store(ordinal, Ordering::SeqCst);
    }
}

impl ThreadIndex for PinnedIndex {
    fn current(&self) -> usize {
        self.ordinal.load(Ordering::SeqCst)
    }

    fn max_workers(&self) -> usize {
        self.max_workers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_dispatch_counts() {
        let d = RecordingDispatch::accelerator(3);
        let hits = AtomicUsize::new(0);
        d.parallel_for(10, &|_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(d.calls(), 1);
        assert_eq!(d.indices(), 10);
        assert_eq!(hits.into_inner(), 10);
        assert!(d.is_accelerator());
        assert!(!RecordingDispatch::host().is_accelerator());
    }

    #[test]
    fn pinned_index_moves() {
        let idx = PinnedIndex::new(1, 4);
        assert_eq!(idx.current(), 1);
        idx.set(3);
        assert_eq!(idx.current(), 3);
        assert_eq!(idx.max_workers(), 4);
    }
}
