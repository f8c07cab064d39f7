//! Best-fit index over free blocks.
//!
//! Entries are ordered by `(size, address)`, so the first entry at or after
//! `(n, 0)` is the smallest block that can hold `n` bytes, and among blocks
//! of that size the lowest-addressed one.

use std::collections::BTreeSet;

use crate::block::BlockId;

/// A free block as seen by the index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct FreeEntry {
    pub(crate) size: usize,
    pub(crate) addr: usize,
    pub(crate) id: BlockId,
}

#[derive(Default)]
pub(crate) struct FreeIndex {
    entries: BTreeSet<FreeEntry>,
    bytes: usize,
}

impl FreeIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, entry: FreeEntry) {
        let inserted = self.entries.insert(entry);
        debug_assert!(inserted, "free block {} indexed twice", entry.id);
        if inserted {
            self.bytes += entry.size;
        }
    }

    /// Remove `entry`. Returns whether it was present.
    pub(crate) fn remove(&mut self, entry: &FreeEntry) -> bool {
        let removed = self.entries.remove(entry);
        if removed {
            self.bytes -= entry.size;
        }
        removed
    }

    /// Smallest entry with `size >= n`, lowest address on ties.
    pub(crate) fn best_fit(&self, n: usize) -> Option<FreeEntry> {
        let floor = FreeEntry {
            size: n,
            addr: 0,
            id: BlockId(0),
        };
        self.entries.range(floor..).next().copied()
    }

    pub(crate) fn contains(&self, entry: &FreeEntry) -> bool {
        self.entries.contains(entry)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Total bytes across all free blocks.
    pub(crate) fn bytes(&self) -> usize {
        self.bytes
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &FreeEntry> {
        self.entries.iter()
    }
}
