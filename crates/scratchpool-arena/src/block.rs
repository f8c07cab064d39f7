//! Block records and the index-addressed table that stores them.
//!
//! Blocks refer to their address-order neighbours by [`BlockId`] rather
//! than by pointer, so split and merge are plain index rewiring. Vacated
//! records are recycled through a free list, so a long-lived arena does not
//! grow its table under alloc/free churn.

use std::fmt;

/// Index of a [`Block`] record in its arena's block table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) u32);

impl BlockId {
    /// The raw table index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A contiguous byte range inside one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    /// Index of the owning chunk.
    pub chunk: u32,
    /// Byte offset from the start of the chunk.
    pub offset: usize,
    /// Length in bytes. Always a multiple of the arena alignment.
    pub size: usize,
    /// Whether the range is available for allocation.
    pub free: bool,
    /// Block immediately before this one in the same chunk.
    pub prev: Option<BlockId>,
    /// Block immediately after this one in the same chunk.
    pub next: Option<BlockId>,
}

impl Block {
    /// One past the last byte, as an offset into the chunk.
    pub fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Slab of [`Block`] records with recycled slots.
#[derive(Default)]
pub(crate) struct BlockTable {
    slots: Vec<Option<Block>>,
    vacant: Vec<BlockId>,
}

impl BlockTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store `block`, reusing a vacant slot if one exists.
    pub(crate) fn insert(&mut self, block: Block) -> BlockId {
        if let Some(id) = self.vacant.pop() {
            self.slots[id.index()] = Some(block);
            id
        } else {
            let id = BlockId(
                u32::try_from(self.slots.len()).expect("block table exceeds u32::MAX records"),
            );
            self.slots.push(Some(block));
            id
        }
    }

    /// Remove and return the record at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is vacant.
    pub(crate) fn remove(&mut self, id: BlockId) -> Block {
        let block = self.slots[id.index()]
            .take()
            .unwrap_or_else(|| panic!("block {id} already removed"));
        self.vacant.push(id);
        block
    }

    /// # Panics
    ///
    /// Panics if `id` is vacant.
    pub(crate) fn get(&self, id: BlockId) -> &Block {
        self.slots[id.index()]
            .as_ref()
            .unwrap_or_else(|| panic!("block {id} is vacant"))
    }

    /// # Panics
    ///
    /// Panics if `id` is vacant.
    pub(crate) fn get_mut(&mut self, id: BlockId) -> &mut Block {
        self.slots[id.index()]
            .as_mut()
            .unwrap_or_else(|| panic!("block {id} is vacant"))
    }

    /// Non-panicking lookup, used by invariant checks.
    pub(crate) fn try_get(&self, id: BlockId) -> Option<&Block> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Number of occupied records.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    /// Iterate over occupied records.
    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|b| (BlockId(i as u32), b)))
    }
}
