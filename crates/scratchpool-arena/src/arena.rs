//! The per-thread best-fit arena.
//!
//! [`Arena`] serves `alloc`/`free` from chunks it acquires from the system
//! allocator. A request is rounded up to the configured alignment and
//! served from the smallest free block that fits; if none does, a new
//! chunk at least as large as everything the arena already holds is
//! appended, so the footprint grows geometrically. Freed blocks are merged
//! with free neighbours immediately.
//!
//! Chunks are only returned to the system by [`Arena::release`] or drop.

use std::ptr;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::block::{Block, BlockId, BlockTable};
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::free_index::{FreeEntry, FreeIndex};
use crate::raw::{self, RawChunk};

/// A backing chunk plus the id of the block at its offset 0.
///
/// Splits keep the lower half's id and merges keep the lower block's id,
/// so the head id never changes while the chunk is alive.
struct Chunk {
    raw: RawChunk,
    head: BlockId,
}

/// Point-in-time usage counters for one arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaUsage {
    /// Total backing storage held, allocated plus free.
    pub footprint: usize,
    /// Bytes in live blocks (after alignment rounding).
    pub in_use: usize,
    /// Bytes in free blocks.
    pub free_bytes: usize,
    /// Number of outstanding allocations.
    pub live_blocks: usize,
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Number of chunks acquired from the system allocator.
    pub chunks: usize,
}

/// A single-owner sub-allocator with a coalescing best-fit free list.
///
/// `Arena` is `Send` but deliberately not `Sync`: the owning thread is the
/// only one allowed to mutate it.
pub struct Arena {
    config: ArenaConfig,
    chunks: SmallVec<[Chunk; 4]>,
    blocks: BlockTable,
    free: FreeIndex,
    /// Address of each live block's first byte → its record.
    live: IndexMap<usize, BlockId>,
    footprint: usize,
    in_use: usize,
}

impl Arena {
    /// Create an empty arena. No memory is acquired until the first `alloc`.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            config,
            chunks: SmallVec::new(),
            blocks: BlockTable::new(),
            free: FreeIndex::new(),
            live: IndexMap::new(),
            footprint: 0,
            in_use: 0,
        })
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Allocate at least `n` bytes aligned to `config().alignment`.
    ///
    /// Returns null for `n == 0`; that null is accepted by [`free`](Self::free).
    /// Never returns null otherwise: exhaustion of the system allocator
    /// terminates the process, and so does a request too large for any
    /// allocator to satisfy.
    ///
    /// The returned memory is uninitialised.
    pub fn alloc(&mut self, n: usize) -> *mut u8 {
        if n == 0 {
            return ptr::null_mut();
        }
        let Some(size) = self.config.round_up(n) else {
            raw::unsatisfiable(n, self.config.alignment)
        };

        let id = match self.free.best_fit(size) {
            Some(entry) => {
                self.free.remove(&entry);
                entry.id
            }
            None => self.grow(size),
        };
        self.split(id, size);

        let block = self.blocks.get_mut(id);
        block.free = false;
        let block = *block;
        self.in_use += block.size;

        let ptr = self.chunks[block.chunk as usize].raw.ptr_at(block.offset);
        self.live.insert(ptr.addr(), id);
        ptr
    }

    /// Return `ptr` to the arena, merging it with free neighbours.
    ///
    /// Null is a no-op. A pointer this arena did not hand out (or already
    /// took back) is a contract violation: it trips a debug assertion, and
    /// in release builds it is logged and ignored.
    pub fn free(&mut self, ptr: *mut u8) {
        if let Err(err) = self.try_free(ptr) {
            debug_assert!(false, "{err}");
            tracing::error!(%err, "ignoring free of foreign pointer");
        }
    }

    /// Like [`free`](Self::free), but reports a foreign pointer as an error.
    pub fn try_free(&mut self, ptr: *mut u8) -> Result<(), ArenaError> {
        if ptr.is_null() {
            return Ok(());
        }
        let addr = ptr.addr();
        let Some(id) = self.live.swap_remove(&addr) else {
            return Err(ArenaError::ForeignPointer { addr });
        };

        let block = self.blocks.get_mut(id);
        block.free = true;
        let (size, prev, next) = (block.size, block.prev, block.next);
        self.in_use -= size;

        let mut id = id;
        if let Some(next_id) = next {
            if self.blocks.get(next_id).free {
                self.unindex(next_id);
                self.absorb_next(id);
            }
        }
        if let Some(prev_id) = prev {
            if self.blocks.get(prev_id).free {
                self.unindex(prev_id);
                self.absorb_next(prev_id);
                id = prev_id;
            }
        }
        self.index(id);
        Ok(())
    }

    /// Total backing storage held (allocated plus free), in bytes.
    ///
    /// Non-decreasing until [`release`](Self::release).
    pub fn footprint(&self) -> usize {
        self.footprint
    }

    /// Bytes currently handed out, after alignment rounding.
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Bytes available in free blocks.
    pub fn free_bytes(&self) -> usize {
        self.free.bytes()
    }

    /// Number of outstanding allocations.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of free blocks.
    pub fn free_block_count(&self) -> usize {
        self.free.len()
    }

    /// Number of chunks acquired from the system allocator.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Whether `ptr` is an outstanding allocation of this arena.
    pub fn owns(&self, ptr: *const u8) -> bool {
        self.live.contains_key(&ptr.addr())
    }

    /// Usage counters in one struct.
    pub fn usage(&self) -> ArenaUsage {
        ArenaUsage {
            footprint: self.footprint,
            in_use: self.in_use,
            free_bytes: self.free.bytes(),
            live_blocks: self.live.len(),
            free_blocks: self.free.len(),
            chunks: self.chunks.len(),
        }
    }

    /// Allocate `bytes`, zero them, and free them again.
    ///
    /// Touches every page of the block so the first timed use does not pay
    /// for page faults. A no-op for zero bytes.
    pub fn prefault(&mut self, bytes: usize) {
        let ptr = self.alloc(bytes);
        if ptr.is_null() {
            return;
        }
        let id = self.live[&ptr.addr()];
        let block = *self.blocks.get(id);
        self.chunks[block.chunk as usize]
            .raw
            .zero(block.offset, block.size);
        self.free(ptr);
    }

    /// Return every chunk to the system allocator.
    ///
    /// Outstanding pointers become dangling. The footprint drops to zero
    /// and the arena can be used again afterwards.
    pub fn release(&mut self) {
        if !self.live.is_empty() {
            tracing::debug!(
                outstanding = self.live.len(),
                bytes = self.in_use,
                "releasing arena with outstanding allocations"
            );
        }
        self.chunks.clear();
        self.blocks = BlockTable::new();
        self.free = FreeIndex::new();
        self.live.clear();
        self.footprint = 0;
        self.in_use = 0;
    }

    /// Verify the arena's structural invariants.
    ///
    /// Walks every chunk in address order and cross-checks the free index,
    /// the live map and the byte counters. Cost is linear in the number of
    /// blocks; intended for tests and debugging.
    pub fn check_invariants(&self) -> Result<(), ArenaError> {
        let fail = |reason: String| Err(ArenaError::InvariantViolated { reason });

        let mut walked = 0usize;
        let mut free_seen = 0usize;
        let mut live_bytes = 0usize;
        let mut footprint = 0usize;

        for (chunk_index, chunk) in self.chunks.iter().enumerate() {
            footprint += chunk.raw.size();
            let mut expected_offset = 0usize;
            let mut prev: Option<BlockId> = None;
            let mut prev_free = false;
            let mut cursor = Some(chunk.head);

            while let Some(id) = cursor {
                let Some(block) = self.blocks.try_get(id) else {
                    return fail(format!("chunk {chunk_index} links to vacant block {id}"));
                };
                if block.chunk as usize != chunk_index {
                    return fail(format!("block {id} claims chunk {}", block.chunk));
                }
                if block.offset != expected_offset {
                    return fail(format!(
                        "gap or overlap at block {id}: offset {} expected {expected_offset}",
                        block.offset
                    ));
                }
                if block.size == 0 || block.size % self.config.alignment != 0 {
                    return fail(format!("block {id} has unaligned size {}", block.size));
                }
                if block.prev != prev {
                    return fail(format!("block {id} has a broken prev link"));
                }

                let entry = self.entry_of(id, block);
                if block.free {
                    if prev_free {
                        return fail(format!("free block {id} follows another free block"));
                    }
                    if !self.free.contains(&entry) {
                        return fail(format!("free block {id} missing from the free index"));
                    }
                    free_seen += 1;
                } else {
                    if self.live.get(&entry.addr) != Some(&id) {
                        return fail(format!("live block {id} missing from the live map"));
                    }
                    live_bytes += block.size;
                }

                expected_offset = block.end();
                prev_free = block.free;
                prev = Some(id);
                walked += 1;
                cursor = block.next;
            }

            if expected_offset != chunk.raw.size() {
                return fail(format!(
                    "chunk {chunk_index} covered up to {expected_offset} of {} bytes",
                    chunk.raw.size()
                ));
            }
        }

        if walked != self.blocks.len() {
            return fail(format!(
                "{} block records but {walked} reachable",
                self.blocks.len()
            ));
        }
        if free_seen != self.free.len() {
            return fail(format!(
                "free index holds {} entries but {free_seen} free blocks exist",
                self.free.len()
            ));
        }
        if self.free.iter().any(|e| self.blocks.try_get(e.id).is_none()) {
            return fail("free index references a vacant block".to_string());
        }
        if live_bytes != self.in_use {
            return fail(format!(
                "in_use is {} but live blocks total {live_bytes}",
                self.in_use
            ));
        }
        if footprint != self.footprint {
            return fail(format!(
                "footprint is {} but chunks total {footprint}",
                self.footprint
            ));
        }
        if self.in_use + self.free.bytes() != self.footprint {
            return fail("live and free bytes do not add up to the footprint".to_string());
        }
        Ok(())
    }

    /// Append a chunk large enough for `size` bytes and return its single
    /// (free, unindexed) block.
    fn grow(&mut self, size: usize) -> BlockId {
        let wanted = size.max(self.footprint).max(self.config.min_chunk_bytes);
        let Some(chunk_size) = self.config.round_up(wanted) else {
            raw::unsatisfiable(wanted, self.config.alignment)
        };
        let raw = RawChunk::allocate(chunk_size, self.config.alignment);
        let chunk_index = u32::try_from(self.chunks.len()).expect("chunk count exceeds u32::MAX");
        let head = self.blocks.insert(Block {
            chunk: chunk_index,
            offset: 0,
            size: chunk_size,
            free: true,
            prev: None,
            next: None,
        });
        self.chunks.push(Chunk { raw, head });
        self.footprint += chunk_size;
        tracing::debug!(
            chunk = chunk_index,
            chunk_bytes = chunk_size,
            footprint = self.footprint,
            "arena grew"
        );
        head
    }

    /// Shrink `id` to `size` bytes, indexing the remainder as a new free
    /// block. Sizes are alignment multiples, so any remainder is usable.
    fn split(&mut self, id: BlockId, size: usize) {
        let block = *self.blocks.get(id);
        debug_assert!(block.size >= size);
        let remainder = block.size - size;
        if remainder == 0 {
            return;
        }
        let rest_id = self.blocks.insert(Block {
            chunk: block.chunk,
            offset: block.offset + size,
            size: remainder,
            free: true,
            prev: Some(id),
            next: block.next,
        });
        if let Some(next) = block.next {
            self.blocks.get_mut(next).prev = Some(rest_id);
        }
        let head = self.blocks.get_mut(id);
        head.size = size;
        head.next = Some(rest_id);
        self.index(rest_id);
    }

    /// Merge the block after `keep` into `keep`. Both must be in the same
    /// chunk; the absorbed record is vacated.
    fn absorb_next(&mut self, keep: BlockId) {
        let Some(next_id) = self.blocks.get(keep).next else {
            return;
        };
        let next = self.blocks.remove(next_id);
        let kept = self.blocks.get_mut(keep);
        kept.size += next.size;
        kept.next = next.next;
        if let Some(after) = next.next {
            self.blocks.get_mut(after).prev = Some(keep);
        }
    }

    fn entry_of(&self, id: BlockId, block: &Block) -> FreeEntry {
        FreeEntry {
            size: block.size,
            addr: self.chunks[block.chunk as usize].raw.base_addr() + block.offset,
            id,
        }
    }

    fn index(&mut self, id: BlockId) {
        let entry = self.entry_of(id, self.blocks.get(id));
        self.free.insert(entry);
    }

    fn unindex(&mut self, id: BlockId) {
        let entry = self.entry_of(id, self.blocks.get(id));
        let removed = self.free.remove(&entry);
        debug_assert!(removed, "free block {id} was not indexed");
    }

    /// Chunk index holding `addr`, if any.
    #[cfg(test)]
    fn chunk_of(&self, addr: usize) -> Option<usize> {
        self.chunks.iter().position(|c| c.raw.contains(addr))
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            config: ArenaConfig::default(),
            chunks: SmallVec::new(),
            blocks: BlockTable::new(),
            free: FreeIndex::new(),
            live: IndexMap::new(),
            footprint: 0,
            in_use: 0,
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("config", &self.config)
            .field("usage", &self.usage())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const KIB: usize = 1024;

    fn small_arena() -> Arena {
        Arena::new(ArenaConfig {
            alignment: 16,
            min_chunk_bytes: 4 * KIB,
        })
        .unwrap()
    }

    #[test]
    fn new_arena_holds_nothing() {
        let arena = small_arena();
        assert_eq!(arena.footprint(), 0);
        assert_eq!(arena.usage(), ArenaUsage::default());
        arena.check_invariants().unwrap();
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = Arena::new(ArenaConfig {
            alignment: 3,
            min_chunk_bytes: 4 * KIB,
        });
        assert!(matches!(result, Err(ArenaError::InvalidConfig { .. })));
    }

    #[test]
    fn alloc_is_aligned_and_non_null() {
        let mut arena = small_arena();
        for n in [1, 7, 8, 15, 16, 17, 100, 1000] {
            let p = arena.alloc(n);
            assert!(!p.is_null());
            assert_eq!(p.addr() % 16, 0, "n={n}");
        }
        arena.check_invariants().unwrap();
    }

    #[test]
    fn zero_alloc_returns_null_and_free_is_noop() {
        let mut arena = small_arena();
        let p = arena.alloc(0);
        assert!(p.is_null());
        arena.free(p);
        assert_eq!(arena.footprint(), 0);
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn first_alloc_acquires_min_chunk() {
        let mut arena = small_arena();
        arena.alloc(8);
        assert_eq!(arena.footprint(), 4 * KIB);
        assert_eq!(arena.chunk_count(), 1);
        assert_eq!(arena.in_use(), 16);
        assert_eq!(arena.free_bytes(), 4 * KIB - 16);
    }

    #[test]
    fn alloc_free_round_trip_keeps_footprint() {
        let mut arena = small_arena();
        arena.prefault(2 * KIB);
        let before = arena.footprint();
        let p = arena.alloc(8);
        arena.free(p);
        assert_eq!(arena.footprint(), before);
        assert_eq!(arena.free_block_count(), 1);
        arena.check_invariants().unwrap();
    }

    #[test]
    fn allocations_do_not_overlap() {
        let mut arena = small_arena();
        let sizes = [24, 100, 8, 512, 64];
        let ptrs: Vec<(usize, usize)> = sizes
            .iter()
            .map(|&n| (arena.alloc(n).addr(), n))
            .collect();
        for (i, &(a, an)) in ptrs.iter().enumerate() {
            for &(b, bn) in &ptrs[i + 1..] {
                assert!(a + an <= b || b + bn <= a, "overlap {a:#x}+{an} / {b:#x}+{bn}");
            }
        }
    }

    #[test]
    fn free_merges_both_neighbours() {
        let mut arena = small_arena();
        let a = arena.alloc(64);
        let b = arena.alloc(64);
        let c = arena.alloc(64);
        let _d = arena.alloc(64);
        // a | b | c | d | tail
        arena.free(a);
        arena.free(c);
        assert_eq!(arena.free_block_count(), 3);
        arena.free(b);
        // a+b+c merged; tail separate because d is live.
        assert_eq!(arena.free_block_count(), 2);
        arena.check_invariants().unwrap();
    }

    #[test]
    fn free_in_any_order_restores_single_block() {
        let mut arena = small_arena();
        let ptrs: Vec<_> = (0..8).map(|i| arena.alloc(16 * (i + 1))).collect();
        for &i in &[3, 0, 7, 5, 1, 6, 2, 4] {
            arena.free(ptrs[i]);
            arena.check_invariants().unwrap();
        }
        assert_eq!(arena.free_block_count(), 1);
        assert_eq!(arena.free_bytes(), arena.footprint());
        assert_eq!(arena.in_use(), 0);
    }

    #[test]
    fn best_fit_reuses_smallest_hole() {
        let mut arena = small_arena();
        let big = arena.alloc(256);
        let _guard1 = arena.alloc(16);
        let small = arena.alloc(64);
        let _guard2 = arena.alloc(16);
        arena.free(big);
        arena.free(small);
        // The 64-byte hole is the best fit for 48 bytes; the 256-byte
        // hole and the tail are larger.
        let p = arena.alloc(48);
        assert_eq!(p, small);
        arena.check_invariants().unwrap();
    }

    #[test]
    fn growth_doubles_footprint() {
        let mut arena = small_arena();
        arena.alloc(4 * KIB);
        assert_eq!(arena.footprint(), 4 * KIB);
        arena.alloc(16);
        assert_eq!(arena.footprint(), 8 * KIB);
        arena.alloc(5 * KIB);
        // Third chunk is max(request, footprint) = 8 KiB.
        assert_eq!(arena.footprint(), 16 * KIB);
        assert_eq!(arena.chunk_count(), 3);
        arena.check_invariants().unwrap();
    }

    #[test]
    fn growth_is_bounded_below_by_request() {
        let mut arena = small_arena();
        arena.alloc(100 * KIB);
        assert_eq!(arena.footprint(), 100 * KIB);
    }

    /// Re-runs `test` in a child process with `SCRATCHPOOL_FATAL_CASE=case`
    /// and returns whether the child exited cleanly.
    fn child_succeeds(test: &str, case: &str) -> bool {
        std::process::Command::new(std::env::current_exe().unwrap())
            .args(["--exact", test, "--nocapture", "--test-threads=1"])
            .env("SCRATCHPOOL_FATAL_CASE", case)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .unwrap()
            .success()
    }

    #[test]
    fn unsatisfiable_request_terminates_the_process() {
        if let Ok(case) = std::env::var("SCRATCHPOOL_FATAL_CASE") {
            let mut arena = Arena::default();
            let n = match case.as_str() {
                "round_up" => usize::MAX,
                "layout" => isize::MAX as usize,
                _ => 16,
            };
            // Only reached if the request above did not terminate us.
            let p = arena.alloc(n);
            assert!(!p.is_null());
            return;
        }

        let test = "arena::tests::unsatisfiable_request_terminates_the_process";
        // A satisfiable request exits cleanly, so the child really runs.
        assert!(child_succeeds(test, "control"));
        assert!(!child_succeeds(test, "round_up"));
        assert!(!child_succeeds(test, "layout"));
    }

    #[test]
    fn blocks_never_merge_across_chunks() {
        let mut arena = small_arena();
        let a = arena.alloc(4 * KIB);
        let b = arena.alloc(4 * KIB);
        assert_ne!(arena.chunk_of(a.addr()), arena.chunk_of(b.addr()));
        arena.free(a);
        arena.free(b);
        assert_eq!(arena.free_block_count(), 2);
        arena.check_invariants().unwrap();
    }

    #[test]
    fn try_free_rejects_foreign_pointer() {
        let mut arena = small_arena();
        let p = arena.alloc(32);
        let mut other = 0u64;
        let foreign = std::ptr::addr_of_mut!(other).cast::<u8>();
        assert_eq!(
            arena.try_free(foreign),
            Err(ArenaError::ForeignPointer {
                addr: foreign.addr()
            })
        );
        assert!(arena.try_free(p).is_ok());
        assert!(matches!(
            arena.try_free(p),
            Err(ArenaError::ForeignPointer { .. })
        ));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not owned by this arena")]
    fn double_free_asserts_in_debug() {
        let mut arena = small_arena();
        let p = arena.alloc(32);
        arena.free(p);
        arena.free(p);
    }

    #[test]
    fn owns_tracks_live_pointers() {
        let mut arena = small_arena();
        let p = arena.alloc(32);
        assert!(arena.owns(p));
        arena.free(p);
        assert!(!arena.owns(p));
    }

    #[test]
    fn prefault_leaves_memory_free() {
        let mut arena = small_arena();
        arena.prefault(3 * KIB);
        assert_eq!(arena.footprint(), 4 * KIB);
        assert_eq!(arena.in_use(), 0);
        assert_eq!(arena.free_block_count(), 1);
        let chunk = &arena.chunks[0].raw;
        assert!((0..3 * KIB).all(|i| chunk.byte_at(i) == 0));
    }

    #[test]
    fn release_returns_to_empty() {
        let mut arena = small_arena();
        arena.alloc(100);
        arena.alloc(10 * KIB);
        arena.release();
        assert_eq!(arena.usage(), ArenaUsage::default());
        arena.check_invariants().unwrap();
        // Usable again after release.
        assert!(!arena.alloc(16).is_null());
        arena.check_invariants().unwrap();
    }

    #[test]
    fn memory_is_writable_across_whole_block() {
        let mut arena = small_arena();
        let n = 1000;
        let p = arena.alloc(n * std::mem::size_of::<f64>()).cast::<f64>();
        #[allow(unsafe_code)]
        // SAFETY: p points to n f64-sized, f64-aligned bytes owned by us.
        let slice = unsafe {
            std::ptr::write_bytes(p, 0, n);
            std::slice::from_raw_parts_mut(p, n)
        };
        for (i, v) in slice.iter_mut().enumerate() {
            *v = i as f64;
        }
        assert_eq!(slice.iter().sum::<f64>(), (0..n).map(|i| i as f64).sum());
        arena.free(p.cast());
    }

    #[derive(Clone, Debug)]
    enum Op {
        Alloc(usize),
        Free(usize),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (1usize..2048).prop_map(Op::Alloc),
            2 => any::<usize>().prop_map(Op::Free),
        ]
    }

    proptest! {
        #[test]
        fn invariants_hold_under_random_traffic(ops in prop::collection::vec(arb_op(), 1..200)) {
            let mut arena = small_arena();
            let mut live: Vec<*mut u8> = Vec::new();
            let mut last_footprint = 0;
            for op in ops {
                match op {
                    Op::Alloc(n) => {
                        let p = arena.alloc(n);
                        prop_assert!(!p.is_null());
                        prop_assert_eq!(p.addr() % 16, 0);
                        live.push(p);
                    }
                    Op::Free(pick) => {
                        if !live.is_empty() {
                            let p = live.swap_remove(pick % live.len());
                            arena.free(p);
                        }
                    }
                }
                prop_assert!(arena.footprint() >= last_footprint);
                last_footprint = arena.footprint();
                if let Err(e) = arena.check_invariants() {
                    return Err(TestCaseError::fail(e.to_string()));
                }
                prop_assert_eq!(arena.live_count(), live.len());
            }
            for p in live.drain(..) {
                arena.free(p);
            }
            prop_assert_eq!(arena.in_use(), 0);
            prop_assert_eq!(arena.free_block_count(), arena.chunk_count());
        }

        #[test]
        fn round_trip_without_growth_keeps_footprint(warm in 1usize..4096, n in 1usize..4096) {
            let mut arena = small_arena();
            arena.prefault(warm);
            let before = arena.footprint();
            let chunks_before = arena.chunk_count();
            let p = arena.alloc(n);
            arena.free(p);
            if arena.chunk_count() == chunks_before {
                prop_assert_eq!(arena.footprint(), before);
            }
        }
    }
}
