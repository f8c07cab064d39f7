//! The thread-indexed arena registry.
//!
//! [`ArenaRegistry`] owns one [`Arena`] per worker ordinal. `alloc` and
//! `free` look up the caller's ordinal through a [`ThreadIndex`] and go
//! straight to that arena: there is no lock on the fast path.
//!
//! Exclusivity of a slot is not assumed, it is checked. Entering a slot
//! swaps its `busy` flag; if the flag was already set, two threads resolved
//! to the same ordinal at once and the call panics instead of racing.
//!
//! After every mutation the owner publishes its arena's footprint into a
//! shared [`FootprintBoard`], which [`stats`](ArenaRegistry::stats) and the
//! usage probe read without touching the arenas.

#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use scratchpool_arena::{Arena, ArenaError, ArenaUsage};
use scratchpool_core::{
    in_parallel_region, MemoryProbe, ParallelFor, ProbeReading, ProbeRegistry, Real, SerialHost,
    TeamIndex, ThreadIndex, WorkerTeam,
};

use crate::buffer::ScratchBuf;
use crate::config::{ConfigError, PoolConfig};
use crate::poison::PoisonFiller;
use crate::stats::{FootprintBoard, PoolStats};

/// Name under which [`ArenaRegistry::register_probe`] registers.
pub const PROBE_NAME: &str = "scratchpool";

// ── ArenaSlot ──────────────────────────────────────────────────────

/// One arena plus its exclusivity flag, on its own cache lines.
#[repr(align(128))]
struct ArenaSlot {
    busy: AtomicBool,
    arena: UnsafeCell<Arena>,
}

// SAFETY: the arena is only reached through `SlotGuard`, and at most one
// guard per slot exists at a time (enforced by the `busy` swap).
unsafe impl Sync for ArenaSlot {}

impl ArenaSlot {
    fn new(arena: Arena) -> Self {
        Self {
            busy: AtomicBool::new(false),
            arena: UnsafeCell::new(arena),
        }
    }

    /// Enter the slot, panicking if another thread is inside it.
    fn enter(&self, ordinal: usize) -> SlotGuard<'_> {
        match self.try_enter() {
            Some(guard) => guard,
            None => panic!(
                "arena slot {ordinal} entered concurrently by two threads; \
                 worker ordinals must be unique among running threads"
            ),
        }
    }

    fn try_enter(&self) -> Option<SlotGuard<'_>> {
        if self.busy.swap(true, Ordering::Acquire) {
            None
        } else {
            Some(SlotGuard { slot: self })
        }
    }
}

/// Exclusive access to one slot's arena for the guard's lifetime.
struct SlotGuard<'a> {
    slot: &'a ArenaSlot,
}

impl Deref for SlotGuard<'_> {
    type Target = Arena;

    fn deref(&self) -> &Arena {
        // SAFETY: this guard holds the slot's busy flag.
        unsafe { &*self.slot.arena.get() }
    }
}

impl DerefMut for SlotGuard<'_> {
    fn deref_mut(&mut self) -> &mut Arena {
        // SAFETY: this guard holds the slot's busy flag.
        unsafe { &mut *self.slot.arena.get() }
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.slot.busy.store(false, Ordering::Release);
    }
}

// ── ArenaRegistry ──────────────────────────────────────────────────

/// One best-fit arena per worker ordinal.
///
/// Built uninitialized by [`new`](Self::new); [`init`](Self::init) sizes
/// and warms the arenas. Every arena is used only by the thread currently
/// holding its ordinal.
pub struct ArenaRegistry {
    config: PoolConfig,
    index: Arc<dyn ThreadIndex>,
    filler: PoisonFiller,
    slots: Box<[ArenaSlot]>,
    board: Arc<FootprintBoard>,
    poison: AtomicBool,
    initialized: bool,
}

// Compile-time assertion: the registry is shared across worker threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<ArenaRegistry>();
};

impl ArenaRegistry {
    /// Build an uninitialized registry.
    ///
    /// `index` resolves the calling thread's ordinal; `dispatch` runs the
    /// device variant of poison fill.
    pub fn new(
        config: PoolConfig,
        index: Arc<dyn ThreadIndex>,
        dispatch: Arc<dyn ParallelFor>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let poison = AtomicBool::new(config.init_snan);
        Ok(Self {
            config,
            index,
            filler: PoisonFiller::new(dispatch),
            slots: Box::default(),
            board: Arc::new(FootprintBoard::new(0)),
            poison,
            initialized: false,
        })
    }

    /// Build an uninitialized registry indexed by [`WorkerTeam`] ordinals,
    /// with host-only poison fill.
    pub fn with_config(config: PoolConfig) -> Result<Self, ConfigError> {
        Self::new(config, Arc::new(TeamIndex), Arc::new(SerialHost))
    }

    /// The configuration this registry was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Whether [`init`](Self::init) has run since construction or the last
    /// [`finalize`](Self::finalize).
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Create one arena per worker and warm each of them up.
    ///
    /// The worker count is `config().worker_count`, or the thread index's
    /// `max_workers()` when unset. Every arena then allocates, zeroes and
    /// frees `warmup_bytes` from inside a worker-team region, so the pages
    /// are resident before the first real use. When the worker limit caps
    /// the team below the arena count, team members warm several arenas.
    ///
    /// Calling `init` on an initialized registry does nothing.
    pub fn init(&mut self) -> Result<(), ConfigError> {
        if self.initialized {
            return Ok(());
        }
        let workers = self
            .config
            .worker_count
            .unwrap_or_else(|| self.index.max_workers())
            .max(1);
        if workers > PoolConfig::MAX_WORKERS {
            return Err(ConfigError::TooManyWorkers {
                configured: workers,
            });
        }

        if self.slots.len() != workers {
            self.slots = (0..workers)
                .map(|_| Arena::new(self.config.arena.clone()).map(ArenaSlot::new))
                .collect::<Result<_, ArenaError>>()?;
            self.board = Arc::new(FootprintBoard::new(workers));
        }

        let warmup = self.config.warmup_bytes;
        if warmup > 0 {
            if in_parallel_region() {
                (0..workers).for_each(|ordinal| self.warm(ordinal, warmup));
            } else {
                // The team may be narrower than the arena count; each member
                // warms every `stride`-th arena starting at its own ordinal.
                let this = &*self;
                let team = WorkerTeam::new(workers);
                let stride = team.size();
                team.run(|first| {
                    (first..workers)
                        .step_by(stride)
                        .for_each(|ordinal| this.warm(ordinal, warmup));
                });
            }
        }
        self.initialized = true;

        tracing::info!(
            workers,
            warmup_bytes = warmup,
            init_snan = self.poison_enabled(),
            min_chunk_bytes = self.config.arena.min_chunk_bytes,
            "scratch pool initialized"
        );
        Ok(())
    }

    fn warm(&self, ordinal: usize, bytes: usize) {
        let mut arena = self.slots[ordinal].enter(ordinal);
        arena.prefault(bytes);
        self.board.publish(ordinal, arena.footprint());
    }

    /// Release every arena's storage and return to the uninitialized state.
    ///
    /// Pointers handed out before this call dangle afterwards. The arena
    /// slots are kept, with zero footprint, so a following `init` with the
    /// same worker count reuses them.
    pub fn finalize(&mut self) {
        if !self.initialized {
            return;
        }
        let mut outstanding = 0usize;
        for slot in self.slots.iter_mut() {
            let arena = slot.arena.get_mut();
            outstanding += arena.live_count();
            arena.release();
        }
        self.board.clear();
        self.initialized = false;
        tracing::info!(
            workers = self.slots.len(),
            outstanding,
            "scratch pool finalized"
        );
    }

    // ── Allocation ─────────────────────────────────────────────────

    /// Ordinal of the calling thread, checked against the arena count.
    fn ordinal(&self) -> usize {
        assert!(
            self.initialized,
            "scratch pool used before init() or after finalize()"
        );
        let ordinal = self.index.current();
        assert!(
            ordinal < self.slots.len(),
            "worker ordinal {ordinal} out of range for {} arenas",
            self.slots.len()
        );
        ordinal
    }

    /// Ordinal of the calling thread.
    ///
    /// # Panics
    ///
    /// Panics if the registry is not initialized or the ordinal is out of
    /// range.
    pub fn current_ordinal(&self) -> usize {
        self.ordinal()
    }

    /// Allocate `n` bytes from the calling thread's arena.
    ///
    /// Returns null for `n == 0`. The memory is uninitialized and aligned to
    /// `config().arena.alignment`.
    ///
    /// # Panics
    ///
    /// Panics if the registry is not initialized, or if another thread is
    /// using the same arena at this moment.
    pub fn alloc(&self, n: usize) -> *mut u8 {
        self.alloc_at(self.ordinal(), n)
    }

    pub(crate) fn alloc_at(&self, ordinal: usize, n: usize) -> *mut u8 {
        let mut arena = self.slots[ordinal].enter(ordinal);
        let before = arena.footprint();
        let ptr = arena.alloc(n);
        let after = arena.footprint();
        if after != before {
            self.board.publish(ordinal, after);
            tracing::debug!(ordinal, footprint = after, "arena footprint grew");
        }
        ptr
    }

    /// Return `ptr` to the calling thread's arena. Null is a no-op.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from [`alloc`](Self::alloc) or
    /// [`alloc_real`](Self::alloc_real) on this registry from the same
    /// ordinal, and no reference into it may outlive this call. In
    /// particular it must not be the storage of a live [`ScratchBuf`].
    pub unsafe fn free(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        if !self.initialized {
            debug_assert!(false, "free on an uninitialized scratch pool");
            tracing::error!(addr = ptr.addr(), "ignoring free after finalize");
            return;
        }
        self.free_at(self.ordinal(), ptr);
    }

    pub(crate) fn free_at(&self, ordinal: usize, ptr: *mut u8) {
        let mut arena = self.slots[ordinal].enter(ordinal);
        arena.free(ptr);
    }

    /// Allocate `count` elements of `T`, poisoned when poison fill is on.
    ///
    /// Returns null for `count == 0`. A `count` whose byte size overflows
    /// terminates the process like any other unsatisfiable request.
    ///
    /// # Panics
    ///
    /// Under the conditions of [`alloc`](Self::alloc).
    pub fn alloc_real<T: Real>(&self, count: usize) -> *mut T {
        let ptr = self.alloc(byte_len::<T>(count)).cast::<T>();
        // SAFETY: `ptr` is a fresh, exclusively owned, suitably aligned
        // allocation of `count` elements.
        unsafe { self.fill_real_array(ptr, count) };
        ptr
    }

    /// Allocate an owned buffer of `count` elements.
    ///
    /// The contents are the poison pattern when poison fill is on and zero
    /// otherwise. The buffer returns its storage on drop.
    pub fn alloc_buf<T: Real>(&self, count: usize) -> ScratchBuf<'_, T> {
        let ordinal = self.ordinal();
        let raw = self.alloc_at(ordinal, byte_len::<T>(count)).cast::<T>();
        let ptr = NonNull::new(raw).unwrap_or(NonNull::dangling());
        // SAFETY: `ptr` is either a fresh allocation of `count` elements
        // from `ordinal`, or dangling with `count == 0`.
        let mut buf = unsafe { ScratchBuf::from_raw_parts(self, ordinal, ptr, count) };
        if self.poison_enabled() {
            self.filler.fill_slice(&mut buf, self.config.fill_target);
        } else {
            buf.fill(T::default());
        }
        buf
    }

    // ── Poison fill ────────────────────────────────────────────────

    /// Whether new floating-point arrays are poisoned.
    pub fn poison_enabled(&self) -> bool {
        self.poison.load(Ordering::Relaxed)
    }

    /// Turn poison fill on or off for subsequent allocations.
    pub fn set_poison_enabled(&self, on: bool) {
        self.poison.store(on, Ordering::Relaxed);
    }

    /// The filler used for floating-point allocations.
    pub fn filler(&self) -> &PoisonFiller {
        &self.filler
    }

    /// Poison `count` elements at `ptr` if poison fill is on; otherwise do
    /// nothing.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of `count` elements of `T` and not be
    /// accessed concurrently. Null is accepted when `count == 0`.
    pub unsafe fn fill_real_array<T: Real>(&self, ptr: *mut T, count: usize) {
        if self.poison_enabled() {
            // SAFETY: forwarded from the caller.
            unsafe {
                self.filler
                    .fill_raw(ptr.cast(), count, T::WIDTH, self.config.fill_target)
            };
        }
    }

    // ── Statistics ─────────────────────────────────────────────────

    /// Whole-megabyte footprint summary. All zeros when uninitialized.
    pub fn stats(&self) -> PoolStats {
        if !self.initialized {
            return PoolStats::default();
        }
        self.board.stats()
    }

    /// Last published footprint of every arena, by ordinal.
    pub fn footprints(&self) -> Vec<usize> {
        self.board.snapshot()
    }

    /// Number of arenas. Zero before the first `init`.
    pub fn arena_count(&self) -> usize {
        self.slots.len()
    }

    /// Detailed counters of arena `ordinal`.
    ///
    /// `None` if `ordinal` is out of range or the arena is in use right now.
    pub fn arena_usage(&self, ordinal: usize) -> Option<ArenaUsage> {
        let arena = self.slots.get(ordinal)?.try_enter()?;
        Some(arena.usage())
    }

    /// Verify every arena's invariants and that its published footprint is
    /// current.
    pub fn check_invariants(&mut self) -> Result<(), ArenaError> {
        for (ordinal, slot) in self.slots.iter_mut().enumerate() {
            let arena = slot.arena.get_mut();
            arena
                .check_invariants()
                .map_err(|e| ArenaError::InvariantViolated {
                    reason: format!("arena {ordinal}: {e}"),
                })?;
            let published = self.board.get(ordinal);
            if published != arena.footprint() {
                return Err(ArenaError::InvariantViolated {
                    reason: format!(
                        "arena {ordinal}: published footprint {published} != actual {}",
                        arena.footprint()
                    ),
                });
            }
        }
        Ok(())
    }

    /// A probe reporting the summed footprint of every arena.
    ///
    /// The probe reads the footprint board of the current initialization;
    /// after a `finalize`/`init` cycle that changes the worker count it
    /// must be registered again.
    pub fn usage_probe(&self) -> impl MemoryProbe + 'static {
        let board = Arc::clone(&self.board);
        move || ProbeReading::flat(board.total() as u64)
    }

    /// Register [`usage_probe`](Self::usage_probe) under [`PROBE_NAME`],
    /// returning any probe it replaced.
    pub fn register_probe(&self, probes: &mut ProbeRegistry) -> Option<Box<dyn MemoryProbe>> {
        probes.register(PROBE_NAME, self.usage_probe())
    }
}

impl fmt::Debug for ArenaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaRegistry")
            .field("initialized", &self.initialized)
            .field("arenas", &self.slots.len())
            .field("poison", &self.poison_enabled())
            .field("footprints", &self.board.snapshot())
            .finish()
    }
}

/// Byte size of `count` elements. Saturates, so an overflowing count
/// becomes a request the arena rejects as unsatisfiable.
fn byte_len<T>(count: usize) -> usize {
    count.saturating_mul(mem::size_of::<T>())
}
