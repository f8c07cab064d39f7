//! The process-wide scratch pool.
//!
//! Free functions over a single global [`ArenaRegistry`]. The registry is
//! created by [`init`]/[`init_with`], or lazily by the first [`alloc`], and
//! lives until [`finalize`]. Worker ordinals come from [`WorkerTeam`]
//! regions; outside any region the caller is ordinal 0.
//!
//! ```no_run
//! use scratchpool_core::WorkerTeam;
//! use scratchpool_engine::pool;
//!
//! pool::init();
//! WorkerTeam::new(4).run(|_| {
//!     let mut tmp = pool::scratch::<f64>(1024);
//!     tmp[0] = 1.0;
//! });
//! println!("{:?}", pool::stats());
//! // SAFETY: no region is running and no scratch buffer is alive.
//! unsafe { pool::finalize() };
//! ```
//!
//! [`WorkerTeam`]: scratchpool_core::WorkerTeam

#![allow(unsafe_code)]

use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::sync::Mutex;

use scratchpool_core::{MemoryProbe, ProbeRegistry, Real};

use crate::buffer::ScratchBuf;
use crate::config::{ConfigError, PoolConfig};
use crate::poison::PoisonFiller;
use crate::registry::ArenaRegistry;
use crate::stats::PoolStats;

/// The live registry, or null. Written only under `INIT_LOCK`.
static REGISTRY: AtomicPtr<ArenaRegistry> = AtomicPtr::new(ptr::null_mut());

/// Serializes `init`/`finalize`.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Poison flag requested while no registry is live.
static INIT_SNAN: AtomicBool = AtomicBool::new(false);

fn registry() -> Option<&'static ArenaRegistry> {
    let ptr = REGISTRY.load(Ordering::Acquire);
    // SAFETY: a non-null pointer came from `Box::into_raw` in `init_with`
    // and stays valid until `finalize`, whose contract forbids concurrent
    // use.
    unsafe { ptr.as_ref() }
}

fn registry_or_init() -> &'static ArenaRegistry {
    if let Some(reg) = registry() {
        return reg;
    }
    init();
    match registry() {
        Some(reg) => reg,
        None => panic!("scratch pool failed to initialize"),
    }
}

// ── Lifecycle ──────────────────────────────────────────────────────

/// Initialize the pool from `SCRATCHPOOL_*` environment variables.
///
/// An unparsable environment is logged and replaced by the defaults.
/// Poison fill is on if the environment asks for it or an earlier
/// [`set_poison_enabled(true)`](set_poison_enabled) did. Does nothing if
/// the pool is already initialized.
pub fn init() {
    if is_initialized() {
        return;
    }
    let config = config_or_default(PoolConfig::from_env(), INIT_SNAN.load(Ordering::Relaxed));
    if let Err(err) = init_with(config) {
        tracing::warn!(%err, "scratch pool init failed, retrying with defaults");
        let fallback = PoolConfig {
            init_snan: INIT_SNAN.load(Ordering::Relaxed),
            ..PoolConfig::default()
        };
        if let Err(err) = init_with(fallback) {
            panic!("scratch pool cannot initialize with default config: {err}");
        }
    }
}

/// The configuration `init` starts from: `parsed`, or the defaults if it
/// failed to parse, with poison fill forced on by `poison_requested`.
fn config_or_default(
    parsed: Result<PoolConfig, ConfigError>,
    poison_requested: bool,
) -> PoolConfig {
    let mut config = parsed.unwrap_or_else(|err| {
        tracing::warn!(%err, "invalid scratch pool environment, using defaults");
        PoolConfig::default()
    });
    config.init_snan |= poison_requested;
    config
}

/// Initialize the pool with an explicit configuration.
///
/// Idempotent: if the pool is already initialized the call returns `Ok`
/// and `config` is ignored.
pub fn init_with(config: PoolConfig) -> Result<(), ConfigError> {
    let _lock = INIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    if !REGISTRY.load(Ordering::Acquire).is_null() {
        tracing::debug!("scratch pool already initialized");
        return Ok(());
    }
    let init_snan = config.init_snan;
    let mut reg = ArenaRegistry::with_config(config)?;
    reg.init()?;
    INIT_SNAN.store(init_snan, Ordering::Relaxed);
    REGISTRY.store(Box::into_raw(Box::new(reg)), Ordering::Release);
    Ok(())
}

/// Release all pool storage and return to the uninitialized state.
///
/// A later [`init`] or [`alloc`] starts a fresh pool.
///
/// # Safety
///
/// No thread may be inside, or later return into, any pool operation
/// concerning the current registry: every region using the pool must have
/// finished, every [`ScratchBuf`] from [`scratch`] must have been dropped,
/// and no pointer from [`alloc`] may be used afterwards.
pub unsafe fn finalize() {
    let _lock = INIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let ptr = REGISTRY.swap(ptr::null_mut(), Ordering::AcqRel);
    if ptr.is_null() {
        return;
    }
    // SAFETY: `ptr` came from `Box::into_raw` and, per the caller's
    // contract, nobody else holds a reference into it.
    let mut reg = unsafe { Box::from_raw(ptr) };
    reg.finalize();
}

/// Whether the pool is initialized.
pub fn is_initialized() -> bool {
    registry().is_some()
}

// ── Allocation ─────────────────────────────────────────────────────

/// Allocate `n` bytes from the calling worker's arena.
///
/// Initializes the pool first if needed. Returns null for `n == 0`.
pub fn alloc(n: usize) -> *mut u8 {
    registry_or_init().alloc(n)
}

/// Return `ptr` to the calling worker's arena. Null is a no-op, as is any
/// call while the pool is not initialized.
///
/// # Safety
///
/// `ptr` must have come from [`alloc`] or [`alloc_real`] on the same
/// worker ordinal, since the last [`init`], and must not be used again.
pub unsafe fn free(ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }
    match registry() {
        // SAFETY: forwarded from the caller.
        Some(reg) => unsafe { reg.free(ptr) },
        None => tracing::error!(addr = ptr.addr(), "free on uninitialized scratch pool ignored"),
    }
}

/// Allocate `count` elements of `T`, poisoned when poison fill is on.
pub fn alloc_real<T: Real>(count: usize) -> *mut T {
    registry_or_init().alloc_real(count)
}

/// Allocate an owned buffer of `count` elements, poisoned when poison fill
/// is on and zeroed otherwise.
pub fn scratch<T: Real>(count: usize) -> ScratchBuf<'static, T> {
    registry_or_init().alloc_buf(count)
}

// ── Poison fill ────────────────────────────────────────────────────

/// Whether poison fill is on.
pub fn poison_enabled() -> bool {
    match registry() {
        Some(reg) => reg.poison_enabled(),
        None => INIT_SNAN.load(Ordering::Relaxed),
    }
}

/// Turn poison fill on or off, for the live pool and for the next
/// [`init`].
pub fn set_poison_enabled(on: bool) {
    INIT_SNAN.store(on, Ordering::Relaxed);
    if let Some(reg) = registry() {
        reg.set_poison_enabled(on);
    }
}

/// Poison `count` elements at `ptr` if poison fill is on; a no-op
/// otherwise.
///
/// # Safety
///
/// `ptr` must be valid for writes of `count` elements of `T` and not be
/// accessed concurrently. Null is accepted when `count == 0`.
pub unsafe fn fill_real_array<T: Real>(ptr: *mut T, count: usize) {
    match registry() {
        // SAFETY: forwarded from the caller.
        Some(reg) => unsafe { reg.fill_real_array(ptr, count) },
        None if INIT_SNAN.load(Ordering::Relaxed) => {
            let filler = PoisonFiller::host();
            // SAFETY: forwarded from the caller.
            unsafe { filler.fill_raw(ptr.cast(), count, T::WIDTH, Default::default()) };
        }
        None => {}
    }
}

// ── Statistics ─────────────────────────────────────────────────────

/// Whole-megabyte footprint summary. All zeros when uninitialized.
pub fn stats() -> PoolStats {
    registry().map(ArenaRegistry::stats).unwrap_or_default()
}

/// Published footprint of every arena, by ordinal. Empty when
/// uninitialized.
pub fn footprints() -> Vec<usize> {
    registry().map(ArenaRegistry::footprints).unwrap_or_default()
}

/// A probe over the live pool's footprints, if it is initialized.
pub fn usage_probe() -> Option<impl MemoryProbe + 'static> {
    registry().map(ArenaRegistry::usage_probe)
}

/// Register the live pool's usage probe. Returns whether the pool was
/// initialized.
pub fn register_probe(probes: &mut ProbeRegistry) -> bool {
    match registry() {
        Some(reg) => {
            reg.register_probe(probes);
            true
        }
        None => false,
    }
}
