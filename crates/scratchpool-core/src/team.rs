//! Worker teams and thread ordinals.
//!
//! A [`WorkerTeam`] runs a parallel region: the calling thread becomes
//! ordinal 0 and `size - 1` scoped threads take ordinals `1..size`. Inside
//! the region [`current_ordinal()`] returns the caller's ordinal; outside
//! any region it returns 0.
//!
//! Nested regions are inactive. A `run` issued from inside a region executes
//! its body once, inline, and the thread keeps its enclosing ordinal. This
//! keeps ordinals unique among concurrently running threads, which is what
//! per-ordinal data structures rely on.
//!
//! Team size is bounded by [`max_workers()`], the process-wide worker limit.
//! Per-ordinal structures sized from that limit therefore cover every
//! ordinal a team can hand out.

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide worker limit. Zero means "use available parallelism".
static WORKER_LIMIT: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static ORDINAL: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Ordinal of the calling thread within its worker team, or 0 outside
/// any parallel region.
pub fn current_ordinal() -> usize {
    ORDINAL.with(|c| c.get()).unwrap_or(0)
}

/// Whether the calling thread is executing inside a [`WorkerTeam`] region.
pub fn in_parallel_region() -> bool {
    ORDINAL.with(|c| c.get()).is_some()
}

/// Maximum team size: the limit set by [`set_max_workers`], otherwise the
/// machine's available parallelism, or 1 if it cannot be queried.
pub fn max_workers() -> usize {
    match WORKER_LIMIT.load(Ordering::Relaxed) {
        0 => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        limit => limit,
    }
}

/// Set the process-wide worker limit read by [`max_workers()`]. Zero
/// restores the default.
///
/// Teams created afterwards are clamped to the new limit. Registries sized
/// from [`TeamIndex`] read it once, at `init`, so raise the limit before
/// initializing the pool that a wider team will use.
pub fn set_max_workers(limit: usize) {
    WORKER_LIMIT.store(limit, Ordering::Relaxed);
}

/// Source of worker ordinals for per-thread data structures.
///
/// The default implementation is [`TeamIndex`]. Tests substitute their own
/// to pin a registry to a specific ordinal.
pub trait ThreadIndex: Send + Sync {
    /// Ordinal of the calling thread. Must be `< max_workers()`.
    fn current(&self) -> usize;

    /// Maximum number of workers that may run concurrently.
    fn max_workers(&self) -> usize;
}

/// [`ThreadIndex`] backed by [`WorkerTeam`] regions.
#[derive(Clone, Copy, Debug, Default)]
pub struct TeamIndex;

impl ThreadIndex for TeamIndex {
    fn current(&self) -> usize {
        current_ordinal()
    }

    fn max_workers(&self) -> usize {
        max_workers()
    }
}

/// Restores the previous thread-local ordinal on drop, including on unwind.
struct OrdinalGuard {
    previous: Option<usize>,
}

impl OrdinalGuard {
    fn enter(ordinal: usize) -> Self {
        let previous = ORDINAL.with(|c| c.replace(Some(ordinal)));
        Self { previous }
    }
}

impl Drop for OrdinalGuard {
    fn drop(&mut self) {
        ORDINAL.with(|c| c.set(self.previous));
    }
}

/// A fixed-size team of worker threads executing parallel regions.
#[derive(Clone, Copy, Debug)]
pub struct WorkerTeam {
    size: usize,
}

impl WorkerTeam {
    /// Create a team of `size` workers, clamped to `1..=max_workers()`.
    pub fn new(size: usize) -> Self {
        Self {
            size: size.clamp(1, max_workers()),
        }
    }

    /// Create a team sized by [`max_workers()`].
    pub fn with_max_workers() -> Self {
        Self::new(max_workers())
    }

    /// Number of workers in the team, including the calling thread.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Execute `body(ordinal)` once per worker and wait for all of them.
    ///
    /// Ordinal 0 runs on the calling thread. A panic in any worker is
    /// propagated to the caller after every worker has finished.
    pub fn run<F>(&self, body: F)
    where
        F: Fn(usize) + Sync,
    {
        if in_parallel_region() {
            body(current_ordinal());
            return;
        }

        std::thread::scope(|scope| {
            let body = &body;
            for ordinal in 1..self.size {
                scope.spawn(move || {
                    let _guard = OrdinalGuard::enter(ordinal);
                    body(ordinal);
                });
            }
            let _guard = OrdinalGuard::enter(0);
            body(0);
        });
    }
}

impl Default for WorkerTeam {
    fn default() -> Self {
        Self::with_max_workers()
    }
}
