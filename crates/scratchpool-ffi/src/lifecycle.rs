//! Pool lifecycle and statistics.

use scratchpool_engine::{pool, PoolConfig, PoolStats};

use crate::status::ScratchStatus;

/// Whole-megabyte footprint summary, C layout.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScratchStats {
    /// Smallest per-thread footprint, MiB.
    pub min_mb: u64,
    /// Largest per-thread footprint, MiB.
    pub max_mb: u64,
    /// Sum of all footprints, MiB.
    pub total_mb: u64,
}

impl From<PoolStats> for ScratchStats {
    fn from(s: PoolStats) -> Self {
        Self {
            min_mb: s.min_mb as u64,
            max_mb: s.max_mb as u64,
            total_mb: s.total_mb as u64,
        }
    }
}

/// Initialize the pool from `SCRATCHPOOL_*` environment variables.
///
/// Returns `CONFIG_ERROR` without initializing if the environment does not
/// parse. A no-op returning `OK` if the pool is already initialized.
/// Poison fill is on if the environment or an earlier
/// `scratchpool_set_init_snan(1)` asks for it.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn scratchpool_init() -> i32 {
    ffi_guard!({
        if pool::is_initialized() {
            return ScratchStatus::Ok as i32;
        }
        let mut config = match PoolConfig::from_env() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%err, "rejecting scratch pool environment");
                return ScratchStatus::from(&err) as i32;
            }
        };
        config.init_snan |= pool::poison_enabled();
        ScratchStatus::from(pool::init_with(config)) as i32
    })
}

/// Release all pool storage.
///
/// Every pointer from `scratchpool_alloc` dangles afterwards. Must not be
/// called while any thread is inside another `scratchpool_*` function.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn scratchpool_finalize() -> i32 {
    ffi_guard!({
        // SAFETY: sequencing after all pool use is the caller's contract.
        unsafe { pool::finalize() };
        ScratchStatus::Ok as i32
    })
}

/// Write the current footprint summary to `out`. All zeros when the pool is
/// not initialized.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn scratchpool_get_stats(out: *mut ScratchStats) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return ScratchStatus::InvalidArgument as i32;
        }
        let stats = ScratchStats::from(pool::stats());
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = stats };
        ScratchStatus::Ok as i32
    })
}
