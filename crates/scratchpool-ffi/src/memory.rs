//! Allocation, release and poison fill.

use std::ffi::c_void;

use scratchpool_engine::pool;

use crate::status::ScratchStatus;

/// Allocate `n` bytes from the calling thread's arena.
///
/// Initializes the pool on first use. Returns null for `n == 0` or if a
/// panic was caught. Never returns null for an unsatisfiable `n`: system
/// exhaustion and sizes beyond the address space both terminate the
/// process.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn scratchpool_alloc(n: usize) -> *mut c_void {
    ffi_guard_or!(std::ptr::null_mut(), { pool::alloc(n).cast::<c_void>() })
}

/// Return `p` to the calling thread's arena. Null is a no-op.
///
/// `p` must come from `scratchpool_alloc` on the same thread ordinal and
/// must not be used afterwards.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn scratchpool_free(p: *mut c_void) {
    ffi_guard_or!((), {
        // SAFETY: provenance of `p` is the caller's contract.
        unsafe { pool::free(p.cast()) }
    })
}

/// Poison `count` doubles at `p` if poison fill is on; otherwise a no-op.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn scratchpool_real_array_init(p: *mut f64, count: usize) -> i32 {
    ffi_guard!({
        if p.is_null() && count > 0 {
            return ScratchStatus::InvalidArgument as i32;
        }
        // SAFETY: p is valid for `count` writes per caller contract.
        unsafe { pool::fill_real_array(p, count) };
        ScratchStatus::Ok as i32
    })
}

/// Poison `count` floats at `p` if poison fill is on; otherwise a no-op.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn scratchpool_real_array_init_f32(p: *mut f32, count: usize) -> i32 {
    ffi_guard!({
        if p.is_null() && count > 0 {
            return ScratchStatus::InvalidArgument as i32;
        }
        // SAFETY: p is valid for `count` writes per caller contract.
        unsafe { pool::fill_real_array(p, count) };
        ScratchStatus::Ok as i32
    })
}

/// Turn poison fill on (`on != 0`) or off, for the live pool and the next
/// initialization.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn scratchpool_set_init_snan(on: i32) -> i32 {
    ffi_guard!({
        pool::set_poison_enabled(on != 0);
        ScratchStatus::Ok as i32
    })
}
