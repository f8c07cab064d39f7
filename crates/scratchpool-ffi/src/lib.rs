//! C FFI bindings for the process-wide scratchpool.
//!
//! Exposes the `pool` entry points of `scratchpool-engine` with a C ABI.
//! Status-valued functions return [`ScratchStatus`] codes as `i32`;
//! pointer-valued functions return null on failure. Panics never cross the
//! boundary: they are caught and reported as [`ScratchStatus::Panicked`].
//!
//! A C header is generated into `include/scratchpool.h` by the build
//! script.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run a status-returning body, converting a panic into
/// `ScratchStatus::Panicked`.
macro_rules! ffi_guard {
    ($body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| -> i32 { $body })) {
            Ok(code) => code,
            Err(_) => {
                tracing::error!("panic caught at the FFI boundary");
                $crate::status::ScratchStatus::Panicked as i32
            }
        }
    };
}

/// Like `ffi_guard!`, for bodies returning a value with a fallback on
/// panic.
macro_rules! ffi_guard_or {
    ($fallback:expr, $body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(value) => value,
            Err(_) => {
                tracing::error!("panic caught at the FFI boundary");
                $fallback
            }
        }
    };
}

pub mod lifecycle;
pub mod memory;
pub mod status;

pub use lifecycle::{scratchpool_finalize, scratchpool_get_stats, scratchpool_init, ScratchStats};
pub use memory::{
    scratchpool_alloc, scratchpool_free, scratchpool_real_array_init,
    scratchpool_real_array_init_f32, scratchpool_set_init_snan,
};
pub use status::ScratchStatus;
