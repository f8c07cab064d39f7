//! C-compatible status codes.
//!
//! [`ScratchStatus`] is a `repr(i32)` enum returned by every status-valued
//! FFI function. `Ok` is zero and every error is negative.

use scratchpool_engine::ConfigError;

/// C-compatible status code. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScratchStatus {
    /// Success.
    Ok = 0,
    /// A required pointer argument is null, or a count is out of range.
    InvalidArgument = -1,
    /// The pool configuration (environment or explicit) is invalid.
    ConfigError = -2,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&ConfigError> for ScratchStatus {
    fn from(_: &ConfigError) -> Self {
        ScratchStatus::ConfigError
    }
}

impl From<Result<(), ConfigError>> for ScratchStatus {
    fn from(result: Result<(), ConfigError>) -> Self {
        match result {
            Ok(()) => ScratchStatus::Ok,
            Err(ref e) => e.into(),
        }
    }
}
