//! Test utilities for scratchpool development.
//!
//! - [`init_test_logging`] installs a `tracing` subscriber that writes
//!   through the test harness's captured output.
//! - [`checksum`] hashes a float buffer bit-for-bit.
//! - [`fixtures`] holds collaborator doubles: a dispatcher that records
//!   its calls and a thread index pinned to a chosen ordinal.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{PinnedIndex, RecordingDispatch};

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber for the current test binary.
///
/// The filter comes from `RUST_LOG`, defaulting to `warn`. Safe to call
/// from every test: only the first call installs anything.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// FNV-1a over the bit patterns of `values`.
///
/// Two buffers hash equal iff they are bit-identical (up to collisions),
/// so NaN payloads and signed zeros are distinguished.
pub fn checksum(values: &[f64]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    values.iter().fold(OFFSET, |hash, v| {
        v.to_bits()
            .to_le_bytes()
            .iter()
            .fold(hash, |h, &b| (h ^ u64::from(b)).wrapping_mul(PRIME))
    })
}

/// Deterministic test pattern: element `i` of buffer `seed`.
pub fn pattern(seed: usize, i: usize) -> f64 {
    (seed * 1_000_003 + i) as f64 * 0.5
}
