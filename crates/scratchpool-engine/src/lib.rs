//! Thread-indexed scratch memory pool.
//!
//! This crate turns the single-owner [`Arena`](scratchpool_arena::Arena)
//! into a pool usable from parallel regions:
//!
//! - [`ArenaRegistry`] holds one arena per worker ordinal and routes each
//!   `alloc`/`free` to the caller's arena without locking.
//! - [`StatsAggregator`] and [`FootprintBoard`] summarise per-arena
//!   footprints across threads.
//! - [`PoisonFiller`] marks new floating-point arrays with a signaling NaN
//!   so reads of unwritten elements are caught.
//! - [`ScratchBuf`] is the RAII face of an allocation.
//! - [`pool`] wraps one process-wide registry behind free functions.
//!
//! # Threading
//!
//! Arena `k` is mutated only by the thread currently holding ordinal `k`.
//! Published footprints are relaxed atomics: readers see values that may
//! trail the owner by one operation. `init` and `finalize` must not
//! overlap any other pool operation.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod poison;
pub mod pool;
pub mod registry;
pub mod stats;

pub use buffer::ScratchBuf;
pub use config::{ConfigError, PoolConfig};
pub use poison::{FillStrategy, FillTarget, PoisonFiller};
pub use registry::{ArenaRegistry, PROBE_NAME};
pub use stats::{FootprintBoard, PoolStats, StatsAggregator, BYTES_PER_MB};
