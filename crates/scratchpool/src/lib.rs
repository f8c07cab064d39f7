//! Scratchpool: thread-indexed pooled scratch memory for parallel
//! numerical kernels.
//!
//! This is the facade crate re-exporting the public API of the scratchpool
//! sub-crates. Most users only need this dependency.
//!
//! # Quick start
//!
//! ```rust
//! use scratchpool::prelude::*;
//!
//! let mut registry = ArenaRegistry::with_config(PoolConfig {
//!     worker_count: Some(4),
//!     warmup_bytes: 64 * 1024,
//!     ..PoolConfig::default()
//! })
//! .unwrap();
//! registry.init().unwrap();
//!
//! WorkerTeam::new(4).run(|ordinal| {
//!     let mut tmp = registry.alloc_buf::<f64>(256);
//!     tmp.fill(ordinal as f64);
//!     assert_eq!(tmp[255], ordinal as f64);
//! });
//!
//! let stats = registry.stats();
//! assert!(stats.total_mb >= stats.max_mb);
//! registry.finalize();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`runtime`] | `scratchpool-core` | Worker teams, parallel dispatch, probes, element types |
//! | [`arena`] | `scratchpool-arena` | The single-owner best-fit arena |
//! | [`engine`] | `scratchpool-engine` | Registry, statistics, poison fill, process-wide pool |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Collaborator seams (`scratchpool-core`).
///
/// [`runtime::WorkerTeam`] runs parallel regions and assigns the ordinals the
/// registry indexes by; [`runtime::ParallelFor`] is the dispatch facility for
/// device-side poison fill.
pub use scratchpool_core as runtime;

/// The per-thread sub-allocator (`scratchpool-arena`).
pub use scratchpool_arena as arena;

/// Registry, statistics, poison fill and the process-wide pool
/// (`scratchpool-engine`).
pub use scratchpool_engine as engine;

/// The process-wide pool (`scratchpool_engine::pool`).
pub use scratchpool_engine::pool;

/// Common imports for typical scratchpool usage.
///
/// ```rust
/// use scratchpool::prelude::*;
/// ```
pub mod prelude {
    // Collaborators
    pub use scratchpool_core::{
        current_ordinal, max_workers, set_max_workers, LaneDispatcher, ParallelFor,
        ProbeRegistry, Real, SerialHost, ThreadIndex, WorkerTeam,
    };

    // Arena
    pub use scratchpool_arena::{Arena, ArenaConfig, ArenaError};

    // Registry and pool
    pub use scratchpool_engine::{
        ArenaRegistry, ConfigError, FillTarget, PoisonFiller, PoolConfig, PoolStats, ScratchBuf,
        StatsAggregator,
    };
}
