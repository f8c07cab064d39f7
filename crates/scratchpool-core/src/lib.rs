//! Collaborator seams for the scratchpool workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! facilities the pooled allocator consumes but does not own:
//!
//! - [`team`]: worker teams and the "current worker ordinal" lookup.
//! - [`exec`]: per-element parallel dispatch, host or accelerator-like.
//! - [`probe`]: a named registry of memory-usage probes for profilers.
//! - [`real`]: the floating-point element types the pool can poison.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod exec;
pub mod probe;
pub mod real;
pub mod team;

pub use exec::{LaneDispatcher, ParallelFor, SerialHost};
pub use probe::{MemoryProbe, ProbeReading, ProbeRegistry};
pub use real::{ElementWidth, Real, SNAN_F32_BITS, SNAN_F64_BITS};
pub use team::{
    current_ordinal, in_parallel_region, max_workers, set_max_workers, TeamIndex, ThreadIndex,
    WorkerTeam,
};
