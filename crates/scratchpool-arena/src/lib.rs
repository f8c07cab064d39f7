//! Per-thread sub-allocator for scratchpool.
//!
//! An [`Arena`] hands out aligned byte ranges carved from a small number of
//! heap chunks. It is owned and mutated by exactly one thread; nothing in
//! this crate synchronises. Outside tests, the only `unsafe` code in this
//! crate lives in `raw.rs`, which owns the heap chunks. `scratchpool-engine`
//! and `scratchpool-ffi` carry their own `unsafe` blocks.
//!
//! # Architecture
//!
//! ```text
//! Arena
//! ├── Chunk[] (aligned heap segments, grown geometrically)
//! │   └── head BlockId (block at offset 0, stable for the chunk's life)
//! ├── BlockTable (index-addressed Block records, prev/next by BlockId)
//! ├── FreeIndex (BTreeSet of (size, address, BlockId) for best-fit)
//! └── live map (address → BlockId for outstanding pointers)
//! ```
//!
//! # Invariants
//!
//! - The blocks of each chunk partition it exactly, in address order.
//! - Every block in the free index is free, and every free block is in it.
//! - After any `free` completes, no two free blocks are adjacent.
//! - Each live block corresponds to exactly one outstanding pointer.
//!
//! [`Arena::check_invariants`] verifies all four.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
mod block;
pub mod config;
pub mod error;
mod free_index;
mod raw;

// Public re-exports for the primary API surface.
pub use arena::{Arena, ArenaUsage};
pub use config::ArenaConfig;
pub use error::ArenaError;
