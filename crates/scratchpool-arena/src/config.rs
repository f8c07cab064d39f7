//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for a single [`Arena`](crate::Arena).
///
/// Validated at construction; all values are immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Alignment of every returned pointer, in bytes.
    ///
    /// Default: 16. Must be a power of two between 8 (the width of `f64`)
    /// and 4096. Every block size is rounded up to a multiple of this.
    pub alignment: usize,

    /// Smallest chunk the arena requests from the system allocator.
    ///
    /// Default: 1 MiB. Growth requests are
    /// `max(request, footprint, min_chunk_bytes)`, so the footprint at
    /// least doubles each time a new chunk is needed.
    pub min_chunk_bytes: usize,
}

impl ArenaConfig {
    /// Default pointer alignment in bytes.
    pub const DEFAULT_ALIGNMENT: usize = 16;

    /// Default minimum chunk size: 1 MiB.
    pub const DEFAULT_MIN_CHUNK_BYTES: usize = 1 << 20;

    /// Smallest accepted alignment: the width of the widest float type.
    pub const MIN_ALIGNMENT: usize = std::mem::align_of::<f64>();

    /// Largest accepted alignment.
    pub const MAX_ALIGNMENT: usize = 4096;

    /// Check every field against its documented range.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !self.alignment.is_power_of_two()
            || self.alignment < Self::MIN_ALIGNMENT
            || self.alignment > Self::MAX_ALIGNMENT
        {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "alignment must be a power of two in [{}, {}], got {}",
                    Self::MIN_ALIGNMENT,
                    Self::MAX_ALIGNMENT,
                    self.alignment
                ),
            });
        }
        if self.min_chunk_bytes < self.alignment {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "min_chunk_bytes ({}) must be at least the alignment ({})",
                    self.min_chunk_bytes, self.alignment
                ),
            });
        }
        if self.min_chunk_bytes > isize::MAX as usize / 2 {
            return Err(ArenaError::InvalidConfig {
                reason: format!("min_chunk_bytes {} is too large", self.min_chunk_bytes),
            });
        }
        Ok(())
    }

    /// Round `n` up to a multiple of the alignment, or `None` on overflow.
    pub fn round_up(&self, n: usize) -> Option<usize> {
        let mask = self.alignment - 1;
        n.checked_add(mask).map(|v| v & !mask)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            alignment: Self::DEFAULT_ALIGNMENT,
            min_chunk_bytes: Self::DEFAULT_MIN_CHUNK_BYTES,
        }
    }
}
