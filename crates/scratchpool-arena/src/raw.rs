//! Low-level primitives for arena memory operations.
//!
//! The only `unsafe` in this crate. [`RawChunk`] owns one aligned
//! allocation obtained from the global allocator and releases it on drop.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// One aligned heap segment.
pub(crate) struct RawChunk {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: RawChunk uniquely owns its allocation; moving it to another
// thread moves that ownership with it.
unsafe impl Send for RawChunk {}

impl RawChunk {
    /// Allocate `size` bytes aligned to `align`.
    ///
    /// Exhaustion is fatal: the process is terminated through
    /// [`alloc::handle_alloc_error`] rather than returning to a caller that
    /// does not expect failure. A size too large to form a layout is fatal
    /// the same way, see [`unsatisfiable`].
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub(crate) fn allocate(size: usize, align: usize) -> Self {
        assert!(size > 0, "chunk size must be non-zero");
        let Ok(layout) = Layout::from_size_align(size, align) else {
            unsatisfiable(size, align)
        };
        // SAFETY: layout has non-zero size (asserted above).
        let raw = unsafe { alloc::alloc(layout) };
        match NonNull::new(raw) {
            Some(ptr) => Self { ptr, layout },
            None => {
                tracing::error!(size, align, "system allocator exhausted while growing arena");
                alloc::handle_alloc_error(layout)
            }
        }
    }

    /// Size of the chunk in bytes.
    pub(crate) fn size(&self) -> usize {
        self.layout.size()
    }

    /// Address of the first byte.
    pub(crate) fn base_addr(&self) -> usize {
        self.ptr.as_ptr().addr()
    }

    /// Whether `addr` lies inside this chunk.
    #[cfg(test)]
    pub(crate) fn contains(&self, addr: usize) -> bool {
        let base = self.base_addr();
        addr >= base && addr - base < self.size()
    }

    /// Pointer to the byte at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is past the end of the chunk.
    pub(crate) fn ptr_at(&self, offset: usize) -> *mut u8 {
        assert!(offset <= self.size(), "offset {offset} outside chunk");
        // SAFETY: offset is within (or one past) the allocation.
        unsafe { self.ptr.as_ptr().add(offset) }
    }

    /// Zero `len` bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range is not inside the chunk.
    pub(crate) fn zero(&mut self, offset: usize, len: usize) {
        let end = offset.checked_add(len).expect("range overflow");
        assert!(end <= self.size(), "range {offset}..{end} outside chunk");
        // SAFETY: the range lies inside our exclusively owned allocation and
        // `&mut self` rules out concurrent access through this chunk.
        unsafe { std::ptr::write_bytes(self.ptr.as_ptr().add(offset), 0, len) };
    }

    /// Read the byte at `offset`. Test-only view into the backing storage.
    #[cfg(test)]
    pub(crate) fn byte_at(&self, offset: usize) -> u8 {
        assert!(offset < self.size());
        // SAFETY: offset is inside the allocation. The byte may never have
        // been written, so tests only call this on zeroed ranges.
        unsafe { self.ptr.as_ptr().add(offset).read() }
    }
}

/// Terminate the process for a request no allocator could satisfy.
///
/// Used when `size` bytes at `align` overflow the address space. Such a
/// request is treated like exhaustion: it is logged, then the process
/// aborts, so no caller ever sees a null or a partial allocation.
pub(crate) fn unsatisfiable(size: usize, align: usize) -> ! {
    tracing::error!(size, align, "scratch request exceeds the address space");
    std::process::abort()
}

impl Drop for RawChunk {
    fn drop(&mut self) {
        // SAFETY: ptr was returned by `alloc::alloc` with exactly this layout
        // and has not been freed.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_aligned() {
        for align in [8, 16, 64, 4096] {
            let chunk = RawChunk::allocate(1024, align);
            assert_eq!(chunk.base_addr() % align, 0);
            assert_eq!(chunk.size(), 1024);
        }
    }

    #[test]
    fn contains_covers_exactly_the_chunk() {
        let chunk = RawChunk::allocate(256, 16);
        let base = chunk.base_addr();
        assert!(chunk.contains(base));
        assert!(chunk.contains(base + 255));
        assert!(!chunk.contains(base + 256));
        assert!(!chunk.contains(base.wrapping_sub(1)));
    }

    #[test]
    fn zero_clears_range() {
        let mut chunk = RawChunk::allocate(128, 16);
        chunk.zero(0, 128);
        assert!((0..128).all(|i| chunk.byte_at(i) == 0));
    }

    #[test]
    #[should_panic(expected = "outside chunk")]
    fn zero_out_of_bounds_panics() {
        let mut chunk = RawChunk::allocate(64, 16);
        chunk.zero(32, 64);
    }
}
