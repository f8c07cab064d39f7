//! Owned scratch buffers.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use scratchpool_core::Real;

use crate::registry::ArenaRegistry;

/// A `[T]` living in one worker's arena, returned to it on drop.
///
/// Created by [`ArenaRegistry::alloc_buf`] or [`pool::scratch`](crate::pool::scratch).
/// The buffer remembers the ordinal that allocated it and frees through
/// that arena. It is neither `Send` nor `Sync`: it never leaves the thread
/// that created it.
pub struct ScratchBuf<'r, T: Real> {
    registry: &'r ArenaRegistry,
    ordinal: usize,
    ptr: NonNull<T>,
    len: usize,
    _owns: PhantomData<T>,
}

impl<'r, T: Real> ScratchBuf<'r, T> {
    /// # Safety
    ///
    /// `ptr` must be an allocation of `len` elements of `T` from arena
    /// `ordinal` of `registry`, owned by nobody else, or dangling with
    /// `len == 0`. The caller must initialize the contents before exposing
    /// the buffer.
    pub(crate) unsafe fn from_raw_parts(
        registry: &'r ArenaRegistry,
        ordinal: usize,
        ptr: NonNull<T>,
        len: usize,
    ) -> Self {
        Self {
            registry,
            ordinal,
            ptr,
            len,
            _owns: PhantomData,
        }
    }

    /// Ordinal of the arena holding this buffer.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Pointer to the first element.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Mutable pointer to the first element.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }
}

impl<T: Real> Deref for ScratchBuf<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: `ptr` covers `len` initialized elements owned by `self`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Real> DerefMut for ScratchBuf<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: as in `deref`, and `&mut self` is exclusive.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Real> Drop for ScratchBuf<'_, T> {
    fn drop(&mut self) {
        if self.len > 0 {
            self.registry
                .free_at(self.ordinal, self.ptr.as_ptr().cast());
        }
    }
}

impl<T: Real + fmt::Debug> fmt::Debug for ScratchBuf<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchBuf")
            .field("ordinal", &self.ordinal)
            .field("len", &self.len)
            .finish()
    }
}
