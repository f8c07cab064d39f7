//! Signaling-NaN poison fill for new floating-point buffers.
//!
//! [`PoisonFiller`] writes [`SNAN_F64_BITS`] into every 64-bit element or
//! [`SNAN_F32_BITS`] into every 32-bit element of a buffer, so that reads
//! of never-written elements surface as NaNs (or traps) downstream.
//!
//! The work runs under one of two strategies, chosen at runtime:
//!
//! - [`FillStrategy::HostSequential`]: one pass on the calling thread.
//! - [`FillStrategy::DeviceDispatch`]: one per-element operation submitted
//!   to the [`ParallelFor`] dispatcher. Used only when the dispatcher is an
//!   accelerator *and* the caller asked for [`FillTarget::Device`].

#![allow(unsafe_code)]

use std::fmt;
use std::sync::Arc;

use scratchpool_core::{ElementWidth, ParallelFor, Real, SerialHost, SNAN_F32_BITS, SNAN_F64_BITS};

/// Where the caller wants the fill to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillTarget {
    /// Fill on the host, sequentially.
    #[default]
    Host,
    /// Fill through the accelerator dispatcher, if there is one.
    Device,
}

/// The fill implementation selected for one call.
#[derive(Clone, Copy)]
pub enum FillStrategy<'a> {
    /// Sequential host pass.
    HostSequential,
    /// Per-element parallel operations on an accelerator dispatcher.
    DeviceDispatch(&'a dyn ParallelFor),
}

impl<'a> FillStrategy<'a> {
    /// Pick the strategy for `target` given the active dispatcher.
    pub fn select(dispatch: &'a dyn ParallelFor, target: FillTarget) -> Self {
        match target {
            FillTarget::Device if dispatch.is_accelerator() => Self::DeviceDispatch(dispatch),
            _ => Self::HostSequential,
        }
    }

    /// Whether this is the dispatched variant.
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::DeviceDispatch(_))
    }
}

impl fmt::Debug for FillStrategy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostSequential => f.write_str("HostSequential"),
            Self::DeviceDispatch(d) => f
                .debug_struct("DeviceDispatch")
                .field("lanes", &d.lanes())
                .finish(),
        }
    }
}

/// Raw destination shared with dispatched per-element operations.
///
/// Each index is written by exactly one operation, so no two lanes touch
/// the same element.
struct SharedDst<B>(*mut B);

// SAFETY: lanes write disjoint elements; see `fill_bits`.
unsafe impl<B: Send> Send for SharedDst<B> {}
// SAFETY: as above.
unsafe impl<B: Send> Sync for SharedDst<B> {}

impl<B> SharedDst<B> {
    fn get(&self) -> *mut B {
        self.0
    }
}

/// Writes the poison pattern into floating-point buffers.
#[derive(Clone)]
pub struct PoisonFiller {
    dispatch: Arc<dyn ParallelFor>,
}

impl PoisonFiller {
    /// A filler submitting device fills to `dispatch`.
    pub fn new(dispatch: Arc<dyn ParallelFor>) -> Self {
        Self { dispatch }
    }

    /// A filler with a sequential host dispatcher; device requests fall
    /// back to the host.
    pub fn host() -> Self {
        Self::new(Arc::new(SerialHost))
    }

    /// The active dispatcher.
    pub fn dispatch(&self) -> &dyn ParallelFor {
        &*self.dispatch
    }

    /// The strategy a fill with `target` would use.
    pub fn strategy(&self, target: FillTarget) -> FillStrategy<'_> {
        FillStrategy::select(&*self.dispatch, target)
    }

    /// Poison `count` elements of `width` starting at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of `count * width.bytes()` bytes,
    /// aligned to `width.bytes()`, and not accessed by anyone else for the
    /// duration of the call. A null `ptr` is accepted when `count == 0`.
    pub unsafe fn fill_raw(&self, ptr: *mut u8, count: usize, width: ElementWidth, target: FillTarget) {
        if count == 0 {
            return;
        }
        let strategy = self.strategy(target);
        // SAFETY: forwarded from the caller.
        unsafe {
            match width {
                ElementWidth::F64 => fill_bits(ptr.cast::<u64>(), count, SNAN_F64_BITS, strategy),
                ElementWidth::F32 => fill_bits(ptr.cast::<u32>(), count, SNAN_F32_BITS, strategy),
            }
        }
    }

    /// Poison every element of `buf`.
    pub fn fill_slice<T: Real>(&self, buf: &mut [T], target: FillTarget) {
        // SAFETY: the slice is valid, aligned and exclusively borrowed.
        unsafe { self.fill_raw(buf.as_mut_ptr().cast(), buf.len(), T::WIDTH, target) }
    }
}

impl Default for PoisonFiller {
    fn default() -> Self {
        Self::host()
    }
}

impl fmt::Debug for PoisonFiller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoisonFiller")
            .field("accelerator", &self.dispatch.is_accelerator())
            .field("lanes", &self.dispatch.lanes())
            .finish()
    }
}

/// # Safety
///
/// `ptr` must be valid for `count` aligned writes of `B`.
unsafe fn fill_bits<B: Copy + Send + Sync>(ptr: *mut B, count: usize, bits: B, strategy: FillStrategy<'_>) {
    match strategy {
        FillStrategy::HostSequential => {
            for i in 0..count {
                // SAFETY: i < count.
                unsafe { ptr.add(i).write(bits) };
            }
        }
        FillStrategy::DeviceDispatch(dispatch) => {
            let dst = SharedDst(ptr);
            // SAFETY: parallel_for calls the body once per i < count, and
            // each call writes only element i.
            dispatch.parallel_for(count, &|i| unsafe { dst.get().add(i).write(bits) });
        }
    }
}
