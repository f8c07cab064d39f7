//! Per-element parallel dispatch.
//!
//! [`ParallelFor`] is the dispatch facility the poison filler submits work
//! to. [`SerialHost`] runs every index on the calling thread;
//! [`LaneDispatcher`] stands in for an accelerator by spreading contiguous
//! index ranges across lanes executed on scoped threads.

/// Executes a per-index operation over `0..n`.
pub trait ParallelFor: Send + Sync {
    /// Whether this dispatcher targets a parallel accelerator.
    fn is_accelerator(&self) -> bool;

    /// Number of lanes work is spread across (1 for sequential dispatch).
    fn lanes(&self) -> usize;

    /// Run `body(i)` for every `i` in `0..n`. Returns once all calls have
    /// completed. Call order across lanes is unspecified.
    fn parallel_for(&self, n: usize, body: &(dyn Fn(usize) + Sync));
}

/// Sequential host execution.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialHost;

impl ParallelFor for SerialHost {
    fn is_accelerator(&self) -> bool {
        false
    }

    fn lanes(&self) -> usize {
        1
    }

    fn parallel_for(&self, n: usize, body: &(dyn Fn(usize) + Sync)) {
        (0..n).for_each(body);
    }
}

/// Accelerator-style dispatch across a fixed number of lanes.
#[derive(Clone, Copy, Debug)]
pub struct LaneDispatcher {
    lanes: usize,
}

impl LaneDispatcher {
    /// Create a dispatcher with `lanes` lanes. Zero is clamped to 1.
    pub fn new(lanes: usize) -> Self {
        Self {
            lanes: lanes.max(1),
        }
    }
}

impl ParallelFor for LaneDispatcher {
    fn is_accelerator(&self) -> bool {
        true
    }

    fn lanes(&self) -> usize {
        self.lanes
    }

    fn parallel_for(&self, n: usize, body: &(dyn Fn(usize) + Sync)) {
        if n == 0 {
            return;
        }
        let lanes = self.lanes.min(n);
        if lanes == 1 {
            (0..n).for_each(body);
            return;
        }
        let per_lane = n.div_ceil(lanes);
        std::thread::scope(|scope| {
            for lane in 1..lanes {
                let start = lane * per_lane;
                let end = (start + per_lane).min(n);
                if start >= end {
                    continue;
                }
                scope.spawn(move || (start..end).for_each(body));
            }
            (0..per_lane).for_each(body);
        });
    }
}
