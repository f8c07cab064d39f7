//! Benchmark profiles and workloads for scratchpool.
//!
//! - [`kernel_profile`]: registry configuration used by the pool benches.
//! - [`scratch_sizes`]: a deterministic stream of scratch-buffer sizes
//!   shaped like stencil-kernel temporaries.
//! - [`churn`]: one alloc/touch/free cycle over a size stream.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use scratchpool_engine::{ArenaRegistry, PoolConfig};

/// Registry configuration for benchmarks: `workers` arenas with a 1 MiB
/// warm-up each and poison fill off.
pub fn kernel_profile(workers: usize) -> PoolConfig {
    PoolConfig {
        worker_count: Some(workers),
        warmup_bytes: 1024 * 1024,
        ..PoolConfig::default()
    }
}

/// Generate `n` element counts in `[16, max_elems]` from `seed`.
///
/// Sizes cluster around powers of two the way tile-local temporaries do,
/// with a deterministic jitter so best-fit sees non-identical requests.
pub fn scratch_sizes(n: usize, max_elems: usize, seed: u64) -> Vec<usize> {
    let max_elems = max_elems.max(16);
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let bits = (state >> 33) as usize;
            let shift = bits % 12;
            let base = 16usize << shift;
            let jitter = (bits >> 4) % (base / 4 + 1);
            (base + jitter).min(max_elems)
        })
        .collect()
}

/// Allocate a buffer per size, write its first and last element, then free
/// them in reverse order. Returns a value derived from the writes.
pub fn churn(registry: &ArenaRegistry, sizes: &[usize]) -> f64 {
    let mut bufs = Vec::with_capacity(sizes.len());
    let mut acc = 0.0;
    for (k, &len) in sizes.iter().enumerate() {
        let mut buf = registry.alloc_buf::<f64>(len);
        buf[0] = k as f64;
        buf[len - 1] = 1.0;
        acc += buf[0] + buf[len - 1];
        bufs.push(buf);
    }
    while bufs.pop().is_some() {}
    acc
}
