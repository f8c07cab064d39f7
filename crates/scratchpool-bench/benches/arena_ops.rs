//! Criterion micro-benchmarks for the single-thread arena.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use scratchpool_arena::{Arena, ArenaConfig};
use scratchpool_bench::scratch_sizes;

/// Warm arena holding one 8 MiB chunk.
fn warm_arena() -> Arena {
    let mut arena = Arena::new(ArenaConfig::default()).unwrap();
    arena.prefault(8 * 1024 * 1024);
    arena
}

/// Benchmark: one small alloc/free pair served from the warm block.
fn bench_alloc_free_small(c: &mut Criterion) {
    let mut arena = warm_arena();
    c.bench_function("arena_alloc_free_64", |b| {
        b.iter(|| {
            let p = arena.alloc(black_box(64));
            arena.free(black_box(p));
        });
    });
}

/// Benchmark: 256 mixed-size allocations, freed in reverse order.
fn bench_mixed_lifo(c: &mut Criterion) {
    let mut arena = warm_arena();
    let sizes: Vec<usize> = scratch_sizes(256, 8192, 42)
        .into_iter()
        .map(|n| n * 8)
        .collect();
    let mut ptrs = Vec::with_capacity(sizes.len());
    c.bench_function("arena_mixed_lifo_256", |b| {
        b.iter(|| {
            for &n in &sizes {
                ptrs.push(arena.alloc(n));
            }
            while let Some(p) = ptrs.pop() {
                arena.free(p);
            }
        });
    });
}

/// Benchmark: 256 mixed-size allocations, every other one freed first so
/// the free index holds many fragments.
fn bench_mixed_interleaved(c: &mut Criterion) {
    let mut arena = warm_arena();
    let sizes: Vec<usize> = scratch_sizes(256, 8192, 7)
        .into_iter()
        .map(|n| n * 8)
        .collect();
    let mut ptrs = Vec::with_capacity(sizes.len());
    c.bench_function("arena_mixed_interleaved_256", |b| {
        b.iter(|| {
            for &n in &sizes {
                ptrs.push(arena.alloc(n));
            }
            for p in ptrs.iter().step_by(2) {
                arena.free(*p);
            }
            for p in ptrs.iter().skip(1).step_by(2) {
                arena.free(*p);
            }
            ptrs.clear();
        });
    });
}

/// Benchmark: the system allocator on the same LIFO workload, for scale.
fn bench_system_lifo(c: &mut Criterion) {
    let sizes = scratch_sizes(256, 8192, 42);
    c.bench_function("system_vec_lifo_256", |b| {
        b.iter(|| {
            let mut bufs: Vec<Vec<f64>> = Vec::with_capacity(sizes.len());
            for &n in &sizes {
                bufs.push(Vec::with_capacity(n));
            }
            black_box(&mut bufs);
            while bufs.pop().is_some() {}
        });
    });
}

criterion_group!(
    benches,
    bench_alloc_free_small,
    bench_mixed_lifo,
    bench_mixed_interleaved,
    bench_system_lifo
);
criterion_main!(benches);
