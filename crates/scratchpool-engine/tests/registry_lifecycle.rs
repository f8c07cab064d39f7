//! Integration test: registry init / alloc / finalize lifecycle.
//!
//! Covers idempotent init, the round trip without growth, reset through
//! finalize, routing through a pinned thread index, and agreement between
//! the stats summary, the published footprints and the usage probe.

use std::sync::Arc;

use scratchpool_core::{ProbeRegistry, SerialHost};
use scratchpool_engine::{ArenaRegistry, PoolConfig, PoolStats, StatsAggregator, PROBE_NAME};
use scratchpool_test_utils::{init_test_logging, PinnedIndex};

const MB: usize = 1024 * 1024;

fn config(workers: usize) -> PoolConfig {
    PoolConfig {
        worker_count: Some(workers),
        warmup_bytes: 256 * 1024,
        ..PoolConfig::default()
    }
}

fn pinned(workers: usize, ordinal: usize) -> (ArenaRegistry, Arc<PinnedIndex>) {
    let index = Arc::new(PinnedIndex::new(ordinal, workers));
    let mut reg = ArenaRegistry::new(config(workers), index.clone(), Arc::new(SerialHost)).unwrap();
    reg.init().unwrap();
    (reg, index)
}

#[test]
fn double_init_equals_single_init() {
    init_test_logging();
    let mut once = ArenaRegistry::with_config(config(3)).unwrap();
    once.init().unwrap();

    let mut twice = ArenaRegistry::with_config(config(3)).unwrap();
    twice.init().unwrap();
    twice.init().unwrap();

    assert_eq!(once.arena_count(), twice.arena_count());
    assert_eq!(once.footprints(), twice.footprints());
}

#[test]
fn eight_byte_round_trip_reuses_warm_block() {
    init_test_logging();
    let (reg, _) = pinned(1, 0);
    let before = reg.footprints();

    let p = reg.alloc(8);
    assert!(!p.is_null());
    assert_eq!(p.addr() % 8, 0);
    unsafe { reg.free(p) };

    assert_eq!(reg.footprints(), before);
}

#[test]
fn round_trips_without_growth_leave_footprint_unchanged() {
    let (reg, _) = pinned(1, 0);
    let before = reg.footprints()[0];
    for n in [1, 7, 8, 100, 4096, 100_000, 256 * 1024] {
        let p = reg.alloc(n);
        unsafe { reg.free(p) };
        assert_eq!(reg.footprints()[0], before, "n = {n}");
    }
}

#[test]
fn finalize_then_init_restores_post_init_state() {
    init_test_logging();
    let (mut reg, _) = pinned(2, 1);
    let post_init = reg.footprints();

    let _outstanding = reg.alloc(5 * MB);
    assert!(reg.footprints()[1] > post_init[1]);

    reg.finalize();
    assert!(reg.footprints().iter().all(|&fp| fp == 0));
    assert_eq!(reg.stats(), PoolStats::default());

    reg.init().unwrap();
    assert_eq!(reg.footprints(), post_init);
    reg.check_invariants().unwrap();
}

#[test]
fn pinned_index_routes_to_chosen_arena() {
    let (reg, index) = pinned(3, 2);
    let p = reg.alloc(64);
    assert_eq!(reg.arena_usage(2).unwrap().live_blocks, 1);
    assert_eq!(reg.arena_usage(0).unwrap().live_blocks, 0);
    unsafe { reg.free(p) };

    index.set(0);
    let q = reg.alloc(64);
    assert_eq!(reg.arena_usage(0).unwrap().live_blocks, 1);
    unsafe { reg.free(q) };
}

#[test]
fn stats_agree_with_footprints_and_probe() {
    let (reg, index) = pinned(3, 0);
    let a = reg.alloc(3 * MB);
    index.set(2);
    let b = reg.alloc(6 * MB);

    let fps = reg.footprints();
    assert_eq!(reg.stats(), StatsAggregator::reduce(fps.iter().copied()));

    let mut probes = ProbeRegistry::new();
    reg.register_probe(&mut probes);
    let reading = probes.read(PROBE_NAME).unwrap();
    assert_eq!(reading.current_bytes, fps.iter().sum::<usize>() as u64);

    unsafe { reg.free(b) };
    index.set(0);
    unsafe { reg.free(a) };
}

#[test]
fn zero_warmup_leaves_arenas_empty() {
    let mut reg = ArenaRegistry::with_config(PoolConfig {
        warmup_bytes: 0,
        ..config(2)
    })
    .unwrap();
    reg.init().unwrap();
    assert_eq!(reg.footprints(), vec![0, 0]);
    assert_eq!(reg.stats(), PoolStats::default());
}
