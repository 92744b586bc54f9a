//! Performance benchmarks for the version clock and the broadcaster.
//!
//! This module benchmarks:
//! - Single-threaded id issuance
//! - Contended id issuance across threads
//! - Fan-out to in-process peers
//!
//! Run with: cargo bench

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use registry_backbone::{BroadcasterConfig, PeerBroadcaster, PeerOutcome, PeerTarget, VersionClock};

/// Benchmark uncontended next_id
fn bench_next_id(c: &mut Criterion) {
    let clock = VersionClock::new();
    c.bench_function("next_id", |b| b.iter(|| black_box(clock.next_id().unwrap())));
}

/// Benchmark next_id with several threads contending for the lock
fn bench_contended_next_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_next_id");
    const PER_THREAD: usize = 10_000;

    for threads in [2usize, 4, 8].iter() {
        group.throughput(Throughput::Elements((threads * PER_THREAD) as u64));
        group.bench_with_input(BenchmarkId::new("threads", threads), threads, |b, &threads| {
            b.iter(|| {
                let clock = Arc::new(VersionClock::new());
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let clock = Arc::clone(&clock);
                        thread::spawn(move || {
                            for _ in 0..PER_THREAD {
                                black_box(clock.next_id().unwrap());
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }
    group.finish();
}

/// Benchmark broadcasting to peers that answer immediately
fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let broadcaster = PeerBroadcaster::new(BroadcasterConfig::default());

    for size in [1u16, 10, 100].iter() {
        let peers: Vec<_> = (0..*size).map(|i| PeerTarget::new("127.0.0.1", 9000 + i)).collect();
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("peers", size), &peers, |b, peers| {
            b.iter(|| {
                runtime.block_on(broadcaster.broadcast(
                    peers.clone(),
                    |_peer| async { PeerOutcome::Success },
                    Duration::from_secs(3),
                ))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_next_id, bench_contended_next_id, bench_broadcast);
criterion_main!(benches);
