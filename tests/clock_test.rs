//! Integration tests for the version clock.
//!
//! These tests run the clock against the real system time and check the
//! ordering and decoding guarantees registry writes rely on.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use registry_backbone::{ClockOptions, VersionClock, VersionLayout};

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

#[test]
fn test_sequential_ids_strictly_increase() {
    let clock = VersionClock::new();
    let mut last = clock.next_id().unwrap();

    for _ in 0..50_000 {
        let next = clock.next_id().unwrap();
        assert!(next > last, "{} should be greater than {}", next, last);
        last = next;
    }
}

#[test]
fn test_decoded_timestamp_is_within_call_bracket() {
    let clock = VersionClock::new();

    for _ in 0..1_000 {
        let start = now_millis();
        let id = clock.next_id().unwrap();
        let end = now_millis();

        let ts = clock.real_timestamp(id);
        assert!(ts >= start);
        assert!(ts <= end);
    }
}

#[test]
fn test_until_next_millis() {
    let clock = VersionClock::new();
    let timestamp = now_millis();

    let millis = clock.until_next_millis(timestamp + 100);
    assert!(millis > timestamp + 100);
    assert!(millis <= now_millis());
}

#[test]
fn test_concurrent_callers_get_distinct_ids() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 5_000;

    let clock = Arc::new(VersionClock::new());
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let clock = Arc::clone(&clock);
            thread::spawn(move || {
                let mut issued = Vec::with_capacity(PER_THREAD);
                for _ in 0..PER_THREAD {
                    let start = now_millis();
                    let id = clock.next_id().unwrap();
                    let end = now_millis();
                    issued.push((start, id, end));
                }
                issued
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        let issued = handle.join().unwrap();
        // Each caller observes its own ids in increasing order.
        for pair in issued.windows(2) {
            assert!(pair[0].1 < pair[1].1);
        }
        for (start, id, end) in issued {
            let ts = clock.real_timestamp(id);
            assert!(start <= ts && ts <= end);
            assert!(seen.insert(id), "duplicate id {}", id);
        }
    }
    assert_eq!(seen.len(), THREADS * PER_THREAD);
}

#[test]
fn test_node_discriminated_clocks_never_collide() {
    let layout = VersionLayout::with_node_bits(3);
    let clocks: Vec<_> = (0..4)
        .map(|node_id| {
            VersionClock::with_options(ClockOptions {
                layout,
                node_id,
                ..ClockOptions::default()
            })
            .unwrap()
        })
        .collect();

    let mut seen = HashSet::new();
    for _ in 0..2_000 {
        for clock in &clocks {
            let id = clock.next_id().unwrap();
            assert!(seen.insert(id));
            assert_eq!(layout.node_of(id), clock.node_id());
        }
    }
}

#[test]
fn test_real_time_matches_real_timestamp() {
    let clock = VersionClock::new();
    let id = clock.next_id().unwrap();

    let time = id.real_time(&clock.layout()).unwrap();
    assert_eq!(time.timestamp_millis() as u64, clock.real_timestamp(id));
}
