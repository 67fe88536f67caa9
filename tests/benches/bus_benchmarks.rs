//! # Tempest Bus Benchmarks
//!
//! | Component | Operation | Target |
//! |-----------|-----------|--------|
//! | BoundedQueue | push + pop, uncontended | < 1µs |
//! | BroadcastHub | publish to N reliable subscribers | linear in N |
//! | BroadcastHub | publish to lagging lossy subscribers | never blocks |
//! | IdentityRegistry | rebind + get | < 1µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempest_bus::{BoundedQueue, BroadcastHub, DeliveryPolicy};
use tempest_session::IdentityRegistry;

// ============================================================================
// BoundedQueue
// ============================================================================

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounded-queue");

    let queue = BoundedQueue::new(1024);
    group.bench_function("push_pop_uncontended", |b| {
        b.iter(|| {
            queue.push(black_box(42u64));
            black_box(queue.pop())
        })
    });

    group.throughput(Throughput::Elements(10_000));
    group.bench_function("spsc_10k", |b| {
        b.iter(|| {
            let queue = Arc::new(BoundedQueue::new(64));
            let consumer = {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut sum = 0u64;
                    while let Some(v) = queue.pop() {
                        sum += v;
                    }
                    sum
                })
            };
            for v in 0..10_000u64 {
                queue.push(v);
            }
            queue.seal();
            black_box(consumer.join().unwrap_or_default())
        })
    });

    group.finish();
}

// ============================================================================
// BroadcastHub
// ============================================================================

fn bench_hub_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast-hub");
    group.measurement_time(Duration::from_secs(5));

    for subscribers in [1usize, 4, 16] {
        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_with_input(
            BenchmarkId::new("reliable_publish", subscribers),
            &subscribers,
            |b, &n| {
                let hub: BroadcastHub<u64> = BroadcastHub::new("bench");
                let drains: Vec<_> = (0..n)
                    .map(|_| {
                        let mut sub = hub.subscribe(256);
                        thread::spawn(move || while sub.blocking_recv().is_some() {})
                    })
                    .collect();

                b.iter(|| black_box(hub.publish(black_box(7))));

                hub.close();
                for drain in drains {
                    let _ = drain.join();
                }
            },
        );
    }

    group.bench_function("lossy_publish_lagging", |b| {
        let hub: BroadcastHub<u64> = BroadcastHub::with_policy("bench-lossy", DeliveryPolicy::Lossy);
        let _lagging: Vec<_> = (0..8).map(|_| hub.subscribe(1)).collect();
        b.iter(|| black_box(hub.publish(black_box(7))));
    });

    group.finish();
}

// ============================================================================
// IdentityRegistry
// ============================================================================

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("identity-registry");

    let registry: IdentityRegistry<String, u64> = IdentityRegistry::new();
    for i in 0..1_000u64 {
        registry.rebind(format!("uuid-{i}"), i);
    }
    let key = "uuid-500".to_string();

    group.bench_function("rebind_get", |b| {
        b.iter(|| {
            registry.rebind(key.clone(), black_box(1));
            black_box(registry.get(&key))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_queue, bench_hub_publish, bench_registry);
criterion_main!(benches);
