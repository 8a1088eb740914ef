//! Benchmarks for the event scheduler.
//!
//! Benchmarks cover:
//! - Pending queue push/pop under both dequeue orders
//! - Emit-to-reply round trip on a running scheduler
//! - Batched emission from several producer threads
//! - Backoff computation

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::thread;
use std::time::Duration;

use eventloop::config::{DequeueOrder, SchedulerConfig};
use eventloop::core::{reply_channel, Event, Scheduler};
use eventloop::retry::next_backoff;

// ============================================================================
// Round trip
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");

    for order in [DequeueOrder::Fifo, DequeueOrder::Lifo] {
        let scheduler: Scheduler<u64, String> =
            Scheduler::with_config(SchedulerConfig::new().with_dequeue_order(order))
                .expect("valid config");
        scheduler.start().expect("start scheduler");

        group.bench_with_input(BenchmarkId::new("emit_recv", order), &scheduler, |b, s| {
            b.iter(|| {
                let (tx, rx) = reply_channel();
                s.emit(Event::require_feedback(tx), || Ok(black_box(1)));
                rx.recv().expect("reply").result.expect("ok")
            });
        });

        scheduler.stop();
    }

    group.finish();
}

// ============================================================================
// Batched emission
// ============================================================================

fn bench_batched_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("batched_emit");

    for producers in [1_usize, 4, 8] {
        let per_producer = 250_usize;
        group.throughput(Throughput::Elements((producers * per_producer) as u64));

        let scheduler: Scheduler<usize, String> = Scheduler::initialize();
        scheduler.start().expect("start scheduler");

        group.bench_with_input(BenchmarkId::from_parameter(producers), &producers, |b, &n| {
            b.iter(|| {
                thread::scope(|scope| {
                    for p in 0..n {
                        let scheduler = &scheduler;
                        scope.spawn(move || {
                            let receivers: Vec<_> = (0..per_producer)
                                .map(|i| {
                                    let (tx, rx) = reply_channel();
                                    scheduler.emit(Event::require_feedback(tx), move || Ok(p * i));
                                    rx
                                })
                                .collect();
                            for rx in receivers {
                                black_box(rx.recv().expect("reply").result.expect("ok"));
                            }
                        });
                    }
                });
            });
        });

        scheduler.stop();
    }

    group.finish();
}

// ============================================================================
// Backoff
// ============================================================================

fn bench_backoff(c: &mut Criterion) {
    let initial = Duration::from_millis(200);
    let max = Duration::from_millis(1000);

    c.bench_function("next_backoff", |b| {
        let mut attempt = 0_u32;
        b.iter(|| {
            attempt = (attempt + 1) % 16;
            black_box(next_backoff(black_box(attempt), initial, max))
        });
    });
}

criterion_group!(benches, bench_round_trip, bench_batched_emit, bench_backoff);
criterion_main!(benches);
