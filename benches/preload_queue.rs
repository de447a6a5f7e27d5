//! Preload queue benchmarks.
//!
//! Measures priority queue operations and dedup-aware scheduling.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use lazymount::scheduler::{PreloadScheduler, PriorityQueue};
use lazymount::ComponentId;

fn ids(count: usize) -> Vec<ComponentId> {
    (0..count).map(|i| ComponentId::new(format!("card-{i}"))).collect()
}

fn bench_priority_queue_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_queue_push");

    for (name, queue_size) in [("empty", 0usize), ("half_full", 50), ("near_full", 90)] {
        let mut queue: PriorityQueue<ComponentId> = PriorityQueue::new();
        for (i, id) in ids(queue_size).into_iter().enumerate() {
            queue.push(id, i as i32);
        }

        let id = ComponentId::new("pushed");
        group.throughput(Throughput::Elements(1));
        group.bench_function(BenchmarkId::new("push", name), |b| {
            b.iter(|| {
                queue.push(black_box(id.clone()), -1);
                let _ = queue.pop();
            })
        });
    }

    group.finish();
}

fn bench_mixed_priorities(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_ordering");
    let pool = ids(10);

    group.throughput(Throughput::Elements(10));
    group.bench_function("mixed_priority_10", |b| {
        b.iter(|| {
            let mut queue: PriorityQueue<ComponentId> = PriorityQueue::new();
            for (i, id) in pool.iter().enumerate() {
                queue.push(id.clone(), (i % 3) as i32);
            }
            while let Some(id) = queue.pop() {
                black_box(id);
            }
        })
    });

    group.finish();
}

fn bench_scheduler_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("preload_scheduler");

    for count in [100usize, 500, 1000] {
        let pool = ids(count);
        group.throughput(Throughput::Elements(count as u64 * 2));
        group.bench_function(BenchmarkId::new("push_twice_then_drain", count), |b| {
            b.iter(|| {
                let scheduler = PreloadScheduler::new();
                for (i, id) in pool.iter().enumerate() {
                    scheduler.push(id.clone(), (count - i) as i32);
                    scheduler.push(id.clone(), 0);
                }
                while scheduler.pop().is_some() {}
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_priority_queue_push,
    bench_mixed_priorities,
    bench_scheduler_dedup
);
criterion_main!(benches);
