use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ratelimit_core::bucket_store::BucketStore;
use ratelimit_core::config::LimiterConfig;
use ratelimit_core::store::testing::FakeStore;
use std::hint::black_box;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn bench_single_identifier_throughput(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("bucket_store_single_identifier");

    for capacity in [10.0, 100.0, 1000.0].iter() {
        let store = rt.block_on(async {
            BucketStore::new(Arc::new(FakeStore::new()), &LimiterConfig::default())
        });

        group.bench_with_input(
            BenchmarkId::new("acquire", *capacity as u64),
            capacity,
            |b, &capacity| {
                b.to_async(&rt).iter(|| async {
                    black_box(store.acquire("bench-id", capacity, capacity / 10.0, 0).await)
                });
            },
        );
    }

    group.finish();
}

fn bench_concurrent_identifiers(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("bucket_store_concurrent");

    for thread_count in [1, 4, 8, 16].iter() {
        let store = Arc::new(rt.block_on(async {
            BucketStore::new(Arc::new(FakeStore::new()), &LimiterConfig::default())
        }));

        group.bench_with_input(
            BenchmarkId::new("acquire_distinct_identifiers", thread_count),
            thread_count,
            |b, &thread_count| {
                b.to_async(&rt).iter(|| async {
                    let store = store.clone();
                    let mut handles = Vec::new();
                    for t in 0..thread_count {
                        let store = store.clone();
                        handles.push(tokio::spawn(async move {
                            for _ in 0..100 {
                                let id = format!("tenant-{t}");
                                black_box(store.acquire(&id, 1000.0, 100.0, 0).await);
                            }
                        }));
                    }
                    for handle in handles {
                        handle.await.unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_identifier_throughput,
    bench_concurrent_identifiers
);
criterion_main!(benches);
