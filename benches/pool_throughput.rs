// Pool throughput benchmarks.
//
// Measures raw acquire/release overhead with a zero-cost resource (no
// I/O, instant create/destroy) under three load shapes: single-threaded,
// multi-threaded with ample capacity, and multi-threaded under
// contention against a small stripe.

use std::hint::black_box;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use stripe_pool::{Manage, Pool};

struct NoOp;

impl Manage for NoOp {
    type Resource = u64;
    type Error = std::convert::Infallible;

    async fn create(&self) -> Result<u64, Self::Error> {
        Ok(0)
    }

    async fn destroy(&self, _resource: u64) {}
}

fn warm_pool(rt: &tokio::runtime::Runtime, pool: &Pool<NoOp>, count: usize) {
    rt.block_on(async {
        let mut held = Vec::with_capacity(count);
        for _ in 0..count {
            held.push(pool.take().await.unwrap());
        }
        for leased in held {
            pool.put(leased);
        }
    });
}

fn single_thread_throughput(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("failed to build runtime");
    let pool = Pool::new(NoOp, 1, Duration::from_secs(3600), 64).expect("failed to create pool");
    warm_pool(&rt, &pool, 1);

    c.bench_function("single_thread_take_put", |b| {
        b.to_async(&rt).iter(|| {
            let pool = pool.clone();
            async move {
                let leased = pool.take().await.unwrap();
                pool.put(leased);
                black_box(())
            }
        });
    });
}

fn multi_thread_throughput(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build runtime");
    let pool = Pool::new(NoOp, 4, Duration::from_secs(3600), 16).expect("failed to create pool");
    warm_pool(&rt, &pool, 8);

    c.bench_function("multi_thread_take_put", |b| {
        b.to_async(&rt).iter(|| {
            let pool = pool.clone();
            async move {
                let leased = pool.take().await.unwrap();
                pool.put(leased);
                black_box(())
            }
        });
    });
}

fn concurrent_contention(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build runtime");

    // One stripe, four slots: every worker thread contends on the same
    // lock and notify.
    let pool = Pool::new(NoOp, 1, Duration::from_secs(3600), 4).expect("failed to create pool");

    c.bench_function("contended_take_put_4slots", |b| {
        b.to_async(&rt).iter(|| {
            let pool = pool.clone();
            async move {
                let leased = pool.take().await.unwrap();
                pool.put(leased);
                black_box(())
            }
        });
    });
}

criterion_group!(
    benches,
    single_thread_throughput,
    multi_thread_throughput,
    concurrent_contention,
);
criterion_main!(benches);
