use bufferpool::storage::mock::MockStorageAdapter;
use bufferpool::{BufferPool, ReplacementStrategy};
use criterion::{criterion_group, criterion_main, Criterion};

const POOL_SIZE: usize = 64;

fn strategies() -> Vec<(&'static str, ReplacementStrategy)> {
    vec![
        ("fifo", ReplacementStrategy::Fifo),
        ("lru", ReplacementStrategy::Lru),
        ("lru_k", ReplacementStrategy::LruK { k: 2 }),
        ("lfu", ReplacementStrategy::Lfu),
        ("clock", ReplacementStrategy::Clock),
    ]
}

fn pool_for(strategy: ReplacementStrategy) -> BufferPool {
    BufferPool::init(Box::new(MockStorageAdapter::new()), POOL_SIZE, strategy).unwrap()
}

/// Pin and immediately unpin a sequence of pages, all hits after the pool
/// has warmed up — measures steady-state pin/unpin overhead.
fn bench_pin_unpin_hits(c: &mut Criterion) {
    let mut group = c.benchmark_group("pin_unpin_hits");
    for (name, strategy) in strategies() {
        let pool = pool_for(strategy);
        for page in 0..POOL_SIZE as i64 {
            pool.pin_page(page).unwrap().unpin().unwrap();
        }
        group.bench_function(name, |b| {
            b.iter(|| {
                for page in 0..POOL_SIZE as i64 {
                    pool.pin_page(page).unwrap().unpin().unwrap();
                }
            })
        });
    }
    group.finish();
}

/// Pin a working set twice the size of the pool, forcing continuous
/// eviction — measures victim-selection cost per strategy.
fn bench_pin_unpin_eviction_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("pin_unpin_eviction_churn");
    for (name, strategy) in strategies() {
        group.bench_function(name, |b| {
            b.iter_batched(
                || pool_for(strategy),
                |pool| {
                    for page in 0..(POOL_SIZE as i64 * 2) {
                        pool.pin_page(page).unwrap().unpin().unwrap();
                    }
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pin_unpin_hits, bench_pin_unpin_eviction_churn);
criterion_main!(benches);
