use criterion::{criterion_group, criterion_main, Criterion};
use stagecache_storage::{StageCache, StageQuery};
use stagecache_test_utils::{LayerHandle, ResolverContext, TestStage};
use std::hint::black_box;
use std::sync::Arc;

type BenchCache = StageCache<TestStage, LayerHandle, ResolverContext>;

fn populated_cache(stages: usize, roots: usize) -> (BenchCache, Vec<Arc<TestStage>>) {
    let cache = BenchCache::new();
    let stages: Vec<Arc<TestStage>> = (0..stages)
        .map(|i| TestStage::with_root(&format!("root_{}.usda", i % roots)))
        .collect();
    for stage in &stages {
        cache.insert_keyed(stage);
    }
    (cache, stages)
}

fn bench_find(c: &mut Criterion) {
    let (cache, stages) = populated_cache(10_000, 100);
    let ids: Vec<_> = stages.iter().map(|s| cache.id_of(s)).collect();

    c.bench_function("cache/find_by_id", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % ids.len();
            black_box(cache.find(black_box(ids[i])));
        });
    });

    c.bench_function("cache/id_of", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % stages.len();
            black_box(cache.id_of(black_box(&stages[i])));
        });
    });

    let query = StageQuery::root(LayerHandle::new("root_42.usda"));
    c.bench_function("cache/find_all_matching_root", |b| {
        b.iter(|| black_box(cache.find_all_matching(black_box(&query))));
    });
}

fn bench_insert_erase(c: &mut Criterion) {
    let (cache, _stages) = populated_cache(10_000, 100);
    let stage = TestStage::with_root("churn.usda");

    c.bench_function("cache/insert_erase", |b| {
        b.iter(|| {
            let id = cache.insert_keyed(black_box(&stage));
            black_box(cache.erase(id));
        });
    });

    c.bench_function("cache/insert_existing", |b| {
        let id = cache.insert_keyed(&stage);
        b.iter(|| black_box(cache.insert_keyed(black_box(&stage))));
        cache.erase(id);
    });
}

fn bench_clone(c: &mut Criterion) {
    let (cache, _stages) = populated_cache(1_000, 10);

    c.bench_function("cache/clone_1k", |b| {
        b.iter(|| black_box(cache.clone()));
    });
}

criterion_group!(benches, bench_find, bench_insert_erase, bench_clone);
criterion_main!(benches);
