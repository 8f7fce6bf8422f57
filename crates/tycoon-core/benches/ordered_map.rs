use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tycoon_core::ordered_map::OrderedMap;

fn filled(n: u64) -> OrderedMap<u64, u64> {
    (0..n).map(|k| (k, k)).collect()
}

fn bench_ordered_map(c: &mut Criterion) {
    c.bench_function("insert 10k", |b| {
        b.iter(|| {
            let mut map = OrderedMap::with_capacity(10_000);
            for k in 0..10_000u64 {
                let _ = map.insert(k, k);
            }
            black_box(map.len())
        })
    });

    c.bench_function("remove every other of 10k", |b| {
        b.iter_batched(
            || filled(10_000),
            |mut map| {
                for k in (0..10_000u64).step_by(2) {
                    black_box(map.remove(&k));
                }
                map
            },
            criterion::BatchSize::SmallInput,
        )
    });

    let map = filled(10_000);
    c.bench_function("iterate 10k", |b| {
        b.iter(|| black_box(map.values().sum::<u64>()))
    });
}

criterion_group!(benches, bench_ordered_map);
criterion_main!(benches);
