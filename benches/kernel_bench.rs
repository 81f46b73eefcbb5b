use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use vecscan::vector::Kernel;
use vecscan::{Engine, EngineConfig};

fn embedding(dimension: usize, seed: usize) -> Vec<f32> {
    (0..dimension)
        .map(|i| (((i * 31 + seed * 17) % 97) as f32 - 48.0) / 48.0)
        .collect()
}

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("cosine");
    for dimension in [128usize, 384, 1536] {
        let a = embedding(dimension, 1);
        let b = embedding(dimension, 2);
        for kernel in [Kernel::Scalar, Kernel::Wide] {
            group.bench_with_input(
                BenchmarkId::new(kernel.name(), dimension),
                &dimension,
                |bench, _| bench.iter(|| kernel.cosine(black_box(&a), black_box(&b))),
            );
        }
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let dimension = 384;
    let mut engine = Engine::with_config(EngineConfig::default().with_dimension(dimension))
        .expect("engine");
    for id in 0..20_000 {
        engine
            .append(id, &embedding(dimension, id as usize))
            .expect("append");
    }
    let query = embedding(dimension, 7);

    c.bench_function("search_20k_384", |bench| {
        bench.iter(|| engine.search(black_box(&query), 10, 0.0).expect("search"))
    });
}

criterion_group!(benches, bench_kernels, bench_search);
criterion_main!(benches);
