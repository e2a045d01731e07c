use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flowhist_engine::StreamingHistogram;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::{LogNormal, Normal};

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let normal = Normal::new(100.0, 15.0).unwrap();
    let stationary: Vec<f64> = (0..10_000).map(|_| normal.sample(&mut rng)).collect();
    group.bench_function("stationary_10k", |b| {
        b.iter(|| {
            let mut hist = StreamingHistogram::new();
            for &v in &stationary {
                hist.ingest(black_box(v), 1.0).unwrap();
            }
            black_box(hist.total_weight())
        })
    });

    let lognormal = LogNormal::new(0.0, 2.5).unwrap();
    let heavy_tail: Vec<f64> = (0..10_000).map(|_| lognormal.sample(&mut rng)).collect();
    group.bench_function("heavy_tail_10k", |b| {
        b.iter(|| {
            let mut hist = StreamingHistogram::new();
            for &v in &heavy_tail {
                hist.ingest(black_box(v), 1.0).unwrap();
            }
            black_box(hist.total_weight())
        })
    });

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let normal = Normal::new(0.0, 50.0).unwrap();
    let mut hist = StreamingHistogram::new();
    for _ in 0..10_000 {
        hist.ingest(normal.sample(&mut rng), 1.0).unwrap();
    }
    c.bench_function("snapshot_10k", |b| b.iter(|| black_box(hist.snapshot())));
}

criterion_group!(benches, bench_ingest, bench_snapshot);
criterion_main!(benches);
