//! Benchmarks for the easing hot path.
//!
//! Run with: cargo bench -p mm-flip --bench easing_bench

use criterion::{Criterion, criterion_group, criterion_main};
use mm_flip::Easing;
use std::hint::black_box;

fn bench_easing(c: &mut Criterion) {
    let samples: Vec<f64> = (0..=1000).map(|i| f64::from(i) / 1000.0).collect();

    let mut group = c.benchmark_group("easing");
    group.bench_function("in_quint", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &t in &samples {
                acc += Easing::InQuint.apply(black_box(t));
            }
            acc
        })
    });
    group.bench_function("in_out_quint", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &t in &samples {
                acc += Easing::InOutQuint.apply(black_box(t));
            }
            acc
        })
    });
    group.finish();
}

criterion_group!(benches, bench_easing);
criterion_main!(benches);
