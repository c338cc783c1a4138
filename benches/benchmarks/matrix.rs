use criterion::{black_box, criterion_group, BenchmarkId, Criterion};
use bcsvmc::ComplexMatrix;
use num::complex::Complex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub fn bench_inverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("Complex inverse");
    let mut rng = SmallRng::seed_from_u64(42);
    for n in [8, 16, 32, 64] {
        let a = ComplexMatrix::from_fn(n, n, |_, _| Complex::new(rng.gen::<f64>(), rng.gen::<f64>()));
        group.bench_with_input(BenchmarkId::from_parameter(n), &a, |b, a| b.iter(|| a.inverse().unwrap()));
    }
    group.finish();
}

pub fn bench_reciprocal_condition(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(42);
    let a = ComplexMatrix::from_fn(32, 32, |_, _| Complex::new(rng.gen::<f64>(), rng.gen::<f64>()));
    c.bench_function("Reciprocal condition 32x32", |b| {
        b.iter(|| black_box(&a).reciprocal_condition().unwrap())
    });
}

criterion_group!(benches, bench_inverse, bench_reciprocal_condition,);
