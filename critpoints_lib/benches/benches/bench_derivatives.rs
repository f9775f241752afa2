use criterion::{Criterion, criterion_group};
use critpoints_lib::derivatives::{compute_gradient, compute_hessian};
use critpoints_lib::{GridDims, ScalarField};
use std::time::Duration;

pub fn derivatives(c: &mut Criterion) {
    let dims = GridDims::new(96, 96, 96).unwrap();
    let field = ScalarField::from_fn(dims, |[i, j, k]| {
        let (x, y, z) = (i as f32 * 0.1, j as f32 * 0.1, k as f32 * 0.1);
        (x * y).sin() + z.cos()
    });

    let mut group = c.benchmark_group("derivatives");
    group.sample_size(30);
    group.warm_up_time(Duration::from_secs(3));
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("gradient_96", |b| {
        b.iter(|| std::hint::black_box(compute_gradient(&field, true)))
    });

    let gradient = compute_gradient(&field, true);
    group.bench_function("hessian_96", |b| {
        b.iter(|| std::hint::black_box(compute_hessian(&gradient, true)))
    });

    group.finish();
}

criterion_group!(bench_derivatives, derivatives);
