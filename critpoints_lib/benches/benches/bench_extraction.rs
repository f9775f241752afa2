use criterion::{Criterion, criterion_group};
use critpoints_lib::{
    CriticalPointTypeFlags, GridDims, Parameters, ScalarField, extract_features_from_field,
};
use std::time::Duration;

/// Smooth periodic test field with many extrema and saddles
fn wavy_field(n: usize) -> ScalarField<f64> {
    let dims = GridDims::new(n, n, n).unwrap();
    let h = 2.0 * std::f64::consts::PI / 16.0;
    ScalarField::from_fn(dims, |[i, j, k]| {
        let (x, y, z) = (i as f64 * h, j as f64 * h, k as f64 * h);
        x.sin() * (1.3 * y).cos() + (0.7 * z).sin() * (x + 0.5 * y).cos()
    })
}

pub fn extract_sequential(c: &mut Criterion) {
    let field = wavy_field(64);
    let parameters = Parameters {
        enable_multi_threading: false,
        accepted_types: CriticalPointTypeFlags::all(),
        ..Default::default()
    };

    let mut group = c.benchmark_group("extraction");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(3));
    group.measurement_time(Duration::from_secs(15));

    group.bench_function("extract_64_sequential", |b| {
        b.iter(|| {
            let features = extract_features_from_field(&field, &parameters);
            std::hint::black_box(features)
        })
    });

    group.finish();
}

pub fn extract_parallel(c: &mut Criterion) {
    let field = wavy_field(64);
    let parameters = Parameters {
        enable_multi_threading: true,
        accepted_types: CriticalPointTypeFlags::all(),
        ..Default::default()
    };

    let mut group = c.benchmark_group("extraction");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(3));
    group.measurement_time(Duration::from_secs(15));

    group.bench_function("extract_64_parallel", |b| {
        b.iter(|| {
            let features = extract_features_from_field(&field, &parameters);
            std::hint::black_box(features)
        })
    });

    group.finish();
}

criterion_group!(bench_extraction, extract_sequential, extract_parallel);
