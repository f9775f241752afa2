use critpoints_lib::{
    CriticalPointType, CriticalPointTypeFlags, ExtractionError, FeatureSet, FieldConstructionError,
    GridDims, Parameters, ScalarField, TraversalBounds, distance, extract_features,
    extract_features_from_field, extract_features_with_parameters,
};
use nalgebra::Vector3;

/// Samples `f` on a grid with x varying fastest
fn sample<F: Fn(f64, f64, f64) -> f64>(nx: usize, ny: usize, nz: usize, f: F) -> Vec<f64> {
    let mut data = Vec::with_capacity(nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                data.push(f(i as f64, j as f64, k as f64));
            }
        }
    }
    data
}

/// Anisotropic quadratic bump with its extremum at `center`, a maximum for `sign = -1` and a minimum for `sign = 1`
fn quadratic_bump(center: [f64; 3], peak: f64, sign: f64) -> impl Fn(f64, f64, f64) -> f64 {
    move |x, y, z| {
        let (dx, dy, dz) = (x - center[0], y - center[1], z - center[2]);
        peak + sign * (dx * dx + 2.0 * dy * dy + 0.5 * dz * dz)
    }
}

fn params_with_types(accepted_types: CriticalPointTypeFlags) -> Parameters<f64> {
    Parameters {
        accepted_types,
        ..Default::default()
    }
}

#[test]
fn maximum_on_grid_vertex_is_reported_once() {
    let (nx, ny, nz) = (10, 12, 14);
    let data = sample(nx, ny, nz, quadratic_bump([5.0, 6.0, 7.0], 10.0, -1.0));

    let features = extract_features(&data, nx, ny, nz).unwrap();
    assert_eq!(features.len(), 1);

    let point = &features.points()[0];
    assert_eq!(point.kind, CriticalPointType::Maximum);
    assert!((point.position - Vector3::new(5.0, 6.0, 7.0)).norm() < 1e-9);
    assert!((point.value - 10.0).abs() < 1e-9);
}

#[test]
fn maximum_on_grid_vertex_without_merging_is_reported_by_all_adjacent_simplices() {
    let (nx, ny, nz) = (10, 12, 14);
    let data = sample(nx, ny, nz, quadratic_bump([5.0, 6.0, 7.0], 10.0, -1.0));
    let parameters = Parameters {
        merge_distance: None,
        ..Default::default()
    };

    let dims = GridDims::new(nx, ny, nz).unwrap();
    let features = extract_features_with_parameters(&data, dims, &parameters).unwrap();
    assert_eq!(features.len(), 24);
    assert!(
        features
            .iter()
            .all(|p| (p.position - Vector3::new(5.0, 6.0, 7.0)).norm() < 1e-9)
    );
}

#[test]
fn off_grid_maximum_is_located_exactly() {
    let (nx, ny, nz) = (12, 11, 10);
    let center = [4.3, 5.6, 6.2];
    let data = sample(nx, ny, nz, quadratic_bump(center, 2.5, -1.0));

    let features = extract_features(&data, nx, ny, nz).unwrap();
    assert_eq!(features.len(), 1);
    let point = &features.points()[0];
    assert!((point.position - Vector3::from(center)).norm() < 1e-9);
    // Linear interpolation of a concave function underestimates its maximum
    assert!(point.value <= 2.5 + 1e-12);
    assert!(point.value > 1.5);
}

#[test]
fn axis_convention_is_x_fastest() {
    // Flat samples are generated with x varying fastest, the maximum must be reported at the
    // designed coordinates and not with permuted axes
    let (nx, ny, nz) = (9, 13, 17);
    let center = [3.0, 8.0, 11.0];
    let data = sample(nx, ny, nz, quadratic_bump(center, 1.0, -1.0));

    let dims = GridDims::from_c_order_shape([nz, ny, nx]).unwrap();
    assert_eq!(dims, GridDims::new(nx, ny, nz).unwrap());

    let features = extract_features_with_parameters(&data, dims, &Parameters::default()).unwrap();
    assert_eq!(features.len(), 1);
    assert!((features.points()[0].position - Vector3::from(center)).norm() < 1e-9);
}

#[test]
fn minimum_requires_flag() {
    let (nx, ny, nz) = (10, 10, 10);
    let data = sample(nx, ny, nz, quadratic_bump([4.5, 5.25, 4.75], -3.0, 1.0));
    let dims = GridDims::new(nx, ny, nz).unwrap();

    let maxima_only = extract_features(&data, nx, ny, nz).unwrap();
    assert!(maxima_only.is_empty());

    let features = extract_features_with_parameters(
        &data,
        dims,
        &params_with_types(CriticalPointTypeFlags::MINIMUM),
    )
    .unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features.points()[0].kind, CriticalPointType::Minimum);
    assert!(features.points()[0].value >= -3.0 - 1e-12);
}

#[test]
fn saddle_is_classified() {
    let (nx, ny, nz) = (10, 10, 10);
    let data = sample(nx, ny, nz, |x, y, z| {
        (x - 4.4).powi(2) - (y - 5.3).powi(2) + 0.5 * (z - 4.8).powi(2)
    });
    let dims = GridDims::new(nx, ny, nz).unwrap();

    assert!(extract_features(&data, nx, ny, nz).unwrap().is_empty());

    let parameters = params_with_types(CriticalPointTypeFlags::all());
    let features = extract_features_with_parameters(&data, dims, &parameters).unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features.points()[0].kind, CriticalPointType::Saddle);
}

#[test]
fn constant_field_has_no_critical_points() {
    let data = vec![1.5f64; 8 * 8 * 8];
    let dims = GridDims::new(8, 8, 8).unwrap();
    let features = extract_features_with_parameters(
        &data,
        dims,
        &params_with_types(CriticalPointTypeFlags::all()),
    )
    .unwrap();
    assert!(features.is_empty());
}

#[test]
fn small_grids_have_no_critical_points() {
    for (nx, ny, nz) in [(5, 5, 5), (1, 1, 1), (20, 20, 4)] {
        let data = sample(nx, ny, nz, quadratic_bump([2.0, 2.0, 2.0], 1.0, -1.0));
        assert!(extract_features(&data, nx, ny, nz).unwrap().is_empty());
    }
}

#[test]
fn length_mismatch_is_rejected() {
    let data = vec![0.0f64; 999];
    let result = extract_features(&data, 10, 10, 10);
    assert!(matches!(
        result,
        Err(ExtractionError::FieldConstruction(
            FieldConstructionError::LengthMismatch {
                expected: 1000,
                actual: 999
            }
        ))
    ));

    assert!(matches!(
        extract_features(&[0.0f64; 0], 0, 10, 10),
        Err(ExtractionError::FieldConstruction(
            FieldConstructionError::ZeroExtent
        ))
    ));
}

#[test]
fn traversal_bounds_restrict_search() {
    let (nx, ny, nz) = (12, 12, 12);
    let data = sample(nx, ny, nz, quadratic_bump([7.5, 6.5, 6.5], 1.0, -1.0));
    let field = ScalarField::from_vec(GridDims::new(nx, ny, nz).unwrap(), data).unwrap();

    let restricted = Parameters {
        bounds: Some(TraversalBounds::new([2, 2, 2], [7, 9, 9])),
        ..Default::default()
    };
    assert!(extract_features_from_field(&field, &restricted).is_empty());
    assert_eq!(
        extract_features_from_field(&field, &Parameters::default()).len(),
        1
    );
}

#[test]
fn traversal_bounds_never_reach_the_boundary_shell() {
    let (nx, ny, nz) = (10, 10, 10);
    let data = sample(nx, ny, nz, |x, y, z| {
        let (dx, dy, dz) = (x - 4.3, y - 4.6, z - 4.2);
        -(dx * dx + 1.3 * dy * dy + 0.7 * dz * dz)
    });
    let field = ScalarField::from_vec(GridDims::new(nx, ny, nz).unwrap(), data).unwrap();

    let whole_grid = Parameters {
        accepted_types: CriticalPointTypeFlags::all(),
        bounds: Some(TraversalBounds::new([0, 0, 0], [9, 9, 9])),
        ..Default::default()
    };
    let features = extract_features_from_field(&field, &whole_grid);
    assert_eq!(features.len(), 1);
    assert_eq!(features.points()[0].kind, CriticalPointType::Maximum);

    let interior = extract_features_from_field(
        &field,
        &params_with_types(CriticalPointTypeFlags::all()),
    );
    assert_eq!(features.points(), interior.points());
}

#[test]
fn single_precision_extraction() {
    let (nx, ny, nz) = (10, 10, 10);
    let data = sample(nx, ny, nz, quadratic_bump([4.3, 4.6, 4.2], 1.0, -1.0))
        .into_iter()
        .map(|v| v as f32)
        .collect::<Vec<_>>();
    let features = extract_features(&data, nx, ny, nz).unwrap();
    assert_eq!(features.len(), 1);
    assert!((features.points()[0].position - Vector3::new(4.3f32, 4.6, 4.2)).norm() < 1e-4);
}

fn wavy_field(nx: usize, ny: usize, nz: usize) -> Vec<f64> {
    sample(nx, ny, nz, |x, y, z| {
        (0.7 * x).sin() * (0.5 * y).cos() * (0.6 * z + 0.3).sin() + 0.01 * x
    })
}

#[test]
fn result_is_independent_of_thread_count() {
    let (nx, ny, nz) = (24, 20, 22);
    let data = wavy_field(nx, ny, nz);
    let dims = GridDims::new(nx, ny, nz).unwrap();
    let parameters = params_with_types(CriticalPointTypeFlags::all());

    let run_with_threads = |num_threads: usize| -> FeatureSet<f64> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .unwrap()
            .install(|| extract_features_with_parameters(&data, dims, &parameters).unwrap())
    };

    let single = run_with_threads(1);
    let multi = run_with_threads(4);
    let sequential = extract_features_with_parameters(
        &data,
        dims,
        &Parameters {
            enable_multi_threading: false,
            ..parameters.clone()
        },
    )
    .unwrap();

    assert!(!single.is_empty());
    assert_eq!(single, multi);
    assert_eq!(single, sequential);
    assert_eq!(distance(&single, &multi).difference, 0);
}

#[test]
fn lossy_perturbation_changes_feature_count() {
    let (nx, ny, nz) = (24, 20, 22);
    let original = wavy_field(nx, ny, nz);
    // Quantization as a crude stand-in for a lossy reconstruction
    let lossy = original
        .iter()
        .map(|v| (v * 4.0).round() / 4.0)
        .collect::<Vec<_>>();

    let a = extract_features(&original, nx, ny, nz).unwrap();
    let b = extract_features(&lossy, nx, ny, nz).unwrap();
    assert!(!a.is_empty());
    let d = distance(&a, &b);

    assert_eq!(d.difference, a.len() as i64 - b.len() as i64);
    let mean = (a.len() + b.len()) as f64 / 2.0;
    assert!((d.normalized - d.difference as f64 / mean).abs() < 1e-15);
    assert_eq!(distance(&a, &a).normalized, 0.0);
}
