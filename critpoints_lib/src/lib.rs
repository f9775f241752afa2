//!
//! Library for the extraction of critical points from 3D scalar fields sampled on regular grids and
//! for comparing the extracted feature sets, e.g. of an original field and its lossy reconstruction.
//! Entry point is the [extract_features] function.
//!
//! The scalar field is interpreted as a piecewise linear function on the Freudenthal decomposition
//! of the grid into tetrahedra. Gradients and Hessians are approximated by central differences at
//! the grid samples. A critical point is reported in every tetrahedron that contains a zero of the
//! linearly interpolated gradient, classified by the eigenvalues of the interpolated Hessian.
//!
//! ## Feature flags
//! The following features are all non-default features to reduce the amount of additional dependencies.
//!
//! - **`io`**: Enables the [`io`] module with readers and writers for scalar fields (raw binary and
//!   JSON) and feature sets (text, CSV, JSON and VTK point clouds).
//! - **`profiling`**: Enables profiling of internal functions. The resulting data can be displayed
//!   using the functions from the [`profiling`] module of this crate.
//!

use log::info;
use thiserror::Error as ThisError;

/// Re-export the version of nalgebra used by this crate
pub use nalgebra;
/// Re-export the version of vtkio used by this crate, if IO support is enabled
#[cfg(feature = "io")]
pub use vtkio;

#[cfg(feature = "profiling")]
/// Profiling of internal functions for timing analysis
pub mod profiling;
#[doc(hidden)]
pub mod profiling_macro;

/// Detection and classification of critical points on the simplicial mesh
pub mod critical_points;
/// Finite difference gradient and Hessian fields
pub mod derivatives;
/// Distance metric between feature sets
pub mod distance;
#[cfg(feature = "io")]
/// File formats for scalar fields, feature sets and distance reports
pub mod io;
/// Barycentric interpolation and eigenvalue kernels
pub mod numeric;
/// Dense scalar fields on regular grids
pub mod scalar_field;
/// Implicit Freudenthal decomposition of a regular grid into tetrahedra
pub mod simplex_mesh;
/// Helper types for cartesian coordinate system topology
pub mod topology;
mod traits;

pub use critical_points::{
    CriticalPoint, CriticalPointType, CriticalPointTypeFlags, FeatureSet, UnknownCriticalPointType,
};
pub use distance::{DistanceRecord, FeatureDistance, distance};
pub use scalar_field::{FieldConstructionError, GridDims, ScalarField};
pub use simplex_mesh::TraversalBounds;
pub use traits::{Real, ThreadSafe};

pub(crate) type HashState = fxhash::FxBuildHasher;
pub(crate) type MapType<K, V> = std::collections::HashMap<K, V, HashState>;
pub(crate) fn new_map<K, V>() -> MapType<K, V> {
    MapType::with_hasher(HashState::default())
}

/// Macro version of Option::map that allows using e.g. using the ?-operator in the map expression
macro_rules! map_option {
    ($some_optional:expr, $value_identifier:ident => $value_transformation:expr) => {
        match $some_optional {
            Some($value_identifier) => Some($value_transformation),
            None => None,
        }
    };
}

/// Parameters for the critical point extraction
#[derive(Clone, Debug)]
pub struct Parameters<R: Real> {
    /// Whether to allow multi threading for the derivative computation and the simplex traversal
    pub enable_multi_threading: bool,
    /// Types of critical points that are reported, all other critical points are discarded
    pub accepted_types: CriticalPointTypeFlags,
    /// Barycentric coordinates smaller than `-barycentric_tolerance` place a gradient zero outside of a simplex
    pub barycentric_tolerance: R,
    /// Critical points closer to each other than this distance (in grid index units) are merged into one.
    /// If not provided, points that are found by several neighboring simplices are reported once per simplex.
    pub merge_distance: Option<R>,
    /// Manually restrict the window of samples in which simplices are traversed.
    /// If not provided, all samples with a valid Hessian are used, i.e. `[2, dim - 3]` on every axis.
    /// A provided window is intersected with this range.
    pub bounds: Option<TraversalBounds>,
}

impl<R: Real> Default for Parameters<R> {
    fn default() -> Self {
        Self {
            enable_multi_threading: true,
            accepted_types: CriticalPointTypeFlags::default(),
            barycentric_tolerance: R::from_f64(1e-10).unwrap_or_else(R::zero),
            merge_distance: R::from_f64(1e-6),
            bounds: None,
        }
    }
}

impl<R: Real> Parameters<R> {
    /// Tries to convert the parameters from one [Real] type to another [Real] type, returns None if conversion fails
    pub fn try_convert<T: Real>(&self) -> Option<Parameters<T>> {
        Some(Parameters {
            enable_multi_threading: self.enable_multi_threading,
            accepted_types: self.accepted_types,
            barycentric_tolerance: self.barycentric_tolerance.try_convert()?,
            merge_distance: map_option!(&self.merge_distance, d => d.try_convert()?),
            bounds: self.bounds,
        })
    }
}

/// Error type returned when the feature extraction fails
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum ExtractionError {
    /// Errors that occur during the construction of the scalar field from the input data
    #[error("field construction: {0}")]
    FieldConstruction(FieldConstructionError),
    /// Any error that is not represented by some other explicit variant
    #[error("unknown error")]
    Unknown(anyhow::Error),
}

impl From<FieldConstructionError> for ExtractionError {
    /// Allows automatic conversion of a [FieldConstructionError] to an [ExtractionError]
    fn from(error: FieldConstructionError) -> Self {
        ExtractionError::FieldConstruction(error)
    }
}

impl From<anyhow::Error> for ExtractionError {
    /// Allows automatic conversion of an anyhow::Error to an [ExtractionError]
    fn from(error: anyhow::Error) -> Self {
        ExtractionError::Unknown(error)
    }
}

/// Initializes the global thread pool used by this library with the given parameters.
///
/// Initialization of the global thread pool happens exactly once.
/// Therefore, if you call `initialize_thread_pool` a second time, it will return an error.
/// An `Ok` result indicates that this is the first initialization of the thread pool.
pub fn initialize_thread_pool(num_threads: usize) -> Result<(), anyhow::Error> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;
    Ok(())
}

/// Extracts the critical points of the scalar field given by the flat samples with default [`Parameters`]
///
/// The samples are expected with the x-coordinate varying fastest, i.e. the sample at `[x, y, z]`
/// is `data[x + nx * (y + ny * z)]`. Fails if `data` does not contain exactly `nx * ny * nz` samples.
pub fn extract_features<R: Real>(
    data: &[R],
    nx: usize,
    ny: usize,
    nz: usize,
) -> Result<FeatureSet<R>, ExtractionError> {
    let dims = GridDims::new(nx, ny, nz)?;
    extract_features_with_parameters(data, dims, &Parameters::default())
}

/// Extracts the critical points of the scalar field given by the flat samples using the given parameters
#[inline(never)]
pub fn extract_features_with_parameters<R: Real>(
    data: &[R],
    dims: GridDims,
    parameters: &Parameters<R>,
) -> Result<FeatureSet<R>, ExtractionError> {
    let field = ScalarField::from_slice(dims, data)?;
    Ok(extract_features_from_field(&field, parameters))
}

/// Extracts the critical points of an existing scalar field using the given parameters
#[inline(never)]
pub fn extract_features_from_field<R: Real>(
    field: &ScalarField<R>,
    parameters: &Parameters<R>,
) -> FeatureSet<R> {
    profile!("extract_features");

    let dims = field.dims();
    let [nx, ny, nz] = *dims.as_array();
    info!("Extracting critical points from a field with {}x{}x{} samples.", nx, ny, nz);

    let bounds = parameters
        .bounds
        .map(|b| b.clamped_to(dims))
        .unwrap_or_else(|| TraversalBounds::interior_of(dims));
    if bounds.is_empty() {
        info!("Traversal window contains no simplices, the grid is too small.");
        return FeatureSet::default();
    }

    let gradient = derivatives::compute_gradient(field, parameters.enable_multi_threading);
    let hessian = derivatives::compute_hessian(&gradient, parameters.enable_multi_threading);

    let features =
        critical_points::collect_feature_set(field, &gradient, &hessian, &bounds, parameters);
    info!(
        "Extraction done: {} critical points ({} maxima, {} minima, {} saddles, {} degenerate).",
        features.len(),
        features.count_of(CriticalPointType::Maximum),
        features.count_of(CriticalPointType::Minimum),
        features.count_of(CriticalPointType::Saddle),
        features.count_of(CriticalPointType::Degenerate),
    );

    features
}
