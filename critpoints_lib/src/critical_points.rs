//! Detection and classification of critical points on the simplicial mesh of a scalar field
//!
//! Every simplex of the traversal window is tested for a zero of the linearly interpolated
//! gradient. If there is one, the Hessian interpolated at that point is used to classify it by the
//! signs of its eigenvalues. Simplices are tested independently of each other, the found points
//! are collected in a shared list and ordered by simplex id afterwards, so the result does not
//! depend on the number of threads.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use log::{debug, info};
use nalgebra::Vector3;
use parking_lot::Mutex;
use rayon::prelude::*;
use thiserror::Error as ThisError;

use crate::derivatives::{GradientField, HessianField};
use crate::numeric::{
    inverse_lerp_s3v3, lerp_s3, lerp_s3m3, lerp_s3v3, symmetric_eigenvalues, symmetrize,
};
use crate::scalar_field::ScalarField;
use crate::simplex_mesh::{Simplex, TraversalBounds};
use crate::topology::Axis;
use crate::{Parameters, Real, new_map, profile};

/// Classification of a critical point by the signs of the Hessian eigenvalues
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum CriticalPointType {
    /// All eigenvalues are negative
    Maximum,
    /// All eigenvalues are positive
    Minimum,
    /// Eigenvalues with both strict signs
    Saddle,
    /// At least one eigenvalue is exactly zero
    Degenerate,
}

bitflags! {
    /// Set of [`CriticalPointType`]s, used to select which critical points are reported
    #[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
    pub struct CriticalPointTypeFlags: u8 {
        const MAXIMUM = 0b0001;
        const MINIMUM = 0b0010;
        const SADDLE = 0b0100;
        const DEGENERATE = 0b1000;
    }
}

impl Default for CriticalPointTypeFlags {
    /// Only maxima are reported by default
    fn default() -> Self {
        CriticalPointTypeFlags::MAXIMUM
    }
}

/// Error returned when parsing an unknown critical point type name
#[derive(Clone, Eq, PartialEq, Debug, ThisError)]
#[error("unknown critical point type `{0}` (expected one of maximum, minimum, saddle, degenerate)")]
pub struct UnknownCriticalPointType(pub String);

impl CriticalPointType {
    /// All critical point types
    pub const ALL: [CriticalPointType; 4] = [
        CriticalPointType::Maximum,
        CriticalPointType::Minimum,
        CriticalPointType::Saddle,
        CriticalPointType::Degenerate,
    ];

    /// Classifies a critical point using the eigenvalues of its Hessian
    /// ```
    /// use critpoints_lib::CriticalPointType;
    /// assert_eq!(CriticalPointType::classify(&[-1.0, -2.0, -3.0]), CriticalPointType::Maximum);
    /// assert_eq!(CriticalPointType::classify(&[1.0, 0.0, -3.0]), CriticalPointType::Degenerate);
    /// ```
    pub fn classify<R: Real>(eigenvalues: &[R; 3]) -> Self {
        let zero = R::zero();
        if eigenvalues.iter().any(|&e| e == zero) {
            CriticalPointType::Degenerate
        } else if eigenvalues.iter().all(|&e| e < zero) {
            CriticalPointType::Maximum
        } else if eigenvalues.iter().all(|&e| e > zero) {
            CriticalPointType::Minimum
        } else {
            CriticalPointType::Saddle
        }
    }

    /// Returns the flag corresponding to this type
    pub fn flag(&self) -> CriticalPointTypeFlags {
        match self {
            CriticalPointType::Maximum => CriticalPointTypeFlags::MAXIMUM,
            CriticalPointType::Minimum => CriticalPointTypeFlags::MINIMUM,
            CriticalPointType::Saddle => CriticalPointTypeFlags::SADDLE,
            CriticalPointType::Degenerate => CriticalPointTypeFlags::DEGENERATE,
        }
    }

    /// Lower case name of the type as used in files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            CriticalPointType::Maximum => "maximum",
            CriticalPointType::Minimum => "minimum",
            CriticalPointType::Saddle => "saddle",
            CriticalPointType::Degenerate => "degenerate",
        }
    }
}

impl fmt::Display for CriticalPointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CriticalPointType {
    type Err = UnknownCriticalPointType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        CriticalPointType::ALL
            .into_iter()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| UnknownCriticalPointType(s.to_string()))
    }
}

/// A critical point of the piecewise linear gradient field
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct CriticalPoint<R: Real> {
    /// Position in grid index units, i.e. `[x, y, z]` with `x` along the fastest varying axis
    pub position: Vector3<R>,
    /// Interpolated scalar value at the position
    pub value: R,
    /// Classification by the Hessian eigenvalue signs
    pub kind: CriticalPointType,
}

/// The critical points found by one extraction, ordered by the id of the simplex that contains them
#[derive(Clone, PartialEq, Debug)]
pub struct FeatureSet<R: Real> {
    points: Vec<CriticalPoint<R>>,
}

impl<R: Real> Default for FeatureSet<R> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<R: Real> FeatureSet<R> {
    /// Constructs a feature set from the given points, keeping their order
    pub fn from_points(points: Vec<CriticalPoint<R>>) -> Self {
        Self { points }
    }

    /// Constructs a feature set from `(x, y, z, value)` rows, all points get the given type
    pub fn from_rows(rows: &[[R; 4]], kind: CriticalPointType) -> Self {
        Self {
            points: rows
                .iter()
                .map(|r| CriticalPoint {
                    position: Vector3::new(r[0], r[1], r[2]),
                    value: r[3],
                    kind,
                })
                .collect(),
        }
    }

    /// Number of critical points in the set
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns whether the set contains no critical points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns a slice of all critical points
    pub fn points(&self) -> &[CriticalPoint<R>] {
        self.points.as_slice()
    }

    /// Iterator over all critical points
    pub fn iter(&self) -> impl Iterator<Item = &CriticalPoint<R>> {
        self.points.iter()
    }

    /// Consumes the set and returns the critical points
    pub fn into_points(self) -> Vec<CriticalPoint<R>> {
        self.points
    }

    /// Number of critical points of the given type
    pub fn count_of(&self, kind: CriticalPointType) -> usize {
        self.points.iter().filter(|p| p.kind == kind).count()
    }

    /// Flattens the set into one `(x, y, z, value)` row per critical point
    pub fn to_rows(&self) -> Vec<[R; 4]> {
        self.points
            .iter()
            .map(|p| [p.position.x, p.position.y, p.position.z, p.value])
            .collect()
    }
}

impl<'a, R: Real> IntoIterator for &'a FeatureSet<R> {
    type Item = &'a CriticalPoint<R>;
    type IntoIter = std::slice::Iter<'a, CriticalPoint<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Tests a single simplex for a critical point of one of the accepted types
///
/// Returns `None` if the interpolated gradient has no zero inside of the simplex (including
/// degenerate configurations) or if the critical point is of a type that is not accepted.
#[inline]
pub fn check_simplex<R: Real>(
    simplex: &Simplex,
    field: &ScalarField<R>,
    gradient: &GradientField<R>,
    hessian: &HessianField<R>,
    parameters: &Parameters<R>,
) -> Option<CriticalPoint<R>> {
    let vertices = simplex.vertices();

    let gradients = vertices.map(|v| gradient.value(&v));
    let mu = inverse_lerp_s3v3(&gradients, parameters.barycentric_tolerance)?;

    let hessians = vertices.map(|v| hessian.value(&v));
    let h = symmetrize(&lerp_s3m3(&mu, &hessians));
    let kind = CriticalPointType::classify(&symmetric_eigenvalues(&h));
    if !parameters.accepted_types.contains(kind.flag()) {
        return None;
    }

    let positions = vertices.map(|[i, j, k]| {
        Vector3::new(R::from_coord(i), R::from_coord(j), R::from_coord(k))
    });
    let values = vertices.map(|v| field.value(&v));
    Some(CriticalPoint {
        position: lerp_s3v3(&mu, &positions),
        value: lerp_s3(&mu, &values),
        kind,
    })
}

/// Tests all simplices in the window and returns the found critical points with their simplex ids, sorted by id
pub fn find_critical_points<R: Real>(
    field: &ScalarField<R>,
    gradient: &GradientField<R>,
    hessian: &HessianField<R>,
    bounds: &TraversalBounds,
    parameters: &Parameters<R>,
) -> Vec<(usize, CriticalPoint<R>)> {
    profile!("find_critical_points");

    let dims = field.dims();
    info!(
        "Testing {} simplices in window {:?}..={:?} for critical points.",
        bounds.num_simplices(),
        bounds.lo(),
        bounds.hi()
    );

    let found = Mutex::new(Vec::new());
    let process_slab = |k: usize| {
        for simplex in bounds.simplices_in_slab(k) {
            debug_assert!(bounds.is_valid(&simplex));
            if let Some(point) = check_simplex(&simplex, field, gradient, hessian, parameters) {
                found.lock().push((simplex.id(dims), point));
            }
        }
    };

    if parameters.enable_multi_threading {
        bounds
            .cube_range(Axis::Z)
            .into_par_iter()
            .for_each(process_slab);
    } else {
        bounds.cube_range(Axis::Z).for_each(process_slab);
    }

    let mut found = found.into_inner();
    found.sort_unstable_by_key(|(id, _)| *id);

    debug!("Found {} candidate critical points.", found.len());
    found
}

/// Merges critical points that are closer to each other than `merge_distance`
///
/// The input has to be sorted by simplex id. Of each group of close points only the one with the
/// lowest simplex id is kept. This removes the duplicates reported by all simplices that share a
/// vertex, edge or face on which a critical point lies.
pub fn merge_coincident_points<R: Real>(
    points: Vec<(usize, CriticalPoint<R>)>,
    merge_distance: R,
) -> Vec<(usize, CriticalPoint<R>)> {
    profile!("merge_coincident_points");

    if merge_distance <= R::zero() || points.len() < 2 {
        return points;
    }

    let num_candidates = points.len();
    let cell_of = |p: &Vector3<R>| -> [i64; 3] {
        let c = |x: R| (x / merge_distance).floor().to_i64().unwrap_or_default();
        [c(p.x), c(p.y), c(p.z)]
    };

    // Spatial hash of all kept points with a cell size of the merge distance
    let mut cells = new_map::<[i64; 3], Vec<usize>>();
    let mut kept: Vec<(usize, CriticalPoint<R>)> = Vec::with_capacity(points.len());

    for (id, point) in points {
        let cell = cell_of(&point.position);

        let mut is_duplicate = false;
        'search: for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let neighbor = [cell[0] + dx, cell[1] + dy, cell[2] + dz];
                    let Some(candidates) = cells.get(&neighbor) else {
                        continue;
                    };
                    if candidates.iter().any(|&i| {
                        (kept[i].1.position - point.position).norm() < merge_distance
                    }) {
                        is_duplicate = true;
                        break 'search;
                    }
                }
            }
        }

        if !is_duplicate {
            cells.entry(cell).or_default().push(kept.len());
            kept.push((id, point));
        }
    }

    if kept.len() < num_candidates {
        debug!(
            "Merged {} coincident critical points.",
            num_candidates - kept.len()
        );
    }
    kept
}

/// Runs the traversal and the optional merge and assembles the final [`FeatureSet`]
pub(crate) fn collect_feature_set<R: Real>(
    field: &ScalarField<R>,
    gradient: &GradientField<R>,
    hessian: &HessianField<R>,
    bounds: &TraversalBounds,
    parameters: &Parameters<R>,
) -> FeatureSet<R> {
    let mut found = find_critical_points(field, gradient, hessian, bounds, parameters);
    if let Some(merge_distance) = parameters.merge_distance {
        found = merge_coincident_points(found, merge_distance);
    }

    FeatureSet::from_points(found.into_iter().map(|(_, p)| p).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64, z: f64) -> CriticalPoint<f64> {
        CriticalPoint {
            position: Vector3::new(x, y, z),
            value: 1.0,
            kind: CriticalPointType::Maximum,
        }
    }

    #[test]
    fn test_classification() {
        use CriticalPointType::*;
        assert_eq!(CriticalPointType::classify(&[-0.1, -2.0, -3.0]), Maximum);
        assert_eq!(CriticalPointType::classify(&[3.0f32, 2.0, 1e-6]), Minimum);
        assert_eq!(CriticalPointType::classify(&[1.0, -1.0, -2.0]), Saddle);
        assert_eq!(CriticalPointType::classify(&[0.0, 0.0, 0.0]), Degenerate);
        assert_eq!(CriticalPointType::classify(&[-1.0, -2.0, -0.0]), Degenerate);
    }

    #[test]
    fn test_type_names() {
        for t in CriticalPointType::ALL {
            assert_eq!(t.to_string().parse::<CriticalPointType>(), Ok(t));
        }
        assert_eq!(
            " Saddle".parse::<CriticalPointType>(),
            Ok(CriticalPointType::Saddle)
        );
        assert!("peak".parse::<CriticalPointType>().is_err());
    }

    #[test]
    fn test_default_flags_accept_only_maxima() {
        let flags = CriticalPointTypeFlags::default();
        assert!(flags.contains(CriticalPointType::Maximum.flag()));
        assert!(!flags.contains(CriticalPointType::Minimum.flag()));
        assert!(!flags.contains(CriticalPointType::Saddle.flag()));
        assert!(!flags.contains(CriticalPointType::Degenerate.flag()));
    }

    #[test]
    fn test_merge_keeps_lowest_id() {
        let points = vec![
            (3, point(5.0, 5.0, 5.0)),
            (7, point(5.0, 5.0, 5.0 + 1e-9)),
            (8, point(6.0, 5.0, 5.0)),
            (12, point(5.0 - 1e-9, 5.0, 5.0)),
        ];
        let merged = merge_coincident_points(points, 1e-6);
        let ids = merged.iter().map(|(id, _)| *id).collect::<Vec<_>>();
        assert_eq!(ids, vec![3, 8]);
    }

    #[test]
    fn test_merge_across_cell_boundaries() {
        // Points on both sides of a hash cell boundary
        let points = vec![(0, point(1.0 - 1e-8, 0.0, 0.0)), (1, point(1.0 + 1e-8, 0.0, 0.0))];
        assert_eq!(merge_coincident_points(points.clone(), 1e-6).len(), 1);
        assert_eq!(merge_coincident_points(points, 0.0).len(), 2);
    }

    #[test]
    fn test_feature_set_rows() {
        let set = FeatureSet::from_points(vec![point(1.0, 2.0, 3.0), point(4.0, 5.0, 6.0)]);
        let rows = set.to_rows();
        assert_eq!(rows, vec![[1.0, 2.0, 3.0, 1.0], [4.0, 5.0, 6.0, 1.0]]);
        assert_eq!(FeatureSet::from_rows(&rows, CriticalPointType::Maximum), set);
        assert_eq!(set.count_of(CriticalPointType::Maximum), 2);
        assert_eq!(set.count_of(CriticalPointType::Saddle), 0);
    }
}
