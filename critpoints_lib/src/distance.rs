//! Count based distance between two feature sets
//!
//! Used to quantify how many topological features of a field are lost (or spuriously created) by
//! a lossy reconstruction. By convention the first set is extracted from the original data and the
//! second from the reconstruction.

use crate::{FeatureSet, Real};

/// Difference of the number of critical points of two feature sets
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct FeatureDistance {
    /// `|a| - |b|`, positive if the first set has more features
    pub difference: i64,
    /// The difference relative to the mean size of both sets, `0.0` if both are empty
    pub normalized: f64,
}

/// One row of a comparison report: the feature counts of a pair of fields and their distance
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct DistanceRecord {
    /// Index of the time step or file pair
    pub step: usize,
    /// Number of critical points of the first (original) field
    pub n_first: usize,
    /// Number of critical points of the second (reconstructed) field
    pub n_second: usize,
    /// Distance of the two feature sets
    pub distance: FeatureDistance,
}

impl DistanceRecord {
    /// Compares the two feature sets and records the result for the given step
    pub fn new<R: Real>(step: usize, first: &FeatureSet<R>, second: &FeatureSet<R>) -> Self {
        Self {
            step,
            n_first: first.len(),
            n_second: second.len(),
            distance: distance(first, second),
        }
    }
}

/// Computes the [`FeatureDistance`] from the sizes of two feature sets
/// ```
/// use critpoints_lib::distance::distance_from_counts;
/// let d = distance_from_counts(3, 1);
/// assert_eq!(d.difference, 2);
/// assert_eq!(d.normalized, 1.0);
/// ```
pub fn distance_from_counts(len_a: usize, len_b: usize) -> FeatureDistance {
    if len_a == 0 && len_b == 0 {
        return FeatureDistance::default();
    }

    let difference = len_a as i64 - len_b as i64;
    let mean = (len_a as f64 + len_b as f64) / 2.0;
    FeatureDistance {
        difference,
        normalized: difference as f64 / mean,
    }
}

/// Computes the [`FeatureDistance`] between two feature sets
pub fn distance<R: Real>(a: &FeatureSet<R>, b: &FeatureSet<R>) -> FeatureDistance {
    distance_from_counts(a.len(), b.len())
}
