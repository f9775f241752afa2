//! Small dense numeric kernels used per simplex: barycentric interpolation and 3x3 eigenvalues

use std::cmp::Ordering;

use nalgebra::{Matrix3, Vector3, Vector4};

use crate::Real;

/// Inverse linear interpolation of a vector quantity given at the four vertices of a tetrahedron
///
/// Returns the barycentric coordinates `mu` (with `Σ mu_i = 1`) of the point where the linearly
/// interpolated vector field vanishes, i.e. `Σ mu_i v_i = 0`. The 3x3 system
/// `[v0-v3 | v1-v3 | v2-v3] mu' = -v3` is solved for the first three coordinates.
///
/// Returns `None` if the system is singular, the solution is not finite or the point lies outside
/// of the tetrahedron, i.e. if any coordinate is smaller than `-tolerance`.
#[inline]
pub fn inverse_lerp_s3v3<R: Real>(v: &[Vector3<R>; 4], tolerance: R) -> Option<Vector4<R>> {
    let a = Matrix3::from_columns(&[v[0] - v[3], v[1] - v[3], v[2] - v[3]]);
    let mu_head = a.try_inverse()? * (-v[3]);
    let mu = Vector4::new(
        mu_head[0],
        mu_head[1],
        mu_head[2],
        R::one() - mu_head.sum(),
    );

    if mu.iter().all(|m| m.is_finite() && *m >= -tolerance) {
        Some(mu)
    } else {
        None
    }
}

/// Linear interpolation of scalar vertex values with barycentric coordinates
#[inline(always)]
pub fn lerp_s3<R: Real>(mu: &Vector4<R>, values: &[R; 4]) -> R {
    mu[0] * values[0] + mu[1] * values[1] + mu[2] * values[2] + mu[3] * values[3]
}

/// Linear interpolation of vector vertex values with barycentric coordinates
#[inline(always)]
pub fn lerp_s3v3<R: Real>(mu: &Vector4<R>, values: &[Vector3<R>; 4]) -> Vector3<R> {
    values[0] * mu[0] + values[1] * mu[1] + values[2] * mu[2] + values[3] * mu[3]
}

/// Linear interpolation of matrix vertex values with barycentric coordinates
#[inline(always)]
pub fn lerp_s3m3<R: Real>(mu: &Vector4<R>, values: &[Matrix3<R>; 4]) -> Matrix3<R> {
    values[0] * mu[0] + values[1] * mu[1] + values[2] * mu[2] + values[3] * mu[3]
}

/// Returns the symmetric part `(m + mᵀ) / 2` of the matrix
#[inline(always)]
pub fn symmetrize<R: Real>(m: &Matrix3<R>) -> Matrix3<R> {
    (m + m.transpose()) * R::half()
}

/// Closed form eigenvalues of a symmetric 3x3 matrix, sorted in descending order
///
/// Uses the trigonometric solution of the characteristic polynomial (Smith, 1961). Only the upper
/// triangle of the matrix is read.
pub fn symmetric_eigenvalues<R: Real>(m: &Matrix3<R>) -> [R; 3] {
    let (a00, a11, a22) = (m[(0, 0)], m[(1, 1)], m[(2, 2)]);
    let (a01, a02, a12) = (m[(0, 1)], m[(0, 2)], m[(1, 2)]);

    let p1 = a01 * a01 + a02 * a02 + a12 * a12;
    let mut eigenvalues = if p1 == R::zero() {
        [a00, a11, a22]
    } else {
        let three = R::from_f64(3.0).unwrap_or_else(R::one);
        let two = R::one() + R::one();

        let q = (a00 + a11 + a22) / three;
        let (d0, d1, d2) = (a00 - q, a11 - q, a22 - q);
        let p2 = d0 * d0 + d1 * d1 + d2 * d2 + two * p1;
        let p = (p2 / (three * two)).sqrt();

        // det((A - qI) / p) / 2
        let b = Matrix3::new(d0, a01, a02, a01, d1, a12, a02, a12, d2) / p;
        let r = b.determinant() * R::half();
        let r = if r <= -R::one() {
            -R::one()
        } else if r >= R::one() {
            R::one()
        } else {
            r
        };

        let phi = r.acos() / three;
        let e1 = q + two * p * phi.cos();
        let e3 = q + two * p * (phi + R::two_pi() / three).cos();
        let e2 = three * q - e1 - e3;
        [e1, e2, e3]
    };

    eigenvalues.sort_unstable_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    eigenvalues
}
