//! Finite difference gradient and Hessian fields of a [`ScalarField`]
//!
//! Both derivatives use second order central differences. The gradient is only computed on the
//! interior of the grid excluding a one sample wide shell, the Hessian (central differences of the
//! gradient) only on the interior excluding a two sample wide shell. Values in these shells stay zero.

use std::ops::Range;

use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;

use crate::scalar_field::{GridDims, ScalarField};
use crate::topology::{Axis, Direction};
use crate::{Real, profile};

/// Per-sample gradient vectors of a scalar field
#[derive(Clone, Debug)]
pub struct GradientField<R: Real> {
    dims: GridDims,
    data: Vec<Vector3<R>>,
}

/// Per-sample Hessian matrices of a scalar field, both triangular halves are stored
#[derive(Clone, Debug)]
pub struct HessianField<R: Real> {
    dims: GridDims,
    data: Vec<Matrix3<R>>,
}

impl<R: Real> GradientField<R> {
    /// Returns the dimensions of the underlying grid
    pub fn dims(&self) -> &GridDims {
        &self.dims
    }

    /// Returns the flat array of gradients
    pub fn data(&self) -> &[Vector3<R>] {
        self.data.as_slice()
    }

    /// Returns the gradient at the given sample, panics if the sample is outside of the grid
    #[inline(always)]
    pub fn value(&self, ijk: &[usize; 3]) -> Vector3<R> {
        assert!(self.dims.contains(ijk));
        self.data[self.dims.flat_index(ijk)]
    }
}

impl<R: Real> HessianField<R> {
    /// Returns the dimensions of the underlying grid
    pub fn dims(&self) -> &GridDims {
        &self.dims
    }

    /// Returns the flat array of Hessians
    pub fn data(&self) -> &[Matrix3<R>] {
        self.data.as_slice()
    }

    /// Returns the Hessian at the given sample, panics if the sample is outside of the grid
    #[inline(always)]
    pub fn value(&self, ijk: &[usize; 3]) -> Matrix3<R> {
        assert!(self.dims.contains(ijk));
        self.data[self.dims.flat_index(ijk)]
    }
}

/// Range of sample coordinates along an axis with `n` samples that excludes a shell of the given width
#[inline(always)]
fn interior_range(n: usize, shell: usize) -> Range<usize> {
    shell..n.saturating_sub(shell)
}

/// Returns the neighbors one step in negative and positive direction along the axis
#[inline(always)]
fn axis_neighbors(ijk: &[usize; 3], axis: Axis) -> Option<([usize; 3], [usize; 3])> {
    Some((
        axis.with_direction(Direction::Negative)
            .apply_single_step(ijk)?,
        axis.with_direction(Direction::Positive)
            .apply_single_step(ijk)?,
    ))
}

/// Evaluates `f` for every interior sample, z-slab by z-slab, and writes the results into `data`
fn fill_interior<T, F>(
    dims: &GridDims,
    shell: usize,
    data: &mut [T],
    enable_multi_threading: bool,
    f: F,
) where
    T: Send,
    F: Fn(&[usize; 3]) -> T + Sync,
{
    let [nx, ny, nz] = *dims.as_array();
    let z_range = interior_range(nz, shell);

    let fill_slab = |k: usize, slab: &mut [T]| {
        if !z_range.contains(&k) {
            return;
        }
        for j in interior_range(ny, shell) {
            for i in interior_range(nx, shell) {
                slab[i + nx * j] = f(&[i, j, k]);
            }
        }
    };

    let slab_len = nx * ny;
    if enable_multi_threading {
        data.par_chunks_mut(slab_len)
            .enumerate()
            .for_each(|(k, slab)| fill_slab(k, slab));
    } else {
        data.chunks_mut(slab_len)
            .enumerate()
            .for_each(|(k, slab)| fill_slab(k, slab));
    }
}

/// Computes the gradient of the field using central differences on all samples that are not part of the outermost shell of the grid
pub fn compute_gradient<R: Real>(
    field: &ScalarField<R>,
    enable_multi_threading: bool,
) -> GradientField<R> {
    profile!("compute_gradient");

    let dims = *field.dims();
    let half = R::half();
    let mut data = vec![Vector3::zeros(); dims.num_points()];

    fill_interior(&dims, 1, &mut data, enable_multi_threading, |ijk| {
        let mut gradient = Vector3::zeros();
        for &axis in Axis::all_possible() {
            if let Some((minus, plus)) = axis_neighbors(ijk, axis) {
                gradient[axis.dim()] = (field.value(&plus) - field.value(&minus)) * half;
            }
        }
        gradient
    });

    GradientField { dims, data }
}

/// Computes the Hessian of the field from its gradient using central differences, `H[r][c] = ∂g_r/∂x_c`
///
/// Only samples that are not part of the two outermost shells of the grid get a Hessian assigned.
pub fn compute_hessian<R: Real>(
    gradient: &GradientField<R>,
    enable_multi_threading: bool,
) -> HessianField<R> {
    profile!("compute_hessian");

    let dims = *gradient.dims();
    let half = R::half();
    let mut data = vec![Matrix3::zeros(); dims.num_points()];

    fill_interior(&dims, 2, &mut data, enable_multi_threading, |ijk| {
        let mut hessian = Matrix3::zeros();
        for &axis in Axis::all_possible() {
            if let Some((minus, plus)) = axis_neighbors(ijk, axis) {
                let column = (gradient.value(&plus) - gradient.value(&minus)) * half;
                hessian.set_column(axis.dim(), &column);
            }
        }
        hessian
    });

    HessianField { dims, data }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_shell(ijk: &[usize; 3], dims: &GridDims, shell: usize) -> bool {
        (0..3).any(|d| ijk[d] < shell || ijk[d] + shell >= dims.as_array()[d])
    }

    #[test]
    fn test_gradient_of_linear_field_is_exact() {
        let dims = GridDims::new(5, 6, 7).unwrap();
        let field = ScalarField::from_fn(dims, |[i, j, k]| {
            2.0 * i as f64 + 3.0 * j as f64 - k as f64
        });
        let gradient = compute_gradient(&field, false);

        for flat in 0..dims.num_points() {
            let ijk = dims.try_unflatten(flat).unwrap();
            let g = gradient.value(&ijk);
            if on_shell(&ijk, &dims, 1) {
                assert_eq!(g, Vector3::zeros());
            } else {
                assert_eq!(g, Vector3::new(2.0, 3.0, -1.0));
            }
        }
    }

    #[test]
    fn test_derivatives_of_constant_field_vanish() {
        let dims = GridDims::new(6, 7, 5).unwrap();
        let field = ScalarField::from_fn(dims, |_| 3.25f64);

        for enable_multi_threading in [false, true] {
            let gradient = compute_gradient(&field, enable_multi_threading);
            assert!(gradient.data().iter().all(|g| *g == Vector3::zeros()));

            let hessian = compute_hessian(&gradient, enable_multi_threading);
            assert!(hessian.data().iter().all(|h| *h == Matrix3::zeros()));
        }
    }

    #[test]
    fn test_hessian_of_quadratic_field_is_exact() {
        let dims = GridDims::new(7, 6, 8).unwrap();
        let field = ScalarField::from_fn(dims, |[i, j, k]| {
            let (x, y, z) = (i as f64, j as f64, k as f64);
            x * x + x * y + 2.0 * z * z
        });
        let gradient = compute_gradient(&field, false);
        let hessian = compute_hessian(&gradient, false);

        let expected = Matrix3::new(2.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 4.0);
        for flat in 0..dims.num_points() {
            let ijk = dims.try_unflatten(flat).unwrap();
            let h = hessian.value(&ijk);
            if on_shell(&ijk, &dims, 2) {
                assert_eq!(h, Matrix3::zeros());
            } else {
                assert!((h - expected).abs().max() < 1e-12, "{:?}: {}", ijk, h);
            }
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dims = GridDims::new(9, 8, 10).unwrap();
        let field = ScalarField::from_fn(dims, |[i, j, k]| {
            ((i * 7 + j * 13 + k * 29) % 17) as f64 * 0.25
        });
        let seq_gradient = compute_gradient(&field, false);
        let par_gradient = compute_gradient(&field, true);
        assert_eq!(seq_gradient.data(), par_gradient.data());
        assert_eq!(
            compute_hessian(&seq_gradient, false).data(),
            compute_hessian(&par_gradient, true).data()
        );
    }

    #[test]
    fn test_tiny_grid_has_no_interior() {
        let dims = GridDims::new(2, 9, 9).unwrap();
        let field = ScalarField::from_fn(dims, |[i, j, k]| (i + j + k) as f32);
        let gradient = compute_gradient(&field, true);
        assert!(gradient.data().iter().all(|g| *g == Vector3::zeros()));
    }
}
