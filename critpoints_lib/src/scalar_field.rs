//! Dense scalar fields sampled on a regular 3D grid
//!
//! Samples are stored in a flat array with the x-coordinate varying fastest, i.e. the flat index
//! of the sample at `[x, y, z]` is `x + nx * (y + ny * z)`. Data produced in C-order by a
//! simulation with shape `[s0, s1, s2]` corresponds to the dimensions `nx = s2`, `ny = s1`,
//! `nz = s0`, see [`GridDims::from_c_order_shape`].

use thiserror::Error as ThisError;

use crate::Real;

/// Number of samples along each axis of a regular 3D grid
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct GridDims {
    n: [usize; 3],
}

/// Error type for the construction of a [`GridDims`] or [`ScalarField`]
#[non_exhaustive]
#[derive(Copy, Clone, Eq, PartialEq, Debug, ThisError)]
pub enum FieldConstructionError {
    /// At least one axis of the grid has no samples
    #[error("degenerate grid dimensions supplied, every axis needs at least one sample")]
    ZeroExtent,
    /// The total number of samples cannot be represented by `usize`
    #[error("total number of samples of the grid {0}x{1}x{2} overflows usize")]
    TooManyPoints(usize, usize, usize),
    /// The length of the supplied sample data does not match the grid dimensions
    #[error("length of the sample data ({actual}) does not match the grid dimensions ({expected} samples expected)")]
    LengthMismatch { expected: usize, actual: usize },
}

impl GridDims {
    /// Constructs grid dimensions from the number of samples along x, y and z
    pub fn new(nx: usize, ny: usize, nz: usize) -> Result<Self, FieldConstructionError> {
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(FieldConstructionError::ZeroExtent);
        }

        nx.checked_mul(ny)
            .and_then(|nxy| nxy.checked_mul(nz))
            .ok_or(FieldConstructionError::TooManyPoints(nx, ny, nz))?;

        Ok(Self { n: [nx, ny, nz] })
    }

    /// Constructs grid dimensions from a C-order shape `[s0, s1, s2]` where the last axis varies fastest
    /// ```
    /// use critpoints_lib::GridDims;
    /// let dims = GridDims::from_c_order_shape([4, 5, 6]).unwrap();
    /// assert_eq!(dims.as_array(), &[6, 5, 4]);
    /// ```
    pub fn from_c_order_shape(shape: [usize; 3]) -> Result<Self, FieldConstructionError> {
        Self::new(shape[2], shape[1], shape[0])
    }

    /// Returns the number of samples along x, y and z
    #[inline(always)]
    pub fn as_array(&self) -> &[usize; 3] {
        &self.n
    }

    /// Returns the shape of the grid in C-order, i.e. `[nz, ny, nx]`
    pub fn c_order_shape(&self) -> [usize; 3] {
        [self.n[2], self.n[1], self.n[0]]
    }

    /// Returns the total number of samples of the grid
    #[inline(always)]
    pub fn num_points(&self) -> usize {
        self.n[0] * self.n[1] * self.n[2]
    }

    /// Returns whether the given index triplet refers to a sample of the grid
    #[inline(always)]
    pub fn contains(&self, ijk: &[usize; 3]) -> bool {
        ijk[0] < self.n[0] && ijk[1] < self.n[1] && ijk[2] < self.n[2]
    }

    /// Flattens an index triplet into the index of the sample in the flat data array, does not check bounds
    /// ```
    /// use critpoints_lib::GridDims;
    /// let dims = GridDims::new(3, 4, 5).unwrap();
    /// assert_eq!(dims.flat_index(&[1, 2, 3]), 1 + 3 * (2 + 4 * 3));
    /// ```
    #[inline(always)]
    pub fn flat_index(&self, ijk: &[usize; 3]) -> usize {
        ijk[0] + self.n[0] * (ijk[1] + self.n[1] * ijk[2])
    }

    /// Converts a flat sample index back into an index triplet, returns `None` if the index is out of range
    pub fn try_unflatten(&self, flat_index: usize) -> Option<[usize; 3]> {
        if flat_index >= self.num_points() {
            return None;
        }
        let [nx, ny, _] = self.n;
        Some([flat_index % nx, (flat_index / nx) % ny, flat_index / (nx * ny)])
    }
}

/// Dense, immutable scalar samples on a regular 3D grid
#[derive(Clone, Debug)]
pub struct ScalarField<R: Real> {
    dims: GridDims,
    data: Vec<R>,
}

impl<R: Real> ScalarField<R> {
    /// Constructs a scalar field by copying the given samples, the length of `data` has to match the number of grid points
    pub fn from_slice(dims: GridDims, data: &[R]) -> Result<Self, FieldConstructionError> {
        Self::from_vec(dims, data.to_vec())
    }

    /// Constructs a scalar field taking ownership of the given samples
    pub fn from_vec(dims: GridDims, data: Vec<R>) -> Result<Self, FieldConstructionError> {
        let expected = dims.num_points();
        if data.len() != expected {
            return Err(FieldConstructionError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { dims, data })
    }

    /// Constructs a scalar field by evaluating the given function at every grid point
    pub fn from_fn<F: FnMut([usize; 3]) -> R>(dims: GridDims, mut f: F) -> Self {
        let [nx, ny, nz] = *dims.as_array();
        let mut data = Vec::with_capacity(dims.num_points());
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    data.push(f([i, j, k]));
                }
            }
        }
        Self { dims, data }
    }

    /// Returns the dimensions of the grid of this field
    #[inline(always)]
    pub fn dims(&self) -> &GridDims {
        &self.dims
    }

    /// Returns the flat sample array
    #[inline(always)]
    pub fn data(&self) -> &[R] {
        self.data.as_slice()
    }

    /// Consumes the field and returns the flat sample array
    pub fn into_data(self) -> Vec<R> {
        self.data
    }

    /// Returns the sample at the given index triplet or `None` if it is outside of the grid
    #[inline(always)]
    pub fn get(&self, ijk: &[usize; 3]) -> Option<R> {
        self.dims
            .contains(ijk)
            .then(|| self.data[self.dims.flat_index(ijk)])
    }

    /// Returns the sample at the given index triplet, panics if it is outside of the grid
    #[inline(always)]
    pub fn value(&self, ijk: &[usize; 3]) -> R {
        assert!(
            self.dims.contains(ijk),
            "sample index {:?} out of bounds for grid {:?}",
            ijk,
            self.dims.as_array()
        );
        self.data[self.dims.flat_index(ijk)]
    }
}
