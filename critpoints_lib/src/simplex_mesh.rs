//! Implicit simplicial mesh of a regular grid using the Freudenthal (Kuhn) decomposition
//!
//! Every unit cube of the grid with lower corner `c` is split into six tetrahedra that share the
//! main diagonal of the cube. There is one tetrahedron per permutation `(a0, a1, a2)` of the axes,
//! its vertices are `c`, `c + e_a0`, `c + e_a0 + e_a1` and `c + e_a0 + e_a1 + e_a2`. The
//! decomposition is consistent across neighboring cubes, i.e. shared faces are split identically.

use std::ops::Range;

use itertools::iproduct;

use crate::scalar_field::GridDims;
use crate::topology::Axis;

/// Number of simplices per unit cube of the grid
pub const SIMPLICES_PER_CUBE: usize = 6;

/// A tetrahedron of the Freudenthal decomposition identified by its cube and axis permutation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Simplex {
    cube: [usize; 3],
    permutation: usize,
}

/// Inclusive per-axis window `[lo, hi]` of grid samples, a simplex is only traversed if all its vertices are inside
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TraversalBounds {
    lo: [usize; 3],
    hi: [usize; 3],
}

impl Simplex {
    /// Constructs the simplex of the given permutation index (`0..6`, see [`Axis::permutations`]) in the cube with the given lower corner
    pub fn new(cube: [usize; 3], permutation: usize) -> Option<Self> {
        (permutation < SIMPLICES_PER_CUBE).then_some(Self { cube, permutation })
    }

    /// Reconstructs a simplex from its flat id, returns `None` if the cube is not part of the grid
    pub fn from_id(id: usize, dims: &GridDims) -> Option<Self> {
        let cube = dims.try_unflatten(id / SIMPLICES_PER_CUBE)?;
        Self::new(cube, id % SIMPLICES_PER_CUBE)
    }

    /// Lower corner of the cube containing this simplex
    #[inline(always)]
    pub fn cube(&self) -> &[usize; 3] {
        &self.cube
    }

    /// Index of the axis permutation of this simplex
    #[inline(always)]
    pub fn permutation(&self) -> usize {
        self.permutation
    }

    /// Unique flat id of the simplex: `6 * flat_cube_index + permutation`
    ///
    /// The flat cube index is the flat sample index of the lower corner of the cube. Ids are
    /// ordered like the samples of the grid, i.e. with x varying fastest.
    #[inline(always)]
    pub fn id(&self, dims: &GridDims) -> usize {
        SIMPLICES_PER_CUBE * dims.flat_index(&self.cube) + self.permutation
    }

    /// Returns the four vertices of the simplex in path order from the lower to the upper cube corner
    /// ```
    /// use critpoints_lib::simplex_mesh::Simplex;
    /// let simplex = Simplex::new([3, 4, 5], 2).unwrap();
    /// assert_eq!(simplex.vertices(), [[3, 4, 5], [3, 5, 5], [4, 5, 5], [4, 5, 6]]);
    /// ```
    #[inline(always)]
    pub fn vertices(&self) -> [[usize; 3]; 4] {
        let mut vertices = [self.cube; 4];
        for (step, axis) in Axis::permutations()[self.permutation].iter().enumerate() {
            for vertex in vertices.iter_mut().skip(step + 1) {
                vertex[axis.dim()] += 1;
            }
        }
        vertices
    }
}

impl TraversalBounds {
    /// Constructs an inclusive window from its lower and upper sample coordinates per axis
    pub fn new(lo: [usize; 3], hi: [usize; 3]) -> Self {
        Self { lo, hi }
    }

    /// The default window of a grid: all samples with a valid Hessian, i.e. `[2, dim - 3]` on every axis
    ///
    /// The window is empty on every axis with less than six samples.
    pub fn interior_of(dims: &GridDims) -> Self {
        let n = dims.as_array();
        Self {
            lo: [2; 3],
            hi: [
                n[0].saturating_sub(3),
                n[1].saturating_sub(3),
                n[2].saturating_sub(3),
            ],
        }
    }

    /// Intersects the window with the [interior](Self::interior_of) of the given grid
    ///
    /// Samples outside of `[2, dim - 3]` carry no valid Hessian, so a user provided window never
    /// reaches past it.
    pub fn clamped_to(&self, dims: &GridDims) -> Self {
        let interior = Self::interior_of(dims);
        Self {
            lo: [0, 1, 2].map(|d| self.lo[d].max(interior.lo[d])),
            hi: [0, 1, 2].map(|d| self.hi[d].min(interior.hi[d])),
        }
    }

    /// Lower end of the window
    pub fn lo(&self) -> &[usize; 3] {
        &self.lo
    }

    /// Upper end of the window (inclusive)
    pub fn hi(&self) -> &[usize; 3] {
        &self.hi
    }

    /// Returns whether the given sample lies inside of the window
    #[inline(always)]
    pub fn contains(&self, ijk: &[usize; 3]) -> bool {
        (0..3).all(|d| self.lo[d] <= ijk[d] && ijk[d] <= self.hi[d])
    }

    /// Returns whether all vertices of the simplex lie inside of the window
    #[inline(always)]
    pub fn is_valid(&self, simplex: &Simplex) -> bool {
        simplex.vertices().iter().all(|v| self.contains(v))
    }

    /// Range of lower cube corner coordinates along the axis whose cubes are completely inside of the window
    #[inline(always)]
    pub fn cube_range(&self, axis: Axis) -> Range<usize> {
        let d = axis.dim();
        self.lo[d]..self.hi[d]
    }

    /// Returns whether there is no simplex inside of the window
    pub fn is_empty(&self) -> bool {
        Axis::all_possible()
            .iter()
            .any(|&axis| self.cube_range(axis).is_empty())
    }

    /// Number of simplices that are completely inside of the window, `6 * Π max(0, hi - lo)`
    pub fn num_simplices(&self) -> usize {
        SIMPLICES_PER_CUBE
            * Axis::all_possible()
                .iter()
                .map(|&axis| self.cube_range(axis).len())
                .product::<usize>()
    }

    /// Iterator over the lower corners of all cubes inside of the window in the z-slab with the given coordinate
    pub fn cubes_in_slab(&self, k: usize) -> impl Iterator<Item = [usize; 3]> + use<> {
        let slab = if self.cube_range(Axis::Z).contains(&k) {
            k..k + 1
        } else {
            k..k
        };
        iproduct!(slab, self.cube_range(Axis::Y), self.cube_range(Axis::X))
            .map(|(k, j, i)| [i, j, k])
    }

    /// Iterator over all simplices inside of the window in the z-slab with the given coordinate, in ascending id order
    pub fn simplices_in_slab(&self, k: usize) -> impl Iterator<Item = Simplex> + use<> {
        self.cubes_in_slab(k).flat_map(|cube| {
            (0..SIMPLICES_PER_CUBE).map(move |permutation| Simplex { cube, permutation })
        })
    }

    /// Iterator over all simplices inside of the window, in ascending id order
    pub fn simplices(&self) -> impl Iterator<Item = Simplex> + use<> {
        let bounds = *self;
        self.cube_range(Axis::Z)
            .flat_map(move |k| bounds.simplices_in_slab(k))
    }
}
