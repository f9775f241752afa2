//! Helper types for cartesian coordinate system topology: axes, directions along axes and axis permutations

use num_traits::{CheckedAdd, CheckedSub};

/// Direction along a coordinate axis
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Direction {
    Negative = 0,
    Positive = 1,
}

/// Abbreviated type alias for cartesian coordinate axes in 3D
pub type Axis = CartesianAxis3d;

/// The cartesian coordinate axes in 3D
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum CartesianAxis3d {
    /// The x-axis (varies fastest in flat sample indices)
    X = 0,
    /// The y-axis
    Y = 1,
    /// The z-axis (varies slowest in flat sample indices)
    Z = 2,
}

/// Identifies a direction along a specific cartesian axis
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DirectedAxis {
    pub axis: Axis,
    pub direction: Direction,
}

impl Direction {
    /// Returns whether the direction is positive
    #[inline(always)]
    pub const fn is_positive(&self) -> bool {
        matches!(self, Direction::Positive)
    }

    /// Adds or subtracts the given step from the value depending on the direction, returns `None` on overflow
    /// ```
    /// use critpoints_lib::topology::Direction;
    /// assert_eq!(Direction::Positive.checked_apply_step(27usize, 3), Some(30));
    /// assert_eq!(Direction::Negative.checked_apply_step(0usize, 1), None);
    /// ```
    #[inline(always)]
    pub fn checked_apply_step<N: CheckedAdd<Output = N> + CheckedSub<Output = N>>(
        &self,
        n: N,
        step: N,
    ) -> Option<N> {
        if self.is_positive() {
            n.checked_add(&step)
        } else {
            n.checked_sub(&step)
        }
    }
}

impl CartesianAxis3d {
    /// Returns a reference to an array containing all 3D cartesian axes in the order X, Y, Z
    /// ```
    /// use critpoints_lib::topology::Axis;
    /// assert_eq!(Axis::all_possible(), &[Axis::X, Axis::Y, Axis::Z]);
    /// ```
    #[inline(always)]
    pub const fn all_possible() -> &'static [Axis; 3] {
        &ALL_AXES
    }

    /// Converts the cartesian axis into the corresponding 3D dimension index (X=0, Y=1, Z=2)
    #[inline(always)]
    pub const fn dim(self) -> usize {
        self as usize
    }

    /// Returns all six permutations of the three axes in lexicographic order
    ///
    /// The position of a permutation in this array is its permutation index, which is part of the
    /// flat id of a simplex of the Freudenthal decomposition.
    /// ```
    /// use critpoints_lib::topology::Axis;
    /// assert_eq!(Axis::permutations()[0], [Axis::X, Axis::Y, Axis::Z]);
    /// assert_eq!(Axis::permutations()[5], [Axis::Z, Axis::Y, Axis::X]);
    /// ```
    #[inline(always)]
    pub const fn permutations() -> &'static [[Axis; 3]; 6] {
        &AXIS_PERMUTATIONS
    }

    /// Combines this coordinate axis with a direction into a [`DirectedAxis`]
    #[inline(always)]
    pub const fn with_direction(self, direction: Direction) -> DirectedAxis {
        DirectedAxis::new(self, direction)
    }
}

const ALL_AXES: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

const AXIS_PERMUTATIONS: [[Axis; 3]; 6] = [
    [Axis::X, Axis::Y, Axis::Z],
    [Axis::X, Axis::Z, Axis::Y],
    [Axis::Y, Axis::X, Axis::Z],
    [Axis::Y, Axis::Z, Axis::X],
    [Axis::Z, Axis::X, Axis::Y],
    [Axis::Z, Axis::Y, Axis::X],
];

impl DirectedAxis {
    /// Constructs a new directed axis
    #[inline(always)]
    pub const fn new(axis: Axis, direction: Direction) -> Self {
        Self { axis, direction }
    }

    /// Applies a single step in the direction of this directed axis to the given index triplet, returns `None` on overflow
    /// ```
    /// use critpoints_lib::topology::{Axis, Direction};
    /// assert_eq!(Axis::X.with_direction(Direction::Positive).apply_single_step(&[1, 2, 3]), Some([2, 2, 3]));
    /// assert_eq!(Axis::Z.with_direction(Direction::Negative).apply_single_step(&[1, 2, 0]), None);
    /// ```
    #[inline(always)]
    pub fn apply_single_step(&self, index: &[usize; 3]) -> Option<[usize; 3]> {
        let mut index = *index;
        index[self.axis.dim()] = self
            .direction
            .checked_apply_step(index[self.axis.dim()], 1)?;
        Some(index)
    }
}
