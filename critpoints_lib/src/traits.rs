use std::fmt::Debug;

use bytemuck::Pod;
use nalgebra::RealField;
use num_traits::{Bounded, FromPrimitive, NumCast, ToPrimitive};

/// Convenience trait that combines `Send` and `Sync`
pub trait ThreadSafe: Sync + Send {}
impl<T> ThreadSafe for T where T: Sync + Send {}

/// Trait that has to be implemented for types to be used as scalar field samples and coordinates in the context of the library
pub trait Real:
RealField
+ Bounded
+ Copy
+ FromPrimitive
+ ToPrimitive
+ NumCast
+ Debug
+ Default
+ Pod
+ ThreadSafe
{
    /// Tries to convert this value to another [`Real`] type `T` by converting first to `f64` followed by `T::from_f64`. If the value cannot be represented by the target type, `None` is returned.
    fn try_convert<T: Real>(self) -> Option<T> {
        T::from_f64(self.to_f64()?)
    }

    /// Converts a `usize` grid coordinate into this type, panics if the value cannot be represented
    fn from_coord(coord: usize) -> Self {
        Self::from_usize(coord).expect("grid coordinate has to be representable by the real type")
    }

    /// Returns the value `0.5`
    fn half() -> Self {
        Self::from_f64(0.5).unwrap()
    }

    /// Converts this value to `f64`, panics if the conversion fails (never the case for `f32` and `f64`)
    fn to_f64_unchecked(self) -> f64 {
        self.to_f64().unwrap()
    }
}

impl<
        T: RealField
            + Bounded
            + Copy
            + FromPrimitive
            + ToPrimitive
            + NumCast
            + Debug
            + Default
            + Pod
            + ThreadSafe
            + 'static,
    > Real for T
{
}
