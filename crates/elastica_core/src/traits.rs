use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can carry the solver's mechanical state.
/// Must support basic arithmetic, debug printing, and conversion from f64.
///
/// The whole pipeline is generic over this so a chain solved in `f64` can be
/// mirrored in `f32` (e.g. for a GPU-resident copy of the element buffer).
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}
