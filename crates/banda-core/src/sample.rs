//! Sample type abstraction.
//!
//! Runtime components are generic over the sample precision. Design math is
//! always carried out in `f64` and converted once at setup time.

use core::fmt::Debug;
use num_traits::Float;

/// Floating-point sample type accepted by every streaming component.
///
/// Implemented for `f32` and `f64`.
pub trait Sample: Float + Default + Debug + Send + Sync + 'static {
    /// Converts a design-domain value into the sample type.
    fn from_f64(value: f64) -> Self;

    /// Widens the sample into the design domain.
    fn into_f64(self) -> f64;
}

impl Sample for f32 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn into_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Sample for f64 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn into_f64(self) -> f64 {
        self
    }
}
