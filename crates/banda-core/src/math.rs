//! Mathematical utility functions for filter design.
//!
//! All functions work in `f64` (the design domain) and are `no_std` friendly.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Design Helpers
//!
//! - [`prewarp`] - Bilinear prewarping of an analog frequency
//! - [`sinc`] - Normalized sinc, used by the windowed-sinc FIR bank
//! - [`hamming`] - Hamming window value
//! - [`flush_denormal`] - Snap subnormal-range values to zero

use core::f64::consts::PI;
use libm::{cos, exp, log, sin, tan};

use crate::Sample;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use banda_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 1e-12);
/// assert!((db_to_linear(-6.0206) - 0.5).abs() < 1e-4);
/// ```
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f64 = core::f64::consts::LN_10 / 20.0;
    exp(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Values at or below 1e-20 are clamped to avoid `-inf`.
///
/// # Example
/// ```rust
/// use banda_core::linear_to_db;
///
/// assert!(linear_to_db(1.0).abs() < 1e-12);
/// ```
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    const FACTOR: f64 = 20.0 / core::f64::consts::LN_10;
    log(linear.max(1e-20)) * FACTOR
}

/// Prewarped analog angular frequency for the bilinear transform.
///
/// `2·fs·tan(π·f/fs)`: the analog frequency that lands exactly on `freq_hz`
/// after the bilinear substitution at `sample_rate`.
#[inline]
pub fn prewarp(freq_hz: f64, sample_rate: f64) -> f64 {
    2.0 * sample_rate * tan(PI * freq_hz / sample_rate)
}

/// Normalized sinc: `sin(πx)/(πx)`, with `sinc(0) = 1`.
#[inline]
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        sin(PI * x) / (PI * x)
    }
}

/// Hamming window of length `order + 1` evaluated at tap `n`.
///
/// `0.54 - 0.46·cos(2πn/order)`; an order of 0 yields the single tap 1.0.
#[inline]
pub fn hamming(n: usize, order: usize) -> f64 {
    if order == 0 {
        return 1.0;
    }
    0.54 - 0.46 * cos(2.0 * PI * n as f64 / order as f64)
}

/// Flush subnormal-range values to zero.
///
/// Anything with magnitude below 1e-20 becomes exactly zero, leaving margin
/// before the IEEE 754 subnormal range where arithmetic slows down sharply.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal<T: Sample>(x: T) -> T {
    if x.abs() < T::from_f64(1e-20) {
        T::zero()
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_linear_roundtrip() {
        let original = 0.5;
        let back = db_to_linear(linear_to_db(original));
        assert!((original - back).abs() < 1e-12);
    }

    #[test]
    fn test_prewarp_low_frequency_is_nearly_linear() {
        // tan(x) ~ x for small x, so 2·fs·tan(π f/fs) ~ 2π f
        let w = prewarp(10.0, 48000.0);
        assert!((w - 2.0 * PI * 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_sinc_zeros() {
        assert_eq!(sinc(0.0), 1.0);
        for k in 1..5 {
            assert!(sinc(k as f64).abs() < 1e-15);
        }
        assert!((sinc(0.5) - 2.0 / PI).abs() < 1e-15);
    }

    #[test]
    fn test_hamming_shape() {
        let order = 64;
        assert!((hamming(0, order) - 0.08).abs() < 1e-12);
        assert!((hamming(order / 2, order) - 1.0).abs() < 1e-12);
        assert!((hamming(order, order) - 0.08).abs() < 1e-12);
        assert_eq!(hamming(0, 0), 1.0);
    }

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1.0f32), 1.0);
        assert_eq!(flush_denormal(-0.5f64), -0.5);
        assert_eq!(flush_denormal(1e-21f32), 0.0);
        assert_eq!(flush_denormal(-1e-30f64), 0.0);
    }
}
