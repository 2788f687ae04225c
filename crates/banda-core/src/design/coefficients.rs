//! Normalized difference-equation coefficients.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::f64::consts::TAU;

use num_complex::Complex64;

use crate::Sample;
use crate::math::linear_to_db;

/// Feed-forward and feedback taps of a rational transfer function.
///
/// The leading feedback coefficient is implicitly 1 and the feedback sign is
/// folded in, so the difference equation reads:
///
/// ```text
/// y[n] = b[0]*x[n] + b[1]*x[n-1] + ... + b[N]*x[n-N]
///                  + a[0]*y[n-1] + ... + a[N-1]*y[n-N]
/// ```
///
/// `b` always holds `order + 1` taps and `a` holds `order` taps.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients<T> {
    b: Vec<T>,
    a: Vec<T>,
}

impl<T: Sample> Coefficients<T> {
    /// Passthrough coefficients of the given order: `y[n] = x[n]`.
    pub fn passthrough(order: usize) -> Self {
        let mut b = vec![T::zero(); order + 1];
        b[0] = T::one();
        Self {
            b,
            a: vec![T::zero(); order],
        }
    }

    /// Filter order (number of feedback taps).
    pub fn order(&self) -> usize {
        self.a.len()
    }

    /// Feed-forward taps, `b[0]` applies to the current input.
    pub fn b(&self) -> &[T] {
        &self.b
    }

    /// Feedback taps with the sign folded in, `a[0]` applies to `y[n-1]`.
    pub fn a(&self) -> &[T] {
        &self.a
    }

    /// Converts the taps to another sample precision.
    pub fn cast<U: Sample>(&self) -> Coefficients<U> {
        Coefficients {
            b: self.b.iter().map(|&v| U::from_f64(v.into_f64())).collect(),
            a: self.a.iter().map(|&v| U::from_f64(v.into_f64())).collect(),
        }
    }

    /// Complex frequency response `H(e^{jω})` at `freq_hz`.
    pub fn response_at(&self, freq_hz: f64, sample_rate: f64) -> Complex64 {
        let omega = TAU * freq_hz / sample_rate;
        // z^-1 on the unit circle
        let z_inv = Complex64::new(libm::cos(omega), -libm::sin(omega));

        let mut num = Complex64::new(0.0, 0.0);
        let mut power = Complex64::new(1.0, 0.0);
        for &tap in &self.b {
            num += power * tap.into_f64();
            power *= z_inv;
        }

        let mut den = Complex64::new(1.0, 0.0);
        let mut power = z_inv;
        for &tap in &self.a {
            den -= power * tap.into_f64();
            power *= z_inv;
        }

        num / den
    }

    /// Magnitude of the frequency response at `freq_hz`.
    pub fn magnitude_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        self.response_at(freq_hz, sample_rate).norm()
    }

    /// Magnitude of the frequency response at `freq_hz` in dB.
    pub fn magnitude_db_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        linear_to_db(self.magnitude_at(freq_hz, sample_rate))
    }

    /// Gain at 0 Hz: `Σb / (1 - Σa)`.
    pub fn dc_gain(&self) -> f64 {
        let num: f64 = self.b.iter().map(|&v| v.into_f64()).sum();
        let den: f64 = 1.0 - self.a.iter().map(|&v| v.into_f64()).sum::<f64>();
        num / den
    }
}

impl Coefficients<f64> {
    /// Builds coefficients from numerator and denominator polynomials in
    /// descending powers of `z` (equivalently ascending powers of `z^-1`).
    ///
    /// Both are normalized by `den[0]`. The shorter polynomial is padded with
    /// trailing zeros so that `b` and `a` describe the same order.
    pub fn from_polynomials(num: &[f64], den: &[f64]) -> Self {
        debug_assert!(!den.is_empty() && den[0] != 0.0, "leading denominator must be non-zero");
        let len = num.len().max(den.len());
        let norm = 1.0 / den[0];

        let b = (0..len)
            .map(|i| num.get(i).copied().unwrap_or(0.0) * norm)
            .collect();
        let a = (1..len)
            .map(|i| -den.get(i).copied().unwrap_or(0.0) * norm)
            .collect();

        Self { b, a }
    }
}
