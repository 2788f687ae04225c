//! Cascades of first- and second-order sections.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use num_complex::Complex64;

use super::Coefficients;
use super::zpk::poly_mul;
use crate::Sample;
use crate::math::linear_to_db;

/// A transfer function factored into sections of order one or two.
///
/// Running a high-order filter as one difference equation loses precision
/// once poles crowd near `z = 1` (low cutoffs, high orders); each section
/// here holds at most one conjugate pole pair, so its taps stay well
/// conditioned. The response is the product of the section responses.
#[derive(Debug, Clone, PartialEq)]
pub struct Cascade<T> {
    sections: Vec<Coefficients<T>>,
}

impl<T: Sample> Cascade<T> {
    /// Wraps already factored sections, run in the given order.
    pub fn new(sections: Vec<Coefficients<T>>) -> Self {
        Self { sections }
    }

    /// The sections, first to last.
    pub fn sections(&self) -> &[Coefficients<T>] {
        &self.sections
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True when there are no sections (a wire).
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total order across all sections.
    pub fn order(&self) -> usize {
        self.sections.iter().map(Coefficients::order).sum()
    }

    /// Converts every section to another sample precision.
    pub fn cast<U: Sample>(&self) -> Cascade<U> {
        Cascade {
            sections: self.sections.iter().map(Coefficients::cast).collect(),
        }
    }

    /// Complex frequency response at `freq_hz`.
    pub fn response_at(&self, freq_hz: f64, sample_rate: f64) -> Complex64 {
        self.sections
            .iter()
            .map(|s| s.response_at(freq_hz, sample_rate))
            .product()
    }

    /// Magnitude of the frequency response at `freq_hz`.
    pub fn magnitude_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        self.response_at(freq_hz, sample_rate).norm()
    }

    /// Magnitude of the frequency response at `freq_hz` in dB.
    pub fn magnitude_db_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        linear_to_db(self.magnitude_at(freq_hz, sample_rate))
    }

    /// Gain at 0 Hz.
    pub fn dc_gain(&self) -> f64 {
        self.sections.iter().map(Coefficients::dc_gain).product()
    }
}

impl Cascade<f64> {
    /// Multiplies the sections out into a single set of taps.
    ///
    /// The expanded form is for inspection; at high orders it is too poorly
    /// conditioned to run or to evaluate near DC.
    pub fn expand(&self) -> Coefficients<f64> {
        let mut num = vec![1.0];
        let mut den = vec![1.0];
        for section in &self.sections {
            num = poly_mul(&num, section.b());
            let feedback: Vec<f64> = core::iter::once(1.0)
                .chain(section.a().iter().map(|&a| -a))
                .collect();
            den = poly_mul(&den, &feedback);
        }
        Coefficients::from_polynomials(&num, &den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_multiplies_sections() {
        // (1 + z^-1)/(1 - 0.5 z^-1) twice
        let first = Coefficients::from_polynomials(&[1.0, 1.0], &[1.0, -0.5]);
        let cascade = Cascade::new(vec![first.clone(), first]);
        let expanded = cascade.expand();
        assert_eq!(expanded.b(), &[1.0, 2.0, 1.0]);
        assert_eq!(expanded.a(), &[1.0, -0.25]);
        assert_eq!(cascade.order(), 2);
    }

    #[test]
    fn test_response_is_product_of_sections() {
        let lp = Coefficients::from_polynomials(&[0.2, 0.2], &[1.0, -0.6]);
        let bp = Coefficients::from_polynomials(&[0.1, 0.0, -0.1], &[1.0, -1.2, 0.5]);
        let cascade = Cascade::new(vec![lp.clone(), bp.clone()]);
        for f in [0.0, 250.0, 4000.0, 20000.0] {
            let expected = lp.response_at(f, 48000.0) * bp.response_at(f, 48000.0);
            assert!((cascade.response_at(f, 48000.0) - expected).norm() < 1e-12);
        }
        assert!((cascade.dc_gain() - lp.dc_gain() * bp.dc_gain()).abs() < 1e-12);
        assert!((cascade.expand().dc_gain() - cascade.dc_gain()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_cascade_is_a_wire() {
        let cascade = Cascade::<f64>::new(Vec::new());
        assert!(cascade.is_empty());
        assert_eq!(cascade.dc_gain(), 1.0);
        assert_eq!(cascade.expand(), Coefficients::passthrough(0));
    }
}
