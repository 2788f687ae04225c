//! Closed-form second-order sections.
//!
//! Each kind is a normalized analog biquad `(β2·s² + β1·s + β0)/(α2·s² +
//! α1·s + α0)` mapped through the bilinear transform with the cutoff
//! prewarped to `c = tan(π·fc/fs)`. Substituting
//! `s = (1/c)·(1 - z⁻¹)/(1 + z⁻¹)` and multiplying through by `c²(1 + z⁻¹)²`:
//!
//! ```text
//! z⁰:  β2 + β1·c + β0·c²
//! z⁻¹: 2·(β0·c² - β2)
//! z⁻²: β2 - β1·c + β0·c²
//! ```
//!
//! and likewise for the denominator.

use core::f64::consts::{PI, SQRT_2};

use libm::{sqrt, tan};

use super::{Coefficients, SecondOrderKind};

/// Analog biquad numerator or denominator `[s², s, 1]`.
type AnalogQuadratic = [f64; 3];

pub(crate) fn design(
    kind: SecondOrderKind,
    freq_hz: f64,
    q: f64,
    gain: f64,
    sample_rate: f64,
) -> Coefficients<f64> {
    let (num, den) = analog_prototype(kind, q, gain);
    let c = tan(PI * freq_hz / sample_rate);
    Coefficients::from_polynomials(&bilinear(num, c), &bilinear(den, c))
}

fn bilinear([b2, b1, b0]: AnalogQuadratic, c: f64) -> [f64; 3] {
    let c2 = c * c;
    [b2 + b1 * c + b0 * c2, 2.0 * (b0 * c2 - b2), b2 - b1 * c + b0 * c2]
}

fn analog_prototype(kind: SecondOrderKind, q: f64, gain: f64) -> (AnalogQuadratic, AnalogQuadratic) {
    let resonant = [1.0, 1.0 / q, 1.0];
    let butterworth = [1.0, SQRT_2, 1.0];
    let boost = gain > 1.0;
    let v = if boost { gain } else { 1.0 / gain };

    match kind {
        SecondOrderKind::LowPass => ([0.0, 0.0, 1.0], resonant),
        SecondOrderKind::HighPass => ([1.0, 0.0, 0.0], resonant),
        SecondOrderKind::BandPass => ([0.0, 1.0 / q, 0.0], resonant),
        SecondOrderKind::AllPass => ([1.0, -1.0 / q, 1.0], resonant),
        SecondOrderKind::Peak => {
            let shaped = [1.0, v / q, 1.0];
            if boost { (shaped, resonant) } else { (resonant, shaped) }
        }
        SecondOrderKind::LowShelf => {
            let shaped = [1.0, sqrt(2.0 * v), v];
            if boost { (shaped, butterworth) } else { (butterworth, shaped) }
        }
        SecondOrderKind::HighShelf => {
            let shaped = [v, sqrt(2.0 * v), 1.0];
            if boost { (shaped, butterworth) } else { (butterworth, shaped) }
        }
    }
}
