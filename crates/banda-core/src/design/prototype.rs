//! Normalized (1 rad/s) analog lowpass prototypes.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::f64::consts::PI;

use libm::{asinh, cos, cosh, pow, sin, sinh, sqrt};
use num_complex::Complex64;

use super::Zpk;
use crate::ConfigurationError;

/// Aberth iteration stops once every relative correction is below this.
const ROOT_TOLERANCE: f64 = 1e-14;
/// Seeded iteration settles in a handful of sweeps; past that the
/// corrections are rounding noise.
const ROOT_MAX_ITERATIONS: usize = 50;
/// Largest accepted `|p(z)| / Σ|c_k||z|^k` for a found root.
const BACKWARD_ERROR_LIMIT: f64 = 1e-12;

/// Highest Bessel order whose poles are found reliably in double precision.
pub const MAX_BESSEL_ORDER: usize = 20;

/// Analog prototype families.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Prototype {
    Butterworth,
    Bessel,
    Chebyshev2 { ripple_db: f64 },
}

impl Prototype {
    pub(crate) fn zpk(self, order: usize) -> Result<Zpk, ConfigurationError> {
        match self {
            Self::Butterworth => Ok(butterworth(order)),
            Self::Bessel => bessel(order),
            Self::Chebyshev2 { ripple_db } => Ok(chebyshev2(order, ripple_db)),
        }
    }
}

/// `-exp(jπm/(2N))` for the positive `m` of `-N+1, -N+3, ..., N-1`.
///
/// Each value returned has negative imaginary part; its conjugate is the
/// `-m` term.
fn half_plane_unit_roots(order: usize) -> impl Iterator<Item = Complex64> {
    let n = order as f64;
    (1..order)
        .rev()
        .step_by(2)
        .map(move |m| {
            let theta = PI * m as f64 / (2.0 * n);
            Complex64::new(-cos(theta), -sin(theta))
        })
}

/// Butterworth: poles evenly spaced on the left half of the unit circle.
pub(crate) fn butterworth(order: usize) -> Zpk {
    let mut poles = Vec::with_capacity(order);
    for q in half_plane_unit_roots(order) {
        poles.push(q);
        poles.push(q.conj());
    }
    if order % 2 == 1 {
        poles.push(Complex64::new(-1.0, 0.0));
    }
    Zpk {
        zeros: Vec::new(),
        poles,
        gain: 1.0,
    }
}

/// Chebyshev type II with `ripple_db` of stopband attenuation.
///
/// The stopband edge sits at 1 rad/s.
pub(crate) fn chebyshev2(order: usize, ripple_db: f64) -> Zpk {
    let n = order as f64;
    let epsilon = 1.0 / sqrt(pow(10.0, 0.1 * ripple_db) - 1.0);
    let mu = asinh(1.0 / epsilon) / n;

    // Zeros on the imaginary axis; the centre term is skipped for odd orders.
    let mut zeros = Vec::with_capacity(order);
    let mut m = order as isize - 1;
    while m > 0 {
        let w = 1.0 / sin(m as f64 * PI / (2.0 * n));
        zeros.push(Complex64::new(0.0, w));
        zeros.push(Complex64::new(0.0, -w));
        m -= 2;
    }

    let warp = |q: Complex64| 1.0 / Complex64::new(sinh(mu) * q.re, cosh(mu) * q.im);
    let mut poles = Vec::with_capacity(order);
    for q in half_plane_unit_roots(order) {
        let p = warp(q);
        poles.push(p);
        poles.push(p.conj());
    }
    if order % 2 == 1 {
        poles.push(Complex64::new(-1.0 / sinh(mu), 0.0));
    }

    let num: Complex64 = poles.iter().map(|&p| -p).product();
    let den: Complex64 = zeros.iter().map(|&z| -z).product();
    let gain = (num / den).re;

    Zpk { zeros, poles, gain }
}

/// Bessel (Thomson), normalized for phase: the asymptotic group delay is
/// `1/ω` as for the Butterworth prototype, which keeps the cutoffs of both
/// families comparable.
///
/// Fails with [`ConfigurationError::InvalidOrder`] when the poles cannot be
/// resolved into stable conjugate pairs, which does not happen up to
/// [`MAX_BESSEL_ORDER`].
pub(crate) fn bessel(order: usize) -> Result<Zpk, ConfigurationError> {
    let (coeffs, scale) = reverse_bessel_polynomial(order);
    let roots = aberth(&coeffs, bessel_seeds(order, scale))
        .ok_or(ConfigurationError::InvalidOrder(order))?;
    let poles = snap_conjugates(&roots);
    if poles.len() != order || poles.iter().any(|p| p.re >= 0.0) {
        return Err(ConfigurationError::InvalidOrder(order));
    }

    // Unity DC gain for the poles actually found, not the exact ones
    let gain = poles.iter().map(|&p| -p).product::<Complex64>().re;
    Ok(Zpk {
        zeros: Vec::new(),
        poles,
        gain,
    })
}

/// Monic reverse Bessel polynomial of `order`, ascending powers, rescaled so
/// the constant term is 1. Also returns the scale `r` applied to `s`.
fn reverse_bessel_polynomial(order: usize) -> (Vec<f64>, f64) {
    let n = order as f64;

    // a_k = (2N-k)!/(2^(N-k) k! (N-k)!), built down from a_N = 1
    let mut a = vec![0.0; order + 1];
    a[order] = 1.0;
    for k in (0..order).rev() {
        let kf = k as f64;
        a[k] = a[k + 1] * (2.0 * n - kf) * (kf + 1.0) / (2.0 * (n - kf));
    }

    // Substituting s·r with r = a_0^(1/N) and dividing by a_0 keeps the
    // polynomial monic and moves the roots by 1/r.
    let r = pow(a[0], 1.0 / n);
    let scaled = a
        .iter()
        .enumerate()
        .map(|(k, &ak)| ak * pow(r, k as f64 - n))
        .collect();
    (scaled, r)
}

/// Starting points for the roots of the rescaled reverse Bessel polynomial.
///
/// Campos and Calderón give an asymptotic fit for the zeros `x_k` of the
/// ordinary Bessel polynomial `y_N`; the reverse polynomial has its roots at
/// `1/x_k`, moved by the rescaling to `1/(x_k·r)`.
fn bessel_seeds(order: usize, scale: f64) -> Vec<Complex64> {
    if order == 1 {
        return vec![Complex64::new(-1.0 / scale, 0.0)];
    }
    let n = order as f64;
    let s = n * n * (2.0 + n * n * (n - 3.0));
    let b3 = (16.0 - 8.0 * n) / s;
    let b2 = (-24.0 - 12.0 * n + 12.0 * n * n) / s;
    let b1 = (8.0 + 24.0 * n - 12.0 * n * n - 2.0 * n * n * n) / s;
    let b0 = (-6.0 * n + 5.0 * n * n * n - n * n * n * n) / s;
    let r = n * n * (2.0 + n);
    let a1 = (-6.0 - 6.0 * n) / r;
    let a2 = 6.0 / r;

    (1..=order)
        .map(|k| {
            let k = k as f64;
            let x = Complex64::new(a1 * k + a2 * k * k, b0 + k * (b1 + k * (b2 + k * b3)));
            1.0 / (x * scale)
        })
        .collect()
}

fn evaluate(coeffs: &[f64], x: Complex64) -> Complex64 {
    coeffs
        .iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * x + c)
}

/// Aberth–Ehrlich simultaneous root refinement of a polynomial given in
/// ascending powers, starting from `roots`.
///
/// Returns `None` unless every root ends up with a backward error below
/// [`BACKWARD_ERROR_LIMIT`].
fn aberth(coeffs: &[f64], mut roots: Vec<Complex64>) -> Option<Vec<Complex64>> {
    let derivative: Vec<f64> = coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, &c)| c * k as f64)
        .collect();

    for _ in 0..ROOT_MAX_ITERATIONS {
        let mut largest_step: f64 = 0.0;
        for i in 0..roots.len() {
            let z = roots[i];
            let ratio = evaluate(coeffs, z) / evaluate(&derivative, z);
            let repulsion: Complex64 = roots
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &other)| 1.0 / (z - other))
                .sum();
            let step = ratio / (1.0 - ratio * repulsion);
            roots[i] = z - step;
            largest_step = largest_step.max(step.norm() / z.norm().max(1.0));
        }
        if largest_step < ROOT_TOLERANCE {
            break;
        }
    }

    roots
        .iter()
        .all(|&z| backward_error(coeffs, z) < BACKWARD_ERROR_LIMIT)
        .then_some(roots)
}

/// `|p(z)|` relative to the largest value rounding could produce at `z`.
fn backward_error(coeffs: &[f64], z: Complex64) -> f64 {
    let radius = z.norm();
    let bound = coeffs
        .iter()
        .rev()
        .fold(0.0, |acc, &c| acc * radius + libm::fabs(c));
    evaluate(coeffs, z).norm() / bound
}

/// Rebuilds a root set with exact conjugate symmetry.
///
/// Near-real roots become real; every root below the real axis emits itself
/// and its exact conjugate; roots above the axis are dropped as duplicates.
fn snap_conjugates(roots: &[Complex64]) -> Vec<Complex64> {
    let mut out = Vec::with_capacity(roots.len());
    for &r in roots {
        if r.im.abs() <= 1e-10 * r.norm().max(1.0) {
            out.push(Complex64::new(r.re, 0.0));
        } else if r.im < 0.0 {
            out.push(r);
            out.push(r.conj());
        }
    }
    out
}
