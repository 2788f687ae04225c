//! Zero/pole/gain algebra: frequency transforms, bilinear mapping and
//! factoring into second-order sections.
//!
//! All transforms operate in place on a [`Zpk`] and preserve exact
//! complex-conjugate pairing: the arithmetic applied to a root and to its
//! conjugate is mirror-image in IEEE 754, so pairs stay bit-exact conjugates.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use num_complex::Complex64;

use super::{Cascade, Coefficients};

/// Zero/pole/gain description of a transfer function.
#[derive(Debug, Clone, PartialEq)]
pub struct Zpk {
    /// Zeros, closed under conjugation.
    pub zeros: Vec<Complex64>,
    /// Poles, closed under conjugation.
    pub poles: Vec<Complex64>,
    /// Overall gain.
    pub gain: f64,
}

impl Zpk {
    /// Number of poles in excess of zeros.
    pub fn relative_degree(&self) -> usize {
        self.poles.len().saturating_sub(self.zeros.len())
    }

    /// Moves a `Wn = 1` analog lowpass to cutoff `wn` (rad/s).
    pub fn lowpass_to_lowpass(&mut self, wn: f64) {
        let degree = self.relative_degree();
        scale_roots(&mut self.zeros, wn);
        scale_roots(&mut self.poles, wn);
        self.gain *= libm::pow(wn, degree as f64);
    }

    /// Turns a `Wn = 1` analog lowpass into a highpass at `wn` (rad/s).
    pub fn lowpass_to_highpass(&mut self, wn: f64) {
        let degree = self.relative_degree();
        self.gain *= (product_of_negated(&self.zeros) / product_of_negated(&self.poles)).re;

        invert_roots(&mut self.zeros, wn);
        invert_roots(&mut self.poles, wn);
        self.zeros
            .extend(core::iter::repeat_n(Complex64::new(0.0, 0.0), degree));
    }

    /// Turns a `Wn = 1` analog lowpass into a bandpass centred on `wn` with
    /// bandwidth `bw` (both rad/s).
    pub fn lowpass_to_bandpass(&mut self, wn: f64, bw: f64) {
        let degree = self.relative_degree();
        scale_roots(&mut self.zeros, bw / 2.0);
        scale_roots(&mut self.poles, bw / 2.0);

        self.zeros = split_roots(&self.zeros, wn);
        self.poles = split_roots(&self.poles, wn);
        self.zeros
            .extend(core::iter::repeat_n(Complex64::new(0.0, 0.0), degree));

        self.gain *= libm::pow(bw, degree as f64);
    }

    /// Turns a `Wn = 1` analog lowpass into a bandstop centred on `wn` with
    /// stop bandwidth `bw` (both rad/s).
    pub fn lowpass_to_bandstop(&mut self, wn: f64, bw: f64) {
        let degree = self.relative_degree();
        self.gain *= (product_of_negated(&self.zeros) / product_of_negated(&self.poles)).re;

        invert_roots(&mut self.zeros, bw / 2.0);
        invert_roots(&mut self.poles, bw / 2.0);

        self.zeros = split_roots(&self.zeros, wn);
        self.poles = split_roots(&self.poles, wn);
        for _ in 0..degree {
            self.zeros.push(Complex64::new(0.0, wn));
            self.zeros.push(Complex64::new(0.0, -wn));
        }
    }

    /// Maps the analog zpk to the z-plane with the bilinear transform at
    /// `sample_rate`, padding zeros at Nyquist (`z = -1`) up to the pole count.
    pub fn bilinear(&mut self, sample_rate: f64) {
        let fs2 = 2.0 * sample_rate;

        let num: Complex64 = self.zeros.iter().map(|&z| fs2 - z).product();
        let den: Complex64 = self.poles.iter().map(|&p| fs2 - p).product();
        self.gain *= (num / den).re;

        for z in &mut self.zeros {
            *z = (fs2 + *z) / (fs2 - *z);
        }
        for p in &mut self.poles {
            *p = (fs2 + *p) / (fs2 - *p);
        }

        let missing = self.poles.len().saturating_sub(self.zeros.len());
        self.zeros
            .extend(core::iter::repeat_n(Complex64::new(-1.0, 0.0), missing));
    }

    /// Factors the digital zpk into a [`Cascade`] of first- and
    /// second-order sections.
    ///
    /// Each conjugate pole pair (or pair of real poles) gets its own section
    /// together with the nearest remaining zeros, the most resonant poles
    /// choosing first. A lone real pole takes the nearest real zero. The
    /// gain is spread evenly over the sections. Sections are ordered from
    /// least to most resonant.
    ///
    /// Expects as many zeros as poles, which [`bilinear`](Self::bilinear)
    /// guarantees.
    pub fn to_cascade(&self) -> Cascade<f64> {
        debug_assert_eq!(
            self.zeros.len(),
            self.poles.len(),
            "digital zpk must have as many zeros as poles"
        );
        let mut pole_groups = group_poles(&self.poles);
        // Most resonant first for zero assignment
        pole_groups.sort_by(|x, y| y.radius.total_cmp(&x.radius));

        let mut pairs: Vec<Complex64> = self.zeros.iter().copied().filter(|z| z.im < 0.0).collect();
        let mut reals: Vec<Complex64> = self.zeros.iter().copied().filter(|z| z.im == 0.0).collect();

        // A lone real pole must claim a real zero before the pairs run out of them.
        pole_groups.sort_by_key(|g| g.roots.len() != 1);

        let count = pole_groups.len();
        let share = if count == 0 {
            1.0
        } else {
            libm::pow(self.gain.abs(), 1.0 / count as f64)
        };

        let mut sections = Vec::with_capacity(count);
        for (i, group) in pole_groups.iter().enumerate() {
            let anchor = group.roots[0];
            let mut zeros = Vec::with_capacity(2);
            if group.roots.len() == 1 {
                zeros.extend(take_nearest(&mut reals, anchor));
            } else {
                let pair = nearest(&pairs, anchor);
                let real = nearest(&reals, anchor);
                let use_pair = match (pair, real) {
                    (Some((_, dp)), Some((_, dr))) => dp <= dr || reals.len() < 2,
                    (Some(_), None) => true,
                    _ => false,
                };
                if use_pair {
                    zeros.extend(take_nearest(&mut pairs, anchor));
                } else {
                    zeros.extend(take_nearest(&mut reals, anchor));
                    zeros.extend(take_nearest(&mut reals, anchor));
                }
            }
            let gain = if i == 0 && self.gain < 0.0 { -share } else { share };
            let num = expand(&zeros, gain);
            let den = expand(&group.roots, 1.0);
            sections.push((group.radius, Coefficients::from_polynomials(&num, &den)));
        }

        sections.sort_by(|x, y| x.0.total_cmp(&y.0));
        Cascade::new(sections.into_iter().map(|(_, c)| c).collect())
    }
}

/// One or two poles forming a single section.
struct PoleGroup {
    roots: Vec<Complex64>,
    radius: f64,
}

fn group_poles(poles: &[Complex64]) -> Vec<PoleGroup> {
    let mut groups: Vec<PoleGroup> = poles
        .iter()
        .filter(|p| p.im < 0.0)
        .map(|&p| PoleGroup {
            roots: vec![p, p.conj()],
            radius: p.norm(),
        })
        .collect();

    let mut reals: Vec<Complex64> = poles.iter().copied().filter(|p| p.im == 0.0).collect();
    reals.sort_by(|x, y| x.re.total_cmp(&y.re));
    for chunk in reals.chunks(2) {
        groups.push(PoleGroup {
            roots: chunk.to_vec(),
            radius: chunk.iter().map(|p| p.norm()).fold(0.0, f64::max),
        });
    }
    groups
}

fn nearest(candidates: &[Complex64], target: Complex64) -> Option<(usize, f64)> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, &c)| (i, (c - target).norm().min((c.conj() - target).norm())))
        .min_by(|x, y| x.1.total_cmp(&y.1))
}

/// Removes the candidate nearest `target`, expanded to its conjugate pair
/// when complex.
fn take_nearest(candidates: &mut Vec<Complex64>, target: Complex64) -> Vec<Complex64> {
    match nearest(candidates, target) {
        Some((i, _)) => {
            let root = candidates.swap_remove(i);
            if root.im == 0.0 {
                vec![root]
            } else {
                vec![root, root.conj()]
            }
        }
        None => Vec::new(),
    }
}

fn scale_roots(roots: &mut [Complex64], factor: f64) {
    for r in roots {
        *r *= factor;
    }
}

fn invert_roots(roots: &mut [Complex64], numerator: f64) {
    for r in roots {
        *r = numerator / *r;
    }
}

fn product_of_negated(roots: &[Complex64]) -> Complex64 {
    roots.iter().map(|&r| -r).product()
}

/// Expands every root `r` into the pair `r ± sqrt(r² - wn²)`.
fn split_roots(roots: &[Complex64], wn: f64) -> Vec<Complex64> {
    let mut out = Vec::with_capacity(roots.len() * 2);
    for &r in roots {
        let offset = (r * r - wn * wn).sqrt();
        out.push(r + offset);
        out.push(r - offset);
    }
    out
}

fn expand(roots: &[Complex64], gain: f64) -> Vec<f64> {
    let mut poly = vec![gain];
    for r in roots {
        if r.im == 0.0 {
            poly = poly_mul(&poly, &[1.0, -r.re]);
        } else if r.im < 0.0 {
            poly = poly_mul(&poly, &[1.0, -2.0 * r.re, r.norm_sqr()]);
        }
    }
    poly
}

/// Polynomial product, coefficients in descending powers.
pub(super) fn poly_mul(lhs: &[f64], rhs: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; lhs.len() + rhs.len() - 1];
    for (i, &l) in lhs.iter().enumerate() {
        for (j, &r) in rhs.iter().enumerate() {
            out[i + j] += l * r;
        }
    }
    out
}
