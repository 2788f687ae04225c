//! Coefficient synthesis: filter parameters in, difference-equation taps out.
//!
//! [`design`] is a pure function. Two paths lead to a [`Cascade`]:
//!
//! - **Analog prototype** (Butterworth, Bessel, Chebyshev type 2): a
//!   normalized lowpass [`Zpk`] is frequency-transformed to the requested
//!   response at the prewarped cutoff(s), mapped to the z-plane with the
//!   bilinear transform and factored into second-order sections.
//! - **Closed form** (second-order sections): a normalized analog biquad per
//!   [`SecondOrderKind`] is substituted directly, giving a single section.
//!
//! [`FilterDesign::design`] multiplies the sections out into one set of
//! [`Coefficients`] for inspection; [`FilterDesign::design_cascade`] keeps
//! them apart, which is what [`IirFilter`](crate::IirFilter) runs.
//!
//! All arithmetic is `f64`. Runtime components cast the result once with
//! [`Cascade::cast`].
//!
//! # Example
//!
//! ```rust
//! use banda_core::design::{Cutoff, FilterDesign, FilterFamily, Response};
//!
//! let spec = FilterDesign::new(FilterFamily::Butterworth(Response::LowPass), Cutoff::Single(1000.0))
//!     .with_order(4);
//! let coeffs = spec.design(48000.0).unwrap();
//! assert_eq!(coeffs.order(), 4);
//! assert!((coeffs.dc_gain() - 1.0).abs() < 1e-9);
//! ```

mod cascade;
mod coefficients;
mod prototype;
mod second_order;
mod zpk;

pub use cascade::Cascade;
pub use coefficients::Coefficients;
pub use prototype::MAX_BESSEL_ORDER;
pub use zpk::Zpk;

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use core::f64::consts::FRAC_1_SQRT_2;

use crate::error::{ensure_finite, ensure_sample_rate};
use crate::math::prewarp;
use crate::ConfigurationError;
use prototype::Prototype;

/// Frequency response of an analog-prototype design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Response {
    /// Pass below the cutoff.
    LowPass,
    /// Pass above the cutoff.
    HighPass,
    /// Pass between two band edges.
    BandPass,
    /// Reject between two band edges.
    BandStop,
}

/// Closed-form second-order section shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondOrderKind {
    /// Resonant lowpass, `Q = 1/√2` is the Butterworth alignment.
    LowPass,
    /// Resonant highpass.
    HighPass,
    /// Constant 0 dB peak bandpass.
    BandPass,
    /// Bell boost or cut by `gain` at the centre frequency.
    Peak,
    /// Flat magnitude, phase rotates through 360° around the cutoff.
    AllPass,
    /// Shelf reaching `gain` at DC.
    LowShelf,
    /// Shelf reaching `gain` at Nyquist.
    HighShelf,
}

/// Filter family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterFamily {
    /// Maximally flat passband.
    Butterworth(Response),
    /// Maximally flat group delay (phase-normalized).
    Bessel(Response),
    /// Flat passband, equiripple stopband; the cutoff is the stopband edge.
    Chebyshev2(Response),
    /// Single closed-form biquad. Uses `q` and `gain`, ignores `order`.
    SecondOrder(SecondOrderKind),
}

impl FilterFamily {
    /// Human-readable family name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Butterworth(_) => "Butterworth",
            Self::Bessel(_) => "Bessel",
            Self::Chebyshev2(_) => "Chebyshev type 2",
            Self::SecondOrder(_) => "second-order section",
        }
    }

    /// Whether the family takes two band edges rather than a single cutoff.
    pub fn needs_band(&self) -> bool {
        matches!(
            self,
            Self::Butterworth(Response::BandPass | Response::BandStop)
                | Self::Bessel(Response::BandPass | Response::BandStop)
                | Self::Chebyshev2(Response::BandPass | Response::BandStop)
        )
    }

    /// Order of the digital filter produced for a design `order`.
    ///
    /// Band transforms double the prototype order; second-order sections are
    /// always order 2.
    pub fn digital_order(&self, order: usize) -> usize {
        match self {
            Self::SecondOrder(_) => 2,
            _ if self.needs_band() => 2 * order,
            _ => order,
        }
    }
}

/// Cutoff specification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cutoff {
    /// One cutoff (or centre) frequency in Hz.
    Single(f64),
    /// Lower and upper band edges in Hz.
    Band(f64, f64),
}

impl Cutoff {
    /// `(low, high)` edges; a single cutoff returns it twice.
    pub fn edges(&self) -> (f64, f64) {
        match *self {
            Self::Single(f) => (f, f),
            Self::Band(lo, hi) => (lo, hi),
        }
    }
}

/// Complete description of one filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterDesign {
    /// Family and response.
    pub family: FilterFamily,
    /// Prototype order (ignored by second-order sections).
    pub order: usize,
    /// Cutoff frequency or band edges.
    pub cutoff: Cutoff,
    /// Chebyshev type 2 stopband attenuation in dB.
    pub ripple_db: f64,
    /// Quality factor of second-order sections.
    pub q: f64,
    /// Linear gain of peak and shelf sections.
    pub gain: f64,
}

impl FilterDesign {
    /// Default order for a fresh design.
    pub const DEFAULT_ORDER: usize = 2;
    /// Default Chebyshev type 2 stopband attenuation.
    pub const DEFAULT_RIPPLE_DB: f64 = 40.0;
    /// Default quality factor (Butterworth alignment).
    pub const DEFAULT_Q: f64 = FRAC_1_SQRT_2;

    /// Design with default order, ripple, Q and unity gain.
    pub fn new(family: FilterFamily, cutoff: Cutoff) -> Self {
        Self {
            family,
            order: Self::DEFAULT_ORDER,
            cutoff,
            ripple_db: Self::DEFAULT_RIPPLE_DB,
            q: Self::DEFAULT_Q,
            gain: 1.0,
        }
    }

    /// Sets the prototype order.
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Sets the Chebyshev type 2 stopband attenuation.
    pub fn with_ripple_db(mut self, ripple_db: f64) -> Self {
        self.ripple_db = ripple_db;
        self
    }

    /// Sets the quality factor.
    pub fn with_q(mut self, q: f64) -> Self {
        self.q = q;
        self
    }

    /// Sets the linear gain.
    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    /// Order of the coefficients this design produces.
    pub fn digital_order(&self) -> usize {
        self.family.digital_order(self.order)
    }

    /// Checks every parameter against `sample_rate`.
    pub fn validate(&self, sample_rate: f64) -> Result<(), ConfigurationError> {
        ensure_sample_rate(sample_rate)?;
        ensure_finite("ripple", self.ripple_db)?;
        ensure_finite("Q", self.q)?;
        ensure_finite("gain", self.gain)?;

        if self.order < 1
            || (matches!(self.family, FilterFamily::Bessel(_)) && self.order > MAX_BESSEL_ORDER)
        {
            return Err(ConfigurationError::InvalidOrder(self.order));
        }
        if self.ripple_db <= 0.0 {
            return Err(ConfigurationError::InvalidRipple(self.ripple_db));
        }
        if self.q <= 0.0 {
            return Err(ConfigurationError::InvalidQ(self.q));
        }
        if self.gain <= 0.0 {
            return Err(ConfigurationError::InvalidGain(self.gain));
        }

        let nyquist = sample_rate / 2.0;
        match (self.family.needs_band(), self.cutoff) {
            (false, Cutoff::Single(f)) => check_frequency(f, nyquist),
            (true, Cutoff::Band(lo, hi)) => {
                check_frequency(lo, nyquist)?;
                check_frequency(hi, nyquist)?;
                if lo < hi {
                    Ok(())
                } else {
                    Err(ConfigurationError::UnorderedBandEdges { low: lo, high: hi })
                }
            }
            (needs_band, _) => Err(ConfigurationError::CutoffShape {
                family: self.family.name(),
                expected: if needs_band {
                    "two band edges"
                } else {
                    "a single cutoff"
                },
            }),
        }
    }

    /// Validates and synthesizes the coefficients as one expanded set of
    /// taps.
    pub fn design(&self, sample_rate: f64) -> Result<Coefficients<f64>, ConfigurationError> {
        Ok(self.design_cascade(sample_rate)?.expand())
    }

    /// Validates and synthesizes the filter as a cascade of sections.
    pub fn design_cascade(&self, sample_rate: f64) -> Result<Cascade<f64>, ConfigurationError> {
        self.validate(sample_rate)?;
        match self.family {
            FilterFamily::Butterworth(response) => {
                self.analog(Prototype::Butterworth, response, sample_rate)
            }
            FilterFamily::Bessel(response) => self.analog(Prototype::Bessel, response, sample_rate),
            FilterFamily::Chebyshev2(response) => self.analog(
                Prototype::Chebyshev2 {
                    ripple_db: self.ripple_db,
                },
                response,
                sample_rate,
            ),
            FilterFamily::SecondOrder(kind) => {
                let (freq, _) = self.cutoff.edges();
                let section = second_order::design(kind, freq, self.q, self.gain, sample_rate);
                Ok(Cascade::new(vec![section]))
            }
        }
    }

    fn analog(
        &self,
        prototype: Prototype,
        response: Response,
        sample_rate: f64,
    ) -> Result<Cascade<f64>, ConfigurationError> {
        let mut zpk = prototype.zpk(self.order)?;
        let (lo, hi) = self.cutoff.edges();
        let w_lo = prewarp(lo, sample_rate);
        let w_hi = prewarp(hi, sample_rate);

        match response {
            Response::LowPass => zpk.lowpass_to_lowpass(w_lo),
            Response::HighPass => zpk.lowpass_to_highpass(w_lo),
            Response::BandPass => zpk.lowpass_to_bandpass(libm::sqrt(w_lo * w_hi), w_hi - w_lo),
            Response::BandStop => zpk.lowpass_to_bandstop(libm::sqrt(w_lo * w_hi), w_hi - w_lo),
        }
        zpk.bilinear(sample_rate);
        Ok(zpk.to_cascade())
    }
}

fn check_frequency(frequency: f64, nyquist: f64) -> Result<(), ConfigurationError> {
    ensure_finite("cutoff frequency", frequency)?;
    if frequency > 0.0 && frequency < nyquist {
        Ok(())
    } else {
        Err(ConfigurationError::CutoffOutOfRange { frequency, nyquist })
    }
}

/// Synthesizes digital coefficients for `spec` at `sample_rate`.
///
/// Equivalent to [`FilterDesign::design`].
pub fn design(spec: &FilterDesign, sample_rate: f64) -> Result<Coefficients<f64>, ConfigurationError> {
    spec.design(sample_rate)
}
