//! Configuration errors raised by setters and constructors.
//!
//! Every fallible setter validates its argument before touching stored state,
//! so an `Err` always leaves the previous (valid) configuration in place.

use thiserror::Error;

/// Invalid parameter passed to a design function, constructor or setter.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigurationError {
    /// Filter order below 1, or a Bessel order above
    /// [`MAX_BESSEL_ORDER`](crate::design::MAX_BESSEL_ORDER).
    #[error(
        "filter order must be at least 1 (at most {max} for Bessel), got {0}",
        max = crate::design::MAX_BESSEL_ORDER
    )]
    InvalidOrder(usize),

    /// Cutoff frequency outside the open interval (0, Nyquist).
    #[error("cutoff frequency {frequency} Hz outside (0, {nyquist}) Hz")]
    CutoffOutOfRange {
        /// Requested frequency in Hz.
        frequency: f64,
        /// Nyquist frequency for the current sample rate.
        nyquist: f64,
    },

    /// Band edges (or crossover frequencies) not strictly increasing.
    #[error("band edges must be strictly increasing, got {low} Hz then {high} Hz")]
    UnorderedBandEdges {
        /// Lower edge in Hz.
        low: f64,
        /// Upper edge in Hz.
        high: f64,
    },

    /// A single cutoff was given where band edges are needed, or vice versa.
    #[error("{family} expects {expected}")]
    CutoffShape {
        /// Name of the filter family.
        family: &'static str,
        /// What the family expects ("a single cutoff" / "two band edges").
        expected: &'static str,
    },

    /// Non-positive stopband ripple for a Chebyshev type 2 design.
    #[error("ripple must be strictly positive, got {0} dB")]
    InvalidRipple(f64),

    /// Non-positive quality factor.
    #[error("Q must be strictly positive, got {0}")]
    InvalidQ(f64),

    /// Non-positive linear gain.
    #[error("gain must be strictly positive, got {0}")]
    InvalidGain(f64),

    /// Gain in dB outside the symmetric range a band shaper accepts.
    #[error("gain must be within ±{limit} dB, got {gain_db} dB")]
    GainOutOfRange {
        /// Requested gain in dB.
        gain_db: f64,
        /// Largest accepted magnitude in dB.
        limit: f64,
    },

    /// Non-positive or non-finite sample rate.
    #[error("sample rate must be strictly positive, got {0} Hz")]
    InvalidSampleRate(f64),

    /// Delay not smaller than the delay line capacity.
    #[error("delay {delay} must be less than delay line size {capacity}")]
    DelayOutOfRange {
        /// Requested delay in samples.
        delay: usize,
        /// Delay line capacity in samples.
        capacity: usize,
    },

    /// Feedback magnitude above 1, which diverges exponentially.
    #[error("feedback must be between -1 and 1 to avoid divergence, got {0}")]
    FeedbackOutOfRange(f64),

    /// Non-positive softness factor for a gain curve.
    #[error("softness factor must be strictly positive, got {0}")]
    InvalidSoftness(f64),

    /// Non-positive ratio for a gain curve.
    #[error("ratio must be strictly positive, got {0}")]
    InvalidRatio(f64),

    /// Non-positive threshold for a gain curve.
    #[error("threshold must be strictly positive, got {0}")]
    InvalidThreshold(f64),

    /// Gain lookup table with no entries or a zero resolution.
    #[error("lookup table needs non-zero size and precision, got {size} entries at {precision} per unit")]
    InvalidTable {
        /// Number of entries.
        size: usize,
        /// Entries per unit of input level.
        precision: usize,
    },

    /// Non-positive time constant (window length, half-life).
    #[error("{name} must be strictly positive, got {value}")]
    InvalidTime {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// NaN or infinite parameter value.
    #[error("{0} must be finite")]
    NonFinite(&'static str),
}

/// Rejects NaN and infinities for the named parameter.
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::NonFinite(name))
    }
}

/// Validates a sample rate: finite and positive.
///
/// Shared by every component that takes a sample rate, and by callers that
/// need to reject a rate before touching several components.
pub fn ensure_sample_rate(sample_rate: f64) -> Result<(), ConfigurationError> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidSampleRate(sample_rate))
    }
}
