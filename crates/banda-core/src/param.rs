//! Parameter smoothing for zipper-free gain changes.
//!
//! A gain knob that jumps between blocks produces audible steps. A
//! [`SmoothedParam`] glides towards each new target through a one-pole
//! lowpass, one step per sample.
//!
//! ```rust
//! use banda_core::SmoothedParam;
//!
//! let mut gain_db = SmoothedParam::with_config(0.0, 48000.0, 5.0);
//! gain_db.set_target(-12.0);
//!
//! // After five time constants the parameter is within 1% of the target
//! for _ in 0..1200 {
//!     gain_db.advance();
//! }
//! assert!((gain_db.get() + 12.0).abs() < 0.1);
//! ```

use libm::exp;

/// A value that follows its target exponentially.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f64,
    /// Value being approached
    target: f64,
    /// Fraction of the remaining distance covered per sample (1 = instant)
    coeff: f64,
    sample_rate: f64,
    smoothing_time_ms: f64,
}

impl SmoothedParam {
    /// Parameter resting at `initial` with smoothing disabled.
    pub fn new(initial: f64) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 44100.0,
            smoothing_time_ms: 0.0,
        }
    }

    /// Parameter resting at `initial`, smoothing with time constant
    /// `smoothing_time_ms` at `sample_rate`.
    pub fn with_config(initial: f64, sample_rate: f64, smoothing_time_ms: f64) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Sets the value to glide towards.
    #[inline]
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Sets the target and jumps straight to it.
    #[inline]
    pub fn set_immediate(&mut self, value: f64) {
        self.target = value;
        self.current = value;
    }

    /// Updates the sample rate, keeping the smoothing time.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Sets the time constant in milliseconds; zero disables smoothing.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f64) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Time constant in milliseconds.
    pub fn smoothing_time_ms(&self) -> f64 {
        self.smoothing_time_ms
    }

    /// Moves one sample towards the target and returns the new value.
    #[inline]
    pub fn advance(&mut self) -> f64 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f64 {
        self.current
    }

    /// Value being approached.
    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Whether the value has reached its target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-9
    }

    /// Jumps to the target.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    /// `coeff = 1 - exp(-1 / (tau · fs))` with `tau` the smoothing time in
    /// seconds, so the value covers 63% of a step after `tau`.
    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - exp(-1.0 / samples);
        }
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
