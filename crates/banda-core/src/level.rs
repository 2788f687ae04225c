//! Level followers for metering and dynamics.
//!
//! - [`RmsFollower`] - sliding-window RMS
//! - [`PeakFollower`] - instant attack, exponential half-life decay
//!
//! Each instance owns its state; a multiband meter uses one follower per
//! band.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use libm::{pow, round};

use crate::error::{ensure_finite, ensure_sample_rate};
use crate::math::flush_denormal;
use crate::processor::debug_check_ports;
use crate::{BlockProcessor, ConfigurationError, Sample};

fn ensure_positive_time(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    ensure_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidTime { name, value })
    }
}

/// Sliding-window RMS level.
///
/// Keeps the last `window` squared inputs and a running sum, so each sample
/// costs O(1). Squares and sum are held in `f64` whatever `T` is, and the
/// sum is rebuilt from the stored squares once per window, so rounding in
/// the add/subtract updates cannot accumulate.
///
/// # Example
///
/// ```rust
/// use banda_core::RmsFollower;
///
/// let mut rms = RmsFollower::<f32>::new(10.0, 48000.0).unwrap();
/// assert_eq!(rms.window_len(), 480);
///
/// for _ in 0..480 {
///     rms.process_sample(0.5);
/// }
/// assert!((rms.level() - 0.5).abs() < 1e-4);
/// ```
#[derive(Debug, Clone)]
pub struct RmsFollower<T: Sample> {
    window_ms: f64,
    sample_rate: f64,
    squares: Vec<f64>,
    pos: usize,
    running_sum: f64,
    level: T,
}

impl<T: Sample> RmsFollower<T> {
    /// Default averaging window.
    pub const DEFAULT_WINDOW_MS: f64 = 50.0;

    /// Creates a follower averaging over `window_ms` milliseconds.
    pub fn new(window_ms: f64, sample_rate: f64) -> Result<Self, ConfigurationError> {
        ensure_positive_time("RMS window", window_ms)?;
        ensure_sample_rate(sample_rate)?;
        Ok(Self {
            window_ms,
            sample_rate,
            squares: vec![0.0; Self::window_samples(window_ms, sample_rate)],
            pos: 0,
            running_sum: 0.0,
            level: T::zero(),
        })
    }

    fn window_samples(window_ms: f64, sample_rate: f64) -> usize {
        (round(window_ms * sample_rate / 1000.0) as usize).max(1)
    }

    fn resize(&mut self) {
        let len = Self::window_samples(self.window_ms, self.sample_rate);
        self.squares = vec![0.0; len];
        self.pos = 0;
        self.running_sum = 0.0;
        self.level = T::zero();
    }

    /// Sets the window length in milliseconds and clears history.
    pub fn set_window_ms(&mut self, window_ms: f64) -> Result<(), ConfigurationError> {
        ensure_positive_time("RMS window", window_ms)?;
        self.window_ms = window_ms;
        self.resize();
        Ok(())
    }

    /// Window length in milliseconds.
    pub fn window_ms(&self) -> f64 {
        self.window_ms
    }

    /// Window length in samples.
    pub fn window_len(&self) -> usize {
        self.squares.len()
    }

    /// Most recent RMS value.
    pub fn level(&self) -> T {
        self.level
    }

    /// Pushes one sample and returns the RMS over the window.
    #[inline]
    pub fn process_sample(&mut self, input: T) -> T {
        let x = input.into_f64();
        let square = x * x;
        // Clamp: subtracting the oldest square can round below zero.
        let sum = self.running_sum - self.squares[self.pos] + square;
        self.running_sum = flush_denormal(sum.max(0.0));
        self.squares[self.pos] = square;
        self.pos += 1;
        if self.pos == self.squares.len() {
            self.pos = 0;
            self.running_sum = self.squares.iter().sum();
        }

        let len = self.squares.len() as f64;
        self.level = T::from_f64(libm::sqrt(self.running_sum / len));
        self.level
    }
}

impl<T: Sample> BlockProcessor<T> for RmsFollower<T> {
    fn input_ports(&self) -> usize {
        1
    }

    fn output_ports(&self) -> usize {
        1
    }

    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]) {
        debug_check_ports(inputs, outputs, 1, 1);
        for (out, &x) in outputs[0].iter_mut().zip(inputs[0]) {
            *out = self.process_sample(x);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), ConfigurationError> {
        ensure_sample_rate(sample_rate)?;
        self.sample_rate = sample_rate;
        self.resize();
        Ok(())
    }

    fn reset(&mut self) {
        self.squares.fill(0.0);
        self.pos = 0;
        self.running_sum = 0.0;
        self.level = T::zero();
    }
}

/// Peak hold with exponential release.
///
/// Rises instantly to `|input|`, otherwise decays by half every `half_life`
/// seconds. Levels below [`PeakFollower::EPSILON`] snap to zero.
///
/// # Example
///
/// ```rust
/// use banda_core::PeakFollower;
///
/// let mut peak = PeakFollower::<f64>::new(0.5, 1000.0).unwrap();
/// peak.process_sample(-1.0);
/// for _ in 0..500 {
///     peak.process_sample(0.0);
/// }
/// assert!((peak.level() - 0.5).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct PeakFollower<T: Sample> {
    half_life: f64,
    sample_rate: f64,
    /// Per-sample decay factor.
    scalar: T,
    level: T,
}

impl<T: Sample> PeakFollower<T> {
    /// Default half-life in seconds.
    pub const DEFAULT_HALF_LIFE: f64 = 0.5;
    /// Decayed levels below this become exactly zero.
    pub const EPSILON: f64 = 1e-4;

    /// Creates a follower with the given half-life in seconds.
    pub fn new(half_life: f64, sample_rate: f64) -> Result<Self, ConfigurationError> {
        ensure_positive_time("half-life", half_life)?;
        ensure_sample_rate(sample_rate)?;
        Ok(Self {
            half_life,
            sample_rate,
            scalar: Self::decay_scalar(half_life, sample_rate),
            level: T::zero(),
        })
    }

    fn decay_scalar(half_life: f64, sample_rate: f64) -> T {
        T::from_f64(pow(0.5, 1.0 / (half_life * sample_rate)))
    }

    /// Sets the half-life in seconds. The current level is kept.
    pub fn set_half_life(&mut self, half_life: f64) -> Result<(), ConfigurationError> {
        ensure_positive_time("half-life", half_life)?;
        self.half_life = half_life;
        self.scalar = Self::decay_scalar(half_life, self.sample_rate);
        Ok(())
    }

    /// Half-life in seconds.
    pub fn half_life(&self) -> f64 {
        self.half_life
    }

    /// Per-sample decay factor `0.5^(1 / (half_life · sample_rate))`.
    pub fn scalar(&self) -> T {
        self.scalar
    }

    /// Current level.
    pub fn level(&self) -> T {
        self.level
    }

    /// Pushes one sample and returns the held level.
    #[inline]
    pub fn process_sample(&mut self, input: T) -> T {
        let magnitude = input.abs();
        if magnitude >= self.level {
            self.level = magnitude;
        } else {
            self.level = self.level * self.scalar;
            if self.level < T::from_f64(Self::EPSILON) {
                self.level = T::zero();
            }
        }
        self.level
    }
}

impl<T: Sample> BlockProcessor<T> for PeakFollower<T> {
    fn input_ports(&self) -> usize {
        1
    }

    fn output_ports(&self) -> usize {
        1
    }

    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]) {
        debug_check_ports(inputs, outputs, 1, 1);
        for (out, &x) in outputs[0].iter_mut().zip(inputs[0]) {
            *out = self.process_sample(x);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), ConfigurationError> {
        ensure_sample_rate(sample_rate)?;
        self.sample_rate = sample_rate;
        self.scalar = Self::decay_scalar(self.half_life, sample_rate);
        self.level = T::zero();
        Ok(())
    }

    fn reset(&mut self) {
        self.level = T::zero();
    }
}
