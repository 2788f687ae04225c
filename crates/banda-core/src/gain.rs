//! Soft-knee gain computers evaluated through a lookup table.
//!
//! [`GainShaper`] turns a level signal into a gain signal. The gain curve is
//! tabulated; changing the curve shape rebuilds the table on a background
//! thread while processing keeps using the current one.
//!
//! The processing side only ever swaps a finished table in. Joining the
//! rebuild thread and freeing the replaced table happen on the control side
//! (setters, [`GainShaper::wait_for_recompute`], drop).
//!
//! Requires the `std` feature.

use std::mem;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use libm::{log10, pow, sqrt};

use crate::error::ensure_finite;
use crate::processor::debug_check_ports;
use crate::{BlockProcessor, ConfigurationError, Sample};

/// Gain curve shape.
///
/// Both curves work on `d = 10·log10(v)` where `v` is the level relative to
/// the threshold, and bend smoothly around `d = 0` with a knee width set by
/// `softness`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GainCurve {
    /// `g = 10^(-(sqrt(d² + softness) + d) / 40)`: unity below the
    /// threshold, `1/sqrt(v)` above it.
    Limiter,
    /// Limiter exponent scaled by `ratio`.
    Swell,
}

impl GainCurve {
    /// Gain for relative level `v`. Zero level maps to unity gain.
    pub fn gain(self, v: f64, softness: f64, ratio: f64) -> f64 {
        if v <= 0.0 {
            return 1.0;
        }
        let d = 10.0 * log10(v);
        let exponent = -(sqrt(d * d + softness) + d) / 40.0;
        match self {
            Self::Limiter => pow(10.0, exponent),
            Self::Swell => pow(10.0, exponent * ratio),
        }
    }
}

fn build_table<T: Sample>(curve: GainCurve, softness: f64, ratio: f64, size: usize, precision: usize) -> Vec<T> {
    (0..size)
        .map(|i| T::from_f64(curve.gain(i as f64 / precision as f64, softness, ratio)))
        .collect()
}

/// Table exchange between the rebuild thread and the shaper.
#[derive(Debug)]
struct Handoff<T> {
    /// Finished table waiting to be swapped in.
    ready: Option<Vec<T>>,
    /// Replaced table waiting to be freed off the processing path.
    retired: Option<Vec<T>>,
}

/// Moves a ready table into `lut`, parking the old one. Never allocates or
/// frees.
fn swap_in<T>(slot: &mut Handoff<T>, lut: &mut Vec<T>) -> bool {
    match slot.ready.take() {
        Some(mut table) => {
            mem::swap(lut, &mut table);
            debug_assert!(slot.retired.is_none(), "retired table not released");
            slot.retired = Some(table);
            true
        }
        None => false,
    }
}

/// Curve parameters of a table that is still being built.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Staged {
    softness: f64,
    ratio: f64,
}

/// Level-to-gain mapper with an asynchronously rebuilt table.
///
/// Entry `i` of the table holds the gain at relative level
/// `i / lut_precision`; levels past the table are computed directly.
///
/// At most one rebuild is in flight. Starting another waits for the
/// previous one first. [`process`](BlockProcessor::process) never waits: it
/// swaps in a finished table if there is one. New softness and ratio values
/// take effect together with their table, so the directly computed tail
/// always matches the table in use. Dropping the shaper waits for any
/// pending rebuild.
///
/// # Example
///
/// ```rust
/// use banda_core::{GainCurve, GainShaper};
///
/// let mut limiter = GainShaper::<f32>::new(GainCurve::Limiter, 1024, 64).unwrap();
/// limiter.set_threshold(0.25).unwrap();
/// limiter.set_softness(1.0).unwrap();
/// limiter.wait_for_recompute();
///
/// assert_eq!(limiter.softness(), 1.0);
/// assert!((limiter.gain_at(0.0) - 1.0).abs() < 1e-6);
/// assert!(limiter.gain_at(4.0) < 0.3);
/// ```
#[derive(Debug)]
pub struct GainShaper<T: Sample> {
    curve: GainCurve,
    softness: f64,
    ratio: f64,
    threshold: f64,
    lut_precision: usize,
    lut: Vec<T>,
    staged: Option<Staged>,
    handoff: Arc<Mutex<Handoff<T>>>,
    worker: Option<JoinHandle<()>>,
}

impl<T: Sample> GainShaper<T> {
    /// Default table length.
    pub const DEFAULT_LUT_SIZE: usize = 128 * 1024;
    /// Default table entries per unit of relative level.
    pub const DEFAULT_LUT_PRECISION: usize = 64;
    /// Default knee softness.
    pub const DEFAULT_SOFTNESS: f64 = 1e-4;

    /// Creates a shaper and builds its first table synchronously.
    ///
    /// Defaults: softness 1e-4, ratio 1, threshold 1.
    pub fn new(curve: GainCurve, lut_size: usize, lut_precision: usize) -> Result<Self, ConfigurationError> {
        if lut_size == 0 || lut_precision == 0 {
            return Err(ConfigurationError::InvalidTable {
                size: lut_size,
                precision: lut_precision,
            });
        }
        Ok(Self {
            curve,
            softness: Self::DEFAULT_SOFTNESS,
            ratio: 1.0,
            threshold: 1.0,
            lut_precision,
            lut: build_table(curve, Self::DEFAULT_SOFTNESS, 1.0, lut_size, lut_precision),
            staged: None,
            handoff: Arc::new(Mutex::new(Handoff {
                ready: None,
                retired: None,
            })),
            worker: None,
        })
    }

    /// Shaper with the default table size and precision.
    pub fn with_defaults(curve: GainCurve) -> Result<Self, ConfigurationError> {
        Self::new(curve, Self::DEFAULT_LUT_SIZE, Self::DEFAULT_LUT_PRECISION)
    }

    /// Sets the knee softness and starts a table rebuild.
    ///
    /// [`softness`](Self::softness) reports the new value once the rebuilt
    /// table is in use.
    pub fn set_softness(&mut self, softness: f64) -> Result<(), ConfigurationError> {
        ensure_finite("softness", softness)?;
        if softness <= 0.0 {
            return Err(ConfigurationError::InvalidSoftness(softness));
        }
        self.wait_for_recompute();
        self.start_recompute(Staged {
            softness,
            ratio: self.ratio,
        });
        Ok(())
    }

    /// Sets the swell ratio and starts a table rebuild.
    ///
    /// [`ratio`](Self::ratio) reports the new value once the rebuilt table is
    /// in use.
    pub fn set_ratio(&mut self, ratio: f64) -> Result<(), ConfigurationError> {
        ensure_finite("ratio", ratio)?;
        if ratio <= 0.0 {
            return Err(ConfigurationError::InvalidRatio(ratio));
        }
        self.wait_for_recompute();
        self.start_recompute(Staged {
            softness: self.softness,
            ratio,
        });
        Ok(())
    }

    /// Sets the level the curve is centred on.
    ///
    /// Input levels are divided by the threshold before the lookup, so the
    /// table stays valid.
    pub fn set_threshold(&mut self, threshold: f64) -> Result<(), ConfigurationError> {
        ensure_finite("threshold", threshold)?;
        if threshold <= 0.0 {
            return Err(ConfigurationError::InvalidThreshold(threshold));
        }
        self.threshold = threshold;
        Ok(())
    }

    /// Curve shape.
    pub fn curve(&self) -> GainCurve {
        self.curve
    }

    /// Knee softness of the table in use.
    pub fn softness(&self) -> f64 {
        self.softness
    }

    /// Swell ratio of the table in use.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Threshold level.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether a rebuilt table is still waiting to be put in use.
    pub fn is_recomputing(&self) -> bool {
        self.staged.is_some()
    }

    /// Expects no rebuild in flight.
    fn start_recompute(&mut self, staged: Staged) {
        let curve = self.curve;
        let (size, precision) = (self.lut.len(), self.lut_precision);
        let Staged { softness, ratio } = staged;

        #[cfg(feature = "tracing")]
        tracing::debug!("gain_lut: rebuilding {size} entries, softness {softness}, ratio {ratio}");

        let handoff = Arc::clone(&self.handoff);
        self.staged = Some(staged);
        self.worker = Some(thread::spawn(move || {
            let table = build_table(curve, softness, ratio, size, precision);
            handoff.lock().unwrap_or_else(PoisonError::into_inner).ready = Some(table);
        }));
    }

    fn commit_staged(&mut self) {
        if let Some(Staged { softness, ratio }) = self.staged.take() {
            self.softness = softness;
            self.ratio = ratio;
        }
    }

    /// Blocks until the pending rebuild, if any, completes and puts its
    /// table in use. Frees the table it replaced.
    pub fn wait_for_recompute(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        if worker.join().is_err() {
            #[cfg(feature = "tracing")]
            tracing::warn!("gain_lut: rebuild panicked, keeping previous table");
            self.staged = None;
        }

        let (adopted, retired) = {
            let mut slot = self.handoff.lock().unwrap_or_else(PoisonError::into_inner);
            let adopted = swap_in(&mut slot, &mut self.lut);
            (adopted, slot.retired.take())
        };
        if adopted {
            self.commit_staged();
        }
        drop(retired);
    }

    /// Swaps in a finished table without blocking, joining or freeing.
    fn poll_recompute(&mut self) {
        if self.staged.is_none() {
            return;
        }
        let adopted = match self.handoff.try_lock() {
            Ok(mut slot) => swap_in(&mut slot, &mut self.lut),
            Err(_) => false,
        };
        if adopted {
            self.commit_staged();
        }
    }

    /// Gain for `level` from the current table.
    #[inline]
    pub fn gain_at(&self, level: T) -> T {
        let v = (level.into_f64() / self.threshold).max(0.0);
        let index = v * self.lut_precision as f64;
        if index < self.lut.len() as f64 {
            self.lut[index as usize]
        } else {
            T::from_f64(self.curve.gain(v, self.softness, self.ratio))
        }
    }

    /// Maps one level sample to a gain, swapping in a finished table first.
    pub fn process_sample(&mut self, level: T) -> T {
        self.poll_recompute();
        self.gain_at(level)
    }
}

impl<T: Sample> BlockProcessor<T> for GainShaper<T> {
    fn input_ports(&self) -> usize {
        1
    }

    fn output_ports(&self) -> usize {
        1
    }

    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]) {
        debug_check_ports(inputs, outputs, 1, 1);
        self.poll_recompute();
        for (out, &level) in outputs[0].iter_mut().zip(inputs[0]) {
            *out = self.gain_at(level);
        }
    }

    /// Gain curves do not depend on the sample rate.
    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), ConfigurationError> {
        crate::error::ensure_sample_rate(sample_rate)
    }

    fn reset(&mut self) {}
}

impl<T: Sample> Drop for GainShaper<T> {
    fn drop(&mut self) {
        self.wait_for_recompute();
    }
}
