//! Per-band saturation: drive, waveshaping curve, make-up gain and an
//! optional output clip.
//!
//! [`BandShaper`] is the stage a multiband distortion runs on each crossover
//! band:
//!
//! ```text
//! x ─► ×input gain ─► waveshaper ─► ×output gain ─► clip ─► y
//! ```
//!
//! Both gains are set in dB and glide through a [`SmoothedParam`], so
//! moving a knob never clicks. With auto gain compensation on, the output
//! gain mirrors the input gain (`-input_db`) and the explicit output gain is
//! ignored.
//!
//! # Example
//!
//! ```rust
//! use banda_core::{BandShaper, Waveshaper};
//!
//! let mut band = BandShaper::new(Waveshaper::Foldback, 48000.0).unwrap();
//! band.set_input_gain_db(12.0).unwrap();
//! band.set_output_clip(true);
//!
//! let mut y = 0.0f32;
//! for _ in 0..4800 {
//!     y = band.process_sample(0.5f32);
//! }
//! assert!(y.abs() <= 1.0);
//! ```

use core::f64::consts::{FRAC_PI_2, PI};

use libm::{fabs, fmod, pow, sin};

use crate::error::{ensure_finite, ensure_sample_rate};
use crate::math::db_to_linear;
use crate::param::SmoothedParam;
use crate::processor::debug_check_ports;
use crate::{BlockProcessor, ConfigurationError, Sample};

/// Knee of the soft clipper and fold point of the foldback shaper.
const SHAPER_THRESHOLD: f64 = 0.9;
/// Input scaling ahead of the arctangent.
const ARCTAN_DRIVE: f64 = 3.0;
/// Sine shaper amount; sets both the sine span and the linear segments.
const SINE_AMOUNT: f64 = 1.6;
/// Fraction of the distance to ±1 the sine shaper covers past its knee.
const SINE_PULL: f64 = 0.8;

/// Rational arctangent approximation, `x / (1 + 0.28·x²)`, mirrored through
/// `atan(x) = ±π/2 - atan(1/x)` outside `[-1, 1]` so it stays monotone.
///
/// Absolute error stays below 0.005 rad.
#[inline]
pub fn fast_atan(x: f64) -> f64 {
    if fabs(x) <= 1.0 {
        x / (1.0 + 0.28 * x * x)
    } else {
        let reflected = x / (x * x + 0.28);
        if x > 0.0 {
            FRAC_PI_2 - reflected
        } else {
            -FRAC_PI_2 - reflected
        }
    }
}

/// Static saturation curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveshaper {
    /// Positive half bends above 0.9 and tops out at 0.95; the negative half
    /// passes unchanged, which adds even harmonics.
    SoftClip,
    /// `fast_atan(3x)`: smooth symmetric saturation towards ±π/2.
    Arctan,
    /// Sine segment inside `±1/1.6`, linear pull towards ±1 outside it,
    /// then 1.6 dB quieter.
    Sine,
    /// Reflects everything beyond ±0.9 back into range.
    Foldback,
}

impl Waveshaper {
    /// Every curve, in configuration order.
    pub const ALL: [Self; 4] = [Self::SoftClip, Self::Arctan, Self::Sine, Self::Foldback];

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SoftClip => "soft clip",
            Self::Arctan => "arctan",
            Self::Sine => "sine",
            Self::Foldback => "foldback",
        }
    }

    /// Shapes one sample.
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::SoftClip => {
                let t = SHAPER_THRESHOLD;
                if x > 1.0 {
                    (t + 1.0) / 2.0
                } else if x > t {
                    let over = (x - t) / (1.0 - t);
                    t + (x - t) / (1.0 + over * over)
                } else {
                    x
                }
            }
            Self::Arctan => fast_atan(x * ARCTAN_DRIVE),
            Self::Sine => {
                let z = PI * SINE_AMOUNT / 4.0;
                let knee = 1.0 / SINE_AMOUNT;
                let shaped = if x > knee {
                    x + (1.0 - x) * SINE_PULL
                } else if x < -knee {
                    x + (-1.0 - x) * SINE_PULL
                } else {
                    sin(z * x) / sin(z)
                };
                shaped * pow(10.0, -SINE_AMOUNT / 20.0)
            }
            Self::Foldback => {
                let t = SHAPER_THRESHOLD;
                if x > t || x < -t {
                    fabs(fabs(fmod(x - t, 4.0 * t)) - 2.0 * t) - t
                } else {
                    x
                }
            }
        }
    }
}

/// One band's drive, waveshaper, make-up gain and clip.
///
/// Works on any [`Sample`] type; the arithmetic runs in `f64`. Gains are
/// limited to ±[`BandShaper::MAX_GAIN_DB`].
#[derive(Debug, Clone)]
pub struct BandShaper {
    shape: Waveshaper,
    sample_rate: f64,
    input_gain: SmoothedParam,
    output_gain: SmoothedParam,
    output_gain_db: f64,
    auto_gain: bool,
    output_clip: bool,
}

impl BandShaper {
    /// Largest accepted gain magnitude in dB.
    pub const MAX_GAIN_DB: f64 = 36.0;
    /// Default gain smoothing time constant.
    pub const DEFAULT_SMOOTHING_MS: f64 = 5.0;
    /// Level a clipped sample is pinned to, -0.1 dBFS.
    pub const CLIP_DB: f64 = -0.1;

    /// Unity-gain shaper with auto gain compensation on and clipping off.
    pub fn new(shape: Waveshaper, sample_rate: f64) -> Result<Self, ConfigurationError> {
        ensure_sample_rate(sample_rate)?;
        Ok(Self {
            shape,
            sample_rate,
            input_gain: SmoothedParam::with_config(0.0, sample_rate, Self::DEFAULT_SMOOTHING_MS),
            output_gain: SmoothedParam::with_config(0.0, sample_rate, Self::DEFAULT_SMOOTHING_MS),
            output_gain_db: 0.0,
            auto_gain: true,
            output_clip: false,
        })
    }

    fn check_gain(gain_db: f64) -> Result<(), ConfigurationError> {
        ensure_finite("gain", gain_db)?;
        if fabs(gain_db) <= Self::MAX_GAIN_DB {
            Ok(())
        } else {
            Err(ConfigurationError::GainOutOfRange {
                gain_db,
                limit: Self::MAX_GAIN_DB,
            })
        }
    }

    fn output_target(&self) -> f64 {
        if self.auto_gain {
            -self.input_gain.target()
        } else {
            self.output_gain_db
        }
    }

    /// Selects the saturation curve. Takes effect on the next sample.
    pub fn set_shape(&mut self, shape: Waveshaper) {
        self.shape = shape;
    }

    /// Sets the drive ahead of the waveshaper.
    pub fn set_input_gain_db(&mut self, gain_db: f64) -> Result<(), ConfigurationError> {
        Self::check_gain(gain_db)?;
        self.input_gain.set_target(gain_db);
        self.output_gain.set_target(self.output_target());
        Ok(())
    }

    /// Sets the make-up gain after the waveshaper. Stored but inactive while
    /// auto gain compensation is on.
    pub fn set_output_gain_db(&mut self, gain_db: f64) -> Result<(), ConfigurationError> {
        Self::check_gain(gain_db)?;
        self.output_gain_db = gain_db;
        self.output_gain.set_target(self.output_target());
        Ok(())
    }

    /// Switches auto gain compensation.
    pub fn set_auto_gain(&mut self, enabled: bool) {
        self.auto_gain = enabled;
        self.output_gain.set_target(self.output_target());
    }

    /// Switches the output clip.
    pub fn set_output_clip(&mut self, enabled: bool) {
        self.output_clip = enabled;
    }

    /// Sets the gain smoothing time constant; zero makes changes instant.
    pub fn set_smoothing_ms(&mut self, time_ms: f64) -> Result<(), ConfigurationError> {
        ensure_finite("smoothing time", time_ms)?;
        if time_ms < 0.0 {
            return Err(ConfigurationError::InvalidTime {
                name: "smoothing time",
                value: time_ms,
            });
        }
        self.input_gain.set_smoothing_time_ms(time_ms);
        self.output_gain.set_smoothing_time_ms(time_ms);
        Ok(())
    }

    /// Saturation curve.
    pub fn shape(&self) -> Waveshaper {
        self.shape
    }

    /// Requested drive in dB.
    pub fn input_gain_db(&self) -> f64 {
        self.input_gain.target()
    }

    /// Requested make-up gain in dB (ignored under auto gain compensation).
    pub fn output_gain_db(&self) -> f64 {
        self.output_gain_db
    }

    /// Whether auto gain compensation is on.
    pub fn auto_gain(&self) -> bool {
        self.auto_gain
    }

    /// Whether the output clip is on.
    pub fn output_clip(&self) -> bool {
        self.output_clip
    }

    /// Gain smoothing time constant in milliseconds.
    pub fn smoothing_ms(&self) -> f64 {
        self.input_gain.smoothing_time_ms()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Shapes one sample, advancing both gain smoothers.
    #[inline]
    pub fn process_sample<T: Sample>(&mut self, input: T) -> T {
        let driven = input.into_f64() * db_to_linear(self.input_gain.advance());
        let mut y = self.shape.apply(driven) * db_to_linear(self.output_gain.advance());

        if self.output_clip {
            let ceiling = db_to_linear(Self::CLIP_DB);
            if y > 1.0 {
                y = ceiling;
            } else if y < -1.0 {
                y = -ceiling;
            }
        }
        T::from_f64(y)
    }
}

impl<T: Sample> BlockProcessor<T> for BandShaper {
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
        self.input_gain.set_sample_rate(sample_rate);
        self.output_gain.set_sample_rate(sample_rate);
        Ok(())
    }

    /// Ends any gain glide at its target.
    fn reset(&mut self) {
        self.input_gain.snap_to_target();
        self.output_gain.snap_to_target();
    }
}
