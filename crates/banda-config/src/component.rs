//! Serializable component configurations.
//!
//! Each config mirrors one core component's parameters in TOML-friendly form
//! and knows how to build (and validate) that component.

use banda_core::design::{Cutoff, FilterDesign, FilterFamily, Response, SecondOrderKind};
use banda_core::{
    BandShaper, BlockProcessor, ConfigurationError, DelayLineFilter, GainCurve, GainShaper, IirFilter,
    MultibandCrossover, Sample, Waveshaper,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::meter::LevelMeter;

/// Filter family name as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FamilyKind {
    /// `"butterworth"`
    Butterworth,
    /// `"bessel"`
    Bessel,
    /// `"chebyshev2"`
    Chebyshev2,
    /// `"second-order"`
    SecondOrder,
}

/// Response shape as written in configuration files.
///
/// Analog families take the first four; second-order sections take every
/// shape except `bandstop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// `"lowpass"`
    LowPass,
    /// `"highpass"`
    HighPass,
    /// `"bandpass"`
    BandPass,
    /// `"bandstop"`
    BandStop,
    /// `"peak"`
    Peak,
    /// `"allpass"`
    AllPass,
    /// `"lowshelf"`
    LowShelf,
    /// `"highshelf"`
    HighShelf,
}

/// `cutoff = 1000.0` or `cutoff = [400.0, 3000.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CutoffConfig {
    /// Single cutoff or centre frequency in Hz.
    Single(f64),
    /// Lower and upper band edges in Hz.
    Band(f64, f64),
}

impl From<CutoffConfig> for Cutoff {
    fn from(cutoff: CutoffConfig) -> Self {
        match cutoff {
            CutoffConfig::Single(f) => Cutoff::Single(f),
            CutoffConfig::Band(lo, hi) => Cutoff::Band(lo, hi),
        }
    }
}

impl From<Cutoff> for CutoffConfig {
    fn from(cutoff: Cutoff) -> Self {
        match cutoff {
            Cutoff::Single(f) => CutoffConfig::Single(f),
            Cutoff::Band(lo, hi) => CutoffConfig::Band(lo, hi),
        }
    }
}

fn default_order() -> usize {
    FilterDesign::DEFAULT_ORDER
}

fn default_q() -> f64 {
    FilterDesign::DEFAULT_Q
}

fn default_unity() -> f64 {
    1.0
}

fn default_ripple_db() -> f64 {
    FilterDesign::DEFAULT_RIPPLE_DB
}

/// One IIR filter.
///
/// # TOML Format
///
/// ```toml
/// [[filters]]
/// name = "rumble"
/// family = "butterworth"
/// response = "highpass"
/// order = 4
/// cutoff = 40.0
///
/// [[filters]]
/// family = "second-order"
/// response = "peak"
/// cutoff = 3000.0
/// q = 2.0
/// gain = 1.5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Optional label used in log and error messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Filter family.
    pub family: FamilyKind,

    /// Response shape.
    pub response: ResponseKind,

    /// Prototype order (defaults to 2, ignored by second-order sections).
    #[serde(default = "default_order")]
    pub order: usize,

    /// Cutoff frequency or band edges in Hz.
    pub cutoff: CutoffConfig,

    /// Quality factor of second-order sections.
    #[serde(default = "default_q")]
    pub q: f64,

    /// Linear gain of peak and shelf sections.
    #[serde(default = "default_unity")]
    pub gain: f64,

    /// Chebyshev type 2 stopband attenuation in dB.
    #[serde(default = "default_ripple_db")]
    pub ripple_db: f64,
}

impl FilterConfig {
    /// Create a filter configuration with default order, Q, gain and ripple.
    pub fn new(family: FamilyKind, response: ResponseKind, cutoff: CutoffConfig) -> Self {
        Self {
            name: None,
            family,
            response,
            order: default_order(),
            cutoff,
            q: default_q(),
            gain: default_unity(),
            ripple_db: default_ripple_db(),
        }
    }

    /// Set the label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the prototype order.
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Set the quality factor.
    pub fn with_q(mut self, q: f64) -> Self {
        self.q = q;
        self
    }

    /// Set the linear gain.
    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    /// Set the stopband attenuation.
    pub fn with_ripple_db(mut self, ripple_db: f64) -> Self {
        self.ripple_db = ripple_db;
        self
    }

    /// Configuration describing an existing design.
    pub fn from_design(design: &FilterDesign) -> Self {
        let (family, response) = match design.family {
            FilterFamily::Butterworth(r) => (FamilyKind::Butterworth, r.into()),
            FilterFamily::Bessel(r) => (FamilyKind::Bessel, r.into()),
            FilterFamily::Chebyshev2(r) => (FamilyKind::Chebyshev2, r.into()),
            FilterFamily::SecondOrder(kind) => (FamilyKind::SecondOrder, kind.into()),
        };
        Self {
            name: None,
            family,
            response,
            order: design.order,
            cutoff: design.cutoff.into(),
            q: design.q,
            gain: design.gain,
            ripple_db: design.ripple_db,
        }
    }

    /// Label for messages: the name, or `#index`.
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => format!("filter '{name}'"),
            None => format!("filter #{index}"),
        }
    }

    /// Resolve the family/response pair.
    pub fn filter_family(&self) -> Result<FilterFamily, ConfigError> {
        let analog = match self.response {
            ResponseKind::LowPass => Some(Response::LowPass),
            ResponseKind::HighPass => Some(Response::HighPass),
            ResponseKind::BandPass => Some(Response::BandPass),
            ResponseKind::BandStop => Some(Response::BandStop),
            _ => None,
        };
        let second_order = match self.response {
            ResponseKind::LowPass => Some(SecondOrderKind::LowPass),
            ResponseKind::HighPass => Some(SecondOrderKind::HighPass),
            ResponseKind::BandPass => Some(SecondOrderKind::BandPass),
            ResponseKind::Peak => Some(SecondOrderKind::Peak),
            ResponseKind::AllPass => Some(SecondOrderKind::AllPass),
            ResponseKind::LowShelf => Some(SecondOrderKind::LowShelf),
            ResponseKind::HighShelf => Some(SecondOrderKind::HighShelf),
            ResponseKind::BandStop => None,
        };

        let family = match self.family {
            FamilyKind::Butterworth => analog.map(FilterFamily::Butterworth),
            FamilyKind::Bessel => analog.map(FilterFamily::Bessel),
            FamilyKind::Chebyshev2 => analog.map(FilterFamily::Chebyshev2),
            FamilyKind::SecondOrder => second_order.map(FilterFamily::SecondOrder),
        };
        family.ok_or_else(|| {
            ConfigError::invalid_parameter(
                "filter",
                "response",
                format!("{:?} is not available for {:?}", self.response, self.family),
            )
        })
    }

    /// Core design for this configuration (not yet checked against a sample rate).
    pub fn design(&self) -> Result<FilterDesign, ConfigError> {
        Ok(FilterDesign::new(self.filter_family()?, self.cutoff.into())
            .with_order(self.order)
            .with_q(self.q)
            .with_gain(self.gain)
            .with_ripple_db(self.ripple_db))
    }

    /// Check every parameter against `sample_rate`.
    pub fn validate(&self, sample_rate: f64) -> Result<(), ConfigError> {
        self.design()?.validate(sample_rate)?;
        Ok(())
    }

    /// Build a filter with `channels` independent histories.
    pub fn build<T: Sample>(&self, sample_rate: f64, channels: usize) -> Result<IirFilter<T>, ConfigError> {
        let filter = IirFilter::new(self.design()?, sample_rate, channels)?;
        tracing::debug!(
            family = ?self.family,
            response = ?self.response,
            order = filter.coefficients().order(),
            "built filter"
        );
        Ok(filter)
    }
}

impl From<Response> for ResponseKind {
    fn from(response: Response) -> Self {
        match response {
            Response::LowPass => Self::LowPass,
            Response::HighPass => Self::HighPass,
            Response::BandPass => Self::BandPass,
            Response::BandStop => Self::BandStop,
        }
    }
}

impl From<SecondOrderKind> for ResponseKind {
    fn from(kind: SecondOrderKind) -> Self {
        match kind {
            SecondOrderKind::LowPass => Self::LowPass,
            SecondOrderKind::HighPass => Self::HighPass,
            SecondOrderKind::BandPass => Self::BandPass,
            SecondOrderKind::Peak => Self::Peak,
            SecondOrderKind::AllPass => Self::AllPass,
            SecondOrderKind::LowShelf => Self::LowShelf,
            SecondOrderKind::HighShelf => Self::HighShelf,
        }
    }
}

fn default_fir_order() -> usize {
    128
}

/// Band-splitting strategy and its crossover frequencies.
///
/// # TOML Format
///
/// ```toml
/// [crossover]
/// strategy = "fir"
/// order = 256
/// frequencies = [200.0, 2000.0]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum CrossoverConfig {
    /// Linear-phase windowed-sinc bank.
    Fir {
        /// Kernel order (defaults to 128).
        #[serde(default = "default_fir_order")]
        order: usize,
        /// Interior crossover frequencies in Hz.
        frequencies: Vec<f64>,
    },
    /// Linkwitz-Riley cascaded-biquad bank.
    LinkwitzRiley {
        /// Interior crossover frequencies in Hz.
        frequencies: Vec<f64>,
    },
}

impl CrossoverConfig {
    /// Interior crossover frequencies in Hz.
    pub fn frequencies(&self) -> &[f64] {
        match self {
            Self::Fir { frequencies, .. } | Self::LinkwitzRiley { frequencies } => frequencies,
        }
    }

    /// Number of bands the crossover produces.
    pub fn bands(&self) -> usize {
        self.frequencies().len() + 1
    }

    /// Build the crossover bank.
    pub fn build<T: Sample>(&self, sample_rate: f64) -> Result<MultibandCrossover<T>, ConfigError> {
        let bank = match self {
            Self::Fir { order, frequencies } => MultibandCrossover::fir(*order, frequencies, sample_rate)?,
            Self::LinkwitzRiley { frequencies } => {
                MultibandCrossover::linkwitz_riley(frequencies, sample_rate)?
            }
        };
        tracing::debug!(bands = bank.bands(), "built crossover");
        Ok(bank)
    }
}

/// Universal comb filter.
///
/// # TOML Format
///
/// ```toml
/// [delay]
/// max_delay = 4800
/// delay = 2400
/// feedback = 0.5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Line capacity in samples.
    pub max_delay: usize,

    /// Delay in samples, below `max_delay`.
    #[serde(default)]
    pub delay: usize,

    /// Gain on the undelayed signal.
    #[serde(default)]
    pub blend: f64,

    /// Recirculation gain, `|feedback| <= 1`.
    #[serde(default)]
    pub feedback: f64,

    /// Gain on the delayed tap.
    #[serde(default = "default_unity")]
    pub feedforward: f64,
}

impl DelayConfig {
    /// Pure delay of `delay` samples in a line of `max_delay`.
    pub fn new(max_delay: usize, delay: usize) -> Self {
        Self {
            max_delay,
            delay,
            blend: 0.0,
            feedback: 0.0,
            feedforward: 1.0,
        }
    }

    /// Build the delay line.
    pub fn build<T: Sample>(&self) -> Result<DelayLineFilter<T>, ConfigError> {
        let mut line = DelayLineFilter::new(self.max_delay)?;
        line.set_delay(self.delay)?;
        line.set_blend(T::from_f64(self.blend))?;
        line.set_feedback(T::from_f64(self.feedback))?;
        line.set_feedforward(T::from_f64(self.feedforward))?;
        tracing::debug!(capacity = self.max_delay, delay = self.delay, "built delay line");
        Ok(line)
    }
}

fn default_window_ms() -> f64 {
    banda_core::RmsFollower::<f64>::DEFAULT_WINDOW_MS
}

fn default_half_life() -> f64 {
    banda_core::PeakFollower::<f64>::DEFAULT_HALF_LIFE
}

/// Level follower.
///
/// # TOML Format
///
/// ```toml
/// [meter]
/// kind = "rms"
/// window_ms = 20.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MeterConfig {
    /// Sliding-window RMS.
    Rms {
        /// Window length in milliseconds (defaults to 50).
        #[serde(default = "default_window_ms")]
        window_ms: f64,
    },
    /// Peak hold with half-life release.
    Peak {
        /// Release half-life in seconds (defaults to 0.5).
        #[serde(default = "default_half_life")]
        half_life: f64,
    },
}

impl MeterConfig {
    /// Build the follower.
    pub fn build<T: Sample>(&self, sample_rate: f64) -> Result<LevelMeter<T>, ConfigError> {
        let meter = match *self {
            Self::Rms { window_ms } => LevelMeter::rms(window_ms, sample_rate)?,
            Self::Peak { half_life } => LevelMeter::peak(half_life, sample_rate)?,
        };
        tracing::debug!(meter = ?self, "built level meter");
        Ok(meter)
    }
}

/// Gain curve name as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    /// `"limiter"`
    Limiter,
    /// `"swell"`
    Swell,
}

impl From<CurveKind> for GainCurve {
    fn from(kind: CurveKind) -> Self {
        match kind {
            CurveKind::Limiter => GainCurve::Limiter,
            CurveKind::Swell => GainCurve::Swell,
        }
    }
}

fn default_softness() -> f64 {
    GainShaper::<f64>::DEFAULT_SOFTNESS
}

fn default_lut_size() -> usize {
    GainShaper::<f64>::DEFAULT_LUT_SIZE
}

fn default_lut_precision() -> usize {
    GainShaper::<f64>::DEFAULT_LUT_PRECISION
}

/// Table-driven gain computer.
///
/// # TOML Format
///
/// ```toml
/// [gain]
/// curve = "limiter"
/// threshold = 0.25
/// softness = 1.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainShaperConfig {
    /// Curve shape.
    pub curve: CurveKind,

    /// Knee softness, `> 0`.
    #[serde(default = "default_softness")]
    pub softness: f64,

    /// Swell exponent scale, `> 0`.
    #[serde(default = "default_unity")]
    pub ratio: f64,

    /// Level the curve is centred on, `> 0`.
    #[serde(default = "default_unity")]
    pub threshold: f64,

    /// Table length.
    #[serde(default = "default_lut_size")]
    pub lut_size: usize,

    /// Table entries per unit of relative level.
    #[serde(default = "default_lut_precision")]
    pub lut_precision: usize,
}

impl GainShaperConfig {
    /// Curve with default softness, ratio, threshold and table layout.
    pub fn new(curve: CurveKind) -> Self {
        Self {
            curve,
            softness: default_softness(),
            ratio: 1.0,
            threshold: 1.0,
            lut_size: default_lut_size(),
            lut_precision: default_lut_precision(),
        }
    }

    /// Check every parameter without building a table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if self.lut_size == 0 || self.lut_precision == 0 {
            return Err(ConfigurationError::InvalidTable {
                size: self.lut_size,
                precision: self.lut_precision,
            }
            .into());
        }
        if !positive(self.softness) {
            return Err(ConfigurationError::InvalidSoftness(self.softness).into());
        }
        if !positive(self.ratio) {
            return Err(ConfigurationError::InvalidRatio(self.ratio).into());
        }
        if !positive(self.threshold) {
            return Err(ConfigurationError::InvalidThreshold(self.threshold).into());
        }
        Ok(())
    }

    /// Build the shaper and wait for its table.
    pub fn build<T: Sample>(&self) -> Result<GainShaper<T>, ConfigError> {
        let mut shaper = GainShaper::new(self.curve.into(), self.lut_size, self.lut_precision)?;
        if self.softness != shaper.softness() {
            shaper.set_softness(self.softness)?;
        }
        if self.ratio != shaper.ratio() {
            shaper.set_ratio(self.ratio)?;
        }
        shaper.set_threshold(self.threshold)?;
        shaper.wait_for_recompute();
        tracing::debug!(curve = ?self.curve, lut_size = self.lut_size, "built gain shaper");
        Ok(shaper)
    }
}

/// Waveshaper name as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeKind {
    /// `"soft-clip"`
    SoftClip,
    /// `"arctan"`
    Arctan,
    /// `"sine"`
    Sine,
    /// `"foldback"`
    Foldback,
}

impl From<ShapeKind> for Waveshaper {
    fn from(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::SoftClip => Waveshaper::SoftClip,
            ShapeKind::Arctan => Waveshaper::Arctan,
            ShapeKind::Sine => Waveshaper::Sine,
            ShapeKind::Foldback => Waveshaper::Foldback,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_smoothing_ms() -> f64 {
    BandShaper::DEFAULT_SMOOTHING_MS
}

/// Per-band drive and saturation, one instance per crossover band.
///
/// # TOML Format
///
/// ```toml
/// [shaper]
/// shape = "arctan"
/// input_gain_db = 12.0
/// output_clip = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaperConfig {
    /// Saturation curve.
    pub shape: ShapeKind,

    /// Drive in dB.
    #[serde(default)]
    pub input_gain_db: f64,

    /// Make-up gain in dB, used when `auto_gain` is off.
    #[serde(default)]
    pub output_gain_db: f64,

    /// Follow the drive with the opposite output gain (defaults to on).
    #[serde(default = "default_true")]
    pub auto_gain: bool,

    /// Pin samples beyond full scale to -0.1 dBFS.
    #[serde(default)]
    pub output_clip: bool,

    /// Gain glide time constant in milliseconds.
    #[serde(default = "default_smoothing_ms")]
    pub smoothing_ms: f64,
}

impl ShaperConfig {
    /// Curve at unity gain with auto gain on and no clip.
    pub fn new(shape: ShapeKind) -> Self {
        Self {
            shape,
            input_gain_db: 0.0,
            output_gain_db: 0.0,
            auto_gain: true,
            output_clip: false,
            smoothing_ms: default_smoothing_ms(),
        }
    }

    /// Build one shaper resting at its configured gains.
    pub fn build(&self, sample_rate: f64) -> Result<BandShaper, ConfigError> {
        let mut shaper = BandShaper::new(self.shape.into(), sample_rate)?;
        shaper.set_smoothing_ms(self.smoothing_ms)?;
        shaper.set_input_gain_db(self.input_gain_db)?;
        shaper.set_output_gain_db(self.output_gain_db)?;
        shaper.set_auto_gain(self.auto_gain);
        shaper.set_output_clip(self.output_clip);
        // Start at the configured gains instead of gliding up from unity
        BlockProcessor::<f64>::reset(&mut shaper);
        tracing::debug!(shape = ?self.shape, input_gain_db = self.input_gain_db, "built band shaper");
        Ok(shaper)
    }
}
