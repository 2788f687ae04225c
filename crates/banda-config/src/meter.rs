//! Either level follower behind one interface.

use banda_core::{BlockProcessor, ConfigurationError, PeakFollower, RmsFollower, Sample};

/// Level follower chosen by configuration.
#[derive(Debug, Clone)]
pub enum LevelMeter<T: Sample> {
    /// Sliding-window RMS.
    Rms(RmsFollower<T>),
    /// Peak hold with half-life release.
    Peak(PeakFollower<T>),
}

impl<T: Sample> LevelMeter<T> {
    /// RMS meter over `window_ms` milliseconds.
    pub fn rms(window_ms: f64, sample_rate: f64) -> Result<Self, ConfigurationError> {
        RmsFollower::new(window_ms, sample_rate).map(Self::Rms)
    }

    /// Peak meter releasing with `half_life` seconds.
    pub fn peak(half_life: f64, sample_rate: f64) -> Result<Self, ConfigurationError> {
        PeakFollower::new(half_life, sample_rate).map(Self::Peak)
    }

    /// Current level.
    pub fn level(&self) -> T {
        match self {
            Self::Rms(meter) => meter.level(),
            Self::Peak(meter) => meter.level(),
        }
    }

    /// Pushes one sample and returns the level.
    pub fn process_sample(&mut self, input: T) -> T {
        match self {
            Self::Rms(meter) => meter.process_sample(input),
            Self::Peak(meter) => meter.process_sample(input),
        }
    }
}

impl<T: Sample> BlockProcessor<T> for LevelMeter<T> {
    fn input_ports(&self) -> usize {
        1
    }

    fn output_ports(&self) -> usize {
        1
    }

    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]) {
        match self {
            Self::Rms(meter) => meter.process(inputs, outputs),
            Self::Peak(meter) => meter.process(inputs, outputs),
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), ConfigurationError> {
        match self {
            Self::Rms(meter) => meter.set_sample_rate(sample_rate),
            Self::Peak(meter) => meter.set_sample_rate(sample_rate),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Rms(meter) => meter.reset(),
            Self::Peak(meter) => meter.reset(),
        }
    }
}
