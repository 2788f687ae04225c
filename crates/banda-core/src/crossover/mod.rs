//! Multiband crossovers: one input, one output per band.
//!
//! Two strategies with the same shape:
//!
//! - [`FirCrossover`] - windowed-sinc linear-phase bank. Bands reconstruct
//!   the input exactly (delayed) but cost `O(bands · order)` per sample.
//! - [`LinkwitzRileyCrossover`] - cascaded second-order sections, zero
//!   latency, phase-coherent sum.
//!
//! [`MultibandCrossover`] wraps either one. The strategy is chosen at
//! construction.

mod fir;
mod linkwitz_riley;

pub use fir::FirCrossover;
pub use linkwitz_riley::LinkwitzRileyCrossover;

use crate::error::{ensure_finite, ensure_sample_rate};
use crate::{BlockProcessor, ConfigurationError, Sample};

/// Checks interior crossover frequencies: finite, inside (0, Nyquist) and
/// strictly increasing.
pub(crate) fn validate_crossovers(crossovers: &[f64], sample_rate: f64) -> Result<(), ConfigurationError> {
    ensure_sample_rate(sample_rate)?;
    let nyquist = sample_rate / 2.0;
    for &frequency in crossovers {
        ensure_finite("crossover frequency", frequency)?;
        if !(frequency > 0.0 && frequency < nyquist) {
            return Err(ConfigurationError::CutoffOutOfRange { frequency, nyquist });
        }
    }
    for pair in crossovers.windows(2) {
        if pair[0] >= pair[1] {
            return Err(ConfigurationError::UnorderedBandEdges {
                low: pair[0],
                high: pair[1],
            });
        }
    }
    Ok(())
}

/// Either crossover strategy behind one interface.
#[derive(Debug, Clone)]
pub enum MultibandCrossover<T: Sample> {
    /// Linear-phase FIR bank.
    Fir(FirCrossover<T>),
    /// Linkwitz-Riley IIR bank.
    LinkwitzRiley(LinkwitzRileyCrossover<T>),
}

impl<T: Sample> MultibandCrossover<T> {
    /// FIR bank with `order + 1` taps per band.
    pub fn fir(order: usize, crossovers: &[f64], sample_rate: f64) -> Result<Self, ConfigurationError> {
        FirCrossover::new(order, crossovers, sample_rate).map(Self::Fir)
    }

    /// Linkwitz-Riley bank.
    pub fn linkwitz_riley(crossovers: &[f64], sample_rate: f64) -> Result<Self, ConfigurationError> {
        LinkwitzRileyCrossover::new(crossovers, sample_rate).map(Self::LinkwitzRiley)
    }

    /// Number of output bands.
    pub fn bands(&self) -> usize {
        match self {
            Self::Fir(bank) => bank.bands(),
            Self::LinkwitzRiley(bank) => bank.bands(),
        }
    }

    /// Interior crossover frequencies in Hz.
    pub fn crossovers(&self) -> &[f64] {
        match self {
            Self::Fir(bank) => bank.crossovers(),
            Self::LinkwitzRiley(bank) => bank.crossovers(),
        }
    }

    /// Replaces the crossover frequencies and clears history.
    pub fn set_crossovers(&mut self, crossovers: &[f64]) -> Result<(), ConfigurationError> {
        match self {
            Self::Fir(bank) => bank.set_crossovers(crossovers),
            Self::LinkwitzRiley(bank) => bank.set_crossovers(crossovers),
        }
    }

    /// Processes one sample, writing one value per band into `bands_out`.
    pub fn process_sample(&mut self, input: T, bands_out: &mut [T]) {
        match self {
            Self::Fir(bank) => bank.process_sample(input, bands_out),
            Self::LinkwitzRiley(bank) => bank.process_sample(input, bands_out),
        }
    }
}

impl<T: Sample> BlockProcessor<T> for MultibandCrossover<T> {
    fn input_ports(&self) -> usize {
        1
    }

    fn output_ports(&self) -> usize {
        self.bands()
    }

    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]) {
        match self {
            Self::Fir(bank) => bank.process(inputs, outputs),
            Self::LinkwitzRiley(bank) => bank.process(inputs, outputs),
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), ConfigurationError> {
        match self {
            Self::Fir(bank) => bank.set_sample_rate(sample_rate),
            Self::LinkwitzRiley(bank) => bank.set_sample_rate(sample_rate),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Fir(bank) => bank.reset(),
            Self::LinkwitzRiley(bank) => bank.reset(),
        }
    }

    fn latency_samples(&self) -> usize {
        match self {
            Self::Fir(bank) => bank.latency_samples(),
            Self::LinkwitzRiley(bank) => bank.latency_samples(),
        }
    }
}
