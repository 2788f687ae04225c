//! Linkwitz-Riley (24 dB/oct) IIR crossover bank.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;
use core::f64::consts::FRAC_1_SQRT_2;

use super::validate_crossovers;
use crate::design::{Coefficients, Cutoff, FilterDesign, FilterFamily, SecondOrderKind};
use crate::iir::FilterState;
use crate::processor::debug_check_ports;
use crate::{BlockProcessor, ConfigurationError, Sample};

/// One biquad stage with its own history.
#[derive(Debug, Clone)]
struct Section<T: Sample> {
    coefficients: Coefficients<T>,
    state: FilterState<T>,
}

impl<T: Sample> Section<T> {
    fn new(coefficients: &Coefficients<T>) -> Self {
        Self {
            state: FilterState::new(coefficients.order()),
            coefficients: coefficients.clone(),
        }
    }
}

fn butterworth_section(kind: SecondOrderKind, freq_hz: f64, sample_rate: f64) -> Result<Coefficients<f64>, ConfigurationError> {
    FilterDesign::new(FilterFamily::SecondOrder(kind), Cutoff::Single(freq_hz))
        .with_q(FRAC_1_SQRT_2)
        .design(sample_rate)
}

/// Cascaded-biquad crossover splitting one input into `crossovers + 1` bands.
///
/// Each crossover is a squared Butterworth lowpass/highpass pair (LR4). All
/// bands are filtered from the shared input:
///
/// ```text
/// band 0     = LP(c0)²
/// band k     = HP(c[k-1])² · LP(c[k])²
/// band K - 1 = HP(c[K-2])²
/// ```
///
/// Two bands sum to an allpass. With more bands the sum stays close to flat
/// when the crossovers are a decade or more apart.
///
/// # Example
///
/// ```rust
/// use banda_core::LinkwitzRileyCrossover;
///
/// let mut bank = LinkwitzRileyCrossover::<f32>::new(&[120.0, 1200.0, 6000.0], 48000.0).unwrap();
/// assert_eq!(bank.bands(), 4);
///
/// let mut bands = [0.0f32; 4];
/// bank.process_sample(0.5, &mut bands);
/// ```
#[derive(Debug, Clone)]
pub struct LinkwitzRileyCrossover<T: Sample> {
    crossovers: Vec<f64>,
    sample_rate: f64,
    bands: Vec<Vec<Section<T>>>,
}

impl<T: Sample> LinkwitzRileyCrossover<T> {
    /// Builds the bank for the interior `crossovers` in Hz.
    pub fn new(crossovers: &[f64], sample_rate: f64) -> Result<Self, ConfigurationError> {
        let mut bank = Self {
            crossovers: Vec::new(),
            sample_rate,
            bands: Vec::new(),
        };
        bank.configure(crossovers, sample_rate)?;
        Ok(bank)
    }

    fn configure(&mut self, crossovers: &[f64], sample_rate: f64) -> Result<(), ConfigurationError> {
        validate_crossovers(crossovers, sample_rate)?;

        let mut lowpass = Vec::with_capacity(crossovers.len());
        let mut highpass = Vec::with_capacity(crossovers.len());
        for &freq in crossovers {
            lowpass.push(butterworth_section(SecondOrderKind::LowPass, freq, sample_rate)?.cast::<T>());
            highpass.push(butterworth_section(SecondOrderKind::HighPass, freq, sample_rate)?.cast::<T>());
        }

        let band_count = crossovers.len() + 1;
        self.bands = (0..band_count)
            .map(|band| {
                let mut chain = Vec::with_capacity(4);
                if band > 0 {
                    chain.push(Section::new(&highpass[band - 1]));
                    chain.push(Section::new(&highpass[band - 1]));
                }
                if band + 1 < band_count {
                    chain.push(Section::new(&lowpass[band]));
                    chain.push(Section::new(&lowpass[band]));
                }
                chain
            })
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!("lr_crossover_setup: {band_count} bands at {sample_rate} Hz");

        self.crossovers.clear();
        self.crossovers.extend_from_slice(crossovers);
        self.sample_rate = sample_rate;
        Ok(())
    }

    /// Replaces the crossover frequencies and clears history.
    pub fn set_crossovers(&mut self, crossovers: &[f64]) -> Result<(), ConfigurationError> {
        self.configure(crossovers, self.sample_rate)
    }

    /// Interior crossover frequencies in Hz.
    pub fn crossovers(&self) -> &[f64] {
        &self.crossovers
    }

    /// Number of output bands.
    pub fn bands(&self) -> usize {
        self.bands.len()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Combined response of `band` at `freq_hz`.
    pub fn band_magnitude_at(&self, band: usize, freq_hz: f64) -> f64 {
        self.bands[band]
            .iter()
            .map(|s| s.coefficients.magnitude_at(freq_hz, self.sample_rate))
            .product()
    }

    #[inline]
    fn band_output(chain: &mut [Section<T>], input: T) -> T {
        chain
            .iter_mut()
            .fold(input, |x, s| s.state.tick(&s.coefficients, x))
    }

    /// Processes one sample, writing one value per band into `bands_out`.
    pub fn process_sample(&mut self, input: T, bands_out: &mut [T]) {
        debug_assert_eq!(bands_out.len(), self.bands(), "band count mismatch");
        for (chain, out) in self.bands.iter_mut().zip(bands_out.iter_mut()) {
            *out = Self::band_output(chain, input);
        }
    }
}

impl<T: Sample> BlockProcessor<T> for LinkwitzRileyCrossover<T> {
    fn input_ports(&self) -> usize {
        1
    }

    fn output_ports(&self) -> usize {
        self.bands.len()
    }

    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]) {
        debug_check_ports(inputs, outputs, 1, self.bands());
        // Bands never interact, so each chain can run over the whole block.
        for (chain, out) in self.bands.iter_mut().zip(outputs.iter_mut()) {
            for (y, &x) in out.iter_mut().zip(inputs[0]) {
                *y = Self::band_output(chain, x);
            }
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), ConfigurationError> {
        let crossovers = core::mem::take(&mut self.crossovers);
        let result = self.configure(&crossovers, sample_rate);
        if result.is_err() {
            self.crossovers = crossovers;
        }
        result
    }

    fn reset(&mut self) {
        for section in self.bands.iter_mut().flatten() {
            section.state.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48000.0;

    #[test]
    fn test_two_band_sum_is_allpass() {
        let bank = LinkwitzRileyCrossover::<f64>::new(&[1000.0], SR).unwrap();
        // Sum of complex responses, not magnitudes
        let response = |band: usize, f: f64| {
            bank.bands[band]
                .iter()
                .map(|s| s.coefficients.response_at(f, SR))
                .product::<num_complex::Complex64>()
        };
        for &f in &[20.0, 200.0, 1000.0, 5000.0, 20000.0] {
            let sum = response(0, f) + response(1, f);
            assert!((sum.norm() - 1.0).abs() < 1e-9, "at {f} Hz: {}", sum.norm());
        }
    }

    #[test]
    fn test_bands_are_minus_six_db_at_crossover() {
        let bank = LinkwitzRileyCrossover::<f64>::new(&[800.0], SR).unwrap();
        for band in 0..2 {
            let db = crate::linear_to_db(bank.band_magnitude_at(band, 800.0));
            assert!((db + 6.0206).abs() < 1e-3, "band {band}: {db} dB");
        }
    }

    #[test]
    fn test_middle_band_is_bandpass() {
        let bank = LinkwitzRileyCrossover::<f64>::new(&[200.0, 4000.0], SR).unwrap();
        assert_eq!(bank.bands(), 3);
        assert_eq!(bank.bands[1].len(), 4);
        assert!(bank.band_magnitude_at(1, 10.0) < 1e-3);
        assert!(bank.band_magnitude_at(1, 20000.0) < 1e-2);
        assert!(bank.band_magnitude_at(1, 900.0) > 0.9);
    }

    #[test]
    fn test_single_band_passes_through() {
        let mut bank = LinkwitzRileyCrossover::<f32>::new(&[], SR).unwrap();
        let mut out = [0.0f32];
        for x in [0.1f32, -0.4, 0.9] {
            bank.process_sample(x, &mut out);
            assert_eq!(out[0], x);
        }
    }

    #[test]
    fn test_block_matches_per_sample() {
        let mut a = LinkwitzRileyCrossover::<f32>::new(&[300.0, 3000.0], SR).unwrap();
        let mut b = a.clone();
        let input: Vec<f32> = (0..256).map(|i| ((i * 7919) % 200) as f32 / 100.0 - 1.0).collect();

        let mut low = vec![0.0f32; 256];
        let mut mid = vec![0.0f32; 256];
        let mut high = vec![0.0f32; 256];
        a.process(&[&input], &mut [&mut low, &mut mid, &mut high]);

        let mut bands = [0.0f32; 3];
        for (i, &x) in input.iter().enumerate() {
            b.process_sample(x, &mut bands);
            assert_eq!(bands, [low[i], mid[i], high[i]], "sample {i}");
        }
    }

    #[test]
    fn test_rejects_unordered_crossovers() {
        assert!(matches!(
            LinkwitzRileyCrossover::<f32>::new(&[500.0, 500.0], SR),
            Err(ConfigurationError::UnorderedBandEdges { .. })
        ));
        let mut bank = LinkwitzRileyCrossover::<f32>::new(&[500.0], SR).unwrap();
        assert!(bank.set_crossovers(&[-1.0]).is_err());
        assert_eq!(bank.crossovers(), &[500.0]);
    }
}
