//! Linear-phase FIR crossover bank.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use super::validate_crossovers;
use crate::math::{hamming, sinc};
use crate::processor::debug_check_ports;
use crate::{BlockProcessor, ConfigurationError, Sample};

/// Windowed-sinc crossover splitting one input into `crossovers + 1` bands.
///
/// Band `b` is the difference of two Hamming-windowed ideal lowpass kernels
/// at its edges, so the band kernels telescope: for even `order` their sum is
/// a unit impulse at `order / 2` and the bands add back up to the input
/// delayed by that many samples.
///
/// # Example
///
/// ```rust
/// use banda_core::FirCrossover;
///
/// let mut bank = FirCrossover::<f32>::new(128, &[250.0, 2500.0], 48000.0).unwrap();
/// assert_eq!(bank.bands(), 3);
///
/// let mut bands = [0.0f32; 3];
/// bank.process_sample(1.0, &mut bands);
/// ```
#[derive(Debug, Clone)]
pub struct FirCrossover<T: Sample> {
    order: usize,
    crossovers: Vec<f64>,
    sample_rate: f64,
    /// One kernel of `order + 1` taps per band, stored time-reversed.
    taps: Vec<Vec<T>>,
    /// Input history written twice, `order + 1` apart, so the last
    /// `order + 1` inputs are always one contiguous slice.
    history: Vec<T>,
    write_pos: usize,
}

impl<T: Sample> FirCrossover<T> {
    /// Builds a bank of `order + 1` taps per band.
    ///
    /// `crossovers` are the interior band edges in Hz, strictly increasing
    /// inside (0, Nyquist). An empty list gives a single full-range band.
    pub fn new(order: usize, crossovers: &[f64], sample_rate: f64) -> Result<Self, ConfigurationError> {
        let mut bank = Self {
            order: 0,
            crossovers: Vec::new(),
            sample_rate,
            taps: Vec::new(),
            history: Vec::new(),
            write_pos: 0,
        };
        bank.configure(order, crossovers, sample_rate)?;
        Ok(bank)
    }

    fn configure(&mut self, order: usize, crossovers: &[f64], sample_rate: f64) -> Result<(), ConfigurationError> {
        if order < 1 {
            return Err(ConfigurationError::InvalidOrder(order));
        }
        validate_crossovers(crossovers, sample_rate)?;

        let len = order + 1;
        let centre = order as f64 / 2.0;
        // Normalized edges: 0, interior crossovers, 0.5 (cycles per sample)
        let edges: Vec<f64> = core::iter::once(0.0)
            .chain(crossovers.iter().map(|&f| f / sample_rate))
            .chain(core::iter::once(0.5))
            .collect();

        self.taps = edges
            .windows(2)
            .map(|band| {
                let (lo, hi) = (band[0], band[1]);
                (0..len)
                    .rev()
                    .map(|n| {
                        let t = n as f64 - centre;
                        let ideal = 2.0 * hi * sinc(2.0 * hi * t) - 2.0 * lo * sinc(2.0 * lo * t);
                        T::from_f64(ideal * hamming(n, order))
                    })
                    .collect()
            })
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "fir_crossover_setup: {} bands, order {order} at {sample_rate} Hz",
            self.taps.len()
        );

        self.order = order;
        self.crossovers.clear();
        self.crossovers.extend_from_slice(crossovers);
        self.sample_rate = sample_rate;
        self.history = vec![T::zero(); 2 * len];
        self.write_pos = 0;
        Ok(())
    }

    /// Replaces the crossover frequencies and clears history.
    pub fn set_crossovers(&mut self, crossovers: &[f64]) -> Result<(), ConfigurationError> {
        self.configure(self.order, crossovers, self.sample_rate)
    }

    /// Changes the kernel order and clears history.
    pub fn set_order(&mut self, order: usize) -> Result<(), ConfigurationError> {
        let crossovers = core::mem::take(&mut self.crossovers);
        let result = self.configure(order, &crossovers, self.sample_rate);
        if result.is_err() {
            self.crossovers = crossovers;
        }
        result
    }

    /// Kernel order (taps per band minus one).
    pub fn order(&self) -> usize {
        self.order
    }

    /// Interior crossover frequencies in Hz.
    pub fn crossovers(&self) -> &[f64] {
        &self.crossovers
    }

    /// Number of output bands.
    pub fn bands(&self) -> usize {
        self.taps.len()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Kernel of `band`. Kernels are symmetric, so storage order is also
    /// impulse-response order.
    pub fn taps(&self, band: usize) -> &[T] {
        &self.taps[band]
    }

    #[inline]
    fn push(&mut self, input: T) {
        let len = self.order + 1;
        self.history[self.write_pos] = input;
        self.history[self.write_pos + len] = input;
    }

    /// Dot product of the newest `order + 1` inputs (oldest first) with the
    /// reversed kernel.
    #[inline]
    fn band_output(&self, band: usize) -> T {
        let len = self.order + 1;
        let window = &self.history[self.write_pos + 1..self.write_pos + 1 + len];
        window
            .iter()
            .zip(&self.taps[band])
            .fold(T::zero(), |acc, (&x, &h)| acc + x * h)
    }

    #[inline]
    fn advance(&mut self) {
        self.write_pos += 1;
        if self.write_pos == self.order + 1 {
            self.write_pos = 0;
        }
    }

    /// Processes one sample, writing one value per band into `bands_out`.
    pub fn process_sample(&mut self, input: T, bands_out: &mut [T]) {
        debug_assert_eq!(bands_out.len(), self.bands(), "band count mismatch");
        self.push(input);
        for (band, out) in bands_out.iter_mut().enumerate() {
            *out = self.band_output(band);
        }
        self.advance();
    }
}

impl<T: Sample> BlockProcessor<T> for FirCrossover<T> {
    fn input_ports(&self) -> usize {
        1
    }

    fn output_ports(&self) -> usize {
        self.taps.len()
    }

    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]) {
        debug_check_ports(inputs, outputs, 1, self.bands());
        for (i, &x) in inputs[0].iter().enumerate() {
            self.push(x);
            for (band, out) in outputs.iter_mut().enumerate() {
                out[i] = self.band_output(band);
            }
            self.advance();
        }
    }

    /// Crossovers stay fixed in Hz and are re-normalized to the new rate.
    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), ConfigurationError> {
        let crossovers = core::mem::take(&mut self.crossovers);
        let result = self.configure(self.order, &crossovers, sample_rate);
        if result.is_err() {
            self.crossovers = crossovers;
        }
        result
    }

    fn reset(&mut self) {
        self.history.fill(T::zero());
        self.write_pos = 0;
    }

    fn latency_samples(&self) -> usize {
        (self.order + 1) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48000.0;

    #[test]
    fn test_band_kernels_sum_to_delayed_impulse() {
        let bank = FirCrossover::<f64>::new(64, &[300.0, 3000.0, 9000.0], SR).unwrap();
        assert_eq!(bank.bands(), 4);
        for n in 0..=64 {
            let sum: f64 = (0..bank.bands()).map(|b| bank.taps(b)[n]).sum();
            let expected = if n == 32 { 1.0 } else { 0.0 };
            assert!((sum - expected).abs() < 1e-12, "tap {n}: {sum}");
        }
    }

    #[test]
    fn test_kernels_are_symmetric() {
        let bank = FirCrossover::<f64>::new(40, &[1000.0], SR).unwrap();
        for b in 0..bank.bands() {
            let taps = bank.taps(b);
            for n in 0..=40 {
                assert!((taps[n] - taps[40 - n]).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn test_impulse_response_matches_kernels() {
        let mut bank = FirCrossover::<f64>::new(16, &[4000.0], SR).unwrap();
        let mut bands = [0.0; 2];
        for n in 0..=16 {
            bank.process_sample(if n == 0 { 1.0 } else { 0.0 }, &mut bands);
            // h[n] equals the stored (reversed) tap at 16 - n by symmetry
            assert!((bands[0] - bank.taps(0)[16 - n]).abs() < 1e-15);
            assert!((bands[1] - bank.taps(1)[16 - n]).abs() < 1e-15);
        }
        bank.process_sample(0.0, &mut bands);
        assert_eq!(bands, [0.0, 0.0]);
    }

    #[test]
    fn test_latency_reporting() {
        let even = FirCrossover::<f32>::new(128, &[1000.0], SR).unwrap();
        assert_eq!(even.latency_samples(), 64);
        let odd = FirCrossover::<f32>::new(31, &[1000.0], SR).unwrap();
        assert_eq!(odd.latency_samples(), 16);
    }

    #[test]
    fn test_single_band_is_pure_delay() {
        let mut bank = FirCrossover::<f64>::new(8, &[], SR).unwrap();
        assert_eq!(bank.bands(), 1);
        let input: Vec<f64> = (1..=20).map(f64::from).collect();
        let mut out = vec![0.0; 20];
        bank.process(&[&input], &mut [&mut out]);
        for i in 0..20 {
            let expected = if i >= 4 { input[i - 4] } else { 0.0 };
            assert!((out[i] - expected).abs() < 1e-12, "sample {i}");
        }
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        assert_eq!(
            FirCrossover::<f32>::new(0, &[1000.0], SR).err(),
            Some(ConfigurationError::InvalidOrder(0))
        );
        assert!(FirCrossover::<f32>::new(32, &[2000.0, 1000.0], SR).is_err());
        assert!(FirCrossover::<f32>::new(32, &[30000.0], SR).is_err());

        let mut bank = FirCrossover::<f32>::new(32, &[1000.0], SR).unwrap();
        assert!(bank.set_order(0).is_err());
        assert_eq!(bank.order(), 32);
        assert_eq!(bank.crossovers(), &[1000.0]);
        assert!(bank.set_sample_rate(1500.0).is_err());
        assert_eq!(bank.crossovers(), &[1000.0]);
        assert_eq!(bank.sample_rate(), SR);
    }

    #[test]
    fn test_sample_rate_renormalizes() {
        let mut bank = FirCrossover::<f64>::new(32, &[6000.0], SR).unwrap();
        let at_48k = bank.taps(0).to_vec();
        bank.set_sample_rate(96000.0).unwrap();
        assert_eq!(bank.crossovers(), &[6000.0]);
        assert_ne!(bank.taps(0), at_48k.as_slice());
    }
}
