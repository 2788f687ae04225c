//! Streaming evaluation of designed IIR filters.
//!
//! [`IirFilter`] owns one [`FilterDesign`], the [`Cascade`] of sections
//! synthesized from it and, per channel, one [`FilterState`] per section.
//! Every successful setter redesigns the sections and clears history; a
//! failed setter changes nothing.
//!
//! History survives block boundaries, so feeding a signal in arbitrary chunks
//! gives the same output as feeding it at once.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::design::{Cascade, Coefficients, Cutoff, FilterDesign, FilterFamily};
use crate::processor::debug_check_ports;
use crate::{BlockProcessor, ConfigurationError, Sample};

/// Per-channel input and output history.
///
/// Both histories are rings of `order` samples sharing one write position.
#[derive(Debug, Clone)]
pub struct FilterState<T> {
    inputs: Vec<T>,
    outputs: Vec<T>,
    /// Slot holding `x[n-1]` / `y[n-1]`.
    newest: usize,
}

impl<T: Sample> FilterState<T> {
    /// Zeroed history for a filter of `order`.
    pub fn new(order: usize) -> Self {
        Self {
            inputs: vec![T::zero(); order],
            outputs: vec![T::zero(); order],
            newest: 0,
        }
    }

    /// Filter order this state was sized for.
    pub fn order(&self) -> usize {
        self.inputs.len()
    }

    /// Zeroes both histories.
    pub fn clear(&mut self) {
        self.inputs.fill(T::zero());
        self.outputs.fill(T::zero());
        self.newest = 0;
    }

    /// Runs one sample through the difference equation.
    ///
    /// `coeffs` must have the order this state was sized for.
    #[inline]
    pub fn tick(&mut self, coeffs: &Coefficients<T>, input: T) -> T {
        let order = self.inputs.len();
        debug_assert_eq!(coeffs.order(), order, "state/coefficient order mismatch");
        let b = coeffs.b();
        let a = coeffs.a();

        let mut output = b[0] * input;
        let mut slot = self.newest;
        for j in 0..order {
            output = output + b[j + 1] * self.inputs[slot] + a[j] * self.outputs[slot];
            slot = if slot == 0 { order - 1 } else { slot - 1 };
        }

        if order > 0 {
            // The oldest slot sits right after the newest one.
            self.newest = if self.newest + 1 == order { 0 } else { self.newest + 1 };
            self.inputs[self.newest] = input;
            self.outputs[self.newest] = output;
        }
        output
    }
}

/// Fresh history for every section of `cascade`.
fn cascade_states<T: Sample>(cascade: &Cascade<T>) -> Vec<FilterState<T>> {
    cascade
        .sections()
        .iter()
        .map(|section| FilterState::new(section.order()))
        .collect()
}

/// Runs one sample through every section in turn.
#[inline]
fn tick_cascade<T: Sample>(cascade: &Cascade<T>, states: &mut [FilterState<T>], input: T) -> T {
    cascade
        .sections()
        .iter()
        .zip(states.iter_mut())
        .fold(input, |x, (section, state)| state.tick(section, x))
}

/// Multi-channel IIR filter built from a [`FilterDesign`].
///
/// The filter runs as a cascade of first- and second-order sections shared
/// across channels; each channel has its own history per section.
/// Construction designs the sections, so an `IirFilter` is always ready to
/// process.
///
/// # Example
///
/// ```rust
/// use banda_core::design::{Cutoff, FilterDesign, FilterFamily, Response};
/// use banda_core::IirFilter;
///
/// let design = FilterDesign::new(FilterFamily::Chebyshev2(Response::LowPass), Cutoff::Single(5000.0))
///     .with_order(6)
///     .with_ripple_db(60.0);
/// let mut filter = IirFilter::<f32>::new(design, 48000.0, 2).unwrap();
/// assert_eq!(filter.cascade().len(), 3);
///
/// let input = [1.0f32; 64];
/// let mut output = [0.0f32; 64];
/// filter.process_block(0, &input, &mut output);
///
/// filter.set_cut_frequency(2000.0).unwrap();
/// assert!(filter.set_cut_frequency(30000.0).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct IirFilter<T: Sample> {
    design: FilterDesign,
    sample_rate: f64,
    cascade: Cascade<T>,
    /// Expanded view of `cascade`, never run.
    coefficients: Coefficients<T>,
    states: Vec<Vec<FilterState<T>>>,
}

impl<T: Sample> IirFilter<T> {
    /// Designs the filter for `channels` independent channels.
    pub fn new(
        design: FilterDesign,
        sample_rate: f64,
        channels: usize,
    ) -> Result<Self, ConfigurationError> {
        let designed = design.design_cascade(sample_rate)?;
        let cascade: Cascade<T> = designed.cast();
        Ok(Self {
            design,
            sample_rate,
            coefficients: designed.expand().cast(),
            states: vec![cascade_states(&cascade); channels],
            cascade,
        })
    }

    /// Redesigns the sections from the stored parameters and clears history.
    pub fn setup(&mut self) -> Result<(), ConfigurationError> {
        self.configure(self.design, self.sample_rate)
    }

    fn configure(&mut self, design: FilterDesign, sample_rate: f64) -> Result<(), ConfigurationError> {
        let designed = design.design_cascade(sample_rate)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "iir_setup: {} order {} in {} sections at {sample_rate} Hz",
            design.family.name(),
            designed.order(),
            designed.len()
        );

        let cascade: Cascade<T> = designed.cast();
        for states in &mut self.states {
            let same_shape = states.len() == cascade.len()
                && states
                    .iter()
                    .zip(cascade.sections())
                    .all(|(state, section)| state.order() == section.order());
            if same_shape {
                states.iter_mut().for_each(FilterState::clear);
            } else {
                *states = cascade_states(&cascade);
            }
        }
        self.design = design;
        self.sample_rate = sample_rate;
        self.coefficients = designed.expand().cast();
        self.cascade = cascade;
        Ok(())
    }

    fn update(&mut self, edit: impl FnOnce(&mut FilterDesign)) -> Result<(), ConfigurationError> {
        let mut design = self.design;
        edit(&mut design);
        self.configure(design, self.sample_rate)
    }

    /// Sets the cutoff of a single-cutoff design.
    pub fn set_cut_frequency(&mut self, freq_hz: f64) -> Result<(), ConfigurationError> {
        self.update(|d| d.cutoff = Cutoff::Single(freq_hz))
    }

    /// Sets both band edges of a band-pass or band-stop design.
    pub fn set_cut_frequencies(&mut self, low_hz: f64, high_hz: f64) -> Result<(), ConfigurationError> {
        self.update(|d| d.cutoff = Cutoff::Band(low_hz, high_hz))
    }

    /// Sets the quality factor.
    pub fn set_q(&mut self, q: f64) -> Result<(), ConfigurationError> {
        self.update(|d| d.q = q)
    }

    /// Sets the linear gain.
    pub fn set_gain(&mut self, gain: f64) -> Result<(), ConfigurationError> {
        self.update(|d| d.gain = gain)
    }

    /// Sets the stopband attenuation in dB.
    pub fn set_ripple(&mut self, ripple_db: f64) -> Result<(), ConfigurationError> {
        self.update(|d| d.ripple_db = ripple_db)
    }

    /// Sets the prototype order.
    pub fn set_order(&mut self, order: usize) -> Result<(), ConfigurationError> {
        self.update(|d| d.order = order)
    }

    /// Resizes the per-channel history. Clears every channel.
    pub fn set_channels(&mut self, channels: usize) {
        self.states = vec![cascade_states(&self.cascade); channels];
    }

    /// Current design parameters.
    pub fn filter_design(&self) -> &FilterDesign {
        &self.design
    }

    /// Filter family.
    pub fn family(&self) -> FilterFamily {
        self.design.family
    }

    /// Prototype order.
    pub fn order(&self) -> usize {
        self.design.order
    }

    /// Cutoff frequency or band edges in Hz.
    pub fn cut_frequency(&self) -> Cutoff {
        self.design.cutoff
    }

    /// Quality factor.
    pub fn q(&self) -> f64 {
        self.design.q
    }

    /// Linear gain.
    pub fn gain(&self) -> f64 {
        self.design.gain
    }

    /// Stopband attenuation in dB.
    pub fn ripple(&self) -> f64 {
        self.design.ripple_db
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.states.len()
    }

    /// Active sections, in processing order.
    pub fn cascade(&self) -> &Cascade<T> {
        &self.cascade
    }

    /// Active sections multiplied out into one set of taps.
    ///
    /// For inspection only; at high orders and low cutoffs the expanded taps
    /// lose precision that the running cascade keeps.
    pub fn coefficients(&self) -> &Coefficients<T> {
        &self.coefficients
    }

    /// Filters one sample of `channel`.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: T) -> T {
        tick_cascade(&self.cascade, &mut self.states[channel], input)
    }

    /// Filters a block of `channel`. `input` and `output` must have equal length.
    pub fn process_block(&mut self, channel: usize, input: &[T], output: &mut [T]) {
        debug_assert_eq!(input.len(), output.len(), "block length mismatch");
        let states = &mut self.states[channel];
        for (out, &x) in output.iter_mut().zip(input) {
            *out = tick_cascade(&self.cascade, states, x);
        }
    }

    /// Filters a block of `channel` in place.
    pub fn process_block_inplace(&mut self, channel: usize, buffer: &mut [T]) {
        let states = &mut self.states[channel];
        for sample in buffer.iter_mut() {
            *sample = tick_cascade(&self.cascade, states, *sample);
        }
    }
}

impl<T: Sample> BlockProcessor<T> for IirFilter<T> {
    fn input_ports(&self) -> usize {
        self.states.len()
    }

    fn output_ports(&self) -> usize {
        self.states.len()
    }

    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]) {
        debug_check_ports(inputs, outputs, self.input_ports(), self.output_ports());
        for (channel, (input, output)) in inputs.iter().zip(outputs.iter_mut()).enumerate() {
            self.process_block(channel, input, output);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), ConfigurationError> {
        self.configure(self.design, sample_rate)
    }

    fn reset(&mut self) {
        for states in &mut self.states {
            states.iter_mut().for_each(FilterState::clear);
        }
    }
}
