//! Core block-processing trait.
//!
//! The [`BlockProcessor`] trait is the single streaming interface shared by
//! every runtime component: IIR filters, the delay line, both crossover banks,
//! the level followers and the gain shaper.
//!
//! ## Design Decisions
//!
//! - **Port based**: a processor declares how many input and output arrays it
//!   reads and writes. Filters map N channels to N channels, a crossover maps
//!   one input to one output per band.
//!
//! - **Object-safe**: `dyn BlockProcessor<f32>` works for runtime chains, but
//!   generic/static dispatch is preferred on the render thread.
//!
//! - **No allocations**: `process` never touches the heap. Only setup-time
//!   operations (setters, `set_sample_rate`) may resize internal buffers.
//!
//! - **Caller-checked preconditions**: port counts and buffer lengths are
//!   asserted in debug builds only. A mismatch is a caller bug, not a
//!   recoverable error.

use crate::{ConfigurationError, Sample};

/// Streaming processor over per-port contiguous sample arrays.
///
/// # Example
///
/// ```rust
/// use banda_core::{BlockProcessor, ConfigurationError};
///
/// struct Gain {
///     gain: f32,
/// }
///
/// impl BlockProcessor<f32> for Gain {
///     fn input_ports(&self) -> usize {
///         1
///     }
///
///     fn output_ports(&self) -> usize {
///         1
///     }
///
///     fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
///         for (out, inp) in outputs[0].iter_mut().zip(inputs[0]) {
///             *out = inp * self.gain;
///         }
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f64) -> Result<(), ConfigurationError> {
///         Ok(())
///     }
///
///     fn reset(&mut self) {}
/// }
/// ```
pub trait BlockProcessor<T: Sample> {
    /// Number of input arrays `process` reads.
    fn input_ports(&self) -> usize;

    /// Number of output arrays `process` writes.
    fn output_ports(&self) -> usize;

    /// Process one block.
    ///
    /// `inputs` holds `input_ports()` arrays and `outputs` holds
    /// `output_ports()` arrays, all of the same length. Input arrays are left
    /// untouched; every output sample is written. Internal history carries
    /// over to the next call, so splitting a block into several calls gives
    /// the same result as one call.
    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]);

    /// Update the sample rate.
    ///
    /// Recomputes every sample-rate-dependent coefficient or table and clears
    /// history. On error the previous configuration is kept.
    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), ConfigurationError>;

    /// Clear internal history without changing parameters.
    fn reset(&mut self);

    /// Processing latency in samples.
    ///
    /// Zero for recursive filters; linear-phase FIR banks report their group
    /// delay.
    fn latency_samples(&self) -> usize {
        0
    }
}

/// Debug-build check that a `process` call matches the declared port layout.
#[inline]
pub(crate) fn debug_check_ports<T>(
    inputs: &[&[T]],
    outputs: &[&mut [T]],
    input_ports: usize,
    output_ports: usize,
) {
    debug_assert_eq!(inputs.len(), input_ports, "input port count mismatch");
    debug_assert_eq!(outputs.len(), output_ports, "output port count mismatch");
    if let Some(first) = inputs.first() {
        debug_assert!(
            inputs.iter().all(|i| i.len() == first.len())
                && outputs.iter().all(|o| o.len() == first.len()),
            "input and output buffers must have the same length"
        );
    }
}
