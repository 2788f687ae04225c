//! Fixed-capacity delay line with blend, feedback and feedforward taps.
//!
//! A universal comb structure: with the right gains it covers a plain delay,
//! a feedforward comb, a feedback comb and a Schroeder allpass.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::error::ensure_finite;
use crate::processor::debug_check_ports;
use crate::{BlockProcessor, ConfigurationError, Sample};

/// Delay line filter.
///
/// For each input sample `x[i]`:
///
/// ```text
/// p[i] = x[i] + feedback * p[i - delay]
/// y[i] = blend * p[i] + feedforward * p[i - delay]
/// ```
///
/// where `p` before the current block comes from the line. The line keeps the
/// last `capacity` values of `p`. With `delay = 0` the feedback term is
/// dropped and the feedforward tap reads the current `p[i]`.
///
/// # Example
///
/// ```rust
/// use banda_core::DelayLineFilter;
///
/// let mut comb = DelayLineFilter::<f32>::new(1024).unwrap();
/// comb.set_delay(441).unwrap();
/// comb.set_blend(1.0).unwrap();
/// comb.set_feedback(0.5).unwrap();
/// comb.set_feedforward(0.0).unwrap();
///
/// assert!(comb.set_feedback(1.5).is_err());
/// assert_eq!(comb.feedback(), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct DelayLineFilter<T: Sample> {
    line: Vec<T>,
    /// Slot the next `p` is written to.
    write_pos: usize,
    delay: usize,
    blend: T,
    feedback: T,
    feedforward: T,
}

impl<T: Sample> DelayLineFilter<T> {
    /// Creates a zeroed line holding `max_delay` samples.
    ///
    /// Defaults: delay 0, blend 0, feedback 0, feedforward 1 (identity).
    pub fn new(max_delay: usize) -> Result<Self, ConfigurationError> {
        if max_delay == 0 {
            return Err(ConfigurationError::DelayOutOfRange {
                delay: 0,
                capacity: max_delay,
            });
        }
        Ok(Self {
            line: vec![T::zero(); max_delay],
            write_pos: 0,
            delay: 0,
            blend: T::zero(),
            feedback: T::zero(),
            feedforward: T::one(),
        })
    }

    /// Zeroes the line.
    pub fn setup(&mut self) {
        self.line.fill(T::zero());
        self.write_pos = 0;
    }

    /// Sets the delay in samples. Must be below the capacity.
    ///
    /// The line contents are kept.
    pub fn set_delay(&mut self, delay: usize) -> Result<(), ConfigurationError> {
        if delay >= self.line.len() {
            return Err(ConfigurationError::DelayOutOfRange {
                delay,
                capacity: self.line.len(),
            });
        }
        self.delay = delay;
        Ok(())
    }

    /// Sets the gain applied to the undelayed `p[i]`.
    pub fn set_blend(&mut self, blend: T) -> Result<(), ConfigurationError> {
        ensure_finite("blend", blend.into_f64())?;
        self.blend = blend;
        Ok(())
    }

    /// Sets the recirculation gain. `|feedback|` must not exceed 1.
    pub fn set_feedback(&mut self, feedback: T) -> Result<(), ConfigurationError> {
        ensure_finite("feedback", feedback.into_f64())?;
        if feedback.abs() > T::one() {
            return Err(ConfigurationError::FeedbackOutOfRange(feedback.into_f64()));
        }
        self.feedback = feedback;
        Ok(())
    }

    /// Sets the gain applied to the delayed tap.
    pub fn set_feedforward(&mut self, feedforward: T) -> Result<(), ConfigurationError> {
        ensure_finite("feedforward", feedforward.into_f64())?;
        self.feedforward = feedforward;
        Ok(())
    }

    /// Delay in samples.
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Undelayed gain.
    pub fn blend(&self) -> T {
        self.blend
    }

    /// Recirculation gain.
    pub fn feedback(&self) -> T {
        self.feedback
    }

    /// Delayed-tap gain.
    pub fn feedforward(&self) -> T {
        self.feedforward
    }

    /// Maximum number of stored samples.
    pub fn capacity(&self) -> usize {
        self.line.len()
    }

    /// Processes one sample.
    #[inline]
    pub fn process_sample(&mut self, input: T) -> T {
        let capacity = self.line.len();
        let (p, tap) = if self.delay == 0 {
            (input, input)
        } else {
            let read_pos = (self.write_pos + capacity - self.delay) % capacity;
            let delayed = self.line[read_pos];
            (input + self.feedback * delayed, delayed)
        };

        self.line[self.write_pos] = p;
        self.write_pos += 1;
        if self.write_pos == capacity {
            self.write_pos = 0;
        }

        self.blend * p + self.feedforward * tap
    }

    /// Processes a block. `input` and `output` must have equal length.
    pub fn process_block(&mut self, input: &[T], output: &mut [T]) {
        debug_assert_eq!(input.len(), output.len(), "block length mismatch");
        for (out, &x) in output.iter_mut().zip(input) {
            *out = self.process_sample(x);
        }
    }
}

impl<T: Sample> BlockProcessor<T> for DelayLineFilter<T> {
    fn input_ports(&self) -> usize {
        1
    }

    fn output_ports(&self) -> usize {
        1
    }

    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]) {
        debug_check_ports(inputs, outputs, 1, 1);
        self.process_block(inputs[0], outputs[0]);
    }

    /// The line is sample based; a new rate only clears it.
    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), ConfigurationError> {
        crate::error::ensure_sample_rate(sample_rate)?;
        self.setup();
        Ok(())
    }

    fn reset(&mut self) {
        self.setup();
    }
}
