//! Banda Core - filter synthesis and streaming evaluation
//!
//! This crate turns a small parameter set (family, response, order, cutoff,
//! ripple, Q, gain) into digital filter coefficients and runs them over
//! multi-channel sample streams, with zero allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Streaming
//!
//! - [`BlockProcessor`] - Object-safe trait shared by every runtime component
//! - [`Sample`] - Sample type abstraction (`f32`, `f64`)
//!
//! ## Filter Design
//!
//! - [`design::FilterDesign`] - Validated parameter set, designs coefficients
//! - [`design::Cascade`] - First- and second-order sections, run in series
//! - [`design::Coefficients`] - Normalized difference-equation coefficients
//! - [`design::Zpk`] - Analog/digital pole-zero-gain representation
//!
//! Families: Butterworth and Chebyshev type II (any order), Bessel (up to
//! [`design::MAX_BESSEL_ORDER`]), each as lowpass, highpass, bandpass or
//! bandstop, plus the second-order family (lowpass, highpass, bandpass,
//! peak, allpass, low shelf, high shelf).
//!
//! ## Filters
//!
//! - [`IirFilter`] - Designed IIR filter, a section cascade per channel
//! - [`FilterState`] - Direct-form I history for one section of one channel
//! - [`DelayLineFilter`] - Universal comb: feedback, feedforward and blend taps
//!
//! ## Crossovers
//!
//! - [`FirCrossover`] - Linear-phase windowed-sinc band split
//! - [`LinkwitzRileyCrossover`] - Cascaded-biquad band split, zero latency
//! - [`MultibandCrossover`] - Either strategy behind one interface
//!
//! ## Dynamics
//!
//! - [`RmsFollower`] - Sliding-window RMS level
//! - [`PeakFollower`] - Peak hold with half-life release
//! - [`GainShaper`] - Table-driven limiter/swell gain curve (requires `std`)
//!
//! ## Band Shaping
//!
//! - [`BandShaper`] - Per-band drive, [`Waveshaper`] curve, make-up gain and clip
//! - [`SmoothedParam`] - One-pole parameter smoothing
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`prewarp`], [`sinc`], etc.
//!
//! # no_std Support
//!
//! Everything except [`GainShaper`] works without `std`. Disable the default
//! `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! banda-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use banda_core::IirFilter;
//! use banda_core::design::{Cutoff, FilterDesign, FilterFamily, Response};
//!
//! let design = FilterDesign::new(
//!     FilterFamily::Butterworth(Response::LowPass),
//!     Cutoff::Single(1000.0),
//! )
//! .with_order(4);
//!
//! let mut filter = IirFilter::<f32>::new(design, 48000.0, 2).unwrap();
//!
//! let input = [1.0f32, 0.0, 0.0, 0.0];
//! let mut output = [0.0f32; 4];
//! filter.process_block(0, &input, &mut output);
//! filter.process_block(1, &input, &mut output);
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in processing paths
//! - **Design in f64**: Coefficients are computed in double precision and cast once
//! - **Validated setters**: A rejected parameter leaves the component unchanged

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod crossover;
pub mod delay;
pub mod design;
pub mod error;
#[cfg(feature = "std")]
pub mod gain;
pub mod iir;
pub mod level;
pub mod math;
pub mod param;
pub mod processor;
pub mod sample;
pub mod shaper;

// Re-export main types at crate root
pub use crossover::{FirCrossover, LinkwitzRileyCrossover, MultibandCrossover};
pub use delay::DelayLineFilter;
pub use design::{Cascade, Coefficients, Cutoff, FilterDesign, FilterFamily, Response, SecondOrderKind};
pub use error::ConfigurationError;
#[cfg(feature = "std")]
pub use gain::{GainCurve, GainShaper};
pub use iir::{FilterState, IirFilter};
pub use level::{PeakFollower, RmsFollower};
pub use math::{db_to_linear, flush_denormal, hamming, linear_to_db, prewarp, sinc};
pub use param::SmoothedParam;
pub use processor::BlockProcessor;
pub use sample::Sample;
pub use shaper::{BandShaper, Waveshaper, fast_atan};
