//! Core components built from an [`EngineConfig`].
//!
//! # Example
//!
//! ```rust
//! use banda_config::{CrossoverConfig, CutoffConfig, Engine, EngineConfig, FamilyKind, FilterConfig, ResponseKind};
//!
//! let config = EngineConfig::new("split")
//!     .with_filter(FilterConfig::new(
//!         FamilyKind::Butterworth,
//!         ResponseKind::HighPass,
//!         CutoffConfig::Single(30.0),
//!     ))
//!     .with_crossover(CrossoverConfig::LinkwitzRiley {
//!         frequencies: vec![500.0],
//!     });
//!
//! let mut engine = Engine::<f32>::from_config(&config).unwrap();
//!
//! let mut block = [0.5f32; 64];
//! engine.process_filters(0, &mut block);
//! ```

use banda_core::error::ensure_sample_rate;
use banda_core::{
    BandShaper, BlockProcessor, DelayLineFilter, GainShaper, IirFilter, MultibandCrossover,
    Sample,
};

use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::meter::LevelMeter;

/// Every component an [`EngineConfig`] describes, built for sample type `T`.
///
/// The filters form a cascade shared by all channels. The crossover and its
/// band shapers run together in [`Engine::process_bands`]; the delay line,
/// meter and gain shaper are independent single-input components the caller
/// wires up.
#[derive(Debug)]
pub struct Engine<T: Sample> {
    name: String,
    sample_rate: f64,
    filters: Vec<IirFilter<T>>,
    crossover: Option<MultibandCrossover<T>>,
    shapers: Vec<BandShaper>,
    band_buffer: Vec<T>,
    delay: Option<DelayLineFilter<T>>,
    meter: Option<LevelMeter<T>>,
    gain: Option<GainShaper<T>>,
}

impl<T: Sample> Engine<T> {
    /// Validate `config` and build every section it contains.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sample_rate = config.sample_rate_hz();

        let filters = config
            .filters
            .iter()
            .map(|filter| filter.build(sample_rate, config.channels))
            .collect::<Result<Vec<_>, _>>()?;
        let crossover = config
            .crossover
            .as_ref()
            .map(|c| c.build(sample_rate))
            .transpose()?;
        let bands = crossover.as_ref().map_or(1, |bank| bank.bands());
        let shapers = match &config.shaper {
            Some(shaper) => (0..bands)
                .map(|_| shaper.build(sample_rate))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        let delay = config.delay.as_ref().map(|d| d.build()).transpose()?;
        let meter = config
            .meter
            .as_ref()
            .map(|m| m.build(sample_rate))
            .transpose()?;
        let gain = config.gain.as_ref().map(|g| g.build()).transpose()?;

        tracing::info!(
            name = %config.name,
            filters = filters.len(),
            shapers = shapers.len(),
            channels = config.channels,
            sample_rate,
            "built engine"
        );

        Ok(Self {
            name: config.name.clone(),
            sample_rate,
            filters,
            crossover,
            shapers,
            band_buffer: vec![T::zero(); bands],
            delay,
            meter,
            gain,
        })
    }

    /// Configuration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Filter cascade.
    pub fn filters(&self) -> &[IirFilter<T>] {
        &self.filters
    }

    /// Filter cascade, for live parameter changes.
    pub fn filters_mut(&mut self) -> &mut [IirFilter<T>] {
        &mut self.filters
    }

    /// Crossover, if configured.
    pub fn crossover_mut(&mut self) -> Option<&mut MultibandCrossover<T>> {
        self.crossover.as_mut()
    }

    /// Band shapers, one per crossover band (one in total without a
    /// crossover); empty when no shaper is configured.
    pub fn shapers_mut(&mut self) -> &mut [BandShaper] {
        &mut self.shapers
    }

    /// Delay line, if configured.
    pub fn delay_mut(&mut self) -> Option<&mut DelayLineFilter<T>> {
        self.delay.as_mut()
    }

    /// Level meter, if configured.
    pub fn meter_mut(&mut self) -> Option<&mut LevelMeter<T>> {
        self.meter.as_mut()
    }

    /// Gain shaper, if configured.
    pub fn gain_shaper_mut(&mut self) -> Option<&mut GainShaper<T>> {
        self.gain.as_mut()
    }

    /// Runs `buffer` of `channel` through every filter in order, in place.
    pub fn process_filters(&mut self, channel: usize, buffer: &mut [T]) {
        for filter in &mut self.filters {
            filter.process_block_inplace(channel, buffer);
        }
    }

    /// Splits `buffer` into bands, shapes each band and sums them back, in
    /// place.
    ///
    /// Without a crossover the whole signal goes through the single shaper;
    /// without shapers the bands are summed unchanged.
    pub fn process_bands(&mut self, buffer: &mut [T]) {
        for sample in buffer.iter_mut() {
            let bands = &mut self.band_buffer;
            match &mut self.crossover {
                Some(bank) => bank.process_sample(*sample, bands),
                None => bands[0] = *sample,
            }
            let mut sum = T::zero();
            for (band, value) in bands.iter().enumerate() {
                sum = sum
                    + match self.shapers.get_mut(band) {
                        Some(shaper) => shaper.process_sample(*value),
                        None => *value,
                    };
            }
            *sample = sum;
        }
    }

    /// Latency of the crossover, the only component that delays its output.
    pub fn latency_samples(&self) -> usize {
        self.crossover
            .as_ref()
            .map_or(0, |bank| bank.latency_samples())
    }

    /// Moves every component to `sample_rate` and clears history.
    ///
    /// All-or-nothing: if any component rejects the rate (for example a
    /// cutoff above the new Nyquist), nothing changes.
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), ConfigError> {
        ensure_sample_rate(sample_rate)?;
        let mut filters = self.filters.clone();
        for filter in &mut filters {
            filter.set_sample_rate(sample_rate)?;
        }
        let mut crossover = self.crossover.clone();
        if let Some(bank) = &mut crossover {
            bank.set_sample_rate(sample_rate)?;
        }
        let mut meter = self.meter.clone();
        if let Some(meter) = &mut meter {
            meter.set_sample_rate(sample_rate)?;
        }
        // These cannot fail once the rate itself has been checked
        for shaper in &mut self.shapers {
            BlockProcessor::<T>::set_sample_rate(shaper, sample_rate)?;
        }
        if let Some(delay) = &mut self.delay {
            delay.set_sample_rate(sample_rate)?;
        }
        if let Some(gain) = &mut self.gain {
            gain.set_sample_rate(sample_rate)?;
        }

        self.filters = filters;
        self.crossover = crossover;
        self.meter = meter;
        self.sample_rate = sample_rate;
        tracing::debug!(name = %self.name, sample_rate, "engine sample rate changed");
        Ok(())
    }

    /// Clears the history of every component.
    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
        if let Some(bank) = &mut self.crossover {
            bank.reset();
        }
        for shaper in &mut self.shapers {
            BlockProcessor::<T>::reset(shaper);
        }
        if let Some(delay) = &mut self.delay {
            delay.reset();
        }
        if let Some(meter) = &mut self.meter {
            meter.reset();
        }
    }
}
