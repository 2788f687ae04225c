//! Engine configuration file format and operations.

use std::path::Path;

use banda_core::ConfigurationError;
use serde::{Deserialize, Serialize};

use crate::component::{
    CrossoverConfig, DelayConfig, FilterConfig, GainShaperConfig, MeterConfig, ShaperConfig,
};
use crate::error::ConfigError;

/// Engine configuration: which core components to build and how.
///
/// Configurations are stored as TOML files. Every section except `name` is
/// optional; a missing section means the component is not built.
///
/// # TOML Format
///
/// ```toml
/// name = "Three-way split"
/// description = "Rumble filter into a Linkwitz-Riley crossover"
/// sample_rate = 48000
/// channels = 2
///
/// [[filters]]
/// family = "butterworth"
/// response = "highpass"
/// order = 4
/// cutoff = 30.0
///
/// [crossover]
/// strategy = "linkwitz-riley"
/// frequencies = [250.0, 2500.0]
///
/// [shaper]
/// shape = "soft-clip"
/// input_gain_db = 6.0
///
/// [meter]
/// kind = "peak"
/// half_life = 0.3
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Name of the configuration.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Sample rate in Hz (defaults to 48000).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Channel count for the filter cascade (defaults to 1).
    #[serde(default = "default_channels")]
    pub channels: usize,

    /// Filter cascade, applied in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterConfig>,

    /// Optional band split.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crossover: Option<CrossoverConfig>,

    /// Optional per-band saturation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shaper: Option<ShaperConfig>,

    /// Optional comb/delay line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelayConfig>,

    /// Optional level follower.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter: Option<MeterConfig>,

    /// Optional gain computer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<GainShaperConfig>,
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_channels() -> usize {
    1
}

impl EngineConfig {
    /// Create an empty configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            filters: Vec::new(),
            crossover: None,
            shaper: None,
            delay: None,
            meter: None,
            gain: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the channel count.
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Append a filter to the cascade.
    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the crossover.
    pub fn with_crossover(mut self, crossover: CrossoverConfig) -> Self {
        self.crossover = Some(crossover);
        self
    }

    /// Set the per-band shaper.
    pub fn with_shaper(mut self, shaper: ShaperConfig) -> Self {
        self.shaper = Some(shaper);
        self
    }

    /// Set the delay line.
    pub fn with_delay(mut self, delay: DelayConfig) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the level meter.
    pub fn with_meter(mut self, meter: MeterConfig) -> Self {
        self.meter = Some(meter);
        self
    }

    /// Set the gain shaper.
    pub fn with_gain(mut self, gain: GainShaperConfig) -> Self {
        self.gain = Some(gain);
        self
    }

    /// Sample rate as used by the core components.
    pub fn sample_rate_hz(&self) -> f64 {
        f64::from(self.sample_rate)
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::info!(name = %config.name, path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Load a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::info!(name = %self.name, path = %path.display(), "saved engine config");
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every section against the sample rate without building tables.
    ///
    /// Filters, crossover, band shaper, delay and meter are checked by the
    /// same code that builds them; the gain shaper is checked field by field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sample_rate = self.sample_rate_hz();
        if self.sample_rate == 0 {
            return Err(ConfigurationError::InvalidSampleRate(sample_rate).into());
        }
        if self.channels == 0 {
            return Err(ConfigError::invalid_parameter(
                "engine",
                "channels",
                "at least one channel is required",
            ));
        }

        for (index, filter) in self.filters.iter().enumerate() {
            filter
                .validate(sample_rate)
                .inspect_err(|e| tracing::debug!("{} rejected: {e}", filter.label(index)))?;
        }
        if let Some(crossover) = &self.crossover {
            crossover.build::<f64>(sample_rate)?;
        }
        if let Some(shaper) = &self.shaper {
            shaper.build(sample_rate)?;
        }
        if let Some(delay) = &self.delay {
            delay.build::<f64>()?;
        }
        if let Some(meter) = &self.meter {
            meter.build::<f64>(sample_rate)?;
        }
        if let Some(gain) = &self.gain {
            gain.validate()?;
        }
        Ok(())
    }
}
