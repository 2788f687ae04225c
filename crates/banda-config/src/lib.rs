//! Engine configuration for banda filters.
//!
//! This crate describes a set of banda-core components in a TOML file and
//! builds them: a filter cascade, an optional crossover with per-band
//! shapers, delay line, level meter and gain shaper.
//!
//! # Features
//!
//! - **Config files**: Load, save and round-trip [`EngineConfig`] as TOML
//! - **Validation**: Every section is checked against the sample rate before
//!   anything is built
//! - **Builders**: Each section builds its core component for any sample type
//! - **Engine**: [`Engine`] owns the built components and changes their sample
//!   rate all-or-nothing
//!
//! # Example
//!
//! ```rust,no_run
//! use banda_config::{CutoffConfig, EngineConfig, FamilyKind, FilterConfig, MeterConfig, ResponseKind};
//!
//! // Load a configuration from file
//! let config = EngineConfig::load("split.toml").unwrap();
//!
//! // Create one programmatically
//! let config = EngineConfig::new("Vocal strip")
//!     .with_description("Rumble filter and presence peak")
//!     .with_filter(
//!         FilterConfig::new(FamilyKind::Butterworth, ResponseKind::HighPass, CutoffConfig::Single(80.0))
//!             .with_order(4),
//!     )
//!     .with_filter(
//!         FilterConfig::new(FamilyKind::SecondOrder, ResponseKind::Peak, CutoffConfig::Single(4000.0))
//!             .with_q(1.5)
//!             .with_gain(1.4),
//!     )
//!     .with_meter(MeterConfig::Rms { window_ms: 30.0 });
//!
//! config.save("vocal_strip.toml").unwrap();
//! ```

mod component;
mod config;
mod engine;
mod error;
mod meter;

pub use component::{
    CrossoverConfig, CurveKind, CutoffConfig, DelayConfig, FamilyKind, FilterConfig,
    GainShaperConfig, MeterConfig, ResponseKind, ShapeKind, ShaperConfig,
};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::ConfigError;
pub use meter::LevelMeter;
