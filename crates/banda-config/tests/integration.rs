//! Integration tests for banda-config.
//!
//! These tests verify file round-trips and that configured engines process
//! audio the same way hand-built core components do.

use banda_config::{
    ConfigError, CrossoverConfig, CurveKind, CutoffConfig, DelayConfig, Engine, EngineConfig,
    FamilyKind, FilterConfig, GainShaperConfig, MeterConfig, ResponseKind,
};
use banda_core::design::{Cutoff, FilterDesign, FilterFamily, Response};
use banda_core::{BlockProcessor, IirFilter};
use tempfile::TempDir;

fn strip_config() -> EngineConfig {
    EngineConfig::new("Integration Test")
        .with_description("Every section populated")
        .with_channels(2)
        .with_filter(
            FilterConfig::new(FamilyKind::Butterworth, ResponseKind::HighPass, CutoffConfig::Single(40.0))
                .with_name("rumble")
                .with_order(4),
        )
        .with_filter(
            FilterConfig::new(FamilyKind::Bessel, ResponseKind::BandPass, CutoffConfig::Band(300.0, 3000.0))
                .with_order(3),
        )
        .with_crossover(CrossoverConfig::LinkwitzRiley {
            frequencies: vec![200.0, 2000.0],
        })
        .with_delay(DelayConfig {
            blend: 1.0,
            feedback: 0.3,
            feedforward: 0.0,
            ..DelayConfig::new(480, 48)
        })
        .with_meter(MeterConfig::Rms { window_ms: 10.0 })
        .with_gain(GainShaperConfig {
            threshold: 0.5,
            lut_size: 2048,
            ..GainShaperConfig::new(CurveKind::Limiter)
        })
}

/// Test saving to a nested path and loading back.
#[test]
fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("configs").join("strip.toml");

    let config = strip_config();
    config.save(&path).unwrap();
    assert!(path.exists());

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

/// Test that a missing file reports the path it tried.
#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.toml");
    match EngineConfig::load(&path) {
        Err(ConfigError::ReadFile { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected ReadFile error, got {other:?}"),
    }
}

/// Test that malformed TOML on disk is a parse error.
#[test]
fn test_load_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "name = \"broken\"\n[[filters]]\nfamily = 3\n").unwrap();
    assert!(matches!(
        EngineConfig::load(&path),
        Err(ConfigError::TomlParse(_))
    ));
}

/// Test that a configured filter cascade matches hand-built filters.
#[test]
fn test_engine_filters_match_core() {
    let config = strip_config();
    let mut engine = Engine::<f64>::from_config(&config).unwrap();

    let mut rumble = IirFilter::<f64>::new(
        FilterDesign::new(FilterFamily::Butterworth(Response::HighPass), Cutoff::Single(40.0))
            .with_order(4),
        48000.0,
        1,
    )
    .unwrap();
    let mut band = IirFilter::<f64>::new(
        FilterDesign::new(FilterFamily::Bessel(Response::BandPass), Cutoff::Band(300.0, 3000.0))
            .with_order(3),
        48000.0,
        1,
    )
    .unwrap();

    let input: Vec<f64> = (0..512).map(|i| ((i * 37) % 101) as f64 / 50.0 - 1.0).collect();
    let mut expected = input.clone();
    rumble.process_block_inplace(0, &mut expected);
    band.process_block_inplace(0, &mut expected);

    for channel in 0..2 {
        let mut actual = input.clone();
        engine.process_filters(channel, &mut actual);
        assert_eq!(actual, expected, "channel {channel}");
    }
}

/// Test every built component processes a block.
#[test]
fn test_engine_components_process() {
    let mut engine = Engine::<f32>::from_config(&strip_config()).unwrap();
    let input: Vec<f32> = (0..256).map(|i| (i as f32 * 0.05).sin() * 0.8).collect();

    let bank = engine.crossover_mut().unwrap();
    assert_eq!(bank.bands(), 3);
    let mut low = vec![0.0f32; 256];
    let mut mid = vec![0.0f32; 256];
    let mut high = vec![0.0f32; 256];
    bank.process(&[&input], &mut [&mut low, &mut mid, &mut high]);
    assert!(low.iter().chain(&mid).chain(&high).all(|s| s.is_finite()));

    // blend = 1, feedforward = 0: the recirculating signal itself
    let delay = engine.delay_mut().unwrap();
    let mut echoed = vec![0.0f32; 256];
    delay.process_block(&input, &mut echoed);
    assert_eq!(&echoed[..48], &input[..48]);
    assert!((echoed[48] - (input[48] + 0.3 * input[0])).abs() < 1e-6);

    let meter = engine.meter_mut().unwrap();
    let mut levels = vec![0.0f32; 256];
    meter.process(&[&input], &mut [&mut levels]);
    assert!(levels.iter().all(|&l| (0.0..=0.8).contains(&l)));

    let shaper = engine.gain_shaper_mut().unwrap();
    let mut gains = vec![0.0f32; 256];
    shaper.process(&[&levels], &mut [&mut gains]);
    assert!(gains.iter().all(|&g| g > 0.0 && g <= 1.0));
}

/// Test that parameters out of range are caught before anything is built.
#[test]
fn test_invalid_configs_are_rejected() {
    let bad_toml = r#"
name = "bad"
sample_rate = 8000

[[filters]]
family = "chebyshev2"
response = "lowpass"
cutoff = 5000.0
"#;
    let config = EngineConfig::from_toml(bad_toml).unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Component(_))));
    assert!(Engine::<f32>::from_config(&config).is_err());

    let wrong_shape = EngineConfig::new("shape").with_filter(FilterConfig::new(
        FamilyKind::Butterworth,
        ResponseKind::BandPass,
        CutoffConfig::Single(1000.0),
    ));
    assert!(wrong_shape.validate().is_err());
}

/// Test that a configured engine follows a sample-rate change.
#[test]
fn test_engine_sample_rate_change() {
    let mut engine = Engine::<f32>::from_config(&strip_config()).unwrap();
    engine.set_sample_rate(96000.0).unwrap();
    assert_eq!(engine.sample_rate(), 96000.0);
    assert!(engine.filters().iter().all(|f| f.sample_rate() == 96000.0));
    assert_eq!(engine.latency_samples(), 0);
}
