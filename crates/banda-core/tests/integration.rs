//! Integration tests for banda-core.
//!
//! Exercises whole components through their public streaming interfaces:
//! chunked IIR evaluation against a direct difference equation, delay-line
//! behaviour against a naive reference, crossover reconstruction on white
//! noise, follower envelopes and gain-curve shaping.

use banda_core::design::{Cutoff, FilterDesign, FilterFamily, Response, SecondOrderKind};
use banda_core::{
    BlockProcessor, ConfigurationError, DelayLineFilter, FirCrossover, GainCurve, GainShaper,
    IirFilter, LinkwitzRileyCrossover, MultibandCrossover, PeakFollower, RmsFollower, linear_to_db,
};

const SAMPLE_RATE: f64 = 48000.0;

/// Deterministic white noise in [-1, 1).
fn white_noise(len: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        })
        .collect()
}

fn generate_sine(freq_hz: f64, num_samples: usize) -> Vec<f64> {
    (0..num_samples)
        .map(|n| libm::sin(core::f64::consts::TAU * freq_hz * n as f64 / SAMPLE_RATE))
        .collect()
}

fn rms(signal: &[f64]) -> f64 {
    libm::sqrt(signal.iter().map(|s| s * s).sum::<f64>() / signal.len() as f64)
}

// ============================================================================
// 1. IIR streaming
// ============================================================================

/// `y[n] = Σ b[j]·x[n−j] + Σ a[j]·y[n−1−j]` evaluated over the whole signal.
fn reference_difference_equation(b: &[f64], a: &[f64], input: &[f64]) -> Vec<f64> {
    let mut output = vec![0.0; input.len()];
    for n in 0..input.len() {
        let mut acc = 0.0;
        for (j, &bj) in b.iter().enumerate() {
            if n >= j {
                acc += bj * input[n - j];
            }
        }
        for (j, &aj) in a.iter().enumerate() {
            if n > j {
                acc += aj * output[n - 1 - j];
            }
        }
        output[n] = acc;
    }
    output
}

#[test]
fn iir_chunked_processing_matches_single_pass() {
    let design = FilterDesign::new(
        FilterFamily::Bessel(Response::BandPass),
        Cutoff::Band(400.0, 3000.0),
    )
    .with_order(3);
    let mut whole = IirFilter::<f64>::new(design, SAMPLE_RATE, 1).unwrap();
    let mut chunked = whole.clone();

    let input = white_noise(1000, 7);
    let mut expected = vec![0.0; input.len()];
    whole.process_block(0, &input, &mut expected);

    let mut actual = vec![0.0; input.len()];
    let mut start = 0;
    for size in [1usize, 17, 64, 3, 255, 400].iter().cycle() {
        if start >= input.len() {
            break;
        }
        let end = (start + size).min(input.len());
        chunked.process_block(0, &input[start..end], &mut actual[start..end]);
        start = end;
    }
    assert_eq!(actual, expected);
}

#[test]
fn iir_matches_direct_difference_equation() {
    for family in [
        FilterFamily::Butterworth(Response::HighPass),
        FilterFamily::Chebyshev2(Response::LowPass),
        FilterFamily::SecondOrder(SecondOrderKind::Peak),
    ] {
        let design = FilterDesign::new(family, Cutoff::Single(2500.0))
            .with_order(5)
            .with_gain(2.0);
        let mut filter = IirFilter::<f64>::new(design, SAMPLE_RATE, 1).unwrap();
        let input = white_noise(512, 11);
        let sectioned = filter
            .cascade()
            .sections()
            .iter()
            .fold(input.clone(), |signal, section| {
                reference_difference_equation(section.b(), section.a(), &signal)
            });
        let expanded = reference_difference_equation(
            filter.coefficients().b(),
            filter.coefficients().a(),
            &input,
        );
        let mut output = vec![0.0; input.len()];
        filter.process_block(0, &input, &mut output);
        for (n, (y, e)) in output.iter().zip(&sectioned).enumerate() {
            assert!((y - e).abs() < 1e-12, "{} sample {n}: {y} vs {e}", family.name());
        }
        for (n, (y, e)) in output.iter().zip(&expanded).enumerate() {
            assert!((y - e).abs() < 1e-9, "{} sample {n}: {y} vs {e}", family.name());
        }
    }
}

#[test]
fn iir_high_order_low_cutoff_passes_band_and_stays_finite() {
    for family in [
        FilterFamily::Butterworth(Response::LowPass),
        FilterFamily::Bessel(Response::LowPass),
        FilterFamily::Chebyshev2(Response::LowPass),
    ] {
        let design = FilterDesign::new(family, Cutoff::Single(100.0)).with_order(8);
        let mut filter = IirFilter::<f64>::new(design, SAMPLE_RATE, 1).unwrap();

        let noise = white_noise(48000, 5);
        let mut out = vec![0.0; noise.len()];
        filter.process_block(0, &noise, &mut out);
        assert!(out.iter().all(|y| y.is_finite()), "{}", family.name());
        assert!(rms(&out) < rms(&noise), "{}", family.name());

        // 5 Hz sits deep in every passband
        filter.reset();
        let input = generate_sine(5.0, 96000);
        let mut output = vec![0.0; input.len()];
        filter.process_block(0, &input, &mut output);
        let gain_db = linear_to_db(rms(&output[48000..]) / rms(&input[48000..]));
        assert!(gain_db.abs() < 0.1, "{}: {gain_db} dB", family.name());
    }
}

#[test]
fn iir_channels_are_independent() {
    let design = FilterDesign::new(
        FilterFamily::Butterworth(Response::LowPass),
        Cutoff::Single(1000.0),
    )
    .with_order(4);
    let mut stereo = IirFilter::<f32>::new(design, SAMPLE_RATE, 2).unwrap();
    let mut mono = IirFilter::<f32>::new(design, SAMPLE_RATE, 1).unwrap();

    let left: Vec<f32> = white_noise(256, 1).iter().map(|&x| x as f32).collect();
    let right: Vec<f32> = white_noise(256, 2).iter().map(|&x| x as f32).collect();
    let mut out_left = vec![0.0f32; 256];
    let mut out_right = vec![0.0f32; 256];
    stereo.process(&[&left, &right], &mut [&mut out_left, &mut out_right]);

    let mut reference = vec![0.0f32; 256];
    mono.process_block(0, &left, &mut reference);
    assert_eq!(out_left, reference);
}

#[test]
fn iir_lowpass_attenuates_above_cutoff() {
    let design = FilterDesign::new(
        FilterFamily::Butterworth(Response::LowPass),
        Cutoff::Single(1000.0),
    )
    .with_order(4);
    let mut filter = IirFilter::<f64>::new(design, SAMPLE_RATE, 1).unwrap();

    let measure = |filter: &mut IirFilter<f64>, freq: f64| {
        filter.reset();
        let input = generate_sine(freq, 9600);
        let mut output = vec![0.0; input.len()];
        filter.process_block(0, &input, &mut output);
        linear_to_db(rms(&output[4800..]) / rms(&input[4800..]))
    };

    assert!(measure(&mut filter, 100.0).abs() < 0.1);
    // 4th order: -80 dB/decade
    assert!(measure(&mut filter, 10000.0) < -75.0);
}

#[test]
fn iir_rejected_setter_keeps_filter_running() {
    let design = FilterDesign::new(
        FilterFamily::Butterworth(Response::LowPass),
        Cutoff::Single(1000.0),
    );
    let mut filter = IirFilter::<f64>::new(design, SAMPLE_RATE, 1).unwrap();
    let before = filter.coefficients().clone();

    assert!(matches!(
        filter.set_cut_frequency(SAMPLE_RATE),
        Err(ConfigurationError::CutoffOutOfRange { .. })
    ));
    assert!(filter.set_cut_frequencies(100.0, 200.0).is_err());
    assert_eq!(filter.set_order(0), Err(ConfigurationError::InvalidOrder(0)));
    assert_eq!(filter.coefficients(), &before);
    assert_eq!(filter.cut_frequency(), Cutoff::Single(1000.0));
}

// ============================================================================
// 2. Delay line
// ============================================================================

/// `p[i] = x[i] + fb·p[i−d]`, `y[i] = blend·p[i] + ff·p[i−d]`, zero history.
fn reference_comb(input: &[f64], delay: usize, blend: f64, feedback: f64, feedforward: f64) -> Vec<f64> {
    let mut p = vec![0.0; input.len()];
    let mut y = vec![0.0; input.len()];
    for i in 0..input.len() {
        let delayed = if delay > 0 && i >= delay { p[i - delay] } else { 0.0 };
        if delay == 0 {
            p[i] = input[i];
            y[i] = blend * p[i] + feedforward * p[i];
        } else {
            p[i] = input[i] + feedback * delayed;
            y[i] = blend * p[i] + feedforward * delayed;
        }
    }
    y
}

#[test]
fn delay_matches_reference_across_block_sizes() {
    let capacity = 32;
    let delay = 31;
    let mut comb = DelayLineFilter::<f64>::new(capacity).unwrap();
    comb.set_delay(delay).unwrap();
    comb.set_blend(0.3).unwrap();
    comb.set_feedback(-0.6).unwrap();
    comb.set_feedforward(0.8).unwrap();

    let input = white_noise(300, 5);
    let expected = reference_comb(&input, delay, 0.3, -0.6, 0.8);

    // Blocks equal to the delay, larger than the line, and tiny.
    let mut output = vec![0.0; input.len()];
    let mut start = 0;
    for size in [31usize, 100, 1, 32, 7].iter().cycle() {
        if start >= input.len() {
            break;
        }
        let end = (start + size).min(input.len());
        comb.process_block(&input[start..end], &mut output[start..end]);
        start = end;
    }
    for (i, (y, e)) in output.iter().zip(&expected).enumerate() {
        assert!((y - e).abs() < 1e-12, "sample {i}: {y} vs {e}");
    }
}

#[test]
fn delay_pure_delay_shifts_input() {
    let mut line = DelayLineFilter::<f32>::new(16).unwrap();
    line.set_delay(5).unwrap();
    let input: Vec<f32> = (1..=20).map(|i| i as f32).collect();
    let mut output = vec![0.0f32; 20];
    line.process(&[&input], &mut [&mut output]);
    for i in 0..20 {
        let expected = if i >= 5 { input[i - 5] } else { 0.0 };
        assert_eq!(output[i], expected, "sample {i}");
    }
}

#[test]
fn delay_rejected_feedback_leaves_state_unchanged() {
    let mut comb = DelayLineFilter::<f64>::new(8).unwrap();
    comb.set_delay(3).unwrap();
    comb.set_feedback(0.5).unwrap();
    let mut twin = comb.clone();

    for x in [1.0, 0.2, -0.4, 0.0] {
        comb.process_sample(x);
        twin.process_sample(x);
    }

    assert_eq!(
        comb.set_feedback(1.5),
        Err(ConfigurationError::FeedbackOutOfRange(1.5))
    );
    assert!(comb.set_feedback(f64::NAN).is_err());
    assert_eq!(comb.feedback(), 0.5);
    assert!(comb.set_delay(8).is_err());
    assert_eq!(comb.delay(), 3);

    for x in white_noise(64, 3) {
        assert_eq!(comb.process_sample(x), twin.process_sample(x));
    }
}

// ============================================================================
// 3. Crossovers
// ============================================================================

#[test]
fn fir_bands_reconstruct_white_noise() {
    let order = 128;
    let mut bank = FirCrossover::<f64>::new(order, &[200.0, 2000.0, 8000.0], SAMPLE_RATE).unwrap();
    let latency = bank.latency_samples();
    assert_eq!(latency, order / 2);

    let input = white_noise(4096, 42);
    let mut bands = vec![vec![0.0; input.len()]; bank.bands()];
    {
        let mut outputs: Vec<&mut [f64]> = bands.iter_mut().map(Vec::as_mut_slice).collect();
        bank.process(&[&input], &mut outputs);
    }

    let error: Vec<f64> = (latency..input.len())
        .map(|n| bands.iter().map(|b| b[n]).sum::<f64>() - input[n - latency])
        .collect();
    let error_db = linear_to_db(rms(&error) / rms(&input));
    assert!(error_db < -60.0, "reconstruction error {error_db} dB");
}

#[test]
fn fir_bands_separate_tones() {
    let mut bank = FirCrossover::<f64>::new(256, &[1000.0], SAMPLE_RATE).unwrap();
    let input = generate_sine(5000.0, 4800);
    let mut low = vec![0.0; input.len()];
    let mut high = vec![0.0; input.len()];
    bank.process(&[&input], &mut [&mut low, &mut high]);

    let low_db = linear_to_db(rms(&low[512..]) / rms(&input[512..]));
    let high_db = linear_to_db(rms(&high[512..]) / rms(&input[512..]));
    assert!(low_db < -40.0, "low band leaks {low_db} dB");
    assert!(high_db.abs() < 0.1, "high band {high_db} dB");
}

#[test]
fn linkwitz_riley_two_band_sum_is_flat() {
    let mut bank = LinkwitzRileyCrossover::<f64>::new(&[1200.0], SAMPLE_RATE).unwrap();
    for freq in [60.0, 600.0, 1200.0, 2400.0, 12000.0] {
        bank.reset();
        let input = generate_sine(freq, 19200);
        let mut low = vec![0.0; input.len()];
        let mut high = vec![0.0; input.len()];
        bank.process(&[&input], &mut [&mut low, &mut high]);
        let sum: Vec<f64> = low.iter().zip(&high).map(|(l, h)| l + h).collect();
        let db = linear_to_db(rms(&sum[9600..]) / rms(&input[9600..]));
        assert!(db.abs() < 0.05, "{freq} Hz: {db} dB");
    }
}

#[test]
fn multiband_strategies_agree_on_band_energy() {
    let crossovers = [500.0, 4000.0];
    let mut banks = [
        MultibandCrossover::<f64>::fir(512, &crossovers, SAMPLE_RATE).unwrap(),
        MultibandCrossover::<f64>::linkwitz_riley(&crossovers, SAMPLE_RATE).unwrap(),
    ];
    let input = generate_sine(1500.0, 9600);
    for bank in &mut banks {
        let mut bands = [0.0; 3];
        let mut energy = [0.0; 3];
        for (n, &x) in input.iter().enumerate() {
            bank.process_sample(x, &mut bands);
            if n >= 4800 {
                for (e, b) in energy.iter_mut().zip(bands) {
                    *e += b * b;
                }
            }
        }
        // A 1.5 kHz tone lives in the middle band
        assert!(energy[1] > 10.0 * energy[0]);
        assert!(energy[1] > 10.0 * energy[2]);
    }
}

// ============================================================================
// 4. Dynamics
// ============================================================================

#[test]
fn peak_follower_impulse_response() {
    // Half-life of 10 samples
    let mut peak = PeakFollower::<f64>::new(10.0 / SAMPLE_RATE, SAMPLE_RATE).unwrap();
    let mut input = vec![0.0; 200];
    input[0] = 1.0;
    let mut output = vec![0.0; 200];
    peak.process(&[&input], &mut [&mut output]);

    assert_eq!(output[0], 1.0);
    assert!((output[10] - 0.5).abs() < 1e-9);
    assert!((output[20] - 0.25).abs() < 1e-9);
    // 0.5^(n/10) first drops below 1e-4 at n = 133
    assert!(output[132] > 0.0);
    assert!(output[133..].iter().all(|&v| v == 0.0));
}

#[test]
fn rms_follower_tracks_step_changes() {
    let mut rms_follower = RmsFollower::<f64>::new(10.0, SAMPLE_RATE).unwrap();
    let window = rms_follower.window_len();
    assert_eq!(window, 480);

    let mut input = vec![0.5; 2000];
    input.extend(std::iter::repeat_n(-0.25, 2000));
    let mut output = vec![0.0; input.len()];
    rms_follower.process(&[&input], &mut [&mut output]);

    assert!((output[1999] - 0.5).abs() < 1e-12);
    assert!((output[3999] - 0.25).abs() < 1e-12);
    // Halfway through the window the squares are an even mix
    let mixed = libm::sqrt((0.25 + 0.0625) / 2.0);
    assert!((output[2000 + window / 2 - 1] - mixed).abs() < 1e-12);
}

#[test]
fn limiter_driven_by_peak_power() {
    let mut peak = PeakFollower::<f64>::new(0.05, SAMPLE_RATE).unwrap();
    let mut limiter = GainShaper::<f64>::new(GainCurve::Limiter, 4096, 64).unwrap();
    // Levels are powers: an amplitude ceiling of 0.5
    limiter.set_threshold(0.25).unwrap();

    let input: Vec<f64> = generate_sine(200.0, 4800).iter().map(|s| s * 2.0).collect();
    let power: Vec<f64> = input.iter().map(|x| x * x).collect();
    let mut levels = vec![0.0; input.len()];
    let mut gains = vec![0.0; input.len()];
    peak.process(&[&power], &mut [&mut levels]);
    limiter.process(&[&levels], &mut [&mut gains]);

    for (n, (&x, &g)) in input.iter().zip(&gains).enumerate().skip(480) {
        assert!(g > 0.0 && g <= 1.0);
        assert!((x * g).abs() <= 0.5 + 1e-2, "sample {n}: {}", x * g);
    }
    // The held peak pins the gain near sqrt(0.25 / 4)
    assert!((gains[4799] - 0.25).abs() < 1e-2);
}

#[test]
fn gain_shaper_recompute_is_observable() {
    let mut swell = GainShaper::<f32>::new(GainCurve::Swell, 8192, 64).unwrap();
    let hard = swell.gain_at(4.0);
    swell.set_ratio(4.0).unwrap();
    swell.wait_for_recompute();
    assert!(!swell.is_recomputing());
    let steep = swell.gain_at(4.0);
    assert!(steep < hard);
    assert!((swell.gain_at(0.0) - 1.0).abs() < 1e-6);

    assert_eq!(swell.set_ratio(0.0), Err(ConfigurationError::InvalidRatio(0.0)));
    assert_eq!(swell.ratio(), 4.0);
}
