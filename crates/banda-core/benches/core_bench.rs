//! Criterion benchmarks for banda-core filters and followers
//!
//! Run with: cargo bench -p banda-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use banda_core::design::{Cutoff, FilterDesign, FilterFamily, Response, SecondOrderKind};
use banda_core::{
    BandShaper, BlockProcessor, DelayLineFilter, FirCrossover, GainCurve, GainShaper, IirFilter,
    LinkwitzRileyCrossover, PeakFollower, RmsFollower, Waveshaper,
};

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_iir(c: &mut Criterion) {
    let mut group = c.benchmark_group("IirFilter");

    for order in [2usize, 4, 8] {
        let design = FilterDesign::new(
            FilterFamily::Butterworth(Response::LowPass),
            Cutoff::Single(1000.0),
        )
        .with_order(order);

        for &block_size in BLOCK_SIZES {
            let input = generate_test_signal(block_size);
            let mut output = vec![0.0f32; block_size];

            group.bench_with_input(
                BenchmarkId::new(format!("order_{order}"), block_size),
                &block_size,
                |b, _| {
                    let mut filter = IirFilter::<f32>::new(design, SAMPLE_RATE, 1).unwrap();
                    b.iter(|| {
                        filter.process_block(0, black_box(&input), &mut output);
                        black_box(&output);
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_design(c: &mut Criterion) {
    let mut group = c.benchmark_group("FilterDesign");

    let cases = [
        ("butterworth_8", FilterFamily::Butterworth(Response::LowPass)),
        ("bessel_8", FilterFamily::Bessel(Response::LowPass)),
        ("chebyshev2_8", FilterFamily::Chebyshev2(Response::LowPass)),
        ("peak", FilterFamily::SecondOrder(SecondOrderKind::Peak)),
    ];
    for (name, family) in cases {
        let design = FilterDesign::new(family, Cutoff::Single(2000.0))
            .with_order(8)
            .with_gain(2.0);
        group.bench_function(name, |b| {
            b.iter(|| black_box(black_box(design).design_cascade(SAMPLE_RATE)));
        });
    }

    group.finish();
}

fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("DelayLineFilter");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        let mut output = vec![0.0f32; block_size];

        group.bench_with_input(
            BenchmarkId::new("process", block_size),
            &block_size,
            |b, _| {
                let mut comb = DelayLineFilter::<f32>::new(4800).unwrap();
                comb.set_delay(2400).unwrap();
                comb.set_feedback(0.5).unwrap();
                comb.set_blend(0.7).unwrap();
                b.iter(|| {
                    comb.process_block(black_box(&input), &mut output);
                    black_box(&output);
                });
            },
        );
    }

    group.finish();
}

fn bench_crossovers(c: &mut Criterion) {
    let mut group = c.benchmark_group("Crossover");
    let crossovers = [200.0, 2000.0, 8000.0];

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        let mut bands = vec![vec![0.0f32; block_size]; crossovers.len() + 1];

        group.bench_with_input(
            BenchmarkId::new("fir_128", block_size),
            &block_size,
            |b, _| {
                let mut bank = FirCrossover::<f32>::new(128, &crossovers, SAMPLE_RATE).unwrap();
                let mut outputs: Vec<&mut [f32]> =
                    bands.iter_mut().map(Vec::as_mut_slice).collect();
                b.iter(|| {
                    bank.process(&[black_box(input.as_slice())], &mut outputs);
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("linkwitz_riley", block_size),
            &block_size,
            |b, _| {
                let mut bank = LinkwitzRileyCrossover::<f32>::new(&crossovers, SAMPLE_RATE).unwrap();
                let mut outputs: Vec<&mut [f32]> =
                    bands.iter_mut().map(Vec::as_mut_slice).collect();
                b.iter(|| {
                    bank.process(&[black_box(input.as_slice())], &mut outputs);
                });
            },
        );
    }

    group.finish();
}

fn bench_dynamics(c: &mut Criterion) {
    let mut group = c.benchmark_group("Dynamics");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("rms", block_size),
            &block_size,
            |b, _| {
                let mut rms = RmsFollower::<f32>::new(RmsFollower::<f32>::DEFAULT_WINDOW_MS, SAMPLE_RATE).unwrap();
                b.iter(|| {
                    for &sample in &input {
                        black_box(rms.process_sample(black_box(sample)));
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("peak", block_size),
            &block_size,
            |b, _| {
                let mut peak = PeakFollower::<f32>::new(PeakFollower::<f32>::DEFAULT_HALF_LIFE, SAMPLE_RATE).unwrap();
                b.iter(|| {
                    for &sample in &input {
                        black_box(peak.process_sample(black_box(sample)));
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("limiter", block_size),
            &block_size,
            |b, _| {
                let mut limiter = GainShaper::<f32>::with_defaults(GainCurve::Limiter).unwrap();
                limiter.set_threshold(0.1).unwrap();
                b.iter(|| {
                    for &sample in &input {
                        black_box(limiter.process_sample(black_box(sample * sample)));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_shapers(c: &mut Criterion) {
    let mut group = c.benchmark_group("BandShaper");
    let input = generate_test_signal(512);

    for shape in Waveshaper::ALL {
        group.bench_with_input(BenchmarkId::new(shape.name(), 512), &shape, |b, &shape| {
            let mut shaper = BandShaper::new(shape, SAMPLE_RATE).unwrap();
            shaper.set_input_gain_db(12.0).unwrap();
            shaper.set_output_clip(true);
            b.iter(|| {
                for &sample in &input {
                    black_box(shaper.process_sample(black_box(sample)));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_iir,
    bench_design,
    bench_delay,
    bench_crossovers,
    bench_dynamics,
    bench_shapers,
);

criterion_main!(benches);
