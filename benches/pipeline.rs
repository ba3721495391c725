use chamo_core::synth::TraceSynthesizer;
use chamo_core::{AdaptiveConfig, Band, FilterConfig, FilterPipeline, SignalBuffer};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const TRACE_LENGTHS: &[usize] = &[1_000, 10_000, 100_000];
const SAMPLE_RATE_HZ: f32 = 10_000.0;

fn synthetic_trace(samples: usize) -> SignalBuffer {
    let mut synth = TraceSynthesizer::new(SAMPLE_RATE_HZ, 42);
    let mut trace = synth.sine(10.0, 1.0, samples);
    TraceSynthesizer::mix(&mut trace, &synth.sine(50.0, 0.4, samples));
    TraceSynthesizer::mix(&mut trace, &synth.white_noise(0.1, samples));
    synth
        .buffer(trace)
        .unwrap_or_else(|e| panic!("trace synthesis failed: {}", e))
}

fn benchmark_single_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernels");

    for &len in TRACE_LENGTHS {
        let buffer = synthetic_trace(len);
        group.throughput(Throughput::Elements(len as u64));

        for (name, config) in [
            (
                "savitzky_golay",
                FilterConfig::SavitzkyGolay {
                    window_length: 51,
                    poly_order: 3,
                },
            ),
            (
                "fft_bandpass",
                FilterConfig::FftBandpass {
                    low_hz: 1.0,
                    high_hz: 100.0,
                },
            ),
            (
                "butterworth",
                FilterConfig::Butterworth {
                    band: Band::Lowpass { cutoff_hz: 20.0 },
                    order: 4,
                },
            ),
        ] {
            group.bench_with_input(BenchmarkId::new(name, len), &buffer, |b, buffer| {
                b.iter(|| {
                    let mut pipeline = FilterPipeline::new(vec![config.clone()]);
                    let _ = black_box(pipeline.run(black_box(buffer)));
                });
            });
        }
    }
    group.finish();
}

fn benchmark_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for &len in TRACE_LENGTHS {
        let buffer = synthetic_trace(len);
        group.throughput(Throughput::Elements(len as u64));

        group.bench_with_input(BenchmarkId::new("three_stage", len), &buffer, |b, buffer| {
            let configs = vec![
                FilterConfig::SavitzkyGolay {
                    window_length: 51,
                    poly_order: 3,
                },
                FilterConfig::Butterworth {
                    band: Band::Lowpass { cutoff_hz: 100.0 },
                    order: 4,
                },
                FilterConfig::AdaptiveCancel(AdaptiveConfig {
                    template_len: 200,
                    ..AdaptiveConfig::default()
                }),
            ];
            b.iter(|| {
                let mut pipeline = FilterPipeline::new(configs.clone());
                let _ = black_box(pipeline.run(black_box(buffer)));
            });
        });
    }
    group.finish();
}

fn benchmark_streaming_chunks(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming");
    let chunk_len = 4_096;
    let chunks: Vec<SignalBuffer> = (0..16).map(|_| synthetic_trace(chunk_len)).collect();
    group.throughput(Throughput::Elements((chunk_len * chunks.len()) as u64));

    group.bench_function("adaptive_16_chunks", |b| {
        let config = FilterConfig::AdaptiveCancel(AdaptiveConfig {
            template_len: 256,
            ..AdaptiveConfig::default()
        });
        b.iter(|| {
            let mut pipeline = FilterPipeline::new(vec![config.clone()]);
            for chunk in &chunks {
                let _ = black_box(pipeline.run(black_box(chunk)));
            }
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_kernels,
    benchmark_full_pipeline,
    benchmark_streaming_chunks
);
criterion_main!(benches);
