// tests/pipeline_tests.rs
// Whole-pipeline behavior: validation, chaining, settings, and trace IO.

use chamo_core::metrics::band_power;
use chamo_core::synth::TraceSynthesizer;
use chamo_core::{
    run_independent, Band, CoreError, CoreResult, FilterConfig, FilterPipeline, PipelineReport,
    PipelineSettings, SignalBuffer, TraceMetadata, TraceSink, TraceSource,
};
use std::io::Write as _;

fn noisy_trace(seed: u64) -> SignalBuffer {
    let mut synth = TraceSynthesizer::new(1000.0, seed);
    let mut samples = synth.sine(10.0, 1.0, 2000);
    TraceSynthesizer::mix(&mut samples, &synth.sine(50.0, 0.4, 2000));
    TraceSynthesizer::mix(&mut samples, &synth.white_noise(0.1, 2000));
    synth.buffer(samples).unwrap()
}

#[test]
fn invalid_stage_aborts_before_any_stage_runs() {
    let buffer = noisy_trace(7);
    let mut pipeline = FilterPipeline::new(vec![
        FilterConfig::SavitzkyGolay {
            window_length: 51,
            poly_order: 3,
        },
        FilterConfig::Butterworth {
            band: Band::Lowpass { cutoff_hz: 20.0 },
            order: 50,
        },
    ]);

    let err = pipeline.run(&buffer);
    assert!(matches!(err, Err(CoreError::Config { .. })));
    // Nothing ran, so the stream clock never advanced.
    assert_eq!(pipeline.samples_seen(), 0);
}

#[test]
fn excessive_invalid_samples_are_rejected() {
    let mut samples = vec![1.0f32; 100];
    for s in samples.iter_mut().take(5) {
        *s = f32::NAN;
    }
    let buffer = SignalBuffer::from_raw(samples, 1000.0).unwrap();
    let mut pipeline = FilterPipeline::new(vec![FilterConfig::savitzky_golay_default()]);
    assert!(matches!(
        pipeline.run(&buffer),
        Err(CoreError::Data(_))
    ));
}

#[test]
fn chained_stages_reduce_out_of_band_power() {
    let buffer = noisy_trace(11);
    let mut pipeline = FilterPipeline::new(vec![
        FilterConfig::SavitzkyGolay {
            window_length: 31,
            poly_order: 3,
        },
        FilterConfig::Butterworth {
            band: Band::Lowpass { cutoff_hz: 20.0 },
            order: 4,
        },
    ]);
    let (out, report) = pipeline.run(&buffer).unwrap();

    assert_eq!(out.len(), buffer.len());
    assert_eq!(report.stages.len(), 2);
    assert!(report.snr_out_db > report.snr_in_db);

    let high_before = band_power(buffer.samples(), 1000.0, 30.0, 500.0);
    let high_after = band_power(out.samples(), 1000.0, 30.0, 500.0);
    assert!(high_after < 0.1 * high_before);

    // In-band content survives.
    let tone_before = band_power(buffer.samples(), 1000.0, 5.0, 15.0);
    let tone_after = band_power(out.samples(), 1000.0, 5.0, 15.0);
    assert!(tone_after > 0.5 * tone_before);
}

#[test]
fn repeated_runs_are_reproducible() {
    let buffer = noisy_trace(23);
    let configs = vec![FilterConfig::Butterworth {
        band: Band::Bandpass {
            low_hz: 2.0,
            high_hz: 60.0,
        },
        order: 3,
    }];
    let (a, _) = FilterPipeline::new(configs.clone()).run(&buffer).unwrap();
    let (b, _) = FilterPipeline::new(configs).run(&buffer).unwrap();
    assert_eq!(a.samples(), b.samples());
}

#[test]
fn settings_load_from_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"
[[stages]]
kind = "savitzky_golay"
window_length = 51
poly_order = 3

[[stages]]
kind = "butterworth"
order = 4
band = {{ mode = "lowpass", cutoff_hz = 20.0 }}

[[stages]]
kind = "adaptive_cancel"
template_len = 200
"#
    )
    .unwrap();

    let settings = PipelineSettings::load_from_path(&path).unwrap();
    assert_eq!(settings.stages.len(), 3);
    assert_eq!(settings.stages[0].label(), "savitzky-golay");
    assert_eq!(settings.stages[2].label(), "adaptive-cancel");

    let mut pipeline = FilterPipeline::new(settings.stages);
    let (out, report) = pipeline.run(&noisy_trace(31)).unwrap();
    assert_eq!(out.len(), 2000);
    assert_eq!(report.stages.len(), 3);
}

#[test]
fn parallel_runs_match_sequential() {
    let buffers: Vec<SignalBuffer> = (0..4).map(|i| noisy_trace(100 + i)).collect();
    let configs = vec![FilterConfig::Butterworth {
        band: Band::Lowpass { cutoff_hz: 20.0 },
        order: 4,
    }];

    let mut sequential: Vec<SignalBuffer> = Vec::new();
    for buffer in &buffers {
        let (out, _) = FilterPipeline::new(configs.clone()).run(buffer).unwrap();
        sequential.push(out);
    }

    let mut pipelines: Vec<FilterPipeline> = (0..4)
        .map(|_| FilterPipeline::new(configs.clone()))
        .collect();
    let parallel = run_independent(&mut pipelines, &buffers);

    for ((seq, result), pipeline) in sequential.iter().zip(parallel).zip(&pipelines) {
        let (par, _) = result.unwrap();
        assert_eq!(seq.samples(), par.samples());
        assert_eq!(pipeline.samples_seen(), 2000);
    }
}

/// Collects processed traces in memory, standing in for an ATF writer.
struct RecordingSink {
    written: Vec<(usize, String, usize)>,
}

impl TraceSink for RecordingSink {
    fn write_trace(
        &mut self,
        buffer: &SignalBuffer,
        metadata: &TraceMetadata,
        report: &PipelineReport,
    ) -> CoreResult<()> {
        self.written
            .push((buffer.len(), metadata.units.clone(), report.stages.len()));
        Ok(())
    }
}

#[test]
fn source_to_sink_round_trip() {
    let mut source = TraceSynthesizer::new(1000.0, 42);
    let mut sink = RecordingSink { written: Vec::new() };
    let mut pipeline = FilterPipeline::new(vec![FilterConfig::Butterworth {
        band: Band::Lowpass { cutoff_hz: 100.0 },
        order: 4,
    }]);

    let (buffer, metadata) = source.read_trace().unwrap();
    let (out, report) = pipeline.run(&buffer).unwrap();
    sink.write_trace(&out, &metadata, &report).unwrap();

    assert_eq!(sink.written.len(), 1);
    let (len, units, stages) = &sink.written[0];
    assert_eq!(*len, buffer.len());
    assert_eq!(units, "pA");
    assert_eq!(*stages, 1);
}
