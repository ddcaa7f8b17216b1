use biosignal_core::acquisition::SampleWindow;
use biosignal_core::config::{FeatureConfig, SamplingConfig, SystemConfig};
use biosignal_core::processing::features::FeatureExtractor;
use biosignal_core::processing::{Baseline, ChannelBounds, StatePipeline};
use biosignal_core::simulation::{SimulationSettings, SyntheticSource};
use biosignal_core::utils::time::MockTimeProvider;
use biosignal_core::{Sample, StateLabel};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

const WINDOW_SIZES: &[usize] = &[64, 128, 256, 512, 1024];
const TICK_INTERVALS: &[usize] = &[10, 50, 100];

fn calibrated_pipeline(config: SystemConfig) -> StatePipeline {
    let mut pipeline =
        StatePipeline::with_time_provider(config, Arc::new(MockTimeProvider::new(0))).unwrap();
    pipeline.load_baseline(Baseline::new(
        ChannelBounds::new(-0.75, 0.75),
        ChannelBounds::new(2.0, 10.0),
    ));
    pipeline
}

fn stream(state: StateLabel, count: usize) -> Vec<Sample> {
    SyntheticSource::new(SimulationSettings::default(), state)
        .unwrap()
        .take(count)
        .collect()
}

fn benchmark_per_sample_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let samples = stream(StateLabel::Stressed, 10_000);

    for &tick in TICK_INTERVALS {
        group.throughput(Throughput::Elements(samples.len() as u64));
        group.bench_with_input(BenchmarkId::new("push_sample", format!("tick_{}", tick)), &tick, |b, &tick| {
            let mut config = SystemConfig::default();
            config.sampling.tick_interval_samples = tick;
            let mut pipeline = calibrated_pipeline(config);

            b.iter(|| {
                for sample in &samples {
                    let _ = black_box(pipeline.push_sample(black_box(*sample)));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_feature_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("features");
    let sampling = SamplingConfig::default();

    for &size in WINDOW_SIZES {
        let config = FeatureConfig {
            emg_window_samples: size,
            ..FeatureConfig::default()
        };
        let mut extractor = FeatureExtractor::new(&config, &sampling).unwrap();
        let emg: Vec<f32> = stream(StateLabel::Focused, size)
            .iter()
            .map(|s| 0.5 + s.emg * 0.5)
            .collect();
        let gsr = vec![0.4f32; 250];

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("extract", size), &size, |b, _| {
            b.iter(|| black_box(extractor.extract(black_box(&emg), black_box(&gsr))));
        });
    }

    group.finish();
}

fn benchmark_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("window");

    for &size in WINDOW_SIZES {
        group.throughput(Throughput::Elements(1000));
        group.bench_with_input(BenchmarkId::new("push_and_copy", size), &size, |b, &size| {
            let mut window = SampleWindow::new(size).unwrap();
            b.iter(|| {
                for i in 0..1000 {
                    window.push(black_box(i as f32));
                }
                black_box(window.to_vec())
            });
        });
    }

    group.finish();
}

fn benchmark_synthetic_source(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");
    group.throughput(Throughput::Elements(1000));
    group.bench_function("next_sample", |b| {
        let mut source = SyntheticSource::new(SimulationSettings::default(), StateLabel::Stressed).unwrap();
        b.iter(|| {
            for _ in 0..1000 {
                black_box(source.next_sample());
            }
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_per_sample_pipeline,
    benchmark_feature_extraction,
    benchmark_window,
    benchmark_synthetic_source
);
criterion_main!(benches);
