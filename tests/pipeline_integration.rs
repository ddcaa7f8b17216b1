// tests/pipeline_integration.rs
//! End-to-end pipeline tests: calibration, synthetic states, profiles, hand-off

use biosignal_core::acquisition::{sample_channel, LineParser, LineParserConfig};
use biosignal_core::config::{OutputConfig, OutputFormat, SystemConfig};
use biosignal_core::processing::{CalibrationPhase, CalibrationProfile, StatePipeline, StateReport};
use biosignal_core::simulation::{SimulationSettings, SyntheticSource};
use biosignal_core::utils::time::MockTimeProvider;
use biosignal_core::{BioError, ReportWriter, Sample, StateLabel};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const RATE: usize = 1000;

fn short_calibration_config() -> SystemConfig {
    let mut config = SystemConfig::default();
    config.calibration.duration_secs = 10.0;
    config
}

fn pipeline(config: SystemConfig) -> StatePipeline {
    StatePipeline::with_time_provider(config, Arc::new(MockTimeProvider::new(1_000_000))).unwrap()
}

fn quiet_source() -> SyntheticSource {
    let settings = SimulationSettings {
        noise_level: 0.0,
        ..SimulationSettings::default()
    };
    SyntheticSource::new(settings, StateLabel::Relaxed).unwrap()
}

fn calibrated() -> (StatePipeline, SyntheticSource) {
    let mut pipeline = pipeline(short_calibration_config());
    let mut source = quiet_source();
    pipeline.start_calibration().unwrap();
    for sample in source.calibration_run(5 * RATE, 5 * RATE) {
        assert!(pipeline.push_sample(sample).unwrap().is_none());
    }
    assert!(pipeline.is_calibrated());
    (pipeline, source)
}

fn run_state(
    pipeline: &mut StatePipeline,
    source: &mut SyntheticSource,
    state: StateLabel,
    seconds: usize,
) -> Vec<StateReport> {
    source.set_target(state);
    source
        .take(seconds * RATE)
        .filter_map(|sample| pipeline.push_sample(sample).unwrap())
        .collect()
}

fn most_reported(reports: &[StateReport]) -> StateLabel {
    let mut counts: HashMap<StateLabel, usize> = HashMap::new();
    for report in reports {
        *counts.entry(report.state).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(label, _)| label)
        .unwrap()
}

#[test]
fn test_calibration_progress_and_bounds() {
    let mut pipeline = pipeline(short_calibration_config());
    let mut source = quiet_source();
    pipeline.start_calibration().unwrap();

    let samples = source.calibration_run(5 * RATE, 5 * RATE);
    for sample in &samples[..2500] {
        pipeline.push_sample(*sample).unwrap();
    }
    let (phase, progress) = pipeline.calibration_progress().unwrap();
    assert_eq!(phase, CalibrationPhase::Rest);
    assert!((progress - 0.25).abs() < 0.01);

    for sample in &samples[2500..] {
        pipeline.push_sample(*sample).unwrap();
    }
    let baseline = pipeline.baseline().unwrap();
    assert!(baseline.emg.low < 0.0 && baseline.emg.high > 0.0);
    assert!((baseline.gsr.low - 2.0).abs() < 0.1);
    assert!((baseline.gsr.high - 10.0).abs() < 0.1);
}

#[test]
fn test_synthetic_states_are_recognized() {
    let (mut pipeline, mut source) = calibrated();

    for state in [StateLabel::Relaxed, StateLabel::Focused, StateLabel::Stressed] {
        let reports = run_state(&mut pipeline, &mut source, state, 10);
        assert_eq!(reports.len(), 200);
        assert_eq!(most_reported(&reports), state, "while simulating {}", state);
    }

    let fatigue = run_state(&mut pipeline, &mut source, StateLabel::Fatigued, 10);
    assert!(fatigue.iter().any(|r| r.state == StateLabel::Fatigued));

    let statistics = pipeline.statistics();
    assert_eq!(statistics.total, 800);
    assert!(statistics.transitions >= 4);
}

#[test]
fn test_reports_stay_in_range() {
    let mut pipeline = pipeline(short_calibration_config());
    let mut source = SyntheticSource::new(SimulationSettings::default(), StateLabel::Relaxed).unwrap();
    pipeline.start_calibration().unwrap();
    for sample in source.calibration_run(5 * RATE, 5 * RATE) {
        pipeline.push_sample(sample).unwrap();
    }

    for state in StateLabel::ALL {
        for report in run_state(&mut pipeline, &mut source, state, 3) {
            assert!((0.0..=1.0).contains(&report.confidence));
            assert!((0.0..=1.0).contains(&report.raw_confidence));
            assert!((0.0..=1.0).contains(&report.quality));
            assert!(report.features.emg_rms >= 0.0);
            assert!((0.0..=1.0).contains(&report.features.emg_zero_crossing_rate));
            assert!((0.0..=1.0).contains(&report.features.gsr_mean));
        }
    }
}

#[test]
fn test_profile_persists_across_sessions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("profile.json");

    let (mut first, mut source) = calibrated();
    first.export_profile("dana").unwrap().save(&path).unwrap();
    let expected: Vec<StateReport> = run_state(&mut first, &mut source, StateLabel::Stressed, 3);

    let profile = CalibrationProfile::load(&path).unwrap();
    assert_eq!(profile.user, "dana");
    let mut second = pipeline(short_calibration_config());
    second.load_profile(&profile).unwrap();
    assert_eq!(second.baseline(), first.baseline());

    // Same baseline, same input, same reports
    let mut replay = quiet_source();
    replay.calibration_run(5 * RATE, 5 * RATE);
    let actual = run_state(&mut second, &mut replay, StateLabel::Stressed, 3);
    assert_eq!(actual.len(), expected.len());
    for (a, b) in actual.iter().zip(&expected) {
        assert_eq!(a.state, b.state);
        assert_eq!(a.features, b.features);
    }
}

#[test]
fn test_corrupt_profile_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(CalibrationProfile::load(&path).is_err());

    let inverted = r#"{"user":"x","created_at_us":0,"emg_low":1.0,"emg_high":0.0,"gsr_low":1.0,"gsr_high":5.0}"#;
    std::fs::write(&path, inverted).unwrap();
    let result = CalibrationProfile::load(&path).and_then(|p| p.validate());
    assert!(matches!(result, Err(BioError::Profile(_))));
}

#[test]
fn test_not_calibrated_until_started() {
    let mut pipeline = pipeline(SystemConfig::default());
    let err = pipeline.push_sample(Sample::new(0, 0.1, 2.0)).unwrap_err();
    assert!(matches!(err, BioError::NotCalibrated));
    assert!(!err.is_recoverable());

    pipeline.start_calibration().unwrap();
    assert!(pipeline.push_sample(Sample::new(0, 0.1, 2.0)).unwrap().is_none());
}

#[test]
fn test_dead_sensor_calibration_can_be_retried() {
    let mut config = SystemConfig::default();
    config.calibration.duration_secs = 0.01;
    let mut pipeline = pipeline(config);
    pipeline.start_calibration().unwrap();

    for i in 0..9u64 {
        assert!(pipeline.push_sample(Sample::new(i, f32::NAN, 2.0)).unwrap().is_none());
    }
    let err = pipeline.push_sample(Sample::new(9, f32::NAN, 2.0)).unwrap_err();
    assert!(matches!(err, BioError::InsufficientData { .. }));

    // The failed run is abandoned instead of failing on every sample
    let err = pipeline.push_sample(Sample::new(10, 0.2, 2.0)).unwrap_err();
    assert!(matches!(err, BioError::NotCalibrated));
    assert!(!err.is_recoverable());

    pipeline.start_calibration().unwrap();
    let reports: Vec<StateReport> = (0..200u64)
        .filter_map(|i| {
            let emg = if i % 2 == 0 { 0.3 } else { -0.3 };
            pipeline
                .push_sample(Sample::new(100 + i, emg, 2.0 + (i % 5) as f32))
                .unwrap()
        })
        .collect();
    assert!(pipeline.is_calibrated());
    assert!(!reports.is_empty());
}

#[test]
fn test_recalibration_replaces_baseline() {
    let (mut pipeline, mut source) = calibrated();
    let before = *pipeline.baseline().unwrap();

    pipeline.start_calibration().unwrap();
    let louder = SimulationSettings {
        emg_amplitude: 2.0,
        noise_level: 0.0,
        ..SimulationSettings::default()
    };
    let mut loud = SyntheticSource::new(louder, StateLabel::Relaxed).unwrap();
    for sample in loud.calibration_run(5 * RATE, 5 * RATE) {
        pipeline.push_sample(sample).unwrap();
    }
    let after = *pipeline.baseline().unwrap();
    assert!(after.emg.span() > 1.5 * before.emg.span());
    assert_eq!(pipeline.metrics().calibrations_completed, 2);

    let reports = run_state(&mut pipeline, &mut source, StateLabel::Relaxed, 2);
    assert!(!reports.is_empty());
}

#[test]
fn test_parsed_stream_through_handoff() {
    let mut config = SystemConfig::default();
    config.calibration.duration_secs = 1.0;
    let mut pipeline = pipeline(config);
    pipeline.start_calibration().unwrap();

    let (tx, rx) = sample_channel(64).unwrap();
    let producer = thread::spawn(move || {
        let mut parser = LineParser::new(LineParserConfig::default());
        let mut lines = vec!["# emg,gsr".to_string(), "garbage".to_string()];
        for i in 0..3000 {
            let emg = if i < 1000 { (i % 100) as f32 / 100.0 } else { 0.5 };
            lines.push(format!("{:.3},{:.2}", emg, 2.0 + (i % 7) as f32));
        }
        for line in &lines {
            if let Some(sample) = parser.parse_line(line) {
                tx.send_blocking(sample).unwrap();
            }
        }
        (parser.sample_count(), parser.error_count())
    });

    let reports: Vec<StateReport> = rx
        .iter()
        .filter_map(|sample| pipeline.push_sample(sample).unwrap())
        .collect();
    let (parsed, errors) = producer.join().unwrap();

    assert_eq!(parsed, 3000);
    assert_eq!(errors, 1);
    assert_eq!(rx.dropped(), 0);
    assert!(pipeline.is_calibrated());
    assert_eq!(reports.len(), 40);
}

#[test]
fn test_json_report_stream() {
    let (mut pipeline, mut source) = calibrated();
    let config = OutputConfig {
        format: OutputFormat::JsonLines,
        ..OutputConfig::default()
    };
    let mut writer = ReportWriter::new(Vec::new(), &config);
    for report in run_state(&mut pipeline, &mut source, StateLabel::Relaxed, 1) {
        writer.write_report(&report).unwrap();
    }
    assert_eq!(writer.records_written(), 20);

    let text = String::from_utf8(writer.into_inner()).unwrap();
    for line in text.lines() {
        let report: StateReport = serde_json::from_str(line).unwrap();
        assert!(report.timestamp_us > 0);
    }
}
