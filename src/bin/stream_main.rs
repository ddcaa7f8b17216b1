//! biosignal-stream: classify an EMG/GSR stream from a file, stdin or the synthetic source

use biosignal_core::acquisition::{sample_channel, LineParser, LineParserConfig, SampleSender};
use biosignal_core::config::{ConfigLoader, OutputFormat, SystemConfig};
use biosignal_core::processing::CalibrationProfile;
use biosignal_core::simulation::{SimulationSettings, SyntheticSource};
use biosignal_core::{BioResult, ReportWriter, Sample, StateLabel, StatePipeline};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::PathBuf;
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Streaming EMG + GSR physiological state classifier", long_about = None)]
struct Args {
    /// TOML configuration file; repeat to layer several, later files win
    #[arg(short, long = "config", value_name = "TOML")]
    config: Vec<PathBuf>,

    /// Delimited input records (`emg,gsr` or `timestamp_us,emg,gsr`); stdin when omitted
    #[arg(short, long, conflicts_with = "simulate")]
    input: Option<PathBuf>,

    /// Run the synthetic source for this many seconds instead of reading input
    #[arg(long, value_name = "SECS")]
    simulate: Option<f32>,

    /// Simulated state; cycles through every state when omitted
    #[arg(long, requires = "simulate")]
    state: Option<StateLabel>,

    /// Gaussian noise level of the synthetic source
    #[arg(long, default_value_t = 0.05, requires = "simulate")]
    noise: f32,

    /// Load a calibration profile instead of calibrating
    #[arg(long, value_name = "JSON")]
    profile: Option<PathBuf>,

    /// Save the calibration profile when the stream ends
    #[arg(long, value_name = "JSON")]
    save_profile: Option<PathBuf>,

    /// User name stored in a saved profile
    #[arg(long, default_value = "default")]
    user: String,

    /// Report format
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Include the feature columns in delimited output
    #[arg(long)]
    features: bool,

    /// Input records start with a timestamp in microseconds
    #[arg(long)]
    timestamps: bool,

    /// Input fields are raw ADC codes
    #[arg(long)]
    raw_adc: bool,

    /// Drop samples instead of waiting when processing falls behind
    #[arg(long)]
    live: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Delimited,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Delimited => OutputFormat::Delimited,
            FormatArg::Json => OutputFormat::JsonLines,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only reports
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let mut loader = if args.config.is_empty() {
        ConfigLoader::new()
    } else {
        ConfigLoader::with_paths(args.config.clone())
    };
    let mut config = loader.load_system_config()?;
    if let Some(format) = args.format {
        config.output.format = format.into();
    }
    config.output.include_features |= args.features;

    let mut pipeline = StatePipeline::new(config.clone())?;
    let calibrate = match &args.profile {
        Some(path) => {
            let profile = CalibrationProfile::load(path)?;
            pipeline.load_profile(&profile)?;
            false
        }
        None => {
            pipeline.start_calibration()?;
            info!(
                seconds = config.calibration.duration_secs,
                "Calibrating: rest first, then maximal effort"
            );
            true
        }
    };

    let (tx, rx) = sample_channel(config.output.handoff_capacity)?;
    let producer = spawn_producer(&args, &config, calibrate, tx)?;

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(BufWriter::new(stdout.lock()), &config.output);
    for sample in rx.iter() {
        match pipeline.push_sample(sample) {
            Ok(Some(report)) => writer.write_report(&report)?,
            Ok(None) => {}
            Err(e) if e.is_recoverable() => warn!(error = %e, "Skipping sample"),
            Err(e) => return Err(e.into()),
        }
    }
    writer.flush()?;

    match producer.join() {
        Ok(result) => result?,
        Err(_) => return Err("producer thread panicked".into()),
    }

    if let Some(path) = &args.save_profile {
        pipeline.export_profile(&args.user)?.save(path)?;
        info!(path = %path.display(), "Saved calibration profile");
    }

    let metrics = pipeline.metrics();
    info!(
        samples = metrics.total_samples_processed,
        reports = metrics.reports,
        rejected = metrics.rejected_classifications,
        dropped = rx.dropped(),
        avg_us = metrics.average_processing_time_us,
        "Stream finished"
    );
    for (label, share) in pipeline.statistics().distribution() {
        info!(state = %label, share = format!("{:.1}%", share * 100.0), "State distribution");
    }
    Ok(())
}

fn spawn_producer(
    args: &Args,
    config: &SystemConfig,
    calibrate: bool,
    tx: SampleSender,
) -> BioResult<thread::JoinHandle<BioResult<()>>> {
    let live = args.live;

    if let Some(seconds) = args.simulate {
        let settings = SimulationSettings {
            emg_rate_hz: config.sampling.emg_rate_hz,
            noise_level: args.noise,
            ..SimulationSettings::default()
        };
        let rate = config.sampling.emg_rate_hz;
        let total = (seconds.max(0.0) * rate as f32).round() as usize;
        let calibration = if calibrate {
            let target = config.calibration.target_samples(rate);
            let rest = (target as f32 * config.calibration.rest_fraction).round() as usize;
            Some((rest.min(target), target - rest.min(target)))
        } else {
            None
        };
        let schedule = match args.state {
            Some(state) => vec![state],
            None => vec![
                StateLabel::Relaxed,
                StateLabel::Focused,
                StateLabel::Stressed,
                StateLabel::Fatigued,
            ],
        };
        let mut source = SyntheticSource::new(settings, schedule[0])?;

        return Ok(thread::spawn(move || {
            if let Some((rest, active)) = calibration {
                for sample in source.calibration_run(rest, active) {
                    forward(&tx, sample, live)?;
                }
            }
            let segment = (total / schedule.len()).max(1);
            for i in 0..total {
                let target = schedule[(i / segment).min(schedule.len() - 1)];
                if target != source.target() {
                    info!(state = %target, "Simulated state changed");
                    source.set_target(target);
                }
                forward(&tx, source.next_sample(), live)?;
            }
            Ok(())
        }));
    }

    let parser_config = LineParserConfig {
        delimiter: config.output.delimiter,
        timestamp_column: args.timestamps,
        raw_adc: args.raw_adc,
        sample_rate_hz: config.sampling.emg_rate_hz,
        ..LineParserConfig::default()
    };
    let reader: Box<dyn BufRead + Send> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    Ok(thread::spawn(move || {
        let mut parser = LineParser::new(parser_config);
        for line in reader.lines() {
            let line = line?;
            if let Some(sample) = parser.parse_line(&line) {
                forward(&tx, sample, live)?;
            }
        }
        if parser.error_count() > 0 {
            warn!(
                errors = parser.error_count(),
                rate = format!("{:.2}%", parser.error_rate()),
                "Input contained malformed records"
            );
        }
        Ok(())
    }))
}

fn forward(tx: &SampleSender, sample: Sample, live: bool) -> BioResult<()> {
    if live {
        tx.send(sample).map(|_| ())
    } else {
        tx.send_blocking(sample)
    }
}
