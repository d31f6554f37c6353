use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use eaf_transcribe_core::annotation::infrastructure::eaf_store::EafAnnotationStore;
use eaf_transcribe_core::audio::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use eaf_transcribe_core::audio::infrastructure::whisper_recognizer::{
    WhisperOptions, WhisperRecognizer,
};
use eaf_transcribe_core::pairing::pairing_resolver::PairingResolver;
use eaf_transcribe_core::pipeline::infrastructure::file_logger::LogFile;
use eaf_transcribe_core::pipeline::pipeline_logger::{ConsolePipelineLogger, PipelineLogger};
use eaf_transcribe_core::pipeline::transcribe_batch_use_case::{
    BatchReport, TranscribeBatchUseCase,
};
use eaf_transcribe_core::pipeline::transcribe_pair_use_case::TranscribePairUseCase;
use eaf_transcribe_core::shared::compute_device::ComputeDevice;
use eaf_transcribe_core::shared::constants::{
    whisper_model_filename, whisper_model_url, DEFAULT_LANGUAGE, DEFAULT_WHISPER_MODEL,
};
use eaf_transcribe_core::shared::model_resolver;

/// Transcribe the annotated spans of ELAN files from their paired audio.
#[derive(Parser)]
#[command(name = "eaf-transcribe")]
struct Cli {
    /// A .wav/.eaf file (either sibling) or a directory of pairs.
    path: Option<PathBuf>,

    /// Download and load the model for this device, then exit.
    #[arg(long, value_enum)]
    cache: Option<DeviceArg>,

    /// Log every transcribed clip.
    #[arg(long)]
    debug: bool,

    /// Whisper model name (ggml-<name>.bin).
    #[arg(long, default_value = DEFAULT_WHISPER_MODEL)]
    model: String,

    /// Use this model file instead of resolving --model.
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Spoken language code, or "auto" to detect per clip.
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    language: String,

    /// Directory for the timestamped run log.
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Inference threads (defaults to min(4, available cores)).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DeviceArg {
    Cuda,
    Cpu,
}

impl From<DeviceArg> for ComputeDevice {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Cuda => ComputeDevice::Cuda,
            DeviceArg::Cpu => ComputeDevice::Cpu,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(e) = run(cli) {
        log::error!("{e}");
        process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(device) = cli.cache {
        let device = ComputeDevice::from(device);
        log::info!("Caching models for {device}");
        load_recognizer(&cli, device)?;
        return Ok(());
    }

    let Some(path) = cli.path.as_deref() else {
        return Err("PATH is required unless --cache is given".into());
    };

    let run_log_path = run_log_path(&cli.log_dir);
    let run_log = LogFile::append(&run_log_path, LevelFilter::Info)
        .map_err(|e| format!("Could not create run log {}: {e}", run_log_path.display()))?;
    let mut console = ConsolePipelineLogger::default();
    let mut logger = run_log.attach(&mut console);

    let pairs = PairingResolver::default().resolve(path, &mut logger)?;
    if pairs.is_empty() {
        return Ok(());
    }

    let device = ComputeDevice::detect();
    logger.info(&format!("Loading model for {device}"));
    let recognizer = load_recognizer(&cli, device)?;

    let pair_use_case = TranscribePairUseCase::new(
        Box::new(FfmpegAudioReader),
        Box::new(EafAnnotationStore::new()),
        Box::new(recognizer),
    );
    let pair_log_level = if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let batch = TranscribeBatchUseCase::new(pair_use_case).with_log_level(pair_log_level);

    let report = batch.execute(&pairs, &mut logger);
    log_report(&report, &mut logger);
    logger.summary();
    Ok(())
}

fn load_recognizer(
    cli: &Cli,
    device: ComputeDevice,
) -> Result<WhisperRecognizer, Box<dyn std::error::Error>> {
    let model_path = match &cli.model_path {
        Some(path) => path.clone(),
        None => {
            log::info!("Resolving model: {}", cli.model);
            let path = model_resolver::resolve(
                &whisper_model_filename(&cli.model),
                &whisper_model_url(&cli.model),
                None,
                Some(Box::new(download_progress)),
            )?;
            eprintln!();
            path
        }
    };

    let mut options = WhisperOptions {
        language: (cli.language != "auto").then(|| cli.language.clone()),
        device,
        ..WhisperOptions::default()
    };
    if let Some(threads) = cli.threads {
        options.threads = threads.max(1);
    }

    WhisperRecognizer::new(&model_path, options)
}

fn run_log_path(log_dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    log_dir.join(format!("{stamp}.log"))
}

fn log_report(report: &BatchReport, logger: &mut dyn PipelineLogger) {
    for pair_report in &report.succeeded {
        for tier in pair_report.failed_tiers() {
            let stopped_ms = tier.failed_at_ms.unwrap_or_default();
            logger.warn(&format!(
                "{}: tier {} stopped at {}s after {} of {} clips",
                pair_report.pair.name(),
                tier.tier,
                stopped_ms as f64 / 1000.0,
                tier.transcribed,
                tier.clips
            ));
        }
    }
    for (pair, _) in &report.failed {
        logger.warn(&format!("{}: not transcribed", pair.audio().display()));
    }
    logger.info(&format!(
        "Transcribed {} of {} pairs",
        report.succeeded.len(),
        report.total()
    ));
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading whisper model... {pct}%");
    } else {
        eprint!("\rDownloading whisper model... {downloaded} bytes");
    }
}
