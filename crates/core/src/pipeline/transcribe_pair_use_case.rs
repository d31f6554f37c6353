use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;

use crate::annotation::domain::annotation_document::{AnnotationDocument, DocumentError};
use crate::annotation::domain::annotation_store::AnnotationStore;
use crate::annotation::domain::tier::Tier;
use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::pairing::pair::Pair;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::constants::WHISPER_SAMPLE_RATE;

#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("failed to create transcript directory {path}: {source}")]
    TranscriptDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load audio {path}: {message}")]
    LoadAudio { path: PathBuf, message: String },
    #[error("failed to open annotations {path}: {message}")]
    OpenAnnotations { path: PathBuf, message: String },
    #[error("failed to build transcript: {0}")]
    Document(#[from] DocumentError),
    #[error("failed to save transcript {path}: {message}")]
    Save { path: PathBuf, message: String },
}

/// Outcome of filling one tier.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TierReport {
    pub tier: String,
    /// Spans in the source tier.
    pub clips: usize,
    /// Spans the model was run on successfully.
    pub transcribed: usize,
    /// Spans written to the transcript; one per recognized segment.
    pub segments: usize,
    /// Spans skipped because their clip held no audio.
    pub skipped_empty: usize,
    /// Start of the clip whose transcription failed and ended the tier early.
    pub failed_at_ms: Option<u64>,
}

impl TierReport {
    fn new(tier: &Tier) -> Self {
        Self {
            tier: tier.name().to_string(),
            clips: tier.spans().len(),
            ..Self::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed_at_ms.is_none()
    }
}

/// Outcome of transcribing one pair.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptReport {
    pub pair: Pair,
    pub output_path: PathBuf,
    pub tiers: Vec<TierReport>,
}

impl TranscriptReport {
    pub fn segments(&self) -> usize {
        self.tiers.iter().map(|t| t.segments).sum()
    }

    pub fn failed_tiers(&self) -> impl Iterator<Item = &TierReport> {
        self.tiers.iter().filter(|t| !t.is_complete())
    }
}

/// Transcribes every annotated span of one audio/annotation pair:
/// load → mirror tiers → clip + recognize per span → save.
///
/// Output spans keep the source span's bounds; the model only supplies
/// text. A recognizer error ends the current tier but not the pair.
pub struct TranscribePairUseCase {
    reader: Box<dyn AudioReader>,
    store: Box<dyn AnnotationStore>,
    recognizer: Box<dyn SpeechRecognizer>,
    sample_rate: u32,
}

impl TranscribePairUseCase {
    pub fn new(
        reader: Box<dyn AudioReader>,
        store: Box<dyn AnnotationStore>,
        recognizer: Box<dyn SpeechRecognizer>,
    ) -> Self {
        Self {
            reader,
            store,
            recognizer,
            sample_rate: WHISPER_SAMPLE_RATE,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn execute(
        &self,
        pair: &Pair,
        logger: &mut dyn PipelineLogger,
    ) -> Result<TranscriptReport, TranscribeError> {
        let transcript_dir = pair.transcript_dir();
        fs::create_dir_all(&transcript_dir).map_err(|e| TranscribeError::TranscriptDir {
            path: transcript_dir.clone(),
            source: e,
        })?;

        logger.info(&format!("Loading audio {}", pair.audio().display()));
        let started = Instant::now();
        let audio = self
            .reader
            .read_audio(pair.audio(), self.sample_rate)
            .map_err(|e| TranscribeError::LoadAudio {
                path: pair.audio().to_path_buf(),
                message: e.to_string(),
            })?;
        logger.timing("load_audio", started.elapsed().as_secs_f64() * 1000.0);

        let source = self
            .store
            .open(pair.annotation())
            .map_err(|e| TranscribeError::OpenAnnotations {
                path: pair.annotation().to_path_buf(),
                message: e.to_string(),
            })?;

        let mut transcript = self.empty_transcript(&source)?;

        logger.info(&format!("Transcribing {}", pair.name()));
        let mut tiers = Vec::with_capacity(source.tiers().len());
        for tier in source.tiers() {
            logger.info(&format!("Transcribing {}", tier.name()));
            tiers.push(self.fill_tier(&audio, tier, &mut transcript, logger)?);
        }

        let output_path = pair.output_path();
        logger.info("Writing transcription");
        self.store
            .save(&transcript, &output_path)
            .map_err(|e| TranscribeError::Save {
                path: output_path.clone(),
                message: e.to_string(),
            })?;

        Ok(TranscriptReport {
            pair: pair.clone(),
            output_path,
            tiers,
        })
    }

    /// A fresh document from the store with exactly the source's tiers, in order.
    fn empty_transcript(
        &self,
        source: &AnnotationDocument,
    ) -> Result<AnnotationDocument, TranscribeError> {
        let mut transcript = self.store.create();
        // Placeholders go first so a source tier with the same name survives
        transcript.clear_tiers();
        for name in source.tier_names() {
            transcript.add_tier(name)?;
        }
        Ok(transcript)
    }

    fn fill_tier(
        &self,
        audio: &AudioSegment,
        tier: &Tier,
        transcript: &mut AnnotationDocument,
        logger: &mut dyn PipelineLogger,
    ) -> Result<TierReport, TranscribeError> {
        let mut report = TierReport::new(tier);
        let total = tier.spans().len();

        for (idx, span) in tier.spans().iter().enumerate() {
            logger.progress(tier.name(), idx + 1, total);

            let clip = audio.clip_ms(span.start_ms, span.end_ms);
            if clip.is_empty() {
                logger.warn(&format!(
                    "Skipping empty clip {}-{} ms on {}",
                    span.start_ms,
                    span.end_ms,
                    tier.name()
                ));
                report.skipped_empty += 1;
                continue;
            }

            let started = Instant::now();
            let segments = match self.recognizer.transcribe(&clip) {
                Ok(segments) => segments,
                Err(e) => {
                    logger.warn(&format!(
                        "Problem transcribing clip starting at {}: {e}",
                        span.start_secs()
                    ));
                    report.failed_at_ms = Some(span.start_ms);
                    break;
                }
            };
            logger.timing("transcribe", started.elapsed().as_secs_f64() * 1000.0);
            report.transcribed += 1;

            for segment in segments {
                logger.debug(&format!(
                    "{},{}, {}",
                    span.start_secs(),
                    span.end_secs(),
                    segment.text
                ));
                transcript.add_span(tier.name(), span.relabel(segment.text))?;
                report.segments += 1;
            }
        }

        Ok(report)
    }
}
