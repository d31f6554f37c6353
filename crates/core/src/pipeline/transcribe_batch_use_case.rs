use log::LevelFilter;

use crate::pairing::pair::Pair;
use crate::pipeline::infrastructure::file_logger::LogFile;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::transcribe_pair_use_case::{
    TranscribeError, TranscribePairUseCase, TranscriptReport,
};

/// Outcome of a batch run. Every input pair lands in exactly one list.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<TranscriptReport>,
    pub failed: Vec<(Pair, TranscribeError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.succeeded.iter().all(|r| r.failed_tiers().next().is_none())
    }
}

/// Runs [`TranscribePairUseCase`] over many pairs in order.
///
/// While a pair is processed its messages are also appended to the pair's
/// own log file. A failing pair is logged and the batch moves on.
pub struct TranscribeBatchUseCase {
    pair_use_case: TranscribePairUseCase,
    pair_log_level: LevelFilter,
}

impl TranscribeBatchUseCase {
    pub fn new(pair_use_case: TranscribePairUseCase) -> Self {
        Self {
            pair_use_case,
            pair_log_level: LevelFilter::Info,
        }
    }

    /// Most verbose level written to per-pair log files.
    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.pair_log_level = level;
        self
    }

    pub fn execute(&self, pairs: &[Pair], logger: &mut dyn PipelineLogger) -> BatchReport {
        let mut report = BatchReport::default();

        for (idx, pair) in pairs.iter().enumerate() {
            logger.info(&format!(
                "[{}/{}] {}",
                idx + 1,
                pairs.len(),
                pair.audio().display()
            ));

            let result = match LogFile::append(&pair.log_path(), self.pair_log_level) {
                Ok(file) => {
                    let mut scoped = file.attach(logger);
                    self.run_pair(pair, &mut scoped)
                }
                Err(e) => {
                    logger.warn(&format!(
                        "Could not open log file {}: {e}",
                        pair.log_path().display()
                    ));
                    self.run_pair(pair, logger)
                }
            };

            match result {
                Ok(pair_report) => report.succeeded.push(pair_report),
                Err(e) => report.failed.push((pair.clone(), e)),
            }
        }

        report
    }

    fn run_pair(
        &self,
        pair: &Pair,
        logger: &mut dyn PipelineLogger,
    ) -> Result<TranscriptReport, TranscribeError> {
        let result = self.pair_use_case.execute(pair, logger);
        if let Err(e) = &result {
            logger.error("Error in transcribe_pair");
            logger.error(&e.to_string());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::domain::annotation_document::AnnotationDocument;
    use crate::annotation::domain::annotation_store::AnnotationStore;
    use crate::annotation::domain::span::Span;
    use crate::audio::domain::audio_reader::AudioReader;
    use crate::audio::domain::audio_segment::AudioSegment;
    use crate::audio::domain::speech_recognizer::SpeechRecognizer;
    use crate::audio::domain::transcript::TranscriptSegment;
    use crate::pipeline::pipeline_logger::MemoryPipelineLogger;
    use log::Level;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Fails for any audio whose file name contains "broken".
    struct PickyAudioReader;

    impl AudioReader for PickyAudioReader {
        fn read_audio(
            &self,
            path: &Path,
            sample_rate: u32,
        ) -> Result<AudioSegment, Box<dyn std::error::Error>> {
            if path.to_string_lossy().contains("broken") {
                return Err("unsupported codec".into());
            }
            Ok(AudioSegment::new(vec![0.1; sample_rate as usize * 4], sample_rate))
        }
    }

    struct StubStore {
        saved: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl AnnotationStore for StubStore {
        fn open(&self, _: &Path) -> Result<AnnotationDocument, Box<dyn std::error::Error>> {
            let mut doc = AnnotationDocument::new();
            doc.add_tier("spk1").unwrap();
            doc.add_span("spk1", Span::new(0, 1000, "")).unwrap();
            Ok(doc)
        }

        fn create(&self) -> AnnotationDocument {
            AnnotationDocument::new()
        }

        fn save(
            &self,
            _: &AnnotationDocument,
            path: &Path,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.saved.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    struct HelloRecognizer;

    impl SpeechRecognizer for HelloRecognizer {
        fn transcribe(
            &self,
            _: &AudioSegment,
        ) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>> {
            Ok(vec![TranscriptSegment::text_only("hello")])
        }
    }

    fn pair(dir: &Path, name: &str) -> Pair {
        Pair::new(
            dir.join(format!("{name}.wav")),
            dir.join(format!("{name}.eaf")),
        )
    }

    fn batch(saved: Arc<Mutex<Vec<PathBuf>>>) -> TranscribeBatchUseCase {
        TranscribeBatchUseCase::new(TranscribePairUseCase::new(
            Box::new(PickyAudioReader),
            Box::new(StubStore { saved }),
            Box::new(HelloRecognizer),
        ))
    }

    #[test]
    fn test_failed_pair_does_not_stop_batch() {
        let tmp = TempDir::new().unwrap();
        let saved = Arc::new(Mutex::new(Vec::new()));
        let pairs = vec![
            pair(tmp.path(), "a"),
            pair(tmp.path(), "broken"),
            pair(tmp.path(), "c"),
        ];

        let mut logger = MemoryPipelineLogger::new();
        let report = batch(saved.clone()).execute(&pairs, &mut logger);

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0.name(), "broken");
        assert!(!report.is_clean());

        let outputs = saved.lock().unwrap().clone();
        assert_eq!(
            outputs,
            vec![
                tmp.path().join("transcript").join("a.eaf"),
                tmp.path().join("transcript").join("c.eaf"),
            ]
        );

        let errors = logger.messages_at(Level::Error);
        assert_eq!(errors[0], "Error in transcribe_pair");
        assert!(errors[1].contains("unsupported codec"));
    }

    #[test]
    fn test_each_pair_gets_its_own_log_file() {
        let tmp = TempDir::new().unwrap();
        let pairs = vec![pair(tmp.path(), "a"), pair(tmp.path(), "broken")];
        let mut logger = MemoryPipelineLogger::new();
        batch(Arc::new(Mutex::new(Vec::new()))).execute(&pairs, &mut logger);

        let a_log = fs::read_to_string(tmp.path().join("a.log")).unwrap();
        assert!(a_log.contains("Transcribing a"));
        assert!(!a_log.contains("broken"));

        let broken_log = fs::read_to_string(tmp.path().join("broken.log")).unwrap();
        assert!(broken_log.contains(" - ERROR - Error in transcribe_pair"));
        assert!(!broken_log.contains("Transcribing a"));

        // Batch-level lines only reach the parent logger
        assert!(!a_log.contains("[1/2]"));
        assert!(logger.messages_at(Level::Info).contains(&"Writing transcription"));
    }

    #[test]
    fn test_log_file_appends_across_runs() {
        let tmp = TempDir::new().unwrap();
        let pairs = vec![pair(tmp.path(), "a")];
        let uc = batch(Arc::new(Mutex::new(Vec::new())));
        uc.execute(&pairs, &mut MemoryPipelineLogger::new());
        uc.execute(&pairs, &mut MemoryPipelineLogger::new());

        let a_log = fs::read_to_string(tmp.path().join("a.log")).unwrap();
        assert_eq!(a_log.matches("Writing transcription").count(), 2);
    }

    #[test]
    fn test_debug_segments_reach_log_file_only_when_enabled() {
        let tmp = TempDir::new().unwrap();
        let pairs = vec![pair(tmp.path(), "a")];

        batch(Arc::new(Mutex::new(Vec::new())))
            .execute(&pairs, &mut MemoryPipelineLogger::new());
        let quiet = fs::read_to_string(tmp.path().join("a.log")).unwrap();
        assert!(!quiet.contains("hello"));

        batch(Arc::new(Mutex::new(Vec::new())))
            .with_log_level(LevelFilter::Debug)
            .execute(&pairs, &mut MemoryPipelineLogger::new());
        let verbose = fs::read_to_string(tmp.path().join("a.log")).unwrap();
        assert!(verbose.contains(" - DEBUG - 0,1, hello"));
    }

    #[test]
    fn test_missing_log_directory_falls_back_to_parent_logger() {
        let tmp = TempDir::new().unwrap();
        let pairs = vec![pair(&tmp.path().join("gone"), "a")];
        let mut logger = MemoryPipelineLogger::new();
        let report = batch(Arc::new(Mutex::new(Vec::new()))).execute(&pairs, &mut logger);

        // The transcript dir is created under "gone", so the pair itself succeeds
        assert_eq!(report.succeeded.len(), 1);
        assert!(logger.messages_at(Level::Warn)[0].starts_with("Could not open log file"));
    }

    #[test]
    fn test_empty_batch() {
        let report = batch(Arc::new(Mutex::new(Vec::new())))
            .execute(&[], &mut MemoryPipelineLogger::new());
        assert_eq!(report.total(), 0);
        assert!(report.is_clean());
    }
}
