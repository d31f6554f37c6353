use std::path::{Path, PathBuf};

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::audio::domain::transcript::TranscriptSegment;
use crate::shared::compute_device::ComputeDevice;
use crate::shared::constants::{DEFAULT_LANGUAGE, WHISPER_SAMPLE_RATE};

/// Inference settings for [`WhisperRecognizer`].
#[derive(Clone, Debug)]
pub struct WhisperOptions {
    /// Spoken language code; `None` lets Whisper detect it per clip.
    pub language: Option<String>,
    pub device: ComputeDevice,
    pub threads: usize,
}

impl Default for WhisperOptions {
    fn default() -> Self {
        Self {
            language: Some(DEFAULT_LANGUAGE.to_string()),
            device: ComputeDevice::detect(),
            threads: num_cpus().min(4),
        }
    }
}

/// Speech recognizer using whisper.cpp via whisper-rs.
///
/// The model is loaded once in [`WhisperRecognizer::new`]; every call to
/// `transcribe` runs on a fresh inference state, so clips never share context.
pub struct WhisperRecognizer {
    model_path: PathBuf,
    context: WhisperContext,
    options: WhisperOptions,
}

impl WhisperRecognizer {
    pub fn new(model_path: &Path, options: WhisperOptions) -> Result<Self, Box<dyn std::error::Error>> {
        if !model_path.exists() {
            return Err(format!("Whisper model not found at: {}", model_path.display()).into());
        }

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(options.device.uses_gpu());

        let context = WhisperContext::new_with_params(
            model_path.to_str().ok_or("Invalid model path")?,
            ctx_params,
        )
        .map_err(|e| format!("Failed to load Whisper model: {e}"))?;

        Ok(Self {
            model_path: model_path.to_path_buf(),
            context,
            options,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn options(&self) -> &WhisperOptions {
        &self.options
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(
        &self,
        audio: &AudioSegment,
    ) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>> {
        if audio.sample_rate() != WHISPER_SAMPLE_RATE {
            return Err(format!(
                "Whisper expects {WHISPER_SAMPLE_RATE} Hz audio, got {} Hz",
                audio.sample_rate()
            )
            .into());
        }

        let mut state = self
            .context
            .create_state()
            .map_err(|e| format!("Failed to create Whisper state: {e}"))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(self.options.language.as_deref());
        params.set_translate(false);
        params.set_no_context(true);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(self.options.threads.max(1) as i32);

        state
            .full(params, audio.samples())
            .map_err(|e| format!("Whisper inference failed: {e}"))?;

        let mut segments = Vec::new();
        let num_segments = state.full_n_segments();

        for seg_idx in 0..num_segments {
            let segment = match state.get_segment(seg_idx) {
                Some(s) => s,
                None => continue,
            };

            let text = segment
                .to_str()
                .map_err(|e| format!("Invalid segment text: {e}"))?
                .trim();
            if text.is_empty() {
                continue;
            }

            // Segment timestamps are in centiseconds (10ms units)
            segments.push(TranscriptSegment::new(
                text,
                segment.start_timestamp() as f64 / 100.0,
                segment.end_timestamp() as f64 / 100.0,
            ));
        }

        Ok(segments)
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::{whisper_model_filename, whisper_model_url};
    use crate::shared::model_resolver;

    #[test]
    fn test_new_nonexistent_path_error_message() {
        let result = WhisperRecognizer::new(
            Path::new("/nonexistent/ggml-tiny.en.bin"),
            WhisperOptions::default(),
        );
        let err = result.err().expect("expected an error").to_string();
        assert!(
            err.contains("not found"),
            "Expected 'not found' in error, got: {err}"
        );
    }

    #[test]
    fn test_default_options() {
        let options = WhisperOptions::default();
        assert_eq!(options.language.as_deref(), Some("en"));
        assert!(options.threads >= 1 && options.threads <= 4);
    }

    #[test]
    #[ignore] // Downloads the tiny.en model
    fn test_transcribe_does_not_crash_on_sine_wave() {
        let model_path = model_resolver::resolve(
            &whisper_model_filename("tiny.en"),
            &whisper_model_url("tiny.en"),
            None,
            None,
        )
        .expect("Failed to resolve whisper model");

        let options = WhisperOptions {
            device: ComputeDevice::Cpu,
            ..WhisperOptions::default()
        };
        let recognizer = WhisperRecognizer::new(&model_path, options).expect("Failed to load model");

        let len = 3 * WHISPER_SAMPLE_RATE as usize;
        let samples: Vec<f32> = (0..len)
            .map(|i| {
                let t = i as f64 / WHISPER_SAMPLE_RATE as f64;
                (2.0 * std::f64::consts::PI * 440.0 * t).sin() as f32
            })
            .collect();
        let audio = AudioSegment::new(samples, WHISPER_SAMPLE_RATE);

        let result = recognizer.transcribe(&audio);
        assert!(result.is_ok(), "Transcription should not error: {:?}", result.err());
    }

    #[test]
    #[ignore] // Downloads the tiny.en model
    fn test_transcribe_rejects_wrong_sample_rate() {
        let model_path = model_resolver::resolve(
            &whisper_model_filename("tiny.en"),
            &whisper_model_url("tiny.en"),
            None,
            None,
        )
        .expect("Failed to resolve whisper model");
        let recognizer =
            WhisperRecognizer::new(&model_path, WhisperOptions::default()).expect("load model");

        let audio = AudioSegment::new(vec![0.0; 44100], 44100);
        assert!(recognizer.transcribe(&audio).is_err());
    }
}
