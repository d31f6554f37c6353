use super::audio_segment::AudioSegment;
use super::transcript::TranscriptSegment;

/// Domain interface for speech-to-text transcription.
///
/// A recognizer may return zero, one or several segments for a clip.
/// Implementations hold a loaded model and must not keep state between calls.
pub trait SpeechRecognizer: Send {
    fn transcribe(
        &self,
        audio: &AudioSegment,
    ) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>>;
}
