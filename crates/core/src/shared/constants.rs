/// Sample rate the Whisper models expect; clips are cut at this rate.
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

pub const DEFAULT_WHISPER_MODEL: &str = "large-v2";
pub const DEFAULT_LANGUAGE: &str = "en";

const WHISPER_MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

pub const AUDIO_EXTENSION: &str = "wav";
pub const ANNOTATION_EXTENSION: &str = "eaf";
pub const LOG_EXTENSION: &str = "log";

/// Directory created beside the audio file that receives transcript documents.
pub const TRANSCRIPT_DIR_NAME: &str = "transcript";

/// Tier id EAF tooling puts into a freshly created document.
pub const PLACEHOLDER_TIER_ID: &str = "default";

/// File name of the ggml model with the given name, e.g. `ggml-large-v2.bin`.
pub fn whisper_model_filename(model: &str) -> String {
    format!("ggml-{model}.bin")
}

pub fn whisper_model_url(model: &str) -> String {
    format!("{WHISPER_MODEL_BASE_URL}/{}", whisper_model_filename(model))
}
