use std::path::{Path, PathBuf};

use crate::shared::constants::{LOG_EXTENSION, TRANSCRIPT_DIR_NAME};

/// An audio file and its time-aligned annotation file, both known to exist.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pair {
    audio: PathBuf,
    annotation: PathBuf,
}

impl Pair {
    pub fn new(audio: impl Into<PathBuf>, annotation: impl Into<PathBuf>) -> Self {
        Self {
            audio: audio.into(),
            annotation: annotation.into(),
        }
    }

    pub fn audio(&self) -> &Path {
        &self.audio
    }

    pub fn annotation(&self) -> &Path {
        &self.annotation
    }

    /// Base name shared by both files.
    pub fn name(&self) -> String {
        self.audio
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// `transcript/` directory beside the audio file.
    pub fn transcript_dir(&self) -> PathBuf {
        self.audio
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(TRANSCRIPT_DIR_NAME)
    }

    /// Where the transcript document is written: same file name as the source annotation.
    pub fn output_path(&self) -> PathBuf {
        let file_name = self
            .annotation
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        self.transcript_dir().join(file_name)
    }

    /// Per-recording log file beside the audio.
    pub fn log_path(&self) -> PathBuf {
        self.audio.with_extension(LOG_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths() {
        let pair = Pair::new("/data/session1.wav", "/data/session1.eaf");
        assert_eq!(pair.name(), "session1");
        assert_eq!(pair.transcript_dir(), PathBuf::from("/data/transcript"));
        assert_eq!(
            pair.output_path(),
            PathBuf::from("/data/transcript/session1.eaf")
        );
        assert_eq!(pair.log_path(), PathBuf::from("/data/session1.log"));
    }

    #[test]
    fn test_relative_paths() {
        let pair = Pair::new("session1.wav", "session1.eaf");
        assert_eq!(pair.transcript_dir(), PathBuf::from("transcript"));
        assert_eq!(pair.output_path(), PathBuf::from("transcript/session1.eaf"));
    }
}
