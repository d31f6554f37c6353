use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pairing::pair::Pair;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::constants::{ANNOTATION_EXTENSION, AUDIO_EXTENSION};

#[derive(Error, Debug)]
pub enum PairingError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Finds audio/annotation files that share a base name.
///
/// An empty result means nothing matched; an error means the search
/// itself could not be carried out.
#[derive(Clone, Debug)]
pub struct PairingResolver {
    audio_extension: String,
    annotation_extension: String,
}

impl Default for PairingResolver {
    fn default() -> Self {
        Self::new(AUDIO_EXTENSION, ANNOTATION_EXTENSION)
    }
}

impl PairingResolver {
    pub fn new(audio_extension: impl Into<String>, annotation_extension: impl Into<String>) -> Self {
        Self {
            audio_extension: audio_extension.into(),
            annotation_extension: annotation_extension.into(),
        }
    }

    /// Resolves pairs for a single file (any sibling extension) or a directory.
    pub fn resolve(
        &self,
        path: &Path,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Vec<Pair>, PairingError> {
        if path.is_dir() {
            return self.resolve_dir(path, logger);
        }

        let audio = path.with_extension(&self.audio_extension);
        let annotation = path.with_extension(&self.annotation_extension);

        let audio_exists = audio.is_file();
        let annotation_exists = annotation.is_file();
        if audio_exists && annotation_exists {
            return Ok(vec![Pair::new(audio, annotation)]);
        }

        if !audio_exists {
            logger.warn(&format!(
                "No {} file called {}",
                self.audio_extension,
                audio.display()
            ));
        }
        if !annotation_exists {
            logger.warn(&format!(
                "No {} file called {}",
                self.annotation_extension,
                annotation.display()
            ));
        }
        Ok(Vec::new())
    }

    /// Pairs every audio file directly inside `dir` with its sibling annotation.
    ///
    /// Audio files without an annotation are skipped silently. Results are
    /// sorted by path.
    fn resolve_dir(
        &self,
        dir: &Path,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Vec<Pair>, PairingError> {
        logger.info(&format!(
            "Finding {}/{} pairs in {}",
            self.audio_extension,
            self.annotation_extension,
            dir.display()
        ));

        let read_err = |e| PairingError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        };

        let mut audio_files = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if path.is_file() && path.extension() == Some(OsStr::new(&self.audio_extension)) {
                audio_files.push(path);
            }
        }
        audio_files.sort();

        let pairs: Vec<Pair> = audio_files
            .into_iter()
            .filter_map(|audio| {
                let annotation = audio.with_extension(&self.annotation_extension);
                annotation
                    .is_file()
                    .then(|| Pair::new(audio, annotation))
            })
            .collect();

        logger.info(&format!(
            "{} {}/{} pairs found in {}",
            pairs.len(),
            self.audio_extension,
            self.annotation_extension,
            dir.display()
        ));
        Ok(pairs)
    }
}
