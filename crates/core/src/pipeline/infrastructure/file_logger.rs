use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{Level, LevelFilter};

use crate::pipeline::pipeline_logger::PipelineLogger;

/// An open log file that can be attached to a parent logger.
pub struct LogFile {
    path: PathBuf,
    writer: BufWriter<File>,
    max_level: LevelFilter,
}

impl LogFile {
    /// Opens `path` for appending, creating it if needed.
    pub fn append(path: &Path, max_level: LevelFilter) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            max_level,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tees every message sent to the returned logger into this file.
    ///
    /// The file stays attached only while the returned logger is alive;
    /// dropping it flushes and closes the file.
    pub fn attach(self, inner: &mut dyn PipelineLogger) -> ScopedFileLogger<'_> {
        ScopedFileLogger { inner, file: self }
    }

    fn write_line(&mut self, level: Level, message: &str) {
        if level > self.max_level {
            return;
        }
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        // A failing log file must never abort the work being logged
        let _ = writeln!(
            self.writer,
            "eaf_transcribe - {timestamp} - {level} - {message}"
        );
    }
}

/// Logger that writes to a [`LogFile`] and forwards everything to its parent.
pub struct ScopedFileLogger<'a> {
    inner: &'a mut dyn PipelineLogger,
    file: LogFile,
}

impl ScopedFileLogger<'_> {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl PipelineLogger for ScopedFileLogger<'_> {
    fn log(&mut self, level: Level, message: &str) {
        self.file.write_line(level, message);
        self.inner.log(level, message);
    }

    fn progress(&mut self, label: &str, current: usize, total: usize) {
        self.inner.progress(label, current, total);
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.inner.timing(stage, duration_ms);
    }

    fn summary(&self) {
        self.inner.summary();
    }
}

impl Drop for ScopedFileLogger<'_> {
    fn drop(&mut self) {
        let _ = self.file.writer.flush();
    }
}
