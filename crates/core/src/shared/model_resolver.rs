use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create model directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read model download from {url}: {source}")]
    Stream {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

const CHUNK_SIZE: usize = 1024 * 1024;

/// Resolve a model file by name, downloading it on a cache miss.
///
/// `model_dir` overrides the per-user cache directory. The file is
/// downloaded to `<name>.part` first and renamed once complete, so an
/// interrupted download never leaves a truncated model behind.
pub fn resolve(
    file_name: &str,
    url: &str,
    model_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let dir = match model_dir {
        Some(dir) => dir.to_path_buf(),
        None => model_cache_dir()?,
    };
    let path = dir.join(file_name);
    if path.exists() {
        return Ok(path);
    }

    fs::create_dir_all(&dir).map_err(|e| ModelResolveError::CacheDir {
        path: dir.clone(),
        source: e,
    })?;
    download(url, &path, progress)?;
    Ok(path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/EAF Transcribe/models/`
/// - Linux: `$XDG_CACHE_HOME/EAF Transcribe/models/` or `~/.cache/EAF Transcribe/models/`
/// - Windows: `%LOCALAPPDATA%/EAF Transcribe/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("EAF Transcribe").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("EAF Transcribe").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let temp_path = dest.with_extension("part");
    if let Err(e) = write_stream(&mut response, url, &temp_path, total, progress.as_ref()) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}

fn write_stream(
    source: &mut impl Read,
    url: &str,
    path: &Path,
    total: u64,
    progress: Option<&ProgressFn>,
) -> Result<(), ModelResolveError> {
    let write_err = |e| ModelResolveError::Write {
        path: path.to_path_buf(),
        source: e,
    };
    let file = fs::File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut downloaded: u64 = 0;
    loop {
        let n = source.read(&mut buf).map_err(|e| ModelResolveError::Stream {
            url: url.to_string(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(downloaded, total);
        }
    }
    writer.flush().map_err(write_err)
}
