use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("model {0} not found locally and no download URL is configured")]
    NotFound(String),
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a model file, checking local locations before downloading.
///
/// `name` may also be a path to an existing file, which is returned as is.
/// Otherwise lookup order is:
/// 1. User cache directory (platform-specific)
/// 2. `base_dir`, typically the configured `modelBasePath`
/// 3. `{base_url}/{name}`, downloaded into the cache
pub fn resolve(
    name: &str,
    base_url: Option<&str>,
    base_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, name, base_url, base_dir, progress)
}

fn resolve_in(
    cache_dir: &Path,
    name: &str,
    base_url: Option<&str>,
    base_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let direct = Path::new(name);
    if direct.is_absolute() && direct.is_file() {
        return Ok(direct.to_path_buf());
    }

    let cached_path = cache_dir.join(name);
    if cached_path.is_file() {
        log::debug!("Model {name} found in cache");
        return Ok(cached_path);
    }

    if let Some(dir) = base_dir {
        let local_path = dir.join(name);
        if local_path.is_file() {
            log::debug!("Model {name} found in {}", dir.display());
            return Ok(local_path);
        }
    }

    let Some(base_url) = base_url else {
        return Err(ModelResolveError::NotFound(name.to_string()));
    };
    let url = format!("{}/{}", base_url.trim_end_matches('/'), name);
    if let Some(parent) = cached_path.parent() {
        fs::create_dir_all(parent).map_err(ModelResolveError::CacheDir)?;
    }
    log::info!("Downloading {url}");
    download(&url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/posecache/models/`
/// - Linux: `$XDG_CACHE_HOME/posecache/models/` or `~/.cache/posecache/models/`
/// - Windows: `%LOCALAPPDATA%/posecache/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join("posecache").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Streams `url` into `dest` through a sibling `.part` file, renamed into
/// place only once the body is complete.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");
    let result = stream_to(url, &temp_path, progress).and_then(|()| {
        fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
            path: dest.to_path_buf(),
            source: e,
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn stream_to(url: &str, path: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let write_error = |e| ModelResolveError::Write {
        path: path.to_path_buf(),
        source: e,
    };
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut file = fs::File::create(path).map_err(write_error)?;
    let mut buf = vec![0u8; 256 * 1024];
    let mut downloaded: u64 = 0;
    loop {
        let n = response.read(&mut buf).map_err(write_error)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_error)?;
        downloaded += n as u64;
        if let Some(cb) = &progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_error)
}
