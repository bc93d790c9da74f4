//! Input resolution: turn a user-supplied path or URL into bytes + filename.
//!
//! The scanner works on an in-memory buffer, so both sources are read fully.
//! Size is checked against the extraction cap as early as the source allows:
//! local files by metadata before reading, downloads by `Content-Length`
//! before the body and then chunk by chunk while it is received.

use crate::error::PaperLensError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Filename used when a URL path does not end in a usable segment.
pub const FALLBACK_FILENAME: &str = "downloaded.pdf";

/// A document buffer together with the name it was supplied under.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load `input` from disk or over HTTP(S).
///
/// `max_bytes` is enforced here as well as in the extractor so that an
/// oversized download is abandoned as soon as it crosses the limit.
pub async fn load_input(
    input: &str,
    timeout_secs: u64,
    max_bytes: Option<usize>,
) -> Result<LoadedInput, PaperLensError> {
    if is_url(input) {
        download_url(input, timeout_secs, max_bytes).await
    } else {
        load_local(Path::new(input), max_bytes).await
    }
}

async fn load_local(path: &Path, max_bytes: Option<usize>) -> Result<LoadedInput, PaperLensError> {
    let filename = filename_of(path);
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| io_to_input_error(e, path))?;
    if !meta.is_file() {
        return Err(PaperLensError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    check_size(&filename, meta.len() as usize, max_bytes)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| io_to_input_error(e, path))?;
    debug!("Loaded {} bytes from {}", bytes.len(), path.display());
    Ok(LoadedInput { bytes, filename })
}

fn io_to_input_error(e: std::io::Error, path: &Path) -> PaperLensError {
    let path = PathBuf::from(path);
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => PaperLensError::PermissionDenied { path },
        _ => PaperLensError::FileNotFound { path },
    }
}

fn filename_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn check_size(filename: &str, size: usize, max_bytes: Option<usize>) -> Result<(), PaperLensError> {
    match max_bytes {
        Some(limit) if size > limit => Err(PaperLensError::InputTooLarge {
            filename: filename.to_string(),
            size,
            limit,
        }),
        _ => Ok(()),
    }
}

async fn download_url(
    url: &str,
    timeout_secs: u64,
    max_bytes: Option<usize>,
) -> Result<LoadedInput, PaperLensError> {
    info!("Downloading document from: {}", url);

    let failed = |reason: String| PaperLensError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let map_reqwest = |e: reqwest::Error| {
        if e.is_timeout() {
            PaperLensError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    let mut response = client.get(url).send().await.map_err(&map_reqwest)?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let filename = filename_from_url(url);
    if let Some(len) = response.content_length() {
        check_size(&filename, len as usize, max_bytes)?;
    }

    // Chunked responses carry no length, so the cap is applied as data arrives.
    let mut bytes = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
    while let Some(chunk) = response.chunk().await.map_err(&map_reqwest)? {
        append_capped(&mut bytes, &chunk, &filename, max_bytes)?;
    }

    info!("Downloaded {} bytes as {}", bytes.len(), filename);
    Ok(LoadedInput { bytes, filename })
}

/// Append `chunk` to `buf`, failing once the total would exceed `max_bytes`.
fn append_capped(
    buf: &mut Vec<u8>,
    chunk: &[u8],
    filename: &str,
    max_bytes: Option<usize>,
) -> Result<(), PaperLensError> {
    check_size(filename, buf.len() + chunk.len(), max_bytes)?;
    buf.extend_from_slice(chunk);
    Ok(())
}

/// Last non-empty path segment of `url` when it looks like a filename.
pub fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}
