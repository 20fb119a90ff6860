//! Input resolution and upload validation.
//!
//! The user-supplied input is either a local path or an HTTP/HTTPS URL; URLs
//! are downloaded into a `TempDir` that lives as long as the
//! [`ResolvedInput`]. pdfium needs a real file path, so both cases end up as a
//! path on disk.
//!
//! Before any page is inspected the input must pass [`validate_upload`]: its
//! media type (sniffed from the leading bytes, never from the extension) must
//! be `application/pdf` and its size must be within the configured limit.

use crate::config::ConversionConfig;
use crate::error::DarkModeError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Media type accepted by the converter.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A local file ready to be opened, with the facts validation needs.
#[derive(Debug)]
pub struct ResolvedInput {
    path: PathBuf,
    file_name: String,
    media_type: String,
    size_bytes: u64,
    /// Keeps a downloaded file alive until processing completes.
    _temp_dir: Option<TempDir>,
}

impl ResolvedInput {
    /// Path to the file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Original file name (last path or URL segment).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Media type sniffed from the content.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Apply [`validate_upload`] to this input.
    pub fn validate(&self, config: &ConversionConfig) -> Result<(), DarkModeError> {
        validate_upload(&self.file_name, &self.media_type, self.size_bytes, config)
    }
}

/// Reject inputs that are not PDFs or are too large.
///
/// Checks run in order: media type first, then size.
pub fn validate_upload(
    name: &str,
    media_type: &str,
    size_bytes: u64,
    config: &ConversionConfig,
) -> Result<(), DarkModeError> {
    if media_type != PDF_MEDIA_TYPE {
        warn!("Rejected '{}': media type {}", name, media_type);
        return Err(DarkModeError::InvalidMediaType {
            name: name.to_string(),
            media_type: media_type.to_string(),
        });
    }
    if size_bytes > config.max_file_bytes {
        warn!("Rejected '{}': {} bytes", name, size_bytes);
        return Err(DarkModeError::FileTooLarge {
            name: name.to_string(),
            size_bytes,
            limit_bytes: config.max_file_bytes,
        });
    }
    Ok(())
}

/// Guess a media type from the first bytes of a file.
///
/// PDFs are recognised by their `%PDF` header; common image formats via
/// `image::guess_format`; anything else is `application/octet-stream`.
pub fn sniff_media_type(head: &[u8]) -> String {
    if head.starts_with(b"%PDF") {
        return PDF_MEDIA_TYPE.to_string();
    }
    match image::guess_format(head) {
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => "application/octet-stream".to_string(),
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local file.
///
/// URLs are downloaded (honouring `config.download_timeout_secs` and
/// refusing bodies larger than `config.max_file_bytes`); local paths must
/// exist and be readable. Validation is left to the caller.
pub async fn resolve_input(
    input: &str,
    config: &ConversionConfig,
) -> Result<ResolvedInput, DarkModeError> {
    if input.trim().is_empty() {
        return Err(DarkModeError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, config).await
    } else {
        resolve_local(input)
    }
}

/// Materialise in-memory PDF bytes as a temp file named `file_name`.
///
/// The bytes are validated before anything touches the disk.
pub fn resolve_bytes(
    bytes: &[u8],
    file_name: &str,
    config: &ConversionConfig,
) -> Result<ResolvedInput, DarkModeError> {
    let file_name = match file_name.rsplit(['/', '\\']).next().map(str::trim) {
        Some(n) if !n.is_empty() && n != "." && n != ".." => n.to_string(),
        _ => crate::output::FALLBACK_FILE_NAME.to_string(),
    };
    let media_type = sniff_media_type(&bytes[..bytes.len().min(16)]);
    validate_upload(&file_name, &media_type, bytes.len() as u64, config)?;

    let temp_dir = TempDir::new().map_err(|e| DarkModeError::Internal(format!("tempdir: {e}")))?;
    let path = temp_dir.path().join(&file_name);
    std::fs::write(&path, bytes)
        .map_err(|e| DarkModeError::Internal(format!("tempfile write: {e}")))?;

    Ok(ResolvedInput {
        path,
        file_name,
        media_type,
        size_bytes: bytes.len() as u64,
        _temp_dir: Some(temp_dir),
    })
}

/// Resolve a local file path, reading its size and leading bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, DarkModeError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(DarkModeError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DarkModeError::PermissionDenied { path });
        }
        Err(_) => return Err(DarkModeError::FileNotFound { path }),
    };

    let size_bytes = file
        .metadata()
        .map_err(|e| DarkModeError::Internal(format!("Failed to stat '{}': {e}", path.display())))?
        .len();

    let mut head = Vec::with_capacity(16);
    file.by_ref()
        .take(16)
        .read_to_end(&mut head)
        .map_err(|e| DarkModeError::Internal(format!("Failed to read '{}': {e}", path.display())))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!("Resolved local input: {} ({} bytes)", path.display(), size_bytes);
    Ok(ResolvedInput {
        media_type: sniff_media_type(&head),
        path,
        file_name,
        size_bytes,
        _temp_dir: None,
    })
}

/// Download a URL to a temporary directory.
async fn download_url(
    url: &str,
    config: &ConversionConfig,
) -> Result<ResolvedInput, DarkModeError> {
    info!("Downloading PDF from: {}", url);
    let timeout_secs = config.download_timeout_secs;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DarkModeError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let download_error = |e: reqwest::Error| {
        if e.is_timeout() {
            DarkModeError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DarkModeError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let mut response = client.get(url).send().await.map_err(download_error)?;

    if !response.status().is_success() {
        return Err(DarkModeError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let file_name = extract_filename(url);

    // Refuse early when the server announces an oversized body.
    if let Some(len) = response.content_length() {
        if len > config.max_file_bytes {
            return Err(DarkModeError::FileTooLarge {
                name: file_name,
                size_bytes: len,
                limit_bytes: config.max_file_bytes,
            });
        }
    }

    // Chunked bodies carry no length up front: enforce the limit as they arrive.
    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(download_error)? {
        let received = (bytes.len() + chunk.len()) as u64;
        if received > config.max_file_bytes {
            warn!(
                "Download of {} exceeded {} bytes, aborting",
                url, config.max_file_bytes
            );
            return Err(DarkModeError::FileTooLarge {
                name: file_name,
                size_bytes: received,
                limit_bytes: config.max_file_bytes,
            });
        }
        bytes.extend_from_slice(&chunk);
    }

    let temp_dir = TempDir::new().map_err(|e| DarkModeError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&file_name);
    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| DarkModeError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput {
        path: file_path,
        file_name,
        media_type: sniff_media_type(&bytes[..bytes.len().min(16)]),
        size_bytes: bytes.len() as u64,
        _temp_dir: Some(temp_dir),
    })
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
