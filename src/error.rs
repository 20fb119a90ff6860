//! Error types for the pdf-darkmode library.
//!
//! A conversion either produces a complete dark-mode document or nothing at
//! all, so there is a single fatal error type, [`DarkModeError`]. A failure on
//! any page (render, encode, assembly) aborts the whole run; callers never see
//! a half-built document.
//!
//! Variants are grouped by the stage that raises them:
//!
//! * input validation: media type, size, page-count policy
//! * PDF access: corrupt file, passwords, pdfium binding
//! * per-page work: rasterisation, JPEG encoding, document assembly
//! * output and configuration

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-darkmode library.
#[derive(Debug, Error)]
pub enum DarkModeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The input was read but its content is not a PDF.
    #[error("'{name}' is not a PDF (detected {media_type}).\nPlease select a valid PDF file.")]
    InvalidMediaType { name: String, media_type: String },

    /// The input exceeds the configured size limit.
    #[error("'{name}' is too large: {size_bytes} bytes (limit {limit_bytes} bytes)")]
    FileTooLarge {
        name: String,
        size_bytes: u64,
        limit_bytes: u64,
    },

    /// The document has more pages than the configured limit.
    #[error("PDF has {pages} pages. Maximum is {limit} pages")]
    TooManyPages { pages: usize, limit: usize },

    /// The document opened but contains no pages.
    #[error("PDF '{name}' contains no pages")]
    EmptyDocument { name: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Install pdfium so it is found on the system library path.\n\
  • Place libpdfium next to the working directory.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    LibraryUnavailable(String),

    // ── Page errors ───────────────────────────────────────────────────────
    /// pdfium (or another page source) failed to rasterise a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// A transformed page could not be JPEG-encoded.
    #[error("Image encoding failed for page {page}: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The output document could not be built or serialised.
    #[error("Failed to assemble output PDF: {0}")]
    AssemblyFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A session operation was called before its prerequisite step.
    #[error("{0}")]
    InvalidState(&'static str),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DarkModeError {
    /// True for errors raised by input validation, before any page is touched.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            DarkModeError::InvalidMediaType { .. }
                | DarkModeError::FileTooLarge { .. }
                | DarkModeError::TooManyPages { .. }
                | DarkModeError::EmptyDocument { .. }
        )
    }
}

impl From<lopdf::Error> for DarkModeError {
    fn from(e: lopdf::Error) -> Self {
        DarkModeError::AssemblyFailed(e.to_string())
    }
}
