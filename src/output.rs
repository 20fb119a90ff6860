//! Result types returned by the conversion entry points.

use crate::pipeline::assemble::{Orientation, PageSize};
use serde::{Deserialize, Serialize};

/// Prefix added to the source file name for the converted download.
pub const OUTPUT_PREFIX: &str = "dark-mode-";

/// Name used when the source has no usable file name.
pub const FALLBACK_FILE_NAME: &str = "document.pdf";

/// A finished dark-mode document.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// The complete output PDF.
    #[serde(skip)]
    pub pdf: Vec<u8>,
    /// Suggested file name, `dark-mode-<source name>`.
    pub file_name: String,
    /// One entry per output page, in page order.
    pub pages: Vec<PageSummary>,
    /// Metadata of the source document.
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}

/// Geometry of one converted page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    /// 1-indexed page number.
    pub page_num: usize,
    pub width_px: u32,
    pub height_px: u32,
    /// Size of the output page this image was placed on.
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub jpeg_bytes: usize,
}

/// Source document metadata, available without rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Timing and size figures for a conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub render_duration_ms: u64,
    pub transform_duration_ms: u64,
    pub encode_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Download name for a converted file: `dark-mode-<original>`.
///
/// Path components are stripped; an empty name falls back to
/// `document.pdf`.
pub fn output_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_FILE_NAME);
    format!("{OUTPUT_PREFIX}{base}")
}
