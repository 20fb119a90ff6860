//! Configuration types for dark-mode conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The colour transform itself has no
//! knobs; what is configurable is how pages are rasterised, encoded, sized
//! and which inputs are accepted.

use crate::error::DarkModeError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Render scale applied to each page's native size.
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

/// JPEG quality (1–100) for the transformed page images.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Pixels per millimetre used to size output pages from rendered bitmaps.
pub const DEFAULT_PX_PER_MM: f32 = 2.835;

/// Page-count limit checked before any page is rendered.
pub const DEFAULT_MAX_PAGES: usize = 200;

/// Input size limit (50 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Configuration for a dark-mode conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_darkmode::{ConversionConfig, PageSizing};
///
/// let config = ConversionConfig::builder()
///     .render_scale(1.5)
///     .jpeg_quality(90)
///     .page_sizing(PageSizing::MatchFirst)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Scale factor applied to the page's native size when rasterising. Range: 0.25–8.0. Default: 2.0.
    ///
    /// Higher scales give sharper output at proportional memory and time cost.
    pub render_scale: f32,

    /// JPEG quality for page images, 1–100. Default: 95.
    pub jpeg_quality: u8,

    /// Divisor converting rendered pixels to output millimetres. Default: 2.835.
    pub px_per_mm: f32,

    /// How output pages after the first are sized. Default: [`PageSizing::PerPage`].
    pub page_sizing: PageSizing,

    /// Reject documents with more pages than this. Default: 200.
    pub max_pages: usize,

    /// Reject inputs larger than this many bytes. Default: 50 MiB.
    pub max_file_bytes: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Receives per-page progress events. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            render_scale: DEFAULT_RENDER_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            px_per_mm: DEFAULT_PX_PER_MM,
            page_sizing: PageSizing::default(),
            max_pages: DEFAULT_MAX_PAGES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            password: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("render_scale", &self.render_scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("px_per_mm", &self.px_per_mm)
            .field("page_sizing", &self.page_sizing)
            .field("max_pages", &self.max_pages)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(0.25, 8.0);
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn px_per_mm(mut self, px: f32) -> Self {
        self.config.px_per_mm = px;
        self
    }

    pub fn page_sizing(mut self, sizing: PageSizing) -> Self {
        self.config.page_sizing = sizing;
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n.max(1);
        self
    }

    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.config.max_file_bytes = bytes;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, DarkModeError> {
        let c = &self.config;
        if !c.render_scale.is_finite() || c.render_scale <= 0.0 {
            return Err(DarkModeError::InvalidConfig(format!(
                "Render scale must be positive, got {}",
                c.render_scale
            )));
        }
        if !c.px_per_mm.is_finite() || c.px_per_mm <= 0.0 {
            return Err(DarkModeError::InvalidConfig(format!(
                "Pixels per millimetre must be positive, got {}",
                c.px_per_mm
            )));
        }
        if c.max_file_bytes == 0 {
            return Err(DarkModeError::InvalidConfig(
                "Maximum file size must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How pages after the first are sized in the output document.
///
/// The output document's format is fixed from page 1 when it is created.
/// Mixed-size sources (e.g. a landscape insert in a portrait report) either
/// keep their own geometry or are normalised to page 1's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageSizing {
    /// Every output page takes its own source page's size (default).
    #[default]
    PerPage,
    /// Every output page takes page 1's size; images are scaled to fit and
    /// centred, keeping their aspect ratio.
    MatchFirst,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy() {
        let c = ConversionConfig::default();
        assert_eq!(c.render_scale, 2.0);
        assert_eq!(c.jpeg_quality, 95);
        assert_eq!(c.px_per_mm, 2.835);
        assert_eq!(c.max_pages, 200);
        assert_eq!(c.max_file_bytes, 50 * 1024 * 1024);
        assert_eq!(c.page_sizing, PageSizing::PerPage);
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn builder_clamps() {
        let c = ConversionConfig::builder()
            .render_scale(100.0)
            .jpeg_quality(0)
            .max_pages(0)
            .build()
            .unwrap();
        assert_eq!(c.render_scale, 8.0);
        assert_eq!(c.jpeg_quality, 1);
        assert_eq!(c.max_pages, 1);
    }

    #[test]
    fn builder_rejects_bad_px_per_mm() {
        let err = ConversionConfig::builder().px_per_mm(0.0).build().unwrap_err();
        assert!(matches!(err, DarkModeError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_password() {
        let c = ConversionConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn page_sizing_serde_names() {
        let json = serde_json::to_string(&PageSizing::MatchFirst).unwrap();
        assert_eq!(json, "\"match-first\"");
    }
}
