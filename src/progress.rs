//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline walks the document. Pages are processed strictly in
//! order, so events arrive in page order too.
//!
//! # Example
//!
//! ```rust
//! use pdf_darkmode::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::Arc;
//!
//! struct PrintingCallback;
//!
//! impl ConversionProgressCallback for PrintingCallback {
//!     fn on_progress(&self, percent: f32, status: &str) {
//!         eprintln!("{:>3.0}%  {}", percent, status);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(PrintingCallback) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes the document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// pipeline runs on a blocking worker thread.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the page count is known and validated.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Overall progress: `percent` in 0–100 and a human-readable status.
    ///
    /// Emitted with 0 before the first page, with `page / total × 100`
    /// before each page, and with 100 before finalisation.
    fn on_progress(&self, percent: f32, status: &str) {
        let _ = (percent, status);
    }

    /// Called when a page has been rendered, transformed and appended.
    ///
    /// # Arguments
    /// * `page_num`     - 1-indexed page number
    /// * `total_pages`  - total pages
    /// * `jpeg_bytes`   - size of the encoded page image
    fn on_page_complete(&self, page_num: usize, total_pages: usize, jpeg_bytes: usize) {
        let _ = (page_num, total_pages, jpeg_bytes);
    }

    /// Called once the output document has been finalised.
    fn on_conversion_complete(&self, total_pages: usize, output_bytes: usize) {
        let _ = (total_pages, output_bytes);
    }

    /// Called when the conversion aborts. No output is produced.
    fn on_conversion_failed(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Progress percentage reported before processing `page_num` of `total_pages`.
pub fn page_percent(page_num: usize, total_pages: usize) -> f32 {
    if total_pages == 0 {
        return 0.0;
    }
    (page_num as f32 / total_pages as f32) * 100.0
}

/// Status line reported before processing `page_num` of `total_pages`.
pub fn page_status(page_num: usize, total_pages: usize) -> String {
    format!("Processing page {} of {}...", page_num, total_pages)
}
