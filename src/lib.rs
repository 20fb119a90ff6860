//! # pdf-darkmode
//!
//! Re-render PDF documents in dark mode.
//!
//! Every page is rasterised, its colours are remapped (white backgrounds
//! become near-black, black text becomes near-white, everything in between is
//! inverted) and the result is written out as a new, image-only PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL; validate type/size
//!  ├─ 2. Render     rasterise one page at scale 2.0 via pdfium (spawn_blocking)
//!  ├─ 3. Transform  luminance-gated pixel remap, in place
//!  ├─ 4. Encode     JPEG, quality 95
//!  └─ 5. Assemble   append as a page sized px / 2.835 mm (lopdf), finalise
//! ```
//!
//! Pages are processed strictly in order and a failure on any page aborts the
//! whole conversion.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_darkmode::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("document.pdf", &config).await?;
//!     std::fs::write(&output.file_name, &output.pdf)?; // dark-mode-document.pdf
//!     eprintln!("{} pages in {}ms", output.stats.total_pages, output.stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-darkmode` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-darkmode = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! Rendering needs a pdfium shared library at runtime. It is looked up via
//! `PDFIUM_LIB_PATH`, then in the working directory, then on the system
//! library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PageSizing};
pub use convert::{
    convert, convert_document, convert_from_bytes, convert_sync, convert_to_file, inspect,
    write_atomic,
};
pub use error::DarkModeError;
pub use output::{
    output_file_name, ConversionOutput, ConversionStats, DocumentMetadata, PageSummary,
};
pub use pipeline::assemble::{Orientation, PageSize};
pub use pipeline::render::PageSource;
pub use pipeline::transform::apply_dark_mode_filter;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{ConversionSession, SessionState};
pub use stream::{convert_with_events, ConversionEvent, EventStream};
