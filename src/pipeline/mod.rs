//! Pipeline stages for dark-mode conversion.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the rasteriser can be swapped without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ transform ──▶ encode ──▶ assemble
//! (path/URL) (pdfium)  (pixel remap)  (JPEG)    (lopdf)
//! ```
//!
//! 1. [`input`]     - resolve the path or URL to a local file and validate it
//! 2. [`render`]    - rasterise one page at a time through a [`render::PageSource`]
//! 3. [`transform`] - luminance-gated colour remap, in place
//! 4. [`encode`]    - JPEG-encode the transformed bitmap
//! 5. [`assemble`]  - append the image as a page of the output PDF

pub mod assemble;
pub mod encode;
pub mod input;
pub mod render;
pub mod transform;
