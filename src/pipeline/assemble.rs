//! Output document assembly on top of `lopdf`.
//!
//! The output is an image-only PDF: every page carries a single JPEG image
//! XObject drawn by a `q w 0 0 h x y cm /Im Do Q` content stream. Geometry is
//! expressed in millimetres (top-left origin) and converted to PDF points
//! (bottom-left origin) when written.
//!
//! The document is created from the first page's orientation and size; those
//! become its default `format`. Every later page is added with an explicit
//! size, so pages of mixed geometry keep their own MediaBox.

use crate::error::DarkModeError;
use crate::pipeline::encode::EncodedPage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// PDF points per millimetre (72 pt per inch / 25.4 mm per inch).
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// Page orientation of the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Landscape if strictly wider than tall, portrait otherwise (squares
    /// included).
    pub fn for_dimensions(width: f32, height: f32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    /// Swap `size` if needed so it matches this orientation.
    pub fn orient(self, size: PageSize) -> PageSize {
        let wide = size.width_mm > size.height_mm;
        match (self, wide) {
            (Orientation::Landscape, false) | (Orientation::Portrait, true) => PageSize {
                width_mm: size.height_mm,
                height_mm: size.width_mm,
            },
            _ => size,
        }
    }
}

/// Physical page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageSize {
    /// Size a page from rendered pixel dimensions.
    pub fn from_pixels(width_px: u32, height_px: u32, px_per_mm: f32) -> Self {
        Self {
            width_mm: width_px as f32 / px_per_mm,
            height_mm: height_px as f32 / px_per_mm,
        }
    }

    /// `[0, 0, w, h]` in PDF points.
    fn media_box(&self) -> Vec<Object> {
        vec![
            0.into(),
            0.into(),
            (self.width_mm * PT_PER_MM).into(),
            (self.height_mm * PT_PER_MM).into(),
        ]
    }
}

/// Where an image is drawn on its page, in millimetres from the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl Placement {
    /// Fill `page` exactly: origin (0, 0), image size equal to page size.
    pub fn fill(page: PageSize) -> Self {
        Self {
            x_mm: 0.0,
            y_mm: 0.0,
            width_mm: page.width_mm,
            height_mm: page.height_mm,
        }
    }

    /// Largest box with the image's aspect ratio that fits `page`, centred.
    pub fn fit(page: PageSize, image_width_px: u32, image_height_px: u32) -> Self {
        if image_width_px == 0 || image_height_px == 0 {
            return Self::fill(page);
        }
        let scale = (page.width_mm / image_width_px as f32)
            .min(page.height_mm / image_height_px as f32);
        let width_mm = image_width_px as f32 * scale;
        let height_mm = image_height_px as f32 * scale;
        Self {
            x_mm: (page.width_mm - width_mm) / 2.0,
            y_mm: (page.height_mm - height_mm) / 2.0,
            width_mm,
            height_mm,
        }
    }
}

struct PendingPage {
    size: PageSize,
    operations: Vec<Operation>,
    xobjects: lopdf::Dictionary,
}

/// An accumulating image-only PDF.
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    orientation: Orientation,
    format: PageSize,
    page_ids: Vec<ObjectId>,
    current: Option<PendingPage>,
    image_count: usize,
}

impl OutputDocument {
    /// Create a document whose first page has `format`, oriented as given.
    pub fn new(orientation: Orientation, format: PageSize) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let format = orientation.orient(format);
        debug!(
            "Output document: {:?} {:.1}x{:.1} mm",
            orientation, format.width_mm, format.height_mm
        );
        Self {
            doc,
            pages_id,
            orientation,
            format,
            page_ids: Vec::new(),
            current: Some(PendingPage::new(format)),
            image_count: 0,
        }
    }

    /// Orientation fixed at creation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Page format fixed at creation (page 1's size).
    pub fn format(&self) -> PageSize {
        self.format
    }

    /// Pages added so far, including the current one.
    pub fn page_count(&self) -> usize {
        self.page_ids.len() + usize::from(self.current.is_some())
    }

    /// Close the current page and start a new one of `size`.
    pub fn add_page(&mut self, size: PageSize) -> Result<(), DarkModeError> {
        self.flush_page()?;
        self.current = Some(PendingPage::new(size));
        Ok(())
    }

    /// Draw a JPEG image on the current page.
    pub fn add_image(
        &mut self,
        image: &EncodedPage,
        placement: Placement,
    ) -> Result<(), DarkModeError> {
        let page = self.current.as_mut().ok_or_else(|| {
            DarkModeError::AssemblyFailed("no open page to place the image on".into())
        })?;

        let image_id = self.doc.add_object(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => image.width_px as i64,
                    "Height" => image.height_px as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                image.jpeg.clone(),
            )
            .with_compression(false),
        );

        self.image_count += 1;
        let name = format!("Im{}", self.image_count);
        page.xobjects.set(name.as_bytes().to_vec(), image_id);

        let w = placement.width_mm * PT_PER_MM;
        let h = placement.height_mm * PT_PER_MM;
        let x = placement.x_mm * PT_PER_MM;
        // PDF y grows upwards from the bottom edge.
        let y = (page.size.height_mm - placement.y_mm - placement.height_mm) * PT_PER_MM;

        page.operations.push(Operation::new("q", vec![]));
        page.operations.push(Operation::new(
            "cm",
            vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()],
        ));
        page.operations
            .push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        page.operations.push(Operation::new("Q", vec![]));
        Ok(())
    }

    /// Serialise the finished document.
    pub fn finish(mut self) -> Result<Vec<u8>, DarkModeError> {
        self.flush_page()?;

        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Producer" => Object::string_literal(concat!("pdf-darkmode ", env!("CARGO_PKG_VERSION"))),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);

        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| DarkModeError::AssemblyFailed(format!("failed to serialise PDF: {e}")))?;
        debug!("Finalised output PDF: {} pages, {} bytes", count, out.len());
        Ok(out)
    }

    fn flush_page(&mut self) -> Result<(), DarkModeError> {
        let Some(page) = self.current.take() else {
            return Ok(());
        };

        let content = Content {
            operations: page.operations,
        }
        .encode()?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => page.size.media_box(),
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => page.xobjects,
            },
        });
        self.page_ids.push(page_id);
        Ok(())
    }
}

impl PendingPage {
    fn new(size: PageSize) -> Self {
        Self {
            size,
            operations: Vec::new(),
            xobjects: lopdf::Dictionary::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(w: u32, h: u32) -> EncodedPage {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([26, 26, 26, 255]));
        crate::pipeline::encode::encode_page(&img, 80).unwrap()
    }

    fn media_boxes(bytes: &[u8]) -> Vec<Vec<f32>> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|&id| {
                doc.get_dictionary(id)
                    .unwrap()
                    .get(b"MediaBox")
                    .unwrap()
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|o| o.as_float().unwrap())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn orientation_rule() {
        assert_eq!(Orientation::for_dimensions(3.0, 2.0), Orientation::Landscape);
        assert_eq!(Orientation::for_dimensions(2.0, 3.0), Orientation::Portrait);
        assert_eq!(Orientation::for_dimensions(2.0, 2.0), Orientation::Portrait);
    }

    #[test]
    fn document_keeps_creation_orientation() {
        let letter = PageSize {
            width_mm: 215.9,
            height_mm: 279.4,
        };
        let doc = OutputDocument::new(Orientation::Landscape, letter);
        assert_eq!(doc.orientation(), Orientation::Landscape);
        assert_eq!(
            (doc.format().width_mm, doc.format().height_mm),
            (279.4, 215.9)
        );
    }

    #[test]
    fn orient_swaps_mismatched_sizes() {
        let tall = PageSize {
            width_mm: 100.0,
            height_mm: 200.0,
        };
        let wide = Orientation::Landscape.orient(tall);
        assert_eq!((wide.width_mm, wide.height_mm), (200.0, 100.0));
        assert_eq!(Orientation::Portrait.orient(tall), tall);
    }

    #[test]
    fn page_size_from_pixels() {
        let s = PageSize::from_pixels(2835, 5670, 2.835);
        assert!((s.width_mm - 1000.0).abs() < 1e-3);
        assert!((s.height_mm - 2000.0).abs() < 1e-3);
    }

    #[test]
    fn fit_preserves_aspect_and_centres() {
        let page = PageSize {
            width_mm: 200.0,
            height_mm: 100.0,
        };
        let p = Placement::fit(page, 100, 100);
        assert_eq!((p.width_mm, p.height_mm), (100.0, 100.0));
        assert_eq!((p.x_mm, p.y_mm), (50.0, 0.0));
    }

    #[test]
    fn single_page_document() {
        let size = PageSize {
            width_mm: 210.0,
            height_mm: 297.0,
        };
        let mut out = OutputDocument::new(Orientation::Portrait, size);
        out.add_image(&jpeg(4, 6), Placement::fill(size)).unwrap();
        assert_eq!(out.page_count(), 1);
        let bytes = out.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let boxes = media_boxes(&bytes);
        assert_eq!(boxes.len(), 1);
        assert!((boxes[0][2] - 210.0 * PT_PER_MM).abs() < 0.01);
        assert!((boxes[0][3] - 297.0 * PT_PER_MM).abs() < 0.01);
    }

    #[test]
    fn pages_keep_their_own_size() {
        let first = PageSize {
            width_mm: 100.0,
            height_mm: 150.0,
        };
        let second = PageSize {
            width_mm: 150.0,
            height_mm: 100.0,
        };
        let mut out = OutputDocument::new(Orientation::Portrait, first);
        out.add_image(&jpeg(2, 3), Placement::fill(first)).unwrap();
        out.add_page(second).unwrap();
        out.add_image(&jpeg(3, 2), Placement::fill(second)).unwrap();
        assert_eq!(out.format(), first);
        let bytes = out.finish().unwrap();

        let boxes = media_boxes(&bytes);
        assert_eq!(boxes.len(), 2);
        assert!(boxes[0][3] > boxes[0][2]);
        assert!(boxes[1][2] > boxes[1][3]);
    }

    #[test]
    fn image_stream_is_embedded_as_dct() {
        let size = PageSize {
            width_mm: 10.0,
            height_mm: 10.0,
        };
        let img = jpeg(5, 5);
        let mut out = OutputDocument::new(Orientation::Portrait, size);
        out.add_image(&img, Placement::fill(size)).unwrap();
        let bytes = out.finish().unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let stream = doc
            .objects
            .values()
            .find_map(|o| match o {
                Object::Stream(s)
                    if s.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(&b"Image"[..]) =>
                {
                    Some(s)
                }
                _ => None,
            })
            .expect("image stream");
        assert_eq!(stream.content, img.jpeg);
        assert_eq!(
            stream.dict.get(b"Filter").and_then(Object::as_name).unwrap(),
            b"DCTDecode"
        );
    }
}
