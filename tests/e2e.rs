//! End-to-end integration tests for pdf-darkmode.
//!
//! These run the full pipeline through a real pdfium library on PDFs that
//! are generated on the fly with `lopdf`. They are gated behind the
//! `E2E_ENABLED` environment variable because they need libpdfium at
//! runtime.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_inspect -- --nocapture

use futures::StreamExt;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdf_darkmode::{
    convert, convert_from_bytes, convert_to_file, convert_with_events, inspect, ConversionConfig,
    ConversionEvent, ConversionSession, DarkModeError, Orientation, SessionState,
};
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP - set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

/// Write a PDF whose pages have the given sizes in points, each showing
/// "Page N" in black Helvetica on the default white background.
fn write_sample_pdf(path: &Path, page_sizes: &[(i64, i64)]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for (i, &(w, h)) in page_sizes.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 36.into()]),
                Operation::new("Td", vec![72.into(), (h - 108).into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Page {}", i + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn sample_pdf(dir: &Path, name: &str, page_sizes: &[(i64, i64)]) -> PathBuf {
    let path = dir.join(name);
    write_sample_pdf(&path, page_sizes);
    path
}

const LETTER: (i64, i64) = (612, 792);
const LETTER_LANDSCAPE: (i64, i64) = (792, 612);

// ── Inspect ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_generated_pdf() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = sample_pdf(dir.path(), "three.pdf", &[LETTER; 3]);

    let meta = inspect(path.to_str().unwrap())
        .await
        .expect("inspect() should succeed");
    assert_eq!(meta.page_count, 3);
    assert!(!meta.pdf_version.is_empty());
    println!("Metadata: {:?}", meta);
}

// ── Conversion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_mixed_orientation() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = sample_pdf(dir.path(), "mixed.pdf", &[LETTER, LETTER_LANDSCAPE]);

    let output = convert(path.to_str().unwrap(), &ConversionConfig::default())
        .await
        .expect("conversion should succeed");

    assert_eq!(output.file_name, "dark-mode-mixed.pdf");
    assert_eq!(output.pages.len(), 2);
    assert_eq!(output.metadata.page_count, 2);

    // 612 x 792 pt at scale 2.0.
    let first = &output.pages[0];
    assert_eq!((first.width_px, first.height_px), (1224, 1584));
    assert_eq!(first.orientation, Orientation::Portrait);
    assert_eq!(output.pages[1].orientation, Orientation::Landscape);

    let doc = Document::load_mem(&output.pdf).expect("output parses");
    assert_eq!(doc.get_pages().len(), 2);
    println!("Stats: {:?}", output.stats);
}

#[tokio::test]
async fn test_background_becomes_dark() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = sample_pdf(dir.path(), "one.pdf", &[LETTER]);

    let output = convert(path.to_str().unwrap(), &ConversionConfig::default())
        .await
        .unwrap();

    let doc = Document::load_mem(&output.pdf).unwrap();
    let jpeg = doc
        .objects
        .values()
        .find_map(|o| match o {
            Object::Stream(s) if s.dict.get(b"Filter").and_then(Object::as_name).ok()
                == Some(&b"DCTDecode"[..]) =>
            {
                Some(s.content.clone())
            }
            _ => None,
        })
        .expect("page image");
    let img = image::load_from_memory(&jpeg).unwrap().to_rgb8();

    // Bottom-right corner is empty page background.
    let px = img.get_pixel(img.width() - 10, img.height() - 10);
    for c in px.0 {
        assert!((c as i16 - 26).abs() <= 3, "expected dark background, got {:?}", px.0);
    }
}

#[tokio::test]
async fn test_convert_to_file_writes_pdf() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = sample_pdf(dir.path(), "doc.pdf", &[LETTER]);
    let out_path = dir.path().join("out/dark.pdf");

    let stats = convert_to_file(path.to_str().unwrap(), &out_path, &ConversionConfig::default())
        .await
        .expect("convert_to_file should succeed");

    let bytes = std::fs::read(&out_path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(stats.output_bytes, bytes.len() as u64);
    assert_eq!(stats.total_pages, 1);
}

#[tokio::test]
async fn test_convert_from_bytes() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = sample_pdf(dir.path(), "mem.pdf", &[LETTER, LETTER]);
    let bytes = std::fs::read(&path).unwrap();

    let output = convert_from_bytes(&bytes, "mem.pdf", &ConversionConfig::default())
        .await
        .unwrap();
    assert_eq!(output.file_name, "dark-mode-mem.pdf");
    assert_eq!(output.pages.len(), 2);
    assert_eq!(output.stats.input_bytes, bytes.len() as u64);
}

#[tokio::test]
async fn test_page_limit_enforced() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = sample_pdf(dir.path(), "four.pdf", &[LETTER; 4]);
    let config = ConversionConfig::builder().max_pages(3).build().unwrap();

    let err = convert(path.to_str().unwrap(), &config).await.unwrap_err();
    assert!(matches!(err, DarkModeError::TooManyPages { pages: 4, limit: 3 }));
}

#[tokio::test]
async fn test_password_on_unencrypted_pdf() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = sample_pdf(dir.path(), "open.pdf", &[LETTER]);
    let config = ConversionConfig::builder()
        .password("unused-secret")
        .build()
        .unwrap();

    // pdfium ignores a password the document does not need.
    let output = convert(path.to_str().unwrap(), &config).await.unwrap();
    assert_eq!(output.pages.len(), 1);
}

#[tokio::test]
async fn test_corrupt_pdf() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.pdf");
    std::fs::write(&path, b"%PDF-1.4\nthis is not really a pdf\n").unwrap();

    let err = convert(path.to_str().unwrap(), &ConversionConfig::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, DarkModeError::CorruptPdf { .. }),
        "unexpected error: {err}"
    );
}

// ── Session and events ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_select_convert_save() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = sample_pdf(dir.path(), "report.pdf", &[LETTER]);
    let save_dir = dir.path().join("saved");

    let mut session = ConversionSession::new(ConversionConfig::default());
    session.select(path.to_str().unwrap()).await.unwrap();
    assert_eq!(session.state(), SessionState::Ready);

    let pages = session.convert().await.unwrap().pages.len();
    assert_eq!(pages, 1);
    assert_eq!(session.state(), SessionState::Converted);

    let saved = session.save_to(&save_dir).await.unwrap();
    assert_eq!(saved, save_dir.join("dark-mode-report.pdf"));
    assert!(std::fs::read(&saved).unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_event_stream() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = sample_pdf(dir.path(), "events.pdf", &[LETTER; 2]);

    let (events, handle) =
        convert_with_events(path.to_string_lossy(), &ConversionConfig::default());
    let events: Vec<ConversionEvent> = events.collect().await;
    let output = handle.await.unwrap().unwrap();

    assert_eq!(events.first(), Some(&ConversionEvent::Started { total_pages: 2 }));
    assert_eq!(
        events.last(),
        Some(&ConversionEvent::Completed {
            total_pages: 2,
            output_bytes: output.pdf.len()
        })
    );
    let pages: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ConversionEvent::PageComplete { page_num, .. } => Some(*page_num),
            _ => None,
        })
        .collect();
    assert_eq!(pages, vec![1, 2]);
}
