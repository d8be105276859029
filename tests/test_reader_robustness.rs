//! Malformed input never panics the reader; it degrades to errors or empty
//! results.

use pdf_engine::{CompressionLevel, Document, DocumentConfig, Error, RawDocument, ReaderOptions};
use proptest::prelude::*;

fn sample() -> Vec<u8> {
    let mut doc = Document::new(DocumentConfig::new().with_compression(CompressionLevel::None)).unwrap();
    doc.add_page().unwrap();
    doc.set_font("Helvetica", 12.0).unwrap();
    doc.text(72.0, 72.0, "Robust text").unwrap();
    doc.add_bookmark("Start", 0, None).unwrap();
    doc.add_page().unwrap();
    doc.to_bytes().unwrap()
}

/// Drive every read-side entry point over `raw`.
fn exercise(raw: &RawDocument) {
    let count = raw.page_count();
    for index in 0..count {
        let _ = raw.page_content(index);
        let _ = raw.page_text(index);
    }
    assert!(raw.page(count).is_err());
    let _ = raw.search("text", true);
    let _ = raw.fonts(true);
    let _ = raw.images(true);
    for number in raw.object_numbers().collect::<Vec<_>>() {
        let _ = raw.stream_data(number);
    }
    let _ = raw.to_bytes();
    if count > 0 {
        let _ = raw.select_pages(&[0]);
    }
    let mut copy = raw.clone();
    let _ = copy.clean_content();
    let _ = copy.replace_text("text", "word");
}

mod damaged {
    use super::*;

    #[test]
    fn test_missing_header() {
        assert!(matches!(RawDocument::parse(b"no header here"), Err(Error::InvalidHeader(_))));
        assert!(RawDocument::parse(b"").is_err());
    }

    #[test]
    fn test_header_only() {
        let raw = RawDocument::parse(b"%PDF-1.5\n").unwrap();
        assert_eq!(raw.page_count(), 0);
        assert!(raw.search("x", true).is_empty());
        exercise(&raw);
    }

    #[test]
    fn test_truncated_file() {
        let bytes = sample();
        for cut in [bytes.len() / 4, bytes.len() / 2, bytes.len() - 40] {
            if let Ok(raw) = RawDocument::parse(&bytes[..cut]) {
                exercise(&raw);
            }
        }
    }

    #[test]
    fn test_xref_garbage_ignored() {
        let mut bytes = sample();
        let start = bytes.windows(6).position(|w| w == b"\nxref\n").unwrap();
        for b in &mut bytes[start..start + 20] {
            *b = b'#';
        }
        let raw = RawDocument::parse(&bytes).unwrap();
        assert_eq!(raw.page_count(), 2);
        assert_eq!(raw.search("robust", true).len(), 1);
    }

    #[test]
    fn test_extreme_object_numbers() {
        let data = b"%PDF-1.7\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
            2 0 obj << /Type /Pages /Kids [4294967295 0 R] /Count 1 >> endobj\n\
            4294967295 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 10 10] >> endobj\n\
            trailer << /Root 1 0 R >>\n";
        let raw = RawDocument::parse(data).unwrap();
        assert_eq!(raw.page_count(), 1);
        exercise(&raw);

        let mut copy = raw.clone();
        assert!(copy.set_page_content(0, b"0 0 m S".to_vec()).is_err());
        let bytes = raw.to_bytes().unwrap();
        assert!(bytes.len() < 1024);
        assert_eq!(RawDocument::parse(&bytes).unwrap().page_count(), 1);
    }

    #[test]
    fn test_object_limit() {
        let bytes = sample();
        let raw = RawDocument::parse_with(&bytes, ReaderOptions::new().with_max_objects(2)).unwrap();
        assert!(raw.object_count() <= 2);
        exercise(&raw);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_random_bytes_never_panic(tail in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut bytes = b"%PDF-1.4\n".to_vec();
        bytes.extend(tail);
        if let Ok(raw) = RawDocument::parse(&bytes) {
            exercise(&raw);
        }
    }

    #[test]
    fn prop_corrupted_sample_never_panics(flips in proptest::collection::vec((any::<usize>(), any::<u8>()), 1..16)) {
        let mut bytes = sample();
        let len = bytes.len();
        for (at, value) in flips {
            bytes[at % len] = value;
        }
        if let Ok(raw) = RawDocument::parse(&bytes) {
            exercise(&raw);
        }
    }

    #[test]
    fn prop_object_soup_never_panics(
        bodies in proptest::collection::vec("[<>\\[\\]()/0-9 RobjendstrmaPgKidsTypeCnt]{0,40}", 0..12)
    ) {
        let mut bytes = b"%PDF-1.7\n".to_vec();
        for (i, body) in bodies.iter().enumerate() {
            bytes.extend(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).into_bytes());
        }
        bytes.extend(b"trailer\n<< /Root 1 0 R >>\n%%EOF\n");
        if let Ok(raw) = RawDocument::parse(&bytes) {
            exercise(&raw);
        }
    }
}
