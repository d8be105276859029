//! Reader-side edits applied to generated documents.

use pdf_engine::{
    Color, ColorTarget, CompressionLevel, Document, DocumentConfig, Error, PaintStyle, RawDocument, Rect,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One line of text per page: "Page 1", "Page 2", ...
fn numbered(pages: usize, version: &str) -> RawDocument {
    let config = DocumentConfig::new().with_version(version);
    let mut doc = Document::new(config).unwrap();
    for i in 0..pages {
        doc.add_page().unwrap();
        doc.set_font("Helvetica", 14.0).unwrap();
        doc.text(72.0, 72.0, &format!("Page {}", i + 1)).unwrap();
    }
    RawDocument::parse(&doc.to_bytes().unwrap()).unwrap()
}

fn page_texts(raw: &RawDocument) -> Vec<String> {
    (0..raw.page_count()).map(|i| raw.page_text(i).unwrap()).collect()
}

mod search {
    use super::*;

    #[test]
    fn test_positions_in_user_space() {
        init();
        let mut doc = Document::new(DocumentConfig::new()).unwrap();
        doc.add_page().unwrap();
        doc.set_font("Helvetica", 12.0).unwrap();
        doc.text(72.0, 72.0, "Hello World").unwrap();
        doc.add_page().unwrap();
        doc.text(100.0, 200.0, "hello again").unwrap();

        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        let hits = raw.search("hello", true);
        assert_eq!(hits.len(), 2);

        assert_eq!(hits[0].page, 0);
        assert_eq!(hits[0].text, "Hello");
        assert_eq!(hits[0].line, "Hello World");
        assert!((hits[0].x - 72.0).abs() < 1e-6);
        assert!((hits[0].y - (841.89 - 72.0)).abs() < 1e-6);

        assert_eq!(hits[1].page, 1);
        assert_eq!(hits[1].text, "hello");
        assert!((hits[1].x - 100.0).abs() < 1e-6);

        assert_eq!(raw.search("hello", false).len(), 1);
        assert!(raw.search("", true).is_empty());
        assert!(raw.search("absent", true).is_empty());
    }

    #[test]
    fn test_offset_into_line() {
        let mut doc = Document::new(DocumentConfig::new()).unwrap();
        doc.add_page().unwrap();
        doc.set_font("Courier", 10.0).unwrap();
        doc.text(50.0, 50.0, "abc def").unwrap();

        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        let hits = raw.search("def", false);
        assert_eq!(hits.len(), 1);
        // Courier advances 6pt per character at 10pt
        assert!((hits[0].x - 74.0).abs() < 1e-6);
    }
}

mod assembly {
    use super::*;

    #[test]
    fn test_select_reorders() {
        init();
        let raw = numbered(4, "1.7");
        let out = RawDocument::parse(&raw.select_pages(&[3, 0, 3]).unwrap()).unwrap();
        assert_eq!(page_texts(&out), vec!["Page 4", "Page 1", "Page 4"]);
    }

    #[test]
    fn test_delete_pages() {
        let raw = numbered(4, "1.7");
        let out = RawDocument::parse(&raw.delete_pages(&[1, 2]).unwrap()).unwrap();
        assert_eq!(page_texts(&out), vec!["Page 1", "Page 4"]);

        assert!(matches!(raw.delete_pages(&[0, 1, 2, 3]), Err(Error::InvalidArgument(_))));
        assert!(matches!(raw.select_pages(&[9]), Err(Error::PageOutOfRange { .. })));
    }

    #[test]
    fn test_merge_takes_highest_version() {
        let a = numbered(2, "1.4");
        let b = numbered(1, "1.6");
        let merged = RawDocument::parse(&RawDocument::merge(&[&a, &b]).unwrap()).unwrap();
        assert_eq!(merged.version(), "1.6");
        assert_eq!(page_texts(&merged), vec!["Page 1", "Page 2", "Page 1"]);
        assert_eq!(merged.fonts(false).len(), 2);
    }

    #[test]
    fn test_merge_of_nothing_fails() {
        assert!(RawDocument::merge(&[]).is_err());
    }

    #[test]
    fn test_protected_input_refused() {
        let config = DocumentConfig::new().with_protection(pdf_engine::ProtectionConfig::new("u", "o"));
        let mut doc = Document::new(config).unwrap();
        doc.add_page().unwrap();
        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        assert!(raw.is_encrypted());
        assert!(matches!(raw.select_pages(&[0]), Err(Error::Encryption(_))));
    }
}

mod rewriting {
    use super::*;

    #[test]
    fn test_replace_text_then_search() {
        let mut raw = numbered(3, "1.7");
        assert_eq!(raw.replace_text("Page", "Sheet").unwrap(), 3);
        let reparsed = RawDocument::parse(&raw.to_bytes().unwrap()).unwrap();
        assert_eq!(page_texts(&reparsed), vec!["Sheet 1", "Sheet 2", "Sheet 3"]);
        assert!(reparsed.search("page", true).is_empty());
    }

    #[test]
    fn test_content_edits_keep_object_numbers() {
        let mut raw = numbered(2, "1.7");
        let before: Vec<u32> = raw.object_numbers().collect();
        let pages: Vec<_> = raw.pages().into_iter().map(|p| p.object).collect();

        raw.replace_text("Page", "Leaf").unwrap();
        raw.clean_content().unwrap();
        let reparsed = RawDocument::parse(&raw.to_bytes().unwrap()).unwrap();
        assert_eq!(reparsed.object_numbers().collect::<Vec<_>>(), before);
        assert_eq!(reparsed.pages().into_iter().map(|p| p.object).collect::<Vec<_>>(), pages);
    }

    #[test]
    fn test_clean_keeps_text() {
        let mut doc = Document::new(DocumentConfig::new().with_compression(CompressionLevel::None)).unwrap();
        doc.add_page().unwrap();
        doc.set_font("Helvetica", 12.0).unwrap();
        doc.set_line_width(2.0).unwrap();
        doc.set_line_width(3.0).unwrap();
        doc.text(72.0, 72.0, "Keep me").unwrap();
        doc.rect(Rect::new(10.0, 10.0, 20.0, 20.0), PaintStyle::Stroke).unwrap();

        let mut raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        let stats = raw.clean_content().unwrap();
        assert_eq!(stats.pages, 1);
        assert!(stats.operators_after <= stats.operators_before);

        let reparsed = RawDocument::parse(&raw.to_bytes().unwrap()).unwrap();
        assert_eq!(reparsed.page_text(0).unwrap(), "Keep me");
        let content = String::from_utf8(reparsed.page_content(0).unwrap()).unwrap();
        assert!(content.contains(" re"));
    }

    #[test]
    fn test_shared_content_survives_edits() {
        let data = b"%PDF-1.7\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
            2 0 obj << /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /MediaBox [0 0 100 100] >> endobj\n\
            3 0 obj << /Type /Page /Parent 2 0 R /Contents 5 0 R >> endobj\n\
            4 0 obj << /Type /Page /Parent 2 0 R /Contents [5 0 R 6 0 R] >> endobj\n\
            5 0 obj << /Length 23 >>\nstream\n1 0 0 rg 0 0 10 10 re f\nendstream\nendobj\n\
            6 0 obj << /Length 13 >>\nstream\n5 5 m 9 9 l S\nendstream\nendobj\n\
            trailer << /Root 1 0 R >>\n";
        let mut raw = RawDocument::parse(data).unwrap();
        assert_eq!(raw.convert_colorspace(ColorTarget::Gray).unwrap(), 2);
        raw.clean_content().unwrap();

        let reparsed = RawDocument::parse(&raw.to_bytes().unwrap()).unwrap();
        let first = String::from_utf8(reparsed.page_content(0).unwrap()).unwrap();
        let second = String::from_utf8(reparsed.page_content(1).unwrap()).unwrap();
        assert!(first.contains("0.299 g"));
        assert!(!first.contains("5 5 m"));
        assert!(second.contains("0.299 g"));
        assert!(second.contains("5 5 m"));
    }

    #[test]
    fn test_colorspace_to_gray() {
        let mut doc = Document::new(DocumentConfig::new().with_compression(CompressionLevel::None)).unwrap();
        doc.add_page().unwrap();
        doc.set_fill_color(Color::Rgb(1.0, 0.0, 0.0)).unwrap();
        doc.set_stroke_color(Color::Cmyk(0.0, 0.0, 0.0, 1.0)).unwrap();
        doc.rect(Rect::new(10.0, 10.0, 20.0, 20.0), PaintStyle::FillStroke).unwrap();

        let mut raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(raw.convert_colorspace(ColorTarget::Gray).unwrap(), 2);
        let content = String::from_utf8(raw.page_content(0).unwrap()).unwrap();
        assert!(content.contains("0.299 g"));
        assert!(content.contains("0 G"));
        assert!(!content.contains("rg"));
        assert_eq!(raw.convert_colorspace(ColorTarget::Gray).unwrap(), 0);
    }
}
