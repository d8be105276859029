//! Documents built with `Document` and read back with `RawDocument`.
//!
//! Run with: cargo test --test test_round_trip

use pdf_engine::objects::ImageColorSpace;
use pdf_engine::{
    Color, CompressionLevel, Document, DocumentConfig, DocumentInfo, ImageData, Object, PaintStyle, RawDocument,
    Rect,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config(compression: CompressionLevel) -> DocumentConfig {
    DocumentConfig::new().with_compression(compression)
}

/// Three pages: text on the first, shapes on the second, an image on the third.
fn sample(compression: CompressionLevel) -> Document {
    let mut doc = Document::new(config(compression)).unwrap();
    doc.add_page().unwrap();
    doc.set_font("Helvetica", 12.0).unwrap();
    doc.text(72.0, 72.0, "Hello World").unwrap();
    doc.text(72.0, 100.0, "Second line").unwrap();

    doc.add_page().unwrap();
    doc.set_fill_color(Color::Rgb(1.0, 0.0, 0.0)).unwrap();
    doc.rect(Rect::new(10.0, 10.0, 100.0, 50.0), PaintStyle::Fill).unwrap();
    doc.line(0.0, 0.0, 200.0, 200.0).unwrap();

    doc.add_page().unwrap();
    let pixels = ImageData::raw(2, 2, ImageColorSpace::Rgb, vec![255; 12]).unwrap();
    let handle = doc.add_image(pixels).unwrap();
    doc.image(&handle, Rect::new(50.0, 50.0, 20.0, 20.0)).unwrap();
    doc
}

mod structure {
    use super::*;

    #[test]
    fn test_page_count_survives() {
        init();
        for compression in [CompressionLevel::None, CompressionLevel::Default] {
            let bytes = sample(compression).to_bytes().unwrap();
            let raw = RawDocument::parse(&bytes).unwrap();
            assert_eq!(raw.page_count(), 3);
            assert_eq!(raw.version(), "1.7");
            assert!(!raw.is_encrypted());
        }
    }

    #[test]
    fn test_header_and_trailer() {
        let bytes = sample(CompressionLevel::None).to_bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.ends_with(b"%%EOF\n") || bytes.ends_with(b"%%EOF"));

        let raw = RawDocument::parse(&bytes).unwrap();
        assert!(raw.trailer().contains_key("Root"));
        assert!(raw.trailer().contains_key("Info"));
        assert!(raw.trailer().contains_key("ID"));
    }

    #[test]
    fn test_media_box_is_page_size() {
        let bytes = sample(CompressionLevel::None).to_bytes().unwrap();
        let raw = RawDocument::parse(&bytes).unwrap();
        let page = raw.page(0).unwrap();
        let media = page.media_box.unwrap();
        assert_eq!(media[0], 0.0);
        assert!((media[2] - 595.28).abs() < 1e-6);
        assert!((media[3] - 841.89).abs() < 1e-6);
        assert_eq!(page.rotate, 0);
    }

    #[test]
    fn test_info_dictionary() {
        let config = config(CompressionLevel::None).with_info(DocumentInfo::new().title("Quarterly").author("Ops"));
        let mut doc = Document::new(config).unwrap();
        doc.add_page().unwrap();
        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();

        let info = raw.trailer().get("Info").and_then(Object::as_reference).unwrap();
        let info = raw.dictionary(info.id).unwrap();
        assert_eq!(info.get("Title").and_then(Object::as_string), Some(&b"Quarterly"[..]));
        assert_eq!(info.get("Author").and_then(Object::as_string), Some(&b"Ops"[..]));
    }
}

mod content {
    use super::*;

    #[test]
    fn test_resources_present() {
        let bytes = sample(CompressionLevel::Default).to_bytes().unwrap();
        let raw = RawDocument::parse(&bytes).unwrap();

        let first = raw.page(0).unwrap();
        let fonts = raw.resource_entries(&first.resources, "Font");
        assert_eq!(fonts.len(), 1);

        let third = raw.page(2).unwrap();
        let images = raw.resource_entries(&third.resources, "XObject");
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_content_operators_decode() {
        let bytes = sample(CompressionLevel::Default).to_bytes().unwrap();
        let raw = RawDocument::parse(&bytes).unwrap();

        let text = String::from_utf8(raw.page_content(0).unwrap()).unwrap();
        assert!(text.contains("BT"));
        assert!(text.contains("(Hello World) Tj"));

        let shapes = String::from_utf8(raw.page_content(1).unwrap()).unwrap();
        assert!(shapes.contains("1 0 0 rg"));
        assert!(shapes.contains("10 "));
        assert!(shapes.contains(" re"));

        let image = String::from_utf8(raw.page_content(2).unwrap()).unwrap();
        assert!(image.contains("Do"));
    }

    #[test]
    fn test_compression_only_changes_encoding() {
        let plain = RawDocument::parse(&sample(CompressionLevel::None).to_bytes().unwrap()).unwrap();
        let packed = RawDocument::parse(&sample(CompressionLevel::Default).to_bytes().unwrap()).unwrap();
        for index in 0..3 {
            assert_eq!(plain.page_content(index).unwrap(), packed.page_content(index).unwrap());
        }
    }

    #[test]
    fn test_page_text() {
        let bytes = sample(CompressionLevel::Default).to_bytes().unwrap();
        let raw = RawDocument::parse(&bytes).unwrap();
        let text = raw.page_text(0).unwrap();
        assert!(text.contains("Hello World"));
        assert!(text.contains("Second line"));
        assert_eq!(raw.page_text(1).unwrap(), "");
    }

    #[test]
    fn test_reader_rewrite_is_stable() {
        let bytes = sample(CompressionLevel::Default).to_bytes().unwrap();
        let raw = RawDocument::parse(&bytes).unwrap();
        let again = RawDocument::parse(&raw.to_bytes().unwrap()).unwrap();
        assert_eq!(again.page_count(), 3);
        for index in 0..3 {
            assert_eq!(raw.page_content(index).unwrap(), again.page_content(index).unwrap());
        }
    }
}

mod inventory {
    use super::*;

    #[test]
    fn test_fonts_and_images_listed() {
        let bytes = sample(CompressionLevel::Default).to_bytes().unwrap();
        let raw = RawDocument::parse(&bytes).unwrap();

        let fonts = raw.fonts(false);
        assert_eq!(fonts.len(), 1);
        assert_eq!(fonts[0].base_font, "Helvetica");
        assert!(!fonts[0].is_embedded());
        assert_eq!(fonts[0].pages, vec![0]);

        let images = raw.images(true);
        assert_eq!(images.len(), 1);
        assert_eq!((images[0].width, images[0].height), (2, 2));
        assert_eq!(images[0].pages, vec![2]);
        assert!(images[0].data.is_some());
    }
}
