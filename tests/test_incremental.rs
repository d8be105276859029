//! Incremental updates: appended sections, stable numbers, later
//! definitions winning on read.

use pdf_engine::{CompressionLevel, Document, DocumentConfig, Object, RawDocument};

fn doc() -> Document {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut doc = Document::new(DocumentConfig::new().with_compression(CompressionLevel::None)).unwrap();
    doc.add_page().unwrap();
    doc.add_page().unwrap();
    doc
}

mod appending {
    use super::*;

    #[test]
    fn test_original_bytes_untouched() {
        let mut doc = doc();
        let original = doc.to_bytes().unwrap();
        doc.set_rotation(1, 180).unwrap();
        let page = doc.page_ref(1).unwrap();

        let updated = doc.incremental_save(&original, &[page.id]).unwrap();
        assert!(updated.starts_with(&original));
        assert!(updated.len() > original.len());
        assert_eq!(updated.windows(5).filter(|w| w == b"%%EOF").count(), 2);
    }

    #[test]
    fn test_later_definition_wins() {
        let mut doc = doc();
        let original = doc.to_bytes().unwrap();
        doc.set_rotation(1, 90).unwrap();
        let page = doc.page_ref(1).unwrap();
        let updated = doc.incremental_save(&original, &[page.id]).unwrap();

        let before = RawDocument::parse(&original).unwrap();
        let after = RawDocument::parse(&updated).unwrap();
        assert_eq!(before.page(1).unwrap().rotate, 0);
        assert_eq!(after.page(1).unwrap().rotate, 90);
        assert_eq!(after.page(0).unwrap().rotate, 0);
        assert_eq!(after.page_count(), 2);
    }

    #[test]
    fn test_prev_points_at_original_xref() {
        let mut doc = doc();
        let original = doc.to_bytes().unwrap();
        doc.set_rotation(0, 270).unwrap();
        let page = doc.page_ref(0).unwrap();
        let updated = doc.incremental_save(&original, &[page.id]).unwrap();

        let tail = String::from_utf8_lossy(&updated[original.len()..]).into_owned();
        let startxref = String::from_utf8_lossy(&original)
            .rsplit("startxref")
            .next()
            .and_then(|rest| rest.split_whitespace().next().map(str::to_string))
            .unwrap();
        assert!(tail.contains(&format!("/Prev {}", startxref)));
    }
}

mod stability {
    use super::*;

    #[test]
    fn test_object_numbers_stable_across_saves() {
        let mut doc = doc();
        let original = doc.to_bytes().unwrap();
        let before: Vec<u32> = RawDocument::parse(&original).unwrap().object_numbers().collect();

        doc.set_rotation(0, 90).unwrap();
        let page = doc.page_ref(0).unwrap();
        let updated = doc.incremental_save(&original, &[page.id]).unwrap();
        let after: Vec<u32> = RawDocument::parse(&updated).unwrap().object_numbers().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_saving_twice_is_idempotent() {
        let mut doc = doc();
        let original = doc.to_bytes().unwrap();
        doc.set_rotation(0, 90).unwrap();
        let page = doc.page_ref(0).unwrap();

        let first = doc.incremental_save(&original, &[page.id]).unwrap();
        let second = doc.incremental_save(&original, &[page.id]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_numbers_ignored() {
        let doc = doc();
        let original = doc.to_bytes().unwrap();
        let updated = doc.incremental_save(&original, &[4096]).unwrap();
        let raw = RawDocument::parse(&updated).unwrap();
        assert_eq!(raw.page_count(), 2);
    }

    #[test]
    fn test_empty_touch_set_rewrites_everything() {
        let doc = doc();
        let original = doc.to_bytes().unwrap();
        let updated = doc.incremental_save(&original, &[]).unwrap();
        let raw = RawDocument::parse(&updated).unwrap();
        let root = raw.trailer().get("Root").and_then(Object::as_reference).unwrap();
        assert_eq!(root.id, doc.state().catalog().id);
        assert_eq!(raw.page_count(), 2);
    }

    #[test]
    fn test_all_numbers_match_full_save() {
        let mut doc = doc();
        let original = doc.to_bytes().unwrap();
        doc.set_font("Helvetica", 12.0).unwrap();
        doc.text(72.0, 72.0, "Added later").unwrap();

        let all: Vec<u32> = (1..=doc.registry().len() as u32).collect();
        let incremental = RawDocument::parse(&doc.incremental_save(&original, &all).unwrap()).unwrap();
        let full = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();

        let numbers: Vec<u32> = full.object_numbers().collect();
        assert_eq!(incremental.object_numbers().collect::<Vec<_>>(), numbers);
        for n in numbers {
            assert_eq!(incremental.object(n).unwrap(), full.object(n).unwrap());
        }
        assert_eq!(incremental.page_text(1).unwrap(), "Added later");
    }
}
