//! Garbage collection over whole documents.

use pdf_engine::objects::ImageColorSpace;
use pdf_engine::{CompressionLevel, Document, DocumentConfig, GcMode, ImageData, RawDocument, Rect};
use proptest::prelude::*;

fn doc() -> Document {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut doc = Document::new(DocumentConfig::new().with_compression(CompressionLevel::None)).unwrap();
    doc.add_page().unwrap();
    doc.set_font("Helvetica", 12.0).unwrap();
    doc.text(72.0, 72.0, "Anchor").unwrap();
    doc
}

fn unplaced_image(doc: &mut Document) {
    let pixels = ImageData::raw(1, 1, ImageColorSpace::Gray, vec![0]).unwrap();
    doc.add_image(pixels).unwrap();
}

mod modes {
    use super::*;

    #[test]
    fn test_tombstone_keeps_numbers() {
        let mut doc = doc();
        unplaced_image(&mut doc);
        let page = doc.page_ref(0).unwrap();
        let slots = doc.registry().len();

        let report = doc.collect_garbage(GcMode::Tombstone).unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(report.after, report.before - 1);
        assert_eq!(doc.registry().len(), slots);
        assert_eq!(doc.page_ref(0).unwrap(), page);

        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(raw.object_count(), report.after);
        assert_eq!(raw.max_object_number() as usize, slots - 1);
    }

    #[test]
    fn test_compact_shrinks_registry() {
        let mut doc = doc();
        doc.add_page().unwrap();
        unplaced_image(&mut doc);
        unplaced_image(&mut doc);
        let before = doc.registry().len();

        let report = doc.collect_garbage(GcMode::Compact).unwrap();
        assert_eq!(report.removed, 2);
        assert_eq!(doc.registry().len(), before - 2);

        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(raw.page_count(), 2);
        assert_eq!(raw.search("Anchor", false).len(), 1);
        assert_eq!(raw.object_count(), report.after);
    }

    #[test]
    fn test_reachable_never_removed() {
        let mut doc = doc();
        let bookmark = doc.add_bookmark("Top", 0, None).unwrap();
        doc.delete_bookmark(bookmark).unwrap();
        let report = doc.collect_garbage(GcMode::Compact).unwrap();
        assert_eq!(report.removed, 0);

        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(raw.page_count(), 1);
        assert_eq!(raw.fonts(false).len(), 1);
    }

    #[test]
    fn test_gc_is_journaled() {
        let mut doc = doc();
        doc.enable_journal();
        unplaced_image(&mut doc);
        let slots = doc.registry().len();
        doc.collect_garbage(GcMode::Compact).unwrap();
        assert_eq!(doc.registry().len(), slots - 1);

        assert_eq!(doc.undo().unwrap(), "collect_garbage");
        assert_eq!(doc.registry().len(), slots);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_second_collection_is_noop(
        pages in 1usize..4,
        orphans in 0usize..5,
        placed in 0usize..3,
        compact in any::<bool>(),
        bookmarks in 0usize..5,
        deletions in proptest::collection::vec(any::<usize>(), 0..4),
    ) {
        let mode = if compact { GcMode::Compact } else { GcMode::Tombstone };
        let mut doc = doc();
        for _ in 1..pages {
            doc.add_page().unwrap();
        }
        for _ in 0..orphans {
            unplaced_image(&mut doc);
        }
        let marks: Vec<usize> = (0..bookmarks).map(|i| doc.add_bookmark(&format!("M{}", i), 0, None).unwrap()).collect();
        let mut deleted = Vec::new();
        for pick in deletions {
            if marks.is_empty() {
                break;
            }
            let victim = marks[pick % marks.len()];
            if !deleted.contains(&victim) {
                doc.delete_bookmark(victim).unwrap();
                deleted.push(victim);
            }
        }
        for i in 0..placed {
            let pixels = ImageData::raw(1, 1, ImageColorSpace::Gray, vec![255]).unwrap();
            let handle = doc.add_image(pixels).unwrap();
            doc.image(&handle, Rect::new(10.0 * i as f64, 10.0, 5.0, 5.0)).unwrap();
        }

        let first = doc.collect_garbage(mode).unwrap();
        prop_assert_eq!(first.removed, orphans);
        let second = doc.collect_garbage(mode).unwrap();
        prop_assert_eq!(second.removed, 0);
        prop_assert_eq!(second.before, first.after);

        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        prop_assert_eq!(raw.page_count(), pages);
        prop_assert_eq!(raw.images(false).len(), placed);
        prop_assert_eq!(doc.bookmarks().unwrap().len(), bookmarks - deleted.len());
    }
}
