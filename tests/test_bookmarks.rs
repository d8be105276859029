//! Bookmark lists as written to the file.

use pdf_engine::{CompressionLevel, Document, DocumentConfig, GcMode, Object, RawDocument};
use proptest::prelude::*;

fn doc(pages: usize) -> Document {
    let mut doc = Document::new(DocumentConfig::new().with_compression(CompressionLevel::None)).unwrap();
    for _ in 0..pages {
        doc.add_page().unwrap();
    }
    doc
}

/// Titles reached from the written `/Outlines` by following `/First` and
/// `/Next`, plus the root `/Count`.
fn written_outline(doc: &Document) -> (Vec<String>, i64) {
    let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
    let root = raw.trailer().get("Root").and_then(Object::as_reference).unwrap();
    let Ok(outlines) = raw.get_key(root.id, "Outlines") else {
        return (Vec::new(), 0);
    };
    let outlines = raw.resolve(outlines).as_dict().unwrap();
    let count = outlines.get("Count").and_then(Object::as_integer).unwrap_or(0);

    let mut titles = Vec::new();
    let mut next = outlines.get("First").and_then(Object::as_reference);
    while let Some(r) = next {
        let item = raw.dictionary(r.id).unwrap();
        let title = item.get("Title").and_then(Object::as_string).unwrap();
        titles.push(String::from_utf8(title.to_vec()).unwrap());
        next = item.get("Next").and_then(Object::as_reference);
    }
    (titles, count)
}

mod flat_list {
    use super::*;

    #[test]
    fn test_written_order_and_count() {
        let mut doc = doc(3);
        for (i, title) in ["Intro", "Methods", "Results"].iter().enumerate() {
            doc.add_bookmark(title, i, None).unwrap();
        }
        let (titles, count) = written_outline(&doc);
        assert_eq!(titles, vec!["Intro", "Methods", "Results"]);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_delete_middle() {
        let mut doc = doc(1);
        let indices: Vec<usize> = (0..4).map(|i| doc.add_bookmark(&format!("B{}", i), 0, None).unwrap()).collect();
        doc.delete_bookmark(indices[1]).unwrap();

        let (titles, count) = written_outline(&doc);
        assert_eq!(titles, vec!["B0", "B2", "B3"]);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_destination_points_at_page() {
        let mut doc = doc(2);
        doc.add_bookmark("Second", 1, None).unwrap();
        let page = doc.page_ref(1).unwrap();

        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        let root = raw.trailer().get("Root").and_then(Object::as_reference).unwrap();
        let outlines = raw.resolve(raw.get_key(root.id, "Outlines").unwrap()).as_dict().unwrap();
        let first = outlines.get("First").and_then(Object::as_reference).unwrap();
        let dest = raw.get_key(first.id, "Dest").unwrap().as_array().unwrap();
        assert_eq!(dest[0].as_reference(), Some(page));
        assert_eq!(dest[1].as_name(), Some("XYZ"));
    }

    #[test]
    fn test_deleted_nodes_collected() {
        let mut doc = doc(1);
        let a = doc.add_bookmark("A", 0, None).unwrap();
        doc.add_bookmark("B", 0, None).unwrap();
        doc.delete_bookmark(a).unwrap();

        let report = doc.collect_garbage(GcMode::Compact).unwrap();
        assert_eq!(report.removed, 0);
        let (titles, count) = written_outline(&doc);
        assert_eq!(titles, vec!["B"]);
        assert_eq!(count, 1);
    }
}

proptest! {
    #[test]
    fn prop_delete_any_node_of_flat_list(n in 1usize..12, pick in 0usize..12) {
        let victim = pick % n;
        let mut doc = doc(1);
        let indices: Vec<usize> = (0..n).map(|i| doc.add_bookmark(&format!("N{}", i), 0, None).unwrap()).collect();
        doc.delete_bookmark(indices[victim]).unwrap();

        let expected: Vec<String> = (0..n).filter(|&i| i != victim).map(|i| format!("N{}", i)).collect();
        let (titles, count) = written_outline(&doc);
        prop_assert_eq!(count as usize, n - 1);
        prop_assert_eq!(titles, expected);
        prop_assert_eq!(doc.bookmarks().unwrap().len(), n - 1);
    }
}
