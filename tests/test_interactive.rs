//! Annotations, form fields, and attachments as written to the file.

use pdf_engine::{CompressionLevel, Document, DocumentConfig, Object, RawDocument, Rect};

fn doc(pages: usize) -> Document {
    let mut doc = Document::new(DocumentConfig::new().with_compression(CompressionLevel::None)).unwrap();
    for _ in 0..pages {
        doc.add_page().unwrap();
    }
    doc
}

fn catalog_entry<'a>(raw: &'a RawDocument, key: &str) -> Option<&'a Object> {
    let root = raw.trailer().get("Root").and_then(Object::as_reference)?;
    raw.get_key(root.id, key).ok().map(|o| raw.resolve(o))
}

/// Resolved `/Annots` dictionaries of page `index`.
fn annots(raw: &RawDocument, index: usize) -> Vec<pdf_engine::Dictionary> {
    let page = raw.page(index).unwrap();
    let Ok(list) = raw.get_key(page.object.id, "Annots") else {
        return Vec::new();
    };
    raw.resolve(list)
        .as_array()
        .unwrap()
        .iter()
        .map(|a| raw.resolve(a).as_dict().unwrap().clone())
        .collect()
}

mod annotations {
    use super::*;

    #[test]
    fn test_links_written_to_page() {
        let mut doc = doc(2);
        doc.set_page(0).unwrap();
        doc.add_link(Rect::new(10.0, 10.0, 50.0, 12.0), "https://example.com").unwrap();
        doc.add_internal_link(Rect::new(10.0, 40.0, 50.0, 12.0), 1).unwrap();

        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        let list = annots(&raw, 0);
        assert_eq!(list.len(), 2);

        let uri = list[0].get("A").and_then(Object::as_dict).unwrap();
        assert_eq!(uri.get("URI").and_then(Object::as_string), Some(&b"https://example.com"[..]));

        let dest = list[1].get("Dest").and_then(Object::as_array).unwrap();
        assert_eq!(dest[0].as_reference(), Some(raw.page(1).unwrap().object));
        assert!(annots(&raw, 1).is_empty());
    }

    #[test]
    fn test_deleted_annotation_gone_from_file() {
        let mut doc = doc(1);
        doc.add_note(Rect::new(10.0, 10.0, 20.0, 20.0), "first").unwrap();
        doc.add_note(Rect::new(40.0, 10.0, 20.0, 20.0), "second").unwrap();
        doc.delete_annotation(0, 0).unwrap();

        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        let list = annots(&raw, 0);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].get("Contents").and_then(Object::as_string), Some(&b"second"[..]));
    }

    #[test]
    fn test_annotations_survive_page_selection() {
        let mut doc = doc(2);
        doc.set_page(1).unwrap();
        doc.add_note(Rect::new(10.0, 10.0, 20.0, 20.0), "kept").unwrap();

        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        let out = RawDocument::parse(&raw.select_pages(&[1]).unwrap()).unwrap();
        let list = annots(&out, 0);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].get("P").and_then(Object::as_reference), Some(out.page(0).unwrap().object));
    }
}

mod forms {
    use super::*;

    #[test]
    fn test_acroform_lists_fields() {
        let mut doc = doc(1);
        doc.add_text_field("name", Rect::new(10.0, 10.0, 100.0, 20.0), "Ada").unwrap();
        doc.add_checkbox("agree", Rect::new(10.0, 40.0, 12.0, 12.0), true).unwrap();
        assert!(doc.add_text_field("name", Rect::new(10.0, 70.0, 100.0, 20.0), "dup").is_err());

        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        let form = catalog_entry(&raw, "AcroForm").and_then(Object::as_dict).unwrap();
        assert_eq!(form.get("Fields").and_then(Object::as_array).map(Vec::len), Some(2));
        assert_eq!(form.get("NeedAppearances"), Some(&Object::Boolean(true)));

        let widgets = annots(&raw, 0);
        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[0].get("FT").and_then(Object::as_name), Some("Tx"));
        assert_eq!(widgets[0].get("V").and_then(Object::as_string), Some(&b"Ada"[..]));
        assert_eq!(widgets[1].get("FT").and_then(Object::as_name), Some("Btn"));
    }
}

mod attachments {
    use super::*;

    #[test]
    fn test_embedded_files_name_tree() {
        let mut doc = doc(1);
        doc.attach_file("b.txt", b"bravo".to_vec(), None, Some("text/plain")).unwrap();
        doc.attach_file("a.txt", b"alpha".to_vec(), Some("first"), None).unwrap();
        doc.attach_file("b.txt", b"bravo v2".to_vec(), None, None).unwrap();
        assert_eq!(doc.attachments().unwrap(), vec!["b.txt", "a.txt"]);

        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        let names = catalog_entry(&raw, "Names").and_then(Object::as_dict).unwrap();
        let tree = raw.resolve(names.get("EmbeddedFiles").unwrap()).as_dict().unwrap();
        let entries = tree.get("Names").and_then(Object::as_array).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].as_string(), Some(&b"a.txt"[..]));
        assert_eq!(entries[2].as_string(), Some(&b"b.txt"[..]));

        let spec = entries[3].as_reference().unwrap();
        let file = raw.resolve(raw.get_key(spec.id, "EF").unwrap()).as_dict().unwrap();
        let stream = file.get("F").and_then(Object::as_reference).unwrap();
        assert_eq!(raw.stream_data(stream.id).unwrap(), b"bravo v2");
    }
}
