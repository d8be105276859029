//! Undo/redo history and its JSON persistence.

use pdf_engine::{CompressionLevel, Document, DocumentConfig, Error, RawDocument};

fn doc() -> Document {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut doc = Document::new(DocumentConfig::new().with_compression(CompressionLevel::None)).unwrap();
    doc.add_page().unwrap();
    doc.set_font("Helvetica", 12.0).unwrap();
    doc
}

/// Record three bracketed operations and return the bytes after each,
/// starting with the state before the first.
fn record_three(doc: &mut Document) -> Vec<Vec<u8>> {
    doc.enable_journal();
    let mut states = vec![doc.to_bytes().unwrap()];

    doc.start_op("title").unwrap();
    doc.text(72.0, 72.0, "Title").unwrap();
    doc.end_op().unwrap();
    states.push(doc.to_bytes().unwrap());

    doc.start_op("second page").unwrap();
    doc.add_page().unwrap();
    doc.text(72.0, 72.0, "Body").unwrap();
    doc.end_op().unwrap();
    states.push(doc.to_bytes().unwrap());

    doc.start_op("bookmark").unwrap();
    doc.add_bookmark("Body", 1, None).unwrap();
    doc.end_op().unwrap();
    states.push(doc.to_bytes().unwrap());
    states
}

mod linearity {
    use super::*;

    #[test]
    fn test_undo_redo_walks_states_exactly() {
        let mut doc = doc();
        let states = record_three(&mut doc);
        assert_eq!(doc.journal_history(), vec!["initial", "title", "second page", "bookmark"]);

        for (expected_name, expected) in [("bookmark", 2), ("second page", 1), ("title", 0)] {
            assert_eq!(doc.undo().unwrap(), expected_name);
            assert_eq!(doc.to_bytes().unwrap(), states[expected]);
        }
        assert!(matches!(doc.undo(), Err(Error::NothingToUndo)));

        for (expected_name, expected) in [("title", 1), ("second page", 2), ("bookmark", 3)] {
            assert_eq!(doc.redo().unwrap(), expected_name);
            assert_eq!(doc.to_bytes().unwrap(), states[expected]);
        }
        assert!(matches!(doc.redo(), Err(Error::NothingToRedo)));
    }

    #[test]
    fn test_undo_keeps_object_numbers() {
        let mut doc = doc();
        let first_page = doc.page_ref(0).unwrap();
        let catalog = doc.state().catalog();
        record_three(&mut doc);
        let second_page = doc.page_ref(1).unwrap();

        doc.undo().unwrap();
        assert_eq!(doc.page_ref(0).unwrap(), first_page);
        assert_eq!(doc.page_ref(1).unwrap(), second_page);
        assert_eq!(doc.state().catalog(), catalog);
    }

    #[test]
    fn test_new_operation_drops_redo_tail() {
        let mut doc = doc();
        record_three(&mut doc);
        doc.undo().unwrap();
        doc.undo().unwrap();

        doc.start_op("replacement").unwrap();
        doc.text(72.0, 120.0, "Other").unwrap();
        doc.end_op().unwrap();

        assert_eq!(doc.journal_history(), vec!["initial", "title", "replacement"]);
        assert!(matches!(doc.redo(), Err(Error::NothingToRedo)));
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_disabled_journal() {
        let mut doc = doc();
        assert!(!doc.journal_enabled());
        assert!(matches!(doc.undo(), Err(Error::JournalDisabled)));
        assert!(matches!(doc.start_op("x"), Err(Error::JournalDisabled)));

        doc.enable_journal();
        assert!(matches!(doc.end_op(), Err(Error::NoPendingOperation)));
        doc.disable_journal();
        assert!(!doc.journal_enabled());
    }
}

mod persistence {
    use super::*;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut doc = doc();
        record_three(&mut doc);
        doc.undo().unwrap();
        doc.save_journal(&path).unwrap();

        let mut other = Document::new(DocumentConfig::new().with_compression(CompressionLevel::None)).unwrap();
        other.enable_journal();
        other.load_journal(&path).unwrap();

        assert_eq!(other.journal_history(), doc.journal_history());
        assert_eq!(other.page_count(), 2);
        let raw = RawDocument::parse(&other.to_bytes().unwrap()).unwrap();
        assert!(raw.page_text(1).unwrap().contains("Body"));
        assert!(other.bookmarks().unwrap().is_empty());

        // the cursor came along, so the undone step is still redoable
        assert_eq!(other.redo().unwrap(), "bookmark");
        assert_eq!(other.bookmarks().unwrap().len(), 1);
    }

    #[test]
    fn test_load_requires_enabled_journal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut doc = doc();
        record_three(&mut doc);
        doc.save_journal(&path).unwrap();

        let mut other = Document::new(DocumentConfig::new()).unwrap();
        assert!(matches!(other.load_journal(&path), Err(Error::JournalDisabled)));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{\"cursor\": 0").unwrap();

        let mut doc = doc();
        doc.enable_journal();
        assert!(doc.load_journal(&path).is_err());
        assert!(doc.load_journal(dir.path().join("missing.json")).is_err());
    }
}
