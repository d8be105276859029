//! Error types for the document engine.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants fall
//! into four groups: structural problems found while parsing, range errors for
//! an entity that does not exist, sink failures while writing, and state errors
//! raised by the journal and the drawing cursor.

/// Result type alias for document engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building, writing, or reading documents.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Invalid file header (expected '%PDF-')
    #[error("Invalid PDF header: expected '%PDF-', found '{0}'")]
    InvalidHeader(String),

    /// Parse error at specific byte offset
    #[error("Failed to parse object at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where error occurred
        offset: usize,
        /// Reason for parse failure
        reason: String,
    },

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Invalid document structure
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// A caller-supplied value is unusable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Stream decoding error
    #[error("Stream decoding error: {0}")]
    Decode(String),

    /// Unsupported stream filter
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Nesting too deep while parsing
    #[error("Recursion depth limit exceeded (max: {0})")]
    RecursionLimitExceeded(u32),

    /// Page index out of range
    #[error("Page {index} out of range (document has {count} pages)")]
    PageOutOfRange {
        /// Requested index
        index: usize,
        /// Number of pages
        count: usize,
    },

    /// Bookmark index does not name a live bookmark
    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(usize),

    /// Annotation index out of range for a page
    #[error("Annotation {index} not found on page {page}")]
    AnnotationNotFound {
        /// Page index
        page: usize,
        /// Annotation index on that page
        index: usize,
    },

    /// Object number not present (or tombstoned)
    #[error("Object not found: {0}")]
    ObjectNotFound(u32),

    /// Dictionary key not present on an object
    #[error("Key /{key} not found in object {object}")]
    KeyNotFound {
        /// Object number
        object: u32,
        /// Missing key
        key: String,
    },

    /// Font resource name not registered with the document
    #[error("Font not found: {0}")]
    FontNotFound(String),

    /// A drawing call was issued before any page was added
    #[error("No current page: add a page before drawing")]
    NoCurrentPage,

    /// A text call was issued before a font was selected
    #[error("No font selected: call set_font before drawing text")]
    NoFontSelected,

    /// Image data could not be used
    #[error("Image error: {0}")]
    Image(String),

    /// Encryption setup failure
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Journal mutator called while the journal is disabled
    #[error("Journal not enabled")]
    JournalDisabled,

    /// Undo at the start of the timeline
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Redo at the end of the timeline
    #[error("Nothing to redo")]
    NothingToRedo,

    /// end_op without a matching start_op
    #[error("No operation in progress")]
    NoPendingOperation,

    /// Journal file content could not be read back
    #[error("Journal error: {0}")]
    Journal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Journal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error() {
        let err = Error::ParseError {
            offset: 1234,
            reason: "invalid token".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("1234"));
        assert!(msg.contains("invalid token"));
    }

    #[test]
    fn test_page_out_of_range_message() {
        let err = Error::PageOutOfRange { index: 4, count: 2 };
        assert_eq!(err.to_string(), "Page 4 out of range (document has 2 pages)");
    }

    #[test]
    fn test_range_errors_name_the_entity() {
        assert_eq!(Error::BookmarkNotFound(3).to_string(), "Bookmark not found: 3");
        assert_eq!(
            Error::AnnotationNotFound { page: 0, index: 7 }.to_string(),
            "Annotation 7 not found on page 0"
        );
        assert_eq!(Error::ObjectNotFound(12).to_string(), "Object not found: 12");
        assert_eq!(
            Error::KeyNotFound {
                object: 5,
                key: "Title".to_string()
            }
            .to_string(),
            "Key /Title not found in object 5"
        );
    }

    #[test]
    fn test_journal_state_messages() {
        assert_eq!(Error::JournalDisabled.to_string(), "Journal not enabled");
        assert_eq!(Error::NothingToUndo.to_string(), "Nothing to undo");
        assert_eq!(Error::NothingToRedo.to_string(), "Nothing to redo");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_becomes_journal_error() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Journal(_)));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
