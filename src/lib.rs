// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::new_without_default)]
#![allow(clippy::should_implement_trait)]

//! # pdf_engine
//!
//! Build, edit, and read back paginated documents in the PDF wire format.
//!
//! ## Writing
//!
//! - **Object registry**: every indirect object lives in an index-addressed
//!   [`ObjectRegistry`]; deleted objects become tombstones so numbers stay
//!   stable.
//! - **Operator cache**: drawing calls append records to a per-page cache
//!   that is serialized to operator text on save.
//! - **Writer**: full rewrite or append-only incremental update, with
//!   optional Flate compression and RC4/AES protection.
//! - **Garbage collection**: mark from the catalog, then tombstone or
//!   compact and renumber.
//! - **Journal**: opt-in snapshot history with undo, redo, and JSON
//!   persistence.
//!
//! ## Reading
//!
//! [`RawDocument`] parses any file of the same format by scanning for object
//! headers, so broken cross-reference tables do not matter. It backs text
//! search, font and image inventory, content cleaning, colorspace
//! conversion, text replacement, and page select/delete/merge.
//!
//! ## Quick start
//!
//! ```
//! use pdf_engine::{Document, DocumentConfig, RawDocument};
//!
//! let mut doc = Document::new(DocumentConfig::new())?;
//! doc.add_page()?;
//! doc.set_font("Helvetica", 12.0)?;
//! doc.text(72.0, 72.0, "Hello World")?;
//! let bytes = doc.to_bytes()?;
//!
//! let raw = RawDocument::parse(&bytes)?;
//! let hits = raw.search("hello", true);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].page, 0);
//! # Ok::<(), pdf_engine::Error>(())
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Object model and wire syntax
pub mod lexer;
pub mod object;
pub mod parser;
pub mod serializer;

// Stream filters and protection
pub mod decoders;
pub mod encryption;

// Content and typed objects
pub mod content;
pub mod geometry;
pub mod imaging;
pub mod objects;

// Registry, output, and history
pub mod gc;
pub mod journal;
pub mod registry;
pub mod writer;

// Facades
pub mod document;
pub mod reader;

pub use config::{
    CompressionLevel, DocumentConfig, DocumentInfo, PageSize, ProtectionConfig, ReaderOptions, Unit,
};
pub use content::{Color, PaintStyle, StandardFont};
pub use document::{AnnotationInfo, BookmarkInfo, Document, GroupHandle, ImageHandle};
pub use encryption::{EncryptionAlgorithm, Permissions};
pub use error::{Error, Result};
pub use gc::{GcMode, GcReport};
pub use geometry::{Point, Rect};
pub use imaging::ImageData;
pub use journal::Journal;
pub use object::{Dictionary, Object, ObjectRef};
pub use reader::{CleanStats, ColorTarget, FontInfo, ImageInfo, RawDocument, RawPage, SearchMatch};
pub use registry::ObjectRegistry;

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        // VERSION is populated from CARGO_PKG_VERSION at compile time
        assert!(VERSION.starts_with("0."));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pdf_engine");
    }
}
