//! Indirect object kinds.
//!
//! Every value stored in the [`ObjectRegistry`](crate::registry::ObjectRegistry)
//! is an [`IndirectObject`]. Each kind lowers itself to a generic
//! [`Object`] and reports the references it holds, which is all the writer
//! and the garbage collector need.

pub mod annotation;
pub mod embedded;
pub mod font;
pub mod graphics;
pub mod outline;
pub mod page;

pub use annotation::{Annotation, AnnotationKind, FieldKind, FormField};
pub use embedded::{EmbeddedFile, FileSpec};
pub use font::{Font, FontDescriptor, to_unicode_cmap};
pub use graphics::{
    BlendMode, ExtGState, ImageColorSpace, ImageEncoding, ImageXObject, SeparationColorSpace,
    SoftMask, SoftMaskKind, TransparencyGroup,
};
pub use outline::{OutlineFlags, OutlineItem, OutlineRoot, OutlineStyle};
pub use page::{
    Catalog, ContentStream, InfoDict, LabelStyle, Page, PageLabel, PageTree, Resources,
};

use crate::config::CompressionLevel;
use crate::decoders::flate_encode;
use crate::encryption::Protection;
use crate::error::Result;
use crate::object::{Dictionary, Object, ObjectRef, name};
use crate::serializer::ObjectSerializer;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Settings in effect for one save.
#[derive(Clone, Copy)]
pub struct WriteContext<'a> {
    /// Compression for stream bodies
    pub compression: CompressionLevel,
    /// Active protection, if any
    pub protection: Option<&'a Protection>,
}

/// The capability every registry value provides.
pub trait PdfObject {
    /// Lower to a generic object, compressing stream bodies as configured.
    fn to_object(&self, compression: CompressionLevel) -> Result<Object>;

    /// Call `f` for every reference this object holds.
    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef));

    /// Call `f` on every reference this object holds, allowing renumbering.
    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef));

    /// Whether the active protection applies to this object's strings and
    /// streams. Only the encryption dictionary opts out.
    fn accepts_protection(&self) -> bool {
        true
    }

    /// Serialize as indirect object `r`.
    fn write_to(&self, r: ObjectRef, sink: &mut dyn Write, ctx: &WriteContext<'_>) -> Result<()> {
        let obj = self.to_object(ctx.compression)?;
        let protection = if self.accepts_protection() {
            ctx.protection
        } else {
            None
        };
        ObjectSerializer::compact().write_indirect(sink, r, &obj, protection)
    }
}

/// A generic stream body, used for font programs, CMaps, and similar data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataStream {
    /// Extra dictionary entries (no /Length or /Filter)
    pub dict: Dictionary,
    /// Unfiltered body
    pub data: Vec<u8>,
}

impl DataStream {
    /// Stream with the given body and no extra entries.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            dict: Dictionary::new(),
            data,
        }
    }
}

impl PdfObject for DataStream {
    fn to_object(&self, compression: CompressionLevel) -> Result<Object> {
        stream_object(self.dict.clone(), &self.data, compression)
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        self.dict.values().for_each(|v| v.visit_refs(f));
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        self.dict.values_mut().for_each(|v| v.visit_refs_mut(f));
    }
}

/// Build a stream object, flate-compressing the body unless compression is off.
pub fn stream_object(
    mut dict: Dictionary,
    data: &[u8],
    compression: CompressionLevel,
) -> Result<Object> {
    let body = match compression.flate() {
        Some(level) => {
            dict.insert("Filter".to_string(), name("FlateDecode"));
            flate_encode(data, level)?
        },
        None => data.to_vec(),
    };
    Ok(Object::Stream {
        dict,
        data: bytes::Bytes::from(body),
    })
}

/// Everything that can occupy a registry slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IndirectObject {
    /// Document catalog
    Catalog(Catalog),
    /// Root of the page tree
    PageTree(PageTree),
    /// One page
    Page(Page),
    /// Page content stream backed by an operator cache
    Content(ContentStream),
    /// Font dictionary
    Font(Font),
    /// Font descriptor
    FontDescriptor(FontDescriptor),
    /// Font program, ToUnicode CMap, or other raw stream
    Stream(DataStream),
    /// Image XObject
    Image(ImageXObject),
    /// Extended graphics state
    ExtGState(ExtGState),
    /// Transparency group form XObject
    Group(TransparencyGroup),
    /// Soft mask dictionary
    SoftMask(SoftMask),
    /// Separation color space
    ColorSpace(SeparationColorSpace),
    /// Outline root
    Outlines(OutlineRoot),
    /// Outline item (bookmark)
    OutlineItem(OutlineItem),
    /// Annotation
    Annotation(Annotation),
    /// Form field with merged widget annotation
    FormField(FormField),
    /// Embedded file stream
    EmbeddedFile(EmbeddedFile),
    /// File specification
    FileSpec(FileSpec),
    /// Document information dictionary
    Info(InfoDict),
    /// Encryption dictionary
    Encrypt(Object),
    /// Arbitrary object
    Raw(Object),
    /// Deleted slot
    Null,
}

macro_rules! dispatch {
    ($self:expr, $inner:ident => $body:expr, $encrypt:ident => $enc_body:expr, $null:expr) => {
        match $self {
            IndirectObject::Catalog($inner) => $body,
            IndirectObject::PageTree($inner) => $body,
            IndirectObject::Page($inner) => $body,
            IndirectObject::Content($inner) => $body,
            IndirectObject::Font($inner) => $body,
            IndirectObject::FontDescriptor($inner) => $body,
            IndirectObject::Stream($inner) => $body,
            IndirectObject::Image($inner) => $body,
            IndirectObject::ExtGState($inner) => $body,
            IndirectObject::Group($inner) => $body,
            IndirectObject::SoftMask($inner) => $body,
            IndirectObject::ColorSpace($inner) => $body,
            IndirectObject::Outlines($inner) => $body,
            IndirectObject::OutlineItem($inner) => $body,
            IndirectObject::Annotation($inner) => $body,
            IndirectObject::FormField($inner) => $body,
            IndirectObject::EmbeddedFile($inner) => $body,
            IndirectObject::FileSpec($inner) => $body,
            IndirectObject::Info($inner) => $body,
            IndirectObject::Encrypt($encrypt) | IndirectObject::Raw($encrypt) => $enc_body,
            IndirectObject::Null => $null,
        }
    };
}

impl IndirectObject {
    /// Whether this slot is a tombstone.
    pub fn is_null(&self) -> bool {
        matches!(self, IndirectObject::Null)
    }

    /// Short kind name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            IndirectObject::Catalog(_) => "Catalog",
            IndirectObject::PageTree(_) => "Pages",
            IndirectObject::Page(_) => "Page",
            IndirectObject::Content(_) => "Content",
            IndirectObject::Font(_) => "Font",
            IndirectObject::FontDescriptor(_) => "FontDescriptor",
            IndirectObject::Stream(_) => "Stream",
            IndirectObject::Image(_) => "Image",
            IndirectObject::ExtGState(_) => "ExtGState",
            IndirectObject::Group(_) => "Group",
            IndirectObject::SoftMask(_) => "SoftMask",
            IndirectObject::ColorSpace(_) => "ColorSpace",
            IndirectObject::Outlines(_) => "Outlines",
            IndirectObject::OutlineItem(_) => "OutlineItem",
            IndirectObject::Annotation(_) => "Annotation",
            IndirectObject::FormField(_) => "FormField",
            IndirectObject::EmbeddedFile(_) => "EmbeddedFile",
            IndirectObject::FileSpec(_) => "FileSpec",
            IndirectObject::Info(_) => "Info",
            IndirectObject::Encrypt(_) => "Encrypt",
            IndirectObject::Raw(_) => "Raw",
            IndirectObject::Null => "Null",
        }
    }
}

impl PdfObject for IndirectObject {
    fn to_object(&self, compression: CompressionLevel) -> Result<Object> {
        dispatch!(self, o => o.to_object(compression), obj => Ok(obj.clone()), Ok(Object::Null))
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        dispatch!(self, o => o.visit_refs(f), obj => obj.visit_refs(f), ())
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        dispatch!(self, o => o.visit_refs_mut(f), obj => obj.visit_refs_mut(f), ())
    }

    fn accepts_protection(&self) -> bool {
        !matches!(self, IndirectObject::Encrypt(_))
    }
}

/// Visit an optional reference.
pub(crate) fn visit_opt(r: &Option<ObjectRef>, f: &mut dyn FnMut(ObjectRef)) {
    if let Some(r) = r {
        f(*r);
    }
}

/// Visit an optional reference mutably.
pub(crate) fn visit_opt_mut(r: &mut Option<ObjectRef>, f: &mut dyn FnMut(&mut ObjectRef)) {
    if let Some(r) = r {
        f(r);
    }
}

/// Numbers array shorthand.
pub(crate) fn number_array(values: &[f64]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::dict;

    #[test]
    fn test_stream_object_compression() {
        let data = b"BT /F1 12 Tf ET ".repeat(20);
        let raw = stream_object(Dictionary::new(), &data, CompressionLevel::None).unwrap();
        assert!(raw.get("Filter").is_none());

        let packed = stream_object(Dictionary::new(), &data, CompressionLevel::Best).unwrap();
        assert_eq!(packed.get("Filter").and_then(Object::as_name), Some("FlateDecode"));
        assert_eq!(packed.decode_stream_data().unwrap(), data);
    }

    #[test]
    fn test_encrypt_object_opts_out_of_protection() {
        assert!(!IndirectObject::Encrypt(Object::Null).accepts_protection());
        assert!(IndirectObject::Raw(Object::Null).accepts_protection());
    }

    #[test]
    fn test_raw_refs_visited() {
        let mut obj = IndirectObject::Raw(Object::Dictionary(dict([(
            "A",
            Object::Reference(ObjectRef::new(4, 0)),
        )])));
        let mut seen = Vec::new();
        obj.visit_refs(&mut |r| seen.push(r.id));
        assert_eq!(seen, vec![4]);
        obj.visit_refs_mut(&mut |r| r.id = 9);
        obj.visit_refs(&mut |r| seen.push(r.id));
        assert_eq!(seen, vec![4, 9]);
    }

    #[test]
    fn test_tombstone_writes_null() {
        let mut out = Vec::new();
        let ctx = WriteContext {
            compression: CompressionLevel::None,
            protection: None,
        };
        IndirectObject::Null.write_to(ObjectRef::new(2, 0), &mut out, &ctx).unwrap();
        assert_eq!(out, b"2 0 obj\nnull\nendobj\n");
    }
}
