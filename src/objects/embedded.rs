//! File attachments.
//!
//! An attachment is two objects: the `/EmbeddedFile` stream holding the
//! bytes and a `/Filespec` naming it. The catalog lists file specifications
//! in its `/Names /EmbeddedFiles` tree.

use super::{PdfObject, stream_object};
use crate::config::CompressionLevel;
use crate::error::Result;
use crate::object::{Object, ObjectRef, dict, name, text_string};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// The embedded file stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedFile {
    /// File contents
    pub data: Vec<u8>,
    /// MIME type, written as the stream subtype
    pub mime_type: Option<String>,
    /// `D:` modification stamp
    pub mod_date: Option<String>,
}

impl EmbeddedFile {
    /// Stream over `data`.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            mime_type: None,
            mod_date: None,
        }
    }

    /// Set the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

impl PdfObject for EmbeddedFile {
    fn to_object(&self, compression: CompressionLevel) -> Result<Object> {
        let checksum = Md5::digest(&self.data).to_vec();
        let mut params = dict([
            ("Size", Object::Integer(self.data.len() as i64)),
            ("CheckSum", Object::String(checksum)),
        ]);
        if let Some(date) = &self.mod_date {
            params.insert("ModDate".into(), Object::String(date.clone().into_bytes()));
        }
        let mut d = dict([
            ("Type", name("EmbeddedFile")),
            ("Params", Object::Dictionary(params)),
        ]);
        if let Some(mime) = &self.mime_type {
            // The serializer escapes the slash as #2F
            d.insert("Subtype".into(), name(mime));
        }
        stream_object(d, &self.data, compression)
    }

    fn visit_refs(&self, _: &mut dyn FnMut(ObjectRef)) {}

    fn visit_refs_mut(&mut self, _: &mut dyn FnMut(&mut ObjectRef)) {}
}

/// File specification pointing at an embedded file stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSpec {
    /// File name shown to the user
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Embedded file stream
    pub file: ObjectRef,
}

impl PdfObject for FileSpec {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        let mut d = dict([
            ("Type", name("Filespec")),
            ("F", Object::String(self.name.as_bytes().to_vec())),
            ("UF", text_string(&self.name)),
            (
                "EF",
                Object::Dictionary(dict([("F", self.file.into()), ("UF", self.file.into())])),
            ),
        ]);
        if let Some(desc) = &self.description {
            d.insert("Desc".into(), text_string(desc));
        }
        Ok(Object::Dictionary(d))
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        f(self.file);
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        f(&mut self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_file_params() {
        let file = EmbeddedFile::new(b"a,b\n1,2\n".to_vec()).with_mime_type("text/csv");
        let obj = file.to_object(CompressionLevel::Default).unwrap();
        assert!(obj.has_type("EmbeddedFile"));
        assert_eq!(obj.get("Subtype").and_then(Object::as_name), Some("text/csv"));
        let params = obj.get("Params").unwrap();
        assert_eq!(params.get("Size"), Some(&Object::Integer(8)));
        assert_eq!(params.get("CheckSum").and_then(Object::as_string).map(<[u8]>::len), Some(16));
        assert_eq!(obj.decode_stream_data().unwrap(), b"a,b\n1,2\n");
    }

    #[test]
    fn test_filespec_references_stream() {
        let spec = FileSpec {
            name: "data.csv".into(),
            description: Some("Sales".into()),
            file: ObjectRef::new(14, 0),
        };
        let obj = spec.to_object(CompressionLevel::None).unwrap();
        let ef = obj.get("EF").unwrap();
        assert_eq!(ef.get("F"), Some(&Object::Reference(ObjectRef::new(14, 0))));
        let mut refs = Vec::new();
        spec.visit_refs(&mut |r| refs.push(r.id));
        assert_eq!(refs, vec![14]);
    }
}
