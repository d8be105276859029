//! Generic object model.
//!
//! [`Object`] is the value type shared by the serializer, the raw reader, and
//! every typed indirect object in [`crate::objects`]. Typed objects lower
//! themselves to an `Object` before writing; the reader produces `Object`s
//! directly from bytes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dictionary representation used throughout the crate.
pub type Dictionary = HashMap<String, Object>;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (starting with /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dictionary),
    /// Stream (dictionary + data)
    Stream {
        /// Stream dictionary
        dict: Dictionary,
        /// Stream data, exactly as stored (still filtered)
        data: bytes::Bytes,
    },
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl From<ObjectRef> for Object {
    fn from(r: ObjectRef) -> Self {
        Object::Reference(r)
    }
}

impl Object {
    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream { .. } => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an Integer or Real.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both Dictionary and Stream objects.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Mutable dictionary access for Dictionary and Stream objects.
    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to string (bytes).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Look up a key when this object is a dictionary or stream.
    pub fn get(&self, key: &str) -> Option<&Object> {
        self.as_dict().and_then(|d| d.get(key))
    }

    /// Whether `/Type` equals the given name.
    pub fn has_type(&self, type_name: &str) -> bool {
        self.get("Type").and_then(Object::as_name) == Some(type_name)
    }

    /// Call `f` for every reference reachable inside this value.
    ///
    /// Stream dictionaries are walked; stream data is not.
    pub fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        match self {
            Object::Reference(r) => f(*r),
            Object::Array(items) => items.iter().for_each(|item| item.visit_refs(f)),
            Object::Dictionary(dict) | Object::Stream { dict, .. } => {
                dict.values().for_each(|value| value.visit_refs(f))
            },
            _ => {},
        }
    }

    /// Mutable counterpart of [`Object::visit_refs`], used for renumbering.
    pub fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        match self {
            Object::Reference(r) => f(r),
            Object::Array(items) => items.iter_mut().for_each(|item| item.visit_refs_mut(f)),
            Object::Dictionary(dict) | Object::Stream { dict, .. } => {
                dict.values_mut().for_each(|value| value.visit_refs_mut(f))
            },
            _ => {},
        }
    }

    /// Decode stream data using the filters named in the stream dictionary.
    ///
    /// # Returns
    ///
    /// The decoded bytes, or an error if this is not a stream or a filter
    /// fails.
    pub fn decode_stream_data(&self) -> Result<Vec<u8>> {
        match self {
            Object::Stream { dict, data } => {
                let filters = dict
                    .get("Filter")
                    .map(extract_filter_names)
                    .unwrap_or_default();

                if filters.is_empty() {
                    Ok(data.to_vec())
                } else {
                    crate::decoders::decode_stream(data, &filters)
                }
            },
            _ => Err(Error::InvalidObjectType {
                expected: "Stream".to_string(),
                found: self.type_name().to_string(),
            }),
        }
    }
}

/// Extract filter names from a Filter object.
///
/// The Filter entry can be either a single Name or an Array of Names.
pub(crate) fn extract_filter_names(filter_obj: &Object) -> Vec<String> {
    match filter_obj {
        Object::Name(name) => vec![name.clone()],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|obj| obj.as_name().map(|s| s.to_string()))
            .collect(),
        _ => vec![],
    }
}

/// Build a dictionary from key/value pairs.
pub fn dict<I, K>(entries: I) -> Dictionary
where
    I: IntoIterator<Item = (K, Object)>,
    K: Into<String>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Name object shorthand.
pub fn name(s: &str) -> Object {
    Object::Name(s.to_string())
}

/// Text string object shorthand.
///
/// ASCII text is stored as-is; anything else is encoded as UTF-16BE with a
/// byte-order mark so viewers display it correctly.
pub fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        Object::String(s.as_bytes().to_vec())
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in s.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes)
    }
}

/// Decode a text string written by [`text_string`] (UTF-16BE with BOM or
/// single-byte Latin-1).
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Rectangle array `[llx lly urx ury]`.
pub fn rect_array(llx: f64, lly: f64, urx: f64, ury: f64) -> Object {
    Object::Array(vec![
        Object::Real(llx),
        Object::Real(lly),
        Object::Real(urx),
        Object::Real(ury),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_ref_display() {
        assert_eq!(ObjectRef::new(10, 0).to_string(), "10 0 R");
    }

    #[test]
    fn test_as_number_accepts_both_numeric_kinds() {
        assert_eq!(Object::Integer(3).as_number(), Some(3.0));
        assert_eq!(Object::Real(2.5).as_number(), Some(2.5));
        assert_eq!(Object::Name("x".into()).as_number(), None);
    }

    #[test]
    fn test_stream_exposes_dictionary() {
        let obj = Object::Stream {
            dict: dict([("Type", name("XObject"))]),
            data: bytes::Bytes::from_static(b"abc"),
        };
        assert!(obj.has_type("XObject"));
        assert_eq!(obj.type_name(), "Stream");
    }

    #[test]
    fn test_visit_refs_walks_nested_values() {
        let obj = Object::Dictionary(dict([
            ("A", Object::Reference(ObjectRef::new(1, 0))),
            (
                "B",
                Object::Array(vec![
                    Object::Integer(4),
                    Object::Reference(ObjectRef::new(2, 0)),
                    Object::Dictionary(dict([("C", Object::Reference(ObjectRef::new(3, 0)))])),
                ]),
            ),
        ]));
        let mut seen = Vec::new();
        obj.visit_refs(&mut |r| seen.push(r.id));
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_visit_refs_mut_renumbers() {
        let mut obj = Object::Array(vec![
            Object::Reference(ObjectRef::new(5, 0)),
            Object::Reference(ObjectRef::new(7, 0)),
        ]);
        obj.visit_refs_mut(&mut |r| r.id -= 1);
        assert_eq!(
            obj,
            Object::Array(vec![
                Object::Reference(ObjectRef::new(4, 0)),
                Object::Reference(ObjectRef::new(6, 0)),
            ])
        );
    }

    #[test]
    fn test_decode_unfiltered_stream() {
        let obj = Object::Stream {
            dict: Dictionary::new(),
            data: bytes::Bytes::from_static(b"BT ET"),
        };
        assert_eq!(obj.decode_stream_data().unwrap(), b"BT ET");
    }

    #[test]
    fn test_decode_non_stream_fails() {
        let err = Object::Integer(1).decode_stream_data().unwrap_err();
        assert!(matches!(err, Error::InvalidObjectType { .. }));
    }

    #[test]
    fn test_text_string_round_trip() {
        let ascii = text_string("Chapter 1");
        assert_eq!(ascii.as_string(), Some(&b"Chapter 1"[..]));
        let unicode = text_string("Überblick");
        let bytes = unicode.as_string().unwrap();
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        assert_eq!(decode_text_string(bytes), "Überblick");
    }
}
