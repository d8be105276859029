//! Object serialization.
//!
//! Writes [`Object`] values in the file syntax. When a [`Protection`]
//! context is supplied, every string and stream body is encrypted with the
//! key of the indirect object that contains it.

use crate::encryption::Protection;
use crate::error::Result;
use crate::object::{Dictionary, Object, ObjectRef};
use std::io::Write;

/// Serializer for objects.
#[derive(Debug, Clone, Default)]
pub struct ObjectSerializer {
    /// Whether to use compact formatting (minimal whitespace)
    compact: bool,
}

/// Encryption in effect while writing the body of one indirect object.
#[derive(Clone, Copy)]
struct Crypt<'a> {
    protection: &'a Protection,
    owner: ObjectRef,
}

impl ObjectSerializer {
    /// Create a serializer that puts each dictionary entry on its own line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compact serializer (minimal whitespace).
    pub fn compact() -> Self {
        Self { compact: true }
    }

    /// Serialize an object to bytes.
    pub fn serialize(&self, obj: &Object) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_value(&mut buf, obj, None)?;
        Ok(buf)
    }

    /// Serialize an object to a string (lossy for binary data).
    pub fn serialize_to_string(&self, obj: &Object) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.serialize(obj)?).into_owned())
    }

    /// Write an object with no encryption.
    pub fn write_object<W: Write + ?Sized>(&self, w: &mut W, obj: &Object) -> Result<()> {
        self.write_value(w, obj, None)
    }

    /// Write an indirect object definition: `{id} {gen} obj\n{object}\nendobj\n`.
    ///
    /// Strings and streams inside are encrypted when `protection` is set.
    pub fn write_indirect<W: Write + ?Sized>(
        &self,
        w: &mut W,
        r: ObjectRef,
        obj: &Object,
        protection: Option<&Protection>,
    ) -> Result<()> {
        writeln!(w, "{} {} obj", r.id, r.gen)?;
        let crypt = protection.map(|protection| Crypt { protection, owner: r });
        self.write_value(w, obj, crypt)?;
        w.write_all(b"\nendobj\n")?;
        Ok(())
    }

    fn write_value<W: Write + ?Sized>(
        &self,
        w: &mut W,
        obj: &Object,
        crypt: Option<Crypt<'_>>,
    ) -> Result<()> {
        match obj {
            Object::Null => w.write_all(b"null")?,
            Object::Boolean(b) => w.write_all(if *b { b"true" } else { b"false" })?,
            Object::Integer(i) => write!(w, "{}", i)?,
            Object::Real(r) => write_real(w, *r)?,
            Object::String(s) => match crypt {
                Some(c) => write_string(w, &c.protection.encrypt(s, c.owner)?)?,
                None => write_string(w, s)?,
            },
            Object::Name(n) => write_name(w, n)?,
            Object::Array(arr) => {
                w.write_all(b"[")?;
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        w.write_all(b" ")?;
                    }
                    self.write_value(w, item, crypt)?;
                }
                w.write_all(b"]")?;
            },
            Object::Dictionary(dict) => self.write_dictionary(w, dict, crypt)?,
            Object::Stream { dict, data } => {
                let body = match crypt {
                    Some(c) => c.protection.encrypt(data, c.owner)?,
                    None => data.to_vec(),
                };
                let mut dict = dict.clone();
                dict.insert("Length".to_string(), Object::Integer(body.len() as i64));
                self.write_dictionary(w, &dict, crypt)?;
                w.write_all(b"\nstream\n")?;
                w.write_all(&body)?;
                w.write_all(b"\nendstream")?;
            },
            Object::Reference(r) => write!(w, "{} {} R", r.id, r.gen)?,
        }
        Ok(())
    }

    fn write_dictionary<W: Write + ?Sized>(
        &self,
        w: &mut W,
        dict: &Dictionary,
        crypt: Option<Crypt<'_>>,
    ) -> Result<()> {
        w.write_all(b"<<")?;

        // Sorted keys keep output deterministic
        let mut keys: Vec<_> = dict.keys().collect();
        keys.sort();

        for key in keys {
            if !self.compact {
                w.write_all(b"\n  ")?;
            }
            write_name(w, key)?;
            w.write_all(b" ")?;
            self.write_value(w, &dict[key.as_str()], crypt)?;
        }

        if !self.compact && !dict.is_empty() {
            w.write_all(b"\n")?;
        }
        w.write_all(b">>")?;
        Ok(())
    }
}

/// Format a real with at most five decimals and no trailing zeros.
pub fn format_real(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let formatted = format!("{:.5}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

fn write_real<W: Write + ?Sized>(w: &mut W, value: f64) -> std::io::Result<()> {
    w.write_all(format_real(value).as_bytes())
}

/// Write a string as a literal `(...)` when printable, else as hex `<...>`.
pub fn write_string<W: Write + ?Sized>(w: &mut W, data: &[u8]) -> std::io::Result<()> {
    let printable = data
        .iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..=0x7E).contains(&b));

    if printable {
        w.write_all(b"(")?;
        for &byte in data {
            match byte {
                b'(' => w.write_all(b"\\(")?,
                b')' => w.write_all(b"\\)")?,
                b'\\' => w.write_all(b"\\\\")?,
                b'\n' => w.write_all(b"\\n")?,
                b'\r' => w.write_all(b"\\r")?,
                b'\t' => w.write_all(b"\\t")?,
                _ => w.write_all(&[byte])?,
            }
        }
        w.write_all(b")")
    } else {
        write_hex_string(w, data)
    }
}

/// Write bytes as a hex string `<...>`.
pub fn write_hex_string<W: Write + ?Sized>(w: &mut W, data: &[u8]) -> std::io::Result<()> {
    w.write_all(b"<")?;
    for byte in data {
        write!(w, "{:02X}", byte)?;
    }
    w.write_all(b">")
}

/// Write a name, escaping delimiters, whitespace, `#`, and non-ASCII as `#xx`.
pub fn write_name<W: Write + ?Sized>(w: &mut W, name: &str) -> std::io::Result<()> {
    w.write_all(b"/")?;
    for byte in name.bytes() {
        if byte == b'#' || !(0x21..=0x7E).contains(&byte) || crate::lexer::is_delimiter(byte) {
            write!(w, "#{:02X}", byte)?;
        } else {
            w.write_all(&[byte])?;
        }
    }
    Ok(())
}
