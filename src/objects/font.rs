//! Font dictionaries.
//!
//! Standard fonts are simple Type1 fonts with WinAnsiEncoding. Embedded
//! fonts are written as a Type0 font over a CIDFontType2 descendant with
//! Identity-H encoding, a font descriptor, a FontFile2 stream, and a
//! ToUnicode CMap so text stays searchable.

use super::{PdfObject, number_array};
use crate::config::CompressionLevel;
use crate::content::{Glyph, StandardFont};
use crate::error::Result;
use crate::object::{Object, ObjectRef, dict, name};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Font dictionary variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Font {
    /// One of the standard 14 fonts
    Standard(StandardFont),
    /// Composite font with a single CID descendant
    Type0 {
        /// PostScript name
        base_font: String,
        /// CIDFontType2 descendant
        descendant: ObjectRef,
        /// ToUnicode CMap stream
        to_unicode: ObjectRef,
    },
    /// TrueType-based CID font
    CidFont {
        /// PostScript name
        base_font: String,
        /// Font descriptor
        descriptor: ObjectRef,
        /// Glyph widths `(gid, width)` in 1/1000 em, sorted by gid
        widths: Vec<(u16, u16)>,
        /// Width for glyphs not listed
        default_width: u16,
    },
}

impl PdfObject for Font {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        let obj = match self {
            Font::Standard(font) => {
                let mut d = dict([
                    ("Type", name("Font")),
                    ("Subtype", name("Type1")),
                    ("BaseFont", name(font.base_font())),
                ]);
                if !font.is_symbolic() {
                    d.insert("Encoding".into(), name("WinAnsiEncoding"));
                }
                d
            },
            Font::Type0 {
                base_font,
                descendant,
                to_unicode,
            } => dict([
                ("Type", name("Font")),
                ("Subtype", name("Type0")),
                ("BaseFont", name(base_font)),
                ("Encoding", name("Identity-H")),
                ("DescendantFonts", Object::Array(vec![(*descendant).into()])),
                ("ToUnicode", (*to_unicode).into()),
            ]),
            Font::CidFont {
                base_font,
                descriptor,
                widths,
                default_width,
            } => dict([
                ("Type", name("Font")),
                ("Subtype", name("CIDFontType2")),
                ("BaseFont", name(base_font)),
                (
                    "CIDSystemInfo",
                    Object::Dictionary(dict([
                        ("Registry", Object::String(b"Adobe".to_vec())),
                        ("Ordering", Object::String(b"Identity".to_vec())),
                        ("Supplement", Object::Integer(0)),
                    ])),
                ),
                ("FontDescriptor", (*descriptor).into()),
                ("DW", Object::Integer(*default_width as i64)),
                ("W", widths_array(widths)),
                ("CIDToGIDMap", name("Identity")),
            ]),
        };
        Ok(Object::Dictionary(obj))
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        match self {
            Font::Standard(_) => {},
            Font::Type0 {
                descendant,
                to_unicode,
                ..
            } => {
                f(*descendant);
                f(*to_unicode);
            },
            Font::CidFont { descriptor, .. } => f(*descriptor),
        }
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        match self {
            Font::Standard(_) => {},
            Font::Type0 {
                descendant,
                to_unicode,
                ..
            } => {
                f(descendant);
                f(to_unicode);
            },
            Font::CidFont { descriptor, .. } => f(descriptor),
        }
    }
}

/// `/W` array grouping consecutive glyph ids: `[g [w1 w2 ...] ...]`.
fn widths_array(widths: &[(u16, u16)]) -> Object {
    let mut out = Vec::new();
    let mut i = 0;
    while i < widths.len() {
        let start = widths[i].0;
        let mut run = vec![Object::Integer(widths[i].1 as i64)];
        while i + 1 < widths.len() && widths[i + 1].0 == widths[i].0.wrapping_add(1) {
            i += 1;
            run.push(Object::Integer(widths[i].1 as i64));
        }
        out.push(Object::Integer(start as i64));
        out.push(Object::Array(run));
        i += 1;
    }
    Object::Array(out)
}

/// Font descriptor for an embedded TrueType program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescriptor {
    /// PostScript name
    pub font_name: String,
    /// Descriptor flags (symbolic = 4)
    pub flags: u32,
    /// Glyph bounding box in 1/1000 em
    pub bbox: [f64; 4],
    /// Italic angle in degrees
    pub italic_angle: f64,
    /// Ascent in 1/1000 em
    pub ascent: f64,
    /// Descent in 1/1000 em
    pub descent: f64,
    /// Cap height in 1/1000 em
    pub cap_height: f64,
    /// Dominant vertical stem width
    pub stem_v: f64,
    /// FontFile2 stream
    pub font_file: ObjectRef,
}

impl PdfObject for FontDescriptor {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        Ok(Object::Dictionary(dict([
            ("Type", name("FontDescriptor")),
            ("FontName", name(&self.font_name)),
            ("Flags", Object::Integer(self.flags as i64)),
            ("FontBBox", number_array(&self.bbox)),
            ("ItalicAngle", Object::Real(self.italic_angle)),
            ("Ascent", Object::Real(self.ascent)),
            ("Descent", Object::Real(self.descent)),
            ("CapHeight", Object::Real(self.cap_height)),
            ("StemV", Object::Real(self.stem_v)),
            ("FontFile2", self.font_file.into()),
        ])))
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        f(self.font_file);
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        f(&mut self.font_file);
    }
}

/// ToUnicode CMap mapping two-byte glyph ids back to Unicode.
pub fn to_unicode_cmap(glyphs: &BTreeMap<u32, Glyph>) -> Vec<u8> {
    let mut cmap = String::new();
    cmap.push_str("/CIDInit /ProcSet findresource begin\n");
    cmap.push_str("12 dict begin\n");
    cmap.push_str("begincmap\n");
    cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
    cmap.push_str("/CMapType 2 def\n");
    cmap.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

    let mut mappings: Vec<(u16, u32)> = glyphs.iter().map(|(&cp, g)| (g.gid, cp)).collect();
    mappings.sort_unstable();
    mappings.dedup_by_key(|(gid, _)| *gid);

    // At most 100 entries per block
    for chunk in mappings.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for &(gid, cp) in chunk {
            let mut units = [0u16; 2];
            let encoded = char::from_u32(cp)
                .map(|c| c.encode_utf16(&mut units).len())
                .unwrap_or(0);
            let hex: String = units[..encoded].iter().map(|u| format!("{:04X}", u)).collect();
            let _ = writeln!(cmap, "<{:04X}> <{}>", gid, hex);
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\n");
    cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
    cmap.push_str("end\nend\n");
    cmap.into_bytes()
}
