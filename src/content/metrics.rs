//! Font metrics used to measure and position text.
//!
//! All values are in 1/1000 em. Standard fonts carry built-in metrics; fonts
//! embedded from a [`FontProgram`] are scaled from the program's units per em
//! when they are registered.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vertical metrics of a font in 1/1000 em.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontMetrics {
    /// Height above the baseline
    pub ascent: f64,
    /// Depth below the baseline (negative)
    pub descent: f64,
    /// Height of capital letters
    pub cap_height: f64,
    /// Offset of the underline centre from the baseline (negative)
    pub underline_position: f64,
    /// Stroke thickness for underline and strikethrough
    pub underline_thickness: f64,
}

impl FontMetrics {
    /// Line height (ascent minus descent).
    pub fn line_height(&self) -> f64 {
        self.ascent - self.descent
    }

    /// Scale a 1/1000 em value to points at `size`.
    pub fn scale(value: f64, size: f64) -> f64 {
        value * size / 1000.0
    }
}

/// The 14 fonts every conforming viewer provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardFont {
    /// Helvetica
    Helvetica,
    /// Helvetica-Bold
    HelveticaBold,
    /// Helvetica-Oblique
    HelveticaOblique,
    /// Helvetica-BoldOblique
    HelveticaBoldOblique,
    /// Times-Roman
    TimesRoman,
    /// Times-Bold
    TimesBold,
    /// Times-Italic
    TimesItalic,
    /// Times-BoldItalic
    TimesBoldItalic,
    /// Courier
    Courier,
    /// Courier-Bold
    CourierBold,
    /// Courier-Oblique
    CourierOblique,
    /// Courier-BoldOblique
    CourierBoldOblique,
    /// Symbol
    Symbol,
    /// ZapfDingbats
    ZapfDingbats,
}

impl StandardFont {
    /// Look up a standard font by its PostScript name or a common alias.
    pub fn from_name(name: &str) -> Option<Self> {
        let font = match name {
            "Helvetica" | "Arial" => StandardFont::Helvetica,
            "Helvetica-Bold" | "Arial-Bold" => StandardFont::HelveticaBold,
            "Helvetica-Oblique" | "Arial-Italic" => StandardFont::HelveticaOblique,
            "Helvetica-BoldOblique" | "Arial-BoldItalic" => StandardFont::HelveticaBoldOblique,
            "Times-Roman" | "Times" => StandardFont::TimesRoman,
            "Times-Bold" => StandardFont::TimesBold,
            "Times-Italic" => StandardFont::TimesItalic,
            "Times-BoldItalic" => StandardFont::TimesBoldItalic,
            "Courier" => StandardFont::Courier,
            "Courier-Bold" => StandardFont::CourierBold,
            "Courier-Oblique" => StandardFont::CourierOblique,
            "Courier-BoldOblique" => StandardFont::CourierBoldOblique,
            "Symbol" => StandardFont::Symbol,
            "ZapfDingbats" => StandardFont::ZapfDingbats,
            _ => return None,
        };
        Some(font)
    }

    /// The `/BaseFont` name.
    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::TimesBoldItalic => "Times-BoldItalic",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
            StandardFont::CourierOblique => "Courier-Oblique",
            StandardFont::CourierBoldOblique => "Courier-BoldOblique",
            StandardFont::Symbol => "Symbol",
            StandardFont::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Symbol and ZapfDingbats use their built-in encodings.
    pub fn is_symbolic(self) -> bool {
        matches!(self, StandardFont::Symbol | StandardFont::ZapfDingbats)
    }

    /// Vertical metrics.
    pub fn metrics(self) -> FontMetrics {
        let (ascent, descent, cap_height, underline_position, underline_thickness) = match self {
            StandardFont::Helvetica
            | StandardFont::HelveticaOblique
            | StandardFont::HelveticaBold
            | StandardFont::HelveticaBoldOblique => (718.0, -207.0, 718.0, -100.0, 50.0),
            StandardFont::TimesRoman | StandardFont::TimesItalic => {
                (683.0, -217.0, 662.0, -100.0, 50.0)
            },
            StandardFont::TimesBold | StandardFont::TimesBoldItalic => {
                (676.0, -205.0, 676.0, -100.0, 50.0)
            },
            StandardFont::Courier | StandardFont::CourierOblique => {
                (629.0, -157.0, 562.0, -100.0, 50.0)
            },
            StandardFont::CourierBold | StandardFont::CourierBoldOblique => {
                (626.0, -142.0, 562.0, -100.0, 50.0)
            },
            StandardFont::Symbol => (1010.0, -293.0, 700.0, -100.0, 50.0),
            StandardFont::ZapfDingbats => (820.0, -143.0, 700.0, -100.0, 50.0),
        };
        FontMetrics {
            ascent,
            descent,
            cap_height,
            underline_position,
            underline_thickness,
        }
    }

    /// Advance width of one encoded byte.
    pub fn byte_width(self, byte: u8) -> f64 {
        let table = match self {
            StandardFont::Helvetica | StandardFont::HelveticaOblique => Some(&HELVETICA_WIDTHS),
            StandardFont::HelveticaBold | StandardFont::HelveticaBoldOblique => {
                Some(&HELVETICA_BOLD_WIDTHS)
            },
            StandardFont::Courier
            | StandardFont::CourierBold
            | StandardFont::CourierOblique
            | StandardFont::CourierBoldOblique => return 600.0,
            _ => None,
        };
        match table {
            Some(widths) if (32..=126).contains(&byte) => widths[(byte - 32) as usize] as f64,
            Some(_) => 556.0,
            None => self.average_width(),
        }
    }

    fn average_width(self) -> f64 {
        match self {
            StandardFont::TimesBold | StandardFont::TimesBoldItalic => 500.0,
            StandardFont::TimesRoman | StandardFont::TimesItalic => 470.0,
            StandardFont::Symbol => 600.0,
            StandardFont::ZapfDingbats => 790.0,
            _ => 556.0,
        }
    }
}

/// Helvetica advance widths for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Helvetica-Bold advance widths for ASCII 32..=126.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];

/// WinAnsiEncoding bytes outside Latin-1.
const WIN_ANSI_EXTRA: [(char, u8); 27] = [
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

/// Map a character to its WinAnsiEncoding byte.
pub fn win_ansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => WIN_ANSI_EXTRA.iter().find(|(ch, _)| *ch == c).map(|(_, b)| *b),
    }
}

/// Character for a WinAnsiEncoding byte.
pub fn win_ansi_char(byte: u8) -> Option<char> {
    match byte {
        0x20..=0x7E | 0xA0..=0xFF => Some(byte as char),
        b'\t' | b'\n' | b'\r' => Some(byte as char),
        _ => WIN_ANSI_EXTRA.iter().find(|(_, b)| *b == byte).map(|(ch, _)| *ch),
    }
}

/// One glyph of an embedded font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Glyph {
    /// Glyph id in the font program
    pub gid: u16,
    /// Advance width in font units
    pub advance: u16,
}

/// Font data supplied by a font subsetter.
///
/// The engine does not parse font files; the caller provides the glyph map
/// and metrics alongside the program bytes, which are embedded as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct FontProgram {
    /// PostScript name
    pub name: String,
    /// TrueType program bytes
    pub data: Vec<u8>,
    /// Design units per em
    pub units_per_em: u16,
    /// Ascender in font units
    pub ascent: i16,
    /// Descender in font units (negative)
    pub descent: i16,
    /// Cap height in font units
    pub cap_height: i16,
    /// Glyph bounding box in font units
    pub bbox: [i16; 4],
    /// Italic angle in degrees
    pub italic_angle: f64,
    /// Underline position in font units
    pub underline_position: i16,
    /// Underline thickness in font units
    pub underline_thickness: i16,
    /// Character to glyph map
    pub glyphs: BTreeMap<char, Glyph>,
}

impl FontProgram {
    /// Program with default vertical metrics for a 1000-unit em.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
            units_per_em: 1000,
            ascent: 800,
            descent: -200,
            cap_height: 700,
            bbox: [0, -200, 1000, 800],
            italic_angle: 0.0,
            underline_position: -100,
            underline_thickness: 50,
            glyphs: BTreeMap::new(),
        }
    }

    /// Map `c` to glyph `gid` with advance `advance` (font units).
    pub fn with_glyph(mut self, c: char, gid: u16, advance: u16) -> Self {
        self.glyphs.insert(c, Glyph { gid, advance });
        self
    }

    /// Set the units per em.
    pub fn with_units_per_em(mut self, units_per_em: u16) -> Self {
        self.units_per_em = units_per_em.max(1);
        self
    }

    /// Set ascent and descent.
    pub fn with_vertical_metrics(mut self, ascent: i16, descent: i16) -> Self {
        self.ascent = ascent;
        self.descent = descent;
        self
    }

    fn to_thousandths(&self, value: f64) -> f64 {
        value * 1000.0 / self.units_per_em.max(1) as f64
    }

    /// Metrics scaled to 1/1000 em.
    pub fn metrics(&self) -> FontMetrics {
        FontMetrics {
            ascent: self.to_thousandths(self.ascent as f64),
            descent: self.to_thousandths(self.descent as f64),
            cap_height: self.to_thousandths(self.cap_height as f64),
            underline_position: self.to_thousandths(self.underline_position as f64),
            underline_thickness: self.to_thousandths(self.underline_thickness as f64),
        }
    }

    /// Glyph table keyed by code point with advances scaled to 1/1000 em.
    pub fn scaled_glyphs(&self) -> BTreeMap<u32, Glyph> {
        self.glyphs
            .iter()
            .map(|(&c, glyph)| {
                let advance = self.to_thousandths(glyph.advance as f64).round() as u16;
                (c as u32, Glyph {
                    gid: glyph.gid,
                    advance,
                })
            })
            .collect()
    }
}

/// Measurement and encoding data for an embedded font, kept in document state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedMetrics {
    /// Vertical metrics
    pub metrics: FontMetrics,
    /// Code point to glyph, advances in 1/1000 em
    pub glyphs: BTreeMap<u32, Glyph>,
    /// Advance for characters missing from the map
    pub missing_width: f64,
}

/// A registered font as the text code sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FontKind {
    /// One of the standard 14 fonts, single-byte WinAnsi text
    Standard(StandardFont),
    /// Embedded font addressed by two-byte glyph ids
    Embedded(EmbeddedMetrics),
}

/// Text encoded for a specific font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedText {
    /// Bytes to place in the string operand
    pub bytes: Vec<u8>,
    /// Whether the bytes are glyph ids written as a hex string
    pub hex: bool,
}

impl FontKind {
    /// Vertical metrics.
    pub fn metrics(&self) -> FontMetrics {
        match self {
            FontKind::Standard(font) => font.metrics(),
            FontKind::Embedded(embedded) => embedded.metrics,
        }
    }

    /// Encode `text` for a string operand.
    ///
    /// Characters the font cannot show become `?` (standard fonts) or glyph 0.
    pub fn encode(&self, text: &str) -> EncodedText {
        match self {
            FontKind::Standard(font) if font.is_symbolic() => EncodedText {
                bytes: text.chars().map(|c| if (c as u32) < 256 { c as u8 } else { b'?' }).collect(),
                hex: false,
            },
            FontKind::Standard(_) => EncodedText {
                bytes: text.chars().map(|c| win_ansi_byte(c).unwrap_or(b'?')).collect(),
                hex: false,
            },
            FontKind::Embedded(embedded) => {
                let mut bytes = Vec::with_capacity(text.len() * 2);
                for c in text.chars() {
                    let gid = embedded.glyphs.get(&(c as u32)).map_or(0, |g| g.gid);
                    bytes.extend_from_slice(&gid.to_be_bytes());
                }
                EncodedText { bytes, hex: true }
            },
        }
    }

    /// Width of `text` in points at `size`, including character spacing.
    pub fn text_width(&self, text: &str, size: f64, char_spacing: f64) -> f64 {
        let mut units = 0.0;
        let mut count = 0usize;
        match self {
            FontKind::Standard(font) => {
                for byte in self.encode(text).bytes {
                    units += font.byte_width(byte);
                    count += 1;
                }
            },
            FontKind::Embedded(embedded) => {
                for c in text.chars() {
                    units += embedded
                        .glyphs
                        .get(&(c as u32))
                        .map_or(embedded.missing_width, |g| g.advance as f64);
                    count += 1;
                }
            },
        }
        FontMetrics::scale(units, size) + char_spacing * count as f64
    }
}
