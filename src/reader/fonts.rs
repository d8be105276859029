//! Character codes to text and widths, per font resource.

use super::RawDocument;
use super::content::parse;
use crate::content::StandardFont;
use crate::content::metrics::{win_ansi_byte, win_ansi_char};
use crate::object::{Dictionary, Object};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Width assumed when a font gives none, in glyph space.
const FALLBACK_WIDTH: f64 = 500.0;

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DecodedChar {
    pub code: u32,
    pub text: String,
    /// Advance in thousandths of the font size
    pub width: f64,
    /// Single-byte code 32, which word spacing applies to
    pub is_space: bool,
}

/// Decoder for the strings shown with one font.
#[derive(Debug, Clone, Default)]
pub(crate) struct FontDecoder {
    code_len: usize,
    to_unicode: HashMap<u32, String>,
    widths: HashMap<u32, f64>,
    default_width: f64,
    standard: Option<StandardFont>,
}

impl FontDecoder {
    /// Decoder for a font dictionary.
    pub fn new(doc: &RawDocument, font: &Dictionary) -> Self {
        let composite = font.get("Subtype").and_then(Object::as_name) == Some("Type0");
        let mut decoder = FontDecoder {
            code_len: if composite { 2 } else { 1 },
            default_width: FALLBACK_WIDTH,
            ..Default::default()
        };

        if let Some(cmap) = font.get("ToUnicode").and_then(Object::as_reference) {
            match doc.stream_data(cmap.id) {
                Ok(data) => decoder.read_cmap(&data),
                Err(err) => log::warn!("unreadable ToUnicode CMap {}: {}", cmap.id, err),
            }
        }

        if composite {
            decoder.read_cid_widths(doc, font);
        } else {
            decoder.read_simple_widths(doc, font);
        }
        decoder
    }

    /// Decoder for text with no usable font: single-byte WinAnsi.
    pub fn fallback() -> Self {
        FontDecoder {
            code_len: 1,
            default_width: FALLBACK_WIDTH,
            ..Default::default()
        }
    }

    fn read_cmap(&mut self, data: &[u8]) {
        let ops = parse(data);
        for op in &ops {
            match op.operator() {
                "endcodespacerange" => {
                    if let Some(lo) = op.operands().first().and_then(Object::as_string) {
                        self.code_len = lo.len().clamp(1, 4);
                    }
                },
                "endbfchar" => {
                    for pair in op.operands().chunks_exact(2) {
                        if let (Some(src), Some(dst)) = (pair[0].as_string(), pair[1].as_string()) {
                            self.to_unicode.insert(code_of(src), utf16_text(dst));
                        }
                    }
                },
                "endbfrange" => {
                    for triple in op.operands().chunks_exact(3) {
                        self.read_range(triple);
                    }
                },
                _ => {},
            }
        }
    }

    fn read_range(&mut self, triple: &[Object]) {
        let (Some(lo), Some(hi)) = (triple[0].as_string(), triple[1].as_string()) else {
            return;
        };
        let (lo, hi) = (code_of(lo), code_of(hi));
        if hi < lo || hi - lo > 0xFFFF {
            log::warn!("ignoring ToUnicode range {:X}..{:X}", lo, hi);
            return;
        }
        match &triple[2] {
            Object::String(dst) => {
                let mut units: Vec<u16> = dst.chunks(2).map(|p| u16::from_be_bytes([p[0], *p.get(1).unwrap_or(&0)])).collect();
                for code in lo..=hi {
                    self.to_unicode.insert(code, String::from_utf16_lossy(&units));
                    if let Some(last) = units.last_mut() {
                        *last = last.wrapping_add(1);
                    }
                }
            },
            Object::Array(items) => {
                for (code, item) in (lo..=hi).zip(items) {
                    if let Some(dst) = item.as_string() {
                        self.to_unicode.insert(code, utf16_text(dst));
                    }
                }
            },
            _ => {},
        }
    }

    fn read_simple_widths(&mut self, doc: &RawDocument, font: &Dictionary) {
        let missing = font
            .get("FontDescriptor")
            .map(|d| doc.resolve(d))
            .and_then(|d| d.get("MissingWidth"))
            .and_then(|w| doc.resolve(w).as_number());
        self.standard = font.get("BaseFont").and_then(Object::as_name).and_then(StandardFont::from_name);
        self.default_width = missing.unwrap_or(if self.standard.is_some() { 0.0 } else { FALLBACK_WIDTH });

        let first = font.get("FirstChar").and_then(|f| doc.resolve(f).as_integer());
        let widths = font.get("Widths").map(|w| doc.resolve(w)).and_then(Object::as_array);
        if let (Some(first), Some(widths)) = (first, widths) {
            for (i, w) in widths.iter().enumerate() {
                if let (Ok(code), Some(w)) = (u32::try_from(first + i as i64), doc.resolve(w).as_number()) {
                    self.widths.insert(code, w);
                }
            }
        }
    }

    fn read_cid_widths(&mut self, doc: &RawDocument, font: &Dictionary) {
        let Some(descendant) = font
            .get("DescendantFonts")
            .map(|d| doc.resolve(d))
            .and_then(Object::as_array)
            .and_then(|fonts| fonts.first())
            .map(|d| doc.resolve(d))
        else {
            return;
        };
        self.default_width = descendant
            .get("DW")
            .and_then(|w| doc.resolve(w).as_number())
            .unwrap_or(1000.0);

        let Some(w) = descendant.get("W").map(|w| doc.resolve(w)).and_then(Object::as_array) else {
            return;
        };
        let mut i = 0;
        while i < w.len() {
            let Some(start) = doc.resolve(&w[i]).as_integer() else {
                break;
            };
            match w.get(i + 1).map(|n| doc.resolve(n)) {
                // c [w1 w2 ...]
                Some(Object::Array(list)) => {
                    for (k, width) in list.iter().enumerate() {
                        if let Some(width) = doc.resolve(width).as_number() {
                            self.widths.insert((start + k as i64) as u32, width);
                        }
                    }
                    i += 2;
                },
                // c_first c_last w
                Some(end) => {
                    let (Some(end), Some(width)) = (
                        end.as_integer(),
                        w.get(i + 2).and_then(|v| doc.resolve(v).as_number()),
                    ) else {
                        break;
                    };
                    for code in start..=end.min(start + 0xFFFF) {
                        self.widths.insert(code as u32, width);
                    }
                    i += 3;
                },
                None => break,
            }
        }
    }

    fn width(&self, code: u32) -> f64 {
        if let Some(w) = self.widths.get(&code) {
            return *w;
        }
        match self.standard {
            Some(font) if self.code_len == 1 && self.default_width == 0.0 => font.byte_width(code as u8),
            _ => self.default_width,
        }
    }

    /// Split shown bytes into character codes with text and advance.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedChar> {
        bytes
            .chunks(self.code_len)
            .map(|chunk| {
                let code = code_of(chunk);
                let text = match self.to_unicode.get(&code) {
                    Some(text) => text.clone(),
                    None if self.code_len == 1 => win_ansi_char(chunk[0]).map(String::from).unwrap_or_default(),
                    None => char::from_u32(code).map(String::from).unwrap_or_default(),
                };
                DecodedChar {
                    code,
                    text,
                    width: self.width(code),
                    is_space: self.code_len == 1 && code == 32,
                }
            })
            .collect()
    }

    /// Decoded text of shown bytes.
    pub fn decode_text(&self, bytes: &[u8]) -> String {
        self.decode(bytes).into_iter().map(|c| c.text).collect()
    }

    /// Encode `text` for this font. `None` when some character has no code.
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        let mut out = Vec::new();
        if !self.to_unicode.is_empty() {
            let inverse: HashMap<&str, u32> = self.to_unicode.iter().map(|(code, s)| (s.as_str(), *code)).collect();
            let mut buf = [0u8; 4];
            for c in text.chars() {
                let code = *inverse.get(&*c.encode_utf8(&mut buf))?;
                out.extend_from_slice(&code.to_be_bytes()[4 - self.code_len..]);
            }
            return Some(out);
        }
        if self.code_len != 1 {
            return None;
        }
        for c in text.chars() {
            out.push(win_ansi_byte(c)?);
        }
        Some(out)
    }
}

/// Big-endian code value of up to four bytes.
fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().take(4).fold(0, |acc, &b| acc << 8 | b as u32)
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Decoders for every font in a resource dictionary, by resource name.
pub(crate) fn font_decoders(doc: &RawDocument, resources: &Dictionary) -> HashMap<String, FontDecoder> {
    doc.resource_entries(resources, "Font")
        .iter()
        .filter_map(|(name, font)| Some((name.clone(), FontDecoder::new(doc, doc.resolve(font).as_dict()?))))
        .collect()
}

/// Decoder for the font named by the last `Tf`, or single-byte text when
/// the name is unknown.
pub(crate) fn current_decoder<'d>(decoders: &'d HashMap<String, FontDecoder>, font: Option<&str>) -> &'d FontDecoder {
    static FALLBACK: OnceLock<FontDecoder> = OnceLock::new();
    match font.and_then(|name| decoders.get(name)) {
        Some(decoder) => decoder,
        None => FALLBACK.get_or_init(FontDecoder::fallback),
    }
}
