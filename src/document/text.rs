//! Fonts and text drawing.

use super::{Document, FontEntry, ResourceKind};
use crate::content::{
    Align, Border, CacheEntry, Cell, Color, Decoration, EmbeddedMetrics, FontKind, FontProgram,
    StandardFont, TextRun, VAlign,
};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::object::{Object, ObjectRef};
use crate::objects::{DataStream, Font, FontDescriptor, IndirectObject, to_unicode_cmap};

/// Advance used for characters an embedded font does not map, in 1/1000 em.
const MISSING_WIDTH: u16 = 1000;

/// Font descriptor flag for fonts using the standard Latin character set.
const FLAG_NONSYMBOLIC: u32 = 1 << 5;

/// Font descriptor flag for italic fonts.
const FLAG_ITALIC: u32 = 1 << 6;

/// Layout options for [`Document::cell`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CellOptions {
    /// Horizontal alignment
    pub align: Align,
    /// Vertical alignment
    pub valign: VAlign,
    /// Border segments to draw
    pub border: Border,
    /// Underline and strikethrough
    pub decoration: Decoration,
}

impl CellOptions {
    /// Set the horizontal alignment.
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Set the vertical alignment.
    pub fn valign(mut self, valign: VAlign) -> Self {
        self.valign = valign;
        self
    }

    /// Set the border segments.
    pub fn border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }

    /// Set underline and strikethrough.
    pub fn decoration(mut self, decoration: Decoration) -> Self {
        self.decoration = decoration;
        self
    }
}

impl Document {
    fn next_font_resource(&mut self) -> String {
        super::Counters::next(&mut self.state.counters.font, "F")
    }

    /// Register one of the standard 14 fonts, returning its entry.
    pub(super) fn standard_font(&mut self, font: StandardFont) -> FontEntry {
        let key = font.base_font().to_string();
        if let Some(entry) = self.state.fonts.get(&key) {
            return entry.clone();
        }
        let object = self.state.registry.allocate(IndirectObject::Font(Font::Standard(font)));
        let entry = FontEntry {
            resource: self.next_font_resource(),
            object,
            kind: FontKind::Standard(font),
        };
        log::debug!("registered standard font {} as {}", key, entry.resource);
        self.state.fonts.insert(key, entry.clone());
        entry
    }

    /// Embed a font program. Returns the name to pass to [`set_font`](Self::set_font).
    pub fn add_font(&mut self, program: FontProgram) -> Result<String> {
        if self.state.fonts.contains_key(&program.name) {
            return Err(Error::InvalidArgument(format!("font {} is already registered", program.name)));
        }

        let metrics = program.metrics();
        let glyphs = program.scaled_glyphs();
        let scale = 1000.0 / program.units_per_em.max(1) as f64;
        let registry = &mut self.state.registry;

        let mut file = DataStream::new(program.data.clone());
        file.dict.insert("Length1".into(), Object::Integer(program.data.len() as i64));
        let font_file = registry.allocate(IndirectObject::Stream(file));

        let mut flags = FLAG_NONSYMBOLIC;
        if program.italic_angle != 0.0 {
            flags |= FLAG_ITALIC;
        }
        let descriptor = registry.allocate(IndirectObject::FontDescriptor(FontDescriptor {
            font_name: program.name.clone(),
            flags,
            bbox: program.bbox.map(|v| v as f64 * scale),
            italic_angle: program.italic_angle,
            ascent: metrics.ascent,
            descent: metrics.descent,
            cap_height: metrics.cap_height,
            stem_v: 80.0,
            font_file,
        }));

        let to_unicode =
            registry.allocate(IndirectObject::Stream(DataStream::new(to_unicode_cmap(&glyphs))));

        let mut widths: Vec<(u16, u16)> = glyphs.values().map(|g| (g.gid, g.advance)).collect();
        widths.sort_unstable();
        widths.dedup_by_key(|(gid, _)| *gid);
        let descendant = registry.allocate(IndirectObject::Font(Font::CidFont {
            base_font: program.name.clone(),
            descriptor,
            widths,
            default_width: MISSING_WIDTH,
        }));

        let object = registry.allocate(IndirectObject::Font(Font::Type0 {
            base_font: program.name.clone(),
            descendant,
            to_unicode,
        }));

        let entry = FontEntry {
            resource: self.next_font_resource(),
            object,
            kind: FontKind::Embedded(EmbeddedMetrics {
                metrics,
                glyphs,
                missing_width: MISSING_WIDTH as f64,
            }),
        };
        log::debug!(
            "embedded font {} ({} glyphs, {} bytes) as {}",
            program.name,
            program.glyphs.len(),
            program.data.len(),
            entry.resource
        );
        self.state.fonts.insert(program.name.clone(), entry);
        self.commit("add_font")?;
        Ok(program.name)
    }

    /// Select the font for later text. Standard 14 names register on first
    /// use; other names must have been added with [`add_font`](Self::add_font).
    /// The size is in points.
    pub fn set_font(&mut self, name: &str, size: f64) -> Result<()> {
        let entry = match self.state.fonts.get(name) {
            Some(entry) => entry.clone(),
            None => {
                let font = StandardFont::from_name(name).ok_or_else(|| Error::FontNotFound(name.to_string()))?;
                self.standard_font(font)
            },
        };
        let key = match &entry.kind {
            FontKind::Standard(font) => font.base_font().to_string(),
            FontKind::Embedded(_) => name.to_string(),
        };
        if self.has_target() {
            self.ensure_resource(ResourceKind::Font, &entry.resource, entry.object)?;
        }
        self.state.current_font = Some(key);
        self.state.font_size = size;
        self.commit("set_font")
    }

    /// Current font size in points.
    pub fn font_size(&self) -> f64 {
        self.state.font_size
    }

    /// Set the text fill color.
    pub fn set_text_color(&mut self, color: Color) -> Result<()> {
        self.ensure_color(&color)?;
        self.state.text_color = Some(color);
        self.commit("set_text_color")
    }

    /// Extra space after each character, in caller units.
    pub fn set_char_spacing(&mut self, spacing: f64) -> Result<()> {
        self.state.char_spacing = self.pt(spacing);
        self.commit("set_char_spacing")
    }

    /// Underline and strikethrough for text drawn with [`text`](Self::text).
    pub fn set_text_decoration(&mut self, decoration: Decoration) -> Result<()> {
        self.state.decoration = decoration;
        self.commit("set_text_decoration")
    }

    fn current_font(&self) -> Result<FontEntry> {
        let name = self.state.current_font.as_ref().ok_or(Error::NoFontSelected)?;
        self.state.fonts.get(name).cloned().ok_or_else(|| Error::FontNotFound(name.clone()))
    }

    /// Width of `text` in the current font, in caller units.
    pub fn text_width(&self, text: &str) -> Result<f64> {
        let font = self.current_font()?;
        let points = font.kind.text_width(text, self.state.font_size, self.state.char_spacing);
        Ok(points / self.config.unit.points())
    }

    fn text_run(&mut self, x: f64, y: f64, text: &str, cell: Option<Cell>, decoration: Decoration) -> Result<TextRun> {
        self.target()?;
        let font = self.current_font()?;
        self.ensure_resource(ResourceKind::Font, &font.resource, font.object)?;
        if let Some(color) = self.state.text_color.clone() {
            self.ensure_color(&color)?;
        }
        let gstates = self.active_gstates()?;

        let size = self.state.font_size;
        let spacing = self.state.char_spacing;
        Ok(TextRun {
            font: font.resource,
            size,
            text: text.to_string(),
            encoded: font.kind.encode(text),
            x,
            y,
            width: font.kind.text_width(text, size, spacing),
            metrics: font.kind.metrics(),
            color: self.state.text_color.clone(),
            char_spacing: spacing,
            cell,
            decoration,
            gstates,
        })
    }

    /// Draw `text` with its baseline starting at (`x`, `y`).
    pub fn text(&mut self, x: f64, y: f64, text: &str) -> Result<()> {
        let decoration = self.state.decoration;
        let run = self.text_run(self.pt(x), self.pt(y), text, None, decoration)?;
        self.push_entry(CacheEntry::Text(run))?;
        self.commit("text")
    }

    /// Draw `text` aligned inside `rect`, optionally with borders.
    pub fn cell(&mut self, rect: Rect, text: &str, options: CellOptions) -> Result<()> {
        let rect = self.pt_rect(rect);
        let cell = Cell {
            width: rect.width,
            height: rect.height,
            align: options.align,
            valign: options.valign,
            border: options.border,
        };
        let run = self.text_run(rect.x, rect.y, text, Some(cell), options.decoration)?;
        self.push_entry(CacheEntry::Text(run))?;
        self.commit("cell")
    }

    /// Reference of a registered font's dictionary.
    pub fn font_ref(&self, name: &str) -> Option<ObjectRef> {
        self.state.fonts.get(name).map(|f| f.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompressionLevel, DocumentConfig};
    use crate::content::PaintStyle;

    fn doc() -> Document {
        let mut doc = Document::new(DocumentConfig::new().with_compression(CompressionLevel::None)).unwrap();
        doc.add_page().unwrap();
        doc
    }

    fn content(doc: &Document) -> String {
        let handle = doc.page_handle(doc.current_page().unwrap()).unwrap();
        match doc.registry().get(handle.content) {
            Some(IndirectObject::Content(content)) => String::from_utf8(content.to_bytes().unwrap()).unwrap(),
            _ => panic!("missing content"),
        }
    }

    fn program() -> FontProgram {
        FontProgram::new("TestSans", vec![0, 1, 0, 0])
            .with_units_per_em(2048)
            .with_glyph('A', 36, 1366)
            .with_glyph('B', 37, 1366)
    }

    #[test]
    fn test_text_requires_page_and_font() {
        let mut doc = Document::new(DocumentConfig::new()).unwrap();
        assert!(matches!(doc.text(0.0, 0.0, "x"), Err(Error::NoCurrentPage)));
        doc.add_page().unwrap();
        assert!(matches!(doc.text(0.0, 0.0, "x"), Err(Error::NoFontSelected)));
        assert!(matches!(doc.set_font("NoSuchFont", 10.0), Err(Error::FontNotFound(_))));
    }

    #[test]
    fn test_standard_font_registered_once() {
        let mut doc = doc();
        doc.set_font("Helvetica", 12.0).unwrap();
        doc.set_font("Helvetica", 14.0).unwrap();
        assert_eq!(doc.state.fonts.len(), 1);
        let page = doc.page(0).unwrap();
        assert_eq!(page.resources.fonts.keys().collect::<Vec<_>>(), vec!["F1"]);
    }

    #[test]
    fn test_text_flips_y() {
        let mut doc = doc();
        doc.set_font("Courier", 10.0).unwrap();
        doc.text(72.0, 100.0, "Hi").unwrap();
        let height = doc.page_handle(0).unwrap().height;
        let expected = format!("{} Td", crate::serializer::format_real(height - 100.0));
        assert!(content(&doc).contains(&format!("72 {}", expected)));
    }

    #[test]
    fn test_text_width_in_caller_units() {
        let mut doc = doc();
        doc.set_font("Courier", 10.0).unwrap();
        // Courier advances 600/1000 em
        assert!((doc.text_width("abc").unwrap() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_embedded_font_objects() {
        let mut doc = doc();
        let name = doc.add_font(program()).unwrap();
        assert!(matches!(doc.add_font(program()), Err(Error::InvalidArgument(_))));
        doc.set_font(&name, 20.0).unwrap();
        doc.text(10.0, 10.0, "AB").unwrap();
        assert!(content(&doc).contains("<00240025> Tj"));

        let type0 = doc.font_ref(&name).unwrap();
        let Some(IndirectObject::Font(Font::Type0 { descendant, .. })) = doc.registry().get(type0) else {
            panic!("expected Type0 font");
        };
        let Some(IndirectObject::Font(Font::CidFont { widths, .. })) = doc.registry().get(*descendant) else {
            panic!("expected CID font");
        };
        // 1366 / 2048 em
        assert_eq!(widths, &vec![(36, 667), (37, 667)]);
    }

    #[test]
    fn test_cell_with_options() {
        let mut doc = doc();
        doc.set_font("Helvetica", 10.0).unwrap();
        doc.cell(
            Rect::new(10.0, 10.0, 100.0, 20.0),
            "Total",
            CellOptions::default()
                .align(Align::Right)
                .border(Border::ALL)
                .decoration(Decoration::UNDERLINE),
        )
        .unwrap();
        let out = content(&doc);
        assert_eq!(out.matches("\nS\n").count(), 4);
        assert!(out.contains(" re\nf\n"));
    }

    #[test]
    fn test_text_color_and_spacing() {
        let mut doc = doc();
        doc.set_font("Helvetica", 10.0).unwrap();
        doc.set_text_color(Color::Rgb(0.0, 0.0, 1.0)).unwrap();
        doc.set_char_spacing(1.5).unwrap();
        doc.text(0.0, 50.0, "x").unwrap();
        let out = content(&doc);
        assert!(out.contains("0 0 1 rg\n1.5 Tc\n"));
    }

    #[test]
    fn test_text_state_does_not_leak() {
        let mut doc = doc();
        doc.set_font("Helvetica", 10.0).unwrap();
        doc.set_fill_color(Color::Rgb(0.0, 0.0, 1.0)).unwrap();
        doc.set_text_color(Color::Rgb(1.0, 0.0, 0.0)).unwrap();
        doc.set_char_spacing(3.0).unwrap();
        doc.text(10.0, 10.0, "red").unwrap();
        doc.set_char_spacing(0.0).unwrap();
        doc.text(10.0, 40.0, "plain").unwrap();
        doc.rect(Rect::new(10.0, 60.0, 50.0, 20.0), PaintStyle::Fill).unwrap();

        let out = content(&doc);
        assert!(out.find("0 0 1 rg\n").unwrap() < out.find("(red) Tj").unwrap());
        assert_eq!(out.matches("q\n").count(), out.matches("Q\n").count());

        let red = out.find("(red) Tj").unwrap();
        let plain = out.find("(plain) Tj").unwrap();
        let closed = out[red..plain].find("Q\n").map(|i| red + i).unwrap();
        assert!(closed < plain);
        let plain_run = &out[out[..plain].rfind("q\n").unwrap()..];
        let plain_run = &plain_run[..plain_run.find("Q\n").unwrap()];
        assert!(!plain_run.contains("Tc"));

        // nothing between the last restore and the rect changes the fill
        let tail = &out[out.rfind("Q\n").unwrap()..];
        assert!(tail.contains(" re\nf\n"));
        assert!(!tail.contains("rg"));
    }
}
