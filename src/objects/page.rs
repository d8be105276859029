//! Document structure: catalog, page tree, pages, content, and info.

use super::{PdfObject, number_array, stream_object, visit_opt, visit_opt_mut};
use crate::config::{CompressionLevel, DocumentInfo};
use crate::content::{ContentCache, EmitContext};
use crate::error::Result;
use crate::object::{Dictionary, Object, ObjectRef, dict, name, text_string};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Page label numbering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelStyle {
    /// 1, 2, 3
    Decimal,
    /// I, II, III
    RomanUpper,
    /// i, ii, iii
    RomanLower,
    /// A, B, C
    AlphaUpper,
    /// a, b, c
    AlphaLower,
    /// Prefix only
    None,
}

/// A page label range starting at some page index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLabel {
    /// Numbering style
    pub style: LabelStyle,
    /// Text placed before the number
    pub prefix: Option<String>,
    /// First number in the range
    pub start: u32,
}

impl PageLabel {
    fn to_object(&self) -> Object {
        let mut d = Dictionary::new();
        let style = match self.style {
            LabelStyle::Decimal => Some("D"),
            LabelStyle::RomanUpper => Some("R"),
            LabelStyle::RomanLower => Some("r"),
            LabelStyle::AlphaUpper => Some("A"),
            LabelStyle::AlphaLower => Some("a"),
            LabelStyle::None => None,
        };
        if let Some(style) = style {
            d.insert("S".into(), name(style));
        }
        if let Some(prefix) = &self.prefix {
            d.insert("P".into(), text_string(prefix));
        }
        if self.start != 1 {
            d.insert("St".into(), Object::Integer(self.start as i64));
        }
        Object::Dictionary(d)
    }
}

/// Document catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Page tree root
    pub pages: ObjectRef,
    /// Outline root, once a bookmark exists
    pub outlines: Option<ObjectRef>,
    /// Label ranges keyed by first page index
    pub page_labels: Vec<(usize, PageLabel)>,
    /// Terminal form fields
    pub fields: Vec<ObjectRef>,
    /// Fonts available to form field appearances
    pub form_fonts: IndexMap<String, ObjectRef>,
    /// Embedded file specifications by name
    pub embedded_files: Vec<(String, ObjectRef)>,
}

impl Catalog {
    /// Catalog pointing at a page tree.
    pub fn new(pages: ObjectRef) -> Self {
        Self {
            pages,
            outlines: None,
            page_labels: Vec::new(),
            fields: Vec::new(),
            form_fonts: IndexMap::new(),
            embedded_files: Vec::new(),
        }
    }
}

impl PdfObject for Catalog {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        let mut d = dict([("Type", name("Catalog")), ("Pages", self.pages.into())]);

        if let Some(outlines) = self.outlines {
            d.insert("Outlines".into(), outlines.into());
            d.insert("PageMode".into(), name("UseOutlines"));
        }

        if !self.page_labels.is_empty() {
            let mut labels = self.page_labels.clone();
            labels.sort_by_key(|(index, _)| *index);
            let nums = labels
                .iter()
                .flat_map(|(index, label)| [Object::Integer(*index as i64), label.to_object()])
                .collect();
            d.insert("PageLabels".into(), Object::Dictionary(dict([("Nums", Object::Array(nums))])));
        }

        if !self.fields.is_empty() {
            let fonts: Dictionary = self
                .form_fonts
                .iter()
                .map(|(res, r)| (res.clone(), Object::Reference(*r)))
                .collect();
            let acro_form = dict([
                ("Fields", Object::Array(self.fields.iter().map(|r| (*r).into()).collect())),
                ("NeedAppearances", Object::Boolean(true)),
                ("DR", Object::Dictionary(dict([("Font", Object::Dictionary(fonts))]))),
            ]);
            d.insert("AcroForm".into(), Object::Dictionary(acro_form));
        }

        if !self.embedded_files.is_empty() {
            let mut files = self.embedded_files.clone();
            files.sort_by(|a, b| a.0.cmp(&b.0));
            let names = files
                .iter()
                .flat_map(|(n, r)| [text_string(n), Object::Reference(*r)])
                .collect();
            let tree = dict([("Names", Object::Array(names))]);
            d.insert(
                "Names".into(),
                Object::Dictionary(dict([("EmbeddedFiles", Object::Dictionary(tree))])),
            );
        }

        Ok(Object::Dictionary(d))
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        f(self.pages);
        visit_opt(&self.outlines, f);
        self.fields.iter().for_each(|r| f(*r));
        self.form_fonts.values().for_each(|r| f(*r));
        self.embedded_files.iter().for_each(|(_, r)| f(*r));
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        f(&mut self.pages);
        visit_opt_mut(&mut self.outlines, f);
        self.fields.iter_mut().for_each(|r| f(r));
        self.form_fonts.values_mut().for_each(|r| f(r));
        self.embedded_files.iter_mut().for_each(|(_, r)| f(r));
    }
}

/// Root of the page tree; all pages are direct kids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTree {
    /// Pages in order
    pub kids: Vec<ObjectRef>,
}

impl PdfObject for PageTree {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        Ok(Object::Dictionary(dict([
            ("Type", name("Pages")),
            ("Kids", Object::Array(self.kids.iter().map(|r| (*r).into()).collect())),
            ("Count", Object::Integer(self.kids.len() as i64)),
        ])))
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        self.kids.iter().for_each(|r| f(*r));
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        self.kids.iter_mut().for_each(|r| f(r));
    }
}

/// Named resources used by a content stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    /// Fonts by resource name
    pub fonts: IndexMap<String, ObjectRef>,
    /// Images and forms by resource name
    pub xobjects: IndexMap<String, ObjectRef>,
    /// Graphics states by resource name
    pub ext_gstates: IndexMap<String, ObjectRef>,
    /// Color spaces by resource name
    pub color_spaces: IndexMap<String, ObjectRef>,
}

impl Resources {
    fn category(map: &IndexMap<String, ObjectRef>) -> Object {
        Object::Dictionary(map.iter().map(|(k, r)| (k.clone(), Object::Reference(*r))).collect())
    }

    /// Resource dictionary.
    pub fn to_object(&self) -> Object {
        let mut d = dict([(
            "ProcSet",
            Object::Array(
                ["PDF", "Text", "ImageB", "ImageC", "ImageI"]
                    .iter()
                    .map(|s| name(s))
                    .collect(),
            ),
        )]);
        for (key, map) in [
            ("Font", &self.fonts),
            ("XObject", &self.xobjects),
            ("ExtGState", &self.ext_gstates),
            ("ColorSpace", &self.color_spaces),
        ] {
            if !map.is_empty() {
                d.insert(key.into(), Self::category(map));
            }
        }
        Object::Dictionary(d)
    }

    fn maps(&self) -> [&IndexMap<String, ObjectRef>; 4] {
        [&self.fonts, &self.xobjects, &self.ext_gstates, &self.color_spaces]
    }

    /// Call `f` for every referenced resource.
    pub fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        for map in self.maps() {
            map.values().for_each(|r| f(*r));
        }
    }

    /// Call `f` on every referenced resource, allowing renumbering.
    pub fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        for map in [
            &mut self.fonts,
            &mut self.xobjects,
            &mut self.ext_gstates,
            &mut self.color_spaces,
        ] {
            map.values_mut().for_each(|r| f(r));
        }
    }
}

/// One page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page tree node
    pub parent: ObjectRef,
    /// Media box `[llx lly urx ury]`
    pub media_box: [f64; 4],
    /// Visible region
    pub crop_box: Option<[f64; 4]>,
    /// Finished page region
    pub trim_box: Option<[f64; 4]>,
    /// Clockwise rotation, a multiple of 90
    pub rotate: i32,
    /// Inline resource dictionary
    pub resources: Resources,
    /// Content streams in drawing order
    pub contents: Vec<ObjectRef>,
    /// Annotations and widgets
    pub annots: Vec<ObjectRef>,
}

impl Page {
    /// Page of the given size.
    pub fn new(parent: ObjectRef, width: f64, height: f64) -> Self {
        Self {
            parent,
            media_box: [0.0, 0.0, width, height],
            crop_box: None,
            trim_box: None,
            rotate: 0,
            resources: Resources::default(),
            contents: Vec::new(),
            annots: Vec::new(),
        }
    }

    /// Height of the media box.
    pub fn height(&self) -> f64 {
        self.media_box[3] - self.media_box[1]
    }
}

impl PdfObject for Page {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        let mut d = dict([
            ("Type", name("Page")),
            ("Parent", self.parent.into()),
            ("MediaBox", number_array(&self.media_box)),
            ("Resources", self.resources.to_object()),
        ]);
        if let Some(crop) = &self.crop_box {
            d.insert("CropBox".into(), number_array(crop));
        }
        if let Some(trim) = &self.trim_box {
            d.insert("TrimBox".into(), number_array(trim));
        }
        if self.rotate != 0 {
            d.insert("Rotate".into(), Object::Integer(self.rotate as i64));
        }
        match self.contents.as_slice() {
            [] => {},
            [single] => {
                d.insert("Contents".into(), (*single).into());
            },
            many => {
                d.insert(
                    "Contents".into(),
                    Object::Array(many.iter().map(|r| (*r).into()).collect()),
                );
            },
        }
        if !self.annots.is_empty() {
            d.insert(
                "Annots".into(),
                Object::Array(self.annots.iter().map(|r| (*r).into()).collect()),
            );
        }
        Ok(Object::Dictionary(d))
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        f(self.parent);
        self.resources.visit_refs(f);
        self.contents.iter().for_each(|r| f(*r));
        self.annots.iter().for_each(|r| f(*r));
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        f(&mut self.parent);
        self.resources.visit_refs_mut(f);
        self.contents.iter_mut().for_each(|r| f(r));
        self.annots.iter_mut().for_each(|r| f(r));
    }
}

/// A page content stream built from an operator cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentStream {
    /// Drawing records
    pub cache: ContentCache,
    /// Height used to flip caller-space Y
    pub page_height: f64,
}

impl ContentStream {
    /// Empty content for a page of the given height.
    pub fn new(page_height: f64) -> Self {
        Self {
            cache: ContentCache::new(),
            page_height,
        }
    }

    /// Operator text, uncompressed.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.cache.to_bytes(&EmitContext {
            page_height: self.page_height,
        })
    }
}

impl PdfObject for ContentStream {
    fn to_object(&self, compression: CompressionLevel) -> Result<Object> {
        stream_object(Dictionary::new(), &self.to_bytes()?, compression)
    }

    fn visit_refs(&self, _: &mut dyn FnMut(ObjectRef)) {}

    fn visit_refs_mut(&mut self, _: &mut dyn FnMut(&mut ObjectRef)) {}
}

/// Document information dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoDict {
    /// Descriptive fields
    pub info: DocumentInfo,
    /// `D:YYYYMMDDHHmmSS` creation stamp
    pub creation_date: String,
}

impl InfoDict {
    /// Info stamped with the current local time.
    pub fn new(info: DocumentInfo) -> Self {
        Self {
            info,
            creation_date: format_date(chrono::Local::now()),
        }
    }
}

/// Format a timestamp as a date string.
pub fn format_date<Tz: chrono::TimeZone>(time: chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("D:{}", time.format("%Y%m%d%H%M%S"))
}

impl PdfObject for InfoDict {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        let mut d = Dictionary::new();
        let fields = [
            ("Title", &self.info.title),
            ("Author", &self.info.author),
            ("Subject", &self.info.subject),
            ("Keywords", &self.info.keywords),
            ("Creator", &self.info.creator),
            ("Producer", &self.info.producer),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                d.insert(key.into(), text_string(value));
            }
        }
        d.insert("CreationDate".into(), Object::String(self.creation_date.clone().into_bytes()));
        d.insert("ModDate".into(), Object::String(self.creation_date.clone().into_bytes()));
        Ok(Object::Dictionary(d))
    }

    fn visit_refs(&self, _: &mut dyn FnMut(ObjectRef)) {}

    fn visit_refs_mut(&mut self, _: &mut dyn FnMut(&mut ObjectRef)) {}
}
