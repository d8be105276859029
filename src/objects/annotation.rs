//! Annotations and interactive form fields.

use super::{PdfObject, number_array};
use crate::config::CompressionLevel;
use crate::error::Result;
use crate::object::{Object, ObjectRef, dict, name, text_string};
use crate::serializer::format_real;
use serde::{Deserialize, Serialize};

/// What an annotation does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// Link to an external URI
    Uri(String),
    /// Link to a page in this document
    GoTo {
        /// Target page
        page: ObjectRef,
        /// Target top in content-stream space
        top: f64,
    },
    /// Sticky note
    Text {
        /// Note text
        contents: String,
        /// Popup initially open
        open: bool,
    },
}

/// A page annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Behavior
    pub kind: AnnotationKind,
    /// Rectangle `[llx lly urx ury]` in content-stream space
    pub rect: [f64; 4],
    /// Page the annotation sits on
    pub page: ObjectRef,
    /// Border or icon color
    pub color: Option<[f64; 3]>,
}

impl Annotation {
    /// Subtype name.
    pub fn subtype(&self) -> &'static str {
        match self.kind {
            AnnotationKind::Uri(_) | AnnotationKind::GoTo { .. } => "Link",
            AnnotationKind::Text { .. } => "Text",
        }
    }
}

impl PdfObject for Annotation {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        let mut d = dict([
            ("Type", name("Annot")),
            ("Subtype", name(self.subtype())),
            ("Rect", number_array(&self.rect)),
            ("P", self.page.into()),
        ]);
        match &self.kind {
            AnnotationKind::Uri(uri) => {
                let action = dict([
                    ("S", name("URI")),
                    ("URI", Object::String(uri.as_bytes().to_vec())),
                ]);
                d.insert("A".into(), Object::Dictionary(action));
                d.insert("Border".into(), number_array(&[0.0, 0.0, 0.0]));
            },
            AnnotationKind::GoTo { page, top } => {
                d.insert(
                    "Dest".into(),
                    Object::Array(vec![
                        (*page).into(),
                        name("XYZ"),
                        Object::Null,
                        Object::Real(*top),
                        Object::Null,
                    ]),
                );
                d.insert("Border".into(), number_array(&[0.0, 0.0, 0.0]));
            },
            AnnotationKind::Text { contents, open } => {
                d.insert("Contents".into(), text_string(contents));
                d.insert("Open".into(), Object::Boolean(*open));
                d.insert("Name".into(), name("Note"));
            },
        }
        if let Some(color) = &self.color {
            d.insert("C".into(), number_array(color));
        }
        Ok(Object::Dictionary(d))
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        f(self.page);
        if let AnnotationKind::GoTo { page, .. } = &self.kind {
            f(*page);
        }
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        f(&mut self.page);
        if let AnnotationKind::GoTo { page, .. } = &mut self.kind {
            f(page);
        }
    }
}

/// Field type and value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Text input
    Text {
        /// Current value
        value: String,
        /// Accepts line breaks
        multiline: bool,
        /// Maximum length in characters
        max_len: Option<u32>,
    },
    /// Check box with an on state named `Yes`
    Checkbox {
        /// Current state
        checked: bool,
    },
}

/// A terminal form field merged with its widget annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    /// Fully qualified field name
    pub name: String,
    /// Type and value
    pub kind: FieldKind,
    /// Widget rectangle in content-stream space
    pub rect: [f64; 4],
    /// Page the widget sits on
    pub page: ObjectRef,
    /// Resource name of the appearance font
    pub font_resource: String,
    /// Appearance font
    pub font: ObjectRef,
    /// Appearance font size
    pub font_size: f64,
}

const FF_MULTILINE: i64 = 1 << 12;

impl FormField {
    /// Default appearance string.
    pub fn default_appearance(&self) -> String {
        format!("/{} {} Tf 0 g", self.font_resource, format_real(self.font_size))
    }
}

impl PdfObject for FormField {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        let mut d = dict([
            ("Type", name("Annot")),
            ("Subtype", name("Widget")),
            ("T", text_string(&self.name)),
            ("Rect", number_array(&self.rect)),
            ("P", self.page.into()),
            ("F", Object::Integer(4)),
            ("DA", Object::String(self.default_appearance().into_bytes())),
            (
                "DR",
                Object::Dictionary(dict([(
                    "Font",
                    Object::Dictionary(dict([(self.font_resource.as_str(), self.font.into())])),
                )])),
            ),
        ]);
        match &self.kind {
            FieldKind::Text {
                value,
                multiline,
                max_len,
            } => {
                d.insert("FT".into(), name("Tx"));
                d.insert("V".into(), text_string(value));
                if *multiline {
                    d.insert("Ff".into(), Object::Integer(FF_MULTILINE));
                }
                if let Some(max_len) = max_len {
                    d.insert("MaxLen".into(), Object::Integer(*max_len as i64));
                }
            },
            FieldKind::Checkbox { checked } => {
                let state = if *checked { "Yes" } else { "Off" };
                d.insert("FT".into(), name("Btn"));
                d.insert("V".into(), name(state));
                d.insert("AS".into(), name(state));
                d.insert(
                    "MK".into(),
                    Object::Dictionary(dict([("CA", Object::String(b"4".to_vec()))])),
                );
            },
        }
        Ok(Object::Dictionary(d))
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        f(self.page);
        f(self.font);
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        f(&mut self.page);
        f(&mut self.font);
    }
}
