//! Outline (bookmark) nodes.
//!
//! Nodes live in the object registry and link to each other by reference:
//! `prev`/`next` between siblings, `first`/`last` down to children and
//! `parent` back up. The root holds the first and last top-level nodes.

use super::{PdfObject, number_array, visit_opt, visit_opt_mut};
use crate::config::CompressionLevel;
use crate::error::Result;
use crate::object::{Object, ObjectRef, dict, name, text_string};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// The `/Outlines` dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlineRoot {
    /// First top-level node
    pub first: Option<ObjectRef>,
    /// Last top-level node
    pub last: Option<ObjectRef>,
    /// Number of live nodes at every depth
    pub count: usize,
}

impl PdfObject for OutlineRoot {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        let mut d = dict([("Type", name("Outlines"))]);
        if let (Some(first), Some(last)) = (self.first, self.last) {
            d.insert("First".into(), first.into());
            d.insert("Last".into(), last.into());
        }
        d.insert("Count".into(), Object::Integer(self.count as i64));
        Ok(Object::Dictionary(d))
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        visit_opt(&self.first, f);
        visit_opt(&self.last, f);
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        visit_opt_mut(&mut self.first, f);
        visit_opt_mut(&mut self.last, f);
    }
}

bitflags! {
    /// Outline item text style (`/F`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct OutlineFlags: u32 {
        /// Italic title
        const ITALIC = 1;
        /// Bold title
        const BOLD = 2;
    }
}

/// How a bookmark title is shown.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OutlineStyle {
    /// Bold/italic flags
    pub flags: OutlineFlags,
    /// Title color as RGB
    pub color: Option<(f64, f64, f64)>,
    /// Children hidden initially
    pub collapsed: bool,
}

impl OutlineStyle {
    /// Bold title.
    pub fn bold(mut self) -> Self {
        self.flags |= OutlineFlags::BOLD;
        self
    }

    /// Italic title.
    pub fn italic(mut self) -> Self {
        self.flags |= OutlineFlags::ITALIC;
        self
    }

    /// Colored title.
    pub fn color(mut self, r: f64, g: f64, b: f64) -> Self {
        self.color = Some((r, g, b));
        self
    }

    /// Start collapsed.
    pub fn collapsed(mut self) -> Self {
        self.collapsed = true;
        self
    }
}

/// One bookmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineItem {
    /// Title text
    pub title: String,
    /// Parent node or the outline root
    pub parent: ObjectRef,
    /// Previous sibling
    pub prev: Option<ObjectRef>,
    /// Next sibling
    pub next: Option<ObjectRef>,
    /// First child
    pub first: Option<ObjectRef>,
    /// Last child
    pub last: Option<ObjectRef>,
    /// Number of live descendants
    pub count: usize,
    /// Destination page
    pub page: ObjectRef,
    /// Destination top in content-stream space
    pub top: f64,
    /// Display style
    pub style: OutlineStyle,
}

impl OutlineItem {
    /// Leaf node pointing at the top of `page`.
    pub fn new(title: impl Into<String>, parent: ObjectRef, page: ObjectRef, top: f64) -> Self {
        Self {
            title: title.into(),
            parent,
            prev: None,
            next: None,
            first: None,
            last: None,
            count: 0,
            page,
            top,
            style: OutlineStyle::default(),
        }
    }
}

impl PdfObject for OutlineItem {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        let mut d = dict([
            ("Title", text_string(&self.title)),
            ("Parent", self.parent.into()),
            (
                "Dest",
                Object::Array(vec![
                    self.page.into(),
                    name("XYZ"),
                    Object::Null,
                    Object::Real(self.top),
                    Object::Null,
                ]),
            ),
        ]);
        for (key, value) in [
            ("Prev", self.prev),
            ("Next", self.next),
            ("First", self.first),
            ("Last", self.last),
        ] {
            if let Some(r) = value {
                d.insert(key.into(), r.into());
            }
        }
        if self.count > 0 {
            // Negative count keeps the children closed
            let count = self.count as i64;
            let count = if self.style.collapsed { -count } else { count };
            d.insert("Count".into(), Object::Integer(count));
        }
        if !self.style.flags.is_empty() {
            d.insert("F".into(), Object::Integer(self.style.flags.bits() as i64));
        }
        if let Some((r, g, b)) = self.style.color {
            d.insert("C".into(), number_array(&[r, g, b]));
        }
        Ok(Object::Dictionary(d))
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        f(self.parent);
        visit_opt(&self.prev, f);
        visit_opt(&self.next, f);
        visit_opt(&self.first, f);
        visit_opt(&self.last, f);
        f(self.page);
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        f(&mut self.parent);
        visit_opt_mut(&mut self.prev, f);
        visit_opt_mut(&mut self.next, f);
        visit_opt_mut(&mut self.first, f);
        visit_opt_mut(&mut self.last, f);
        f(&mut self.page);
    }
}
