//! Links, notes, form fields, and file attachments.

use super::{Document, unexpected};
use crate::content::StandardFont;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::object::ObjectRef;
use crate::objects::{
    Annotation, AnnotationKind, EmbeddedFile, FieldKind, FileSpec, FormField, IndirectObject,
};

/// Resource name of the form appearance font.
const FORM_FONT: &str = "Helv";
const FORM_FONT_SIZE: f64 = 12.0;

/// Summary of one annotation on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationInfo {
    /// `/Subtype` name
    pub subtype: String,
    /// `[llx lly urx ury]` in content-stream space
    pub rect: [f64; 4],
    /// Note text or field name
    pub contents: Option<String>,
}

impl Document {
    fn attach_annotation(&mut self, page: usize, object: IndirectObject) -> Result<usize> {
        let r = self.state.registry.allocate(object);
        let page = self.page_mut(page)?;
        page.annots.push(r);
        Ok(page.annots.len() - 1)
    }

    /// Add an annotation of any kind to `page`. `rect` is in caller space.
    /// Returns its index on the page.
    pub fn add_annotation_to(&mut self, page: usize, rect: Rect, kind: AnnotationKind) -> Result<usize> {
        let handle = self.page_handle(page)?;
        let annotation = Annotation {
            kind,
            rect: self.pt_rect(rect).to_pdf_rect(handle.height),
            page: handle.page,
            color: None,
        };
        let index = self.attach_annotation(page, IndirectObject::Annotation(annotation))?;
        self.commit("add_annotation")?;
        Ok(index)
    }

    /// Link an area of the current page to a URI.
    pub fn add_link(&mut self, rect: Rect, uri: &str) -> Result<usize> {
        let page = self.current_index()?;
        self.add_annotation_to(page, rect, AnnotationKind::Uri(uri.to_string()))
    }

    /// Link an area of the current page to the top of another page.
    pub fn add_internal_link(&mut self, rect: Rect, target: usize) -> Result<usize> {
        let page = self.current_index()?;
        let target = self.page_handle(target)?;
        let kind = AnnotationKind::GoTo {
            page: target.page,
            top: target.height,
        };
        self.add_annotation_to(page, rect, kind)
    }

    /// Put a sticky note on the current page.
    pub fn add_note(&mut self, rect: Rect, contents: &str) -> Result<usize> {
        let page = self.current_index()?;
        let kind = AnnotationKind::Text {
            contents: contents.to_string(),
            open: false,
        };
        self.add_annotation_to(page, rect, kind)
    }

    /// Annotations and widgets on `page`, in order.
    pub fn annotations(&self, page: usize) -> Result<Vec<AnnotationInfo>> {
        let annots = &self.page(page)?.annots;
        let mut out = Vec::with_capacity(annots.len());
        for r in annots {
            let info = match self.state.registry.get(*r) {
                Some(IndirectObject::Annotation(annotation)) => AnnotationInfo {
                    subtype: annotation.subtype().to_string(),
                    rect: annotation.rect,
                    contents: match &annotation.kind {
                        AnnotationKind::Text { contents, .. } => Some(contents.clone()),
                        AnnotationKind::Uri(uri) => Some(uri.clone()),
                        AnnotationKind::GoTo { .. } => None,
                    },
                },
                Some(IndirectObject::FormField(field)) => AnnotationInfo {
                    subtype: "Widget".to_string(),
                    rect: field.rect,
                    contents: Some(field.name.clone()),
                },
                Some(other) => return Err(unexpected("Annot", other)),
                None => return Err(Error::ObjectNotFound(r.id)),
            };
            out.push(info);
        }
        Ok(out)
    }

    /// Remove the `index`-th annotation from `page`. Form widgets are also
    /// dropped from the form.
    pub fn delete_annotation(&mut self, page: usize, index: usize) -> Result<()> {
        let annots = &mut self.page_mut(page)?.annots;
        if index >= annots.len() {
            return Err(Error::AnnotationNotFound { page, index });
        }
        let r = annots.remove(index);
        self.catalog_mut()?.fields.retain(|f| *f != r);
        self.state.registry.delete(r)?;
        self.commit("delete_annotation")
    }

    // ---- forms ----

    fn add_field(&mut self, name: &str, rect: Rect, kind: FieldKind) -> Result<usize> {
        let page = self.current_index()?;
        let handle = self.page_handle(page)?;
        let duplicate = self.catalog()?.fields.iter().any(|r| {
            matches!(self.state.registry.get(*r), Some(IndirectObject::FormField(f)) if f.name == name)
        });
        if duplicate {
            return Err(Error::InvalidArgument(format!("form field {} already exists", name)));
        }

        let font = self.standard_font(StandardFont::Helvetica).object;
        let field = FormField {
            name: name.to_string(),
            kind,
            rect: self.pt_rect(rect).to_pdf_rect(handle.height),
            page: handle.page,
            font_resource: FORM_FONT.to_string(),
            font,
            font_size: FORM_FONT_SIZE,
        };
        let index = self.attach_annotation(page, IndirectObject::FormField(field))?;
        let r = self.page(page)?.annots[index];
        let catalog = self.catalog_mut()?;
        catalog.fields.push(r);
        catalog.form_fonts.insert(FORM_FONT.to_string(), font);
        Ok(index)
    }

    /// Add a single-line text field to the current page.
    pub fn add_text_field(&mut self, name: &str, rect: Rect, value: &str) -> Result<usize> {
        let kind = FieldKind::Text {
            value: value.to_string(),
            multiline: false,
            max_len: None,
        };
        let index = self.add_field(name, rect, kind)?;
        self.commit("add_text_field")?;
        Ok(index)
    }

    /// Add a check box to the current page.
    pub fn add_checkbox(&mut self, name: &str, rect: Rect, checked: bool) -> Result<usize> {
        let index = self.add_field(name, rect, FieldKind::Checkbox { checked })?;
        self.commit("add_checkbox")?;
        Ok(index)
    }

    // ---- attachments ----

    /// Embed a file. Attaching a second file under the same name replaces
    /// the first.
    pub fn attach_file(
        &mut self,
        name: &str,
        data: Vec<u8>,
        description: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<ObjectRef> {
        let mut file = EmbeddedFile::new(data);
        if let Some(mime) = mime_type {
            file = file.with_mime_type(mime);
        }
        let file = self.state.registry.allocate(IndirectObject::EmbeddedFile(file));
        let spec = self.state.registry.allocate(IndirectObject::FileSpec(FileSpec {
            name: name.to_string(),
            description: description.map(str::to_string),
            file,
        }));

        let catalog = self.catalog_mut()?;
        let replaced = match catalog.embedded_files.iter().position(|(n, _)| n == name) {
            Some(i) => Some(std::mem::replace(&mut catalog.embedded_files[i].1, spec)),
            None => {
                catalog.embedded_files.push((name.to_string(), spec));
                None
            },
        };
        if let Some(old) = replaced {
            log::debug!("replaced attachment {}", name);
            if let Some(IndirectObject::FileSpec(old_spec)) = self.state.registry.get(old) {
                let old_file = old_spec.file;
                self.state.registry.delete(old_file)?;
            }
            self.state.registry.delete(old)?;
        }
        self.commit("attach_file")?;
        Ok(spec)
    }

    /// Names of the embedded files.
    pub fn attachments(&self) -> Result<Vec<String>> {
        Ok(self.catalog()?.embedded_files.iter().map(|(n, _)| n.clone()).collect())
    }
}
