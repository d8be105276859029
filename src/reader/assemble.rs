//! Page selection, deletion, and merging.
//!
//! Each operation builds a new file from whole object subgraphs. Every
//! object reachable from a kept page is copied once under a fresh number and
//! its references are rewritten. References to page-tree nodes that were not
//! kept become null, so no object outside the output is referenced. The
//! output gets a new catalog and a flat page tree; catalog-level structures
//! of the inputs (outlines, forms, names) are not carried over.

use super::{INHERITABLE, RawDocument, RawPage, Slot};
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef, rect_array};
use std::collections::{BTreeMap, HashMap};

const CATALOG: u32 = 1;
const PAGE_TREE: u32 = 2;

/// Copies objects from source documents into one output object map.
struct Splicer<'a> {
    docs: &'a [&'a RawDocument],
    objects: BTreeMap<u32, Slot>,
    numbers: HashMap<(usize, u32), u32>,
    queue: Vec<(usize, u32)>,
    next: u32,
}

impl<'a> Splicer<'a> {
    fn new(docs: &'a [&'a RawDocument]) -> Self {
        Splicer {
            docs,
            objects: BTreeMap::new(),
            numbers: HashMap::new(),
            queue: Vec::new(),
            next: PAGE_TREE + 1,
        }
    }

    fn allocate(&mut self) -> u32 {
        let number = self.next;
        self.next += 1;
        number
    }

    /// Output number for source object `id` of document `doc`, copying it
    /// on first sight. `None` for missing objects and page-tree nodes that
    /// are not part of the output.
    fn number_for(&mut self, doc: usize, id: u32) -> Option<u32> {
        if let Some(number) = self.numbers.get(&(doc, id)) {
            return Some(*number);
        }
        let source = self.docs[doc].objects.get(&id)?;
        if source.object.has_type("Page") || source.object.has_type("Pages") {
            return None;
        }
        let number = self.allocate();
        self.numbers.insert((doc, id), number);
        self.queue.push((doc, id));
        Some(number)
    }

    fn remap(&mut self, doc: usize, value: &mut Object) {
        match value {
            Object::Reference(r) => match self.number_for(doc, r.id) {
                Some(number) => *r = ObjectRef::new(number, 0),
                None => *value = Object::Null,
            },
            Object::Array(items) => items.iter_mut().for_each(|item| self.remap(doc, item)),
            Object::Dictionary(dict) | Object::Stream { dict, .. } => {
                dict.values_mut().for_each(|item| self.remap(doc, item))
            },
            _ => {},
        }
    }

    /// Copy everything queued so far, and everything that pulls in.
    fn drain(&mut self) {
        while let Some((doc, id)) = self.queue.pop() {
            let Some(source) = self.docs[doc].objects.get(&id) else {
                continue;
            };
            let mut object = source.object.clone();
            self.remap(doc, &mut object);
            let Some(&number) = self.numbers.get(&(doc, id)) else {
                continue;
            };
            self.objects.insert(number, Slot { gen: 0, object });
        }
    }

    /// Copy a page leaf with its inherited attributes written out.
    fn copy_page(&mut self, doc: usize, page: &RawPage, number: u32) {
        let source = self.docs[doc]
            .objects
            .get(&page.object.id)
            .and_then(|slot| slot.object.as_dict())
            .cloned()
            .unwrap_or_default();
        let mut dict = source;
        for key in INHERITABLE {
            if dict.contains_key(key) {
                continue;
            }
            let value = match key {
                "Resources" => Some(Object::Dictionary(page.resources.clone())),
                "MediaBox" => page.media_box.map(|[a, b, c, d]| rect_array(a, b, c, d)),
                "CropBox" => page.crop_box.map(|[a, b, c, d]| rect_array(a, b, c, d)),
                _ => (page.rotate != 0).then_some(Object::Integer(page.rotate)),
            };
            if let Some(value) = value {
                dict.insert(key.to_string(), value);
            }
        }

        let mut object = Object::Dictionary(dict);
        self.remap(doc, &mut object);
        if let Some(dict) = object.as_dict_mut() {
            dict.insert("Type".to_string(), Object::Name("Page".to_string()));
            dict.insert("Parent".to_string(), Object::Reference(ObjectRef::new(PAGE_TREE, 0)));
        }
        self.objects.insert(number, Slot { gen: 0, object });
        self.drain();
    }

    /// Assemble `pages` (document index, page) in order.
    fn assemble(mut self, pages: &[(usize, RawPage)]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(Error::InvalidArgument("output would have no pages".to_string()));
        }
        if let Some(doc) = self.docs.iter().find(|doc| doc.is_encrypted()) {
            return Err(Error::Encryption(format!(
                "cannot reassemble encrypted input ({} objects)",
                doc.object_count()
            )));
        }

        // page numbers first, so references between kept pages resolve
        let mut kids = Vec::with_capacity(pages.len());
        for (doc, page) in pages {
            let number = self.allocate();
            self.numbers.entry((*doc, page.object.id)).or_insert(number);
            kids.push(number);
        }
        for ((doc, page), number) in pages.iter().zip(&kids) {
            self.copy_page(*doc, page, *number);
        }

        let mut info = self.docs[0].trailer.get("Info").cloned();
        if let Some(info) = info.as_mut() {
            self.remap(0, info);
            self.drain();
        }

        let mut pages_dict = Dictionary::new();
        pages_dict.insert("Type".to_string(), Object::Name("Pages".to_string()));
        pages_dict.insert(
            "Kids".to_string(),
            Object::Array(kids.iter().map(|n| Object::Reference(ObjectRef::new(*n, 0))).collect()),
        );
        pages_dict.insert("Count".to_string(), Object::Integer(kids.len() as i64));
        self.objects.insert(PAGE_TREE, Slot {
            gen: 0,
            object: Object::Dictionary(pages_dict),
        });

        let mut catalog = Dictionary::new();
        catalog.insert("Type".to_string(), Object::Name("Catalog".to_string()));
        catalog.insert("Pages".to_string(), Object::Reference(ObjectRef::new(PAGE_TREE, 0)));
        self.objects.insert(CATALOG, Slot {
            gen: 0,
            object: Object::Dictionary(catalog),
        });

        let mut trailer = Dictionary::new();
        trailer.insert("Root".to_string(), Object::Reference(ObjectRef::new(CATALOG, 0)));
        if let Some(info @ Object::Reference(_)) = info {
            trailer.insert("Info".to_string(), info);
        }

        let version = self
            .docs
            .iter()
            .map(|doc| doc.version.as_str())
            .max_by(|a, b| version_key(a).cmp(&version_key(b)))
            .unwrap_or("1.7")
            .to_string();
        log::debug!("assembled {} pages into {} objects", kids.len(), self.objects.len());
        RawDocument {
            version,
            objects: self.objects,
            trailer,
        }
        .to_bytes()
    }
}

/// `"1.7"` as `(1, 7)` for ordering.
fn version_key(version: &str) -> (u32, u32) {
    let mut parts = version.split('.').map(|p| p.parse().unwrap_or(0));
    (parts.next().unwrap_or(0), parts.next().unwrap_or(0))
}

impl RawDocument {
    /// A new file holding the pages at `indices`, in that order. An index
    /// may repeat.
    pub fn select_pages(&self, indices: &[usize]) -> Result<Vec<u8>> {
        let pages = self.pages();
        let count = pages.len();
        let mut selected = Vec::with_capacity(indices.len());
        for &index in indices {
            let page = pages.get(index).ok_or(Error::PageOutOfRange { index, count })?;
            selected.push((0, page.clone()));
        }
        Splicer::new(&[self]).assemble(&selected)
    }

    /// A new file without the pages at `indices`.
    pub fn delete_pages(&self, indices: &[usize]) -> Result<Vec<u8>> {
        let count = self.page_count();
        if let Some(&index) = indices.iter().find(|&&i| i >= count) {
            return Err(Error::PageOutOfRange { index, count });
        }
        let keep: Vec<usize> = (0..count).filter(|i| !indices.contains(i)).collect();
        self.select_pages(&keep)
    }

    /// A new file with the pages of every document in `docs`, in order.
    pub fn merge(docs: &[&RawDocument]) -> Result<Vec<u8>> {
        if docs.is_empty() {
            return Err(Error::InvalidArgument("nothing to merge".to_string()));
        }
        let pages: Vec<(usize, RawPage)> = docs
            .iter()
            .enumerate()
            .flat_map(|(i, doc)| doc.pages().into_iter().map(move |page| (i, page)))
            .collect();
        Splicer::new(docs).assemble(&pages)
    }
}
