//! Raw reader.
//!
//! [`RawDocument`] parses arbitrary input of the same wire format, whether or
//! not this crate produced it. Object locations come from scanning the bytes
//! for `N G obj` headers, so stale or missing cross-reference tables do not
//! matter. The resulting object map backs the analysis and editing features
//! in the submodules:
//!
//! - [`search`](RawDocument::search) for text
//! - [`fonts`](RawDocument::fonts) and [`images`](RawDocument::images)
//! - [`clean_content`](RawDocument::clean_content)
//! - [`convert_colorspace`](RawDocument::convert_colorspace)
//! - [`replace_text`](RawDocument::replace_text)
//! - [`select_pages`](RawDocument::select_pages),
//!   [`delete_pages`](RawDocument::delete_pages), and
//!   [`RawDocument::merge`]
//!
//! Protected files are parsed for structure only; strings and streams stay
//! encrypted.
//!
//! # Example
//!
//! ```
//! use pdf_engine::{Document, DocumentConfig, RawDocument};
//!
//! let mut doc = Document::new(DocumentConfig::new())?;
//! doc.add_page()?;
//! doc.set_font("Helvetica", 12.0)?;
//! doc.text(72.0, 72.0, "Hello World")?;
//!
//! let raw = RawDocument::parse(&doc.to_bytes()?)?;
//! assert_eq!(raw.page_count(), 1);
//! assert_eq!(raw.search("hello", true).len(), 1);
//! # Ok::<(), pdf_engine::Error>(())
//! ```

mod assemble;
mod clean;
mod colorspace;
pub mod content;
mod edit;
mod extract;
mod fonts;
mod objstm;
mod search;

pub use clean::CleanStats;
pub use colorspace::ColorTarget;
pub use extract::{FontInfo, ImageInfo};
pub use search::SearchMatch;

use crate::config::ReaderOptions;
use crate::error::{Error, Result};
use crate::lexer::{is_regular, is_whitespace};
use crate::object::{Dictionary, Object, ObjectRef};
use crate::parser::{parse_indirect_object, parse_object};
use crate::serializer::ObjectSerializer;
use crate::writer::{CountingWriter, XrefEntry, XrefSection, write_footer, write_header};
use std::collections::{BTreeMap, HashSet};
use std::io::Write;

static NULL: Object = Object::Null;

/// Reference chains longer than this are treated as broken.
const MAX_RESOLVE_HOPS: usize = 32;

/// How far into the input the `%PDF-` header may start.
const HEADER_WINDOW: usize = 1024;

/// Page attributes inherited from ancestor page-tree nodes.
const INHERITABLE: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// An object and its generation number.
#[derive(Debug, Clone, PartialEq)]
struct Slot {
    gen: u16,
    object: Object,
}

/// A page leaf with its inherited attributes applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage {
    /// Page object
    pub object: ObjectRef,
    /// `/MediaBox`, own or inherited
    pub media_box: Option<[f64; 4]>,
    /// `/CropBox`, own or inherited
    pub crop_box: Option<[f64; 4]>,
    /// `/Rotate`, own or inherited
    pub rotate: i64,
    /// `/Resources`, resolved to a dictionary
    pub resources: Dictionary,
}

/// A parsed file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    version: String,
    objects: BTreeMap<u32, Slot>,
    trailer: Dictionary,
}

impl RawDocument {
    /// Parse `data` with default options.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with(data, ReaderOptions::default())
    }

    /// Parse `data`.
    ///
    /// Fails only when the `%PDF-` header is missing. Damaged objects are
    /// skipped and a missing catalog leaves the page list empty.
    pub fn parse_with(data: &[u8], options: ReaderOptions) -> Result<Self> {
        let version = read_version(data)?;

        // (position, number, gen, object); sorting by position lets later
        // definitions of a number win
        let mut found: Vec<(usize, u32, u16, Object)> = Vec::new();
        let mut pos = 0;
        while let Some(start) = next_object_header(data, pos) {
            if found.len() >= options.max_objects {
                log::warn!("stopped after {} objects", options.max_objects);
                break;
            }
            match parse_indirect_object(&data[start..]) {
                Ok((rest, (r, object))) => {
                    found.push((start, r.id, r.gen, object));
                    pos = data.len() - rest.len();
                },
                Err(err) => {
                    log::warn!("skipping malformed object at offset {}: {:?}", start, err);
                    pos = start + 1;
                },
            }
        }

        if options.expand_object_streams {
            let mut members = Vec::new();
            for (position, number, _, object) in &found {
                if !object.has_type("ObjStm") {
                    continue;
                }
                match objstm::expand(object) {
                    Ok(objects) => {
                        log::debug!("object stream {} holds {} objects", number, objects.len());
                        members.extend(objects.into_iter().map(|(n, o)| (*position, n, 0, o)));
                    },
                    Err(err) => log::warn!("unreadable object stream {}: {}", number, err),
                }
            }
            found.extend(members);
        }
        found.sort_by_key(|(position, ..)| *position);

        let trailer = find_trailer(data, &found);
        let mut objects = BTreeMap::new();
        for (_, number, gen, object) in found {
            if number == 0 {
                continue;
            }
            let packed = options.expand_object_streams && object.has_type("ObjStm");
            if packed || object.has_type("XRef") {
                continue;
            }
            objects.insert(number, Slot { gen, object });
        }

        let doc = Self {
            version,
            objects,
            trailer,
        };
        if doc.is_encrypted() {
            log::warn!("input is encrypted; strings and streams are left as stored");
        }
        log::debug!("parsed {} objects, {} pages", doc.objects.len(), doc.page_count());
        Ok(doc)
    }

    /// Version from the header, e.g. `"1.7"`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Trailer dictionary, or the best substitute found.
    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// Whether the trailer names an `/Encrypt` dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.trailer.contains_key("Encrypt")
    }

    /// Number of objects in the map.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Object numbers in ascending order.
    pub fn object_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.objects.keys().copied()
    }

    /// Highest object number in use.
    pub fn max_object_number(&self) -> u32 {
        self.objects.keys().next_back().copied().unwrap_or(0)
    }

    // ---- object access ----

    /// Object by number.
    pub fn object(&self, number: u32) -> Result<&Object> {
        self.objects
            .get(&number)
            .map(|slot| &slot.object)
            .ok_or(Error::ObjectNotFound(number))
    }

    fn object_mut(&mut self, number: u32) -> Result<&mut Object> {
        self.objects
            .get_mut(&number)
            .map(|slot| &mut slot.object)
            .ok_or(Error::ObjectNotFound(number))
    }

    /// Follow references until a direct value. Broken references resolve
    /// to null.
    pub fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        let mut current = object;
        for _ in 0..MAX_RESOLVE_HOPS {
            match current {
                Object::Reference(r) => match self.objects.get(&r.id) {
                    Some(slot) => current = &slot.object,
                    None => return &NULL,
                },
                _ => return current,
            }
        }
        log::warn!("reference chain longer than {} hops", MAX_RESOLVE_HOPS);
        &NULL
    }

    /// Resolve `key` in `dict`.
    fn lookup<'a>(&'a self, dict: &'a Dictionary, key: &str) -> Option<&'a Object> {
        dict.get(key).map(|value| self.resolve(value)).filter(|value| !value.is_null())
    }

    /// Dictionary of object `number` (a stream's dictionary for streams).
    pub fn dictionary(&self, number: u32) -> Result<&Dictionary> {
        let object = self.object(number)?;
        object.as_dict().ok_or_else(|| Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: object.type_name().to_string(),
        })
    }

    /// Value of `key` in object `number`'s dictionary, unresolved.
    pub fn get_key(&self, number: u32, key: &str) -> Result<&Object> {
        self.dictionary(number)?.get(key).ok_or_else(|| Error::KeyNotFound {
            object: number,
            key: key.to_string(),
        })
    }

    /// Set `key` in object `number`'s dictionary. Returns the old value.
    pub fn set_key(&mut self, number: u32, key: &str, value: Object) -> Result<Option<Object>> {
        let object = self.object_mut(number)?;
        let found = object.type_name();
        let dict = object.as_dict_mut().ok_or_else(|| Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: found.to_string(),
        })?;
        Ok(dict.insert(key.to_string(), value))
    }

    /// Decoded data of stream object `number`.
    pub fn stream_data(&self, number: u32) -> Result<Vec<u8>> {
        self.object(number)?.decode_stream_data()
    }

    /// Replace the data of stream object `number` with unfiltered bytes.
    pub fn set_stream_data(&mut self, number: u32, data: Vec<u8>) -> Result<()> {
        match self.object_mut(number)? {
            Object::Stream { dict, data: stored } => {
                dict.remove("Filter");
                dict.remove("DecodeParms");
                dict.insert("Length".to_string(), Object::Integer(data.len() as i64));
                *stored = bytes::Bytes::from(data);
                Ok(())
            },
            other => Err(Error::InvalidObjectType {
                expected: "Stream".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Append `object` under the next free number. Fails when the input
    /// already uses the largest representable number.
    pub fn add_object(&mut self, object: Object) -> Result<ObjectRef> {
        let number = self
            .max_object_number()
            .checked_add(1)
            .ok_or_else(|| Error::InvalidPdf("object numbers exhausted".to_string()))?;
        self.objects.insert(number, Slot { gen: 0, object });
        Ok(ObjectRef::new(number, 0))
    }

    /// Duplicate object `number` under a fresh number. References inside
    /// the copy still point at the original targets.
    pub fn copy_object(&mut self, number: u32) -> Result<ObjectRef> {
        let object = self.object(number)?.clone();
        self.add_object(object)
    }

    // ---- pages ----

    fn catalog(&self) -> Option<&Dictionary> {
        let root = self.trailer.get("Root")?;
        let catalog = self.resolve(root).as_dict();
        if catalog.is_none() {
            log::warn!("trailer /Root does not resolve to a dictionary");
        }
        catalog
    }

    /// Page leaves in document order. A missing or malformed page tree
    /// gives an empty list.
    pub fn pages(&self) -> Vec<RawPage> {
        let mut pages = Vec::new();
        let Some(root) = self.catalog().and_then(|c| c.get("Pages")) else {
            log::warn!("no page tree");
            return pages;
        };
        let Object::Reference(root) = root else {
            log::warn!("/Pages is not an indirect reference");
            return pages;
        };

        let mut visited = HashSet::new();
        let mut stack = vec![(*root, Dictionary::new())];
        while let Some((r, inherited)) = stack.pop() {
            if !visited.insert(r.id) {
                log::warn!("page tree revisits object {}", r.id);
                continue;
            }
            let Some(node) = self.objects.get(&r.id).and_then(|slot| slot.object.as_dict()) else {
                log::warn!("page tree node {} is missing", r.id);
                continue;
            };

            let mut attrs = inherited;
            for key in INHERITABLE {
                if let Some(value) = node.get(key) {
                    attrs.insert(key.to_string(), value.clone());
                }
            }

            let kids = node.get("Kids").map(|k| self.resolve(k)).and_then(Object::as_array);
            let is_leaf = match node.get("Type").and_then(Object::as_name) {
                Some("Page") => true,
                Some("Pages") => false,
                _ => kids.is_none(),
            };
            if is_leaf {
                pages.push(self.raw_page(r, &attrs));
                continue;
            }
            for kid in kids.into_iter().flatten().rev() {
                match kid {
                    Object::Reference(kid) => stack.push((*kid, attrs.clone())),
                    _ => log::warn!("page tree node {} has a direct kid", r.id),
                }
            }
        }
        pages
    }

    fn raw_page(&self, object: ObjectRef, attrs: &Dictionary) -> RawPage {
        let rect = |key: &str| {
            let values: Vec<f64> = self
                .lookup(attrs, key)?
                .as_array()?
                .iter()
                .filter_map(|v| self.resolve(v).as_number())
                .collect();
            <[f64; 4]>::try_from(values).ok()
        };
        RawPage {
            object,
            media_box: rect("MediaBox"),
            crop_box: rect("CropBox"),
            rotate: self.lookup(attrs, "Rotate").and_then(Object::as_integer).unwrap_or(0),
            resources: self
                .lookup(attrs, "Resources")
                .and_then(Object::as_dict)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Number of page leaves.
    pub fn page_count(&self) -> usize {
        self.pages().len()
    }

    /// Page leaf `index`.
    pub fn page(&self, index: usize) -> Result<RawPage> {
        let mut pages = self.pages();
        let count = pages.len();
        if index >= count {
            return Err(Error::PageOutOfRange { index, count });
        }
        Ok(pages.swap_remove(index))
    }

    /// Entries of one resource category (`Font`, `XObject`, ...) of a page,
    /// whether the category is inline or an indirect reference.
    pub fn resource_entries(&self, resources: &Dictionary, category: &str) -> Dictionary {
        self.lookup(resources, category)
            .and_then(Object::as_dict)
            .cloned()
            .unwrap_or_default()
    }

    /// Content stream objects of a page, in order.
    fn content_refs(&self, page: &RawPage) -> Vec<ObjectRef> {
        let Some(contents) = self.objects.get(&page.object.id).and_then(|s| s.object.get("Contents")) else {
            return Vec::new();
        };
        let items = match contents {
            Object::Reference(r) => match self.resolve(contents) {
                Object::Array(items) => items.clone(),
                _ => vec![Object::Reference(*r)],
            },
            Object::Array(items) => items.clone(),
            _ => Vec::new(),
        };
        items.iter().filter_map(Object::as_reference).collect()
    }

    /// Decoded content of page `index`, all streams joined by newlines.
    /// Streams that fail to decode are skipped.
    pub fn page_content(&self, index: usize) -> Result<Vec<u8>> {
        let page = self.page(index)?;
        Ok(self.content_of(&page))
    }

    fn content_of(&self, page: &RawPage) -> Vec<u8> {
        let mut out = Vec::new();
        for r in self.content_refs(page) {
            match self.objects.get(&r.id).map(|slot| slot.object.decode_stream_data()) {
                Some(Ok(data)) => {
                    if !out.is_empty() {
                        out.push(b'\n');
                    }
                    out.extend_from_slice(&data);
                },
                Some(Err(err)) => log::warn!("unreadable content stream {}: {}", r.id, err),
                None => log::warn!("content stream {} is missing", r.id),
            }
        }
        out
    }

    /// Replace all content of page `index` with one unfiltered stream.
    /// The first existing content stream is reused unless another page
    /// draws it too.
    pub fn set_page_content(&mut self, index: usize, data: Vec<u8>) -> Result<()> {
        let page = self.page(index)?;
        let refs = self.content_refs(&page);
        let target = refs
            .iter()
            .copied()
            .find(|r| matches!(self.objects.get(&r.id), Some(Slot { object: Object::Stream { .. }, .. })))
            .filter(|r| !self.shared_content(page.object, r.id));
        let target = match target {
            Some(r) => {
                self.set_stream_data(r.id, data)?;
                r
            },
            None => self.add_object(Object::Stream {
                dict: Dictionary::new(),
                data: bytes::Bytes::from(data),
            })?,
        };
        self.set_key(page.object.id, "Contents", Object::Reference(target))?;
        Ok(())
    }

    /// Whether a page other than `owner` lists stream `number` in its contents.
    fn shared_content(&self, owner: ObjectRef, number: u32) -> bool {
        self.pages()
            .iter()
            .filter(|other| other.object != owner)
            .any(|other| self.content_refs(other).iter().any(|r| r.id == number))
    }

    // ---- output ----

    /// Serialize the object map as a complete file with a fresh
    /// cross-reference table. Unused numbers get no rows; gaps split the
    /// table into subsections.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Serialize to `sink`.
    pub fn write_to(&self, sink: &mut dyn Write) -> Result<()> {
        let mut w = CountingWriter::new(sink, 0);
        write_header(&mut w, &self.version)?;

        let serializer = ObjectSerializer::new();
        let mut xref = XrefSection::new();
        for (&number, slot) in &self.objects {
            xref.insert(number, XrefEntry::InUse {
                offset: w.position(),
                gen: slot.gen,
            });
            serializer.write_indirect(&mut w, ObjectRef::new(number, slot.gen), &slot.object, None)?;
        }
        xref.chain_free_list();

        let xref_offset = w.position();
        xref.write(&mut w)?;
        let mut trailer = Dictionary::new();
        trailer.insert("Size".to_string(), Object::Integer(self.max_object_number() as i64 + 1));
        for key in ["Root", "Info", "ID", "Encrypt"] {
            if let Some(value) = self.trailer.get(key) {
                trailer.insert(key.to_string(), value.clone());
            }
        }
        write_footer(&mut w, trailer, xref_offset)?;
        w.flush()?;
        Ok(())
    }
}

/// Version from the `%PDF-x.y` header near the start of `data`.
fn read_version(data: &[u8]) -> Result<String> {
    const MAGIC: &[u8] = b"%PDF-";
    let window = &data[..data.len().min(HEADER_WINDOW)];
    let Some(pos) = window.windows(MAGIC.len()).position(|w| w == MAGIC) else {
        let found = String::from_utf8_lossy(&data[..data.len().min(8)]).into_owned();
        return Err(Error::InvalidHeader(found));
    };
    if pos > 0 {
        log::warn!("{} bytes of junk before the header", pos);
    }
    let version: String = data[pos + MAGIC.len()..]
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b'.')
        .map(|&b| b as char)
        .collect();
    if version.is_empty() {
        log::warn!("header has no version number");
        return Ok("1.4".to_string());
    }
    Ok(version)
}

/// Start of the next `N G obj` header at or after `from`.
fn next_object_header(data: &[u8], from: usize) -> Option<usize> {
    const KEYWORD: &[u8] = b"obj";
    let mut i = from;
    while i + KEYWORD.len() <= data.len() {
        let offset = data[i..].windows(KEYWORD.len()).position(|w| w == KEYWORD)?;
        let kw = i + offset;
        let after = data.get(kw + KEYWORD.len()).copied();
        if after.map_or(true, |c| !is_regular(c)) {
            if let Some(start) = header_start(data, kw) {
                if start >= from {
                    return Some(start);
                }
            }
        }
        i = kw + 1;
    }
    None
}

/// Walk back from the `obj` keyword at `kw` over `N G `; the start of `N`.
fn header_start(data: &[u8], kw: usize) -> Option<usize> {
    let mut i = kw;
    let skip = |pred: fn(u8) -> bool, i: &mut usize| {
        let end = *i;
        while *i > 0 && pred(data[*i - 1]) {
            *i -= 1;
        }
        *i < end
    };
    let digit = |c: u8| c.is_ascii_digit();
    if !(skip(is_whitespace, &mut i) && skip(digit, &mut i) && skip(is_whitespace, &mut i) && skip(digit, &mut i)) {
        return None;
    }
    if i > 0 && is_regular(data[i - 1]) {
        return None;
    }
    Some(i)
}

/// Trailer dictionary: the last `trailer` with a `/Root`, else the last
/// cross-reference stream dictionary with one, else a synthesized trailer
/// pointing at the last `/Type /Catalog` object.
fn find_trailer(data: &[u8], found: &[(usize, u32, u16, Object)]) -> Dictionary {
    const KEYWORD: &[u8] = b"trailer";
    let mut end = data.len();
    while let Some(pos) = data[..end].windows(KEYWORD.len()).rposition(|w| w == KEYWORD) {
        if let Ok((_, Object::Dictionary(dict))) = parse_object(&data[pos + KEYWORD.len()..]) {
            if dict.contains_key("Root") {
                return dict;
            }
        }
        end = pos;
    }

    if let Some(dict) = found
        .iter()
        .rev()
        .filter(|(.., object)| object.has_type("XRef"))
        .filter_map(|(.., object)| object.as_dict())
        .find(|dict| dict.contains_key("Root"))
    {
        log::debug!("using cross-reference stream dictionary as trailer");
        return dict.clone();
    }

    if let Some((_, number, gen, _)) = found.iter().rev().find(|(.., object)| object.has_type("Catalog")) {
        log::warn!("no trailer; using catalog object {}", number);
        let mut dict = Dictionary::new();
        dict.insert("Root".to_string(), Object::Reference(ObjectRef::new(*number, *gen)));
        return dict;
    }

    log::warn!("no trailer and no catalog");
    Dictionary::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) const SIMPLE: &[u8] = b"%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] /Resources << /Font << /F1 5 0 R >> >> >>
endobj
3 0 obj
<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>
endobj
4 0 obj
<< /Length 42 >>
stream
BT /F1 12 Tf 72 700 Td (Hello World) Tj ET
endstream
endobj
5 0 obj
<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>
endobj
trailer
<< /Size 6 /Root 1 0 R >>
startxref
0
%%EOF
";

    #[test]
    fn test_parse_simple() {
        let doc = RawDocument::parse(SIMPLE).unwrap();
        assert_eq!(doc.version(), "1.4");
        assert_eq!(doc.object_count(), 5);
        let pages = doc.pages();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].media_box, Some([0.0, 0.0, 612.0, 792.0]));
        assert!(doc.resource_entries(&pages[0].resources, "Font").contains_key("F1"));
        let content = doc.page_content(0).unwrap();
        assert!(content.starts_with(b"BT /F1 12 Tf"));
        assert!(matches!(doc.page_content(1), Err(Error::PageOutOfRange { index: 1, count: 1 })));
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(RawDocument::parse(b"hello"), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_catalog_scan_without_trailer() {
        let data = b"%PDF-1.7\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
                     2 0 obj << /Type /Pages /Kids [3 0 R] >> endobj\n\
                     3 0 obj << /Type /Page >> endobj\n";
        let doc = RawDocument::parse(data).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.trailer().get("Root"), Some(&Object::Reference(ObjectRef::new(1, 0))));
    }

    #[test]
    fn test_later_definition_wins() {
        let data = b"%PDF-1.7\n1 0 obj (old) endobj\n1 0 obj (new) endobj\n";
        let doc = RawDocument::parse(data).unwrap();
        assert_eq!(doc.object(1).unwrap(), &Object::String(b"new".to_vec()));
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn test_cyclic_page_tree() {
        let data = b"%PDF-1.7\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
                     2 0 obj << /Type /Pages /Kids [2 0 R 3 0 R] >> endobj\n\
                     3 0 obj << /Type /Page /Parent 2 0 R >> endobj\n";
        let doc = RawDocument::parse(data).unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_object_stream_members() {
        let header = "10 0 11 3 ";
        let body = "42 << /Type /Catalog /Pages 12 0 R >>";
        let stream = format!(
            "%PDF-1.7\n5 0 obj << /Type /ObjStm /N 2 /First {} /Length {} >>\nstream\n{}{}\nendstream\nendobj\n",
            header.len(),
            header.len() + body.len(),
            header,
            body
        );
        let doc = RawDocument::parse(stream.as_bytes()).unwrap();
        assert_eq!(doc.object(10).unwrap(), &Object::Integer(42));
        assert!(doc.object(5).is_err());
        assert_eq!(doc.trailer().get("Root"), Some(&Object::Reference(ObjectRef::new(11, 0))));

        let unexpanded = RawDocument::parse_with(stream.as_bytes(), ReaderOptions::new().with_object_streams(false)).unwrap();
        assert!(unexpanded.object(10).is_err());
    }

    #[test]
    fn test_object_access() {
        let mut doc = RawDocument::parse(SIMPLE).unwrap();
        assert_eq!(doc.get_key(5, "BaseFont").unwrap().as_name(), Some("Helvetica"));
        assert!(matches!(doc.get_key(5, "Missing"), Err(Error::KeyNotFound { object: 5, .. })));
        assert!(matches!(doc.object(99), Err(Error::ObjectNotFound(99))));

        doc.set_key(5, "BaseFont", Object::Name("Courier".into())).unwrap();
        let copy = doc.copy_object(5).unwrap();
        assert_eq!(copy.id, 6);
        assert_eq!(doc.get_key(6, "BaseFont").unwrap().as_name(), Some("Courier"));
        assert_eq!(doc.stream_data(4).unwrap().len(), 42);
        assert!(doc.stream_data(5).is_err());
    }

    #[test]
    fn test_round_trip_bytes() {
        let doc = RawDocument::parse(SIMPLE).unwrap();
        let bytes = doc.to_bytes().unwrap();
        let again = RawDocument::parse(&bytes).unwrap();
        assert_eq!(again.page_count(), 1);
        assert_eq!(again.page_content(0).unwrap(), doc.page_content(0).unwrap());
        assert!(crate::writer::find_startxref(&bytes).is_some());
    }

    #[test]
    fn test_set_page_content() {
        let mut doc = RawDocument::parse(SIMPLE).unwrap();
        doc.set_page_content(0, b"0 0 m 10 10 l S".to_vec()).unwrap();
        assert_eq!(doc.page_content(0).unwrap(), b"0 0 m 10 10 l S");
    }

    const SHARED: &[u8] = b"%PDF-1.7\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
        2 0 obj << /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 >> endobj\n\
        3 0 obj << /Type /Page /Parent 2 0 R /Contents 5 0 R >> endobj\n\
        4 0 obj << /Type /Page /Parent 2 0 R /Contents [5 0 R 6 0 R] >> endobj\n\
        5 0 obj << /Length 7 >>\nstream\n0 0 m S\nendstream\nendobj\n\
        6 0 obj << /Length 9 >>\nstream\n5 5 m 9 l\nendstream\nendobj\n";

    #[test]
    fn test_shared_content_stream_is_not_overwritten() {
        let mut doc = RawDocument::parse(SHARED).unwrap();
        doc.set_page_content(0, b"1 1 m S".to_vec()).unwrap();
        assert_eq!(doc.page_content(0).unwrap(), b"1 1 m S");
        assert_eq!(doc.page_content(1).unwrap(), b"0 0 m S\n5 5 m 9 l");
        assert_eq!(doc.get_key(3, "Contents").unwrap(), &Object::Reference(ObjectRef::new(7, 0)));

        // page 1 is now the only user of stream 5
        doc.set_page_content(1, b"2 2 m S".to_vec()).unwrap();
        assert_eq!(doc.get_key(4, "Contents").unwrap(), &Object::Reference(ObjectRef::new(5, 0)));
        assert_eq!(doc.page_content(0).unwrap(), b"1 1 m S");
    }

    #[test]
    fn test_huge_object_numbers() {
        let mut doc = RawDocument::parse(b"%PDF-1.7\n4294967295 0 obj null endobj\n").unwrap();
        assert_eq!(doc.max_object_number(), u32::MAX);
        assert!(doc.add_object(Object::Null).is_err());
        assert!(doc.copy_object(u32::MAX).is_err());
        assert!(doc.to_bytes().unwrap().len() < 512);

        let sparse = RawDocument::parse(b"%PDF-1.7\n5000000 0 obj 42 endobj\n").unwrap();
        let bytes = sparse.to_bytes().unwrap();
        assert!(bytes.len() < 512);
        let again = RawDocument::parse(&bytes).unwrap();
        assert_eq!(again.object(5_000_000).unwrap(), &Object::Integer(42));
        assert!(String::from_utf8_lossy(&bytes).contains("5000000 1\n"));
    }
}
