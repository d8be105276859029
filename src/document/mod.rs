//! The document facade.
//!
//! [`Document`] is what callers build files with. Every drawing or structural
//! call deposits objects into the [`ObjectRegistry`] and appends records to
//! the current page's operator cache; nothing is serialized until one of the
//! output methods runs.
//!
//! All mutable state lives in [`DocumentState`], which is the unit the
//! journal snapshots. While the journal is enabled each public mutator
//! records one snapshot, unless the caller has opened a bracket with
//! [`Document::start_op`], in which case the whole bracket becomes one.
//!
//! # Example
//!
//! ```
//! use pdf_engine::{Document, DocumentConfig};
//!
//! let mut doc = Document::new(DocumentConfig::new())?;
//! doc.add_page()?;
//! doc.set_font("Helvetica", 12.0)?;
//! doc.text(72.0, 72.0, "Hello World")?;
//! let bytes = doc.to_bytes()?;
//! assert!(bytes.starts_with(b"%PDF-1.7"));
//! # Ok::<(), pdf_engine::Error>(())
//! ```

mod graphics;
mod interactive;
mod outline;
mod text;

pub use graphics::{GroupHandle, ImageHandle};
pub use interactive::AnnotationInfo;
pub use outline::BookmarkInfo;
pub use text::CellOptions;

use crate::config::{DocumentConfig, PageSize};
use crate::content::{CacheEntry, Color, Decoration, FontKind};
use crate::encryption::{Protection, generate_file_id};
use crate::error::{Error, Result};
use crate::gc::{self, GcMode, GcReport, Renumbering};
use crate::geometry::Rect;
use crate::journal::Journal;
use crate::object::ObjectRef;
use crate::objects::{
    BlendMode, Catalog, ContentStream, IndirectObject, InfoDict, Page, PageLabel, PageTree,
    Resources, WriteContext,
};
use crate::registry::ObjectRegistry;
use crate::writer::{Trailer, Writer};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// A page and its content stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct PageHandle {
    page: ObjectRef,
    content: ObjectRef,
    height: f64,
}

/// A registered font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FontEntry {
    resource: String,
    object: ObjectRef,
    kind: FontKind,
}

/// A registered extended graphics state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GStateEntry {
    resource: String,
    object: ObjectRef,
    alpha: Option<f64>,
    blend: Option<BlendMode>,
    soft_mask: Option<ObjectRef>,
}

/// A Separation color space keyed by colorant name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SpotEntry {
    resource: String,
    object: ObjectRef,
}

/// An image or form XObject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct XObjectEntry {
    object: ObjectRef,
    width: f64,
    height: f64,
}

/// The transparency group currently receiving drawing calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct OpenGroup {
    object: ObjectRef,
    height: f64,
}

/// Next number for each resource-name family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Counters {
    font: u32,
    image: u32,
    gstate: u32,
    form: u32,
    color_space: u32,
}

impl Counters {
    fn next(counter: &mut u32, prefix: &str) -> String {
        *counter += 1;
        format!("{}{}", prefix, counter)
    }
}

/// Everything the journal snapshots: the registry plus the handles the
/// facade keeps into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentState {
    registry: ObjectRegistry,
    catalog: ObjectRef,
    page_tree: ObjectRef,
    info: ObjectRef,
    encrypt: Option<ObjectRef>,
    pages: Vec<PageHandle>,
    current_page: Option<usize>,

    fonts: IndexMap<String, FontEntry>,
    current_font: Option<String>,
    font_size: f64,
    text_color: Option<Color>,
    char_spacing: f64,
    decoration: Decoration,

    fill_color: Option<Color>,
    stroke_color: Option<Color>,
    line_width: Option<f64>,
    gstates: Vec<GStateEntry>,
    active_gstates: Vec<String>,
    spot_colors: IndexMap<String, SpotEntry>,
    images: IndexMap<String, XObjectEntry>,
    groups: IndexMap<String, XObjectEntry>,
    open_group: Option<OpenGroup>,
    /// Clip and rotation saves still open on the current page
    open_saves: usize,
    counters: Counters,

    bookmarks: Vec<Option<ObjectRef>>,
}

impl DocumentState {
    /// The object registry.
    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    /// Reference of the document catalog.
    pub fn catalog(&self) -> ObjectRef {
        self.catalog
    }

    /// Rewrite every handle after compaction, dropping the ones whose
    /// objects were collected.
    fn relocate(&mut self, renumbering: &Renumbering, compacted: bool) {
        let registry = &self.registry;
        let moved = |r: ObjectRef| -> Option<ObjectRef> {
            let r = if compacted { renumbering.get(r)? } else { r };
            registry.get(r).filter(|o| !o.is_null()).map(|_| r)
        };
        let keep = |r: &mut ObjectRef| match moved(*r) {
            Some(new) => {
                *r = new;
                true
            },
            None => false,
        };

        // Structural objects are roots or reachable from them
        for r in [&mut self.catalog, &mut self.page_tree, &mut self.info] {
            renumbering.apply(r);
        }
        if let Some(r) = self.encrypt.as_mut() {
            renumbering.apply(r);
        }
        for page in &mut self.pages {
            renumbering.apply(&mut page.page);
            renumbering.apply(&mut page.content);
        }
        if let Some(group) = self.open_group.as_mut() {
            renumbering.apply(&mut group.object);
        }

        self.fonts.retain(|_, f| keep(&mut f.object));
        self.gstates.retain_mut(|g| {
            if let Some(mask) = g.soft_mask.as_mut() {
                renumbering.apply(mask);
            }
            keep(&mut g.object)
        });
        self.spot_colors.retain(|_, s| keep(&mut s.object));
        self.images.retain(|_, i| keep(&mut i.object));
        self.groups.retain(|_, g| keep(&mut g.object));
        for bookmark in &mut self.bookmarks {
            *bookmark = bookmark.and_then(moved);
        }

        if self.current_font.as_ref().is_some_and(|name| !self.fonts.contains_key(name)) {
            self.current_font = None;
        }
        let gstates = &self.gstates;
        self.active_gstates.retain(|name| gstates.iter().any(|g| &g.resource == name));
    }
}

/// Where drawing calls currently land.
#[derive(Debug, Clone, Copy)]
struct DrawTarget {
    /// Object holding the operator cache
    content: ObjectRef,
    /// Object holding the resource dictionary
    resources: ObjectRef,
}

/// Resource dictionary category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Font,
    XObject,
    ExtGState,
    ColorSpace,
}

fn unexpected(expected: &str, found: &IndirectObject) -> Error {
    Error::InvalidObjectType {
        expected: expected.to_string(),
        found: found.kind().to_string(),
    }
}

/// A document under construction.
pub struct Document {
    config: DocumentConfig,
    state: DocumentState,
    journal: Journal<DocumentState>,
    protection: Option<Protection>,
    file_id: Vec<u8>,
}

impl Document {
    /// Create an empty document: catalog, page tree, info dictionary, and
    /// the encryption dictionary when protection is configured.
    pub fn new(config: DocumentConfig) -> Result<Self> {
        let mut registry = ObjectRegistry::new();
        let catalog = registry.reserve();
        let page_tree = registry.allocate(IndirectObject::PageTree(PageTree::default()));
        registry.replace(catalog, IndirectObject::Catalog(Catalog::new(page_tree)))?;
        let info = registry.allocate(IndirectObject::Info(InfoDict::new(config.info.clone())));

        let file_id = generate_file_id();
        let (protection, encrypt) = match &config.protection {
            Some(settings) => {
                let protection = Protection::new(settings, &file_id);
                let r = registry.allocate(IndirectObject::Encrypt(protection.encrypt_dictionary()));
                log::debug!("protection enabled with {:?}", settings.algorithm);
                (Some(protection), Some(r))
            },
            None => (None, None),
        };

        let state = DocumentState {
            registry,
            catalog,
            page_tree,
            info,
            encrypt,
            pages: Vec::new(),
            current_page: None,
            fonts: IndexMap::new(),
            current_font: None,
            font_size: 12.0,
            text_color: None,
            char_spacing: 0.0,
            decoration: Decoration::empty(),
            fill_color: None,
            stroke_color: None,
            line_width: None,
            gstates: Vec::new(),
            active_gstates: Vec::new(),
            spot_colors: IndexMap::new(),
            images: IndexMap::new(),
            groups: IndexMap::new(),
            open_group: None,
            open_saves: 0,
            counters: Counters::default(),
            bookmarks: Vec::new(),
        };

        Ok(Self {
            config,
            state,
            journal: Journal::new(),
            protection,
            file_id,
        })
    }

    /// The configuration this document was created with.
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Current state, as the journal would snapshot it.
    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    /// The object registry.
    pub fn registry(&self) -> &ObjectRegistry {
        &self.state.registry
    }

    // ---- internal helpers ----

    fn pt(&self, value: f64) -> f64 {
        self.config.unit.to_points(value)
    }

    fn pt_rect(&self, rect: Rect) -> Rect {
        rect.scaled(self.config.unit.points())
    }

    /// Record a snapshot for a completed mutator, unless the caller has a
    /// bracket open.
    fn commit(&mut self, name: &str) -> Result<()> {
        if self.journal.is_enabled() && !self.journal.in_operation() {
            self.journal.start_op(name)?;
            self.journal.end_op(&self.state)?;
        }
        Ok(())
    }

    fn page_handle(&self, index: usize) -> Result<PageHandle> {
        self.state.pages.get(index).copied().ok_or(Error::PageOutOfRange {
            index,
            count: self.state.pages.len(),
        })
    }

    fn catalog_mut(&mut self) -> Result<&mut Catalog> {
        match self.state.registry.get_mut(self.state.catalog)? {
            IndirectObject::Catalog(catalog) => Ok(catalog),
            other => Err(unexpected("Catalog", other)),
        }
    }

    fn catalog(&self) -> Result<&Catalog> {
        match self.state.registry.get(self.state.catalog) {
            Some(IndirectObject::Catalog(catalog)) => Ok(catalog),
            Some(other) => Err(unexpected("Catalog", other)),
            None => Err(Error::ObjectNotFound(self.state.catalog.id)),
        }
    }

    fn page_mut(&mut self, index: usize) -> Result<&mut Page> {
        let handle = self.page_handle(index)?;
        match self.state.registry.get_mut(handle.page)? {
            IndirectObject::Page(page) => Ok(page),
            other => Err(unexpected("Page", other)),
        }
    }

    fn page(&self, index: usize) -> Result<&Page> {
        let handle = self.page_handle(index)?;
        match self.state.registry.get(handle.page) {
            Some(IndirectObject::Page(page)) => Ok(page),
            Some(other) => Err(unexpected("Page", other)),
            None => Err(Error::ObjectNotFound(handle.page.id)),
        }
    }

    fn current_index(&self) -> Result<usize> {
        self.state.current_page.ok_or(Error::NoCurrentPage)
    }

    fn target(&self) -> Result<DrawTarget> {
        if let Some(group) = self.state.open_group {
            return Ok(DrawTarget {
                content: group.object,
                resources: group.object,
            });
        }
        let handle = self.page_handle(self.current_index()?)?;
        Ok(DrawTarget {
            content: handle.content,
            resources: handle.page,
        })
    }

    fn has_target(&self) -> bool {
        self.state.open_group.is_some() || self.state.current_page.is_some()
    }

    fn push_entry(&mut self, entry: CacheEntry) -> Result<()> {
        let target = self.target()?;
        match self.state.registry.get_mut(target.content)? {
            IndirectObject::Content(content) => content.cache.push(entry),
            IndirectObject::Group(group) => group.cache.push(entry),
            other => return Err(unexpected("Content", other)),
        }
        Ok(())
    }

    fn target_resources(&mut self) -> Result<&mut Resources> {
        let target = self.target()?;
        match self.state.registry.get_mut(target.resources)? {
            IndirectObject::Page(page) => Ok(&mut page.resources),
            IndirectObject::Group(group) => Ok(&mut group.resources),
            other => Err(unexpected("Page", other)),
        }
    }

    /// Make `name` available to the current target's content.
    fn ensure_resource(&mut self, kind: ResourceKind, name: &str, object: ObjectRef) -> Result<()> {
        let resources = self.target_resources()?;
        let map = match kind {
            ResourceKind::Font => &mut resources.fonts,
            ResourceKind::XObject => &mut resources.xobjects,
            ResourceKind::ExtGState => &mut resources.ext_gstates,
            ResourceKind::ColorSpace => &mut resources.color_spaces,
        };
        if !map.contains_key(name) {
            map.insert(name.to_string(), object);
        }
        Ok(())
    }

    /// Active graphics states, registered on the current target.
    fn active_gstates(&mut self) -> Result<Vec<String>> {
        let active = self.state.active_gstates.clone();
        for name in &active {
            let object = self
                .state
                .gstates
                .iter()
                .find(|g| &g.resource == name)
                .map(|g| g.object)
                .ok_or_else(|| Error::InvalidArgument(format!("unknown graphics state {}", name)))?;
            self.ensure_resource(ResourceKind::ExtGState, name, object)?;
        }
        Ok(active)
    }

    /// Register the color space a spot color needs on the current target.
    fn ensure_color(&mut self, color: &Color) -> Result<()> {
        if let Color::Spot { resource, .. } = color {
            let object = self
                .state
                .spot_colors
                .values()
                .find(|s| &s.resource == resource)
                .map(|s| s.object)
                .ok_or_else(|| Error::InvalidArgument(format!("unknown spot color {}", resource)))?;
            if self.has_target() {
                self.ensure_resource(ResourceKind::ColorSpace, resource, object)?;
            }
        }
        Ok(())
    }

    /// Close clip and rotation saves left open on the current page.
    fn close_open_saves(&mut self) -> Result<()> {
        while self.state.open_saves > 0 {
            self.push_entry(CacheEntry::RestoreState)?;
            self.state.open_saves -= 1;
        }
        Ok(())
    }

    // ---- pages ----

    /// Append a page of the configured default size and make it current.
    /// Returns its index.
    pub fn add_page(&mut self) -> Result<usize> {
        self.add_page_with_size(self.config.page_size)
    }

    /// Append a page of the given size and make it current.
    ///
    /// Fill color, stroke color, and line width carry over from the
    /// previous page.
    pub fn add_page_with_size(&mut self, size: PageSize) -> Result<usize> {
        if self.state.open_group.is_some() {
            return Err(Error::InvalidArgument("cannot add a page while a group is open".into()));
        }
        if self.state.current_page.is_some() {
            self.close_open_saves()?;
        }

        let registry = &mut self.state.registry;
        let content = registry.allocate(IndirectObject::Content(ContentStream::new(size.height)));
        let mut page = Page::new(self.state.page_tree, size.width, size.height);
        page.contents.push(content);
        let page = registry.allocate(IndirectObject::Page(page));
        match registry.get_mut(self.state.page_tree)? {
            IndirectObject::PageTree(tree) => tree.kids.push(page),
            other => return Err(unexpected("Pages", other)),
        }

        let index = self.state.pages.len();
        self.state.pages.push(PageHandle {
            page,
            content,
            height: size.height,
        });
        self.state.current_page = Some(index);

        if let Some(color) = self.state.fill_color.clone() {
            self.ensure_color(&color)?;
            self.push_entry(CacheEntry::FillColor(color))?;
        }
        if let Some(color) = self.state.stroke_color.clone() {
            self.ensure_color(&color)?;
            self.push_entry(CacheEntry::StrokeColor(color))?;
        }
        if let Some(width) = self.state.line_width {
            self.push_entry(CacheEntry::LineWidth(width))?;
        }

        log::debug!("added page {} ({}x{} pt) as {}", index, size.width, size.height, page);
        self.commit("add_page")?;
        Ok(index)
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.state.pages.len()
    }

    /// Index of the page receiving drawing calls.
    pub fn current_page(&self) -> Option<usize> {
        self.state.current_page
    }

    /// Make an existing page current again.
    pub fn set_page(&mut self, index: usize) -> Result<()> {
        self.page_handle(index)?;
        if self.state.current_page != Some(index) && self.state.current_page.is_some() {
            self.close_open_saves()?;
        }
        self.state.current_page = Some(index);
        self.commit("set_page")
    }

    /// Reference of a page object.
    pub fn page_ref(&self, index: usize) -> Result<ObjectRef> {
        Ok(self.page_handle(index)?.page)
    }

    /// Set the crop box of a page, in caller space.
    pub fn set_crop_box(&mut self, index: usize, rect: Rect) -> Result<()> {
        let height = self.page_handle(index)?.height;
        let box_ = self.pt_rect(rect).to_pdf_rect(height);
        self.page_mut(index)?.crop_box = Some(box_);
        self.commit("set_crop_box")
    }

    /// Set the trim box of a page, in caller space.
    pub fn set_trim_box(&mut self, index: usize, rect: Rect) -> Result<()> {
        let height = self.page_handle(index)?.height;
        let box_ = self.pt_rect(rect).to_pdf_rect(height);
        self.page_mut(index)?.trim_box = Some(box_);
        self.commit("set_trim_box")
    }

    /// Set the clockwise display rotation of a page. Must be a multiple of 90.
    pub fn set_rotation(&mut self, index: usize, degrees: i32) -> Result<()> {
        if degrees % 90 != 0 {
            return Err(Error::InvalidArgument(format!(
                "rotation {} is not a multiple of 90",
                degrees
            )));
        }
        self.page_mut(index)?.rotate = degrees.rem_euclid(360);
        self.commit("set_rotation")
    }

    /// Start a label range at page `index`. A later range at the same index
    /// replaces this one.
    pub fn set_page_label(&mut self, index: usize, label: PageLabel) -> Result<()> {
        self.page_handle(index)?;
        let catalog = self.catalog_mut()?;
        catalog.page_labels.retain(|(start, _)| *start != index);
        catalog.page_labels.push((index, label));
        self.commit("set_page_label")
    }

    // ---- output ----

    fn trailer(&self) -> Trailer {
        Trailer {
            root: self.state.catalog,
            info: Some(self.state.info),
            encrypt: self.state.encrypt,
            file_id: Some(self.file_id.clone()),
            prev: None,
        }
    }

    fn write_context(&self) -> WriteContext<'_> {
        WriteContext {
            compression: self.config.compression,
            protection: self.protection.as_ref(),
        }
    }

    fn writer(&self) -> Writer<'_> {
        Writer::new(&self.state.registry, &self.config.version, self.write_context())
    }

    /// Serialize the whole document to `sink`.
    pub fn write_to(&self, sink: &mut dyn Write) -> Result<()> {
        self.writer().write_full(sink, &self.trailer())
    }

    /// Serialize the whole document into a buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Serialize the whole document to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        log::info!("saved {} bytes to {}", bytes.len(), path.as_ref().display());
        Ok(())
    }

    /// Append the objects numbered in `touched` to `original` as an
    /// incremental update. An empty set writes every object; numbers that
    /// do not exist are ignored.
    pub fn incremental_save(&self, original: &[u8], touched: &[u32]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(original.len());
        self.writer().write_incremental(original, touched, &mut out, &self.trailer())?;
        Ok(out)
    }

    // ---- garbage collection ----

    /// Drop objects no longer reachable from the catalog, info, or
    /// encryption dictionaries. Handles the document keeps (fonts, images,
    /// bookmarks) follow compaction; handles to collected objects are
    /// forgotten.
    pub fn collect_garbage(&mut self, mode: GcMode) -> Result<GcReport> {
        let mut roots = vec![self.state.catalog, self.state.info];
        roots.extend(self.state.encrypt);
        roots.extend(self.state.open_group.map(|g| g.object));

        let (report, renumbering) = gc::collect(&mut self.state.registry, &roots, mode);
        self.state.relocate(&renumbering, mode == GcMode::Compact);
        self.commit("collect_garbage")?;
        Ok(report)
    }

    // ---- journal ----

    /// Start recording snapshots.
    pub fn enable_journal(&mut self) {
        self.journal.enable(&self.state);
    }

    /// Stop recording snapshots; history is kept.
    pub fn disable_journal(&mut self) {
        self.journal.disable();
    }

    /// Whether snapshots are being recorded.
    pub fn journal_enabled(&self) -> bool {
        self.journal.is_enabled()
    }

    /// Open a bracket: calls until [`end_op`](Self::end_op) form one snapshot.
    pub fn start_op(&mut self, name: impl Into<String>) -> Result<()> {
        self.journal.start_op(name)
    }

    /// Close the open bracket and record the current state.
    pub fn end_op(&mut self) -> Result<()> {
        self.journal.end_op(&self.state)
    }

    /// Restore the state before the last operation. Returns its name.
    pub fn undo(&mut self) -> Result<String> {
        let (name, state) = self.journal.undo()?;
        self.state = state;
        log::debug!("undo {}", name);
        Ok(name)
    }

    /// Re-apply the next operation. Returns its name.
    pub fn redo(&mut self) -> Result<String> {
        let (name, state) = self.journal.redo()?;
        self.state = state;
        log::debug!("redo {}", name);
        Ok(name)
    }

    /// Names of the recorded operations, oldest first.
    pub fn journal_history(&self) -> Vec<&str> {
        self.journal.history()
    }

    /// Write the journal to a JSON file.
    pub fn save_journal(&self, path: impl AsRef<Path>) -> Result<()> {
        self.journal.save(path)
    }

    /// Replace the journal with one read from `path` and restore the state
    /// at its cursor.
    pub fn load_journal(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.state = self.journal.load(path)?;
        Ok(())
    }
}
