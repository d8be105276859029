//! Bookmarks.
//!
//! Bookmarks are addressed by the index returned when they were added.
//! Indices stay stable: deleting a bookmark retires its index (and those of
//! its descendants) rather than shifting later ones.

use super::{Document, unexpected};
use crate::error::{Error, Result};
use crate::object::ObjectRef;
use crate::objects::{IndirectObject, OutlineItem, OutlineRoot, OutlineStyle};

/// A live bookmark, as listed by [`Document::bookmarks`].
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkInfo {
    /// Index for the other bookmark calls
    pub index: usize,
    /// Title text
    pub title: String,
    /// Nesting depth; top-level bookmarks are 0
    pub depth: usize,
    /// Destination page index, if the page still exists
    pub page: Option<usize>,
}

/// Child links of an outline node.
struct NodeLinks<'a> {
    first: &'a mut Option<ObjectRef>,
    last: &'a mut Option<ObjectRef>,
}

impl Document {
    fn bookmark_ref(&self, index: usize) -> Result<ObjectRef> {
        self.state
            .bookmarks
            .get(index)
            .copied()
            .flatten()
            .ok_or(Error::BookmarkNotFound(index))
    }

    fn outline_item(&self, r: ObjectRef) -> Result<&OutlineItem> {
        match self.state.registry.get(r) {
            Some(IndirectObject::OutlineItem(item)) => Ok(item),
            Some(other) => Err(unexpected("OutlineItem", other)),
            None => Err(Error::ObjectNotFound(r.id)),
        }
    }

    fn outline_item_mut(&mut self, r: ObjectRef) -> Result<&mut OutlineItem> {
        match self.state.registry.get_mut(r)? {
            IndirectObject::OutlineItem(item) => Ok(item),
            other => Err(unexpected("OutlineItem", other)),
        }
    }

    fn node_links(&mut self, r: ObjectRef) -> Result<NodeLinks<'_>> {
        match self.state.registry.get_mut(r)? {
            IndirectObject::Outlines(root) => Ok(NodeLinks {
                first: &mut root.first,
                last: &mut root.last,
            }),
            IndirectObject::OutlineItem(item) => Ok(NodeLinks {
                first: &mut item.first,
                last: &mut item.last,
            }),
            other => Err(unexpected("Outlines", other)),
        }
    }

    fn outline_root(&mut self) -> Result<ObjectRef> {
        if let Some(root) = self.catalog()?.outlines {
            return Ok(root);
        }
        let root = self
            .state
            .registry
            .allocate(IndirectObject::Outlines(OutlineRoot::default()));
        self.catalog_mut()?.outlines = Some(root);
        Ok(root)
    }

    /// Add `delta` to the descendant count of `node` and every ancestor.
    fn adjust_counts(&mut self, mut node: ObjectRef, delta: isize) -> Result<()> {
        for _ in 0..=self.state.registry.len() {
            let parent = match self.state.registry.get_mut(node)? {
                IndirectObject::Outlines(root) => {
                    root.count = root.count.saturating_add_signed(delta);
                    return Ok(());
                },
                IndirectObject::OutlineItem(item) => {
                    item.count = item.count.saturating_add_signed(delta);
                    item.parent
                },
                other => return Err(unexpected("OutlineItem", other)),
            };
            node = parent;
        }
        Err(Error::InvalidPdf("outline parent chain does not end at the root".into()))
    }

    /// Add a bookmark pointing at the top of `page`, as the last child of
    /// `parent` (or at top level). Returns its index.
    pub fn add_bookmark(&mut self, title: &str, page: usize, parent: Option<usize>) -> Result<usize> {
        self.add_bookmark_styled(title, page, parent, OutlineStyle::default())
    }

    /// [`add_bookmark`](Self::add_bookmark) with a display style.
    pub fn add_bookmark_styled(
        &mut self,
        title: &str,
        page: usize,
        parent: Option<usize>,
        style: OutlineStyle,
    ) -> Result<usize> {
        let handle = self.page_handle(page)?;
        let parent = match parent {
            Some(index) => self.bookmark_ref(index)?,
            None => self.outline_root()?,
        };

        let mut item = OutlineItem::new(title, parent, handle.page, handle.height);
        item.style = style;
        let prev = *self.node_links(parent)?.last;
        item.prev = prev;
        let r = self.state.registry.allocate(IndirectObject::OutlineItem(item));

        if let Some(prev) = prev {
            self.outline_item_mut(prev)?.next = Some(r);
        }
        let links = self.node_links(parent)?;
        if links.first.is_none() {
            *links.first = Some(r);
        }
        *links.last = Some(r);
        self.adjust_counts(parent, 1)?;

        self.state.bookmarks.push(Some(r));
        self.commit("add_bookmark")?;
        Ok(self.state.bookmarks.len() - 1)
    }

    /// Refs of `r` and all its descendants, parents first.
    fn subtree(&self, r: ObjectRef) -> Result<Vec<ObjectRef>> {
        let mut out = Vec::new();
        let mut stack = vec![r];
        while let Some(node) = stack.pop() {
            if out.contains(&node) {
                return Err(Error::InvalidPdf("outline contains a cycle".into()));
            }
            out.push(node);
            let mut child = self.outline_item(node)?.first;
            let mut children = Vec::new();
            while let Some(c) = child {
                if children.contains(&c) {
                    return Err(Error::InvalidPdf("outline contains a cycle".into()));
                }
                children.push(c);
                child = self.outline_item(c)?.next;
            }
            stack.extend(children.into_iter().rev());
        }
        Ok(out)
    }

    /// Remove a bookmark together with its descendants.
    pub fn delete_bookmark(&mut self, index: usize) -> Result<()> {
        let r = self.bookmark_ref(index)?;
        let item = self.outline_item(r)?.clone();
        let removed = self.subtree(r)?;

        if let Some(prev) = item.prev {
            self.outline_item_mut(prev)?.next = item.next;
        }
        if let Some(next) = item.next {
            self.outline_item_mut(next)?.prev = item.prev;
        }
        let links = self.node_links(item.parent)?;
        if *links.first == Some(r) {
            *links.first = item.next;
        }
        if *links.last == Some(r) {
            *links.last = item.prev;
        }
        self.adjust_counts(item.parent, -(removed.len() as isize))?;

        for node in &removed {
            self.state.registry.delete(*node)?;
        }
        for bookmark in &mut self.state.bookmarks {
            if bookmark.is_some_and(|b| removed.contains(&b)) {
                *bookmark = None;
            }
        }
        log::debug!("deleted bookmark {} ({} nodes)", index, removed.len());
        self.commit("delete_bookmark")
    }

    /// Change how a bookmark is displayed.
    pub fn set_bookmark_style(&mut self, index: usize, style: OutlineStyle) -> Result<()> {
        let r = self.bookmark_ref(index)?;
        self.outline_item_mut(r)?.style = style;
        self.commit("set_bookmark_style")
    }

    /// Live bookmarks in outline order (depth first).
    pub fn bookmarks(&self) -> Result<Vec<BookmarkInfo>> {
        let Some(root) = self.catalog()?.outlines else {
            return Ok(Vec::new());
        };
        let first = match self.state.registry.get(root) {
            Some(IndirectObject::Outlines(root)) => root.first,
            Some(other) => return Err(unexpected("Outlines", other)),
            None => return Err(Error::ObjectNotFound(root.id)),
        };

        let mut out = Vec::new();
        let mut stack: Vec<(ObjectRef, usize)> = Vec::new();
        let mut top = Vec::new();
        let mut next = first;
        while let Some(r) = next {
            top.push((r, 0));
            next = self.outline_item(r)?.next;
            if top.len() > self.state.registry.len() {
                return Err(Error::InvalidPdf("outline contains a cycle".into()));
            }
        }
        stack.extend(top.into_iter().rev());

        while let Some((r, depth)) = stack.pop() {
            if out.len() > self.state.registry.len() {
                return Err(Error::InvalidPdf("outline contains a cycle".into()));
            }
            let item = self.outline_item(r)?;
            out.push(BookmarkInfo {
                index: self
                    .state
                    .bookmarks
                    .iter()
                    .position(|b| *b == Some(r))
                    .ok_or_else(|| Error::InvalidPdf(format!("bookmark object {} has no index", r.id)))?,
                title: item.title.clone(),
                depth,
                page: self.state.pages.iter().position(|p| p.page == item.page),
            });

            let mut children = Vec::new();
            let mut child = item.first;
            while let Some(c) = child {
                children.push((c, depth + 1));
                child = self.outline_item(c)?.next;
                if children.len() > self.state.registry.len() {
                    return Err(Error::InvalidPdf("outline contains a cycle".into()));
                }
            }
            stack.extend(children.into_iter().rev());
        }
        Ok(out)
    }
}
