//! File writer: full rewrite and incremental update.
//!
//! A full save writes the header, every registry slot in number order, a
//! single cross-reference section covering objects `0..=len`, the trailer,
//! and the `startxref` pointer. Tombstoned slots become free entries chained
//! through the free list starting at object 0.
//!
//! An incremental save copies the previous file unchanged, appends only the
//! touched objects, and adds a cross-reference section made of one
//! subsection per run of consecutive object numbers. Its trailer points back
//! at the previous section through `/Prev`.

use crate::error::Result;
use crate::object::{Dictionary, Object, ObjectRef};
use crate::objects::{PdfObject, WriteContext};
use crate::registry::ObjectRegistry;
use crate::serializer::ObjectSerializer;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Counts bytes on their way to the inner sink.
pub struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    /// Start counting from `start`.
    pub fn new(inner: W, start: u64) -> Self {
        Self { inner, count: start }
    }

    /// Bytes written so far, including the starting offset.
    pub fn position(&self) -> u64 {
        self.count
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// One cross-reference table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    /// Object stored at a byte offset
    InUse {
        /// Offset of `N G obj`
        offset: u64,
        /// Generation number
        gen: u16,
    },
    /// Free slot
    Free {
        /// Next free object number, 0 at the end of the list
        next: u32,
        /// Generation to use if the number is reused
        gen: u16,
    },
}

/// Cross-reference rows keyed by object number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XrefSection {
    entries: BTreeMap<u32, XrefEntry>,
}

impl XrefSection {
    /// Empty section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite the row for `number`.
    pub fn insert(&mut self, number: u32, entry: XrefEntry) {
        self.entries.insert(number, entry);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Link every free row into a list headed by object 0.
    pub fn chain_free_list(&mut self) {
        let free: Vec<u32> = self
            .entries
            .iter()
            .filter(|(n, e)| **n != 0 && matches!(e, XrefEntry::Free { .. }))
            .map(|(n, _)| *n)
            .collect();
        let head = free.first().copied().unwrap_or(0);
        self.entries.insert(0, XrefEntry::Free {
            next: head,
            gen: 65535,
        });
        for (i, number) in free.iter().enumerate() {
            let next = free.get(i + 1).copied().unwrap_or(0);
            if let Some(XrefEntry::Free { next: slot, .. }) = self.entries.get_mut(number) {
                *slot = next;
            }
        }
    }

    /// Write `xref` and the subsections. Each row is exactly 20 bytes.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(b"xref\n")?;
        let rows: Vec<(u32, XrefEntry)> = self.entries.iter().map(|(n, e)| (*n, *e)).collect();
        let mut start = 0;
        while start < rows.len() {
            let mut end = start + 1;
            while end < rows.len() && rows[end].0 == rows[end - 1].0 + 1 {
                end += 1;
            }
            writeln!(w, "{} {}", rows[start].0, end - start)?;
            for (_, entry) in &rows[start..end] {
                match entry {
                    XrefEntry::InUse { offset, gen } => {
                        write!(w, "{:010} {:05} n\r\n", offset, gen)?
                    },
                    XrefEntry::Free { next, gen } => write!(w, "{:010} {:05} f\r\n", next, gen)?,
                }
            }
            start = end;
        }
        Ok(())
    }
}

/// Trailer entries shared by full and incremental saves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trailer {
    /// Catalog
    pub root: ObjectRef,
    /// Information dictionary
    pub info: Option<ObjectRef>,
    /// Encryption dictionary
    pub encrypt: Option<ObjectRef>,
    /// File identifier, written as both halves of `/ID`
    pub file_id: Option<Vec<u8>>,
    /// Offset of the previous cross-reference section
    pub prev: Option<u64>,
}

impl Trailer {
    /// Trailer dictionary for a file whose highest object number is `size - 1`.
    pub fn to_dict(&self, size: u32) -> Dictionary {
        let mut d = Dictionary::new();
        d.insert("Size".into(), Object::Integer(size as i64));
        d.insert("Root".into(), self.root.into());
        if let Some(info) = self.info {
            d.insert("Info".into(), info.into());
        }
        if let Some(encrypt) = self.encrypt {
            d.insert("Encrypt".into(), encrypt.into());
        }
        if let Some(id) = &self.file_id {
            d.insert(
                "ID".into(),
                Object::Array(vec![Object::String(id.clone()), Object::String(id.clone())]),
            );
        }
        if let Some(prev) = self.prev {
            d.insert("Prev".into(), Object::Integer(prev as i64));
        }
        d
    }
}

/// Write `trailer`, `startxref`, and `%%EOF`.
pub fn write_footer<W: Write + ?Sized>(w: &mut W, trailer: Dictionary, xref_offset: u64) -> Result<()> {
    w.write_all(b"trailer\n")?;
    ObjectSerializer::compact().write_object(w, &Object::Dictionary(trailer))?;
    write!(w, "\nstartxref\n{}\n%%EOF\n", xref_offset)?;
    Ok(())
}

/// Write the `%PDF-x.y` header and the binary comment line.
pub fn write_header<W: Write + ?Sized>(w: &mut W, version: &str) -> Result<()> {
    writeln!(w, "%PDF-{}", version)?;
    w.write_all(b"%\xE2\xE3\xCF\xD3\n")?;
    Ok(())
}

/// Value of the last `startxref` in `data`.
pub fn find_startxref(data: &[u8]) -> Option<u64> {
    const KEYWORD: &[u8] = b"startxref";
    let pos = data.windows(KEYWORD.len()).rposition(|w| w == KEYWORD)?;
    let digits: String = data[pos + KEYWORD.len()..]
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_digit())
        .map(|&b| b as char)
        .collect();
    digits.parse().ok()
}

/// Serializes a registry.
pub struct Writer<'a> {
    registry: &'a ObjectRegistry,
    version: &'a str,
    ctx: WriteContext<'a>,
}

impl<'a> Writer<'a> {
    /// Writer over `registry` with the given settings.
    pub fn new(registry: &'a ObjectRegistry, version: &'a str, ctx: WriteContext<'a>) -> Self {
        Self {
            registry,
            version,
            ctx,
        }
    }

    fn size(&self) -> u32 {
        self.registry.len() as u32 + 1
    }

    /// Write a complete file. Sink failures abort the save immediately.
    pub fn write_full(&self, sink: &mut dyn Write, trailer: &Trailer) -> Result<()> {
        let mut w = CountingWriter::new(sink, 0);
        write_header(&mut w, self.version)?;

        let mut xref = XrefSection::new();
        for (r, object) in self.registry.iter() {
            if object.is_null() {
                xref.insert(r.id, XrefEntry::Free { next: 0, gen: 1 });
                continue;
            }
            xref.insert(r.id, XrefEntry::InUse {
                offset: w.position(),
                gen: r.gen,
            });
            object.write_to(r, &mut w, &self.ctx)?;
        }
        xref.chain_free_list();

        let xref_offset = w.position();
        xref.write(&mut w)?;
        write_footer(&mut w, trailer.to_dict(self.size()), xref_offset)?;
        w.flush()?;

        log::debug!(
            "full save: {} objects ({} live), xref at {}",
            self.registry.len(),
            self.registry.live_count(),
            xref_offset
        );
        Ok(())
    }

    /// Append `touched` objects to `original`.
    ///
    /// An empty `touched` set means every object. Numbers outside the
    /// registry are ignored. `/Prev` comes from the last `startxref` in
    /// `original`, overriding `trailer.prev`.
    pub fn write_incremental(
        &self,
        original: &[u8],
        touched: &[u32],
        sink: &mut dyn Write,
        trailer: &Trailer,
    ) -> Result<()> {
        let mut w = CountingWriter::new(sink, 0);
        w.write_all(original)?;
        if !original.ends_with(b"\n") && !original.ends_with(b"\r") {
            w.write_all(b"\n")?;
        }

        let mut numbers: Vec<u32> = if touched.is_empty() {
            (1..self.size()).collect()
        } else {
            touched
                .iter()
                .copied()
                .filter(|&n| n >= 1 && (n as usize) <= self.registry.len())
                .collect()
        };
        numbers.sort_unstable();
        numbers.dedup();
        if numbers.len() < touched.len() {
            log::debug!("incremental save: ignored {} touched numbers", touched.len() - numbers.len());
        }

        let mut xref = XrefSection::new();
        for number in numbers {
            let r = ObjectRef::new(number, 0);
            let Some(object) = self.registry.get(r) else {
                continue;
            };
            if object.is_null() {
                xref.insert(number, XrefEntry::Free { next: 0, gen: 1 });
                continue;
            }
            xref.insert(number, XrefEntry::InUse {
                offset: w.position(),
                gen: 0,
            });
            object.write_to(r, &mut w, &self.ctx)?;
        }

        let prev = find_startxref(original);
        if prev.is_none() {
            log::warn!("incremental save: no startxref in original, writing without /Prev");
        }
        let trailer = Trailer {
            prev,
            ..trailer.clone()
        };

        let xref_offset = w.position();
        if xref.is_empty() {
            // An xref section needs at least one subsection
            xref.insert(0, XrefEntry::Free {
                next: 0,
                gen: 65535,
            });
        }
        xref.write(&mut w)?;
        write_footer(&mut w, trailer.to_dict(self.size()), xref_offset)?;
        w.flush()?;

        log::debug!("incremental save: {} objects appended, xref at {}", xref.len(), xref_offset);
        Ok(())
    }
}
