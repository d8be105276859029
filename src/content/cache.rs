//! Ordered entries for one page or group, emitted in append order.

use super::EmitContext;
use super::entry::CacheEntry;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Ordered drawing records for one content stream.
///
/// Entries are emitted in append order. A text run that continues the
/// previous run (same font, size, color, and baseline, starting where the
/// previous one ended) is merged into it on append.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentCache {
    entries: Vec<CacheEntry>,
}

impl ContentCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, merging adjacent compatible text runs.
    pub fn push(&mut self, entry: CacheEntry) {
        if let CacheEntry::Text(next) = &entry {
            if let Some(CacheEntry::Text(last)) = self.entries.last_mut() {
                if last.can_merge(next) {
                    if let CacheEntry::Text(next) = entry {
                        last.merge(next);
                    }
                    return;
                }
            }
        }
        self.entries.push(entry);
    }

    /// Number of entries after merging.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been drawn.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in emission order.
    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    /// Emit every entry to `w`, stopping at the first sink failure.
    pub fn emit(&self, w: &mut dyn Write, ctx: &EmitContext) -> Result<()> {
        for entry in &self.entries {
            entry.emit(w, ctx)?;
        }
        Ok(())
    }

    /// Emit into a fresh buffer.
    pub fn to_bytes(&self, ctx: &EmitContext) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.emit(&mut buf, ctx)?;
        Ok(buf)
    }
}
