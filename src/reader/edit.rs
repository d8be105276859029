//! In-place text replacement.

use super::RawDocument;
use super::content::{ContentOp, parse, serialize};
use super::fonts::{FontDecoder, current_decoder, font_decoders};
use crate::error::{Error, Result};
use crate::object::Object;
use std::collections::HashMap;

/// Replace `find` with `replace` in one decoded string. Returns the new
/// encoded bytes and the number of replacements, or `None` when there is no
/// match or the font cannot encode the result.
fn replace_in(decoder: &FontDecoder, bytes: &[u8], find: &str, replace: &str) -> Option<(Vec<u8>, usize)> {
    let text = decoder.decode_text(bytes);
    let count = text.matches(find).count();
    if count == 0 {
        return None;
    }
    let replaced = text.replace(find, replace);
    match decoder.encode(&replaced) {
        Some(encoded) => Some((encoded, count)),
        None => {
            log::warn!("font cannot encode {:?}; leaving {:?} unchanged", replaced, text);
            None
        },
    }
}

/// Rewrite the strings of one show operator. Returns replacements made.
fn replace_in_op(op: &mut ContentOp, decoder: &FontDecoder, find: &str, replace: &str) -> usize {
    let ContentOp::Op { operator, operands } = op else {
        return 0;
    };
    let index = match operator.as_str() {
        "Tj" | "'" => 0,
        "\"" => 2,
        "TJ" => return replace_in_array(operands, decoder, find, replace),
        _ => return 0,
    };
    let Some(Object::String(bytes)) = operands.get_mut(index) else {
        return 0;
    };
    match replace_in(decoder, bytes, find, replace) {
        Some((encoded, count)) => {
            *bytes = encoded;
            count
        },
        None => 0,
    }
}

/// TJ arrays: matches inside one string are replaced in place. Only when
/// there are none is a match spanning several strings tried, which merges
/// the array into a single string and drops its kerning.
fn replace_in_array(operands: &mut [Object], decoder: &FontDecoder, find: &str, replace: &str) -> usize {
    let Some(Object::Array(items)) = operands.first_mut() else {
        return 0;
    };
    let mut count = 0;
    for item in items.iter_mut() {
        if let Object::String(bytes) = item {
            if let Some((encoded, n)) = replace_in(decoder, bytes, find, replace) {
                *bytes = encoded;
                count += n;
            }
        }
    }

    if count > 0 {
        return count;
    }
    let joined: Vec<u8> = items.iter().filter_map(Object::as_string).flatten().copied().collect();
    if let Some((encoded, n)) = replace_in(decoder, &joined, find, replace) {
        *items = vec![Object::String(encoded)];
        return n;
    }
    0
}

impl RawDocument {
    /// Replace every occurrence of `find` in shown text on all pages.
    ///
    /// Strings are decoded with their font, edited, and re-encoded; strings
    /// whose font cannot encode the replacement are left as they were.
    /// Edited pages are stored unfiltered. Returns the number of
    /// replacements.
    pub fn replace_text(&mut self, find: &str, replace: &str) -> Result<usize> {
        if find.is_empty() {
            return Err(Error::InvalidArgument("replace_text needs a non-empty search string".to_string()));
        }
        let mut total = 0;
        for index in 0..self.page_count() {
            let page = self.page(index)?;
            let decoders: HashMap<String, FontDecoder> = font_decoders(self, &page.resources);
            let mut ops = parse(&self.content_of(&page));

            let mut font: Option<String> = None;
            let mut saved: Vec<Option<String>> = Vec::new();
            let mut count = 0;
            for op in ops.iter_mut() {
                match op.operator() {
                    "q" => saved.push(font.clone()),
                    "Q" => font = saved.pop().flatten(),
                    "Tf" => font = op.operands().first().and_then(Object::as_name).map(str::to_string),
                    _ => count += replace_in_op(op, current_decoder(&decoders, font.as_deref()), find, replace),
                }
            }
            if count > 0 {
                self.set_page_content(index, serialize(&ops))?;
                total += count;
            }
        }
        log::debug!("replaced {} occurrences of {:?}", total, find);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::tests::SIMPLE;

    #[test]
    fn test_replace_in_tj() {
        let mut doc = RawDocument::parse(SIMPLE).unwrap();
        assert_eq!(doc.replace_text("World", "There").unwrap(), 1);
        assert_eq!(doc.page_text(0).unwrap(), "Hello There");
        assert_eq!(doc.replace_text("absent", "x").unwrap(), 0);
        assert!(doc.replace_text("", "x").is_err());
    }

    #[test]
    fn test_replace_across_tj_elements() {
        let mut doc = RawDocument::parse(SIMPLE).unwrap();
        doc.set_page_content(0, b"BT /F1 12 Tf 10 10 Td [(Wor) -20 (ld) ( Wor) (ld)] TJ ET".to_vec()).unwrap();
        assert_eq!(doc.replace_text("World", "Earth").unwrap(), 2);
        assert_eq!(doc.page_content(0).unwrap(), b"BT\n/F1 12 Tf\n10 10 Td\n[(Earth Earth)] TJ\nET\n");
    }

    #[test]
    fn test_unencodable_replacement_is_skipped() {
        let mut doc = RawDocument::parse(SIMPLE).unwrap();
        assert_eq!(doc.replace_text("Hello", "\u{4F60}\u{597D}").unwrap(), 0);
        assert_eq!(doc.page_text(0).unwrap(), "Hello World");
    }
}
