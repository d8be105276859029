//! Content stream cleanup.
//!
//! Three passes per page, repeated until nothing changes:
//!
//! 1. In a run of consecutive state setters, only the last setter of each
//!    kind survives.
//! 2. `q ... Q` pairs enclosing nothing but state operators are dropped,
//!    as are `BT ET` pairs with nothing between them.
//! 3. The survivors are written one operator per line.

use super::RawDocument;
use super::content::{ContentOp, parse, serialize};
use crate::error::Result;

/// Totals from [`RawDocument::clean_content`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    /// Pages rewritten
    pub pages: usize,
    /// Operators before cleaning, all pages
    pub operators_before: usize,
    /// Operators after cleaning, all pages
    pub operators_after: usize,
    /// Decoded content bytes before cleaning
    pub bytes_before: usize,
    /// Content bytes after cleaning
    pub bytes_after: usize,
}

impl CleanStats {
    /// Operators removed.
    pub fn removed(&self) -> usize {
        self.operators_before.saturating_sub(self.operators_after)
    }
}

/// State slot an operator overwrites, for setters whose last value is all
/// that matters.
fn setter_slot(operator: &str) -> Option<&'static str> {
    let slot = match operator {
        "g" | "rg" | "k" => "fill",
        "G" | "RG" | "K" => "stroke",
        "w" => "w",
        "J" => "J",
        "j" => "j",
        "M" => "M",
        "d" => "d",
        "ri" => "ri",
        "i" => "i",
        "Tc" => "Tc",
        "Tw" => "Tw",
        "Tz" => "Tz",
        "TL" => "TL",
        "Tf" => "Tf",
        "Tr" => "Tr",
        "Ts" => "Ts",
        _ => return None,
    };
    Some(slot)
}

/// Operators that change graphics state without painting.
fn is_state_op(operator: &str) -> bool {
    setter_slot(operator).is_some() || matches!(operator, "cm" | "gs" | "cs" | "CS" | "sc" | "scn" | "SC" | "SCN")
}

/// Keep the last setter per slot within each run of setters.
fn collapse_setters(ops: Vec<ContentOp>) -> Vec<ContentOp> {
    let mut out: Vec<ContentOp> = Vec::with_capacity(ops.len());
    let mut run_start = 0;
    for op in ops {
        match setter_slot(op.operator()) {
            Some(slot) => {
                let dup = out[run_start..].iter().position(|prev| setter_slot(prev.operator()) == Some(slot));
                if let Some(i) = dup {
                    out.remove(run_start + i);
                }
            },
            None => run_start = out.len() + 1,
        }
        out.push(op);
    }
    out
}

/// Drop `q [state ops] Q` and `BT ET`. Returns whether anything changed.
fn drop_empty_pairs(ops: &mut Vec<ContentOp>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < ops.len() {
        match ops[i].operator() {
            "q" => {
                let body = ops[i + 1..].iter().take_while(|op| is_state_op(op.operator())).count();
                if ops.get(i + 1 + body).is_some_and(|op| op.operator() == "Q") {
                    ops.drain(i..i + body + 2);
                    changed = true;
                    i = i.saturating_sub(1);
                    continue;
                }
            },
            "BT" if ops.get(i + 1).is_some_and(|op| op.operator() == "ET") => {
                ops.drain(i..i + 2);
                changed = true;
                i = i.saturating_sub(1);
                continue;
            },
            _ => {},
        }
        i += 1;
    }
    changed
}

/// Clean one content stream.
pub(crate) fn clean_ops(ops: Vec<ContentOp>) -> Vec<ContentOp> {
    let mut ops = collapse_setters(ops);
    while drop_empty_pairs(&mut ops) {
        ops = collapse_setters(ops);
    }
    ops
}

impl RawDocument {
    /// Remove dead operators from every page and rewrite each page's
    /// content as one unfiltered stream.
    pub fn clean_content(&mut self) -> Result<CleanStats> {
        let mut stats = CleanStats::default();
        for index in 0..self.page_count() {
            let content = self.page_content(index)?;
            let ops = parse(&content);
            let before = ops.len();
            let cleaned = clean_ops(ops);
            let data = serialize(&cleaned);

            stats.pages += 1;
            stats.operators_before += before;
            stats.operators_after += cleaned.len();
            stats.bytes_before += content.len();
            stats.bytes_after += data.len();
            self.set_page_content(index, data)?;
        }
        log::debug!(
            "cleaned {} pages: {} -> {} operators",
            stats.pages,
            stats.operators_before,
            stats.operators_after
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(content: &[u8]) -> Vec<u8> {
        serialize(&clean_ops(parse(content)))
    }

    #[test]
    fn test_collapse_runs() {
        assert_eq!(clean(b"1 w 0 g 2 w 0.5 g 0 0 m 9 9 l S"), b"2 w\n0.5 g\n0 0 m\n9 9 l\nS\n");
        // separated by painting, both stay
        assert_eq!(clean(b"1 w 0 0 m S 1 w 0 0 m S"), b"1 w\n0 0 m\nS\n1 w\n0 0 m\nS\n");
        // fill and stroke are separate slots
        assert_eq!(clean(b"1 0 0 rg 0 G f"), b"1 0 0 rg\n0 G\nf\n");
    }

    #[test]
    fn test_empty_pairs_removed() {
        assert_eq!(clean(b"q 1 w Q q q 0 g Q Q BT ET 0 0 m S"), b"0 0 m\nS\n");
        assert_eq!(clean(b"q 1 0 0 1 5 5 cm /Im1 Do Q"), b"q\n1 0 0 1 5 5 cm\n/Im1 Do\nQ\n");
    }

    #[test]
    fn test_clean_content_rewrites_pages() {
        let mut doc = RawDocument::parse(super::super::tests::SIMPLE).unwrap();
        doc.set_page_content(0, b"q   Q\n0 g 1 g\n\n BT /F1 12 Tf (Hi) Tj ET".to_vec()).unwrap();
        let stats = doc.clean_content().unwrap();
        assert_eq!(stats.pages, 1);
        assert_eq!(stats.operators_before, 8);
        assert_eq!(stats.operators_after, 5);
        assert_eq!(stats.removed(), 3);
        assert_eq!(doc.page_content(0).unwrap(), b"1 g\nBT\n/F1 12 Tf\n(Hi) Tj\nET\n");
        assert_eq!(doc.search("hi", true).len(), 1);
    }
}
