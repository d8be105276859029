//! Text search over page content.
//!
//! Show operators are replayed against the text and graphics state to place
//! each decoded character. Characters on the same baseline (within
//! [`LINE_TOLERANCE`]) form a line, so a match may span several show
//! operators.

use super::RawDocument;
use super::content::{ContentOp, parse};
use super::fonts::{FontDecoder, current_decoder, font_decoders};
use crate::object::{Dictionary, Object};
use std::collections::HashSet;

/// Baselines closer than this, in points, belong to one line.
const LINE_TOLERANCE: f64 = 1.0;

/// TJ adjustments at least this wide (thousandths of an em) read as a space.
const TJ_SPACE_THRESHOLD: f64 = 200.0;

/// Form XObjects nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 16;

/// One occurrence of the search string.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    /// Zero-based page index
    pub page: usize,
    /// Baseline origin of the first matched character, in user space
    pub x: f64,
    /// Baseline of the line, in user space
    pub y: f64,
    /// The matched text as it appears on the page
    pub text: String,
    /// The whole line containing the match
    pub line: String,
}

/// Affine matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f64; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn from_operands(op: &ContentOp) -> Self {
        Matrix([op.number(0), op.number(1), op.number(2), op.number(3), op.number(4), op.number(5)])
    }

    fn translation(tx: f64, ty: f64) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self` applied first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn origin(&self) -> (f64, f64) {
        (self.0[4], self.0[5])
    }
}

/// Text state that survives `BT`/`ET`.
#[derive(Debug, Clone)]
struct TextState {
    font: Option<String>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextState {
    fn default() -> Self {
        TextState {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct PlacedChar {
    c: char,
    x: f64,
    y: f64,
    /// x where the next glyph would start
    end: f64,
    size: f64,
}

/// Replays a page's content, collecting placed characters.
struct TextWalker<'a> {
    doc: &'a RawDocument,
    chars: Vec<PlacedChar>,
    forms: HashSet<u32>,
}

impl<'a> TextWalker<'a> {
    fn run(&mut self, data: &[u8], resources: &Dictionary, ctm: Matrix, depth: usize) {
        let decoders = font_decoders(self.doc, resources);
        let mut ctm = ctm;
        let mut stack: Vec<(Matrix, TextState)> = Vec::new();
        let mut ts = TextState::default();
        let mut tm = Matrix::IDENTITY;
        let mut tlm = Matrix::IDENTITY;

        for op in parse(data) {
            match op.operator() {
                "q" => stack.push((ctm, ts.clone())),
                "Q" => {
                    if let Some((saved_ctm, saved_ts)) = stack.pop() {
                        ctm = saved_ctm;
                        ts = saved_ts;
                    }
                },
                "cm" => ctm = Matrix::from_operands(&op).then(&ctm),
                "BT" => {
                    tm = Matrix::IDENTITY;
                    tlm = Matrix::IDENTITY;
                },
                "Tf" => {
                    ts.font = op.operands().first().and_then(Object::as_name).map(str::to_string);
                    ts.size = op.number(1);
                },
                "Tc" => ts.char_spacing = op.number(0),
                "Tw" => ts.word_spacing = op.number(0),
                "Tz" => ts.scale = op.number(0) / 100.0,
                "TL" => ts.leading = op.number(0),
                "Ts" => ts.rise = op.number(0),
                "Td" | "TD" => {
                    if op.operator() == "TD" {
                        ts.leading = -op.number(1);
                    }
                    tlm = Matrix::translation(op.number(0), op.number(1)).then(&tlm);
                    tm = tlm;
                },
                "Tm" => {
                    tlm = Matrix::from_operands(&op);
                    tm = tlm;
                },
                "T*" => {
                    tlm = Matrix::translation(0.0, -ts.leading).then(&tlm);
                    tm = tlm;
                },
                "Tj" | "'" | "\"" => {
                    let string = match op.operator() {
                        "\"" => {
                            ts.word_spacing = op.number(0);
                            ts.char_spacing = op.number(1);
                            op.operands().get(2)
                        },
                        _ => op.operands().first(),
                    };
                    if op.operator() != "Tj" {
                        tlm = Matrix::translation(0.0, -ts.leading).then(&tlm);
                        tm = tlm;
                    }
                    if let Some(bytes) = string.and_then(Object::as_string) {
                        let decoder = current_decoder(&decoders, ts.font.as_deref());
                        self.show(decoder, bytes, &ts, &mut tm, &ctm);
                    }
                },
                "TJ" => {
                    let Some(items) = op.operands().first().and_then(Object::as_array) else {
                        continue;
                    };
                    let decoder = current_decoder(&decoders, ts.font.as_deref());
                    for item in items {
                        match item {
                            Object::String(bytes) => self.show(decoder, bytes, &ts, &mut tm, &ctm),
                            other => {
                                let adjust = other.as_number().unwrap_or(0.0);
                                if -adjust >= TJ_SPACE_THRESHOLD {
                                    self.push_gap_space(&tm, &ctm, &ts);
                                }
                                let tx = -adjust / 1000.0 * ts.size * ts.scale;
                                tm = Matrix::translation(tx, 0.0).then(&tm);
                            },
                        }
                    }
                },
                "Do" => {
                    if let Some(name) = op.operands().first().and_then(Object::as_name) {
                        self.enter_form(resources, name, &ctm, depth);
                    }
                },
                _ => {},
            }
        }
    }

    fn show(&mut self, decoder: &FontDecoder, bytes: &[u8], ts: &TextState, tm: &mut Matrix, ctm: &Matrix) {
        for ch in decoder.decode(bytes) {
            let mut advance = ch.width / 1000.0 * ts.size + ts.char_spacing;
            if ch.is_space {
                advance += ts.word_spacing;
            }
            advance *= ts.scale;

            let start = Matrix::translation(0.0, ts.rise).then(tm).then(ctm).origin();
            let next = Matrix::translation(advance, ts.rise).then(tm).then(ctm).origin();
            let size = ts.size * tm.0[3].hypot(tm.0[2]).max(f64::EPSILON);
            for c in ch.text.chars() {
                self.chars.push(PlacedChar {
                    c,
                    x: start.0,
                    y: start.1,
                    end: next.0,
                    size,
                });
            }
            *tm = Matrix::translation(advance, 0.0).then(tm);
        }
    }

    fn push_gap_space(&mut self, tm: &Matrix, ctm: &Matrix, ts: &TextState) {
        let (x, y) = Matrix::translation(0.0, ts.rise).then(tm).then(ctm).origin();
        self.chars.push(PlacedChar {
            c: ' ',
            x,
            y,
            end: x,
            size: ts.size,
        });
    }

    fn enter_form(&mut self, resources: &Dictionary, name: &str, ctm: &Matrix, depth: usize) {
        let xobjects = self.doc.resource_entries(resources, "XObject");
        let Some(r) = xobjects.get(name).and_then(Object::as_reference) else {
            return;
        };
        let Ok(form) = self.doc.object(r.id) else {
            return;
        };
        if form.get("Subtype").and_then(Object::as_name) != Some("Form") {
            return;
        }
        if depth >= MAX_FORM_DEPTH || !self.forms.insert(r.id) {
            log::warn!("not re-entering form XObject {}", r.id);
            return;
        }
        let matrix = form
            .get("Matrix")
            .and_then(Object::as_array)
            .filter(|m| m.len() == 6)
            .map(|m| Matrix([0, 1, 2, 3, 4, 5].map(|i| m[i].as_number().unwrap_or(0.0))))
            .unwrap_or(Matrix::IDENTITY);
        let form_resources = form
            .get("Resources")
            .map(|res| self.doc.resolve(res))
            .and_then(Object::as_dict)
            .cloned()
            .unwrap_or_else(|| resources.clone());
        match form.decode_stream_data() {
            Ok(data) => self.run(&data, &form_resources, matrix.then(ctm), depth + 1),
            Err(err) => log::warn!("unreadable form XObject {}: {}", r.id, err),
        }
        self.forms.remove(&r.id);
    }
}

/// A reconstructed line of text with per-character origins.
#[derive(Debug, Clone)]
pub(crate) struct TextLine {
    pub y: f64,
    pub chars: Vec<(char, f64)>,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.chars.iter().map(|(c, _)| *c).collect()
    }
}

/// Group placed characters into lines, top to bottom, left to right.
fn build_lines(chars: Vec<PlacedChar>) -> Vec<TextLine> {
    let mut groups: Vec<(f64, Vec<PlacedChar>)> = Vec::new();
    for ch in chars {
        match groups.iter_mut().find(|(y, _)| (y - ch.y).abs() <= LINE_TOLERANCE) {
            Some((_, group)) => group.push(ch),
            None => groups.push((ch.y, vec![ch])),
        }
    }
    groups.sort_by(|a, b| b.0.total_cmp(&a.0));

    groups
        .into_iter()
        .map(|(y, mut group)| {
            group.sort_by(|a, b| a.x.total_cmp(&b.x));
            let mut chars: Vec<(char, f64)> = Vec::with_capacity(group.len());
            let mut prev: Option<&PlacedChar> = None;
            for ch in &group {
                if let Some(p) = prev {
                    let gap = ch.x - p.end;
                    let spaced = p.c.is_whitespace() || ch.c.is_whitespace();
                    if !spaced && gap > 0.15 * ch.size.max(p.size) {
                        chars.push((' ', p.end));
                    }
                }
                if !(ch.c == ' ' && chars.last().is_some_and(|(c, _)| *c == ' ')) {
                    chars.push((ch.c, ch.x));
                }
                prev = Some(ch);
            }
            TextLine { y, chars }
        })
        .collect()
}

fn fold(c: char, case_insensitive: bool) -> char {
    if case_insensitive {
        c.to_lowercase().next().unwrap_or(c)
    } else {
        c
    }
}

/// Non-overlapping occurrences of `needle` in `line`, as char index ranges.
fn find_all(line: &[(char, f64)], needle: &[char], case_insensitive: bool) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    if needle.is_empty() || needle.len() > line.len() {
        return found;
    }
    let mut i = 0;
    while i + needle.len() <= line.len() {
        let hit = needle
            .iter()
            .zip(&line[i..])
            .all(|(n, (c, _))| *n == fold(*c, case_insensitive));
        if hit {
            found.push((i, i + needle.len()));
            i += needle.len();
        } else {
            i += 1;
        }
    }
    found
}

impl RawDocument {
    /// Lines of text on page `index`, top to bottom.
    pub(crate) fn text_lines(&self, index: usize) -> crate::error::Result<Vec<TextLine>> {
        let page = self.page(index)?;
        let mut walker = TextWalker {
            doc: self,
            chars: Vec::new(),
            forms: HashSet::new(),
        };
        walker.run(&self.content_of(&page), &page.resources, Matrix::IDENTITY, 0);
        Ok(build_lines(walker.chars))
    }

    /// Text of page `index`, one line per line of output.
    pub fn page_text(&self, index: usize) -> crate::error::Result<String> {
        let lines = self.text_lines(index)?;
        Ok(lines.iter().map(TextLine::text).collect::<Vec<_>>().join("\n"))
    }

    /// Find `needle` on every page.
    ///
    /// Matches never span lines. An empty needle matches nothing.
    pub fn search(&self, needle: &str, case_insensitive: bool) -> Vec<SearchMatch> {
        let needle: Vec<char> = needle.chars().map(|c| fold(c, case_insensitive)).collect();
        let mut matches = Vec::new();
        for page in 0..self.page_count() {
            let lines = match self.text_lines(page) {
                Ok(lines) => lines,
                Err(err) => {
                    log::warn!("skipping page {} in search: {}", page, err);
                    continue;
                },
            };
            for line in &lines {
                for (start, end) in find_all(&line.chars, &needle, case_insensitive) {
                    matches.push(SearchMatch {
                        page,
                        x: line.chars[start].1,
                        y: line.y,
                        text: line.chars[start..end].iter().map(|(c, _)| *c).collect(),
                        line: line.text(),
                    });
                }
            }
        }
        log::debug!("search found {} matches", matches.len());
        matches
    }
}
