//! Content stream tokenization for the raw reader.
//!
//! Operands are kept as generic [`Object`]s and operators as plain names, so
//! a parse followed by [`serialize`] preserves everything the editing passes
//! do not touch. Inline images are carried through as raw bytes.
//!
//! ```
//! use pdf_engine::reader::content::{parse, serialize};
//!
//! let ops = parse(b"BT /F1 12 Tf (Hi) Tj ET");
//! assert_eq!(ops.len(), 4);
//! assert_eq!(serialize(&ops), b"BT\n/F1 12 Tf\n(Hi) Tj\nET\n");
//! ```

use crate::lexer::{Token, is_whitespace, skip_ws, token};
use crate::object::Object;
use crate::parser::parse_object;
use crate::serializer::ObjectSerializer;

/// One element of a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentOp {
    /// An operator and the operands preceding it
    Op {
        /// Operator name (`Tj`, `re`, `'`)
        operator: String,
        /// Operands in stream order
        operands: Vec<Object>,
    },
    /// `BI ... ID ... EI`, verbatim
    InlineImage(Vec<u8>),
}

impl ContentOp {
    /// Operator with operands.
    pub fn new(operator: &str, operands: Vec<Object>) -> Self {
        ContentOp::Op {
            operator: operator.to_string(),
            operands,
        }
    }

    /// Operator name; `BI` for inline images.
    pub fn operator(&self) -> &str {
        match self {
            ContentOp::Op { operator, .. } => operator,
            ContentOp::InlineImage(_) => "BI",
        }
    }

    /// Operands; empty for inline images.
    pub fn operands(&self) -> &[Object] {
        match self {
            ContentOp::Op { operands, .. } => operands,
            ContentOp::InlineImage(_) => &[],
        }
    }

    /// Operand `i` as a number, 0 when absent.
    pub fn number(&self, i: usize) -> f64 {
        self.operands().get(i).and_then(Object::as_number).unwrap_or(0.0)
    }
}

/// Parse decoded content. Unreadable bytes are skipped; operands left
/// without an operator at the end are dropped.
pub fn parse(data: &[u8]) -> Vec<ContentOp> {
    let mut ops = Vec::new();
    let mut operands = Vec::new();
    let mut input = data;

    loop {
        input = match skip_ws(input) {
            Ok((rest, _)) => rest,
            Err(_) => input,
        };
        if input.is_empty() {
            break;
        }

        match token(input) {
            Ok((rest, Token::Keyword(b"BI"))) => {
                let (image, after) = inline_image(input, rest);
                ops.push(ContentOp::InlineImage(image.to_vec()));
                operands.clear();
                input = after;
            },
            Ok((rest, Token::Keyword(word))) => {
                ops.push(ContentOp::Op {
                    operator: String::from_utf8_lossy(word).into_owned(),
                    operands: std::mem::take(&mut operands),
                });
                input = rest;
            },
            Ok((rest, Token::ArrayEnd | Token::DictEnd)) => {
                log::warn!("stray closing delimiter in content stream");
                input = rest;
            },
            Ok((rest, Token::ObjStart | Token::ObjEnd | Token::StreamStart | Token::StreamEnd | Token::R)) => {
                log::warn!("unexpected object keyword in content stream");
                input = rest;
            },
            Ok(_) => match parse_object(input) {
                Ok((rest, object)) => {
                    operands.push(object);
                    input = rest;
                },
                Err(_) => {
                    log::warn!("unparsable operand at content offset {}", data.len() - input.len());
                    input = &input[1..];
                },
            },
            Err(_) => {
                log::warn!("unparsable byte at content offset {}", data.len() - input.len());
                input = &input[1..];
            },
        }
    }
    if !operands.is_empty() {
        log::debug!("dropping {} trailing operands", operands.len());
    }
    ops
}

/// Split off an inline image starting at `start` (`BI`), with `rest` just
/// after the `BI` keyword. Returns the image bytes and the input after `EI`.
fn inline_image<'a>(start: &'a [u8], rest: &'a [u8]) -> (&'a [u8], &'a [u8]) {
    let header_len = start.len() - rest.len();
    let Some(id) = find_keyword(rest, b"ID", 0) else {
        return (start, &[]);
    };
    // one whitespace byte separates ID from the data
    let data_start = id + 3;
    match find_keyword(rest, b"EI", data_start.min(rest.len())) {
        Some(ei) => {
            let end = header_len + ei + 2;
            (&start[..end], &start[end..])
        },
        None => (start, &[]),
    }
}

/// Position of `keyword` standing alone (whitespace or ends on both sides),
/// searching from `from`.
fn find_keyword(data: &[u8], keyword: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i + keyword.len() <= data.len() {
        if &data[i..i + keyword.len()] == keyword {
            let before = i == 0 || is_whitespace(data[i - 1]);
            let after = data.get(i + keyword.len()).map_or(true, |&c| is_whitespace(c));
            if before && after {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Write ops back as content, one operator per line.
pub fn serialize(ops: &[ContentOp]) -> Vec<u8> {
    let serializer = ObjectSerializer::compact();
    let mut out = Vec::new();
    for op in ops {
        match op {
            ContentOp::Op { operator, operands } => {
                for operand in operands {
                    // Vec sink never fails
                    let _ = serializer.write_object(&mut out, operand);
                    out.push(b' ');
                }
                out.extend_from_slice(operator.as_bytes());
            },
            ContentOp::InlineImage(raw) => out.extend_from_slice(raw),
        }
        out.push(b'\n');
    }
    out
}

/// Number of operators, counting inline images as one.
pub fn operator_count(data: &[u8]) -> usize {
    parse(data).len()
}
