//! Object stream (`/Type /ObjStm`) expansion.
//!
//! An object stream packs several non-stream objects into one compressed
//! stream. The decoded data starts with `N` pairs of integers (object
//! number, offset relative to `/First`) followed by the objects themselves.

use crate::error::{Error, Result};
use crate::lexer::{Token, token};
use crate::object::Object;
use crate::parser::parse_object;

/// Upper bound on `/N`, guarding against absurd allocations.
const MAX_ENTRIES: i64 = 1_000_000;

/// Objects packed in `stream`, in the order the header lists them.
///
/// Members that fail to parse are skipped with a warning; a malformed
/// header fails the whole stream.
pub fn expand(stream: &Object) -> Result<Vec<(u32, Object)>> {
    let Object::Stream { dict, .. } = stream else {
        return Err(Error::InvalidObjectType {
            expected: "Stream".to_string(),
            found: stream.type_name().to_string(),
        });
    };

    let n = dict
        .get("N")
        .and_then(Object::as_integer)
        .ok_or_else(|| Error::InvalidPdf("object stream missing /N".to_string()))?;
    let first = dict
        .get("First")
        .and_then(Object::as_integer)
        .ok_or_else(|| Error::InvalidPdf("object stream missing /First".to_string()))?;
    if !(0..=MAX_ENTRIES).contains(&n) || first < 0 {
        return Err(Error::InvalidPdf(format!("invalid object stream header: /N {} /First {}", n, first)));
    }

    let data = stream.decode_stream_data()?;
    let first = first as usize;
    if data.len() < first {
        return Err(Error::InvalidPdf(format!(
            "object stream data is {} bytes, /First is {}",
            data.len(),
            first
        )));
    }

    let pairs = header_pairs(&data[..first], n as usize)?;
    let body = &data[first..];
    let mut out = Vec::with_capacity(pairs.len());
    for (number, offset) in pairs {
        let Some(slice) = body.get(offset..) else {
            log::warn!("object {} offset {} is past the object stream data", number, offset);
            continue;
        };
        match parse_object(slice) {
            Ok((_, object)) => out.push((number, object)),
            Err(err) => log::warn!("skipping object {} in object stream: {:?}", number, err),
        }
    }
    Ok(out)
}

/// Read `count` (number, offset) pairs.
fn header_pairs(data: &[u8], count: usize) -> Result<Vec<(u32, usize)>> {
    let mut pairs = Vec::with_capacity(count.min(4096));
    let mut rest = data;
    for i in 0..count {
        let mut next = || -> Option<i64> {
            match token(rest) {
                Ok((remaining, Token::Integer(value))) => {
                    rest = remaining;
                    Some(value)
                },
                _ => None,
            }
        };
        let (Some(number), Some(offset)) = (next(), next()) else {
            return Err(Error::ParseError {
                offset: data.len() - rest.len(),
                reason: format!("object stream header ends at pair {}", i),
            });
        };
        match (u32::try_from(number), usize::try_from(offset)) {
            (Ok(number), Ok(offset)) => pairs.push((number, offset)),
            _ => log::warn!("object stream pair {} is out of range: {} {}", i, number, offset),
        }
    }
    Ok(pairs)
}
