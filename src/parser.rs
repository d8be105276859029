//! Object parser.
//!
//! Builds [`Object`] values from lexer tokens. Used for whole indirect
//! objects (`N G obj ... endobj`) by the raw reader and for operands by the
//! content-stream parser.
//!
//! The parser is lenient the way real inputs require: dictionaries and arrays
//! truncated at end of input are closed implicitly, and a wrong stream
//! `/Length` falls back to scanning for `endstream`.

use crate::error::{Error, Result};
use crate::lexer::{Token, token};
use crate::object::{Dictionary, Object, ObjectRef};
use nom::IResult;

/// Maximum nesting of arrays and dictionaries.
pub const MAX_DEPTH: u32 = 256;

/// Decode escape sequences in a literal string.
///
/// Handles `\n \r \t \b \f \( \) \\`, octal `\ddd`, and line continuations.
/// Unknown escapes drop the backslash.
pub fn decode_literal_string_escapes(raw: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] != b'\\' || i + 1 >= raw.len() {
            result.push(raw[i]);
            i += 1;
            continue;
        }

        let escaped = raw[i + 1];
        i += 2;
        match escaped {
            b'n' => result.push(b'\n'),
            b'r' => result.push(b'\r'),
            b't' => result.push(b'\t'),
            b'b' => result.push(8),
            b'f' => result.push(12),
            b'\n' => {},
            b'\r' => {
                if raw.get(i) == Some(&b'\n') {
                    i += 1;
                }
            },
            b'0'..=b'7' => {
                let mut octal = (escaped - b'0') as u32;
                let mut digits = 1;
                while digits < 3 {
                    match raw.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            octal = octal * 8 + (d - b'0') as u32;
                            i += 1;
                            digits += 1;
                        },
                        _ => break,
                    }
                }
                result.push((octal & 0xFF) as u8);
            },
            other => result.push(other),
        }
    }

    result
}

/// Decode the digits of a hex string. An odd trailing digit is padded with 0.
pub fn decode_hex(hex_bytes: &[u8]) -> Result<Vec<u8>> {
    fn nibble(c: u8) -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'A'..=b'F' => Some(c - b'A' + 10),
            _ => None,
        }
    }

    let digits: Vec<u8> = hex_bytes
        .iter()
        .copied()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    digits
        .chunks(2)
        .map(|pair| {
            let hi = nibble(pair[0]);
            let lo = pair.get(1).map_or(Some(0), |&c| nibble(c));
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
                _ => Err(Error::ParseError {
                    offset: 0,
                    reason: format!("Invalid hex digit in {:?}", String::from_utf8_lossy(pair)),
                }),
            }
        })
        .collect()
}

fn nom_error(input: &[u8], kind: nom::error::ErrorKind) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Error(nom::error::Error::new(input, kind))
}

/// Parse a single object.
///
/// Integers followed by `G R` become references; a dictionary followed by
/// `stream` becomes a stream object.
pub fn parse_object(input: &[u8]) -> IResult<&[u8], Object> {
    parse_object_nested(input, 0)
}

fn parse_object_nested(input: &[u8], depth: u32) -> IResult<&[u8], Object> {
    if depth > MAX_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TooLarge,
        )));
    }

    let (input, tok) = token(input)?;

    match tok {
        Token::Null => Ok((input, Object::Null)),
        Token::True => Ok((input, Object::Boolean(true))),
        Token::False => Ok((input, Object::Boolean(false))),

        Token::Integer(i) => {
            if (0..=u32::MAX as i64).contains(&i) {
                if let Ok((input2, Token::Integer(gen))) = token(input) {
                    if let Ok((input3, Token::R)) = token(input2) {
                        let gen = u16::try_from(gen).unwrap_or(0);
                        return Ok((input3, Object::Reference(ObjectRef::new(i as u32, gen))));
                    }
                }
            }
            Ok((input, Object::Integer(i)))
        },

        Token::Real(r) => Ok((input, Object::Real(r))),

        Token::LiteralString(bytes) => Ok((input, Object::String(decode_literal_string_escapes(bytes)))),

        Token::HexString(hex_bytes) => match decode_hex(hex_bytes) {
            Ok(decoded) => Ok((input, Object::String(decoded))),
            Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::HexDigit,
            ))),
        },

        Token::Name(name) => Ok((input, Object::Name(name))),

        Token::ArrayStart => parse_array(input, depth + 1),

        Token::DictStart => {
            let (remaining, dict) = parse_dictionary(input, depth + 1)?;

            if let Ok((stream_input, Token::StreamStart)) = token(remaining) {
                let (final_input, stream_data) = parse_stream_data(stream_input, &dict)?;
                return Ok((
                    final_input,
                    Object::Stream {
                        dict,
                        data: bytes::Bytes::from(stream_data),
                    },
                ));
            }

            Ok((remaining, Object::Dictionary(dict)))
        },

        _ => Err(nom_error(input, nom::error::ErrorKind::Tag)),
    }
}

/// Read stream bytes following the `stream` keyword.
fn parse_stream_data<'a>(input: &'a [u8], dict: &Dictionary) -> IResult<&'a [u8], Vec<u8>> {
    let input = if input.starts_with(b"\r\n") {
        &input[2..]
    } else if input.starts_with(b"\n") || input.starts_with(b"\r") {
        &input[1..]
    } else {
        log::warn!("No end-of-line after stream keyword");
        input
    };

    let declared = dict
        .get("Length")
        .and_then(Object::as_integer)
        .and_then(|len| usize::try_from(len).ok());

    if let Some(length) = declared {
        if length <= input.len() {
            if let Ok((rest, Token::StreamEnd)) = token(&input[length..]) {
                return Ok((rest, input[..length].to_vec()));
            }
        }
        log::debug!("Stream /Length {} does not reach endstream; scanning", length);
    }

    let pos = find_endstream(input).ok_or_else(|| nom_error(input, nom::error::ErrorKind::Eof))?;
    let mut data = &input[..pos];
    if data.ends_with(b"\r\n") {
        data = &data[..data.len() - 2];
    } else if data.ends_with(b"\n") || data.ends_with(b"\r") {
        data = &data[..data.len() - 1];
    }
    let rest = &input[pos + b"endstream".len()..];
    Ok((rest, data.to_vec()))
}

fn find_endstream(input: &[u8]) -> Option<usize> {
    let keyword = b"endstream";
    input.windows(keyword.len()).position(|window| window == keyword)
}

fn parse_array(input: &[u8], depth: u32) -> IResult<&[u8], Object> {
    let mut objects = Vec::new();
    let mut remaining = input;

    loop {
        match token(remaining) {
            Ok((rest, Token::ArrayEnd)) => return Ok((rest, Object::Array(objects))),
            Ok(_) => match parse_object_nested(remaining, depth) {
                Ok((rest, obj)) => {
                    objects.push(obj);
                    remaining = rest;
                },
                Err(e) => return Err(e),
            },
            Err(_) if skip_blank(remaining) => return Ok((remaining, Object::Array(objects))),
            Err(e) => return Err(e),
        }
    }
}

fn parse_dictionary(input: &[u8], depth: u32) -> IResult<&[u8], Dictionary> {
    let mut dict = Dictionary::new();
    let mut remaining = input;

    loop {
        match token(remaining) {
            Ok((rest, Token::DictEnd)) => return Ok((rest, dict)),
            Ok((rest, Token::Name(key))) => match parse_object_nested(rest, depth) {
                Ok((rest, value)) => {
                    dict.insert(key, value);
                    remaining = rest;
                },
                // `/Key >>` with a missing value: keep what we have
                Err(nom::Err::Error(_)) if matches!(token(rest), Ok((_, Token::DictEnd))) => {
                    remaining = rest;
                },
                Err(_) if skip_blank(rest) => return Ok((rest, dict)),
                Err(e) => return Err(e),
            },
            Ok(_) => return Err(nom_error(remaining, nom::error::ErrorKind::Tag)),
            Err(_) if skip_blank(remaining) => return Ok((remaining, dict)),
            Err(e) => return Err(e),
        }
    }
}

/// Whether only whitespace and comments remain.
fn skip_blank(input: &[u8]) -> bool {
    crate::lexer::skip_ws(input)
        .map(|(rest, _)| rest.is_empty())
        .unwrap_or(false)
}

/// Parse an indirect object definition `N G obj <object> endobj`.
///
/// A missing `endobj` is tolerated.
pub fn parse_indirect_object(input: &[u8]) -> IResult<&[u8], (ObjectRef, Object)> {
    let (input, id) = match token(input)? {
        (rest, Token::Integer(id)) if (0..=u32::MAX as i64).contains(&id) => (rest, id as u32),
        _ => return Err(nom_error(input, nom::error::ErrorKind::Digit)),
    };
    let (input, gen) = match token(input)? {
        (rest, Token::Integer(gen)) => (rest, u16::try_from(gen).unwrap_or(0)),
        _ => return Err(nom_error(input, nom::error::ErrorKind::Digit)),
    };
    let (input, _) = match token(input)? {
        (rest, Token::ObjStart) => (rest, ()),
        _ => return Err(nom_error(input, nom::error::ErrorKind::Tag)),
    };

    // `N G obj endobj` is an empty object
    if let Ok((rest, Token::ObjEnd)) = token(input) {
        return Ok((rest, (ObjectRef::new(id, gen), Object::Null)));
    }

    let (input, object) = parse_object(input)?;
    let input = match token(input) {
        Ok((rest, Token::ObjEnd)) => rest,
        _ => input,
    };

    Ok((input, (ObjectRef::new(id, gen), object)))
}

/// Parse the indirect object starting at `offset` in `data`.
pub fn parse_indirect_object_at(data: &[u8], offset: usize) -> Result<(ObjectRef, Object)> {
    let slice = data.get(offset..).ok_or(Error::ParseError {
        offset,
        reason: "offset past end of input".to_string(),
    })?;

    parse_indirect_object(slice)
        .map(|(_, parsed)| parsed)
        .map_err(|err| Error::ParseError {
            offset,
            reason: match err {
                nom::Err::Incomplete(_) => "incomplete input".to_string(),
                nom::Err::Error(e) | nom::Err::Failure(e) => format!("{:?}", e.code),
            },
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Scalars
    // ========================================================================

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse_object(b"null").unwrap().1, Object::Null);
        assert_eq!(parse_object(b"true").unwrap().1, Object::Boolean(true));
        assert_eq!(parse_object(b"-12").unwrap().1, Object::Integer(-12));
        assert_eq!(parse_object(b"1.5").unwrap().1, Object::Real(1.5));
        assert_eq!(parse_object(b"/Page").unwrap().1, Object::Name("Page".into()));
    }

    #[test]
    fn test_parse_reference() {
        let (rest, obj) = parse_object(b"12 0 R /Next").unwrap();
        assert_eq!(obj, Object::Reference(ObjectRef::new(12, 0)));
        assert_eq!(rest, b" /Next");
    }

    #[test]
    fn test_integer_pair_without_r_is_not_reference() {
        let (rest, obj) = parse_object(b"12 0 re").unwrap();
        assert_eq!(obj, Object::Integer(12));
        assert_eq!(rest, b" 0 re");
    }

    #[test]
    fn test_literal_string_escapes() {
        assert_eq!(decode_literal_string_escapes(b"a\\(b\\)\\n"), b"a(b)\n");
        assert_eq!(decode_literal_string_escapes(b"\\101\\7"), b"A\x07");
        assert_eq!(decode_literal_string_escapes(b"line\\\ncontinued"), b"linecontinued");
    }

    #[test]
    fn test_hex_string_odd_digits() {
        assert_eq!(decode_hex(b"48656C6C6F").unwrap(), b"Hello");
        assert_eq!(decode_hex(b"4 8 6").unwrap(), vec![0x48, 0x60]);
        assert!(decode_hex(b"zz").is_err());
    }

    // ========================================================================
    // Containers
    // ========================================================================

    #[test]
    fn test_parse_nested_containers() {
        let (_, obj) = parse_object(b"<< /Kids [3 0 R 4 0 R] /Count 2 /Inner << /A (x) >> >>").unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict["Count"], Object::Integer(2));
        assert_eq!(dict["Kids"].as_array().unwrap().len(), 2);
        assert_eq!(dict["Inner"].get("A"), Some(&Object::String(b"x".to_vec())));
    }

    #[test]
    fn test_truncated_dictionary_is_closed() {
        let (_, obj) = parse_object(b"<< /Type /Page /Count 3").unwrap();
        assert_eq!(obj.get("Count"), Some(&Object::Integer(3)));
    }

    #[test]
    fn test_depth_limit() {
        let deep = "[".repeat(MAX_DEPTH as usize + 10);
        assert!(parse_object(deep.as_bytes()).is_err());
    }

    // ========================================================================
    // Streams and indirect objects
    // ========================================================================

    #[test]
    fn test_stream_with_correct_length() {
        let input = b"<< /Length 5 >>\nstream\nhello\nendstream";
        let (_, obj) = parse_object(input).unwrap();
        match obj {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"hello"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_with_wrong_length_scans_for_endstream() {
        let input = b"<< /Length 99 >>\nstream\nhello\nendstream";
        let (_, obj) = parse_object(input).unwrap();
        match obj {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"hello"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_stream_with_indirect_length() {
        let input = b"<< /Length 8 0 R >>\r\nstream\r\nabc\r\nendstream";
        let (_, obj) = parse_object(input).unwrap();
        match obj {
            Object::Stream { data, .. } => assert_eq!(&data[..], b"abc"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_indirect_object() {
        let input = b"7 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n";
        let (_, (r, obj)) = parse_indirect_object(input).unwrap();
        assert_eq!(r, ObjectRef::new(7, 0));
        assert!(obj.has_type("Catalog"));
    }

    #[test]
    fn test_parse_indirect_object_at_reports_offset() {
        let err = parse_indirect_object_at(b"garbage", 0).unwrap_err();
        assert!(matches!(err, Error::ParseError { offset: 0, .. }));
    }
}
