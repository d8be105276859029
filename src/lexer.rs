//! Tokenizer for the object syntax and the content-stream operator language.
//!
//! Both languages share one lexical grammar:
//! - Numbers: integers (42, -123) and reals (3.14, -2.5, .5)
//! - Strings: literal ((Hello)) and hexadecimal (<48656C6C6F>)
//! - Names: identifiers starting with / (/Type, /Pages)
//! - Delimiters: `[`, `]`, `<<`, `>>`
//! - Bare words: `true`, `false`, `null`, `obj`, `endobj`, `stream`,
//!   `endstream`, `R`, and any other run of regular characters, which the
//!   content-stream parser treats as an operator (`Tj`, `re`, `RG`).
//!
//! Bare words are read as a whole run before being classified, so `RG` is
//! one keyword rather than a reference marker followed by `G`.
//!
//! Whitespace (space, \t, \r, \n, \0, \f) and comments (% to EOL) are skipped.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{map, opt, value},
    multi::many0,
    sequence::{delimited, preceded},
};

/// Token types recognized by the lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number (e.g., 42, -123)
    Integer(i64),

    /// Real (floating-point) number (e.g., 3.14, -2.5, .5)
    Real(f64),

    /// Literal string bytes, escapes not yet decoded
    LiteralString(&'a [u8]),

    /// Hexadecimal string digits, whitespace preserved
    HexString(&'a [u8]),

    /// Name with # escapes decoded
    Name(String),

    /// Boolean true keyword
    True,

    /// Boolean false keyword
    False,

    /// Null keyword
    Null,

    /// Array start delimiter [
    ArrayStart,

    /// Array end delimiter ]
    ArrayEnd,

    /// Dictionary start delimiter <<
    DictStart,

    /// Dictionary end delimiter >>
    DictEnd,

    /// Indirect object start keyword "obj"
    ObjStart,

    /// Indirect object end keyword "endobj"
    ObjEnd,

    /// Stream start keyword "stream"
    StreamStart,

    /// Stream end keyword "endstream"
    StreamEnd,

    /// Reference keyword "R" (used in "10 0 R")
    R,

    /// Any other bare word; an operator inside content streams
    Keyword(&'a [u8]),
}

/// PDF whitespace characters.
pub fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// PDF delimiter characters.
pub fn is_delimiter(c: u8) -> bool {
    matches!(c, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Characters that may appear in a bare word or name.
pub fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

fn whitespace(input: &[u8]) -> IResult<&[u8], ()> {
    value((), take_while1(is_whitespace))(input)
}

/// Parse a comment (% to end of line).
fn comment(input: &[u8]) -> IResult<&[u8], ()> {
    value((), preceded(char('%'), take_till(|c| c == b'\r' || c == b'\n')))(input)
}

/// Skip all whitespace and comments.
pub fn skip_ws(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let mut remaining = input;

    loop {
        if let Ok((rest, _)) = whitespace(remaining) {
            remaining = rest;
            continue;
        }
        if let Ok((rest, _)) = comment(remaining) {
            remaining = rest;
            continue;
        }
        break;
    }

    Ok((remaining, input))
}

fn digit_error(input: &[u8]) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
}

/// Parse an integer or real number.
///
/// Accepts a leading sign and numbers starting or ending with a decimal
/// point (`.5`, `5.`).
fn parse_number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (input, sign) = opt(one_of("+-"))(input)?;
    let (input, int_part) = opt(digit1)(input)?;
    let (input, frac_part) = opt(preceded(char('.'), opt(digit1)))(input)?;

    if int_part.is_none() && !matches!(frac_part, Some(Some(_))) {
        return Err(digit_error(input));
    }

    let negative = sign == Some('-');

    if let Some(frac) = frac_part {
        let mut num_str = String::with_capacity(24);
        if negative {
            num_str.push('-');
        }
        match int_part {
            Some(int) => num_str.push_str(std::str::from_utf8(int).map_err(|_| digit_error(input))?),
            None => num_str.push('0'),
        }
        num_str.push('.');
        match frac {
            Some(frac) => {
                num_str.push_str(std::str::from_utf8(frac).map_err(|_| digit_error(input))?)
            },
            None => num_str.push('0'),
        }
        let num: f64 = num_str.parse().map_err(|_| digit_error(input))?;
        Ok((input, Token::Real(num)))
    } else {
        let int_bytes = int_part.ok_or_else(|| digit_error(input))?;
        let int_str = std::str::from_utf8(int_bytes).map_err(|_| digit_error(input))?;
        match int_str.parse::<i64>() {
            Ok(num) => Ok((input, Token::Integer(if negative { -num } else { num }))),
            // Out of i64 range: degrade to a real instead of failing the token
            Err(_) => {
                let num: f64 = int_str.parse().map_err(|_| digit_error(input))?;
                Ok((input, Token::Real(if negative { -num } else { num })))
            },
        }
    }
}

/// Parse a literal string enclosed in parentheses.
///
/// Balanced nested parentheses are allowed; backslash escapes are skipped
/// over but left encoded for the parser to decode.
fn parse_literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (remaining, _) = char('(')(input)?;
    let mut depth = 1usize;
    let mut pos = 0;

    while depth > 0 && pos < remaining.len() {
        match remaining[pos] {
            b'\\' => pos += 2,
            b'(' => {
                depth += 1;
                pos += 1;
            },
            b')' => {
                depth -= 1;
                pos += 1;
            },
            _ => pos += 1,
        }
    }

    if depth != 0 || pos > remaining.len() {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    Ok((&remaining[pos..], Token::LiteralString(&remaining[..pos - 1])))
}

/// Parse a hexadecimal string enclosed in angle brackets.
fn parse_hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    if input.starts_with(b"<<") {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    delimited(
        char('<'),
        map(
            take_while(|c: u8| c.is_ascii_hexdigit() || is_whitespace(c)),
            Token::HexString,
        ),
        char('>'),
    )(input)
}

/// Decode #XX escape sequences in names.
///
/// Invalid sequences are preserved literally.
///
/// ```
/// # use pdf_engine::lexer::decode_name_escapes;
/// assert_eq!(decode_name_escapes(b"A#20B#23C"), "A B#C");
/// assert_eq!(decode_name_escapes(b"Type"), "Type");
/// assert_eq!(decode_name_escapes(b"A#"), "A#");
/// ```
pub fn decode_name_escapes(raw: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            let hex = &raw[i + 1..i + 3];
            if let Some(byte) = std::str::from_utf8(hex)
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok())
            {
                bytes.push(byte);
                i += 3;
                continue;
            }
        }
        bytes.push(raw[i]);
        i += 1;
    }

    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(err) => err.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

/// Parse a name starting with /.
fn parse_name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    preceded(
        char('/'),
        map(take_while(is_regular), |bytes: &[u8]| Token::Name(decode_name_escapes(bytes))),
    )(input)
}

/// Parse the two-character and one-character delimiters.
fn parse_delimiter(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    alt((
        value(Token::DictStart, tag(b"<<")),
        value(Token::DictEnd, tag(b">>")),
        value(Token::ArrayStart, tag(b"[")),
        value(Token::ArrayEnd, tag(b"]")),
    ))(input)
}

/// Parse a bare word and classify it.
fn parse_word(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, word) = alt((take_while1(is_regular), tag(b"{"), tag(b"}")))(input)?;

    let tok = match word {
        b"true" => Token::True,
        b"false" => Token::False,
        b"null" => Token::Null,
        b"obj" => Token::ObjStart,
        b"endobj" => Token::ObjEnd,
        b"stream" => Token::StreamStart,
        b"endstream" => Token::StreamEnd,
        b"R" => Token::R,
        other => Token::Keyword(other),
    };

    Ok((rest, tok))
}

/// Parse a single token.
///
/// Skips whitespace and comments first. Names are tried before numbers so a
/// `/` never reaches the number parser, and numbers are tried before bare
/// words so `-2` and `.5` are numeric.
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (input, _) = skip_ws(input)?;

    alt((
        parse_delimiter,
        parse_name,
        parse_literal_string,
        parse_hex_string,
        parse_number,
        parse_word,
    ))(input)
}

/// Parse multiple tokens from input.
pub fn tokens(input: &[u8]) -> IResult<&[u8], Vec<Token<'_>>> {
    many0(token)(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Numbers
    // ========================================================================

    #[test]
    fn test_parse_integers() {
        assert_eq!(token(b"42"), Ok((&b""[..], Token::Integer(42))));
        assert_eq!(token(b"-123"), Ok((&b""[..], Token::Integer(-123))));
        assert_eq!(token(b"+17"), Ok((&b""[..], Token::Integer(17))));
    }

    #[test]
    fn test_parse_reals() {
        assert_eq!(token(b"-2.5"), Ok((&b""[..], Token::Real(-2.5))));
        assert_eq!(token(b".5"), Ok((&b""[..], Token::Real(0.5))));
        assert_eq!(token(b"5."), Ok((&b""[..], Token::Real(5.0))));
        assert_eq!(token(b"-.002"), Ok((&b""[..], Token::Real(-0.002))));
    }

    #[test]
    fn test_huge_integer_degrades_to_real() {
        let (_, tok) = token(b"99999999999999999999").unwrap();
        assert!(matches!(tok, Token::Real(_)));
    }

    // ========================================================================
    // Strings and names
    // ========================================================================

    #[test]
    fn test_parse_literal_string_with_nested_parens() {
        let result = token(b"(Hello (nested) World)");
        assert_eq!(result, Ok((&b""[..], Token::LiteralString(b"Hello (nested) World"))));
    }

    #[test]
    fn test_literal_string_keeps_escapes() {
        let result = token(b"(a\\)b)");
        assert_eq!(result, Ok((&b""[..], Token::LiteralString(b"a\\)b"))));
    }

    #[test]
    fn test_unbalanced_literal_string_fails() {
        assert!(token(b"(open").is_err());
    }

    #[test]
    fn test_parse_hex_string() {
        let result = token(b"<48 65 6C>");
        assert_eq!(result, Ok((&b""[..], Token::HexString(b"48 65 6C"))));
    }

    #[test]
    fn test_parse_name_with_escape() {
        assert_eq!(token(b"/A#20B"), Ok((&b""[..], Token::Name("A B".to_string()))));
        assert_eq!(token(b"/Type/Page"), Ok((&b"/Page"[..], Token::Name("Type".to_string()))));
    }

    // ========================================================================
    // Keywords and operators
    // ========================================================================

    #[test]
    fn test_object_keywords() {
        assert_eq!(token(b"obj"), Ok((&b""[..], Token::ObjStart)));
        assert_eq!(token(b"endobj"), Ok((&b""[..], Token::ObjEnd)));
        assert_eq!(token(b"stream"), Ok((&b""[..], Token::StreamStart)));
        assert_eq!(token(b"endstream"), Ok((&b""[..], Token::StreamEnd)));
        assert_eq!(token(b"R"), Ok((&b""[..], Token::R)));
        assert_eq!(token(b"null"), Ok((&b""[..], Token::Null)));
    }

    #[test]
    fn test_operator_starting_with_r_is_one_word() {
        assert_eq!(token(b"RG"), Ok((&b""[..], Token::Keyword(b"RG"))));
        assert_eq!(token(b"re\n"), Ok((&b"\n"[..], Token::Keyword(b"re"))));
    }

    #[test]
    fn test_quote_operators() {
        assert_eq!(token(b"'"), Ok((&b""[..], Token::Keyword(b"'"))));
        assert_eq!(token(b"T*"), Ok((&b""[..], Token::Keyword(b"T*"))));
    }

    #[test]
    fn test_dict_vs_hex_string() {
        assert_eq!(token(b"<<"), Ok((&b""[..], Token::DictStart)));
        assert_eq!(token(b"<AB>"), Ok((&b""[..], Token::HexString(b"AB"))));
    }

    #[test]
    fn test_skip_comments_and_whitespace() {
        let (rest, tok) = token(b"  % comment\n\t/Name").unwrap();
        assert!(rest.is_empty());
        assert_eq!(tok, Token::Name("Name".to_string()));
    }

    #[test]
    fn test_content_stream_snippet() {
        let (_, toks) = tokens(b"BT /F1 12 Tf 72 700 Td (Hi) Tj ET").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Keyword(b"BT"),
                Token::Name("F1".to_string()),
                Token::Integer(12),
                Token::Keyword(b"Tf"),
                Token::Integer(72),
                Token::Integer(700),
                Token::Keyword(b"Td"),
                Token::LiteralString(b"Hi"),
                Token::Keyword(b"Tj"),
                Token::Keyword(b"ET"),
            ]
        );
    }

    #[test]
    fn test_object_header_snippet() {
        let (_, toks) = tokens(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj").unwrap();
        assert_eq!(toks.first(), Some(&Token::Integer(1)));
        assert_eq!(toks.get(2), Some(&Token::ObjStart));
        assert!(toks.contains(&Token::R));
        assert_eq!(toks.last(), Some(&Token::ObjEnd));
    }
}
