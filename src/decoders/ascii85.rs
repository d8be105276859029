//! ASCII85Decode filter.

use super::StreamDecoder;
use crate::error::{Error, Result};

/// ASCII85Decode: base-85 groups of five characters, `z` for four zero
/// bytes, `~>` ends data.
pub struct Ascii85Decoder;

impl StreamDecoder for Ascii85Decoder {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let body = input.strip_prefix(b"<~").unwrap_or(input);
        let mut output = Vec::with_capacity(body.len() * 4 / 5);
        let mut group = [0u8; 5];
        let mut filled = 0;

        for &byte in body {
            match byte {
                b'~' => break,
                b'z' if filled == 0 => output.extend_from_slice(&[0; 4]),
                b'!'..=b'u' => {
                    group[filled] = byte - b'!';
                    filled += 1;
                    if filled == 5 {
                        output.extend_from_slice(&group_value(&group)?.to_be_bytes());
                        filled = 0;
                    }
                },
                c if c.is_ascii_whitespace() || c == 0 => {},
                other => {
                    return Err(Error::Decode(format!(
                        "ASCII85Decode: invalid character 0x{:02x}",
                        other
                    )));
                },
            }
        }

        if filled == 1 {
            return Err(Error::Decode("ASCII85Decode: dangling final character".to_string()));
        }
        if filled > 1 {
            // Pad a partial group with 'u' and keep filled - 1 bytes
            for slot in group.iter_mut().skip(filled) {
                *slot = 84;
            }
            let bytes = group_value(&group)?.to_be_bytes();
            output.extend_from_slice(&bytes[..filled - 1]);
        }

        Ok(output)
    }

    fn name(&self) -> &'static str {
        "ASCII85Decode"
    }
}

fn group_value(group: &[u8; 5]) -> Result<u32> {
    let value = group
        .iter()
        .fold(0u64, |acc, &digit| acc * 85 + digit as u64);
    u32::try_from(value).map_err(|_| Error::Decode("ASCII85Decode: group overflow".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_and_partial_groups() {
        assert_eq!(Ascii85Decoder.decode(b"9jqo^BlbD-~>").unwrap(), b"Man is d");
        assert_eq!(Ascii85Decoder.decode(b"<~9jqo^Blb~>").unwrap(), b"Man is");
    }

    #[test]
    fn test_z_shorthand() {
        assert_eq!(Ascii85Decoder.decode(b"z~>").unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_invalid_character() {
        assert!(Ascii85Decoder.decode(b"abc{~>").is_err());
    }
}
