//! ASCIIHexDecode filter.

use super::StreamDecoder;
use crate::error::Result;

/// ASCIIHexDecode: pairs of hex digits, whitespace ignored, `>` ends data.
pub struct AsciiHexDecoder;

impl StreamDecoder for AsciiHexDecoder {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let end = input.iter().position(|&b| b == b'>').unwrap_or(input.len());
        crate::parser::decode_hex(&input[..end])
            .map_err(|e| crate::error::Error::Decode(format!("ASCIIHexDecode: {}", e)))
    }

    fn name(&self) -> &'static str {
        "ASCIIHexDecode"
    }
}
