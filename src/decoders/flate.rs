//! FlateDecode (zlib) filter.
//!
//! Damaged streams are common, so decoding tries several strategies before
//! giving up: zlib, raw deflate, deflate after skipping a bad header, and
//! finally the libflate implementation. Partial output from any strategy is
//! accepted when the data is truncated.

use super::StreamDecoder;
use crate::error::{Error, Result};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use libflate::zlib::Decoder as LibflateDecoder;
use std::io::{Read, Write};

/// FlateDecode filter.
pub struct FlateDecoder;

/// Outcome of one decoding attempt.
fn attempt<R: Read>(mut reader: R, label: &str) -> Option<Vec<u8>> {
    let mut output = Vec::new();
    match reader.read_to_end(&mut output) {
        Ok(_) => Some(output),
        Err(e) if !output.is_empty() => {
            log::warn!("{}: recovered {} bytes before error: {}", label, output.len(), e);
            Some(output)
        },
        Err(e) => {
            log::debug!("{} failed: {}", label, e);
            None
        },
    }
}

impl StreamDecoder for FlateDecoder {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(out) = attempt(ZlibDecoder::new(input), "zlib") {
            return Ok(out);
        }
        if let Some(out) = attempt(DeflateDecoder::new(input), "raw deflate") {
            return Ok(out);
        }
        if input.len() > 2 {
            if let Some(out) = attempt(DeflateDecoder::new(&input[2..]), "deflate after header") {
                return Ok(out);
            }
        }
        if let Ok(decoder) = LibflateDecoder::new(input) {
            if let Some(out) = attempt(decoder, "libflate").filter(|out| !out.is_empty()) {
                return Ok(out);
            }
        }

        Err(Error::Decode(format!("FlateDecode failed for {} input bytes", input.len())))
    }

    fn name(&self) -> &'static str {
        "FlateDecode"
    }
}

/// Compress `data` with zlib framing at the given level.
pub fn flate_encode(data: &[u8], level: flate2::Compression) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), level);
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
