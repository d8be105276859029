//! Stream filters.
//!
//! Decoding covers the filters the reader meets in practice:
//! - FlateDecode (zlib/deflate), with fallbacks for damaged data
//! - ASCIIHexDecode
//! - ASCII85Decode
//! - RunLengthDecode
//! - DCTDecode / JPXDecode (pass-through: image codec data is left encoded)
//!
//! Encoding is FlateDecode only; the writer compresses content streams and
//! embedded resources with it at the configured level.

use crate::error::{Error, Result};

mod ascii85;
mod ascii_hex;
mod flate;
mod runlength;

pub use ascii_hex::AsciiHexDecoder;
pub use ascii85::Ascii85Decoder;
pub use flate::{FlateDecoder, flate_encode};
pub use runlength::RunLengthDecoder;

/// Upper bound on decoded stream size, guarding against decompression bombs.
pub const MAX_DECODED_SIZE: usize = 256 * 1024 * 1024;

/// A single stream filter.
pub trait StreamDecoder {
    /// Decode `input`.
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Filter name as it appears in `/Filter`.
    fn name(&self) -> &'static str;
}

/// Image codecs whose data the engine stores and extracts without decoding.
struct PassThrough(&'static str);

impl StreamDecoder for PassThrough {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }

    fn name(&self) -> &'static str {
        self.0
    }
}

/// Look up the decoder for a filter name, including the abbreviated forms
/// allowed in inline images.
pub fn decoder_for(filter: &str) -> Result<Box<dyn StreamDecoder>> {
    match filter {
        "FlateDecode" | "Fl" => Ok(Box::new(FlateDecoder)),
        "ASCIIHexDecode" | "AHx" => Ok(Box::new(AsciiHexDecoder)),
        "ASCII85Decode" | "A85" => Ok(Box::new(Ascii85Decoder)),
        "RunLengthDecode" | "RL" => Ok(Box::new(RunLengthDecoder)),
        "DCTDecode" | "DCT" => Ok(Box::new(PassThrough("DCTDecode"))),
        "JPXDecode" => Ok(Box::new(PassThrough("JPXDecode"))),
        other => Err(Error::UnsupportedFilter(other.to_string())),
    }
}

/// Run `data` through a filter pipeline in the order listed.
pub fn decode_stream(data: &[u8], filters: &[String]) -> Result<Vec<u8>> {
    let mut current = data.to_vec();
    for filter in filters {
        let decoder = decoder_for(filter)?;
        current = decoder.decode(&current)?;
        log::debug!("{} produced {} bytes", decoder.name(), current.len());
        if current.len() > MAX_DECODED_SIZE {
            return Err(Error::Decode(format!(
                "{} output exceeds {} bytes",
                decoder.name(),
                MAX_DECODED_SIZE
            )));
        }
    }
    Ok(current)
}
