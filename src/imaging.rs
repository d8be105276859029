//! Image input for embedding.
//!
//! [`ImageData`] is what the codec side hands to the document: decoded
//! samples with an optional alpha plane, or JPEG bytes passed through as-is.
//! PNG and other raster formats are decoded with the `image` crate.

use crate::error::{Error, Result};
use crate::objects::{ImageColorSpace, ImageEncoding};
use image::GenericImageView;

/// Decoded or pass-through image data.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Sample color space
    pub color_space: ImageColorSpace,
    /// Sample storage
    pub encoding: ImageEncoding,
    /// Samples (raw) or the JPEG file (DCT)
    pub data: Vec<u8>,
    /// One 8-bit alpha sample per pixel
    pub alpha: Option<Vec<u8>>,
}

impl ImageData {
    /// Raw 8-bit samples. The buffer must hold exactly one pixel grid.
    pub fn raw(width: u32, height: u32, color_space: ImageColorSpace, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * color_space.components();
        if width == 0 || height == 0 || data.len() != expected {
            return Err(Error::Image(format!(
                "expected {} sample bytes for {}x{} {:?}, got {}",
                expected,
                width,
                height,
                color_space,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            color_space,
            encoding: ImageEncoding::Raw,
            data,
            alpha: None,
        })
    }

    /// Attach an alpha plane, written as a soft-mask image.
    pub fn with_alpha(mut self, alpha: Vec<u8>) -> Result<Self> {
        if alpha.len() != self.width as usize * self.height as usize {
            return Err(Error::Image(format!(
                "alpha plane has {} bytes for {} pixels",
                alpha.len(),
                self.width as usize * self.height as usize
            )));
        }
        self.alpha = Some(alpha);
        Ok(self)
    }

    /// JPEG data kept compressed; only the frame header is read.
    pub fn from_jpeg(data: Vec<u8>) -> Result<Self> {
        let (width, height, color_space) = parse_jpeg_header(&data)?;
        Ok(Self {
            width,
            height,
            color_space,
            encoding: ImageEncoding::Dct,
            data,
            alpha: None,
        })
    }

    /// Detect the format from magic bytes. JPEG passes through, anything
    /// else the codec understands is decoded to raw samples.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(&[0xFF, 0xD8]) {
            return Self::from_jpeg(bytes.to_vec());
        }

        let img = image::load_from_memory(bytes).map_err(|e| Error::Image(e.to_string()))?;
        let (width, height) = img.dimensions();
        let pixels = width as usize * height as usize;

        let decoded = match img.color() {
            image::ColorType::L8 | image::ColorType::L16 => {
                Self::raw(width, height, ImageColorSpace::Gray, img.to_luma8().into_raw())?
            },
            image::ColorType::La8 | image::ColorType::La16 => {
                let la = img.to_luma_alpha8();
                let mut gray = Vec::with_capacity(pixels);
                let mut alpha = Vec::with_capacity(pixels);
                for pixel in la.pixels() {
                    gray.push(pixel.0[0]);
                    alpha.push(pixel.0[1]);
                }
                Self::raw(width, height, ImageColorSpace::Gray, gray)?.with_alpha(alpha)?
            },
            color if color.has_alpha() => {
                let rgba = img.to_rgba8();
                let mut rgb = Vec::with_capacity(pixels * 3);
                let mut alpha = Vec::with_capacity(pixels);
                for pixel in rgba.pixels() {
                    rgb.extend_from_slice(&pixel.0[..3]);
                    alpha.push(pixel.0[3]);
                }
                Self::raw(width, height, ImageColorSpace::Rgb, rgb)?.with_alpha(alpha)?
            },
            _ => Self::raw(width, height, ImageColorSpace::Rgb, img.to_rgb8().into_raw())?,
        };

        // Fully opaque alpha adds nothing
        Ok(match decoded.alpha.as_ref() {
            Some(alpha) if alpha.iter().all(|&a| a == 255) => Self {
                alpha: None,
                ..decoded
            },
            _ => decoded,
        })
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

/// Read width, height, and component count from the first SOF marker.
fn parse_jpeg_header(data: &[u8]) -> Result<(u32, u32, ImageColorSpace)> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return Err(Error::Image("not a JPEG file".to_string()));
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        pos += 2;

        if marker == 0xFF || marker == 0x00 || (0xD0..=0xD8).contains(&marker) {
            continue;
        }

        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            if pos + 8 > data.len() {
                return Err(Error::Image("truncated JPEG frame header".to_string()));
            }
            let height = u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as u32;
            let width = u16::from_be_bytes([data[pos + 5], data[pos + 6]]) as u32;
            let color_space = match data[pos + 7] {
                1 => ImageColorSpace::Gray,
                4 => ImageColorSpace::Cmyk,
                _ => ImageColorSpace::Rgb,
            };
            return Ok((width, height, color_space));
        }

        if pos + 2 > data.len() {
            break;
        }
        let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        pos += length;
    }

    Err(Error::Image("JPEG frame header not found".to_string()))
}
