//! Content-stream operator cache.
//!
//! Drawing calls append [`CacheEntry`] records to a page's [`ContentCache`].
//! The cache is serialized into operator text when the document is written.
//!
//! Entries hold caller-space coordinates already converted to points: Y grows
//! downward from the top of the page. Emission flips every Y to
//! `page_height - y`.

pub mod cache;
pub mod entry;
pub mod metrics;
pub mod op;

pub use cache::ContentCache;
pub use entry::{
    Align, Border, CacheEntry, Cell, ClipPath, Decoration, Line, PaintStyle, Placement,
    PlacementKind, Shape, ShapeKind, TextRun, VAlign,
};
pub use metrics::{
    EmbeddedMetrics, EncodedText, FontKind, FontMetrics, FontProgram, Glyph, StandardFont,
};
pub use op::{Op, render_ops, write_op};

use serde::{Deserialize, Serialize};

/// A fill or stroke color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Color {
    /// DeviceGray, 0.0 (black) to 1.0 (white)
    Gray(f64),
    /// DeviceRGB components in 0.0..=1.0
    Rgb(f64, f64, f64),
    /// DeviceCMYK components in 0.0..=1.0
    Cmyk(f64, f64, f64, f64),
    /// A tint of a Separation color space registered on the page
    Spot {
        /// Color space resource name
        resource: String,
        /// Tint, 0.0 (none) to 1.0 (full)
        tint: f64,
    },
}

impl Color {
    /// RGB from 8-bit components.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    /// Black.
    pub fn black() -> Self {
        Color::Gray(0.0)
    }

    /// Components as an array, used for annotation and outline colors.
    pub fn components(&self) -> Vec<f64> {
        match self {
            Color::Gray(g) => vec![*g],
            Color::Rgb(r, g, b) => vec![*r, *g, *b],
            Color::Cmyk(c, m, y, k) => vec![*c, *m, *y, *k],
            Color::Spot { tint, .. } => vec![*tint],
        }
    }
}

/// Context shared by every entry during emission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitContext {
    /// Page (or form) height in points, used to flip Y
    pub page_height: f64,
}

impl EmitContext {
    /// Flip a caller-space Y to content-stream space.
    pub fn flip(&self, y: f64) -> f64 {
        self.page_height - y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb8() {
        assert_eq!(Color::rgb8(255, 0, 51), Color::Rgb(1.0, 0.0, 0.2));
    }

    #[test]
    fn test_flip() {
        let ctx = EmitContext { page_height: 800.0 };
        assert_eq!(ctx.flip(100.0), 700.0);
        assert_eq!(ctx.flip(0.0), 800.0);
    }
}
