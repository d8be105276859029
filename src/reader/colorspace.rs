//! Device color conversion in page content.
//!
//! Rewrites `g`/`G`, `rg`/`RG`, and `k`/`K` to one target family:
//!
//! - gray from RGB uses luminance weights `0.299 r + 0.587 g + 0.114 b`
//! - CMYK from RGB uses `k = 1 - max(r, g, b)`, `c = (1 - r - k) / (1 - k)`
//! - RGB from CMYK uses `r = (1 - c)(1 - k)`
//!
//! Other color operators (`sc`, `scn`, pattern and separation colors) are
//! left alone.

use super::RawDocument;
use super::content::{ContentOp, parse, serialize};
use crate::error::Result;
use crate::object::Object;

/// Device color family to convert to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTarget {
    /// DeviceGray
    Gray,
    /// DeviceRGB
    Rgb,
    /// DeviceCMYK
    Cmyk,
}

impl ColorTarget {
    fn operator(self, stroke: bool) -> &'static str {
        match (self, stroke) {
            (ColorTarget::Gray, false) => "g",
            (ColorTarget::Gray, true) => "G",
            (ColorTarget::Rgb, false) => "rg",
            (ColorTarget::Rgb, true) => "RG",
            (ColorTarget::Cmyk, false) => "k",
            (ColorTarget::Cmyk, true) => "K",
        }
    }
}

fn rgb_to_gray(r: f64, g: f64, b: f64) -> f64 {
    0.299 * r + 0.587 * g + 0.114 * b
}

fn rgb_to_cmyk(r: f64, g: f64, b: f64) -> [f64; 4] {
    let k = 1.0 - r.max(g).max(b);
    if k >= 1.0 {
        return [0.0, 0.0, 0.0, 1.0];
    }
    [(1.0 - r - k) / (1.0 - k), (1.0 - g - k) / (1.0 - k), (1.0 - b - k) / (1.0 - k), k]
}

fn cmyk_to_rgb(c: f64, m: f64, y: f64, k: f64) -> [f64; 3] {
    [(1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k)]
}

/// Converted operator for a device color operator of another family.
fn convert(op: &ContentOp, target: ColorTarget) -> Option<ContentOp> {
    let (source, stroke) = match op.operator() {
        "g" => (ColorTarget::Gray, false),
        "G" => (ColorTarget::Gray, true),
        "rg" => (ColorTarget::Rgb, false),
        "RG" => (ColorTarget::Rgb, true),
        "k" => (ColorTarget::Cmyk, false),
        "K" => (ColorTarget::Cmyk, true),
        _ => return None,
    };
    if source == target {
        return None;
    }
    let n = |i: usize| op.number(i).clamp(0.0, 1.0);
    let rgb = match source {
        ColorTarget::Gray => [n(0); 3],
        ColorTarget::Rgb => [n(0), n(1), n(2)],
        ColorTarget::Cmyk => cmyk_to_rgb(n(0), n(1), n(2), n(3)),
    };
    let components: Vec<f64> = match target {
        ColorTarget::Gray => vec![rgb_to_gray(rgb[0], rgb[1], rgb[2])],
        ColorTarget::Rgb => rgb.to_vec(),
        ColorTarget::Cmyk if source == ColorTarget::Gray => vec![0.0, 0.0, 0.0, 1.0 - n(0)],
        ColorTarget::Cmyk => rgb_to_cmyk(rgb[0], rgb[1], rgb[2]).to_vec(),
    };
    let operands = components
        .into_iter()
        .map(|v| Object::Real((v * 10_000.0).round() / 10_000.0))
        .collect();
    Some(ContentOp::new(target.operator(stroke), operands))
}

/// Convert every device color operator in `ops`. Returns the number
/// rewritten.
pub(crate) fn convert_ops(ops: &mut [ContentOp], target: ColorTarget) -> usize {
    let mut count = 0;
    for op in ops.iter_mut() {
        if let Some(converted) = convert(op, target) {
            *op = converted;
            count += 1;
        }
    }
    count
}

impl RawDocument {
    /// Rewrite device colors on every page to `target`. Pages without any
    /// operator to convert are left untouched. Returns the number of
    /// operators rewritten.
    pub fn convert_colorspace(&mut self, target: ColorTarget) -> Result<usize> {
        let mut total = 0;
        for index in 0..self.page_count() {
            let mut ops = parse(&self.page_content(index)?);
            let count = convert_ops(&mut ops, target);
            if count > 0 {
                self.set_page_content(index, serialize(&ops))?;
                total += count;
            }
        }
        log::debug!("converted {} color operators to {:?}", total, target);
        Ok(total)
    }
}
