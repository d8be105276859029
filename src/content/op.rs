//! Low-level content stream operators.
//!
//! Cache entries expand into sequences of [`Op`] values; [`write_op`] turns
//! one operator into its textual form.

use super::Color;
use crate::serializer::{format_real, write_hex_string};
use std::io::Write;

/// A single content stream operator with its operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Concatenate matrix (cm)
    Transform([f64; 6]),
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Set font and size (Tf)
    SetFont(String, f64),
    /// Move text position (Td)
    MoveText(f64, f64),
    /// Show a literal string (Tj)
    ShowText(Vec<u8>),
    /// Show a hex string (Tj), used for two-byte glyph ids
    ShowHexText(Vec<u8>),
    /// Character spacing (Tc)
    SetCharSpacing(f64),
    /// Fill color in any supported space
    FillColor(Color),
    /// Stroke color in any supported space
    StrokeColor(Color),
    /// Line width (w)
    SetLineWidth(f64),
    /// Dash pattern (d)
    SetDash(Vec<f64>, f64),
    /// Begin subpath (m)
    MoveTo(f64, f64),
    /// Straight segment (l)
    LineTo(f64, f64),
    /// Cubic Bézier segment (c)
    CurveTo(f64, f64, f64, f64, f64, f64),
    /// Rectangle path (re)
    Rectangle(f64, f64, f64, f64),
    /// Close subpath (h)
    ClosePath,
    /// Stroke (S)
    Stroke,
    /// Fill, nonzero winding (f)
    Fill,
    /// Fill then stroke (B)
    FillStroke,
    /// End path without painting (n)
    EndPath,
    /// Intersect clip with current path (W)
    Clip,
    /// Paint an XObject (Do)
    PaintXObject(String),
    /// Apply an ExtGState resource (gs)
    SetExtGState(String),
}

/// Write one operator followed by a newline.
pub fn write_op<W: Write + ?Sized>(w: &mut W, op: &Op) -> std::io::Result<()> {
    let n = format_real;
    match op {
        Op::SaveState => w.write_all(b"q")?,
        Op::RestoreState => w.write_all(b"Q")?,
        Op::Transform([a, b, c, d, e, f]) => write!(
            w,
            "{} {} {} {} {} {} cm",
            n(*a),
            n(*b),
            n(*c),
            n(*d),
            n(*e),
            n(*f)
        )?,
        Op::BeginText => w.write_all(b"BT")?,
        Op::EndText => w.write_all(b"ET")?,
        Op::SetFont(name, size) => write!(w, "/{} {} Tf", name, n(*size))?,
        Op::MoveText(x, y) => write!(w, "{} {} Td", n(*x), n(*y))?,
        Op::ShowText(bytes) => {
            w.write_all(b"(")?;
            write_escaped(w, bytes)?;
            w.write_all(b") Tj")?;
        },
        Op::ShowHexText(bytes) => {
            write_hex_string(w, bytes)?;
            w.write_all(b" Tj")?;
        },
        Op::SetCharSpacing(spacing) => write!(w, "{} Tc", n(*spacing))?,
        Op::FillColor(color) => write_color(w, color, false)?,
        Op::StrokeColor(color) => write_color(w, color, true)?,
        Op::SetLineWidth(width) => write!(w, "{} w", n(*width))?,
        Op::SetDash(pattern, phase) => {
            let parts: Vec<String> = pattern.iter().map(|v| n(*v)).collect();
            write!(w, "[{}] {} d", parts.join(" "), n(*phase))?
        },
        Op::MoveTo(x, y) => write!(w, "{} {} m", n(*x), n(*y))?,
        Op::LineTo(x, y) => write!(w, "{} {} l", n(*x), n(*y))?,
        Op::CurveTo(x1, y1, x2, y2, x3, y3) => write!(
            w,
            "{} {} {} {} {} {} c",
            n(*x1),
            n(*y1),
            n(*x2),
            n(*y2),
            n(*x3),
            n(*y3)
        )?,
        Op::Rectangle(x, y, width, height) => {
            write!(w, "{} {} {} {} re", n(*x), n(*y), n(*width), n(*height))?
        },
        Op::ClosePath => w.write_all(b"h")?,
        Op::Stroke => w.write_all(b"S")?,
        Op::Fill => w.write_all(b"f")?,
        Op::FillStroke => w.write_all(b"B")?,
        Op::EndPath => w.write_all(b"n")?,
        Op::Clip => w.write_all(b"W")?,
        Op::PaintXObject(name) => write!(w, "/{} Do", name)?,
        Op::SetExtGState(name) => write!(w, "/{} gs", name)?,
    }
    w.write_all(b"\n")
}

fn write_color<W: Write + ?Sized>(w: &mut W, color: &Color, stroke: bool) -> std::io::Result<()> {
    let n = format_real;
    match color {
        Color::Gray(g) => write!(w, "{} {}", n(*g), if stroke { "G" } else { "g" }),
        Color::Rgb(r, g, b) => {
            write!(w, "{} {} {} {}", n(*r), n(*g), n(*b), if stroke { "RG" } else { "rg" })
        },
        Color::Cmyk(c, m, y, k) => write!(
            w,
            "{} {} {} {} {}",
            n(*c),
            n(*m),
            n(*y),
            n(*k),
            if stroke { "K" } else { "k" }
        ),
        Color::Spot { resource, tint } => {
            if stroke {
                write!(w, "/{} CS {} SCN", resource, n(*tint))
            } else {
                write!(w, "/{} cs {} scn", resource, n(*tint))
            }
        },
    }
}

fn write_escaped<W: Write + ?Sized>(w: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    for &byte in bytes {
        match byte {
            b'(' => w.write_all(b"\\(")?,
            b')' => w.write_all(b"\\)")?,
            b'\\' => w.write_all(b"\\\\")?,
            b'\n' => w.write_all(b"\\n")?,
            b'\r' => w.write_all(b"\\r")?,
            _ => w.write_all(&[byte])?,
        }
    }
    Ok(())
}

/// Render a sequence of operators to bytes.
pub fn render_ops(ops: &[Op]) -> Vec<u8> {
    let mut buf = Vec::new();
    for op in ops {
        // Writing into a Vec cannot fail
        let _ = write_op(&mut buf, op);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(op: Op) -> String {
        String::from_utf8(render_ops(&[op])).unwrap()
    }

    #[test]
    fn test_text_operators() {
        assert_eq!(text(Op::SetFont("F1".into(), 12.0)), "/F1 12 Tf\n");
        assert_eq!(text(Op::MoveText(72.0, 769.5)), "72 769.5 Td\n");
        assert_eq!(text(Op::ShowText(b"a(b)".to_vec())), "(a\\(b\\)) Tj\n");
        assert_eq!(text(Op::ShowHexText(vec![0, 5])), "<0005> Tj\n");
    }

    #[test]
    fn test_color_operators() {
        assert_eq!(text(Op::FillColor(Color::Rgb(1.0, 0.0, 0.5))), "1 0 0.5 rg\n");
        assert_eq!(text(Op::StrokeColor(Color::Gray(0.25))), "0.25 G\n");
        assert_eq!(text(Op::FillColor(Color::Cmyk(0.0, 1.0, 0.0, 0.0))), "0 1 0 0 k\n");
        assert_eq!(
            text(Op::StrokeColor(Color::Spot {
                resource: "CS1".into(),
                tint: 0.5
            })),
            "/CS1 CS 0.5 SCN\n"
        );
    }

    #[test]
    fn test_path_operators() {
        assert_eq!(text(Op::Rectangle(10.0, 20.0, 30.0, 40.0)), "10 20 30 40 re\n");
        assert_eq!(text(Op::SetDash(vec![3.0, 1.5], 0.0)), "[3 1.5] 0 d\n");
        assert_eq!(text(Op::Transform([1.0, 0.0, 0.0, 1.0, 5.0, 6.0])), "1 0 0 1 5 6 cm\n");
    }
}
