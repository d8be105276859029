//! Operator cache entries.
//!
//! Each entry knows how to emit itself. Everything an entry needs (font
//! metrics, measured widths, resource names) is captured when it is appended,
//! so emission can only fail on the sink.

use super::metrics::{EncodedText, FontMetrics};
use super::op::{Op, write_op};
use super::{Color, EmitContext};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Tolerance for position comparisons when merging runs.
const POSITION_EPSILON: f64 = 0.01;

/// Strikethrough height as a fraction of the cap height.
const STRIKE_RATIO: f64 = 0.4;

/// Bézier control distance for a quarter circle.
const KAPPA: f64 = 0.552_284_749_8;

/// Horizontal alignment inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Align {
    /// Flush with the left edge
    #[default]
    Left,
    /// Centred
    Center,
    /// Flush with the right edge
    Right,
}

/// Vertical alignment inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VAlign {
    /// Ascent touches the top edge
    #[default]
    Top,
    /// Glyph box centred
    Middle,
    /// Descent touches the bottom edge
    Bottom,
}

bitflags::bitflags! {
    /// Cell border segments.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Border: u8 {
        /// Top edge
        const TOP = 1;
        /// Left edge
        const LEFT = 1 << 1;
        /// Right edge
        const RIGHT = 1 << 2;
        /// Bottom edge
        const BOTTOM = 1 << 3;
        /// All four edges
        const ALL = Self::TOP.bits() | Self::LEFT.bits() | Self::RIGHT.bits() | Self::BOTTOM.bits();
    }
}

bitflags::bitflags! {
    /// Text decorations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Decoration: u8 {
        /// Line under the baseline
        const UNDERLINE = 1;
        /// Line through the glyphs
        const STRIKE = 1 << 1;
    }
}

/// A box that text is aligned within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Cell width in points
    pub width: f64,
    /// Cell height in points
    pub height: f64,
    /// Horizontal alignment
    pub align: Align,
    /// Vertical alignment
    pub valign: VAlign,
    /// Border segments to draw
    pub border: Border,
}

/// One run of text in a single font, size, and color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Font resource name (e.g. `F1`)
    pub font: String,
    /// Font size in points
    pub size: f64,
    /// Source text
    pub text: String,
    /// Text encoded for the font
    pub encoded: EncodedText,
    /// Left edge (cell left when a cell is set)
    pub x: f64,
    /// Baseline, or cell top when a cell is set
    pub y: f64,
    /// Measured advance width in points
    pub width: f64,
    /// Font metrics captured at append time
    pub metrics: FontMetrics,
    /// Text fill color, when one was set
    pub color: Option<Color>,
    /// Extra spacing between characters
    pub char_spacing: f64,
    /// Alignment box
    pub cell: Option<Cell>,
    /// Underline and strikethrough
    pub decoration: Decoration,
    /// ExtGState resources active when the run was appended
    pub gstates: Vec<String>,
}

impl TextRun {
    /// Baseline origin in caller space after alignment.
    pub fn origin(&self) -> (f64, f64) {
        let Some(cell) = &self.cell else {
            return (self.x, self.y);
        };
        let ascent = FontMetrics::scale(self.metrics.ascent, self.size);
        let descent = FontMetrics::scale(self.metrics.descent, self.size);

        let x = match cell.align {
            Align::Left => self.x,
            Align::Center => self.x + (cell.width - self.width) / 2.0,
            Align::Right => self.x + cell.width - self.width,
        };
        let y = match cell.valign {
            VAlign::Top => self.y + ascent,
            VAlign::Middle => self.y + cell.height / 2.0 + (ascent + descent) / 2.0,
            VAlign::Bottom => self.y + cell.height + descent,
        };
        (x, y)
    }

    /// Whether `next` continues this run without changing the output.
    pub fn can_merge(&self, next: &TextRun) -> bool {
        self.cell.is_none()
            && next.cell.is_none()
            && self.font == next.font
            && self.size == next.size
            && self.color == next.color
            && self.char_spacing == next.char_spacing
            && self.decoration == next.decoration
            && self.gstates == next.gstates
            && self.encoded.hex == next.encoded.hex
            && (self.y - next.y).abs() < POSITION_EPSILON
            && (self.x + self.width - next.x).abs() < POSITION_EPSILON
    }

    /// Append `next` to this run.
    pub fn merge(&mut self, next: TextRun) {
        self.text.push_str(&next.text);
        self.encoded.bytes.extend(next.encoded.bytes);
        self.width += next.width;
    }

    fn emit(&self, w: &mut dyn Write, ctx: &EmitContext) -> Result<()> {
        let (x, baseline) = self.origin();
        let y = ctx.flip(baseline);

        // color and spacing must not leak into later entries
        let scoped = self.color.is_some() || self.char_spacing != 0.0;
        begin_scope(w, &self.gstates, scoped)?;
        put(w, Op::BeginText)?;
        put(w, Op::SetFont(self.font.clone(), self.size))?;
        if let Some(color) = &self.color {
            put(w, Op::FillColor(color.clone()))?;
        }
        if self.char_spacing != 0.0 {
            put(w, Op::SetCharSpacing(self.char_spacing))?;
        }
        put(w, Op::MoveText(x, y))?;
        if self.encoded.hex {
            put(w, Op::ShowHexText(self.encoded.bytes.clone()))?;
        } else {
            put(w, Op::ShowText(self.encoded.bytes.clone()))?;
        }
        put(w, Op::EndText)?;

        if self.decoration.contains(Decoration::UNDERLINE) {
            self.emit_underline(w, x, y)?;
        }
        if self.decoration.contains(Decoration::STRIKE) {
            self.emit_strike(w, x, y)?;
        }
        if let Some(cell) = &self.cell {
            self.emit_borders(w, ctx, cell)?;
        }
        end_scope(w, &self.gstates, scoped)
    }

    fn thickness(&self) -> f64 {
        FontMetrics::scale(self.metrics.underline_thickness, self.size)
    }

    fn emit_underline(&self, w: &mut dyn Write, x: f64, baseline: f64) -> Result<()> {
        let t = self.thickness();
        let centre = baseline + FontMetrics::scale(self.metrics.underline_position, self.size);
        put(w, Op::Rectangle(x, centre - t / 2.0, self.width, t))?;
        put(w, Op::Fill)
    }

    fn emit_strike(&self, w: &mut dyn Write, x: f64, baseline: f64) -> Result<()> {
        let t = self.thickness();
        let centre = baseline + FontMetrics::scale(self.metrics.cap_height, self.size) * STRIKE_RATIO;
        put(w, Op::Rectangle(x, centre - t / 2.0, self.width, t))?;
        put(w, Op::Fill)
    }

    fn emit_borders(&self, w: &mut dyn Write, ctx: &EmitContext, cell: &Cell) -> Result<()> {
        let left = self.x;
        let right = self.x + cell.width;
        let top = ctx.flip(self.y);
        let bottom = ctx.flip(self.y + cell.height);

        if cell.border.contains(Border::TOP) {
            segment(w, (left, top), (right, top))?;
        }
        if cell.border.contains(Border::LEFT) {
            segment(w, (left, top), (left, bottom))?;
        }
        if cell.border.contains(Border::RIGHT) {
            segment(w, (right, top), (right, bottom))?;
        }
        if cell.border.contains(Border::BOTTOM) {
            segment(w, (left, bottom), (right, bottom))?;
        }
        Ok(())
    }
}

/// A straight stroked line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Start X
    pub x1: f64,
    /// Start Y
    pub y1: f64,
    /// End X
    pub x2: f64,
    /// End Y
    pub y2: f64,
    /// Active ExtGState resources
    pub gstates: Vec<String>,
}

/// How a closed shape is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaintStyle {
    /// Outline only
    #[default]
    Stroke,
    /// Interior only
    Fill,
    /// Interior then outline
    FillStroke,
}

impl PaintStyle {
    fn op(self) -> Op {
        match self {
            PaintStyle::Stroke => Op::Stroke,
            PaintStyle::Fill => Op::Fill,
            PaintStyle::FillStroke => Op::FillStroke,
        }
    }
}

/// Geometry of a painted shape, in caller space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Rectangle from its top-left corner
    Rect {
        /// Left
        x: f64,
        /// Top
        y: f64,
        /// Width
        width: f64,
        /// Height
        height: f64,
    },
    /// Closed polygon
    Polygon(Vec<(f64, f64)>),
    /// Cubic Bézier from the first point through two control points
    Curve([(f64, f64); 4]),
    /// Ellipse around a centre
    Ellipse {
        /// Centre X
        cx: f64,
        /// Centre Y
        cy: f64,
        /// Horizontal radius
        rx: f64,
        /// Vertical radius
        ry: f64,
    },
}

/// A painted shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Geometry
    pub kind: ShapeKind,
    /// Paint operator
    pub style: PaintStyle,
    /// Active ExtGState resources
    pub gstates: Vec<String>,
}

impl Shape {
    fn emit(&self, w: &mut dyn Write, ctx: &EmitContext) -> Result<()> {
        begin_gstates(w, &self.gstates)?;
        match &self.kind {
            ShapeKind::Rect {
                x,
                y,
                width,
                height,
            } => put(w, Op::Rectangle(*x, ctx.flip(y + height), *width, *height))?,
            ShapeKind::Polygon(points) => polygon_path(w, ctx, points)?,
            ShapeKind::Curve([p0, p1, p2, p3]) => {
                put(w, Op::MoveTo(p0.0, ctx.flip(p0.1)))?;
                put(
                    w,
                    Op::CurveTo(p1.0, ctx.flip(p1.1), p2.0, ctx.flip(p2.1), p3.0, ctx.flip(p3.1)),
                )?;
            },
            ShapeKind::Ellipse { cx, cy, rx, ry } => ellipse_path(w, *cx, ctx.flip(*cy), *rx, *ry)?,
        }
        // Open curves are never filled
        let style = match self.kind {
            ShapeKind::Curve(_) => PaintStyle::Stroke,
            _ => self.style,
        };
        put(w, style.op())?;
        end_gstates(w, &self.gstates)
    }
}

/// What a placement paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementKind {
    /// Image XObject scaled to the target box
    Image,
    /// Form XObject (transparency group) drawn at its own size
    Form,
}

/// An XObject drawn with `cm` + `Do`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// XObject resource name
    pub name: String,
    /// Left
    pub x: f64,
    /// Top
    pub y: f64,
    /// Width in points
    pub width: f64,
    /// Height in points
    pub height: f64,
    /// Image or form
    pub kind: PlacementKind,
    /// Active ExtGState resources
    pub gstates: Vec<String>,
}

impl Placement {
    fn emit(&self, w: &mut dyn Write, ctx: &EmitContext) -> Result<()> {
        let (a, d) = match self.kind {
            PlacementKind::Image => (self.width, self.height),
            PlacementKind::Form => (1.0, 1.0),
        };
        put(w, Op::SaveState)?;
        for gs in &self.gstates {
            put(w, Op::SetExtGState(gs.clone()))?;
        }
        put(w, Op::Transform([a, 0.0, 0.0, d, self.x, ctx.flip(self.y + self.height)]))?;
        put(w, Op::PaintXObject(self.name.clone()))?;
        put(w, Op::RestoreState)
    }
}

/// A clipping region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClipPath {
    /// Rectangle from its top-left corner
    Rect {
        /// Left
        x: f64,
        /// Top
        y: f64,
        /// Width
        width: f64,
        /// Height
        height: f64,
    },
    /// Closed polygon
    Polygon(Vec<(f64, f64)>),
}

/// One record in the operator cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheEntry {
    /// Text run
    Text(TextRun),
    /// Stroked line
    Line(Line),
    /// Rectangle, polygon, curve, or ellipse
    Shape(Shape),
    /// Image or transparency group placement
    Place(Placement),
    /// Save graphics state
    SaveState,
    /// Restore graphics state
    RestoreState,
    /// Set the fill color
    FillColor(Color),
    /// Set the stroke color
    StrokeColor(Color),
    /// Set the line width
    LineWidth(f64),
    /// Set the dash pattern; empty pattern means solid
    Dash {
        /// On/off lengths
        pattern: Vec<f64>,
        /// Offset into the pattern
        phase: f64,
    },
    /// Save state and intersect the clip region
    Clip(ClipPath),
    /// Save state and rotate about a point (degrees, counterclockwise)
    Rotate {
        /// Angle in degrees
        angle: f64,
        /// Pivot X
        x: f64,
        /// Pivot Y
        y: f64,
    },
    /// Undo the last rotation
    RotateReset,
}

impl CacheEntry {
    /// Write this entry's operators.
    pub fn emit(&self, w: &mut dyn Write, ctx: &EmitContext) -> Result<()> {
        match self {
            CacheEntry::Text(run) => run.emit(w, ctx),
            CacheEntry::Line(line) => {
                begin_gstates(w, &line.gstates)?;
                segment(w, (line.x1, ctx.flip(line.y1)), (line.x2, ctx.flip(line.y2)))?;
                end_gstates(w, &line.gstates)
            },
            CacheEntry::Shape(shape) => shape.emit(w, ctx),
            CacheEntry::Place(placement) => placement.emit(w, ctx),
            CacheEntry::SaveState => put(w, Op::SaveState),
            CacheEntry::RestoreState | CacheEntry::RotateReset => put(w, Op::RestoreState),
            CacheEntry::FillColor(color) => put(w, Op::FillColor(color.clone())),
            CacheEntry::StrokeColor(color) => put(w, Op::StrokeColor(color.clone())),
            CacheEntry::LineWidth(width) => put(w, Op::SetLineWidth(*width)),
            CacheEntry::Dash { pattern, phase } => put(w, Op::SetDash(pattern.clone(), *phase)),
            CacheEntry::Clip(path) => {
                put(w, Op::SaveState)?;
                match path {
                    ClipPath::Rect {
                        x,
                        y,
                        width,
                        height,
                    } => put(w, Op::Rectangle(*x, ctx.flip(y + height), *width, *height))?,
                    ClipPath::Polygon(points) => polygon_path(w, ctx, points)?,
                }
                put(w, Op::Clip)?;
                put(w, Op::EndPath)
            },
            CacheEntry::Rotate { angle, x, y } => {
                let (sin, cos) = angle.to_radians().sin_cos();
                let (px, py) = (*x, ctx.flip(*y));
                put(w, Op::SaveState)?;
                put(
                    w,
                    Op::Transform([
                        cos,
                        sin,
                        -sin,
                        cos,
                        px - cos * px + sin * py,
                        py - sin * px - cos * py,
                    ]),
                )
            },
        }
    }
}

fn put(w: &mut dyn Write, op: Op) -> Result<()> {
    write_op(w, &op)?;
    Ok(())
}

fn begin_gstates(w: &mut dyn Write, gstates: &[String]) -> Result<()> {
    begin_scope(w, gstates, false)
}

fn end_gstates(w: &mut dyn Write, gstates: &[String]) -> Result<()> {
    end_scope(w, gstates, false)
}

/// Open a `q` scope when gstates are active or `force` is set.
fn begin_scope(w: &mut dyn Write, gstates: &[String], force: bool) -> Result<()> {
    if gstates.is_empty() && !force {
        return Ok(());
    }
    put(w, Op::SaveState)?;
    for gs in gstates {
        put(w, Op::SetExtGState(gs.clone()))?;
    }
    Ok(())
}

fn end_scope(w: &mut dyn Write, gstates: &[String], force: bool) -> Result<()> {
    if gstates.is_empty() && !force {
        return Ok(());
    }
    put(w, Op::RestoreState)
}

/// A stroked segment between two content-space points.
fn segment(w: &mut dyn Write, from: (f64, f64), to: (f64, f64)) -> Result<()> {
    put(w, Op::MoveTo(from.0, from.1))?;
    put(w, Op::LineTo(to.0, to.1))?;
    put(w, Op::Stroke)
}

fn polygon_path(w: &mut dyn Write, ctx: &EmitContext, points: &[(f64, f64)]) -> Result<()> {
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        put(w, Op::MoveTo(first.0, ctx.flip(first.1)))?;
        for point in iter {
            put(w, Op::LineTo(point.0, ctx.flip(point.1)))?;
        }
        put(w, Op::ClosePath)?;
    }
    Ok(())
}

/// Ellipse as four Bézier arcs, in content space.
fn ellipse_path(w: &mut dyn Write, cx: f64, cy: f64, rx: f64, ry: f64) -> Result<()> {
    let (ox, oy) = (rx * KAPPA, ry * KAPPA);
    put(w, Op::MoveTo(cx + rx, cy))?;
    put(w, Op::CurveTo(cx + rx, cy + oy, cx + ox, cy + ry, cx, cy + ry))?;
    put(w, Op::CurveTo(cx - ox, cy + ry, cx - rx, cy + oy, cx - rx, cy))?;
    put(w, Op::CurveTo(cx - rx, cy - oy, cx - ox, cy - ry, cx, cy - ry))?;
    put(w, Op::CurveTo(cx + ox, cy - ry, cx + rx, cy - oy, cx + rx, cy))?;
    put(w, Op::ClosePath)
}
