//! Vector graphics, colors, images, transparency, clipping, and rotation.

use super::{Counters, Document, GStateEntry, OpenGroup, ResourceKind, SpotEntry, XObjectEntry};
use crate::content::{
    CacheEntry, ClipPath, Color, Line, PaintStyle, Placement, PlacementKind, Shape, ShapeKind,
};
use crate::error::{Error, Result};
use crate::geometry::{Point, Rect};
use crate::imaging::ImageData;
use crate::object::ObjectRef;
use crate::objects::{
    BlendMode, ExtGState, ImageColorSpace, ImageEncoding, ImageXObject, IndirectObject,
    SeparationColorSpace, SoftMask, SoftMaskKind, TransparencyGroup,
};

/// An image added with [`Document::add_image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    /// XObject resource name
    pub resource: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// A finished transparency group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupHandle {
    /// XObject resource name
    pub resource: String,
    /// Form XObject
    pub object: ObjectRef,
}

impl Document {
    fn points(&self, points: &[Point]) -> Vec<(f64, f64)> {
        points.iter().map(|p| (self.pt(p.x), self.pt(p.y))).collect()
    }

    fn draw(&mut self, name: &str, entry: CacheEntry) -> Result<()> {
        self.push_entry(entry)?;
        self.commit(name)
    }

    /// Stroke a line between two points.
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()> {
        self.target()?;
        let gstates = self.active_gstates()?;
        let line = Line {
            x1: self.pt(x1),
            y1: self.pt(y1),
            x2: self.pt(x2),
            y2: self.pt(y2),
            gstates,
        };
        self.draw("line", CacheEntry::Line(line))
    }

    fn shape(&mut self, name: &str, kind: ShapeKind, style: PaintStyle) -> Result<()> {
        self.target()?;
        let gstates = self.active_gstates()?;
        self.draw(name, CacheEntry::Shape(Shape { kind, style, gstates }))
    }

    /// Paint a rectangle.
    pub fn rect(&mut self, rect: Rect, style: PaintStyle) -> Result<()> {
        let r = self.pt_rect(rect);
        let kind = ShapeKind::Rect {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        };
        self.shape("rect", kind, style)
    }

    /// Paint a closed polygon. Needs at least two points.
    pub fn polygon(&mut self, points: &[Point], style: PaintStyle) -> Result<()> {
        if points.len() < 2 {
            return Err(Error::InvalidArgument(format!(
                "polygon needs at least 2 points, got {}",
                points.len()
            )));
        }
        let kind = ShapeKind::Polygon(self.points(points));
        self.shape("polygon", kind, style)
    }

    /// Stroke a cubic Bézier curve from `p0` to `p3`.
    pub fn curve(&mut self, p0: Point, p1: Point, p2: Point, p3: Point) -> Result<()> {
        let pts = self.points(&[p0, p1, p2, p3]);
        let kind = ShapeKind::Curve([pts[0], pts[1], pts[2], pts[3]]);
        self.shape("curve", kind, PaintStyle::Stroke)
    }

    /// Paint an ellipse around (`cx`, `cy`).
    pub fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, style: PaintStyle) -> Result<()> {
        let kind = ShapeKind::Ellipse {
            cx: self.pt(cx),
            cy: self.pt(cy),
            rx: self.pt(rx),
            ry: self.pt(ry),
        };
        self.shape("ellipse", kind, style)
    }

    /// Set the stroke width. Carries over to later pages.
    pub fn set_line_width(&mut self, width: f64) -> Result<()> {
        let width = self.pt(width);
        self.state.line_width = Some(width);
        if self.has_target() {
            self.push_entry(CacheEntry::LineWidth(width))?;
        }
        self.commit("set_line_width")
    }

    /// Set the dash pattern; an empty pattern draws solid lines.
    pub fn set_dash(&mut self, pattern: &[f64], phase: f64) -> Result<()> {
        if pattern.iter().any(|v| *v < 0.0) {
            return Err(Error::InvalidArgument("dash lengths must not be negative".into()));
        }
        let entry = CacheEntry::Dash {
            pattern: pattern.iter().map(|v| self.pt(*v)).collect(),
            phase: self.pt(phase),
        };
        self.draw("set_dash", entry)
    }

    /// Set the fill color. Carries over to later pages.
    pub fn set_fill_color(&mut self, color: Color) -> Result<()> {
        self.ensure_color(&color)?;
        self.state.fill_color = Some(color.clone());
        if self.has_target() {
            self.push_entry(CacheEntry::FillColor(color))?;
        }
        self.commit("set_fill_color")
    }

    /// Set the stroke color. Carries over to later pages.
    pub fn set_stroke_color(&mut self, color: Color) -> Result<()> {
        self.ensure_color(&color)?;
        self.state.stroke_color = Some(color.clone());
        if self.has_target() {
            self.push_entry(CacheEntry::StrokeColor(color))?;
        }
        self.commit("set_stroke_color")
    }

    /// Define a spot color with a CMYK fallback. Returns the full-tint
    /// color; change `tint` on the returned value for lighter shades.
    pub fn add_spot_color(&mut self, name: &str, cmyk: [f64; 4]) -> Result<Color> {
        let resource = match self.state.spot_colors.get(name) {
            Some(entry) => entry.resource.clone(),
            None => {
                let object = self.state.registry.allocate(IndirectObject::ColorSpace(SeparationColorSpace {
                    colorant: name.to_string(),
                    cmyk: cmyk.map(|v| v.clamp(0.0, 1.0)),
                }));
                let resource = Counters::next(&mut self.state.counters.color_space, "CS");
                self.state.spot_colors.insert(name.to_string(), SpotEntry {
                    resource: resource.clone(),
                    object,
                });
                resource
            },
        };
        let color = Color::Spot { resource, tint: 1.0 };
        self.ensure_color(&color)?;
        self.commit("add_spot_color")?;
        Ok(color)
    }

    // ---- images ----

    /// Store an image (and its alpha plane as a soft mask) for placement.
    pub fn add_image(&mut self, image: ImageData) -> Result<ImageHandle> {
        let smask = match &image.alpha {
            Some(alpha) => Some(self.state.registry.allocate(IndirectObject::Image(ImageXObject {
                width: image.width,
                height: image.height,
                color_space: ImageColorSpace::Gray,
                bits_per_component: 8,
                encoding: ImageEncoding::Raw,
                data: alpha.clone(),
                smask: None,
            }))),
            None => None,
        };
        let object = self.state.registry.allocate(IndirectObject::Image(ImageXObject {
            width: image.width,
            height: image.height,
            color_space: image.color_space,
            bits_per_component: 8,
            encoding: image.encoding,
            data: image.data,
            smask,
        }));

        let resource = Counters::next(&mut self.state.counters.image, "Im");
        self.state.images.insert(resource.clone(), XObjectEntry {
            object,
            width: image.width as f64,
            height: image.height as f64,
        });
        log::debug!("added {}x{} image as {}", image.width, image.height, resource);
        self.commit("add_image")?;
        Ok(ImageHandle {
            resource,
            width: image.width,
            height: image.height,
        })
    }

    /// Draw an image into `rect`. A zero width or height is derived from
    /// the other side and the image's aspect ratio.
    pub fn image(&mut self, handle: &ImageHandle, rect: Rect) -> Result<()> {
        let entry = self
            .state
            .images
            .get(&handle.resource)
            .copied()
            .ok_or_else(|| Error::Image(format!("unknown image {}", handle.resource)))?;
        let mut r = self.pt_rect(rect);
        let ratio = entry.width / entry.height.max(1.0);
        match (r.width > 0.0, r.height > 0.0) {
            (true, true) => {},
            (true, false) => r.height = r.width / ratio,
            (false, true) => r.width = r.height * ratio,
            (false, false) => {
                return Err(Error::InvalidArgument("image needs a width or a height".into()));
            },
        }

        self.ensure_resource(ResourceKind::XObject, &handle.resource, entry.object)?;
        let gstates = self.active_gstates()?;
        self.draw(
            "image",
            CacheEntry::Place(Placement {
                name: handle.resource.clone(),
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
                kind: PlacementKind::Image,
                gstates,
            }),
        )
    }

    // ---- transparency ----

    fn allocate_gstate(&mut self, state: ExtGState) -> GStateEntry {
        let (alpha, blend, soft_mask) = (state.fill_alpha, state.blend_mode, state.soft_mask);
        let entry = GStateEntry {
            resource: Counters::next(&mut self.state.counters.gstate, "GS"),
            object: self.state.registry.allocate(IndirectObject::ExtGState(state)),
            alpha,
            blend,
            soft_mask,
        };
        self.state.gstates.push(entry.clone());
        entry
    }

    /// Draw later operations with the given opacity and blend mode until
    /// [`clear_transparency`](Self::clear_transparency). Identical settings
    /// share one graphics state object.
    pub fn set_transparency(&mut self, alpha: f64, blend: Option<BlendMode>) -> Result<()> {
        let wanted = ExtGState::alpha(alpha, blend);
        let existing = self
            .state
            .gstates
            .iter()
            .find(|g| g.alpha == wanted.fill_alpha && g.blend == blend && g.soft_mask.is_none())
            .cloned();
        let entry = match existing {
            Some(entry) => entry,
            None => self.allocate_gstate(wanted),
        };
        self.state.active_gstates.retain(|name| name != &entry.resource);
        self.state.active_gstates.push(entry.resource);
        if self.has_target() {
            self.active_gstates()?;
        }
        self.commit("set_transparency")
    }

    /// Stop applying graphics states to later operations.
    pub fn clear_transparency(&mut self) -> Result<()> {
        self.state.active_gstates.clear();
        self.commit("clear_transparency")
    }

    /// Redirect drawing calls into a new transparency group of the given
    /// size until [`end_group`](Self::end_group).
    pub fn begin_group(&mut self, width: f64, height: f64) -> Result<()> {
        if self.state.open_group.is_some() {
            return Err(Error::InvalidArgument("a group is already open".into()));
        }
        let (width, height) = (self.pt(width), self.pt(height));
        let object = self
            .state
            .registry
            .allocate(IndirectObject::Group(TransparencyGroup::new(width, height)));
        self.state.open_group = Some(OpenGroup { object, height });
        self.commit("begin_group")
    }

    /// Finish the open group and return a handle for placing it.
    pub fn end_group(&mut self) -> Result<GroupHandle> {
        let group = self
            .state
            .open_group
            .take()
            .ok_or_else(|| Error::InvalidArgument("no group is open".into()))?;
        let (width, height) = match self.state.registry.get(group.object) {
            Some(IndirectObject::Group(g)) => (g.width, g.height),
            _ => return Err(Error::ObjectNotFound(group.object.id)),
        };
        let resource = Counters::next(&mut self.state.counters.form, "Fm");
        self.state.groups.insert(resource.clone(), XObjectEntry {
            object: group.object,
            width,
            height,
        });
        self.commit("end_group")?;
        Ok(GroupHandle {
            resource,
            object: group.object,
        })
    }

    /// Draw a finished group with its top-left corner at (`x`, `y`).
    pub fn place_group(&mut self, handle: &GroupHandle, x: f64, y: f64) -> Result<()> {
        let entry = self
            .state
            .groups
            .get(&handle.resource)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("unknown group {}", handle.resource)))?;
        self.ensure_resource(ResourceKind::XObject, &handle.resource, entry.object)?;
        let gstates = self.active_gstates()?;
        self.draw(
            "place_group",
            CacheEntry::Place(Placement {
                name: handle.resource.clone(),
                x: self.pt(x),
                y: self.pt(y),
                width: entry.width,
                height: entry.height,
                kind: PlacementKind::Form,
                gstates,
            }),
        )
    }

    /// Mask later operations with a finished group, until
    /// [`clear_transparency`](Self::clear_transparency).
    pub fn set_soft_mask(&mut self, handle: &GroupHandle, kind: SoftMaskKind) -> Result<()> {
        if !self.state.groups.contains_key(&handle.resource) {
            return Err(Error::InvalidArgument(format!("unknown group {}", handle.resource)));
        }
        let mask = self.state.registry.allocate(IndirectObject::SoftMask(SoftMask {
            group: handle.object,
            kind,
        }));
        let entry = self.allocate_gstate(ExtGState {
            fill_alpha: None,
            stroke_alpha: None,
            blend_mode: None,
            soft_mask: Some(mask),
        });
        self.state.active_gstates.push(entry.resource);
        if self.has_target() {
            self.active_gstates()?;
        }
        self.commit("set_soft_mask")
    }

    // ---- state, clipping, rotation ----

    /// Push the graphics state.
    pub fn save_state(&mut self) -> Result<()> {
        self.draw("save_state", CacheEntry::SaveState)
    }

    /// Pop the graphics state.
    pub fn restore_state(&mut self) -> Result<()> {
        self.draw("restore_state", CacheEntry::RestoreState)
    }

    /// Clip later drawing to `rect` until [`clip_reset`](Self::clip_reset).
    pub fn clip_rect(&mut self, rect: Rect) -> Result<()> {
        let r = self.pt_rect(rect);
        self.push_entry(CacheEntry::Clip(ClipPath::Rect {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }))?;
        self.state.open_saves += 1;
        self.commit("clip_rect")
    }

    /// Clip later drawing to a polygon until [`clip_reset`](Self::clip_reset).
    pub fn clip_polygon(&mut self, points: &[Point]) -> Result<()> {
        if points.len() < 3 {
            return Err(Error::InvalidArgument(format!(
                "clip polygon needs at least 3 points, got {}",
                points.len()
            )));
        }
        let path = ClipPath::Polygon(self.points(points));
        self.push_entry(CacheEntry::Clip(path))?;
        self.state.open_saves += 1;
        self.commit("clip_polygon")
    }

    /// Remove the most recent clip.
    pub fn clip_reset(&mut self) -> Result<()> {
        self.pop_save("clip_reset", CacheEntry::RestoreState)
    }

    /// Rotate later drawing counterclockwise by `angle` degrees around
    /// (`x`, `y`) until [`rotate_reset`](Self::rotate_reset).
    pub fn rotate(&mut self, angle: f64, x: f64, y: f64) -> Result<()> {
        let entry = CacheEntry::Rotate {
            angle,
            x: self.pt(x),
            y: self.pt(y),
        };
        self.push_entry(entry)?;
        self.state.open_saves += 1;
        self.commit("rotate")
    }

    /// Undo the most recent rotation.
    pub fn rotate_reset(&mut self) -> Result<()> {
        self.pop_save("rotate_reset", CacheEntry::RotateReset)
    }

    fn pop_save(&mut self, name: &str, entry: CacheEntry) -> Result<()> {
        self.target()?;
        if self.state.open_saves == 0 {
            log::debug!("{} with nothing to reset", name);
            return Ok(());
        }
        self.push_entry(entry)?;
        self.state.open_saves -= 1;
        self.commit(name)
    }
}
