//! Images, graphics states, transparency groups, and color spaces.

use super::page::Resources;
use super::{PdfObject, number_array, stream_object, visit_opt, visit_opt_mut};
use crate::config::CompressionLevel;
use crate::content::{ContentCache, EmitContext};
use crate::error::Result;
use crate::object::{Dictionary, Object, ObjectRef, dict, name};
use serde::{Deserialize, Serialize};

/// Device color space of image samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageColorSpace {
    /// One component
    Gray,
    /// Three components
    Rgb,
    /// Four components
    Cmyk,
}

impl ImageColorSpace {
    /// Components per pixel.
    pub fn components(self) -> usize {
        match self {
            ImageColorSpace::Gray => 1,
            ImageColorSpace::Rgb => 3,
            ImageColorSpace::Cmyk => 4,
        }
    }

    /// Color space name.
    pub fn pdf_name(self) -> &'static str {
        match self {
            ImageColorSpace::Gray => "DeviceGray",
            ImageColorSpace::Rgb => "DeviceRGB",
            ImageColorSpace::Cmyk => "DeviceCMYK",
        }
    }
}

/// How image samples are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageEncoding {
    /// Raw samples, compressed at write time
    Raw,
    /// JPEG data passed through with DCTDecode
    Dct,
}

/// Image XObject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageXObject {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Sample color space
    pub color_space: ImageColorSpace,
    /// Bits per component
    pub bits_per_component: u8,
    /// Sample storage
    pub encoding: ImageEncoding,
    /// Sample bytes
    pub data: Vec<u8>,
    /// Soft-mask image carrying alpha
    pub smask: Option<ObjectRef>,
}

impl PdfObject for ImageXObject {
    fn to_object(&self, compression: CompressionLevel) -> Result<Object> {
        let mut d = dict([
            ("Type", name("XObject")),
            ("Subtype", name("Image")),
            ("Width", Object::Integer(self.width as i64)),
            ("Height", Object::Integer(self.height as i64)),
            ("ColorSpace", name(self.color_space.pdf_name())),
            ("BitsPerComponent", Object::Integer(self.bits_per_component as i64)),
        ]);
        if let Some(smask) = self.smask {
            d.insert("SMask".into(), smask.into());
        }
        match self.encoding {
            ImageEncoding::Raw => stream_object(d, &self.data, compression),
            ImageEncoding::Dct => {
                d.insert("Filter".into(), name("DCTDecode"));
                Ok(Object::Stream {
                    dict: d,
                    data: bytes::Bytes::from(self.data.clone()),
                })
            },
        }
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        visit_opt(&self.smask, f);
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        visit_opt_mut(&mut self.smask, f);
    }
}

/// Separable blend modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Normal blend (default)
    #[default]
    Normal,
    /// Multiply
    Multiply,
    /// Screen
    Screen,
    /// Overlay
    Overlay,
    /// Darken
    Darken,
    /// Lighten
    Lighten,
    /// Color dodge
    ColorDodge,
    /// Color burn
    ColorBurn,
    /// Hard light
    HardLight,
    /// Soft light
    SoftLight,
    /// Difference
    Difference,
    /// Exclusion
    Exclusion,
}

impl BlendMode {
    /// Get the name for this blend mode.
    pub fn as_pdf_name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::Darken => "Darken",
            BlendMode::Lighten => "Lighten",
            BlendMode::ColorDodge => "ColorDodge",
            BlendMode::ColorBurn => "ColorBurn",
            BlendMode::HardLight => "HardLight",
            BlendMode::SoftLight => "SoftLight",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
        }
    }
}

/// Extended graphics state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtGState {
    /// Nonstroking alpha (`/ca`)
    pub fill_alpha: Option<f64>,
    /// Stroking alpha (`/CA`)
    pub stroke_alpha: Option<f64>,
    /// Blend mode (`/BM`)
    pub blend_mode: Option<BlendMode>,
    /// Soft mask dictionary (`/SMask`)
    pub soft_mask: Option<ObjectRef>,
}

impl ExtGState {
    /// Same alpha for fill and stroke.
    pub fn alpha(alpha: f64, blend_mode: Option<BlendMode>) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        Self {
            fill_alpha: Some(alpha),
            stroke_alpha: Some(alpha),
            blend_mode,
            soft_mask: None,
        }
    }
}

impl PdfObject for ExtGState {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        let mut d = dict([("Type", name("ExtGState"))]);
        if let Some(a) = self.fill_alpha {
            d.insert("ca".into(), Object::Real(a));
        }
        if let Some(a) = self.stroke_alpha {
            d.insert("CA".into(), Object::Real(a));
        }
        if let Some(bm) = self.blend_mode {
            d.insert("BM".into(), name(bm.as_pdf_name()));
        }
        if let Some(mask) = self.soft_mask {
            d.insert("SMask".into(), mask.into());
        }
        Ok(Object::Dictionary(d))
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        visit_opt(&self.soft_mask, f);
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        visit_opt_mut(&mut self.soft_mask, f);
    }
}

/// Form XObject carrying a transparency group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransparencyGroup {
    /// Width of the form
    pub width: f64,
    /// Height of the form
    pub height: f64,
    /// Resources used by the group's content
    pub resources: Resources,
    /// Group content
    pub cache: ContentCache,
    /// Isolated group (`/I`)
    pub isolated: bool,
    /// Knockout group (`/K`)
    pub knockout: bool,
}

impl TransparencyGroup {
    /// Empty group of the given size.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            resources: Resources::default(),
            cache: ContentCache::new(),
            isolated: true,
            knockout: false,
        }
    }
}

impl PdfObject for TransparencyGroup {
    fn to_object(&self, compression: CompressionLevel) -> Result<Object> {
        let body = self.cache.to_bytes(&EmitContext {
            page_height: self.height,
        })?;
        let group = dict([
            ("S", name("Transparency")),
            ("CS", name("DeviceRGB")),
            ("I", Object::Boolean(self.isolated)),
            ("K", Object::Boolean(self.knockout)),
        ]);
        let d = dict([
            ("Type", name("XObject")),
            ("Subtype", name("Form")),
            ("BBox", number_array(&[0.0, 0.0, self.width, self.height])),
            ("Group", Object::Dictionary(group)),
            ("Resources", self.resources.to_object()),
        ]);
        stream_object(d, &body, compression)
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        self.resources.visit_refs(f);
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        self.resources.visit_refs_mut(f);
    }
}

/// Soft mask subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoftMaskKind {
    /// Mask from the group's luminosity
    Luminosity,
    /// Mask from the group's alpha
    Alpha,
}

/// Soft mask dictionary referencing a transparency group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftMask {
    /// Group supplying mask values
    pub group: ObjectRef,
    /// Subtype
    pub kind: SoftMaskKind,
}

impl PdfObject for SoftMask {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        let subtype = match self.kind {
            SoftMaskKind::Luminosity => "Luminosity",
            SoftMaskKind::Alpha => "Alpha",
        };
        Ok(Object::Dictionary(dict([
            ("Type", name("Mask")),
            ("S", name(subtype)),
            ("G", self.group.into()),
        ])))
    }

    fn visit_refs(&self, f: &mut dyn FnMut(ObjectRef)) {
        f(self.group);
    }

    fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut ObjectRef)) {
        f(&mut self.group);
    }
}

/// Separation (spot) color space with a CMYK alternate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparationColorSpace {
    /// Colorant name
    pub colorant: String,
    /// CMYK value at full tint
    pub cmyk: [f64; 4],
}

impl PdfObject for SeparationColorSpace {
    fn to_object(&self, _: CompressionLevel) -> Result<Object> {
        let tint_transform: Dictionary = dict([
            ("FunctionType", Object::Integer(2)),
            ("Domain", number_array(&[0.0, 1.0])),
            ("C0", number_array(&[0.0; 4])),
            ("C1", number_array(&self.cmyk)),
            ("N", Object::Integer(1)),
        ]);
        Ok(Object::Array(vec![
            name("Separation"),
            name(&self.colorant),
            name("DeviceCMYK"),
            Object::Dictionary(tint_transform),
        ]))
    }

    fn visit_refs(&self, _: &mut dyn FnMut(ObjectRef)) {}

    fn visit_refs_mut(&mut self, _: &mut dyn FnMut(&mut ObjectRef)) {}
}
