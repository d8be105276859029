//! Font and image inventory.

use super::RawDocument;
use crate::object::{Dictionary, Object, extract_filter_names};
use std::collections::{BTreeMap, HashSet};

/// Font program keys in a font descriptor, in lookup order.
const FONT_FILE_KEYS: [&str; 3] = ["FontFile", "FontFile2", "FontFile3"];

/// A font used by at least one page.
#[derive(Debug, Clone, PartialEq)]
pub struct FontInfo {
    /// Object number of the font dictionary
    pub object: u32,
    /// `/BaseFont`, without a subset prefix
    pub base_font: String,
    /// `/Subtype` (`Type1`, `TrueType`, `Type0`, ...)
    pub subtype: String,
    /// `/Encoding` when it is a name
    pub encoding: Option<String>,
    /// Descriptor key holding the embedded program, e.g. `FontFile2`
    pub font_file: Option<String>,
    /// Decoded font program, when requested and embedded
    pub data: Option<Vec<u8>>,
    /// Pages using the font, ascending
    pub pages: Vec<usize>,
}

impl FontInfo {
    /// Whether the font program is embedded.
    pub fn is_embedded(&self) -> bool {
        self.font_file.is_some()
    }
}

/// An image XObject used by at least one page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    /// Object number of the image stream
    pub object: u32,
    /// Width in samples
    pub width: i64,
    /// Height in samples
    pub height: i64,
    /// Bits per component; absent for masks and JPX
    pub bits_per_component: Option<i64>,
    /// Color space name, or the family of an array color space
    pub color_space: Option<String>,
    /// Filters in application order
    pub filters: Vec<String>,
    /// Whether a soft mask is attached
    pub has_soft_mask: bool,
    /// Stream bytes as stored (still filtered), when requested
    pub data: Option<Vec<u8>>,
    /// Pages drawing the image, ascending
    pub pages: Vec<usize>,
}

/// Resource dictionaries reachable from one page, forms included.
fn resource_scopes(doc: &RawDocument, resources: &Dictionary) -> Vec<Dictionary> {
    let mut scopes = vec![resources.clone()];
    let mut seen = HashSet::new();
    let mut i = 0;
    while i < scopes.len() {
        let xobjects = doc.resource_entries(&scopes[i], "XObject");
        for value in xobjects.values() {
            let Some(r) = value.as_reference() else {
                continue;
            };
            let form = doc.resolve(value);
            if form.get("Subtype").and_then(Object::as_name) != Some("Form") || !seen.insert(r.id) {
                continue;
            }
            if let Some(res) = form.get("Resources").map(|res| doc.resolve(res)).and_then(Object::as_dict) {
                scopes.push(res.clone());
            }
        }
        i += 1;
    }
    scopes
}

fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

impl RawDocument {
    /// Fonts referenced from page resources, by object number. Inline font
    /// dictionaries are not listed.
    pub fn fonts(&self, with_data: bool) -> Vec<FontInfo> {
        let mut found: BTreeMap<u32, FontInfo> = BTreeMap::new();
        for (index, page) in self.pages().iter().enumerate() {
            for scope in resource_scopes(self, &page.resources) {
                for value in self.resource_entries(&scope, "Font").values() {
                    let Some(r) = value.as_reference() else {
                        log::debug!("skipping inline font on page {}", index);
                        continue;
                    };
                    if let Some(info) = found.get_mut(&r.id) {
                        if info.pages.last() != Some(&index) {
                            info.pages.push(index);
                        }
                        continue;
                    }
                    if let Some(font) = self.resolve(value).as_dict() {
                        found.insert(r.id, self.font_info(r.id, font, index, with_data));
                    }
                }
            }
        }
        found.into_values().collect()
    }

    fn font_info(&self, object: u32, font: &Dictionary, page: usize, with_data: bool) -> FontInfo {
        let name = |dict: &Dictionary, key: &str| dict.get(key).and_then(|v| self.resolve(v).as_name()).map(str::to_string);

        // composite fonts keep the descriptor on the descendant
        let descendant = font
            .get("DescendantFonts")
            .and_then(|d| self.resolve(d).as_array())
            .and_then(|fonts| fonts.first())
            .and_then(|d| self.resolve(d).as_dict());
        let descriptor = descendant
            .unwrap_or(font)
            .get("FontDescriptor")
            .and_then(|d| self.resolve(d).as_dict());

        let program = descriptor.and_then(|desc| {
            FONT_FILE_KEYS
                .iter()
                .find_map(|key| desc.get(*key).and_then(Object::as_reference).map(|r| (*key, r)))
        });
        let data = match program {
            Some((key, r)) if with_data => match self.stream_data(r.id) {
                Ok(data) => Some(data),
                Err(err) => {
                    log::warn!("unreadable {} {} of font {}: {}", key, r.id, object, err);
                    None
                },
            },
            _ => None,
        };

        FontInfo {
            object,
            base_font: name(font, "BaseFont").map(|n| strip_subset_prefix(&n).to_string()).unwrap_or_default(),
            subtype: name(font, "Subtype").unwrap_or_default(),
            encoding: name(font, "Encoding"),
            font_file: program.map(|(key, _)| key.to_string()),
            data,
            pages: vec![page],
        }
    }

    /// Image XObjects referenced from page resources, by object number.
    pub fn images(&self, with_data: bool) -> Vec<ImageInfo> {
        let mut found: BTreeMap<u32, ImageInfo> = BTreeMap::new();
        for (index, page) in self.pages().iter().enumerate() {
            for scope in resource_scopes(self, &page.resources) {
                for value in self.resource_entries(&scope, "XObject").values() {
                    let Some(r) = value.as_reference() else {
                        continue;
                    };
                    if let Some(info) = found.get_mut(&r.id) {
                        if info.pages.last() != Some(&index) {
                            info.pages.push(index);
                        }
                        continue;
                    }
                    let image = self.resolve(value);
                    if image.get("Subtype").and_then(Object::as_name) != Some("Image") {
                        continue;
                    }
                    found.insert(r.id, self.image_info(r.id, image, index, with_data));
                }
            }
        }
        found.into_values().collect()
    }

    fn image_info(&self, object: u32, image: &Object, page: usize, with_data: bool) -> ImageInfo {
        let int = |key: &str| image.get(key).and_then(|v| self.resolve(v).as_integer());
        let color_space = image.get("ColorSpace").map(|cs| self.resolve(cs)).and_then(|cs| match cs {
            Object::Name(name) => Some(name.clone()),
            Object::Array(items) => items.first().and_then(Object::as_name).map(str::to_string),
            _ => None,
        });
        ImageInfo {
            object,
            width: int("Width").unwrap_or(0),
            height: int("Height").unwrap_or(0),
            bits_per_component: int("BitsPerComponent"),
            color_space,
            filters: image.get("Filter").map(extract_filter_names).unwrap_or_default(),
            has_soft_mask: image.get("SMask").is_some(),
            data: match image {
                Object::Stream { data, .. } if with_data => Some(data.to_vec()),
                _ => None,
            },
            pages: vec![page],
        }
    }
}
