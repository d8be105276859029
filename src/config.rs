//! Configuration for building and reading documents.

use crate::encryption::{EncryptionAlgorithm, Permissions};
use serde::{Deserialize, Serialize};

/// Measurement unit for caller-space coordinates.
///
/// All drawing calls accept values in the configured unit; they are converted
/// to points (1/72 inch) when the operation is appended to the page cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    /// Points (1/72 inch)
    Pt,
    /// Millimetres
    Mm,
    /// Centimetres
    Cm,
    /// Inches
    In,
    /// CSS pixels (96 per inch)
    Px,
}

impl Unit {
    /// Number of points in one unit.
    pub fn points(self) -> f64 {
        match self {
            Unit::Pt => 1.0,
            Unit::Mm => 72.0 / 25.4,
            Unit::Cm => 72.0 / 2.54,
            Unit::In => 72.0,
            Unit::Px => 0.75,
        }
    }

    /// Convert a value in this unit to points.
    pub fn to_points(self, value: f64) -> f64 {
        value * self.points()
    }
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    /// Width in points
    pub width: f64,
    /// Height in points
    pub height: f64,
}

impl PageSize {
    /// ISO A3.
    pub const A3: PageSize = PageSize::new(841.89, 1190.55);
    /// ISO A4.
    pub const A4: PageSize = PageSize::new(595.28, 841.89);
    /// ISO A5.
    pub const A5: PageSize = PageSize::new(419.53, 595.28);
    /// US Letter.
    pub const LETTER: PageSize = PageSize::new(612.0, 792.0);
    /// US Legal.
    pub const LEGAL: PageSize = PageSize::new(612.0, 1008.0);

    /// Custom page size in points.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Swap width and height.
    pub fn landscape(self) -> Self {
        Self::new(self.height, self.width)
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

/// Flate compression level for content streams and embedded resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompressionLevel {
    /// Store streams uncompressed (no /Filter entry)
    None,
    /// Fastest flate level
    Fastest,
    /// zlib default level
    #[default]
    Default,
    /// Smallest output
    Best,
}

impl CompressionLevel {
    /// The matching flate2 compression setting, `None` when streams stay raw.
    pub fn flate(self) -> Option<flate2::Compression> {
        match self {
            CompressionLevel::None => None,
            CompressionLevel::Fastest => Some(flate2::Compression::fast()),
            CompressionLevel::Default => Some(flate2::Compression::default()),
            CompressionLevel::Best => Some(flate2::Compression::best()),
        }
    }
}

/// Password protection settings applied at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectionConfig {
    /// Password required to open the file (may be empty)
    pub user_password: String,
    /// Password granting full access
    pub owner_password: String,
    /// Operations allowed to holders of the user password
    pub permissions: Permissions,
    /// Cipher used for strings and streams
    pub algorithm: EncryptionAlgorithm,
}

impl ProtectionConfig {
    /// Protection with the given passwords, all permissions, and RC4-128.
    pub fn new(user_password: impl Into<String>, owner_password: impl Into<String>) -> Self {
        Self {
            user_password: user_password.into(),
            owner_password: owner_password.into(),
            permissions: Permissions::all(),
            algorithm: EncryptionAlgorithm::Rc4_128,
        }
    }

    /// Restrict the permission set.
    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Choose the cipher.
    pub fn with_algorithm(mut self, algorithm: EncryptionAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// Document information dictionary fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Document title
    pub title: Option<String>,
    /// Author name
    pub author: Option<String>,
    /// Subject
    pub subject: Option<String>,
    /// Keywords
    pub keywords: Option<String>,
    /// Creating application
    pub creator: Option<String>,
    /// Producing library
    pub producer: Option<String>,
}

impl DocumentInfo {
    /// Empty info with the producer set to this crate.
    pub fn new() -> Self {
        Self {
            producer: Some(format!("{} {}", crate::NAME, crate::VERSION)),
            ..Default::default()
        }
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the author.
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the subject.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the keywords.
    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Set the creator.
    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }
}

/// Configuration for a document being built.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentConfig {
    /// Default page size for `add_page`
    pub page_size: PageSize,
    /// Unit for caller-space coordinates
    pub unit: Unit,
    /// Compression for streams
    pub compression: CompressionLevel,
    /// Version written in the header
    pub version: String,
    /// Optional password protection
    pub protection: Option<ProtectionConfig>,
    /// Document information dictionary
    pub info: DocumentInfo,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentConfig {
    /// Create new configuration with defaults (A4, points, default compression).
    pub fn new() -> Self {
        Self {
            page_size: PageSize::A4,
            unit: Unit::Pt,
            compression: CompressionLevel::Default,
            version: "1.7".to_string(),
            protection: None,
            info: DocumentInfo::new(),
        }
    }

    /// Set the default page size.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the coordinate unit.
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Set the compression level.
    pub fn with_compression(mut self, compression: CompressionLevel) -> Self {
        self.compression = compression;
        self
    }

    /// Set the header version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Enable password protection.
    pub fn with_protection(mut self, protection: ProtectionConfig) -> Self {
        self.protection = Some(protection);
        self
    }

    /// Set the document information.
    pub fn with_info(mut self, info: DocumentInfo) -> Self {
        self.info = info;
        self
    }
}

/// Options for the raw reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Stop scanning after this many object headers
    pub max_objects: usize,
    /// Expand `/Type /ObjStm` object streams into the object map
    pub expand_object_streams: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderOptions {
    /// Default options.
    pub fn new() -> Self {
        Self {
            max_objects: 1_000_000,
            expand_object_streams: true,
        }
    }

    /// Cap the number of scanned objects.
    pub fn with_max_objects(mut self, max_objects: usize) -> Self {
        self.max_objects = max_objects;
        self
    }

    /// Toggle object stream expansion.
    pub fn with_object_streams(mut self, expand: bool) -> Self {
        self.expand_object_streams = expand;
        self
    }
}
