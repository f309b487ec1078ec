//! Image formats and embedded-metadata parsers.
//!
//! The gallery recognises a fixed set of raster formats by file extension.
//! Only JPEG files carry metadata we read: the EXIF block lives in an APP1
//! segment and is itself a small TIFF structure.
//!
//! ```text
//! JPEG: SOI | APP0 | APP1 "Exif\0\0" <TIFF header + IFD0 ...> | ... | SOS ...
//!                                       └── ImageDescription (0x010E)
//! ```

pub mod exif;
pub mod extract;
pub mod jpeg;

pub use exif::read_image_description;
pub use extract::{DescriptionExtractor, ExifDescriptionExtractor, ExtractorChain};
pub use jpeg::find_exif_payload;

/// File extensions (lowercase, without the dot) served by the gallery.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Raster formats the gallery lists and serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    WebP,
}

impl ImageFormat {
    /// Map a file extension (without the dot, any case) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "gif" => Some(ImageFormat::Gif),
            "bmp" => Some(ImageFormat::Bmp),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect the format of a file from its final extension.
    ///
    /// Names without a stem (such as `.jpg`) have no extension.
    pub fn from_filename(name: &str) -> Option<Self> {
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Self::from_extension(ext),
            _ => None,
        }
    }

    /// MIME type used when serving the raw bytes.
    pub const fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::WebP => "image/webp",
        }
    }
}
