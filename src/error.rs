use std::path::PathBuf;

use thiserror::Error;

/// I/O errors raised while reading from the image source
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// File or directory does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The process is not allowed to read the resource
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Any other filesystem failure
    #[error("I/O error on {path}: {message}")]
    Other { path: String, message: String },
}

impl IoError {
    /// Classify a `std::io::Error` raised while accessing `path`.
    pub fn from_io(path: impl Into<String>, err: &std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound(path),
            std::io::ErrorKind::PermissionDenied => IoError::PermissionDenied(path),
            _ => IoError::Other {
                path,
                message: err.to_string(),
            },
        }
    }
}

/// Errors that fail a whole catalog build
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The image directory could not be enumerated
    #[error("Could not read images folder {location}: {source}")]
    DirectoryRead { location: String, source: IoError },

    /// Joining the per-file workers failed
    #[error("Catalog aggregation failed: {0}")]
    Aggregation(String),
}

/// Errors raised while parsing embedded image metadata.
///
/// These never leave the catalog builder: a failing file falls back to its
/// filename-derived description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// Data does not start with a JPEG SOI marker
    #[error("Not a JPEG stream")]
    NotJpeg,

    /// Expected a 0xFF marker prefix
    #[error("Invalid JPEG marker at offset {offset}")]
    InvalidMarker { offset: usize },

    /// Segment declares a length smaller than its own length field
    #[error("Invalid segment length {length} at offset {offset}")]
    InvalidSegmentLength { offset: usize, length: usize },

    /// Ran past the end of the available data
    #[error("Truncated data: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Invalid TIFF byte-order magic inside the EXIF payload
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// TIFF version other than 42
    #[error("Invalid TIFF version: expected 42, got {0}")]
    InvalidVersion(u16),

    /// IFD offset points outside the payload
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// Tag has an unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },
}

/// Startup configuration errors. Any of these aborts the process.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Images folder is not set. Set --images-folder or IMAGES_FOLDER")]
    MissingImagesFolder,

    #[error("Images folder {path} cannot be read: {reason}")]
    UnreadableImagesFolder { path: PathBuf, reason: String },

    #[error("Images folder {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("PIN is not set. Set --pin-code or PIN_CODE, or disable auth with --auth-enabled=false")]
    MissingPin,

    #[error("PIN must be exactly 4 ASCII digits")]
    InvalidPin,

    #[error("Session secret is not set. Set --session-secret or SESSION_SECRET")]
    MissingSessionSecret,

    #[error("Session secret must be at least {min} bytes long")]
    WeakSessionSecret { min: usize },

    #[error("{0}")]
    Invalid(String),
}
