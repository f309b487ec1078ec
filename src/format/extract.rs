//! Pluggable description extraction.
//!
//! Each [`DescriptionExtractor`] knows one way of pulling a caption out of a
//! file's bytes and declares which formats it understands. The
//! [`ExtractorChain`] tries them in order and returns the first description
//! found. Extractor failures are logged and skipped, never propagated.

use tracing::{debug, warn};

use crate::error::MetadataError;

use super::exif::read_image_description;
use super::jpeg::find_exif_payload;
use super::ImageFormat;

/// A format-specific source of human-authored image descriptions.
pub trait DescriptionExtractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this extractor understands files of `format`.
    fn supports(&self, format: ImageFormat) -> bool;

    /// Extract a description from the complete file contents.
    ///
    /// `Ok(None)` means the file parsed but carries no description.
    fn extract(&self, data: &[u8]) -> Result<Option<String>, MetadataError>;
}

/// Reads the EXIF `ImageDescription` tag from JPEG files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifDescriptionExtractor;

impl DescriptionExtractor for ExifDescriptionExtractor {
    fn name(&self) -> &'static str {
        "exif"
    }

    fn supports(&self, format: ImageFormat) -> bool {
        format == ImageFormat::Jpeg
    }

    fn extract(&self, data: &[u8]) -> Result<Option<String>, MetadataError> {
        match find_exif_payload(data)? {
            Some(payload) => read_image_description(payload),
            None => Ok(None),
        }
    }
}

/// Ordered list of extractors; first success wins.
pub struct ExtractorChain {
    extractors: Vec<Box<dyn DescriptionExtractor>>,
}

impl ExtractorChain {
    /// Create a chain with no extractors. Every file falls back to its name.
    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Append an extractor to the end of the chain.
    pub fn with(mut self, extractor: impl DescriptionExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    /// Number of extractors in the chain.
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Whether the chain has no extractors.
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Whether any extractor understands `format`.
    ///
    /// Callers use this to skip reading file contents that no extractor
    /// would look at.
    pub fn supports(&self, format: ImageFormat) -> bool {
        self.extractors.iter().any(|e| e.supports(format))
    }

    /// Try every extractor that supports `format`, in order.
    ///
    /// Returns the first description found. Extractor errors are logged
    /// against `file` and treated as "no description".
    pub fn try_extract_description(
        &self,
        format: ImageFormat,
        file: &str,
        data: &[u8],
    ) -> Option<String> {
        for extractor in self.extractors.iter().filter(|e| e.supports(format)) {
            match extractor.extract(data) {
                Ok(Some(description)) => return Some(description),
                Ok(None) => {
                    debug!(file = file, extractor = extractor.name(), "No description tag");
                }
                Err(err) => {
                    warn!(
                        file = file,
                        extractor = extractor.name(),
                        error = %err,
                        "Could not parse image metadata"
                    );
                }
            }
        }
        None
    }
}

impl Default for ExtractorChain {
    /// The standard chain: EXIF for JPEG.
    fn default() -> Self {
        Self::empty().with(ExifDescriptionExtractor)
    }
}

impl std::fmt::Debug for ExtractorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.extractors.iter().map(|e| e.name()))
            .finish()
    }
}
