//! Image catalog construction.
//!
//! A catalog is built fresh for every listing request:
//!
//! ```text
//! Scanning ──► per file: Reading ──► [MetadataParse] ──► FallbackDerive
//!    │                                                        │
//!    ▼                                                        ▼
//! DirectoryError                                   Aggregating ──► Done
//! ```
//!
//! Only a directory that cannot be enumerated fails the build. Every per-file
//! problem is absorbed by the filename-derived description.

mod builder;
mod description;

use std::path::Path;

use serde::Serialize;

use crate::error::CatalogError;
use crate::source::FsImageSource;

pub use builder::{CatalogBuilder, DEFAULT_CATALOG_CONCURRENCY, METADATA_READ_LIMIT};
pub use description::fallback_description;

/// One listed image and its resolved caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    /// File name, unique within one catalog
    pub file: String,

    /// Caption from metadata, or derived from the file name
    pub description: String,
}

/// The images of one listing, in directory enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    records: Vec<ImageRecord>,
}

impl Catalog {
    /// Wrap records that are already in enumeration order.
    pub fn new(records: Vec<ImageRecord>) -> Self {
        Self { records }
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog has no images.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ImageRecord> {
        self.records.iter()
    }

    /// Look up a record by file name.
    pub fn get(&self, file: &str) -> Option<&ImageRecord> {
        self.records.iter().find(|r| r.file == file)
    }

    /// Take ownership of the records.
    pub fn into_records(self) -> Vec<ImageRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ImageRecord;
    type IntoIter = std::slice::Iter<'a, ImageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Build the catalog of a directory with the default extractor chain.
///
/// Convenience wrapper over [`CatalogBuilder`] for one-off listings.
pub async fn list_catalog(directory: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    CatalogBuilder::new(FsImageSource::new(directory.as_ref()))
        .list_catalog()
        .await
}
