//! Catalog builder: directory scan, per-file fan-out, ordered fan-in.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::error::CatalogError;
use crate::format::{ExtractorChain, ImageFormat};
use crate::source::ImageSource;

use super::description::fallback_description;
use super::{Catalog, ImageRecord};

/// Default number of files resolved concurrently.
pub const DEFAULT_CATALOG_CONCURRENCY: usize = 16;

/// Bytes read from the start of each file when looking for metadata.
///
/// EXIF sits in the header segments, each at most 64 KiB, so this covers the
/// APP segments that may precede it without reading the scan data.
pub const METADATA_READ_LIMIT: usize = 256 * 1024;

/// Builds catalogs from an [`ImageSource`].
///
/// Per-file resolution runs on spawned tasks. The semaphore is shared by all
/// builds of one builder, so it caps concurrent file reads process-wide
/// rather than per request.
///
/// # Example
///
/// ```ignore
/// use photo_gallery::catalog::CatalogBuilder;
/// use photo_gallery::source::FsImageSource;
///
/// let builder = CatalogBuilder::new(FsImageSource::new("/srv/photos"));
/// let catalog = builder.list_catalog().await?;
/// for record in &catalog {
///     println!("{}: {}", record.file, record.description);
/// }
/// ```
pub struct CatalogBuilder<S: ImageSource> {
    source: Arc<S>,
    extractors: Arc<ExtractorChain>,
    permits: Arc<Semaphore>,
    max_concurrency: usize,
}

impl<S: ImageSource + 'static> CatalogBuilder<S> {
    /// Create a builder with the default extractor chain and concurrency.
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            extractors: Arc::new(ExtractorChain::default()),
            permits: Arc::new(Semaphore::new(DEFAULT_CATALOG_CONCURRENCY)),
            max_concurrency: DEFAULT_CATALOG_CONCURRENCY,
        }
    }

    /// Replace the extractor chain.
    pub fn with_extractors(mut self, extractors: ExtractorChain) -> Self {
        self.extractors = Arc::new(extractors);
        self
    }

    /// Set how many files may be resolved at once. Values below 1 are
    /// raised to 1.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        self.permits = Arc::new(Semaphore::new(max_concurrency));
        self.max_concurrency = max_concurrency;
        self
    }

    /// The underlying image source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Configured concurrency limit.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// List supported image files without reading them.
    ///
    /// Entries are kept in enumeration order; files whose extension is not a
    /// supported image format are dropped.
    pub async fn list_names(&self) -> Result<Vec<String>, CatalogError> {
        let entries = self.source.list_entries().await.map_err(|source| {
            CatalogError::DirectoryRead {
                location: self.source.location().to_string(),
                source,
            }
        })?;

        let names: Vec<String> = entries
            .into_iter()
            .filter(|name| ImageFormat::from_filename(name).is_some())
            .collect();

        debug!(
            location = self.source.location(),
            count = names.len(),
            "Scanned image folder"
        );

        Ok(names)
    }

    /// Build the full catalog with a description for every image.
    ///
    /// Resolves every file concurrently and returns once all of them have
    /// finished. The result keeps enumeration order regardless of which file
    /// finished first.
    pub async fn list_catalog(&self) -> Result<Catalog, CatalogError> {
        let names = self.list_names().await?;

        let mut handles = Vec::with_capacity(names.len());
        for name in names {
            let source = Arc::clone(&self.source);
            let extractors = Arc::clone(&self.extractors);
            let permits = Arc::clone(&self.permits);

            handles.push(tokio::spawn(async move {
                // The semaphore is never closed, so acquisition only waits
                let _permit = permits.acquire_owned().await.ok();
                resolve_record(source.as_ref(), &extractors, name).await
            }));
        }

        let mut records = Vec::with_capacity(handles.len());
        for handle in handles {
            let record = handle.await.map_err(|e| {
                error!(error = %e, "Catalog worker failed");
                CatalogError::Aggregation(e.to_string())
            })?;
            records.push(record);
        }

        Ok(Catalog::new(records))
    }
}

/// Resolve one file's description: metadata first, filename as last resort.
async fn resolve_record<S: ImageSource + ?Sized>(
    source: &S,
    extractors: &ExtractorChain,
    file: String,
) -> ImageRecord {
    let mut description = None;

    if let Some(format) = ImageFormat::from_filename(&file).filter(|f| extractors.supports(*f)) {
        match source.read_prefix(&file, METADATA_READ_LIMIT).await {
            Ok(data) => {
                description = extractors.try_extract_description(format, &file, &data);
            }
            Err(err) => {
                warn!(file = %file, error = %err, "Could not read image, using file name");
            }
        }
    }

    let description = description.unwrap_or_else(|| fallback_description(&file));
    ImageRecord { file, description }
}
