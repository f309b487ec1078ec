//! Directory-backed image source.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::IoError;

use super::{is_plain_file_name, ImageSource};

/// An [`ImageSource`] over one directory, read non-recursively.
///
/// # Example
///
/// ```ignore
/// use photo_gallery::source::{FsImageSource, ImageSource};
///
/// let source = FsImageSource::new("/srv/photos");
/// let names = source.list_entries().await?;
/// ```
#[derive(Debug, Clone)]
pub struct FsImageSource {
    root: PathBuf,
    location: String,
}

impl FsImageSource {
    /// Create a source for the given directory.
    ///
    /// The directory is not touched until the first request.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let location = root.display().to_string();
        Self { root, location }
    }

    /// The directory this source reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open a regular file in the directory, returning it with its length.
    async fn open(&self, name: &str) -> Result<(File, u64), IoError> {
        if !is_plain_file_name(name) {
            return Err(IoError::NotFound(name.to_string()));
        }

        let file = File::open(self.root.join(name))
            .await
            .map_err(|e| IoError::from_io(name, &e))?;
        let metadata = file
            .metadata()
            .await
            .map_err(|e| IoError::from_io(name, &e))?;

        // Directories named like images are not images
        if !metadata.is_file() {
            return Err(IoError::NotFound(name.to_string()));
        }

        Ok((file, metadata.len()))
    }
}

#[async_trait]
impl ImageSource for FsImageSource {
    async fn list_entries(&self) -> Result<Vec<String>, IoError> {
        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| IoError::from_io(&self.location, &e))?;

        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| IoError::from_io(&self.location, &e))?
        {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    debug!(name = ?raw, "Skipping non UTF-8 file name");
                    continue;
                }
            };

            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(e) => {
                    debug!(file = %name, error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            let is_file = if file_type.is_symlink() {
                // Follow the link; dangling links are skipped
                tokio::fs::metadata(entry.path())
                    .await
                    .map(|meta| meta.is_file())
                    .unwrap_or(false)
            } else {
                file_type.is_file()
            };

            if is_file {
                names.push(name);
            }
        }

        Ok(names)
    }

    async fn read(&self, name: &str) -> Result<Bytes, IoError> {
        let (mut file, len) = self.open(name).await?;

        let mut data = Vec::with_capacity(usize::try_from(len).unwrap_or(0));
        file.read_to_end(&mut data)
            .await
            .map_err(|e| IoError::from_io(name, &e))?;
        Ok(Bytes::from(data))
    }

    async fn read_prefix(&self, name: &str, limit: usize) -> Result<Bytes, IoError> {
        let (file, len) = self.open(name).await?;

        let capacity = usize::try_from(len).map_or(limit, |len| len.min(limit));
        let mut data = Vec::with_capacity(capacity);
        file.take(limit as u64)
            .read_to_end(&mut data)
            .await
            .map_err(|e| IoError::from_io(name, &e))?;
        Ok(Bytes::from(data))
    }

    fn location(&self) -> &str {
        &self.location
    }
}
