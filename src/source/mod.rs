//! Image storage abstraction.
//!
//! The catalog builder and the image handler never touch the filesystem
//! directly; they go through an [`ImageSource`]. The production source is
//! [`FsImageSource`], a single flat directory.
//!
//! ```text
//! ┌──────────────────────┐     ┌──────────────────────┐
//! │   CatalogBuilder     │     │    image_handler     │
//! └──────────┬───────────┘     └──────────┬───────────┘
//!            │ list_entries / read        │ read
//!            ▼                            ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                ImageSource trait                    │
//! └──────────────────────────┬──────────────────────────┘
//!                            ▼
//!                   FsImageSource (directory)
//! ```

mod fs;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

pub use fs::FsImageSource;

/// A flat collection of named image files.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Names of the regular files in the collection, in enumeration order.
    ///
    /// Subdirectories and other non-file entries are not returned. Failing to
    /// enumerate the collection is an error; problems with individual entries
    /// are not.
    async fn list_entries(&self) -> Result<Vec<String>, IoError>;

    /// Read the full contents of the named file.
    ///
    /// Names that do not refer to a regular file are `IoError::NotFound`.
    async fn read(&self, name: &str) -> Result<Bytes, IoError>;

    /// Read at most `limit` bytes from the start of the named file.
    ///
    /// The default reads the whole file and truncates it; sources that can
    /// stop early should override this.
    async fn read_prefix(&self, name: &str, limit: usize) -> Result<Bytes, IoError> {
        let mut data = self.read(name).await?;
        data.truncate(limit);
        Ok(data)
    }

    /// Human-readable location of the collection, used in logs and errors.
    fn location(&self) -> &str;
}

/// Whether `name` is a plain file name that cannot escape the collection.
///
/// Rejects empty names, `.`/`..`, and anything containing a path separator
/// or NUL byte.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
