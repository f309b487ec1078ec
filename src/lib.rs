//! # Photo Gallery
//!
//! A small personal photo-gallery server. It lists the images of one
//! directory, captions each one from its embedded EXIF description or its
//! file name, and serves the list as JSON behind a 4-digit PIN. A static
//! front-end renders the images in a masonry grid with live filtering.
//!
//! ## Features
//!
//! - **EXIF captions**: JPEG `ImageDescription` tags are read with a small
//!   bounds-checked parser; no image decoding is involved
//! - **Filename fallback**: `sunset_over-bay.png` is captioned `sunset over bay`
//! - **PIN sessions**: signed session cookies backed by a server-side store,
//!   with throttled PIN attempts
//! - **Bounded fan-out**: files are resolved concurrently under a shared limit
//!
//! ## Architecture
//!
//! - [`source`] - Image storage abstraction and the directory implementation
//! - [`mod@format`] - Supported formats, JPEG segment walker, and EXIF parser
//! - [`catalog`] - Catalog builder: scan, resolve, aggregate
//! - [`session`] - Session store and signed session tokens
//! - [`server`] - Axum routes, handlers, and the PIN gate
//! - [`config`] - CLI and environment configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use photo_gallery::{create_router, CatalogBuilder, FsImageSource, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let catalog = CatalogBuilder::new(FsImageSource::new("/srv/photos"));
//!     let config = RouterConfig::new("1234", "a-long-random-session-secret")
//!         .with_public_dir("public");
//!
//!     let router = create_router(catalog, config);
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(
//!         listener,
//!         router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
//!     )
//!     .await
//!     .unwrap();
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod format;
pub mod server;
pub mod session;
pub mod source;

// Re-export commonly used types
pub use catalog::{
    fallback_description, list_catalog, Catalog, CatalogBuilder, ImageRecord,
    DEFAULT_CATALOG_CONCURRENCY,
};
pub use config::{Config, ListingMode};
pub use error::{CatalogError, ConfigError, IoError, MetadataError};
pub use format::{
    find_exif_payload, read_image_description, DescriptionExtractor, ExifDescriptionExtractor,
    ExtractorChain, ImageFormat, SUPPORTED_EXTENSIONS,
};
pub use server::{
    create_router, require_session, Access, AppState, AuthError, AuthState, ErrorResponse,
    PinGate, RouterConfig, SessionGrant, SESSION_COOKIE,
};
pub use session::{MemorySessionStore, SessionSigner, SessionState, SessionStore};
pub use source::{FsImageSource, ImageSource};
