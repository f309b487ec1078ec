//! Configuration management for the photo gallery.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables (also read from a `.env` file at startup)
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use photo_gallery::config::Config;
//!
//! let config = Config::parse();
//! config.validate()?;
//! println!("Listening on {}", config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `IMAGES_FOLDER` - Directory with the gallery images (required)
//! - `PIN_CODE` - 4-digit PIN (required when auth is enabled)
//! - `SESSION_SECRET` - Cookie signing key, at least 16 bytes (required when auth is enabled)
//! - `GALLERY_HOST` - Server bind address (default: 0.0.0.0)
//! - `GALLERY_PORT` - Server port (default: 3000)
//! - `GALLERY_PUBLIC_DIR` - Front-end assets directory (default: public)
//! - `GALLERY_AUTH_ENABLED` - Require the PIN (default: true)
//! - `GALLERY_SESSION_TTL` - Idle session lifetime in seconds (default: 604800)
//! - `GALLERY_COOKIE_SECURE` - Mark the session cookie Secure (default: false)
//! - `GALLERY_PIN_ATTEMPTS` - PIN attempts per minute, 0 = unlimited (default: 10)
//! - `GALLERY_CATALOG_CONCURRENCY` - Files resolved at once (default: 16)
//! - `GALLERY_LISTING` - `described` or `names` (default: described)
//! - `GALLERY_CACHE_MAX_AGE` - Image Cache-Control max-age seconds (default: 3600)
//! - `GALLERY_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::catalog::DEFAULT_CATALOG_CONCURRENCY;
use crate::error::ConfigError;
use crate::server::auth::DEFAULT_PIN_ATTEMPTS_PER_MINUTE;
use crate::server::handlers::DEFAULT_CACHE_MAX_AGE;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default front-end assets directory.
pub const DEFAULT_PUBLIC_DIR: &str = "public";

/// Default idle session lifetime in seconds (7 days).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 604_800;

/// Number of digits in a PIN.
pub const PIN_LENGTH: usize = 4;

/// Minimum session secret length in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 16;

/// Shape of the `/api/images` response.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingMode {
    /// Objects with `file` and `description`
    #[default]
    Described,

    /// Bare file names
    Names,
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Photo Gallery - a PIN-protected image gallery server.
///
/// Lists the images of one directory with captions taken from their EXIF
/// data or file names, and serves a browser front-end to view them.
#[derive(Parser, Debug, Clone)]
#[command(name = "photo-gallery")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Gallery Configuration
    // =========================================================================
    /// Directory containing the gallery images.
    #[arg(long, env = "IMAGES_FOLDER")]
    pub images_folder: Option<PathBuf>,

    /// Directory with the front-end assets.
    #[arg(long, default_value = DEFAULT_PUBLIC_DIR, env = "GALLERY_PUBLIC_DIR")]
    pub public_dir: PathBuf,

    /// Listing response shape.
    #[arg(long, value_enum, default_value_t = ListingMode::Described, env = "GALLERY_LISTING")]
    pub listing: ListingMode,

    /// Maximum number of image files resolved concurrently.
    #[arg(long, default_value_t = DEFAULT_CATALOG_CONCURRENCY, env = "GALLERY_CATALOG_CONCURRENCY")]
    pub catalog_concurrency: usize,

    /// HTTP Cache-Control max-age for image bytes, in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "GALLERY_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "GALLERY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "GALLERY_PORT")]
    pub port: u16,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Require a PIN before the gallery can be viewed.
    ///
    /// WARNING: when disabled, anyone who can reach the server sees every image.
    #[arg(
        long,
        default_value_t = true,
        env = "GALLERY_AUTH_ENABLED",
        action = clap::ArgAction::Set
    )]
    pub auth_enabled: bool,

    /// 4-digit PIN that unlocks the gallery.
    #[arg(long, env = "PIN_CODE", hide_env_values = true)]
    pub pin_code: Option<String>,

    /// Secret key used to sign session cookies.
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    /// Idle session lifetime in seconds.
    #[arg(long, default_value_t = DEFAULT_SESSION_TTL_SECS, env = "GALLERY_SESSION_TTL")]
    pub session_ttl: u64,

    /// Mark the session cookie `Secure` (enable behind HTTPS).
    #[arg(
        long,
        default_value_t = false,
        env = "GALLERY_COOKIE_SECURE",
        action = clap::ArgAction::Set
    )]
    pub cookie_secure: bool,

    /// PIN attempts allowed per minute from each client address (0 = unlimited).
    #[arg(long, default_value_t = DEFAULT_PIN_ATTEMPTS_PER_MINUTE, env = "GALLERY_PIN_ATTEMPTS")]
    pub pin_attempts_per_minute: u32,

    /// Identify clients by `X-Forwarded-For`/`X-Real-IP` when throttling PIN
    /// attempts. Enable only behind a reverse proxy that sets them.
    #[arg(
        long,
        default_value_t = false,
        env = "GALLERY_TRUST_PROXY_HEADERS",
        action = clap::ArgAction::Set
    )]
    pub trust_proxy_headers: bool,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "GALLERY_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration.
    ///
    /// Checks that the images folder is a readable directory, and, when auth
    /// is enabled, that the PIN and session secret are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let folder = match &self.images_folder {
            Some(folder) if !folder.as_os_str().is_empty() => folder,
            _ => return Err(ConfigError::MissingImagesFolder),
        };
        validate_images_folder(folder)?;

        if self.auth_enabled {
            let pin = self.pin_code.as_deref().ok_or(ConfigError::MissingPin)?;
            if !is_valid_pin(pin) {
                return Err(ConfigError::InvalidPin);
            }

            let secret = self
                .session_secret
                .as_deref()
                .ok_or(ConfigError::MissingSessionSecret)?;
            if secret.len() < MIN_SESSION_SECRET_LEN {
                return Err(ConfigError::WeakSessionSecret {
                    min: MIN_SESSION_SECRET_LEN,
                });
            }
        }

        if self.session_ttl == 0 {
            return Err(ConfigError::Invalid(
                "session_ttl must be greater than 0".to_string(),
            ));
        }
        if self.catalog_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "catalog_concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Images folder, or an empty path if unset (call validate() first).
    pub fn images_folder_or_empty(&self) -> &Path {
        self.images_folder.as_deref().unwrap_or(Path::new(""))
    }

    /// Get the PIN, or an empty string if not set.
    pub fn pin_code_or_empty(&self) -> &str {
        self.pin_code.as_deref().unwrap_or("")
    }

    /// Get the session secret, or an empty string if not set.
    pub fn session_secret_or_empty(&self) -> &str {
        self.session_secret.as_deref().unwrap_or("")
    }

    /// Idle session lifetime.
    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }
}

/// Whether `pin` is exactly four ASCII digits.
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit())
}

fn validate_images_folder(folder: &Path) -> Result<(), ConfigError> {
    let unreadable = |err: std::io::Error| ConfigError::UnreadableImagesFolder {
        path: folder.to_path_buf(),
        reason: err.to_string(),
    };

    let metadata = std::fs::metadata(folder).map_err(unreadable)?;
    if !metadata.is_dir() {
        return Err(ConfigError::NotADirectory(folder.to_path_buf()));
    }
    std::fs::read_dir(folder).map_err(unreadable)?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
