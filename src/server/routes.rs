//! Router configuration for the photo gallery.
//!
//! This module defines the HTTP routes and applies middleware for session
//! authentication, CORS, request tracing, and static assets.
//!
//! # Route Structure
//!
//! ```text
//! /health                - Health check (public)
//! /api/authenticate      - PIN login (public, auth enabled only)
//! /api/logout            - Logout (public, auth enabled only)
//! /api/images            - Image catalog (protected)
//! /images/{filename}     - Raw image bytes (protected)
//! /*                     - Front-end assets from the public directory
//! ```
//!
//! # Example
//!
//! ```ignore
//! use photo_gallery::catalog::CatalogBuilder;
//! use photo_gallery::server::routes::{create_router, RouterConfig};
//! use photo_gallery::source::FsImageSource;
//!
//! let catalog = CatalogBuilder::new(FsImageSource::new("/srv/photos"));
//! let config = RouterConfig::new("1234", "a-long-random-session-secret")
//!     .with_public_dir("public");
//!
//! let router = create_router(catalog, config);
//!
//! // PIN attempts are throttled per peer address, taken from ConnectInfo
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(
//!     listener,
//!     router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
//! )
//! .await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::auth::{require_session, AuthState, PinGate, DEFAULT_PIN_ATTEMPTS_PER_MINUTE};
use super::handlers::{
    authenticate_handler, health_handler, image_handler, images_handler, logout_handler, AppState,
    DEFAULT_CACHE_MAX_AGE,
};
use crate::catalog::CatalogBuilder;
use crate::config::ListingMode;
use crate::session::{MemorySessionStore, SessionSigner, SessionStore};
use crate::source::ImageSource;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Whether the catalog and image routes require a session
    pub auth_enabled: bool,

    /// PIN that unlocks a session
    pub pin: String,

    /// Secret key for signing session cookies
    pub session_secret: String,

    /// Session storage (None = a fresh in-memory store)
    pub session_store: Option<Arc<dyn SessionStore>>,

    /// PIN attempts allowed per minute per client address (0 = unlimited)
    pub pin_attempts_per_minute: u32,

    /// Whether proxy headers identify the client for attempt throttling
    pub trust_proxy_headers: bool,

    /// Whether the session cookie is marked `Secure`
    pub cookie_secure: bool,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age for image bytes in seconds
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Directory with the front-end assets (None = no static files)
    pub public_dir: Option<PathBuf>,

    /// Shape of the listing response
    pub listing: ListingMode,
}

impl RouterConfig {
    /// Create a router configuration with authentication enabled.
    ///
    /// By default:
    /// - PIN attempts are limited to 10 per minute per client address
    /// - Proxy headers are not trusted
    /// - Session cookies are not marked `Secure`
    /// - CORS allows any origin
    /// - Cache max-age is 1 hour (3600 seconds)
    /// - Tracing is enabled
    /// - No static files are served
    /// - Listings include descriptions
    pub fn new(pin: impl Into<String>, session_secret: impl Into<String>) -> Self {
        Self {
            auth_enabled: true,
            pin: pin.into(),
            session_secret: session_secret.into(),
            session_store: None,
            pin_attempts_per_minute: DEFAULT_PIN_ATTEMPTS_PER_MINUTE,
            trust_proxy_headers: false,
            cookie_secure: false,
            cors_origins: None,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            enable_tracing: true,
            public_dir: None,
            listing: ListingMode::Described,
        }
    }

    /// Create a configuration with authentication disabled.
    ///
    /// Every route is public and the auth endpoints are not mounted.
    pub fn without_auth() -> Self {
        Self {
            auth_enabled: false,
            ..Self::new(String::new(), String::new())
        }
    }

    /// Use a specific session store.
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Set the PIN attempt quota per minute. `0` disables throttling.
    pub fn with_pin_attempts_per_minute(mut self, attempts: u32) -> Self {
        self.pin_attempts_per_minute = attempts;
        self
    }

    /// Attribute PIN attempts to `X-Forwarded-For`/`X-Real-IP` addresses.
    ///
    /// Only enable behind a reverse proxy that sets these headers.
    pub fn with_trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Mark the session cookie `Secure`.
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Serve front-end assets from `dir`.
    pub fn with_public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = Some(dir.into());
        self
    }

    /// Choose the listing response shape.
    pub fn with_listing(mut self, listing: ListingMode) -> Self {
        self.listing = listing;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Public routes (health check, login, logout)
/// - Protected routes (catalog and image bytes behind the session guard)
/// - Static front-end assets as the fallback
/// - CORS configuration
/// - Request tracing (optional)
pub fn create_router<S>(catalog: CatalogBuilder<S>, config: RouterConfig) -> Router
where
    S: ImageSource + 'static,
{
    let app_state = AppState::new(catalog)
        .with_listing(config.listing)
        .with_cache_max_age(config.cache_max_age);

    let cors = build_cors_layer(&config);

    let router = if config.auth_enabled {
        let auth = build_auth_state(&config);
        build_protected_router(app_state, auth)
    } else {
        build_public_router(app_state)
    };

    let router = match &config.public_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    let router = router.layer(cors);

    // Add tracing if enabled
    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn build_auth_state(config: &RouterConfig) -> Arc<AuthState> {
    let sessions: Arc<dyn SessionStore> = match &config.session_store {
        Some(store) => Arc::clone(store),
        None => Arc::new(MemorySessionStore::default()),
    };
    let gate = PinGate::new(config.pin.clone())
        .with_attempts_per_minute(config.pin_attempts_per_minute);

    Arc::new(
        AuthState::new(gate, sessions, SessionSigner::new(&config.session_secret))
            .with_cookie_secure(config.cookie_secure)
            .with_trust_proxy_headers(config.trust_proxy_headers),
    )
}

/// Build router with the session guard on catalog and image routes.
fn build_protected_router<S>(app_state: AppState<S>, auth: Arc<AuthState>) -> Router
where
    S: ImageSource + 'static,
{
    // route_layer keeps unmatched paths falling through to the static assets
    let protected_routes = Router::new()
        .route("/api/images", get(images_handler::<S>))
        .route("/images/{filename}", get(image_handler::<S>))
        .with_state(app_state)
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&auth),
            require_session,
        ));

    let auth_routes = Router::new()
        .route("/api/authenticate", post(authenticate_handler))
        .route("/api/logout", post(logout_handler))
        .with_state(auth);

    let public_routes = Router::new().route("/health", get(health_handler));

    Router::new()
        .merge(protected_routes)
        .merge(auth_routes)
        .merge(public_routes)
}

/// Build router without authentication.
fn build_public_router<S>(app_state: AppState<S>) -> Router
where
    S: ImageSource + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/images", get(images_handler::<S>))
        .route("/images/{filename}", get(image_handler::<S>))
        .with_state(app_state)
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
