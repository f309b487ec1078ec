//! HTTP request handlers for the gallery API.
//!
//! # Endpoints
//!
//! - `POST /api/authenticate` - Exchange the PIN for an authenticated session
//! - `POST /api/logout` - Drop the current session
//! - `GET /api/images` - List images with descriptions (protected)
//! - `GET /images/{filename}` - Serve raw image bytes (protected)
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::catalog::CatalogBuilder;
use crate::config::ListingMode;
use crate::error::{CatalogError, IoError};
use crate::format::ImageFormat;
use crate::source::{is_plain_file_name, ImageSource};

use super::auth::{AuthError, AuthState, ClientAddr};

/// Default Cache-Control max-age for image bytes, in seconds.
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// Application State
// =============================================================================

/// Shared state of the catalog and image routes.
pub struct AppState<S: ImageSource> {
    /// Builds the catalog for each listing request
    pub catalog: Arc<CatalogBuilder<S>>,

    /// Shape of the `/api/images` response
    pub listing: ListingMode,

    /// Cache-Control max-age for image bytes in seconds
    pub cache_max_age: u32,
}

impl<S: ImageSource> AppState<S> {
    /// Create state serving described listings with the default max-age.
    pub fn new(catalog: CatalogBuilder<S>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            listing: ListingMode::Described,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
        }
    }

    pub fn with_listing(mut self, listing: ListingMode) -> Self {
        self.listing = listing;
        self
    }

    pub fn with_cache_max_age(mut self, cache_max_age: u32) -> Self {
        self.cache_max_age = cache_max_age;
        self
    }
}

impl<S: ImageSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            listing: self.listing,
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of `POST /api/authenticate`.
#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    /// Submitted PIN; a missing field is treated as an empty PIN
    #[serde(default)]
    pub pin: String,
}

/// JSON error response returned for all error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of successful auth operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Responses
// =============================================================================

/// Convert catalog errors into HTTP responses.
///
/// Both variants are server errors. The body carries a fixed message and the
/// detail goes to the log only.
impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (error_type, message) = match &self {
            CatalogError::DirectoryRead { .. } => ("directory_read", "Could not read images folder."),
            CatalogError::Aggregation(_) => ("aggregation", "Could not process images."),
        };
        let status = StatusCode::INTERNAL_SERVER_ERROR;

        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            self
        );

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Wrapper for image fetch errors to implement IntoResponse.
#[derive(Debug)]
pub struct ImageFetchError(pub IoError);

impl IntoResponse for ImageFetchError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self.0 {
            IoError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", "Image not found"),
            IoError::PermissionDenied(_) | IoError::Other { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                "Could not read image.",
            ),
        };

        // Log based on severity
        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                self.0
            );
        } else {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                self.0
            );
        }

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

impl From<IoError> for ImageFetchError {
    fn from(err: IoError) -> Self {
        ImageFetchError(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle PIN submission.
///
/// # Endpoint
///
/// `POST /api/authenticate` with body `{"pin": "1234"}`
///
/// # Response
///
/// - `200 OK`: `{"success": true}` and the session cookie
/// - `400 Bad Request`: body is not the expected JSON
/// - `401 Unauthorized`: `{"error": "Invalid PIN"}`
/// - `429 Too Many Requests`: the client's attempt quota is exhausted, with
///   `Retry-After`
pub async fn authenticate_handler(
    State(auth): State<Arc<AuthState>>,
    client: ClientAddr,
    jar: CookieJar,
    body: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<SuccessResponse>), AuthError> {
    let Json(request) = body.map_err(|rejection| AuthError::MalformedRequest(rejection.body_text()))?;

    let current = auth.session_id(&jar);
    let grant = auth
        .gate
        .authenticate(
            auth.sessions.as_ref(),
            current.as_deref(),
            auth.client_ip(&client),
            &request.pin,
        )
        .await?;

    let jar = jar.add(auth.session_cookie(&grant.session_id));
    Ok((jar, Json(SuccessResponse { success: true })))
}

/// Handle logout.
///
/// # Endpoint
///
/// `POST /api/logout`
///
/// Always succeeds. The session, if any, is removed from the store and the
/// cookie is cleared.
pub async fn logout_handler(
    State(auth): State<Arc<AuthState>>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    if let Some(id) = auth.session_id(&jar) {
        auth.sessions.remove(&id).await;
        debug!("Session removed");
    }
    (
        jar.remove(auth.removal_cookie()),
        Json(SuccessResponse { success: true }),
    )
}

/// Handle image listing requests.
///
/// # Endpoint
///
/// `GET /api/images`
///
/// # Response
///
/// `200 OK` with a JSON array in directory enumeration order. In described
/// mode each element is `{"file": ..., "description": ...}`; in names mode
/// each element is the file name.
///
/// - `500 Internal Server Error`: `{"error": "Could not read images folder."}`
///   or `{"error": "Could not process images."}`
pub async fn images_handler<S: ImageSource + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Response, CatalogError> {
    let response = match state.listing {
        ListingMode::Described => Json(state.catalog.list_catalog().await?).into_response(),
        ListingMode::Names => Json(state.catalog.list_names().await?).into_response(),
    };
    Ok(response)
}

/// Handle raw image requests.
///
/// # Endpoint
///
/// `GET /images/{filename}`
///
/// # Response
///
/// - `200 OK`: file bytes with `Content-Type` from the extension
/// - `404 Not Found`: unknown file, unsupported extension, or a name that is
///   not a plain file name
///
/// # Headers
///
/// - `Content-Type: image/*`
/// - `Cache-Control: private, max-age={cache_max_age}`
pub async fn image_handler<S: ImageSource + 'static>(
    State(state): State<AppState<S>>,
    Path(filename): Path<String>,
) -> Result<Response, ImageFetchError> {
    let format = match ImageFormat::from_filename(&filename) {
        Some(format) if is_plain_file_name(&filename) => format,
        _ => return Err(ImageFetchError(IoError::NotFound(filename))),
    };

    let data = state.catalog.source().read(&filename).await?;

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CACHE_CONTROL,
                format!("private, max-age={}", state.cache_max_age),
            ),
        ],
        data,
    )
        .into_response())
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
