//! HTTP server layer for the photo gallery.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │     POST /api/authenticate   GET /api/images   GET /images/*    │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    auth     │  │        routes           │  │
//! │  │ (requests)  │  │ (PIN gate)  │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{
    require_session, Access, AuthError, AuthState, ClientAddr, PinGate, SessionGrant,
    SESSION_COOKIE,
};
pub use handlers::{
    authenticate_handler, health_handler, image_handler, images_handler, logout_handler, AppState,
    AuthenticateRequest, ErrorResponse, HealthResponse, ImageFetchError, SuccessResponse,
};
pub use routes::{create_router, RouterConfig};
