//! PIN authentication and session gating.
//!
//! A client unlocks the gallery by posting the configured PIN to
//! `/api/authenticate`. On success its server-side session is marked
//! authenticated and the browser receives a signed session cookie. Every
//! protected route passes through [`require_session`], which admits the
//! request only if that cookie maps to an authenticated session.
//!
//! # Flow
//!
//! ```text
//! POST /api/authenticate {"pin": "1234"}
//!   ├─ session already authenticated ──────────────► 200 (idempotent)
//!   ├─ attempt quota exhausted ────────────────────► 429 Too many attempts
//!   ├─ PIN mismatch ───────────────────────────────► 401 Invalid PIN
//!   └─ PIN match ── fresh session ID, authenticated ► 200 + Set-Cookie
//!
//! GET /api/images, GET /images/{filename}
//!   └─ require_session ── cookie → verify → store.get → authorize
//! ```
//!
//! # Security Properties
//!
//! - **Constant-time comparison**: both the PIN and the cookie signature are
//!   compared in constant time
//! - **No fixation**: a successful login always issues a fresh session ID
//! - **Throttled guessing**: failed and fresh attempts draw from a
//!   per-minute quota kept per client address, so one guessing client cannot
//!   lock out another

use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::handlers::ErrorResponse;
use crate::session::{SessionSigner, SessionState, SessionStore};

// =============================================================================
// Types
// =============================================================================

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "gallery_session";

/// Default number of PIN attempts allowed per minute.
pub const DEFAULT_PIN_ATTEMPTS_PER_MINUTE: u32 = 10;

/// Client addresses tracked by the attempt limiter before idle ones are pruned.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Key used for requests whose client address is unknown.
const UNKNOWN_CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// PIN attempt limiter keyed by client address.
pub type PinAttemptLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// Authentication error types.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Submitted PIN does not match
    #[error("Invalid PIN")]
    InvalidPin,

    /// Request has no authenticated session
    #[error("Unauthorized")]
    Unauthorized,

    /// PIN attempt quota is exhausted
    #[error("Too many attempts")]
    TooManyAttempts {
        /// Time until the next attempt is accepted
        retry_after: Duration,
    },

    /// Request body could not be parsed
    #[error("{0}")]
    MalformedRequest(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            AuthError::InvalidPin => (StatusCode::UNAUTHORIZED, "invalid_pin"),
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AuthError::TooManyAttempts { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            AuthError::MalformedRequest(_) => (StatusCode::BAD_REQUEST, "malformed_request"),
        };
        let message = self.to_string();

        // Wrong PINs and throttling can indicate guessing, so log at warn
        match &self {
            AuthError::InvalidPin | AuthError::TooManyAttempts { .. } => {
                warn!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Authentication failed: {}",
                    message
                );
            }
            _ => {
                debug!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Authentication failed: {}",
                    message
                );
            }
        }

        let mut response = (status, Json(ErrorResponse::new(message))).into_response();
        if let AuthError::TooManyAttempts { retry_after } = &self {
            let seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds.max(1)));
        }
        response
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// A successful PIN check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    /// Session ID the client should hold from now on
    pub session_id: String,

    /// Whether a new session ID was issued by this attempt
    pub renewed: bool,
}

// =============================================================================
// PIN Gate
// =============================================================================

/// Checks submitted PINs and decides access for session states.
#[derive(Clone)]
pub struct PinGate {
    pin: String,
    limiter: Option<Arc<PinAttemptLimiter>>,
}

impl PinGate {
    /// Create a gate for the given PIN with no attempt throttling.
    pub fn new(pin: impl Into<String>) -> Self {
        Self {
            pin: pin.into(),
            limiter: None,
        }
    }

    /// Limit PIN attempts to `attempts` per minute for each client address.
    ///
    /// `0` disables throttling.
    pub fn with_attempts_per_minute(mut self, attempts: u32) -> Self {
        self.limiter = NonZeroU32::new(attempts)
            .map(|n| Arc::new(RateLimiter::keyed(Quota::per_minute(n))));
        self
    }

    /// Whether attempts are throttled.
    pub fn is_throttled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Compare a submitted PIN with the configured one in constant time.
    pub fn verify_pin(&self, submitted: &str) -> bool {
        submitted.as_bytes().ct_eq(self.pin.as_bytes()).into()
    }

    /// Check a PIN from `client` for the session `session_id` and record the
    /// result.
    ///
    /// A session that is already authenticated gets the same ID back for the
    /// correct PIN and does not consume attempt quota. Otherwise the attempt
    /// draws from the client's quota, and a correct PIN creates a fresh
    /// authenticated session and drops the old ID. A wrong PIN never mutates
    /// the store.
    pub async fn authenticate(
        &self,
        sessions: &dyn SessionStore,
        session_id: Option<&str>,
        client: IpAddr,
        submitted: &str,
    ) -> Result<SessionGrant, AuthError> {
        if let Some(id) = session_id {
            if sessions.get(id).await.authenticated {
                return if self.verify_pin(submitted) {
                    Ok(SessionGrant {
                        session_id: id.to_string(),
                        renewed: false,
                    })
                } else {
                    Err(AuthError::InvalidPin)
                };
            }
        }

        self.consume_attempt(client)?;

        if !self.verify_pin(submitted) {
            return Err(AuthError::InvalidPin);
        }

        if let Some(old) = session_id {
            sessions.remove(old).await;
        }
        let new_id = SessionSigner::generate_id();
        sessions.set(&new_id, SessionState::authenticated()).await;
        info!("Session authenticated");

        Ok(SessionGrant {
            session_id: new_id,
            renewed: true,
        })
    }

    /// Decide access for a session state.
    pub fn authorize(&self, state: &SessionState) -> Access {
        if state.authenticated {
            Access::Allow
        } else {
            Access::Deny
        }
    }

    fn consume_attempt(&self, client: IpAddr) -> Result<(), AuthError> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        if limiter.len() >= MAX_TRACKED_CLIENTS {
            limiter.retain_recent();
            debug!(tracked = limiter.len(), "Pruned idle PIN attempt limiters");
        }

        limiter.check_key(&client).map_err(|not_until| {
            debug!(client = %client, "PIN attempt quota exhausted");
            AuthError::TooManyAttempts {
                retry_after: not_until.wait_time_from(DefaultClock::default().now()),
            }
        })
    }
}

impl std::fmt::Debug for PinGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinGate")
            .field("throttled", &self.is_throttled())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Auth State
// =============================================================================

/// Everything the auth routes and middleware need.
#[derive(Clone)]
pub struct AuthState {
    pub gate: PinGate,
    pub sessions: Arc<dyn SessionStore>,
    pub signer: SessionSigner,
    /// Whether to mark the session cookie `Secure`
    pub cookie_secure: bool,
    /// Whether `X-Forwarded-For`/`X-Real-IP` identify the client
    pub trust_proxy_headers: bool,
}

impl AuthState {
    pub fn new(gate: PinGate, sessions: Arc<dyn SessionStore>, signer: SessionSigner) -> Self {
        Self {
            gate,
            sessions,
            signer,
            cookie_secure: false,
            trust_proxy_headers: false,
        }
    }

    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub fn with_trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Address that PIN attempts are counted against.
    ///
    /// Proxy headers are only honoured when configured, since any client can
    /// set them. Requests with no known address share one key.
    pub fn client_ip(&self, addr: &ClientAddr) -> IpAddr {
        let forwarded = if self.trust_proxy_headers {
            addr.forwarded
        } else {
            None
        };
        forwarded.or(addr.peer).unwrap_or(UNKNOWN_CLIENT)
    }

    /// Session ID carried by the request's cookie, if its signature verifies.
    pub fn session_id(&self, jar: &CookieJar) -> Option<String> {
        let cookie = jar.get(SESSION_COOKIE)?;
        match self.signer.verify(cookie.value()) {
            Ok(id) => Some(id),
            Err(err) => {
                debug!(error = %err, "Ignoring session cookie");
                None
            }
        }
    }

    /// Cookie carrying a signed session ID.
    pub fn session_cookie(&self, session_id: &str) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, self.signer.sign(session_id)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.cookie_secure)
            .build()
    }

    /// Cookie that clears the session cookie on the client.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, "")).path("/").build()
    }

    /// Session state behind the request's cookie.
    pub async fn session_state(&self, jar: &CookieJar) -> SessionState {
        match self.session_id(jar) {
            Some(id) => self.sessions.get(&id).await,
            None => SessionState::default(),
        }
    }
}

// =============================================================================
// Client Address
// =============================================================================

/// Addresses a request may be attributed to.
///
/// `peer` comes from the connection (`ConnectInfo<SocketAddr>`), `forwarded`
/// from `X-Forwarded-For` or `X-Real-IP`. Extraction never fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientAddr {
    pub peer: Option<IpAddr>,
    pub forwarded: Option<IpAddr>,
}

impl ClientAddr {
    fn from_parts(parts: &Parts) -> Self {
        Self {
            peer: parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip()),
            forwarded: forwarded_ip(&parts.headers),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// First address of `X-Forwarded-For`, else `X-Real-IP`.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let first_hop = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    first_hop.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    })
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Reject requests without an authenticated session.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware};
/// use photo_gallery::server::auth::require_session;
///
/// let app = Router::new()
///     .route("/api/images", get(images_handler))
///     .layer(middleware::from_fn_with_state(auth_state, require_session));
/// ```
pub async fn require_session(
    State(auth): State<Arc<AuthState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let state = auth.session_state(&jar).await;
    match auth.gate.authorize(&state) {
        Access::Allow => Ok(next.run(request).await),
        Access::Deny => Err(AuthError::Unauthorized),
    }
}

// =============================================================================
// Tests
// =============================================================================
