//! Authentication integration tests.
//!
//! Tests verify:
//! - Protected routes reject requests without an authenticated session
//! - Correct PIN issues a session cookie that unlocks the catalog
//! - Wrong PIN is rejected and leaves no session behind
//! - Re-authentication is idempotent
//! - Forged cookies, logout, malformed bodies, and attempt throttling

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use photo_gallery::catalog::CatalogBuilder;
use photo_gallery::session::{MemorySessionStore, SessionSigner};
use photo_gallery::{create_router, RouterConfig};

use super::test_utils::{
    authenticate, authenticate_from, body_json, create_test_png, get, jpeg_with_description, post_json,
    session_cookie, session_set_cookie_header, Endian, GalleryDir, MockImageSource, TEST_PIN,
    TEST_SECRET,
};

fn gallery_source() -> MockImageSource {
    MockImageSource::new()
        .with_file("family_dinner.png", create_test_png(4, 4))
        .with_file("lake.jpg", jpeg_with_description("Lake at dusk", Endian::Little))
}

fn protected_config() -> RouterConfig {
    RouterConfig::new(TEST_PIN, TEST_SECRET).with_tracing(false)
}

fn protected_router() -> Router {
    create_router(CatalogBuilder::new(gallery_source()), protected_config())
}

/// Log in and return the session cookie pair.
async fn login(router: &Router) -> String {
    let response = authenticate(router, TEST_PIN, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response).expect("login should set the session cookie")
}

// =============================================================================
// Unauthenticated Access
// =============================================================================

#[tokio::test]
async fn test_listing_requires_session() {
    let router = protected_router();

    let response = get(&router, "/api/images", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "Unauthorized"})
    );
}

#[tokio::test]
async fn test_image_bytes_require_session() {
    let router = protected_router();

    let response = get(&router, "/images/lake.jpg", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let router = protected_router();

    let response = get(&router, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_static_assets_are_public() {
    let public = GalleryDir::new();
    public.add("index.html", b"<!doctype html><title>Gallery</title>");
    let router = create_router(
        CatalogBuilder::new(gallery_source()),
        protected_config().with_public_dir(public.path()),
    );

    let response = get(&router, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Unknown paths fall through to the static service, not the session guard
    let response = get(&router, "/missing.css", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_forged_cookie_rejected() {
    let router = protected_router();
    let id = SessionSigner::generate_id();
    let forged = SessionSigner::new("some-other-secret-value").sign(&id);

    let response = get(
        &router,
        "/api/images",
        Some(&format!("gallery_session={}", forged)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_validly_signed_unknown_session_rejected() {
    let router = protected_router();
    let token = SessionSigner::new(TEST_SECRET).sign(&SessionSigner::generate_id());

    let response = get(
        &router,
        "/api/images",
        Some(&format!("gallery_session={}", token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// PIN Authentication
// =============================================================================

#[tokio::test]
async fn test_correct_pin_unlocks_catalog() {
    let router = protected_router();

    let response = authenticate(&router, TEST_PIN, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = session_set_cookie_header(&response).unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Path=/"));
    assert!(!set_cookie.contains("Secure"));

    let cookie = session_cookie(&response).unwrap();
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"success": true})
    );

    let response = get(&router, "/api/images", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!([
            {"file": "family_dinner.png", "description": "family dinner"},
            {"file": "lake.jpg", "description": "Lake at dusk"},
        ])
    );

    let response = get(&router, "/images/lake.jpg", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/jpeg");
}

#[tokio::test]
async fn test_secure_cookie_flag() {
    let router = create_router(
        CatalogBuilder::new(gallery_source()),
        protected_config().with_cookie_secure(true),
    );

    let response = authenticate(&router, TEST_PIN, None).await;
    let set_cookie = session_set_cookie_header(&response).unwrap();
    assert!(set_cookie.contains("Secure"));
}

#[tokio::test]
async fn test_wrong_pin_rejected() {
    let router = protected_router();

    for pin in ["0000", "246", "24680", "", "abcd"] {
        let response = authenticate(&router, pin, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "pin {:?}", pin);
        assert!(session_cookie(&response).is_none());
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Invalid PIN"})
        );
    }
}

#[tokio::test]
async fn test_wrong_pin_leaves_session_store_empty() {
    let store = Arc::new(MemorySessionStore::default());
    let router = create_router(
        CatalogBuilder::new(gallery_source()),
        protected_config().with_session_store(store.clone()),
    );

    let response = authenticate(&router, "1357", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_missing_pin_field_is_invalid_pin() {
    let router = protected_router();

    let response = post_json(&router, "/api/authenticate", "{}", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid PIN");
}

#[tokio::test]
async fn test_reauthentication_is_idempotent() {
    let router = protected_router();
    let cookie = login(&router).await;

    for _ in 0..3 {
        let response = authenticate(&router, TEST_PIN, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(session_cookie(&response).as_deref(), Some(cookie.as_str()));
    }

    let response = get(&router, "/api/images", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_pin_does_not_revoke_existing_session() {
    let router = protected_router();
    let cookie = login(&router).await;

    let response = authenticate(&router, "9999", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(&router, "/api/images", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_issues_fresh_session_id() {
    let router = protected_router();
    let planted = format!(
        "gallery_session={}",
        SessionSigner::new(TEST_SECRET).sign(&SessionSigner::generate_id())
    );

    let response = authenticate(&router, TEST_PIN, Some(&planted)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let issued = session_cookie(&response).unwrap();
    assert_ne!(issued, planted);

    // The planted ID was never authenticated
    let response = get(&router, "/api/images", Some(&planted)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let router = protected_router();
    let first = login(&router).await;
    let second = login(&router).await;
    assert_ne!(first, second);

    let response = post_json(&router, "/api/logout", "", Some(&first)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&router, "/api/images", Some(&second)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Malformed Requests
// =============================================================================

#[tokio::test]
async fn test_invalid_json_body() {
    let router = protected_router();

    let response = post_json(&router, "/api/authenticate", "{not json", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_missing_content_type() {
    let router = protected_router();
    let request = Request::builder()
        .method("POST")
        .uri("/api/authenticate")
        .body(Body::from(format!(r#"{{"pin":"{}"}}"#, TEST_PIN)))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pin_must_be_string() {
    let router = protected_router();

    let response = post_json(&router, "/api/authenticate", r#"{"pin": 2468}"#, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_ends_session() {
    let router = protected_router();
    let cookie = login(&router).await;

    let response = post_json(&router, "/api/logout", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cleared = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("gallery_session=") && v.contains("Max-Age=0"));
    assert!(cleared, "logout should expire the session cookie");

    // Replaying the old cookie no longer works
    let response = get(&router, "/api/images", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session() {
    let router = protected_router();

    let response = post_json(&router, "/api/logout", "", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"success": true})
    );
}

// =============================================================================
// Attempt Throttling
// =============================================================================

#[tokio::test]
async fn test_attempts_are_throttled() {
    let router = create_router(
        CatalogBuilder::new(gallery_source()),
        protected_config().with_pin_attempts_per_minute(3),
    );

    for _ in 0..3 {
        let response = authenticate(&router, "0000", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = authenticate(&router, TEST_PIN, None).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response
        .headers()
        .get(header::RETRY_AFTER)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "Too many attempts"})
    );
}

#[tokio::test]
async fn test_exhausted_client_does_not_lock_out_others() {
    let router = create_router(
        CatalogBuilder::new(gallery_source()),
        protected_config().with_pin_attempts_per_minute(3),
    );
    let guesser: SocketAddr = "198.51.100.4:51000".parse().unwrap();
    let owner: SocketAddr = "192.0.2.10:52000".parse().unwrap();

    for _ in 0..10 {
        authenticate_from(&router, "0000", guesser, &[]).await;
    }
    let response = authenticate_from(&router, TEST_PIN, guesser, &[]).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = authenticate_from(&router, TEST_PIN, owner, &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).unwrap();
    let response = get(&router, "/api/images", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_header_ignored_unless_trusted() {
    let proxy: SocketAddr = "10.0.0.1:40000".parse().unwrap();

    // Spoofed headers do not buy a fresh quota
    let router = create_router(
        CatalogBuilder::new(gallery_source()),
        protected_config().with_pin_attempts_per_minute(2),
    );
    for client in ["203.0.113.1", "203.0.113.2"] {
        let response =
            authenticate_from(&router, "0000", proxy, &[("x-forwarded-for", client)]).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response =
        authenticate_from(&router, TEST_PIN, proxy, &[("x-forwarded-for", "203.0.113.3")]).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Behind a trusted proxy each forwarded client has its own quota
    let router = create_router(
        CatalogBuilder::new(gallery_source()),
        protected_config()
            .with_pin_attempts_per_minute(2)
            .with_trust_proxy_headers(true),
    );
    for _ in 0..2 {
        authenticate_from(&router, "0000", proxy, &[("x-forwarded-for", "203.0.113.1")]).await;
    }
    let response =
        authenticate_from(&router, TEST_PIN, proxy, &[("x-forwarded-for", "203.0.113.1")]).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let response =
        authenticate_from(&router, TEST_PIN, proxy, &[("x-real-ip", "203.0.113.2")]).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_authenticated_session_bypasses_throttle() {
    let router = create_router(
        CatalogBuilder::new(gallery_source()),
        protected_config().with_pin_attempts_per_minute(1),
    );
    let cookie = login(&router).await;

    // Quota is now spent for fresh attempts
    let response = authenticate(&router, TEST_PIN, None).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = authenticate(&router, TEST_PIN, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_throttle_disabled() {
    let router = create_router(
        CatalogBuilder::new(gallery_source()),
        protected_config().with_pin_attempts_per_minute(0),
    );

    for _ in 0..50 {
        let response = authenticate(&router, "0000", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = authenticate(&router, TEST_PIN, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Auth Disabled
// =============================================================================

#[tokio::test]
async fn test_auth_routes_absent_when_disabled() {
    let router = create_router(
        CatalogBuilder::new(gallery_source()),
        RouterConfig::without_auth().with_tracing(false),
    );

    let response = get(&router, "/api/images", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = authenticate(&router, TEST_PIN, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
