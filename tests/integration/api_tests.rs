//! API integration tests for listing, image serving, and error handling.
//!
//! These run with authentication disabled; the session flow is covered in
//! `auth_tests`.

use axum::http::StatusCode;
use axum::Router;

use photo_gallery::catalog::CatalogBuilder;
use photo_gallery::source::{FsImageSource, ImageSource};
use photo_gallery::{create_router, ListingMode, RouterConfig};

use super::test_utils::{
    body_bytes, body_json, create_test_jpeg, create_test_png, get, jpeg_with_description, Endian,
    GalleryDir, MockImageSource,
};

fn open_router<S: ImageSource + 'static>(source: S) -> Router {
    create_router(
        CatalogBuilder::new(source),
        RouterConfig::without_auth().with_tracing(false),
    )
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let router = open_router(MockImageSource::new());

    let response = get(&router, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_listing_described() {
    let source = MockImageSource::new()
        .with_file("zebra_crossing.png", create_test_png(4, 4))
        .with_file("IMG_0001.JPG", jpeg_with_description("Grandma's garden", Endian::Little))
        .with_file("notes.txt", b"not an image".to_vec())
        .with_file("plain-shot.jpeg", create_test_jpeg(8, 8));
    let router = open_router(source);

    let response = get(&router, "/api/images", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let json = body_json(response).await;
    assert_eq!(
        json,
        serde_json::json!([
            {"file": "zebra_crossing.png", "description": "zebra crossing"},
            {"file": "IMG_0001.JPG", "description": "Grandma's garden"},
            {"file": "plain-shot.jpeg", "description": "plain shot"},
        ])
    );
}

#[tokio::test]
async fn test_listing_only_reads_jpegs() {
    let source = MockImageSource::new()
        .with_file("a.png", create_test_png(2, 2))
        .with_file("b.gif", b"GIF89a".to_vec())
        .with_file("c.webp", b"RIFF".to_vec())
        .with_file("d.jpg", create_test_jpeg(4, 4));
    let reads = source.read_counter();
    let router = open_router(source);

    let response = get(&router, "/api/images", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_listing_names_mode() {
    let source = MockImageSource::new()
        .with_file("b.jpg", create_test_jpeg(4, 4))
        .with_file("readme.md", b"# hi".to_vec())
        .with_file("a.png", create_test_png(2, 2));
    let reads = source.read_counter();
    let router = create_router(
        CatalogBuilder::new(source),
        RouterConfig::without_auth()
            .with_listing(ListingMode::Names)
            .with_tracing(false),
    );

    let response = get(&router, "/api/images", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!(["b.jpg", "a.png"]));
    assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_listing_empty_folder() {
    let router = open_router(MockImageSource::new());

    let response = get(&router, "/api/images", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_listing_directory_failure() {
    let router = open_router(MockImageSource::failing());

    let response = get(&router, "/api/images", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "Could not read images folder."})
    );
}

#[tokio::test]
async fn test_listing_unreadable_file_falls_back() {
    let source = MockImageSource::new().with_unreadable("lost_in-transit.jpg");
    let router = open_router(source);

    let response = get(&router, "/api/images", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!([{"file": "lost_in-transit.jpg", "description": "lost in transit"}])
    );
}

#[tokio::test]
async fn test_listing_real_directory() {
    let gallery = GalleryDir::new();
    gallery.add("Beach_Day.PNG", &create_test_png(4, 4));
    gallery.add("captioned.jpg", &jpeg_with_description("Sunrise at camp", Endian::Big));
    gallery.add(".jpg", &create_test_jpeg(4, 4));
    gallery.add("archive.zip", b"PK");
    gallery.add_dir("nested.jpg");

    let router = open_router(FsImageSource::new(gallery.path()));
    let response = get(&router, "/api/images", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let mut records: Vec<(String, String)> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            (
                r["file"].as_str().unwrap().to_string(),
                r["description"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    // Directory enumeration order is platform-defined
    records.sort();

    assert_eq!(
        records,
        vec![
            ("Beach_Day.PNG".to_string(), "Beach Day".to_string()),
            ("captioned.jpg".to_string(), "Sunrise at camp".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_listing_missing_directory() {
    let gallery = GalleryDir::new();
    let router = open_router(FsImageSource::new(gallery.path().join("gone")));

    let response = get(&router, "/api/images", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "Could not read images folder."
    );
}

// =============================================================================
// Image Bytes
// =============================================================================

#[tokio::test]
async fn test_image_served_with_headers() {
    let png = create_test_png(3, 3);
    let router = create_router(
        CatalogBuilder::new(MockImageSource::new().with_file("dot.png", png.clone())),
        RouterConfig::without_auth()
            .with_cache_max_age(120)
            .with_tracing(false),
    );

    let response = get(&router, "/images/dot.png", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "private, max-age=120"
    );
    assert_eq!(body_bytes(response).await.as_ref(), png.as_slice());
}

#[tokio::test]
async fn test_image_content_type_by_extension() {
    let jpeg = create_test_jpeg(4, 4);
    let router = open_router(MockImageSource::new().with_file("UPPER.JPEG", jpeg));

    let response = get(&router, "/images/UPPER.JPEG", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/jpeg");
}

#[tokio::test]
async fn test_image_not_found() {
    let router = open_router(MockImageSource::new());

    let response = get(&router, "/images/missing.jpg", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "Image not found"})
    );
}

#[tokio::test]
async fn test_image_directory_not_found() {
    let gallery = GalleryDir::new();
    gallery.add_dir("folder.jpg");
    let router = open_router(FsImageSource::new(gallery.path()));

    let response = get(&router, "/images/folder.jpg", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "Image not found"})
    );
}

#[tokio::test]
async fn test_image_unsupported_extension_not_served() {
    let source = MockImageSource::new().with_file("secrets.txt", b"password".to_vec());
    let reads = source.read_counter();
    let router = open_router(source);

    let response = get(&router, "/images/secrets.txt", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_image_path_traversal_rejected() {
    let gallery = GalleryDir::new();
    let inner = gallery.add_dir("photos");
    gallery.add("outside.jpg", &create_test_jpeg(4, 4));

    let router = open_router(FsImageSource::new(&inner));

    let response = get(&router, "/images/..%2Foutside.jpg", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&router, "/images/..%5Coutside.jpg", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Static Assets
// =============================================================================

#[tokio::test]
async fn test_static_assets_served() {
    let public = GalleryDir::new();
    public.add("index.html", b"<!doctype html><title>Gallery</title>");
    public.add("style.css", b"body { margin: 0 }");

    let router = create_router(
        CatalogBuilder::new(MockImageSource::new()),
        RouterConfig::without_auth()
            .with_public_dir(public.path())
            .with_tracing(false),
    );

    let response = get(&router, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert!(String::from_utf8_lossy(&body).contains("Gallery"));

    let response = get(&router, "/style.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/css"));

    let response = get(&router, "/nope.js", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
