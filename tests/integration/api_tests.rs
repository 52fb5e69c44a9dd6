//! HTTP API integration tests.
//!
//! Drives the axum router in-process with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use tiffserve::cache::{HttpCache, HttpCacheConfig};
use tiffserve::server::{create_router, AppState, RouterConfig};
use tiffserve::tiff::TiffWriter;

use super::test_utils::sample_directory;

async fn test_state(origin: &std::path::Path, cache_dir: &std::path::Path) -> AppState {
    let cache = HttpCache::new(HttpCacheConfig::new(cache_dir).with_origin_root(origin))
        .await
        .unwrap();
    AppState::new(cache, origin)
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

// =============================================================================
// Health and stats
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let origin = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let state = test_state(origin.path(), cache_dir.path()).await;
    let router = create_router(state, RouterConfig::new().with_tracing(false));

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_stats_track_hits_and_misses() {
    let origin = tempfile::tempdir().unwrap();
    tokio::fs::write(origin.path().join("a.png"), b"png bytes")
        .await
        .unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let state = test_state(origin.path(), cache_dir.path()).await;
    let router = create_router(state, RouterConfig::new().with_tracing(false));

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/images/a.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["misses"], 1);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["resolves"], 1);
}

// =============================================================================
// Image delivery
// =============================================================================

#[tokio::test]
async fn test_image_round_trip() {
    let origin = tempfile::tempdir().unwrap();
    tokio::fs::write(origin.path().join("photo.jpg"), b"jpeg payload")
        .await
        .unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let state = test_state(origin.path(), cache_dir.path()).await;
    let router = create_router(state, RouterConfig::new().with_tracing(false));

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/images/photo.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );
    assert!(response.headers().get(header::LAST_MODIFIED).is_some());
    assert_eq!(body_bytes(response).await, b"jpeg payload");
}

#[tokio::test]
async fn test_conditional_request_gets_304() {
    let origin = tempfile::tempdir().unwrap();
    tokio::fs::write(origin.path().join("photo.jpg"), b"jpeg payload")
        .await
        .unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let state = test_state(origin.path(), cache_dir.path()).await;
    let router = create_router(state, RouterConfig::new().with_tracing(false));

    let first = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/images/photo.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let last_modified = first
        .headers()
        .get(header::LAST_MODIFIED)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let second = router
        .oneshot(
            Request::builder()
                .uri("/images/photo.jpg")
                .header(header::IF_MODIFIED_SINCE, &last_modified)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert!(body_bytes(second).await.is_empty());
}

#[tokio::test]
async fn test_missing_image_is_404() {
    let origin = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let state = test_state(origin.path(), cache_dir.path()).await;
    let router = create_router(state, RouterConfig::new().with_tracing(false));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/images/nope.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Metadata endpoint
// =============================================================================

#[tokio::test]
async fn test_meta_endpoint_renders_directory() {
    let origin = tempfile::tempdir().unwrap();
    let bytes = TiffWriter::classic().write(&sample_directory()).unwrap();
    tokio::fs::write(origin.path().join("sample.tif"), &bytes)
        .await
        .unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let state = test_state(origin.path(), cache_dir.path()).await;
    let router = create_router(state, RouterConfig::new().with_tracing(false));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/meta/sample.tif")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    let entries = json["ifds"][0]["entries"].as_array().unwrap();
    assert!(!entries.is_empty());
    assert!(entries.iter().any(|e| e["name"] == "ImageWidth"));
}

#[tokio::test]
async fn test_meta_endpoint_rejects_non_tiff() {
    let origin = tempfile::tempdir().unwrap();
    tokio::fs::write(origin.path().join("photo.jpg"), b"not a tiff")
        .await
        .unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let state = test_state(origin.path(), cache_dir.path()).await;
    let router = create_router(state, RouterConfig::new().with_tracing(false));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/meta/photo.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_meta_endpoint_missing_file_is_404() {
    let origin = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let state = test_state(origin.path(), cache_dir.path()).await;
    let router = create_router(state, RouterConfig::new().with_tracing(false));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/meta/absent.tif")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
