//! Cache protocol integration tests.
//!
//! Drives the full miss/hit/conditional flow against a real disk tier and
//! the filesystem resolver.

use std::time::Duration;

use http::header::{HeaderValue, IF_MODIFIED_SINCE, LAST_MODIFIED};
use http::{Method, StatusCode};

use tiffserve::cache::{CacheRequest, CapturedResponse, HttpCache, HttpCacheConfig};
use tiffserve::server::FileResolver;

use super::test_utils::CountingResolver;

fn get(path: &str) -> CacheRequest {
    CacheRequest::new(Method::GET, path)
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[tokio::test]
async fn test_miss_hit_conditional_scenario() {
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = HttpCache::new(HttpCacheConfig::new(cache_dir.path()))
        .await
        .unwrap();
    let resolver = CountingResolver::new(&b"jpeg body"[..], "image/jpeg");

    // First request resolves and caches
    let mut first = CapturedResponse::new();
    cache
        .do_cached(&get("/img.jpg"), &mut first, &resolver)
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.body(), b"jpeg body");
    assert_eq!(resolver.calls(), 1);

    // Second identical request is served from cache, byte for byte
    let mut second = CapturedResponse::new();
    cache
        .do_cached(&get("/img.jpg"), &mut second, &resolver)
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.body(), first.body());
    assert_eq!(resolver.calls(), 1);

    // Third request, conditional on the cached time, gets 304 and no body
    let last_modified = second
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    let conditional = get("/img.jpg").with_header(
        IF_MODIFIED_SINCE,
        HeaderValue::from_str(&last_modified).unwrap(),
    );
    let mut third = CapturedResponse::new();
    cache
        .do_cached(&conditional, &mut third, &resolver)
        .await
        .unwrap();
    assert_eq!(third.status(), StatusCode::NOT_MODIFIED);
    assert!(third.body().is_empty());
    assert_eq!(resolver.calls(), 1);
}

// =============================================================================
// Filesystem resolver through the cache
// =============================================================================

#[tokio::test]
async fn test_file_resolver_through_cache() {
    let origin = tempfile::tempdir().unwrap();
    tokio::fs::write(origin.path().join("photo.jpg"), b"original bytes")
        .await
        .unwrap();

    let cache_dir = tempfile::tempdir().unwrap();
    let cache = HttpCache::new(
        HttpCacheConfig::new(cache_dir.path()).with_origin_root(origin.path()),
    )
    .await
    .unwrap();
    let resolver = FileResolver::new(origin.path());

    let mut sink = CapturedResponse::new();
    cache
        .do_cached(&get("/photo.jpg"), &mut sink, &resolver)
        .await
        .unwrap();
    assert_eq!(sink.status(), StatusCode::OK);
    assert_eq!(sink.body(), b"original bytes");

    // Deleting the origin file does not matter: the variant is cached
    tokio::fs::remove_file(origin.path().join("photo.jpg"))
        .await
        .unwrap();
    let mut sink = CapturedResponse::new();
    cache
        .do_cached(&get("/photo.jpg"), &mut sink, &resolver)
        .await
        .unwrap();
    assert_eq!(sink.status(), StatusCode::OK);
    assert_eq!(sink.body(), b"original bytes");
}

#[tokio::test]
async fn test_modified_origin_forces_staleness() {
    let origin = tempfile::tempdir().unwrap();
    tokio::fs::write(origin.path().join("photo.jpg"), b"version one")
        .await
        .unwrap();

    let cache_dir = tempfile::tempdir().unwrap();
    let cache = HttpCache::new(
        HttpCacheConfig::new(cache_dir.path()).with_origin_root(origin.path()),
    )
    .await
    .unwrap();
    let resolver = FileResolver::new(origin.path());

    let mut sink = CapturedResponse::new();
    cache
        .do_cached(&get("/photo.jpg"), &mut sink, &resolver)
        .await
        .unwrap();
    assert_eq!(sink.body(), b"version one");

    // Rewrite the origin with a newer mtime (sleep past coarse mtime
    // granularity first)
    tokio::time::sleep(Duration::from_millis(1100)).await;
    tokio::fs::write(origin.path().join("photo.jpg"), b"version two")
        .await
        .unwrap();

    let mut sink = CapturedResponse::new();
    cache
        .do_cached(&get("/photo.jpg"), &mut sink, &resolver)
        .await
        .unwrap();
    assert_eq!(sink.body(), b"version two");
}

#[tokio::test]
async fn test_missing_file_served_without_caching() {
    let origin = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = HttpCache::new(HttpCacheConfig::new(cache_dir.path()))
        .await
        .unwrap();
    let resolver = FileResolver::new(origin.path());

    let mut sink = CapturedResponse::new();
    cache
        .do_cached(&get("/absent.jpg"), &mut sink, &resolver)
        .await
        .unwrap();
    assert_eq!(sink.status(), StatusCode::NOT_FOUND);

    // Create the file; because the 404 was never cached, the next request
    // sees it
    tokio::fs::write(origin.path().join("absent.jpg"), b"now exists")
        .await
        .unwrap();
    let mut sink = CapturedResponse::new();
    cache
        .do_cached(&get("/absent.jpg"), &mut sink, &resolver)
        .await
        .unwrap();
    assert_eq!(sink.status(), StatusCode::OK);
    assert_eq!(sink.body(), b"now exists");
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_cache_survives_restart_ephemeral_does_not() {
    let cache_dir = tempfile::tempdir().unwrap();
    let resolver = CountingResolver::new(&b"payload"[..], "image/png");

    {
        let cache = HttpCache::new(HttpCacheConfig::new(cache_dir.path()))
            .await
            .unwrap();
        let mut sink = CapturedResponse::new();
        cache.do_cached(&get("/a.png"), &mut sink, &resolver).await.unwrap();
        assert_eq!(resolver.calls(), 1);
    }

    // Persistent reopen: served from disk
    {
        let cache = HttpCache::new(HttpCacheConfig::new(cache_dir.path()))
            .await
            .unwrap();
        let mut sink = CapturedResponse::new();
        cache.do_cached(&get("/a.png"), &mut sink, &resolver).await.unwrap();
        assert_eq!(resolver.calls(), 1);
    }

    // Ephemeral reopen: wiped, so the resolver runs again
    {
        let cache = HttpCache::new(HttpCacheConfig::new(cache_dir.path()).ephemeral(true))
            .await
            .unwrap();
        let mut sink = CapturedResponse::new();
        cache.do_cached(&get("/a.png"), &mut sink, &resolver).await.unwrap();
        assert_eq!(resolver.calls(), 2);
    }
}
