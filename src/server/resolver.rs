//! Filesystem origin resolver.
//!
//! Serves files from the configured origin directory. This is the resolver
//! the cache invokes on misses: it reads the backing file, stamps a content
//! type from the extension and a `Last-Modified` from the file mtime, and
//! writes the bytes into the sink. Missing or escaping paths become 404s,
//! which the cache writes through without storing.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use http::header::{HeaderValue, CONTENT_TYPE, LAST_MODIFIED};
use http::StatusCode;
use tracing::warn;

use crate::cache::{format_http_date, CacheRequest, Resolver, ResponseSink};
use crate::error::CacheError;

/// Resolves cache misses from a directory of image files.
pub struct FileResolver {
    root: PathBuf,
}

impl FileResolver {
    /// Create a resolver rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileResolver { root: root.into() }
    }

    /// The origin directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Resolver for FileResolver {
    async fn resolve(
        &self,
        request: &CacheRequest,
        response: &mut dyn ResponseSink,
    ) -> Result<(), CacheError> {
        let Some(path) = safe_join(&self.root, request.path()) else {
            response.set_status(StatusCode::NOT_FOUND);
            return Ok(());
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                response.set_status(StatusCode::NOT_FOUND);
                return Ok(());
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to read origin file");
                response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                return Ok(());
            }
        };

        response.set_status(StatusCode::OK);
        response.set_header(
            CONTENT_TYPE,
            HeaderValue::from_static(content_type_for(&path)),
        );
        if let Ok(modified) = tokio::fs::metadata(&path).await.and_then(|m| m.modified()) {
            let date = format_http_date(modified.into());
            if let Ok(value) = HeaderValue::from_str(&date) {
                response.set_header(LAST_MODIFIED, value);
            }
        }
        response.write(&bytes);
        Ok(())
    }
}

/// Join a request path onto a root, refusing anything that could escape it.
pub(crate) fn safe_join(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    for component in relative.components() {
        match component {
            Component::Normal(_) => {}
            _ => return None,
        }
    }
    Some(root.join(relative))
}

/// Content type guessed from the file extension.
fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("tif" | "tiff") => "image/tiff",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("html") => "text/html",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CapturedResponse;
    use http::Method;

    #[tokio::test]
    async fn test_resolves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("photo.jpg"), b"jpeg data")
            .await
            .unwrap();

        let resolver = FileResolver::new(dir.path());
        let request = CacheRequest::new(Method::GET, "/photo.jpg");
        let mut sink = CapturedResponse::new();
        resolver.resolve(&request, &mut sink).await.unwrap();

        assert_eq!(sink.status(), StatusCode::OK);
        assert_eq!(sink.headers().get(CONTENT_TYPE).unwrap(), "image/jpeg");
        assert!(sink.headers().get(LAST_MODIFIED).is_some());
        assert_eq!(sink.body(), b"jpeg data");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FileResolver::new(dir.path());
        let request = CacheRequest::new(Method::GET, "/absent.png");
        let mut sink = CapturedResponse::new();
        resolver.resolve(&request, &mut sink).await.unwrap();
        assert_eq!(sink.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FileResolver::new(dir.path());
        let request = CacheRequest::new(Method::GET, "/../secret.txt");
        let mut sink = CapturedResponse::new();
        resolver.resolve(&request, &mut sink).await.unwrap();
        assert_eq!(sink.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_safe_join() {
        let root = Path::new("/srv/images");
        assert_eq!(
            safe_join(root, "/a/b.jpg"),
            Some(PathBuf::from("/srv/images/a/b.jpg"))
        );
        assert_eq!(safe_join(root, "/../etc/passwd"), None);
        assert_eq!(safe_join(root, "/a/../../b"), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.tiff")), "image/tiff");
        assert_eq!(content_type_for(Path::new("a.unknown")), "application/octet-stream");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }
}
