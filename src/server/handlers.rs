//! HTTP request handlers.
//!
//! The handlers are thin adapters: they translate axum requests into
//! [`CacheRequest`] views, run them through the cache against the
//! filesystem resolver, and materialize the captured result as an axum
//! response. The TIFF metadata endpoint parses the origin file directly
//! and renders its directory structure as JSON.
//!
//! # Endpoints
//!
//! - `GET/HEAD /images/{*path}` - serve an origin file through the cache
//! - `GET /meta/{*path}` - TIFF directory structure as JSON
//! - `GET /health` - liveness probe
//! - `GET /stats` - cache counters

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::cache::{CacheRequest, CapturedResponse, HttpCache};
use crate::error::TiffError;
use crate::server::resolver::{safe_join, FileResolver};
use crate::tiff::{Directory, Entry, Ifd, TiffReader, Value};

// =============================================================================
// Application State
// =============================================================================

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The response cache
    pub cache: Arc<HttpCache>,

    /// Resolver producing origin responses on cache misses
    pub resolver: Arc<FileResolver>,

    /// Origin directory, used directly by the metadata endpoint
    pub origin_root: PathBuf,
}

impl AppState {
    /// Create state over a cache and an origin directory.
    pub fn new(cache: HttpCache, origin_root: impl Into<PathBuf>) -> Self {
        let origin_root = origin_root.into();
        AppState {
            cache: Arc::new(cache),
            resolver: Arc::new(FileResolver::new(&origin_root)),
            origin_root,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error body returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g. "not_found")
    pub error: String,

    /// Human-readable message
    pub message: String,
}

impl ErrorResponse {
    fn into_response(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }

    fn not_found(message: impl Into<String>) -> Response {
        ErrorResponse {
            error: "not_found".to_string(),
            message: message.into(),
        }
        .into_response(StatusCode::NOT_FOUND)
    }

    fn internal(message: impl Into<String>) -> Response {
        ErrorResponse {
            error: "internal".to_string(),
            message: message.into(),
        }
        .into_response(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Health check body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" when the server is up
    pub status: &'static str,

    /// Crate version
    pub version: &'static str,
}

/// Cache counter body.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub resolves: u64,
    pub memory_entries: usize,
    pub memory_bytes: usize,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Cache counters endpoint.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats().await;
    Json(StatsResponse {
        hits: stats.hits,
        misses: stats.misses,
        resolves: stats.resolves,
        memory_entries: stats.memory_entries,
        memory_bytes: stats.memory_bytes,
    })
}

/// Serve an origin file through the cache.
pub async fn image_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    UrlPath(path): UrlPath<String>,
) -> Response {
    let request = to_cache_request(method, &uri, &headers, &path);

    let mut sink = CapturedResponse::new();
    match state
        .cache
        .do_cached(&request, &mut sink, state.resolver.as_ref())
        .await
    {
        Ok(()) => captured_to_response(sink),
        Err(err) => {
            error!(path = request.path(), error = %err, "cache pipeline failed");
            ErrorResponse::internal("failed to serve resource")
        }
    }
}

/// Parse the origin file's TIFF metadata and render it as JSON.
pub async fn meta_handler(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
) -> Response {
    let Some(file_path) = safe_join(&state.origin_root, &path) else {
        return ErrorResponse::not_found("no such resource");
    };

    let parsed = tokio::task::spawn_blocking(move || -> Result<Directory, TiffError> {
        let file = std::fs::File::open(&file_path)?;
        TiffReader::new(&file).read()
    })
    .await;

    match parsed {
        Ok(Ok(directory)) => Json(directory_to_json(&directory)).into_response(),
        Ok(Err(TiffError::Io(err))) if err.kind() == std::io::ErrorKind::NotFound => {
            ErrorResponse::not_found("no such resource")
        }
        Ok(Err(err)) => {
            warn!(path = %path, error = %err, "not parseable as TIFF");
            ErrorResponse {
                error: "unsupported_media_type".to_string(),
                message: format!("not a TIFF stream: {err}"),
            }
            .into_response(StatusCode::UNSUPPORTED_MEDIA_TYPE)
        }
        Err(join_err) => {
            error!(error = %join_err, "metadata task failed");
            ErrorResponse::internal("metadata parsing failed")
        }
    }
}

// =============================================================================
// Adapters
// =============================================================================

/// Build the transport-independent request view from axum parts.
fn to_cache_request(method: Method, uri: &Uri, headers: &HeaderMap, path: &str) -> CacheRequest {
    let mut request =
        CacheRequest::new(method, format!("/{path}")).with_headers(headers.clone());

    if let Some(query) = uri.query() {
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            request = request.with_parameter(name.into_owned(), value.into_owned());
        }
    }

    if let Some(host) = headers.get(http::header::HOST).and_then(|v| v.to_str().ok()) {
        let (name, port) = match host.rsplit_once(':') {
            Some((name, port)) => (name.to_string(), port.parse().unwrap_or(80)),
            None => (host.to_string(), 80),
        };
        request = request.with_server(name, port);
    }

    request
}

/// Materialize a captured response as an axum response.
fn captured_to_response(captured: CapturedResponse) -> Response {
    let (status, headers, body) = captured.into_parts();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

// =============================================================================
// Metadata rendering
// =============================================================================

/// Render a parsed directory as JSON.
pub fn directory_to_json(directory: &Directory) -> serde_json::Value {
    serde_json::json!({
        "ifds": directory.ifds().iter().map(ifd_to_json).collect::<Vec<_>>(),
    })
}

fn ifd_to_json(ifd: &Ifd) -> serde_json::Value {
    serde_json::json!({
        "entries": ifd.iter().map(entry_to_json).collect::<Vec<_>>(),
    })
}

fn entry_to_json(entry: &Entry) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    object.insert("tag".to_string(), entry.tag().into());
    if let Some(name) = entry.name() {
        object.insert("name".to_string(), name.into());
    }
    object.insert(
        "type".to_string(),
        format!("{:?}", entry.tiff_type()).into(),
    );
    object.insert("count".to_string(), entry.count().into());
    object.insert("value".to_string(), value_to_json(entry.value()));
    serde_json::Value::Object(object)
}

fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::json;
    match value {
        Value::Byte(v) => json!(v),
        Value::ByteList(v) => json!(v),
        Value::Ascii(strings) => {
            if strings.len() == 1 {
                json!(strings[0])
            } else {
                json!(strings)
            }
        }
        Value::Short(v) => json!(v),
        Value::ShortList(v) => json!(v),
        Value::Long(v) => json!(v),
        Value::LongList(v) => json!(v),
        Value::Rational(r) => json!(r.to_string()),
        Value::RationalList(list) => {
            json!(list.iter().map(|r| r.to_string()).collect::<Vec<_>>())
        }
        Value::SByte(v) => json!(v),
        Value::SByteList(v) => json!(v),
        Value::Undefined(v) => json!(v),
        Value::UndefinedList(v) => json!(v),
        Value::SShort(v) => json!(v),
        Value::SShortList(v) => json!(v),
        Value::SLong(v) => json!(v),
        Value::SLongList(v) => json!(v),
        Value::SRational(r) => json!(r.to_string()),
        Value::SRationalList(list) => {
            json!(list.iter().map(|r| r.to_string()).collect::<Vec<_>>())
        }
        Value::Float(v) => json!(v),
        Value::FloatList(v) => json!(v),
        Value::Double(v) => json!(v),
        Value::DoubleList(v) => json!(v),
        Value::Long8(v) => json!(v),
        Value::Long8List(v) => json!(v),
        Value::SLong8(v) => json!(v),
        Value::SLong8List(v) => json!(v),
        Value::Directory(ifd) => ifd_to_json(ifd),
        Value::DirectoryList(ifds) => json!(ifds.iter().map(ifd_to_json).collect::<Vec<_>>()),
        Value::Unknown {
            type_code,
            count,
            offset,
        } => json!({ "unknown": { "type": type_code, "count": count, "offset": offset } }),
        Value::Unreadable {
            type_code,
            count,
            offset,
        } => json!({ "unreadable": { "type": type_code, "count": count, "offset": offset } }),
    }
}

// =============================================================================
// Tests
// =============================================================================
