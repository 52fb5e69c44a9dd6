//! Axum HTTP server over the cache and the TIFF codec.
//!
//! This layer is deliberately thin: transport adapters, a filesystem
//! resolver, and routing. All caching behavior lives in [`crate::cache`];
//! all metadata behavior in [`crate::tiff`].

mod handlers;
mod resolver;
mod routes;

pub use handlers::{
    directory_to_json, health_handler, image_handler, meta_handler, stats_handler, AppState,
    ErrorResponse, HealthResponse, StatsResponse,
};
pub use resolver::FileResolver;
pub use routes::{create_router, RouterConfig};
