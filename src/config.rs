//! Configuration management.
//!
//! Configuration comes from command-line arguments via clap, with
//! environment variable fallbacks under the `TIFFSERVE_` prefix and
//! sensible defaults for everything except the origin directory.
//!
//! # Environment Variables
//!
//! - `TIFFSERVE_HOST` - bind address (default: 0.0.0.0)
//! - `TIFFSERVE_PORT` - port (default: 3000)
//! - `TIFFSERVE_ORIGIN` - directory of source images (required)
//! - `TIFFSERVE_CACHE_DIR` - disk cache directory (default: ./cache)
//! - `TIFFSERVE_CACHE_MEMORY` - memory tier byte budget
//! - `TIFFSERVE_TTL` - default freshness window in seconds (default: 3600)
//! - `TIFFSERVE_EPHEMERAL` - wipe the disk cache on startup
//! - `TIFFSERVE_CORS_ORIGINS` - comma separated allowed origins

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::cache::{HttpCacheConfig, DEFAULT_MEMORY_CAPACITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default disk cache directory.
pub const DEFAULT_CACHE_DIR: &str = "./cache";

/// Default freshness window in seconds (1 hour).
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// tiffserve - a caching image delivery server with TIFF metadata
/// inspection.
///
/// Serves images from a local directory through a two-tier (memory + disk)
/// HTTP response cache, and exposes the TIFF/BigTIFF directory structure of
/// served files as JSON.
#[derive(Parser, Debug, Clone)]
#[command(name = "tiffserve")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TIFFSERVE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TIFFSERVE_PORT")]
    pub port: u16,

    // =========================================================================
    // Origin Configuration
    // =========================================================================
    /// Directory containing the source images.
    #[arg(long, env = "TIFFSERVE_ORIGIN")]
    pub origin: PathBuf,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Disk cache directory.
    #[arg(long, default_value = DEFAULT_CACHE_DIR, env = "TIFFSERVE_CACHE_DIR")]
    pub cache_dir: PathBuf,

    /// Memory tier byte budget.
    #[arg(long, default_value_t = DEFAULT_MEMORY_CAPACITY, env = "TIFFSERVE_CACHE_MEMORY")]
    pub cache_memory: usize,

    /// Default freshness window in seconds for responses without expiry
    /// metadata.
    #[arg(long, default_value_t = DEFAULT_TTL_SECONDS, env = "TIFFSERVE_TTL")]
    pub ttl: u64,

    /// Wipe the disk cache on startup instead of reusing it.
    #[arg(long, default_value_t = false, env = "TIFFSERVE_EPHEMERAL")]
    pub ephemeral: bool,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated). Any origin when omitted.
    #[arg(long, env = "TIFFSERVE_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration, returning a message for the first
    /// problem found.
    pub fn validate(&self) -> Result<(), String> {
        if !self.origin.is_dir() {
            return Err(format!(
                "origin directory '{}' does not exist. Set --origin or TIFFSERVE_ORIGIN",
                self.origin.display()
            ));
        }
        if self.cache_memory == 0 {
            return Err("cache_memory must be greater than 0".to_string());
        }
        if self.ttl == 0 {
            return Err("ttl must be greater than 0".to_string());
        }
        Ok(())
    }

    /// The bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Derive the cache configuration.
    pub fn cache_config(&self) -> HttpCacheConfig {
        HttpCacheConfig::new(&self.cache_dir)
            .with_memory_capacity(self.cache_memory)
            .with_default_ttl(Duration::from_secs(self.ttl))
            .with_origin_root(&self.origin)
            .ephemeral(self.ephemeral)
    }
}

// =============================================================================
// Tests
// =============================================================================
