//! Application configuration loaded from environment variables.

use std::num::NonZeroUsize;

use common::StatusId;
use domain::StatusPolicy;

const DEFAULT_PAGE_SIZE: usize = 20;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset runs the in-memory demo store
/// - `DEFAULT_PAGE_SIZE`: customers per page when a request gives none (default: `20`)
/// - `FIRST_FORBIDDEN_STATUS`: lowest status id that cannot be set by hand (default: `4`)
///
/// Unparseable numbers fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub default_page_size: NonZeroUsize,
    pub first_forbidden_status: StatusId,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            default_page_size: lookup("DEFAULT_PAGE_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_page_size),
            first_forbidden_status: lookup("FIRST_FORBIDDEN_STATUS")
                .and_then(|s| s.parse::<i32>().ok())
                .map(StatusId::new)
                .unwrap_or(defaults.first_forbidden_status),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn status_policy(&self) -> StatusPolicy {
        StatusPolicy::new(self.first_forbidden_status)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            default_page_size: NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN),
            first_forbidden_status: StatusId::new(StatusPolicy::DEFAULT_FIRST_FORBIDDEN),
        }
    }
}
