//! Client configuration
//!
//! The API base URL is the only externally configurable value.

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "EDUSYNC_API_URL";

/// Development default, matching the backend's local port.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5109/api";

/// Resolve the base URL from the environment, falling back to the
/// development default.
pub fn base_url_from_env() -> String {
    std::env::var(BASE_URL_ENV)
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}
