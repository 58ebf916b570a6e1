//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PANTRY_*)
//! 2. TOML config file (if PANTRY_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PANTRY_*)
/// 2. TOML config file (if PANTRY_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via PANTRY_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body size accepted from the network.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Optional request timeout in milliseconds. Unset means the transport default.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Origin of the web client. Relative URLs resolve against it and
    /// responses from it are treated as same-origin.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix of the reported version identifier.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version suffix of both partition names (`static-{v}`, `dynamic-{v}`).
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// URLs primed into the static partition at install.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Paths (and their sub-paths) that carry per-user data and are never cached.
    #[serde(default = "default_exclude_from_cache")]
    pub exclude_from_cache: Vec<String>,

    /// Exact paths served network-first with cache fallback.
    #[serde(default = "default_dynamic_paths")]
    pub dynamic_paths: Vec<String>,

    /// File extensions treated as static assets.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Hostnames whose responses are always static assets.
    #[serde(default = "default_cdn_hosts")]
    pub cdn_hosts: Vec<String>,

    #[serde(default = "default_manifest_filename")]
    pub manifest_filename: String,

    /// Page served to failed navigations when present in the cache.
    #[serde(default = "default_fallback_page")]
    pub fallback_page: String,

    /// Substrings identifying user-scoped partitions for CLEAR_USER_CACHE.
    #[serde(default = "default_user_cache_patterns")]
    pub user_cache_patterns: Vec<String>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./pantry-cache.sqlite")
}

fn default_user_agent() -> String {
    "pantry/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_origin() -> String {
    "http://localhost:5000".into()
}

fn default_cache_prefix() -> String {
    "pantry".into()
}

fn default_cache_version() -> String {
    "multipage-v3".into()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_precache_urls() -> Vec<String> {
    strings(&[
        "/static/style.css",
        "/static/icon-192x192.png",
        "/pwa/manifest.json",
        "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css",
        "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/js/bootstrap.bundle.min.js",
    ])
}

fn default_exclude_from_cache() -> Vec<String> {
    strings(&[
        "/",
        "/refrigerator",
        "/add",
        "/add_ingredient",
        "/delete_ingredient",
        "/change_quantity",
        "/debug",
        "/health",
        "/logout",
    ])
}

fn default_dynamic_paths() -> Vec<String> {
    strings(&["/search"])
}

fn default_static_extensions() -> Vec<String> {
    strings(&[".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".woff", ".woff2", ".ttf"])
}

fn default_cdn_hosts() -> Vec<String> {
    strings(&["cdn.jsdelivr.net", "fonts.googleapis.com"])
}

fn default_manifest_filename() -> String {
    "manifest.json".into()
}

fn default_fallback_page() -> String {
    "/login".into()
}

fn default_user_cache_patterns() -> Vec<String> {
    strings(&["user-", "pantry-v"])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: None,
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            precache_urls: default_precache_urls(),
            exclude_from_cache: default_exclude_from_cache(),
            dynamic_paths: default_dynamic_paths(),
            static_extensions: default_static_extensions(),
            cdn_hosts: default_cdn_hosts(),
            manifest_filename: default_manifest_filename(),
            fallback_page: default_fallback_page(),
            user_cache_patterns: default_user_cache_patterns(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Parsed client origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid { field: "origin".into(), reason: format!("unsupported scheme {scheme}") }),
        }
    }

    /// Identifier reported by GET_VERSION for this configuration.
    pub fn version_id(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.cache_version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PANTRY_`
    /// 2. TOML file from `PANTRY_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PANTRY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PANTRY_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./pantry-cache.sqlite"));
        assert_eq!(config.user_agent, "pantry/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert!(config.timeout_ms.is_none());
        assert_eq!(config.cache_version, "multipage-v3");
        assert_eq!(config.precache_urls.len(), 5);
        assert!(config.exclude_from_cache.contains(&"/".to_string()));
        assert_eq!(config.dynamic_paths, vec!["/search".to_string()]);
        assert_eq!(config.fallback_page, "/login");
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig { timeout_ms: Some(20_000), ..Default::default() };
        assert_eq!(config.timeout(), Some(Duration::from_millis(20_000)));
        assert_eq!(AppConfig::default().timeout(), None);
    }

    #[test]
    fn test_version_id() {
        let config = AppConfig { cache_prefix: "recipes".into(), cache_version: "v9".into(), ..Default::default() };
        assert_eq!(config.version_id(), "recipes-v9");
    }

    #[test]
    fn test_origin_url() {
        let config = AppConfig::default();
        assert_eq!(config.origin_url().unwrap().host_str(), Some("localhost"));

        let config = AppConfig { origin: "ftp://example.com".into(), ..Default::default() };
        assert!(matches!(config.origin_url(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }
}
