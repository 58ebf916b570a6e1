//! Request classification.
//!
//! Rules are evaluated in strict priority order:
//!
//! 1. Non-GET requests are never cached.
//! 2. `exclude_from_cache` (exact path or any sub-path) carries per-user data.
//! 3. `dynamic_paths` (exact path) are network-first with cache fallback.
//! 4. Static extensions, CDN hosts and the web manifest are cache-first.
//! 5. Everything else is unclassified.

use serde::Serialize;
use url::Url;

use crate::config::AppConfig;

/// Outcome of classifying a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Never cached; network only.
    UserData,
    /// Network first, dynamic partition as fallback.
    DynamicCacheable,
    /// Cache first, stored opportunistically on miss.
    StaticAsset,
    /// Cache first, passed through on miss.
    Unclassified,
}

/// Declarative rule set consumed by [`ClassificationRules::classify`].
#[derive(Debug, Clone, Default)]
pub struct ClassificationRules {
    pub exclude_from_cache: Vec<String>,
    pub dynamic_paths: Vec<String>,
    /// Lower-case extensions including the leading dot.
    pub static_extensions: Vec<String>,
    pub cdn_hosts: Vec<String>,
    pub manifest_filename: String,
}

impl ClassificationRules {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            exclude_from_cache: config.exclude_from_cache.clone(),
            dynamic_paths: config.dynamic_paths.clone(),
            static_extensions: config.static_extensions.iter().map(|e| e.to_lowercase()).collect(),
            cdn_hosts: config.cdn_hosts.iter().map(|h| h.to_lowercase()).collect(),
            manifest_filename: config.manifest_filename.clone(),
        }
    }

    pub fn classify(&self, method: &str, url: &Url) -> Classification {
        if !method.eq_ignore_ascii_case("GET") {
            return Classification::UserData;
        }

        let path = url.path();

        if self.is_excluded(path) {
            return Classification::UserData;
        }

        if self.dynamic_paths.iter().any(|p| p == path) {
            return Classification::DynamicCacheable;
        }

        if self.is_static(url) {
            return Classification::StaticAsset;
        }

        Classification::Unclassified
    }

    /// Whether a response to this request may be stored opportunistically.
    ///
    /// This is the allow-list half of the rules only: GET plus extension,
    /// CDN host or manifest match.
    pub fn is_cacheable_resource(&self, method: &str, url: &Url) -> bool {
        method.eq_ignore_ascii_case("GET") && self.is_static(url)
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclude_from_cache.iter().any(|p| {
            path == p
                || path
                    .strip_prefix(p.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    fn is_static(&self, url: &Url) -> bool {
        let path = url.path().to_lowercase();

        if self.static_extensions.iter().any(|ext| path.ends_with(ext.as_str())) {
            return true;
        }

        if let Some(host) = url.host_str()
            && self.cdn_hosts.iter().any(|h| h == host)
        {
            return true;
        }

        !self.manifest_filename.is_empty() && path.ends_with(&format!("/{}", self.manifest_filename.to_lowercase()))
    }
}
