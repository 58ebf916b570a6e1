//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is set below 100ms or above 5 minutes
    /// - `user_agent`, `cache_version` or `manifest_filename` is empty
    /// - `origin` is not an absolute http(s) URL
    /// - a rule path or `fallback_page` does not start with `/`
    /// - a static extension does not start with `.`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(invalid("timeout_ms", "must be at least 100ms"));
            }
            if timeout_ms > 300_000 {
                return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
            }
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }
        if self.manifest_filename.is_empty() {
            return Err(invalid("manifest_filename", "must not be empty"));
        }

        self.origin_url()?;

        for (field, paths) in [("exclude_from_cache", &self.exclude_from_cache), ("dynamic_paths", &self.dynamic_paths)] {
            if let Some(bad) = paths.iter().find(|p| !p.starts_with('/')) {
                return Err(invalid(field, format!("path {bad:?} must start with '/'")));
            }
        }
        if !self.fallback_page.starts_with('/') {
            return Err(invalid("fallback_page", "must start with '/'"));
        }

        if let Some(bad) = self.static_extensions.iter().find(|e| !e.starts_with('.')) {
            return Err(invalid("static_extensions", format!("extension {bad:?} must start with '.'")));
        }

        let overlapping: Vec<&String> = self
            .dynamic_paths
            .iter()
            .filter(|d| self.exclude_from_cache.iter().any(|e| *d == e || d.starts_with(&format!("{e}/"))))
            .collect();
        if !overlapping.is_empty() {
            tracing::warn!(
                ?overlapping,
                "dynamic_paths overlap exclude_from_cache; \
                 exclusion takes precedence"
            );
        }

        Ok(())
    }
}
