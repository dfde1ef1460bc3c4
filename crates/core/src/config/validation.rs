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

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent`, `cache_prefix` or `cache_version` is empty
    /// - `origin` is not an absolute http(s) URL
    /// - a fallback path is not absolute
    /// - a TTL is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        for (field, value) in [
            ("user_agent", &self.user_agent),
            ("cache_prefix", &self.cache_prefix),
            ("cache_version", &self.cache_version),
        ] {
            if value.is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }

        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", "scheme must be http or https"));
        }

        for path in self
            .fallback_pages
            .iter()
            .chain([&self.offline_page, &self.fallback_icon, &self.dashboard_url, &self.script_url])
        {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field: "fallback_pages".into(),
                    reason: format!("'{path}' must be an absolute path"),
                });
            }
        }

        let ttl = &self.ttl;
        if [ttl.static_secs, ttl.api_secs, ttl.page_secs, ttl.image_secs].contains(&0) {
            return Err(invalid("ttl", "every class TTL must be greater than 0"));
        }

        if self.precache.is_empty() {
            tracing::warn!("precache manifest is empty; install will cache nothing");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TtlConfig;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 100, max_bytes: 1, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_version() {
        let config = AppConfig { cache_version: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_version"));
    }

    #[test]
    fn test_validate_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));

        let config = AppConfig { origin: "ftp://files.example.com".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_relative_fallback() {
        let config = AppConfig { offline_page: "offline.html".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "fallback_pages"));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = AppConfig { ttl: TtlConfig { api_secs: 0, ..Default::default() }, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "ttl"));
    }
}
