//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `SWCACHE_TTL__API_SECS=60`. List values use figment's bracket syntax,
//! e.g. `SWCACHE_TRUSTED_HOSTS=[cdn.example.com, fonts.example.com]`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Which [`crate::CacheStorage`] backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Per-class time-to-live, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlConfig {
    #[serde(default = "default_static_secs")]
    pub static_secs: u64,
    #[serde(default = "default_api_secs")]
    pub api_secs: u64,
    #[serde(default = "default_page_secs")]
    pub page_secs: u64,
    #[serde(default = "default_image_secs")]
    pub image_secs: u64,
}

fn default_static_secs() -> u64 {
    30 * 24 * 60 * 60
}

fn default_api_secs() -> u64 {
    5 * 60
}

fn default_page_secs() -> u64 {
    24 * 60 * 60
}

fn default_image_secs() -> u64 {
    7 * 24 * 60 * 60
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            static_secs: default_static_secs(),
            api_secs: default_api_secs(),
            page_secs: default_page_secs(),
            image_secs: default_image_secs(),
        }
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Storage backend: `sqlite` (default) or `memory`.
    #[serde(default)]
    pub storage: StorageBackend,

    /// Origin of the application whose traffic is intercepted.
    ///
    /// Relative manifest entries and fallback paths resolve against it.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Store name prefix, the `fakturownia` in `fakturownia-static-v1.2.0`.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Store name version. Bumping it makes every older store stale.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Human-readable application name used in notifications and the
    /// generated offline page.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to read per response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Cross-origin hosts whose requests are still intercepted.
    #[serde(default = "default_trusted_hosts")]
    pub trusted_hosts: Vec<String>,

    /// Substrings marking a URL as a static asset.
    #[serde(default = "default_static_markers")]
    pub static_markers: Vec<String>,

    /// Substrings marking a URL as an API call.
    #[serde(default = "default_api_markers")]
    pub api_markers: Vec<String>,

    /// URLs fetched into the static store during install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Landing pages tried, in order, when a page request fails offline.
    #[serde(default = "default_fallback_pages")]
    pub fallback_pages: Vec<String>,

    /// Dedicated offline document served when no page fallback is cached.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Cached icon served when an icon or image cannot be loaded.
    #[serde(default = "default_fallback_icon")]
    pub fallback_icon: String,

    /// Page opened when a notification is tapped.
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,

    /// Worker script re-fetched by update checks.
    #[serde(default = "default_script_url")]
    pub script_url: String,

    /// Per-class time-to-live.
    #[serde(default)]
    pub ttl: TtlConfig,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8000".into()
}

fn default_cache_prefix() -> String {
    "fakturownia".into()
}

fn default_cache_version() -> String {
    "1.2.0".into()
}

fn default_app_name() -> String {
    "Fakturownia".into()
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn default_trusted_hosts() -> Vec<String> {
    strings(&["cdnjs.cloudflare.com", "fonts.googleapis.com", "fonts.gstatic.com", "cdn.jsdelivr.net"])
}

fn default_static_markers() -> Vec<String> {
    strings(&["/static/", "cdnjs.cloudflare.com", "fonts.googleapis.com", "fonts.gstatic.com"])
}

fn default_api_markers() -> Vec<String> {
    strings(&["/admin/ksiegowosc/", "/api/", "/pwa/api/", "/admin/jsi18n/", "/autocomplete/"])
}

fn default_precache() -> Vec<String> {
    strings(&[
        "/",
        "/auth/login/",
        "/admin/",
        "/admin/ksiegowosc/monthlysettlement/dashboard/",
        "/offline.html",
        "/static/jazzmin/css/adminlte.min.css",
        "/static/jazzmin/js/adminlte.min.js",
        "/static/admin/js/vendor/jquery/jquery.js",
        "/static/pwa/icons/icon-192x192.png",
        "/static/pwa/icons/icon-512x512.png",
        "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/all.min.css",
    ])
}

fn default_fallback_pages() -> Vec<String> {
    strings(&["/admin/ksiegowosc/monthlysettlement/dashboard/", "/admin/", "/"])
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_fallback_icon() -> String {
    "/static/pwa/icons/icon-192x192.png".into()
}

fn default_dashboard_url() -> String {
    "/admin/ksiegowosc/monthlysettlement/dashboard/".into()
}

fn default_script_url() -> String {
    "/sw.js".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            storage: StorageBackend::default(),
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            app_name: default_app_name(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            trusted_hosts: default_trusted_hosts(),
            static_markers: default_static_markers(),
            api_markers: default_api_markers(),
            precache: default_precache(),
            fallback_pages: default_fallback_pages(),
            offline_page: default_offline_page(),
            fallback_icon: default_fallback_icon(),
            dashboard_url: default_dashboard_url(),
            script_url: default_script_url(),
            ttl: TtlConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The configured origin, parsed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not an absolute URL.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWCACHE_`
    /// 2. TOML file from `SWCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("SWCACHE_CONFIG_FILE").ok().map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    /// Like [`AppConfig::load`], with an explicit TOML file in place of
    /// `SWCACHE_CONFIG_FILE`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_path) = config_path {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
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
        assert_eq!(config.db_path, PathBuf::from("./swcache.sqlite"));
        assert_eq!(config.storage, StorageBackend::Sqlite);
        assert_eq!(config.cache_prefix, "fakturownia");
        assert_eq!(config.cache_version, "1.2.0");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.trusted_hosts.len(), 4);
        assert_eq!(config.fallback_pages, vec!["/admin/ksiegowosc/monthlysettlement/dashboard/", "/admin/", "/"]);
        assert_eq!(config.offline_page, "/offline.html");
        assert!(config.precache.contains(&"/offline.html".to_string()));
    }

    #[test]
    fn test_default_ttls() {
        let ttl = TtlConfig::default();
        assert_eq!(ttl.static_secs, 2_592_000);
        assert_eq!(ttl.api_secs, 300);
        assert_eq!(ttl.page_secs, 86_400);
        assert_eq!(ttl.image_secs, 604_800);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_origin_url() {
        let config = AppConfig::default();
        let origin = config.origin_url().unwrap();
        assert_eq!(origin.host_str(), Some("localhost"));
        assert_eq!(origin.port(), Some(8000));
    }

    #[test]
    fn test_load_layers_env_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "swcache.toml",
                r#"
                cache_version = "2.0.0"
                storage = "memory"

                [ttl]
                api_secs = 60
                "#,
            )?;
            jail.set_env("SWCACHE_CONFIG_FILE", "swcache.toml");
            jail.set_env("SWCACHE_ORIGIN", "https://ksiegowosc.example.com");
            jail.set_env("SWCACHE_TTL__IMAGE_SECS", "10");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.cache_version, "2.0.0");
            assert_eq!(config.storage, StorageBackend::Memory);
            assert_eq!(config.origin, "https://ksiegowosc.example.com");
            assert_eq!(config.ttl.api_secs, 60);
            assert_eq!(config.ttl.image_secs, 10);
            assert_eq!(config.ttl.static_secs, 2_592_000);
            Ok(())
        });
    }

    #[test]
    fn test_load_from_explicit_file_and_validate() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("good.toml", r#"cache_prefix = "ksiegowosc""#)?;
            jail.create_file("bad.toml", "timeout_ms = 5")?;

            let config = AppConfig::load_from(Some(Path::new("good.toml"))).expect("config loads");
            assert_eq!(config.cache_prefix, "ksiegowosc");

            let err = AppConfig::load_from(Some(Path::new("bad.toml"))).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }));
            Ok(())
        });
    }
}
