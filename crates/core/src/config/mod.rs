//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The store name is expected to change with every release of the site: a new
//! name re-caches the manifest on install and evicts the previous store on
//! activate.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Versioned cache store name, e.g. `portfolio-v1.0`.
    ///
    /// Set via SWCACHE_STORE_NAME environment variable.
    #[serde(default = "default_store_name")]
    pub store_name: String,

    /// Origin of the site the worker controls.
    ///
    /// Set via SWCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Assets cached eagerly on install, in order.
    ///
    /// Relative entries are resolved against `origin`.
    #[serde(default = "default_manifest_urls")]
    pub manifest_urls: Vec<String>,

    /// Document served for failed navigations.
    #[serde(default = "default_root_document")]
    pub root_document: String,

    /// Whether install takes over immediately instead of waiting for open
    /// pages to close. Pages can still request it with a `SKIP_WAITING` message.
    ///
    /// Set via SWCACHE_SKIP_WAITING environment variable.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// URL schemes that are never intercepted (browser extensions).
    #[serde(default = "default_ignored_schemes")]
    pub ignored_schemes: Vec<String>,

    /// Path to SQLite cache database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SWCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional HTTP request timeout in milliseconds. Unset means no timeout.
    ///
    /// Set via SWCACHE_TIMEOUT_MS environment variable.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Synthetic response for failed sub-resource requests.
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Push notification presentation.
    #[serde(default)]
    pub notification: NotificationConfig,
}

/// Response synthesized when the network is unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_fallback_status")]
    pub status: u16,
    #[serde(default = "default_fallback_status_text")]
    pub status_text: String,
    #[serde(default = "default_fallback_content_type")]
    pub content_type: String,
    #[serde(default = "default_fallback_body")]
    pub body: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            status: default_fallback_status(),
            status_text: default_fallback_status_text(),
            content_type: default_fallback_content_type(),
            body: default_fallback_body(),
        }
    }
}

/// Fixed notification assets and the defaults used for missing push fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_badge")]
    pub badge: String,
    /// Vibration pattern in milliseconds (on, off, on, ...).
    #[serde(default = "default_vibrate")]
    pub vibrate: Vec<u32>,
    #[serde(default = "default_title")]
    pub default_title: String,
    #[serde(default = "default_body")]
    pub default_body: String,
    #[serde(default = "default_url")]
    pub default_url: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            icon: default_icon(),
            badge: default_badge(),
            vibrate: default_vibrate(),
            default_title: default_title(),
            default_body: default_body(),
            default_url: default_url(),
        }
    }
}

fn default_store_name() -> String {
    "portfolio-v1.0".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_manifest_urls() -> Vec<String> {
    vec!["/".into(), "/index.html".into()]
}

fn default_root_document() -> String {
    "/".into()
}

fn default_true() -> bool {
    true
}

fn default_ignored_schemes() -> Vec<String> {
    vec!["chrome-extension".into(), "moz-extension".into(), "safari-web-extension".into()]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_fallback_status() -> u16 {
    503
}

fn default_fallback_status_text() -> String {
    "Service Unavailable".into()
}

fn default_fallback_content_type() -> String {
    "text/plain".into()
}

fn default_fallback_body() -> String {
    "You are offline".into()
}

fn default_icon() -> String {
    "/images/icon-192x192.png".into()
}

fn default_badge() -> String {
    "/images/badge-72x72.png".into()
}

fn default_vibrate() -> Vec<u32> {
    vec![100, 50, 100]
}

fn default_title() -> String {
    "Portfolio Update".into()
}

fn default_body() -> String {
    "New content available!".into()
}

fn default_url() -> String {
    "/".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_name: default_store_name(),
            origin: default_origin(),
            manifest_urls: default_manifest_urls(),
            root_document: default_root_document(),
            skip_waiting: true,
            ignored_schemes: default_ignored_schemes(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: None,
            fallback: FallbackConfig::default(),
            notification: NotificationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWCACHE_`
    /// 2. TOML file from `SWCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// Nested tables use `__` in variable names, e.g. `SWCACHE_FALLBACK__BODY`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
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
        assert_eq!(config.store_name, "portfolio-v1.0");
        assert_eq!(config.origin, "http://localhost:8080");
        assert_eq!(config.manifest_urls, vec!["/", "/index.html"]);
        assert_eq!(config.root_document, "/");
        assert!(config.skip_waiting);
        assert_eq!(config.db_path, PathBuf::from("./swcache.sqlite"));
        assert_eq!(config.user_agent, "swcache/0.1");
        assert!(config.timeout_ms.is_none());
        assert!(config.ignored_schemes.contains(&"chrome-extension".to_string()));
    }

    #[test]
    fn test_default_fallback() {
        let fallback = FallbackConfig::default();
        assert_eq!(fallback.status, 503);
        assert_eq!(fallback.status_text, "Service Unavailable");
        assert_eq!(fallback.content_type, "text/plain");
        assert_eq!(fallback.body, "You are offline");
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), None);

        let config = AppConfig { timeout_ms: Some(5_000), ..Default::default() };
        assert_eq!(config.timeout(), Some(Duration::from_millis(5_000)));
    }

    #[test]
    fn test_load_layers_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "swcache.toml",
                r#"
                store_name = "portfolio-v2.0"
                manifest_urls = ["/", "/css/style.css"]

                [fallback]
                body = "Offline for now"
                "#,
            )?;
            jail.set_env("SWCACHE_CONFIG_FILE", "swcache.toml");
            jail.set_env("SWCACHE_ORIGIN", "https://portfolio.example");
            jail.set_env("SWCACHE_NOTIFICATION__DEFAULT_TITLE", "Hello");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.store_name, "portfolio-v2.0");
            assert_eq!(config.origin, "https://portfolio.example");
            assert_eq!(config.manifest_urls, vec!["/", "/css/style.css"]);
            assert_eq!(config.fallback.body, "Offline for now");
            assert_eq!(config.fallback.status, 503);
            assert_eq!(config.notification.default_title, "Hello");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SWCACHE_STORE_NAME", "");
            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "store_name"));
            Ok(())
        });
    }
}
