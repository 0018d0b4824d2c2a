//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Parse `origin` as an http(s) URL with a host.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for anything else.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ConfigError::Invalid {
                    field: "origin".into(),
                    reason: format!("unsupported scheme: {scheme}"),
                });
            }
        }

        if url.host_str().is_none() {
            return Err(ConfigError::Invalid { field: "origin".into(), reason: "missing host".into() });
        }

        Ok(url)
    }

    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `store_name` or `user_agent` is empty
    /// - `origin` is not an http(s) URL
    /// - a manifest entry or `root_document` cannot be resolved against the origin
    /// - `fallback.status` is outside 100..=599
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_name.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "store_name".into(), reason: "must not be empty".into() });
        }

        let origin = self.origin_url()?;

        for entry in &self.manifest_urls {
            origin.join(entry).map_err(|e| ConfigError::Invalid {
                field: "manifest_urls".into(),
                reason: format!("{entry}: {e}"),
            })?;
        }

        origin
            .join(&self.root_document)
            .map_err(|e| ConfigError::Invalid { field: "root_document".into(), reason: e.to_string() })?;

        if !(100..=599).contains(&self.fallback.status) {
            return Err(ConfigError::Invalid {
                field: "fallback.status".into(),
                reason: "must be a valid HTTP status (100-599)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(ConfigError::Invalid {
                    field: "timeout_ms".into(),
                    reason: "must be at least 100ms".into(),
                });
            }
            if timeout_ms > 300_000 {
                return Err(ConfigError::Invalid {
                    field: "timeout_ms".into(),
                    reason: "must not exceed 5 minutes (300000ms)".into(),
                });
            }
        }

        if self.manifest_urls.is_empty() {
            tracing::warn!(store = %self.store_name, "manifest_urls is empty; install will cache nothing");
        }

        Ok(())
    }
}
