//! Resolved configuration injected into the cache manager.

use swcache_core::{AppConfig, ConfigError, FallbackConfig, NotificationConfig, Response};
use url::Url;

use crate::fetch::resolve;

/// Everything the cache policy needs, with URLs already resolved.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Versioned store name; the only store that survives activation.
    pub store_name: String,
    pub origin: Url,
    /// Install manifest in order.
    pub manifest: Vec<Url>,
    /// Served to navigations when the network is unreachable.
    pub root_document: Url,
    pub skip_waiting: bool,
    pub ignored_schemes: Vec<String>,
    pub fallback: FallbackConfig,
    pub notification: NotificationConfig,
}

impl WorkerConfig {
    /// Minimal configuration for `origin`, with an empty manifest and the
    /// default fallback and notification settings.
    pub fn new(store_name: impl Into<String>, origin: Url) -> Self {
        let defaults = AppConfig::default();
        let root_document = origin.join("/").unwrap_or_else(|_| origin.clone());
        Self {
            store_name: store_name.into(),
            origin,
            manifest: Vec::new(),
            root_document,
            skip_waiting: defaults.skip_waiting,
            ignored_schemes: defaults.ignored_schemes,
            fallback: defaults.fallback,
            notification: defaults.notification,
        }
    }

    /// Resolve an [`AppConfig`] against its origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin, a manifest entry or the
    /// root document cannot be parsed.
    pub fn from_app(app: &AppConfig) -> Result<Self, ConfigError> {
        let origin = app.origin_url()?;

        let manifest = app
            .manifest_urls
            .iter()
            .map(|entry| {
                resolve(&origin, entry).map_err(|e| ConfigError::Invalid {
                    field: "manifest_urls".into(),
                    reason: format!("{entry}: {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let root_document = resolve(&origin, &app.root_document)
            .map_err(|e| ConfigError::Invalid { field: "root_document".into(), reason: e.to_string() })?;

        Ok(Self {
            store_name: app.store_name.clone(),
            origin,
            manifest,
            root_document,
            skip_waiting: app.skip_waiting,
            ignored_schemes: app.ignored_schemes.clone(),
            fallback: app.fallback.clone(),
            notification: app.notification.clone(),
        })
    }

    pub fn with_manifest<I, S>(mut self, entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.manifest = entries
            .into_iter()
            .map(|entry| {
                let entry = entry.as_ref();
                resolve(&self.origin, entry).map_err(|e| ConfigError::Invalid {
                    field: "manifest_urls".into(),
                    reason: format!("{entry}: {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self)
    }

    pub fn with_skip_waiting(mut self, skip_waiting: bool) -> Self {
        self.skip_waiting = skip_waiting;
        self
    }

    /// The synthetic response returned when a sub-resource cannot be fetched.
    pub fn offline_response(&self) -> Response {
        Response::new(self.fallback.status, self.fallback.body.clone())
            .with_status_text(self.fallback.status_text.clone())
            .with_header("Content-Type", self.fallback.content_type.clone())
    }
}
