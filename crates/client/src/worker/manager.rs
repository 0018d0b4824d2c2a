//! Cache-first fetch policy and store versioning.
//!
//! ### Install
//! - Open (or create) the store named for the current version.
//! - Fetch every manifest URL; any network failure or non-2xx status aborts the
//!   install and nothing is written.
//! - Write the whole manifest in one transaction, then ask the host to skip
//!   waiting.
//!
//! ### Activate
//! - Delete every store whose name differs from the current one.
//! - Claim open pages.
//!
//! ### Fetch
//! - Non-GET, ignored-scheme and cross-origin requests are not intercepted.
//! - Same-origin GET: cache hit is served as stored; a miss goes to the network
//!   and a 200 basic direct response is copied into the store.
//! - Network failure: navigations get the cached root document, everything
//!   else the synthetic offline response.

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheDb, Error, Request, Response};

use super::config::WorkerConfig;
use super::host::ClientHost;
use crate::fetch::{Fetcher, is_ignored_scheme};

/// Why a request was left to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BypassReason {
    NonGet,
    IgnoredScheme,
    CrossOrigin,
    /// No activated worker controls the page.
    NoController,
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Cache,
    Network,
    /// Cached root document served for a failed navigation.
    RootFallback,
    /// Synthetic offline response.
    OfflineFallback,
}

/// Outcome of a fetch event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intercept {
    /// The host should perform the request itself.
    Bypass(BypassReason),
    Respond { response: Response, source: ResponseSource },
}

impl Intercept {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Intercept::Bypass(_) => None,
            Intercept::Respond { response, .. } => Some(response),
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            Intercept::Bypass(_) => None,
            Intercept::Respond { source, .. } => Some(*source),
        }
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub store: String,
    /// Whether the store did not exist before this install.
    pub created: bool,
    /// Number of manifest entries written.
    pub cached: usize,
    /// Whether the host was asked to skip waiting.
    pub skip_waiting: bool,
}

/// Result of an activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub store: String,
    /// Stale stores removed, oldest first.
    pub deleted: Vec<String>,
}

/// The cache manager: lifecycle and fetch hooks over one versioned store.
pub struct CacheManager<F> {
    config: WorkerConfig,
    db: CacheDb,
    fetcher: F,
}

impl<F: Fetcher> CacheManager<F> {
    pub fn new(config: WorkerConfig, db: CacheDb, fetcher: F) -> Self {
        Self { config, db, fetcher }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Pre-cache the install manifest.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` naming the first manifest URL that could
    /// not be fetched, or a database error. The store is left without any of
    /// the manifest entries in either case.
    pub async fn on_install(&self, host: &dyn ClientHost) -> Result<InstallReport, Error> {
        let store = &self.config.store_name;
        let created = self.db.open_store(store).await?;

        let fetches = self.config.manifest.iter().map(|url| async move {
            let request = Request::get(url.clone());
            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed { url: url.to_string(), reason: e.to_string() })?;

            if !response.is_ok() {
                return Err(Error::InstallFailed {
                    url: url.to_string(),
                    reason: format!("status {}", response.status),
                });
            }

            Ok((request, response))
        });

        let batch = try_join_all(fetches).await.inspect_err(|e| {
            tracing::warn!(store = %store, error = %e, "install aborted");
        })?;

        let cached = batch.len();
        self.db.put_entries(store, batch).await?;

        if self.config.skip_waiting {
            host.skip_waiting().await;
        }

        tracing::info!(store = %store, cached, created, "installed");

        Ok(InstallReport { store: store.clone(), created, cached, skip_waiting: self.config.skip_waiting })
    }

    /// Remove stores left by previous versions and claim open pages.
    pub async fn on_activate(&self, host: &dyn ClientHost) -> Result<ActivateReport, Error> {
        let store = &self.config.store_name;
        let mut deleted = Vec::new();

        for name in self.db.store_names().await? {
            if name == *store {
                continue;
            }
            if self.db.delete_store(&name).await? {
                tracing::info!(store = %name, "deleted stale cache store");
                deleted.push(name);
            }
        }

        host.claim_clients().await;

        tracing::info!(store = %store, deleted = deleted.len(), "activated");

        Ok(ActivateReport { store: store.clone(), deleted })
    }

    /// Handle one outgoing request from a controlled page.
    ///
    /// Never fails: lookup and write errors are logged, network failures
    /// become fallback responses.
    pub async fn on_fetch(&self, request: &Request) -> Intercept {
        if !request.is_get() {
            return Intercept::Bypass(BypassReason::NonGet);
        }
        if is_ignored_scheme(&request.url, &self.config.ignored_schemes) {
            return Intercept::Bypass(BypassReason::IgnoredScheme);
        }
        if !request.is_same_origin(&self.config.origin) {
            return Intercept::Bypass(BypassReason::CrossOrigin);
        }

        let store = &self.config.store_name;

        match self.db.match_entry(store, &request.method, &request.url).await {
            Ok(Some(response)) => {
                tracing::debug!(url = %request.url, source = "cache", "cache hit");
                return Intercept::Respond { response, source: ResponseSource::Cache };
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed; treating as miss"),
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    let copy = response.clone();
                    if let Err(e) = self.db.put_entry(store, request, &copy).await {
                        tracing::warn!(url = %request.url, error = %e, "failed to cache response");
                    }
                }
                tracing::debug!(url = %request.url, status = response.status, source = "network", "cache miss");
                Intercept::Respond { response, source: ResponseSource::Network }
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "network failed; serving fallback");
                self.fallback(request).await
            }
        }
    }

    async fn fallback(&self, request: &Request) -> Intercept {
        if request.mode.is_navigation() {
            let root = &self.config.root_document;
            match self.db.match_entry(&self.config.store_name, "GET", root).await {
                Ok(Some(response)) => {
                    return Intercept::Respond { response, source: ResponseSource::RootFallback };
                }
                Ok(None) => tracing::debug!(url = %root, "root document not cached"),
                Err(e) => tracing::warn!(url = %root, error = %e, "root document lookup failed"),
            }
        }

        Intercept::Respond { response: self.config.offline_response(), source: ResponseSource::OfflineFallback }
    }
}
