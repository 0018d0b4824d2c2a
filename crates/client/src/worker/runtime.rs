//! Host adapter that drives the cache manager through the worker lifecycle.
//!
//! The runtime owns the registration slots and decides when an installed
//! worker takes over: immediately with skip-waiting, when there is no active
//! worker yet, or when no open page is controlled by the old one. Requests
//! arriving before any worker is active are not intercepted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use swcache_core::{Error, Request};
use tokio::sync::RwLock;

use super::hooks::{ClickOutcome, MessageOutcome, PushOutcome};
use super::host::{ClientHost, NotificationId};
use super::lifecycle::{Registration, RegistrationStatus};
use super::manager::{ActivateReport, BypassReason, CacheManager, InstallReport, Intercept};
use crate::fetch::Fetcher;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallOutcome {
    pub worker: u64,
    pub install: InstallReport,
    /// Set when the new worker took over right away.
    pub activated: Option<ActivateReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MessageReport {
    pub outcome: MessageOutcome,
    pub activated: Option<ActivateReport>,
}

pub struct WorkerRuntime<F, H> {
    manager: CacheManager<F>,
    host: Arc<H>,
    registration: RwLock<Registration>,
}

impl<F: Fetcher, H: ClientHost> WorkerRuntime<F, H> {
    pub fn new(manager: CacheManager<F>, host: Arc<H>) -> Self {
        let registration = Registration::new(manager.config().origin.as_str());
        Self { manager, host, registration: RwLock::new(registration) }
    }

    pub fn manager(&self) -> &CacheManager<F> {
        &self.manager
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub async fn status(&self) -> RegistrationStatus {
        self.registration.read().await.status()
    }

    /// Install a new worker for the configured store.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if an install is already running, or the
    /// install error from the cache manager. A failed install leaves the
    /// current active worker in place.
    pub async fn install(&self) -> Result<InstallOutcome, Error> {
        let worker = self
            .registration
            .write()
            .await
            .begin_install(&self.manager.config().store_name)?;

        let install = match self.manager.on_install(self.host.as_ref()).await {
            Ok(report) => report,
            Err(e) => {
                self.registration.write().await.fail_install();
                return Err(e);
            }
        };

        let has_active = {
            let mut registration = self.registration.write().await;
            registration.complete_install()?;
            registration.active().is_some()
        };

        let controlled = self.host.window_clients().await.iter().any(|c| c.controlled);
        let activated = if install.skip_waiting || !has_active || !controlled {
            Some(self.activate().await?)
        } else {
            tracing::info!(worker, "installed worker is waiting for controlled pages to close");
            None
        };

        Ok(InstallOutcome { worker, install, activated })
    }

    /// Activate the waiting worker.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if no worker is waiting, or the error from
    /// store cleanup. On failure the worker stays waiting.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.registration.write().await.begin_activate()?;

        let report = match self.manager.on_activate(self.host.as_ref()).await {
            Ok(report) => report,
            Err(e) => {
                self.registration.write().await.abort_activate();
                return Err(e);
            }
        };

        if let Some(old) = self.registration.write().await.complete_activate()? {
            tracing::info!(worker = old.id, store = %old.store_name, "previous worker is redundant");
        }

        Ok(report)
    }

    /// Route a page request through the active worker.
    pub async fn fetch(&self, request: &Request) -> Intercept {
        if self.registration.read().await.active().is_none() {
            return Intercept::Bypass(BypassReason::NoController);
        }
        self.manager.on_fetch(request).await
    }

    /// Deliver a page message. A skip-waiting request activates a waiting worker.
    ///
    /// # Errors
    ///
    /// Returns the activation error if the waiting worker fails to take over.
    pub async fn message(&self, data: &Value) -> Result<MessageReport, Error> {
        let outcome = self.manager.on_message(self.host.as_ref(), data).await;

        let waiting = self.registration.read().await.waiting().is_some();
        let activated = match outcome {
            MessageOutcome::SkipWaiting if waiting => Some(self.activate().await?),
            _ => None,
        };

        Ok(MessageReport { outcome, activated })
    }

    pub async fn sync(&self, tag: &str) {
        self.manager.on_sync(tag).await;
    }

    pub async fn push(&self, payload: Option<&[u8]>) -> PushOutcome {
        self.manager.on_push(self.host.as_ref(), payload).await
    }

    pub async fn notification_click(&self, id: NotificationId) -> ClickOutcome {
        self.manager.on_notification_click(self.host.as_ref(), id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::config::WorkerConfig;
    use crate::worker::host::LocalHost;
    use crate::worker::lifecycle::WorkerState;
    use crate::worker::manager::ResponseSource;
    use crate::worker::testing::{StubFetcher, html, origin, url};
    use serde_json::json;
    use swcache_core::CacheDb;

    async fn runtime(fetcher: StubFetcher, skip_waiting: bool) -> WorkerRuntime<StubFetcher, LocalHost> {
        let config = WorkerConfig::new("portfolio-v1.0", origin())
            .with_manifest(["/"])
            .unwrap()
            .with_skip_waiting(skip_waiting);
        let manager = CacheManager::new(config, CacheDb::open_in_memory().await.unwrap(), fetcher);
        WorkerRuntime::new(manager, Arc::new(LocalHost::new()))
    }

    fn site() -> StubFetcher {
        StubFetcher::new().respond("https://portfolio.example/", html("home"))
    }

    #[tokio::test]
    async fn test_fetch_before_install_is_not_intercepted() {
        let rt = runtime(site(), true).await;
        let out = rt.fetch(&Request::get(url("https://portfolio.example/"))).await;
        assert_eq!(out, Intercept::Bypass(BypassReason::NoController));
    }

    #[tokio::test]
    async fn test_first_install_activates() {
        let rt = runtime(site(), false).await;
        rt.host().open_client(&url("https://portfolio.example/")).await;

        let out = rt.install().await.unwrap();

        assert_eq!(out.install.cached, 1);
        assert!(out.activated.is_some());
        let status = rt.status().await;
        assert_eq!(status.active.unwrap().state, WorkerState::Activated);
        assert!(status.waiting.is_none());
        assert!(rt.host().window_clients().await.iter().all(|c| c.controlled));

        let hit = rt.fetch(&Request::get(url("https://portfolio.example/"))).await;
        assert_eq!(hit.source(), Some(ResponseSource::Cache));
    }

    #[tokio::test]
    async fn test_update_waits_for_controlled_pages() {
        let rt = runtime(site(), false).await;
        rt.host().open_client(&url("https://portfolio.example/")).await;
        rt.install().await.unwrap();

        let out = rt.install().await.unwrap();

        assert!(out.activated.is_none());
        let status = rt.status().await;
        assert_eq!(status.waiting.unwrap().id, out.worker);
        assert_ne!(status.active.unwrap().id, out.worker);
    }

    #[tokio::test]
    async fn test_skip_waiting_message_activates_waiting_worker() {
        let rt = runtime(site(), false).await;
        rt.host().open_client(&url("https://portfolio.example/")).await;
        rt.install().await.unwrap();
        let update = rt.install().await.unwrap();

        let report = rt.message(&json!({ "type": "SKIP_WAITING" })).await.unwrap();

        assert_eq!(report.outcome, MessageOutcome::SkipWaiting);
        assert!(report.activated.is_some());
        assert_eq!(rt.status().await.active.unwrap().id, update.worker);
    }

    #[tokio::test]
    async fn test_skip_waiting_install_takes_over() {
        let rt = runtime(site(), true).await;
        rt.host().open_client(&url("https://portfolio.example/")).await;
        rt.install().await.unwrap();

        let update = rt.install().await.unwrap();
        assert!(update.activated.is_some());
        assert_eq!(rt.status().await.active.unwrap().id, update.worker);
    }

    #[tokio::test]
    async fn test_failed_install_keeps_previous_worker() {
        let rt = runtime(StubFetcher::new(), true).await;

        assert!(matches!(rt.install().await, Err(Error::InstallFailed { .. })));

        let status = rt.status().await;
        assert!(status.installing.is_none());
        assert!(status.active.is_none());
        assert!(rt.activate().await.is_err());
    }

    #[tokio::test]
    async fn test_ignored_message_without_waiting_worker() {
        let rt = runtime(site(), true).await;
        let report = rt.message(&json!({ "type": "SKIP_WAITING" })).await.unwrap();
        assert_eq!(report.outcome, MessageOutcome::SkipWaiting);
        assert!(report.activated.is_none());
    }
}
