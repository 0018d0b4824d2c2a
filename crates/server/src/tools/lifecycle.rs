//! sw_install, sw_activate and sw_status tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{ClientHost, Fetcher, RegistrationStatus, WorkerRuntime};
use swcache_core::StoreInfo;

use super::json_result;

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusOutput {
    /// Store the running worker version installs into.
    pub current_store: String,
    pub registration: RegistrationStatus,
    /// Every store in the database, oldest first.
    pub stores: Vec<StoreInfo>,
}

/// Implementation of the sw_install tool.
pub async fn install_impl<F: Fetcher, H: ClientHost>(runtime: &WorkerRuntime<F, H>) -> Result<CallToolResult, McpError> {
    let outcome = runtime.install().await?;
    json_result(&outcome)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl<F: Fetcher, H: ClientHost>(
    runtime: &WorkerRuntime<F, H>,
) -> Result<CallToolResult, McpError> {
    let report = runtime.activate().await?;
    json_result(&report)
}

/// Implementation of the sw_status tool.
pub async fn status_impl<F: Fetcher, H: ClientHost>(runtime: &WorkerRuntime<F, H>) -> Result<CallToolResult, McpError> {
    let manager = runtime.manager();
    let output = StatusOutput {
        current_store: manager.config().store_name.clone(),
        registration: runtime.status().await,
        stores: manager.db().list_stores().await?,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{SiteFetcher, output, runtime};
    use swcache_client::InstallOutcome;

    #[tokio::test]
    async fn test_install_then_status() {
        let rt = runtime(SiteFetcher::default().with("https://portfolio.example/", "home"), &["/"]).await;

        let result = install_impl(&rt).await.unwrap();
        let outcome: InstallOutcome = output(&result);
        assert_eq!(outcome.install.cached, 1);
        assert!(outcome.activated.is_some());

        let status: StatusOutput = output(&status_impl(&rt).await.unwrap());
        assert_eq!(status.current_store, "portfolio-v1.0");
        assert_eq!(status.registration.active.unwrap().id, outcome.worker);
        assert_eq!(status.stores.len(), 1);
        assert_eq!(status.stores[0].entries, 1);
    }

    #[tokio::test]
    async fn test_install_failure_is_error() {
        let rt = runtime(SiteFetcher::default(), &["/"]).await;
        let err = install_impl(&rt).await.unwrap_err();
        assert!(err.message.starts_with("INSTALL_FAILED"));
    }

    #[tokio::test]
    async fn test_activate_without_waiting_worker() {
        let rt = runtime(SiteFetcher::default(), &[]).await;
        let err = activate_impl(&rt).await.unwrap_err();
        assert!(err.message.starts_with("INVALID_STATE"));
    }
}
