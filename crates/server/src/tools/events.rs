//! sw_message, sw_sync, sw_push and sw_notification_click tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{ClientHost, Fetcher, WorkerRuntime};
use swcache_core::Error;

use super::json_result;

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message posted by a page, e.g. `{"type": "SKIP_WAITING"}`.
    pub data: serde_json::Value,
}

/// Parameters for the sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    /// Sync registration tag.
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncOutput {
    pub tag: String,
    pub handled: bool,
}

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Push payload text, normally JSON with `title`, `body` and `url`.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Notification id returned by sw_push.
    pub id: u64,
}

/// Implementation of the sw_message tool.
pub async fn message_impl<F: Fetcher, H: ClientHost>(
    runtime: &WorkerRuntime<F, H>, params: SwMessageParams,
) -> Result<CallToolResult, McpError> {
    let report = runtime.message(&params.data).await?;
    json_result(&report)
}

/// Implementation of the sw_sync tool.
pub async fn sync_impl<F: Fetcher, H: ClientHost>(
    runtime: &WorkerRuntime<F, H>, params: SwSyncParams,
) -> Result<CallToolResult, McpError> {
    if params.tag.trim().is_empty() {
        return Err(Error::InvalidInput("tag cannot be empty".into()).into());
    }

    runtime.sync(&params.tag).await;
    json_result(&SwSyncOutput { tag: params.tag, handled: true })
}

/// Implementation of the sw_push tool.
pub async fn push_impl<F: Fetcher, H: ClientHost>(
    runtime: &WorkerRuntime<F, H>, params: SwPushParams,
) -> Result<CallToolResult, McpError> {
    let outcome = runtime.push(params.payload.as_deref().map(str::as_bytes)).await;
    json_result(&outcome)
}

/// Implementation of the sw_notification_click tool.
pub async fn notification_click_impl<F: Fetcher, H: ClientHost>(
    runtime: &WorkerRuntime<F, H>, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let outcome = runtime.notification_click(params.id).await;
    json_result(&outcome)
}
