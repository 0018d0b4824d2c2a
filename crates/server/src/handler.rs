//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    cache::{CacheGetParams, CacheListParams, CachePurgeParams, get_impl, list_impl, purge_impl},
    events::{
        SwMessageParams, SwNotificationClickParams, SwPushParams, SwSyncParams, message_impl, notification_click_impl,
        push_impl, sync_impl,
    },
    fetch::{SwFetchParams, fetch_impl},
    lifecycle::{activate_impl, install_impl, status_impl},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use swcache_client::{FetchClient, LocalHost, WorkerRuntime};

/// Runtime type served over MCP.
pub type Runtime = WorkerRuntime<FetchClient, LocalHost>;

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    runtime: Arc<Runtime>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwCacheServer {
    /// Create a new server handler around a worker runtime.
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self { runtime, tool_router: Self::tool_router() }
    }

    #[tool(description = "Run the install event: pre-cache the manifest into the current store. Activates right away \
                          when skip-waiting is enabled or no page is controlled.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.runtime).await
    }

    #[tool(description = "Run the activate event for the waiting worker: delete stale cache stores and claim pages.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.runtime).await
    }

    #[tool(description = "Show the installing, waiting and active workers and every cache store.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.runtime).await
    }

    /// Deliver a fetch event.
    ///
    /// Same-origin GET requests are answered cache-first with network and
    /// offline fallbacks; anything else goes straight to the network.
    #[tool(description = "Deliver a fetch event. Returns the response and whether it came from the cache, the \
                          network, or an offline fallback.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.runtime, params.0).await
    }

    #[tool(description = "Post a message to the worker. {\"type\": \"SKIP_WAITING\"} activates a waiting worker.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.runtime, params.0).await
    }

    #[tool(description = "Deliver a background sync event for a tag.")]
    async fn sw_sync(&self, params: Parameters<SwSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.runtime, params.0).await
    }

    #[tool(description = "Deliver a push event. The JSON payload may carry title, body and url; missing fields use \
                          defaults. Returns the notification id.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.runtime, params.0).await
    }

    #[tool(description = "Click a notification: close it, then focus a page showing its URL or open a new one.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        notification_click_impl(&self.runtime, params.0).await
    }

    #[tool(description = "List cache stores, or the entries of one store.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(self.runtime.manager().db(), params.0).await
    }

    #[tool(description = "Get one cached response by entry key or URL.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(self.runtime.manager().db(), params.0).await
    }

    #[tool(description = "Delete a cache store, one entry of a store, or every store except keep_only.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(self.runtime.manager().db(), params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
