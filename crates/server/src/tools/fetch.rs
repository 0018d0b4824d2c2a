//! sw_fetch tool implementation.
//!
//! Delivers a fetch event to the worker. Requests the worker does not
//! intercept are sent to the network directly, as a browser would.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{BypassReason, ClientHost, Fetcher, Intercept, ResponseSource, WorkerRuntime, fetch::resolve};
use swcache_core::{Error, Request, RequestMode, Response, ResponseType};

use super::json_result;

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the site origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: navigate, same-origin, cors (default) or no-cors.
    #[serde(default)]
    pub mode: RequestMode,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub response_type: ResponseType,
    pub redirected: bool,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_bytes: usize,
    /// Where an intercepted response came from.
    pub source: Option<ResponseSource>,
    /// Why the worker let the request through untouched.
    pub bypass: Option<BypassReason>,
}

impl SwFetchOutput {
    fn new(request: &Request, response: Response, source: Option<ResponseSource>, bypass: Option<BypassReason>) -> Self {
        Self {
            url: response.url.clone().unwrap_or_else(|| request.url.to_string()),
            status: response.status,
            status_text: response.status_text,
            headers: response.headers,
            response_type: response.response_type,
            redirected: response.redirected,
            body: String::from_utf8_lossy(&response.body).into_owned(),
            body_bytes: response.body.len(),
            source,
            bypass,
        }
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<F: Fetcher, H: ClientHost>(
    runtime: &WorkerRuntime<F, H>, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()).into());
    }

    let origin = &runtime.manager().config().origin;
    let url = resolve(origin, &params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;

    let mut request = Request::get(url).with_method(params.method);
    request.mode = params.mode;
    request.headers = params.headers.into_iter().collect();

    let output = match runtime.fetch(&request).await {
        Intercept::Respond { response, source } => SwFetchOutput::new(&request, response, Some(source), None),
        Intercept::Bypass(reason) => {
            tracing::debug!(url = %request.url, ?reason, "not intercepted; fetching directly");
            let response = runtime.manager().fetcher().fetch(&request).await?;
            SwFetchOutput::new(&request, response, None, Some(reason))
        }
    };

    json_result(&output)
}
