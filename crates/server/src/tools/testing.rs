//! Shared fixtures for tool tests.

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;
use swcache_client::{CacheManager, Fetcher, LocalHost, WorkerConfig, WorkerRuntime};
use swcache_core::{CacheDb, Error, Request, Response};

pub(crate) const ORIGIN: &str = "https://portfolio.example";

/// Network double that answers from a fixed route table.
#[derive(Debug, Default)]
pub(crate) struct SiteFetcher {
    routes: HashMap<String, Response>,
}

impl SiteFetcher {
    pub(crate) fn with(mut self, url: &str, body: &str) -> Self {
        let response = Response::new(200, body)
            .with_url(url)
            .with_header("Content-Type", "text/html");
        self.routes.insert(url.to_string(), response);
        self
    }
}

#[async_trait::async_trait]
impl Fetcher for SiteFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.routes
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("network error: {} unreachable", request.url)))
    }
}

pub(crate) type TestRuntime = WorkerRuntime<SiteFetcher, LocalHost>;

pub(crate) async fn runtime(fetcher: SiteFetcher, manifest: &[&str]) -> TestRuntime {
    let origin = url::Url::parse(ORIGIN).unwrap();
    let config = WorkerConfig::new("portfolio-v1.0", origin)
        .with_manifest(manifest.iter().copied())
        .unwrap();
    let db = CacheDb::open_in_memory().await.unwrap();
    WorkerRuntime::new(CacheManager::new(config, db, fetcher), Arc::new(LocalHost::new()))
}

/// Decode the JSON text content of a tool result.
pub(crate) fn output<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
