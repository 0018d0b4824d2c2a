//! cache_get tool implementation.
//!
//! Retrieves one cached response by entry key or by URL.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheDb, Error, ResponseType, cache::hash::{compute_cache_key, is_valid_key}};

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Store to read from.
    pub store: String,

    /// Entry key as shown by cache_list.
    #[serde(default)]
    pub key: Option<String>,

    /// Absolute URL of a cached GET request, used when no key is given.
    #[serde(default)]
    pub url: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub store: String,
    pub key: String,
    pub method: String,
    pub url: String,
    pub stored_at: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub response_type: ResponseType,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_bytes: usize,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &CacheDb, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let key = match (params.key, params.url) {
        (Some(key), _) if is_valid_key(&key) => key,
        (Some(key), _) => return Err(Error::InvalidInput(format!("malformed entry key: {key}")).into()),
        (None, Some(url)) => {
            let url = url::Url::parse(&url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
            compute_cache_key("GET", &url)
        }
        (None, None) => return Err(ToolError::InvalidParams("either key or url is required".into()).into()),
    };

    let entry = cache
        .get_entry(&params.store, &key)
        .await?
        .ok_or_else(|| Error::CacheMiss(key.clone()))?;

    let response = entry.response;
    let output = CacheGetOutput {
        store: entry.store,
        key: entry.key,
        method: entry.method,
        url: entry.url,
        stored_at: entry.stored_at,
        status: response.status,
        status_text: response.status_text,
        headers: response.headers,
        response_type: response.response_type,
        body: String::from_utf8_lossy(&response.body).into_owned(),
        body_bytes: response.body.len(),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::output;
    use swcache_core::{Request, Response};

    #[tokio::test]
    async fn test_get_impl_missing() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let params = CacheGetParams { store: "portfolio-v1.0".into(), key: Some("0".repeat(64)), url: None };

        let err = get_impl(&cache, params).await.unwrap_err();
        assert!(err.message.starts_with("CACHE_MISS"));

        let params = CacheGetParams { store: "portfolio-v1.0".into(), key: Some("nonexistent".into()), url: None };
        let err = get_impl(&cache, params).await.unwrap_err();
        assert!(err.message.starts_with("INVALID_INPUT"));
    }

    #[tokio::test]
    async fn test_get_impl_by_url() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let req = Request::get(url::Url::parse("https://portfolio.example/css/style.css").unwrap());
        let resp = Response::new(200, "body{}").with_header("Content-Type", "text/css");
        cache.put_entry("portfolio-v1.0", &req, &resp).await.unwrap();

        let params = CacheGetParams {
            store: "portfolio-v1.0".into(),
            key: None,
            url: Some("https://portfolio.example/css/style.css#top".into()),
        };
        let out: CacheGetOutput = output(&get_impl(&cache, params).await.unwrap());
        assert_eq!(out.body, "body{}");
        assert_eq!(out.method, "GET");
        assert_eq!(out.headers, vec![("Content-Type".to_string(), "text/css".to_string())]);
    }

    #[tokio::test]
    async fn test_get_impl_requires_selector() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let params = CacheGetParams { store: "portfolio-v1.0".into(), key: None, url: None };
        assert!(get_impl(&cache, params).await.is_err());
    }
}
