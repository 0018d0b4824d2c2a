//! cache_list tool implementation.
//!
//! Lists stores, or the entries of one store.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheDb, EntrySummary, Error, StoreInfo};

use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// List entries of this store. Omit to list the stores themselves.
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CacheListOutput {
    Stores { stores: Vec<StoreInfo> },
    Entries { store: String, entries: Vec<EntrySummary> },
}

/// Implementation of the cache_list tool.
pub async fn list_impl(cache: &CacheDb, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let output = match params.store {
        None => CacheListOutput::Stores { stores: cache.list_stores().await? },
        Some(store) => {
            if !cache.has_store(&store).await? {
                return Err(Error::StoreNotFound(store).into());
            }
            let entries = cache.list_entries(&store).await?;
            CacheListOutput::Entries { store, entries }
        }
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::output;
    use swcache_core::{Request, Response};

    #[tokio::test]
    async fn test_list_stores_and_entries() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let req = Request::get(url::Url::parse("https://portfolio.example/").unwrap());
        cache.put_entry("portfolio-v1.0", &req, &Response::new(200, "home")).await.unwrap();
        cache.open_store("portfolio-v0.9").await.unwrap();

        let result = list_impl(&cache, CacheListParams::default()).await.unwrap();
        let CacheListOutput::Stores { stores } = output(&result) else {
            panic!("expected store listing");
        };
        assert_eq!(stores.len(), 2);

        let params = CacheListParams { store: Some("portfolio-v1.0".into()) };
        let CacheListOutput::Entries { entries, .. } = output(&list_impl(&cache, params).await.unwrap()) else {
            panic!("expected entry listing");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://portfolio.example/");
        assert_eq!(entries[0].size, 4);
    }

    #[tokio::test]
    async fn test_list_missing_store() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let params = CacheListParams { store: Some("nope".into()) };
        assert!(list_impl(&cache, params).await.is_err());
    }
}
