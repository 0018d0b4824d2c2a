//! cache_purge tool implementation.
//!
//! Deletes a whole store, one entry, or every store except the current one.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheDb, Error};

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Store to purge from.
    #[serde(default)]
    pub store: Option<String>,

    /// Delete only this entry of `store`.
    #[serde(default)]
    pub key: Option<String>,

    /// Delete every store except the one named here.
    #[serde(default)]
    pub keep_only: Option<String>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Stores removed.
    pub stores_deleted: Vec<String>,
    /// Entries removed by key.
    pub entries_deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &CacheDb, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let mut output = CachePurgeOutput { stores_deleted: Vec::new(), entries_deleted: 0 };

    match (params.store, params.key, params.keep_only) {
        (Some(store), Some(key), None) => {
            if !cache.has_store(&store).await? {
                return Err(Error::StoreNotFound(store).into());
            }
            if cache.delete_entry(&store, &key).await? {
                output.entries_deleted = 1;
            }
        }
        (Some(store), None, None) => {
            if !cache.delete_store(&store).await? {
                return Err(Error::StoreNotFound(store).into());
            }
            output.stores_deleted.push(store);
        }
        (None, None, Some(keep)) => {
            for name in cache.store_names().await? {
                if name != keep && cache.delete_store(&name).await? {
                    output.stores_deleted.push(name);
                }
            }
        }
        _ => {
            return Err(ToolError::InvalidParams(
                "specify store, store with key, or keep_only on its own".to_string(),
            )
            .into());
        }
    }

    tracing::info!(
        stores = output.stores_deleted.len(),
        entries = output.entries_deleted,
        "cache purged"
    );

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::output;
    use swcache_core::{Request, Response};

    async fn seeded() -> CacheDb {
        let cache = CacheDb::open_in_memory().await.unwrap();
        for store in ["portfolio-v0.9", "portfolio-v1.0"] {
            let req = Request::get(url::Url::parse("https://portfolio.example/").unwrap());
            cache.put_entry(store, &req, &Response::new(200, "home")).await.unwrap();
        }
        cache
    }

    #[tokio::test]
    async fn test_purge_keep_only() {
        let cache = seeded().await;
        let params = CachePurgeParams { keep_only: Some("portfolio-v1.0".into()), ..Default::default() };

        let out: CachePurgeOutput = output(&purge_impl(&cache, params).await.unwrap());
        assert_eq!(out.stores_deleted, vec!["portfolio-v0.9"]);
        assert_eq!(cache.store_names().await.unwrap(), vec!["portfolio-v1.0"]);
    }

    #[tokio::test]
    async fn test_purge_entry() {
        let cache = seeded().await;
        let key = cache.list_entries("portfolio-v1.0").await.unwrap()[0].key.clone();
        let params = CachePurgeParams { store: Some("portfolio-v1.0".into()), key: Some(key), keep_only: None };

        let out: CachePurgeOutput = output(&purge_impl(&cache, params).await.unwrap());
        assert_eq!(out.entries_deleted, 1);
        assert_eq!(cache.count_entries("portfolio-v1.0").await.unwrap(), 0);
        assert_eq!(cache.count_entries("portfolio-v0.9").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_store() {
        let cache = seeded().await;
        let params = CachePurgeParams { store: Some("portfolio-v0.9".into()), ..Default::default() };
        purge_impl(&cache, params).await.unwrap();
        assert!(!cache.has_store("portfolio-v0.9").await.unwrap());

        let params = CachePurgeParams { store: Some("portfolio-v0.9".into()), ..Default::default() };
        assert!(purge_impl(&cache, params).await.is_err());
    }

    #[tokio::test]
    async fn test_purge_no_params() {
        let cache = seeded().await;
        assert!(purge_impl(&cache, CachePurgeParams::default()).await.is_err());
    }
}
