//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Request/response model used by the cache policy
//! - Cache storage with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CachedEntry, EntrySummary, StoreInfo};
pub use config::{AppConfig, ConfigError, FallbackConfig, NotificationConfig};
pub use error::Error;
pub use http::{Request, RequestMode, Response, ResponseType};
