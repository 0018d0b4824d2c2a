//! SQLite-backed cache storage.
//!
//! This module provides the persistent equivalent of a browser `CacheStorage`:
//! a set of named stores, each holding request/response pairs, kept in SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Open-or-create and delete of named stores
//! - Entry keys derived from method + URL using SHA-256
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Atomic batch population for install manifests

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CachedEntry, EntrySummary};
pub use stores::StoreInfo;
