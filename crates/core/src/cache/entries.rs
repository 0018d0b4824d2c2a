//! Request/response entries inside a store.
//!
//! Writing to a store that does not exist yet creates it, the same way a
//! worker opens a cache and then puts into it.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use crate::http::{Request, Response, ResponseType};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};
use url::Url;

/// A stored response together with the request it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CachedEntry {
    pub store: String,
    pub key: String,
    pub method: String,
    pub url: String,
    pub stored_at: String,
    pub response: Response,
}

/// Listing row for an entry, without the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntrySummary {
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub response_type: ResponseType,
    pub size: u64,
    pub stored_at: String,
}

/// Raw columns of `cache_entries`, decoded outside the rusqlite row closure.
struct EntryRow {
    store: String,
    key: String,
    method: String,
    url: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
    response_type: String,
    redirected: bool,
    stored_at: String,
    response_url: Option<String>,
}

const ENTRY_COLUMNS: &str =
    "store, key, method, url, status, status_text, headers_json, body, response_type, redirected, stored_at, response_url";

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            store: row.get(0)?,
            key: row.get(1)?,
            method: row.get(2)?,
            url: row.get(3)?,
            status: row.get(4)?,
            status_text: row.get(5)?,
            headers_json: row.get(6)?,
            body: row.get(7)?,
            response_type: row.get(8)?,
            redirected: row.get(9)?,
            stored_at: row.get(10)?,
            response_url: row.get(11)?,
        })
    }

    fn into_entry(self) -> Result<CachedEntry, Error> {
        let headers: Vec<(String, String)> = serde_json::from_str(&self.headers_json)
            .map_err(|e| Error::CorruptEntry(format!("{}: headers: {e}", self.key)))?;
        let response_type = ResponseType::parse(&self.response_type)
            .ok_or_else(|| Error::CorruptEntry(format!("{}: response type {}", self.key, self.response_type)))?;

        Ok(CachedEntry {
            response: Response {
                url: self.response_url,
                status: self.status,
                status_text: self.status_text,
                headers,
                body: self.body,
                response_type,
                redirected: self.redirected,
            },
            store: self.store,
            key: self.key,
            method: self.method,
            url: self.url,
            stored_at: self.stored_at,
        })
    }
}

/// One pending write: the request key material plus the response copy.
struct PendingEntry {
    key: String,
    method: String,
    url: String,
    headers_json: String,
    response: Response,
}

impl PendingEntry {
    fn new(request: &Request, response: &Response) -> Result<Self, Error> {
        let mut url = request.url.clone();
        url.set_fragment(None);
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::InvalidInput(format!("failed to serialize headers: {e}")))?;

        Ok(Self {
            key: compute_cache_key(&request.method, &url),
            method: request.method.to_ascii_uppercase(),
            url: url.to_string(),
            headers_json,
            response: response.clone(),
        })
    }

    fn write(&self, conn: &rusqlite::Connection, store: &str, stored_at: &str) -> Result<(), Error> {
        conn.execute(
            "INSERT INTO cache_entries (
                store, key, method, url, status, status_text, headers_json,
                body, response_type, redirected, stored_at, response_url
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(store, key) DO UPDATE SET
                method = excluded.method,
                url = excluded.url,
                status = excluded.status,
                status_text = excluded.status_text,
                headers_json = excluded.headers_json,
                body = excluded.body,
                response_type = excluded.response_type,
                redirected = excluded.redirected,
                stored_at = excluded.stored_at,
                response_url = excluded.response_url",
            params![
                store,
                &self.key,
                &self.method,
                &self.url,
                self.response.status,
                &self.response.status_text,
                &self.headers_json,
                &self.response.body,
                self.response.response_type.as_str(),
                self.response.redirected,
                stored_at,
                &self.response.url,
            ],
        )?;
        Ok(())
    }
}

fn ensure_store(conn: &rusqlite::Connection, store: &str, now: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
        params![store, now],
    )?;
    Ok(())
}

impl CacheDb {
    /// Store a response under the request's key, replacing any previous entry.
    pub async fn put_entry(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_entries(store, vec![(request.clone(), response.clone())]).await
    }

    /// Store a batch of responses in a single transaction.
    ///
    /// Either every entry is written or none is.
    pub async fn put_entries(&self, store: &str, batch: Vec<(Request, Response)>) -> Result<(), Error> {
        let store = store.to_string();
        let pending = batch
            .iter()
            .map(|(req, resp)| PendingEntry::new(req, resp))
            .collect::<Result<Vec<_>, _>>()?;
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &store, &now)?;
                for entry in &pending {
                    entry.write(&tx, &store, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the response stored for `method` + `url`.
    pub async fn match_entry(&self, store: &str, method: &str, url: &Url) -> Result<Option<Response>, Error> {
        let key = compute_cache_key(method, url);
        Ok(self.get_entry(store, &key).await?.map(|entry| entry.response))
    }

    /// Get an entry by key.
    ///
    /// Returns None if the key doesn't exist in the store.
    pub async fn get_entry(&self, store: &str, key: &str) -> Result<Option<CachedEntry>, Error> {
        let store = store.to_string();
        let key = key.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let mut stmt =
                    conn.prepare(&format!("SELECT {ENTRY_COLUMNS} FROM cache_entries WHERE store = ?1 AND key = ?2"))?;

                match stmt.query_row(params![store, key], EntryRow::from_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::into_entry).transpose()
    }

    /// Delete one entry.
    ///
    /// Returns false if there was nothing to delete.
    pub async fn delete_entry(&self, store: &str, key: &str) -> Result<bool, Error> {
        let store = store.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted =
                    conn.execute("DELETE FROM cache_entries WHERE store = ?1 AND key = ?2", params![store, key])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List the entries of a store, in URL order.
    pub async fn list_entries(&self, store: &str) -> Result<Vec<EntrySummary>, Error> {
        let store = store.to_string();
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<(EntrySummary, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, method, url, status, response_type, length(body), stored_at
                     FROM cache_entries WHERE store = ?1 ORDER BY url ASC",
                )?;
                let rows = stmt
                    .query_map(params![store], |row| {
                        Ok((
                            EntrySummary {
                                key: row.get(0)?,
                                method: row.get(1)?,
                                url: row.get(2)?,
                                status: row.get(3)?,
                                response_type: ResponseType::Basic,
                                size: row.get::<_, i64>(5)? as u64,
                                stored_at: row.get(6)?,
                            },
                            row.get::<_, String>(4)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(mut summary, response_type)| {
                summary.response_type = ResponseType::parse(&response_type).ok_or_else(|| {
                    Error::CorruptEntry(format!("{}: response type {response_type}", summary.key))
                })?;
                Ok(summary)
            })
            .collect()
    }

    /// Number of entries in a store.
    pub async fn count_entries(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
