//! Store and entry operations for the SQLite backend.

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

use super::connection::CacheDb;
use super::{CacheStorage, RequestKey, ResponseSnapshot};
use crate::Error;

/// Raw columns of an entry row, decoded outside the connection thread.
type EntryRow = (u16, String, String, Vec<u8>);

fn read_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode_entry((status, status_text, headers_json, body): EntryRow) -> Result<ResponseSnapshot, Error> {
    let headers: Vec<(String, String)> =
        serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
    Ok(ResponseSnapshot { status, status_text, headers, body: body.into() })
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY id ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn has_store(&self, store: &str) -> Result<bool, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_stores WHERE name = ?1)",
                    params![store],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_store(&self, store: &str) -> Result<bool, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![store])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let hash = key.hash.clone();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.status_text, e.headers_json, e.body
                         FROM cache_entries e
                         JOIN cache_stores s ON s.id = e.store_id
                         WHERE e.key_hash = ?1
                         ORDER BY s.id ASC
                         LIMIT 1",
                        params![hash],
                        read_entry,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        row.map(decode_entry).transpose()
    }

    async fn match_in(&self, store: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let store = store.to_string();
        let hash = key.hash.clone();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.status_text, e.headers_json, e.body
                         FROM cache_entries e
                         JOIN cache_stores s ON s.id = e.store_id
                         WHERE s.name = ?1 AND e.key_hash = ?2",
                        params![store, hash],
                        read_entry,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        row.map(decode_entry).transpose()
    }

    async fn put(&self, store: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        let store = store.to_string();
        let key = key.clone();
        let status = response.status;
        let status_text = response.status_text.clone();
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let body = response.body.to_vec();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![store, now],
                )?;
                let store_id: i64 =
                    tx.query_row("SELECT id FROM cache_stores WHERE name = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                tx.execute(
                    "INSERT INTO cache_entries (
                        store_id, key_hash, method, url, status, status_text, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(store_id, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        store_id,
                        key.hash,
                        key.method,
                        key.url,
                        status,
                        status_text,
                        headers_json,
                        body,
                        now
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries e
                     JOIN cache_stores s ON s.id = e.store_id
                     WHERE s.name = ?1",
                    params![store],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
