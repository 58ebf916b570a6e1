//! Cache entry operations.
//!
//! An entry is an immutable response snapshot keyed by (partition, method, URL).
//! Writes replace the whole row; nothing is updated in place.

use super::connection::CacheDb;
use super::hash::compute_entry_key;
use super::partitions::PartitionKind;
use crate::Error;
use crate::http::{Request, Response, ResponseType};
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

/// A stored response snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub partition: String,
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub final_url: Option<String>,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub response_type: ResponseType,
    pub stored_at: String,
}

impl CacheEntry {
    /// Snapshot a response for storage under `partition`.
    pub fn snapshot(partition: &str, request: &Request, response: &Response) -> Self {
        let url = request.url.to_string();
        Self {
            partition: partition.to_string(),
            key_hash: compute_entry_key(&request.method, &url),
            method: request.method.clone(),
            url,
            final_url: response.url.as_ref().map(Url::to_string),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            body: response.body.to_vec(),
            response_type: response.response_type,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild the response this entry was taken from.
    pub fn into_response(self) -> Response {
        Response {
            url: self.final_url.as_deref().and_then(|u| Url::parse(u).ok()),
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            body: Bytes::from(self.body),
            response_type: self.response_type,
        }
    }
}

const SELECT_COLUMNS: &str = "partition_name, key_hash, method, url, final_url, status, status_text,
    headers_json, body, response_type, stored_at";

type RawRow = (String, String, String, String, Option<String>, i64, String, String, Vec<u8>, String, String);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
    ))
}

fn decode_row(raw: RawRow) -> Result<CacheEntry, Error> {
    let (partition, key_hash, method, url, final_url, status, status_text, headers_json, body, response_type, stored_at) =
        raw;
    Ok(CacheEntry {
        partition,
        key_hash,
        method,
        url,
        final_url,
        status: u16::try_from(status).map_err(|e| Error::CorruptEntry(e.to_string()))?,
        status_text,
        headers: serde_json::from_str(&headers_json)?,
        body,
        response_type: response_type.parse()?,
        stored_at,
    })
}

fn insert_entry(conn: &rusqlite::Connection, entry: &CacheEntry, kind: PartitionKind) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&entry.headers)?;
    conn.execute(
        "INSERT OR IGNORE INTO partitions (name, kind, created_at) VALUES (?1, ?2, ?3)",
        params![&entry.partition, kind.as_str(), &entry.stored_at],
    )?;
    conn.execute(
        "INSERT INTO entries (
            partition_name, key_hash, method, url, final_url, status, status_text,
            headers_json, body, response_type, stored_at, write_seq
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                  (SELECT COALESCE(MAX(write_seq), 0) + 1 FROM entries))
        ON CONFLICT(partition_name, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            final_url = excluded.final_url,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            response_type = excluded.response_type,
            stored_at = excluded.stored_at,
            write_seq = excluded.write_seq",
        params![
            &entry.partition,
            &entry.key_hash,
            &entry.method,
            &entry.url,
            &entry.final_url,
            entry.status as i64,
            &entry.status_text,
            headers_json,
            &entry.body,
            entry.response_type.as_str(),
            &entry.stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Insert or replace an entry, creating its partition if needed.
    pub async fn put_entry(&self, entry: &CacheEntry, kind: PartitionKind) -> Result<(), Error> {
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> { insert_entry(conn, &entry, kind) })
            .await
            .map_err(Error::from)
    }

    /// Insert a batch of entries atomically: either all are written or none.
    pub async fn put_entries(&self, entries: Vec<CacheEntry>, kind: PartitionKind) -> Result<usize, Error> {
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                for entry in &entries {
                    insert_entry(&tx, entry, kind)?;
                }
                tx.commit()?;
                Ok(entries.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry from one partition.
    ///
    /// Returns None if the partition or entry doesn't exist.
    pub async fn get_entry(&self, partition: &str, key_hash: &str) -> Result<Option<CacheEntry>, Error> {
        let partition = partition.to_string();
        let key_hash = key_hash.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let sql = format!("SELECT {SELECT_COLUMNS} FROM entries WHERE partition_name = ?1 AND key_hash = ?2");
                let result = conn.query_row(&sql, params![partition, key_hash], read_row);

                match result {
                    Ok(raw) => Ok(Some(decode_row(raw)?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Get the most recently written entry for a key across all partitions.
    pub async fn get_latest_entry(&self, key_hash: &str) -> Result<Option<CacheEntry>, Error> {
        let key_hash = key_hash.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let sql =
                    format!("SELECT {SELECT_COLUMNS} FROM entries WHERE key_hash = ?1 ORDER BY write_seq DESC LIMIT 1");
                let result = conn.query_row(&sql, params![key_hash], read_row);

                match result {
                    Ok(raw) => Ok(Some(decode_row(raw)?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries stored under a key, across all partitions.
    pub async fn count_entries(&self, key_hash: &str) -> Result<u64, Error> {
        let key_hash = key_hash.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE key_hash = ?1", params![key_hash], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
