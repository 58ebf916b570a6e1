//! Partition-aware cache operations used by the fetch engine and lifecycle.
//!
//! `CacheStore` binds a [`CacheDb`] to the partition names of one version.
//! Lookups never touch the network and never write. Non-GET requests are
//! refused at this layer so the GET-only invariant holds for every caller.

use super::connection::CacheDb;
use super::entries::CacheEntry;
use super::hash::compute_entry_key;
use super::partitions::{PartitionInfo, PartitionKind, PartitionNames};
use crate::Error;
use crate::http::{Request, Response};
use tokio_rusqlite::params;

const ACTIVE_VERSION_KEY: &str = "active_version";
const ACTIVE_CACHE_VERSION_KEY: &str = "active_cache_version";

#[derive(Clone, Debug)]
pub struct CacheStore {
    db: CacheDb,
    names: PartitionNames,
}

impl CacheStore {
    pub fn new(db: CacheDb, names: PartitionNames) -> Self {
        Self { db, names }
    }

    pub fn names(&self) -> &PartitionNames {
        &self.names
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// The same database bound to another version's partition pair.
    pub fn with_names(&self, names: PartitionNames) -> Self {
        Self::new(self.db.clone(), names)
    }

    /// Look a request up in one partition.
    pub async fn lookup(&self, kind: PartitionKind, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let key = compute_entry_key(&request.method, request.url.as_str());
        let entry = self.db.get_entry(self.names.name(kind), &key).await?;
        Ok(entry.map(CacheEntry::into_response))
    }

    /// Look a request up across every partition; the most recent write wins.
    pub async fn lookup_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let key = compute_entry_key(&request.method, request.url.as_str());
        let entry = self.db.get_latest_entry(&key).await?;
        Ok(entry.map(CacheEntry::into_response))
    }

    /// Insert or overwrite an entry. Non-GET requests are logged and ignored.
    pub async fn store(&self, kind: PartitionKind, request: &Request, response: &Response) -> Result<(), Error> {
        if !request.is_get() {
            tracing::warn!(method = %request.method, url = %request.url, "refusing to cache non-GET request");
            return Ok(());
        }
        let partition = self.names.name(kind);
        let entry = CacheEntry::snapshot(partition, request, response);
        self.db.put_entry(&entry, kind).await?;
        tracing::debug!(partition, url = %request.url, status = response.status, "cached response");
        Ok(())
    }

    /// Write a priming batch into the static partition in one transaction.
    pub async fn prime_static(&self, batch: &[(Request, Response)]) -> Result<usize, Error> {
        let partition = self.names.name(PartitionKind::Static);
        self.db.open_partition(partition, PartitionKind::Static).await?;

        let entries: Vec<CacheEntry> = batch
            .iter()
            .filter(|(req, _)| req.is_get())
            .map(|(req, resp)| CacheEntry::snapshot(partition, req, resp))
            .collect();
        self.db.put_entries(entries, PartitionKind::Static).await
    }

    /// Delete every partition outside the current name pair.
    pub async fn evict_stale(&self) -> Result<Vec<String>, Error> {
        let deleted = self.db.delete_partitions_except(&self.names).await?;
        for name in &deleted {
            tracing::info!(partition = %name, "deleted stale partition");
        }
        Ok(deleted)
    }

    /// Delete partitions whose name contains any of `patterns`.
    pub async fn clear_matching(&self, patterns: &[String]) -> Result<Vec<String>, Error> {
        let deleted = self.db.delete_partitions_matching(patterns).await?;
        for name in &deleted {
            tracing::info!(partition = %name, "deleted user partition");
        }
        Ok(deleted)
    }

    pub async fn partitions(&self) -> Result<Vec<PartitionInfo>, Error> {
        self.db.list_partitions().await
    }

    /// Version identifier recorded by the last successful activation.
    pub async fn active_version(&self) -> Result<Option<String>, Error> {
        self.meta(ACTIVE_VERSION_KEY).await
    }

    /// Partition suffix of the last activated version.
    pub async fn active_cache_version(&self) -> Result<Option<String>, Error> {
        self.meta(ACTIVE_CACHE_VERSION_KEY).await
    }

    /// Record `version` as active, along with the cache version its partitions use.
    pub async fn set_active_version(&self, version: &str, cache_version: &str) -> Result<(), Error> {
        let pairs = [(ACTIVE_VERSION_KEY, version.to_string()), (ACTIVE_CACHE_VERSION_KEY, cache_version.to_string())];
        let now = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for (key, value) in &pairs {
                    tx.execute(
                        "INSERT INTO worker_meta (key, value, updated_at) VALUES (?1, ?2, ?3)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                        params![key, value, now],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn meta(&self, key: &'static str) -> Result<Option<String>, Error> {
        self.db
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result =
                    conn.query_row("SELECT value FROM worker_meta WHERE key = ?1", params![key], |row| row.get::<_, String>(0));
                match result {
                    Ok(v) => Ok(Some(v)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }
}
