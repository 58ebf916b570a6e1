//! Partition bookkeeping: creation, listing and wholesale deletion.

use std::fmt;
use std::str::FromStr;

use super::connection::CacheDb;
use crate::Error;
use serde::Serialize;
use tokio_rusqlite::params;

/// The two kinds of partition a version owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    /// Written once at install, read at runtime.
    Static,
    /// Written opportunistically at runtime.
    Dynamic,
}

impl PartitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartitionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(Self::Static),
            "dynamic" => Ok(Self::Dynamic),
            other => Err(Error::CorruptEntry(format!("unknown partition kind: {other}"))),
        }
    }
}

/// The live partition name pair for one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionNames {
    pub static_name: String,
    pub dynamic_name: String,
}

impl PartitionNames {
    pub fn for_version(version: &str) -> Self {
        Self { static_name: format!("static-{version}"), dynamic_name: format!("dynamic-{version}") }
    }

    pub fn name(&self, kind: PartitionKind) -> &str {
        match kind {
            PartitionKind::Static => &self.static_name,
            PartitionKind::Dynamic => &self.dynamic_name,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        name == self.static_name || name == self.dynamic_name
    }
}

/// Summary row for a stored partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionInfo {
    pub name: String,
    pub kind: PartitionKind,
    pub created_at: String,
    pub entries: u64,
}

impl CacheDb {
    /// Create a partition if it doesn't already exist.
    pub async fn open_partition(&self, name: &str, kind: PartitionKind) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, kind, created_at) VALUES (?1, ?2, ?3)",
                    params![name, kind.as_str(), now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// List all partitions in creation order with their entry counts.
    pub async fn list_partitions(&self) -> Result<Vec<PartitionInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, p.kind, p.created_at,
                        (SELECT COUNT(*) FROM entries e WHERE e.partition_name = p.name)
                     FROM partitions p ORDER BY p.rowid ASC",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?, row.get::<_, i64>(3)?))
                })?;

                let mut out = Vec::new();
                for row in rows {
                    let (name, kind, created_at, entries) = row?;
                    out.push(PartitionInfo { name, kind: kind.parse()?, created_at, entries: entries as u64 });
                }
                Ok(out)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every partition not named in `keep`.
    ///
    /// Returns the deleted partition names.
    pub async fn delete_partitions_except(&self, keep: &PartitionNames) -> Result<Vec<String>, Error> {
        let keep = keep.clone();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction()?;
                let stale: Vec<String> = {
                    let mut stmt = tx.prepare("SELECT name FROM partitions WHERE name NOT IN (?1, ?2)")?;
                    let rows = stmt.query_map(params![keep.static_name, keep.dynamic_name], |row| {
                        row.get::<_, String>(0)
                    })?;
                    rows.collect::<Result<_, _>>()?
                };
                tx.execute(
                    "DELETE FROM partitions WHERE name NOT IN (?1, ?2)",
                    params![keep.static_name, keep.dynamic_name],
                )?;
                tx.commit()?;
                Ok(stale)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every partition whose name contains any of `patterns`.
    ///
    /// Returns the deleted partition names.
    pub async fn delete_partitions_matching(&self, patterns: &[String]) -> Result<Vec<String>, Error> {
        let patterns = patterns.to_vec();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction()?;
                let names: Vec<String> = {
                    let mut stmt = tx.prepare("SELECT name FROM partitions")?;
                    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                    rows.collect::<Result<_, _>>()?
                };

                let mut deleted = Vec::new();
                for name in names {
                    if patterns.iter().any(|p| !p.is_empty() && name.contains(p.as_str())) {
                        tx.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                        deleted.push(name);
                    }
                }
                tx.commit()?;
                Ok(deleted)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_for_version() {
        let names = PartitionNames::for_version("v2");
        assert_eq!(names.name(PartitionKind::Static), "static-v2");
        assert_eq!(names.name(PartitionKind::Dynamic), "dynamic-v2");
        assert!(names.contains("dynamic-v2"));
        assert!(!names.contains("dynamic-v1"));
    }

    #[tokio::test]
    async fn test_open_partition_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_partition("static-v1", PartitionKind::Static).await.unwrap();
        db.open_partition("static-v1", PartitionKind::Static).await.unwrap();

        let partitions = db.list_partitions().await.unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].kind, PartitionKind::Static);
        assert_eq!(partitions[0].entries, 0);
    }

    #[tokio::test]
    async fn test_delete_partitions_except() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for (name, kind) in [
            ("static-v1", PartitionKind::Static),
            ("dynamic-v1", PartitionKind::Dynamic),
            ("static-v2", PartitionKind::Static),
            ("dynamic-v2", PartitionKind::Dynamic),
        ] {
            db.open_partition(name, kind).await.unwrap();
        }

        let mut deleted = db.delete_partitions_except(&PartitionNames::for_version("v2")).await.unwrap();
        deleted.sort();
        assert_eq!(deleted, vec!["dynamic-v1".to_string(), "static-v1".to_string()]);

        let remaining: Vec<String> = db.list_partitions().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(remaining, vec!["static-v2".to_string(), "dynamic-v2".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_partitions_matching() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_partition("user-alice", PartitionKind::Dynamic).await.unwrap();
        db.open_partition("static-v2", PartitionKind::Static).await.unwrap();

        let deleted = db.delete_partitions_matching(&["user-".to_string()]).await.unwrap();
        assert_eq!(deleted, vec!["user-alice".to_string()]);
        let remaining: Vec<String> = db.list_partitions().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(remaining, vec!["static-v2".to_string()]);
    }
}
