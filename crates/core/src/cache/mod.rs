//! SQLite-backed response cache organised in named, versioned partitions.
//!
//! This module provides a persistent partitioned cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Entries keyed by a SHA-256 digest of (method, URL)
//! - Automatic schema migrations
//! - WAL mode and foreign-key cascades on partition deletion
//! - Cross-partition lookup where the most recent write wins

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod partitions;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheEntry;
pub use partitions::{PartitionInfo, PartitionKind, PartitionNames};
pub use store::CacheStore;
