//! Core types and shared functionality for pantry.
//!
//! This crate provides:
//! - Partitioned response cache with SQLite backend
//! - Request classification rules
//! - Offline fallback responses
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod http;
pub mod offline;

pub use cache::{CacheDb, CacheEntry, CacheStore, PartitionKind, PartitionNames};
pub use classify::{Classification, ClassificationRules};
pub use config::AppConfig;
pub use error::Error;
pub use http::{Request, RequestMode, Response, ResponseType};
pub use offline::OfflineResponder;
