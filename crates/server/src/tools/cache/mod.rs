//! Cache inspection tools.
//!
//! Read-only views over the partition store.

pub mod get;
pub mod partitions;

pub use get::{CacheGetParams, get_impl};
pub use partitions::partitions_impl;
