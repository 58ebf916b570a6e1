//! cache_get tool implementation.
//!
//! Looks up the entry a cache-first request for a URL would be served from.

use pantry_client::{Worker, fetch::resolve};
use pantry_core::{Error, ResponseType, cache::hash::compute_entry_key};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL to look up, absolute or relative to the configured origin.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheGetOutput {
    pub url: String,
    pub key_hash: String,
    /// `None` when no partition holds the URL.
    pub entry: Option<EntrySummary>,
    /// Number of partitions holding an entry for the URL.
    pub copies: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub partition: String,
    pub status: u16,
    pub response_type: ResponseType,
    pub content_type: Option<String>,
    pub body_bytes: usize,
    pub stored_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &Worker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = resolve(&params.url, worker.origin()).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let url = url.to_string();
    let key_hash = compute_entry_key("GET", &url);

    let db = worker.store().db();
    let entry = db.get_latest_entry(&key_hash).await?.map(|e| EntrySummary {
        content_type: e
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.clone()),
        partition: e.partition,
        status: e.status,
        response_type: e.response_type,
        body_bytes: e.body.len(),
        stored_at: e.stored_at,
    });
    let copies = db.count_entries(&key_hash).await?;

    json_result(&CacheGetOutput { url, key_hash, entry, copies })
}
