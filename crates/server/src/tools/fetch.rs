//! worker_fetch tool implementation.
//!
//! Routes one request through the interception engine and reports where the
//! response came from.

use std::collections::BTreeMap;

use pantry_client::{ResponseSource, Worker, fetch::resolve};
use pantry_core::{Classification, Request, RequestMode, ResponseType};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// URL to request, absolute or relative to the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin", "cors" or "no-cors" (default).
    #[serde(default)]
    pub mode: Option<String>,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body, sent as UTF-8.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the worker_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerFetchOutput {
    pub url: String,
    /// Final URL of a network response, if known.
    pub final_url: Option<String>,
    pub status: u16,
    pub status_text: String,
    pub response_type: ResponseType,
    pub source: ResponseSource,
    pub classification: Classification,
    pub headers: Vec<(String, String)>,
    /// Body decoded lossily as UTF-8.
    pub body: String,
    pub body_bytes: usize,
}

fn build_request(worker: &Worker, params: WorkerFetchParams) -> Result<Request, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(ToolError::InvalidInput("method cannot be empty".into()).into());
    }

    let url = resolve(&params.url, worker.origin())
        .map_err(|e| pantry_core::Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let mode = match params.mode.as_deref() {
        Some(m) => m.parse::<RequestMode>()?,
        None => RequestMode::NoCors,
    };

    let mut request = Request::new(&params.method, url, mode);
    for (name, value) in params.headers {
        request = request.with_header(name, value);
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }
    Ok(request)
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(worker: &Worker, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, params)?;
    let url = request.url.to_string();

    let outcome = worker.fetch(request).await?;
    let response = outcome.response;

    let output = WorkerFetchOutput {
        url,
        final_url: response.url.as_ref().map(|u| u.to_string()),
        status: response.status,
        status_text: response.status_text,
        response_type: response.response_type,
        source: outcome.source,
        classification: outcome.classification,
        headers: response.headers,
        body: String::from_utf8_lossy(&response.body).into_owned(),
        body_bytes: response.body.len(),
    };

    json_result(&output)
}
