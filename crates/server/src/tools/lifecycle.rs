//! worker_install, worker_activate and worker_state tools.

use pantry_client::{Phase, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;

use super::json_result;

#[derive(Debug, Clone, Serialize)]
pub struct InstallOutput {
    pub phase: Phase,
    /// Entries written to the static partition.
    pub entries: usize,
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivateOutput {
    pub phase: Phase,
    pub version: String,
    /// Partitions deleted because they belong to other versions.
    pub evicted: Vec<String>,
}

/// Implementation of the worker_install tool.
pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let entries = worker.install().await?;
    let state = worker.state().await;
    json_result(&InstallOutput { phase: state.phase, entries, skip_waiting: state.skip_waiting })
}

/// Implementation of the worker_activate tool.
pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let evicted = worker.activate().await?;
    let state = worker.state().await;
    json_result(&ActivateOutput { phase: state.phase, version: state.version, evicted })
}

/// Implementation of the worker_state tool.
pub async fn state_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    json_result(&worker.state().await)
}
