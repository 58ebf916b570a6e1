//! worker_message tool implementation.

use pantry_client::{ControlMessage, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Message object tagged by `type`: SKIP_WAITING, GET_VERSION or
    /// CLEAR_USER_CACHE. Other messages are ignored.
    pub message: serde_json::Value,
}

/// Implementation of the worker_message tool.
pub async fn message_impl(worker: &Worker, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let message = ControlMessage::from_json(params.message);
    tracing::debug!(?message, "control message");
    let reply = worker.message(message).await?;
    json_result(&reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{offline_worker, output_json};
    use pantry_core::PartitionKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_version() {
        let worker = offline_worker().await;
        let params = WorkerMessageParams { message: json!({"type": "GET_VERSION"}) };

        let output = output_json(&message_impl(&worker, params).await.unwrap());
        assert_eq!(output, json!({"type": "VERSION", "version": null, "kind": "multipage-v3"}));
    }

    #[tokio::test]
    async fn test_clear_user_cache() {
        let worker = offline_worker().await;
        worker.store().db().open_partition("user-7", PartitionKind::Dynamic).await.unwrap();
        worker.store().db().open_partition("dynamic-multipage-v3", PartitionKind::Dynamic).await.unwrap();

        let params = WorkerMessageParams { message: json!({"type": "CLEAR_USER_CACHE"}) };
        let output = output_json(&message_impl(&worker, params).await.unwrap());
        assert_eq!(output["deleted"], json!(["user-7"]));
        assert_eq!(worker.partitions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_skip_waiting_before_install() {
        let worker = offline_worker().await;
        let params = WorkerMessageParams { message: json!({"type": "SKIP_WAITING"}) };

        let output = output_json(&message_impl(&worker, params).await.unwrap());
        assert_eq!(output, json!({"type": "SKIP_WAITING", "activated": false, "phase": "new"}));
    }

    #[tokio::test]
    async fn test_unknown_message() {
        let worker = offline_worker().await;
        let params = WorkerMessageParams { message: json!({"type": "PING", "payload": 1}) };

        let output = output_json(&message_impl(&worker, params).await.unwrap());
        assert_eq!(output, json!({"type": "IGNORED"}));
    }
}
