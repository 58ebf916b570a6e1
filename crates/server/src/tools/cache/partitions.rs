//! cache_partitions tool implementation.

use pantry_client::Worker;
use pantry_core::cache::PartitionInfo;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;

use crate::tools::json_result;

#[derive(Debug, Clone, Serialize)]
pub struct CachePartitionsOutput {
    /// Partition names this worker version owns.
    pub live: Vec<String>,
    pub partitions: Vec<PartitionInfo>,
}

/// Implementation of the cache_partitions tool.
pub async fn partitions_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let names = worker.store().names();
    let output = CachePartitionsOutput {
        live: vec![names.static_name.clone(), names.dynamic_name.clone()],
        partitions: worker.partitions().await?,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{offline_worker, output_json};
    use pantry_core::PartitionKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_lists_partitions() {
        let worker = offline_worker().await;
        worker.store().db().open_partition("static-multipage-v2", PartitionKind::Static).await.unwrap();

        let output = output_json(&partitions_impl(&worker).await.unwrap());
        assert_eq!(output["live"], json!(["static-multipage-v3", "dynamic-multipage-v3"]));
        assert_eq!(output["partitions"][0]["name"], "static-multipage-v2");
        assert_eq!(output["partitions"][0]["kind"], "static");
        assert_eq!(output["partitions"][0]["entries"], 0);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let worker = offline_worker().await;
        let output = output_json(&partitions_impl(&worker).await.unwrap());
        assert_eq!(output["partitions"], json!([]));
    }
}
