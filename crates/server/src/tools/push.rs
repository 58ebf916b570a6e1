//! worker_push and worker_notification_click tools.

use pantry_client::{Worker, WindowClient};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for the worker_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WorkerPushParams {
    /// Raw push payload. Expected to be a JSON object; anything else yields
    /// the default notification.
    #[serde(default)]
    pub data: Option<String>,
}

/// An open window as reported by the host.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WindowParam {
    pub id: String,
    pub url: String,
}

/// Input parameters for the worker_notification_click tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    /// Action button clicked ("open" or "close"); omit for a body click.
    #[serde(default)]
    pub action: Option<String>,

    /// `data.url` of the clicked notification.
    #[serde(default)]
    pub url: Option<String>,

    /// Windows currently open, in the host's order.
    #[serde(default)]
    pub windows: Vec<WindowParam>,
}

/// Implementation of the worker_push tool.
pub async fn push_impl(worker: &Worker, params: WorkerPushParams) -> Result<CallToolResult, McpError> {
    let notification = worker.push(params.data.as_deref().map(str::as_bytes));
    json_result(&notification)
}

/// Implementation of the worker_notification_click tool.
pub async fn click_impl(worker: &Worker, params: NotificationClickParams) -> Result<CallToolResult, McpError> {
    let windows: Vec<WindowClient> = params
        .windows
        .into_iter()
        .map(|w| WindowClient { id: w.id, url: w.url })
        .collect();

    let outcome = worker.notification_click(params.action.as_deref(), params.url.as_deref(), &windows);
    json_result(&outcome)
}
