//! MCP server handler implementation.
//!
//! This module defines the main server handler that routes tool calls to the
//! worker. Every worker event has one tool.
use std::sync::Arc;

use crate::tools::{
    cache::{CacheGetParams, get_impl, partitions_impl},
    fetch::{WorkerFetchParams, fetch_impl},
    lifecycle::{activate_impl, install_impl, state_impl},
    message::{WorkerMessageParams, message_impl},
    push::{NotificationClickParams, WorkerPushParams, click_impl, push_impl},
};

use pantry_client::Worker;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for pantry.
#[derive(Clone)]
pub struct PantryServer {
    worker: Arc<Worker>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl PantryServer {
    pub fn new(worker: Arc<Worker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    /// Intercept a request: classify it, then answer from network, cache or
    /// the offline responder.
    #[tool(
        description = "Intercept one request. Returns the single response produced, its source (network, cache or offline) and the request classification."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Install this worker version: prime the static partition from the precache manifest.")]
    async fn worker_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(description = "Activate the installed version: delete partitions of other versions and take control.")]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    #[tool(description = "Report the worker lifecycle phase and version.")]
    async fn worker_state(&self) -> Result<CallToolResult, McpError> {
        state_impl(&self.worker).await
    }

    #[tool(description = "Post a control message (SKIP_WAITING, GET_VERSION, CLEAR_USER_CACHE) to the worker.")]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push payload. Returns the notification the host should display.")]
    async fn worker_push(&self, params: Parameters<WorkerPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Handle a notification click. Returns whether to dismiss, focus a window or open one.")]
    async fn worker_notification_click(
        &self, params: Parameters<NotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.worker, params.0).await
    }

    #[tool(description = "List cache partitions with their entry counts.")]
    async fn cache_partitions(&self) -> Result<CallToolResult, McpError> {
        partitions_impl(&self.worker).await
    }

    #[tool(description = "Look up the cached entry a cache-first request for a URL would be served from.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for PantryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "pantry-worker".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
