//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker.
use std::sync::Arc;

use crate::tools::{
    SwFetchParams, SwMessageParams, SwNotificationClickParams, SwPushParams, fetch::fetch_impl,
    lifecycle::{activate_impl, install_impl},
    message::message_impl,
    push::{click_impl, push_impl},
};

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
use swcache_client::{NotificationTemplate, ServiceWorker};

/// The main MCP server handler for swcache-mcp.
#[derive(Clone)]
pub struct SwCacheServer {
    worker: Arc<ServiceWorker>,
    notifications: NotificationTemplate,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwCacheServer {
    /// Create a new server handler around an installed worker.
    pub fn new(worker: Arc<ServiceWorker>, notifications: NotificationTemplate) -> Self {
        Self { worker, notifications, tool_router: Self::tool_router() }
    }

    #[tool(description = "Send a request through the offline cache worker. Returns the response with its resource class and source (network, cache, stale_cache, fallback, synthesized).")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Precache the install manifest into the static store, then activate the worker.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(description = "Activate the worker: delete stores from other versions and start intercepting requests.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    #[tool(description = "Post a control message (SKIP_WAITING, CACHE_CLEAR, CACHE_STATUS, FORCE_UPDATE) and return the worker's reply.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push message and return the notification it produces.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.notifications, params.0)
    }

    #[tool(description = "Click a notification (action explore, close, or none) and return where it leads.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.notifications, params.0)
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache-mcp".into(),
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
