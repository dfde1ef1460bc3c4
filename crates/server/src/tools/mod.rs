//! MCP tool implementations.
//!
//! This module contains all tools exposed by the swcache-mcp server.

pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod push;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use swcache_core::Error;

pub use fetch::SwFetchParams;
pub use message::SwMessageParams;
pub use push::{SwNotificationClickParams, SwPushParams};

/// Wrap a tool output as pretty-printed JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
