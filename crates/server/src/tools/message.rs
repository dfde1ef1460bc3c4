//! sw_message tool implementation.
//!
//! Posts a control message to the worker and returns its reply.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use swcache_client::{ControlMessage, ServiceWorker};

use super::json_result;

/// Input parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// One of SKIP_WAITING, CACHE_CLEAR, CACHE_STATUS, FORCE_UPDATE.
    #[serde(rename = "type")]
    pub kind: String,

    /// Optional payload, accepted and ignored by every current message.
    #[serde(default)]
    pub data: Option<Value>,
}

/// Output structure for the sw_message tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwMessageOutput {
    /// False for message types the worker does not know.
    pub recognized: bool,
    pub reply: Option<Value>,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(worker: &ServiceWorker, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let mut message = json!({ "type": params.kind });
    if let Some(data) = params.data {
        message["data"] = data;
    }

    let recognized = ControlMessage::parse(&message).is_some();
    let reply = worker.handle_message(&message).await?;

    json_result(&SwMessageOutput { recognized, reply })
}
