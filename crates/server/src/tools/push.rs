//! sw_push and sw_notification_click tool implementations.

use chrono::Utc;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::NotificationTemplate;

use super::json_result;

/// Input parameters for the sw_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Push message text. Omit to simulate a push without data.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Input parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Clicked action: "explore", "close", or omitted for a plain tap.
    #[serde(default)]
    pub action: Option<String>,
}

/// Implementation of the sw_push tool.
pub fn push_impl(template: &NotificationTemplate, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let notification = template.on_push(params.payload.as_deref(), Utc::now());
    tracing::debug!(tag = %notification.tag, "showing notification");
    json_result(&notification)
}

/// Implementation of the sw_notification_click tool.
pub fn click_impl(
    template: &NotificationTemplate, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    json_result(&template.on_click(params.action.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::output_json;
    use swcache_core::AppConfig;

    fn template() -> NotificationTemplate {
        NotificationTemplate::from_config(&AppConfig::default())
    }

    #[test]
    fn test_push_payload_becomes_body() {
        let params = SwPushParams { payload: Some("New invoice".into()) };
        let output = output_json(&push_impl(&template(), params).unwrap());

        assert_eq!(output["title"], "Fakturownia");
        assert_eq!(output["body"], "New invoice");
        assert_eq!(output["tag"], "fakturownia-notification");
        assert_eq!(output["require_interaction"], true);
        assert!(output["data"]["date_of_arrival"].is_i64());
    }

    #[test]
    fn test_click() {
        let output = output_json(&click_impl(&template(), SwNotificationClickParams::default()).unwrap());
        assert_eq!(output["outcome"], "open_window");
        assert_eq!(output["url"], "/admin/ksiegowosc/monthlysettlement/dashboard/");

        let params = SwNotificationClickParams { action: Some("close".into()) };
        let output = output_json(&click_impl(&template(), params).unwrap());
        assert_eq!(output["outcome"], "dismiss");
    }
}
