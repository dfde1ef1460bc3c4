//! Push messages and notification clicks.

use chrono::{DateTime, Utc};
use serde::Serialize;
use swcache_core::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationData {
    /// Arrival time in milliseconds since the Unix epoch.
    pub date_of_arrival: i64,
    pub primary_key: String,
}

/// A notification ready to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
    pub require_interaction: bool,
    pub tag: String,
}

/// What a click on a notification leads to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "url", rename_all = "snake_case")]
pub enum ClickOutcome {
    OpenWindow(String),
    Dismiss,
}

pub const ACTION_EXPLORE: &str = "explore";
pub const ACTION_CLOSE: &str = "close";

const ICON_DIR: &str = "/static/pwa/icons";

/// Fixed parts of every notification, taken from configuration.
#[derive(Debug, Clone)]
pub struct NotificationTemplate {
    title: String,
    default_body: String,
    tag: String,
    dashboard_url: String,
}

impl NotificationTemplate {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            title: config.app_name.clone(),
            default_body: format!("New message from {}", config.app_name),
            tag: format!("{}-notification", config.cache_prefix),
            dashboard_url: config.dashboard_url.clone(),
        }
    }

    /// Build the notification for a push message. A message without data
    /// gets the default body; an empty text payload is shown as is.
    pub fn on_push(&self, payload: Option<&str>, now: DateTime<Utc>) -> Notification {
        let body = payload.map_or_else(|| self.default_body.clone(), str::to_string);

        Notification {
            title: self.title.clone(),
            body,
            icon: format!("{ICON_DIR}/icon-192x192.png"),
            badge: format!("{ICON_DIR}/badge-72x72.png"),
            vibrate: vec![100, 50, 100],
            data: NotificationData { date_of_arrival: now.timestamp_millis(), primary_key: "1".into() },
            actions: vec![
                NotificationAction {
                    action: ACTION_EXPLORE.into(),
                    title: "Open".into(),
                    icon: format!("{ICON_DIR}/checkmark.png"),
                },
                NotificationAction {
                    action: ACTION_CLOSE.into(),
                    title: "Dismiss".into(),
                    icon: format!("{ICON_DIR}/xmark.png"),
                },
            ],
            require_interaction: true,
            tag: self.tag.clone(),
        }
    }

    /// Resolve a click. `close` only dismisses; `explore`, a plain tap and
    /// any unknown action open the dashboard.
    pub fn on_click(&self, action: Option<&str>) -> ClickOutcome {
        match action {
            Some(ACTION_CLOSE) => ClickOutcome::Dismiss,
            _ => ClickOutcome::OpenWindow(self.dashboard_url.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn template() -> NotificationTemplate {
        NotificationTemplate::from_config(&AppConfig::default())
    }

    #[test]
    fn test_push_with_payload() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let n = template().on_push(Some("Invoice FV/3/2026 was paid"), now);

        assert_eq!(n.title, "Fakturownia");
        assert_eq!(n.body, "Invoice FV/3/2026 was paid");
        assert_eq!(n.icon, "/static/pwa/icons/icon-192x192.png");
        assert_eq!(n.badge, "/static/pwa/icons/badge-72x72.png");
        assert_eq!(n.vibrate, vec![100, 50, 100]);
        assert_eq!(n.data.date_of_arrival, now.timestamp_millis());
        assert_eq!(n.data.primary_key, "1");
        assert!(n.require_interaction);
        assert_eq!(n.tag, "fakturownia-notification");

        let actions: Vec<_> = n.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(actions, vec!["explore", "close"]);
    }

    #[test]
    fn test_push_without_payload_uses_default_body() {
        let n = template().on_push(None, Utc::now());
        assert_eq!(n.body, "New message from Fakturownia");

        let n = template().on_push(Some(""), Utc::now());
        assert_eq!(n.body, "");
    }

    #[test]
    fn test_click_outcomes() {
        let t = template();
        let dashboard = ClickOutcome::OpenWindow("/admin/ksiegowosc/monthlysettlement/dashboard/".into());

        assert_eq!(t.on_click(Some("explore")), dashboard);
        assert_eq!(t.on_click(None), dashboard);
        assert_eq!(t.on_click(Some("something-else")), dashboard);
        assert_eq!(t.on_click(Some("close")), ClickOutcome::Dismiss);
    }

    #[test]
    fn test_click_outcome_json() {
        let json = serde_json::to_value(ClickOutcome::OpenWindow("/admin/".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "outcome": "open_window", "url": "/admin/" }));

        let json = serde_json::to_value(ClickOutcome::Dismiss).unwrap();
        assert_eq!(json, serde_json::json!({ "outcome": "dismiss" }));
    }
}
