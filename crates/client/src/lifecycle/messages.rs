//! Control messages posted to the worker by open pages.

use serde_json::Value;

/// A recognized control message.
///
/// Messages arrive as JSON objects of the form `{"type": "...", "data": ...}`.
/// `data` is accepted and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    SkipWaiting,
    CacheClear,
    CacheStatus,
    ForceUpdate,
}

impl ControlMessage {
    pub const ALL: [ControlMessage; 4] = [
        ControlMessage::SkipWaiting,
        ControlMessage::CacheClear,
        ControlMessage::CacheStatus,
        ControlMessage::ForceUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMessage::SkipWaiting => "SKIP_WAITING",
            ControlMessage::CacheClear => "CACHE_CLEAR",
            ControlMessage::CacheStatus => "CACHE_STATUS",
            ControlMessage::ForceUpdate => "FORCE_UPDATE",
        }
    }

    pub fn from_type(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == kind)
    }

    /// Decode a posted message. Anything without a known string `type` is `None`.
    pub fn parse(message: &Value) -> Option<Self> {
        message.get("type").and_then(Value::as_str).and_then(Self::from_type)
    }
}

impl std::fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_types() {
        for message in ControlMessage::ALL {
            assert_eq!(ControlMessage::parse(&json!({ "type": message.as_str() })), Some(message));
        }
    }

    #[test]
    fn test_parse_ignores_data() {
        let message = json!({ "type": "CACHE_STATUS", "data": { "anything": [1, 2, 3] } });
        assert_eq!(ControlMessage::parse(&message), Some(ControlMessage::CacheStatus));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(ControlMessage::parse(&json!({ "type": "cache_status" })), None);
        assert_eq!(ControlMessage::parse(&json!({ "type": "UNKNOWN" })), None);
        assert_eq!(ControlMessage::parse(&json!({ "type": 3 })), None);
        assert_eq!(ControlMessage::parse(&json!({ "kind": "SKIP_WAITING" })), None);
        assert_eq!(ControlMessage::parse(&json!("SKIP_WAITING")), None);
        assert_eq!(ControlMessage::parse(&Value::Null), None);
    }
}
