//! Control messages posted by the hosting page.

use serde::{Deserialize, Serialize};

use super::lifecycle::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate the waiting version now.
    SkipWaiting,
    GetVersion,
    /// Delete user-scoped partitions.
    ClearUserCache,
    #[serde(other)]
    Unknown,
}

impl ControlMessage {
    /// Parse a message body. Anything that isn't a tagged object is `Unknown`.
    pub fn from_json(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or(ControlMessage::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageReply {
    SkipWaiting { activated: bool, phase: Phase },
    Version { version: Option<String>, kind: String },
    ClearUserCache { deleted: Vec<String> },
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_messages() {
        assert_eq!(ControlMessage::from_json(json!({"type": "SKIP_WAITING"})), ControlMessage::SkipWaiting);
        assert_eq!(ControlMessage::from_json(json!({"type": "GET_VERSION"})), ControlMessage::GetVersion);
        assert_eq!(ControlMessage::from_json(json!({"type": "CLEAR_USER_CACHE"})), ControlMessage::ClearUserCache);
    }

    #[test]
    fn test_parse_unknown_messages() {
        assert_eq!(ControlMessage::from_json(json!({"type": "PING"})), ControlMessage::Unknown);
        assert_eq!(ControlMessage::from_json(json!("SKIP_WAITING")), ControlMessage::Unknown);
        assert_eq!(ControlMessage::from_json(json!(null)), ControlMessage::Unknown);
    }

    #[test]
    fn test_version_reply_shape() {
        let reply = MessageReply::Version { version: Some("pantry-multipage-v3".into()), kind: "multipage-v3".into() };
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"type": "VERSION", "version": "pantry-multipage-v3", "kind": "multipage-v3"})
        );
    }
}
