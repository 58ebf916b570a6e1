//! Push delivery boundary.
//!
//! Payloads become notification descriptions and notification clicks become
//! window actions. Displaying notifications and managing windows belongs to
//! the host; this module only decides what should happen.

use chrono::{DateTime, Utc};
use pantry_core::Error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_TITLE: &str = "Pantry";
pub const DEFAULT_BODY: &str = "You have a new notification";
pub const DEFAULT_ICON: &str = "/static/icon-192x192.png";
pub const DEFAULT_URL: &str = "/";
pub const NOTIFICATION_TAG: &str = "pantry-notification";

fn default_title() -> String {
    DEFAULT_TITLE.into()
}

fn default_body() -> String {
    DEFAULT_BODY.into()
}

fn default_icon() -> String {
    DEFAULT_ICON.into()
}

fn default_url() -> String {
    DEFAULT_URL.into()
}

/// Payload delivered with a push message.
///
/// Each field falls back to its default on its own when it is missing or
/// has the wrong type, so one bad field never discards the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPayload")]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub url: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: Option<i64>,
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    body: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    icon: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    badge: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    timestamp: Option<i64>,
}

/// `None` instead of an error when the value has another type.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring push field with unexpected type");
            Ok(None)
        }
    }
}

impl From<RawPayload> for PushPayload {
    fn from(raw: RawPayload) -> Self {
        Self {
            title: raw.title.unwrap_or_else(default_title),
            body: raw.body.unwrap_or_else(default_body),
            icon: raw.icon.unwrap_or_else(default_icon),
            badge: raw.badge.unwrap_or_else(default_icon),
            url: raw.url.unwrap_or_else(default_url),
            timestamp: raw.timestamp,
        }
    }
}

impl Default for PushPayload {
    fn default() -> Self {
        Self {
            title: default_title(),
            body: default_body(),
            icon: default_icon(),
            badge: default_icon(),
            url: default_url(),
            timestamp: None,
        }
    }
}

impl PushPayload {
    /// Parse a raw payload.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedPayload` if the bytes are not a JSON object.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(data).map_err(|e| Error::MalformedPayload(e.to_string()))
    }

    /// Parse a raw payload, substituting the default on absence or failure.
    pub fn parse_or_default(data: Option<&[u8]>) -> Self {
        let Some(data) = data else {
            return Self::default();
        };
        match Self::parse(data) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse push data, using default payload");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: String,
    pub timestamp: i64,
}

/// Everything the host needs to show a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub data: NotificationData,
    pub vibrate: Vec<u32>,
    pub tag: String,
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    pub fn from_payload(payload: PushPayload, now: DateTime<Utc>) -> Self {
        Self {
            data: NotificationData {
                url: payload.url,
                timestamp: payload.timestamp.unwrap_or_else(|| now.timestamp_millis()),
            },
            title: payload.title,
            body: payload.body,
            icon: payload.icon.clone(),
            badge: payload.badge,
            vibrate: vec![200, 100, 200],
            tag: NOTIFICATION_TAG.to_string(),
            require_interaction: false,
            actions: vec![
                NotificationAction { action: "open".into(), title: "Open".into(), icon: Some(payload.icon) },
                NotificationAction { action: "close".into(), title: "Close".into(), icon: None },
            ],
        }
    }
}

/// Turn a push message into the notification to display.
pub fn handle_push(data: Option<&[u8]>, now: DateTime<Utc>) -> Notification {
    let payload = PushPayload::parse_or_default(data);
    tracing::info!(title = %payload.title, url = %payload.url, "push notification received");
    Notification::from_payload(payload, now)
}

/// An open window the host can focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
}

/// What the host should do after a notification click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClickOutcome {
    /// Notification closed, nothing else.
    Dismiss,
    Focus { client_id: String },
    OpenWindow { url: String },
}

/// Decide the outcome of a click. The notification is always closed by the host.
///
/// `action` is the clicked action button, `None` for a click on the body.
pub fn handle_click(action: Option<&str>, data_url: Option<&str>, windows: &[WindowClient]) -> ClickOutcome {
    if action == Some("close") {
        return ClickOutcome::Dismiss;
    }

    let target = data_url.filter(|u| !u.is_empty()).unwrap_or(DEFAULT_URL);

    if let Some(window) = windows.iter().find(|w| w.url.contains(target)) {
        return ClickOutcome::Focus { client_id: window.id.clone() };
    }

    ClickOutcome::OpenWindow { url: target.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let n = handle_push(Some(b"{}"), now());
        assert_eq!(n.title, DEFAULT_TITLE);
        assert_eq!(n.body, DEFAULT_BODY);
        assert_eq!(n.icon, DEFAULT_ICON);
        assert_eq!(n.data.url, DEFAULT_URL);
        assert_eq!(n.data.timestamp, now().timestamp_millis());
    }

    #[test]
    fn test_malformed_payload_uses_defaults() {
        let n = handle_push(Some(b"not json"), now());
        assert_eq!(n, Notification::from_payload(PushPayload::default(), now()));
        assert!(matches!(PushPayload::parse(b"not json"), Err(Error::MalformedPayload(_))));
    }

    #[test]
    fn test_missing_payload_uses_defaults() {
        assert_eq!(handle_push(None, now()).title, DEFAULT_TITLE);
    }

    #[test]
    fn test_full_payload() {
        let data = br#"{"title":"Milk expires","body":"Use it today","icon":"/i.png","badge":"/b.png","url":"/refrigerator","timestamp":42}"#;
        let n = handle_push(Some(data), now());
        assert_eq!(n.title, "Milk expires");
        assert_eq!(n.badge, "/b.png");
        assert_eq!(n.data, NotificationData { url: "/refrigerator".into(), timestamp: 42 });
        assert_eq!(n.tag, NOTIFICATION_TAG);
        assert_eq!(n.vibrate, vec![200, 100, 200]);
        let actions: Vec<&str> = n.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(actions, vec!["open", "close"]);
    }

    #[test]
    fn test_mistyped_field_keeps_the_others() {
        let data = br#"{"title":"Milk","timestamp":"2026-01-01","url":"/refrigerator"}"#;
        let n = handle_push(Some(data), now());
        assert_eq!(n.title, "Milk");
        assert_eq!(n.data, NotificationData { url: "/refrigerator".into(), timestamp: now().timestamp_millis() });
    }

    #[test]
    fn test_null_and_numeric_fields_take_defaults() {
        let payload = PushPayload::parse(br#"{"title":null,"body":7,"icon":["x"],"url":"/add"}"#).unwrap();
        assert_eq!(payload.title, DEFAULT_TITLE);
        assert_eq!(payload.body, DEFAULT_BODY);
        assert_eq!(payload.icon, DEFAULT_ICON);
        assert_eq!(payload.url, "/add");
        assert_eq!(payload.timestamp, None);
    }

    #[test]
    fn test_click_close_dismisses() {
        let windows = vec![WindowClient { id: "w1".into(), url: "http://localhost:5000/".into() }];
        assert_eq!(handle_click(Some("close"), Some("/"), &windows), ClickOutcome::Dismiss);
    }

    #[test]
    fn test_click_focuses_matching_window() {
        let windows = vec![
            WindowClient { id: "w1".into(), url: "http://localhost:5000/search".into() },
            WindowClient { id: "w2".into(), url: "http://localhost:5000/refrigerator".into() },
        ];
        assert_eq!(
            handle_click(Some("open"), Some("/refrigerator"), &windows),
            ClickOutcome::Focus { client_id: "w2".into() }
        );
        assert_eq!(handle_click(None, Some("/search"), &windows), ClickOutcome::Focus { client_id: "w1".into() });
    }

    #[test]
    fn test_click_opens_window_when_none_match() {
        assert_eq!(
            handle_click(None, Some("/refrigerator"), &[]),
            ClickOutcome::OpenWindow { url: "/refrigerator".into() }
        );
        assert_eq!(handle_click(None, None, &[]), ClickOutcome::OpenWindow { url: "/".into() });
    }
}
