use std::time::Instant;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Snapshot of a channel's broadcast as reported by the status source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveInfo {
    #[serde(default)]
    pub is_live: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "game_name", skip_serializing_if = "Option::is_none")]
    pub game: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl LiveInfo {
    pub fn offline() -> Self {
        Self::default()
    }
}

/// Last known status of a watched channel, overwritten on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamStatus {
    #[serde(default)]
    pub channel: String,
    pub is_live: bool,
    #[serde(default)]
    pub stream_info: Option<LiveInfo>,
    pub last_updated: DateTime<Utc>,
}

impl StreamStatus {
    pub fn from_poll(channel: impl Into<String>, info: &LiveInfo) -> Self {
        Self {
            channel: channel.into(),
            is_live: info.is_live,
            stream_info: info.is_live.then(|| info.clone()),
            last_updated: Utc::now(),
        }
    }
}

/// Identifies one capture session: the channel plus the instant it started.
///
/// The wall-clock part only names the capture file, ordering between sessions
/// of one process uses the monotonic instant.
#[derive(Debug, Clone)]
pub struct SessionId {
    pub channel: String,
    pub started_at: DateTime<Local>,
    started: Instant,
}

impl SessionId {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            started_at: Local::now(),
            started: Instant::now(),
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// File name used for the session's capture file
    pub fn file_name(&self) -> String {
        format!(
            "recorded_chat_{}.json",
            self.started_at.format("%Y-%m-%d_%H-%M-%S")
        )
    }
}

impl PartialEq for SessionId {
    fn eq(&self, other: &Self) -> bool {
        self.channel == other.channel && self.started == other.started
    }
}

impl Eq for SessionId {}

/// Latest message per username for a capture session.
///
/// Values are kept as raw JSON so files written by older versions, which
/// stored `{"message": .., "timestamp": ..}` objects, still load. Iteration
/// follows first-insertion order of each username.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatRecordSet(Map<String, Value>);

impl ChatRecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `text` as the latest message of `username`, replacing any
    /// earlier one.
    pub fn insert(&mut self, username: impl Into<String>, text: impl Into<String>) {
        self.0.insert(username.into(), Value::String(text.into()));
    }

    pub fn get(&self, username: &str) -> Option<&Value> {
        self.0.get(username)
    }

    /// Resolved message text for `username`, see [`resolve_message`]
    pub fn message(&self, username: &str) -> Option<&str> {
        self.0.get(username).and_then(resolve_message)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Merges `other` into `self`; entries of `other` win on collision.
    pub fn merge(&mut self, other: ChatRecordSet) {
        for (username, value) in other.0 {
            self.0.insert(username, value);
        }
    }

    /// Strips trailing `\r`, `\n` and spaces from every string message.
    /// Returns `true` if anything changed.
    pub fn trim_trailing(&mut self) -> bool {
        let mut changed = false;
        for value in self.0.values_mut() {
            if let Value::String(text) = value {
                let trimmed = text.trim_end_matches(['\r', '\n', ' ']);
                if trimmed.len() != text.len() {
                    *text = trimmed.to_string();
                    changed = true;
                }
            }
        }
        changed
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ChatRecordSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut records = ChatRecordSet::new();
        for (username, text) in iter {
            records.insert(username, text);
        }
        records
    }
}

/// Resolves a stored record value to its message text.
///
/// Accepts a plain string or a legacy object carrying a `message` string.
pub fn resolve_message(value: &Value) -> Option<&str> {
    match value {
        Value::String(text) => Some(text),
        Value::Object(fields) => fields.get("message").and_then(Value::as_str),
        _ => None,
    }
}

/// Cleaned chat messages, one per retained user message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset(Vec<String>);

impl Dataset {
    pub fn push(&mut self, message: String) {
        self.0.push(message);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for Dataset {
    fn from(messages: Vec<String>) -> Self {
        Dataset(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_latest_message_wins_and_keeps_first_position() {
        let mut records = ChatRecordSet::new();
        records.insert("A", "first");
        records.insert("B", "hello");
        records.insert("A", "second");

        assert_eq!(records.len(), 2);
        let order: Vec<_> = records.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(order, vec!["A", "B"]);
        assert_eq!(records.message("A"), Some("second"));
    }

    #[test]
    fn test_legacy_nested_records_resolve() {
        let records: ChatRecordSet = serde_json::from_value(json!({
            "new_user": "plain text",
            "old_user": {"message": "nested text", "timestamp": "2024-01-01T00:00:00"},
            "broken": 42
        }))
        .unwrap();

        assert_eq!(records.message("new_user"), Some("plain text"));
        assert_eq!(records.message("old_user"), Some("nested text"));
        assert_eq!(records.message("broken"), None);
    }

    #[test]
    fn test_merge_prefers_later_set() {
        let mut first: ChatRecordSet = [("A", "one"), ("B", "two")].into_iter().collect();
        let second: ChatRecordSet = [("B", "three"), ("C", "four")].into_iter().collect();
        first.merge(second);

        assert_eq!(first.message("B"), Some("three"));
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_trim_trailing_reports_changes() {
        let mut records: ChatRecordSet = [("A", "hi \r\n"), ("B", "ok")].into_iter().collect();
        assert!(records.trim_trailing());
        assert_eq!(records.message("A"), Some("hi"));
        assert!(!records.trim_trailing());
    }

    #[test]
    fn test_offline_status_drops_stream_info() {
        let status = StreamStatus::from_poll("acme", &LiveInfo::offline());
        assert!(!status.is_live);
        assert!(status.stream_info.is_none());
    }

    #[test]
    fn test_session_file_name_uses_start_time() {
        let session = SessionId::new("acme");
        let name = session.file_name();
        assert!(name.starts_with("recorded_chat_"));
        assert!(name.ends_with(".json"));
        assert_eq!(session, session.clone());
    }
}
