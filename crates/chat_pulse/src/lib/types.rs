use chat_datastore::LiveInfo;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Envelope of every Helix collection response
#[derive(Debug, Deserialize)]
pub struct HelixResponse<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixUser {
    pub id: String,
    pub login: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixStream {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_login: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub viewer_count: u64,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
}

impl From<HelixStream> for LiveInfo {
    fn from(stream: HelixStream) -> Self {
        let non_empty = |s: String| (!s.is_empty()).then_some(s);

        LiveInfo {
            is_live: true,
            title: non_empty(stream.title),
            game: non_empty(stream.game_name),
            viewer_count: Some(stream.viewer_count),
            started_at: stream.started_at,
        }
    }
}
