use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    datastore::DataStore,
    json::{load_json, save_json},
    ChatRecordSet, SessionId, StreamStatus,
};

/// JSON files under a single data directory:
///
/// ```text
/// <root>/stream_status_<channel>.json
/// <root>/chat_logs/<channel>/recorded_chat_<timestamp>.json
/// <root>/formatted_logs/dataset.json
/// ```
#[derive(Debug, Clone)]
pub struct FsDataStore {
    root: PathBuf,
}

impl FsDataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsDataStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn status_path(&self, channel: &str) -> PathBuf {
        self.root.join(format!("stream_status_{channel}.json"))
    }

    /// Directory scanned for capture files
    pub fn capture_dir(&self) -> PathBuf {
        self.root.join("chat_logs")
    }

    pub fn chat_records_path(&self, session: &SessionId) -> PathBuf {
        self.capture_dir()
            .join(&session.channel)
            .join(session.file_name())
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.root.join("formatted_logs").join("dataset.json")
    }
}

impl DataStore for FsDataStore {
    async fn load_stream_status(&self, channel: &str) -> Option<StreamStatus> {
        load_json(&self.status_path(channel))
    }

    async fn save_stream_status(&self, status: &StreamStatus) -> anyhow::Result<()> {
        let path = self.status_path(&status.channel);
        save_json(&path, status)
            .inspect_err(|e| {
                tracing::error!(error = ?e, channel = %status.channel, "Failed to save stream status")
            })
            .context("Failed to save stream status")
    }

    async fn load_chat_records(&self, session: &SessionId) -> Option<ChatRecordSet> {
        load_json(&self.chat_records_path(session))
    }

    async fn save_chat_records(
        &self,
        session: &SessionId,
        records: &ChatRecordSet,
    ) -> anyhow::Result<()> {
        let path = self.chat_records_path(session);
        save_json(&path, records)
            .inspect_err(|e| {
                tracing::error!(error = ?e, path = %path.display(), "Failed to save chat records")
            })
            .context("Failed to save chat records")?;

        tracing::info!(
            path = %path.display(),
            users = records.len(),
            "Saved chat records"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LiveInfo;
    use tempfile::tempdir;

    #[test]
    fn test_layout_paths() {
        let store = FsDataStore::new("/data");
        let session = SessionId::new("acme");

        assert_eq!(
            store.status_path("acme"),
            PathBuf::from("/data/stream_status_acme.json")
        );
        assert_eq!(
            store.dataset_path(),
            PathBuf::from("/data/formatted_logs/dataset.json")
        );
        assert!(store
            .chat_records_path(&session)
            .starts_with("/data/chat_logs/acme"));
    }

    #[tokio::test]
    async fn test_status_round_trip() {
        let dir = tempdir().unwrap();
        let store = FsDataStore::new(dir.path());
        assert!(store.load_stream_status("acme").await.is_none());

        let info = LiveInfo {
            is_live: true,
            title: Some("Building things".into()),
            viewer_count: Some(42),
            ..Default::default()
        };
        let status = StreamStatus::from_poll("acme", &info);
        store.save_stream_status(&status).await.unwrap();

        let loaded = store.load_stream_status("acme").await.unwrap();
        assert_eq!(loaded, status);
    }

    #[tokio::test]
    async fn test_chat_records_round_trip() {
        let dir = tempdir().unwrap();
        let store = FsDataStore::new(dir.path());
        let session = SessionId::new("acme");
        let records: ChatRecordSet = [("A", "hello"), ("B", "hi")].into_iter().collect();

        store.save_chat_records(&session, &records).await.unwrap();

        assert!(store.chat_records_path(&session).exists());
        assert_eq!(store.load_chat_records(&session).await, Some(records));
    }
}
