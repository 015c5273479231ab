use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chat_datastore::{ChatRecordSet, DataStore, SessionId, StreamStatus};
use tokio::sync::Semaphore;

#[derive(Clone, Default)]
pub struct MemoryDataStore {
    pub statuses: Arc<Mutex<HashMap<String, StreamStatus>>>,
    pub status_saves: Arc<Mutex<Vec<StreamStatus>>>,
    pub records: Arc<Mutex<HashMap<String, ChatRecordSet>>>,
    pub record_saves: Arc<Mutex<Vec<ChatRecordSet>>>,
    pub fail_with: Option<String>,
    /// When set, every chat-record save consumes one permit first
    pub save_gate: Option<Arc<Semaphore>>,
}

impl MemoryDataStore {
    pub fn with_status(status: StreamStatus) -> Self {
        let store = Self::default();
        store
            .statuses
            .lock()
            .unwrap()
            .insert(status.channel.clone(), status);
        store
    }

    pub fn with_records(session: &SessionId, records: ChatRecordSet) -> Self {
        let store = Self::default();
        store
            .records
            .lock()
            .unwrap()
            .insert(Self::key(session), records);
        store
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            save_gate: Some(gate),
            ..Default::default()
        }
    }

    pub fn record_saves(&self) -> Vec<ChatRecordSet> {
        self.record_saves.lock().unwrap().clone()
    }

    pub fn status_saves(&self) -> Vec<StreamStatus> {
        self.status_saves.lock().unwrap().clone()
    }

    fn key(session: &SessionId) -> String {
        format!("{}/{}", session.channel, session.file_name())
    }
}

impl DataStore for MemoryDataStore {
    async fn load_stream_status(&self, channel: &str) -> Option<StreamStatus> {
        self.statuses.lock().unwrap().get(channel).cloned()
    }

    async fn save_stream_status(&self, status: &StreamStatus) -> anyhow::Result<()> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        self.statuses
            .lock()
            .unwrap()
            .insert(status.channel.clone(), status.clone());
        self.status_saves.lock().unwrap().push(status.clone());
        Ok(())
    }

    async fn load_chat_records(&self, session: &SessionId) -> Option<ChatRecordSet> {
        self.records.lock().unwrap().get(&Self::key(session)).cloned()
    }

    async fn save_chat_records(
        &self,
        session: &SessionId,
        records: &ChatRecordSet,
    ) -> anyhow::Result<()> {
        if let Some(gate) = &self.save_gate {
            gate.acquire().await?.forget();
        }
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        self.records
            .lock()
            .unwrap()
            .insert(Self::key(session), records.clone());
        self.record_saves.lock().unwrap().push(records.clone());
        Ok(())
    }
}
