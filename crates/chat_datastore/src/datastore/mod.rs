use std::{future::Future, sync::Arc};

use crate::{ChatRecordSet, SessionId, StreamStatus};

pub mod fs;

pub trait DataStore {
    /// Last persisted status of `channel`, if any was recorded
    fn load_stream_status(&self, channel: &str)
        -> impl Future<Output = Option<StreamStatus>> + Send;

    fn save_stream_status(
        &self,
        status: &StreamStatus,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Records previously saved for `session`, used to resume a capture file
    fn load_chat_records(
        &self,
        session: &SessionId,
    ) -> impl Future<Output = Option<ChatRecordSet>> + Send;

    fn save_chat_records(
        &self,
        session: &SessionId,
        records: &ChatRecordSet,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl<T: DataStore + Send + Sync> DataStore for Arc<T> {
    async fn load_stream_status(&self, channel: &str) -> Option<StreamStatus> {
        (**self).load_stream_status(channel).await
    }

    async fn save_stream_status(&self, status: &StreamStatus) -> anyhow::Result<()> {
        (**self).save_stream_status(status).await
    }

    async fn load_chat_records(&self, session: &SessionId) -> Option<ChatRecordSet> {
        (**self).load_chat_records(session).await
    }

    async fn save_chat_records(
        &self,
        session: &SessionId,
        records: &ChatRecordSet,
    ) -> anyhow::Result<()> {
        (**self).save_chat_records(session, records).await
    }
}
