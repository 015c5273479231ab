use std::time::Duration;

use chat_datastore::DataStore;

use crate::{
    extractor::DatasetExtractor,
    recorder::{AutoChatRecorder, CaptureController},
    session::SessionConfig,
    twitch::StatusSource,
    watcher::StreamWatcher,
};

pub struct AutoChatRecorderBuilder<S = (), D = ()> {
    channel: String,
    status_source: S,
    store: D,
    check_interval: Duration,
    session_config: SessionConfig,
    extractor: Option<DatasetExtractor>,
}

impl AutoChatRecorderBuilder {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            status_source: (),
            store: (),
            check_interval: Duration::from_secs(600),
            session_config: SessionConfig::default(),
            extractor: None,
        }
    }
}

impl<S, D> AutoChatRecorderBuilder<S, D> {
    pub fn status_source<S2: StatusSource + Send + Sync>(
        self,
        status_source: S2,
    ) -> AutoChatRecorderBuilder<S2, D> {
        AutoChatRecorderBuilder {
            channel: self.channel,
            status_source,
            store: self.store,
            check_interval: self.check_interval,
            session_config: self.session_config,
            extractor: self.extractor,
        }
    }

    pub fn store<D2: DataStore + Clone + Send + Sync + 'static>(
        self,
        store: D2,
    ) -> AutoChatRecorderBuilder<S, D2> {
        AutoChatRecorderBuilder {
            channel: self.channel,
            status_source: self.status_source,
            store,
            check_interval: self.check_interval,
            session_config: self.session_config,
            extractor: self.extractor,
        }
    }

    pub fn check_interval(mut self, check_interval: Duration) -> Self {
        self.check_interval = check_interval;
        self
    }

    pub fn irc_url(mut self, irc_url: impl Into<String>) -> Self {
        self.session_config.irc_url = irc_url.into();
        self
    }

    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.session_config.nickname = nickname.into();
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.session_config.batch_size = batch_size;
        self
    }

    pub fn extractor(mut self, extractor: DatasetExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }
}

impl<S, D> AutoChatRecorderBuilder<S, D>
where
    S: StatusSource + Send + Sync,
    D: DataStore + Clone + Send + Sync + 'static,
{
    pub fn build(self) -> AutoChatRecorder<S, D> {
        let extractor = self.extractor.unwrap_or_else(|| {
            DatasetExtractor::new("data/chat_logs", "data/formatted_logs/dataset.json")
        });
        let controller = CaptureController::new(self.store.clone(), self.session_config, extractor);

        AutoChatRecorder {
            watcher: StreamWatcher::new(self.channel, self.status_source, self.store, controller)
                .with_interval(self.check_interval),
        }
    }
}
