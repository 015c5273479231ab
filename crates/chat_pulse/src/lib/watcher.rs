use std::{future::Future, sync::Arc, time::Duration};

use chat_datastore::{DataStore, LiveInfo, StreamStatus};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{error::Error, lifecycle::Lifecycle, prober::StatusProber, twitch::StatusSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Offline,
    Live,
}

impl From<bool> for WatchState {
    fn from(is_live: bool) -> Self {
        if is_live {
            WatchState::Live
        } else {
            WatchState::Offline
        }
    }
}

/// Edge transition of a channel's live status
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub channel: String,
    pub is_live: bool,
    /// Stream metadata, only present on a transition to live
    pub info: Option<LiveInfo>,
}

pub trait TransitionHandler {
    fn on_transition(&self, event: StreamEvent) -> impl Future<Output = ()> + Send;
}

impl<T: TransitionHandler + Send + Sync> TransitionHandler for Arc<T> {
    async fn on_transition(&self, event: StreamEvent) {
        (**self).on_transition(event).await
    }
}

/// Polls a channel's status on a fixed interval and reports edge transitions
/// to its handler.
///
/// The initial state comes from the persisted [`StreamStatus`] of the channel
/// and defaults to offline. A watcher is single use: once stopped it cannot be
/// started again, and `stop` returns only after the running poll has settled.
pub struct StreamWatcher<S, D, H> {
    channel: String,
    interval: Duration,
    prober: StatusProber<S>,
    store: D,
    handler: H,
    state: Mutex<Option<WatchState>>,
    cancel: CancellationToken,
    // held by the poll loop for as long as it runs
    running: Mutex<()>,
}

impl<S, D, H> StreamWatcher<S, D, H>
where
    S: StatusSource + Send + Sync,
    D: DataStore + Send + Sync,
    H: TransitionHandler + Send + Sync,
{
    pub fn new(channel: impl Into<String>, source: S, store: D, handler: H) -> Self {
        StreamWatcher {
            channel: channel.into(),
            interval: Duration::from_secs(60),
            prober: StatusProber::new(source),
            store,
            handler,
            state: Mutex::new(None),
            cancel: CancellationToken::new(),
            running: Mutex::new(()),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Current state, resolving it from the persisted status on first use
    pub async fn state(&self) -> WatchState {
        let mut state = self.state.lock().await;
        match *state {
            Some(current) => current,
            None => {
                let resolved = self
                    .store
                    .load_stream_status(&self.channel)
                    .await
                    .map(|status| WatchState::from(status.is_live))
                    .unwrap_or(WatchState::Offline);
                tracing::debug!(channel = %self.channel, state = ?resolved, "Resolved initial state");
                *state = Some(resolved);
                resolved
            }
        }
    }

    /// Runs a single poll: probes the channel, notifies the handler if the
    /// status flipped and persists the result.
    ///
    /// # Returns
    /// * `Ok(Some(event))` if the poll produced a transition.
    /// * `Ok(None)` if the status is unchanged.
    /// * `Err(_)` if the probe failed; state and persisted status are untouched.
    #[tracing::instrument(skip(self), fields(channel = %self.channel))]
    pub async fn poll_once(&self) -> Result<Option<StreamEvent>, Error> {
        let info = self.prober.probe(&self.channel).await?;

        let previous = self.state().await;
        let next = WatchState::from(info.is_live);
        *self.state.lock().await = Some(next);

        let event = (previous != next).then(|| StreamEvent {
            channel: self.channel.clone(),
            is_live: info.is_live,
            info: info.is_live.then(|| info.clone()),
        });

        if let Some(event) = &event {
            if event.is_live {
                tracing::info!(
                    channel = %self.channel,
                    title = info.title.as_deref().unwrap_or("No title"),
                    "Channel is now LIVE"
                );
            } else {
                tracing::info!(channel = %self.channel, "Channel is now OFFLINE");
            }
            self.handler.on_transition(event.clone()).await;
        }

        let status = StreamStatus::from_poll(&self.channel, &info);
        if let Err(e) = self.store.save_stream_status(&status).await {
            tracing::warn!(error = ?e, channel = %self.channel, "Failed to persist stream status");
        }

        Ok(event)
    }
}

impl<S, D, H> Lifecycle for StreamWatcher<S, D, H>
where
    S: StatusSource + Send + Sync,
    D: DataStore + Send + Sync,
    H: TransitionHandler + Send + Sync,
{
    async fn start(&self) -> Result<(), Error> {
        let _running = self.running.lock().await;
        tracing::info!(
            channel = %self.channel,
            interval_secs = self.interval.as_secs_f64(),
            "Starting stream monitor"
        );

        while !self.cancel.is_cancelled() {
            if let Err(e) = self.poll_once().await {
                tracing::error!(error = %e, channel = %self.channel, "Error monitoring stream");
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!(channel = %self.channel, "Stream monitor stopped");
        Ok(())
    }

    /// Cancels the loop and waits for an in-flight poll, including its
    /// handler call, to complete.
    async fn stop(&self) {
        self.cancel.cancel();
        tracing::info!(channel = %self.channel, "Stopping stream monitor");
        let _running = self.running.lock().await;
    }
}
