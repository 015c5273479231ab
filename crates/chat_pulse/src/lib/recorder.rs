pub mod builder;

use std::sync::Arc;

use chat_datastore::{DataStore, SessionId};
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    error::Error,
    extractor::DatasetExtractor,
    lifecycle::Lifecycle,
    session::{ChatCaptureSession, SessionConfig},
    twitch::StatusSource,
    watcher::{StreamEvent, StreamWatcher, TransitionHandler},
};

struct ActiveCapture<D> {
    session: Arc<ChatCaptureSession<D>>,
    task: JoinHandle<()>,
    // set once an offline transition started finishing this capture
    stopping: bool,
}

struct ControllerInner<D> {
    store: D,
    session_config: SessionConfig,
    extractor: DatasetExtractor,
    active: Mutex<Option<ActiveCapture<D>>>,
}

/// Starts a chat capture when the channel goes live, stops it and extracts
/// the dataset when it goes offline.
pub struct CaptureController<D> {
    inner: Arc<ControllerInner<D>>,
}

impl<D> Clone for CaptureController<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D> CaptureController<D>
where
    D: DataStore + Clone + Send + Sync + 'static,
{
    pub fn new(store: D, session_config: SessionConfig, extractor: DatasetExtractor) -> Self {
        CaptureController {
            inner: Arc::new(ControllerInner {
                store,
                session_config,
                extractor,
                active: Mutex::new(None),
            }),
        }
    }

    pub async fn is_capturing(&self) -> bool {
        self.inner.active.lock().await.is_some()
    }

    pub async fn current_session(&self) -> Option<SessionId> {
        self.inner
            .active
            .lock()
            .await
            .as_ref()
            .map(|active| active.session.id().clone())
    }

    #[tracing::instrument(skip(self))]
    async fn start_capture(&self, channel: &str) {
        let mut active = self.inner.active.lock().await;
        if active.is_some() {
            tracing::debug!(%channel, "Already recording chat");
            return;
        }

        tracing::info!(%channel, "Starting chat recording");
        let session = Arc::new(
            ChatCaptureSession::open(
                channel,
                self.inner.store.clone(),
                self.inner.session_config.clone(),
            )
            .await,
        );

        let controller = self.clone();
        let task_session = Arc::clone(&session);
        let task = tokio::spawn(async move {
            if let Err(e) = task_session.start().await {
                tracing::error!(error = %e, channel = %task_session.channel(), "Chat capture failed");
            }
            controller.on_session_ended(task_session.id()).await;
        });

        *active = Some(ActiveCapture {
            session,
            task,
            stopping: false,
        });
    }

    /// Finishes the active capture. It stays registered until its final save
    /// and extraction are done, so [`CaptureController::shutdown`] still finds
    /// it if this call is abandoned halfway.
    async fn stop_capture(&self, channel: &str) {
        let session = {
            let mut active = self.inner.active.lock().await;
            let Some(current) = active.as_mut() else {
                tracing::debug!(%channel, "Not recording chat, nothing to stop");
                return;
            };
            current.stopping = true;
            Arc::clone(&current.session)
        };

        tracing::info!(%channel, "Stopping chat recording");
        self.finish(&session).await;

        let Some(active) = self.inner.active.lock().await.take() else {
            return;
        };
        if let Err(e) = active.task.await {
            tracing::warn!(error = %e, %channel, "Chat capture task did not finish cleanly");
        }
    }

    /// Runs when a session's read loop returns. A session that ended on its own
    /// while still registered is finished the same way as on an offline
    /// transition.
    async fn on_session_ended(&self, id: &SessionId) {
        let ended = {
            let mut active = self.inner.active.lock().await;
            match active.as_ref() {
                Some(current) if current.session.id() == id && !current.stopping => {
                    active.take()
                }
                _ => None,
            }
        };

        if let Some(active) = ended {
            tracing::warn!(channel = %id.channel, "Chat session ended while live, finishing capture");
            self.finish(&active.session).await;
        }
    }

    async fn finish(&self, session: &ChatCaptureSession<D>) {
        session.stop().await;

        tracing::info!("Formatting chat logs into dataset");
        match self.inner.extractor.run() {
            Ok(dataset) => tracing::info!(messages = dataset.len(), "Dataset formatting complete"),
            Err(e) => tracing::error!(error = ?e, "Dataset formatting failed"),
        }
    }

    /// Stops a running capture with a final save, without extraction
    pub async fn shutdown(&self) {
        let Some(active) = self.inner.active.lock().await.take() else {
            return;
        };

        active.session.stop().await;
        if let Err(e) = active.task.await {
            tracing::warn!(error = %e, "Chat capture task did not finish cleanly");
        }
    }
}

impl<D> TransitionHandler for CaptureController<D>
where
    D: DataStore + Clone + Send + Sync + 'static,
{
    async fn on_transition(&self, event: StreamEvent) {
        if event.is_live {
            self.start_capture(&event.channel).await;
        } else {
            self.stop_capture(&event.channel).await;
        }
    }
}

/// Watches a channel and records its chat for as long as it is live.
pub struct AutoChatRecorder<S, D> {
    watcher: StreamWatcher<S, D, CaptureController<D>>,
}

impl<S, D> AutoChatRecorder<S, D>
where
    S: StatusSource + Send + Sync,
    D: DataStore + Clone + Send + Sync + 'static,
{
    pub fn watcher(&self) -> &StreamWatcher<S, D, CaptureController<D>> {
        &self.watcher
    }

    pub fn controller(&self) -> &CaptureController<D> {
        self.watcher.handler()
    }
}

impl<S, D> Lifecycle for AutoChatRecorder<S, D>
where
    S: StatusSource + Send + Sync,
    D: DataStore + Clone + Send + Sync + 'static,
{
    async fn start(&self) -> Result<(), Error> {
        tracing::info!(channel = %self.watcher.channel(), "Starting auto chat recorder");
        self.watcher.start().await
    }

    async fn stop(&self) {
        self.watcher.stop().await;
        self.controller().shutdown().await;
        tracing::info!(channel = %self.watcher.channel(), "Auto chat recorder stopped");
    }
}
