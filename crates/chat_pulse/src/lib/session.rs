use std::sync::atomic::{AtomicUsize, Ordering};

use chat_datastore::{ChatRecordSet, DataStore, SessionId};
use futures::{SinkExt, StreamExt};
use tokio::{net::TcpStream, sync::Mutex};
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::{
    error::Error,
    lifecycle::Lifecycle,
    twitch::irc::{self, ChatLine},
};

type ChatStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub irc_url: String,
    pub nickname: String,
    /// Accepted messages between two saves of the record set
    pub batch_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            irc_url: "wss://irc-ws.chat.twitch.tv:443".into(),
            nickname: irc::ANONYMOUS_NICK.into(),
            batch_size: 250,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadEnd {
    Stopped,
    Closed,
}

/// Records the latest chat message of every user of a channel.
///
/// Records are saved every `batch_size` accepted messages, when the
/// connection drops and when the session is stopped.
pub struct ChatCaptureSession<D> {
    id: SessionId,
    config: SessionConfig,
    store: D,
    records: Mutex<ChatRecordSet>,
    accepted: AtomicUsize,
    cancel: Mutex<CancellationToken>,
    // held by the read loop for as long as it runs
    reader: Mutex<()>,
}

impl<D> ChatCaptureSession<D>
where
    D: DataStore + Send + Sync,
{
    /// Creates a session for `channel` starting now
    pub async fn open(channel: impl Into<String>, store: D, config: SessionConfig) -> Self {
        Self::resume(SessionId::new(channel), store, config).await
    }

    /// Creates a session for `id`, merging in whatever an earlier run already
    /// saved for it.
    pub async fn resume(id: SessionId, store: D, config: SessionConfig) -> Self {
        let mut records = ChatRecordSet::new();

        if let Some(mut existing) = store.load_chat_records(&id).await {
            let cleaned = existing.trim_trailing();
            tracing::info!(channel = %id.channel, users = existing.len(), "Loaded existing messages");

            if cleaned {
                match store.save_chat_records(&id, &existing).await {
                    Ok(()) => tracing::info!(channel = %id.channel, "Saved cleaned messages"),
                    Err(e) => {
                        tracing::error!(error = ?e, channel = %id.channel, "Failed to save cleaned messages")
                    }
                }
            }
            records = existing;
        }

        ChatCaptureSession {
            id,
            config,
            store,
            records: Mutex::new(records),
            accepted: AtomicUsize::new(0),
            cancel: Mutex::new(CancellationToken::new()),
            reader: Mutex::new(()),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn channel(&self) -> &str {
        &self.id.channel
    }

    /// Number of messages accepted since the session was created or cleared
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub async fn records(&self) -> ChatRecordSet {
        self.records.lock().await.clone()
    }

    /// Resets the in-memory records so the session can be reused. Files
    /// already written are left alone.
    pub async fn clear(&self) {
        self.records.lock().await.clear();
        self.accepted.store(0, Ordering::SeqCst);
        *self.cancel.lock().await = CancellationToken::new();
    }

    /// Writes the current records to the session's capture file
    pub async fn save(&self) {
        let records = self.records.lock().await.clone();
        if let Err(e) = self.store.save_chat_records(&self.id, &records).await {
            tracing::error!(error = ?e, channel = %self.id.channel, "Failed to save chat records");
        }
    }

    #[tracing::instrument(skip(self), fields(channel = %self.id.channel))]
    async fn connect(&self) -> Result<ChatStream, Error> {
        let (mut stream, _) = tokio_tungstenite::connect_async(self.config.irc_url.as_str())
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error connecting to chat"))?;

        for line in irc::handshake(&self.config.nickname, &self.id.channel) {
            stream
                .send(Message::Text(line))
                .await
                .inspect_err(|e| tracing::error!(error = %e, "Error sending chat handshake"))?;
        }

        tracing::info!(url = %self.config.irc_url, "Connected to chat");
        Ok(stream)
    }

    async fn read_messages(&self, stream: ChatStream, cancel: &CancellationToken) -> ReadEnd {
        let (mut write, mut read) = stream.split();

        let end = 'read: loop {
            let frame = tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'read ReadEnd::Stopped,
                frame = read.next() => frame,
            };

            match frame {
                Some(Ok(Message::Text(text))) => {
                    for line in text.split("\r\n").filter(|l| !l.is_empty()) {
                        match irc::parse_line(line) {
                            Ok(ChatLine::Ping(payload)) => {
                                if let Err(e) = write.send(Message::Text(irc::pong(&payload))).await
                                {
                                    tracing::error!(error = %e, "Failed to answer PING");
                                    break 'read ReadEnd::Closed;
                                }
                            }
                            Ok(ChatLine::Privmsg { username, text }) => {
                                self.accept(username, &text).await
                            }
                            Ok(ChatLine::Other) => {}
                            Err(e) => {
                                tracing::warn!(error = %e, %line, "Dropping malformed chat line")
                            }
                        }
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    if let Err(e) = write.send(Message::Pong(payload)).await {
                        tracing::error!(error = %e, "Failed to answer websocket ping");
                        break ReadEnd::Closed;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::warn!(?frame, "Chat connection closed by server");
                    break ReadEnd::Closed;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Error reading messages");
                    break ReadEnd::Closed;
                }
                None => {
                    tracing::warn!("Chat connection closed");
                    break ReadEnd::Closed;
                }
            }
        };

        if let Err(e) = write.close().await {
            tracing::debug!(error = %e, "Chat connection already closed");
        }
        end
    }

    async fn accept(&self, username: String, text: &str) {
        let text = text.trim_end_matches(['\r', '\n', ' ']);
        if text.is_empty() {
            return;
        }

        let batch = {
            let mut records = self.records.lock().await;
            tracing::debug!(%username, %text, "Chat message");
            records.insert(username, text);

            let count = self.accepted.fetch_add(1, Ordering::SeqCst) + 1;
            (count % self.config.batch_size.max(1) == 0).then(|| records.clone())
        };

        if let Some(records) = batch {
            match self.store.save_chat_records(&self.id, &records).await {
                Ok(()) => tracing::info!(
                    batch_size = self.config.batch_size,
                    users = records.len(),
                    "Saved batch of messages"
                ),
                Err(e) => tracing::error!(error = ?e, "Failed to save batch of messages"),
            }
        }
    }
}

impl<D> Lifecycle for ChatCaptureSession<D>
where
    D: DataStore + Send + Sync,
{
    /// Connects and reads until stopped or the connection drops.
    ///
    /// A failed connect or handshake is returned as `Err(Error::Connect)`. A
    /// connection lost while reading ends the session with a final save and
    /// `Ok(())`.
    async fn start(&self) -> Result<(), Error> {
        let cancel = self.cancel.lock().await.clone();
        let _reader = self.reader.lock().await;

        let stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            stream = self.connect() => stream?,
        };

        if self.read_messages(stream, &cancel).await == ReadEnd::Closed {
            self.save().await;
        }

        tracing::info!(
            channel = %self.id.channel,
            accepted = self.accepted(),
            "Chat capture ended"
        );
        Ok(())
    }

    /// Stops reading, waits for the read loop to settle and saves.
    async fn stop(&self) {
        self.cancel.lock().await.cancel();
        let _reader = self.reader.lock().await;
        self.save().await;
        tracing::info!(channel = %self.id.channel, "Stopped chat capture");
    }
}
