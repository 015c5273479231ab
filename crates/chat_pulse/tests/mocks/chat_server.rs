use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use tokio::{net::TcpListener, sync::Notify, task::JoinHandle};
use tokio_tungstenite::{tungstenite::Message, WebSocketStream};

pub enum ServerAction {
    /// Reads until the client's JOIN line arrives
    AwaitJoin,
    Send(String),
    /// Reads until the client answers a PING
    AwaitPong,
    Notify(Arc<Notify>),
    Close,
    /// Reads until the client goes away
    Hold,
}

/// Single-connection chat server speaking the Twitch IRC-over-websocket
/// framing, driven by a fixed list of actions.
pub struct MockChatServer {
    pub url: String,
    pub received: Arc<Mutex<Vec<String>>>,
    pub handle: JoinHandle<()>,
}

impl MockChatServer {
    pub async fn start(actions: Vec<ServerAction>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);

        let handle = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

            for action in actions {
                match action {
                    ServerAction::AwaitJoin => {
                        read_until(&mut ws, &log, "JOIN").await;
                    }
                    ServerAction::Send(line) => {
                        if ws.send(Message::Text(line)).await.is_err() {
                            return;
                        }
                    }
                    ServerAction::AwaitPong => {
                        read_until(&mut ws, &log, "PONG").await;
                    }
                    ServerAction::Notify(notify) => notify.notify_one(),
                    ServerAction::Close => {
                        let _ = ws.close(None).await;
                        return;
                    }
                    ServerAction::Hold => {
                        read_until(&mut ws, &log, "\u{0}never").await;
                        return;
                    }
                }
            }
        });

        Self {
            url,
            received,
            handle,
        }
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

async fn read_until<S>(ws: &mut WebSocketStream<S>, log: &Mutex<Vec<String>>, prefix: &str) -> bool
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    while let Some(Ok(message)) = ws.next().await {
        if let Message::Text(text) = message {
            let found = text.starts_with(prefix);
            log.lock().unwrap().push(text);
            if found {
                return true;
            }
        }
    }
    false
}

pub fn privmsg(user: &str, text: &str) -> String {
    format!(
        "@badge-info=;color=#1E90FF;display-name={user};emotes=;mod=0 \
         :{lower}!{lower}@{lower}.tmi.twitch.tv PRIVMSG #acme :{text}\r\n",
        lower = user.to_lowercase()
    )
}

pub fn ping() -> String {
    "PING :tmi.twitch.tv\r\n".to_string()
}
