#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    ParseError(&'static str),
    #[error("Status lookup failed for '{channel}': {reason}")]
    Lookup { channel: String, reason: String },
    #[error("Chat connection failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
}
