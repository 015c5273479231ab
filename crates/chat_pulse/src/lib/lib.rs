mod error;
pub mod extractor;
mod lifecycle;
mod prober;
mod recorder;
pub mod session;
pub mod tracing;
pub mod twitch;
pub mod types;
pub mod watcher;

pub use error::Error;
pub use extractor::{clean_message, DatasetExtractor};
pub use lifecycle::Lifecycle;
pub use prober::StatusProber;
pub use recorder::{builder::AutoChatRecorderBuilder, AutoChatRecorder, CaptureController};
pub use session::{ChatCaptureSession, SessionConfig};
pub use watcher::{StreamEvent, StreamWatcher, TransitionHandler, WatchState};
