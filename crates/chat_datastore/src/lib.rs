//! # Chat Datastore
//!
//! Persisted state of the chat capture pipeline: the last known status of a
//! watched channel, the per-session chat records and the cleaned dataset.
//!
//! Everything is stored as JSON files. The [`DataStore`] trait is the seam
//! used by the watcher and the capture session, [`FsDataStore`] lays the
//! files out under one data directory.

mod datastore;
mod domain;
mod json;

pub use datastore::fs::FsDataStore;
pub use datastore::DataStore;
pub use domain::{resolve_message, ChatRecordSet, Dataset, LiveInfo, SessionId, StreamStatus};
pub use json::{load_json, save_json};
