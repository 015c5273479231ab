//! JSON file helpers shared by every persisted type.
//!
//! Loading never fails the caller: a missing, empty or corrupt file is
//! reported as "no data". Saving goes through a temp file in the target
//! directory and a rename so a crash never leaves a half-written file.

use std::{
    fs,
    io::{ErrorKind, Write},
    path::Path,
};

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

/// Loads `path` as JSON, returning `None` if the file is missing or unusable.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No file to load");
            return None;
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Failed to read file");
            return None;
        }
    };

    if content.trim().is_empty() {
        tracing::warn!(path = %path.display(), "File is empty");
        return None;
    }

    serde_json::from_str(&content)
        .inspect_err(|e| tracing::warn!(error = %e, path = %path.display(), "Failed to parse file"))
        .ok()
}

/// Serializes `data` as indented JSON and atomically replaces `path` with it.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory {}", parent.display()))?;

    let mut content = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut content, formatter);
    data.serialize(&mut serializer)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    temp_file
        .write_all(&content)
        .and_then(|_| temp_file.flush())
        .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
    temp_file
        .persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    tracing::debug!(path = %path.display(), "Saved data");
    Ok(())
}
