//! # Dataset extraction
//!
//! Turns every capture file under a directory into one flat list of cleaned
//! chat messages, ready to be handed to a fine-tuning job.

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use chat_datastore::{load_json, resolve_message, save_json, ChatRecordSet, Dataset};
use regex::Regex;
use walkdir::WalkDir;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());

// JSON-escaped code points, a surrogate pair counts as one sequence
static ESCAPED_CODEPOINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\u[0-9a-fA-F]{4}(?:\\u[0-9a-fA-F]{4})?").unwrap());

static BACKSLASH_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[a-zA-Z0-9]{2,}").unwrap());

/// Cleans one chat message.
///
/// Removes URLs, escaped code point sequences and the astral-plane characters
/// they encode (emoji), and leftover backslash tokens, then collapses
/// whitespace. The result is a fixed point, cleaning it again changes nothing.
///
/// # Returns
/// * `Some(text)` with the cleaned message.
/// * `None` if nothing is left after cleaning.
pub fn clean_message(message: &str) -> Option<String> {
    let mut current = message.to_string();
    loop {
        let next = clean_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    (!current.is_empty()).then_some(current)
}

fn clean_pass(message: &str) -> String {
    let without_urls = URL_RE.replace_all(message, "");
    let without_escapes = ESCAPED_CODEPOINT_RE.replace_all(&without_urls, "");
    let without_tokens = BACKSLASH_TOKEN_RE.replace_all(&without_escapes, "");

    without_tokens
        .chars()
        .filter(|c| (*c as u32) < 0x10000)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Capture files under `capture_dir`, in traversal order: directories and
/// files sorted by name, depth first.
pub fn capture_files(capture_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(capture_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| {
            entry
                .inspect_err(|e| tracing::warn!(error = %e, "Failed to read capture directory entry"))
                .ok()
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect()
}

/// Merges every capture file under `capture_dir` into one record set.
///
/// Files are visited in [`capture_files`] order and a username seen again in a
/// later file takes that file's message. Unreadable files are skipped.
pub fn merge_capture_files(capture_dir: &Path) -> ChatRecordSet {
    let mut merged = ChatRecordSet::new();

    for path in capture_files(capture_dir) {
        match load_json::<ChatRecordSet>(&path) {
            Some(records) => {
                tracing::debug!(path = %path.display(), users = records.len(), "Merging capture file");
                merged.merge(records);
            }
            None => tracing::warn!(path = %path.display(), "Skipping unreadable capture file"),
        }
    }

    merged
}

/// Builds the dataset from a record set, dropping entries that cannot be
/// resolved or that are empty once cleaned.
pub fn build_dataset(records: &ChatRecordSet) -> Dataset {
    let mut dataset = Dataset::default();

    for (username, value) in records.iter() {
        let Some(message) = resolve_message(value) else {
            tracing::warn!(%username, record = %value, "Skipping malformed chat record");
            continue;
        };
        if let Some(cleaned) = clean_message(message) {
            dataset.push(cleaned);
        }
    }

    dataset
}

#[derive(Debug, Clone)]
pub struct DatasetExtractor {
    capture_dir: PathBuf,
    dataset_path: PathBuf,
}

impl DatasetExtractor {
    pub fn new(capture_dir: impl Into<PathBuf>, dataset_path: impl Into<PathBuf>) -> Self {
        DatasetExtractor {
            capture_dir: capture_dir.into(),
            dataset_path: dataset_path.into(),
        }
    }

    pub fn capture_dir(&self) -> &Path {
        &self.capture_dir
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    pub fn extract(&self) -> Dataset {
        build_dataset(&merge_capture_files(&self.capture_dir))
    }

    /// Extracts the dataset and overwrites the dataset file with it
    #[tracing::instrument(skip(self), fields(capture_dir = %self.capture_dir.display()))]
    pub fn run(&self) -> anyhow::Result<Dataset> {
        let dataset = self.extract();

        save_json(&self.dataset_path, &dataset).inspect_err(|e| {
            tracing::error!(error = ?e, path = %self.dataset_path.display(), "Failed to save dataset")
        })?;

        tracing::info!(
            path = %self.dataset_path.display(),
            messages = dataset.len(),
            "Saved dataset"
        );
        Ok(dataset)
    }
}
