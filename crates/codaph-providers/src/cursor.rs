use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Resumption state for one provider's history-sync pass over one repo,
/// persisted at `<mirror>/index/<repoId>/<provider>-history-sync.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySyncState {
    #[serde(default)]
    pub files: std::collections::HashMap<String, FileCursor>,
}

/// Per-file resumption cursor: how far the reader got, and the stat
/// fingerprint used to detect rotation/truncation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCursor {
    pub size: u64,
    pub mtime_millis: i64,
    pub line_count: u64,
    pub sequence: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Set once the file's derived cwd was found to be outside the
    /// project; skip the file entirely on subsequent passes.
    #[serde(default)]
    pub out_of_scope: bool,
}

impl HistorySyncState {
    pub fn path(mirror_root: &Path, repo_id: &str, provider: &str) -> PathBuf {
        mirror_root.join("index").join(repo_id).join(format!("{provider}-history-sync.json"))
    }

    pub fn load(mirror_root: &Path, repo_id: &str, provider: &str) -> Result<Self> {
        let path = Self::path(mirror_root, repo_id, provider);
        Ok(codaph_core::read_json_or_default(&path))
    }

    pub fn persist(&self, mirror_root: &Path, repo_id: &str, provider: &str) -> Result<()> {
        let path = Self::path(mirror_root, repo_id, provider);
        Ok(codaph_core::write_json_pretty_atomic(&path, self)?)
    }

    /// True when the file either has no recorded cursor, or the cursor's
    /// line count exceeds the current file length (truncation/rotation) —
    /// both cases mean "reparse the whole file from zero".
    pub fn should_reset(&self, key: &str, current_line_count: u64) -> bool {
        match self.files.get(key) {
            None => false,
            Some(cursor) => cursor.line_count > current_line_count,
        }
    }

    pub fn cursor_for(&self, key: &str) -> FileCursor {
        self.files.get(key).cloned().unwrap_or_default()
    }

    pub fn set_cursor(&mut self, key: impl Into<String>, cursor: FileCursor) {
        self.files.insert(key.into(), cursor);
    }
}
