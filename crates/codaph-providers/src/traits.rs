use std::path::{Path, PathBuf};

use serde_json::Value;

/// One event synthesized out of a provider transcript record.
#[derive(Debug, Clone)]
pub struct ProjectedEvent {
    pub event_type: String,
    pub payload: Value,
    pub ts: Option<String>,
}

impl ProjectedEvent {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self { event_type: event_type.into(), payload, ts: None }
    }

    pub fn with_ts(mut self, ts: impl Into<String>) -> Self {
        self.ts = Some(ts.into());
        self
    }
}

/// Provider-specific slice of the shared history-backfill algorithm: how to
/// find candidate files, split them into records, derive a session/cwd, and
/// project each record into zero-or-more captured events.
///
/// The shared driver (traversal, cursoring, resumption, `thread.started`
/// synthesis) lives in [`crate::sync`] and is identical across providers.
pub trait ProviderReader: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Default on-disk root for this provider's session history, or `None`
    /// if the provider has no default (history root must be supplied).
    fn default_history_root(&self) -> Option<PathBuf>;

    /// List candidate transcript files under `history_root`, newest
    /// consideration order unspecified — the cursor makes ordering
    /// immaterial for correctness.
    fn list_candidates(&self, history_root: &Path) -> Vec<PathBuf>;

    /// Split raw file bytes into provider-native records (JSONL lines or a
    /// parsed JSON array, depending on the provider).
    fn split_records(&self, bytes: &[u8]) -> Vec<Value>;

    /// Peek at the records (typically early ones) to find the session id
    /// and working directory the file belongs to.
    fn derive_session_and_cwd(&self, records: &[Value]) -> (Option<String>, Option<String>);

    /// Project one record into zero-or-more captured-event tuples.
    fn project_record(&self, record: &Value) -> Vec<ProjectedEvent>;
}
