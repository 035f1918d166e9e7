use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One per-day JSONL segment's metadata, as tracked in a repo's manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMeta {
    pub id: String,
    pub relative_path: String,
    pub from: String,
    pub to: String,
    pub event_count: u64,
}

/// `{repoId, segments}` — the manifest of all segments written for one repo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoManifest {
    pub repo_id: String,
    pub segments: BTreeMap<String, SegmentMeta>,
}

impl RepoManifest {
    pub fn empty(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            segments: BTreeMap::new(),
        }
    }
}

/// One sparse-index entry: a time window, event count, and the segments that
/// contributed to it, plus cross-links to related sessions/threads/actors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseEntry {
    pub from: String,
    pub to: String,
    pub event_count: u64,
    pub segments: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub threads: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub actors: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub sessions: BTreeSet<String>,
}

impl SparseEntry {
    /// Stretch this entry's window to include `ts`, bump its count, and
    /// record the contributing segment. String comparison is correct for
    /// ISO-8601 UTC timestamps.
    pub fn absorb(&mut self, ts: &str, segment_relative_path: &str) {
        if self.from.is_empty() || ts < self.from.as_str() {
            self.from = ts.to_string();
        }
        if self.to.is_empty() || ts > self.to.as_str() {
            self.to = ts.to_string();
        }
        self.event_count += 1;
        self.segments.insert(segment_relative_path.to_string());
    }
}

/// `{sessions, threads, actors}` — the sparse index for one repo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseIndex {
    #[serde(default)]
    pub sessions: BTreeMap<String, SparseEntry>,
    #[serde(default)]
    pub threads: BTreeMap<String, SparseEntry>,
    #[serde(default)]
    pub actors: BTreeMap<String, SparseEntry>,
}

/// Where one eventId landed — the dedup oracle's value type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventIdEntry {
    pub segment: String,
    pub ts: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
}

/// `{repoId, events}` — maps eventId to its stored location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventIdIndex {
    pub repo_id: String,
    #[serde(default)]
    pub events: BTreeMap<String, EventIdEntry>,
}

impl EventIdIndex {
    pub fn empty(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            events: BTreeMap::new(),
        }
    }
}

/// Who/what initiated a workflow run; drives cooldown and auto-pull gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Manual,
    TuiSync,
    TuiStartup,
    HookPostCommit,
    HookPostPush,
    HookAgentComplete,
}

impl TriggerSource {
    /// Hooks and TUI-startup runs are subject to the cooldown window.
    pub fn is_cooldown_sensitive(&self) -> bool {
        matches!(
            self,
            TriggerSource::HookPostCommit
                | TriggerSource::HookPostPush
                | TriggerSource::HookAgentComplete
                | TriggerSource::TuiStartup
        )
    }

    pub fn is_hook(&self) -> bool {
        matches!(
            self,
            TriggerSource::HookPostCommit | TriggerSource::HookPostPush | TriggerSource::HookAgentComplete
        )
    }

    /// User-driven syncs are the set gated by `autoPullOnSync = false`.
    pub fn is_user_driven_sync(&self) -> bool {
        matches!(
            self,
            TriggerSource::TuiSync
                | TriggerSource::Manual
                | TriggerSource::HookAgentComplete
                | TriggerSource::HookPostPush
                | TriggerSource::TuiStartup
        )
    }
}

/// Per-provider event counts recorded after one history-backfill push.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPushCount {
    pub provider: String,
    pub files_scanned: u64,
    pub events_ingested: u64,
    pub deduplicated: u64,
}

/// Per-repo summary of the last history-backfill ("push") run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPushState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_trigger_source: Option<TriggerSource>,
    #[serde(default)]
    pub provider_counts: Vec<ProviderPushCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// `{pending, source, ts}` — set when a hook could not acquire the sync lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTrigger {
    pub pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<TriggerSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
}

/// Per-repo summary of the last remote-sync ("pull") run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSyncState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_trigger_source: Option<TriggerSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_timeline_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_timeline_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_imported: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deduplicated: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_skipped: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_max_ts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_snapshot_fingerprint: Option<String>,
    #[serde(default)]
    pub consecutive_same_snapshot_count: u32,
    #[serde(default)]
    pub suspected_server_cap: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default)]
    pub pending_trigger: PendingTrigger,
}
