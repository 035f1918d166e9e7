use std::path::{Path, PathBuf};

use codaph_types::{LocalPushState, ProviderPushCount, RemoteSyncState};
use serde::Deserialize;

use crate::error::Result;

fn index_dir(mirror_root: &Path, repo_id: &str) -> PathBuf {
    mirror_root.join("index").join(repo_id)
}

fn local_push_state_path(mirror_root: &Path, repo_id: &str) -> PathBuf {
    index_dir(mirror_root, repo_id).join("local-push-state.json")
}

fn legacy_local_push_state_path(mirror_root: &Path, repo_id: &str) -> PathBuf {
    index_dir(mirror_root, repo_id).join("codex-local-push-state.json")
}

fn remote_sync_state_path(mirror_root: &Path, repo_id: &str) -> PathBuf {
    index_dir(mirror_root, repo_id).join("remote-sync-state.json")
}

/// The pre-rename shape `codex-local-push-state.json` carried: a single
/// provider's counts rather than a `providerCounts` list.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LegacyLocalPushState {
    #[serde(default)]
    last_run_at: Option<String>,
    #[serde(default)]
    last_success_at: Option<String>,
    #[serde(default)]
    files_scanned: u64,
    #[serde(default)]
    events_ingested: u64,
    #[serde(default)]
    deduplicated: u64,
}

impl From<LegacyLocalPushState> for LocalPushState {
    fn from(legacy: LegacyLocalPushState) -> Self {
        LocalPushState {
            last_run_at: legacy.last_run_at,
            last_success_at: legacy.last_success_at,
            last_trigger_source: None,
            provider_counts: vec![ProviderPushCount {
                provider: "codex".to_string(),
                files_scanned: legacy.files_scanned,
                events_ingested: legacy.events_ingested,
                deduplicated: legacy.deduplicated,
            }],
            last_error: None,
        }
    }
}

pub fn read_local_push_state(mirror_root: &Path, repo_id: &str) -> LocalPushState {
    let path = local_push_state_path(mirror_root, repo_id);
    if path.exists() {
        return codaph_core::read_json_or_default(&path);
    }
    let legacy_path = legacy_local_push_state_path(mirror_root, repo_id);
    match codaph_core::read_json_opt::<LegacyLocalPushState>(&legacy_path) {
        Some(legacy) => legacy.into(),
        None => LocalPushState::default(),
    }
}

pub fn write_local_push_state(mirror_root: &Path, repo_id: &str, state: &LocalPushState) -> Result<()> {
    let path = local_push_state_path(mirror_root, repo_id);
    Ok(codaph_core::write_json_pretty_atomic(&path, state)?)
}

pub fn read_remote_sync_state(mirror_root: &Path, repo_id: &str) -> RemoteSyncState {
    codaph_core::read_json_or_default(&remote_sync_state_path(mirror_root, repo_id))
}

pub fn write_remote_sync_state(mirror_root: &Path, repo_id: &str, state: &RemoteSyncState) -> Result<()> {
    let path = remote_sync_state_path(mirror_root, repo_id);
    Ok(codaph_core::write_json_pretty_atomic(&path, state)?)
}

/// On a thrown replay error, persist only the minimal fields the spec
/// calls out rather than the full (possibly half-built) state.
pub fn write_remote_sync_state_error(
    mirror_root: &Path,
    repo_id: &str,
    trigger: codaph_types::TriggerSource,
    requested_timeline_limit: u64,
    error: &str,
) -> Result<()> {
    let mut state = read_remote_sync_state(mirror_root, repo_id);
    state.last_run_at = Some(chrono::Utc::now().to_rfc3339());
    state.last_trigger_source = Some(trigger);
    state.requested_timeline_limit = Some(requested_timeline_limit);
    state.last_error = Some(error.to_string());
    write_remote_sync_state(mirror_root, repo_id, &state)
}
