use std::sync::Arc;

use codaph_engine::{evaluate_cap_detection, event_run_id, fingerprint_timeline, parse_timeline_entry, ReplayerState, RunIdScope, SnapshotRequest};
use codaph_mirror::Mirror;
use codaph_types::{RemoteSyncState, Source, TriggerSource};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::orchestrator::OrchestratorConfig;
use crate::state_store;

/// Run one remote-sync replay pass: fetch the snapshot, parse and mirror
/// every recognizable entry, compute the fingerprint/cap-detection verdict,
/// and persist `RemoteSyncState`. Returns the number of events imported.
pub async fn run_replay(config: &OrchestratorConfig, mirror: Arc<Mirror>, trigger: TriggerSource) -> Result<u64> {
    let Some(remote) = config.remote.clone() else {
        return Ok(0);
    };

    let run_id = event_run_id("codaph", RunIdScope::PerProject, &config.repo_id, "project");
    let request = SnapshotRequest { run_id, timeline_limit: config.timeline_limit, refresh: false };

    let fetch_result = remote.fetch_context_snapshot(request.clone()).await;
    let raw_snapshot = match fetch_result {
        Ok(value) => value,
        Err(err) => {
            state_store::write_remote_sync_state_error(&config.mirror_root, &config.repo_id, trigger, config.timeline_limit, &err.to_string())?;
            return Err(Error::Engine(err));
        }
    };

    let timeline: Vec<Value> = raw_snapshot
        .get("timeline")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let prior_state = state_store::read_remote_sync_state(&config.mirror_root, &config.repo_id);

    let mut accumulator = ReplayerState::new();
    let now = chrono::Utc::now().to_rfc3339();
    for raw in &timeline {
        match parse_timeline_entry(raw, Source::LiveExec, &now) {
            Some(mut entry) => {
                entry.event.repo_id = config.repo_id.clone();
                match mirror.append_event(&entry.event) {
                    Ok(append) if append.deduplicated => accumulator.record_deduplicated(&entry.event),
                    Ok(_) => accumulator.record_imported(&entry.event),
                    Err(err) => {
                        state_store::write_remote_sync_state_error(&config.mirror_root, &config.repo_id, trigger, config.timeline_limit, &err.to_string())?;
                        return Err(Error::Mirror(err));
                    }
                }
            }
            None => accumulator.record_skipped(),
        }
    }

    let fingerprint = fingerprint_timeline(&timeline);
    let cap = evaluate_cap_detection(
        prior_state.last_snapshot_fingerprint.as_deref(),
        fingerprint.as_deref(),
        prior_state.consecutive_same_snapshot_count,
        timeline.len(),
        config.timeline_limit,
    );
    let decision = accumulator.finish(timeline.len(), config.timeline_limit, request.refresh, cap, fingerprint);

    let new_state = RemoteSyncState {
        last_run_at: Some(now.clone()),
        last_success_at: Some(now),
        last_trigger_source: Some(trigger),
        requested_timeline_limit: Some(decision.requested_timeline_limit),
        received_timeline_count: Some(decision.timeline_events as u64),
        last_imported: Some(decision.imported),
        last_deduplicated: Some(decision.deduplicated),
        last_skipped: Some(decision.skipped),
        last_max_ts: decision.last_ts.clone(),
        last_snapshot_fingerprint: decision.snapshot_fingerprint.clone(),
        consecutive_same_snapshot_count: decision.consecutive_same_snapshot_count,
        suspected_server_cap: decision.suspected_server_cap,
        last_error: None,
        pending_trigger: Default::default(),
    };
    state_store::write_remote_sync_state(&config.mirror_root, &config.repo_id, &new_state)?;

    mirror.flush().map_err(Error::Mirror)?;

    Ok(decision.imported)
}
