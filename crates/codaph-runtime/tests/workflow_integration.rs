use std::sync::Arc;

use codaph_runtime::{run_workflow, AutomationConfig, OrchestratorConfig, PushKind, WorkflowMode};
use codaph_testing::{timeline_entry, FakeRemoteMemory};
use codaph_types::TriggerSource;
use serde_json::json;

fn config(mirror_root: &std::path::Path, remote: Option<Arc<FakeRemoteMemory>>) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::new(mirror_root, "repo1", mirror_root);
    config.remote = remote.map(|r| r as Arc<dyn codaph_engine::RemoteMemory>);
    config
}

#[tokio::test]
async fn pull_only_run_imports_remote_timeline_and_persists_state() {
    let dir = tempfile::tempdir().unwrap();
    let event = codaph_testing::prompt_submitted("repo1", "sess1", 0, "hello", "2026-01-01T00:00:00Z");
    let snapshot = json!({"timeline": [timeline_entry("entry-1", "2026-01-01T00:00:00Z", &event)]});
    let remote = Arc::new(FakeRemoteMemory::new().with_snapshot(snapshot));

    let config = config(dir.path(), Some(remote));
    let summary = run_workflow(&config, WorkflowMode::Pull, TriggerSource::Manual, PushKind::Queue, &[]).await.unwrap();

    assert!(!summary.skipped);
    assert_eq!(summary.pull_imported, Some(1));

    let state = codaph_runtime::state_store::read_remote_sync_state(dir.path(), "repo1");
    assert_eq!(state.last_imported, Some(1));
    assert!(state.last_error.is_none());
}

#[tokio::test]
async fn cooldown_blocks_a_second_hook_triggered_pull_within_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemoteMemory::new().with_snapshot(json!({"timeline": []})));
    let mut config = config(dir.path(), Some(remote));
    config.automation = AutomationConfig { enabled: true, auto_pull_on_sync: true, cooldown: std::time::Duration::from_secs(3600) };

    let first = run_workflow(&config, WorkflowMode::Pull, TriggerSource::HookPostCommit, PushKind::Queue, &[]).await.unwrap();
    assert!(!first.skipped);
    assert_eq!(first.pull_imported, Some(0));

    let second = run_workflow(&config, WorkflowMode::Pull, TriggerSource::HookPostCommit, PushKind::Queue, &[]).await.unwrap();
    assert_eq!(second.skip_reason.as_deref(), Some("Cooldown active"));
    assert_eq!(second.pull_imported, None);
}

#[tokio::test]
async fn push_only_queue_run_with_no_prior_state_reports_nothing_to_replay() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), None);
    let summary = run_workflow(&config, WorkflowMode::Push, TriggerSource::Manual, PushKind::Queue, &[]).await.unwrap();
    assert_eq!(summary.push_note.as_deref(), Some("nothing to replay"));
}

#[tokio::test]
async fn a_stale_held_lock_is_reclaimed_so_the_workflow_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    let lock_path = dir.path().join("locks").join("sync.lock");
    std::fs::create_dir_all(lock_path.parent().unwrap()).unwrap();
    let stale = serde_json::json!({"token": "stale", "pid": 999_999, "started_at": "2020-01-01T00:00:00Z", "metadata": {}});
    std::fs::write(&lock_path, stale.to_string()).unwrap();

    let config = config(dir.path(), None);
    let summary = run_workflow(&config, WorkflowMode::Push, TriggerSource::Manual, PushKind::Queue, &[]).await.unwrap();
    assert!(!summary.skipped);
}
