use codaph_mirror::{read_event_id_index, read_manifest, read_sparse_index, IndexWriteMode, Mirror, MirrorConfig};
use codaph_types::{CapturedEvent, ReasoningAvailability, Source};
use serde_json::Value;

fn sample_event(event_id: &str, ts: &str, session_id: &str) -> CapturedEvent {
    CapturedEvent {
        event_id: event_id.to_string(),
        source: Source::LiveSdk,
        repo_id: "repo1".to_string(),
        actor_id: Some("alice".to_string()),
        session_id: session_id.to_string(),
        thread_id: Some("thread1".to_string()),
        ts: ts.to_string(),
        event_type: "prompt.submitted".to_string(),
        payload: Value::Null,
        reasoning_availability: ReasoningAvailability::Unavailable,
    }
}

#[test]
fn second_append_of_same_event_id_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Mirror::new(MirrorConfig::new(dir.path()));

    let first = mirror.append_event(&sample_event("same", "2026-02-21T00:00:00Z", "s1")).unwrap();
    assert!(!first.deduplicated);

    let second = mirror.append_event(&sample_event("same", "2026-02-21T01:00:00Z", "s1")).unwrap();
    assert!(second.deduplicated);
    assert_eq!(second.segment, first.segment);

    mirror.flush().unwrap();

    let index = read_event_id_index(dir.path(), "repo1");
    assert_eq!(index.events.len(), 1);

    let sparse = read_sparse_index(dir.path(), "repo1");
    assert_eq!(sparse.sessions.get("s1").unwrap().event_count, 1);

    let manifest = read_manifest(dir.path(), "repo1");
    let total: u64 = manifest.segments.values().map(|s| s.event_count).sum();
    assert_eq!(total, 1);
}

#[test]
fn day_rollover_produces_two_segments() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Mirror::new(MirrorConfig::new(dir.path()));

    let before = mirror.append_event(&sample_event("a".repeat(24).as_str(), "2026-02-21T23:59:59Z", "s1")).unwrap();
    let after = mirror.append_event(&sample_event("b".repeat(24).as_str(), "2026-02-22T00:00:01Z", "s1")).unwrap();

    assert_ne!(before.segment, after.segment);

    let manifest = read_manifest(dir.path(), "repo1");
    assert_eq!(manifest.segments.len(), 2);
}

#[test]
fn batch_mode_defers_index_writes_until_flush() {
    let dir = tempfile::tempdir().unwrap();
    let config = MirrorConfig::new(dir.path()).with_index_write_mode(IndexWriteMode::Batch);
    let mirror = Mirror::new(config);

    mirror.append_event(&sample_event("c".repeat(24).as_str(), "2026-02-21T00:00:00Z", "s1")).unwrap();

    let index_before_flush = read_event_id_index(dir.path(), "repo1");
    assert!(index_before_flush.events.is_empty(), "batch mode should not persist before flush");

    mirror.flush().unwrap();

    let index_after_flush = read_event_id_index(dir.path(), "repo1");
    assert_eq!(index_after_flush.events.len(), 1);
}

#[test]
fn counts_stay_consistent_across_many_appends() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Mirror::new(MirrorConfig::new(dir.path()));

    for i in 0..20 {
        let event_id = format!("{i:024}");
        mirror.append_event(&sample_event(&event_id, "2026-02-21T00:00:00Z", "s1")).unwrap();
    }
    mirror.flush().unwrap();

    let index = read_event_id_index(dir.path(), "repo1");
    let sparse = read_sparse_index(dir.path(), "repo1");
    let manifest = read_manifest(dir.path(), "repo1");
    let segment_total: u64 = manifest.segments.values().map(|s| s.event_count).sum();

    assert_eq!(index.events.len(), 20);
    assert_eq!(sparse.sessions.get("s1").unwrap().event_count, 20);
    assert_eq!(segment_total, 20);
}
