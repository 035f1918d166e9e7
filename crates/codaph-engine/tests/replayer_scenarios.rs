use codaph_engine::{evaluate_cap_detection, fingerprint_timeline, parse_timeline_entry, ReplayerState};
use codaph_mirror::{Mirror, MirrorConfig};
use codaph_types::Source;
use serde_json::json;

fn sample_timeline(limit: usize) -> Vec<serde_json::Value> {
    (0..limit)
        .map(|i| {
            json!({
                "id": format!("entry-{i}"),
                "created_at": format!("2026-03-01T00:00:{:02}Z", i),
                "activity": {
                    "type": "codaph_event",
                    "payload": {
                        "schema": "codaph_event.v2",
                        "event": {
                            "eventType": "tool.call",
                            "sessionId": format!("sess-{}", i % 2),
                            "eventId": format!("{:024x}", i),
                            "ts": format!("2026-03-01T00:00:{:02}Z", i),
                            "payload": {"n": i}
                        }
                    }
                }
            })
        })
        .collect()
}

#[test]
fn full_200_entry_snapshot_repeated_four_times_flags_suspected_cap() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Mirror::new(MirrorConfig::new(dir.path()));
    let timeline = sample_timeline(200);
    let requested_limit = 500u64;

    let mut prior_fp: Option<String> = None;
    let mut prior_count = 0u32;
    let mut last_cap = Default::default();

    for _ in 0..4 {
        let mut state = ReplayerState::new();
        for raw in &timeline {
            match parse_timeline_entry(raw, Source::LiveExec, "2026-03-01T00:00:00Z") {
                Some(mut entry) => {
                    entry.event.repo_id = "repo1".to_string();
                    let append = mirror.append_event(&entry.event).unwrap();
                    if append.deduplicated {
                        state.record_deduplicated(&entry.event);
                    } else {
                        state.record_imported(&entry.event);
                    }
                }
                None => state.record_skipped(),
            }
        }

        let fp = fingerprint_timeline(&timeline);
        let cap = evaluate_cap_detection(prior_fp.as_deref(), fp.as_deref(), prior_count, timeline.len(), requested_limit);
        let decision = state.finish(timeline.len(), requested_limit, false, cap.clone(), fp.clone());

        prior_count = decision.consecutive_same_snapshot_count;
        prior_fp = fp;
        last_cap = cap;
    }

    assert!(last_cap.suspected_server_cap);
    assert_eq!(prior_count, 3);
    assert!(last_cap.diagnostic_note.is_some());
}

#[test]
fn first_pass_imports_second_pass_fully_deduplicates() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Mirror::new(MirrorConfig::new(dir.path()));
    let timeline = sample_timeline(10);

    let mut first_state = ReplayerState::new();
    for raw in &timeline {
        let mut entry = parse_timeline_entry(raw, Source::LiveExec, "now").unwrap();
        entry.event.repo_id = "repo1".to_string();
        let append = mirror.append_event(&entry.event).unwrap();
        assert!(!append.deduplicated);
        first_state.record_imported(&entry.event);
    }
    let first = first_state.finish(10, 100, false, Default::default(), None);
    assert_eq!(first.imported, 10);
    assert_eq!(first.deduplicated, 0);

    let mut second_state = ReplayerState::new();
    for raw in &timeline {
        let mut entry = parse_timeline_entry(raw, Source::LiveExec, "now").unwrap();
        entry.event.repo_id = "repo1".to_string();
        let append = mirror.append_event(&entry.event).unwrap();
        assert!(append.deduplicated);
        second_state.record_deduplicated(&entry.event);
    }
    let second = second_state.finish(10, 100, false, Default::default(), None);
    assert_eq!(second.deduplicated, 10);
    assert_eq!(second.imported, 0);
}
