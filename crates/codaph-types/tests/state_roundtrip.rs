use codaph_types::{EventIdEntry, EventIdIndex, RepoManifest, SegmentMeta, SparseEntry, SparseIndex};

#[test]
fn manifest_round_trips_through_json() {
    let mut manifest = RepoManifest::empty("abc123def456");
    manifest.segments.insert(
        "20260221".to_string(),
        SegmentMeta {
            id: "20260221".to_string(),
            relative_path: "events/abc123def456/2026/02/21/segment-20260221.jsonl".to_string(),
            from: "2026-02-21T00:00:00Z".to_string(),
            to: "2026-02-21T23:59:59Z".to_string(),
            event_count: 3,
        },
    );

    let json = serde_json::to_string_pretty(&manifest).unwrap();
    let parsed: RepoManifest = serde_json::from_str(&json).unwrap();
    assert_eq!(manifest, parsed);
}

#[test]
fn sparse_entry_absorb_stretches_window() {
    let mut entry = SparseEntry::default();
    entry.absorb("2026-02-21T12:00:00Z", "seg-a.jsonl");
    entry.absorb("2026-02-21T08:00:00Z", "seg-a.jsonl");
    entry.absorb("2026-02-21T18:00:00Z", "seg-b.jsonl");

    assert_eq!(entry.from, "2026-02-21T08:00:00Z");
    assert_eq!(entry.to, "2026-02-21T18:00:00Z");
    assert_eq!(entry.event_count, 3);
    assert_eq!(entry.segments.len(), 2);
}

#[test]
fn sparse_index_defaults_are_empty_maps() {
    let index = SparseIndex::default();
    assert!(index.sessions.is_empty());
    assert!(index.threads.is_empty());
    assert!(index.actors.is_empty());
}

#[test]
fn event_id_index_round_trips() {
    let mut index = EventIdIndex::empty("repo1");
    index.events.insert(
        "a".repeat(24),
        EventIdEntry {
            segment: "events/repo1/2026/02/21/segment-20260221.jsonl".to_string(),
            ts: "2026-02-21T00:00:00Z".to_string(),
            session_id: "sess1".to_string(),
            actor_id: None,
        },
    );
    let json = serde_json::to_string(&index).unwrap();
    let parsed: EventIdIndex = serde_json::from_str(&json).unwrap();
    assert_eq!(index, parsed);
}
