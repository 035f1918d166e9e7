use codaph_mirror::{Mirror, MirrorConfig};
use codaph_sdk::{types::SessionFilter, Client};
use codaph_types::{CapturedEvent, EventContext, Source};

fn seed_event(mirror: &Mirror, repo_id: &str, session_id: &str, sequence: u64, ts: &str) {
    let ctx = EventContext::new(Source::LiveSdk, repo_id, session_id, sequence).with_ts(ts);
    let event = CapturedEvent::build(&ctx, "item.completed", serde_json::json!({"item": {"type": "agent_message"}}), || ts.to_string());
    mirror.append_event(&event).unwrap();
}

#[test]
fn sessions_and_events_roundtrip_through_the_client() {
    let project = tempfile::tempdir().unwrap();
    let client = Client::connect(project.path()).unwrap();

    let mirror = Mirror::new(MirrorConfig::new(client.mirror_root()));
    seed_event(&mirror, client.repo_id(), "sess-1", 0, "2026-02-21T10:00:00Z");
    seed_event(&mirror, client.repo_id(), "sess-1", 1, "2026-02-21T10:05:00Z");
    seed_event(&mirror, client.repo_id(), "sess-2", 0, "2026-02-20T09:00:00Z");
    mirror.flush().unwrap();

    let sessions = client.sessions(SessionFilter::all()).unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].session_id, "sess-1", "most recently active session sorts first");

    let events = client.session("sess-1").events().unwrap();
    assert_eq!(events.len(), 2);
    assert!(events[0].ts < events[1].ts);
}

#[test]
fn filter_by_since_excludes_stale_sessions() {
    let project = tempfile::tempdir().unwrap();
    let client = Client::connect(project.path()).unwrap();

    let mirror = Mirror::new(MirrorConfig::new(client.mirror_root()));
    seed_event(&mirror, client.repo_id(), "sess-old", 0, "2026-01-01T00:00:00Z");
    seed_event(&mirror, client.repo_id(), "sess-new", 0, "2026-02-21T00:00:00Z");
    mirror.flush().unwrap();

    let recent = client.sessions(SessionFilter::all().since("2026-02-01T00:00:00Z")).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].session_id, "sess-new");
}

#[test]
fn unknown_session_id_is_not_found() {
    let project = tempfile::tempdir().unwrap();
    let client = Client::connect(project.path()).unwrap();
    assert!(client.session("does-not-exist").events().is_err());
}
