//! Builders for sample `CapturedEvent`/`EventContext` values used across
//! engine, providers, and runtime tests.

use codaph_types::{CapturedEvent, EventContext, Source};
use serde_json::{json, Value};

pub fn event_context(source: Source, repo_id: &str, session_id: &str, sequence: u64) -> EventContext {
    EventContext::new(source, repo_id, session_id, sequence)
}

/// A minimal `prompt.submitted` event, deterministic given its inputs.
pub fn prompt_submitted(repo_id: &str, session_id: &str, sequence: u64, text: &str, ts: &str) -> CapturedEvent {
    let ctx = event_context(Source::LiveSdk, repo_id, session_id, sequence).with_ts(ts);
    CapturedEvent::build(&ctx, "prompt.submitted", json!({"text": text}), || ts.to_string())
}

/// A minimal `item.completed` event carrying an `agent_message` item.
pub fn agent_message(repo_id: &str, session_id: &str, sequence: u64, text: &str, ts: &str) -> CapturedEvent {
    let ctx = event_context(Source::LiveSdk, repo_id, session_id, sequence).with_ts(ts);
    let payload = json!({"item": {"type": "agent_message", "text": text}});
    CapturedEvent::build(&ctx, "item.completed", payload, || ts.to_string())
}

/// A minimal `item.completed` event carrying a reasoning item.
pub fn reasoning(repo_id: &str, session_id: &str, sequence: u64, text: &str, ts: &str) -> CapturedEvent {
    let ctx = event_context(Source::LiveSdk, repo_id, session_id, sequence).with_ts(ts);
    let payload = json!({"item": {"type": "reasoning", "text": text}});
    CapturedEvent::build(&ctx, "item.completed", payload, || ts.to_string())
}

/// A raw timeline record as `fetchContextSnapshot` would return it, wrapping
/// `event` in the `codaph_event.v2` envelope `parse_timeline_entry` expects.
pub fn timeline_entry(entry_id: &str, created_at: &str, event: &CapturedEvent) -> Value {
    json!({
        "id": entry_id,
        "created_at": created_at,
        "activity": {
            "type": "codaph_event",
            "payload": {
                "schema": "codaph_event.v2",
                "event": {
                    "eventType": event.event_type,
                    "sessionId": event.session_id,
                    "threadId": event.thread_id,
                    "eventId": event.event_id,
                    "ts": event.ts,
                    "payload": event.payload,
                }
            }
        }
    })
}
