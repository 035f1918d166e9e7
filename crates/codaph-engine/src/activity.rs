use codaph_types::CapturedEvent;
use serde_json::{json, Value};

const MAX_STRING_CHARS: usize = 4_000;
const MAX_ARRAY_ITEMS: usize = 50;

/// Bound a free-form JSON value so an activity envelope stays appendable
/// even for huge prompts or payloads: strings are truncated, arrays and
/// objects are capped, recursively.
pub fn bound_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(truncate_str(s, MAX_STRING_CHARS)),
        Value::Array(items) => {
            let truncated = items.len() > MAX_ARRAY_ITEMS;
            let mut out: Vec<Value> = items.iter().take(MAX_ARRAY_ITEMS).map(bound_value).collect();
            if truncated {
                out.push(json!({"_truncated": items.len() - MAX_ARRAY_ITEMS}));
            }
            Value::Array(out)
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map.iter().take(MAX_ARRAY_ITEMS) {
                out.insert(k.clone(), bound_value(v));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max_chars).collect();
    format!("{truncated}…[truncated]")
}

/// Build the compact `codaph_event.v2` activity envelope appended to the
/// main run after every ingested event.
pub fn build_event_activity(event: &CapturedEvent) -> Value {
    json!({
        "schema": "codaph_event.v2",
        "event_id": event.event_id,
        "session_id": event.session_id,
        "thread_id": event.thread_id,
        "actor_id": event.actor_id,
        "ts": event.ts,
        "event_type": event.event_type,
        "payload": bound_value(&event.payload),
    })
}

/// Build the `codaph_prompt.v1` activity envelope appended to the
/// project-wide prompt-stream run for `prompt.submitted` events.
pub fn build_prompt_activity(event: &CapturedEvent) -> Value {
    json!({
        "schema": "codaph_prompt.v1",
        "event_id": event.event_id,
        "session_id": event.session_id,
        "ts": event.ts,
        "prompt": bound_value(&event.payload),
    })
}

/// The minimal-envelope retry fallback: identifiers only, empty payload.
pub fn build_minimal_activity(event: &CapturedEvent, schema: &str) -> Value {
    json!({
        "schema": schema,
        "event_id": event.event_id,
        "session_id": event.session_id,
        "ts": event.ts,
        "payload": Value::Null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use codaph_types::{ReasoningAvailability, Source};

    fn sample(payload: Value) -> CapturedEvent {
        CapturedEvent {
            event_id: "a".repeat(24),
            source: Source::LiveSdk,
            repo_id: "repo1".to_string(),
            actor_id: None,
            session_id: "sess1".to_string(),
            thread_id: None,
            ts: "2026-02-21T00:00:00Z".to_string(),
            event_type: "prompt.submitted".to_string(),
            payload,
            reasoning_availability: ReasoningAvailability::Unavailable,
        }
    }

    #[test]
    fn bound_value_truncates_huge_strings() {
        let huge = "x".repeat(10_000);
        let bounded = bound_value(&Value::String(huge));
        assert!(bounded.as_str().unwrap().len() < 5_000);
    }

    #[test]
    fn bound_value_caps_array_length() {
        let items: Vec<Value> = (0..1000).map(Value::from).collect();
        let bounded = bound_value(&Value::Array(items));
        let arr = bounded.as_array().unwrap();
        assert!(arr.len() <= MAX_ARRAY_ITEMS + 1);
    }

    #[test]
    fn event_activity_is_appendable_for_huge_payload() {
        let event = sample(json!({"text": "y".repeat(50_000)}));
        let activity = build_event_activity(&event);
        let serialized = serde_json::to_string(&activity).unwrap();
        assert!(serialized.len() < 20_000);
        assert_eq!(activity["schema"], "codaph_event.v2");
    }

    #[test]
    fn minimal_activity_carries_only_identifiers() {
        let event = sample(json!({"text": "hello"}));
        let minimal = build_minimal_activity(&event, "codaph_event.v2");
        assert_eq!(minimal["payload"], Value::Null);
        assert_eq!(minimal["event_id"], event.event_id);
    }
}
