use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::event_id;

/// Where a captured event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// A live coding-agent SDK session streaming events as they happen.
    LiveSdk,
    /// A live shell/exec session captured alongside an SDK session.
    LiveExec,
    /// Backfilled from Codex's on-disk session history.
    CodexHistory,
    /// Backfilled from Claude Code's on-disk session history.
    ClaudeHistory,
    /// Backfilled from Gemini's on-disk session history.
    GeminiHistory,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::LiveSdk => "live_sdk",
            Source::LiveExec => "live_exec",
            Source::CodexHistory => "codex_history",
            Source::ClaudeHistory => "claude_history",
            Source::GeminiHistory => "gemini_history",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Source::LiveSdk | Source::LiveExec)
    }
}

/// How much reasoning text is recoverable from an event's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningAvailability {
    /// `payload.item` is reasoning-typed and carries non-empty text.
    Full,
    /// `payload.item` is reasoning-typed but text is empty or absent.
    Partial,
    /// `payload.item` is not reasoning-typed, or there is no item at all.
    Unavailable,
}

impl ReasoningAvailability {
    /// Derive availability purely from a payload value.
    pub fn from_payload(payload: &Value) -> Self {
        let Some(item) = payload.get("item") else {
            return ReasoningAvailability::Unavailable;
        };
        let is_reasoning = item.get("type").and_then(Value::as_str) == Some("reasoning");
        if !is_reasoning {
            return ReasoningAvailability::Unavailable;
        }
        let has_text = item
            .get("text")
            .and_then(Value::as_str)
            .map(|s| !s.is_empty())
            .unwrap_or(false);
        if has_text {
            ReasoningAvailability::Full
        } else {
            ReasoningAvailability::Partial
        }
    }
}

/// The canonical captured-event envelope: the unit of mirroring and replication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedEvent {
    pub event_id: String,
    pub source: Source,
    pub repo_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub ts: String,
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
    pub reasoning_availability: ReasoningAvailability,
}

/// Inputs the ingest pipeline needs to build one [`CapturedEvent`].
#[derive(Debug, Clone)]
pub struct EventContext {
    pub source: Source,
    pub repo_id: String,
    pub session_id: String,
    pub thread_id: Option<String>,
    pub sequence: u64,
    pub actor_id: Option<String>,
    /// Caller-supplied event id (history backfill always supplies one).
    pub event_id: Option<String>,
    /// Caller-supplied timestamp; defaults to now-UTC when absent.
    pub ts: Option<String>,
}

impl EventContext {
    pub fn new(source: Source, repo_id: impl Into<String>, session_id: impl Into<String>, sequence: u64) -> Self {
        Self {
            source,
            repo_id: repo_id.into(),
            session_id: session_id.into(),
            thread_id: None,
            sequence,
            actor_id: None,
            event_id: None,
            ts: None,
        }
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn with_ts(mut self, ts: impl Into<String>) -> Self {
        self.ts = Some(ts.into());
        self
    }
}

impl CapturedEvent {
    /// Build an envelope for a freshly-ingested event, deriving `eventId` and
    /// `reasoningAvailability` per the envelope construction rules.
    pub fn build(ctx: &EventContext, event_type: &str, payload: Value, now: impl FnOnce() -> String) -> Self {
        let ts = ctx.ts.clone().filter(|s| !s.is_empty()).unwrap_or_else(now);
        let actor_id = ctx.actor_id.clone().filter(|s| !s.is_empty());
        let thread_id = ctx.thread_id.clone().filter(|s| !s.is_empty());
        let event_id = ctx
            .event_id
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| event_id(ctx.source.as_str(), thread_id.as_deref(), ctx.sequence, event_type, &ts));
        let reasoning_availability = ReasoningAvailability::from_payload(&payload);

        CapturedEvent {
            event_id,
            source: ctx.source,
            repo_id: ctx.repo_id.clone(),
            actor_id,
            session_id: ctx.session_id.clone(),
            thread_id,
            ts,
            event_type: event_type.to_string(),
            payload,
            reasoning_availability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reasoning_full_requires_nonempty_text() {
        let payload = json!({"item": {"type": "reasoning", "text": "done"}});
        assert_eq!(ReasoningAvailability::from_payload(&payload), ReasoningAvailability::Full);
    }

    #[test]
    fn reasoning_partial_when_text_missing() {
        let payload = json!({"item": {"type": "reasoning"}});
        assert_eq!(ReasoningAvailability::from_payload(&payload), ReasoningAvailability::Partial);
    }

    #[test]
    fn reasoning_unavailable_for_other_item_types() {
        let payload = json!({"item": {"type": "agent_message", "text": "hi"}});
        assert_eq!(ReasoningAvailability::from_payload(&payload), ReasoningAvailability::Unavailable);
    }

    #[test]
    fn reasoning_unavailable_without_item() {
        assert_eq!(ReasoningAvailability::from_payload(&json!({})), ReasoningAvailability::Unavailable);
    }

    #[test]
    fn build_normalizes_empty_strings_to_none() {
        let mut ctx = EventContext::new(Source::LiveSdk, "repo1", "sess1", 0);
        ctx.actor_id = Some(String::new());
        ctx.thread_id = Some(String::new());
        let event = CapturedEvent::build(&ctx, "thread.started", Value::Null, || "2026-01-01T00:00:00Z".to_string());
        assert!(event.actor_id.is_none());
        assert!(event.thread_id.is_none());
        assert_eq!(event.event_id.len(), 24);
    }

    #[test]
    fn build_reuses_supplied_event_id() {
        let ctx = EventContext::new(Source::ClaudeHistory, "repo1", "sess1", 3).with_event_id("a".repeat(24));
        let event = CapturedEvent::build(&ctx, "prompt.submitted", Value::Null, || "now".to_string());
        assert_eq!(event.event_id, "a".repeat(24));
    }
}
