//! Types re-exported or assembled for SDK consumers.

pub use codaph_types::{CapturedEvent, ReasoningAvailability, Source, TriggerSource};

/// A session's sparse-index window, widened to a stable summary shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: String,
    pub from: String,
    pub to: String,
    pub event_count: u64,
    pub thread_ids: Vec<String>,
    pub actor_ids: Vec<String>,
}

/// Narrows which sessions `Client::sessions()` returns.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    /// Only sessions whose `to` timestamp is `>=` this value.
    pub since: Option<String>,
    /// Only sessions that touched this actor.
    pub actor_id: Option<String>,
}

impl SessionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn since(mut self, ts: impl Into<String>) -> Self {
        self.since = Some(ts.into());
        self
    }

    pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub(crate) fn matches(&self, summary: &SessionSummary) -> bool {
        if let Some(since) = &self.since {
            if summary.to.as_str() < since.as_str() {
                return false;
            }
        }
        if let Some(actor_id) = &self.actor_id {
            if !summary.actor_ids.iter().any(|a| a == actor_id) {
                return false;
            }
        }
        true
    }
}
