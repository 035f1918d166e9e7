use std::future::Future;
use std::pin::Pin;

use codaph_types::CapturedEvent;
use serde_json::Value;

use crate::error::{Error, Result};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The outcome of one `writeEvent`/`writeEventsBatch` call.
#[derive(Debug, Clone, Default)]
pub struct WriteOutcome {
    pub accepted: bool,
    pub deduplicated: bool,
    pub job_id: Option<String>,
    pub raw: Value,
}

#[derive(Debug, Clone, Default)]
pub struct SemanticQuery {
    pub run_id: String,
    pub query: String,
    pub limit: Option<u32>,
    pub mode: Option<String>,
    pub direct_lane: bool,
    pub include_linked_runs: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotRequest {
    pub run_id: String,
    pub timeline_limit: u64,
    pub refresh: bool,
}

/// Whether a `querySemanticContext` call fell back from the preferred HDQL
/// lane to the semantic-search lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryLane {
    Hdql,
    SemanticSearch,
}

/// The only outbound protocol the capture/mirror/replication core depends
/// on: a client exposing per-event/batch ingest, a run-state variable,
/// semantic query, and snapshot fetch against the remote memory service.
///
/// Batch writes are an optional capability (`supports_batch`) rather than a
/// dynamically-probed method: callers check the flag once and fall back to
/// per-event writes when it's false.
pub trait RemoteMemory: Send + Sync {
    fn supports_batch(&self) -> bool {
        false
    }

    fn write_event<'a>(&'a self, event: &'a CapturedEvent, run_id: &'a str) -> BoxFuture<'a, Result<WriteOutcome>>;

    fn write_events_batch<'a>(&'a self, events: &'a [CapturedEvent], run_id: &'a str) -> BoxFuture<'a, Result<WriteOutcome>> {
        let _ = (events, run_id);
        Box::pin(async { Err(Error::Unsupported("batch write not supported by this remote memory".into())) })
    }

    fn append_activity<'a>(&'a self, run_id: &'a str, envelope: Value) -> BoxFuture<'a, Result<()>>;

    fn write_run_state<'a>(&'a self, run_id: &'a str, key: &'a str, value: Value) -> BoxFuture<'a, Result<()>>;

    fn query_semantic_context<'a>(&'a self, query: SemanticQuery) -> BoxFuture<'a, Result<(Value, QueryLane, bool)>>;

    fn fetch_context_snapshot<'a>(&'a self, request: SnapshotRequest) -> BoxFuture<'a, Result<Value>>;
}

/// How captured events are grouped into the remote memory's run concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunIdScope {
    PerSession,
    PerProject,
}

/// Derive the run id a given event's writes and activity records belong to.
pub fn event_run_id(prefix: &str, scope: RunIdScope, repo_id: &str, session_id: &str) -> String {
    match scope {
        RunIdScope::PerSession => format!("{prefix}:{repo_id}:{session_id}"),
        RunIdScope::PerProject => format!("{prefix}:{repo_id}"),
    }
}

/// The project-wide run that collects `prompt.submitted` activity records,
/// independent of the per-event/per-session run scope.
pub fn prompt_stream_run_id(prefix: &str, repo_id: &str) -> String {
    format!("{prefix}:prompts:{repo_id}")
}

/// The project-wide run namespace for session-summary specialty events.
pub fn session_summary_run_id(prefix: &str, repo_id: &str) -> String {
    format!("{prefix}:summary:{repo_id}")
}
