//! A configurable `RemoteMemory` fixture for engine/runtime tests, built on
//! the same interior-mutability pattern as `FlakyRemote` in
//! `codaph-engine`'s own circuit-breaker tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use codaph_engine::{BoxFuture, Error, QueryLane, RemoteMemory, Result, SemanticQuery, SnapshotRequest, WriteOutcome};
use codaph_types::CapturedEvent;
use serde_json::Value;

/// Calls recorded against a [`FakeRemoteMemory`], for assertions on what a
/// pipeline or replayer actually dispatched.
#[derive(Debug, Default)]
pub struct CallLog {
    pub write_event: Vec<(String, String)>,
    pub append_activity: Vec<(String, Value)>,
    pub write_run_state: Vec<(String, String, Value)>,
    pub fetch_context_snapshot: Vec<SnapshotRequest>,
}

/// A `RemoteMemory` whose every method is independently configurable: fail
/// the next N writes, hand back a canned snapshot timeline, or just record
/// what was called.
pub struct FakeRemoteMemory {
    fail_next_writes: AtomicU32,
    batch_supported: bool,
    snapshot: Mutex<Value>,
    calls: Mutex<CallLog>,
}

impl FakeRemoteMemory {
    pub fn new() -> Self {
        Self {
            fail_next_writes: AtomicU32::new(0),
            batch_supported: false,
            snapshot: Mutex::new(Value::Null),
            calls: Mutex::new(CallLog::default()),
        }
    }

    pub fn failing_next(writes: u32) -> Self {
        Self { fail_next_writes: AtomicU32::new(writes), ..Self::new() }
    }

    pub fn with_batch_support(mut self, supported: bool) -> Self {
        self.batch_supported = supported;
        self
    }

    pub fn with_snapshot(self, snapshot: Value) -> Self {
        *self.snapshot.lock().unwrap() = snapshot;
        self
    }

    /// Snapshot of every call made so far; cheap enough to call repeatedly
    /// in assertions.
    pub fn calls(&self) -> CallLog {
        let calls = self.calls.lock().unwrap();
        CallLog {
            write_event: calls.write_event.clone(),
            append_activity: calls.append_activity.clone(),
            write_run_state: calls.write_run_state.clone(),
            fetch_context_snapshot: calls
                .fetch_context_snapshot
                .iter()
                .map(|r| SnapshotRequest { run_id: r.run_id.clone(), timeline_limit: r.timeline_limit, refresh: r.refresh })
                .collect(),
        }
    }
}

impl Default for FakeRemoteMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteMemory for FakeRemoteMemory {
    fn supports_batch(&self) -> bool {
        self.batch_supported
    }

    fn write_event<'a>(&'a self, event: &'a CapturedEvent, run_id: &'a str) -> BoxFuture<'a, Result<WriteOutcome>> {
        Box::pin(async move {
            self.calls.lock().unwrap().write_event.push((event.event_id.clone(), run_id.to_string()));
            if self.fail_next_writes.load(Ordering::SeqCst) > 0 {
                self.fail_next_writes.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::Remote("fake remote: simulated failure".into()));
            }
            Ok(WriteOutcome { accepted: true, ..Default::default() })
        })
    }

    fn append_activity<'a>(&'a self, run_id: &'a str, envelope: Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.calls.lock().unwrap().append_activity.push((run_id.to_string(), envelope));
            Ok(())
        })
    }

    fn write_run_state<'a>(&'a self, run_id: &'a str, key: &'a str, value: Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.calls.lock().unwrap().write_run_state.push((run_id.to_string(), key.to_string(), value));
            Ok(())
        })
    }

    fn query_semantic_context<'a>(&'a self, _query: SemanticQuery) -> BoxFuture<'a, Result<(Value, QueryLane, bool)>> {
        Box::pin(async move { Ok((Value::Null, QueryLane::SemanticSearch, false)) })
    }

    fn fetch_context_snapshot<'a>(&'a self, request: SnapshotRequest) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            self.calls.lock().unwrap().fetch_context_snapshot.push(SnapshotRequest {
                run_id: request.run_id.clone(),
                timeline_limit: request.timeline_limit,
                refresh: request.refresh,
            });
            Ok(self.snapshot.lock().unwrap().clone())
        })
    }
}
