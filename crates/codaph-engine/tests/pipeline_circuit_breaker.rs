use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use codaph_core::{NoopRedactor, Redactor};
use codaph_engine::{BoxFuture, Error, IngestPipeline, PipelineConfig, QueryLane, RemoteMemory, Result, SemanticQuery, SnapshotRequest, WriteOutcome};
use codaph_mirror::{Mirror, MirrorConfig};
use codaph_types::{CapturedEvent, EventContext, Source};
use serde_json::{json, Value};

struct FlakyRemote {
    fail_next: AtomicU32,
    opened_callbacks: Arc<Mutex<Vec<String>>>,
}

impl FlakyRemote {
    fn new(fail_next: u32) -> Self {
        Self { fail_next: AtomicU32::new(fail_next), opened_callbacks: Arc::new(Mutex::new(Vec::new())) }
    }
}

impl RemoteMemory for FlakyRemote {
    fn write_event<'a>(&'a self, _event: &'a CapturedEvent, _run_id: &'a str) -> BoxFuture<'a, Result<WriteOutcome>> {
        Box::pin(async move {
            if self.fail_next.load(Ordering::SeqCst) > 0 {
                self.fail_next.fetch_sub(1, Ordering::SeqCst);
                Err(Error::Remote("simulated failure".into()))
            } else {
                Ok(WriteOutcome { accepted: true, ..Default::default() })
            }
        })
    }

    fn append_activity<'a>(&'a self, _run_id: &'a str, _envelope: Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn write_run_state<'a>(&'a self, _run_id: &'a str, _key: &'a str, _value: Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn query_semantic_context<'a>(&'a self, _query: SemanticQuery) -> BoxFuture<'a, Result<(Value, QueryLane, bool)>> {
        Box::pin(async move { Ok((Value::Null, QueryLane::SemanticSearch, false)) })
    }

    fn fetch_context_snapshot<'a>(&'a self, _request: SnapshotRequest) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move { Ok(Value::Null) })
    }
}

fn ctx(sequence: u64) -> EventContext {
    EventContext::new(Source::LiveSdk, "repo1", "sess1", sequence)
}

#[tokio::test]
async fn circuit_opens_exactly_once_and_stops_remote_writes() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Arc::new(Mirror::new(MirrorConfig::new(dir.path())));
    let remote = Arc::new(FlakyRemote::new(10));
    let opened = Arc::new(Mutex::new(0u32));
    let opened_clone = opened.clone();

    let mut config = PipelineConfig::new("repo1");
    config.memory_max_consecutive_errors = 3;

    let pipeline = IngestPipeline::new(
        mirror,
        Arc::new(NoopRedactor) as Arc<dyn Redactor>,
        Some(remote.clone() as Arc<dyn RemoteMemory>),
        config,
        Some(Arc::new(move |err: &Error, events: &[CapturedEvent]| {
            if matches!(err, Error::CircuitOpen) && events.is_empty() {
                *opened_clone.lock().unwrap() += 1;
            }
        })),
    );

    for i in 0..6u64 {
        let _ = pipeline.ingest("tool.call", json!({"i": i}), ctx(i)).await;
    }
    pipeline.flush().await.unwrap();

    assert_eq!(*opened.lock().unwrap(), 1, "circuit should signal opened exactly once");
}

#[tokio::test]
async fn successful_writes_never_open_the_circuit() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Arc::new(Mirror::new(MirrorConfig::new(dir.path())));
    let remote = Arc::new(FlakyRemote::new(0));

    let config = PipelineConfig::new("repo1");
    let pipeline = IngestPipeline::new(
        mirror,
        Arc::new(NoopRedactor) as Arc<dyn Redactor>,
        Some(remote as Arc<dyn RemoteMemory>),
        config,
        None,
    );

    for i in 0..5u64 {
        pipeline.ingest("tool.call", json!({"i": i}), ctx(i)).await.unwrap();
    }
    pipeline.flush().await.unwrap();
}

#[tokio::test]
async fn deduplicated_mirror_append_skips_remote_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Arc::new(Mirror::new(MirrorConfig::new(dir.path())));
    let remote = Arc::new(FlakyRemote::new(0));

    let config = PipelineConfig::new("repo1");
    let pipeline = IngestPipeline::new(
        mirror,
        Arc::new(NoopRedactor) as Arc<dyn Redactor>,
        Some(remote as Arc<dyn RemoteMemory>),
        config,
        None,
    );

    let mut c = ctx(0);
    c = c.with_event_id("a".repeat(24));
    let first = pipeline.ingest("tool.call", json!({"i": 0}), c.clone()).await.unwrap();
    let second = pipeline.ingest("tool.call", json!({"i": 0}), c).await.unwrap();
    assert_eq!(first.event.event_id, second.event.event_id);
    assert!(!first.deduplicated);
    assert!(second.deduplicated);
    pipeline.flush().await.unwrap();
}
