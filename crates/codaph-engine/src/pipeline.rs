use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use codaph_core::Redactor;
use codaph_mirror::Mirror;
use codaph_types::{CapturedEvent, EventContext};
use serde_json::Value;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

use crate::activity::{build_event_activity, build_minimal_activity, build_prompt_activity};
use crate::error::{Error, Result};
use crate::remote::{event_run_id, prompt_stream_run_id, RemoteMemory, RunIdScope};
use crate::CircuitBreaker;

const PROMPT_SUBMITTED: &str = "prompt.submitted";

/// Result of one `ingest` call: the built (and possibly deduplicated)
/// event, plus whether the mirror had already seen its event id.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub event: CapturedEvent,
    pub deduplicated: bool,
}

/// A hook invoked on every failed remote write, and once more (with
/// [`Error::CircuitOpen`] and no events) the instant the circuit opens.
pub type MemoryErrorHook = Arc<dyn Fn(&Error, &[CapturedEvent]) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub repo_id: String,
    pub run_id_prefix: String,
    pub run_id_scope: RunIdScope,
    pub memory_write_concurrency: usize,
    pub memory_batch_size: usize,
    pub memory_write_timeout_ms: u64,
    pub memory_max_consecutive_errors: u32,
    pub fail_on_memory_error: bool,
}

impl PipelineConfig {
    pub fn new(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            run_id_prefix: "codaph".to_string(),
            run_id_scope: RunIdScope::PerSession,
            memory_write_concurrency: 1,
            memory_batch_size: 1,
            memory_write_timeout_ms: 15_000,
            memory_max_consecutive_errors: 3,
            fail_on_memory_error: false,
        }
    }

    /// The orchestrator's bulk-replication tuning for history backfill:
    /// higher concurrency, batched writes, batched index persistence.
    pub fn bulk_replication(repo_id: impl Into<String>) -> Self {
        Self {
            memory_write_concurrency: 2,
            memory_batch_size: 24,
            ..Self::new(repo_id)
        }
    }
}

/// Validate→redact→mirror→replicate with a circuit breaker, per-call
/// timeout, optional batching, and concurrency-capped backpressure on the
/// remote write path.
pub struct IngestPipeline {
    mirror: Arc<Mirror>,
    redactor: Arc<dyn Redactor>,
    remote: Option<Arc<dyn RemoteMemory>>,
    config: PipelineConfig,
    circuit: Arc<CircuitBreaker>,
    semaphore: Arc<Semaphore>,
    tasks: Mutex<JoinSet<Option<Error>>>,
    pending_batch: Mutex<Vec<CapturedEvent>>,
    deferred_error: Mutex<Option<Error>>,
    on_memory_error: Option<MemoryErrorHook>,
}

impl IngestPipeline {
    pub fn new(
        mirror: Arc<Mirror>,
        redactor: Arc<dyn Redactor>,
        remote: Option<Arc<dyn RemoteMemory>>,
        config: PipelineConfig,
        on_memory_error: Option<MemoryErrorHook>,
    ) -> Self {
        let permits = config.memory_write_concurrency.max(1);
        Self {
            mirror,
            redactor,
            remote,
            circuit: Arc::new(CircuitBreaker::new(config.memory_max_consecutive_errors)),
            semaphore: Arc::new(Semaphore::new(permits)),
            tasks: Mutex::new(JoinSet::new()),
            pending_batch: Mutex::new(Vec::new()),
            deferred_error: Mutex::new(None),
            on_memory_error,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The hot path: validate the context, redact the payload, mirror the
    /// event, then (unless deduplicated or the circuit is open) enqueue it
    /// for remote replication.
    pub async fn ingest(&self, event_type: &str, payload: Value, ctx: EventContext) -> Result<IngestOutcome> {
        let sanitized = self.redactor.redact(&payload);
        let event = CapturedEvent::build(&ctx, event_type, sanitized, now_iso8601);
        let append = self.mirror.append_event(&event)?;

        if append.deduplicated {
            return Ok(IngestOutcome { event, deduplicated: true });
        }

        if self.remote.is_some() && !self.circuit.is_open() {
            if let Some(err) = self.enqueue(event.clone()).await? {
                return Err(err);
            }
        }

        Ok(IngestOutcome { event, deduplicated: false })
    }

    /// Transparent passthrough to the mirror's raw-line append.
    pub fn ingest_raw_line(&self, session_id: &str, line: &str) -> Result<()> {
        Ok(self.mirror.append_raw_line(session_id, line)?)
    }

    /// Drain any queued remote writes, then the mirror. If
    /// `failOnMemoryError` is set and a deferred write failed, that error
    /// propagates here.
    pub async fn flush(&self) -> Result<()> {
        let partial = {
            let mut batch = self.pending_batch.lock().await;
            if batch.is_empty() { None } else { Some(std::mem::take(&mut *batch)) }
        };
        if let Some(events) = partial {
            if let Some(err) = self.dispatch(events).await? {
                self.record_deferred(err).await;
            }
        }

        {
            let mut tasks = self.tasks.lock().await;
            while let Some(joined) = tasks.join_next().await {
                if let Ok(Some(err)) = joined {
                    self.record_deferred(err).await;
                }
            }
        }

        self.mirror.flush()?;

        if self.config.fail_on_memory_error {
            if let Some(err) = self.deferred_error.lock().await.take() {
                return Err(err);
            }
        }
        Ok(())
    }

    async fn record_deferred(&self, err: Error) {
        let mut slot = self.deferred_error.lock().await;
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    async fn enqueue(&self, event: CapturedEvent) -> Result<Option<Error>> {
        if self.config.memory_batch_size <= 1 {
            return self.dispatch(vec![event]).await;
        }
        let to_send = {
            let mut batch = self.pending_batch.lock().await;
            batch.push(event);
            if batch.len() >= self.config.memory_batch_size {
                Some(std::mem::take(&mut *batch))
            } else {
                None
            }
        };
        match to_send {
            Some(events) => self.dispatch(events).await,
            None => Ok(None),
        }
    }

    /// Dispatch one call (single event or batch) through the concurrency
    /// gate. `memoryWriteConcurrency = 1` awaits inline, serialized with the
    /// next `ingest` call; higher concurrency spawns a background task and
    /// only blocks the caller when every slot is already in flight.
    async fn dispatch(&self, events: Vec<CapturedEvent>) -> Result<Option<Error>> {
        let Some(remote) = self.remote.clone() else {
            return Ok(None);
        };
        let run_id = self.run_id_for(&events);
        let timeout = effective_timeout(self.config.memory_write_timeout_ms, events.len());
        let uses_batch = events.len() > 1 && remote.supports_batch();

        if self.config.memory_write_concurrency <= 1 {
            let result = call_remote(remote.as_ref(), &events, &run_id, timeout, uses_batch).await;
            Ok(self.settle(result, &events).await)
        } else {
            let permit = self.semaphore.clone().acquire_owned().await.expect("semaphore not closed");
            let circuit_threshold_events = events.clone();
            let remote_for_task = remote.clone();
            let run_id_for_task = run_id.clone();
            let hook = self.on_memory_error.clone();
            let circuit = self.circuit.clone();
            self.tasks.lock().await.spawn(async move {
                let result = call_remote(remote_for_task.as_ref(), &circuit_threshold_events, &run_id_for_task, timeout, uses_batch).await;
                let outcome = settle_spawned(&circuit, &hook, remote_for_task.as_ref(), result, &circuit_threshold_events).await;
                drop(permit);
                outcome
            });
            Ok(None)
        }
    }

    fn run_id_for(&self, events: &[CapturedEvent]) -> String {
        match events.first() {
            Some(event) => event_run_id(&self.config.run_id_prefix, self.config.run_id_scope, &self.config.repo_id, &event.session_id),
            None => event_run_id(&self.config.run_id_prefix, self.config.run_id_scope, &self.config.repo_id, "unknown"),
        }
    }

    async fn settle(&self, result: Result<crate::remote::WriteOutcome>, events: &[CapturedEvent]) -> Option<Error> {
        settle_spawned(&self.circuit, &self.on_memory_error, self.remote.as_deref().expect("remote present"), result, events).await
    }
}

async fn settle_spawned(
    circuit: &CircuitBreaker,
    hook: &Option<MemoryErrorHook>,
    remote: &dyn RemoteMemory,
    result: Result<crate::remote::WriteOutcome>,
    events: &[CapturedEvent],
) -> Option<Error> {
    match result {
        Ok(_) => {
            circuit.record_success();
            for event in events {
                append_activity_with_retry(remote, event).await;
            }
            None
        }
        Err(err) => {
            let opened = circuit.record_failure();
            if let Some(hook) = hook {
                hook(&err, events);
                if opened {
                    hook(&Error::CircuitOpen, &[]);
                }
            }
            Some(err)
        }
    }
}

async fn append_activity_with_retry(remote: &dyn RemoteMemory, event: &CapturedEvent) {
    let run_id = event_run_id("codaph", RunIdScope::PerProject, &event.repo_id, &event.session_id);
    let envelope = build_event_activity(event);
    if remote.append_activity(&run_id, envelope).await.is_err() {
        let minimal = build_minimal_activity(event, "codaph_event.v2");
        if remote.append_activity(&run_id, minimal).await.is_err() {
            tracing::debug!(event_id = %event.event_id, "activity append failed twice");
        }
    }

    if event.event_type == PROMPT_SUBMITTED {
        let prompt_run_id = prompt_stream_run_id("codaph", &event.repo_id);
        let prompt_envelope = build_prompt_activity(event);
        if remote.append_activity(&prompt_run_id, prompt_envelope).await.is_err() {
            let minimal = build_minimal_activity(event, "codaph_prompt.v1");
            if remote.append_activity(&prompt_run_id, minimal).await.is_err() {
                tracing::debug!(event_id = %event.event_id, "prompt activity append failed twice");
            }
        }
    }
}

async fn call_remote(
    remote: &dyn RemoteMemory,
    events: &[CapturedEvent],
    run_id: &str,
    timeout: Duration,
    uses_batch: bool,
) -> Result<crate::remote::WriteOutcome> {
    let call = async {
        if uses_batch {
            remote.write_events_batch(events, run_id).await
        } else {
            let mut last = Err(Error::Remote("no events to write".into()));
            for event in events {
                last = remote.write_event(event, run_id).await;
                if last.is_err() {
                    break;
                }
            }
            last
        }
    };
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!("remote write exceeded {timeout:?}"))),
    }
}

/// Timeout scales linearly with batch size, capped at 6x the base timeout.
fn effective_timeout(base_ms: u64, batch_len: usize) -> Duration {
    let scale = batch_len.max(1).min(6) as u64;
    Duration::from_millis(base_ms * scale)
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_scales_linearly_and_caps_at_six_x() {
        assert_eq!(effective_timeout(1000, 1), Duration::from_millis(1000));
        assert_eq!(effective_timeout(1000, 3), Duration::from_millis(3000));
        assert_eq!(effective_timeout(1000, 24), Duration::from_millis(6000));
    }
}
