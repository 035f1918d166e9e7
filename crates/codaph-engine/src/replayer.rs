use codaph_types::{CapturedEvent, ReasoningAvailability, Source};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// One entry parsed out of `fetchContextSnapshot`'s `timeline` list: the
/// captured event it reconstructs, plus the raw identifying fields used for
/// fingerprinting.
#[derive(Debug, Clone)]
pub struct TimelineEntry {
    pub id: String,
    pub created_at: String,
    pub event: CapturedEvent,
}

/// Parse one opaque timeline record into a captured event, per the tolerant
/// multi-schema discipline: unwrap `activity`, find the envelope, recognize
/// a codaph activity, resolve the nested event, and fill defensible
/// fallbacks. Returns `None` when the record cannot be recognized at all —
/// callers count those as `skipped`.
pub fn parse_timeline_entry(raw: &Value, live_source: Source, now: &str) -> Option<TimelineEntry> {
    let id = raw.get("id").and_then(Value::as_str).map(str::to_string);
    let created_at = raw
        .get("created_at")
        .or_else(|| raw.get("createdAt"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let activity = unwrap_activity(raw)?;
    let envelope = find_envelope(&activity)?;
    if !looks_like_codaph_activity(&activity, &envelope) {
        return None;
    }

    let event_record = resolve_event_record(&envelope);

    let event_type = event_record
        .as_ref()
        .and_then(|e| e.get("eventType").or_else(|| e.get("type")))
        .and_then(Value::as_str)
        .unwrap_or("remote.activity")
        .to_string();

    let session_id = event_record
        .as_ref()
        .and_then(|e| e.get("sessionId"))
        .and_then(Value::as_str)
        .or_else(|| activity.get("input_ref").and_then(Value::as_str))
        .or(id.as_deref())
        .unwrap_or("unknown")
        .to_string();

    let thread_id = event_record
        .as_ref()
        .and_then(|e| e.get("threadId"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| session_id.clone());

    let ts = event_record
        .as_ref()
        .and_then(|e| e.get("ts"))
        .and_then(Value::as_str)
        .or_else(|| activity.get("ts").or_else(|| activity.get("created_at")).and_then(Value::as_str))
        .or(created_at.as_deref())
        .unwrap_or(now)
        .to_string();

    let payload = event_record
        .as_ref()
        .and_then(|e| e.get("payload"))
        .cloned()
        .unwrap_or(Value::Null);

    let event_id = event_record
        .as_ref()
        .and_then(|e| e.get("eventId"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| activity.get("output_ref").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| synthetic_event_id(&session_id, &thread_id, &ts, &event_type));

    let reasoning_availability = ReasoningAvailability::from_payload(&payload);

    let entry_id = id.clone().unwrap_or_else(|| event_id.clone());
    let entry_created_at = created_at.unwrap_or_else(|| ts.clone());

    Some(TimelineEntry {
        id: entry_id,
        created_at: entry_created_at,
        event: CapturedEvent {
            event_id,
            source: live_source,
            repo_id: String::new(),
            actor_id: None,
            session_id,
            thread_id: Some(thread_id),
            ts,
            event_type,
            payload,
            reasoning_availability,
        },
    })
}

fn unwrap_activity(raw: &Value) -> Option<Value> {
    if let Some(activity) = raw.get("activity") {
        if let Some(s) = activity.as_str() {
            return serde_json::from_str(s).ok();
        }
        return Some(activity.clone());
    }
    if let Some(payload) = raw.get("payload") {
        if let Some(s) = payload.as_str() {
            if let Ok(parsed) = serde_json::from_str::<Value>(s) {
                if parsed.get("activity").is_some() {
                    return unwrap_activity(&parsed);
                }
                return Some(parsed);
            }
        }
        return Some(payload.clone());
    }
    if raw.is_object() {
        return Some(raw.clone());
    }
    None
}

fn find_envelope(activity: &Value) -> Option<Value> {
    if let Some(payload) = activity.get("payload") {
        if let Some(s) = payload.as_str() {
            if let Ok(parsed) = serde_json::from_str(s) {
                return Some(parsed);
            }
        }
        return Some(payload.clone());
    }
    if activity.get("eventType").is_some() || activity.get("schema").is_some() || activity.get("type").is_some() {
        return Some(activity.clone());
    }
    None
}

fn looks_like_codaph_activity(activity: &Value, envelope: &Value) -> bool {
    if activity.get("type").and_then(Value::as_str) == Some("codaph_event") {
        return true;
    }
    if envelope
        .get("schema")
        .and_then(Value::as_str)
        .map(|s| s.starts_with("codaph_event"))
        .unwrap_or(false)
    {
        return true;
    }
    envelope.get("type").and_then(Value::as_str) == Some("codaph_event")
}

fn resolve_event_record(envelope: &Value) -> Option<Value> {
    if let Some(event) = envelope.get("event") {
        return Some(event.clone());
    }
    let has_event_fields = ["eventType", "sessionId", "eventId", "threadId", "prompt"]
        .iter()
        .any(|key| envelope.get(key).is_some());
    if has_event_fields {
        return Some(envelope.clone());
    }
    if let Some(payload) = envelope.get("payload") {
        if let Some(s) = payload.as_str() {
            return serde_json::from_str(s).ok();
        }
    }
    None
}

fn synthetic_event_id(session_id: &str, thread_id: &str, ts: &str, event_type: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(b"|");
    hasher.update(thread_id.as_bytes());
    hasher.update(b"|");
    hasher.update(ts.as_bytes());
    hasher.update(b"|");
    hasher.update(event_type.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 24)
}

fn hex_prefix(bytes: &[u8], chars: usize) -> String {
    let mut out = String::with_capacity(chars);
    for byte in bytes {
        if out.len() >= chars {
            break;
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out.truncate(chars);
    out
}

/// Hash one timeline entry's payload for inclusion in the snapshot
/// fingerprint.
fn hash_payload(payload: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.to_string().as_bytes());
    hex_prefix(&hasher.finalize(), 64)
}

/// Compute the snapshot fingerprint: SHA-256 over
/// `"id|created_at|hash(payload)\n"` per raw timeline entry, truncated to 24
/// hex chars. `None` for an empty timeline.
pub fn fingerprint_timeline(raw_timeline: &[Value]) -> Option<String> {
    if raw_timeline.is_empty() {
        return None;
    }
    let mut hasher = Sha256::new();
    for entry in raw_timeline {
        let id = entry.get("id").and_then(Value::as_str).unwrap_or("");
        let created_at = entry
            .get("created_at")
            .or_else(|| entry.get("createdAt"))
            .and_then(Value::as_str)
            .unwrap_or("");
        let payload = entry.get("payload").or_else(|| entry.get("activity")).cloned().unwrap_or(Value::Null);
        hasher.update(format!("{id}|{created_at}|{}\n", hash_payload(&payload)).as_bytes());
    }
    Some(hex_prefix(&hasher.finalize(), 24))
}

/// The cap-detection verdict for one replay run.
#[derive(Debug, Clone, Default)]
pub struct CapDetection {
    pub consecutive_same_snapshot_count: u32,
    pub suspected_server_cap: bool,
    pub no_remote_changes_detected: bool,
    pub diagnostic_note: Option<String>,
}

/// Evaluate the snapshot fingerprint against the prior persisted one and
/// decide whether the remote appears to be capping result size.
pub fn evaluate_cap_detection(
    prior_fingerprint: Option<&str>,
    fingerprint: Option<&str>,
    prior_count: u32,
    timeline_len: usize,
    requested_timeline_limit: u64,
) -> CapDetection {
    let no_remote_changes_detected = prior_fingerprint == fingerprint;

    let consecutive_same_snapshot_count = match prior_fingerprint {
        None => 0,
        Some(_) if prior_fingerprint == fingerprint => prior_count + 1,
        Some(_) => 0,
    };

    let suspected_server_cap = consecutive_same_snapshot_count >= 3
        && timeline_len > 0
        && requested_timeline_limit > timeline_len as u64;

    let diagnostic_note = if suspected_server_cap {
        Some(format!(
            "the remote snapshot has returned the same {timeline_len} entries {consecutive_same_snapshot_count} runs in a row \
             while {requested_timeline_limit} were requested; it appears capped and local dedup is expected"
        ))
    } else {
        None
    };

    CapDetection {
        consecutive_same_snapshot_count,
        suspected_server_cap,
        no_remote_changes_detected,
        diagnostic_note,
    }
}

/// The per-run replay outcome, mirroring the fields persisted to
/// `RemoteSyncState` and surfaced to callers.
#[derive(Debug, Clone, Default)]
pub struct ReplayDecision {
    pub timeline_events: usize,
    pub requested_timeline_limit: u64,
    pub refresh: bool,
    pub imported: u64,
    pub deduplicated: u64,
    pub skipped: u64,
    pub sessions: usize,
    pub contributors: usize,
    pub last_ts: Option<String>,
    pub snapshot_fingerprint: Option<String>,
    pub consecutive_same_snapshot_count: u32,
    pub no_remote_changes_detected: bool,
    pub suspected_server_cap: bool,
    pub diagnostic_note: Option<String>,
}

/// Accumulates per-event bookkeeping (distinct sessions/actors, max `ts`)
/// as a caller drives parsed entries through `mirror.append_event`. Kept as
/// a plain accumulator rather than performing the mirror I/O itself, so the
/// engine stays free of a dependency on the orchestrator that owns the
/// mirror handle and persists `RemoteSyncState`.
#[derive(Debug, Default)]
pub struct ReplayerState {
    sessions: std::collections::HashSet<String>,
    contributors: std::collections::HashSet<String>,
    imported: u64,
    deduplicated: u64,
    skipped: u64,
    last_ts: Option<String>,
}

impl ReplayerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_deduplicated(&mut self, event: &CapturedEvent) {
        self.deduplicated += 1;
        self.touch(event);
    }

    pub fn record_imported(&mut self, event: &CapturedEvent) {
        self.imported += 1;
        self.sessions.insert(event.session_id.clone());
        if let Some(actor) = &event.actor_id {
            self.contributors.insert(actor.clone());
        }
        self.touch(event);
    }

    fn touch(&mut self, event: &CapturedEvent) {
        if self.last_ts.as_deref().map(|ts| ts < event.ts.as_str()).unwrap_or(true) {
            self.last_ts = Some(event.ts.clone());
        }
    }

    /// Finalize into a [`ReplayDecision`] once the timeline has been fully
    /// walked and the fingerprint/cap-detection verdict is known.
    pub fn finish(
        self,
        timeline_events: usize,
        requested_timeline_limit: u64,
        refresh: bool,
        cap: CapDetection,
        snapshot_fingerprint: Option<String>,
    ) -> ReplayDecision {
        ReplayDecision {
            timeline_events,
            requested_timeline_limit,
            refresh,
            imported: self.imported,
            deduplicated: self.deduplicated,
            skipped: self.skipped,
            sessions: self.sessions.len(),
            contributors: self.contributors.len(),
            last_ts: self.last_ts,
            snapshot_fingerprint,
            consecutive_same_snapshot_count: cap.consecutive_same_snapshot_count,
            no_remote_changes_detected: cap.no_remote_changes_detected,
            suspected_server_cap: cap.suspected_server_cap,
            diagnostic_note: cap.diagnostic_note,
        }
    }
}
