use std::path::Path;

use codaph_engine::IngestPipeline;
use codaph_types::{EventContext, Source};

use crate::cursor::{FileCursor, HistorySyncState};
use crate::error::Result;
use crate::traits::ProviderReader;

const THREAD_STARTED: &str = "thread.started";

#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub files_scanned: u64,
    pub events_ingested: u64,
    pub deduplicated: u64,
    pub files_skipped_unchanged: u64,
    pub files_skipped_out_of_scope: u64,
}

/// Drive one provider's history backfill for one repo: list candidate
/// files, skip unchanged ones, resume from each file's cursor, project
/// records into events, and persist the cursor at file boundaries.
pub async fn sync(
    reader: &dyn ProviderReader,
    project_path: &Path,
    mirror_root: &Path,
    repo_id: &str,
    pipeline: &IngestPipeline,
    actor_id: Option<&str>,
    history_root_override: Option<&Path>,
) -> Result<SyncSummary> {
    let history_root = history_root_override
        .map(Path::to_path_buf)
        .or_else(|| reader.default_history_root());
    let Some(history_root) = history_root else {
        return Ok(SyncSummary::default());
    };

    let mut state = HistorySyncState::load(mirror_root, repo_id, reader.provider_name())?;
    let mut summary = SyncSummary::default();
    let provider_source = match reader.provider_name() {
        "codex" => Source::CodexHistory,
        "claude" => Source::ClaudeHistory,
        "gemini" => Source::GeminiHistory,
        _ => Source::CodexHistory,
    };

    for path in reader.list_candidates(&history_root) {
        summary.files_scanned += 1;
        let key = path.to_string_lossy().to_string();

        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(_) => continue,
        };
        let size = metadata.len();
        let mtime_millis = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let mut cursor = state.cursor_for(&key);
        if cursor.out_of_scope {
            summary.files_skipped_out_of_scope += 1;
            continue;
        }
        if cursor.size == size && cursor.mtime_millis == mtime_millis {
            summary.files_skipped_unchanged += 1;
            continue;
        }
        tracing::debug!(provider = reader.provider_name(), file = %path.display(), "scanning history file");

        let bytes = std::fs::read(&path)?;
        let records = reader.split_records(&bytes);

        if state.should_reset(&key, records.len() as u64) {
            cursor = FileCursor::default();
        }

        if cursor.session_id.is_none() {
            let (session_id, cwd) = reader.derive_session_and_cwd(&records);
            cursor.session_id = session_id;
            cursor.cwd = cwd.clone();
            if let Some(cwd) = &cwd {
                if !path_is_inside(Path::new(cwd), project_path) {
                    cursor.out_of_scope = true;
                    cursor.size = size;
                    cursor.mtime_millis = mtime_millis;
                    cursor.line_count = records.len() as u64;
                    state.set_cursor(key, cursor);
                    summary.files_skipped_out_of_scope += 1;
                    continue;
                }
            }
        }

        let session_id = cursor.session_id.clone().unwrap_or_else(|| synthetic_session_id(&path));

        if cursor.line_count == 0 {
            let ctx = EventContext::new(provider_source, repo_id, &session_id, 0)
                .with_thread_id(session_id.clone());
            let ctx = match actor_id {
                Some(actor) => ctx.with_actor_id(actor),
                None => ctx,
            };
            // Synthetic bookkeeping event, not one of the provider's own
            // records — excluded from events_ingested/deduplicated so those
            // two counters stay comparable (deduplicated is always <=
            // events_ingested).
            pipeline.ingest(THREAD_STARTED, serde_json::json!({"sessionId": session_id}), ctx).await?;
        }

        for (line_index, record) in records.iter().enumerate() {
            if (line_index as u64) < cursor.line_count {
                continue;
            }
            pipeline.ingest_raw_line(&session_id, &record.to_string())?;

            for projected in reader.project_record(record) {
                cursor.sequence += 1;
                let mut ctx = EventContext::new(provider_source, repo_id, &session_id, cursor.sequence)
                    .with_thread_id(session_id.clone());
                if let Some(actor) = actor_id {
                    ctx = ctx.with_actor_id(actor);
                }
                if let Some(ts) = &projected.ts {
                    ctx = ctx.with_ts(ts.clone());
                }
                let outcome = pipeline.ingest(&projected.event_type, projected.payload, ctx).await?;
                summary.events_ingested += 1;
                if outcome.deduplicated {
                    summary.deduplicated += 1;
                }
            }
        }

        cursor.line_count = records.len() as u64;
        cursor.size = size;
        cursor.mtime_millis = mtime_millis;
        state.set_cursor(key, cursor);
        pipeline.flush().await?;
    }

    state.persist(mirror_root, repo_id, reader.provider_name())?;
    tracing::info!(
        provider = reader.provider_name(),
        files_scanned = summary.files_scanned,
        events_ingested = summary.events_ingested,
        "history backfill pass complete"
    );
    Ok(summary)
}

fn path_is_inside(candidate: &Path, project_path: &Path) -> bool {
    candidate.starts_with(project_path)
}

fn synthetic_session_id(path: &Path) -> String {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("session").to_string()
}
