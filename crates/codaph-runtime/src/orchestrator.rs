use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use codaph_core::{NoopRedactor, Redactor};
use codaph_engine::{IngestPipeline, PipelineConfig};
use codaph_mirror::{IndexWriteMode, Mirror, MirrorConfig};
use codaph_providers::ProviderReader;
use codaph_types::{PendingTrigger, ProviderPushCount, TriggerSource};

use crate::automation_log;
use crate::error::Result;
use crate::lock::SyncLock;
use crate::replay_runner::run_replay;
use crate::state_store;

const DEFAULT_COOLDOWN: Duration = Duration::from_secs(45);
const DEFAULT_ACQUIRE_DEADLINE_USER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowMode {
    All,
    Push,
    Pull,
}

impl WorkflowMode {
    fn wants_push(&self) -> bool {
        matches!(self, WorkflowMode::All | WorkflowMode::Push)
    }

    fn wants_pull(&self) -> bool {
        matches!(self, WorkflowMode::All | WorkflowMode::Pull)
    }
}

/// Whether the push phase replays already-mirrored local events or runs a
/// fresh history backfill.
pub enum PushKind {
    Queue,
    History,
}

#[derive(Debug, Clone)]
pub struct AutomationConfig {
    pub enabled: bool,
    pub auto_pull_on_sync: bool,
    pub cooldown: Duration,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self { enabled: true, auto_pull_on_sync: true, cooldown: DEFAULT_COOLDOWN }
    }
}

pub struct OrchestratorConfig {
    pub mirror_root: PathBuf,
    pub repo_id: String,
    pub project_path: PathBuf,
    pub automation: AutomationConfig,
    pub remote: Option<Arc<dyn codaph_engine::RemoteMemory>>,
    pub redactor: Arc<dyn Redactor>,
    pub timeline_limit: u64,
}

impl OrchestratorConfig {
    pub fn new(mirror_root: impl Into<PathBuf>, repo_id: impl Into<String>, project_path: impl Into<PathBuf>) -> Self {
        Self {
            mirror_root: mirror_root.into(),
            repo_id: repo_id.into(),
            project_path: project_path.into(),
            automation: AutomationConfig::default(),
            remote: None,
            redactor: Arc::new(NoopRedactor),
            timeline_limit: 200,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub skipped: bool,
    pub skip_reason: Option<String>,
    pub push_note: Option<String>,
    pub pull_imported: Option<u64>,
}

/// The single entry point for `all`/`push`/`pull` workflow runs: acquires
/// the per-repo lock, runs the requested phases, and releases the lock.
pub async fn run_workflow(
    config: &OrchestratorConfig,
    mode: WorkflowMode,
    trigger: TriggerSource,
    push_kind: PushKind,
    history_readers: &[Box<dyn ProviderReader>],
) -> Result<RunSummary> {
    let deadline = if trigger.is_hook() { Duration::ZERO } else { DEFAULT_ACQUIRE_DEADLINE_USER };

    let lock = match SyncLock::acquire(&config.mirror_root, serde_json::json!({"trigger": format!("{trigger:?}")}), deadline) {
        Ok(lock) => lock,
        Err(err) => {
            if trigger.is_hook() {
                tracing::debug!(?trigger, "sync lock unavailable for hook run, recording pending trigger");
                let mut remote_state = state_store::read_remote_sync_state(&config.mirror_root, &config.repo_id);
                remote_state.pending_trigger = PendingTrigger {
                    pending: true,
                    source: Some(trigger),
                    ts: Some(chrono::Utc::now().to_rfc3339()),
                };
                state_store::write_remote_sync_state(&config.mirror_root, &config.repo_id, &remote_state)?;
                automation_log::append(&config.mirror_root, "lock unavailable, pending trigger recorded", None)?;
                return Ok(RunSummary { skipped: true, skip_reason: Some("lock unavailable".to_string()), ..Default::default() });
            }
            tracing::warn!(?trigger, error = %err, "failed to acquire sync lock");
            return Err(err);
        }
    };

    let mirror = Arc::new(Mirror::new(
        MirrorConfig::new(&config.mirror_root).with_index_write_mode(IndexWriteMode::Batch).with_auto_flush_every_events(24),
    ));

    let mut summary = RunSummary::default();

    if mode.wants_push() {
        summary.push_note = Some(run_push_phase(config, mirror.clone(), trigger, push_kind, history_readers).await?);
    }

    if mode.wants_pull() {
        match pull_gate(config, trigger)? {
            Some(reason) => {
                summary.skip_reason = Some(reason);
            }
            None => {
                let imported = run_replay(config, mirror.clone(), trigger).await?;
                summary.pull_imported = Some(imported);
            }
        }
    }

    tracing::info!(?mode, ?trigger, push_note = ?summary.push_note, pull_imported = ?summary.pull_imported, "workflow run completed");
    automation_log::append(&config.mirror_root, "workflow run completed", Some(&serde_json::json!({"mode": format!("{mode:?}")})))?;
    lock.release()?;
    Ok(summary)
}

async fn run_push_phase(
    config: &OrchestratorConfig,
    mirror: Arc<Mirror>,
    trigger: TriggerSource,
    push_kind: PushKind,
    history_readers: &[Box<dyn ProviderReader>],
) -> Result<String> {
    let mut local_state = state_store::read_local_push_state(&config.mirror_root, &config.repo_id);

    let note = match push_kind {
        PushKind::Queue => {
            if local_state.provider_counts.is_empty() {
                "nothing to replay".to_string()
            } else {
                "queued events already mirrored; no replay necessary".to_string()
            }
        }
        PushKind::History => {
            let pipeline = IngestPipeline::new(
                mirror,
                config.redactor.clone(),
                config.remote.clone(),
                PipelineConfig::bulk_replication(&config.repo_id),
                None,
            );

            let mut counts = Vec::new();
            let result: Result<()> = async {
                for reader in history_readers {
                    let outcome = codaph_providers::sync(
                        reader.as_ref(),
                        &config.project_path,
                        &config.mirror_root,
                        &config.repo_id,
                        &pipeline,
                        None,
                        None,
                    )
                    .await?;
                    counts.push(ProviderPushCount {
                        provider: reader.provider_name().to_string(),
                        files_scanned: outcome.files_scanned,
                        events_ingested: outcome.events_ingested,
                        deduplicated: outcome.deduplicated,
                    });
                }
                pipeline.flush().await?;
                Ok(())
            }
            .await;

            match result {
                Ok(()) => {
                    local_state.last_run_at = Some(chrono::Utc::now().to_rfc3339());
                    local_state.last_success_at = local_state.last_run_at.clone();
                    local_state.last_trigger_source = Some(trigger);
                    local_state.provider_counts = counts;
                    local_state.last_error = None;
                    state_store::write_local_push_state(&config.mirror_root, &config.repo_id, &local_state)?;
                    format!("replicated history for {} provider(s)", history_readers.len())
                }
                Err(err) => {
                    local_state.last_run_at = Some(chrono::Utc::now().to_rfc3339());
                    local_state.last_trigger_source = Some(trigger);
                    local_state.last_error = Some(err.to_string());
                    state_store::write_local_push_state(&config.mirror_root, &config.repo_id, &local_state)?;
                    return Err(err);
                }
            }
        }
    };

    Ok(note)
}

fn pull_gate(config: &OrchestratorConfig, trigger: TriggerSource) -> Result<Option<String>> {
    let remote_state = state_store::read_remote_sync_state(&config.mirror_root, &config.repo_id);

    if config.automation.enabled && trigger.is_cooldown_sensitive() {
        if let Some(last_run_at) = &remote_state.last_run_at {
            if within_cooldown(last_run_at, config.automation.cooldown) {
                tracing::debug!(?trigger, "pull skipped: cooldown active");
                return Ok(Some("Cooldown active".to_string()));
            }
        }
    }

    if !config.automation.auto_pull_on_sync && trigger.is_user_driven_sync() {
        tracing::debug!(?trigger, "pull skipped: auto pull disabled for this project");
        return Ok(Some("Per-project auto pull disabled".to_string()));
    }

    Ok(None)
}

fn within_cooldown(last_run_at: &str, cooldown: Duration) -> bool {
    let Ok(last) = chrono::DateTime::parse_from_rfc3339(last_run_at) else {
        return false;
    };
    let elapsed = chrono::Utc::now().signed_duration_since(last.with_timezone(&chrono::Utc));
    elapsed.to_std().map(|d| d < cooldown).unwrap_or(false)
}
