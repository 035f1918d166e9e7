use std::path::{Path, PathBuf};
use std::sync::Arc;

use codaph_core::{NoopRedactor, Redactor};
use codaph_mirror::read_sparse_index;
use codaph_providers::ProviderReader;
use codaph_runtime::{OrchestratorConfig, PushKind, RunSummary, WorkflowMode};
use codaph_types::{CapturedEvent, TriggerSource};

use crate::error::{Error, Result};
use crate::types::{SessionFilter, SessionSummary};

const HISTORY_PROVIDERS: &[&str] = &["codex", "claude", "gemini"];

/// Entry point for SDK consumers: resolves a project's mirror root and
/// repo id once, then hands out read handles and sync drivers over it.
pub struct Client {
    project_root: PathBuf,
    mirror_root: PathBuf,
    repo_id: String,
    remote: Option<Arc<dyn codaph_engine::RemoteMemory>>,
    redactor: Arc<dyn Redactor>,
}

impl Client {
    /// Connect to an explicit project root.
    pub fn connect(project_root: impl Into<PathBuf>) -> Result<Self> {
        let project_root = project_root.into();
        if !project_root.exists() {
            return Err(Error::InvalidInput(format!("project root does not exist: {}", project_root.display())));
        }
        let mirror_root = codaph_core::resolve_mirror_root(&project_root, None).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let repo_id = codaph_core::project_repo_id(&project_root);
        Ok(Self { project_root, mirror_root, repo_id, remote: None, redactor: Arc::new(NoopRedactor) })
    }

    /// Connect using the current working directory (or `CODAPH_PROJECT_ROOT`) as the project root.
    pub fn connect_default() -> Result<Self> {
        let root = codaph_core::discover_project_root(None).map_err(|e| Error::InvalidInput(e.to_string()))?;
        Self::connect(root)
    }

    /// Attach a remote memory backend; without one, `sync()`'s pull phase is a no-op
    /// and history-backfill events are mirrored but never replicated outward.
    pub fn with_remote(mut self, remote: Arc<dyn codaph_engine::RemoteMemory>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_redactor(mut self, redactor: Arc<dyn Redactor>) -> Self {
        self.redactor = redactor;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn mirror_root(&self) -> &Path {
        &self.mirror_root
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    /// List sessions recorded in the sparse index, most recently active first.
    pub fn sessions(&self, filter: SessionFilter) -> Result<Vec<SessionSummary>> {
        let sparse = read_sparse_index(&self.mirror_root, &self.repo_id);
        let mut summaries: Vec<SessionSummary> = sparse
            .sessions
            .into_iter()
            .map(|(session_id, entry)| SessionSummary {
                session_id,
                from: entry.from,
                to: entry.to,
                event_count: entry.event_count,
                thread_ids: entry.threads.into_iter().collect(),
                actor_ids: entry.actors.into_iter().collect(),
            })
            .filter(|summary| filter.matches(summary))
            .collect();
        summaries.sort_by(|a, b| b.to.cmp(&a.to));
        Ok(summaries)
    }

    /// Open a handle onto one session's mirrored events.
    pub fn session(&self, session_id: impl Into<String>) -> SessionHandle {
        SessionHandle { mirror_root: self.mirror_root.clone(), repo_id: self.repo_id.clone(), session_id: session_id.into() }
    }

    /// Build an orchestrator config for this project, with this client's remote/redactor attached.
    fn orchestrator_config(&self) -> OrchestratorConfig {
        let mut config = OrchestratorConfig::new(self.mirror_root.clone(), self.repo_id.clone(), self.project_root.clone());
        config.remote = self.remote.clone();
        config.redactor = self.redactor.clone();
        config
    }

    /// Run one `push + pull` workflow cycle: backfill provider history into the
    /// mirror, then pull the remote's canonical timeline if a remote is attached.
    pub async fn sync(&self, trigger: TriggerSource) -> Result<RunSummary> {
        let config = self.orchestrator_config();
        let readers = default_history_readers();
        codaph_runtime::run_workflow(&config, WorkflowMode::All, trigger, PushKind::History, &readers)
            .await
            .map_err(Error::from)
    }

    /// Run only the pull phase (remote-sync replay), skipping history backfill.
    pub async fn pull(&self, trigger: TriggerSource) -> Result<RunSummary> {
        let config = self.orchestrator_config();
        codaph_runtime::run_workflow(&config, WorkflowMode::Pull, trigger, PushKind::Queue, &[])
            .await
            .map_err(Error::from)
    }
}

fn default_history_readers() -> Vec<Box<dyn ProviderReader>> {
    HISTORY_PROVIDERS.iter().filter_map(|name| codaph_providers::reader_for(name)).collect()
}

/// A read-only handle onto one mirrored session.
pub struct SessionHandle {
    mirror_root: PathBuf,
    repo_id: String,
    session_id: String,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.session_id
    }

    /// Load every mirrored event for this session, in the order its segments
    /// were written (chronological within a segment, segments already sorted
    /// by day in the sparse index's `BTreeSet`).
    pub fn events(&self) -> Result<Vec<CapturedEvent>> {
        let sparse = read_sparse_index(&self.mirror_root, &self.repo_id);
        let Some(entry) = sparse.sessions.get(&self.session_id) else {
            return Err(Error::NotFound(format!("session {}", self.session_id)));
        };
        let segments: Vec<String> = entry.segments.iter().cloned().collect();
        let mut events = codaph_mirror::read_events_from_segments(&self.mirror_root, &segments);
        events.retain(|event| event.session_id == self.session_id);
        events.sort_by(|a, b| a.ts.cmp(&b.ts));
        Ok(events)
    }
}
