pub mod automation_log;
pub mod error;
pub mod hooks;
pub mod lock;
pub mod orchestrator;
pub mod replay_runner;
pub mod state_store;

pub use error::{Error, Result};
pub use hooks::HookName;
pub use lock::{LockContents, SyncLock};
pub use orchestrator::{run_workflow, AutomationConfig, OrchestratorConfig, PushKind, RunSummary, WorkflowMode};
pub use state_store::{read_local_push_state, read_remote_sync_state, write_local_push_state, write_remote_sync_state};
