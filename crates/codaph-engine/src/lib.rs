pub mod activity;
pub mod circuit;
pub mod error;
pub mod pipeline;
pub mod remote;
pub mod replayer;

pub use circuit::CircuitBreaker;
pub use error::{Error, Result};
pub use pipeline::{IngestOutcome, IngestPipeline, MemoryErrorHook, PipelineConfig};
pub use remote::{
    event_run_id, prompt_stream_run_id, session_summary_run_id, BoxFuture, QueryLane, RemoteMemory,
    RunIdScope, SemanticQuery, SnapshotRequest, WriteOutcome,
};
pub use replayer::{
    evaluate_cap_detection, fingerprint_timeline, parse_timeline_entry, CapDetection, ReplayDecision,
    ReplayerState, TimelineEntry,
};
