mod event;
mod ids;
mod state;

pub use event::{CapturedEvent, EventContext, ReasoningAvailability, Source};
pub use ids::{event_id, repo_id};
pub use state::{
    EventIdEntry, EventIdIndex, LocalPushState, PendingTrigger, ProviderPushCount, RemoteSyncState,
    RepoManifest, SegmentMeta, SparseEntry, SparseIndex, TriggerSource,
};
