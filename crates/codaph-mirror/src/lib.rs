mod cache;
mod error;
mod mirror;
mod reader;
mod segment;

pub use error::{Error, Result};
pub use mirror::{AppendResult, IndexWriteMode, Mirror, MirrorConfig, DEFAULT_MIRROR_DIR};
pub use reader::{read_event_id_index, read_events_from_segments, read_manifest, read_sparse_index};
pub use segment::{segment_relative_path, SegmentId};
