use std::collections::HashMap;
use std::path::{Path, PathBuf};

use codaph_core::{read_json_or_default, write_json_pretty_atomic};
use codaph_types::{EventIdIndex, RepoManifest, SparseIndex};

use crate::error::Result;

pub fn index_dir(root: &Path, repo_id: &str) -> PathBuf {
    root.join("index").join(repo_id)
}

pub fn manifest_path(root: &Path, repo_id: &str) -> PathBuf {
    index_dir(root, repo_id).join("manifest.json")
}

pub fn sparse_index_path(root: &Path, repo_id: &str) -> PathBuf {
    index_dir(root, repo_id).join("sparse-index.json")
}

pub fn event_id_index_path(root: &Path, repo_id: &str) -> PathBuf {
    index_dir(root, repo_id).join("event-ids.json")
}

/// A per-segment-file byte buffer used in batch index-write mode. Bytes
/// accumulate here until they cross the flush threshold or `flush()` is
/// called explicitly.
#[derive(Debug, Default)]
pub struct SegmentBuffer {
    pub pending: Vec<u8>,
}

pub const SEGMENT_FLUSH_THRESHOLD_BYTES: usize = 256 * 1024;

/// The in-memory, per-repo owner of manifest/sparse/event-id state. One
/// `RepoCache` is the authoritative writer for a repoId for the lifetime of
/// the owning `Mirror`; external readers must go through the on-disk reader
/// helpers instead.
pub struct RepoCache {
    pub manifest: RepoManifest,
    pub sparse: SparseIndex,
    pub event_ids: EventIdIndex,
    pub dirty: bool,
    pub dirty_event_count: u64,
    pub segment_buffers: HashMap<String, SegmentBuffer>,
}

impl RepoCache {
    pub fn load(root: &Path, repo_id: &str) -> Self {
        let manifest: RepoManifest = read_json_or_default(&manifest_path(root, repo_id));
        let manifest = if manifest.repo_id.is_empty() {
            RepoManifest::empty(repo_id)
        } else {
            manifest
        };
        let sparse: SparseIndex = read_json_or_default(&sparse_index_path(root, repo_id));
        let event_ids: EventIdIndex = read_json_or_default(&event_id_index_path(root, repo_id));
        let event_ids = if event_ids.repo_id.is_empty() {
            EventIdIndex::empty(repo_id)
        } else {
            event_ids
        };

        Self {
            manifest,
            sparse,
            event_ids,
            dirty: false,
            dirty_event_count: 0,
            segment_buffers: HashMap::new(),
        }
    }

    pub fn persist_indexes(&mut self, root: &Path, repo_id: &str) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        write_json_pretty_atomic(&manifest_path(root, repo_id), &self.manifest)?;
        write_json_pretty_atomic(&sparse_index_path(root, repo_id), &self.sparse)?;
        write_json_pretty_atomic(&event_id_index_path(root, repo_id), &self.event_ids)?;
        self.dirty = false;
        self.dirty_event_count = 0;
        Ok(())
    }
}
