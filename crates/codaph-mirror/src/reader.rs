use std::io::{BufRead, BufReader};
use std::path::Path;

use codaph_core::read_json_or_default;
use codaph_types::{CapturedEvent, EventIdIndex, RepoManifest, SparseIndex};

use crate::cache::{event_id_index_path, manifest_path, sparse_index_path};

/// Read every segment listed in `relative_paths`, in order, ignoring lines
/// that don't parse as a `CapturedEvent`. Filtering and sorting the result
/// is the caller's responsibility.
pub fn read_events_from_segments(root: &Path, relative_paths: &[String]) -> Vec<CapturedEvent> {
    let mut events = Vec::new();
    for relative_path in relative_paths {
        let path = root.join(relative_path);
        let Ok(file) = std::fs::File::open(&path) else {
            continue;
        };
        for line in BufReader::new(file).lines().map_while(std::result::Result::ok) {
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(event) = serde_json::from_str::<CapturedEvent>(&line) {
                events.push(event);
            }
        }
    }
    events
}

pub fn read_manifest(root: &Path, repo_id: &str) -> RepoManifest {
    let manifest: RepoManifest = read_json_or_default(&manifest_path(root, repo_id));
    if manifest.repo_id.is_empty() {
        RepoManifest::empty(repo_id)
    } else {
        manifest
    }
}

pub fn read_sparse_index(root: &Path, repo_id: &str) -> SparseIndex {
    read_json_or_default(&sparse_index_path(root, repo_id))
}

pub fn read_event_id_index(root: &Path, repo_id: &str) -> EventIdIndex {
    let index: EventIdIndex = read_json_or_default(&event_id_index_path(root, repo_id));
    if index.repo_id.is_empty() {
        EventIdIndex::empty(repo_id)
    } else {
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_malformed_lines_and_keeps_valid_ones() {
        let dir = tempfile::tempdir().unwrap();
        let segment_path = "events/repo1/2026/02/21/segment-20260221.jsonl";
        let full_path = dir.path().join(segment_path);
        std::fs::create_dir_all(full_path.parent().unwrap()).unwrap();
        std::fs::write(
            &full_path,
            "not json\n{\"eventId\":\"a\",\"source\":\"live_sdk\",\"repoId\":\"repo1\",\"sessionId\":\"s1\",\"ts\":\"2026-02-21T00:00:00Z\",\"eventType\":\"prompt.submitted\",\"payload\":null,\"reasoningAvailability\":\"unavailable\"}\n",
        )
        .unwrap();

        let events = read_events_from_segments(dir.path(), &[segment_path.to_string()]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_id, "a");
    }

    #[test]
    fn missing_segment_file_yields_no_events() {
        let dir = tempfile::tempdir().unwrap();
        let events = read_events_from_segments(dir.path(), &["events/missing.jsonl".to_string()]);
        assert!(events.is_empty());
    }

    #[test]
    fn missing_indexes_return_empty_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = read_manifest(dir.path(), "repo1");
        assert_eq!(manifest.repo_id, "repo1");
        assert!(manifest.segments.is_empty());

        let event_ids = read_event_id_index(dir.path(), "repo1");
        assert_eq!(event_ids.repo_id, "repo1");
        assert!(event_ids.events.is_empty());
    }
}
