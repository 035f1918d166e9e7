use std::path::PathBuf;

/// A segment is named for its UTC calendar date, derived directly from the
/// first 10 characters of an ISO-8601 UTC timestamp (`YYYY-MM-DD`). No date
/// library is needed: segments close at calendar boundaries by construction
/// because the id is a pure slice of the timestamp string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentId {
    pub year: String,
    pub month: String,
    pub day: String,
}

impl SegmentId {
    pub fn from_ts(ts: &str) -> Option<Self> {
        let date = ts.get(0..10)?;
        let mut parts = date.splitn(3, '-');
        let year = parts.next()?.to_string();
        let month = parts.next()?.to_string();
        let day = parts.next()?.to_string();
        if year.len() != 4 || month.len() != 2 || day.len() != 2 {
            return None;
        }
        Some(SegmentId { year, month, day })
    }

    pub fn compact(&self) -> String {
        format!("{}{}{}", self.year, self.month, self.day)
    }

    pub fn relative_path(&self, repo_id: &str) -> String {
        format!(
            "events/{}/{}/{}/{}/segment-{}.jsonl",
            repo_id,
            self.year,
            self.month,
            self.day,
            self.compact()
        )
    }
}

pub fn segment_relative_path(repo_id: &str, ts: &str) -> Option<String> {
    SegmentId::from_ts(ts).map(|id| id.relative_path(repo_id))
}

pub fn segment_dir(root: &std::path::Path, repo_id: &str, segment_id: &SegmentId) -> PathBuf {
    root.join("events")
        .join(repo_id)
        .join(&segment_id.year)
        .join(&segment_id.month)
        .join(&segment_id.day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_rollover_splits_segments() {
        let before = SegmentId::from_ts("2026-02-21T23:59:59Z").unwrap();
        let after = SegmentId::from_ts("2026-02-22T00:00:01Z").unwrap();
        assert_ne!(before.compact(), after.compact());
        assert_eq!(before.compact(), "20260221");
        assert_eq!(after.compact(), "20260222");
    }

    #[test]
    fn relative_path_matches_layout() {
        let id = SegmentId::from_ts("2026-02-21T10:00:00Z").unwrap();
        assert_eq!(id.relative_path("deadbeef0001"), "events/deadbeef0001/2026/02/21/segment-20260221.jsonl");
    }

    #[test]
    fn rejects_malformed_timestamps() {
        assert!(SegmentId::from_ts("not-a-date").is_none());
        assert!(SegmentId::from_ts("26-2-1").is_none());
    }
}
