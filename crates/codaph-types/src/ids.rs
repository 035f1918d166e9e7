use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Derive a stable event id from the fields that identify a captured event.
///
/// `event_id` is a pure function of its inputs: two calls with identical
/// `(source, thread_id, sequence, event_type, ts)` always return the same
/// 24-character hex string, independent of process or machine.
pub fn event_id(source: &str, thread_id: Option<&str>, sequence: u64, event_type: &str, ts: &str) -> String {
    let thread = thread_id.unwrap_or("no-thread");
    let joined = format!("{source}|{thread}|{sequence}|{event_type}|{ts}");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 24)
}

/// Derive the 12-hex-char repo id from an absolute project path.
pub fn repo_id(absolute_path: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(absolute_path.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 12)
}

fn hex_prefix(bytes: &[u8], chars: usize) -> String {
    let mut out = String::with_capacity(chars);
    for byte in bytes {
        if out.len() >= chars {
            break;
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out.truncate(chars);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_is_deterministic() {
        let a = event_id("codex_sdk", Some("t1"), 10, "item.completed", "2026-02-21T20:10:05Z");
        let b = event_id("codex_sdk", Some("t1"), 10, "item.completed", "2026-02-21T20:10:05Z");
        assert_eq!(a, b);
        assert_eq!(a.len(), 24);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn event_id_no_thread_is_distinct_input() {
        let with_none = event_id("codex_sdk", None, 1, "prompt.submitted", "t0");
        let with_literal = event_id("codex_sdk", Some("no-thread"), 1, "prompt.submitted", "t0");
        assert_eq!(with_none, with_literal);
    }

    #[test]
    fn event_id_changes_with_any_field() {
        let base = event_id("codex_sdk", Some("t1"), 1, "item.completed", "t0");
        let diff_seq = event_id("codex_sdk", Some("t1"), 2, "item.completed", "t0");
        let diff_ts = event_id("codex_sdk", Some("t1"), 1, "item.completed", "t1");
        assert_ne!(base, diff_seq);
        assert_ne!(base, diff_ts);
    }

    #[test]
    fn repo_id_is_12_hex_chars() {
        let id = repo_id("/home/user/project");
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn repo_id_stable_for_same_path() {
        assert_eq!(repo_id("/a/b/c"), repo_id("/a/b/c"));
        assert_ne!(repo_id("/a/b/c"), repo_id("/a/b/d"));
    }
}
