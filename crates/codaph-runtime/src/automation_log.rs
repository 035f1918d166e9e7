use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

fn log_path(mirror_root: &Path) -> PathBuf {
    mirror_root.join("logs").join("sync-automation.log")
}

/// Append one timestamped line to `logs/sync-automation.log`:
/// `<iso-ts> <message> <json-meta?>`.
pub fn append(mirror_root: &Path, message: &str, meta: Option<&serde_json::Value>) -> Result<()> {
    let path = log_path(mirror_root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let ts = chrono::Utc::now().to_rfc3339();
    let line = match meta {
        Some(meta) => format!("{ts} {message} {meta}\n"),
        None => format!("{ts} {message}\n"),
    };
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_line_per_call() {
        let dir = tempfile::tempdir().unwrap();
        append(dir.path(), "run started", None).unwrap();
        append(dir.path(), "run finished", Some(&serde_json::json!({"imported": 3}))).unwrap();
        let contents = std::fs::read_to_string(log_path(dir.path())).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().nth(1).unwrap().contains("imported"));
    }
}
